//! Guest Service
//!
//! Guest stays: check-in occupies the room and check-out releases it, each
//! in a single transaction.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait,
    DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::rooms::{occupy, release};
use super::{normalize_search, validate_amount, validate_pagination};
use crate::entities::{guest, sale};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CheckInInput {
    #[validate(length(min = 1, max = 100))]
    #[schema(example = "Ana")]
    pub name: String,
    #[validate(length(min = 1, max = 100))]
    #[schema(example = "Lopez")]
    pub surname: String,
    #[validate(length(max = 20))]
    pub national_id: Option<String>,
    /// Room to occupy; a guest may be registered without one
    pub room_id: Option<Uuid>,
    #[validate(custom = "validate_amount")]
    #[schema(value_type = Option<String>)]
    pub price_paid: Option<Decimal>,
}

/// The room is not reassignable through an update.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateGuestInput {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub surname: Option<String>,
    /// An empty string clears the stored national id
    #[validate(length(max = 20))]
    pub national_id: Option<String>,
    #[validate(custom = "validate_amount")]
    #[schema(value_type = Option<String>)]
    pub price_paid: Option<Decimal>,
}

#[derive(Debug, Clone, Default)]
pub struct GuestFilter {
    pub room_id: Option<Uuid>,
    /// Substring match on the first name
    pub name: Option<String>,
    /// Substring match on name, surname or national id
    pub search: Option<String>,
}

/// Outcome of a bulk check-out
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BulkCheckOutResult {
    /// Guests whose room was released
    pub checked_out: Vec<Uuid>,
    /// Guests without a room, left untouched
    pub skipped: Vec<Uuid>,
}

#[derive(Clone)]
pub struct GuestService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl GuestService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Registers a guest, occupying the given room in the same transaction.
    #[instrument(skip(self))]
    pub async fn check_in(&self, input: CheckInInput) -> Result<guest::Model, ServiceError> {
        input.validate()?;
        let name = required_text("name", &input.name)?;
        let surname = required_text("surname", &input.surname)?;
        let national_id = normalize_national_id(input.national_id.as_deref());

        let txn = self.db.begin().await?;

        // The room flip must be the transaction's first statement
        if let Some(room_id) = input.room_id {
            occupy(&txn, room_id).await?;
        }
        if let Some(national_id) = national_id.as_deref() {
            ensure_unique_national_id(&txn, national_id, None).await?;
        }

        let guest = guest::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            surname: Set(surname),
            national_id: Set(national_id),
            room_id: Set(input.room_id),
            price_paid: Set(input.price_paid),
            check_in_time: Set(Utc::now()),
            check_out_time: Set(None),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        info!(guest_id = %guest.id, room_id = ?guest.room_id, "Guest checked in");
        self.event_sender
            .send_or_log(Event::GuestCheckedIn {
                guest_id: guest.id,
                room_id: guest.room_id,
            })
            .await;

        Ok(guest)
    }

    /// Releases the guest's room and stamps the check-out time.
    ///
    /// A guest without a room is returned unchanged. The call is not
    /// idempotent: checking out twice re-releases the room and re-stamps
    /// the time. The room reference is kept for history.
    #[instrument(skip(self))]
    pub async fn check_out(&self, guest_id: Uuid) -> Result<guest::Model, ServiceError> {
        let txn = self.db.begin().await?;
        let (guest, released) = check_out_in(&txn, guest_id).await?;
        txn.commit().await?;

        if let (Some(room_id), Some(checked_out_at)) = (released, guest.check_out_time) {
            self.event_sender
                .send_or_log(Event::GuestCheckedOut {
                    guest_id,
                    room_id,
                    checked_out_at,
                })
                .await;
        }
        Ok(guest)
    }

    /// Checks out every listed guest, each in its own transaction.
    ///
    /// All ids are resolved first, so an unknown id fails the whole batch
    /// before anyone is checked out.
    #[instrument(skip(self))]
    pub async fn check_out_many(
        &self,
        guest_ids: Vec<Uuid>,
    ) -> Result<BulkCheckOutResult, ServiceError> {
        let mut ids = guest_ids;
        ids.sort();
        ids.dedup();

        let found = guest::Entity::find()
            .filter(guest::Column::Id.is_in(ids.clone()))
            .count(&*self.db)
            .await?;
        if found != ids.len() as u64 {
            return Err(ServiceError::NotFound(format!(
                "{} of {} selected guests do not exist",
                ids.len() as u64 - found,
                ids.len()
            )));
        }

        let mut result = BulkCheckOutResult {
            checked_out: Vec::new(),
            skipped: Vec::new(),
        };
        for guest_id in ids {
            let guest = self.check_out(guest_id).await?;
            if guest.room_id.is_some() {
                result.checked_out.push(guest_id);
            } else {
                result.skipped.push(guest_id);
            }
        }

        info!(
            checked_out = result.checked_out.len(),
            skipped = result.skipped.len(),
            "Bulk check-out completed"
        );
        Ok(result)
    }

    #[instrument(skip(self))]
    pub async fn get_guest(&self, guest_id: Uuid) -> Result<guest::Model, ServiceError> {
        guest::Entity::find_by_id(guest_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Guest", guest_id))
    }

    /// Lists guests, most recent check-in first
    #[instrument(skip(self))]
    pub async fn list_guests(
        &self,
        filter: GuestFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<guest::Model>, u64), ServiceError> {
        validate_pagination(page, limit)?;

        let mut query = guest::Entity::find();
        if let Some(room_id) = filter.room_id {
            query = query.filter(guest::Column::RoomId.eq(room_id));
        }
        if let Some(name) = normalize_search(filter.name.as_deref()) {
            query = query.filter(guest::Column::Name.contains(&name));
        }
        if let Some(term) = normalize_search(filter.search.as_deref()) {
            query = query.filter(
                Condition::any()
                    .add(guest::Column::Name.contains(&term))
                    .add(guest::Column::Surname.contains(&term))
                    .add(guest::Column::NationalId.contains(&term)),
            );
        }

        let paginator = query
            .order_by_desc(guest::Column::CheckInTime)
            .paginate(&*self.db, limit);
        let total = paginator.num_items().await?;
        let guests = paginator.fetch_page(page - 1).await?;

        Ok((guests, total))
    }

    #[instrument(skip(self))]
    pub async fn update_guest(
        &self,
        guest_id: Uuid,
        input: UpdateGuestInput,
    ) -> Result<guest::Model, ServiceError> {
        input.validate()?;
        let txn = self.db.begin().await?;

        let existing = guest::Entity::find_by_id(guest_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Guest", guest_id))?;
        let mut active: guest::ActiveModel = existing.clone().into();

        if let Some(name) = input.name.as_deref() {
            active.name = Set(required_text("name", name)?);
        }
        if let Some(surname) = input.surname.as_deref() {
            active.surname = Set(required_text("surname", surname)?);
        }
        if let Some(raw) = input.national_id.as_deref() {
            let national_id = normalize_national_id(Some(raw));
            if national_id != existing.national_id {
                if let Some(value) = national_id.as_deref() {
                    ensure_unique_national_id(&txn, value, Some(guest_id)).await?;
                }
                active.national_id = Set(national_id);
            }
        }
        if let Some(price_paid) = input.price_paid {
            active.price_paid = Set(Some(price_paid));
        }

        let updated = active.update(&txn).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::GuestUpdated(guest_id))
            .await;
        Ok(updated)
    }

    /// Deletes the guest. Their sales become walk-in sales, and a room
    /// still held by the guest is released.
    #[instrument(skip(self))]
    pub async fn delete_guest(&self, guest_id: Uuid) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;

        let guest = guest::Entity::find_by_id(guest_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Guest", guest_id))?;

        sale::Entity::update_many()
            .col_expr(sale::Column::GuestId, Expr::value(Option::<Uuid>::None))
            .filter(sale::Column::GuestId.eq(guest_id))
            .exec(&txn)
            .await?;

        let released_room = if guest.is_active() {
            guest.room_id
        } else {
            None
        };
        if let Some(room_id) = released_room {
            release(&txn, room_id).await?;
        }

        guest::Entity::delete_by_id(guest_id).exec(&txn).await?;
        txn.commit().await?;

        info!(%guest_id, released_room = ?released_room, "Guest deleted");
        self.event_sender
            .send_or_log(Event::GuestDeleted {
                guest_id,
                released_room,
            })
            .await;
        Ok(())
    }
}

/// Returns the guest and, when a room was released, its id
async fn check_out_in<C: ConnectionTrait>(
    conn: &C,
    guest_id: Uuid,
) -> Result<(guest::Model, Option<Uuid>), ServiceError> {
    let guest = guest::Entity::find_by_id(guest_id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::not_found("Guest", guest_id))?;

    let Some(room_id) = guest.room_id else {
        debug!(%guest_id, "Guest has no room; nothing to check out");
        return Ok((guest, None));
    };

    release(conn, room_id).await?;

    let mut active: guest::ActiveModel = guest.into();
    active.check_out_time = Set(Some(Utc::now()));
    let updated = active.update(conn).await?;

    Ok((updated, Some(room_id)))
}

fn required_text(field: &str, raw: &str) -> Result<String, ServiceError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(ServiceError::ValidationError(format!(
            "{} must not be blank",
            field
        )));
    }
    Ok(value.to_string())
}

fn normalize_national_id(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

async fn ensure_unique_national_id<C: ConnectionTrait>(
    conn: &C,
    national_id: &str,
    exclude: Option<Uuid>,
) -> Result<(), ServiceError> {
    let mut query = guest::Entity::find().filter(guest::Column::NationalId.eq(national_id));
    if let Some(id) = exclude {
        query = query.filter(guest::Column::Id.ne(id));
    }
    if query.count(conn).await? > 0 {
        return Err(ServiceError::UniquenessViolation(format!(
            "a guest with national id {} already exists",
            national_id
        )));
    }
    Ok(())
}
