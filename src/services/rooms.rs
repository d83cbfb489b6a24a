//! Room Service
//!
//! Room records and the availability lifecycle. Check-in and check-out go
//! through [`occupy`] and [`release`] so the flag is only ever flipped inside
//! the caller's transaction.

use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::{normalize_search, validate_amount, validate_pagination};
use crate::entities::{guest, room};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateRoomInput {
    #[validate(length(min = 1, max = 10, message = "Room number must be 1-10 characters"))]
    #[schema(example = "101")]
    pub number: String,
    #[validate(custom = "validate_amount")]
    #[schema(value_type = String, example = "85.00")]
    pub price: Decimal,
    #[serde(default)]
    pub has_aircon: bool,
}

/// Availability is not editable here; it follows check-in and check-out.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateRoomInput {
    #[validate(length(min = 1, max = 10, message = "Room number must be 1-10 characters"))]
    pub number: Option<String>,
    #[validate(custom = "validate_amount")]
    #[schema(value_type = Option<String>)]
    pub price: Option<Decimal>,
    pub has_aircon: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct RoomFilter {
    pub available: Option<bool>,
    /// Substring match on the room number
    pub search: Option<String>,
}

#[derive(Clone)]
pub struct RoomService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl RoomService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self))]
    pub async fn create_room(&self, input: CreateRoomInput) -> Result<room::Model, ServiceError> {
        input.validate()?;
        let number = normalize_number(&input.number)?;
        let db = &*self.db;

        ensure_unique_number(db, &number, None).await?;

        let created = room::ActiveModel {
            id: Set(Uuid::new_v4()),
            number: Set(number),
            available: Set(true),
            price: Set(input.price),
            has_aircon: Set(input.has_aircon),
            ..Default::default()
        }
        .insert(db)
        .await?;

        info!(room_id = %created.id, number = %created.number, "Room created");
        self.event_sender
            .send_or_log(Event::RoomCreated(created.id))
            .await;

        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn update_room(
        &self,
        room_id: Uuid,
        input: UpdateRoomInput,
    ) -> Result<room::Model, ServiceError> {
        input.validate()?;
        let db = &*self.db;
        let existing = self.get_room(room_id).await?;

        let mut active: room::ActiveModel = existing.clone().into();
        if let Some(number) = input.number.as_deref() {
            let number = normalize_number(number)?;
            if number != existing.number {
                ensure_unique_number(db, &number, Some(room_id)).await?;
                active.number = Set(number);
            }
        }
        if let Some(price) = input.price {
            active.price = Set(price);
        }
        if let Some(has_aircon) = input.has_aircon {
            active.has_aircon = Set(has_aircon);
        }

        let updated = active.update(db).await?;
        self.event_sender
            .send_or_log(Event::RoomUpdated(updated.id))
            .await;
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn get_room(&self, room_id: Uuid) -> Result<room::Model, ServiceError> {
        room::Entity::find_by_id(room_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Room", room_id))
    }

    /// Deletes the room; guests that referenced it keep their history with
    /// the room reference cleared.
    #[instrument(skip(self))]
    pub async fn delete_room(&self, room_id: Uuid) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;

        if room::Entity::find_by_id(room_id).one(&txn).await?.is_none() {
            return Err(ServiceError::not_found("Room", room_id));
        }

        let detached = guest::Entity::update_many()
            .col_expr(guest::Column::RoomId, Expr::value(Option::<Uuid>::None))
            .filter(guest::Column::RoomId.eq(room_id))
            .exec(&txn)
            .await?;

        room::Entity::delete_by_id(room_id).exec(&txn).await?;
        txn.commit().await?;

        info!(%room_id, guests_detached = detached.rows_affected, "Room deleted");
        self.event_sender
            .send_or_log(Event::RoomDeleted(room_id))
            .await;
        Ok(())
    }

    /// Lists rooms ordered by number, returning the page and the total count
    #[instrument(skip(self))]
    pub async fn list_rooms(
        &self,
        filter: RoomFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<room::Model>, u64), ServiceError> {
        validate_pagination(page, limit)?;

        let mut query = room::Entity::find();
        if let Some(available) = filter.available {
            query = query.filter(room::Column::Available.eq(available));
        }
        if let Some(term) = normalize_search(filter.search.as_deref()) {
            query = query.filter(room::Column::Number.contains(&term));
        }

        let paginator = query
            .order_by_asc(room::Column::Number)
            .paginate(&*self.db, limit);
        let total = paginator.num_items().await?;
        let rooms = paginator.fetch_page(page - 1).await?;

        Ok((rooms, total))
    }

    /// Rooms a new guest can be assigned to
    #[instrument(skip(self))]
    pub async fn list_available_rooms(&self) -> Result<Vec<room::Model>, ServiceError> {
        Ok(room::Entity::find()
            .filter(room::Column::Available.eq(true))
            .order_by_asc(room::Column::Number)
            .all(&*self.db)
            .await?)
    }
}

fn normalize_number(raw: &str) -> Result<String, ServiceError> {
    let number = raw.trim();
    if number.is_empty() {
        return Err(ServiceError::ValidationError(
            "Room number must not be blank".to_string(),
        ));
    }
    Ok(number.to_string())
}

async fn ensure_unique_number<C: ConnectionTrait>(
    conn: &C,
    number: &str,
    exclude: Option<Uuid>,
) -> Result<(), ServiceError> {
    let mut query = room::Entity::find().filter(room::Column::Number.eq(number));
    if let Some(id) = exclude {
        query = query.filter(room::Column::Id.ne(id));
    }
    if query.count(conn).await? > 0 {
        return Err(ServiceError::UniquenessViolation(format!(
            "room number {} is already in use",
            number
        )));
    }
    Ok(())
}

/// Marks the room occupied if, and only if, it is currently available.
///
/// The flip is a single conditional update, so of two concurrent check-ins
/// for the same room exactly one sees an affected row.
pub(crate) async fn occupy<C: ConnectionTrait>(conn: &C, room_id: Uuid) -> Result<(), ServiceError> {
    let result = room::Entity::update_many()
        .col_expr(room::Column::Available, Expr::value(false))
        .filter(room::Column::Id.eq(room_id))
        .filter(room::Column::Available.eq(true))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        return match room::Entity::find_by_id(room_id).one(conn).await? {
            None => Err(ServiceError::not_found("Room", room_id)),
            Some(room) => Err(ServiceError::RoomUnavailable(format!(
                "room {} is already occupied",
                room.number
            ))),
        };
    }
    Ok(())
}

/// Marks the room available again. Releasing an already available room is
/// allowed.
pub(crate) async fn release<C: ConnectionTrait>(conn: &C, room_id: Uuid) -> Result<(), ServiceError> {
    let result = room::Entity::update_many()
        .col_expr(room::Column::Available, Expr::value(true))
        .filter(room::Column::Id.eq(room_id))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        return Err(ServiceError::not_found("Room", room_id));
    }
    Ok(())
}
