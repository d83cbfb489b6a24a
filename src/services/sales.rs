//! Sale Service
//!
//! Recording a sale takes the units from stock and fixes the total in one
//! transaction. The decrement is conditional on enough stock remaining, so
//! concurrent sales can never drive a product below zero.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionError, TransactionTrait,
};
use serde::{Deserialize, Deserializer};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::{validate_pagination, MAX_SALE_TOTAL};
use crate::entities::{guest, product, sale};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RecordSaleInput {
    pub product_id: Uuid,
    #[validate(range(min = 1, message = "Quantity must be positive"))]
    #[schema(example = 3)]
    pub quantity: i32,
    /// Omit for a walk-in customer
    pub guest_id: Option<Uuid>,
}

/// Only the quantity and the customer can change after a sale is recorded.
/// Neither change touches product stock, and the total stays as recorded.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateSaleInput {
    #[validate(range(min = 1, message = "Quantity must be positive"))]
    pub quantity: Option<i32>,
    /// Absent keeps the customer, `null` makes it a walk-in sale
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<Uuid>)]
    pub guest_id: Option<Option<Uuid>>,
}

/// Maps a present field (including `null`) to `Some`, leaving absence to `default`
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Default)]
pub struct SaleFilter {
    pub product_id: Option<Uuid>,
    pub guest_id: Option<Uuid>,
}

/// Sale total at the given unit price
pub fn compute_total(quantity: i32, unit_price: Decimal) -> Decimal {
    Decimal::from(quantity) * unit_price
}

#[derive(Clone)]
pub struct SaleService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl SaleService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Records a sale, decrementing stock and computing the total atomically.
    ///
    /// Fails with `InsufficientStock` when the product has fewer units than
    /// requested; in that case neither the product nor any sale is written.
    #[instrument(skip(self))]
    pub async fn record_sale(&self, input: RecordSaleInput) -> Result<sale::Model, ServiceError> {
        input.validate()?;
        let RecordSaleInput {
            product_id,
            quantity,
            guest_id,
        } = input;

        let (recorded, remaining) = self
            .db
            .transaction::<_, (sale::Model, i32), ServiceError>(move |txn| {
                Box::pin(async move {
                    // The guarded decrement is the first statement, so the
                    // transaction takes the write lock before reading anything.
                    let taken = product::Entity::update_many()
                        .col_expr(
                            product::Column::Quantity,
                            Expr::col(product::Column::Quantity).sub(quantity),
                        )
                        .filter(product::Column::Id.eq(product_id))
                        .filter(product::Column::Quantity.gte(quantity))
                        .exec(txn)
                        .await?;

                    let product = product::Entity::find_by_id(product_id)
                        .one(txn)
                        .await?
                        .ok_or_else(|| ServiceError::not_found("Product", product_id))?;

                    if taken.rows_affected == 0 {
                        return Err(ServiceError::InsufficientStock {
                            product: product.name,
                            available: product.quantity,
                            requested: quantity,
                        });
                    }

                    let total = compute_total(quantity, product.price);
                    if total >= MAX_SALE_TOTAL {
                        return Err(ServiceError::ValidationError(format!(
                            "Sale total {} exceeds the maximum of {}",
                            total, MAX_SALE_TOTAL
                        )));
                    }

                    if let Some(guest_id) = guest_id {
                        if guest::Entity::find_by_id(guest_id).one(txn).await?.is_none() {
                            return Err(ServiceError::not_found("Guest", guest_id));
                        }
                    }

                    let recorded = sale::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        sold_at: Set(Utc::now()),
                        product_id: Set(product_id),
                        quantity: Set(quantity),
                        total: Set(total),
                        guest_id: Set(guest_id),
                    }
                    .insert(txn)
                    .await?;

                    Ok((recorded, product.quantity))
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::from(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })
            .map_err(|e| {
                if let ServiceError::InsufficientStock { available, .. } = &e {
                    warn!(%product_id, requested = quantity, available, "Sale rejected");
                }
                e
            })?;

        info!(
            sale_id = %recorded.id,
            %product_id,
            quantity,
            total = %recorded.total,
            remaining,
            "Sale recorded"
        );
        self.event_sender
            .send_or_log(Event::SaleRecorded {
                sale_id: recorded.id,
                product_id,
                quantity,
                total: recorded.total,
                remaining_stock: remaining,
            })
            .await;

        Ok(recorded)
    }

    /// Edits a recorded sale without touching stock or the total
    #[instrument(skip(self))]
    pub async fn update_sale(
        &self,
        sale_id: Uuid,
        input: UpdateSaleInput,
    ) -> Result<sale::Model, ServiceError> {
        input.validate()?;
        let db = &*self.db;
        let existing = self.get_sale(sale_id).await?;

        let mut active: sale::ActiveModel = existing.into();
        if let Some(quantity) = input.quantity {
            active.quantity = Set(quantity);
        }
        match input.guest_id {
            Some(Some(guest_id)) => {
                if guest::Entity::find_by_id(guest_id).one(db).await?.is_none() {
                    return Err(ServiceError::not_found("Guest", guest_id));
                }
                active.guest_id = Set(Some(guest_id));
            }
            Some(None) => active.guest_id = Set(None),
            None => {}
        }

        let updated = active.update(db).await?;
        self.event_sender
            .send_or_log(Event::SaleUpdated(sale_id))
            .await;
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn get_sale(&self, sale_id: Uuid) -> Result<sale::Model, ServiceError> {
        sale::Entity::find_by_id(sale_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Sale", sale_id))
    }

    /// Lists sales, newest first
    #[instrument(skip(self))]
    pub async fn list_sales(
        &self,
        filter: SaleFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<sale::Model>, u64), ServiceError> {
        validate_pagination(page, limit)?;

        let mut query = sale::Entity::find();
        if let Some(product_id) = filter.product_id {
            query = query.filter(sale::Column::ProductId.eq(product_id));
        }
        if let Some(guest_id) = filter.guest_id {
            query = query.filter(sale::Column::GuestId.eq(guest_id));
        }

        let paginator = query
            .order_by_desc(sale::Column::SoldAt)
            .paginate(&*self.db, limit);
        let total = paginator.num_items().await?;
        let sales = paginator.fetch_page(page - 1).await?;

        Ok((sales, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn total_is_quantity_times_unit_price() {
        assert_eq!(compute_total(3, dec!(2.00)), dec!(6.00));
        assert_eq!(compute_total(1, dec!(0.99)), dec!(0.99));
        assert_eq!(compute_total(12, dec!(1.25)), dec!(15.00));
    }
}
