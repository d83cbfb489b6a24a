//! Product Service
//!
//! Product records and operator stock changes. Stock taken by sales is
//! handled by the sale service.

use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::{normalize_search, validate_amount, validate_pagination};
use crate::entities::{category, product, sale};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateProductInput {
    #[validate(length(min = 1, max = 100))]
    #[schema(example = "Soap")]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[validate(range(min = 0, message = "Quantity must not be negative"))]
    #[serde(default)]
    pub quantity: i32,
    #[validate(custom = "validate_amount")]
    #[schema(value_type = String, example = "2.00")]
    pub price: Decimal,
    pub category_id: Uuid,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateProductInput {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    pub description: Option<String>,
    /// Stock count set by the operator after a physical count
    #[validate(range(min = 0, message = "Quantity must not be negative"))]
    pub quantity: Option<i32>,
    #[validate(custom = "validate_amount")]
    #[schema(value_type = Option<String>)]
    pub price: Option<Decimal>,
    pub category_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RestockInput {
    #[validate(range(min = 1, message = "Restock quantity must be positive"))]
    pub quantity: i32,
}

#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub category_id: Option<Uuid>,
    /// Substring match on name or description
    pub search: Option<String>,
    /// `Some(true)` keeps products with stock, `Some(false)` only sold-out ones
    pub in_stock: Option<bool>,
}

#[derive(Clone)]
pub struct ProductService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl ProductService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self))]
    pub async fn create_product(
        &self,
        input: CreateProductInput,
    ) -> Result<product::Model, ServiceError> {
        input.validate()?;
        let name = product_name(&input.name)?;
        let db = &*self.db;

        ensure_category_exists(db, input.category_id).await?;

        let created = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            description: Set(input.description.trim().to_string()),
            quantity: Set(input.quantity),
            price: Set(input.price),
            category_id: Set(input.category_id),
            ..Default::default()
        }
        .insert(db)
        .await?;

        info!(product_id = %created.id, quantity = created.quantity, "Product created");
        self.event_sender
            .send_or_log(Event::ProductCreated(created.id))
            .await;
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn update_product(
        &self,
        product_id: Uuid,
        input: UpdateProductInput,
    ) -> Result<product::Model, ServiceError> {
        input.validate()?;
        let db = &*self.db;
        let existing = self.get_product(product_id).await?;

        let mut active: product::ActiveModel = existing.into();
        if let Some(name) = input.name.as_deref() {
            active.name = Set(product_name(name)?);
        }
        if let Some(description) = input.description {
            active.description = Set(description.trim().to_string());
        }
        if let Some(quantity) = input.quantity {
            active.quantity = Set(quantity);
        }
        if let Some(price) = input.price {
            active.price = Set(price);
        }
        if let Some(category_id) = input.category_id {
            ensure_category_exists(db, category_id).await?;
            active.category_id = Set(category_id);
        }

        let updated = active.update(db).await?;
        self.event_sender
            .send_or_log(Event::ProductUpdated(product_id))
            .await;
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn get_product(&self, product_id: Uuid) -> Result<product::Model, ServiceError> {
        product::Entity::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", product_id))
    }

    /// Deletes a product that no sale refers to
    #[instrument(skip(self))]
    pub async fn delete_product(&self, product_id: Uuid) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;

        if product::Entity::find_by_id(product_id)
            .one(&txn)
            .await?
            .is_none()
        {
            return Err(ServiceError::not_found("Product", product_id));
        }

        let sales = sale::Entity::find()
            .filter(sale::Column::ProductId.eq(product_id))
            .count(&txn)
            .await?;
        if sales > 0 {
            return Err(ServiceError::ReferencedRecord(format!(
                "product {} is referenced by {} sale(s)",
                product_id, sales
            )));
        }

        product::Entity::delete_by_id(product_id)
            .exec(&txn)
            .await?;
        txn.commit().await?;

        info!(%product_id, "Product deleted");
        self.event_sender
            .send_or_log(Event::ProductDeleted(product_id))
            .await;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        filter: ProductFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<product::Model>, u64), ServiceError> {
        validate_pagination(page, limit)?;

        let mut query = product::Entity::find();
        if let Some(category_id) = filter.category_id {
            query = query.filter(product::Column::CategoryId.eq(category_id));
        }
        if let Some(term) = normalize_search(filter.search.as_deref()) {
            query = query.filter(
                Condition::any()
                    .add(product::Column::Name.contains(&term))
                    .add(product::Column::Description.contains(&term)),
            );
        }
        match filter.in_stock {
            Some(true) => query = query.filter(product::Column::Quantity.gt(0)),
            Some(false) => query = query.filter(product::Column::Quantity.eq(0)),
            None => {}
        }

        let paginator = query
            .order_by_asc(product::Column::Name)
            .paginate(&*self.db, limit);
        let total = paginator.num_items().await?;
        let products = paginator.fetch_page(page - 1).await?;

        Ok((products, total))
    }

    /// Products that can currently be sold
    #[instrument(skip(self))]
    pub async fn list_in_stock(&self) -> Result<Vec<product::Model>, ServiceError> {
        Ok(product::Entity::find()
            .filter(product::Column::Quantity.gt(0))
            .order_by_asc(product::Column::Name)
            .all(&*self.db)
            .await?)
    }

    /// Adds stock with a single increment so concurrent sales are not lost
    #[instrument(skip(self))]
    pub async fn restock(
        &self,
        product_id: Uuid,
        input: RestockInput,
    ) -> Result<product::Model, ServiceError> {
        input.validate()?;
        let txn = self.db.begin().await?;

        let result = product::Entity::update_many()
            .col_expr(
                product::Column::Quantity,
                Expr::col(product::Column::Quantity).add(input.quantity),
            )
            .filter(product::Column::Id.eq(product_id))
            .filter(product::Column::Quantity.lte(i32::MAX - input.quantity))
            .exec(&txn)
            .await?;
        if result.rows_affected == 0 {
            let current = product::Entity::find_by_id(product_id)
                .one(&txn)
                .await?
                .ok_or_else(|| ServiceError::not_found("Product", product_id))?;
            return Err(ServiceError::ValidationError(format!(
                "Restocking {} units would exceed the maximum stock ({} on hand)",
                input.quantity, current.quantity
            )));
        }

        let restocked = product::Entity::find_by_id(product_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", product_id))?;
        txn.commit().await?;

        info!(%product_id, added = input.quantity, quantity = restocked.quantity, "Product restocked");
        self.event_sender
            .send_or_log(Event::StockRestocked {
                product_id,
                quantity: input.quantity,
                new_quantity: restocked.quantity,
            })
            .await;
        Ok(restocked)
    }
}

fn product_name(raw: &str) -> Result<String, ServiceError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ServiceError::ValidationError(
            "Product name must not be blank".to_string(),
        ));
    }
    Ok(name.to_string())
}

async fn ensure_category_exists(
    db: &DatabaseConnection,
    category_id: Uuid,
) -> Result<(), ServiceError> {
    match category::Entity::find_by_id(category_id).one(db).await? {
        Some(_) => Ok(()),
        None => Err(ServiceError::not_found("Category", category_id)),
    }
}
