//! Category Service
//!
//! Labels that group products. Removing a category removes its products,
//! which is refused once any of them has been sold.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::entities::{category, product, sale};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CategoryInput {
    #[validate(length(min = 1, max = 100))]
    #[schema(example = "Toiletries")]
    pub name: String,
}

#[derive(Clone)]
pub struct CategoryService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl CategoryService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self))]
    pub async fn create_category(
        &self,
        input: CategoryInput,
    ) -> Result<category::Model, ServiceError> {
        input.validate()?;
        let name = category_name(&input.name)?;

        let created = category::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.db)
        .await?;

        self.event_sender
            .send_or_log(Event::CategoryCreated(created.id))
            .await;
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn rename_category(
        &self,
        category_id: Uuid,
        input: CategoryInput,
    ) -> Result<category::Model, ServiceError> {
        input.validate()?;
        let existing = self.get_category(category_id).await?;

        let mut active: category::ActiveModel = existing.into();
        active.name = Set(category_name(&input.name)?);
        let renamed = active.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::CategoryUpdated(category_id))
            .await;
        Ok(renamed)
    }

    #[instrument(skip(self))]
    pub async fn get_category(&self, category_id: Uuid) -> Result<category::Model, ServiceError> {
        category::Entity::find_by_id(category_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Category", category_id))
    }

    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<category::Model>, ServiceError> {
        Ok(category::Entity::find()
            .order_by_asc(category::Column::Name)
            .all(&*self.db)
            .await?)
    }

    /// Deletes the category together with its products.
    ///
    /// Refused with `ReferencedRecord` while any of those products has sales.
    #[instrument(skip(self))]
    pub async fn delete_category(&self, category_id: Uuid) -> Result<u64, ServiceError> {
        let txn = self.db.begin().await?;

        if category::Entity::find_by_id(category_id)
            .one(&txn)
            .await?
            .is_none()
        {
            return Err(ServiceError::not_found("Category", category_id));
        }

        let product_ids: Vec<Uuid> = product::Entity::find()
            .select_only()
            .column(product::Column::Id)
            .filter(product::Column::CategoryId.eq(category_id))
            .into_tuple()
            .all(&txn)
            .await?;

        if !product_ids.is_empty() {
            let referencing_sales = sale::Entity::find()
                .filter(sale::Column::ProductId.is_in(product_ids.clone()))
                .count(&txn)
                .await?;
            if referencing_sales > 0 {
                return Err(ServiceError::ReferencedRecord(format!(
                    "category {} has products referenced by {} sale(s)",
                    category_id, referencing_sales
                )));
            }
        }

        let removed = product::Entity::delete_many()
            .filter(product::Column::CategoryId.eq(category_id))
            .exec(&txn)
            .await?;
        category::Entity::delete_by_id(category_id)
            .exec(&txn)
            .await?;
        txn.commit().await?;

        info!(%category_id, products_removed = removed.rows_affected, "Category deleted");
        self.event_sender
            .send_or_log(Event::CategoryDeleted {
                category_id,
                products_removed: removed.rows_affected,
            })
            .await;
        Ok(removed.rows_affected)
    }
}

fn category_name(raw: &str) -> Result<String, ServiceError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ServiceError::ValidationError(
            "Category name must not be blank".to_string(),
        ));
    }
    Ok(name.to_string())
}
