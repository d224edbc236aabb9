use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use std::sync::Arc;

use crate::entities::{client, locality, order, order_line, product};
use crate::errors::ServiceError;

use super::{EntityStore, NewClient, NewLocality, NewOrder, NewOrderLine, NewProduct};

/// SeaORM-backed entity store
#[derive(Debug, Clone)]
pub struct SeaOrmEntityStore {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmEntityStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

#[async_trait]
impl EntityStore for SeaOrmEntityStore {
    async fn find_client(&self, id: &str) -> Result<Option<client::Model>, ServiceError> {
        client::Entity::find_by_id(id)
            .one(self.db())
            .await
            .map_err(ServiceError::DatabaseError)
    }

    async fn create_client_if_absent(&self, new: NewClient) -> Result<(), ServiceError> {
        if self.find_client(&new.id).await?.is_some() {
            return Ok(());
        }

        client::ActiveModel {
            id: Set(new.id),
            name: Set(new.name),
            segment: Set(new.segment.as_str().to_string()),
        }
        .insert(self.db())
        .await
        .map_err(ServiceError::DatabaseError)?;

        Ok(())
    }

    async fn find_locality(
        &self,
        postal_code: i64,
    ) -> Result<Option<locality::Model>, ServiceError> {
        locality::Entity::find()
            .filter(locality::Column::PostalCode.eq(postal_code))
            .one(self.db())
            .await
            .map_err(ServiceError::DatabaseError)
    }

    async fn create_locality_if_absent(&self, new: NewLocality) -> Result<(), ServiceError> {
        if self.find_locality(new.postal_code).await?.is_some() {
            return Ok(());
        }

        locality::ActiveModel {
            postal_code: Set(new.postal_code),
            city: Set(new.city),
            state: Set(new.state),
            region: Set(new.region.as_str().to_string()),
            ..Default::default()
        }
        .insert(self.db())
        .await
        .map_err(ServiceError::DatabaseError)?;

        Ok(())
    }

    async fn find_product(&self, id: &str) -> Result<Option<product::Model>, ServiceError> {
        product::Entity::find_by_id(id)
            .one(self.db())
            .await
            .map_err(ServiceError::DatabaseError)
    }

    async fn create_product_if_absent(&self, new: NewProduct) -> Result<(), ServiceError> {
        if self.find_product(&new.id).await?.is_some() {
            return Ok(());
        }

        product::ActiveModel {
            id: Set(new.id),
            name: Set(new.name),
            category: Set(new.category.as_str().to_string()),
            subcategory: Set(new.subcategory),
        }
        .insert(self.db())
        .await
        .map_err(ServiceError::DatabaseError)?;

        Ok(())
    }

    async fn find_order(&self, id: &str) -> Result<Option<order::Model>, ServiceError> {
        order::Entity::find_by_id(id)
            .one(self.db())
            .await
            .map_err(ServiceError::DatabaseError)
    }

    async fn create_order_if_absent(&self, new: NewOrder) -> Result<(), ServiceError> {
        if self.find_order(&new.id).await?.is_some() {
            return Ok(());
        }

        order::ActiveModel {
            id: Set(new.id),
            order_date: Set(new.order_date),
            delivery_date: Set(new.delivery_date),
            delivery_mode: Set(new.delivery_mode),
        }
        .insert(self.db())
        .await
        .map_err(ServiceError::DatabaseError)?;

        Ok(())
    }

    async fn create_order_line(&self, line: NewOrderLine) -> Result<(), ServiceError> {
        order_line::ActiveModel {
            order_id: Set(line.order_id),
            product_id: Set(line.product_id),
            client_id: Set(line.client_id),
            locality_id: Set(line.locality_id),
            quantity: Set(line.quantity),
            price: Set(line.price),
            discount: Set(line.discount),
            profit: Set(line.profit),
            ..Default::default()
        }
        .insert(self.db())
        .await
        .map_err(ServiceError::DatabaseError)?;

        Ok(())
    }
}
