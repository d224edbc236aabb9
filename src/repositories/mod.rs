//! Entity store abstraction used by the importer and seeding code.
//!
//! Each parent entity exposes `find` by natural key and
//! `create_if_absent` (get-or-create). The importer depends only on
//! the [`EntityStore`] trait so tests can substitute an in-memory
//! fake for the SeaORM-backed implementation.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::entities::{client, locality, order, product, Category, Region, Segment};
use crate::errors::ServiceError;

mod store;

pub use store::SeaOrmEntityStore;

/// Row-derived attributes for a client created on first sight
#[derive(Debug, Clone)]
pub struct NewClient {
    pub id: String,
    pub name: String,
    pub segment: Segment,
}

#[derive(Debug, Clone)]
pub struct NewLocality {
    pub postal_code: i64,
    pub city: String,
    pub state: String,
    pub region: Region,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub id: String,
    pub name: String,
    pub category: Category,
    pub subcategory: String,
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub id: String,
    pub order_date: NaiveDate,
    pub delivery_date: NaiveDate,
    pub delivery_mode: String,
}

#[derive(Debug, Clone)]
pub struct NewOrderLine {
    pub order_id: String,
    pub product_id: String,
    pub client_id: String,
    pub locality_id: i32,
    pub quantity: i32,
    pub price: f64,
    pub discount: f64,
    pub profit: f64,
}

/// Persistence operations needed to reconcile imported rows.
///
/// `create_*_if_absent` follows get-or-create semantics: when a row
/// with the same natural key already exists its attributes are left
/// untouched (first occurrence wins).
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn find_client(&self, id: &str) -> Result<Option<client::Model>, ServiceError>;
    async fn create_client_if_absent(&self, client: NewClient) -> Result<(), ServiceError>;

    async fn find_locality(
        &self,
        postal_code: i64,
    ) -> Result<Option<locality::Model>, ServiceError>;
    async fn create_locality_if_absent(&self, locality: NewLocality) -> Result<(), ServiceError>;

    async fn find_product(&self, id: &str) -> Result<Option<product::Model>, ServiceError>;
    async fn create_product_if_absent(&self, product: NewProduct) -> Result<(), ServiceError>;

    async fn find_order(&self, id: &str) -> Result<Option<order::Model>, ServiceError>;
    async fn create_order_if_absent(&self, order: NewOrder) -> Result<(), ServiceError>;

    async fn create_order_line(&self, line: NewOrderLine) -> Result<(), ServiceError>;
}
