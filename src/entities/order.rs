use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    /// External order identifier (natural key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub order_date: Date,
    pub delivery_date: Date,
    pub delivery_mode: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order_line::Entity")]
    OrderLine,
}

impl Related<super::order_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderLine.def()
    }
}

/// Orders relate to products many-to-many through order lines
impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        super::order_line::Relation::Product.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::order_line::Relation::Order.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
