//! Aggregate queries backing the dashboard pages.

use sea_orm::{
    ColumnTrait, EntityTrait, JoinType, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    RelationTrait,
};
use serde::Serialize;
use std::sync::Arc;

use crate::db::DbPool;
use crate::entities::{client, locality, order_line, Segment};
use crate::errors::ServiceError;

/// Palette used for the regional pie chart
const REGION_COLORS: [&str; 4] = ["#FCC6BB", "#F87C63", "#C82909", "#701705"];

/// One pie slice: total quantity sold in a region
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RegionSlice {
    pub region: String,
    pub quantity: i64,
}

/// Chart payload embedded into the dashboard page
#[derive(Debug, Clone, Serialize)]
pub struct PieChart {
    pub labels: Vec<String>,
    pub values: Vec<i64>,
    pub colors: Vec<String>,
}

/// Headline numbers for the secondary dashboard
#[derive(Debug, Clone, Copy, Serialize)]
pub struct DashboardCounts {
    pub clients: u64,
    pub products: u64,
}

/// Read-side service for dashboard aggregates
#[derive(Clone)]
pub struct DashboardService {
    db_pool: Arc<DbPool>,
}

impl DashboardService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Total revenue over lines sold to Consumer-segment clients,
    /// rounded to cents.
    pub async fn consumer_revenue(&self) -> Result<f64, ServiceError> {
        let total: Option<Option<f64>> = order_line::Entity::find()
            .join(JoinType::InnerJoin, order_line::Relation::Client.def())
            .filter(client::Column::Segment.eq(Segment::Consumer.as_str()))
            .select_only()
            .column_as(order_line::Column::Price.sum(), "total")
            .into_tuple()
            .one(&*self.db_pool)
            .await?;

        let revenue = total.flatten().unwrap_or(0.0);
        Ok((revenue * 100.0).round() / 100.0)
    }

    /// Quantity of products sold per region, for the pie chart.
    pub async fn region_quantity_breakdown(&self) -> Result<Vec<RegionSlice>, ServiceError> {
        let rows: Vec<(String, i64)> = order_line::Entity::find()
            .join(JoinType::InnerJoin, order_line::Relation::Locality.def())
            .select_only()
            .column(locality::Column::Region)
            .column_as(order_line::Column::Quantity.sum(), "quantity")
            .group_by(locality::Column::Region)
            .order_by_asc(locality::Column::Region)
            .into_tuple()
            .all(&*self.db_pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(region, quantity)| RegionSlice { region, quantity })
            .collect())
    }

    /// Client and product counts for the secondary dashboard.
    pub async fn counts(&self) -> Result<DashboardCounts, ServiceError> {
        let clients = client::Entity::find().count(&*self.db_pool).await?;
        let products = crate::entities::product::Entity::find()
            .count(&*self.db_pool)
            .await?;

        Ok(DashboardCounts { clients, products })
    }

    /// Order lines for one client segment, in the default
    /// by-product ordering.
    pub async fn segment_lines(
        &self,
        segment: Segment,
    ) -> Result<Vec<order_line::Model>, ServiceError> {
        order_line::Entity::find()
            .join(JoinType::InnerJoin, order_line::Relation::Client.def())
            .filter(client::Column::Segment.eq(segment.as_str()))
            .order_by_asc(order_line::Column::ProductId)
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::DatabaseError)
    }
}

/// Builds the pie-chart payload from the per-region slices. Rendering
/// itself happens client-side; this is only the labeled dataset.
pub fn build_region_pie_chart(slices: &[RegionSlice]) -> PieChart {
    PieChart {
        labels: slices.iter().map(|s| s.region.clone()).collect(),
        values: slices.iter().map(|s| s.quantity).collect(),
        colors: slices
            .iter()
            .enumerate()
            .map(|(i, _)| REGION_COLORS[i % REGION_COLORS.len()].to_string())
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chart_payload_matches_slices() {
        let slices = vec![
            RegionSlice {
                region: "Central".to_string(),
                quantity: 12,
            },
            RegionSlice {
                region: "West".to_string(),
                quantity: 7,
            },
        ];

        let chart = build_region_pie_chart(&slices);
        assert_eq!(chart.labels, vec!["Central", "West"]);
        assert_eq!(chart.values, vec![12, 7]);
        assert_eq!(chart.colors.len(), 2);
    }

    #[test]
    fn palette_wraps_past_four_regions() {
        let slices: Vec<RegionSlice> = (0..6)
            .map(|i| RegionSlice {
                region: format!("R{}", i),
                quantity: i,
            })
            .collect();
        let chart = build_region_pie_chart(&slices);
        assert_eq!(chart.colors[4], chart.colors[0]);
    }
}
