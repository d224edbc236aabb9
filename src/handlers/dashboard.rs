//! Dashboard page handlers.

use axum::{
    extract::{Path, State},
    response::Html,
};

use crate::entities::Segment;
use crate::errors::ServiceError;
use crate::services::dashboard::build_region_pie_chart;
use crate::AppState;

use super::{html_escape, render_page};

/// GET / — the main dashboard: regional sales pie and the Consumer
/// revenue headline.
pub async fn home(State(state): State<AppState>) -> Result<Html<String>, ServiceError> {
    let slices = state.dashboard.region_quantity_breakdown().await?;
    let revenue = state.dashboard.consumer_revenue().await?;

    let chart = build_region_pie_chart(&slices);
    let chart_json = serde_json::to_string(&chart)
        .map_err(|e| ServiceError::InternalError(format!("chart serialization failed: {}", e)))?;

    let body = format!(
        "<h1>Sales dashboard</h1>\n\
         <p>Consumer revenue: <strong>{revenue:.2}</strong></p>\n\
         <div id=\"region-pie\"></div>\n\
         <script id=\"region-pie-data\" type=\"application/json\">{chart_json}</script>\n",
    );

    Ok(Html(render_page("Sales dashboard", &body)))
}

/// GET /dashbord_2/ — headline counts.
pub async fn overview(State(state): State<AppState>) -> Result<Html<String>, ServiceError> {
    let counts = state.dashboard.counts().await?;

    let body = format!(
        "<h1>Overview</h1>\n\
         <ul>\n<li>Clients: {}</li>\n<li>Products: {}</li>\n</ul>\n",
        counts.clients, counts.products,
    );

    Ok(Html(render_page("Overview", &body)))
}

/// GET /{segment}/liste/ — order lines for one client segment.
pub async fn segment_list(
    State(state): State<AppState>,
    Path(segment): Path<String>,
) -> Result<Html<String>, ServiceError> {
    let segment = segment_from_path(&segment)
        .ok_or_else(|| ServiceError::NotFound(format!("unknown segment: {}", segment)))?;

    let lines = state.dashboard.segment_lines(segment).await?;

    let mut rows = String::new();
    for line in &lines {
        rows.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{:.2}</td></tr>\n",
            html_escape(&line.order_id),
            html_escape(&line.product_id),
            html_escape(&line.client_id),
            line.quantity,
            line.price,
        ));
    }

    let body = format!(
        "<h1>{segment} orders</h1>\n\
         <table>\n<thead><tr><th>Order</th><th>Product</th><th>Client</th><th>Quantity</th><th>Price</th></tr></thead>\n\
         <tbody>\n{rows}</tbody>\n</table>\n",
        segment = html_escape(segment.as_str()),
    );

    Ok(Html(render_page(
        &format!("{} orders", segment.as_str()),
        &body,
    )))
}

/// Maps a URL path segment onto a client segment. Accepts the display
/// name as well as slugged spellings ("home-office", "home_office").
fn segment_from_path(raw: &str) -> Option<Segment> {
    let normalized = raw.trim().to_lowercase().replace(['-', '_'], " ");
    match normalized.as_str() {
        "consumer" => Some(Segment::Consumer),
        "corporate" => Some(Segment::Corporate),
        "home office" => Some(Segment::HomeOffice),
        _ => None,
    }
}
