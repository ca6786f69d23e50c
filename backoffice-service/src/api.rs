use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
    routing::{get, patch, post, put},
    Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use shared::stats::{OrderStats, RevenueReport, StatsScope};
use shared::{
    AdminNotification, Order, OrderItem, OrderStatus, OrderType, PaymentStatus, PaymentUpdate,
    Table, TableStatus, TableSummary,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::handlers::BackOffice;

#[derive(Clone)]
pub struct AppState {
    pub back_office: Arc<BackOffice>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub customer_name: String,
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub order_type: OrderType,
    pub table_number: Option<String>,
    pub delivery_address: Option<String>,
    pub payment_method: String,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableStatusRequest {
    pub status: TableStatus,
    pub order_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignOrderRequest {
    pub order_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityQuery {
    #[serde(default)]
    pub min_capacity: u32,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, error: impl Into<String>) -> ApiError {
    (status, Json(ErrorResponse { error: error.into() }))
}

fn not_found(what: &str, id: &str) -> ApiError {
    api_error(StatusCode::NOT_FOUND, format!("{} {} not found", what, id))
}

fn internal(e: impl Into<anyhow::Error>) -> ApiError {
    let e = e.into();
    tracing::error!("Request failed: {:#}", e);
    api_error(StatusCode::INTERNAL_SERVER_ERROR, format!("{:#}", e))
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/orders", get(list_orders).post(create_order))
        .route("/orders/stats", get(order_stats))
        .route("/orders/revenue", get(revenue_report))
        .route("/orders/export.csv", get(export_orders))
        .route("/orders/:id", get(get_order).delete(delete_order))
        .route("/orders/:id/status", patch(update_order_status))
        .route("/orders/:id/payment", patch(update_payment))
        .route("/tables", get(list_tables))
        .route("/tables/summary", get(table_summary))
        .route("/tables/available", get(available_tables))
        .route("/tables/reset", post(reset_tables))
        .route("/tables/:id", get(get_table))
        .route("/tables/:id/status", put(update_table_status))
        .route("/tables/:id/assign", post(assign_order))
        .route("/tables/:id/free", post(free_table))
        .route("/notifications", get(list_notifications))
        .route("/notifications/:id/read", post(mark_notification_read))
        .route("/health", get(health_check))
        .with_state(state)
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
}

pub async fn list_orders(State(state): State<AppState>) -> Json<Vec<Order>> {
    Json(state.back_office.list_orders().await)
}

pub async fn create_order(
    State(state): State<AppState>,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    if request.items.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "An order needs at least one item"));
    }
    if request.order_type == OrderType::Delivery && request.delivery_address.is_none() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Delivery orders need an address"));
    }

    let mut order = Order {
        id: Uuid::new_v4().to_string(),
        items: request.items,
        status: OrderStatus::Pending,
        total: 0.0,
        payment_status: PaymentStatus::Pending,
        payment_method: request.payment_method,
        table: request.table_number,
        timestamp: Utc::now(),
        customer_name: request.customer_name,
        customer_phone: request.customer_phone,
        order_type: request.order_type,
        delivery_address: request.delivery_address,
    };
    order.total = order.items_total();

    let order = state.back_office.place_order(order).await.map_err(internal)?;
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    state
        .back_office
        .get_order(&id)
        .await
        .map(Json)
        .ok_or_else(|| not_found("Order", &id))
}

pub async fn delete_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.back_office.delete_order(&id).await.map_err(internal)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Order", &id))
    }
}

pub async fn update_order_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Order>, ApiError> {
    state
        .back_office
        .update_order_status(&id, request.status)
        .await
        .map_err(internal)?
        .map(Json)
        .ok_or_else(|| not_found("Order", &id))
}

pub async fn update_payment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<PaymentUpdate>,
) -> Result<Json<Order>, ApiError> {
    state
        .back_office
        .update_payment(&id, request)
        .await
        .map_err(internal)?
        .map(Json)
        .ok_or_else(|| not_found("Order", &id))
}

pub async fn order_stats(
    State(state): State<AppState>,
    Query(scope): Query<StatsScope>,
) -> Json<OrderStats> {
    Json(state.back_office.order_stats(scope).await)
}

pub async fn revenue_report(State(state): State<AppState>) -> Json<RevenueReport> {
    Json(state.back_office.revenue_report().await)
}

pub async fn export_orders(State(state): State<AppState>) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"orders.csv\""),
        ],
        state.back_office.export_csv().await,
    )
}

pub async fn list_tables(State(state): State<AppState>) -> Json<Vec<Table>> {
    Json(state.back_office.tables().get_all_tables().await)
}

pub async fn table_summary(State(state): State<AppState>) -> Json<TableSummary> {
    Json(state.back_office.tables().table_summary().await)
}

pub async fn available_tables(
    State(state): State<AppState>,
    Query(query): Query<AvailabilityQuery>,
) -> Json<Vec<Table>> {
    Json(state.back_office.tables().available_tables(query.min_capacity).await)
}

pub async fn get_table(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Table>, ApiError> {
    state
        .back_office
        .tables()
        .get_table(&id)
        .await
        .map(Json)
        .ok_or_else(|| not_found("Table", &id))
}

pub async fn update_table_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<TableStatusRequest>,
) -> Result<Json<Table>, ApiError> {
    state
        .back_office
        .tables()
        .update_table_status(&id, request.status, request.order_id)
        .await
        .map_err(internal)?
        .map(Json)
        .ok_or_else(|| not_found("Table", &id))
}

pub async fn assign_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<AssignOrderRequest>,
) -> Result<Json<Table>, ApiError> {
    state
        .back_office
        .tables()
        .assign_order_to_table(&id, &request.order_id)
        .await
        .map_err(internal)?
        .map(Json)
        .ok_or_else(|| not_found("Table", &id))
}

pub async fn free_table(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Table>, ApiError> {
    state
        .back_office
        .tables()
        .free_table(&id)
        .await
        .map_err(internal)?
        .map(Json)
        .ok_or_else(|| not_found("Table", &id))
}

pub async fn reset_tables(State(state): State<AppState>) -> Result<Json<Vec<Table>>, ApiError> {
    state
        .back_office
        .tables()
        .reset_all_tables()
        .await
        .map(Json)
        .map_err(internal)
}

pub async fn list_notifications(State(state): State<AppState>) -> Json<Vec<AdminNotification>> {
    Json(state.back_office.inbox().list().await)
}

pub async fn mark_notification_read(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state.back_office.inbox().mark_read(id).await.map_err(internal)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Notification", &id.to_string()))
    }
}

pub async fn health_check() -> &'static str {
    "OK"
}
