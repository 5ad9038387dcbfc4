use axum::{
    extract::{
        Json, Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    db::PaymentStore,
    error::{AppError, Result},
    models::payment::{CreatePaymentRequest, MessageResponse, UpdatePaymentRequest},
};

/// State shared by the payment handlers and pages
#[derive(Clone)]
pub struct PaymentState {
    pub payment_store: PaymentStore,
}

/// Query string of `GET /api/payments`
#[derive(Debug, Default, Deserialize)]
pub struct DueDateQuery {
    pub due_date: Option<String>,
}

pub(crate) fn record_id(path: std::result::Result<Path<i64>, PathRejection>) -> Result<i64> {
    path.map(|Path(id)| id)
        .map_err(|e| AppError::BadRequest(e.body_text()))
}

/// Insert record handler
pub async fn create_record(
    State(state): State<PaymentState>,
    payload: std::result::Result<Json<CreatePaymentRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let payment = request.validate()?;

    let id = state.payment_store.insert(&payment).await?;
    tracing::info!(id, "Record inserted");

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::with_id("Record inserted successfully.", id)),
    ))
}

/// Get all records handler
pub async fn list_records(State(state): State<PaymentState>) -> Result<impl IntoResponse> {
    let payments = state.payment_store.list().await?;
    Ok((StatusCode::OK, Json(payments)))
}

/// Get record by ID handler
pub async fn get_record(
    State(state): State<PaymentState>,
    path: std::result::Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse> {
    let id = record_id(path)?;
    let payment = state.payment_store.get_by_id(id).await?;
    Ok((StatusCode::OK, Json(payment)))
}

/// Update record handler
pub async fn update_record(
    State(state): State<PaymentState>,
    path: std::result::Result<Path<i64>, PathRejection>,
    payload: std::result::Result<Json<UpdatePaymentRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let id = record_id(path)?;
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let update = request.validate()?;

    state.payment_store.update(id, &update).await?;
    tracing::info!(id, "Record updated");

    Ok((
        StatusCode::OK,
        Json(MessageResponse::new("Record updated successfully.")),
    ))
}

/// Delete record handler
pub async fn delete_record(
    State(state): State<PaymentState>,
    path: std::result::Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse> {
    let id = record_id(path)?;

    state.payment_store.delete(id).await?;
    tracing::info!(id, "Record deleted");

    Ok((
        StatusCode::OK,
        Json(MessageResponse::new("Record deleted successfully.")),
    ))
}

/// Get all payments, or only those whose due date is exactly `?due_date=`
pub async fn filter_payments(
    State(state): State<PaymentState>,
    query: std::result::Result<Query<DueDateQuery>, QueryRejection>,
) -> Result<impl IntoResponse> {
    let Query(query) = query.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let payments = state
        .payment_store
        .filter(query.due_date.as_deref())
        .await?;
    Ok((StatusCode::OK, Json(payments)))
}

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
