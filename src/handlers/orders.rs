use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::DbPool;
use crate::errors::AppError;
use crate::models::order::{Order, OrderPayload};
use crate::query::{ListParams, OrderQuery};
use crate::report::{OrderReport, ReportFormat, ReportRange};
use crate::store;

// ── Request DTOs ─────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    /// `json` (default) or `text` for the printable document.
    pub format: Option<String>,
}

/// Treats a malformed id the same as an unknown one.
fn parse_order_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound)
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /orders
///
/// Returns all orders matching the query-string filters, most recent service
/// date first. Blank filter values are ignored; the service-date window only
/// applies when both bounds are present.
#[utoipa::path(
    get,
    path = "/orders",
    params(
        ("invoiceNo" = Option<String>, Query, description = "Exact invoice number"),
        ("customerName" = Option<String>, Query, description = "Word match on the customer name"),
        ("contactNo" = Option<String>, Query, description = "Exact contact number"),
        ("product" = Option<String>, Query, description = "Substring match on item products"),
        ("startDate" = Option<String>, Query, description = "Window start, only with endDate"),
        ("endDate" = Option<String>, Query, description = "Window end, only with startDate"),
    ),
    responses(
        (status = 200, description = "Matching orders", body = [Order]),
        (status = 400, description = "Malformed date filter"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn list_orders(
    pool: web::Data<DbPool>,
    query: web::Query<ListParams>,
) -> Result<HttpResponse, AppError> {
    let criteria = OrderQuery::try_from(query.into_inner())?;

    let orders = web::block(move || {
        let mut conn = pool.get()?;
        store::list_orders(&mut conn, &criteria)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(orders))
}

/// GET /orders/reports
///
/// Returns the orders whose service date falls inside the requested window,
/// oldest first. Both bounds are required. With `format=text` the response is
/// a printable plain-text document instead of JSON.
#[utoipa::path(
    get,
    path = "/orders/reports",
    params(
        ("startDate" = String, Query, description = "Window start (YYYY-MM-DD), inclusive"),
        ("endDate" = String, Query, description = "Window end (YYYY-MM-DD), inclusive"),
        ("format" = Option<String>, Query, description = "`json` (default) or `text`"),
    ),
    responses(
        (status = 200, description = "Orders in the window, oldest first", body = [Order]),
        (status = 400, description = "Missing or invalid date range"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn report_orders(
    pool: web::Data<DbPool>,
    query: web::Query<ReportParams>,
) -> Result<HttpResponse, AppError> {
    let params = query.into_inner();
    let range = ReportRange::parse(params.start_date, params.end_date)?;
    let format = ReportFormat::parse(params.format)?;

    let orders = web::block(move || {
        let mut conn = pool.get()?;
        store::orders_in_range(&mut conn, range.start, range.end)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    match format {
        ReportFormat::Json => Ok(HttpResponse::Ok().json(orders)),
        ReportFormat::Text => {
            let report = OrderReport::build(range, orders);
            Ok(HttpResponse::Ok()
                .content_type("text/plain; charset=utf-8")
                .body(report.to_text()))
        }
    }
}

/// GET /orders/{id}
///
/// Returns the stored order.
#[utoipa::path(
    get,
    path = "/orders/{id}",
    params(
        ("id" = String, Path, description = "Order id (UUID)"),
    ),
    responses(
        (status = 200, description = "Order found", body = Order),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn get_order(
    pool: web::Data<DbPool>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let order_id = parse_order_id(&path.into_inner())?;

    let order = web::block(move || {
        let mut conn = pool.get()?;
        store::find_order(&mut conn, order_id)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    match order {
        Some(order) => Ok(HttpResponse::Ok().json(order)),
        None => Err(AppError::NotFound),
    }
}

/// POST /orders
///
/// Validates the payload, recomputes every item total and the order total
/// server-side, and stores the order under a fresh id.
#[utoipa::path(
    post,
    path = "/orders",
    request_body = OrderPayload,
    responses(
        (status = 201, description = "Order created", body = Order),
        (status = 400, description = "Validation failure"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn create_order(
    pool: web::Data<DbPool>,
    body: web::Json<OrderPayload>,
) -> Result<HttpResponse, AppError> {
    let draft = body.into_inner().validate()?;

    let order = web::block(move || {
        let mut conn = pool.get()?;
        store::create_order(&mut conn, draft)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(order))
}

/// PUT /orders/{id}
///
/// Replaces the whole order document. Fields absent from the payload are
/// cleared, totals are recomputed, `createdAt` is preserved and `updatedAt`
/// bumped.
#[utoipa::path(
    put,
    path = "/orders/{id}",
    params(
        ("id" = String, Path, description = "Order id (UUID)"),
    ),
    request_body = OrderPayload,
    responses(
        (status = 200, description = "Order replaced", body = Order),
        (status = 400, description = "Validation failure"),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn replace_order(
    pool: web::Data<DbPool>,
    path: web::Path<String>,
    body: web::Json<OrderPayload>,
) -> Result<HttpResponse, AppError> {
    let order_id = parse_order_id(&path.into_inner())?;
    let draft = body.into_inner().validate()?;

    let order = web::block(move || {
        let mut conn = pool.get()?;
        store::replace_order(&mut conn, order_id, draft)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    match order {
        Some(order) => Ok(HttpResponse::Ok().json(order)),
        None => Err(AppError::NotFound),
    }
}

/// DELETE /orders/{id}
///
/// Removes the order.
#[utoipa::path(
    delete,
    path = "/orders/{id}",
    params(
        ("id" = String, Path, description = "Order id (UUID)"),
    ),
    responses(
        (status = 200, description = "Order deleted"),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn delete_order(
    pool: web::Data<DbPool>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let order_id = parse_order_id(&path.into_inner())?;

    let deleted = web::block(move || {
        let mut conn = pool.get()?;
        store::delete_order(&mut conn, order_id)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    if deleted {
        Ok(HttpResponse::Ok().json(json!({ "message": "Order deleted successfully" })))
    } else {
        Err(AppError::NotFound)
    }
}
