pub mod orders;

use actix_web::HttpResponse;
use serde_json::json;

/// GET /health
///
/// Liveness probe; does not touch the database.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up")),
    tag = "health"
)]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}
