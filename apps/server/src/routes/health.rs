use actix_web::{HttpResponse, Responder, get};
use serde::Serialize;

macros_utils::routes! {
    route health_route,
}

#[derive(Debug, Serialize)]
struct HealthStatus {
    status: &'static str,
    message: &'static str,
}

/// Liveness probe
#[get("/health")]
pub async fn health_route() -> impl Responder {
    HttpResponse::Ok().json(HealthStatus { status: "ok", message: "API is running" })
}
