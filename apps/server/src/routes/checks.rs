use actix_web::{HttpResponse, post, web};
use serde::Deserialize;
use tracing::info;
use urlwatch_service::monitoring::ProbeResult;

use crate::state::AppState;

macros_utils::routes! {
    route check_urls_route,
}

#[derive(Debug, Deserialize)]
pub struct CheckUrlsRequest {
    pub urls: Vec<String>,
}

/// Probe every URL in the body and record the outcomes.
///
/// Responds with one entry per URL in request order. Storage failures are
/// logged by the dispatcher and do not affect the response.
#[post("/check-urls")]
pub async fn check_urls_route(
    state: web::Data<AppState>,
    request: web::Json<CheckUrlsRequest>,
) -> HttpResponse {
    info!(count = request.urls.len(), "received check request");

    let records = state.dispatcher.check_urls(&request.urls).await;
    let results: Vec<ProbeResult> = records.into_iter().map(|record| record.result).collect();

    HttpResponse::Ok().json(results)
}
