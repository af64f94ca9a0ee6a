use actix_web::{HttpResponse, error, web};
use serde_json::json;

mod checks;
mod health;
mod urls;

macros_utils::routes! {
    mod health,
    mod checks,
    mod urls,
}

fn bad_request(detail: String, cause: impl Into<actix_web::Error>) -> actix_web::Error {
    let response = HttpResponse::BadRequest().json(json!({ "detail": detail }));
    error::InternalError::from_response(cause.into(), response).into()
}

/// Malformed bodies are rejected with a 400 before reaching a handler
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| bad_request(err.to_string(), err))
}

/// Malformed query strings are rejected with a 400
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| bad_request(err.to_string(), err))
}
