use actix_web::{HttpResponse, get, web};
use serde::Deserialize;
use urlwatch_service::monitoring::metrics::DEFAULT_WINDOW_DAYS;

use crate::error::ApiError;
use crate::state::AppState;

macros_utils::routes! {
    route list_urls_route,
    route health_history_route,
    route metrics_route,
}

#[derive(Debug, Deserialize)]
pub struct MetricsQuery {
    #[serde(default = "default_days")]
    pub days: u32,
}

fn default_days() -> u32 {
    DEFAULT_WINDOW_DAYS
}

/// Every URL that has been checked at least once
#[get("/urls")]
pub async fn list_urls_route(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let targets = state.store.list_targets().await?;
    Ok(HttpResponse::Ok().json(targets))
}

/// Stored checks for one URL, newest first
#[get("/url/{id}/health-history")]
pub async fn health_history_route(
    state: web::Data<AppState>,
    id: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let observations = state.store.list_observations(id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(observations))
}

#[get("/url/{id}/metrics")]
pub async fn metrics_route(
    state: web::Data<AppState>,
    id: web::Path<i64>,
    query: web::Query<MetricsQuery>,
) -> Result<HttpResponse, ApiError> {
    let metrics = state.metrics.compute_metrics(id.into_inner(), query.days).await?;
    Ok(HttpResponse::Ok().json(metrics))
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use serde_json::{Value, json};

    use super::*;
    use crate::routes::{self, json_config, query_config};
    use crate::state::test_support::test_state;

    #[actix_web::test]
    async fn unknown_id_is_404() {
        let (state, _dir) = test_state().await;
        let app = test::init_service(App::new().app_data(state).configure(routes)).await;

        for uri in ["/url/77/health-history", "/url/77/metrics", "/url/77/metrics?days=30"] {
            let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
            assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{uri}");
            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body, json!({ "detail": "URL not found" }));
        }
    }

    #[actix_web::test]
    async fn history_and_metrics_after_checks() {
        let (state, _dir) = test_state().await;
        let app = test::init_service(
            App::new()
                .app_data(state)
                .app_data(json_config())
                .app_data(query_config())
                .configure(routes::routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/check-urls")
            .set_json(json!({ "urls": ["https://up.test", "https://up.test", "https://up.test", "https://bad.invalid"] }))
            .to_request();
        test::call_service(&app, req).await;
        let req = test::TestRequest::post()
            .uri("/check-urls")
            .set_json(json!({ "urls": ["https://bad.invalid"] }))
            .to_request();
        test::call_service(&app, req).await;

        let urls: Value =
            test::call_and_read_body_json(&app, test::TestRequest::get().uri("/urls").to_request()).await;
        let urls = urls.as_array().unwrap();
        assert_eq!(urls.len(), 2);
        assert_eq!(urls[0]["url"], "https://up.test");
        assert!(urls[0]["created_at"].is_string());
        let up_id = urls[0]["id"].as_i64().unwrap();
        let down_id = urls[1]["id"].as_i64().unwrap();

        let history: Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get().uri(&format!("/url/{down_id}/health-history")).to_request(),
        )
        .await;
        let history = history.as_array().unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0]["url_id"], down_id);
        assert_eq!(history[0]["status"], false);
        assert_eq!(history[0]["response_time"], 0.0);
        assert_eq!(history[0]["status_code"], Value::Null);
        let checked_at = |entry: &Value| {
            entry["checked_at"].as_str().unwrap().parse::<chrono::DateTime<chrono::Utc>>().unwrap()
        };
        assert!(checked_at(&history[0]) >= checked_at(&history[1]));

        let metrics: Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get().uri(&format!("/url/{up_id}/metrics")).to_request(),
        )
        .await;
        assert_eq!(
            metrics,
            json!({
                "url": "https://up.test",
                "total_checks": 3,
                "uptime_percentage": 100.0,
                "average_response_time": 25.0,
                "time_period_days": 7,
            })
        );

        let metrics: Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get().uri(&format!("/url/{down_id}/metrics?days=1")).to_request(),
        )
        .await;
        assert_eq!(metrics["total_checks"], 2);
        assert_eq!(metrics["uptime_percentage"], 0.0);
        assert_eq!(metrics["average_response_time"], 0.0);
        assert_eq!(metrics["time_period_days"], 1);
    }

    #[actix_web::test]
    async fn negative_days_is_rejected() {
        let (state, _dir) = test_state().await;
        let target = state.store.get_or_create_target("https://up.test").await.unwrap();
        let app = test::init_service(
            App::new().app_data(state).app_data(query_config()).configure(routes),
        )
        .await;

        let uri = format!("/url/{}/metrics?days=-3", target.id);
        let resp = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
