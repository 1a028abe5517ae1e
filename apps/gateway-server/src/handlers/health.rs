//! Liveness endpoint.

use actix_web::{HttpResponse, web};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub timestamp: DateTime<Utc>,
}

/// GET /api/health
///
/// Always 200 while the process serves requests; maintenance mode is
/// reported but is not a liveness failure.
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let status = if state.config.admission.maintenance_mode {
        "maintenance"
    } else {
        "ok"
    };

    HttpResponse::Ok().json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use actix_web::{App, test, web};

    use crate::handlers::{configure_routes, test_support};

    #[actix_web::test]
    async fn test_health_reports_ok() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(test_support::state(|_| {})))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/health").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["status"], "ok");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[actix_web::test]
    async fn test_unknown_route_is_structured_404() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(test_support::state(|_| {})))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/nope").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), 404);

        let body: serde_json::Value = test::read_body_json(res).await;
        assert_eq!(body["code"], "NOT_FOUND");
    }
}
