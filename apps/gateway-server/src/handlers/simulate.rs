//! Load simulation for operational testing.

use actix_web::{HttpResponse, web};

use floodgate_core::DomainError;
use floodgate_shared::FieldError;
use floodgate_shared::dto::{SimulationRequest, SimulationResponse};

use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// POST /api/admission/simulate
///
/// `simulateLoad: true` adds to the simulated offsets (bounded);
/// `simulateLoad: false` clears them.
pub async fn simulate(
    state: web::Data<AppState>,
    body: Result<web::Json<SimulationRequest>, actix_web::Error>,
) -> AppResult<HttpResponse> {
    if !state.config.simulation_enabled {
        return Err(AppError::NotFound("Simulation is disabled".to_string()));
    }

    // Throttle before parsing so malformed floods are counted too
    state.ops_throttle.check().map_err(AppError::Throttled)?;

    let request = body
        .map_err(|e| AppError::Validation(vec![FieldError::new("body", e.to_string())]))?
        .into_inner();

    let errors = request.validate();
    if !errors.is_empty() {
        return Err(DomainError::Validation(errors).into());
    }

    let (simulated_connections, simulated_load) = if request.simulate_load {
        state
            .load_state
            .simulate(request.connections.max(0) as u64, request.load)
    } else {
        state.load_state.reset_simulation();
        (0, 0.0)
    };

    tracing::info!(
        simulate_load = request.simulate_load,
        simulated_connections,
        simulated_load,
        "Load simulation updated"
    );

    Ok(HttpResponse::Ok().json(SimulationResponse {
        success: true,
        simulated_connections,
        simulated_load,
    }))
}

#[cfg(test)]
mod tests {
    use actix_web::{App, test, web};
    use serde_json::json;

    use crate::handlers::{configure_routes, test_support};

    fn post(body: serde_json::Value) -> test::TestRequest {
        test::TestRequest::post()
            .uri("/api/admission/simulate")
            .set_json(body)
    }

    #[actix_web::test]
    async fn test_disabled_by_default() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(test_support::state(|_| {})))
                .configure(configure_routes),
        )
        .await;

        let res = test::call_service(&app, post(json!({"simulateLoad": true})).to_request()).await;
        assert_eq!(res.status(), 404);

        let body: serde_json::Value = test::read_body_json(res).await;
        assert_eq!(body["code"], "NOT_FOUND");
    }

    #[actix_web::test]
    async fn test_simulated_load_overloads_then_resets() {
        let state = test_support::state(|c| c.simulation_enabled = true);
        let load_state = state.load_state.clone();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure_routes),
        )
        .await;

        let req = post(json!({"simulateLoad": true, "connections": 500, "load": 0.9})).to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["simulatedConnections"], 500);
        assert_eq!(body["simulatedLoad"], 0.9);

        let req = test::TestRequest::get()
            .uri("/api/admission?status=true")
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "overloaded");
        assert_eq!(body["systemLoad"]["activeConnections"], 501);

        let req = post(json!({"simulateLoad": false})).to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["simulatedConnections"], 0);
        assert_eq!(load_state.simulated_connections(), 0);
        assert_eq!(load_state.simulated_load(), 0.0);
    }

    #[actix_web::test]
    async fn test_simulation_is_bounded() {
        let state = test_support::state(|c| {
            c.simulation_enabled = true;
            c.simulation_per_second = 100;
        });
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure_routes),
        )
        .await;

        for _ in 0..3 {
            let req = post(json!({"simulateLoad": true, "connections": 10_000, "load": 0.6}))
                .to_request();
            let res = test::call_service(&app, req).await;
            assert_eq!(res.status(), 200);
        }

        let req = post(json!({"simulateLoad": true})).to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["simulatedConnections"], 10_000);
        assert_eq!(body["simulatedLoad"], 1.0);
    }

    #[actix_web::test]
    async fn test_invalid_payload_lists_fields() {
        let state = test_support::state(|c| c.simulation_enabled = true);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure_routes),
        )
        .await;

        let req = post(json!({"simulateLoad": true, "connections": -1, "load": 1.5})).to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), 400);

        let body: serde_json::Value = test::read_body_json(res).await;
        assert_eq!(body["code"], "VALIDATION_ERROR");
        let fields: Vec<_> = body["errors"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["field"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(fields, vec!["connections", "load"]);
    }

    #[actix_web::test]
    async fn test_malformed_json_is_validation_error() {
        let state = test_support::state(|c| c.simulation_enabled = true);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/admission/simulate")
            .insert_header(("Content-Type", "application/json"))
            .set_payload("{not json")
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), 400);

        let body: serde_json::Value = test::read_body_json(res).await;
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["errors"][0]["field"], "body");
    }

    #[actix_web::test]
    async fn test_throttled_past_quota() {
        let state = test_support::state(|c| {
            c.simulation_enabled = true;
            c.simulation_per_second = 1;
        });
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure_routes),
        )
        .await;

        let first = test::call_service(&app, post(json!({"simulateLoad": false})).to_request()).await;
        assert_eq!(first.status(), 200);

        let second =
            test::call_service(&app, post(json!({"simulateLoad": false})).to_request()).await;
        assert_eq!(second.status(), 429);
        assert!(second.headers().contains_key("Retry-After"));

        let body: serde_json::Value = test::read_body_json(second).await;
        assert_eq!(body["code"], "THROTTLED");
    }
}
