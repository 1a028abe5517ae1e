//! Admission endpoint: normal mode runs the gate, `?status=true` reports
//! load and limits.

use std::net::IpAddr;

use actix_web::http::StatusCode;
use actix_web::http::header::HeaderValue;
use actix_web::{HttpRequest, HttpResponse, web};
use serde::Deserialize;

use floodgate_core::composer::{RATE_LIMIT_LIMIT, RATE_LIMIT_REMAINING};
use floodgate_core::domain::ClientId;
use floodgate_core::Rejection;
use floodgate_shared::dto::{AdmittedMetrics, AdmittedResponse};

use crate::middleware::error::AppResult;
use crate::observability::{REQUEST_ID_HEADER, RequestContext};
use crate::orchestrator::{Admitted, GateOutcome};
use crate::state::AppState;

const PROCESSING_TIME: &str = "X-Processing-Time";
const SYSTEM_LOAD: &str = "X-System-Load";

#[derive(Debug, Deserialize)]
pub struct AdmissionQuery {
    pub status: Option<String>,
}

impl AdmissionQuery {
    fn status_mode(&self) -> bool {
        matches!(self.status.as_deref(), Some("true") | Some("1"))
    }
}

/// GET /api/admission[?status=true]
pub async fn admission(
    state: web::Data<AppState>,
    req: HttpRequest,
    ctx: RequestContext,
    query: web::Query<AdmissionQuery>,
) -> AppResult<HttpResponse> {
    if query.status_mode() {
        let status = state.orchestrator.status().await;
        return Ok(HttpResponse::Ok().json(status));
    }

    let client = client_id(&req, &state.config.trusted_proxies);
    let gated = state.orchestrator.process(&client, ctx.request_id()).await?;

    // The metrics handle is dropped on purpose: the write finishes detached.
    Ok(match gated.outcome {
        GateOutcome::Admitted(admitted) => admitted_response(admitted),
        GateOutcome::Rejected(rejection) => rejection_response(rejection, ctx.request_id()),
    })
}

/// Client identity from the peer address and the User-Agent. Forwarding
/// headers only count when the peer is a trusted proxy.
fn client_id(req: &HttpRequest, trusted_proxies: &[IpAddr]) -> ClientId {
    let user_agent = req
        .headers()
        .get(actix_web::http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok());

    let peer = req.peer_addr().map(|addr| addr.ip());
    match peer {
        Some(ip) if trusted_proxies.contains(&ip) => {
            let info = req.connection_info();
            ClientId::derive(info.realip_remote_addr().unwrap_or("unknown"), user_agent)
        }
        Some(ip) => ClientId::derive(&ip.to_string(), user_agent),
        None => ClientId::derive("unknown", user_agent),
    }
}

fn admitted_response(admitted: Admitted) -> HttpResponse {
    HttpResponse::Ok()
        .insert_header((PROCESSING_TIME, admitted.processing_time_ms.to_string()))
        .insert_header((SYSTEM_LOAD, format!("{:.3}", admitted.system_load)))
        .insert_header((REQUEST_ID_HEADER, admitted.request_id.as_str()))
        .insert_header((RATE_LIMIT_LIMIT, admitted.limit.to_string()))
        .insert_header((RATE_LIMIT_REMAINING, admitted.remaining.to_string()))
        .json(AdmittedResponse {
            success: true,
            metrics: AdmittedMetrics {
                processing_time: admitted.processing_time_ms,
                system_load: admitted.system_load,
                request_id: admitted.request_id,
            },
        })
}

/// A rejection whose headers cannot be encoded degrades to the generic 503
/// rather than to a 500.
fn rejection_response(rejection: Rejection, request_id: &str) -> HttpResponse {
    let encodable = rejection
        .headers
        .iter()
        .all(|(_, value)| HeaderValue::from_str(value).is_ok());
    let rejection = if encodable {
        rejection
    } else {
        tracing::warn!(request_id, "Rejection headers not encodable, sending minimal 503");
        Rejection::minimal(request_id)
    };

    let status = StatusCode::from_u16(rejection.status).unwrap_or(StatusCode::SERVICE_UNAVAILABLE);
    let mut builder = HttpResponse::build(status);
    for (name, value) in &rejection.headers {
        builder.insert_header((*name, value.as_str()));
    }
    builder.insert_header((REQUEST_ID_HEADER, request_id));

    builder.json(&rejection.body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::App;
    use actix_web::test::{
        TestRequest, call_and_read_body_json, call_service, init_service, read_body_json,
    };

    use floodgate_core::domain::DecisionReason;
    use floodgate_core::ResponseComposer;

    use crate::handlers::{configure_routes, test_support};
    use crate::observability::RequestIdMiddleware;

    fn request_from(ip: &str) -> TestRequest {
        TestRequest::get()
            .uri("/api/admission")
            .peer_addr(format!("{ip}:40000").parse().unwrap())
            .insert_header(("User-Agent", "loadtest/1.0"))
    }

    #[actix_web::test]
    async fn test_quota_then_rate_limited() {
        let app = init_service(
            App::new()
                .wrap(RequestIdMiddleware)
                .app_data(web::Data::new(test_support::state(|_| {})))
                .configure(configure_routes),
        )
        .await;

        for i in 0..100 {
            let res = call_service(&app, request_from("10.1.1.1").to_request()).await;
            assert_eq!(res.status(), 200, "request {i}");
        }

        let res = call_service(&app, request_from("10.1.1.1").to_request()).await;
        assert_eq!(res.status(), 503);
        assert_eq!(res.headers().get("Retry-After").unwrap(), "60");
        assert_eq!(res.headers().get("X-RateLimit-Limit").unwrap(), "100");
        assert_eq!(res.headers().get("X-RateLimit-Remaining").unwrap(), "0");
        let request_id = res.headers().get("X-Request-ID").unwrap().to_str().unwrap().to_string();

        let body: serde_json::Value = read_body_json(res).await;
        assert_eq!(body["code"], "RATE_LIMIT");
        assert_eq!(body["retryAfter"], 60);
        assert_eq!(body["requestId"], request_id.as_str());

        // Another client is unaffected
        let res = call_service(&app, request_from("10.1.1.2").to_request()).await;
        assert_eq!(res.status(), 200);
    }

    #[actix_web::test]
    async fn test_admitted_body_and_headers() {
        let app = init_service(
            App::new()
                .wrap(RequestIdMiddleware)
                .app_data(web::Data::new(test_support::state(|_| {})))
                .configure(configure_routes),
        )
        .await;

        let req = request_from("10.2.0.1")
            .insert_header(("X-Request-ID", "edge-42"))
            .to_request();
        let res = call_service(&app, req).await;

        assert_eq!(res.status(), 200);
        assert_eq!(res.headers().get("X-Request-ID").unwrap(), "edge-42");
        assert_eq!(res.headers().get("X-RateLimit-Remaining").unwrap(), "99");
        assert!(res.headers().contains_key("X-Processing-Time"));
        assert!(res.headers().contains_key("X-System-Load"));

        let body: serde_json::Value = read_body_json(res).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["metrics"]["requestId"], "edge-42");
        assert!(body["metrics"]["processingTime"].is_u64());
        assert!(body["metrics"]["systemLoad"].is_f64());
    }

    #[actix_web::test]
    async fn test_status_mode_does_not_consume_quota() {
        let state = test_support::state(|c| c.admission.max_requests = 1);
        let app = init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure_routes),
        )
        .await;

        for _ in 0..3 {
            let req = TestRequest::get()
                .uri("/api/admission?status=true")
                .peer_addr("10.3.0.1:40000".parse().unwrap())
                .to_request();
            let body: serde_json::Value = call_and_read_body_json(&app, req).await;

            assert_eq!(body["status"], "healthy");
            assert_eq!(body["rateLimit"]["limit"], 1);
            assert_eq!(body["rateLimit"]["window"], 60_000);
            assert_eq!(body["systemLoad"]["isOverloaded"], false);
        }

        let res = call_service(&app, request_from("10.3.0.1").to_request()).await;
        assert_eq!(res.status(), 200);
    }

    #[actix_web::test]
    async fn test_maintenance_mode_sheds_everything() {
        let state = test_support::state(|c| c.admission.maintenance_mode = true);
        let app = init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure_routes),
        )
        .await;

        let res = call_service(&app, request_from("10.4.0.1").to_request()).await;
        assert_eq!(res.status(), 503);
        assert_eq!(res.headers().get("Retry-After").unwrap(), "300");

        let body: serde_json::Value = read_body_json(res).await;
        assert_eq!(body["code"], "MAINTENANCE");
    }

    #[actix_web::test]
    async fn test_forwarded_headers_from_untrusted_peer_are_ignored() {
        let state = test_support::state(|c| c.admission.max_requests = 2);
        let app = init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure_routes),
        )
        .await;

        let oversized = "7".repeat(250);
        let mut admitted = 0;
        for i in 0..20 {
            let forwarded = if i % 2 == 0 {
                format!("1.1.1.{i}")
            } else {
                oversized.clone()
            };
            let req = request_from("10.5.0.1")
                .insert_header(("X-Forwarded-For", forwarded))
                .to_request();
            if call_service(&app, req).await.status() == 200 {
                admitted += 1;
            }
        }

        assert_eq!(admitted, 2);
    }

    #[actix_web::test]
    async fn test_trusted_proxy_forwards_client_address() {
        let state = test_support::state(|c| {
            c.admission.max_requests = 1;
            c.trusted_proxies = vec!["10.6.0.1".parse().unwrap()];
        });
        let app = init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure_routes),
        )
        .await;

        let via_proxy = |client: &str| {
            request_from("10.6.0.1")
                .insert_header(("X-Forwarded-For", client.to_string()))
                .to_request()
        };

        assert_eq!(call_service(&app, via_proxy("203.0.113.1")).await.status(), 200);
        assert_eq!(call_service(&app, via_proxy("203.0.113.2")).await.status(), 200);
        assert_eq!(call_service(&app, via_proxy("203.0.113.1")).await.status(), 503);

        // An oversized forwarded address still yields a bounded, limited key
        let long = "8".repeat(250);
        assert_eq!(call_service(&app, via_proxy(&long)).await.status(), 200);
        assert_eq!(call_service(&app, via_proxy(&long)).await.status(), 503);
    }

    #[actix_web::test]
    async fn test_malformed_query_is_structured_validation_error() {
        let app = init_service(
            App::new()
                .app_data(web::Data::new(test_support::state(|_| {})))
                .configure(configure_routes),
        )
        .await;

        let req = TestRequest::get()
            .uri("/api/admission?status=true&status=false")
            .to_request();
        let res = call_service(&app, req).await;
        assert_eq!(res.status(), 400);
        assert_eq!(
            res.headers().get("Content-Type").unwrap(),
            "application/json"
        );

        let body: serde_json::Value = read_body_json(res).await;
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["errors"][0]["field"], "query");
    }

    #[actix_web::test]
    async fn test_unencodable_rejection_degrades_to_minimal() {
        let mut rejection = ResponseComposer::new(100, std::time::Duration::from_secs(60))
            .build_rejection(DecisionReason::SystemOverload, "req-1");
        rejection.headers.push(("X-Debug", "line\nbreak".to_string()));

        let res = rejection_response(rejection, "req-1");

        assert_eq!(res.status(), 503);
        assert_eq!(res.headers().get("Retry-After").unwrap(), "30");
        assert!(!res.headers().contains_key("X-Debug"));
        assert!(!res.headers().contains_key("X-RateLimit-Limit"));
    }

    #[test]
    fn test_status_flag_parsing() {
        let mode = |status: Option<&str>| {
            AdmissionQuery {
                status: status.map(String::from),
            }
            .status_mode()
        };

        assert!(mode(Some("true")));
        assert!(mode(Some("1")));
        assert!(!mode(Some("false")));
        assert!(!mode(None));
    }
}
