//! HTTP handlers and route configuration.

mod admission;
mod health;
mod simulate;

use actix_web::web;

use floodgate_shared::FieldError;

use crate::middleware::error::{AppError, AppResult};

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .app_data(web::QueryConfig::default().error_handler(|err, _req| {
                AppError::Validation(vec![FieldError::new("query", err.to_string())]).into()
            }))
            .route("/health", web::get().to(health::health_check))
            .route("/admission", web::get().to(admission::admission))
            .route("/admission/simulate", web::post().to(simulate::simulate))
            .default_service(web::to(not_found)),
    );
}

async fn not_found(req: actix_web::HttpRequest) -> AppResult<actix_web::HttpResponse> {
    Err(AppError::NotFound(format!(
        "No route for {} {}",
        req.method(),
        req.path()
    )))
}
