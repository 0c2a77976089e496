use actix_web::{web, HttpResponse, Responder};

/// Health check endpoint
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": "circles-backend",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Configure routes
pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/health", web::get().to(health));
}
