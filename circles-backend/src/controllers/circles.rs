use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;

use crate::models::{CircleSummary, UpdateCirclesSettingsRequest};
use crate::AppState;

/// List circles sorted by ordering index, with peer counts
pub async fn list_circles(state: web::Data<AppState>) -> impl Responder {
    match state.db.get_circles_settings() {
        Ok(settings) => {
            let circles: Vec<CircleSummary> = settings
                .sorted_circle_ids()
                .into_iter()
                .map(|id| CircleSummary {
                    id,
                    name: settings
                        .group_names
                        .get(&id)
                        .cloned()
                        .unwrap_or_default(),
                    index: settings.index_of(id),
                    peer_count: settings.peers_in_circle(id).len(),
                })
                .collect();
            HttpResponse::Ok().json(circles)
        }
        Err(e) => {
            log::error!("Failed to load circles: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("Database error: {}", e)
            }))
        }
    }
}

/// Get the circles settings record
pub async fn get_settings(state: web::Data<AppState>) -> impl Responder {
    match state.db.get_circles_settings() {
        Ok(settings) => HttpResponse::Ok().json(settings),
        Err(e) => {
            log::error!("Failed to get circles settings: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("Database error: {}", e)
            }))
        }
    }
}

/// Update the circles settings record (replace-and-merge)
pub async fn update_settings(
    state: web::Data<AppState>,
    body: web::Json<UpdateCirclesSettingsRequest>,
) -> impl Responder {
    let request = body.into_inner();

    let result = state.db.update_circles_settings(|mut s| {
        if let Some(token) = request.token {
            s.token = Some(token);
        }
        if let Some(bot) = request.bot_peer_id {
            s.bot_peer_id = Some(bot);
        }
        if let Some(dev) = request.dev {
            s.dev = dev;
        }
        if let Some(local) = request.local_inclusions {
            s.local_inclusions = local;
        }
        s
    });

    match result {
        Ok(settings) => {
            log::info!(
                "Updated circles settings: dev={}, has_token={}, local_inclusions={}",
                settings.dev,
                settings.token.is_some(),
                settings.local_inclusions.len()
            );
            HttpResponse::Ok().json(settings)
        }
        Err(e) => {
            log::error!("Failed to update circles settings: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("Database error: {}", e)
            }))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SetTokenRequest {
    pub token: String,
}

/// Set the auth token and run a full sync
pub async fn set_token(
    state: web::Data<AppState>,
    body: web::Json<SetTokenRequest>,
) -> impl Responder {
    let request = body.into_inner();
    if request.token.is_empty() {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "error": "Token is required"
        }));
    }

    if let Err(e) = state.db.update_circles_settings(|mut s| {
        s.token = Some(request.token.clone());
        s
    }) {
        log::error!("Failed to store token: {}", e);
        return HttpResponse::InternalServerError().json(serde_json::json!({
            "error": format!("Database error: {}", e)
        }));
    }

    run_sync(&state).await
}

/// Run the full sync pipeline
pub async fn sync_now(state: web::Data<AppState>) -> impl Responder {
    run_sync(&state).await
}

async fn run_sync(state: &web::Data<AppState>) -> HttpResponse {
    match state
        .sync
        .synchronize(
            state.directory.as_ref(),
            state.chat_list.as_ref(),
            state.account_peer,
        )
        .await
    {
        Ok(report) => HttpResponse::Ok().json(report),
        Err(e) => {
            log::error!("Sync failed: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": format!("Database error: {}", e)
            }))
        }
    }
}

/// Configure routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/circles")
            .route("", web::get().to(list_circles))
            .route("/settings", web::get().to(get_settings))
            .route("/settings", web::put().to(update_settings))
            .route("/token", web::post().to(set_token))
            .route("/sync", web::post().to(sync_now)),
    );
}
