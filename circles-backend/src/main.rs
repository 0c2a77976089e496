use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::sync::Arc;

mod config;
mod controllers;
mod db;
mod gateway;
mod host;
mod models;
mod peers;
mod remote;
mod sync;

use config::Config;
use db::Database;
use gateway::EventBroadcaster;
use host::{ChatList, PeerDirectory, SqliteChatList, SqlitePeerDirectory};
use peers::PeerId;
use sync::SyncService;

pub struct AppState {
    pub db: Arc<Database>,
    pub sync: Arc<SyncService>,
    pub directory: Arc<dyn PeerDirectory>,
    pub chat_list: Arc<dyn ChatList>,
    pub account_peer: PeerId,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env();
    let port = config.port;

    log::info!("Initializing database at {}", config.database_url);
    let db = Database::new(&config.database_url).expect("Failed to initialize database");
    let db = Arc::new(db);

    // Seed the dev flag on first run only; after that the stored record wins
    if db
        .get_preference(db::tables::circles_settings::CIRCLES_SETTINGS_KEY)
        .expect("Failed to read preferences")
        .is_none()
        && config.dev
    {
        log::info!("Fresh settings record, enabling dev API endpoints");
        db.update_circles_settings(|mut s| {
            s.dev = true;
            s
        })
        .expect("Failed to seed circles settings");
    }

    let broadcaster = Arc::new(EventBroadcaster::new());
    let sync = Arc::new(
        SyncService::new(db.clone(), broadcaster.clone())
            .with_api_base(config.api_base_url.clone()),
    );
    let directory: Arc<dyn PeerDirectory> = Arc::new(SqlitePeerDirectory::new(db.clone()));
    let chat_list: Arc<dyn ChatList> = Arc::new(SqliteChatList::new(db.clone()));
    let account_peer = PeerId::from_bot_api(config.account_peer_id);

    // Log broadcast notifications (connection/auth/server failures included)
    let mut event_rx = broadcaster.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = event_rx.recv().await {
            log::info!("[{}] {}", event.event, event.data);
        }
    });

    log::info!("Starting circles-backend on port {}", port);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(AppState {
                db: Arc::clone(&db),
                sync: Arc::clone(&sync),
                directory: Arc::clone(&directory),
                chat_list: Arc::clone(&chat_list),
                account_peer,
            }))
            .wrap(Logger::default())
            .wrap(cors)
            .configure(controllers::health::config_routes)
            .configure(controllers::circles::config)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
