use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Pool, Postgres};
use std::io;
use std::net::TcpListener;
use tracing_actix_web::TracingLogger;

use crate::config::{DatabaseSettings, Settings};
use crate::email_client::EmailClient;
use crate::routes::{
    handle_early_access, handle_send_telegram, handle_subscribe, health_check,
    malformed_body_handler, malformed_relay_body_handler, method_not_allowed,
};
use crate::telegram_client::TelegramClient;

pub struct Application {
    pub port: u16,
    pub server: Server,
}

impl Application {
    pub async fn build(config: Settings) -> Result<Self, io::Error> {
        let db_pool = get_connection_db_pool(&config.database);
        let telegram_client = TelegramClient::new(
            config.telegram.base_url.clone(),
            config.telegram.bot_token.clone(),
            config.telegram.chat_id.clone(),
            Some(config.telegram.get_timeout()),
        )
        .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
        let email_client = EmailClient::new(&config.email_client)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;

        let listener = TcpListener::bind(config.get_address())?;
        let port = listener.local_addr()?.port();
        let server = run(listener, db_pool, telegram_client, email_client)?;

        Ok(Self { port, server })
    }

    pub fn get_port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stop(self) -> Result<(), io::Error> {
        self.server.await
    }
}

pub fn run(
    listener: TcpListener,
    db_pool: PgPool,
    telegram_client: TelegramClient,
    email_client: EmailClient,
) -> Result<Server, io::Error> {
    let db_pool = web::Data::new(db_pool);
    let telegram_client = web::Data::new(telegram_client);
    let email_client = web::Data::new(email_client);

    let server = HttpServer::new(move || {
        // Forms post JSON without always setting the content type
        let json_config = web::JsonConfig::default()
            .content_type_required(false)
            .error_handler(malformed_body_handler);
        let relay_json_config = web::JsonConfig::default()
            .content_type_required(false)
            .error_handler(malformed_relay_body_handler);

        App::new()
            // 'wrap' method adds a middleware to the App. This specific middleware provide incoming
            // request logger
            .wrap(TracingLogger::default())
            .app_data(json_config)
            .route("/health_check", web::get().to(health_check))
            .service(
                web::resource("/api/subscribe")
                    .route(web::post().to(handle_subscribe))
                    .default_service(web::to(method_not_allowed)),
            )
            .service(
                web::resource("/api/early-access")
                    .route(web::post().to(handle_early_access))
                    .default_service(web::to(method_not_allowed)),
            )
            .service(
                web::resource("/api/send-telegram")
                    .app_data(relay_json_config)
                    .route(web::post().to(handle_send_telegram))
                    .default_service(web::to(method_not_allowed)),
            )
            .app_data(db_pool.clone())
            .app_data(telegram_client.clone())
            .app_data(email_client.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}

pub fn get_connection_db_pool(config: &DatabaseSettings) -> Pool<Postgres> {
    PgPoolOptions::new()
        .acquire_timeout(std::time::Duration::from_secs(2))
        .connect_lazy_with(config.get_db_options())
}
