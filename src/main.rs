// Server bootstrap: environment, logging, database, notification pipeline,
// then the HTTP listener.

use std::sync::Arc;

use actix_web::{middleware, web, App, HttpServer};
use anyhow::Context;
use tracing_subscriber::EnvFilter;

use hotel_booking::config::AppConfig;
use hotel_booking::lifecycle::BookingService;
use hotel_booking::notify::{Dispatcher, Notifier};
use hotel_booking::providers;
use hotel_booking::session::SessionStore;
use hotel_booking::store::Store;
use hotel_booking::AppState;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env();
    tracing::info!(database = %config.database_url, "connecting to database");
    let store = Store::connect(&config.database_url)
        .await
        .context("failed to open the booking database")?;

    let email = providers::email_provider(&config.email);
    let sms = providers::sms_provider(&config.sms);
    let notifier = Arc::new(Notifier::new(
        email,
        sms,
        config.hotel.clone(),
        config.bank.clone(),
    ));
    let dispatcher = Dispatcher::spawn(notifier.clone());
    let service = BookingService::new(store.clone(), notifier, dispatcher.clone());
    let sessions = SessionStore::new(config.admin.session_ttl_hours);

    let bind_addr = config.bind_addr.clone();
    let email_configured = config.email.brevo_api_key.is_some();
    let state = web::Data::new(AppState {
        config,
        store,
        service,
        sessions,
        dispatcher: dispatcher.clone(),
    });

    tracing::info!(
        addr = %bind_addr,
        email_configured,
        "starting hotel booking server"
    );
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::Logger::default())
            .configure(hotel_booking::api::configure)
            .configure(hotel_booking::admin::configure)
    })
    .bind(bind_addr.as_str())
    .with_context(|| format!("failed to bind {bind_addr}"))?
    .run()
    .await?;

    // Let already-queued notifications finish before the process exits.
    dispatcher.shutdown().await;
    tracing::info!("server stopped");
    Ok(())
}
