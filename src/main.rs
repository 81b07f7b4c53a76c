#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::time::Duration;

use actix_web::{
    middleware::{from_fn, Logger},
    web, App, HttpServer,
};
use home_loan_helper::{
    configure_services, db,
    handlers::{json_config, query_config},
    middleware::{cors, rate_limit, security_headers},
    settings::AppSettings,
    state::AppState,
    utils::logging::LoggingHelper,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load configuration from Settings.toml and environment variables
    // This also loads .env file and initializes the logger
    let settings = AppSettings::load()
        .map_err(|e| std::io::Error::other(format!("Failed to load settings: {e}")))?;

    let state = AppState::new(settings)
        .await
        .map_err(|e| std::io::Error::other(format!("Failed to initialize application: {e:#}")))?;

    spawn_cleanup_task(state.clone());
    start_server(state).await
}

/// Start the HTTP server and close the pool once it stops
///
/// # Errors
///
/// Returns an error if binding or serving fails
async fn start_server(state: AppState) -> std::io::Result<()> {
    let settings = state.settings.clone();
    let bind_address = settings.get_bind_address();
    print_startup_info(&bind_address, &state);

    let pool = state.db.clone();
    let data = web::Data::new(state);
    let frontend_url = settings.application.frontend_url.clone();

    let result = HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .app_data(json_config())
            .app_data(query_config())
            .wrap(from_fn(rate_limit))
            .wrap(security_headers())
            .wrap(cors(&frontend_url))
            .wrap(Logger::default())
            .configure(configure_services)
    })
    .bind(&bind_address)?
    .run()
    .await;

    pool.close().await;
    log::info!("Database pool closed");
    result
}

/// Periodically drop expired sessions, challenges and rate-limit windows
fn spawn_cleanup_task(state: AppState) {
    let minutes = state.settings.session.cleanup_interval_minutes;
    if minutes == 0 {
        log::info!("Session cleanup task disabled");
        return;
    }
    actix_web::rt::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(minutes * 60));
        loop {
            interval.tick().await;

            let sessions = state
                .sessions
                .cleanup_expired_sessions()
                .await
                .inspect_err(|e| log::error!("Session cleanup failed: {e}"))
                .unwrap_or(0);
            let challenges = db::challenges::delete_expired_challenges(&state.db)
                .await
                .inspect_err(|e| log::error!("Challenge cleanup failed: {e}"))
                .unwrap_or(0);
            state.rate_limiter.prune_expired();

            LoggingHelper::log_cleanup(sessions, challenges);
        }
    });
}

fn print_startup_info(bind_address: &str, state: &AppState) {
    let settings = &state.settings;
    println!("🚀 Server running at http://{bind_address}");
    println!("📚 API docs at http://{bind_address}/docs/json");
    println!("Environment: {}", settings.application.environment);
    println!("Frontend origin: {}", settings.application.frontend_url);
    println!();
    println!("Passkey endpoints:");
    println!("  POST /api/v1/auth/register/begin  - Start passkey registration");
    println!("  POST /api/v1/auth/register/finish - Complete passkey registration");
    println!("  POST /api/v1/auth/login/begin     - Start passkey sign-in");
    println!("  POST /api/v1/auth/login/finish    - Complete passkey sign-in");
    println!();
    println!("OAuth endpoints:");
    println!("  GET  /api/v1/auth/signin/{{provider}}   - Redirect to provider");
    println!("  GET  /api/v1/auth/callback/{{provider}} - Provider callback");
    let providers = state.providers.names();
    if providers.is_empty() {
        println!("  (no providers configured)");
    }
    for name in providers {
        println!(
            "  {name}: {}/api/v1/auth/callback/{name}",
            settings.application.redirect_base_url.trim_end_matches('/')
        );
    }
    println!();
    println!("Session endpoints:");
    println!("  GET  /api/v1/auth/me          - Current user");
    println!("  GET  /api/v1/auth/session     - Current session");
    println!("  GET  /api/v1/auth/sessions    - Active sessions");
    println!("  POST /api/v1/auth/signout     - Sign out");
    println!("  POST /api/v1/auth/signout-all - Sign out everywhere");
    println!();
    println!("Data endpoints:");
    println!("  GET|PUT /api/v1/users/me/data - Encrypted preferences");
    println!("  GET|POST /api/v1/loans/compare - Loan comparison");
    println!("  POST /api/v1/loans/calculate   - Single loan calculation");
    println!();
    println!("System endpoints:");
    println!("  GET  /api/v1/healthz - Health check");
    println!("  GET  /docs/json      - OpenAPI document");
}
