mod app;
mod auth;
mod config;
mod error;
mod ingredients;
mod recipes;
mod state;
mod storage;
mod tags;

use auth::repo::User;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "recipe_api=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let app_state = AppState::init().await?;

    if let Err(e) = sqlx::migrate!("./migrations").run(&app_state.db).await {
        tracing::warn!(error = %e, "migration failed; continuing");
    }

    bootstrap_admin(&app_state).await?;

    let app = app::build_app(app_state);
    app::serve(app).await
}

/// Create the initial superuser from ADMIN_EMAIL/ADMIN_PASSWORD when both are
/// set and the account does not exist yet.
async fn bootstrap_admin(state: &AppState) -> anyhow::Result<()> {
    let (email, password) = match (
        std::env::var("ADMIN_EMAIL"),
        std::env::var("ADMIN_PASSWORD"),
    ) {
        (Ok(e), Ok(p)) if !e.is_empty() && !p.is_empty() => (e.trim().to_lowercase(), p),
        _ => return Ok(()),
    };

    if User::find_by_email(&state.db, &email).await?.is_some() {
        return Ok(());
    }

    let hash = auth::password::hash_password(&password)?;
    let user = User::create_superuser(&state.db, &email, &hash).await?;
    tracing::info!(user_id = %user.id, email = %user.email, "bootstrapped admin user");
    Ok(())
}
