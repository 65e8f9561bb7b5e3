pub(crate) mod api;
pub(crate) mod core;
pub(crate) mod db;
pub(crate) mod repositories;
pub(crate) mod schemas;
pub(crate) mod services;

#[cfg(test)]
mod test_support;

use crate::core::bootstrap::{self, AdminSeed, SeedOutcome};
use crate::core::{config::Settings, redis::RedisHandle, state::AppState, telemetry};

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::load()?;
    telemetry::init_tracing(&settings)?;
    core::metrics::init(&settings)?;

    let db_pool = db::init_pool(&settings).await?;
    db::run_migrations(&db_pool).await?;

    let redis = RedisHandle::new(settings.redis().redis_url());
    if let Err(err) = redis.connect().await {
        tracing::error!(error = %err, "Failed to connect to Redis; rate limiting disabled");
    } else {
        tracing::info!("Redis connected successfully");
    }

    let state = AppState::new(settings, db_pool, redis.clone());

    if let Err(err) = bootstrap::ensure_first_admin(&state).await {
        tracing::error!(error = %err, "Failed to bootstrap first admin");
    }
    let app = api::router::router(state.clone());
    let listener = tokio::net::TcpListener::bind(state.settings().server_addr()).await?;

    tracing::info!(
        host = %state.settings().server_host(),
        port = state.settings().server_port(),
        environment = %state.settings().runtime().environment.as_str(),
        "Academy API listening"
    );

    let result =
        axum::serve(listener, app).with_graceful_shutdown(core::shutdown::shutdown_signal()).await;

    redis.disconnect().await;
    tracing::info!("Redis disconnected");

    result?;

    Ok(())
}

/// Create an administrator from positional arguments
/// `[name] [username] [email] [password]`; missing ones fall back to defaults.
pub async fn create_admin(args: Vec<String>) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::load()?;
    telemetry::init_tracing(&settings)?;

    let seed = admin_seed_from_args(&args);
    let db_pool = db::init_pool(&settings).await?;
    db::run_migrations(&db_pool).await?;

    match bootstrap::seed_admin(&db_pool, &seed).await? {
        SeedOutcome::Created(user) => {
            tracing::info!(
                user_id = %user.id,
                name = %user.name,
                username = %user.username,
                email = %user.email,
                "Admin user created; change the password after first login"
            );
        }
        SeedOutcome::AlreadyExists { user_id } => {
            tracing::warn!(
                user_id = %user_id,
                username = %seed.username,
                email = %seed.email,
                "User with this username or email already exists"
            );
        }
    }

    db_pool.close().await;
    Ok(())
}

fn admin_seed_from_args(args: &[String]) -> AdminSeed {
    let arg = |index: usize, default: &str| {
        args.get(index)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
            .unwrap_or(default)
            .to_string()
    };

    AdminSeed {
        name: arg(0, "Admin User"),
        username: arg(1, "admin"),
        email: arg(2, "admin@academy.com"),
        password: arg(3, "123456"),
    }
}
