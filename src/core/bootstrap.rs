use sqlx::PgPool;
use uuid::Uuid;

use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::User;
use crate::db::types::UserRole;
use crate::repositories;

/// Credentials for an administrator created outside the HTTP surface.
#[derive(Debug, Clone)]
pub(crate) struct AdminSeed {
    pub(crate) name: String,
    pub(crate) username: String,
    pub(crate) email: String,
    pub(crate) password: String,
}

#[derive(Debug)]
pub(crate) enum SeedOutcome {
    Created(User),
    /// An account with the seed's username or email is already present; it is
    /// left untouched.
    AlreadyExists { user_id: String },
}

pub(crate) async fn seed_admin(pool: &PgPool, seed: &AdminSeed) -> anyhow::Result<SeedOutcome> {
    let username = seed.username.trim();
    let email = seed.email.trim().to_lowercase();
    if username.is_empty() || email.is_empty() || seed.password.is_empty() {
        anyhow::bail!("admin seed needs a username, an email and a password");
    }

    if let Some(user_id) =
        repositories::users::exists_by_username_or_email(pool, username, &email).await?
    {
        return Ok(SeedOutcome::AlreadyExists { user_id });
    }

    let hashed_password = security::hash_password(&seed.password)?;
    let user = repositories::users::create(
        pool,
        repositories::users::CreateUser {
            id: &Uuid::new_v4().to_string(),
            name: seed.name.trim(),
            username,
            email: &email,
            hashed_password,
            role: UserRole::Admin,
            created_by_admin: false,
            created_at: primitive_now_utc(),
        },
    )
    .await?;

    Ok(SeedOutcome::Created(user))
}

/// Seed the configured first administrator at startup. Skipped when no
/// password is configured.
pub(crate) async fn ensure_first_admin(state: &AppState) -> anyhow::Result<()> {
    let admin = state.settings().admin();
    if admin.first_admin_password.is_empty() {
        tracing::warn!("FIRST_ADMIN_PASSWORD not configured; skipping admin bootstrap");
        return Ok(());
    }

    let seed = AdminSeed {
        name: admin.first_admin_name.clone(),
        username: admin.first_admin_username.clone(),
        email: admin.first_admin_email.clone(),
        password: admin.first_admin_password.clone(),
    };

    match seed_admin(state.db(), &seed).await? {
        SeedOutcome::Created(user) => {
            tracing::info!(user_id = %user.id, username = %user.username, "Created first admin");
        }
        SeedOutcome::AlreadyExists { user_id } => {
            tracing::info!(user_id = %user_id, "First admin already present");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::security::verify_password;
    use crate::test_support;

    fn seed() -> AdminSeed {
        AdminSeed {
            name: "Admin User".to_string(),
            username: "admin".to_string(),
            email: "Admin@Academy.com".to_string(),
            password: "123456".to_string(),
        }
    }

    #[tokio::test]
    async fn seeding_twice_creates_one_admin() {
        let ctx = test_support::setup_test_context().await;

        let created = seed_admin(ctx.state.db(), &seed()).await.expect("seed admin");
        let SeedOutcome::Created(user) = created else {
            panic!("expected admin to be created");
        };
        assert_eq!(user.role, UserRole::Admin);
        assert_eq!(user.email, "admin@academy.com");
        assert!(verify_password("123456", &user.hashed_password).expect("verify"));

        let again = seed_admin(ctx.state.db(), &seed()).await.expect("seed admin again");
        match again {
            SeedOutcome::AlreadyExists { user_id } => assert_eq!(user_id, user.id),
            SeedOutcome::Created(_) => panic!("admin must not be duplicated"),
        }

        let users = repositories::users::list_all(ctx.state.db()).await.expect("list users");
        assert_eq!(users.len(), 1);
    }

    #[tokio::test]
    async fn seed_requires_password() {
        let ctx = test_support::setup_test_context().await;

        let mut incomplete = seed();
        incomplete.password.clear();
        assert!(seed_admin(ctx.state.db(), &incomplete).await.is_err());
    }
}
