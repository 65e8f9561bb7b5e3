use std::sync::Arc;

use redis::aio::ConnectionManager;
use redis::{cmd, Client, RedisError};
use tokio::sync::RwLock;

/// INCR the window counter, arming its expiry on the first hit.
const COUNT_ATTEMPT: &str = r#"
local current = redis.call("INCR", KEYS[1])
if current == 1 then
    redis.call("EXPIRE", KEYS[1], ARGV[1])
end
return current
"#;

/// Fixed-window allowance for one rate-limited action.
#[derive(Debug, Clone, Copy)]
pub(crate) struct AttemptBudget {
    pub(crate) action: &'static str,
    pub(crate) limit: u64,
    pub(crate) window_seconds: u64,
}

#[derive(Clone)]
pub(crate) struct RedisHandle {
    url: String,
    manager: Arc<RwLock<Option<ConnectionManager>>>,
}

#[derive(Debug, Clone)]
pub(crate) enum RedisHealth {
    Healthy,
    Disconnected,
    Unhealthy(String),
}

impl RedisHandle {
    pub(crate) fn new(url: String) -> Self {
        Self { url, manager: Arc::new(RwLock::new(None)) }
    }

    pub(crate) async fn connect(&self) -> Result<(), RedisError> {
        let client = Client::open(self.url.clone())?;
        let manager = ConnectionManager::new(client).await?;
        let mut guard = self.manager.write().await;
        *guard = Some(manager);
        Ok(())
    }

    pub(crate) async fn disconnect(&self) {
        let mut guard = self.manager.write().await;
        *guard = None;
    }

    pub(crate) async fn health(&self) -> RedisHealth {
        let manager = { self.manager.read().await.clone() };
        let Some(mut manager) = manager else {
            return RedisHealth::Disconnected;
        };

        match cmd("PING").query_async::<_, String>(&mut manager).await {
            Ok(_) => RedisHealth::Healthy,
            Err(err) => RedisHealth::Unhealthy(err.to_string()),
        }
    }

    /// Spend one attempt of `budget` for `identifier` (case-insensitive).
    /// Returns `false` once the window's budget is exhausted. Without a
    /// connection every attempt is allowed.
    pub(crate) async fn try_attempt(
        &self,
        budget: AttemptBudget,
        identifier: &str,
    ) -> Result<bool, RedisError> {
        let manager = { self.manager.read().await.clone() };
        let Some(mut manager) = manager else {
            return Ok(true);
        };

        let key = format!("rl:{}:{}", budget.action, identifier.trim().to_lowercase());
        let attempts: u64 = redis::Script::new(COUNT_ATTEMPT)
            .key(key)
            .arg(budget.window_seconds)
            .invoke_async(&mut manager)
            .await?;

        Ok(attempts <= budget.limit)
    }
}

#[cfg(test)]
mod tests {
    use super::{AttemptBudget, RedisHandle, RedisHealth};
    use crate::core::config::Settings;
    use crate::test_support;
    use uuid::Uuid;

    const TIGHT: AttemptBudget = AttemptBudget { action: "login", limit: 1, window_seconds: 5 };

    #[tokio::test]
    async fn budget_is_per_action_and_identifier() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();

        let settings = Settings::load().expect("settings");
        test_support::reset_redis(settings.redis().redis_url()).await.expect("redis reset");

        let redis = RedisHandle::new(settings.redis().redis_url());
        redis.connect().await.expect("redis connect");
        assert!(matches!(redis.health().await, RedisHealth::Healthy));

        let identifier = format!("{}@example.com", Uuid::new_v4());
        let first = redis.try_attempt(TIGHT, &identifier).await.expect("attempt");
        let second = redis.try_attempt(TIGHT, &identifier.to_uppercase()).await.expect("attempt");
        let other_action = redis
            .try_attempt(AttemptBudget { action: "register", ..TIGHT }, &identifier)
            .await
            .expect("attempt");

        assert!(first);
        assert!(!second);
        assert!(other_action);
    }

    #[tokio::test]
    async fn disconnected_handle_allows_attempts() {
        let redis = RedisHandle::new("redis://127.0.0.1:1/0".to_string());

        for _ in 0..3 {
            assert!(redis.try_attempt(TIGHT, "someone").await.expect("attempt"));
        }
        assert!(matches!(redis.health().await, RedisHealth::Disconnected));
    }
}
