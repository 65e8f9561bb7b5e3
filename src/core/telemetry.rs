use tracing_subscriber::{fmt, EnvFilter};

use crate::core::config::Settings;

/// Noisy dependencies are capped at `warn` unless `RUST_LOG` says otherwise.
const QUIET_TARGETS: &[&str] = &["sqlx=warn", "tower_http=info", "hyper=warn"];

fn default_filter(log_level: &str) -> EnvFilter {
    let directives = std::iter::once(log_level.to_string())
        .chain(QUIET_TARGETS.iter().map(|target| target.to_string()))
        .collect::<Vec<_>>()
        .join(",");
    EnvFilter::new(directives)
}

pub(crate) fn init_tracing(settings: &Settings) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter(&settings.telemetry().log_level));

    let builder = fmt().with_env_filter(filter).with_target(false);
    let json = settings.telemetry().json || settings.runtime().environment.is_production();

    if json {
        builder
            .json()
            .with_span_events(fmt::format::FmtSpan::CLOSE)
            .try_init()
            .map_err(|err| anyhow::anyhow!(err.to_string()))?;
    } else {
        builder
            .with_span_events(fmt::format::FmtSpan::CLOSE)
            .try_init()
            .map_err(|err| anyhow::anyhow!(err.to_string()))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::default_filter;

    #[test]
    fn default_filter_keeps_level_and_quiets_dependencies() {
        let rendered = default_filter("debug").to_string();
        assert!(rendered.contains("debug"));
        assert!(rendered.contains("sqlx=warn"));
    }
}
