use std::sync::OnceLock;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::core::config::Settings;

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub(crate) fn init(settings: &Settings) -> anyhow::Result<()> {
    if !settings.telemetry().prometheus_enabled || PROM_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    let _ = PROM_HANDLE.set(handle);
    Ok(())
}

pub(crate) fn render() -> Option<String> {
    PROM_HANDLE.get().map(|handle| handle.render())
}

/// How an exam submission reached the grader.
#[derive(Debug, Clone, Copy)]
pub(crate) enum SubmissionMode {
    Published,
    PrivateAuthenticated,
    PrivateAnonymous,
}

impl SubmissionMode {
    fn as_str(self) -> &'static str {
        match self {
            SubmissionMode::Published => "published",
            SubmissionMode::PrivateAuthenticated => "private_authenticated",
            SubmissionMode::PrivateAnonymous => "private_anonymous",
        }
    }
}

pub(crate) fn record_submission(mode: SubmissionMode, passed: bool) {
    metrics::counter!(
        "exam_submissions_total",
        "mode" => mode.as_str(),
        "passed" => if passed { "true" } else { "false" }
    )
    .increment(1);
}

pub(crate) fn record_enrollment_decision(status: &'static str) {
    metrics::counter!("enrollment_decisions_total", "decision" => status).increment(1);
}
