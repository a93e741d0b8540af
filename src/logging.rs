use std::io;
use tracing_appender::rolling;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Console logging on stderr (stdout carries results), plus a daily log
/// file under `logs/` that keeps full prompts and replies.
pub fn configure_logging(verbose: bool) {
    let default_filter = if verbose {
        "info,llm_request=debug,extraction=debug"
    } else {
        "warn,extraction=info"
    };

    let stderr_log = fmt::layer().with_writer(io::stderr).with_filter(
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
    );

    let file_appender = rolling::daily("logs", "tickertape.log");
    let file_log = fmt::layer()
        .with_ansi(false)
        .with_writer(file_appender)
        .with_filter(EnvFilter::new("info,llm_request=debug,extraction=debug"));

    tracing_subscriber::Registry::default()
        .with(stderr_log)
        .with(file_log)
        .init();
}
