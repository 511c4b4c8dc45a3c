//! Shared logging utilities for consistent tracing across zone setup

use chrono::{DateTime, Utc};
use tracing::{error, info};

/// Build the per-crate filter directive for the given base level
pub fn filter_directive(log_level: Option<&str>) -> String {
    let base_level = log_level.unwrap_or("info");
    format!("coordinator={base_level},zone_setup={base_level},shared={base_level}")
}

/// Initialize tracing subscriber with an optional log level
pub fn init_tracing_with_level(log_level: Option<&str>) {
    use tracing_subscriber::{EnvFilter, fmt};

    let env_filter = filter_directive(log_level);

    // try_init so tests and embedding callers that already installed a subscriber keep theirs
    let _ = fmt()
        .with_env_filter(EnvFilter::new(&env_filter))
        .with_target(false)
        .with_thread_ids(true)
        .with_file(false)
        .with_line_number(false)
        .try_init();
}

/// Initialize tracing subscriber at the default level
pub fn init_tracing() {
    init_tracing_with_level(None);
}

/// Get formatted timestamp for consistent logging
pub fn format_timestamp() -> String {
    let now: DateTime<Utc> = Utc::now();
    now.format("%H:%M:%S%.3f").to_string()
}

/// Macro for zone-aware info logging
#[macro_export]
macro_rules! zone_info {
    ($zone:expr, $($arg:tt)*) => {
        tracing::info!(
            zone = %$zone,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Macro for zone-aware warning logging
#[macro_export]
macro_rules! zone_warn {
    ($zone:expr, $($arg:tt)*) => {
        tracing::warn!(
            zone = %$zone,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Macro for zone-aware error logging
#[macro_export]
macro_rules! zone_error {
    ($zone:expr, $($arg:tt)*) => {
        tracing::error!(
            zone = %$zone,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Macro for zone-aware debug logging
#[macro_export]
macro_rules! zone_debug {
    ($zone:expr, $($arg:tt)*) => {
        tracing::debug!(
            zone = %$zone,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Contextual logging helper for startup messages
pub fn log_startup(details: &str) {
    info!(timestamp = format_timestamp(), "🚀 Starting {}", details);
}

/// Contextual logging helper for error conditions
pub fn log_error(context: &str, error: &dyn std::fmt::Display) {
    error!(
        timestamp = format_timestamp(),
        error = %error,
        "❌ {} failed: {}",
        context,
        error
    );
}

/// Contextual logging helper for success conditions
pub fn log_success(message: &str) {
    info!(timestamp = format_timestamp(), "✅ {}", message);
}

/// Contextual logging helper for progress updates
pub fn log_progress(action: &str, details: &str) {
    info!(timestamp = format_timestamp(), "📋 {}: {}", action, details);
}
