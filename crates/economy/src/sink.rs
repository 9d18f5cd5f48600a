//! Outbound "set OS badge to N" interface.
//!
//! Mirroring is best-effort: the badge counter calls the sink after every
//! count change, logs any [`SinkError`] and moves on. The logical count stays
//! authoritative even when the OS mirror lags or fails.

use async_trait::async_trait;

/// Error type for platform badge updates.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// The capability is missing (emulator, permission not granted, ...).
    #[error("Badge capability unavailable: {0}")]
    Unavailable(String),

    /// The platform call itself failed.
    #[error("Platform badge call failed: {0}")]
    Platform(String),
}

/// Platform-specific badge mirror.
#[async_trait]
pub trait BadgeSink: Send + Sync {
    /// Set the application icon badge to `count`.
    async fn set_application_badge(&self, count: u32) -> Result<(), SinkError>;
}

/// Sink that only records the mirrored count in the log.
///
/// Used on platforms without an icon badge and by the CLI runner.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingSink;

#[async_trait]
impl BadgeSink for LoggingSink {
    async fn set_application_badge(&self, count: u32) -> Result<(), SinkError> {
        tracing::info!(count, "Application badge set");
        Ok(())
    }
}
