//! Error taxonomy for the control loop.

use thiserror::Error;

/// Errors that cross the control-loop boundary.
///
/// Transient transport faults (`ServerBusy`) are handled at each call site
/// and never reach this type; losing the session is the only condition the
/// loop propagates, so the caller can re-login and restart.
#[derive(Debug, Clone, Error)]
pub enum BotError {
    /// The session is no longer valid.
    #[error("session expired: {reason}")]
    SessionExpired { reason: String },
}
