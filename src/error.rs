//! Error taxonomy for surface transitions.
//
//! Every variant here is recovered somewhere in the crate: a blocked popup
//! walks the fallback chain, a proxy failure degrades to an in-window
//! document write, a missing element turns the operation into a logged
//! no-op. Nothing crosses the JS boundary as an exception.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("popup window blocked by the browser")]
    PopupBlocked,
    #[error("popup content service unavailable: {0}")]
    ProxyUnavailable(String),
    #[error("missing element: {0}")]
    MissingElement(String),
    #[error("listener attach failed for {feature}: {reason}")]
    ListenerAttach { feature: String, reason: String },
    #[error("invalid cross-window message: {0}")]
    InvalidMessage(String),
}
