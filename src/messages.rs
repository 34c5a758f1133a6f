//! Typed cross-window messages.
//
//! Popup documents talk to the dashboard through `postMessage` with a fixed
//! `{type, payload}` envelope serialized as JSON text; nothing reaches into
//! the opener's global scope. Unknown types fail the parse and are dropped
//! at the receiver.

use serde::{Deserialize, Serialize};

use crate::error::SurfaceError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "kebab-case")]
pub enum PopupMessage {
    /// The popup asks for its section to be returned to the dashboard.
    DockSection { section: String },
    /// The popup forwards a log line to the dashboard's tracing output.
    Notify { text: String },
}

impl PopupMessage {
    pub fn parse(raw: &str) -> Result<Self, SurfaceError> {
        serde_json::from_str(raw).map_err(|err| SurfaceError::InvalidMessage(err.to_string()))
    }

    pub fn to_json(&self) -> String {
        // the envelope is a plain tagged enum; serialization cannot fail
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dock_request_round_trips() {
        let msg = PopupMessage::DockSection {
            section: "notes".to_string(),
        };
        let json = msg.to_json();
        assert_eq!(
            json,
            r#"{"type":"dock-section","payload":{"section":"notes"}}"#
        );
        assert_eq!(PopupMessage::parse(&json).unwrap(), msg);
    }

    #[test]
    fn unknown_types_are_rejected() {
        let raw = r#"{"type":"eval","payload":{"code":"alert(1)"}}"#;
        assert!(matches!(
            PopupMessage::parse(raw),
            Err(SurfaceError::InvalidMessage(_))
        ));
    }

    #[test]
    fn missing_payload_is_rejected() {
        assert!(PopupMessage::parse(r#"{"type":"dock-section"}"#).is_err());
        assert!(PopupMessage::parse("not json").is_err());
    }
}
