//! Manager configuration.
//
//! The JS facade accepts options as a JSON string; unknown fields are
//! rejected at parse time so typos surface as a logged warning instead of
//! silently falling back to defaults field by field.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_CASCADE_OFFSET_PX, DEFAULT_POPUP_ENDPOINT, DEFAULT_POPUP_FEATURES,
    DEFAULT_POPUP_POLL_MS, OVERLAY_CONTAINER_ID,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ManagerConfig {
    /// When set, `popOutSection` without an explicit preference opens a
    /// browser popup instead of a floating surface.
    pub prefer_popup_windows: bool,
    /// Endpoint of the popup content service (`POST` to create a record,
    /// `DELETE <endpoint>/<id>` to release it).
    pub popup_endpoint: String,
    /// Feature string passed to `window.open` for popup surfaces.
    pub popup_features: String,
    /// Interval for polling `closed` on popup windows.
    pub popup_poll_ms: u32,
    /// Pixel offset applied per already-open floating surface.
    pub cascade_offset_px: i32,
    /// Element id of the floating overlay container.
    pub overlay_id: String,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            prefer_popup_windows: false,
            popup_endpoint: DEFAULT_POPUP_ENDPOINT.to_string(),
            popup_features: DEFAULT_POPUP_FEATURES.to_string(),
            popup_poll_ms: DEFAULT_POPUP_POLL_MS,
            cascade_offset_px: DEFAULT_CASCADE_OFFSET_PX,
            overlay_id: OVERLAY_CONTAINER_ID.to_string(),
        }
    }
}
