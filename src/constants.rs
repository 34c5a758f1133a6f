//! Shared crate-wide constants.

/// Class marking a dockable dashboard section root. Discovery scans for it
/// and every surface clone copies it so card styling carries over.
pub const SECTION_CLASS: &str = "dash-section";

/// Class of the header strip inside a section. Pointer-downs inside it start
/// a floating drag; clicks on its buttons are resolved by class, never by id.
pub const HEADER_CLASS: &str = "dash-header";

/// Class of the title element inside a section header.
pub const TITLE_CLASS: &str = "dash-title";

/// Class of the content container inside a section. Minimize collapses this
/// element while the header stays visible.
pub const CONTENT_CLASS: &str = "dash-content";

/// Header button that pops the section out of the docked layout.
pub const FLOAT_BUTTON_CLASS: &str = "dash-btn-float";

/// Header button that collapses a floating surface to its header.
pub const MINIMIZE_BUTTON_CLASS: &str = "dash-btn-minimize";

/// Header button that returns a surface to the docked layout.
pub const CLOSE_BUTTON_CLASS: &str = "dash-btn-close";

/// Class added to floating surface containers in the overlay.
pub const FLOATING_SURFACE_CLASS: &str = "dash-floating";

/// Element id of the single in-page overlay that hosts floating surfaces.
/// Created on first use, never removed.
pub const OVERLAY_CONTAINER_ID: &str = "dash-overlay";

/// Surface namespace tag for floating clones (`floating-<section>`).
pub const FLOATING_PREFIX: &str = "floating";

/// Surface namespace tag for popup and external-tab documents
/// (`popup-<section>`).
pub const POPUP_PREFIX: &str = "popup";

/// Attribute-name prefix marking a subtree as already rebound for a feature.
/// The full marker is `data-rebound-<feature>`.
pub const REBOUND_MARKER_PREFIX: &str = "data-rebound-";

/// Attribute on a popup-document control that requests docking the section
/// back into the dashboard.
pub const DOCK_REQUEST_ATTR: &str = "data-dock-request";

/// Default `window.open` feature string for popup surfaces.
pub const DEFAULT_POPUP_FEATURES: &str =
    "width=480,height=600,menubar=no,toolbar=no,location=no,status=no";

/// Default endpoint of the popup content service.
pub const DEFAULT_POPUP_ENDPOINT: &str = "/popup";

/// Default interval for polling `closed` on popup windows. The browser fires
/// no event when the user closes a popup, so close detection is bounded by
/// this latency.
pub const DEFAULT_POPUP_POLL_MS: u32 = 1_000;

/// Viewport origin of the first floating surface, in pixels.
pub const FLOATING_BASE_X: i32 = 32;
pub const FLOATING_BASE_Y: i32 = 32;

/// Default per-surface cascade offset so newly opened floating surfaces do
/// not stack exactly on top of each other.
pub const DEFAULT_CASCADE_OFFSET_PX: i32 = 28;

/// z-index floor for floating surfaces; raising a surface bumps above it.
pub const FLOATING_BASE_Z: i32 = 1_000;
