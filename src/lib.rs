//! Presentation surface manager for browser dashboards.
//
//! Sections dock inline, float in an in-page overlay, pop into a browser
//! window, or fall back to a new tab when the popup is blocked. The state
//! machine is generic over a [`host::Host`], so everything except the
//! `web-sys` host and the wasm facade runs natively under tests.

pub mod config;
pub mod constants;
pub mod controller;
pub mod drag;
pub mod error;
pub mod host;
pub mod messages;
pub mod proxy;
pub mod rebind;
pub mod registry;
pub mod remap;
pub mod section;
pub mod surface;
pub mod tracing_sub;
#[cfg(target_arch = "wasm32")]
pub mod wasm;

pub use config::ManagerConfig;
pub use controller::{SharedManager, SurfaceManager};
pub use error::SurfaceError;
pub use registry::SurfaceKind;
pub use section::SectionId;
