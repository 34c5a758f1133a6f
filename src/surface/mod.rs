//! Surface factories.
//
//! Each factory produces a handle the registry can close uniformly: floating
//! surfaces are DOM containers removed on close, popup surfaces are native
//! windows closed on close, external tabs carry only the content record.

pub mod floating;
pub mod popup;
pub mod tab;

pub use floating::FloatingSurface;
pub use tab::ExternalTabOutcome;
