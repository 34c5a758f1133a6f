//! In-page floating surfaces.
//
//! A floating surface is a container appended to the single page-level
//! overlay, holding a remapped deep clone of the full section (header
//! controls included). The container inherits the section's classes so card
//! styling carries over, cascades by a fixed offset per already-open
//! floating surface, and is raised above its overlay siblings on pointer
//! down.

use crate::config::ManagerConfig;
use crate::constants::{
    CONTENT_CLASS, FLOATING_BASE_X, FLOATING_BASE_Y, FLOATING_BASE_Z, FLOATING_SURFACE_CLASS,
};
use crate::drag::parse_px;
use crate::error::SurfaceError;
use crate::host::Host;
use crate::remap::SurfaceNamespace;
use crate::section::SectionId;

pub struct FloatingSurface<H: Host> {
    /// Overlay child; its removal closes the surface.
    pub container: H::Element,
    /// Remapped clone of the section root, for listener rebinding.
    pub clone_root: H::Element,
}

/// Build a floating surface for `section`. A missing section root or
/// document body fails with `MissingElement`; callers log it and treat the
/// operation as a no-op.
pub fn create<H: Host>(
    host: &H,
    config: &ManagerConfig,
    section: &SectionId,
    open_count: usize,
) -> Result<FloatingSurface<H>, SurfaceError> {
    let original = host
        .element_by_id(section.as_str())
        .ok_or_else(|| SurfaceError::MissingElement(format!("#{section}")))?;
    let overlay = ensure_overlay(host, config)
        .ok_or_else(|| SurfaceError::MissingElement("body".to_string()))?;
    let ns = SurfaceNamespace::floating(section);

    let container = host
        .create_element("div")
        .ok_or_else(|| SurfaceError::MissingElement("new container".to_string()))?;
    if let Some(classes) = host.attr(&original, "class") {
        host.set_attr(&container, "class", &classes);
    }
    host.add_class(&container, FLOATING_SURFACE_CLASS);
    host.set_attr(&container, "id", ns.container_id());

    let clone_root = host
        .clone_subtree(&original)
        .ok_or_else(|| SurfaceError::MissingElement(format!("clone of #{section}")))?;
    ns.apply(host, &clone_root);
    host.append_child(&container, &clone_root);

    let offset = config.cascade_offset_px * open_count as i32;
    host.set_style(&container, "position", "fixed");
    host.set_style(&container, "left", &format!("{}px", FLOATING_BASE_X + offset));
    host.set_style(&container, "top", &format!("{}px", FLOATING_BASE_Y + offset));
    host.set_style(&container, "z-index", &FLOATING_BASE_Z.to_string());

    host.append_child(&overlay, &container);
    Ok(FloatingSurface {
        container,
        clone_root,
    })
}

/// The one overlay container, created lazily and never removed.
pub fn ensure_overlay<H: Host>(host: &H, config: &ManagerConfig) -> Option<H::Element> {
    if let Some(overlay) = host.element_by_id(&config.overlay_id) {
        return Some(overlay);
    }
    let overlay = host.create_element("div")?;
    host.set_attr(&overlay, "id", &config.overlay_id);
    host.append_child(&host.body()?, &overlay);
    Some(overlay)
}

/// Raise `container` above every other surface in the overlay.
pub fn raise<H: Host>(host: &H, overlay: &H::Element, container: &H::Element) {
    let top = host
        .query_all(overlay, &format!(".{FLOATING_SURFACE_CLASS}"))
        .iter()
        .map(|sibling| parse_px_z(host.style(sibling, "z-index")))
        .max()
        .unwrap_or(FLOATING_BASE_Z);
    host.set_style(container, "z-index", &(top + 1).to_string());
}

/// Collapse or restore the clone's content area; the header stays visible
/// so the surface can be dragged and restored while minimized.
pub fn set_minimized<H: Host>(host: &H, container: &H::Element, minimized: bool) {
    for content in host.query_all(container, &format!(".{CONTENT_CLASS}")) {
        if minimized {
            host.set_style(&content, "display", "none");
        } else {
            host.clear_style(&content, "display");
        }
    }
}

fn parse_px_z(value: Option<String>) -> i32 {
    value
        .as_deref()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(FLOATING_BASE_Z)
}

/// Current container origin, for drag anchoring.
pub fn origin<H: Host>(host: &H, container: &H::Element) -> (i32, i32) {
    (
        parse_px(host.style(container, "left")),
        parse_px(host.style(container, "top")),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{MemoryElement, MemoryHost};

    fn dashboard(host: &MemoryHost) -> MemoryElement {
        let body = host.body().unwrap();
        let section = host.create_element("div").unwrap();
        host.set_attr(&section, "id", "notes");
        host.set_attr(&section, "class", "dash-section card");
        let content = host.create_element("div").unwrap();
        host.set_attr(&content, "class", "dash-content");
        host.append_child(&section, &content);
        host.append_child(&body, &section);
        section
    }

    #[test]
    fn create_builds_a_remapped_clone_in_the_overlay() {
        let host = MemoryHost::new();
        dashboard(&host);
        let config = ManagerConfig::default();
        let surface = create(&host, &config, &SectionId::new("notes"), 0).unwrap();

        let overlay = host.element_by_id("dash-overlay").unwrap();
        assert_eq!(host.child_count(&overlay), 1);
        assert_eq!(
            host.attr(&surface.container, "id").as_deref(),
            Some("floating-notes")
        );
        assert!(host.has_class(&surface.container, "dash-floating"));
        assert!(host.has_class(&surface.container, "card"));
        assert_eq!(
            host.attr(&surface.clone_root, "id").as_deref(),
            Some("floating-notes-notes")
        );
    }

    #[test]
    fn surfaces_cascade_by_the_configured_offset() {
        let host = MemoryHost::new();
        dashboard(&host);
        let config = ManagerConfig::default();
        let first = create(&host, &config, &SectionId::new("notes"), 0).unwrap();
        let second = create(&host, &config, &SectionId::new("notes"), 1).unwrap();
        let (x0, y0) = origin(&host, &first.container);
        let (x1, y1) = origin(&host, &second.container);
        assert_eq!(x1 - x0, config.cascade_offset_px);
        assert_eq!(y1 - y0, config.cascade_offset_px);
    }

    #[test]
    fn raise_bumps_above_the_topmost_sibling() {
        let host = MemoryHost::new();
        dashboard(&host);
        let config = ManagerConfig::default();
        let first = create(&host, &config, &SectionId::new("notes"), 0).unwrap();
        let second = create(&host, &config, &SectionId::new("notes"), 1).unwrap();
        let overlay = host.element_by_id("dash-overlay").unwrap();
        raise(&host, &overlay, &first.container);
        let z_first = parse_px_z(host.style(&first.container, "z-index"));
        let z_second = parse_px_z(host.style(&second.container, "z-index"));
        assert!(z_first > z_second);
    }

    #[test]
    fn minimize_collapses_only_the_content_area() {
        let host = MemoryHost::new();
        dashboard(&host);
        let config = ManagerConfig::default();
        let surface = create(&host, &config, &SectionId::new("notes"), 0).unwrap();
        set_minimized(&host, &surface.container, true);
        let content = &host.query_all(&surface.container, ".dash-content")[0];
        assert_eq!(host.style(content, "display").as_deref(), Some("none"));
        set_minimized(&host, &surface.container, false);
        assert!(host.style(content, "display").is_none());
    }

    #[test]
    fn create_fails_for_a_missing_section() {
        let host = MemoryHost::new();
        let err = create(&host, &ManagerConfig::default(), &SectionId::new("ghost"), 0)
            .err()
            .unwrap();
        assert!(err.to_string().contains("#ghost"));
    }
}
