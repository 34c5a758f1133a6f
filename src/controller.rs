//! Dock/undock controller.
//
//! `SurfaceManager` owns the registry and exposes only synchronous
//! transition methods, so every registry mutation happens in one borrow.
//! The free async functions below orchestrate the awaited tails (listener
//! rebinding, popup content delivery, record release) around short borrows
//! of the shared manager; none of those tails touches the registry.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::config::ManagerConfig;
use crate::drag::DragState;
use crate::host::Host;
use crate::rebind::ListenerRebinder;
use crate::registry::{RecordCell, SurfaceBinding, SurfaceKind, SurfaceRegistry};
use crate::remap::SurfaceNamespace;
use crate::section::{self, Section, SectionId};
use crate::surface::{FloatingSurface, floating, popup, tab};
use crate::{proxy, surface};

/// Shared handle form used by the async entry points and the web facade.
pub type SharedManager<H> = Rc<RefCell<SurfaceManager<H>>>;

pub struct SurfaceManager<H: Host> {
    host: H,
    config: ManagerConfig,
    sections: Vec<Section>,
    registry: SurfaceRegistry<H>,
    rebinder: Rc<ListenerRebinder<H>>,
    drag: DragState,
}

/// Outcome of the synchronous popup slot claim.
enum PopupClaim<H: Host> {
    Claimed {
        popup: H::Popup,
        html: String,
        record: RecordCell,
    },
    Blocked {
        html: String,
    },
    Missing,
}

impl<H: Host> SurfaceManager<H> {
    pub fn new(host: H, config: ManagerConfig) -> Self {
        let sections = section::discover(&host);
        debug!(count = sections.len(), "sections discovered");
        Self {
            host,
            config,
            sections,
            registry: SurfaceRegistry::new(),
            rebinder: Rc::new(ListenerRebinder::new()),
            drag: DragState::new(),
        }
    }

    pub fn shared(self) -> SharedManager<H> {
        Rc::new(RefCell::new(self))
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn section_state(&self, id: &SectionId) -> SurfaceKind {
        self.registry.kind_of(id)
    }

    pub fn known_section(&self, id: &SectionId) -> bool {
        self.sections.iter().any(|section| section.id == *id)
    }

    pub fn section_title(&self, id: &SectionId) -> String {
        self.sections
            .iter()
            .find(|section| section.id == *id)
            .map(|section| section.title.clone())
            .unwrap_or_default()
    }

    pub fn rebinder(&self) -> Rc<ListenerRebinder<H>> {
        self.rebinder.clone()
    }

    pub fn floating_container(&self, id: &SectionId) -> Option<H::Element> {
        match self.registry.get(id) {
            Some(SurfaceBinding::Floating { container, .. }) => Some(container.clone()),
            _ => None,
        }
    }

    /// Close whatever surface `id` holds and restore the docked section.
    /// Returns the popup content record to release, if one exists.
    pub fn close_surface(&mut self, id: &SectionId) -> Option<String> {
        let binding = self.registry.take(id)?;
        if self.drag.active_section() == Some(id) {
            // the surface under the pointer is going away
            self.drag.end();
        }
        debug!(section = %id, from = binding.kind().tag(), "docking section");
        let record = binding.close(&self.host);
        self.restore_original(id);
        record
    }

    /// Build a floating surface and bind it. The caller must have closed any
    /// previous binding; `None` means the section root is missing.
    fn create_floating(&mut self, id: &SectionId) -> Option<FloatingSurface<H>> {
        let open_count = self.registry.floating_count();
        let created = match floating::create(&self.host, &self.config, id, open_count) {
            Ok(created) => created,
            Err(err) => {
                warn!(section = %id, %err, "floating surface skipped");
                return None;
            }
        };
        self.hide_original(id);
        self.registry.insert(
            id.clone(),
            SurfaceBinding::Floating {
                container: created.container.clone(),
                minimized: false,
            },
        );
        debug!(section = %id, "floating surface opened");
        Some(created)
    }

    /// Claim the popup slot synchronously so the user gesture still covers
    /// the `window.open`.
    fn claim_popup(&mut self, id: &SectionId) -> PopupClaim<H> {
        let title = self.section_title(id);
        let html = match popup::build_document(&self.host, id, &title) {
            Ok(html) => html,
            Err(err) => {
                warn!(section = %id, %err, "popup skipped");
                return PopupClaim::Missing;
            }
        };
        let ns = SurfaceNamespace::popup(id);
        match self
            .host
            .open_popup("", ns.container_id(), &self.config.popup_features)
        {
            Ok(window) => {
                let record: RecordCell = Rc::new(RefCell::new(None));
                self.hide_original(id);
                self.registry.insert(
                    id.clone(),
                    SurfaceBinding::Popup {
                        window: window.clone(),
                        record: record.clone(),
                    },
                );
                debug!(section = %id, "popup window opened");
                PopupClaim::Claimed {
                    popup: window,
                    html,
                    record,
                }
            }
            Err(err) => {
                warn!(section = %id, %err, "popup blocked, walking fallback chain");
                PopupClaim::Blocked { html }
            }
        }
    }

    fn bind_external_tab(&mut self, id: &SectionId, record: Option<String>) {
        self.hide_original(id);
        self.registry
            .insert(id.clone(), SurfaceBinding::ExternalTab { record });
        debug!(section = %id, "section moved to an external tab");
    }

    /// Minimize toggles the floating content area; popups and tabs have
    /// native window chrome, so for them this is a logged no-op.
    pub fn minimize_floating_window(&mut self, id: &SectionId) {
        match self.registry.get_mut(id) {
            Some(SurfaceBinding::Floating {
                container,
                minimized,
            }) => {
                *minimized = !*minimized;
                let collapsed = *minimized;
                let container = container.clone();
                floating::set_minimized(&self.host, &container, collapsed);
                debug!(section = %id, collapsed, "floating surface minimize toggled");
            }
            Some(_) => debug!(section = %id, "minimize ignored for non-floating surface"),
            None => debug!(section = %id, "minimize ignored, section is docked"),
        }
    }

    pub fn is_popup_closed(&self, id: &SectionId) -> bool {
        matches!(
            self.registry.get(id),
            Some(SurfaceBinding::Popup { window, .. }) if self.host.popup_closed(window)
        )
    }

    /// Sweep popup bindings whose native window the user has closed.
    /// Returns the docked sections with their records to release.
    pub fn take_closed_popups(&mut self) -> Vec<(SectionId, Option<String>)> {
        let mut reaped = Vec::new();
        for id in self.registry.popup_sections() {
            if self.is_popup_closed(&id) {
                let record = self.close_surface(&id);
                reaped.push((id, record));
            }
        }
        reaped
    }

    pub fn bound_sections(&self) -> Vec<SectionId> {
        self.registry.bound_sections()
    }

    fn hide_original(&self, id: &SectionId) {
        if let Some(original) = self.host.element_by_id(id.as_str()) {
            self.host.set_style(&original, "display", "none");
        }
    }

    fn restore_original(&self, id: &SectionId) {
        if let Some(original) = self.host.element_by_id(id.as_str()) {
            self.host.clear_style(&original, "display");
        }
    }

    // Drag entry points, fed pointer coordinates by the facade.

    /// Start a header drag on `id`'s floating surface. Raises the surface
    /// either way; returns false when no gesture started (not floating, or
    /// another gesture is already active).
    pub fn drag_begin(&mut self, id: &SectionId, mouse_x: i32, mouse_y: i32) -> bool {
        let Some(container) = self.floating_container(id) else {
            return false;
        };
        if let Some(overlay) = self.host.element_by_id(&self.config.overlay_id) {
            floating::raise(&self.host, &overlay, &container);
        }
        let (x, y) = floating::origin(&self.host, &container);
        let started = self.drag.begin(id.clone(), x, y, mouse_x, mouse_y);
        if !started {
            debug!(section = %id, "mousedown ignored, a drag gesture is already active");
        }
        started
    }

    pub fn drag_move(&self, mouse_x: i32, mouse_y: i32) {
        let Some((id, x, y)) = self.drag.update(mouse_x, mouse_y) else {
            return;
        };
        if let Some(container) = self.floating_container(&id) {
            self.host.set_style(&container, "left", &format!("{x}px"));
            self.host.set_style(&container, "top", &format!("{y}px"));
        }
    }

    pub fn drag_end(&mut self) -> Option<SectionId> {
        self.drag.end()
    }
}

/// Return `id` to the docked layout, releasing its popup content record.
pub async fn dock_section<H: Host>(manager: SharedManager<H>, id: &SectionId) {
    let (host, endpoint, record) = {
        let mut m = manager.borrow_mut();
        let record = m.close_surface(id);
        (m.host.clone(), m.config.popup_endpoint.clone(), record)
    };
    if let Some(record_id) = record {
        proxy::release_record(&host, &endpoint, &record_id).await;
    }
}

/// Teardown sweep returning every section to the docked layout.
pub async fn dock_all<H: Host>(manager: SharedManager<H>) {
    let bound = manager.borrow().bound_sections();
    for id in bound {
        dock_section(manager.clone(), &id).await;
    }
}

/// Toggle transition: an open surface goes back to Docked; a docked section
/// opens the preferred surface kind.
pub async fn pop_out_section<H: Host>(
    manager: SharedManager<H>,
    id: &SectionId,
    prefer_popup: Option<bool>,
) {
    let (open, use_popup) = {
        let m = manager.borrow();
        (
            m.section_state(id) != SurfaceKind::Docked,
            prefer_popup.unwrap_or(m.config.prefer_popup_windows),
        )
    };
    if open {
        dock_section(manager, id).await;
    } else if use_popup {
        open_section_in_browser_popup(manager, id).await;
    } else {
        open_section_in_floating_window(manager, id).await;
    }
}

/// Open `id` as a floating surface. The surface is visible as soon as the
/// synchronous part runs; the await covers only listener rebinding, so
/// callers may ignore the returned future's completion safely.
pub async fn open_section_in_floating_window<H: Host>(
    manager: SharedManager<H>,
    id: &SectionId,
) -> Option<H::Element> {
    dock_section(manager.clone(), id).await;
    let (host, rebinder, created) = {
        let mut m = manager.borrow_mut();
        let created = m.create_floating(id);
        (m.host.clone(), m.rebinder(), created)
    };
    let created = created?;
    rebinder.attach_all(&host, &created.clone_root).await;
    Some(created.container)
}

/// Open `id` in a browser popup, falling back to an external tab and then a
/// floating surface when blocked. Never returns an error; every failure
/// degrades to a less capable surface.
pub async fn open_section_in_browser_popup<H: Host>(manager: SharedManager<H>, id: &SectionId) {
    dock_section(manager.clone(), id).await;
    let (host, endpoint, claim) = {
        let mut m = manager.borrow_mut();
        let claim = m.claim_popup(id);
        (m.host.clone(), m.config.popup_endpoint.clone(), claim)
    };
    match claim {
        PopupClaim::Claimed {
            popup,
            html,
            record,
        } => {
            proxy::deliver_popup_content(&host, &popup, &endpoint, &html, record).await;
        }
        PopupClaim::Blocked { html } => {
            match tab::open_for_html(&host, &endpoint, &html).await {
                surface::ExternalTabOutcome::Opened { record } => {
                    manager.borrow_mut().bind_external_tab(id, record);
                }
                surface::ExternalTabOutcome::Blocked => {
                    warn!(section = %id, "external tab refused, degrading to a floating surface");
                    open_section_in_floating_window(manager, id).await;
                }
            }
        }
        PopupClaim::Missing => {}
    }
}

/// Dock every section whose popup window the user has closed. Driven by the
/// facade's per-popup poll interval; detection latency is bounded by that
/// interval because no native close event exists.
pub async fn reap_closed_popups<H: Host>(manager: SharedManager<H>) -> Vec<SectionId> {
    let (host, endpoint, reaped) = {
        let mut m = manager.borrow_mut();
        (
            m.host.clone(),
            m.config.popup_endpoint.clone(),
            m.take_closed_popups(),
        )
    };
    let mut docked = Vec::new();
    for (id, record) in reaped {
        if let Some(record_id) = record {
            proxy::release_record(&host, &endpoint, &record_id).await;
        }
        docked.push(id);
    }
    docked
}
