//! Section presentation registry.
//
//! One authoritative map from section id to its active surface. `Docked` is
//! the absence of an entry; the controller is the only mutator, so the
//! at-most-one-surface invariant reduces to ordinary map semantics plus
//! close-before-insert in the transition methods.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::host::Host;
use crate::section::SectionId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceKind {
    Docked,
    Floating,
    Popup,
    ExternalTab,
}

impl SurfaceKind {
    pub fn tag(self) -> &'static str {
        match self {
            SurfaceKind::Docked => "docked",
            SurfaceKind::Floating => "floating",
            SurfaceKind::Popup => "popup",
            SurfaceKind::ExternalTab => "external-tab",
        }
    }
}

/// Shared cell for the popup content record id. The async delivery task
/// fills it in after the POST resolves; the dock path drains it. Keeping the
/// id out of the map means the awaited tail never touches the registry.
pub type RecordCell = Rc<RefCell<Option<String>>>;

pub enum SurfaceBinding<H: Host> {
    Floating {
        container: H::Element,
        minimized: bool,
    },
    Popup {
        window: H::Popup,
        record: RecordCell,
    },
    ExternalTab {
        record: Option<String>,
    },
}

impl<H: Host> SurfaceBinding<H> {
    pub fn kind(&self) -> SurfaceKind {
        match self {
            SurfaceBinding::Floating { .. } => SurfaceKind::Floating,
            SurfaceBinding::Popup { .. } => SurfaceKind::Popup,
            SurfaceBinding::ExternalTab { .. } => SurfaceKind::ExternalTab,
        }
    }

    /// Uniform close: native windows get `.close()`, DOM containers get
    /// removed, tabs have nothing to tear down. Returns the content record
    /// id, if any, so the caller can release it on the server.
    pub fn close(self, host: &H) -> Option<String> {
        match self {
            SurfaceBinding::Floating { container, .. } => {
                host.remove(&container);
                None
            }
            SurfaceBinding::Popup { window, record } => {
                host.close_popup(&window);
                record.borrow_mut().take()
            }
            SurfaceBinding::ExternalTab { record } => record,
        }
    }
}

pub struct SurfaceRegistry<H: Host> {
    bindings: BTreeMap<SectionId, SurfaceBinding<H>>,
}

impl<H: Host> Default for SurfaceRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Host> SurfaceRegistry<H> {
    pub fn new() -> Self {
        Self {
            bindings: BTreeMap::new(),
        }
    }

    pub fn kind_of(&self, id: &SectionId) -> SurfaceKind {
        self.bindings
            .get(id)
            .map(SurfaceBinding::kind)
            .unwrap_or(SurfaceKind::Docked)
    }

    pub fn get(&self, id: &SectionId) -> Option<&SurfaceBinding<H>> {
        self.bindings.get(id)
    }

    pub fn get_mut(&mut self, id: &SectionId) -> Option<&mut SurfaceBinding<H>> {
        self.bindings.get_mut(id)
    }

    /// Callers must have closed any previous binding first; inserting over a
    /// live one would leak its surface.
    pub fn insert(&mut self, id: SectionId, binding: SurfaceBinding<H>) {
        debug_assert!(!self.bindings.contains_key(&id));
        self.bindings.insert(id, binding);
    }

    pub fn take(&mut self, id: &SectionId) -> Option<SurfaceBinding<H>> {
        self.bindings.remove(id)
    }

    pub fn floating_count(&self) -> usize {
        self.bindings
            .values()
            .filter(|binding| binding.kind() == SurfaceKind::Floating)
            .count()
    }

    pub fn popup_sections(&self) -> Vec<SectionId> {
        self.bindings
            .iter()
            .filter(|(_, binding)| binding.kind() == SurfaceKind::Popup)
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub fn bound_sections(&self) -> Vec<SectionId> {
        self.bindings.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryHost;

    #[test]
    fn kind_of_unbound_section_is_docked() {
        let registry: SurfaceRegistry<MemoryHost> = SurfaceRegistry::new();
        assert_eq!(registry.kind_of(&SectionId::new("notes")), SurfaceKind::Docked);
    }

    #[test]
    fn closing_a_floating_binding_removes_its_container() {
        let host = MemoryHost::new();
        let body = host.body().unwrap();
        let container = host.create_element("div").unwrap();
        host.set_attr(&container, "id", "floating-notes");
        host.append_child(&body, &container);

        let mut registry: SurfaceRegistry<MemoryHost> = SurfaceRegistry::new();
        registry.insert(
            SectionId::new("notes"),
            SurfaceBinding::Floating {
                container,
                minimized: false,
            },
        );
        assert_eq!(registry.floating_count(), 1);

        let binding = registry.take(&SectionId::new("notes")).unwrap();
        assert!(binding.close(&host).is_none());
        assert!(host.element_by_id("floating-notes").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn closing_a_popup_binding_drains_its_record_cell() {
        let host = MemoryHost::new();
        let popup = host.open_popup("", "popup-notes", "").unwrap();
        let record: RecordCell = Rc::new(RefCell::new(Some("rec-7".to_string())));

        let mut registry: SurfaceRegistry<MemoryHost> = SurfaceRegistry::new();
        registry.insert(
            SectionId::new("notes"),
            SurfaceBinding::Popup {
                window: popup,
                record: record.clone(),
            },
        );
        let binding = registry.take(&SectionId::new("notes")).unwrap();
        assert_eq!(binding.close(&host).as_deref(), Some("rec-7"));
        assert!(record.borrow().is_none());
        assert!(host.popup_closed(&host.last_popup().unwrap()));
    }
}
