//! Id namespace remapping for surface clones.
//
//! The namespace is the sole authority for the prefix scheme; no other
//! module builds the string by hand. Remapping is a pure prefix function, so
//! two distinct original ids can never collide after the rewrite and
//! label/control pairs survive because `for` and `name` are rewritten with
//! the same function as `id`.
//!
//! Content rendered into a clone after remapping is not rewritten; feature
//! code that re-renders inside a clone must query relative to the clone
//! root instead of by global id.

use crate::constants::{FLOATING_PREFIX, POPUP_PREFIX};
use crate::host::Host;
use crate::section::SectionId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceNamespace {
    prefix: String,
}

impl SurfaceNamespace {
    pub fn floating(section: &SectionId) -> Self {
        Self {
            prefix: format!("{FLOATING_PREFIX}-{section}"),
        }
    }

    pub fn popup(section: &SectionId) -> Self {
        Self {
            prefix: format!("{POPUP_PREFIX}-{section}"),
        }
    }

    /// The bare prefix, used as the surface container's own id and as the
    /// `window.open` name for popups.
    pub fn container_id(&self) -> &str {
        &self.prefix
    }

    pub fn remapped(&self, original: &str) -> String {
        format!("{}-{original}", self.prefix)
    }

    /// Rewrite `id`, `label[for]`, and `name` across `root` and its
    /// descendants. `for` and `name` values are rewritten whether or not a
    /// matching id exists in the subtree; the prefix function keeps any
    /// pair that did match still matching.
    pub fn apply<H: Host>(&self, host: &H, root: &H::Element) {
        if let Some(id) = host.attr(root, "id") {
            host.set_attr(root, "id", &self.remapped(&id));
        }
        for el in host.query_all(root, "[id]") {
            if let Some(id) = host.attr(&el, "id") {
                host.set_attr(&el, "id", &self.remapped(&id));
            }
        }
        for el in host.query_all(root, "label[for]") {
            if let Some(target) = host.attr(&el, "for") {
                host.set_attr(&el, "for", &self.remapped(&target));
            }
        }
        for el in host.query_all(root, "[name]") {
            if let Some(name) = host.attr(&el, "name") {
                host.set_attr(&el, "name", &self.remapped(&name));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{MemoryElement, MemoryHost};

    fn labelled_input(host: &MemoryHost) -> MemoryElement {
        let root = host.create_element("div").unwrap();
        host.set_attr(&root, "id", "notes");
        let label = host.create_element("label").unwrap();
        host.set_attr(&label, "for", "a");
        let input = host.create_element("input").unwrap();
        host.set_attr(&input, "id", "a");
        host.set_attr(&input, "name", "a");
        host.append_child(&root, &label);
        host.append_child(&root, &input);
        root
    }

    #[test]
    fn label_control_pairs_survive_remapping() {
        let host = MemoryHost::new();
        let root = labelled_input(&host);
        let ns = SurfaceNamespace::floating(&SectionId::new("notes"));
        ns.apply(&host, &root);

        let ids: Vec<String> = host
            .query_all(&root, "[id]")
            .iter()
            .filter_map(|el| host.attr(el, "id"))
            .collect();
        assert_eq!(ids, vec!["floating-notes-a".to_string()]);

        let label = &host.query_all(&root, "label[for]")[0];
        assert_eq!(host.attr(label, "for").as_deref(), Some("floating-notes-a"));
        let input = &host.query_all(&root, "input")[0];
        assert_eq!(
            host.attr(input, "name").as_deref(),
            Some("floating-notes-a")
        );
    }

    #[test]
    fn root_id_is_remapped_too() {
        let host = MemoryHost::new();
        let root = labelled_input(&host);
        SurfaceNamespace::popup(&SectionId::new("notes")).apply(&host, &root);
        assert_eq!(host.attr(&root, "id").as_deref(), Some("popup-notes-notes"));
    }

    #[test]
    fn distinct_originals_never_collide() {
        let host = MemoryHost::new();
        let root = host.create_element("div").unwrap();
        for original in ["a", "b", "a-b"] {
            let child = host.create_element("span").unwrap();
            host.set_attr(&child, "id", original);
            host.append_child(&root, &child);
        }
        let ns = SurfaceNamespace::floating(&SectionId::new("timer"));
        ns.apply(&host, &root);
        let mut ids: Vec<String> = host
            .query_all(&root, "[id]")
            .iter()
            .filter_map(|el| host.attr(el, "id"))
            .collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 3);
        assert!(ids.iter().all(|id| id.starts_with("floating-timer-")));
    }

    #[test]
    fn floating_and_popup_prefixes_differ() {
        let id = SectionId::new("notes");
        assert_eq!(
            SurfaceNamespace::floating(&id).container_id(),
            "floating-notes"
        );
        assert_eq!(SurfaceNamespace::popup(&id).container_id(), "popup-notes");
    }
}
