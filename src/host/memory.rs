//! Deterministic in-memory host.
//
//! A small element arena standing in for the document, plus recorded
//! window/network effects. Popup blocking, tab blocking, and content-service
//! failures are scriptable so the fallback chain can be driven end to end
//! without a browser.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use super::Host;
use crate::error::SurfaceError;
use crate::proxy::PopupContentRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryElement(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryPopup(usize);

#[derive(Debug, Default)]
struct MemoryNode {
    tag: String,
    attrs: BTreeMap<String, String>,
    styles: BTreeMap<String, String>,
    text: String,
    children: Vec<usize>,
    parent: Option<usize>,
}

#[derive(Debug)]
struct PopupState {
    name: String,
    url: String,
    closed: bool,
    written: Option<String>,
}

#[derive(Debug, Default)]
struct MemoryDom {
    nodes: Vec<MemoryNode>,
    body: usize,
    popups: Vec<PopupState>,
    popups_blocked: bool,
    tabs_blocked: bool,
    proxy_failing: bool,
    posted_bodies: Vec<String>,
    deleted_records: Vec<String>,
    opened_tabs: Vec<String>,
    next_record: usize,
}

enum Selector {
    Tag(String),
    Class(String),
    Attr(String),
    TagAttr(String, String),
}

fn parse_selector(selector: &str) -> Option<Selector> {
    let selector = selector.trim();
    if let Some(class) = selector.strip_prefix('.') {
        return Some(Selector::Class(class.to_string()));
    }
    if let Some(rest) = selector.strip_prefix('[') {
        let attr = rest.strip_suffix(']')?;
        return Some(Selector::Attr(attr.to_string()));
    }
    if let Some(idx) = selector.find('[') {
        let (tag, rest) = selector.split_at(idx);
        let attr = rest.strip_prefix('[')?.strip_suffix(']')?;
        return Some(Selector::TagAttr(tag.to_string(), attr.to_string()));
    }
    if selector.is_empty() {
        return None;
    }
    Some(Selector::Tag(selector.to_string()))
}

impl MemoryDom {
    fn new() -> Self {
        let mut dom = MemoryDom::default();
        dom.nodes.push(MemoryNode {
            tag: "body".to_string(),
            ..MemoryNode::default()
        });
        dom.body = 0;
        dom
    }

    fn node_has_class(&self, idx: usize, class: &str) -> bool {
        self.nodes[idx]
            .attrs
            .get("class")
            .is_some_and(|value| value.split_whitespace().any(|name| name == class))
    }

    fn node_matches(&self, idx: usize, selector: &Selector) -> bool {
        let node = &self.nodes[idx];
        match selector {
            Selector::Tag(tag) => node.tag == *tag,
            Selector::Class(class) => self.node_has_class(idx, class),
            Selector::Attr(attr) => node.attrs.contains_key(attr),
            Selector::TagAttr(tag, attr) => node.tag == *tag && node.attrs.contains_key(attr),
        }
    }

    fn collect_matching(&self, idx: usize, selector: &Selector, out: &mut Vec<MemoryElement>) {
        if self.node_matches(idx, selector) {
            out.push(MemoryElement(idx));
        }
        for &child in &self.nodes[idx].children {
            self.collect_matching(child, selector, out);
        }
    }

    fn find_by_id(&self, idx: usize, id: &str) -> Option<usize> {
        if self.nodes[idx].attrs.get("id").map(String::as_str) == Some(id) {
            return Some(idx);
        }
        self.nodes[idx]
            .children
            .iter()
            .find_map(|&child| self.find_by_id(child, id))
    }

    fn clone_node(&mut self, idx: usize, parent: Option<usize>) -> usize {
        let copy = MemoryNode {
            tag: self.nodes[idx].tag.clone(),
            attrs: self.nodes[idx].attrs.clone(),
            styles: self.nodes[idx].styles.clone(),
            text: self.nodes[idx].text.clone(),
            children: Vec::new(),
            parent,
        };
        let new_idx = self.nodes.len();
        self.nodes.push(copy);
        let children = self.nodes[idx].children.clone();
        for child in children {
            let new_child = self.clone_node(child, Some(new_idx));
            self.nodes[new_idx].children.push(new_child);
        }
        new_idx
    }

    fn serialize(&self, idx: usize, out: &mut String) {
        let node = &self.nodes[idx];
        out.push('<');
        out.push_str(&node.tag);
        for (name, value) in &node.attrs {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            out.push_str(&value.replace('&', "&amp;").replace('"', "&quot;"));
            out.push('"');
        }
        if !node.styles.is_empty() {
            let style = node
                .styles
                .iter()
                .map(|(prop, value)| format!("{prop}: {value}"))
                .collect::<Vec<_>>()
                .join("; ");
            out.push_str(" style=\"");
            out.push_str(&style);
            out.push('"');
        }
        out.push('>');
        out.push_str(&node.text);
        for &child in &node.children {
            self.serialize(child, out);
        }
        out.push_str("</");
        out.push_str(&node.tag);
        out.push('>');
    }

    fn detach(&mut self, idx: usize) {
        if let Some(parent) = self.nodes[idx].parent.take() {
            self.nodes[parent].children.retain(|&child| child != idx);
        }
    }
}

#[derive(Debug, Clone)]
pub struct MemoryHost {
    dom: Rc<RefCell<MemoryDom>>,
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHost {
    pub fn new() -> Self {
        Self {
            dom: Rc::new(RefCell::new(MemoryDom::new())),
        }
    }

    pub fn set_popups_blocked(&self, blocked: bool) {
        self.dom.borrow_mut().popups_blocked = blocked;
    }

    pub fn set_tabs_blocked(&self, blocked: bool) {
        self.dom.borrow_mut().tabs_blocked = blocked;
    }

    pub fn set_proxy_failing(&self, failing: bool) {
        self.dom.borrow_mut().proxy_failing = failing;
    }

    pub fn popup_count(&self) -> usize {
        self.dom.borrow().popups.len()
    }

    pub fn last_popup(&self) -> Option<MemoryPopup> {
        let count = self.dom.borrow().popups.len();
        count.checked_sub(1).map(MemoryPopup)
    }

    pub fn popup_name(&self, popup: &MemoryPopup) -> String {
        self.dom.borrow().popups[popup.0].name.clone()
    }

    pub fn popup_url(&self, popup: &MemoryPopup) -> String {
        self.dom.borrow().popups[popup.0].url.clone()
    }

    pub fn popup_written(&self, popup: &MemoryPopup) -> Option<String> {
        self.dom.borrow().popups[popup.0].written.clone()
    }

    pub fn posted_bodies(&self) -> Vec<String> {
        self.dom.borrow().posted_bodies.clone()
    }

    /// Record ids whose release was attempted, whether or not the scripted
    /// service accepted it.
    pub fn deleted_records(&self) -> Vec<String> {
        self.dom.borrow().deleted_records.clone()
    }

    pub fn opened_tabs(&self) -> Vec<String> {
        self.dom.borrow().opened_tabs.clone()
    }

    pub fn child_count(&self, el: &MemoryElement) -> usize {
        self.dom.borrow().nodes[el.0].children.len()
    }
}

impl Host for MemoryHost {
    type Element = MemoryElement;
    type Popup = MemoryPopup;

    fn body(&self) -> Option<MemoryElement> {
        Some(MemoryElement(self.dom.borrow().body))
    }

    fn element_by_id(&self, id: &str) -> Option<MemoryElement> {
        let dom = self.dom.borrow();
        dom.find_by_id(dom.body, id).map(MemoryElement)
    }

    fn create_element(&self, tag: &str) -> Option<MemoryElement> {
        let mut dom = self.dom.borrow_mut();
        let idx = dom.nodes.len();
        dom.nodes.push(MemoryNode {
            tag: tag.to_string(),
            ..MemoryNode::default()
        });
        Some(MemoryElement(idx))
    }

    fn clone_subtree(&self, el: &MemoryElement) -> Option<MemoryElement> {
        let idx = self.dom.borrow_mut().clone_node(el.0, None);
        Some(MemoryElement(idx))
    }

    fn append_child(&self, parent: &MemoryElement, child: &MemoryElement) {
        let mut dom = self.dom.borrow_mut();
        dom.detach(child.0);
        dom.nodes[child.0].parent = Some(parent.0);
        dom.nodes[parent.0].children.push(child.0);
    }

    fn remove(&self, el: &MemoryElement) {
        self.dom.borrow_mut().detach(el.0);
    }

    fn parent(&self, el: &MemoryElement) -> Option<MemoryElement> {
        self.dom.borrow().nodes[el.0].parent.map(MemoryElement)
    }

    fn query_all(&self, root: &MemoryElement, selector: &str) -> Vec<MemoryElement> {
        let Some(selector) = parse_selector(selector) else {
            return Vec::new();
        };
        let dom = self.dom.borrow();
        let mut out = Vec::new();
        for &child in &dom.nodes[root.0].children {
            dom.collect_matching(child, &selector, &mut out);
        }
        out
    }

    fn document_query_all(&self, selector: &str) -> Vec<MemoryElement> {
        let Some(selector) = parse_selector(selector) else {
            return Vec::new();
        };
        let dom = self.dom.borrow();
        let mut out = Vec::new();
        dom.collect_matching(dom.body, &selector, &mut out);
        out
    }

    fn attr(&self, el: &MemoryElement, name: &str) -> Option<String> {
        self.dom.borrow().nodes[el.0].attrs.get(name).cloned()
    }

    fn set_attr(&self, el: &MemoryElement, name: &str, value: &str) {
        self.dom.borrow_mut().nodes[el.0]
            .attrs
            .insert(name.to_string(), value.to_string());
    }

    fn has_class(&self, el: &MemoryElement, class: &str) -> bool {
        self.dom.borrow().node_has_class(el.0, class)
    }

    fn add_class(&self, el: &MemoryElement, class: &str) {
        let mut dom = self.dom.borrow_mut();
        if dom.node_has_class(el.0, class) {
            return;
        }
        let node = &mut dom.nodes[el.0];
        let value = match node.attrs.get("class") {
            Some(existing) if !existing.is_empty() => format!("{existing} {class}"),
            _ => class.to_string(),
        };
        node.attrs.insert("class".to_string(), value);
    }

    fn style(&self, el: &MemoryElement, prop: &str) -> Option<String> {
        self.dom.borrow().nodes[el.0].styles.get(prop).cloned()
    }

    fn set_style(&self, el: &MemoryElement, prop: &str, value: &str) {
        self.dom.borrow_mut().nodes[el.0]
            .styles
            .insert(prop.to_string(), value.to_string());
    }

    fn clear_style(&self, el: &MemoryElement, prop: &str) {
        self.dom.borrow_mut().nodes[el.0].styles.remove(prop);
    }

    fn text(&self, el: &MemoryElement) -> String {
        self.dom.borrow().nodes[el.0].text.clone()
    }

    fn set_text(&self, el: &MemoryElement, text: &str) {
        let mut dom = self.dom.borrow_mut();
        dom.nodes[el.0].children.clear();
        dom.nodes[el.0].text = text.to_string();
    }

    fn outer_html(&self, el: &MemoryElement) -> String {
        let dom = self.dom.borrow();
        let mut out = String::new();
        dom.serialize(el.0, &mut out);
        out
    }

    fn open_popup(
        &self,
        url: &str,
        name: &str,
        _features: &str,
    ) -> Result<MemoryPopup, SurfaceError> {
        let mut dom = self.dom.borrow_mut();
        if dom.popups_blocked {
            return Err(SurfaceError::PopupBlocked);
        }
        let idx = dom.popups.len();
        dom.popups.push(PopupState {
            name: name.to_string(),
            url: url.to_string(),
            closed: false,
            written: None,
        });
        Ok(MemoryPopup(idx))
    }

    fn popup_closed(&self, popup: &MemoryPopup) -> bool {
        self.dom.borrow().popups[popup.0].closed
    }

    fn close_popup(&self, popup: &MemoryPopup) {
        self.dom.borrow_mut().popups[popup.0].closed = true;
    }

    fn navigate_popup(&self, popup: &MemoryPopup, url: &str) {
        self.dom.borrow_mut().popups[popup.0].url = url.to_string();
    }

    fn write_popup_document(&self, popup: &MemoryPopup, html: &str) {
        self.dom.borrow_mut().popups[popup.0].written = Some(html.to_string());
    }

    fn open_tab(&self, url: &str) -> bool {
        let mut dom = self.dom.borrow_mut();
        if dom.tabs_blocked {
            return false;
        }
        dom.opened_tabs.push(url.to_string());
        true
    }

    async fn persist_popup_html(
        &self,
        endpoint: &str,
        html: &str,
    ) -> Result<PopupContentRecord, SurfaceError> {
        let mut dom = self.dom.borrow_mut();
        if dom.proxy_failing {
            return Err(SurfaceError::ProxyUnavailable("scripted failure".into()));
        }
        dom.posted_bodies.push(html.to_string());
        let id = format!("rec-{}", dom.next_record);
        dom.next_record += 1;
        let url = format!("{endpoint}/{id}");
        Ok(PopupContentRecord { id, url })
    }

    async fn delete_popup_record(
        &self,
        _endpoint: &str,
        record_id: &str,
    ) -> Result<(), SurfaceError> {
        let mut dom = self.dom.borrow_mut();
        dom.deleted_records.push(record_id.to_string());
        if dom.proxy_failing {
            return Err(SurfaceError::ProxyUnavailable("scripted failure".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    fn host_with_tree() -> (MemoryHost, MemoryElement) {
        let host = MemoryHost::new();
        let body = host.body().unwrap();
        let section = host.create_element("div").unwrap();
        host.set_attr(&section, "id", "notes");
        host.set_attr(&section, "class", "dash-section");
        let input = host.create_element("input").unwrap();
        host.set_attr(&input, "id", "notes-text");
        host.set_attr(&input, "name", "notes-text");
        let label = host.create_element("label").unwrap();
        host.set_attr(&label, "for", "notes-text");
        host.append_child(&section, &label);
        host.append_child(&section, &input);
        host.append_child(&body, &section);
        (host, section)
    }

    #[test]
    fn selectors_match_tag_class_and_attr() {
        let (host, section) = host_with_tree();
        assert_eq!(host.query_all(&section, "[id]").len(), 1);
        assert_eq!(host.query_all(&section, "label[for]").len(), 1);
        assert_eq!(host.query_all(&section, "[name]").len(), 1);
        assert_eq!(host.document_query_all(".dash-section").len(), 1);
        assert_eq!(host.query_all(&section, "input").len(), 1);
    }

    #[test]
    fn query_all_excludes_the_root() {
        let (host, section) = host_with_tree();
        // section itself carries an id but only descendants are returned
        assert!(
            host.query_all(&section, "[id]")
                .iter()
                .all(|el| *el != section)
        );
    }

    #[test]
    fn clone_subtree_is_deep_and_detached() {
        let (host, section) = host_with_tree();
        let copy = host.clone_subtree(&section).unwrap();
        assert_ne!(copy, section);
        assert!(host.parent(&copy).is_none());
        assert_eq!(host.query_all(&copy, "[id]").len(), 1);
        // mutating the copy leaves the original alone
        let copied_input = host.query_all(&copy, "input")[0];
        host.set_attr(&copied_input, "id", "other");
        let original_input = host.query_all(&section, "input")[0];
        assert_eq!(host.attr(&original_input, "id").as_deref(), Some("notes-text"));
    }

    #[test]
    fn removed_subtrees_are_not_reachable_by_id() {
        let (host, section) = host_with_tree();
        assert!(host.element_by_id("notes").is_some());
        host.remove(&section);
        assert!(host.element_by_id("notes").is_none());
    }

    #[test]
    fn outer_html_serializes_attrs_and_styles() {
        let (host, section) = host_with_tree();
        host.set_style(&section, "display", "none");
        let html = host.outer_html(&section);
        assert!(html.contains("id=\"notes\""));
        assert!(html.contains("style=\"display: none\""));
        assert!(html.contains("<label for=\"notes-text\"></label>"));
    }

    #[test]
    fn blocked_popups_and_tabs_are_scriptable() {
        let host = MemoryHost::new();
        host.set_popups_blocked(true);
        assert!(host.open_popup("", "popup-notes", "").is_err());
        host.set_tabs_blocked(true);
        assert!(!host.open_tab("/popup/rec-0"));
        host.set_tabs_blocked(false);
        assert!(host.open_tab("/popup/rec-0"));
        assert_eq!(host.opened_tabs(), vec!["/popup/rec-0".to_string()]);
    }

    #[test]
    fn content_service_records_posts_and_deletes() {
        let host = MemoryHost::new();
        let record = block_on(host.persist_popup_html("/popup", "<div></div>")).unwrap();
        assert_eq!(record.id, "rec-0");
        assert_eq!(record.url, "/popup/rec-0");
        block_on(host.delete_popup_record("/popup", &record.id)).unwrap();
        assert_eq!(host.posted_bodies().len(), 1);
        assert_eq!(host.deleted_records(), vec!["rec-0".to_string()]);

        host.set_proxy_failing(true);
        assert!(block_on(host.persist_popup_html("/popup", "x")).is_err());
    }
}
