//! Host abstraction over the browser.
//
//! Everything the surface manager needs from its environment goes through
//! this trait: element handles, subtree cloning, attribute and style access,
//! popup windows, tabs, and the popup content service. The production host
//! wraps `web-sys`; the in-memory host runs the same state machine
//! deterministically under native tests.

pub mod memory;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use memory::{MemoryElement, MemoryHost, MemoryPopup};
#[cfg(target_arch = "wasm32")]
pub use web::WebHost;

use crate::error::SurfaceError;
use crate::proxy::PopupContentRecord;

#[allow(async_fn_in_trait)]
pub trait Host: Clone {
    /// Handle to a live element. Equality is node identity, not structure.
    type Element: Clone + PartialEq;
    /// Handle to an open popup window.
    type Popup: Clone;

    fn body(&self) -> Option<Self::Element>;
    fn element_by_id(&self, id: &str) -> Option<Self::Element>;
    fn create_element(&self, tag: &str) -> Option<Self::Element>;
    /// Deep copy of `el`, detached from the document.
    fn clone_subtree(&self, el: &Self::Element) -> Option<Self::Element>;
    fn append_child(&self, parent: &Self::Element, child: &Self::Element);
    fn remove(&self, el: &Self::Element);
    fn parent(&self, el: &Self::Element) -> Option<Self::Element>;
    /// Descendants of `root` matching `selector`; the root itself is never
    /// included. Supported grammar: `tag`, `.class`, `[attr]`, `tag[attr]`.
    fn query_all(&self, root: &Self::Element, selector: &str) -> Vec<Self::Element>;
    fn document_query_all(&self, selector: &str) -> Vec<Self::Element>;

    fn attr(&self, el: &Self::Element, name: &str) -> Option<String>;
    fn set_attr(&self, el: &Self::Element, name: &str, value: &str);
    fn has_class(&self, el: &Self::Element, class: &str) -> bool;
    fn add_class(&self, el: &Self::Element, class: &str);
    /// Inline style value for `prop`, `None` when unset.
    fn style(&self, el: &Self::Element, prop: &str) -> Option<String>;
    fn set_style(&self, el: &Self::Element, prop: &str, value: &str);
    fn clear_style(&self, el: &Self::Element, prop: &str);
    fn text(&self, el: &Self::Element) -> String;
    fn set_text(&self, el: &Self::Element, text: &str);
    fn outer_html(&self, el: &Self::Element) -> String;

    /// Claim a popup window synchronously. `Err(PopupBlocked)` when the
    /// browser refuses the open.
    fn open_popup(
        &self,
        url: &str,
        name: &str,
        features: &str,
    ) -> Result<Self::Popup, SurfaceError>;
    fn popup_closed(&self, popup: &Self::Popup) -> bool;
    fn close_popup(&self, popup: &Self::Popup);
    fn navigate_popup(&self, popup: &Self::Popup, url: &str);
    /// Write a complete HTML document into an already-open popup.
    fn write_popup_document(&self, popup: &Self::Popup, html: &str);
    /// Open `url` in a new tab. Returns false when the host could not even
    /// dispatch the open.
    fn open_tab(&self, url: &str) -> bool;

    /// POST the serialized popup document to the content service, yielding
    /// the record to navigate to.
    async fn persist_popup_html(
        &self,
        endpoint: &str,
        html: &str,
    ) -> Result<PopupContentRecord, SurfaceError>;
    /// Release a previously persisted record. Best effort; callers ignore
    /// failures beyond logging.
    async fn delete_popup_record(&self, endpoint: &str, record_id: &str)
    -> Result<(), SurfaceError>;
}
