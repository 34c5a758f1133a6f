//! Browser host over `web-sys`.
//
//! Thin pass-through implementations; every fallible DOM call degrades to a
//! no-op or `None` so a missing element or a detached node never turns into
//! an exception on the page.

use gloo_net::http::Request;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, HtmlAnchorElement, HtmlElement, NodeList, Window};

use super::Host;
use crate::error::SurfaceError;
use crate::proxy::{PopupContentRecord, PopupContentRequest};

#[derive(Clone)]
pub struct WebHost {
    window: Window,
    document: Document,
}

impl WebHost {
    /// `None` outside a browsing context.
    pub fn new() -> Option<Self> {
        let window = web_sys::window()?;
        let document = window.document()?;
        Some(Self { window, document })
    }

    fn collect(list: NodeList) -> Vec<Element> {
        let mut out = Vec::new();
        for index in 0..list.length() {
            if let Some(el) = list
                .item(index)
                .and_then(|node| node.dyn_into::<Element>().ok())
            {
                out.push(el);
            }
        }
        out
    }

    fn style_of(el: &Element) -> Option<web_sys::CssStyleDeclaration> {
        el.dyn_ref::<HtmlElement>().map(|html| html.style())
    }
}

impl Host for WebHost {
    type Element = Element;
    type Popup = Window;

    fn body(&self) -> Option<Element> {
        self.document.body().map(Element::from)
    }

    fn element_by_id(&self, id: &str) -> Option<Element> {
        self.document.get_element_by_id(id)
    }

    fn create_element(&self, tag: &str) -> Option<Element> {
        self.document.create_element(tag).ok()
    }

    fn clone_subtree(&self, el: &Element) -> Option<Element> {
        el.clone_node_with_deep(true)
            .ok()?
            .dyn_into::<Element>()
            .ok()
    }

    fn append_child(&self, parent: &Element, child: &Element) {
        let _ = parent.append_child(child);
    }

    fn remove(&self, el: &Element) {
        el.remove();
    }

    fn parent(&self, el: &Element) -> Option<Element> {
        el.parent_element()
    }

    fn query_all(&self, root: &Element, selector: &str) -> Vec<Element> {
        root.query_selector_all(selector)
            .map(Self::collect)
            .unwrap_or_default()
    }

    fn document_query_all(&self, selector: &str) -> Vec<Element> {
        self.document
            .query_selector_all(selector)
            .map(Self::collect)
            .unwrap_or_default()
    }

    fn attr(&self, el: &Element, name: &str) -> Option<String> {
        el.get_attribute(name)
    }

    fn set_attr(&self, el: &Element, name: &str, value: &str) {
        let _ = el.set_attribute(name, value);
    }

    fn has_class(&self, el: &Element, class: &str) -> bool {
        el.class_list().contains(class)
    }

    fn add_class(&self, el: &Element, class: &str) {
        let _ = el.class_list().add_1(class);
    }

    fn style(&self, el: &Element, prop: &str) -> Option<String> {
        let value = Self::style_of(el)?.get_property_value(prop).ok()?;
        if value.is_empty() { None } else { Some(value) }
    }

    fn set_style(&self, el: &Element, prop: &str, value: &str) {
        if let Some(style) = Self::style_of(el) {
            let _ = style.set_property(prop, value);
        }
    }

    fn clear_style(&self, el: &Element, prop: &str) {
        if let Some(style) = Self::style_of(el) {
            let _ = style.remove_property(prop);
        }
    }

    fn text(&self, el: &Element) -> String {
        el.text_content().unwrap_or_default()
    }

    fn set_text(&self, el: &Element, text: &str) {
        el.set_text_content(Some(text));
    }

    fn outer_html(&self, el: &Element) -> String {
        el.outer_html()
    }

    fn open_popup(&self, url: &str, name: &str, features: &str) -> Result<Window, SurfaceError> {
        self.window
            .open_with_url_and_target_and_features(url, name, features)
            .ok()
            .flatten()
            .ok_or(SurfaceError::PopupBlocked)
    }

    fn popup_closed(&self, popup: &Window) -> bool {
        popup.closed().unwrap_or(true)
    }

    fn close_popup(&self, popup: &Window) {
        let _ = popup.close();
    }

    fn navigate_popup(&self, popup: &Window, url: &str) {
        let _ = popup.location().set_href(url);
    }

    fn write_popup_document(&self, popup: &Window, html: &str) {
        let Some(doc) = popup.document() else {
            return;
        };
        let text = js_sys::Array::of1(&JsValue::from_str(html));
        if doc.write(&text).is_ok() {
            let _ = doc.close();
        }
    }

    fn open_tab(&self, url: &str) -> bool {
        if let Ok(Some(_)) = self.window.open_with_url_and_target(url, "_blank") {
            return true;
        }
        // window.open refused; a synthetic anchor click usually still goes
        // through inside the original user gesture.
        let Some(anchor) = self
            .document
            .create_element("a")
            .ok()
            .and_then(|el| el.dyn_into::<HtmlAnchorElement>().ok())
        else {
            return false;
        };
        anchor.set_href(url);
        anchor.set_target("_blank");
        anchor.set_rel("noopener");
        let Some(body) = self.document.body() else {
            return false;
        };
        let _ = body.append_child(&anchor);
        anchor.click();
        anchor.remove();
        true
    }

    async fn persist_popup_html(
        &self,
        endpoint: &str,
        html: &str,
    ) -> Result<PopupContentRecord, SurfaceError> {
        let body = serde_json::to_string(&PopupContentRequest { html })
            .map_err(|err| SurfaceError::ProxyUnavailable(err.to_string()))?;
        let response = Request::post(endpoint)
            .header("Content-Type", "application/json")
            .body(body)
            .map_err(|err| SurfaceError::ProxyUnavailable(err.to_string()))?
            .send()
            .await
            .map_err(|err| SurfaceError::ProxyUnavailable(err.to_string()))?;
        if !response.ok() {
            return Err(SurfaceError::ProxyUnavailable(format!(
                "status {}",
                response.status()
            )));
        }
        let text = response
            .text()
            .await
            .map_err(|err| SurfaceError::ProxyUnavailable(err.to_string()))?;
        serde_json::from_str(&text).map_err(|err| SurfaceError::ProxyUnavailable(err.to_string()))
    }

    async fn delete_popup_record(
        &self,
        endpoint: &str,
        record_id: &str,
    ) -> Result<(), SurfaceError> {
        let url = format!("{endpoint}/{record_id}");
        let response = Request::delete(&url)
            .send()
            .await
            .map_err(|err| SurfaceError::ProxyUnavailable(err.to_string()))?;
        if !response.ok() {
            return Err(SurfaceError::ProxyUnavailable(format!(
                "status {}",
                response.status()
            )));
        }
        Ok(())
    }
}
