//! JS facade.
//
//! Owns the shared manager, the per-popup close-poll intervals, the
//! document-level drag listeners, and the `message` listener for the typed
//! popup envelope. Everything here is wiring; transition semantics live in
//! the controller.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use futures::FutureExt;
use gloo_timers::callback::Interval;
use tracing::{debug, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{JsFuture, spawn_local};
use web_sys::{Element, MessageEvent, MouseEvent};

use crate::config::ManagerConfig;
use crate::constants::{
    CLOSE_BUTTON_CLASS, FLOAT_BUTTON_CLASS, HEADER_CLASS, MINIMIZE_BUTTON_CLASS,
};
use crate::controller::{self, SharedManager, SurfaceManager};
use crate::host::WebHost;
use crate::messages::PopupMessage;
use crate::rebind::AttachFn;
use crate::registry::SurfaceKind;
use crate::section::SectionId;
use crate::tracing_sub;

type Watchers = Rc<RefCell<HashMap<String, Interval>>>;

#[wasm_bindgen]
pub struct DashWm {
    inner: SharedManager<WebHost>,
    watchers: Watchers,
}

#[wasm_bindgen]
impl DashWm {
    /// `options` is a JSON-encoded [`ManagerConfig`]; invalid options fall
    /// back to defaults with a logged warning, never an exception.
    #[wasm_bindgen(constructor)]
    pub fn new(options: Option<String>) -> Result<DashWm, JsValue> {
        tracing_sub::init_default();
        let host = WebHost::new()
            .ok_or_else(|| JsValue::from_str("dash-wm requires a browsing context"))?;
        let config = match options.as_deref() {
            Some(raw) => match serde_json::from_str::<ManagerConfig>(raw) {
                Ok(config) => config,
                Err(err) => {
                    warn!(%err, "invalid manager options, using defaults");
                    ManagerConfig::default()
                }
            },
            None => ManagerConfig::default(),
        };
        let wm = DashWm {
            inner: SurfaceManager::new(host, config).shared(),
            watchers: Rc::new(RefCell::new(HashMap::new())),
        };
        wm.install_message_listener();
        wm.install_drag_listeners();
        Ok(wm)
    }

    /// Register a feature whose listeners must be re-attached on clones.
    /// `loader` is called lazily (the dynamic-import analog) and must return
    /// a Promise resolving to a `(rootElement) => void` attach function.
    #[wasm_bindgen(js_name = registerFeature)]
    pub fn register_feature(&self, name: String, loader: js_sys::Function) {
        let rebinder = self.inner.borrow().rebinder();
        rebinder.register(name, move || {
            let loader = loader.clone();
            async move {
                let promise: js_sys::Promise = loader
                    .call0(&JsValue::NULL)
                    .map_err(|err| format!("{err:?}"))?
                    .dyn_into()
                    .map_err(|_| "feature loader did not return a Promise".to_string())?;
                let attach: js_sys::Function = JsFuture::from(promise)
                    .await
                    .map_err(|err| format!("{err:?}"))?
                    .dyn_into()
                    .map_err(|_| "feature module did not resolve to a function".to_string())?;
                Ok(Rc::new(move |root: &Element| {
                    if let Err(err) = attach.call1(&JsValue::NULL, root) {
                        warn!(?err, "feature attach threw, clone stays inert for it");
                    }
                }) as AttachFn<Element>)
            }
            .boxed_local()
        });
    }

    /// Toggle `sectionId` out of (or back into) the docked layout.
    #[wasm_bindgen(js_name = popOutSection)]
    pub fn pop_out_section(&self, section_id: String, enable_popup_windows: Option<bool>) {
        let inner = self.inner.clone();
        let watchers = self.watchers.clone();
        spawn_local(async move {
            let id = SectionId::new(section_id);
            controller::pop_out_section(inner.clone(), &id, enable_popup_windows).await;
            finish_transition(&inner, &watchers, &id);
        });
    }

    /// Resolves once the clone is fully interactive; the surface itself is
    /// visible before the returned Promise settles.
    #[wasm_bindgen(js_name = openSectionInFloatingWindow)]
    pub async fn open_section_in_floating_window(&self, section_id: String) -> JsValue {
        let id = SectionId::new(section_id);
        let container = controller::open_section_in_floating_window(self.inner.clone(), &id).await;
        finish_transition(&self.inner, &self.watchers, &id);
        match container {
            Some(container) => container.into(),
            None => JsValue::NULL,
        }
    }

    #[wasm_bindgen(js_name = openSectionInBrowserPopup)]
    pub async fn open_section_in_browser_popup(&self, section_id: String) {
        let id = SectionId::new(section_id);
        controller::open_section_in_browser_popup(self.inner.clone(), &id).await;
        finish_transition(&self.inner, &self.watchers, &id);
    }

    #[wasm_bindgen(js_name = closeFloatingWindow)]
    pub fn close_floating_window(&self, section_id: String) {
        let id = SectionId::new(section_id);
        if self.inner.borrow().section_state(&id) != SurfaceKind::Floating {
            return;
        }
        let inner = self.inner.clone();
        let watchers = self.watchers.clone();
        spawn_local(async move {
            controller::dock_section(inner.clone(), &id).await;
            finish_transition(&inner, &watchers, &id);
        });
    }

    #[wasm_bindgen(js_name = minimizeFloatingWindow)]
    pub fn minimize_floating_window(&self, section_id: String) {
        self.inner
            .borrow_mut()
            .minimize_floating_window(&SectionId::new(section_id));
    }

    #[wasm_bindgen(js_name = dockAll)]
    pub fn dock_all(&self) {
        let inner = self.inner.clone();
        let watchers = self.watchers.clone();
        spawn_local(async move {
            controller::dock_all(inner).await;
            watchers.borrow_mut().clear();
        });
    }

    /// Current surface kind as a lowercase tag, for state badges.
    #[wasm_bindgen(js_name = sectionState)]
    pub fn section_state(&self, section_id: String) -> String {
        self.inner
            .borrow()
            .section_state(&SectionId::new(section_id))
            .tag()
            .to_string()
    }
}

impl DashWm {
    fn install_message_listener(&self) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let inner = self.inner.clone();
        let watchers = self.watchers.clone();
        let closure = Closure::<dyn FnMut(MessageEvent)>::wrap(Box::new(
            move |event: MessageEvent| {
                let Some(raw) = event.data().as_string() else {
                    return;
                };
                match PopupMessage::parse(&raw) {
                    Ok(PopupMessage::DockSection { section }) => {
                        let id = SectionId::new(section);
                        if !inner.borrow().known_section(&id) {
                            warn!(section = %id, "dock request for unknown section dropped");
                            return;
                        }
                        let inner = inner.clone();
                        let watchers = watchers.clone();
                        spawn_local(async move {
                            controller::dock_section(inner.clone(), &id).await;
                            finish_transition(&inner, &watchers, &id);
                        });
                    }
                    Ok(PopupMessage::Notify { text }) => debug!(%text, "popup notification"),
                    Err(err) => debug!(%err, "ignoring message without a valid envelope"),
                }
            },
        ));
        let _ = window.add_event_listener_with_callback("message", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    /// Document-level mousemove/mouseup installed once and gated by the
    /// drag state (both are no-ops without an active gesture); per-gesture
    /// add/remove would force closure self-removal gymnastics for no
    /// observable difference.
    fn install_drag_listeners(&self) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        let inner = self.inner.clone();
        let mv = Closure::<dyn FnMut(MouseEvent)>::wrap(Box::new(move |event: MouseEvent| {
            inner.borrow().drag_move(event.client_x(), event.client_y());
        }));
        let _ = document.add_event_listener_with_callback("mousemove", mv.as_ref().unchecked_ref());
        mv.forget();

        let inner = self.inner.clone();
        let up = Closure::<dyn FnMut(MouseEvent)>::wrap(Box::new(move |_event: MouseEvent| {
            inner.borrow_mut().drag_end();
        }));
        let _ = document.add_event_listener_with_callback("mouseup", up.as_ref().unchecked_ref());
        up.forget();
    }
}

/// Every transition funnels through here: the section's close watcher is
/// dropped unconditionally before the new state wires up, because a stale
/// watcher can never self-cancel once the binding is no longer Popup
/// (`is_popup_closed` stays false forever).
fn finish_transition(inner: &SharedManager<WebHost>, watchers: &Watchers, id: &SectionId) {
    watchers.borrow_mut().remove(id.as_str());
    let (state, container, poll_ms) = {
        let m = inner.borrow();
        (
            m.section_state(id),
            m.floating_container(id),
            m.config().popup_poll_ms,
        )
    };
    match state {
        SurfaceKind::Floating => {
            if let Some(container) = container {
                wire_floating_controls(inner, id, &container);
            }
        }
        SurfaceKind::Popup => start_popup_watcher(inner, watchers, id, poll_ms),
        SurfaceKind::Docked | SurfaceKind::ExternalTab => {}
    }
}

/// No native close event exists for popup windows, so each one gets a poll
/// interval; detection latency is bounded by `poll_ms`.
fn start_popup_watcher(
    inner: &SharedManager<WebHost>,
    watchers: &Watchers,
    id: &SectionId,
    poll_ms: u32,
) {
    let inner = inner.clone();
    let watchers_in = watchers.clone();
    let id_in = id.clone();
    let interval = Interval::new(poll_ms, move || {
        if !inner.borrow().is_popup_closed(&id_in) {
            return;
        }
        let inner = inner.clone();
        let watchers = watchers_in.clone();
        let id = id_in.clone();
        spawn_local(async move {
            controller::dock_section(inner.clone(), &id).await;
            // dropping the interval cancels the watcher; this runs on a
            // fresh task, not inside the interval's own callback
            finish_transition(&inner, &watchers, &id);
        });
    });
    watchers.borrow_mut().insert(id.as_str().to_string(), interval);
}

fn wire_floating_controls(inner: &SharedManager<WebHost>, id: &SectionId, container: &Element) {
    // the clone's float button toggles back to docked, same as close
    for selector in [
        format!(".{CLOSE_BUTTON_CLASS}"),
        format!(".{FLOAT_BUTTON_CLASS}"),
    ] {
        for button in query(container, &selector) {
            let inner = inner.clone();
            let id = id.clone();
            on_click(&button, move || {
                let inner = inner.clone();
                let id = id.clone();
                spawn_local(async move {
                    controller::dock_section(inner, &id).await;
                });
            });
        }
    }
    for button in query(container, &format!(".{MINIMIZE_BUTTON_CLASS}")) {
        let inner = inner.clone();
        let id = id.clone();
        on_click(&button, move || {
            inner.borrow_mut().minimize_floating_window(&id);
        });
    }
    if let Some(header) = query(container, &format!(".{HEADER_CLASS}")).into_iter().next() {
        let inner = inner.clone();
        let id = id.clone();
        let closure = Closure::<dyn FnMut(MouseEvent)>::wrap(Box::new(move |event: MouseEvent| {
            if inner
                .borrow_mut()
                .drag_begin(&id, event.client_x(), event.client_y())
            {
                event.prevent_default();
            }
        }));
        let _ = header.add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
        closure.forget();
    }
}

fn query(root: &Element, selector: &str) -> Vec<Element> {
    let mut out = Vec::new();
    if let Ok(list) = root.query_selector_all(selector) {
        for index in 0..list.length() {
            if let Some(el) = list
                .item(index)
                .and_then(|node| node.dyn_into::<Element>().ok())
            {
                out.push(el);
            }
        }
    }
    out
}

fn on_click(el: &Element, handler: impl FnMut() + 'static) {
    let mut handler = handler;
    let closure = Closure::<dyn FnMut(MouseEvent)>::wrap(Box::new(move |_event: MouseEvent| {
        handler();
    }));
    let _ = el.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
    closure.forget();
}
