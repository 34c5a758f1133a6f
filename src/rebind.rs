//! Listener rebinding for surface clones.
//
//! Features that wire their listeners by id lookup at first load register an
//! async loader here (the dynamic-import analog); the resolved attach
//! function is memoized so later surfaces attach synchronously. Attachment
//! is idempotent per root via a marker attribute, so wiring the same clone
//! twice never double-binds handlers. A failed loader is logged and left
//! unresolved so the next surface retries it; the clone stays usable minus
//! that feature's interactivity.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use futures::future::LocalBoxFuture;
use tracing::{debug, warn};

use crate::constants::REBOUND_MARKER_PREFIX;
use crate::error::SurfaceError;
use crate::host::Host;

/// Attach a feature's listeners scoped to a clone root. Features must query
/// relative to the root they are handed, never by global id.
pub type AttachFn<E> = Rc<dyn Fn(&E)>;

type Loader<E> = Box<dyn Fn() -> LocalBoxFuture<'static, Result<AttachFn<E>, String>>>;

struct Feature<E> {
    loader: Loader<E>,
    attach: Option<AttachFn<E>>,
}

pub struct ListenerRebinder<H: Host> {
    features: RefCell<BTreeMap<String, Feature<H::Element>>>,
}

impl<H: Host> Default for ListenerRebinder<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Host> ListenerRebinder<H> {
    pub fn new() -> Self {
        Self {
            features: RefCell::new(BTreeMap::new()),
        }
    }

    pub fn register<F>(&self, name: impl Into<String>, loader: F)
    where
        F: Fn() -> LocalBoxFuture<'static, Result<AttachFn<H::Element>, String>> + 'static,
    {
        self.features.borrow_mut().insert(
            name.into(),
            Feature {
                loader: Box::new(loader),
                attach: None,
            },
        );
    }

    pub fn feature_names(&self) -> Vec<String> {
        self.features.borrow().keys().cloned().collect()
    }

    /// Attach every registered feature onto `root`. Surface creation awaits
    /// this so callers who await get a fully interactive clone.
    pub async fn attach_all(&self, host: &H, root: &H::Element) {
        for name in self.feature_names() {
            let marker = format!("{REBOUND_MARKER_PREFIX}{name}");
            if host.attr(root, &marker).is_some() {
                continue;
            }
            let Some(attach) = self.resolve(&name).await else {
                continue;
            };
            host.set_attr(root, &marker, "true");
            attach(root);
            debug!(feature = %name, "listeners attached to clone root");
        }
    }

    /// Memoized loader resolution. The borrow is dropped before the await;
    /// the loader future owns everything it needs.
    async fn resolve(&self, name: &str) -> Option<AttachFn<H::Element>> {
        let pending = {
            let features = self.features.borrow();
            let feature = features.get(name)?;
            match &feature.attach {
                Some(attach) => return Some(attach.clone()),
                None => (feature.loader)(),
            }
        };
        match pending.await {
            Ok(attach) => {
                if let Some(feature) = self.features.borrow_mut().get_mut(name) {
                    feature.attach = Some(attach.clone());
                }
                Some(attach)
            }
            Err(reason) => {
                let err = SurfaceError::ListenerAttach {
                    feature: name.to_string(),
                    reason,
                };
                warn!(%err, "surface stays inert for this feature");
                None
            }
        }
    }
}
