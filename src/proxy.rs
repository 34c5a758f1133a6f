//! Popup content proxy.
//
//! The popup slot is claimed synchronously inside the user gesture; content
//! arrives afterwards. The happy path persists the generated document on the
//! content service and navigates the live popup to the returned URL so the
//! close watcher keeps a working reference. When the service is down the
//! document is written straight into the popup instead, and the `data:` URI
//! builder backs the external-tab fallback.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::host::Host;
use crate::registry::RecordCell;

/// `POST {endpoint}` request body.
#[derive(Debug, Serialize)]
pub struct PopupContentRequest<'a> {
    pub html: &'a str,
}

/// `POST {endpoint}` response: where the popup should navigate, and the key
/// for the `DELETE` that releases the record on dock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopupContentRecord {
    pub id: String,
    pub url: String,
}

/// Deliver `html` to an already-open popup. On success the record id lands
/// in `record` for the dock path to release later; on failure the popup gets
/// the document written directly and no record exists.
pub async fn deliver_popup_content<H: Host>(
    host: &H,
    popup: &H::Popup,
    endpoint: &str,
    html: &str,
    record: RecordCell,
) {
    match host.persist_popup_html(endpoint, html).await {
        Ok(persisted) => {
            debug!(record = %persisted.id, "popup content persisted, navigating");
            *record.borrow_mut() = Some(persisted.id);
            host.navigate_popup(popup, &persisted.url);
        }
        Err(err) => {
            warn!(%err, "popup content service failed, writing document directly");
            host.write_popup_document(popup, html);
        }
    }
}

/// Best-effort release of a persisted record. Failures are logged and
/// swallowed; the server reaps orphans on its own schedule.
pub async fn release_record<H: Host>(host: &H, endpoint: &str, record_id: &str) {
    if let Err(err) = host.delete_popup_record(endpoint, record_id).await {
        debug!(record = record_id, %err, "popup record delete failed, ignoring");
    }
}

/// Embed a document as a `data:` URI for the anchor-click fallback.
pub fn data_uri_for_html(html: &str) -> String {
    let mut uri = String::with_capacity(html.len() + 32);
    uri.push_str("data:text/html;charset=utf-8,");
    for byte in html.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                uri.push(byte as char)
            }
            _ => {
                uri.push('%');
                uri.push_str(&format!("{byte:02X}"));
            }
        }
    }
    uri
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use futures::executor::block_on;

    use super::*;
    use crate::host::MemoryHost;

    #[test]
    fn delivery_navigates_and_records_on_success() {
        let host = MemoryHost::new();
        let popup = host.open_popup("", "popup-notes", "").unwrap();
        let record: RecordCell = Rc::new(RefCell::new(None));
        block_on(deliver_popup_content(
            &host,
            &popup,
            "/popup",
            "<div>notes</div>",
            record.clone(),
        ));
        assert_eq!(record.borrow().as_deref(), Some("rec-0"));
        assert_eq!(host.popup_url(&popup), "/popup/rec-0");
        assert!(host.popup_written(&popup).is_none());
    }

    #[test]
    fn delivery_writes_directly_when_the_service_fails() {
        let host = MemoryHost::new();
        host.set_proxy_failing(true);
        let popup = host.open_popup("", "popup-notes", "").unwrap();
        let record: RecordCell = Rc::new(RefCell::new(None));
        block_on(deliver_popup_content(
            &host,
            &popup,
            "/popup",
            "<div>notes</div>",
            record.clone(),
        ));
        assert!(record.borrow().is_none());
        assert_eq!(host.popup_written(&popup).as_deref(), Some("<div>notes</div>"));
    }

    #[test]
    fn release_swallows_delete_failures() {
        let host = MemoryHost::new();
        host.set_proxy_failing(true);
        block_on(release_record(&host, "/popup", "rec-3"));
        assert_eq!(host.deleted_records(), vec!["rec-3".to_string()]);
    }

    #[test]
    fn data_uris_escape_markup() {
        let uri = data_uri_for_html("<p id=\"x\">a b</p>");
        assert!(uri.starts_with("data:text/html;charset=utf-8,"));
        assert!(!uri.contains('<'));
        assert!(!uri.contains(' '));
        assert!(uri.contains("%3Cp%20id%3D%22x%22%3E"));
    }
}
