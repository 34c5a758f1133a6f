//! External-tab fallback.
//
//! When a popup cannot be opened, the same document is shown in a new tab.
//! Tabs carry no back-reference, so the only state retained is the content
//! record for release on dock. Two rungs: persist the document and open the
//! returned URL, or embed it in a `data:` URI when the service is down.

use tracing::warn;

use crate::host::Host;
use crate::proxy;

pub enum ExternalTabOutcome {
    /// A tab is showing the content; `record` is the persisted document's
    /// id when the content service accepted it.
    Opened { record: Option<String> },
    /// Neither rung could open a tab; callers degrade to a floating surface.
    Blocked,
}

pub async fn open_for_html<H: Host>(host: &H, endpoint: &str, html: &str) -> ExternalTabOutcome {
    match host.persist_popup_html(endpoint, html).await {
        Ok(persisted) => {
            if host.open_tab(&persisted.url) {
                return ExternalTabOutcome::Opened {
                    record: Some(persisted.id),
                };
            }
            warn!("tab open refused, releasing orphaned popup record");
            proxy::release_record(host, endpoint, &persisted.id).await;
            ExternalTabOutcome::Blocked
        }
        Err(err) => {
            warn!(%err, "popup content service failed, embedding document as data URI");
            if host.open_tab(&proxy::data_uri_for_html(html)) {
                ExternalTabOutcome::Opened { record: None }
            } else {
                ExternalTabOutcome::Blocked
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::*;
    use crate::host::MemoryHost;

    #[test]
    fn persisted_documents_open_by_url() {
        let host = MemoryHost::new();
        let outcome = block_on(open_for_html(&host, "/popup", "<div>x</div>"));
        assert!(matches!(
            outcome,
            ExternalTabOutcome::Opened { record: Some(ref id) } if id == "rec-0"
        ));
        assert_eq!(host.opened_tabs(), vec!["/popup/rec-0".to_string()]);
    }

    #[test]
    fn service_failure_falls_back_to_a_data_uri() {
        let host = MemoryHost::new();
        host.set_proxy_failing(true);
        let outcome = block_on(open_for_html(&host, "/popup", "<div>x</div>"));
        assert!(matches!(outcome, ExternalTabOutcome::Opened { record: None }));
        assert!(host.opened_tabs()[0].starts_with("data:text/html"));
    }

    #[test]
    fn blocked_tabs_release_the_orphaned_record() {
        let host = MemoryHost::new();
        host.set_tabs_blocked(true);
        let outcome = block_on(open_for_html(&host, "/popup", "<div>x</div>"));
        assert!(matches!(outcome, ExternalTabOutcome::Blocked));
        assert_eq!(host.deleted_records(), vec!["rec-0".to_string()]);
    }
}
