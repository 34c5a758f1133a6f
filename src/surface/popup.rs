//! Browser popup surfaces.
//
//! A popup document is fully self-contained: the section's inner content
//! (no header chrome) remapped under the popup prefix, an inlined stylesheet
//! reproducing the dashboard's visual variables, and a bootstrap script that
//! talks back to the opener only through the typed `postMessage` envelope.

use indoc::indoc;

use crate::constants::{CONTENT_CLASS, DOCK_REQUEST_ATTR};
use crate::error::SurfaceError;
use crate::host::Host;
use crate::remap::SurfaceNamespace;
use crate::section::SectionId;

/// Static stylesheet mirroring the dashboard's card variables so the popup
/// needs no external assets.
const POPUP_STYLESHEET: &str = indoc! {r#"
    :root {
      --dash-bg: #f4f5f7;
      --dash-card-bg: #ffffff;
      --dash-border: #d7dae0;
      --dash-text: #1f2329;
      --dash-accent: #2f6fed;
    }
    body {
      margin: 0;
      padding: 16px;
      background: var(--dash-bg);
      color: var(--dash-text);
      font: 14px/1.5 system-ui, sans-serif;
    }
    .dash-content {
      background: var(--dash-card-bg);
      border: 1px solid var(--dash-border);
      border-radius: 6px;
      padding: 12px;
    }
    button, input, select, textarea {
      font: inherit;
      color: inherit;
    }
    button {
      border: 1px solid var(--dash-border);
      border-radius: 4px;
      background: var(--dash-card-bg);
      cursor: pointer;
    }
    button:hover {
      border-color: var(--dash-accent);
    }
"#};

/// Bootstrap script template. The only opener traffic is the serialized
/// `{type, payload}` envelope; `__SECTION__` is substituted with the
/// JSON-encoded section id.
const POPUP_BOOTSTRAP: &str = indoc! {r#"
    (function () {
      'use strict';
      var SECTION = __SECTION__;
      function post(type, payload) {
        if (!window.opener || window.opener.closed) { return; }
        window.opener.postMessage(JSON.stringify({ type: type, payload: payload }), '*');
      }
      window.dashNotify = function (text) {
        post('notify', { text: String(text) });
      };
      document.addEventListener('click', function (event) {
        var target = event.target && event.target.closest('[data-dock-request]');
        if (!target) { return; }
        post('dock-section', { section: SECTION });
        window.close();
      });
    })();
"#};

/// Assemble the complete popup document for `section`. Fails with
/// `MissingElement` when the section root or its content container is
/// absent; callers log it and skip the operation.
pub fn build_document<H: Host>(
    host: &H,
    section: &SectionId,
    title: &str,
) -> Result<String, SurfaceError> {
    let original = host
        .element_by_id(section.as_str())
        .ok_or_else(|| SurfaceError::MissingElement(format!("#{section}")))?;
    let content = host
        .query_all(&original, &format!(".{CONTENT_CLASS}"))
        .into_iter()
        .next()
        .ok_or_else(|| SurfaceError::MissingElement(format!("#{section} .{CONTENT_CLASS}")))?;
    let clone = host
        .clone_subtree(&content)
        .ok_or_else(|| SurfaceError::MissingElement(format!("clone of #{section}")))?;
    SurfaceNamespace::popup(section).apply(host, &clone);
    Ok(render_document(section, title, &host.outer_html(&clone)))
}

fn render_document(section: &SectionId, title: &str, body: &str) -> String {
    let script = POPUP_BOOTSTRAP.replace(
        "__SECTION__",
        &serde_json::to_string(section.as_str()).unwrap_or_default(),
    );
    format!(
        "<!doctype html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n\
         <style>\n{}</style>\n</head>\n<body>\n{}\n\
         <button {}=\"true\">Return to dashboard</button>\n\
         <script>\n{}</script>\n</body>\n</html>\n",
        escape_text(title),
        POPUP_STYLESHEET,
        body,
        DOCK_REQUEST_ATTR,
        script,
    )
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
