//! Dashboard sections.
//
//! Sections are created by the page from static markup and never destroyed;
//! the manager only discovers them, hides them while a surface is active,
//! and restores them on dock.

use std::fmt;

use crate::constants::{SECTION_CLASS, TITLE_CLASS};
use crate::host::Host;

/// Identifier of a section, equal to the DOM id of its root element.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SectionId(String);

impl SectionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SectionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct Section {
    pub id: SectionId,
    pub title: String,
}

/// Scan the document for section roots. Roots without an id are skipped;
/// a missing title element yields an empty title, not an error.
pub fn discover<H: Host>(host: &H) -> Vec<Section> {
    host.document_query_all(&format!(".{SECTION_CLASS}"))
        .into_iter()
        .filter_map(|el| {
            let id = host.attr(&el, "id")?;
            let title = host
                .query_all(&el, &format!(".{TITLE_CLASS}"))
                .into_iter()
                .next()
                .map(|title_el| host.text(&title_el))
                .unwrap_or_default();
            Some(Section {
                id: SectionId::new(id),
                title,
            })
        })
        .collect()
}
