use crate::api::model::CategoryNode;
use crate::config;

/// Decides which menu links are real catalog sections.
#[derive(Debug, Clone, Default)]
pub struct SectionFilter {
    blocked_section: Option<String>,
}

impl SectionFilter {
    pub fn new(blocked_section: Option<String>) -> Self {
        SectionFilter {
            blocked_section: blocked_section.filter(|s| !s.is_empty()),
        }
    }

    pub fn is_excluded(&self, url: &str) -> bool {
        url.contains(config::GIFT_MARKER)
            || self
                .blocked_section
                .as_deref()
                .is_some_and(|blocked| url.contains(blocked))
    }
}

/// Menu trees link to browse pages; the listing API lives under `section`.
pub fn to_section_path(url: &str) -> String {
    url.replacen(config::BROWSE_SEGMENT, config::API_SEGMENT, 1)
}

/// Pre-order walk: a node's own link comes before its children's, children in array order.
pub fn flatten(root: &CategoryNode, filter: &SectionFilter) -> Vec<String> {
    let mut out = Vec::new();
    collect(root, filter, &mut out);
    out
}

fn collect(node: &CategoryNode, filter: &SectionFilter, out: &mut Vec<String>) {
    if let Some(url) = node.url.as_deref().filter(|u| !u.is_empty()) {
        let section = to_section_path(url);
        if !filter.is_excluded(&section) {
            out.push(section);
        }
    }
    for child in &node.children {
        collect(child, filter, out);
    }
}
