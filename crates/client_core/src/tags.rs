pub const DEFAULT_TAG_PREVIEW_LIMIT: usize = 8;
pub const SHOW_MORE_LABEL: &str = "Show more";
pub const SHOW_LESS_LABEL: &str = "Show less";

/// Bounded disclosure of an item's tags: the first `limit` tags until expanded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagExpansion {
    tags: Vec<String>,
    limit: usize,
    expanded: bool,
}

impl TagExpansion {
    pub fn new(tags: Vec<String>, limit: usize) -> Self {
        Self {
            tags,
            limit,
            expanded: false,
        }
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    pub fn is_truncatable(&self) -> bool {
        self.tags.len() > self.limit
    }

    pub fn visible(&self) -> &[String] {
        if self.expanded || !self.is_truncatable() {
            &self.tags
        } else {
            &self.tags[..self.limit]
        }
    }

    /// Label of the expand/collapse control, absent when every tag already fits.
    pub fn affordance(&self) -> Option<&'static str> {
        if !self.is_truncatable() {
            return None;
        }
        Some(if self.expanded {
            SHOW_LESS_LABEL
        } else {
            SHOW_MORE_LABEL
        })
    }

    pub fn toggle(&mut self) {
        if self.is_truncatable() {
            self.expanded = !self.expanded;
        }
    }
}
