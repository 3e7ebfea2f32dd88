//! Client-side pagination state for paged list endpoints.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CoreError, CoreResult};

/// Pagination block returned alongside paged list data.
///
/// `previous`/`next` are opaque to the client (the server may send page
/// numbers or URLs); only their presence matters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub previous: Option<Value>,
    #[serde(default)]
    pub next: Option<Value>,
    #[serde(default)]
    pub current_page: Option<u32>,
    #[serde(default)]
    pub total_pages: Option<u32>,
}

fn is_link(link: &Option<Value>) -> bool {
    match link {
        None | Some(Value::Null) | Some(Value::Bool(false)) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

impl Pagination {
    pub fn has_previous(&self) -> bool {
        is_link(&self.previous)
    }

    pub fn has_next(&self) -> bool {
        is_link(&self.next)
    }
}

/// Current page of a paged view plus the last pagination block the server sent.
#[derive(Debug, Clone, PartialEq)]
pub struct PageState {
    current: u32,
    last: Option<Pagination>,
}

impl Default for PageState {
    fn default() -> Self {
        Self::new()
    }
}

impl PageState {
    /// Start on page 1 with nothing observed yet.
    pub fn new() -> Self {
        Self {
            current: 1,
            last: None,
        }
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn last(&self) -> Option<&Pagination> {
        self.last.as_ref()
    }

    /// Record the pagination block from the latest response.
    ///
    /// The server's `current_page` wins over the locally requested page.
    pub fn observe(&mut self, pagination: Option<Pagination>) {
        if let Some(page) = pagination.as_ref().and_then(|p| p.current_page) {
            self.current = page.max(1);
        }
        self.last = pagination;
    }

    pub fn total_pages(&self) -> Option<u32> {
        self.last.as_ref().and_then(|p| p.total_pages)
    }

    pub fn has_next(&self) -> bool {
        match &self.last {
            None => false,
            Some(p) if p.has_next() => true,
            Some(p) => p.total_pages.is_some_and(|total| self.current < total),
        }
    }

    pub fn has_previous(&self) -> bool {
        match &self.last {
            None => false,
            Some(p) if p.has_previous() => true,
            Some(p) => p.total_pages.is_some() && self.current > 1,
        }
    }

    /// Whether pager controls are worth showing at all.
    pub fn is_paged(&self) -> bool {
        match &self.last {
            None => false,
            Some(p) => p.has_next() || p.has_previous() || p.total_pages.is_some_and(|t| t > 1),
        }
    }

    /// Move forward one page if the server reported one. Returns whether the page changed.
    pub fn next(&mut self) -> bool {
        if self.has_next() {
            self.current += 1;
            true
        } else {
            false
        }
    }

    /// Move back one page if possible. Returns whether the page changed.
    pub fn previous(&mut self) -> bool {
        if self.has_previous() && self.current > 1 {
            self.current -= 1;
            true
        } else {
            false
        }
    }

    /// Jump to an explicit page, bounded by the last known `total_pages`.
    pub fn go_to(&mut self, page: u32) -> CoreResult<()> {
        let total = self.total_pages();
        let in_range = page >= 1 && total.is_none_or(|t| page <= t.max(1));
        if !in_range {
            return Err(CoreError::PageOutOfRange {
                requested: page,
                total: total.unwrap_or(0),
            });
        }
        self.current = page;
        Ok(())
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}
