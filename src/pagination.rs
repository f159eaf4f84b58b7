//! Uniform result pages for every `list()`-style call.
//!
//! Vendor APIs disagree on pagination: some hand back a continuation cursor,
//! others return everything at once. [`ResultList`] normalizes both into one
//! contract, so callers always page with `list(limit, marker)`:
//!
//! - **Server-paged** ([`ResultList::server_paged`]): the vendor returned a cursor.
//!   `is_truncated` is true exactly when a cursor is present, and no total is known.
//! - **Client-paged** ([`ResultList::client_paged`]): the full candidate set is in
//!   memory and is windowed locally. The marker is the id of the last item of the
//!   previous page; the next page resumes strictly after it.
//!
//! ```
//! use cloudbridge::pagination::{Identified, ResultList};
//!
//! struct Item(String);
//! impl Identified for Item {
//!     fn id(&self) -> &str { &self.0 }
//! }
//!
//! let items: Vec<Item> = ["1", "2", "3", "4"].iter().map(|s| Item(s.to_string())).collect();
//! let page = ResultList::client_paged(items, 2, None);
//! assert_eq!(page.len(), 2);
//! assert_eq!(page.marker(), Some("2"));
//! assert!(page.is_truncated());
//! assert_eq!(page.total_results(), Some(4));
//! ```

use crate::config::BridgeConfig;
use crate::error::CloudResult;
use serde::Serialize;
use std::marker::PhantomData;
use std::ops::Deref;

/// Anything that can appear in a [`ResultList`].
pub trait Identified {
    /// Provider-assigned identifier; also the client-side paging marker.
    fn id(&self) -> &str;

    /// Provider-side name. Defaults to the id for resources without one.
    fn name(&self) -> &str {
        self.id()
    }

    /// User-facing label, for resources that carry one.
    fn label(&self) -> Option<&str> {
        None
    }
}

/// One page of results plus the metadata needed to fetch the next one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultList<T> {
    items: Vec<T>,
    marker: Option<String>,
    is_truncated: bool,
    supports_total: bool,
    total_results: Option<usize>,
    supports_server_paging: bool,
}

impl<T> ResultList<T> {
    /// Wrap a page the vendor already cut, along with its continuation cursor.
    #[must_use]
    pub const fn server_paged(items: Vec<T>, cursor: Option<String>) -> Self {
        Self {
            items,
            is_truncated: cursor.is_some(),
            marker: cursor,
            supports_total: false,
            total_results: None,
            supports_server_paging: true,
        }
    }

    /// Window a fully materialized collection.
    ///
    /// Items up to and including the one whose id equals `marker` are dropped;
    /// a marker that matches nothing yields an empty page. A `limit` of zero
    /// returns everything after the marker in one page; callers normally pass
    /// a limit already run through [`resolve_limit`].
    #[must_use]
    pub fn client_paged(objects: Vec<T>, limit: usize, marker: Option<&str>) -> Self
    where
        T: Identified,
    {
        let total = objects.len();
        let limit = if limit == 0 { total } else { limit };

        let mut remaining: Vec<T> = match marker {
            Some(marker) => objects
                .into_iter()
                .skip_while(|obj| obj.id() != marker)
                .skip(1)
                .collect(),
            None => objects,
        };

        let is_truncated = remaining.len() > limit;
        remaining.truncate(limit);
        let marker = if is_truncated {
            remaining.last().map(|obj| obj.id().to_string())
        } else {
            None
        };

        Self {
            items: remaining,
            marker,
            is_truncated,
            supports_total: true,
            total_results: Some(total),
            supports_server_paging: false,
        }
    }

    /// An empty, non-truncated page.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            items: Vec::new(),
            marker: None,
            is_truncated: false,
            supports_total: true,
            total_results: Some(0),
            supports_server_paging: false,
        }
    }

    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    #[must_use]
    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    /// Cursor for the next page; `None` when this is the last one.
    #[must_use]
    pub fn marker(&self) -> Option<&str> {
        self.marker.as_deref()
    }

    #[must_use]
    pub const fn is_truncated(&self) -> bool {
        self.is_truncated
    }

    #[must_use]
    pub const fn supports_total(&self) -> bool {
        self.supports_total
    }

    /// Size of the whole collection, when the paging mode knows it.
    #[must_use]
    pub const fn total_results(&self) -> Option<usize> {
        self.total_results
    }

    #[must_use]
    pub const fn supports_server_paging(&self) -> bool {
        self.supports_server_paging
    }

    /// Convert each item while keeping the paging metadata.
    #[must_use]
    pub fn map<U, F>(self, f: F) -> ResultList<U>
    where
        F: FnMut(T) -> U,
    {
        ResultList {
            items: self.items.into_iter().map(f).collect(),
            marker: self.marker,
            is_truncated: self.is_truncated,
            supports_total: self.supports_total,
            total_results: self.total_results,
            supports_server_paging: self.supports_server_paging,
        }
    }
}

impl<T> Deref for ResultList<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.items
    }
}

impl<T> IntoIterator for ResultList<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a ResultList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Resolve a caller-supplied page size. `None` and `Some(0)` both fall back to
/// the provider-wide `default_result_limit`.
#[must_use]
pub fn resolve_limit(limit: Option<usize>, config: &BridgeConfig) -> usize {
    limit
        .filter(|&l| l > 0)
        .unwrap_or(config.default_result_limit)
}

/// Iterator over successive pages of a `list(limit, marker)` call.
///
/// Stops after the first non-truncated page, after an error, or when a
/// truncated page fails to advance the marker.
pub struct PageWalker<T, F> {
    fetch: F,
    limit: Option<usize>,
    next: Option<String>,
    done: bool,
    _item: PhantomData<fn() -> T>,
}

impl<T, F> PageWalker<T, F>
where
    F: FnMut(Option<usize>, Option<&str>) -> CloudResult<ResultList<T>>,
{
    pub const fn new(limit: Option<usize>, fetch: F) -> Self {
        Self {
            fetch,
            limit,
            next: None,
            done: false,
            _item: PhantomData,
        }
    }
}

impl<T, F> Iterator for PageWalker<T, F>
where
    F: FnMut(Option<usize>, Option<&str>) -> CloudResult<ResultList<T>>,
{
    type Item = CloudResult<ResultList<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match (self.fetch)(self.limit, self.next.as_deref()) {
            Ok(page) => {
                match page.marker() {
                    Some(marker) if page.is_truncated() && self.next.as_deref() != Some(marker) => {
                        self.next = Some(marker.to_string());
                    }
                    _ => {
                        if page.is_truncated() {
                            tracing::warn!(
                                marker = ?page.marker(),
                                "truncated page did not advance the marker, stopping"
                            );
                        }
                        self.done = true;
                    }
                }
                Some(Ok(page))
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

/// Follow markers until the listing is exhausted and concatenate every page.
///
/// # Errors
///
/// Returns the first error raised by `fetch`.
pub fn collect_all<T, F>(limit: Option<usize>, fetch: F) -> CloudResult<Vec<T>>
where
    F: FnMut(Option<usize>, Option<&str>) -> CloudResult<ResultList<T>>,
{
    let mut all = Vec::new();
    for page in PageWalker::new(limit, fetch) {
        all.extend(page?);
    }
    Ok(all)
}
