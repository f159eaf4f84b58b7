//! Assertion functions for provider results.

use crate::error::{CloudResult, ErrorKind};
use crate::pagination::{Identified, PageWalker, ResultList};
use std::fmt::Debug;

/// Assert that `items` carry exactly the ids in `expected`, in order.
///
/// # Panics
///
/// Panics if the ids differ in length, content or order.
///
/// # Example
///
/// ```
/// use cloudbridge::pagination::Identified;
/// use cloudbridge::testing::assert_ids;
///
/// struct Item(&'static str);
/// impl Identified for Item {
///     fn id(&self) -> &str { self.0 }
/// }
///
/// assert_ids(&[Item("a"), Item("b")], &["a", "b"]);
/// ```
pub fn assert_ids<T: Identified>(items: &[T], expected: &[&str]) {
    let actual: Vec<&str> = items.iter().map(Identified::id).collect();
    assert_eq!(
        actual.len(),
        expected.len(),
        "Id count mismatch:\n  Expected: {expected:?}\n  Actual: {actual:?}"
    );
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        assert_eq!(
            a, e,
            "Id mismatch at index {i}:\n  Expected: {e:?}\n  Actual: {a:?}\n  Full expected: {expected:?}\n  Full actual: {actual:?}"
        );
    }
}

/// Assert that `result` failed with `kind`, returning the error for further checks.
///
/// # Panics
///
/// Panics if `result` is `Ok` or fails with a different kind.
///
/// # Example
///
/// ```
/// use cloudbridge::error::{CloudError, CloudResult, ErrorKind};
/// use cloudbridge::testing::assert_error_kind;
///
/// let result: CloudResult<()> = Err(CloudError::not_found("Volume", "vol-1"));
/// let err = assert_error_kind(result, ErrorKind::NotFound);
/// assert!(err.message.contains("vol-1"));
/// ```
pub fn assert_error_kind<T: Debug>(
    result: CloudResult<T>,
    kind: ErrorKind,
) -> crate::error::CloudError {
    match result {
        Ok(value) => panic!("Expected a {kind:?} error, got Ok({value:?})"),
        Err(err) => {
            assert_eq!(
                err.kind, kind,
                "Error kind mismatch:\n  Expected: {kind:?}\n  Actual: {err}"
            );
            err
        }
    }
}

/// Walk every page of `fetch` with page size `limit` and assert the pages
/// reconstruct `expected` exactly once each, in order.
///
/// Also checks the page-level contract: no page exceeds `limit`, every page but
/// the last is truncated with a marker, and the last page is not truncated.
///
/// # Panics
///
/// Panics if `fetch` fails or any of the checks above does not hold.
///
/// # Example
///
/// ```
/// use cloudbridge::pagination::{Identified, ResultList};
/// use cloudbridge::testing::assert_pages_reconstruct;
///
/// #[derive(Clone)]
/// struct Item(String);
/// impl Identified for Item {
///     fn id(&self) -> &str { &self.0 }
/// }
///
/// let items: Vec<Item> = (1..=5).map(|i| Item(i.to_string())).collect();
/// assert_pages_reconstruct(2, &["1", "2", "3", "4", "5"], |limit, marker| {
///     Ok(ResultList::client_paged(items.clone(), limit.unwrap_or(2), marker))
/// });
/// ```
pub fn assert_pages_reconstruct<T, F>(limit: usize, expected: &[&str], fetch: F)
where
    T: Identified,
    F: FnMut(Option<usize>, Option<&str>) -> CloudResult<ResultList<T>>,
{
    let mut seen: Vec<String> = Vec::new();
    let mut pages: Vec<(usize, bool, bool)> = Vec::new();

    for (index, page) in PageWalker::new(Some(limit), fetch).enumerate() {
        let page = page.unwrap_or_else(|err| panic!("Fetching page {index} failed: {err}"));
        assert!(
            page.len() <= limit,
            "Page {index} holds {} items, more than the limit of {limit}",
            page.len()
        );
        pages.push((page.len(), page.is_truncated(), page.marker().is_some()));
        seen.extend(page.iter().map(|item| item.id().to_string()));
    }

    let (last, rest) = pages
        .split_last()
        .unwrap_or_else(|| panic!("No pages were fetched"));
    assert!(!last.1, "Last page is still truncated: {pages:?}");
    for (index, (_, truncated, has_marker)) in rest.iter().enumerate() {
        assert!(
            *truncated && *has_marker,
            "Page {index} is not the last page but is not truncated with a marker: {pages:?}"
        );
    }

    let seen: Vec<&str> = seen.iter().map(String::as_str).collect();
    assert_eq!(
        seen, expected,
        "Pages did not reconstruct the collection:\n  Expected: {expected:?}\n  Actual: {seen:?}"
    );
}
