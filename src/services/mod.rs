//! Provider-agnostic service traits.
//!
//! Every resource collection is exposed through a [`ResourceService`], which fixes
//! the lookup and paging contract shared by all providers:
//!
//! - `get(id)` returns `Ok(None)` for a missing resource instead of an error;
//! - `list(limit, marker)` returns one [`ResultList`] page;
//! - `find(query, limit, marker)` filters the full listing and pages it client-side,
//!   returning an empty page when nothing matches.
//!
//! Services whose resources have a life cycle also get the [`Waiter`] methods for
//! free, which poll through `get()`.

pub mod compute;
pub mod network;
pub mod security;
pub mod storage;

pub use compute::*;
pub use network::*;
pub use security::*;
pub use storage::*;

use crate::config::BridgeConfig;
use crate::error::CloudResult;
use crate::lifecycle::{self, LifecycleState, StatefulResource, Tracked, WaitOptions};
use crate::pagination::{Identified, ResultList, collect_all, resolve_limit};

/// Filters accepted by [`ResourceService::find`]. Unset fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindQuery {
    pub label: Option<String>,
    pub name: Option<String>,
}

impl FindQuery {
    pub fn by_label(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            name: None,
        }
    }

    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            label: None,
            name: Some(name.into()),
        }
    }

    #[must_use]
    pub fn matches<R: Identified + ?Sized>(&self, resource: &R) -> bool {
        self.label
            .as_deref()
            .is_none_or(|label| resource.label() == Some(label))
            && self.name.as_deref().is_none_or(|name| resource.name() == name)
    }
}

/// Lookup and paging over one kind of resource.
pub trait ResourceService<R: Identified>: Send + Sync {
    /// The provider configuration this service was built with.
    fn config(&self) -> &BridgeConfig;

    /// Fetch a resource by id; `Ok(None)` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns any provider failure other than "not found".
    fn get(&self, id: &str) -> CloudResult<Option<R>>;

    /// One page of resources. `limit` of `None` or `Some(0)` uses the configured default.
    ///
    /// # Errors
    ///
    /// Returns any provider failure.
    fn list(&self, limit: Option<usize>, marker: Option<&str>) -> CloudResult<ResultList<R>>;

    /// Resources matching `query`, paged client-side.
    ///
    /// # Errors
    ///
    /// Returns any provider failure raised while listing.
    fn find(
        &self,
        query: &FindQuery,
        limit: Option<usize>,
        marker: Option<&str>,
    ) -> CloudResult<ResultList<R>> {
        let matches: Vec<R> = collect_all(None, |limit, marker| self.list(limit, marker))?
            .into_iter()
            .filter(|resource| query.matches(resource))
            .collect();
        Ok(ResultList::client_paged(
            matches,
            resolve_limit(limit, self.config()),
            marker,
        ))
    }

    /// Every resource, following markers until the listing is exhausted.
    ///
    /// # Errors
    ///
    /// Returns the first provider failure.
    fn list_all(&self) -> CloudResult<Vec<R>> {
        collect_all(None, |limit, marker| self.list(limit, marker))
    }
}

/// Waiting helpers for services whose resources have a life cycle.
pub trait Waiter<R: StatefulResource>: ResourceService<R> {
    /// Poll `resource` through [`ResourceService::get`] until it reaches a `target` state.
    ///
    /// # Errors
    ///
    /// See [`lifecycle::wait_for`].
    fn wait_for(
        &self,
        resource: &mut R,
        target: &[R::State],
        terminal: &[R::State],
        options: WaitOptions,
    ) -> CloudResult<()> {
        let (timeout, interval) = options.resolve(self.config());
        let mut tracked = Tracked::new(resource, |id: &str| self.get(id));
        lifecycle::wait_for(&mut tracked, target, terminal, timeout, interval)
    }

    /// Wait until the resource is usable.
    ///
    /// # Errors
    ///
    /// See [`lifecycle::wait_for`].
    fn wait_till_ready(&self, resource: &mut R, options: WaitOptions) -> CloudResult<()> {
        self.wait_for(
            resource,
            <R::State as LifecycleState>::READY,
            <R::State as LifecycleState>::TERMINAL,
            options,
        )
    }

    /// Wait until the resource is deleted or no longer known to the provider.
    ///
    /// # Errors
    ///
    /// See [`lifecycle::wait_for`].
    fn wait_till_deleted(&self, resource: &mut R, options: WaitOptions) -> CloudResult<()> {
        let gone = <R::State as LifecycleState>::GONE;
        let terminal: Vec<R::State> = <R::State as LifecycleState>::TERMINAL
            .iter()
            .filter(|state| !gone.contains(state))
            .copied()
            .collect();
        self.wait_for(resource, gone, &terminal, options)
    }
}

impl<R, S> Waiter<R> for S
where
    R: StatefulResource,
    S: ResourceService<R> + ?Sized,
{
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named {
        id: &'static str,
        label: Option<&'static str>,
    }

    impl Identified for Named {
        fn id(&self) -> &str {
            self.id
        }

        fn label(&self) -> Option<&str> {
            self.label
        }
    }

    #[test]
    fn test_find_query_matching() {
        let web = Named {
            id: "a",
            label: Some("web"),
        };
        let bare = Named { id: "b", label: None };

        assert!(FindQuery::default().matches(&web));
        assert!(FindQuery::default().matches(&bare));
        assert!(FindQuery::by_label("web").matches(&web));
        assert!(!FindQuery::by_label("web").matches(&bare));
        assert!(FindQuery::by_name("b").matches(&bare));
        assert!(!FindQuery::by_name("b").matches(&web));
    }
}
