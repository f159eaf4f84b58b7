//! # CloudBridge
//!
//! A **provider-agnostic layer** over cloud compute, networking, security and object
//! storage. Every provider exposes the same service traits, the same resource types
//! and the same paging and waiting contracts, so code written against one cloud runs
//! unchanged against another.
//!
//! ## Key Features
//!
//! - **Uniform services** - instances, volumes, snapshots, images, networks, subnets,
//!   floating IPs, gateways, key pairs, firewalls and buckets behind one set of traits
//! - **Normalized states** - vendor status strings map onto one state enum per resource kind
//! - **Waiting** - block until a resource is ready, deleted, or in any chosen state
//! - **Uniform paging** - every `list()` returns a [`ResultList`], whether the vendor pages
//!   server-side with cursors or returns everything at once
//! - **Layered configuration** - defaults, JSON file and `CB_*` environment variables
//! - **In-memory provider** - a stateful mock cloud for tests (feature: `mock`)
//!
//! ## Quick Start
//!
//! ```
//! # #[cfg(feature = "mock")]
//! # fn main() -> cloudbridge::CloudResult<()> {
//! use cloudbridge::prelude::*;
//! use std::time::Duration;
//!
//! let provider = ProviderFactory::new().create_provider(ProviderId::Mock, BridgeConfig::default())?;
//!
//! // Launch an instance from the first available image
//! let image = provider.compute().images().list(None, None)?.into_items().remove(0);
//! let instances = provider.compute().instances();
//! let mut vm = instances.create(&InstanceSpec::new("web", &image.id, "m1.small"))?;
//!
//! // Block until it is running
//! let options = WaitOptions::new(Duration::from_secs(5), Duration::from_millis(10));
//! instances.wait_till_ready(&mut vm, options)?;
//! assert_eq!(vm.state, InstanceState::Running);
//!
//! // Tear it down and wait for it to disappear
//! instances.delete(&vm.id)?;
//! instances.wait_till_deleted(&mut vm, options)?;
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "mock"))]
//! # fn main() {}
//! ```
//!
//! ## Core Concepts
//!
//! ### Providers
//!
//! A [`CloudProvider`] bundles four service groups (compute, networking, security and
//! storage) that share one [`BridgeConfig`]. Providers are built by id through a
//! [`ProviderFactory`], which validates the configuration first.
//!
//! ### Waiting
//!
//! Resources with a life cycle implement [`lifecycle::StatefulResource`]. The
//! [`Waiter`] methods poll them through their service until the state lands in a
//! target set (success), a terminal set ([`ErrorKind::WaitStateTerminal`]) or the
//! timeout passes ([`ErrorKind::WaitStateTimeout`]). A resource the provider no longer
//! knows reports its `Unknown` state, which is how `wait_till_deleted` succeeds.
//!
//! ### Paging
//!
//! `list(limit, marker)` returns one page. Pass the page's [`ResultList::marker`] back
//! to get the next one, or use [`pagination::collect_all`] / `list_all()` to walk them
//! all. A `limit` of `None` or `0` uses [`BridgeConfig::default_result_limit`].
//!
//! ## Feature Flags
//!
//! - `mock` (default) - the in-memory provider in [`providers::mock`] and the provider
//!   fixtures in [`testing`]
//! - `logging` (default) - [`logging::init`], a `tracing-subscriber` setup driven by
//!   `RUST_LOG` and [`BridgeConfig::debug_mode`]
//!
//! ## Module Overview
//!
//! - [`config`] - provider-wide defaults and how they are loaded
//! - [`error`] - the crate's error type and error kinds
//! - [`lifecycle`] - state traits and the polling loop
//! - [`pagination`] - [`ResultList`] and page walking
//! - [`naming`] - label and name validation, name generation
//! - [`retry`] - local retry for eventually-consistent calls
//! - [`status`] - vendor status translation tables
//! - [`resources`] - resource snapshot types
//! - [`services`] - service traits
//! - [`provider`] - the provider trait and factory
//! - [`providers`] - concrete providers
//! - [`testing`] - fixtures and assertions for tests

pub mod config;
pub mod error;
pub mod lifecycle;
#[cfg(feature = "logging")]
pub mod logging;
pub mod naming;
pub mod pagination;
pub mod provider;
pub mod providers;
pub mod resources;
pub mod retry;
pub mod services;
pub mod status;
pub mod testing;

// General re-exports
pub use config::BridgeConfig;
pub use error::{CloudError, CloudResult, ErrorKind};
pub use lifecycle::{LifecycleState, WaitOptions};
pub use pagination::{Identified, ResultList};
pub use provider::{CloudProvider, ProviderFactory, ProviderId};
pub use services::{FindQuery, ResourceService, Waiter};

/// Everything needed to drive a provider: the traits whose methods you call and
/// the types you pass to them.
pub mod prelude {
    pub use crate::config::BridgeConfig;
    pub use crate::error::{CloudError, CloudResult, ErrorKind};
    pub use crate::lifecycle::{LifecycleState, StatefulResource, WaitOptions};
    pub use crate::pagination::{Identified, ResultList};
    pub use crate::provider::{CloudProvider, ProviderFactory, ProviderId};
    pub use crate::resources::*;
    pub use crate::services::*;
}
