//! Provider trait and factory.
//!
//! A [`CloudProvider`] bundles the compute, networking, security and storage
//! services of one cloud, all sharing a single [`BridgeConfig`]. Providers are
//! obtained by id from a [`ProviderFactory`]:
//!
//! ```
//! # #[cfg(feature = "mock")]
//! # fn main() -> cloudbridge::error::CloudResult<()> {
//! use cloudbridge::config::BridgeConfig;
//! use cloudbridge::provider::{ProviderFactory, ProviderId};
//!
//! let factory = ProviderFactory::new();
//! let provider = factory.create_provider(ProviderId::Mock, BridgeConfig::default())?;
//! assert!(provider.authenticate()?);
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "mock"))]
//! # fn main() {}
//! ```

use crate::config::BridgeConfig;
use crate::error::{CloudError, CloudResult, ErrorKind};
use crate::services::{ComputeService, NetworkingService, SecurityService, StorageService};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProviderId {
    Aws,
    Azure,
    Gcp,
    OpenStack,
    Mock,
}

impl ProviderId {
    pub const ALL: [Self; 5] = [Self::Aws, Self::Azure, Self::Gcp, Self::OpenStack, Self::Mock];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Aws => "aws",
            Self::Azure => "azure",
            Self::Gcp => "gcp",
            Self::OpenStack => "openstack",
            Self::Mock => "mock",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = CloudError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|id| id.as_str() == lowered)
            .ok_or_else(|| {
                CloudError::new(ErrorKind::UnknownProvider, format!("Unknown provider {s:?}"))
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceKind {
    Compute,
    Networking,
    Security,
    Storage,
}

pub trait CloudProvider: Send + Sync {
    fn id(&self) -> ProviderId;

    fn config(&self) -> &BridgeConfig;

    fn compute(&self) -> &dyn ComputeService;

    fn networking(&self) -> &dyn NetworkingService;

    fn security(&self) -> &dyn SecurityService;

    fn storage(&self) -> &dyn StorageService;

    /// Check that the configured credentials are accepted.
    ///
    /// # Errors
    ///
    /// Returns any provider failure other than a credential rejection, which
    /// is reported as `Ok(false)`.
    fn authenticate(&self) -> CloudResult<bool>;

    /// Whether the provider offers `kind`. Every bundled provider offers all four.
    fn has_service(&self, _kind: ServiceKind) -> bool {
        true
    }
}

impl std::fmt::Debug for dyn CloudProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudProvider").field("id", &self.id()).finish_non_exhaustive()
    }
}

/// Builds a provider from its configuration.
pub type ProviderConstructor = fn(BridgeConfig) -> CloudResult<Arc<dyn CloudProvider>>;

/// Registry of provider constructors keyed by [`ProviderId`].
#[derive(Clone)]
pub struct ProviderFactory {
    constructors: BTreeMap<ProviderId, ProviderConstructor>,
}

impl Default for ProviderFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderFactory {
    /// A factory with every provider compiled into this build registered.
    #[must_use]
    pub fn new() -> Self {
        #[allow(unused_mut)]
        let mut factory = Self::empty();
        #[cfg(feature = "mock")]
        factory.register(ProviderId::Mock, crate::providers::mock::MockProvider::construct);
        factory
    }

    #[must_use]
    pub const fn empty() -> Self {
        Self {
            constructors: BTreeMap::new(),
        }
    }

    /// Register (or replace) the constructor for `id`.
    pub fn register(&mut self, id: ProviderId, constructor: ProviderConstructor) -> &mut Self {
        tracing::debug!(provider = %id, "registering provider");
        self.constructors.insert(id, constructor);
        self
    }

    #[must_use]
    pub fn list_providers(&self) -> Vec<ProviderId> {
        self.constructors.keys().copied().collect()
    }

    /// Validate `config` and build the provider registered under `id`.
    ///
    /// # Errors
    ///
    /// `UnknownProvider` if nothing is registered under `id`,
    /// `InvalidConfiguration` if `config` fails validation, or whatever the
    /// constructor returns.
    pub fn create_provider(
        &self,
        id: ProviderId,
        config: BridgeConfig,
    ) -> CloudResult<Arc<dyn CloudProvider>> {
        let constructor = self.constructors.get(&id).ok_or_else(|| {
            CloudError::new(
                ErrorKind::UnknownProvider,
                format!("No provider registered for {id}"),
            )
        })?;
        config.validate()?;
        tracing::debug!(provider = %id, "creating provider");
        constructor(config)
    }
}
