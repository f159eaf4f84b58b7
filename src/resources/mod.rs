//! Provider-agnostic resource snapshots.
//!
//! Every resource is a plain, serializable value captured at the time of the
//! last `get()`/`list()` call. Resources with a life cycle implement
//! [`StatefulResource`](crate::lifecycle::StatefulResource); the service that
//! produced them knows how to refresh them (see [`crate::services::Waiter`]).

pub mod compute;
pub mod network;
pub mod security;
pub mod storage;

pub use compute::*;
pub use network::*;
pub use security::*;
pub use storage::*;

use crate::error::{CloudError, CloudResult, ErrorKind};
use crate::pagination::Identified;
use serde::Serialize;

/// Common behavior of every resource type.
pub trait CloudResource: Identified + Serialize {
    /// Serialize the snapshot as a JSON object.
    ///
    /// # Errors
    ///
    /// Returns a `Provider` error if serialization fails.
    fn to_json(&self) -> CloudResult<String> {
        serde_json::to_string(self).map_err(|e| {
            CloudError::new(ErrorKind::Provider, "Could not serialize resource")
                .with_source(e.to_string())
        })
    }
}

/// Implement [`Identified`], [`CloudResource`] and, optionally,
/// [`StatefulResource`](crate::lifecycle::StatefulResource) for a resource
/// struct with `id`, `name` and `label` fields.
macro_rules! resource {
    ($ty:ty, $kind:ident, state: $state:ty) => {
        $crate::resources::resource!($ty, $kind);

        impl $crate::lifecycle::StatefulResource for $ty {
            type State = $state;

            fn state(&self) -> $state {
                self.state
            }

            fn set_state(&mut self, state: $state) {
                self.state = state;
            }
        }
    };
    ($ty:ty, labeled) => {
        impl $crate::pagination::Identified for $ty {
            fn id(&self) -> &str {
                &self.id
            }

            fn name(&self) -> &str {
                &self.name
            }

            fn label(&self) -> Option<&str> {
                self.label.as_deref()
            }
        }

        impl $crate::resources::CloudResource for $ty {}
    };
    ($ty:ty, named) => {
        impl $crate::pagination::Identified for $ty {
            fn id(&self) -> &str {
                &self.id
            }

            fn name(&self) -> &str {
                &self.name
            }
        }

        impl $crate::resources::CloudResource for $ty {}
    };
}

pub(crate) use resource;
