//! Concrete providers.
//!
//! Only the in-memory [`mock`] provider ships with the crate. Vendor-backed
//! providers implement [`CloudProvider`](crate::provider::CloudProvider) on top
//! of their vendor SDK and register with a
//! [`ProviderFactory`](crate::provider::ProviderFactory).

#[cfg(feature = "mock")]
pub mod mock;
