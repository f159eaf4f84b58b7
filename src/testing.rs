//! Testing utilities for code built on CloudBridge.
//!
//! This module gives downstream crates the same helpers CloudBridge's own tests use:
//!
//! - **Assertions**: check resource ids, error kinds and page walks with readable failures
//! - **Fixtures**: fast configurations, temporary config files, scripted pollables and,
//!   with the `mock` feature, ready-made mock providers
//!
//! # Quick Start
//!
//! ```
//! # #[cfg(feature = "mock")]
//! # fn main() -> anyhow::Result<()> {
//! use cloudbridge::prelude::*;
//! use cloudbridge::testing::*;
//!
//! let cloud = mock_provider();
//! let mut vm = launch_instance(&cloud, "web")?;
//! let instances = cloud.compute().instances();
//! instances.wait_till_ready(&mut vm, WaitOptions::default())?;
//!
//! assert_ids(&instances.list_all()?, &[vm.id.as_str()]);
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "mock"))]
//! # fn main() {}
//! ```
//!
//! Configurations from [`fast_config`] poll every few milliseconds, so waits on the
//! mock provider finish almost immediately while still exercising the polling loop.

pub mod assertions;
pub mod fixtures;

pub use assertions::*;
pub use fixtures::*;
