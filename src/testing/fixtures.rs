//! Ready-made configurations, providers and pollables for tests.

use crate::config::BridgeConfig;
use crate::error::CloudResult;
use crate::lifecycle::{LifecycleState, Pollable};
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

/// Poll interval used by [`fast_config`].
pub const FAST_WAIT_INTERVAL: Duration = Duration::from_millis(10);
/// Wait timeout used by [`fast_config`]; generous enough for slow CI machines.
pub const FAST_WAIT_TIMEOUT: Duration = Duration::from_secs(5);

/// A configuration whose waits poll every [`FAST_WAIT_INTERVAL`].
///
/// # Example
///
/// ```
/// use cloudbridge::testing::{FAST_WAIT_INTERVAL, fast_config};
///
/// let config = fast_config();
/// assert_eq!(config.default_wait_interval, FAST_WAIT_INTERVAL);
/// assert!(config.validate().is_ok());
/// ```
#[must_use]
pub fn fast_config() -> BridgeConfig {
    BridgeConfig::default()
        .with_wait_timeout(FAST_WAIT_TIMEOUT)
        .with_wait_interval(FAST_WAIT_INTERVAL)
}

/// Write `config` as JSON into a temporary file that lives as long as the handle.
///
/// The file format stores durations in whole seconds, so sub-second wait
/// settings do not survive the round trip.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be created or written.
///
/// # Example
///
/// ```
/// use cloudbridge::config::BridgeConfig;
/// use cloudbridge::testing::{fast_config, temp_config_file};
///
/// let file = temp_config_file(&fast_config().with_result_limit(7)).unwrap();
/// let loaded = BridgeConfig::from_file(file.path()).unwrap();
/// assert_eq!(loaded.default_result_limit, 7);
/// ```
pub fn temp_config_file(config: &BridgeConfig) -> std::io::Result<NamedTempFile> {
    let json = config.to_json().map_err(std::io::Error::other)?;
    let mut file = tempfile::Builder::new()
        .prefix("cloudbridge-")
        .suffix(".json")
        .tempfile()?;
    file.write_all(json.as_bytes())?;
    file.flush()?;
    Ok(file)
}

/// A [`Pollable`] that replays a fixed script of states, one per refresh.
///
/// Once the script runs out the last state sticks. Useful for testing wait
/// logic without a provider.
///
/// # Example
///
/// ```
/// use cloudbridge::lifecycle::{wait_for, LifecycleState};
/// use cloudbridge::resources::VolumeState;
/// use cloudbridge::testing::ScriptedPollable;
/// use std::time::Duration;
///
/// let mut volume = ScriptedPollable::new(
///     VolumeState::Creating,
///     [VolumeState::Creating, VolumeState::Available],
/// );
/// let ms = Duration::from_millis(1);
/// wait_for(&mut volume, VolumeState::READY, VolumeState::TERMINAL, ms * 500, ms).unwrap();
/// assert_eq!(volume.refreshes(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct ScriptedPollable<S> {
    current: S,
    script: std::collections::VecDeque<S>,
    refreshes: usize,
}

impl<S: LifecycleState> ScriptedPollable<S> {
    pub fn new(initial: S, script: impl IntoIterator<Item = S>) -> Self {
        Self {
            current: initial,
            script: script.into_iter().collect(),
            refreshes: 0,
        }
    }

    /// Number of times [`Pollable::refresh`] was called.
    #[must_use]
    pub const fn refreshes(&self) -> usize {
        self.refreshes
    }
}

impl<S: LifecycleState> Pollable for ScriptedPollable<S> {
    type State = S;

    fn state(&self) -> S {
        self.current
    }

    fn refresh(&mut self) -> CloudResult<()> {
        self.refreshes += 1;
        if let Some(next) = self.script.pop_front() {
            self.current = next;
        }
        Ok(())
    }
}

#[cfg(feature = "mock")]
pub use with_mock::*;

#[cfg(feature = "mock")]
mod with_mock {
    use super::fast_config;
    use crate::error::{CloudError, CloudResult};
    use crate::provider::CloudProvider;
    use crate::providers::mock::MockProvider;
    use crate::resources::{Instance, InstanceSpec};
    use crate::services::ResourceService;

    /// A mock provider built from [`fast_config`].
    #[must_use]
    pub fn mock_provider() -> MockProvider {
        MockProvider::new(fast_config())
    }

    /// Launch an instance from the first image, on the smallest VM type.
    ///
    /// # Errors
    ///
    /// Returns any provider failure, or `NotFound` if the provider offers no
    /// image or VM type.
    pub fn launch_instance(provider: &dyn CloudProvider, label: &str) -> CloudResult<Instance> {
        let compute = provider.compute();
        let image = compute
            .images()
            .list_all()?
            .into_iter()
            .next()
            .ok_or_else(|| CloudError::not_found("Machine image", "(any)"))?;
        let vm_type = compute
            .vm_types()
            .list_all()?
            .into_iter()
            .min_by_key(|vm_type| (vm_type.vcpus, vm_type.ram_mb))
            .ok_or_else(|| CloudError::not_found("VM type", "(any)"))?;
        compute
            .instances()
            .create(&InstanceSpec::new(label, image.id, vm_type.id))
    }
}
