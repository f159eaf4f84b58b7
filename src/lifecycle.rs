//! Waiting for a resource to reach a state.
//!
//! Resources with a life cycle (instances, volumes, snapshots, images, networks,
//! subnets, floating IPs, gateways) report a normalized state enum. [`wait_for`]
//! polls such a resource at a fixed interval until its state lands in a target
//! set, lands in a terminal set, or the deadline passes:
//!
//! 1. state in `target` → success, without sleeping if that holds on the first check;
//! 2. state in `terminal` (and not in `target`) → [`ErrorKind::WaitStateTerminal`];
//! 3. elapsed time at or past `timeout` → [`ErrorKind::WaitStateTimeout`];
//! 4. otherwise sleep `interval`, call [`Pollable::refresh`] exactly once, repeat.
//!
//! There is no backoff and no cancellation; the calling thread blocks.

use crate::config::BridgeConfig;
use crate::error::{CloudError, CloudResult, ErrorKind};
use crate::pagination::Identified;
use std::fmt::{Debug, Display};
use std::hash::Hash;
use std::time::{Duration, Instant};

/// A normalized life-cycle state enum for one resource kind.
pub trait LifecycleState:
    Copy + Eq + Hash + Debug + Display + Send + Sync + 'static
{
    /// Reported when the provider no longer knows the resource.
    const UNKNOWN: Self;
    /// States in which the resource is usable.
    const READY: &'static [Self];
    /// States from which [`Self::READY`] can never be reached.
    const TERMINAL: &'static [Self];
    /// States that count as "deleted" when waiting for removal.
    const GONE: &'static [Self];

    fn as_str(&self) -> &'static str;
}

/// A resource snapshot that carries a life-cycle state.
pub trait StatefulResource: Identified {
    type State: LifecycleState;

    fn state(&self) -> Self::State;

    fn set_state(&mut self, state: Self::State);
}

/// Something [`wait_for`] can poll.
pub trait Pollable {
    type State: LifecycleState;

    /// The last state observed, without touching the provider.
    fn state(&self) -> Self::State;

    /// Re-fetch the state from the provider.
    ///
    /// # Errors
    ///
    /// Propagates any provider failure.
    fn refresh(&mut self) -> CloudResult<()>;
}

/// A resource snapshot bound to the lookup that can re-fetch it.
///
/// When the lookup reports the resource gone, the snapshot's state becomes
/// [`LifecycleState::UNKNOWN`] rather than failing the refresh.
pub struct Tracked<'a, R, F> {
    resource: &'a mut R,
    lookup: F,
}

impl<'a, R, F> Tracked<'a, R, F>
where
    R: StatefulResource,
    F: FnMut(&str) -> CloudResult<Option<R>>,
{
    pub const fn new(resource: &'a mut R, lookup: F) -> Self {
        Self { resource, lookup }
    }

    #[must_use]
    pub fn resource(&self) -> &R {
        &*self.resource
    }
}

impl<R, F> Pollable for Tracked<'_, R, F>
where
    R: StatefulResource,
    F: FnMut(&str) -> CloudResult<Option<R>>,
{
    type State = R::State;

    fn state(&self) -> R::State {
        self.resource.state()
    }

    fn refresh(&mut self) -> CloudResult<()> {
        match (self.lookup)(self.resource.id())? {
            Some(fresh) => *self.resource = fresh,
            None => self.resource.set_state(R::State::UNKNOWN),
        }
        Ok(())
    }
}

/// Optional overrides for a single wait; unset fields come from [`BridgeConfig`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WaitOptions {
    pub timeout: Option<Duration>,
    pub interval: Option<Duration>,
}

impl WaitOptions {
    #[must_use]
    pub const fn new(timeout: Duration, interval: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            interval: Some(interval),
        }
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    /// `(timeout, interval)` with config defaults filled in.
    #[must_use]
    pub fn resolve(&self, config: &BridgeConfig) -> (Duration, Duration) {
        (
            self.timeout.unwrap_or(config.default_wait_timeout),
            self.interval.unwrap_or(config.default_wait_interval),
        )
    }
}

/// Poll `resource` until its state is in `target`.
///
/// # Errors
///
/// - `InvalidValue` if `timeout < interval`; nothing is polled.
/// - `WaitStateTerminal` as soon as the state is in `terminal` but not `target`.
/// - `WaitStateTimeout` once `timeout` has elapsed.
/// - Any error raised by [`Pollable::refresh`].
pub fn wait_for<P: Pollable>(
    resource: &mut P,
    target: &[P::State],
    terminal: &[P::State],
    timeout: Duration,
    interval: Duration,
) -> CloudResult<()> {
    if timeout < interval {
        return Err(CloudError::invalid_value(format!(
            "wait timeout ({timeout:?}) must not be shorter than the interval ({interval:?})"
        )));
    }

    let start = Instant::now();
    let mut polls = 0u32;

    loop {
        let state = resource.state();

        if target.contains(&state) {
            tracing::debug!(%state, polls, elapsed = ?start.elapsed(), "target state reached");
            return Ok(());
        }

        if terminal.contains(&state) {
            tracing::info!(%state, polls, "terminal state reached while waiting");
            return Err(CloudError::new(
                ErrorKind::WaitStateTerminal,
                format!(
                    "Object is in state {state}, which is a terminal state and cannot be waited on"
                ),
            ));
        }

        let elapsed = start.elapsed();
        if elapsed >= timeout {
            tracing::info!(%state, polls, ?timeout, "gave up waiting for target state");
            return Err(CloudError::new(
                ErrorKind::WaitStateTimeout,
                format!(
                    "Waited too long for object to enter one of {} (last state: {state}, timeout: {timeout:?})",
                    join_states(target)
                ),
            ));
        }

        tracing::debug!(%state, polls, ?elapsed, "waiting for target state");
        std::thread::sleep(interval);
        resource.refresh()?;
        polls += 1;
    }
}

fn join_states<S: LifecycleState>(states: &[S]) -> String {
    let names: Vec<&str> = states.iter().map(LifecycleState::as_str).collect();
    format!("[{}]", names.join(", "))
}

/// Generate a state enum with string conversions and a [`LifecycleState`] impl.
macro_rules! lifecycle_state {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($variant:ident => $text:literal),+ $(,)?
        }
        ready: [$($ready:ident),*],
        terminal: [$($terminal:ident),*],
        gone: [$($gone:ident),*] $(,)?
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $crate::lifecycle::LifecycleState for $name {
            const UNKNOWN: Self = Self::Unknown;
            const READY: &'static [Self] = &[$(Self::$ready),*];
            const TERMINAL: &'static [Self] = &[$(Self::$terminal),*];
            const GONE: &'static [Self] = &[$(Self::$gone),*];

            fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str($crate::lifecycle::LifecycleState::as_str(self))
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::error::CloudError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err($crate::error::CloudError::invalid_value(format!(
                        "unknown {} {other:?}",
                        stringify!($name)
                    ))),
                }
            }
        }
    };
}

pub(crate) use lifecycle_state;

#[cfg(test)]
mod tests {
    use super::*;

    lifecycle_state! {
        Light {
            Unknown => "unknown",
            Red => "red",
            Amber => "amber",
            Green => "green",
            Broken => "broken",
        }
        ready: [Green],
        terminal: [Broken],
        gone: [Unknown],
    }

    /// Replays a script of states, one per refresh.
    struct Scripted {
        current: Light,
        script: Vec<Light>,
        refreshes: usize,
    }

    impl Scripted {
        fn new(current: Light, script: &[Light]) -> Self {
            Self {
                current,
                script: script.iter().rev().copied().collect(),
                refreshes: 0,
            }
        }
    }

    impl Pollable for Scripted {
        type State = Light;

        fn state(&self) -> Light {
            self.current
        }

        fn refresh(&mut self) -> CloudResult<()> {
            self.refreshes += 1;
            if let Some(next) = self.script.pop() {
                self.current = next;
            }
            Ok(())
        }
    }

    const MS: Duration = Duration::from_millis(1);

    #[test]
    fn test_already_in_target_does_not_poll() {
        let mut light = Scripted::new(Light::Green, &[]);
        let start = Instant::now();
        wait_for(&mut light, Light::READY, Light::TERMINAL, MS * 500, MS * 100).unwrap();
        assert_eq!(light.refreshes, 0);
        assert!(start.elapsed() < MS * 100);
    }

    #[test]
    fn test_terminal_fails_immediately() {
        let mut light = Scripted::new(Light::Broken, &[]);
        let err = wait_for(&mut light, Light::READY, Light::TERMINAL, MS * 500, MS * 100)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::WaitStateTerminal);
        assert_eq!(light.refreshes, 0);
    }

    #[test]
    fn test_target_wins_over_terminal() {
        let mut light = Scripted::new(Light::Broken, &[]);
        wait_for(&mut light, &[Light::Broken], &[Light::Broken], MS * 10, MS).unwrap();
    }

    #[test]
    fn test_reaches_target_after_refreshes() {
        let mut light = Scripted::new(Light::Red, &[Light::Amber, Light::Green]);
        wait_for(&mut light, Light::READY, Light::TERMINAL, MS * 1000, MS).unwrap();
        assert_eq!(light.refreshes, 2);
        assert_eq!(light.state(), Light::Green);
    }

    #[test]
    fn test_terminal_after_refresh() {
        let mut light = Scripted::new(Light::Red, &[Light::Broken]);
        let err =
            wait_for(&mut light, Light::READY, Light::TERMINAL, MS * 1000, MS).unwrap_err();
        assert_eq!(err.kind, ErrorKind::WaitStateTerminal);
        assert_eq!(light.refreshes, 1);
    }

    #[test]
    fn test_timeout_equal_to_interval_polls_once() {
        let mut light = Scripted::new(Light::Red, &[]);
        let err =
            wait_for(&mut light, Light::READY, Light::TERMINAL, MS * 20, MS * 20).unwrap_err();
        assert_eq!(err.kind, ErrorKind::WaitStateTimeout);
        assert_eq!(light.refreshes, 1);
    }

    #[test]
    fn test_timeout_shorter_than_interval_rejected() {
        let mut light = Scripted::new(Light::Red, &[]);
        let err = wait_for(&mut light, Light::READY, Light::TERMINAL, MS, MS * 2).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidValue);
        assert_eq!(light.refreshes, 0);
    }

    #[test]
    fn test_state_string_conversions() {
        assert_eq!("amber".parse::<Light>().unwrap(), Light::Amber);
        assert_eq!(Light::Green.to_string(), "green");
        assert!("purple".parse::<Light>().is_err());
    }

    #[test]
    fn test_wait_options_resolve() {
        let config = BridgeConfig::default();
        let (timeout, interval) = WaitOptions::default()
            .with_interval(Duration::from_secs(1))
            .resolve(&config);
        assert_eq!(timeout, config.default_wait_timeout);
        assert_eq!(interval, Duration::from_secs(1));
    }
}
