//! Periodic sensor feeds with cancellable subscriptions
//!
//! Each physical sensor is modelled as a [`SensorFeed`]: the platform layer
//! pushes readings into it with [`SensorFeed::publish`], and consumers attach
//! callbacks with [`SensorFeed::add_listener`]. Everything runs on one thread,
//! so shared state lives in `Rc<RefCell<_>>` rather than behind locks.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::time::Duration;

use nalgebra::Vector3;
use tracing::debug;

use crate::error::{HudError, Result};
use crate::types::{OrientationSample, Rotation, SensorSettings};

type Callback<T> = Rc<RefCell<dyn FnMut(&T)>>;

struct Listener<T> {
    id: u64,
    active: Rc<Cell<bool>>,
    callback: Callback<T>,
}

struct Registry<T> {
    listeners: Vec<Listener<T>>,
    next_id: u64,
    interval: Duration,
    last_delivery: Option<Duration>,
}

/// A single periodic sensor stream
///
/// Deliveries are throttled to the configured update interval: a reading
/// published sooner than one interval after the last delivered reading is
/// dropped.
///
/// # Example
/// ```
/// use std::{cell::Cell, rc::Rc, time::Duration};
/// use compass_hud::SensorFeed;
///
/// let feed = SensorFeed::new("accelerometer", Duration::from_millis(100));
/// let seen = Rc::new(Cell::new(0));
///
/// let counter = seen.clone();
/// let subscription = feed.add_listener(move |_: &f32| counter.set(counter.get() + 1));
///
/// assert!(feed.publish(Duration::from_millis(0), &1.0));
/// assert!(!feed.publish(Duration::from_millis(40), &2.0)); // too soon
/// assert!(feed.publish(Duration::from_millis(100), &3.0));
/// assert_eq!(seen.get(), 2);
///
/// subscription.remove();
/// feed.publish(Duration::from_millis(200), &4.0);
/// assert_eq!(seen.get(), 2);
/// ```
pub struct SensorFeed<T> {
    name: &'static str,
    registry: Rc<RefCell<Registry<T>>>,
}

impl<T: 'static> SensorFeed<T> {
    pub fn new(name: &'static str, interval: Duration) -> Self {
        Self {
            name,
            registry: Rc::new(RefCell::new(Registry {
                listeners: Vec::new(),
                next_id: 0,
                interval,
                last_delivery: None,
            })),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn update_interval(&self) -> Duration {
        self.registry.borrow().interval
    }

    /// Change the minimum spacing between deliveries
    ///
    /// Also forgets the last delivery time, so a platform that restarts its
    /// clock is not throttled against the previous run.
    ///
    /// # Errors
    /// Returns [`HudError::InvalidConfig`] for a zero interval.
    pub fn set_update_interval(&self, interval: Duration) -> Result<()> {
        if interval.is_zero() {
            return Err(HudError::invalid_config(format!(
                "{} update interval must be non-zero",
                self.name
            )));
        }
        {
            let mut registry = self.registry.borrow_mut();
            registry.interval = interval;
            registry.last_delivery = None;
        }
        debug!(feed = self.name, ?interval, "update interval set");
        Ok(())
    }

    /// Number of live subscriptions
    pub fn listener_count(&self) -> usize {
        self.registry
            .borrow()
            .listeners
            .iter()
            .filter(|listener| listener.active.get())
            .count()
    }

    /// Register a callback for every delivered reading
    ///
    /// The callback stays registered until the returned [`Subscription`] is
    /// removed or dropped.
    #[must_use = "dropping the subscription cancels it immediately"]
    pub fn add_listener<F>(&self, callback: F) -> Subscription
    where
        F: FnMut(&T) + 'static,
    {
        let active = Rc::new(Cell::new(true));
        let callback: Callback<T> = Rc::new(RefCell::new(callback));

        let id = {
            let mut registry = self.registry.borrow_mut();
            let id = registry.next_id;
            registry.next_id += 1;
            registry.listeners.push(Listener {
                id,
                active: active.clone(),
                callback,
            });
            id
        };
        debug!(feed = self.name, id, "listener added");

        let registry: Weak<RefCell<Registry<T>>> = Rc::downgrade(&self.registry);
        let name = self.name;
        Subscription {
            active,
            release: Some(Box::new(move || {
                let Some(registry) = registry.upgrade() else {
                    return;
                };
                // While a publish is in flight the listener is only flagged;
                // the next publish prunes it.
                if let Ok(mut registry) = registry.try_borrow_mut() {
                    registry.listeners.retain(|listener| listener.id != id);
                    if registry.listeners.is_empty() {
                        registry.last_delivery = None;
                    }
                }
                debug!(feed = name, id, "listener removed");
            })),
        }
    }

    /// Deliver a reading to every live listener
    ///
    /// # Arguments
    /// * `timestamp` - Time the reading was taken, on a monotonic clock
    /// * `value` - The reading
    ///
    /// # Returns
    /// `true` if the reading was delivered, `false` if it arrived within one
    /// update interval of the previous delivery
    pub fn publish(&self, timestamp: Duration, value: &T) -> bool {
        let snapshot: Vec<(Rc<Cell<bool>>, Callback<T>)> = {
            let mut registry = self.registry.borrow_mut();
            if let Some(last) = registry.last_delivery {
                if timestamp.saturating_sub(last) < registry.interval {
                    return false;
                }
            }
            registry.last_delivery = Some(timestamp);
            registry.listeners.retain(|listener| listener.active.get());
            registry
                .listeners
                .iter()
                .map(|listener| (listener.active.clone(), listener.callback.clone()))
                .collect()
        };

        for (active, callback) in snapshot {
            // A listener removed by an earlier callback in this loop is skipped
            if !active.get() {
                continue;
            }
            if let Ok(mut callback) = callback.try_borrow_mut() {
                (&mut *callback)(value);
            }
        }
        true
    }
}

/// Handle to a registered listener
///
/// Removing or dropping the handle stops delivery to its callback.
pub struct Subscription {
    active: Rc<Cell<bool>>,
    release: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Cancel the subscription
    pub fn remove(mut self) {
        self.release();
    }

    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    fn release(&mut self) {
        self.active.set(false);
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl core::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.active.get())
            .finish()
    }
}

/// Reading from the device-motion feed
///
/// Platforms may deliver motion events without rotation data; such events
/// are skipped by the estimator.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DeviceMotion {
    pub rotation: Option<Rotation>,
}

impl From<DeviceMotion> for OrientationSample {
    fn from(motion: DeviceMotion) -> Self {
        OrientationSample {
            rotation: motion.rotation,
            ..Default::default()
        }
    }
}

/// The three feeds an overlay listens to
pub struct SensorSuite {
    pub accelerometer: SensorFeed<Vector3<f32>>,
    pub magnetometer: SensorFeed<Vector3<f32>>,
    pub device_motion: SensorFeed<DeviceMotion>,
}

impl SensorSuite {
    pub fn new() -> Self {
        let settings = SensorSettings::default();
        Self {
            accelerometer: SensorFeed::new("accelerometer", settings.accelerometer_interval()),
            magnetometer: SensorFeed::new("magnetometer", settings.magnetometer_interval()),
            device_motion: SensorFeed::new("device_motion", settings.device_motion_interval()),
        }
    }

    /// Apply the update intervals from `settings` to every feed
    pub fn configure(&self, settings: &SensorSettings) -> Result<()> {
        self.accelerometer
            .set_update_interval(settings.accelerometer_interval())?;
        self.magnetometer
            .set_update_interval(settings.magnetometer_interval())?;
        self.device_motion
            .set_update_interval(settings.device_motion_interval())?;
        Ok(())
    }
}

impl Default for SensorSuite {
    fn default() -> Self {
        Self::new()
    }
}
