//! Meter shared between threads
//!
//! Each call takes the lock for its whole command sequence, so a detector
//! decode or a range step from one thread is never interleaved with
//! commands from another.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use p9710_protocol::{Command, DetectorInfo, InstrumentIdentity, MeasurementRange};

use crate::meter::{Measurement, Meter};

/// Cloneable handle to one [`Meter`]
#[derive(Clone)]
pub struct SharedMeter {
    inner: Arc<Mutex<Meter>>,
}

impl SharedMeter {
    pub fn new(meter: Meter) -> Self {
        Self {
            inner: Arc::new(Mutex::new(meter)),
        }
    }

    /// Run `f` with exclusive access to the meter
    ///
    /// A panic in an earlier holder does not poison the meter; its session
    /// carries no state between commands.
    pub fn with<R>(&self, f: impl FnOnce(&mut Meter) -> R) -> R {
        f(&mut *self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, Meter> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn query(&self, command: Command) -> String {
        self.with(|m| m.query(command))
    }

    pub fn identity(&self) -> InstrumentIdentity {
        self.with(Meter::identity)
    }

    pub fn detector(&self) -> DetectorInfo {
        self.with(Meter::detector)
    }

    pub fn current(&self) -> f64 {
        self.with(Meter::current)
    }

    pub fn photometric_value(&self) -> f64 {
        self.with(Meter::photometric_value)
    }

    pub fn read_measurement(&self) -> Measurement {
        self.with(Meter::read_measurement)
    }

    pub fn measurement_range(&self) -> MeasurementRange {
        self.with(Meter::measurement_range)
    }

    pub fn select_autorange(&self) {
        self.with(Meter::select_autorange)
    }

    pub fn select_manual_range(&self, range: MeasurementRange) {
        self.with(|m| m.select_manual_range(range))
    }

    pub fn range_up(&self) -> MeasurementRange {
        self.with(Meter::range_up)
    }

    pub fn range_down(&self) -> MeasurementRange {
        self.with(Meter::range_down)
    }
}

impl From<Meter> for SharedMeter {
    fn from(meter: Meter) -> Self {
        Self::new(meter)
    }
}
