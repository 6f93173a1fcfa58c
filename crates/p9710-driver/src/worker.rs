//! Meter worker thread
//!
//! This module runs a [`Meter`] on a dedicated thread so async code can
//! await readings without blocking its runtime on serial I/O.
//!
//! # Architecture
//!
//! Requests arrive through a tokio mpsc channel and each carries a oneshot
//! sender for its result. The worker handles them strictly one at a time.
//! A caller that gives up (see [`MeterHandle::request_with_timeout`]) only
//! stops waiting: the command already on the wire still runs to completion
//! and its result is dropped.
//!
//! # Example
//!
//! ```rust,ignore
//! let handle = MeterWorker::spawn(meter)?;
//! let measurement = handle.read_measurement().await?;
//! println!("{} A in {}", measurement.current, measurement.range);
//! ```

use std::thread;
use std::time::Duration;

use p9710_protocol::{Command, DetectorInfo, InstrumentIdentity, MeasurementRange};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::error::DriverError;
use crate::meter::{Measurement, Meter};

/// Pending requests before senders wait
const REQUEST_QUEUE_DEPTH: usize = 32;

/// Requests handled by the worker
#[derive(Debug)]
pub enum MeterRequest {
    /// Send a raw catalog command
    Query {
        /// Command to send
        command: Command,
        /// Channel for the raw reply
        response: oneshot::Sender<String>,
    },

    /// Read the instrument identity
    Identity {
        /// Channel for the identity
        response: oneshot::Sender<InstrumentIdentity>,
    },

    /// Read the detector identity, calibration factor and unit
    Detector {
        /// Channel for the detector snapshot
        response: oneshot::Sender<DetectorInfo>,
    },

    /// Read the photocurrent
    Current {
        /// Channel for the current in amperes
        response: oneshot::Sender<f64>,
    },

    /// Read the photometric value
    PhotometricValue {
        /// Channel for the value
        response: oneshot::Sender<f64>,
    },

    /// Read the current with range and uncertainty
    ReadMeasurement {
        /// Channel for the measurement
        response: oneshot::Sender<Measurement>,
    },

    /// Read the range reported by the head
    MeasurementRange {
        /// Channel for the range
        response: oneshot::Sender<MeasurementRange>,
    },

    /// Switch the head to autorange
    SelectAutorange {
        /// Signalled once the command has run
        response: oneshot::Sender<()>,
    },

    /// Fix the head in a range
    SelectManualRange {
        /// Range to select
        range: MeasurementRange,
        /// Signalled once the commands have run
        response: oneshot::Sender<()>,
    },

    /// Step toward larger currents
    RangeUp {
        /// Channel for the range now selected
        response: oneshot::Sender<MeasurementRange>,
    },

    /// Step toward smaller currents
    RangeDown {
        /// Channel for the range now selected
        response: oneshot::Sender<MeasurementRange>,
    },

    /// Stop the worker
    Shutdown,
}

/// Owns a meter on its own thread
pub struct MeterWorker {
    meter: Meter,
    requests: mpsc::Receiver<MeterRequest>,
}

impl MeterWorker {
    /// Move `meter` onto a new worker thread and return a handle to it
    pub fn spawn(meter: Meter) -> Result<MeterHandle, DriverError> {
        let (tx, rx) = mpsc::channel(REQUEST_QUEUE_DEPTH);
        let worker = MeterWorker {
            meter,
            requests: rx,
        };
        let port = worker.meter.device_port();

        thread::Builder::new()
            .name(format!("p9710-{}", port))
            .spawn(move || worker.run())
            .map_err(|e| DriverError::WorkerSpawn(e.to_string()))?;

        info!("Meter worker started for {}", port);
        Ok(MeterHandle { requests: tx })
    }

    fn run(mut self) {
        while let Some(request) = self.requests.blocking_recv() {
            if matches!(request, MeterRequest::Shutdown) {
                break;
            }
            self.handle(request);
        }
        debug!("Meter worker for {} stopped", self.meter.device_port());
    }

    // A dropped receiver means the caller gave up; the result is discarded.
    fn handle(&mut self, request: MeterRequest) {
        let meter = &mut self.meter;
        match request {
            MeterRequest::Query { command, response } => {
                let _ = response.send(meter.query(command));
            }
            MeterRequest::Identity { response } => {
                let _ = response.send(meter.identity());
            }
            MeterRequest::Detector { response } => {
                let _ = response.send(meter.detector());
            }
            MeterRequest::Current { response } => {
                let _ = response.send(meter.current());
            }
            MeterRequest::PhotometricValue { response } => {
                let _ = response.send(meter.photometric_value());
            }
            MeterRequest::ReadMeasurement { response } => {
                let _ = response.send(meter.read_measurement());
            }
            MeterRequest::MeasurementRange { response } => {
                let _ = response.send(meter.measurement_range());
            }
            MeterRequest::SelectAutorange { response } => {
                meter.select_autorange();
                let _ = response.send(());
            }
            MeterRequest::SelectManualRange { range, response } => {
                meter.select_manual_range(range);
                let _ = response.send(());
            }
            MeterRequest::RangeUp { response } => {
                let _ = response.send(meter.range_up());
            }
            MeterRequest::RangeDown { response } => {
                let _ = response.send(meter.range_down());
            }
            MeterRequest::Shutdown => {}
        }
    }
}

/// Async handle to a [`MeterWorker`]
#[derive(Debug, Clone)]
pub struct MeterHandle {
    requests: mpsc::Sender<MeterRequest>,
}

impl MeterHandle {
    /// Queue a request built around a fresh response channel and await the result
    pub async fn request<R>(
        &self,
        make: impl FnOnce(oneshot::Sender<R>) -> MeterRequest,
    ) -> Result<R, DriverError> {
        let (tx, rx) = oneshot::channel();
        self.requests
            .send(make(tx))
            .await
            .map_err(|_| DriverError::WorkerGone)?;
        rx.await.map_err(|_| DriverError::WorkerGone)
    }

    /// Like [`request`](Self::request) but stop waiting after `timeout`
    ///
    /// The request itself is not cancelled.
    pub async fn request_with_timeout<R>(
        &self,
        timeout: Duration,
        make: impl FnOnce(oneshot::Sender<R>) -> MeterRequest,
    ) -> Result<R, DriverError> {
        tokio::time::timeout(timeout, self.request(make))
            .await
            .map_err(|_| DriverError::Timeout(timeout.as_millis() as u64))?
    }

    pub async fn query(&self, command: Command) -> Result<String, DriverError> {
        self.request(|response| MeterRequest::Query { command, response })
            .await
    }

    pub async fn identity(&self) -> Result<InstrumentIdentity, DriverError> {
        self.request(|response| MeterRequest::Identity { response })
            .await
    }

    pub async fn detector(&self) -> Result<DetectorInfo, DriverError> {
        self.request(|response| MeterRequest::Detector { response })
            .await
    }

    pub async fn current(&self) -> Result<f64, DriverError> {
        self.request(|response| MeterRequest::Current { response })
            .await
    }

    pub async fn photometric_value(&self) -> Result<f64, DriverError> {
        self.request(|response| MeterRequest::PhotometricValue { response })
            .await
    }

    pub async fn read_measurement(&self) -> Result<Measurement, DriverError> {
        self.request(|response| MeterRequest::ReadMeasurement { response })
            .await
    }

    pub async fn measurement_range(&self) -> Result<MeasurementRange, DriverError> {
        self.request(|response| MeterRequest::MeasurementRange { response })
            .await
    }

    pub async fn select_autorange(&self) -> Result<(), DriverError> {
        self.request(|response| MeterRequest::SelectAutorange { response })
            .await
    }

    pub async fn select_manual_range(&self, range: MeasurementRange) -> Result<(), DriverError> {
        self.request(|response| MeterRequest::SelectManualRange { range, response })
            .await
    }

    pub async fn range_up(&self) -> Result<MeasurementRange, DriverError> {
        self.request(|response| MeterRequest::RangeUp { response })
            .await
    }

    pub async fn range_down(&self) -> Result<MeasurementRange, DriverError> {
        self.request(|response| MeterRequest::RangeDown { response })
            .await
    }

    /// Ask the worker to stop after the requests already queued
    pub async fn shutdown(&self) -> Result<(), DriverError> {
        self.requests
            .send(MeterRequest::Shutdown)
            .await
            .map_err(|_| DriverError::WorkerGone)
    }
}
