use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender};

use crate::detection::domain::capability::Capability;
use crate::detection::domain::category::Category;
use crate::detection::domain::detection_set::Detections;
use crate::detection::domain::shape_detector::DetectionError;
use crate::pump::pump_error::PumpError;
use crate::shared::frame::Frame;

/// One capability's answer for one pass.
#[derive(Debug)]
pub struct PassOutcome {
    pub pass_id: u64,
    pub category: Category,
    pub result: Result<Detections, DetectionError>,
    pub elapsed: Duration,
}

type Job = (u64, Arc<Frame>);

/// Long-lived thread that owns one capability and runs it on request.
///
/// A panic inside the detector is caught and reported as a failed outcome,
/// so the worker keeps serving later passes.
pub struct DetectionWorker {
    category: Category,
    job_tx: Option<Sender<Job>>,
    handle: Option<JoinHandle<()>>,
}

impl DetectionWorker {
    pub fn spawn(capability: Capability, outcome_tx: Sender<PassOutcome>) -> Result<Self, PumpError> {
        let category = capability.category();
        // At most one pass is in flight, so one slot is enough.
        let (job_tx, job_rx) = crossbeam_channel::bounded::<Job>(1);
        let handle = std::thread::Builder::new()
            .name(format!("detect-{category}"))
            .spawn(move || run_worker(capability, job_rx, outcome_tx))
            .map_err(|source| PumpError::Spawn { category, source })?;
        Ok(Self {
            category,
            job_tx: Some(job_tx),
            handle: Some(handle),
        })
    }

    pub fn category(&self) -> Category {
        self.category
    }

    /// Hands `frame` to the worker for pass `pass_id`.
    pub fn submit(&self, pass_id: u64, frame: Arc<Frame>) -> Result<(), PumpError> {
        let tx = self.job_tx.as_ref().ok_or(PumpError::WorkerLost)?;
        tx.send((pass_id, frame)).map_err(|_| PumpError::WorkerLost)
    }
}

impl Drop for DetectionWorker {
    fn drop(&mut self) {
        // Closing the job channel ends the worker loop.
        self.job_tx.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("{} detection worker panicked", self.category);
            }
        }
    }
}

fn run_worker(mut capability: Capability, job_rx: Receiver<Job>, outcome_tx: Sender<PassOutcome>) {
    let category = capability.category();
    for (pass_id, frame) in job_rx {
        let started = Instant::now();
        let result = match panic::catch_unwind(AssertUnwindSafe(|| capability.detect(&frame))) {
            Ok(result) => result,
            Err(payload) => Err(DetectionError::Panicked(panic_message(payload.as_ref()))),
        };
        let outcome = PassOutcome {
            pass_id,
            category,
            result,
            elapsed: started.elapsed(),
        };
        if outcome_tx.send(outcome).is_err() {
            break;
        }
    }
    log::debug!("{category} detection worker stopped");
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
