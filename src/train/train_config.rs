use std::sync::mpsc;
use std::sync::{atomic::AtomicBool, Arc};

use crate::train::epoch_stats::EpochStats;

/// Loss is logged every this many epochs unless configured otherwise.
pub const DEFAULT_REPORT_EVERY: usize = 10;

/// Configuration for a `train_loop` run.
///
/// # Fields
/// - `epochs`: total number of full passes over the training data
/// - `workers`: worker threads per epoch; `1` trains sequentially
/// - `minibatch`: samples whose gradients a worker sums before applying
///   them in one locked update; `1` is plain per-sample SGD
/// - `report_every`: log the mean loss every this many epochs (`0` disables)
/// - `progress_tx`: optional channel sender; one `EpochStats` is sent per
///   completed epoch.  If the receiver is dropped the loop
///   terminates early (clean shutdown).
/// - `stop_flag`: optional atomic flag; when set to `true` from another
///   thread the loop terminates after the current epoch.
#[derive(Debug, Clone)]
pub struct TrainConfig {
    pub epochs: usize,
    pub workers: usize,
    pub minibatch: usize,
    pub report_every: usize,
    pub progress_tx: Option<mpsc::Sender<EpochStats>>,
    pub stop_flag: Option<Arc<AtomicBool>>,
}

impl TrainConfig {
    /// Creates a sequential, per-sample `TrainConfig` with no progress channel
    /// and no stop flag.
    pub fn new(epochs: usize) -> Self {
        TrainConfig {
            epochs,
            workers: 1,
            minibatch: 1,
            report_every: DEFAULT_REPORT_EVERY,
            progress_tx: None,
            stop_flag: None,
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_minibatch(mut self, minibatch: usize) -> Self {
        self.minibatch = minibatch;
        self
    }

    pub fn with_report_every(mut self, report_every: usize) -> Self {
        self.report_every = report_every;
        self
    }

    pub fn with_progress(mut self, tx: mpsc::Sender<EpochStats>) -> Self {
        self.progress_tx = Some(tx);
        self
    }

    pub fn with_stop_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.stop_flag = Some(flag);
        self
    }
}
