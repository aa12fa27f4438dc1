use crate::error::Result;
use crate::network::network::Network;
use crate::train::loop_fn::train_loop;
use crate::train::train_config::TrainConfig;

impl Network {
    /// Trains sample by sample for `epochs` epochs, logging the mean loss every
    /// 10 epochs. Returns the mean loss of the last epoch.
    pub fn train_batch(&mut self, inputs: &[Vec<f64>], targets: &[Vec<f64>], epochs: usize) -> Result<f64> {
        train_loop(self, inputs, targets, &TrainConfig::new(epochs))
    }

    /// Like [`Network::train_batch`], with each epoch split across `workers`
    /// threads. A single worker runs the sequential loop.
    pub fn train_batch_parallel(
        &mut self,
        inputs: &[Vec<f64>],
        targets: &[Vec<f64>],
        epochs: usize,
        workers: usize,
    ) -> Result<f64> {
        train_loop(self, inputs, targets, &TrainConfig::new(epochs).with_workers(workers))
    }
}
