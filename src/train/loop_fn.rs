use std::sync::atomic::Ordering;
use std::time::Instant;

use log::{info, warn};

use crate::error::{NetworkError, Result};
use crate::loss::cross_entropy::CrossEntropyLoss;
use crate::network::network::{argmax, Network};
use crate::network::shared::SharedNetwork;
use crate::train::epoch_stats::EpochStats;
use crate::train::parallel::run_parallel_epoch;
use crate::train::train_config::TrainConfig;

// ---------------------------------------------------------------------------
// Public entry points
// ---------------------------------------------------------------------------

/// Trains `network` for `config.epochs` epochs and returns the mean training
/// loss of the **last completed epoch** (`0.0` if no epoch ran).
///
/// With `config.workers == 1` every epoch trains each sample in order and then
/// re-runs the forward pass over the whole set to measure the post-update
/// loss. With more workers the epoch is split across threads, see
/// [`run_parallel_epoch`].
///
/// # Early termination
/// The loop breaks early if:
/// - the `progress_tx` receiver has been dropped, **or**
/// - `config.stop_flag` is set to `true`.
///
/// # Errors
/// Fails before training if the dataset is empty, `inputs` and `targets`
/// differ in length, or any sample does not fit the network.
pub fn train_loop(
    network: &mut Network,
    inputs: &[Vec<f64>],
    targets: &[Vec<f64>],
    config: &TrainConfig,
) -> Result<f64> {
    validate_dataset(network, inputs, targets)?;

    if config.workers <= 1 {
        return drive_epochs(config, 1, inputs.len(), || {
            run_sequential_epoch(network, inputs, targets)
        });
    }

    let shared = SharedNetwork::new(network.clone());
    let result = drive_epochs(config, config.workers, inputs.len(), || {
        run_parallel_epoch(&shared, inputs, targets, config.workers, config.minibatch)
    });
    *network = shared.try_into_inner().unwrap_or_else(|shared| shared.snapshot());
    result
}

/// Same as [`train_loop`] but trains through a shared handle, so other
/// threads may keep calling `forward` on it while training runs.
pub fn train_loop_shared(
    network: &SharedNetwork,
    inputs: &[Vec<f64>],
    targets: &[Vec<f64>],
    config: &TrainConfig,
) -> Result<f64> {
    network.read(|net| validate_dataset(net, inputs, targets))?;
    drive_epochs(config, config.workers.max(1), inputs.len(), || {
        run_parallel_epoch(network, inputs, targets, config.workers, config.minibatch)
    })
}

/// Mean cross-entropy over a dataset without updating anything.
pub fn evaluate_loss(network: &Network, inputs: &[Vec<f64>], targets: &[Vec<f64>]) -> Result<f64> {
    validate_dataset(network, inputs, targets)?;
    let total = inputs
        .iter()
        .zip(targets)
        .try_fold(0.0, |sum, (input, target)| -> Result<f64> {
            Ok(sum + network.loss(input, target)?)
        })?;
    Ok(total / inputs.len() as f64)
}

/// Fraction of samples whose predicted class matches the target's argmax.
pub fn evaluate_accuracy(network: &Network, inputs: &[Vec<f64>], targets: &[Vec<f64>]) -> Result<f64> {
    validate_dataset(network, inputs, targets)?;
    let mut correct = 0usize;
    for (input, target) in inputs.iter().zip(targets) {
        if network.predict_class(input)? == argmax(target) {
            correct += 1;
        }
    }
    Ok(correct as f64 / inputs.len() as f64)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

/// Shared epoch bookkeeping: stop flag, timing, loss reporting, progress channel.
fn drive_epochs<F>(config: &TrainConfig, workers: usize, n_samples: usize, mut run_epoch: F) -> Result<f64>
where
    F: FnMut() -> Result<f64>,
{
    let mut last_train_loss = 0.0;

    for epoch in 1..=config.epochs {
        if stop_requested(config) {
            warn!("stop requested, ending training before epoch {epoch}");
            break;
        }

        let t_start = Instant::now();
        let train_loss = run_epoch()? / n_samples as f64;
        last_train_loss = train_loss;
        let elapsed_ms = t_start.elapsed().as_millis() as u64;

        if config.report_every > 0 && epoch % config.report_every == 0 {
            info!("Epoch {epoch}/{} - Loss: {train_loss:.6}", config.epochs);
        }

        let stats = EpochStats {
            epoch,
            total_epochs: config.epochs,
            train_loss,
            workers,
            elapsed_ms,
        };

        if let Some(ref tx) = config.progress_tx {
            // If the receiver has been dropped, stop training.
            if tx.send(stats).is_err() {
                warn!("progress receiver dropped, ending training after epoch {epoch}");
                break;
            }
        }
    }

    Ok(last_train_loss)
}

fn stop_requested(config: &TrainConfig) -> bool {
    config
        .stop_flag
        .as_ref()
        .is_some_and(|flag| flag.load(Ordering::Relaxed))
}

/// One sequential epoch: train on every sample, then measure every sample's
/// loss against the updated parameters. Returns the summed loss.
fn run_sequential_epoch(network: &mut Network, inputs: &[Vec<f64>], targets: &[Vec<f64>]) -> Result<f64> {
    for (input, target) in inputs.iter().zip(targets) {
        network.train(input, target)?;
    }

    let mut total_loss = 0.0;
    for (input, target) in inputs.iter().zip(targets) {
        let output = network.forward(input)?;
        total_loss += CrossEntropyLoss::loss(&output, target);
    }
    Ok(total_loss)
}

fn validate_dataset(network: &Network, inputs: &[Vec<f64>], targets: &[Vec<f64>]) -> Result<()> {
    if inputs.is_empty() {
        return Err(NetworkError::shape("training set", 1, 0));
    }
    if inputs.len() != targets.len() {
        return Err(NetworkError::shape("training targets", inputs.len(), targets.len()));
    }
    if let Some(bad) = inputs.iter().find(|x| x.len() != network.input_size()) {
        return Err(NetworkError::shape("training input", network.input_size(), bad.len()));
    }
    if let Some(bad) = targets.iter().find(|t| t.len() != network.output_size()) {
        return Err(NetworkError::shape("training target", network.output_size(), bad.len()));
    }
    Ok(())
}
