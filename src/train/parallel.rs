use std::ops::Range;
use std::thread;

use log::debug;

use crate::error::Result;
use crate::loss::cross_entropy::CrossEntropyLoss;
use crate::network::network::Gradients;
use crate::network::shared::SharedNetwork;

/// Splits `0..n` into `workers` contiguous ranges of `n / workers` samples;
/// the last range absorbs the remainder.
///
/// `workers` is clamped to `1..=n` so no range is empty (for `n > 0`).
pub fn shard_ranges(n: usize, workers: usize) -> Vec<Range<usize>> {
    let workers = workers.clamp(1, n.max(1));
    let per_worker = n / workers;
    (0..workers)
        .map(|t| {
            let start = t * per_worker;
            let end = if t == workers - 1 { n } else { start + per_worker };
            start..end
        })
        .collect()
}

/// Runs one epoch with one scoped thread per shard and returns the summed loss.
///
/// Each worker walks its shard in index order, `minibatch` samples at a time:
/// gradients are computed under the shared read lock, summed locally, applied
/// under the write lock, and the lock is then downgraded so the loss of the
/// minibatch is read from exactly the parameters that update produced.
///
/// Updates from different workers interleave in no fixed order, so the
/// parameters after an epoch depend on scheduling.
///
/// Samples must already be shape-checked against the network.
pub fn run_parallel_epoch(
    network: &SharedNetwork,
    inputs: &[Vec<f64>],
    targets: &[Vec<f64>],
    workers: usize,
    minibatch: usize,
) -> Result<f64> {
    let shards = shard_ranges(inputs.len(), workers);
    let minibatch = minibatch.max(1);

    thread::scope(|s| {
        let handles: Vec<_> = shards
            .into_iter()
            .enumerate()
            .map(|(worker_id, shard)| {
                debug!("worker {worker_id} takes samples {shard:?}");
                s.spawn(move || train_shard(network, inputs, targets, shard, minibatch))
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
            .sum::<Result<f64>>()
    })
}

fn train_shard(
    network: &SharedNetwork,
    inputs: &[Vec<f64>],
    targets: &[Vec<f64>],
    shard: Range<usize>,
    minibatch: usize,
) -> Result<f64> {
    let mut local_loss = 0.0;
    let mut start = shard.start;

    while start < shard.end {
        let batch = start..(start + minibatch).min(shard.end);

        let grads = network.read(|net| -> Result<Gradients> {
            let mut acc = Gradients::zeros_like(net);
            for i in batch.clone() {
                acc.accumulate(&net.gradients(&inputs[i], &targets[i])?);
            }
            Ok(acc)
        })?;

        local_loss += network.apply_then_read(&grads, |net| -> Result<f64> {
            batch.clone().try_fold(0.0, |sum, i| -> Result<f64> {
                let output = net.forward(&inputs[i])?;
                Ok(sum + CrossEntropyLoss::loss(&output, &targets[i]))
            })
        })?;

        start = batch.end;
    }

    Ok(local_loss)
}
