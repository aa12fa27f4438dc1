use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::Result;
use crate::network::network::{Gradients, Network};

/// A cloneable, thread-safe handle to one [`Network`].
///
/// Every mutation goes through the write lock and every read through the
/// read lock, so readers see parameters either fully before or fully after
/// any update. Inference from many threads is concurrent; a training step
/// blocks readers only while its update is being written.
#[derive(Debug, Clone)]
pub struct SharedNetwork {
    inner: Arc<RwLock<Network>>,
}

impl SharedNetwork {
    pub fn new(network: Network) -> Self {
        Self {
            inner: Arc::new(RwLock::new(network)),
        }
    }

    pub fn forward(&self, input: &[f64]) -> Result<Vec<f64>> {
        self.inner.read().forward(input)
    }

    pub fn predict_class(&self, input: &[f64]) -> Result<usize> {
        self.inner.read().predict_class(input)
    }

    /// Computes gradients against the parameters current at call time.
    pub fn gradients(&self, input: &[f64], target: &[f64]) -> Result<Gradients> {
        self.inner.read().gradients(input, target)
    }

    /// One training step, performed entirely under the write lock.
    pub fn train(&self, input: &[f64], target: &[f64]) -> Result<()> {
        self.inner.write().train(input, target)
    }

    /// Applies `grads`, then evaluates `f` against the freshly updated
    /// network without letting another writer in between.
    ///
    /// Gradients of the wrong shape are rejected before anything is written
    /// and `f` is not run.
    pub fn apply_then_read<T>(
        &self,
        grads: &Gradients,
        f: impl FnOnce(&Network) -> Result<T>,
    ) -> Result<T> {
        let mut guard = self.inner.write();
        guard.apply(grads)?;
        let guard = parking_lot::RwLockWriteGuard::downgrade(guard);
        f(&guard)
    }

    /// Runs `f` with shared access to the network.
    pub fn read<T>(&self, f: impl FnOnce(&Network) -> T) -> T {
        f(&self.inner.read())
    }

    /// A consistent copy of the current network.
    pub fn snapshot(&self) -> Network {
        self.inner.read().clone()
    }

    /// Returns the network if this is the last handle, otherwise the handle back.
    pub fn try_into_inner(self) -> std::result::Result<Network, SharedNetwork> {
        Arc::try_unwrap(self.inner)
            .map(|lock| lock.into_inner())
            .map_err(|inner| SharedNetwork { inner })
    }
}

impl From<Network> for SharedNetwork {
    fn from(network: Network) -> Self {
        SharedNetwork::new(network)
    }
}
