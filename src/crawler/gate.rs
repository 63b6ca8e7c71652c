//! Admission control for concurrent work
//!
//! This module handles:
//! - A bounded pool for network-bound work (politeness towards the remote)
//! - A separate, much larger pool for local work (parsing, file I/O)
//! - A global in-flight counter used to detect when the crawl has quiesced

use crate::MirrorError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// The pool an operation is admitted through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpClass {
    Network,
    Local,
}

/// One increment of the in-flight counter, undone on drop
#[derive(Debug)]
struct InFlight(Arc<AtomicUsize>);

impl InFlight {
    fn enter(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// An admitted unit of concurrent work
///
/// Holds one slot of its class's pool and one increment of the in-flight
/// counter. Both are given back exactly once, when the handle is dropped,
/// whichever way the owning work exits.
#[derive(Debug)]
pub struct OperationHandle {
    // Field order matters: the slot is returned before the in-flight count drops.
    _permit: OwnedSemaphorePermit,
    _counted: InFlight,
    class: OpClass,
}

impl OperationHandle {
    pub fn class(&self) -> OpClass {
        self.class
    }

    /// Gives the slot back and leaves the in-flight count
    pub fn release(self) {
        drop(self);
    }
}

/// An operation already counted in flight, still waiting for its slot
#[derive(Debug)]
pub struct PendingOp {
    pool: Arc<Semaphore>,
    counted: InFlight,
    class: OpClass,
}

impl PendingOp {
    /// Waits for a slot in the operation's pool
    ///
    /// On failure the in-flight count is given back.
    pub async fn admit(self) -> Result<OperationHandle, MirrorError> {
        let PendingOp {
            pool,
            counted,
            class,
        } = self;
        let permit = pool
            .acquire_owned()
            .await
            .map_err(|_| MirrorError::AdmissionClosed)?;

        Ok(OperationHandle {
            _permit: permit,
            _counted: counted,
            class,
        })
    }

    pub fn class(&self) -> OpClass {
        self.class
    }
}

/// Two independent bounded pools plus the global in-flight counter
///
/// Local fan-out cannot starve network slots and vice versa.
#[derive(Debug, Clone)]
pub struct AdmissionGate {
    network: Arc<Semaphore>,
    local: Arc<Semaphore>,
    in_flight: Arc<AtomicUsize>,
}

impl AdmissionGate {
    /// Creates a gate with the given pool capacities
    ///
    /// # Arguments
    ///
    /// * `max_network` - Concurrent network operations allowed
    /// * `max_local` - Concurrent local operations allowed
    pub fn new(max_network: usize, max_local: usize) -> Self {
        Self {
            network: Arc::new(Semaphore::new(max_network)),
            local: Arc::new(Semaphore::new(max_local)),
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Admits a network-bound operation, waiting for a free slot
    pub async fn begin_network_op(&self) -> Result<OperationHandle, MirrorError> {
        self.begin(OpClass::Network).await
    }

    /// Admits a local operation, waiting for a free slot
    pub async fn begin_local_op(&self) -> Result<OperationHandle, MirrorError> {
        self.begin(OpClass::Local).await
    }

    async fn begin(&self, class: OpClass) -> Result<OperationHandle, MirrorError> {
        self.enter(class).admit().await
    }

    /// Counts an operation as in flight without waiting for its slot
    ///
    /// The returned [`PendingOp`] is admitted later, usually by the task it
    /// was handed to. A spawner therefore never holds its own slot while
    /// waiting for a child's, and a pool of any size drains.
    pub fn enter(&self, class: OpClass) -> PendingOp {
        let counted = InFlight::enter(&self.in_flight);
        let pool = match class {
            OpClass::Network => &self.network,
            OpClass::Local => &self.local,
        };

        PendingOp {
            pool: Arc::clone(pool),
            counted,
            class,
        }
    }

    /// Closes both pools
    ///
    /// Every waiting and future admission fails with
    /// [`MirrorError::AdmissionClosed`]. Admitted operations keep their slots.
    pub fn close(&self) {
        self.network.close();
        self.local.close();
    }

    pub fn is_closed(&self) -> bool {
        self.network.is_closed() && self.local.is_closed()
    }

    /// Number of operations admitted or waiting for admission
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Number of free slots in a pool
    pub fn available(&self, class: OpClass) -> usize {
        match class {
            OpClass::Network => self.network.available_permits(),
            OpClass::Local => self.local.available_permits(),
        }
    }
}
