//! Resource accounting for engine objects.
//!
//! Every engine, store, module and instance the evaluator creates holds a
//! [`Lease`] from a shared [`ResourceLedger`]. Dropping the owning object
//! drops the lease, which records the release. Comparing the created and
//! released counters after an invocation shows whether every resource was
//! released exactly once.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::trace;

/// Kind of engine resource tracked by the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// A Wasmtime engine.
    Engine,
    /// A store and its [`ScriptContext`](crate::ScriptContext).
    Store,
    /// A compiled module.
    Module,
    /// A module instance bound to a store.
    Instance,
}

impl ResourceKind {
    /// All tracked kinds, in teardown order.
    pub const ALL: [Self; 4] = [Self::Instance, Self::Module, Self::Store, Self::Engine];

    const fn index(self) -> usize {
        match self {
            Self::Engine => 0,
            Self::Store => 1,
            Self::Module => 2,
            Self::Instance => 3,
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Engine => write!(f, "engine"),
            Self::Store => write!(f, "store"),
            Self::Module => write!(f, "module"),
            Self::Instance => write!(f, "instance"),
        }
    }
}

/// Created/released counters per [`ResourceKind`].
#[derive(Debug, Default)]
pub struct ResourceLedger {
    created: [AtomicUsize; 4],
    released: [AtomicUsize; 4],
}

impl ResourceLedger {
    /// Create an empty ledger.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Record the creation of a resource and return its lease.
    pub fn acquire(self: &Arc<Self>, kind: ResourceKind) -> Lease {
        self.created[kind.index()].fetch_add(1, Ordering::SeqCst);
        trace!(resource = %kind, "Resource acquired");
        Lease {
            ledger: Arc::clone(self),
            kind,
        }
    }

    /// Number of resources of this kind created so far.
    pub fn created(&self, kind: ResourceKind) -> usize {
        self.created[kind.index()].load(Ordering::SeqCst)
    }

    /// Number of resources of this kind released so far.
    pub fn released(&self, kind: ResourceKind) -> usize {
        self.released[kind.index()].load(Ordering::SeqCst)
    }

    /// Number of resources of this kind currently alive.
    pub fn live(&self, kind: ResourceKind) -> usize {
        self.created(kind).saturating_sub(self.released(kind))
    }

    /// Returns `true` if every created resource has been released.
    pub fn is_balanced(&self) -> bool {
        ResourceKind::ALL
            .iter()
            .all(|&kind| self.created(kind) == self.released(kind))
    }
}

/// Proof that a tracked resource is alive.
///
/// Hold it in the same value as the resource; its drop records the release.
pub struct Lease {
    ledger: Arc<ResourceLedger>,
    kind: ResourceKind,
}

impl Lease {
    /// The kind of resource this lease tracks.
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        self.ledger.released[self.kind.index()].fetch_add(1, Ordering::SeqCst);
        trace!(resource = %self.kind, "Resource released");
    }
}

impl std::fmt::Debug for Lease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lease").field("kind", &self.kind).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_and_release() {
        let ledger = ResourceLedger::new();

        let lease = ledger.acquire(ResourceKind::Engine);
        assert_eq!(lease.kind(), ResourceKind::Engine);
        assert_eq!(ledger.created(ResourceKind::Engine), 1);
        assert_eq!(ledger.live(ResourceKind::Engine), 1);
        assert!(!ledger.is_balanced());

        drop(lease);
        assert_eq!(ledger.released(ResourceKind::Engine), 1);
        assert_eq!(ledger.live(ResourceKind::Engine), 0);
        assert!(ledger.is_balanced());
    }

    #[test]
    fn test_kinds_are_counted_separately() {
        let ledger = ResourceLedger::new();

        let _store = ledger.acquire(ResourceKind::Store);
        let module = ledger.acquire(ResourceKind::Module);
        drop(module);

        assert_eq!(ledger.live(ResourceKind::Store), 1);
        assert_eq!(ledger.created(ResourceKind::Module), 1);
        assert_eq!(ledger.live(ResourceKind::Module), 0);
        assert_eq!(ledger.created(ResourceKind::Instance), 0);
    }

    #[test]
    fn test_empty_ledger_is_balanced() {
        assert!(ResourceLedger::new().is_balanced());
    }

    #[test]
    fn test_resource_kind_display() {
        assert_eq!(ResourceKind::Engine.to_string(), "engine");
        assert_eq!(ResourceKind::Instance.to_string(), "instance");
    }
}
