use crate::logic::pools::{Pool, SourceId};
use dashmap::DashMap;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time view of every source, keyed deterministically.
pub type DepthSnapshot = BTreeMap<SourceId, Arc<[Pool]>>;

/// How the pools currently stored for a source were obtained.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum SourceStatus {
    Live,
    /// Some pools could not be read; they were replaced with synthetic depth or dropped.
    Degraded { failed_pools: usize },
    SyntheticFallback { reason: String },
    /// Fallback disabled and nothing could be read.
    Unavailable { reason: String },
}

impl SourceStatus {
    pub fn is_live(&self) -> bool {
        matches!(self, SourceStatus::Live)
    }
}

impl Display for SourceStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceStatus::Live => write!(f, "live"),
            SourceStatus::Degraded { failed_pools } => write!(f, "degraded ({failed_pools} pools failed)"),
            SourceStatus::SyntheticFallback { reason } => write!(f, "synthetic fallback: {reason}"),
            SourceStatus::Unavailable { reason } => write!(f, "unavailable: {reason}"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct SourceDepth {
    pub pools: Arc<[Pool]>,
    pub status: SourceStatus,
    pub generation: u64,
}

/// Per-source depth cache.
///
/// Written only by the depth tracker, read by route requests. Each write replaces a
/// source's whole entry, so a reader sees either the previous or the next pool list
/// for a source and never a mix of the two.
#[derive(Debug, Default)]
pub struct DepthStore {
    entries: DashMap<SourceId, SourceDepth>,
    /// Last completed refresh cycle
    generation: AtomicU64,
    /// Last cycle handed out by `begin_refresh`
    pending: AtomicU64,
}

impl DepthStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-built pools directly, bypassing any fetch. Used to drive the optimizer offline.
    pub fn seed(&self, source_id: SourceId, pools: Vec<Pool>) {
        let generation = self.begin_refresh();
        self.replace_at(source_id, pools, SourceStatus::Live, generation);
        self.finish_refresh(generation);
    }

    /// Replace an entry outside a refresh cycle, stamped with the current generation.
    pub fn replace(&self, source_id: SourceId, pools: impl Into<Arc<[Pool]>>, status: SourceStatus) {
        self.replace_at(source_id, pools, status, self.generation());
    }

    pub fn replace_at(&self, source_id: SourceId, pools: impl Into<Arc<[Pool]>>, status: SourceStatus, generation: u64) {
        self.entries.insert(source_id, SourceDepth { pools: pools.into(), status, generation });
    }

    pub fn get(&self, source_id: &SourceId) -> Option<SourceDepth> {
        self.entries.get(source_id).map(|entry| entry.value().clone())
    }

    pub fn pools(&self, source_id: &SourceId) -> Option<Arc<[Pool]>> {
        self.entries.get(source_id).map(|entry| entry.pools.clone())
    }

    pub fn snapshot(&self) -> DepthSnapshot {
        self.entries.iter().map(|entry| (entry.key().clone(), entry.pools.clone())).collect()
    }

    pub fn statuses(&self) -> BTreeMap<SourceId, SourceStatus> {
        self.entries.iter().map(|entry| (entry.key().clone(), entry.status.clone())).collect()
    }

    /// Reserve the generation number for a refresh cycle about to write entries.
    pub fn begin_refresh(&self) -> u64 {
        self.pending.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Publish a cycle started with [`DepthStore::begin_refresh`]. The published
    /// generation never moves backwards when cycles overlap.
    pub fn finish_refresh(&self, generation: u64) -> u64 {
        self.generation.fetch_max(generation, Ordering::AcqRel);
        generation
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Whether at least one refresh cycle has completed.
    pub fn is_populated(&self) -> bool {
        self.generation() > 0
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
