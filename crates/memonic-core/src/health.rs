//! Health scoring and recovery: the `ojas` composite score, the status
//! thresholds it implies, and the integrity sweep that rebuilds indices and
//! quarantines corrupt nodes when something doesn't add up.

use serde::Serialize;

use crate::index::Indices;
use crate::storage::TieredStore;
use crate::time::now_millis;

use crate::error::Result;

/// `ojas = 0.4*structural + 0.3*semantic + 0.2*temporal + 0.1*capacity`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct HealthScore {
    pub structural: f32,
    pub semantic: f32,
    pub temporal: f32,
    pub capacity: f32,
}

impl HealthScore {
    pub fn ojas(&self) -> f32 {
        0.4 * self.structural + 0.3 * self.semantic + 0.2 * self.temporal + 0.1 * self.capacity
    }

    pub fn status(&self) -> HealthStatus {
        let score = self.ojas();
        if score >= 0.95 {
            HealthStatus::Normal
        } else if score >= 0.80 {
            HealthStatus::ScheduleBackup
        } else if score >= 0.60 {
            HealthStatus::ForceRepair
        } else {
            HealthStatus::Emergency
        }
    }

    /// `critical()` iff overall < 0.6 or structural < 0.5 — a store can be
    /// critical even above the Emergency line if structural integrity alone
    /// has collapsed.
    pub fn critical(&self) -> bool {
        self.ojas() < 0.6 || self.structural < 0.5
    }

    /// True when `ojas >= 0.9` and at least an hour has passed since
    /// `last_backup_ms`.
    pub fn needs_backup(&self, last_backup_ms: Option<i64>) -> bool {
        if self.ojas() < 0.9 {
            return false;
        }
        match last_backup_ms {
            Some(last) => now_millis() - last >= 3_600_000,
            None => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Normal,
    ScheduleBackup,
    ForceRepair,
    Emergency,
}

/// What an integrity sweep found and did about it.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RecoveryReport {
    pub dangling_edges: usize,
    pub quarantined: usize,
    pub index_rebuilt: bool,
}

/// Computes the four component scores against the current store/index
/// state. `structural` penalizes dangling edges and index/node-count
/// mismatches; `semantic` penalizes nodes missing embeddings where one is
/// expected; `temporal` penalizes a large fraction of nodes that haven't
/// been accessed in a long time; `capacity` penalizes tiers near their
/// configured limits.
pub fn compute_health(
    store: &TieredStore,
    indices: &Indices,
    hot_capacity: usize,
    warm_capacity: usize,
    stale_after_ms: i64,
) -> Result<HealthScore> {
    let nodes = store.all_nodes()?;
    let total = nodes.len().max(1) as f32;

    let mut dangling = 0usize;
    let mut missing_embedding = 0usize;
    let mut stale = 0usize;
    let now = now_millis();

    let ids: std::collections::HashSet<_> = nodes.iter().map(|n| n.id).collect();
    for node in &nodes {
        for edge in &node.edges {
            if !ids.contains(&edge.target) {
                dangling += 1;
            }
        }
        if !node.has_embedding {
            missing_embedding += 1;
        }
        if now - node.tau_accessed > stale_after_ms {
            stale += 1;
        }
    }

    let structural = if indices.cardinality_matches(nodes.len()) {
        1.0 - (dangling as f32 / total).min(1.0)
    } else {
        (1.0 - (dangling as f32 / total).min(1.0)) * 0.5
    };
    let semantic = 1.0 - (missing_embedding as f32 / total).min(1.0);
    let temporal = 1.0 - (stale as f32 / total).min(1.0);
    let capacity = 1.0
        - ((store.hot_count() as f32 / hot_capacity.max(1) as f32).min(1.0) * 0.5
            + (store.warm_count()? as f32 / warm_capacity.max(1) as f32).min(1.0) * 0.5);

    Ok(HealthScore {
        structural: structural.clamp(0.0, 1.0),
        semantic: semantic.clamp(0.0, 1.0),
        temporal: temporal.clamp(0.0, 1.0),
        capacity: capacity.clamp(0.0, 1.0),
    })
}

/// Runs an integrity sweep: quarantines nodes with edges pointing at
/// missing targets, then rebuilds every index from the authoritative node
/// set if cardinality had drifted.
pub fn run_recovery(store: &TieredStore, indices: &mut Indices, skip_bm25: bool) -> Result<RecoveryReport> {
    let nodes = store.all_nodes()?;
    let ids: std::collections::HashSet<_> = nodes.iter().map(|n| n.id).collect();
    let mut report = RecoveryReport::default();

    for node in &nodes {
        let has_dangling = node.edges.iter().any(|e| !ids.contains(&e.target));
        if has_dangling {
            report.dangling_edges += node.edges.iter().filter(|e| !ids.contains(&e.target)).count();
            store.quarantine(&node.id, "edge target missing")?;
            report.quarantined += 1;
        }
    }

    if !indices.cardinality_matches(nodes.len()) {
        indices.rebuild(&nodes, skip_bm25);
        report.index_rebuilt = true;
    }

    Ok(report)
}
