//! Run registry (§10.5): holds every live run behind its own `Arc`, so
//! cross-run operations proceed independently of one another — only a
//! single run's dispatch/report traffic is ever serialized against
//! itself (C7).
//!
//! Mirrors the teacher's `Casino` (`src/hosting/casino.rs`): a
//! `RwLock<HashMap<_, _>>` registry with a monotonic id counter, read
//! locked for lookups and write locked only to insert or remove an entry.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use tokio::sync::RwLock;

use crate::error::RunError;
use crate::param::ParamSpec;
use crate::run::Run;
use crate::run::RunConfig;

pub type RunId = u64;

/// Registry of live tuning runs.
pub struct Coordinator {
    runs: RwLock<HashMap<RunId, Arc<Run>>>,
    next_id: AtomicU64,
}

impl Default for Coordinator {
    fn default() -> Self {
        Self {
            runs: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }
}

impl Coordinator {
    /// Builds a new run (§1: run creation's embedder-facing shape; the
    /// run's own lifecycle policy beyond this is out of scope) and
    /// registers it under a fresh id.
    pub async fn create(
        &self,
        config: RunConfig,
        params: Vec<(ParamSpec, f64)>,
    ) -> Result<RunId, RunError> {
        let run = Arc::new(Run::new(config, params)?);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.runs.write().await.insert(id, run);
        log::info!("registered run {id}");
        Ok(id)
    }

    /// Looks up a run by id without removing it from the registry.
    pub async fn get(&self, id: RunId) -> Option<Arc<Run>> {
        self.runs.read().await.get(&id).cloned()
    }

    /// Removes a run from the registry. The returned `Arc` may still be
    /// held by in-flight callers; dropping the registry's reference does
    /// not cancel them.
    pub async fn remove(&self, id: RunId) -> Option<Arc<Run>> {
        let removed = self.runs.write().await.remove(&id);
        if removed.is_some() {
            log::info!("removed run {id}");
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variant::Variant;

    fn config() -> RunConfig {
        RunConfig {
            num_iter: 100,
            a_const: 10.0,
            alpha: 0.602,
            gamma: 0.101,
            variant: Variant::Classic,
            sf_lr: 0.0,
            sf_beta1: 0.0,
            sf_beta2: 0.0,
            sf_eps: 0.0,
        }
    }

    fn one_param() -> Vec<(ParamSpec, f64)> {
        vec![(
            ParamSpec {
                name: "p0".into(),
                min: -1.0,
                max: 1.0,
                c_end: 1.0,
                r_end: 0.01,
            },
            0.0,
        )]
    }

    #[tokio::test]
    async fn ids_are_distinct_and_monotonic() {
        let coordinator = Coordinator::default();
        let a = coordinator.create(config(), one_param()).await.unwrap();
        let b = coordinator.create(config(), one_param()).await.unwrap();
        assert!(b > a);
    }

    #[tokio::test]
    async fn get_after_create_returns_the_same_run() {
        let coordinator = Coordinator::default();
        let id = coordinator.create(config(), one_param()).await.unwrap();
        let run = coordinator.get(id).await.expect("run should be registered");
        assert_eq!(run.signature().await, run.signature().await);
    }

    #[tokio::test]
    async fn remove_drops_the_registry_entry() {
        let coordinator = Coordinator::default();
        let id = coordinator.create(config(), one_param()).await.unwrap();
        assert!(coordinator.remove(id).await.is_some());
        assert!(coordinator.get(id).await.is_none());
    }

    #[tokio::test]
    async fn cross_run_operations_are_independent() {
        let coordinator = Coordinator::default();
        let a = coordinator.create(config(), one_param()).await.unwrap();
        let b = coordinator.create(config(), one_param()).await.unwrap();
        let run_a = coordinator.get(a).await.unwrap();
        let run_b = coordinator.get(b).await.unwrap();

        // hold run_a's write lock across an await point; run_b must still
        // be free to dispatch concurrently.
        let signature_a = run_a.signature().await;
        let req = crate::wire::ReportRequest {
            k0: 0,
            packed_flips: crate::codec::pack(&[1]),
            signature: signature_a,
            wins: 1,
            losses: 0,
            draws: 0,
            num_games: 2,
        };
        let (report_result, dispatch_b) = tokio::join!(run_a.report(&req), run_b.dispatch(2));
        assert!(report_result.is_ok());
        assert_eq!(dispatch_b.task.num_games, 2);
    }
}
