//! Process-wide cache of compiled procedures.
//!
//! Procedures depend only on a spline's shape, never on its values, so one
//! compiled plan serves every spline with the same key. Entries are never
//! evicted; the number of entries is bounded by the number of distinct shapes
//! a program uses.

use crate::eval::plan::{EvaluationPlan, PlanKey};
use crate::spline::SpecializationKey;
use crate::support::SupportPlan;
use crate::transform::TransformPlan;
use log::trace;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

/// A thread-safe map from key to compiled procedure.
#[derive(Debug)]
pub(crate) struct ProcedureCache<K, V> {
    name: &'static str,
    entries: RwLock<HashMap<K, Arc<V>>>,
}

impl<K, V> ProcedureCache<K, V>
where
    K: Eq + Hash + Clone + Debug,
{
    pub(crate) fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the procedure for `key`, compiling it on first request.
    ///
    /// Compilation happens under the write lock, so concurrent first requests
    /// for one key compile exactly once and nobody sees a partial entry.
    pub(crate) fn get_or_compile(&self, key: &K, compile: impl FnOnce(&K) -> V) -> Arc<V> {
        if let Some(v) = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
        {
            return Arc::clone(v);
        }

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(v) = entries.get(key) {
            return Arc::clone(v);
        }
        let v = Arc::new(compile(key));
        trace!("compiled {} procedure for {:?}", self.name, key);
        entries.insert(key.clone(), Arc::clone(&v));
        v
    }

    pub(crate) fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

static EVALUATION: OnceLock<ProcedureCache<PlanKey, EvaluationPlan>> = OnceLock::new();
static SUPPORT: OnceLock<ProcedureCache<SpecializationKey, SupportPlan>> = OnceLock::new();
static TRANSFORM: OnceLock<ProcedureCache<SpecializationKey, TransformPlan>> = OnceLock::new();

pub(crate) fn evaluation_plans() -> &'static ProcedureCache<PlanKey, EvaluationPlan> {
    EVALUATION.get_or_init(|| ProcedureCache::new("evaluation"))
}

pub(crate) fn support_plans() -> &'static ProcedureCache<SpecializationKey, SupportPlan> {
    SUPPORT.get_or_init(|| ProcedureCache::new("support"))
}

pub(crate) fn transform_plans() -> &'static ProcedureCache<SpecializationKey, TransformPlan> {
    TRANSFORM.get_or_init(|| ProcedureCache::new("transform"))
}

/// Number of distinct compiled procedures, per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    /// Point, derivative and basis evaluators.
    pub evaluators: usize,
    pub supports: usize,
    pub transforms: usize,
}

/// Reports how many procedures the process has compiled so far.
pub fn cached_procedures() -> CacheStats {
    CacheStats {
        evaluators: evaluation_plans().len(),
        supports: support_plans().len(),
        transforms: transform_plans().len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[test_log::test]
    fn test_compiles_once_per_key() {
        let cache: ProcedureCache<u32, String> = ProcedureCache::new("test");
        let calls = AtomicUsize::new(0);
        let compile = |k: &u32| {
            calls.fetch_add(1, Ordering::SeqCst);
            format!("plan {}", k)
        };

        let a = cache.get_or_compile(&1, compile);
        let b = cache.get_or_compile(&1, compile);
        let c = cache.get_or_compile(&2, compile);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(*c, "plan 2");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_concurrent_first_requests_share_one_entry() {
        let cache: ProcedureCache<&'static str, usize> = ProcedureCache::new("test");
        let calls = AtomicUsize::new(0);

        let results: Vec<Arc<usize>> = thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    s.spawn(|| {
                        cache.get_or_compile(&"shape", |_| {
                            calls.fetch_add(1, Ordering::SeqCst);
                            42
                        })
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
        assert!(results.iter().all(|r| Arc::ptr_eq(r, &results[0])));
    }
}
