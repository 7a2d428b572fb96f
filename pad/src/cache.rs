//! Persistent benchmark-decision cache.
//!
//! Padding decisions are expensive to reach (they run real matmuls), so
//! they are cached on durable local storage keyed by everything that could
//! change the answer: operand shapes, strides and dtypes, the operator, the
//! tf32 flag for f32, and the force-pad override. Entries are never
//! invalidated; a changed key simply misses.
//!
//! The cache is an explicitly constructed object injected into the decision
//! routine. [`DecisionCache::shared`] hands out the process-wide durable
//! instance (sled refuses a second open of the same tree, so the handle is
//! opened lazily once and cloned); [`DecisionCache::in_memory`] keeps tests
//! hermetic.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::sync::Arc;

use zarya_ir::TensorDescriptor;

use crate::transform::MatmulKind;

#[derive(Debug, Clone)]
enum Store {
    Disk(sled::Db),
    Memory(Arc<Mutex<HashMap<String, bool>>>),
}

/// Key-value store of "should pad" decisions.
#[derive(Debug, Clone)]
pub struct DecisionCache {
    store: Store,
}

static SHARED_CACHE: Lazy<DecisionCache> = Lazy::new(DecisionCache::open_default);

impl DecisionCache {
    /// The process-wide durable cache, opened on first use.
    pub fn shared() -> Self {
        SHARED_CACHE.clone()
    }

    /// Open the durable on-disk cache, degrading to a process-local
    /// in-memory map when the cache directory is unavailable.
    pub fn open_default() -> Self {
        match open_disk() {
            Some(db) => Self { store: Store::Disk(db) },
            None => {
                tracing::warn!("pad decision cache directory unavailable, falling back to in-memory");
                Self::in_memory()
            }
        }
    }

    /// Fresh in-memory cache (tests, or environments without a cache dir).
    pub fn in_memory() -> Self {
        Self { store: Store::Memory(Arc::new(Mutex::new(HashMap::new()))) }
    }

    pub fn lookup(&self, key: &str) -> Option<bool> {
        match &self.store {
            Store::Disk(db) => match db.get(key.as_bytes()) {
                Ok(value) => value.map(|bytes| bytes.first().copied() == Some(1)),
                Err(error) => {
                    tracing::warn!(%error, "pad decision cache lookup failed");
                    None
                }
            },
            Store::Memory(map) => map.lock().get(key).copied(),
        }
    }

    pub fn store(&self, key: &str, decision: bool) {
        match &self.store {
            Store::Disk(db) => {
                if let Err(error) = db.insert(key.as_bytes(), &[decision as u8][..]) {
                    tracing::warn!(%error, "pad decision cache store failed");
                }
            }
            Store::Memory(map) => {
                map.lock().insert(key.to_string(), decision);
            }
        }
    }
}

fn open_disk() -> Option<sled::Db> {
    let cache_dir = dirs::cache_dir()?.join("zarya");
    std::fs::create_dir_all(&cache_dir).ok()?;
    sled::open(cache_dir.join("pad_decisions")).ok()
}

/// Canonical cache key for one padding decision.
///
/// The tf32 component is `None` unless the operands are f32: the flag can
/// only change the answer on the single-precision tensor-core path.
pub fn decision_key(
    kind: MatmulKind,
    mat1: &TensorDescriptor,
    mat2: &TensorDescriptor,
    input: Option<&TensorDescriptor>,
    tf32: Option<bool>,
    force_shape_pad: bool,
) -> String {
    fn tensor_key(desc: &TensorDescriptor) -> String {
        format!("({:?},{:?},{})", desc.shape, desc.stride, desc.dtype)
    }

    format!(
        "{}|{}|{}|{}|tf32={:?}|force={}",
        kind,
        tensor_key(mat1),
        tensor_key(mat2),
        input.map_or_else(|| "none".to_string(), tensor_key),
        tf32,
        force_shape_pad,
    )
}
