//! Bounded cache storage with insertion-order eviction.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use image::RgbaImage;

use photomark_compositor::RenderOutput;

/// A cached render: the encoded blob and the surface shown on screen. The
/// surface is the blob decoded, whichever renderer produced it.
#[derive(Debug, Clone)]
pub struct PreviewOutput {
    pub bytes: Arc<[u8]>,
    pub surface: Arc<RgbaImage>,
}

impl From<RenderOutput> for PreviewOutput {
    fn from(out: RenderOutput) -> Self {
        Self {
            bytes: out.bytes.into(),
            surface: out.surface,
        }
    }
}

/// Map plus insertion order. `get`, `put` and `evict` are the only ways
/// entries change; beyond `max_size` the oldest insertion is dropped.
#[derive(Debug)]
pub struct CacheState {
    entries: HashMap<String, PreviewOutput>,
    order: VecDeque<String>,
    max_size: usize,
}

impl CacheState {
    /// A capacity of zero is treated as one.
    pub fn new(max_size: usize) -> Self {
        let max_size = max_size.max(1);
        Self {
            entries: HashMap::with_capacity(max_size),
            order: VecDeque::with_capacity(max_size),
            max_size,
        }
    }

    pub fn get(&self, key: &str) -> Option<&PreviewOutput> {
        self.entries.get(key)
    }

    /// Insert or replace `key`, returning the keys evicted to make room.
    ///
    /// Replacing an existing key counts as a fresh insertion.
    pub fn put(&mut self, key: String, value: PreviewOutput) -> Vec<String> {
        if self.entries.insert(key.clone(), value).is_some() {
            self.order.retain(|k| k != &key);
        }
        self.order.push_back(key);

        let mut evicted = Vec::new();
        while self.order.len() > self.max_size {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
                evicted.push(oldest);
            }
        }
        evicted
    }

    pub fn evict(&mut self, key: &str) -> Option<PreviewOutput> {
        let removed = self.entries.remove(key)?;
        self.order.retain(|k| k != key);
        Some(removed)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Keys from oldest to newest insertion.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }
}
