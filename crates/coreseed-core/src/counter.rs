//! キーごとの累積カウンタ

use std::collections::HashMap;
use std::hash::Hash;

/// 累積カウンタ
///
/// 加算のみで減算はない。値は単調非減少。
#[derive(Debug, Clone)]
pub struct CountMap<K> {
    counts: HashMap<K, u64>,
}

impl<K: Eq + Hash> Default for CountMap<K> {
    fn default() -> Self {
        Self {
            counts: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash> CountMap<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// `key` のカウントに `n` を加え、加算後の値を返す
    pub fn count(&mut self, key: K, n: u64) -> u64 {
        let slot = self.counts.entry(key).or_insert(0);
        *slot = slot.saturating_add(n);
        *slot
    }

    /// 未登録のキーは 0
    pub fn get(&self, key: &K) -> u64 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    /// カウント済みのキーの数
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}
