//! `Record`: an ordered, variant-valued attribute container for one row or
//! one DML payload (spec §3).

use crate::value::Value;
use std::collections::HashMap;

/// Ordered mapping from column name to [`Value`].
///
/// Insertion order is preserved so a `Record` handed to `INSERT` produces a
/// stable column list (§3 invariant). Lookup is case-insensitive (to stay
/// compatible with dialects that fold identifiers, e.g. Oracle uppercasing —
/// §9) but the stored key retains whatever case the caller used.
///
/// A `Record` is built by its owner and consumed by a single DML/read call;
/// it carries no interior mutability and is not meant to be shared across
/// threads without external synchronization (matching the teacher's builder
/// types, which are likewise single-owner, non-`Clone` accumulators).
#[derive(Debug, Clone, Default)]
pub struct Record {
    // Keeping both a Vec (for order) and an index (for O(1) case-insensitive
    // lookup) costs a little memory but every accessor in §4.3 is a hot path
    // for row materialization.
    entries: Vec<(String, Value)>,
    index: HashMap<String, usize>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    fn norm(key: &str) -> String {
        key.to_ascii_lowercase()
    }

    /// Insert or overwrite a column. Preserves original insertion position on
    /// overwrite (consistent with how the teacher's builders accumulate SET
    /// fields: a repeated `.set()` for the same column is clobber, not append).
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        let key = key.into();
        let norm = Self::norm(&key);
        let value = value.into();
        if let Some(&idx) = self.index.get(&norm) {
            self.entries[idx].1 = value;
        } else {
            self.index.insert(norm, self.entries.len());
            self.entries.push((key, value));
        }
        self
    }

    /// Presence probe: distinguishes "missing" from "null/zero" (§4.3).
    pub fn has(&self, key: &str) -> bool {
        self.index.contains_key(&Self::norm(key))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.index.get(&Self::norm(key)).map(|&i| &self.entries[i].1)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let norm = Self::norm(key);
        let idx = self.index.remove(&norm)?;
        let (_, value) = self.entries.remove(idx);
        // Re-index everything after the removed slot.
        for v in self.index.values_mut() {
            if *v > idx {
                *v -= 1;
            }
        }
        Some(value)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Column names in insertion order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    // ==================== Typed accessors (best-effort coercion, never panic) ====================

    pub fn str_at(&self, key: &str) -> String {
        self.get(key).and_then(Value::as_str).map(str::to_string).unwrap_or_default()
    }

    pub fn i64_at(&self, key: &str) -> i64 {
        self.get(key).and_then(Value::as_i64).unwrap_or_default()
    }

    pub fn f64_at(&self, key: &str) -> f64 {
        self.get(key).and_then(Value::as_f64).unwrap_or_default()
    }

    pub fn bool_at(&self, key: &str) -> bool {
        self.get(key).and_then(Value::as_bool).unwrap_or_default()
    }

    pub fn bytes_at(&self, key: &str) -> Vec<u8> {
        self.get(key).and_then(Value::as_bytes).map(|b| b.to_vec()).unwrap_or_default()
    }

    pub fn timestamp_at(&self, key: &str) -> Option<chrono::DateTime<chrono::Utc>> {
        self.get(key).and_then(Value::as_timestamp)
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut rec = Record::new();
        for (k, v) in iter {
            rec.set(k, v);
        }
        rec
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_insertion_order() {
        let mut r = Record::new();
        r.set("b", 1i64).set("a", 2i64).set("c", 3i64);
        assert_eq!(r.columns().collect::<Vec<_>>(), vec!["b", "a", "c"]);
    }

    #[test]
    fn case_insensitive_lookup_preserves_original_case() {
        let mut r = Record::new();
        r.set("UserName", "alice");
        assert_eq!(r.str_at("username"), "alice");
        assert_eq!(r.columns().next(), Some("UserName"));
    }

    #[test]
    fn overwrite_keeps_position() {
        let mut r = Record::new();
        r.set("a", 1i64).set("b", 2i64).set("a", 9i64);
        assert_eq!(r.columns().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(r.i64_at("a"), 9);
    }

    #[test]
    fn has_distinguishes_missing_from_null() {
        let mut r = Record::new();
        r.set("a", Value::Null);
        assert!(r.has("a"));
        assert!(!r.has("b"));
        assert_eq!(r.i64_at("b"), 0);
    }
}
