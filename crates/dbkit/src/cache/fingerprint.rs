//! Deterministic cache key: SHA-256 over composed SQL, each bound arg's
//! canonical string, and a scope tag (spec.md §4.5 — "two textually
//! identical queries with identical args must produce the same fingerprint
//! across processes").

use crate::value::Value;
use sha2::{Digest, Sha256};

pub fn fingerprint(scope_tag: &str, sql: &str, args: &[Value]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(scope_tag.as_bytes());
    hasher.update([0u8]);
    hasher.update(sql.as_bytes());
    for arg in args {
        hasher.update([0u8]);
        hasher.update(arg.canonical_string().as_bytes());
    }
    hex_encode(&hasher.finalize())
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        write!(out, "{b:02x}").unwrap();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_inputs_produce_identical_fingerprints() {
        let a = fingerprint("db1", "SELECT * FROM t WHERE id = ?", &[Value::I64(5)]);
        let b = fingerprint("db1", "SELECT * FROM t WHERE id = ?", &[Value::I64(5)]);
        assert_eq!(a, b);
    }

    #[test]
    fn different_args_produce_different_fingerprints() {
        let a = fingerprint("db1", "SELECT * FROM t WHERE id = ?", &[Value::I64(5)]);
        let b = fingerprint("db1", "SELECT * FROM t WHERE id = ?", &[Value::I64(6)]);
        assert_ne!(a, b);
    }

    #[test]
    fn different_scope_tag_produces_different_fingerprint() {
        let a = fingerprint("db1", "SELECT 1", &[]);
        let b = fingerprint("db2", "SELECT 1", &[]);
        assert_ne!(a, b);
    }
}
