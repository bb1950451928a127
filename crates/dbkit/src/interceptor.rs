//! Applies [`crate::feature::FeatureRegistry`] rules to a DML payload before
//! it reaches a builder (spec §4.4): soft-delete rewrite → optimistic-lock
//! mutation → timestamp injection → composer, for DML; soft-delete filtering
//! only for reads.

use crate::builder::{DeleteBuilder, UpdateBuilder};
use crate::client::Executor;
use crate::condition::Condition;
use crate::error::{DbError, DbResult};
use crate::feature::{FeatureRegistry, SoftDeleteKind};
use crate::record::Record;
use crate::value::Value;
use chrono::Utc;

/// Soft-delete read mode, set on a `QueryBuilder` (spec's `WithTrashed()`/
/// `OnlyTrashed()`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SoftDeleteMode {
    #[default]
    Default,
    WithTrashed,
    OnlyTrashed,
}

/// Append the soft-delete predicate for a SELECT, if the table is
/// soft-delete-configured and `mode` doesn't suppress it.
pub fn soft_delete_read_predicate(
    registry: &FeatureRegistry,
    table: &str,
    mode: SoftDeleteMode,
) -> Option<Condition> {
    if mode == SoftDeleteMode::WithTrashed {
        return None;
    }
    let config = registry.soft_delete_for(table)?;
    let absent = match config.kind {
        SoftDeleteKind::Timestamp => Condition::is_null(config.column.as_str()).ok()?,
        SoftDeleteKind::Boolean => Condition::eq(config.column.as_str(), 0i64).ok()?,
    };
    Some(if mode == SoftDeleteMode::OnlyTrashed { absent.not() } else { absent })
}

/// INSERT-time interceptor: auto timestamps + optimistic-lock seed version.
/// Explicit values the caller already set are never overwritten.
pub fn before_insert(registry: &FeatureRegistry, table: &str, record: &mut Record) {
    if let Some(ts) = registry.timestamps_for(table) {
        let now = Utc::now();
        if let Some(col) = &ts.created_column {
            if !record.has(col) {
                record.set(col.clone(), Value::Timestamp(now));
            }
        }
        if let Some(col) = &ts.updated_column {
            if !record.has(col) {
                record.set(col.clone(), Value::Timestamp(now));
            }
        }
    }
    if let Some(lock) = registry.optimistic_lock_for(table) {
        if !record.has(&lock.version_column) {
            record.set(lock.version_column, 1i64);
        }
    }
}

/// UPDATE-time interceptor, applied to an `UpdateBuilder` already seeded from
/// `record` (e.g. via `UpdateBuilder::from_record`). Order: optimistic-lock
/// mutation, then timestamp injection — soft-delete doesn't participate in a
/// plain `Update(Record)` call.
pub fn before_update(registry: &FeatureRegistry, table: &str, record: &Record, update: &mut UpdateBuilder) {
    if let Some(lock) = registry.optimistic_lock_for(table) {
        if let Some(version) = record.get(&lock.version_column) {
            update.replace_set_raw(&lock.version_column, format!("{} + 1", lock.version_column));
            if let Some(v) = version.as_i64() {
                let _ = update.and_eq(&lock.version_column, v);
            }
        }
    }
    if let Some(ts) = registry.timestamps_for(table) {
        if let Some(col) = &ts.updated_column {
            if !record.has(col) {
                update.set(col.clone(), Value::Timestamp(Utc::now()));
            }
        }
    }
}

/// Run after an UPDATE affected zero rows and the table has optimistic
/// locking configured: checks whether the row still exists (spec's "bounded
/// existence probe"). If it does, the zero-affected-rows outcome is a stale
/// version, not a missing row, so this returns `DbError::VersionMismatch`.
pub async fn verify_optimistic_lock(
    conn: &impl Executor,
    table: &str,
    pk_column: &str,
    pk_value: Value,
    expected_version: i64,
) -> DbResult<()> {
    let cond = Condition::eq(pk_column, pk_value)?;
    let mut probe = crate::sql::Sql::new(format!("SELECT 1 FROM {table}"));
    probe.push_where(Some(&cond), conn.dialect())?;
    let exists: bool = probe.exists(conn).await?;
    if exists {
        Err(DbError::VersionMismatch { table: table.to_string(), expected: expected_version })
    } else {
        Err(DbError::not_found(format!("no row in '{table}' matches the given primary key")))
    }
}

/// Outcome of `rewrite_delete_for_soft_delete`: a real `DELETE`, or an
/// `UPDATE` tombstoning the row in place.
pub enum DeleteOutcome {
    Delete(DeleteBuilder),
    Tombstone(UpdateBuilder),
}

/// DELETE-time interceptor (spec §4.4): by default, rewrite to an `UPDATE`
/// setting the tombstone column (and `updatedColumn`, if configured) rather
/// than emitting a real `DELETE`. `force` bypasses soft delete entirely.
pub fn rewrite_delete_for_soft_delete(
    registry: &FeatureRegistry,
    table: &str,
    delete: DeleteBuilder,
    force: bool,
) -> DbResult<DeleteOutcome> {
    if force {
        return Ok(DeleteOutcome::Delete(delete));
    }
    let Some(config) = registry.soft_delete_for(table) else {
        return Ok(DeleteOutcome::Delete(delete));
    };
    let table_name = delete.table_name().to_string();
    let where_cond = delete.into_where();
    let mut update = UpdateBuilder::new(table_name);
    match config.kind {
        SoftDeleteKind::Timestamp => update.set(config.column, Value::Timestamp(Utc::now())),
        SoftDeleteKind::Boolean => update.set(config.column, 1i64),
    };
    if let Some(ts) = registry.timestamps_for(table) {
        if let Some(col) = ts.updated_column {
            update.set(col, Value::Timestamp(Utc::now()));
        }
    }
    if let Some(cond) = where_cond {
        update.and(cond);
    } else {
        return Err(DbError::invalid_argument(
            "soft-delete rewrite refuses to tombstone an entire table without a WHERE clause",
        ));
    }
    Ok(DeleteOutcome::Tombstone(update))
}

/// `Restore()` (spec §4.4): clears the tombstone column for rows matching
/// `where_cond`. Fails with `SoftDeleteMissingConfig` if the table has no
/// soft-delete configuration registered.
pub fn restore_builder(
    registry: &FeatureRegistry,
    table: &str,
    where_cond: Option<Condition>,
) -> DbResult<UpdateBuilder> {
    let config = registry
        .soft_delete_for(table)
        .ok_or_else(|| DbError::SoftDeleteMissingConfig { table: table.to_string() })?;
    let mut update = UpdateBuilder::new(table);
    match config.kind {
        SoftDeleteKind::Timestamp => update.set(config.column, Value::Null),
        SoftDeleteKind::Boolean => update.set(config.column, 0i64),
    };
    if let Some(cond) = where_cond {
        update.and(cond);
    }
    Ok(update)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::{OptimisticLockConfig, SoftDeleteConfig, TimestampsConfig};

    #[test]
    fn insert_interceptor_seeds_version_and_timestamps() {
        let registry = FeatureRegistry::new();
        registry.register_timestamps(
            "docs",
            TimestampsConfig { created_column: Some("created_at".into()), updated_column: Some("updated_at".into()) },
        );
        registry.register_optimistic_lock("docs", OptimisticLockConfig { version_column: "version".into() });

        let mut record = Record::new();
        record.set("title", "hello");
        before_insert(&registry, "docs", &mut record);

        assert!(record.has("created_at"));
        assert!(record.has("updated_at"));
        assert_eq!(record.i64_at("version"), 1);
    }

    #[test]
    fn insert_interceptor_never_overwrites_explicit_value() {
        let registry = FeatureRegistry::new();
        registry.register_optimistic_lock("docs", OptimisticLockConfig { version_column: "version".into() });
        let mut record = Record::new();
        record.set("version", 7i64);
        before_insert(&registry, "docs", &mut record);
        assert_eq!(record.i64_at("version"), 7);
    }

    #[test]
    fn soft_delete_rewrite_produces_tombstone_update() {
        let registry = FeatureRegistry::new();
        registry.register_soft_delete(
            "docs",
            SoftDeleteConfig { column: "deleted_at".into(), kind: SoftDeleteKind::Timestamp },
        );
        let mut delete = DeleteBuilder::new("docs");
        delete.and_eq("id", 1i64).unwrap();
        let outcome = rewrite_delete_for_soft_delete(&registry, "docs", delete, false).unwrap();
        match outcome {
            DeleteOutcome::Tombstone(update) => {
                let sql = crate::builder::SqlBuilder::build_sql(&update);
                assert!(sql.starts_with("UPDATE docs SET deleted_at = ?"));
                assert!(sql.contains("WHERE id = ?"));
            }
            DeleteOutcome::Delete(_) => panic!("expected a tombstone rewrite"),
        }
    }

    #[test]
    fn force_delete_bypasses_soft_delete() {
        let registry = FeatureRegistry::new();
        registry.register_soft_delete(
            "docs",
            SoftDeleteConfig { column: "deleted_at".into(), kind: SoftDeleteKind::Timestamp },
        );
        let delete = DeleteBuilder::new("docs");
        let outcome = rewrite_delete_for_soft_delete(&registry, "docs", delete, true).unwrap();
        assert!(matches!(outcome, DeleteOutcome::Delete(_)));
    }

    #[test]
    fn restore_without_config_is_an_error() {
        let registry = FeatureRegistry::new();
        let result = restore_builder(&registry, "docs", None);
        assert!(result.is_err());
    }
}
