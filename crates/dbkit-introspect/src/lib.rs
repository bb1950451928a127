//! dbkit-introspect
//!
//! The codegen bridge: given an open connection, report a table's live
//! column shape from the database's own catalog. A code generator (or a
//! startup-time sanity check) builds on top of [`SchemaIntrospector`] instead
//! of hardcoding a schema snapshot.

pub mod schema_introspect;

pub use schema_introspect::{
    ColumnInfo, DbSchema, PostgresIntrospector, RelationKind, SchemaIntrospector, TableInfo,
    load_schema_from_db,
};
