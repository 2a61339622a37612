//! `PostgreSQL` adapters for task record persistence.

mod models;
mod schema;
mod store;

#[cfg(test)]
pub(crate) use models::{
    TaskMetadataRow, TaskRow, metadata_row_to_domain, new_record_rows, row_to_record,
};
pub use store::{PostgresTaskStore, TaskPgPool};
