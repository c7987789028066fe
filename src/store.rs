use thiserror::Error;

use crate::profile::{ProfileField, ProfileId, ProfileRecord};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("stored profile {0} has an id outside the valid range")]
    BadProfileId(i64),
    #[error("profile {0} has no name to write")]
    MissingName(ProfileId),
    #[error("{0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistent home of the profile snapshot.
pub trait ProfileStore {
    fn find_all(&self) -> StoreResult<Vec<ProfileRecord>>;

    /// Run `f` in one unit of work. It commits only if `f` returns `Ok`;
    /// any error rolls back every write made through the writer.
    fn run_in_transaction<T, F>(&mut self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut dyn ProfileWriter) -> StoreResult<T>;
}

/// Writes available inside a transaction.
pub trait ProfileWriter {
    /// Insert each record, or on a `profile_id` conflict overwrite only
    /// `update_columns` of the existing row.
    fn bulk_upsert(
        &mut self,
        records: &[&ProfileRecord],
        update_columns: &[ProfileField],
    ) -> StoreResult<()>;

    fn delete_ids(&mut self, ids: &[ProfileId]) -> StoreResult<()>;
}
