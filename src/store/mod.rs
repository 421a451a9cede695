//! Storage layer.
//!
//! All contest state lives behind the [`ContestStore`] trait so the core
//! logic never touches a connection directly and can be exercised against
//! the in-memory implementation in tests.
//!
//! The uniqueness invariants (one entry per owner, one vote per voter) are
//! enforced *here*, as single-step conditional inserts, never by a separate
//! check followed by a write. Checking "already voted?" and then inserting
//! in two round trips leaves a window where two racing callers both pass the
//! check; the conditional-insert outcome from the store is the authoritative
//! signal for "duplicate".

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use thiserror::Error;

use crate::model::{Entry, EntryId, NewEntry, Vote, Voter};

mod memory;
mod redis_store;

pub use memory::MemoryStore;
pub use redis_store::RedisStore;

/// Transient storage failure, unrelated to the contest invariants. Callers
/// must surface it as-is, never reinterpret it as "already voted" or as
/// success.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("redis: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("corrupt stored record: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Outcome of the conditional entry insert.
#[derive(Debug)]
pub enum EntryInsert {
    Created(Entry),
    /// The owner identity already holds an entry; nothing was written.
    DuplicateOwner,
}

/// Outcome of the conditional vote insert.
#[derive(Debug)]
pub enum VoteInsert {
    Created(Vote),
    /// A vote for this identity already exists; nothing was written.
    AlreadyVoted,
    /// The target entry id does not exist; nothing was written.
    MissingTarget,
}

/// Repository contract for the three durable relations.
///
/// Mutations are all-or-nothing: a cancelled or failed call never leaves a
/// partially written record.
#[async_trait]
pub trait ContestStore: Send + Sync {
    /// Idempotent upsert keyed by normalized email. Re-importing an existing
    /// identity updates the display name but keeps the original
    /// `registered_at` and leaves any entry or vote for that identity alone.
    async fn upsert_voter(
        &self,
        identity: &str,
        display_name: &str,
        registered_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    async fn lookup_voter(&self, identity: &str) -> Result<Option<Voter>, StoreError>;

    /// Insert an entry unless the owner already holds one. Allocates the
    /// entry id; existence check and insert are one atomic step.
    async fn insert_entry(&self, new: NewEntry) -> Result<EntryInsert, StoreError>;

    /// All entries in creation order (id ascending). Fresh read per call.
    async fn list_entries(&self) -> Result<Vec<Entry>, StoreError>;

    /// Insert a vote unless one exists for this identity or the target is
    /// missing. Both checks and the insert are one atomic step: of any
    /// number of concurrent calls for the same identity, exactly one
    /// observes `Created`.
    async fn insert_vote(
        &self,
        voter_identity: &str,
        target: EntryId,
        cast_at: DateTime<Utc>,
    ) -> Result<VoteInsert, StoreError>;

    /// Vote tally per entry id, from the current committed ledger. Entries
    /// with no votes are simply absent from the map.
    async fn votes_by_entry(&self) -> Result<HashMap<EntryId, u64>, StoreError>;

    async fn has_voted(&self, identity: &str) -> Result<bool, StoreError>;

    async fn has_submitted(&self, identity: &str) -> Result<bool, StoreError>;
}
