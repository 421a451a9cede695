//! Contest records.
//!
//! Three durable record kinds (voter, entry, vote) plus the derived
//! leaderboard row. Entries and votes are create-only: once written they are
//! never edited or deleted, so every struct here is a plain snapshot with no
//! lifecycle flags.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered, opaque entry identifier. Allocated by the store; lower ids were
/// created earlier, which is what the leaderboard tie-break relies on.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EntryId(pub u64);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Ordered, opaque vote identifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct VoteId(pub u64);

/// An eligible participant. `identity` is the normalized (trimmed,
/// lower-cased) email and the primary key everywhere downstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voter {
    pub identity: String,
    pub display_name: String,
    pub registered_at: DateTime<Utc>,
}

/// A contest submission. At most one per owner identity, immutable once
/// created. `media_ref` is an opaque pointer into external photo storage;
/// this crate never reads the referenced bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    pub owner_identity: String,
    pub display_name: String,
    pub caption: Option<String>,
    pub media_ref: String,
    pub created_at: DateTime<Utc>,
}

/// Entry fields known before the store has allocated an id.
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub owner_identity: String,
    pub display_name: String,
    pub caption: Option<String>,
    pub media_ref: String,
    pub created_at: DateTime<Utc>,
}

/// One cast vote. `voter_identity` is unique across the whole ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub id: VoteId,
    pub voter_identity: String,
    pub target_entry_id: EntryId,
    pub cast_at: DateTime<Utc>,
}

/// Derived leaderboard row; recomputed on every read, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaderboardRow {
    pub entry: Entry,
    pub vote_count: u64,
}

/// Per-identity summary for the status endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VoterStatus {
    pub eligible: bool,
    pub has_voted: bool,
    pub has_submitted: bool,
}

/// One row of a bulk registry import.
#[derive(Debug, Clone, Deserialize)]
pub struct VoterImport {
    pub email: String,
    pub name: String,
}
