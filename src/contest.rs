//! Contest operations.
//!
//! The service orchestrates the eligibility gate, the conditional inserts,
//! and the leaderboard aggregation. It holds no state of its own beyond the
//! injected store handle; concurrency safety comes entirely from the store's
//! atomic conditional inserts, so there is deliberately no "already voted?"
//! pre-check anywhere in this module.

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::ContestError;
use crate::identity::normalize_email;
use crate::model::{
    Entry, EntryId, LeaderboardRow, NewEntry, VoterImport, VoterStatus, Vote,
};
use crate::store::{ContestStore, EntryInsert, VoteInsert};

#[derive(Clone)]
pub struct Contest {
    store: Arc<dyn ContestStore>,
}

impl Contest {
    pub fn new(store: Arc<dyn ContestStore>) -> Self {
        Self { store }
    }

    /// Bulk registry upsert. Rows whose email does not normalize are skipped;
    /// returns the number of rows applied. Re-importing an identity updates
    /// its display name without touching any existing entry or vote.
    pub async fn import_voters(&self, rows: &[VoterImport]) -> Result<usize, ContestError> {
        let mut applied = 0;
        for row in rows {
            let Some(identity) = normalize_email(&row.email) else {
                debug!("skipping import row with bad email: {:?}", row.email);
                continue;
            };
            self.store
                .upsert_voter(&identity, row.name.trim(), Utc::now())
                .await?;
            applied += 1;
        }
        info!("imported/updated {applied} voters");
        Ok(applied)
    }

    /// Submit the owner's single entry. The duplicate check happens inside
    /// the store insert, so two simultaneous submissions from one owner
    /// yield exactly one entry.
    pub async fn submit_entry(
        &self,
        raw_email: &str,
        display_name: &str,
        caption: Option<String>,
        media_ref: String,
    ) -> Result<Entry, ContestError> {
        let identity = self.eligible_identity(raw_email).await?;

        let outcome = self
            .store
            .insert_entry(NewEntry {
                owner_identity: identity.clone(),
                display_name: display_name.trim().to_string(),
                caption: caption.map(|c| c.trim().to_string()).filter(|c| !c.is_empty()),
                media_ref,
                created_at: Utc::now(),
            })
            .await?;

        match outcome {
            EntryInsert::Created(entry) => {
                info!("entry {} submitted by {identity}", entry.id);
                Ok(entry)
            }
            EntryInsert::DuplicateOwner => Err(ContestError::DuplicateSubmission),
        }
    }

    pub async fn list_entries(&self) -> Result<Vec<Entry>, ContestError> {
        Ok(self.store.list_entries().await?)
    }

    /// Cast this identity's single vote. Target existence and vote
    /// uniqueness are checked inside one atomic store step; of N concurrent
    /// casts for the same identity exactly one returns a vote and the rest
    /// get [`ContestError::AlreadyVoted`].
    pub async fn cast_vote(
        &self,
        raw_email: &str,
        target: EntryId,
    ) -> Result<Vote, ContestError> {
        let identity = self.eligible_identity(raw_email).await?;

        let outcome = self.store.insert_vote(&identity, target, Utc::now()).await?;
        match outcome {
            VoteInsert::Created(vote) => {
                info!("vote cast by {identity} for entry {target}");
                Ok(vote)
            }
            VoteInsert::MissingTarget => Err(ContestError::ContestantNotFound),
            VoteInsert::AlreadyVoted => Err(ContestError::AlreadyVoted),
        }
    }

    /// Full standings, recomputed from the ledger on every call. Ordering is
    /// a deterministic total order: vote count descending, then entry id
    /// ascending among ties. `limit` truncates to the top N rows.
    pub async fn leaderboard(
        &self,
        limit: Option<usize>,
    ) -> Result<Vec<LeaderboardRow>, ContestError> {
        let entries = self.store.list_entries().await?;
        let counts = self.store.votes_by_entry().await?;

        let mut rows: Vec<LeaderboardRow> = entries
            .into_iter()
            .map(|entry| {
                let vote_count = counts.get(&entry.id).copied().unwrap_or(0);
                LeaderboardRow { entry, vote_count }
            })
            .collect();
        rows.sort_by(|a, b| {
            b.vote_count
                .cmp(&a.vote_count)
                .then(a.entry.id.cmp(&b.entry.id))
        });

        if let Some(limit) = limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    pub async fn voter_status(&self, raw_email: &str) -> Result<VoterStatus, ContestError> {
        let identity = normalize_email(raw_email).ok_or(ContestError::InvalidEmail)?;
        Ok(VoterStatus {
            eligible: self.store.lookup_voter(&identity).await?.is_some(),
            has_voted: self.store.has_voted(&identity).await?,
            has_submitted: self.store.has_submitted(&identity).await?,
        })
    }

    /// Registry gate shared by the two write paths: normalize first, then
    /// require membership at the moment of the operation.
    async fn eligible_identity(&self, raw_email: &str) -> Result<String, ContestError> {
        let identity = normalize_email(raw_email).ok_or(ContestError::InvalidEmail)?;
        if self.store.lookup_voter(&identity).await?.is_none() {
            return Err(ContestError::UnauthorizedVoter);
        }
        Ok(identity)
    }
}
