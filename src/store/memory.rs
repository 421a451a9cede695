//! In-memory store.
//!
//! All tables sit behind one mutex, so every conditional insert is trivially
//! a single atomic unit. Used by unit and concurrency tests; also handy for
//! running the server without Redis.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use crate::model::{Entry, EntryId, NewEntry, Vote, VoteId, Voter};

use super::{ContestStore, EntryInsert, StoreError, VoteInsert};

#[derive(Default)]
struct Tables {
    voters: BTreeMap<String, Voter>,
    entries: BTreeMap<EntryId, Entry>,
    entry_owners: BTreeMap<String, EntryId>,
    votes: BTreeMap<String, Vote>,
    next_entry_id: u64,
    next_vote_id: u64,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().expect("store mutex poisoned")
    }
}

#[async_trait]
impl ContestStore for MemoryStore {
    async fn upsert_voter(
        &self,
        identity: &str,
        display_name: &str,
        registered_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut tables = self.lock();
        tables
            .voters
            .entry(identity.to_string())
            .and_modify(|voter| voter.display_name = display_name.to_string())
            .or_insert_with(|| Voter {
                identity: identity.to_string(),
                display_name: display_name.to_string(),
                registered_at,
            });
        Ok(())
    }

    async fn lookup_voter(&self, identity: &str) -> Result<Option<Voter>, StoreError> {
        Ok(self.lock().voters.get(identity).cloned())
    }

    async fn insert_entry(&self, new: NewEntry) -> Result<EntryInsert, StoreError> {
        let mut tables = self.lock();
        if tables.entry_owners.contains_key(&new.owner_identity) {
            return Ok(EntryInsert::DuplicateOwner);
        }
        tables.next_entry_id += 1;
        let id = EntryId(tables.next_entry_id);
        let entry = Entry {
            id,
            owner_identity: new.owner_identity.clone(),
            display_name: new.display_name,
            caption: new.caption,
            media_ref: new.media_ref,
            created_at: new.created_at,
        };
        tables.entry_owners.insert(new.owner_identity, id);
        tables.entries.insert(id, entry.clone());
        Ok(EntryInsert::Created(entry))
    }

    async fn list_entries(&self) -> Result<Vec<Entry>, StoreError> {
        // BTreeMap iteration gives id-ascending order.
        Ok(self.lock().entries.values().cloned().collect())
    }

    async fn insert_vote(
        &self,
        voter_identity: &str,
        target: EntryId,
        cast_at: DateTime<Utc>,
    ) -> Result<VoteInsert, StoreError> {
        let mut tables = self.lock();
        if !tables.entries.contains_key(&target) {
            return Ok(VoteInsert::MissingTarget);
        }
        if tables.votes.contains_key(voter_identity) {
            return Ok(VoteInsert::AlreadyVoted);
        }
        tables.next_vote_id += 1;
        let vote = Vote {
            id: VoteId(tables.next_vote_id),
            voter_identity: voter_identity.to_string(),
            target_entry_id: target,
            cast_at,
        };
        tables.votes.insert(voter_identity.to_string(), vote.clone());
        Ok(VoteInsert::Created(vote))
    }

    async fn votes_by_entry(&self) -> Result<HashMap<EntryId, u64>, StoreError> {
        let tables = self.lock();
        let mut counts: HashMap<EntryId, u64> = HashMap::new();
        for vote in tables.votes.values() {
            *counts.entry(vote.target_entry_id).or_default() += 1;
        }
        Ok(counts)
    }

    async fn has_voted(&self, identity: &str) -> Result<bool, StoreError> {
        Ok(self.lock().votes.contains_key(identity))
    }

    async fn has_submitted(&self, identity: &str) -> Result<bool, StoreError> {
        Ok(self.lock().entry_owners.contains_key(identity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn new_entry(owner: &str) -> NewEntry {
        NewEntry {
            owner_identity: owner.to_string(),
            display_name: "Owner".to_string(),
            caption: None,
            media_ref: "uploads/1.jpg".to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn second_entry_for_same_owner_is_rejected() {
        let store = MemoryStore::new();
        let first = store.insert_entry(new_entry("a@x.com")).await.unwrap();
        assert!(matches!(first, EntryInsert::Created(_)));

        let second = store.insert_entry(new_entry("a@x.com")).await.unwrap();
        assert!(matches!(second, EntryInsert::DuplicateOwner));
        assert_eq!(store.list_entries().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn vote_insert_checks_target_before_uniqueness() {
        let store = MemoryStore::new();
        let EntryInsert::Created(entry) = store.insert_entry(new_entry("a@x.com")).await.unwrap()
        else {
            panic!("first insert must succeed");
        };

        let vote = store
            .insert_vote("b@x.com", entry.id, Utc::now())
            .await
            .unwrap();
        assert!(matches!(vote, VoteInsert::Created(_)));

        // Missing target reported even for a voter who already voted.
        let missing = store
            .insert_vote("b@x.com", EntryId(9999), Utc::now())
            .await
            .unwrap();
        assert!(matches!(missing, VoteInsert::MissingTarget));

        let dup = store
            .insert_vote("b@x.com", entry.id, Utc::now())
            .await
            .unwrap();
        assert!(matches!(dup, VoteInsert::AlreadyVoted));
    }

    #[tokio::test]
    async fn reimport_keeps_registered_at() {
        let store = MemoryStore::new();
        let t0 = Utc::now();
        store.upsert_voter("a@x.com", "Alice", t0).await.unwrap();
        store
            .upsert_voter("a@x.com", "Alice A.", Utc::now())
            .await
            .unwrap();

        let voter = store.lookup_voter("a@x.com").await.unwrap().unwrap();
        assert_eq!(voter.display_name, "Alice A.");
        assert_eq!(voter.registered_at, t0);
    }
}
