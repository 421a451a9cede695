//! Redis store.
//!
//! Layout (all under the `contest:` prefix):
//! - `contest:voters` — hash, identity -> voter JSON
//! - `contest:entries` — hash, entry id -> entry JSON
//! - `contest:entry_owners` — hash, owner identity -> entry id
//! - `contest:votes` — hash, voter identity -> vote JSON
//! - `contest:next_entry_id` / `contest:next_vote_id` — counters
//!
//! The conditional inserts run as server-side scripts, so the uniqueness
//! check and the write commit as one step. Two callers racing on the same
//! identity therefore serialize inside Redis: one script call writes, the
//! other observes the existing field and writes nothing. Id allocation
//! happens before the script with a plain `INCR`; a loser's id is simply a
//! gap, which is fine because ids are opaque.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::{AsyncCommands, Client, Script};
use std::collections::HashMap;
use std::time::Duration;

use crate::model::{Entry, EntryId, NewEntry, Vote, VoteId, Voter};

use super::{ContestStore, EntryInsert, StoreError, VoteInsert};

const VOTERS_KEY: &str = "contest:voters";
const ENTRIES_KEY: &str = "contest:entries";
const ENTRY_OWNERS_KEY: &str = "contest:entry_owners";
const VOTES_KEY: &str = "contest:votes";
const NEXT_ENTRY_ID_KEY: &str = "contest:next_entry_id";
const NEXT_VOTE_ID_KEY: &str = "contest:next_vote_id";

// KEYS[1] = entry_owners, KEYS[2] = entries
// ARGV[1] = owner identity, ARGV[2] = entry id, ARGV[3] = entry JSON
const SUBMIT_SCRIPT: &str = r#"
if redis.call('HEXISTS', KEYS[1], ARGV[1]) == 1 then
    return 0
end
redis.call('HSET', KEYS[1], ARGV[1], ARGV[2])
redis.call('HSET', KEYS[2], ARGV[2], ARGV[3])
return 1
"#;

// KEYS[1] = votes, KEYS[2] = entries
// ARGV[1] = voter identity, ARGV[2] = target entry id, ARGV[3] = vote JSON
const CAST_SCRIPT: &str = r#"
if redis.call('HEXISTS', KEYS[2], ARGV[2]) == 0 then
    return -1
end
if redis.call('HEXISTS', KEYS[1], ARGV[1]) == 1 then
    return 0
end
redis.call('HSET', KEYS[1], ARGV[1], ARGV[3])
return 1
"#;

pub struct RedisStore {
    manager: ConnectionManager,
    submit_script: Script,
    cast_script: Script,
}

impl RedisStore {
    pub async fn connect(redis_url: &str) -> Result<Self, StoreError> {
        let config = ConnectionManagerConfig::new()
            .set_number_of_retries(1)
            .set_connection_timeout(Duration::from_millis(100));

        let client = Client::open(redis_url)?;
        let manager = client.get_connection_manager_with_config(config).await?;

        Ok(Self {
            manager,
            submit_script: Script::new(SUBMIT_SCRIPT),
            cast_script: Script::new(CAST_SCRIPT),
        })
    }

    fn conn(&self) -> ConnectionManager {
        self.manager.clone()
    }
}

#[async_trait]
impl ContestStore for RedisStore {
    async fn upsert_voter(
        &self,
        identity: &str,
        display_name: &str,
        registered_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut conn = self.conn();

        // Not a uniqueness invariant: last write wins on the display name,
        // and `registered_at` sticks to the first import.
        let existing: Option<String> = conn.hget(VOTERS_KEY, identity).await?;
        let voter = match existing {
            Some(raw) => {
                let mut voter: Voter = serde_json::from_str(&raw)?;
                voter.display_name = display_name.to_string();
                voter
            }
            None => Voter {
                identity: identity.to_string(),
                display_name: display_name.to_string(),
                registered_at,
            },
        };

        let raw = serde_json::to_string(&voter)?;
        let _: () = conn.hset(VOTERS_KEY, identity, raw).await?;
        Ok(())
    }

    async fn lookup_voter(&self, identity: &str) -> Result<Option<Voter>, StoreError> {
        let mut conn = self.conn();
        let raw: Option<String> = conn.hget(VOTERS_KEY, identity).await?;
        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn insert_entry(&self, new: NewEntry) -> Result<EntryInsert, StoreError> {
        let mut conn = self.conn();
        let id: u64 = conn.incr(NEXT_ENTRY_ID_KEY, 1u64).await?;

        let entry = Entry {
            id: EntryId(id),
            owner_identity: new.owner_identity,
            display_name: new.display_name,
            caption: new.caption,
            media_ref: new.media_ref,
            created_at: new.created_at,
        };
        let raw = serde_json::to_string(&entry)?;

        let committed: i64 = self
            .submit_script
            .key(ENTRY_OWNERS_KEY)
            .key(ENTRIES_KEY)
            .arg(&entry.owner_identity)
            .arg(id)
            .arg(raw)
            .invoke_async(&mut conn)
            .await?;

        if committed == 1 {
            Ok(EntryInsert::Created(entry))
        } else {
            Ok(EntryInsert::DuplicateOwner)
        }
    }

    async fn list_entries(&self) -> Result<Vec<Entry>, StoreError> {
        let mut conn = self.conn();
        let raw: Vec<String> = conn.hvals(ENTRIES_KEY).await?;
        let mut entries = raw
            .iter()
            .map(|raw| serde_json::from_str::<Entry>(raw))
            .collect::<Result<Vec<_>, _>>()?;
        entries.sort_by_key(|entry| entry.id);
        Ok(entries)
    }

    async fn insert_vote(
        &self,
        voter_identity: &str,
        target: EntryId,
        cast_at: DateTime<Utc>,
    ) -> Result<VoteInsert, StoreError> {
        let mut conn = self.conn();
        let id: u64 = conn.incr(NEXT_VOTE_ID_KEY, 1u64).await?;

        let vote = Vote {
            id: VoteId(id),
            voter_identity: voter_identity.to_string(),
            target_entry_id: target,
            cast_at,
        };
        let raw = serde_json::to_string(&vote)?;

        let committed: i64 = self
            .cast_script
            .key(VOTES_KEY)
            .key(ENTRIES_KEY)
            .arg(voter_identity)
            .arg(target.0)
            .arg(raw)
            .invoke_async(&mut conn)
            .await?;

        match committed {
            1 => Ok(VoteInsert::Created(vote)),
            -1 => Ok(VoteInsert::MissingTarget),
            _ => Ok(VoteInsert::AlreadyVoted),
        }
    }

    async fn votes_by_entry(&self) -> Result<HashMap<EntryId, u64>, StoreError> {
        let mut conn = self.conn();
        let raw: Vec<String> = conn.hvals(VOTES_KEY).await?;
        let mut counts: HashMap<EntryId, u64> = HashMap::new();
        for raw in &raw {
            let vote: Vote = serde_json::from_str(raw)?;
            *counts.entry(vote.target_entry_id).or_default() += 1;
        }
        Ok(counts)
    }

    async fn has_voted(&self, identity: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn();
        Ok(conn.hexists(VOTES_KEY, identity).await?)
    }

    async fn has_submitted(&self, identity: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn();
        Ok(conn.hexists(ENTRY_OWNERS_KEY, identity).await?)
    }
}
