//! Race tests for the one-vote-per-voter and one-entry-per-owner invariants.
//!
//! Each test fires many simultaneous operations for the *same* identity
//! (double-clicks, retried requests) against the in-memory store, which
//! implements the same conditional-insert contract as the Redis store, and
//! checks that exactly one attempt commits.

use std::sync::Arc;

use futures::future::join_all;
use photovote::contest::Contest;
use photovote::error::ContestError;
use photovote::model::{EntryId, VoterImport};
use photovote::store::MemoryStore;

async fn contest_with_voters(emails: &[&str]) -> Contest {
    let contest = Contest::new(Arc::new(MemoryStore::new()));
    let rows: Vec<VoterImport> = emails
        .iter()
        .map(|email| VoterImport {
            email: email.to_string(),
            name: email.to_string(),
        })
        .collect();
    contest.import_voters(&rows).await.unwrap();
    contest
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_casts_for_one_voter_commit_exactly_once() {
    let contest = contest_with_voters(&["a@x.com", "c1@x.com", "c2@x.com"]).await;
    let c1 = contest
        .submit_entry("c1@x.com", "C1", None, "uploads/c1.jpg".to_string())
        .await
        .unwrap();
    let c2 = contest
        .submit_entry("c2@x.com", "C2", None, "uploads/c2.jpg".to_string())
        .await
        .unwrap();

    // Same voter, mixed (valid) targets, all at once.
    let attempts = 16;
    let tasks: Vec<_> = (0..attempts)
        .map(|i| {
            let contest = contest.clone();
            let target = if i % 2 == 0 { c1.id } else { c2.id };
            tokio::spawn(async move { contest.cast_vote("a@x.com", target).await })
        })
        .collect();

    let mut successes = 0;
    let mut already_voted = 0;
    for result in join_all(tasks).await {
        match result.unwrap() {
            Ok(_) => successes += 1,
            Err(ContestError::AlreadyVoted) => already_voted += 1,
            Err(other) => panic!("unexpected outcome: {other}"),
        }
    }
    assert_eq!(successes, 1);
    assert_eq!(already_voted, attempts - 1);

    // The ledger holds exactly one vote for the identity.
    let rows = contest.leaderboard(None).await.unwrap();
    let total: u64 = rows.iter().map(|row| row.vote_count).sum();
    assert_eq!(total, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_submissions_for_one_owner_commit_exactly_once() {
    let contest = contest_with_voters(&["b@x.com"]).await;

    let attempts = 8;
    let tasks: Vec<_> = (0..attempts)
        .map(|i| {
            let contest = contest.clone();
            tokio::spawn(async move {
                contest
                    .submit_entry("b@x.com", "Bob", None, format!("uploads/{i}.jpg"))
                    .await
            })
        })
        .collect();

    let mut successes = 0;
    let mut duplicates = 0;
    for result in join_all(tasks).await {
        match result.unwrap() {
            Ok(_) => successes += 1,
            Err(ContestError::DuplicateSubmission) => duplicates += 1,
            Err(other) => panic!("unexpected outcome: {other}"),
        }
    }
    assert_eq!(successes, 1);
    assert_eq!(duplicates, attempts - 1);

    let entries = contest.list_entries().await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].owner_identity, "b@x.com");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn reads_stay_consistent_under_concurrent_writes() {
    let voters: Vec<String> = (0..32).map(|i| format!("v{i}@x.com")).collect();
    let mut emails: Vec<&str> = voters.iter().map(String::as_str).collect();
    emails.push("c1@x.com");
    emails.push("c2@x.com");
    let contest = contest_with_voters(&emails).await;

    let c1 = contest
        .submit_entry("c1@x.com", "C1", None, "uploads/c1.jpg".to_string())
        .await
        .unwrap();
    let c2 = contest
        .submit_entry("c2@x.com", "C2", None, "uploads/c2.jpg".to_string())
        .await
        .unwrap();

    // Distinct voters write while the leaderboard is read repeatedly; every
    // observed snapshot must be internally consistent (counts never exceed
    // the number of voters, rows stay sorted).
    let writers: Vec<_> = voters
        .iter()
        .cloned()
        .enumerate()
        .map(|(i, email)| {
            let contest = contest.clone();
            let target = if i % 2 == 0 { c1.id } else { c2.id };
            tokio::spawn(async move { contest.cast_vote(&email, target).await })
        })
        .collect();

    let readers: Vec<_> = (0..8)
        .map(|_| {
            let contest = contest.clone();
            tokio::spawn(async move {
                for _ in 0..16 {
                    let rows = contest.leaderboard(None).await.unwrap();
                    assert!(rows.windows(2).all(|pair| {
                        pair[0].vote_count > pair[1].vote_count
                            || (pair[0].vote_count == pair[1].vote_count
                                && pair[0].entry.id < pair[1].entry.id)
                    }));
                    let total: u64 = rows.iter().map(|row| row.vote_count).sum();
                    assert!(total <= 32);
                }
            })
        })
        .collect();

    for writer in join_all(writers).await {
        writer.unwrap().unwrap();
    }
    for reader in join_all(readers).await {
        reader.unwrap();
    }

    let rows = contest.leaderboard(None).await.unwrap();
    let total: u64 = rows.iter().map(|row| row.vote_count).sum();
    assert_eq!(total, 32);
    assert_eq!(
        rows.iter().map(|row| row.entry.id).collect::<Vec<EntryId>>(),
        vec![c1.id, c2.id]
    );
}
