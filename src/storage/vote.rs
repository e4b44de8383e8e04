use super::{StorageExecutor, VOTES_KEY};
use crate::async_message_handler_with_span;
use crate::category::Category;
use crate::storage::device::DeviceToken;
use actix::prelude::*;
use actix_interop::with_ctx;
use color_eyre::eyre::Report;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};
use uuid::Uuid;

const CODE_PREFIX: &str = "VOTE-";
const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const CODE_LEN: usize = 6;

/// Operator-facing code identifying a single submission. Random, not
/// derived from vote content; collisions are accepted.
#[derive(Clone, Hash, PartialEq, Eq, Debug, Deserialize, Serialize)]
pub struct SubmissionCode(pub String);

impl SubmissionCode {
    pub fn generate() -> Self {
        let entropy = Uuid::new_v4();
        let mut code = String::from(CODE_PREFIX);
        for byte in entropy.as_bytes().iter().take(CODE_LEN) {
            code.push(CODE_ALPHABET[*byte as usize % CODE_ALPHABET.len()] as char);
        }
        Self(code)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteStatus {
    Pending,
    Confirmed,
    Rejected,
}

#[derive(Clone, PartialEq, Eq, Debug, Deserialize, Serialize)]
pub struct StoredVote {
    pub code: SubmissionCode,
    pub category: Category,
    pub candidate: String,
    pub submitted_at: i64,
    pub device_token: DeviceToken,
    pub status: VoteStatus,
}

impl StoredVote {
    /// Every vote starts out pending; moderation is the only thing that
    /// moves it from there.
    pub fn new(category: Category, candidate: String, device_token: DeviceToken) -> Self {
        Self {
            code: SubmissionCode::generate(),
            category,
            candidate,
            submitted_at: now_millis(),
            device_token,
            status: VoteStatus::Pending,
        }
    }

    pub fn counts_against_limit(&self) -> bool {
        self.status != VoteStatus::Rejected
    }
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}

const STORE_VERSION: u32 = 1;

#[derive(Deserialize, Serialize)]
struct VoteFile {
    version: u32,
    votes: Vec<StoredVote>,
}

/// Versioned, fail-closed parse: anything we cannot read is the empty
/// collection, never a crash during load.
pub(crate) fn decode_votes(raw: Option<String>) -> Vec<StoredVote> {
    let raw = match raw {
        Some(raw) => raw,
        None => return vec![],
    };
    match serde_json::from_str::<VoteFile>(&raw) {
        Ok(file) if file.version == STORE_VERSION => file.votes,
        Ok(file) => {
            warn!(
                version = file.version,
                "Unsupported vote store version, treating as empty"
            );
            vec![]
        }
        Err(err) => {
            warn!("Malformed vote store, treating as empty: {}", err);
            vec![]
        }
    }
}

pub(crate) fn encode_votes(votes: Vec<StoredVote>) -> Result<String, Report> {
    let file = VoteFile {
        version: STORE_VERSION,
        votes,
    };
    Ok(serde_json::to_string(&file)?)
}

#[derive(Message, Clone)]
#[rtype(result = "Result<Vec<StoredVote>, Report>")]
pub struct LoadVotes;

async_message_handler_with_span! {
    impl AsyncSpanHandler<LoadVotes> for StorageExecutor {
        async fn handle(_msg: LoadVotes) -> Result<Vec<StoredVote>, Report> {
            let local = with_ctx(|a: &mut StorageExecutor, _| a.local());
            let votes = decode_votes(local.get_item(VOTES_KEY)?);
            debug!(count = votes.len(), "Loaded vote collection");
            Ok(votes)
        }
    }
}

#[derive(Debug)]
pub enum AddVoteOutcome {
    Added(StoredVote),
    AlreadyVoted,
}

#[derive(Message, Clone)]
#[rtype(result = "Result<AddVoteOutcome, Report>")]
pub struct AddVote(pub StoredVote);

async_message_handler_with_span! {
    impl AsyncSpanHandler<AddVote> for StorageExecutor {
        async fn handle(msg: AddVote) -> Result<AddVoteOutcome, Report> {
            let AddVote(vote) = msg;
            let local = with_ctx(|a: &mut StorageExecutor, _| a.local());
            let mut votes = decode_votes(local.get_item(VOTES_KEY)?);

            let duplicate = votes.iter().any(|existing| {
                existing.device_token == vote.device_token
                    && existing.category == vote.category
                    && existing.counts_against_limit()
            });
            if duplicate {
                debug!(category = vote.category.slug(), "Device already voted in category");
                return Ok(AddVoteOutcome::AlreadyVoted);
            }

            info!(
                code = vote.code.as_str(),
                category = vote.category.slug(),
                "Appending vote"
            );
            votes.push(vote.clone());
            local.set_item(VOTES_KEY, &encode_votes(votes)?)?;
            Ok(AddVoteOutcome::Added(vote))
        }
    }
}

#[derive(Message, Clone)]
#[rtype(result = "Result<Option<StoredVote>, Report>")]
pub struct SetVoteStatus {
    pub code: SubmissionCode,
    pub status: VoteStatus,
}

async_message_handler_with_span! {
    impl AsyncSpanHandler<SetVoteStatus> for StorageExecutor {
        async fn handle(msg: SetVoteStatus) -> Result<Option<StoredVote>, Report> {
            // Pending is a creation-only state, not a moderation target.
            if msg.status == VoteStatus::Pending {
                return Ok(None);
            }
            let local = with_ctx(|a: &mut StorageExecutor, _| a.local());
            let mut votes = decode_votes(local.get_item(VOTES_KEY)?);

            let updated = match votes.iter_mut().find(|vote| vote.code == msg.code) {
                Some(vote) if vote.status == VoteStatus::Pending => {
                    vote.status = msg.status;
                    info!(code = msg.code.as_str(), status = ?msg.status, "Vote status updated");
                    Some(vote.clone())
                }
                Some(vote) => {
                    debug!(
                        code = msg.code.as_str(),
                        status = ?vote.status,
                        "Vote already in a terminal state"
                    );
                    None
                }
                None => {
                    debug!(code = msg.code.as_str(), "No vote with this code");
                    None
                }
            };

            if updated.is_some() {
                local.set_item(VOTES_KEY, &encode_votes(votes)?)?;
            }
            Ok(updated)
        }
    }
}
