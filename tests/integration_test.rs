extern crate volei_votes;

use actix::prelude::*;
use actix::registry::SystemRegistry;
use uuid::Uuid;
use volei_votes::category::Category;
use volei_votes::server;
use volei_votes::services::device::{DeviceActor, GetOrCreateToken};
use volei_votes::services::moderation::{
    AllVotes, ConfirmVote, IsOperatorAuthenticated, ModerationActor, OperatorLogin, OperatorLogout,
    RejectVote, ToggleResultsRelease,
};
use volei_votes::services::results::{ComputeResults, ComputeTotals, ResultsActor};
use volei_votes::services::vote::{HasVotedInCategory, SubmitResponse, SubmitVote, VoteActor};
use volei_votes::services::{GetSnapshot, Service};
use volei_votes::span::SpanMessage;
use volei_votes::storage::vote::{SubmissionCode, VoteStatus};
use volei_votes::storage::{LocalStorage, StorageExecutor, DEVICE_TOKEN_KEY, VOTES_KEY};

fn scratch_storage() -> LocalStorage {
    let dir = std::env::temp_dir().join(format!(
        "volei-votes-it-{}",
        Uuid::new_v4().to_simple()
    ));
    LocalStorage::new(dir)
}

/// Register a fresh actor set over `storage`, pinning the device token so
/// scenarios control which "browser" is talking.
fn start_engine(storage: &LocalStorage, device: &str) {
    storage.set_item(DEVICE_TOKEN_KEY, device).unwrap();
    server::register_storage_actor(storage.clone());
    server::register_system_actors();
}

/// Swap in another device token mid-test. A fresh DeviceActor drops the
/// in-memory cache, the way a different browser would start cold.
fn switch_device(storage: &LocalStorage, device: &str) {
    storage.set_item(DEVICE_TOKEN_KEY, device).unwrap();
    SystemRegistry::set(DeviceActor::new().start());
}

async fn submit(category: Category, candidate: &str) -> SubmitResponse {
    VoteActor::from_registry()
        .send(SpanMessage::new(SubmitVote {
            category,
            candidate: candidate.to_owned(),
        }))
        .await
        .unwrap()
        .unwrap()
}

async fn submit_code(category: Category, candidate: &str) -> SubmissionCode {
    match submit(category, candidate).await {
        SubmitResponse::Accepted(receipt) => receipt.code,
        other => panic!("Submission should have been accepted, got {:?}", other),
    }
}

async fn confirmed_count(category: Category, candidate: &str) -> Option<u32> {
    let results = ResultsActor::from_registry()
        .send(SpanMessage::new(ComputeResults))
        .await
        .unwrap()
        .unwrap();
    results.get(&category).and_then(|tallies| {
        tallies
            .iter()
            .find(|tally| tally.candidate == candidate)
            .map(|tally| tally.count)
    })
}

#[actix_rt::test]
async fn accepted_submission_issues_a_code_and_locks_the_category() {
    let storage = scratch_storage();
    start_engine(&storage, "device-x");

    let response = submit(Category::MelhorSaque, "Ana").await;
    let receipt = match response {
        SubmitResponse::Accepted(receipt) => receipt,
        other => panic!("Expected acceptance, got {:?}", other),
    };

    // VOTE- followed by 6 uppercase alphanumerics.
    let code = receipt.code.as_str();
    assert!(code.starts_with("VOTE-"));
    let suffix = &code["VOTE-".len()..];
    assert_eq!(suffix.len(), 6);
    assert!(suffix
        .bytes()
        .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()));
    assert!(receipt.confirmation.contains(code));
    assert!(receipt.confirmation.contains("Melhor Saque"));
    assert!(receipt.confirmation.contains("Ana"));

    let voted = VoteActor::from_registry()
        .send(SpanMessage::new(HasVotedInCategory(Category::MelhorSaque)))
        .await
        .unwrap()
        .unwrap();
    assert!(voted);

    // Still pending, so nothing aggregates yet.
    assert_eq!(confirmed_count(Category::MelhorSaque, "Ana").await, None);
}

#[actix_rt::test]
async fn second_submission_in_category_is_refused_without_mutation() {
    let storage = scratch_storage();
    start_engine(&storage, "device-x");

    submit_code(Category::MelhorSaque, "Ana").await;
    assert_eq!(
        submit(Category::MelhorSaque, "Beto").await,
        SubmitResponse::AlreadyVoted
    );

    let votes = ModerationActor::from_registry()
        .send(SpanMessage::new(AllVotes))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(votes.len(), 1);
    assert_eq!(votes[0].candidate, "Ana");
    assert_eq!(votes[0].status, VoteStatus::Pending);

    // A different category is still open.
    submit_code(Category::MaisGenteBoa, "Beto").await;
}

#[actix_rt::test]
async fn confirmed_vote_reaches_the_tallies() {
    let storage = scratch_storage();
    start_engine(&storage, "device-x");

    let code = submit_code(Category::MelhorSaque, "Ana").await;
    ModerationActor::from_registry()
        .send(SpanMessage::new(ConfirmVote(code)))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(confirmed_count(Category::MelhorSaque, "Ana").await, Some(1));
}

#[actix_rt::test]
async fn rejected_vote_never_counts_and_frees_the_category() {
    let storage = scratch_storage();
    start_engine(&storage, "device-x");

    let code = submit_code(Category::MelhorSaque, "Ana").await;
    ModerationActor::from_registry()
        .send(SpanMessage::new(ConfirmVote(code)))
        .await
        .unwrap()
        .unwrap();

    switch_device(&storage, "device-y");
    let code_y = submit_code(Category::MelhorSaque, "Ana").await;
    ModerationActor::from_registry()
        .send(SpanMessage::new(RejectVote(code_y)))
        .await
        .unwrap()
        .unwrap();

    // Device X's confirmed vote stands alone.
    assert_eq!(confirmed_count(Category::MelhorSaque, "Ana").await, Some(1));

    // Rejection frees the slot for device Y.
    let voted = VoteActor::from_registry()
        .send(SpanMessage::new(HasVotedInCategory(Category::MelhorSaque)))
        .await
        .unwrap()
        .unwrap();
    assert!(!voted);
    submit_code(Category::MelhorSaque, "Beto").await;
}

#[actix_rt::test]
async fn moderation_is_idempotent_and_terminal() {
    let storage = scratch_storage();
    start_engine(&storage, "device-x");

    let code = submit_code(Category::MaisReclamao, "Ana").await;
    for _ in 0..2 {
        ModerationActor::from_registry()
            .send(SpanMessage::new(ConfirmVote(code.clone())))
            .await
            .unwrap()
            .unwrap();
    }
    assert_eq!(confirmed_count(Category::MaisReclamao, "Ana").await, Some(1));

    // Rejecting a confirmed vote changes nothing.
    ModerationActor::from_registry()
        .send(SpanMessage::new(RejectVote(code)))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(confirmed_count(Category::MaisReclamao, "Ana").await, Some(1));

    // Unknown codes are a silent no-op.
    ModerationActor::from_registry()
        .send(SpanMessage::new(ConfirmVote(SubmissionCode(
            "VOTE-000000".to_owned(),
        ))))
        .await
        .unwrap()
        .unwrap();
    let totals = ResultsActor::from_registry()
        .send(SpanMessage::new(ComputeTotals))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(totals.total, 1);
    assert_eq!(totals.confirmed, 1);
}

#[actix_rt::test]
async fn totals_track_every_status() {
    let storage = scratch_storage();
    start_engine(&storage, "device-x");

    let confirmed = submit_code(Category::MelhorSaque, "Ana").await;
    let rejected = submit_code(Category::MaisReclamao, "Beto").await;
    submit_code(Category::MaisGenteBoa, "Carla").await;

    ModerationActor::from_registry()
        .send(SpanMessage::new(ConfirmVote(confirmed)))
        .await
        .unwrap()
        .unwrap();
    ModerationActor::from_registry()
        .send(SpanMessage::new(RejectVote(rejected)))
        .await
        .unwrap()
        .unwrap();

    let totals = ResultsActor::from_registry()
        .send(SpanMessage::new(ComputeTotals))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(totals.total, 3);
    assert_eq!(totals.confirmed, 1);
    assert_eq!(totals.pending, 1);
    assert_eq!(totals.rejected, 1);
}

#[actix_rt::test]
async fn vote_collection_survives_an_engine_restart() {
    let storage = scratch_storage();
    start_engine(&storage, "device-x");

    submit_code(Category::MelhorSaque, "Ana").await;
    submit_code(Category::MaisGenteBoa, "Beto").await;
    let before = ModerationActor::from_registry()
        .send(SpanMessage::new(AllVotes))
        .await
        .unwrap()
        .unwrap();

    // Same backing files, fresh executor: what a page reload looks like.
    SystemRegistry::set(StorageExecutor::new(storage.clone()).start());
    let after = ModerationActor::from_registry()
        .send(SpanMessage::new(AllVotes))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(before, after);
    assert_eq!(after.len(), 2);
}

#[actix_rt::test]
async fn malformed_vote_store_loads_as_empty_and_stays_writable() {
    let storage = scratch_storage();
    start_engine(&storage, "device-x");
    storage.set_item(VOTES_KEY, "{this is not json").unwrap();

    let votes = ModerationActor::from_registry()
        .send(SpanMessage::new(AllVotes))
        .await
        .unwrap()
        .unwrap();
    assert!(votes.is_empty());

    submit_code(Category::MelhorSaque, "Ana").await;
    let votes = ModerationActor::from_registry()
        .send(SpanMessage::new(AllVotes))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(votes.len(), 1);
}

#[actix_rt::test]
async fn invalid_candidates_are_refused_before_any_state_change() {
    let storage = scratch_storage();
    start_engine(&storage, "device-x");

    assert_eq!(
        submit(Category::MelhorSaque, "   ").await,
        SubmitResponse::InvalidCandidate
    );
    let over_limit = "a".repeat(51);
    assert_eq!(
        submit(Category::MelhorSaque, &over_limit).await,
        SubmitResponse::InvalidCandidate
    );

    let votes = ModerationActor::from_registry()
        .send(SpanMessage::new(AllVotes))
        .await
        .unwrap()
        .unwrap();
    assert!(votes.is_empty());

    // The category is still open after refused attempts.
    submit_code(Category::MelhorSaque, "Ana").await;
}

#[actix_rt::test]
async fn device_token_is_stable_across_device_actor_restarts() {
    let storage = scratch_storage();
    // No pinned token: the probe synthesizes one on first use.
    server::register_storage_actor(storage.clone());
    server::register_system_actors();

    let first = DeviceActor::from_registry()
        .send(SpanMessage::new(GetOrCreateToken))
        .await
        .unwrap()
        .unwrap();
    let second = DeviceActor::from_registry()
        .send(SpanMessage::new(GetOrCreateToken))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first, second);

    // A cold actor re-reads the persisted token instead of re-deriving.
    SystemRegistry::set(DeviceActor::new().start());
    let third = DeviceActor::from_registry()
        .send(SpanMessage::new(GetOrCreateToken))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first, third);
}

#[actix_rt::test]
async fn release_toggle_round_trips_and_gates_the_snapshot() {
    let storage = scratch_storage();
    start_engine(&storage, "device-x");

    let code = submit_code(Category::MelhorSaque, "Ana").await;
    ModerationActor::from_registry()
        .send(SpanMessage::new(ConfirmVote(code)))
        .await
        .unwrap()
        .unwrap();

    let snapshot = Service::from_registry()
        .send(SpanMessage::new(GetSnapshot))
        .await
        .unwrap()
        .unwrap();
    assert!(!snapshot.results_released);
    assert!(snapshot.results.is_none());
    assert_eq!(snapshot.totals.confirmed, 1);
    assert!(snapshot.voted_categories.contains(&Category::MelhorSaque));
    assert_eq!(snapshot.device_token.as_str(), "device-x");

    let released = ModerationActor::from_registry()
        .send(SpanMessage::new(ToggleResultsRelease))
        .await
        .unwrap()
        .unwrap();
    assert!(released);

    let snapshot = Service::from_registry()
        .send(SpanMessage::new(GetSnapshot))
        .await
        .unwrap()
        .unwrap();
    assert!(snapshot.results_released);
    let results = snapshot.results.expect("released results");
    assert_eq!(results[&Category::MelhorSaque][0].candidate, "Ana");

    // Toggling twice lands back where it started.
    let released = ModerationActor::from_registry()
        .send(SpanMessage::new(ToggleResultsRelease))
        .await
        .unwrap()
        .unwrap();
    assert!(!released);
}

#[actix_rt::test]
async fn operator_session_follows_login_and_logout() {
    let storage = scratch_storage();
    start_engine(&storage, "device-x");

    let granted = ModerationActor::from_registry()
        .send(SpanMessage::new(OperatorLogin("wrong-code".to_owned())))
        .await
        .unwrap()
        .unwrap();
    assert!(!granted);
    let authed = ModerationActor::from_registry()
        .send(SpanMessage::new(IsOperatorAuthenticated))
        .await
        .unwrap()
        .unwrap();
    assert!(!authed);

    let granted = ModerationActor::from_registry()
        .send(SpanMessage::new(OperatorLogin("TURMAVOLEI2024".to_owned())))
        .await
        .unwrap()
        .unwrap();
    assert!(granted);
    let authed = ModerationActor::from_registry()
        .send(SpanMessage::new(IsOperatorAuthenticated))
        .await
        .unwrap()
        .unwrap();
    assert!(authed);

    ModerationActor::from_registry()
        .send(SpanMessage::new(OperatorLogout))
        .await
        .unwrap()
        .unwrap();
    let authed = ModerationActor::from_registry()
        .send(SpanMessage::new(IsOperatorAuthenticated))
        .await
        .unwrap()
        .unwrap();
    assert!(!authed);
}
