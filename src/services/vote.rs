use super::device::{DeviceActor, GetOrCreateToken};
use crate::message_handler_with_span;
use crate::category::Category;
use crate::span::{SpanHandler, SpanMessage};
use crate::storage::vote::{AddVote, AddVoteOutcome, LoadVotes, StoredVote, SubmissionCode};
use crate::storage::StorageExecutor;
use actix::prelude::*;
use actix_interop::FutureInterop;
use color_eyre::eyre::Report;
use std::collections::HashSet;
use tracing::{debug, info, instrument, Span};

pub const MAX_CANDIDATE_LEN: usize = 50;

/// Trimmed candidate name, or `None` when the submission must be refused
/// before touching any state.
fn normalize_candidate(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.chars().count() > MAX_CANDIDATE_LEN {
        return None;
    }
    Some(trimmed.to_owned())
}

/// Pre-filled text the voter relays through an external channel. The
/// engine only builds it; whether it was ever sent is invisible here.
pub fn confirmation_message(vote: &StoredVote) -> String {
    format!(
        "🏐 CONFIRMAÇÃO DE VOTO - Turma do Vôlei\n\n\
         Código: {code}\n\
         Categoria: {category}\n\
         Candidato: {candidate}\n\
         Data: {submitted_at}\n\n\
         ⚠️ Clique em ENVIAR para confirmar este voto",
        code = vote.code.as_str(),
        category = vote.category.title(),
        candidate = vote.candidate,
        submitted_at = vote.submitted_at,
    )
}

#[derive(Clone, Debug, PartialEq)]
pub struct VoteReceipt {
    pub code: SubmissionCode,
    pub confirmation: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SubmitResponse {
    Accepted(VoteReceipt),
    /// Terminal for this category on this device; retrying with another
    /// candidate changes nothing.
    AlreadyVoted,
    InvalidCandidate,
}

// Actor

#[derive(Default)]
pub struct VoteActor;

impl Actor for VoteActor {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Self::Context) {
        info!("Vote actor started");
    }
}

impl SystemService for VoteActor {}
impl Supervised for VoteActor {}

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<SubmitResponse, Report>")]
pub struct SubmitVote {
    pub category: Category,
    pub candidate: String,
}

#[instrument(skip(msg))]
async fn handle_submit(msg: SubmitVote) -> Result<SubmitResponse, Report> {
    let candidate = match normalize_candidate(&msg.candidate) {
        Some(candidate) => candidate,
        None => {
            debug!(category = msg.category.slug(), "Refusing invalid candidate");
            return Ok(SubmitResponse::InvalidCandidate);
        }
    };

    let token = DeviceActor::from_registry()
        .send(SpanMessage::new(GetOrCreateToken))
        .await??;

    let vote = StoredVote::new(msg.category, candidate, token);
    let outcome = StorageExecutor::from_registry()
        .send(SpanMessage::new(AddVote(vote)))
        .await??;

    match outcome {
        AddVoteOutcome::Added(vote) => {
            let receipt = VoteReceipt {
                confirmation: confirmation_message(&vote),
                code: vote.code,
            };
            Ok(SubmitResponse::Accepted(receipt))
        }
        AddVoteOutcome::AlreadyVoted => Ok(SubmitResponse::AlreadyVoted),
    }
}

message_handler_with_span! {
    impl SpanHandler<SubmitVote> for VoteActor {
        type Result = ResponseActFuture<Self, <SubmitVote as Message>::Result>;

        fn handle(&mut self, msg: SubmitVote, _ctx: &mut Context<Self>, _span: Span) -> Self::Result {
            debug!("VoteActor handling SubmitVote");
            handle_submit(msg).interop_actor_boxed(self)
        }
    }
}

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<bool, Report>")]
pub struct HasVotedInCategory(pub Category);

#[instrument]
async fn handle_has_voted(category: Category) -> Result<bool, Report> {
    let token = DeviceActor::from_registry()
        .send(SpanMessage::new(GetOrCreateToken))
        .await??;
    let votes = StorageExecutor::from_registry()
        .send(SpanMessage::new(LoadVotes))
        .await??;
    Ok(votes.iter().any(|vote| {
        vote.device_token == token && vote.category == category && vote.counts_against_limit()
    }))
}

message_handler_with_span! {
    impl SpanHandler<HasVotedInCategory> for VoteActor {
        type Result = ResponseActFuture<Self, <HasVotedInCategory as Message>::Result>;

        fn handle(&mut self, msg: HasVotedInCategory, _ctx: &mut Context<Self>, _span: Span) -> Self::Result {
            handle_has_voted(msg.0).interop_actor_boxed(self)
        }
    }
}

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<HashSet<Category>, Report>")]
pub struct VotedCategories;

#[instrument]
async fn handle_voted_categories() -> Result<HashSet<Category>, Report> {
    let token = DeviceActor::from_registry()
        .send(SpanMessage::new(GetOrCreateToken))
        .await??;
    let votes = StorageExecutor::from_registry()
        .send(SpanMessage::new(LoadVotes))
        .await??;
    Ok(votes
        .iter()
        .filter(|vote| vote.device_token == token && vote.counts_against_limit())
        .map(|vote| vote.category)
        .collect())
}

message_handler_with_span! {
    impl SpanHandler<VotedCategories> for VoteActor {
        type Result = ResponseActFuture<Self, <VotedCategories as Message>::Result>;

        fn handle(&mut self, _msg: VotedCategories, _ctx: &mut Context<Self>, _span: Span) -> Self::Result {
            handle_voted_categories().interop_actor_boxed(self)
        }
    }
}
