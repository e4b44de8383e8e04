use crate::message_handler_with_span;
use crate::category::Category;
use crate::span::{SpanHandler, SpanMessage};
use crate::storage::vote::{LoadVotes, StoredVote, VoteStatus};
use crate::storage::StorageExecutor;
use actix::prelude::*;
use actix_interop::FutureInterop;
use color_eyre::eyre::Report;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{info, instrument, Span};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CandidateTally {
    pub candidate: String,
    pub count: u32,
}

pub type VoteResults = HashMap<Category, Vec<CandidateTally>>;

/// Raw status counts over the whole store, independent of the grouped
/// tallies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct VoteTotals {
    pub total: usize,
    pub confirmed: usize,
    pub pending: usize,
    pub rejected: usize,
}

/// Group confirmed votes by category, then candidate. Candidates match by
/// exact string ("Ana" and "ana" tally separately) and keep encounter
/// order; sorting is the presentation layer's job. Categories without a
/// confirmed vote are absent from the map.
pub fn tally_confirmed(votes: &[StoredVote]) -> VoteResults {
    let mut results: VoteResults = HashMap::new();
    for vote in votes {
        if vote.status != VoteStatus::Confirmed {
            continue;
        }
        let tallies = results.entry(vote.category).or_insert_with(Vec::new);
        match tallies
            .iter_mut()
            .find(|tally| tally.candidate == vote.candidate)
        {
            Some(tally) => tally.count += 1,
            None => tallies.push(CandidateTally {
                candidate: vote.candidate.clone(),
                count: 1,
            }),
        }
    }
    results
}

pub fn count_totals(votes: &[StoredVote]) -> VoteTotals {
    let mut totals = VoteTotals {
        total: votes.len(),
        ..VoteTotals::default()
    };
    for vote in votes {
        match vote.status {
            VoteStatus::Confirmed => totals.confirmed += 1,
            VoteStatus::Pending => totals.pending += 1,
            VoteStatus::Rejected => totals.rejected += 1,
        }
    }
    totals
}

// Actor

#[derive(Default)]
pub struct ResultsActor;

impl Actor for ResultsActor {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Self::Context) {
        info!("Results actor started");
    }
}

impl SystemService for ResultsActor {}
impl Supervised for ResultsActor {}

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<VoteResults, Report>")]
pub struct ComputeResults;

#[instrument]
async fn handle_compute_results() -> Result<VoteResults, Report> {
    let votes = StorageExecutor::from_registry()
        .send(SpanMessage::new(LoadVotes))
        .await??;
    Ok(tally_confirmed(&votes))
}

message_handler_with_span! {
    impl SpanHandler<ComputeResults> for ResultsActor {
        type Result = ResponseActFuture<Self, <ComputeResults as Message>::Result>;

        fn handle(&mut self, _msg: ComputeResults, _ctx: &mut Context<Self>, _span: Span) -> Self::Result {
            handle_compute_results().interop_actor_boxed(self)
        }
    }
}

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<VoteTotals, Report>")]
pub struct ComputeTotals;

#[instrument]
async fn handle_compute_totals() -> Result<VoteTotals, Report> {
    let votes = StorageExecutor::from_registry()
        .send(SpanMessage::new(LoadVotes))
        .await??;
    Ok(count_totals(&votes))
}

message_handler_with_span! {
    impl SpanHandler<ComputeTotals> for ResultsActor {
        type Result = ResponseActFuture<Self, <ComputeTotals as Message>::Result>;

        fn handle(&mut self, _msg: ComputeTotals, _ctx: &mut Context<Self>, _span: Span) -> Self::Result {
            handle_compute_totals().interop_actor_boxed(self)
        }
    }
}
