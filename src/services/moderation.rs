use crate::message_handler_with_span;
use crate::span::{SpanHandler, SpanMessage};
use crate::storage::release::ToggleReleaseFlag;
use crate::storage::session::{OperatorSessionActive, SetOperatorSession};
use crate::storage::vote::{LoadVotes, SetVoteStatus, StoredVote, SubmissionCode, VoteStatus};
use crate::storage::StorageExecutor;
use actix::prelude::*;
use actix_interop::FutureInterop;
use color_eyre::eyre::Report;
use tracing::{debug, info, instrument, warn, Span};

// A shared secret typed by the operator, compared for equality. A UI gate
// for a cooperative user base, not access control.
const OPERATOR_CODE: &str = "TURMAVOLEI2024";

#[derive(Default)]
pub struct ModerationActor;

impl Actor for ModerationActor {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Self::Context) {
        info!("Moderation actor started");
    }
}

impl SystemService for ModerationActor {}
impl Supervised for ModerationActor {}

#[derive(Message, Clone)]
#[rtype(result = "Result<bool, Report>")]
pub struct OperatorLogin(pub String);

#[instrument(skip(code))]
async fn handle_login(code: String) -> Result<bool, Report> {
    let valid = code == OPERATOR_CODE;
    if valid {
        StorageExecutor::from_registry()
            .send(SetOperatorSession(true))
            .await?;
        info!("Operator session opened");
    } else {
        warn!("Operator login refused");
    }
    Ok(valid)
}

message_handler_with_span! {
    impl SpanHandler<OperatorLogin> for ModerationActor {
        type Result = ResponseActFuture<Self, <OperatorLogin as Message>::Result>;

        fn handle(&mut self, msg: OperatorLogin, _ctx: &mut Context<Self>, _span: Span) -> Self::Result {
            handle_login(msg.0).interop_actor_boxed(self)
        }
    }
}

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<(), Report>")]
pub struct OperatorLogout;

#[instrument]
async fn handle_logout() -> Result<(), Report> {
    StorageExecutor::from_registry()
        .send(SetOperatorSession(false))
        .await?;
    info!("Operator session closed");
    Ok(())
}

message_handler_with_span! {
    impl SpanHandler<OperatorLogout> for ModerationActor {
        type Result = ResponseActFuture<Self, <OperatorLogout as Message>::Result>;

        fn handle(&mut self, _msg: OperatorLogout, _ctx: &mut Context<Self>, _span: Span) -> Self::Result {
            handle_logout().interop_actor_boxed(self)
        }
    }
}

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<bool, Report>")]
pub struct IsOperatorAuthenticated;

async fn handle_is_authenticated() -> Result<bool, Report> {
    let active = StorageExecutor::from_registry()
        .send(OperatorSessionActive)
        .await?;
    Ok(active)
}

message_handler_with_span! {
    impl SpanHandler<IsOperatorAuthenticated> for ModerationActor {
        type Result = ResponseActFuture<Self, <IsOperatorAuthenticated as Message>::Result>;

        fn handle(&mut self, _msg: IsOperatorAuthenticated, _ctx: &mut Context<Self>, _span: Span) -> Self::Result {
            handle_is_authenticated().interop_actor_boxed(self)
        }
    }
}

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<(), Report>")]
pub struct ConfirmVote(pub SubmissionCode);

message_handler_with_span! {
    impl SpanHandler<ConfirmVote> for ModerationActor {
        type Result = ResponseActFuture<Self, <ConfirmVote as Message>::Result>;

        fn handle(&mut self, msg: ConfirmVote, _ctx: &mut Context<Self>, _span: Span) -> Self::Result {
            handle_moderation(msg.0, VoteStatus::Confirmed).interop_actor_boxed(self)
        }
    }
}

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<(), Report>")]
pub struct RejectVote(pub SubmissionCode);

message_handler_with_span! {
    impl SpanHandler<RejectVote> for ModerationActor {
        type Result = ResponseActFuture<Self, <RejectVote as Message>::Result>;

        fn handle(&mut self, msg: RejectVote, _ctx: &mut Context<Self>, _span: Span) -> Self::Result {
            handle_moderation(msg.0, VoteStatus::Rejected).interop_actor_boxed(self)
        }
    }
}

/// Unknown codes and votes already in a terminal state are a silent no-op.
#[instrument]
async fn handle_moderation(code: SubmissionCode, status: VoteStatus) -> Result<(), Report> {
    let updated = StorageExecutor::from_registry()
        .send(SpanMessage::new(SetVoteStatus { code, status }))
        .await??;
    if updated.is_none() {
        debug!("Moderation left the store unchanged");
    }
    Ok(())
}

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<bool, Report>")]
pub struct ToggleResultsRelease;

#[instrument]
async fn handle_toggle_release() -> Result<bool, Report> {
    let released = StorageExecutor::from_registry()
        .send(SpanMessage::new(ToggleReleaseFlag))
        .await??;
    Ok(released)
}

message_handler_with_span! {
    impl SpanHandler<ToggleResultsRelease> for ModerationActor {
        type Result = ResponseActFuture<Self, <ToggleResultsRelease as Message>::Result>;

        fn handle(&mut self, _msg: ToggleResultsRelease, _ctx: &mut Context<Self>, _span: Span) -> Self::Result {
            handle_toggle_release().interop_actor_boxed(self)
        }
    }
}

/// Full triage listing for the management view, in submission order.
#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<Vec<StoredVote>, Report>")]
pub struct AllVotes;

async fn handle_all_votes() -> Result<Vec<StoredVote>, Report> {
    let votes = StorageExecutor::from_registry()
        .send(SpanMessage::new(LoadVotes))
        .await??;
    Ok(votes)
}

message_handler_with_span! {
    impl SpanHandler<AllVotes> for ModerationActor {
        type Result = ResponseActFuture<Self, <AllVotes as Message>::Result>;

        fn handle(&mut self, _msg: AllVotes, _ctx: &mut Context<Self>, _span: Span) -> Self::Result {
            handle_all_votes().interop_actor_boxed(self)
        }
    }
}
