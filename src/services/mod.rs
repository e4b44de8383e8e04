use crate::message_handler_with_span;
use crate::category::Category;
use crate::span::{SpanHandler, SpanMessage};
use crate::storage::device::DeviceToken;
use crate::storage::release::LoadReleaseFlag;
use crate::storage::StorageExecutor;
use actix::prelude::*;
use actix_interop::FutureInterop;
use color_eyre::eyre::Report;
use std::collections::HashSet;
use tracing::{debug, info, instrument, Span};

pub mod device;
pub mod moderation;
pub mod results;
pub mod vote;

use self::device::{DeviceActor, GetOrCreateToken};
use self::results::{ComputeResults, ComputeTotals, ResultsActor, VoteResults, VoteTotals};
use self::vote::{VoteActor, VotedCategories};

/// Everything a presentation layer needs when it loads: who this device
/// is, what it already voted on, and whatever the release flag permits.
#[derive(Clone, Debug)]
pub struct PollSnapshot {
    pub device_token: DeviceToken,
    pub voted_categories: HashSet<Category>,
    pub results_released: bool,
    pub totals: VoteTotals,
    /// `None` until the operator releases the results.
    pub results: Option<VoteResults>,
}

/// Facade composing the per-load snapshot out of the underlying actors.
#[derive(Default)]
pub struct Service;

impl Actor for Service {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Self::Context) {
        info!("Service actor started");
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        info!("Service actor stopped");
    }
}

impl Supervised for Service {}
impl ArbiterService for Service {}

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<PollSnapshot, Report>")]
pub struct GetSnapshot;

#[instrument]
async fn handle_snapshot() -> Result<PollSnapshot, Report> {
    let (device_token, voted_categories, results_released, totals) = futures::join!(
        DeviceActor::from_registry().send(SpanMessage::new(GetOrCreateToken)),
        VoteActor::from_registry().send(SpanMessage::new(VotedCategories)),
        StorageExecutor::from_registry().send(SpanMessage::new(LoadReleaseFlag)),
        ResultsActor::from_registry().send(SpanMessage::new(ComputeTotals)),
    );
    let device_token = device_token??;
    let voted_categories = voted_categories??;
    let results_released = results_released??;
    let totals = totals??;

    let results = if results_released {
        Some(
            ResultsActor::from_registry()
                .send(SpanMessage::new(ComputeResults))
                .await??,
        )
    } else {
        None
    };

    Ok(PollSnapshot {
        device_token,
        voted_categories,
        results_released,
        totals,
        results,
    })
}

message_handler_with_span! {
    impl SpanHandler<GetSnapshot> for Service {
        type Result = ResponseActFuture<Self, <GetSnapshot as Message>::Result>;

        fn handle(&mut self, _msg: GetSnapshot, _ctx: &mut Context<Self>, _span: Span) -> Self::Result {
            debug!("Composing poll snapshot");
            handle_snapshot().interop_actor_boxed(self)
        }
    }
}
