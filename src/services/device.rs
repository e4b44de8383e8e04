use crate::message_handler_with_span;
use crate::span::{SpanHandler, SpanMessage};
use crate::storage::device::{DeviceToken, LoadDeviceToken, SaveDeviceToken};
use crate::storage::StorageExecutor;
use actix::prelude::*;
use actix_interop::{with_ctx, FutureInterop};
use async_trait::async_trait;
use color_eyre::eyre::Report;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument, Span};

/// Environment attributes feeding the device token. Attributes the host
/// cannot provide stay empty/zero; synthesis never fails.
#[derive(Clone, Debug, Default, Serialize)]
pub struct EnvironmentSnapshot {
    pub user_agent: String,
    pub language: String,
    pub platform: String,
    pub screen_resolution: String,
    pub timezone: String,
    pub rendering_surface: String,
    pub color_depth: u32,
    pub device_memory: u32,
    pub hardware_concurrency: u32,
}

#[async_trait]
pub trait EnvironmentProbe: Send + Sync {
    async fn snapshot(&self) -> EnvironmentSnapshot;
}

/// Reads whatever the host process can offer.
pub struct HostProbe;

#[async_trait]
impl EnvironmentProbe for HostProbe {
    async fn snapshot(&self) -> EnvironmentSnapshot {
        EnvironmentSnapshot {
            user_agent: format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
            language: std::env::var("LANG").unwrap_or_default(),
            platform: format!("{} {}", std::env::consts::OS, std::env::consts::ARCH),
            screen_resolution: String::new(),
            timezone: std::env::var("TZ").unwrap_or_default(),
            rendering_surface: String::new(),
            color_depth: 0,
            device_memory: 0,
            hardware_concurrency: std::thread::available_parallelism()
                .map(|n| n.get() as u32)
                .unwrap_or(0),
        }
    }
}

/// Reduce a snapshot to its compact token: serialize, run the 31-multiplier
/// shift hash over wrapping 32-bit arithmetic, render as signed base-36.
pub fn fingerprint(snapshot: &EnvironmentSnapshot) -> DeviceToken {
    let serialized = serde_json::to_string(snapshot).unwrap_or_default();
    let mut hash: i32 = 0;
    for c in serialized.chars() {
        hash = hash
            .wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(c as i32);
    }
    DeviceToken(to_base36(hash))
}

fn to_base36(value: i32) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut remainder = (value as i64).abs() as u64;
    if remainder == 0 {
        return "0".to_owned();
    }
    let mut out = String::new();
    while remainder > 0 {
        out.insert(0, DIGITS[(remainder % 36) as usize] as char);
        remainder /= 36;
    }
    if value < 0 {
        out.insert(0, '-');
    }
    out
}

// Actor

pub struct DeviceActor {
    probe: Arc<dyn EnvironmentProbe>,
    cached: Option<DeviceToken>,
}

impl DeviceActor {
    pub fn new() -> Self {
        Self::with_probe(Arc::new(HostProbe))
    }

    pub fn with_probe(probe: Arc<dyn EnvironmentProbe>) -> Self {
        Self {
            probe,
            cached: None,
        }
    }
}

impl Default for DeviceActor {
    fn default() -> Self {
        Self::new()
    }
}

impl Actor for DeviceActor {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Self::Context) {
        info!("Device actor started");
    }
}

impl SystemService for DeviceActor {}
impl Supervised for DeviceActor {}

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<DeviceToken, Report>")]
pub struct GetOrCreateToken;

#[instrument]
async fn handle_get_or_create() -> Result<DeviceToken, Report> {
    if let Some(token) = with_ctx(|a: &mut DeviceActor, _| a.cached.clone()) {
        return Ok(token);
    }

    let stored = StorageExecutor::from_registry()
        .send(SpanMessage::new(LoadDeviceToken))
        .await??;
    let token = match stored {
        Some(token) => {
            debug!(token = token.as_str(), "Using persisted device token");
            token
        }
        None => {
            let probe = with_ctx(|a: &mut DeviceActor, _| a.probe.clone());
            let snapshot = probe.snapshot().await;
            let token = fingerprint(&snapshot);
            info!(token = token.as_str(), "Synthesized new device token");
            StorageExecutor::from_registry()
                .send(SpanMessage::new(SaveDeviceToken(token.clone())))
                .await??;
            token
        }
    };

    with_ctx(|a: &mut DeviceActor, _| a.cached = Some(token.clone()));
    Ok(token)
}

message_handler_with_span! {
    impl SpanHandler<GetOrCreateToken> for DeviceActor {
        type Result = ResponseActFuture<Self, <GetOrCreateToken as Message>::Result>;

        fn handle(&mut self, _msg: GetOrCreateToken, _ctx: &mut Context<Self>, _span: Span) -> Self::Result {
            handle_get_or_create().interop_actor_boxed(self)
        }
    }
}
