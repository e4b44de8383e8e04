use super::{StorageExecutor, DEVICE_TOKEN_KEY};
use crate::async_message_handler_with_span;
use actix::prelude::*;
use actix_interop::with_ctx;
use color_eyre::eyre::Report;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Best-effort per-browser identifier. Not unique, not stable across
/// cleared storage; only good for capping repeat votes.
#[derive(Clone, Hash, PartialEq, Eq, Debug, Deserialize, Serialize)]
pub struct DeviceToken(pub String);

impl DeviceToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Message, Clone)]
#[rtype(result = "Result<Option<DeviceToken>, Report>")]
pub struct LoadDeviceToken;

async_message_handler_with_span! {
    impl AsyncSpanHandler<LoadDeviceToken> for StorageExecutor {
        async fn handle(_msg: LoadDeviceToken) -> Result<Option<DeviceToken>, Report> {
            let local = with_ctx(|a: &mut StorageExecutor, _| a.local());
            Ok(local.get_item(DEVICE_TOKEN_KEY)?.map(DeviceToken))
        }
    }
}

#[derive(Message, Clone)]
#[rtype(result = "Result<(), Report>")]
pub struct SaveDeviceToken(pub DeviceToken);

async_message_handler_with_span! {
    impl AsyncSpanHandler<SaveDeviceToken> for StorageExecutor {
        async fn handle(msg: SaveDeviceToken) -> Result<(), Report> {
            let SaveDeviceToken(token) = msg;
            debug!(token = token.as_str(), "Persisting device token");
            let local = with_ctx(|a: &mut StorageExecutor, _| a.local());
            local.set_item(DEVICE_TOKEN_KEY, token.as_str())
        }
    }
}
