use crate::services::device::DeviceActor;
use crate::services::moderation::ModerationActor;
use crate::services::results::ResultsActor;
use crate::services::vote::VoteActor;
use crate::storage::{LocalStorage, StorageExecutor};
use actix::prelude::*;
use actix::registry::SystemRegistry;

/// The storage actor needs its backing directory, so it is registered
/// separately from the stateless service actors.
pub fn register_storage_actor(storage: LocalStorage) {
    SystemRegistry::set(StorageExecutor::new(storage).start());
}

pub fn register_system_actors() {
    SystemRegistry::set(DeviceActor::new().start());
    SystemRegistry::set(VoteActor::default().start());
    SystemRegistry::set(ModerationActor::default().start());
    SystemRegistry::set(ResultsActor::default().start());
}
