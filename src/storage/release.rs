use super::{StorageExecutor, RELEASE_FLAG_KEY};
use crate::async_message_handler_with_span;
use actix::prelude::*;
use actix_interop::with_ctx;
use color_eyre::eyre::Report;
use tracing::info;

// The flag is stored as the literal strings "true"/"false"; anything else
// (including nothing) reads as unreleased.
fn parse_flag(raw: Option<String>) -> bool {
    raw.as_deref() == Some("true")
}

#[derive(Message, Clone)]
#[rtype(result = "Result<bool, Report>")]
pub struct LoadReleaseFlag;

async_message_handler_with_span! {
    impl AsyncSpanHandler<LoadReleaseFlag> for StorageExecutor {
        async fn handle(_msg: LoadReleaseFlag) -> Result<bool, Report> {
            let local = with_ctx(|a: &mut StorageExecutor, _| a.local());
            Ok(parse_flag(local.get_item(RELEASE_FLAG_KEY)?))
        }
    }
}

#[derive(Message, Clone)]
#[rtype(result = "Result<bool, Report>")]
pub struct ToggleReleaseFlag;

async_message_handler_with_span! {
    impl AsyncSpanHandler<ToggleReleaseFlag> for StorageExecutor {
        async fn handle(_msg: ToggleReleaseFlag) -> Result<bool, Report> {
            let local = with_ctx(|a: &mut StorageExecutor, _| a.local());
            let released = !parse_flag(local.get_item(RELEASE_FLAG_KEY)?);
            local.set_item(RELEASE_FLAG_KEY, if released { "true" } else { "false" })?;
            info!(released = released, "Results release flag toggled");
            Ok(released)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_true_literal_releases() {
        assert!(parse_flag(Some("true".to_owned())));
        assert!(!parse_flag(Some("false".to_owned())));
        assert!(!parse_flag(Some("TRUE".to_owned())));
        assert!(!parse_flag(Some("yes".to_owned())));
        assert!(!parse_flag(None));
    }
}
