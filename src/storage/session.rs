use super::{StorageExecutor, OPERATOR_SESSION_KEY};
use actix::prelude::*;
use tracing::debug;

// Session-scope operations are synchronous: the backing store is a plain
// in-memory map owned by the executor.

#[derive(Message, Clone)]
#[rtype(result = "()")]
pub struct SetOperatorSession(pub bool);

impl Handler<SetOperatorSession> for StorageExecutor {
    type Result = ();

    fn handle(&mut self, msg: SetOperatorSession, _ctx: &mut Context<Self>) {
        let SetOperatorSession(active) = msg;
        debug!(active = active, "Operator session marker updated");
        if active {
            self.session.set_item(OPERATOR_SESSION_KEY, "true");
        } else {
            self.session.remove_item(OPERATOR_SESSION_KEY);
        }
    }
}

#[derive(Message, Clone)]
#[rtype(result = "bool")]
pub struct OperatorSessionActive;

impl Handler<OperatorSessionActive> for StorageExecutor {
    type Result = MessageResult<OperatorSessionActive>;

    fn handle(&mut self, _msg: OperatorSessionActive, _ctx: &mut Context<Self>) -> Self::Result {
        MessageResult(self.session.get_item(OPERATOR_SESSION_KEY) == Some("true"))
    }
}
