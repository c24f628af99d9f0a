//! Operator session handed to everything that talks to the record store.

use leaddesk_protocol::UserId;
use tokio_util::sync::CancellationToken;

/// Who is operating and whether the session is still alive.
///
/// Logging out cancels [`SessionContext::cancellation`]; fetches and
/// expansions started under the session observe it and stop.
#[derive(Clone, Debug)]
pub struct SessionContext {
    operator_id: UserId,
    api_token: Option<String>,
    cancel: CancellationToken,
}

impl SessionContext {
    pub fn new(operator_id: impl Into<UserId>, api_token: Option<String>) -> Self {
        Self {
            operator_id: operator_id.into(),
            api_token,
            cancel: CancellationToken::new(),
        }
    }

    pub fn operator_id(&self) -> &str {
        &self.operator_id
    }

    pub fn api_token(&self) -> Option<&str> {
        self.api_token.as_deref()
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_active(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    pub fn logout(&self) {
        self.cancel.cancel();
    }
}
