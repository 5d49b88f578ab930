//! Authorization of tenant-scoped commands.
//!
//! An [`Authorizer`] answers "may `requester` act on `owner`'s tenant?".
//! The default [`SelfPolicy`] only admits the owner themself.

use std::sync::Arc;

use futures_util::future::{self, BoxFuture};
use tracing::error;

use synthos_types::error::{AuthorizationError, HandlerError};

use crate::command::Invocation;

pub const NOT_AUTHORIZED: &str = "You are not authorized to use this command.";
pub const AUTHORIZATION_FAILED: &str =
    "Failed to authorize. SynthOS Controller has been notified.";

/// A pluggable authorization policy.
pub trait Authorizer: Send + Sync {
    fn authorized<'a>(
        &'a self,
        owner: &'a str,
        requester: &'a str,
    ) -> BoxFuture<'a, Result<bool, AuthorizationError>>;
}

pub type SharedAuthorizer = Arc<dyn Authorizer>;

/// Authorized iff the requester is the owner. Empty ids get no special case.
#[derive(Debug, Clone, Copy, Default)]
pub struct SelfPolicy;

impl Authorizer for SelfPolicy {
    fn authorized<'a>(
        &'a self,
        owner: &'a str,
        requester: &'a str,
    ) -> BoxFuture<'a, Result<bool, AuthorizationError>> {
        Box::pin(future::ready(Ok(owner == requester)))
    }
}

/// Run `authorizer` for the invocation's requester and answer refusals.
///
/// Returns `Ok(true)` when the handler may proceed. On `Ok(false)` the
/// requester has already been told; a policy failure is logged for the
/// operator and reported to the requester with a generic message only.
pub async fn gate(
    authorizer: &dyn Authorizer,
    owner: &str,
    invocation: &Invocation,
    operator: Option<&str>,
) -> Result<bool, HandlerError> {
    match authorizer.authorized(owner, &invocation.requester.id).await {
        Ok(true) => Ok(true),
        Ok(false) => {
            invocation.reply(NOT_AUTHORIZED).await?;
            Ok(false)
        }
        Err(e) => {
            error!(
                owner_id = %owner,
                requester = %invocation.requester.id,
                operator = operator.unwrap_or("unset"),
                error = %e,
                "authorization policy failed"
            );
            invocation.reply(AUTHORIZATION_FAILED).await?;
            Ok(false)
        }
    }
}
