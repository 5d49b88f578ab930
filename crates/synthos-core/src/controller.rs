//! Commands of the shared controller session.
//!
//! `/setup start` explains how to create a platform application,
//! `/setup token` provisions and boots a tenant from its credential and
//! `/setup link` hands out the install link.

use std::future::Future;
use std::sync::Arc;

use secrecy::SecretString;
use tracing::{error, info, warn};

use synthos_types::command::OptionKind;
use synthos_types::error::{CommandTreeError, HandlerError, TenantError};

use crate::command::{CommandNode, CommandTree, Invocation, OptionNode, SubcommandNode};

/// Tenant lifecycle operations the controller commands call into.
pub trait TenantProvisioner: Send + Sync + 'static {
    fn create_tenant(
        &self,
        requester: &str,
        token: SecretString,
    ) -> impl Future<Output = Result<(), TenantError>> + Send;

    fn start_tenant(&self, requester: &str) -> impl Future<Output = Result<(), TenantError>> + Send;

    fn server_link(&self, requester: &str) -> impl Future<Output = Result<String, TenantError>> + Send;
}

pub const SETUP_START_MESSAGE: &str = "\
Welcome to SynthOS! Here is how to set up your Synth:

1. Go to https://discord.com/developers/applications and click New Application.
2. Pick a name that means something to you, such as `<your identifier>'s SynthOS`, accept the terms and hit Create.
3. Optionally set the icon, display name and profile now. You can also do this later.
4. On the Installation tab, set Install Link to Discord Provided Link.
5. Under Default Install Settings, add \"bot\" to Guild Install with these permissions:
  * Change Nickname
  * Create Polls
  * Create Public Threads
  * Embed Links
  * Manage Messages
  * Manage Nicknames
  * Manage Threads
  * Send Messages
  * Send Messages in Threads
(This list may grow. If something stops working, run `/setup start` again and compare.)
6. Click Save Changes.
7. On the Bot tab, set the username, keep Public Bot on if it should join servers you do not administer, enable all three Privileged Gateway Intents and click Save Changes.
8. Click Reset Token, confirm, and copy the token. You will not be able to see it again.
9. Run `/setup token <token>` with the value you just copied.
";

pub const TOKEN_MISSING: &str = "Please supply the token of your Discord application.";
pub const TENANT_CREATED: &str = "Your Synth has been created! Run `/setup link` next.";
pub const TENANT_EXISTS: &str = "You already have a Synth instance.";
pub const TOKEN_INVALID: &str = "The Discord token is invalid.";
pub const TENANT_NOT_STARTED: &str = "Your Synth was created, but was unable to be started.";
pub const TENANT_CREATE_FAILED: &str = "Unknown error when trying to create Synth instance.";
pub const TENANT_MISSING: &str = "You do not have a Synth instance.";
pub const TENANT_LOOKUP_FAILED: &str = "Unknown error when trying to get Synth instance.";

/// Build the controller's command tree around `provisioner`.
pub fn commands<P: TenantProvisioner>(provisioner: Arc<P>) -> Result<CommandTree, CommandTreeError> {
    let for_token = Arc::clone(&provisioner);
    let for_link = provisioner;

    CommandTree::builder()
        .command(
            CommandNode::new("setup")
                .description("Set up a new Synth for your account")
                .subcommand(
                    SubcommandNode::new("start")
                        .description("Start creating a Synth instance")
                        .handler(setup_start),
                )
                .subcommand(
                    SubcommandNode::new("token")
                        .description("Set token for new Synth instance")
                        .option(
                            OptionNode::new("token", OptionKind::String)
                                .description("Discord App Token")
                                .required(),
                        )
                        .handler(move |inv: Invocation| {
                            let provisioner = Arc::clone(&for_token);
                            async move { setup_token(provisioner.as_ref(), inv).await }
                        }),
                )
                .subcommand(
                    SubcommandNode::new("link")
                        .description(
                            "Get link for server admins to add Synth to a server, and you to add to your account",
                        )
                        .handler(move |inv: Invocation| {
                            let provisioner = Arc::clone(&for_link);
                            async move { setup_link(provisioner.as_ref(), inv).await }
                        }),
                ),
        )
        .build()
}

async fn setup_start(inv: Invocation) -> Result<(), HandlerError> {
    info!(requester = %inv.requester.id, "setup start");
    inv.reply(SETUP_START_MESSAGE).await
}

async fn setup_token<P: TenantProvisioner>(provisioner: &P, inv: Invocation) -> Result<(), HandlerError> {
    let requester = inv.requester.id.clone();
    info!(requester = %requester, "setup token");

    let Some(token) = inv.option_str(0).map(str::to_string) else {
        return inv.reply(TOKEN_MISSING).await;
    };
    // Validation and boot can outlast the interaction deadline.
    inv.defer().await?;

    let content = match provisioner
        .create_tenant(&requester, SecretString::from(token))
        .await
    {
        Ok(()) => match provisioner.start_tenant(&requester).await {
            Ok(()) => TENANT_CREATED,
            Err(e) => {
                warn!(requester = %requester, error = %e, "tenant created but not started");
                TENANT_NOT_STARTED
            }
        },
        Err(TenantError::AlreadyExists) => TENANT_EXISTS,
        Err(TenantError::InvalidCredential) => TOKEN_INVALID,
        Err(TenantError::UnableToStart) => TENANT_NOT_STARTED,
        Err(e) => {
            error!(requester = %requester, error = %e, "failed to create tenant");
            TENANT_CREATE_FAILED
        }
    };
    inv.edit_reply(content).await
}

async fn setup_link<P: TenantProvisioner>(provisioner: &P, inv: Invocation) -> Result<(), HandlerError> {
    info!(requester = %inv.requester.id, "setup link");

    let content = match provisioner.server_link(&inv.requester.id).await {
        Ok(link) => format!(
            "Give this link to an admin of each server you'd like your Synth to join: {link}\n\nYou should also Add to My Apps."
        ),
        Err(TenantError::NotFound) => TENANT_MISSING.to_string(),
        Err(e) => {
            error!(requester = %inv.requester.id, error = %e, "failed to look up tenant");
            TENANT_LOOKUP_FAILED.to_string()
        }
    };
    inv.reply(content).await
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use secrecy::ExposeSecret;
    use synthos_types::interaction::{
        CommandOptionValue, InteractionReply, OptionValue, ReplyMessage,
    };

    use super::*;
    use crate::testing::{Call, MockConnection, command_event, guild_command_event};

    #[derive(Default)]
    struct FakeProvisioner {
        tokens: Mutex<HashMap<String, String>>,
        fail_start: bool,
        started: Mutex<Vec<String>>,
    }

    impl TenantProvisioner for FakeProvisioner {
        async fn create_tenant(&self, requester: &str, token: SecretString) -> Result<(), TenantError> {
            let token = token.expose_secret().to_string();
            if token == "bad" {
                return Err(TenantError::InvalidCredential);
            }
            if token == "broken" {
                return Err(TenantError::Internal("disk full".to_string()));
            }
            let mut tokens = self.tokens.lock().unwrap();
            if tokens.contains_key(requester) {
                return Err(TenantError::AlreadyExists);
            }
            tokens.insert(requester.to_string(), token);
            Ok(())
        }

        async fn start_tenant(&self, requester: &str) -> Result<(), TenantError> {
            if self.fail_start {
                return Err(TenantError::UnableToStart);
            }
            self.started.lock().unwrap().push(requester.to_string());
            Ok(())
        }

        async fn server_link(&self, requester: &str) -> Result<String, TenantError> {
            if self.tokens.lock().unwrap().contains_key(requester) {
                Ok(format!("https://example.test/{requester}"))
            } else {
                Err(TenantError::NotFound)
            }
        }
    }

    fn token_options(token: &str) -> Vec<CommandOptionValue> {
        vec![CommandOptionValue::new(
            "token",
            OptionValue::SubCommand(vec![CommandOptionValue::new(
                "token",
                OptionValue::String(token.to_string()),
            )]),
        )]
    }

    fn link_options() -> Vec<CommandOptionValue> {
        vec![CommandOptionValue::new("link", OptionValue::SubCommand(Vec::new()))]
    }

    async fn run(
        provisioner: &Arc<FakeProvisioner>,
        event: synthos_types::interaction::InteractionEvent,
    ) -> MockConnection {
        let mock = MockConnection::new();
        let tree = commands(Arc::clone(provisioner)).unwrap();
        tree.dispatch(&mock.shared(), &event).await;
        mock
    }

    #[test]
    fn test_controller_tree_shape() {
        let tree = commands(Arc::new(FakeProvisioner::default())).unwrap();
        let payload = tree.payload();
        assert_eq!(payload.len(), 1);
        assert_eq!(payload[0].name, "setup");
        let subs: Vec<_> = payload[0].subcommands.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(subs, vec!["start", "token", "link"]);
    }

    #[tokio::test]
    async fn test_setup_start_replies_with_walkthrough() {
        let provisioner = Arc::new(FakeProvisioner::default());
        let options = vec![CommandOptionValue::new("start", OptionValue::SubCommand(Vec::new()))];
        let mock = run(&provisioner, command_event("u1", "setup", options)).await;

        assert_eq!(
            mock.calls(),
            vec![Call::Respond(InteractionReply::Message(ReplyMessage::text(
                SETUP_START_MESSAGE
            )))]
        );
    }

    #[tokio::test]
    async fn test_setup_token_creates_and_starts() {
        let provisioner = Arc::new(FakeProvisioner::default());
        let mock = run(&provisioner, command_event("u1", "setup", token_options("good"))).await;

        assert_eq!(
            mock.calls(),
            vec![
                Call::Respond(InteractionReply::Defer { ephemeral: false }),
                Call::EditReply(TENANT_CREATED.to_string()),
            ]
        );
        assert_eq!(*provisioner.started.lock().unwrap(), vec!["u1".to_string()]);
    }

    #[tokio::test]
    async fn test_setup_token_twice_reports_existing() {
        let provisioner = Arc::new(FakeProvisioner::default());
        run(&provisioner, command_event("u1", "setup", token_options("good"))).await;
        let mock = run(&provisioner, command_event("u1", "setup", token_options("other"))).await;

        assert_eq!(mock.calls().last(), Some(&Call::EditReply(TENANT_EXISTS.to_string())));
    }

    #[tokio::test]
    async fn test_setup_token_invalid_credential() {
        let provisioner = Arc::new(FakeProvisioner::default());
        let mock = run(&provisioner, guild_command_event("u1", "setup", token_options("bad"))).await;

        assert_eq!(
            mock.calls(),
            vec![
                Call::Respond(InteractionReply::Defer { ephemeral: true }),
                Call::EditReply(TOKEN_INVALID.to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_setup_token_start_failure() {
        let provisioner = Arc::new(FakeProvisioner {
            fail_start: true,
            ..Default::default()
        });
        let mock = run(&provisioner, command_event("u1", "setup", token_options("good"))).await;
        assert_eq!(mock.calls().last(), Some(&Call::EditReply(TENANT_NOT_STARTED.to_string())));
    }

    #[tokio::test]
    async fn test_setup_token_hides_internal_errors() {
        let provisioner = Arc::new(FakeProvisioner::default());
        let mock = run(&provisioner, command_event("u1", "setup", token_options("broken"))).await;

        let last = mock.calls().last().cloned();
        assert_eq!(last, Some(Call::EditReply(TENANT_CREATE_FAILED.to_string())));
        assert!(!format!("{:?}", mock.calls()).contains("disk full"));
    }

    #[tokio::test]
    async fn test_setup_link() {
        let provisioner = Arc::new(FakeProvisioner::default());
        let mock = run(&provisioner, command_event("u1", "setup", link_options())).await;
        assert_eq!(
            mock.calls(),
            vec![Call::Respond(InteractionReply::Message(ReplyMessage::text(TENANT_MISSING)))]
        );

        run(&provisioner, command_event("u1", "setup", token_options("good"))).await;
        let mock = run(&provisioner, command_event("u1", "setup", link_options())).await;
        let calls = mock.calls();
        let Some(Call::Respond(InteractionReply::Message(reply))) = calls.first() else {
            panic!("expected a reply, got {calls:?}");
        };
        assert!(reply.content.contains("https://example.test/u1"));
    }
}
