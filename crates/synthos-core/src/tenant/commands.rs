//! Slash commands of a tenant session.

use std::sync::Arc;

use tracing::{error, info};

use synthos_types::error::{CommandTreeError, HandlerError};
use synthos_types::interaction::InteractionReply;

use super::TenantContext;
use super::settings::menu;
use crate::command::{CommandNode, CommandTree, Invocation};

pub const AVATAR_MISSING: &str = "You do not have a custom avatar to copy.";
pub const AVATAR_UPDATED: &str = "Avatar updated successfully.";
pub const AVATAR_FAILED: &str = "Failed to update avatar. SynthOS Controller has been notified.";
pub const GUILD_ONLY: &str = "This command can only be used in a server.";

pub fn tree(tenant: Arc<TenantContext>) -> Result<CommandTree, CommandTreeError> {
    let for_avatar = Arc::clone(&tenant);
    let for_configure = tenant;

    CommandTree::builder()
        .command(
            CommandNode::new("update-avatar")
                .description("Sync your global avatar to your Synth instance")
                .handler(move |inv: Invocation| {
                    let tenant = Arc::clone(&for_avatar);
                    async move { update_avatar(&tenant, inv).await }
                }),
        )
        .command(
            CommandNode::new("configure")
                .description("Configure your Synth in this server")
                .handler(move |inv: Invocation| {
                    let tenant = Arc::clone(&for_configure);
                    async move { configure(&tenant, inv).await }
                }),
        )
        .build()
}

async fn update_avatar(tenant: &TenantContext, inv: Invocation) -> Result<(), HandlerError> {
    info!(owner_id = %tenant.owner_id, "update avatar");
    if !tenant.gate(&inv).await? {
        return Ok(());
    }
    if inv.requester.avatar.is_none() {
        return inv.reply(AVATAR_MISSING).await;
    }

    inv.defer().await?;
    match inv.connection.update_avatar(&inv.requester).await {
        Ok(()) => inv.edit_reply(AVATAR_UPDATED).await,
        Err(e) => {
            error!(
                owner_id = %tenant.owner_id,
                operator = tenant.operator(),
                error = %e,
                "failed to update avatar"
            );
            inv.edit_reply(AVATAR_FAILED).await
        }
    }
}

async fn configure(tenant: &TenantContext, inv: Invocation) -> Result<(), HandlerError> {
    info!(owner_id = %tenant.owner_id, "configure");
    if !tenant.gate(&inv).await? {
        return Ok(());
    }
    let Some(guild_id) = inv.interaction.guild_id.as_deref() else {
        return inv.reply(GUILD_ONLY).await;
    };

    let name = inv
        .connection
        .current_nickname(guild_id)
        .await?
        .unwrap_or_default();
    let settings = *tenant.settings.lock().await;
    inv.respond(InteractionReply::Message(menu(&name, &settings, None)))
        .await
}

#[cfg(test)]
mod tests {
    use synthos_types::interaction::{InteractionEvent, ReplyMessage};

    use super::*;
    use crate::auth::{NOT_AUTHORIZED, SelfPolicy};
    use crate::testing::{Call, MockConnection, Op, command_event, guild_command_event};

    fn tenant_tree() -> CommandTree {
        let tenant = Arc::new(TenantContext::new("owner", Arc::new(SelfPolicy), None));
        tree(tenant).unwrap()
    }

    fn with_avatar(mut event: InteractionEvent) -> InteractionEvent {
        if let Some(user) = event.user.as_mut() {
            user.avatar = Some("a_hash".to_string());
        }
        event
    }

    #[tokio::test]
    async fn test_update_avatar_copies_requester_avatar() {
        let mock = MockConnection::new();
        let event = with_avatar(command_event("owner", "update-avatar", Vec::new()));

        tenant_tree().dispatch(&mock.shared(), &event).await;

        assert_eq!(
            mock.calls(),
            vec![
                Call::Respond(InteractionReply::Defer { ephemeral: false }),
                Call::UpdateAvatar("owner".to_string()),
                Call::EditReply(AVATAR_UPDATED.to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_update_avatar_failure_reports_generic_message() {
        let mock = MockConnection::new();
        mock.fail(Op::Avatar);
        let event = with_avatar(command_event("owner", "update-avatar", Vec::new()));

        tenant_tree().dispatch(&mock.shared(), &event).await;

        assert_eq!(mock.calls().last(), Some(&Call::EditReply(AVATAR_FAILED.to_string())));
    }

    #[tokio::test]
    async fn test_update_avatar_without_avatar() {
        let mock = MockConnection::new();
        tenant_tree()
            .dispatch(&mock.shared(), &command_event("owner", "update-avatar", Vec::new()))
            .await;

        assert_eq!(
            mock.calls(),
            vec![Call::Respond(InteractionReply::Message(ReplyMessage::text(
                AVATAR_MISSING
            )))]
        );
    }

    #[tokio::test]
    async fn test_update_avatar_refuses_stranger() {
        let mock = MockConnection::new();
        let event = with_avatar(command_event("stranger", "update-avatar", Vec::new()));

        tenant_tree().dispatch(&mock.shared(), &event).await;

        assert_eq!(
            mock.calls(),
            vec![Call::Respond(InteractionReply::Message(ReplyMessage::text(
                NOT_AUTHORIZED
            )))]
        );
    }

    #[tokio::test]
    async fn test_configure_shows_menu() {
        let mock = MockConnection::new();
        mock.set_current_nickname("Unit 7");

        tenant_tree()
            .dispatch(&mock.shared(), &guild_command_event("owner", "configure", Vec::new()))
            .await;

        let calls = mock.calls();
        let [Call::Respond(InteractionReply::Message(reply))] = calls.as_slice() else {
            panic!("expected one menu reply, got {calls:?}");
        };
        assert!(reply.ephemeral);
        assert!(reply.content.starts_with("Configuration options for Unit 7"));
    }

    #[tokio::test]
    async fn test_configure_outside_guild() {
        let mock = MockConnection::new();
        tenant_tree()
            .dispatch(&mock.shared(), &command_event("owner", "configure", Vec::new()))
            .await;

        assert_eq!(
            mock.calls(),
            vec![Call::Respond(InteractionReply::Message(ReplyMessage::text(
                GUILD_ONLY
            )))]
        );
    }
}
