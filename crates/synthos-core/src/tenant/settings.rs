//! The `/configure` menu: volatile counters and the tenant nickname.

use std::sync::Arc;

use futures_util::future::BoxFuture;
use tracing::{debug, error, warn};

use synthos_types::error::HandlerError;
use synthos_types::interaction::{
    Button, ButtonRow, ButtonStyle, InteractionData, InteractionEvent, InteractionReply,
    ModalField, ModalForm, ReplyMessage, TextInput,
};
use synthos_types::platform::PlatformEvent;

use super::TenantContext;
use crate::command::Invocation;
use crate::session::{Listener, SessionContext};

pub const NAME_BUTTON: &str = "synth_name";
pub const NAME_INPUT: &str = "synth_name";
pub const NAME_UNREADABLE: &str = "Unable to parse new name";
pub const NAME_FAILED: &str = "Unable to set new name.";

/// Per-session settings. Not persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TenantSettings {
    pub max_energy: i64,
    pub regen: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    MaxEnergy,
    Regen,
}

impl TenantSettings {
    /// Apply `delta` and return the new value.
    pub fn adjust(&mut self, counter: Counter, delta: i64) -> i64 {
        let value = match counter {
            Counter::MaxEnergy => &mut self.max_energy,
            Counter::Regen => &mut self.regen,
        };
        *value = value.saturating_add(delta);
        *value
    }
}

/// Parse counter button ids such as `max_m10` or `regen_p1`.
pub fn parse_adjustment(custom_id: &str) -> Option<(Counter, i64)> {
    let (prefix, step) = custom_id.split_once('_')?;
    let counter = match prefix {
        "max" => Counter::MaxEnergy,
        "regen" => Counter::Regen,
        _ => return None,
    };
    let delta = match step {
        "m10" => -10,
        "m1" => -1,
        "p1" => 1,
        "p10" => 10,
        _ => return None,
    };
    Some((counter, delta))
}

/// Modal ids are bound to the requester that opened them.
pub fn name_modal_id(requester_id: &str) -> String {
    format!("synth_name_{requester_id}")
}

fn counter_row(prefix: &str, value: i64) -> ButtonRow {
    vec![
        Button::new(format!("{prefix}_m10"), "-10", ButtonStyle::Secondary),
        Button::new(format!("{prefix}_m1"), "-1", ButtonStyle::Primary),
        Button::new(format!("{prefix}_disp"), value.to_string(), ButtonStyle::Success).disabled(),
        Button::new(format!("{prefix}_p1"), "+1", ButtonStyle::Primary),
        Button::new(format!("{prefix}_p10"), "+10", ButtonStyle::Secondary),
    ]
}

/// Render the menu for a tenant currently called `name`.
pub fn menu(name: &str, settings: &TenantSettings, header: Option<&str>) -> ReplyMessage {
    let mut lines = Vec::with_capacity(5);
    if let Some(header) = header {
        lines.push(header.to_string());
    }
    lines.push(format!("Configuration options for {name}"));
    lines.push(format!("Synth Name: {name}"));
    lines.push(format!("Maximum Energy: {}", settings.max_energy));
    lines.push(format!("Energy Regen per Minute: {}", settings.regen));

    ReplyMessage {
        content: lines.join("\n"),
        ephemeral: true,
        rows: vec![
            vec![Button::new(NAME_BUTTON, "Change", ButtonStyle::Primary)],
            counter_row("max", settings.max_energy),
            counter_row("regen", settings.regen),
        ],
    }
}

/// Handles clicks on the menu and the nickname modal.
pub struct SettingsMenu {
    tenant: Arc<TenantContext>,
}

impl SettingsMenu {
    pub fn new(tenant: Arc<TenantContext>) -> Self {
        Self { tenant }
    }

    pub async fn handle(
        &self,
        ctx: &SessionContext,
        interaction: &InteractionEvent,
    ) -> Result<(), HandlerError> {
        let Some(requester) = interaction.invoker().cloned() else {
            warn!(interaction_id = %interaction.id, "dropping interaction without invoker");
            return Ok(());
        };
        let Some(guild_id) = interaction.guild_id.clone() else {
            debug!(interaction_id = %interaction.id, "ignoring menu interaction outside a guild");
            return Ok(());
        };
        let inv = Invocation {
            connection: Arc::clone(&ctx.connection),
            requester,
            interaction: interaction.clone(),
            options: Vec::new(),
        };

        match &interaction.data {
            InteractionData::Component { custom_id } => {
                self.on_click(&inv, &guild_id, custom_id).await
            }
            InteractionData::ModalSubmit { custom_id, fields } => {
                self.on_submit(&inv, &guild_id, custom_id, fields).await
            }
            InteractionData::Command { .. } => Ok(()),
        }
    }

    async fn on_click(
        &self,
        inv: &Invocation,
        guild_id: &str,
        custom_id: &str,
    ) -> Result<(), HandlerError> {
        let adjustment = parse_adjustment(custom_id);
        if custom_id != NAME_BUTTON && adjustment.is_none() {
            debug!(custom_id, "ignoring unknown component");
            return Ok(());
        }
        if !self.tenant.gate(inv).await? {
            return Ok(());
        }
        let name = inv
            .connection
            .current_nickname(guild_id)
            .await?
            .unwrap_or_default();

        let Some((counter, delta)) = adjustment else {
            return inv
                .respond(InteractionReply::Modal(ModalForm {
                    custom_id: name_modal_id(&inv.requester.id),
                    title: "Set Synth Name".to_string(),
                    input: TextInput {
                        custom_id: NAME_INPUT.to_string(),
                        label: "Synth Name".to_string(),
                        min_length: 1,
                        max_length: 32,
                        value: Some(name),
                    },
                }))
                .await;
        };

        let (settings, value) = {
            let mut settings = self.tenant.settings.lock().await;
            let value = settings.adjust(counter, delta);
            (*settings, value)
        };
        let header = match counter {
            Counter::MaxEnergy => format!("Maximum energy set to {value}"),
            Counter::Regen => format!("Energy regen set to {value}"),
        };
        inv.respond(InteractionReply::Update(menu(&name, &settings, Some(&header))))
            .await
    }

    async fn on_submit(
        &self,
        inv: &Invocation,
        guild_id: &str,
        custom_id: &str,
        fields: &[ModalField],
    ) -> Result<(), HandlerError> {
        if custom_id != name_modal_id(&inv.requester.id) {
            warn!(custom_id, requester = %inv.requester.id, "ignoring modal with foreign id");
            return Ok(());
        }
        if !self.tenant.gate(inv).await? {
            return Ok(());
        }

        let requested = fields
            .iter()
            .find(|f| f.custom_id == NAME_INPUT)
            .map(|f| f.value.trim().to_string())
            .filter(|name| !name.is_empty());
        let (name, header) = match requested {
            Some(name) => match inv.connection.set_nickname(guild_id, &name).await {
                Ok(()) => {
                    let header = format!("Synth name set to {name}");
                    (name, header)
                }
                Err(e) => {
                    error!(
                        owner_id = %self.tenant.owner_id,
                        operator = self.tenant.operator(),
                        error = %e,
                        "failed to set nickname"
                    );
                    let current = inv.connection.current_nickname(guild_id).await?;
                    (current.unwrap_or_default(), NAME_FAILED.to_string())
                }
            },
            None => {
                let current = inv.connection.current_nickname(guild_id).await?;
                (current.unwrap_or_default(), NAME_UNREADABLE.to_string())
            }
        };

        let settings = *self.tenant.settings.lock().await;
        inv.respond(InteractionReply::Update(menu(&name, &settings, Some(&header))))
            .await
    }
}

impl Listener for SettingsMenu {
    fn on_event<'a>(
        &'a self,
        ctx: &'a SessionContext,
        event: &'a PlatformEvent,
    ) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            let PlatformEvent::Interaction(interaction) = event else {
                return;
            };
            if let Err(e) = self.handle(ctx, interaction).await {
                error!(
                    owner_id = %self.tenant.owner_id,
                    operator = self.tenant.operator(),
                    error = %e,
                    "settings menu handler failed"
                );
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{NOT_AUTHORIZED, SelfPolicy};
    use crate::session::SessionLabel;
    use crate::testing::{Call, MockConnection, Op, component_event, modal_event};

    fn setup() -> (MockConnection, SessionContext, SettingsMenu) {
        let mock = MockConnection::new();
        mock.set_current_nickname("Unit 7");
        let ctx = SessionContext {
            label: SessionLabel::Tenant("owner".to_string()),
            info: mock.info(),
            connection: mock.shared(),
        };
        let tenant = Arc::new(TenantContext::new("owner", Arc::new(SelfPolicy), None));
        (mock, ctx, SettingsMenu::new(tenant))
    }

    fn field(value: &str) -> Vec<ModalField> {
        vec![ModalField {
            custom_id: NAME_INPUT.to_string(),
            value: value.to_string(),
        }]
    }

    fn only_reply(mock: &MockConnection) -> InteractionReply {
        let replies: Vec<_> = mock
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Respond(reply) => Some(reply),
                _ => None,
            })
            .collect();
        assert_eq!(replies.len(), 1, "expected one reply, got {replies:?}");
        replies.into_iter().next().unwrap()
    }

    #[test]
    fn test_parse_adjustment() {
        assert_eq!(parse_adjustment("max_m10"), Some((Counter::MaxEnergy, -10)));
        assert_eq!(parse_adjustment("regen_p1"), Some((Counter::Regen, 1)));
        assert_eq!(parse_adjustment("max_disp"), None);
        assert_eq!(parse_adjustment("synth_name"), None);
        assert_eq!(parse_adjustment("nonsense"), None);
    }

    #[test]
    fn test_menu_layout() {
        let settings = TenantSettings {
            max_energy: 5,
            regen: -2,
        };
        let reply = menu("Unit 7", &settings, Some("hello"));

        assert!(reply.ephemeral);
        assert!(reply.content.starts_with("hello\nConfiguration options for Unit 7"));
        assert_eq!(reply.rows.len(), 3);
        assert_eq!(reply.rows[1][2].label, "5");
        assert!(reply.rows[1][2].disabled);
        assert_eq!(reply.rows[2][2].label, "-2");
        assert_eq!(reply.rows[2][4].custom_id, "regen_p10");
    }

    #[tokio::test]
    async fn test_counter_click_updates_menu() {
        let (mock, ctx, menu_listener) = setup();
        menu_listener
            .handle(&ctx, &component_event("owner", "max_p10"))
            .await
            .unwrap();
        menu_listener
            .handle(&ctx, &component_event("owner", "max_m1"))
            .await
            .unwrap();

        assert_eq!(menu_listener.tenant.settings.lock().await.max_energy, 9);
        let last = mock.calls().last().cloned();
        let Some(Call::Respond(InteractionReply::Update(reply))) = last else {
            panic!("expected a menu update, got {last:?}");
        };
        assert!(reply.content.starts_with("Maximum energy set to 9"));
    }

    #[tokio::test]
    async fn test_click_by_stranger_is_refused() {
        let (mock, ctx, menu_listener) = setup();
        menu_listener
            .handle(&ctx, &component_event("stranger", "regen_p1"))
            .await
            .unwrap();

        assert_eq!(menu_listener.tenant.settings.lock().await.regen, 0);
        assert!(matches!(
            only_reply(&mock),
            InteractionReply::Message(ReplyMessage { content, .. }) if content == NOT_AUTHORIZED
        ));
    }

    #[tokio::test]
    async fn test_unknown_component_is_ignored() {
        let (mock, ctx, menu_listener) = setup();
        menu_listener
            .handle(&ctx, &component_event("owner", "something_else"))
            .await
            .unwrap();
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn test_name_button_opens_modal() {
        let (mock, ctx, menu_listener) = setup();
        menu_listener
            .handle(&ctx, &component_event("owner", NAME_BUTTON))
            .await
            .unwrap();

        let InteractionReply::Modal(form) = only_reply(&mock) else {
            panic!("expected a modal");
        };
        assert_eq!(form.custom_id, "synth_name_owner");
        assert_eq!(form.input.value.as_deref(), Some("Unit 7"));
    }

    #[tokio::test]
    async fn test_modal_sets_nickname() {
        let (mock, ctx, menu_listener) = setup();
        menu_listener
            .handle(&ctx, &modal_event("owner", "synth_name_owner", field("Unit 9")))
            .await
            .unwrap();

        assert_eq!(
            mock.count(|c| *c
                == Call::SetNickname {
                    guild_id: "g1".to_string(),
                    nickname: "Unit 9".to_string()
                }),
            1
        );
        let InteractionReply::Update(reply) = only_reply(&mock) else {
            panic!("expected a menu update");
        };
        assert!(reply.content.starts_with("Synth name set to Unit 9"));
    }

    #[tokio::test]
    async fn test_modal_failure_hides_error() {
        let (mock, ctx, menu_listener) = setup();
        mock.fail(Op::SetNickname);
        menu_listener
            .handle(&ctx, &modal_event("owner", "synth_name_owner", field("Unit 9")))
            .await
            .unwrap();

        let InteractionReply::Update(reply) = only_reply(&mock) else {
            panic!("expected a menu update");
        };
        assert!(reply.content.starts_with(NAME_FAILED));
        assert!(reply.content.contains("Synth Name: Unit 7"));
        assert!(!reply.content.contains("failed"));
    }

    #[tokio::test]
    async fn test_modal_with_foreign_id_is_ignored() {
        let (mock, ctx, menu_listener) = setup();
        menu_listener
            .handle(&ctx, &modal_event("owner", "synth_name_someone", field("X")))
            .await
            .unwrap();
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn test_modal_without_value_reports_unreadable() {
        let (mock, ctx, menu_listener) = setup();
        menu_listener
            .handle(&ctx, &modal_event("owner", "synth_name_owner", field("   ")))
            .await
            .unwrap();

        let InteractionReply::Update(reply) = only_reply(&mock) else {
            panic!("expected a menu update");
        };
        assert!(reply.content.starts_with(NAME_UNREADABLE));
        assert!(reply.content.contains("Unit 7"));
    }
}
