//! Translation between serenity's wire models and the SynthOS platform types.

use serenity::all::{
    ActionRowComponent, ActivityData, ActivityType, ButtonStyle as SerenityButtonStyle, ChannelId,
    CommandDataOption, CommandDataOptionValue, CommandOptionType, CreateActionRow, CreateButton,
    CreateCommand, CreateCommandOption, CreateInputText, CreateInteractionResponse,
    CreateInteractionResponseMessage, CreateMessage, CreateModal, InputTextStyle, Interaction,
    MessageId, MessageType, OnlineStatus,
};

use synthos_types::command::{CommandSpec, OptionKind, OptionSpec};
use synthos_types::error::ConnectionError;
use synthos_types::interaction::{
    ButtonRow, ButtonStyle, CommandOptionValue, InteractionData, InteractionEvent,
    InteractionReply, ModalField, ModalForm, OptionValue, ReplyMessage,
};
use synthos_types::platform::{
    Activity, ActivityKind, Member, Message, MessageEvent, MessageReference, OutgoingMessage,
    PresenceEvent, PresenceStatus, ReferenceKind, User,
};

use super::snowflake;

// ---------------------------------------------------------------------------
// Inbound
// ---------------------------------------------------------------------------

pub fn user(u: &serenity::all::User) -> User {
    User {
        id: u.id.to_string(),
        name: u.name.clone(),
        avatar: u.avatar.as_ref().map(ToString::to_string),
    }
}

pub fn member(m: &serenity::all::Member) -> Member {
    Member {
        user: Some(user(&m.user)),
        nick: m.nick.clone(),
    }
}

/// serenity fills `user` for guild interactions too; keep it only for
/// direct messages so `InteractionEvent::is_guild` stays meaningful.
fn direct_user(has_member: bool, u: &serenity::all::User) -> Option<User> {
    (!has_member).then(|| user(u))
}

fn option_values(options: &[CommandDataOption]) -> Vec<CommandOptionValue> {
    options
        .iter()
        .filter_map(|option| {
            let value = match &option.value {
                CommandDataOptionValue::String(s) => OptionValue::String(s.clone()),
                CommandDataOptionValue::Integer(i) => OptionValue::Integer(*i),
                CommandDataOptionValue::Number(n) => OptionValue::Number(*n),
                CommandDataOptionValue::Boolean(b) => OptionValue::Boolean(*b),
                CommandDataOptionValue::User(id) => OptionValue::User(id.to_string()),
                CommandDataOptionValue::Channel(id) => OptionValue::Channel(id.to_string()),
                CommandDataOptionValue::Role(id) => OptionValue::Role(id.to_string()),
                CommandDataOptionValue::Mentionable(id) => OptionValue::String(id.to_string()),
                CommandDataOptionValue::Attachment(id) => OptionValue::String(id.to_string()),
                CommandDataOptionValue::Autocomplete { value, .. } => {
                    OptionValue::String(value.clone())
                }
                CommandDataOptionValue::SubCommand(nested)
                | CommandDataOptionValue::SubCommandGroup(nested) => {
                    OptionValue::SubCommand(option_values(nested))
                }
                _ => return None,
            };
            Some(CommandOptionValue::new(&option.name, value))
        })
        .collect()
}

/// Convert a gateway interaction. Pings and autocomplete requests are not
/// routed to sessions and yield `None`.
pub fn interaction(interaction: &Interaction) -> Option<InteractionEvent> {
    match interaction {
        Interaction::Command(command) => Some(InteractionEvent {
            id: command.id.to_string(),
            token: command.token.clone(),
            guild_id: command.guild_id.map(|g| g.to_string()),
            channel_id: Some(command.channel_id.to_string()),
            user: direct_user(command.member.is_some(), &command.user),
            member: command.member.as_ref().map(|m| member(m)),
            data: InteractionData::Command {
                name: command.data.name.clone(),
                options: option_values(&command.data.options),
            },
        }),
        Interaction::Component(component) => Some(InteractionEvent {
            id: component.id.to_string(),
            token: component.token.clone(),
            guild_id: component.guild_id.map(|g| g.to_string()),
            channel_id: Some(component.channel_id.to_string()),
            user: direct_user(component.member.is_some(), &component.user),
            member: component.member.as_ref().map(|m| member(m)),
            data: InteractionData::Component {
                custom_id: component.data.custom_id.clone(),
            },
        }),
        Interaction::Modal(submit) => {
            let fields = submit
                .data
                .components
                .iter()
                .flat_map(|row| row.components.iter())
                .filter_map(|component| match component {
                    ActionRowComponent::InputText(input) => Some(ModalField {
                        custom_id: input.custom_id.clone(),
                        value: input.value.clone().unwrap_or_default(),
                    }),
                    _ => None,
                })
                .collect();
            Some(InteractionEvent {
                id: submit.id.to_string(),
                token: submit.token.clone(),
                guild_id: submit.guild_id.map(|g| g.to_string()),
                channel_id: Some(submit.channel_id.to_string()),
                user: direct_user(submit.member.is_some(), &submit.user),
                member: submit.member.as_ref().map(|m| member(m)),
                data: InteractionData::ModalSubmit {
                    custom_id: submit.data.custom_id.clone(),
                    fields,
                },
            })
        }
        _ => None,
    }
}

pub fn message_event(m: &serenity::all::Message) -> MessageEvent {
    let reference = m.message_reference.as_ref().and_then(|r| {
        let message_id = r.message_id?;
        let kind = if m.kind == MessageType::InlineReply {
            ReferenceKind::Reply
        } else {
            ReferenceKind::Forward
        };
        Some(MessageReference {
            message_id: message_id.to_string(),
            channel_id: r.channel_id.to_string(),
            guild_id: r.guild_id.map(|g| g.to_string()),
            kind,
        })
    });

    MessageEvent {
        id: m.id.to_string(),
        channel_id: m.channel_id.to_string(),
        guild_id: m.guild_id.map(|g| g.to_string()),
        author: user(&m.author),
        content: m.content.clone(),
        reference,
    }
}

pub fn message(m: &serenity::all::Message) -> Message {
    Message {
        id: m.id.to_string(),
        channel_id: m.channel_id.to_string(),
        author_id: m.author.id.to_string(),
        content: m.content.clone(),
    }
}

pub fn presence_status(status: OnlineStatus) -> PresenceStatus {
    match status {
        OnlineStatus::Online => PresenceStatus::Online,
        OnlineStatus::Idle => PresenceStatus::Idle,
        OnlineStatus::DoNotDisturb => PresenceStatus::DoNotDisturb,
        OnlineStatus::Invisible => PresenceStatus::Invisible,
        _ => PresenceStatus::Offline,
    }
}

fn activity_kind(kind: ActivityType) -> ActivityKind {
    match kind {
        ActivityType::Streaming => ActivityKind::Streaming,
        ActivityType::Listening => ActivityKind::Listening,
        ActivityType::Watching => ActivityKind::Watching,
        ActivityType::Custom => ActivityKind::Custom,
        ActivityType::Competing => ActivityKind::Competing,
        _ => ActivityKind::Playing,
    }
}

pub fn presence_event(p: &serenity::all::Presence) -> PresenceEvent {
    PresenceEvent {
        user_id: p.user.id.to_string(),
        status: presence_status(p.status),
        activity: p.activities.first().map(|a| Activity {
            kind: activity_kind(a.kind),
            // Custom statuses carry their text in `state`.
            name: match (a.kind, &a.state) {
                (ActivityType::Custom, Some(state)) => state.clone(),
                _ => a.name.clone(),
            },
        }),
    }
}

// ---------------------------------------------------------------------------
// Outbound
// ---------------------------------------------------------------------------

pub fn online_status(status: PresenceStatus) -> OnlineStatus {
    match status {
        PresenceStatus::Online => OnlineStatus::Online,
        PresenceStatus::Idle => OnlineStatus::Idle,
        PresenceStatus::DoNotDisturb => OnlineStatus::DoNotDisturb,
        PresenceStatus::Invisible => OnlineStatus::Invisible,
        PresenceStatus::Offline => OnlineStatus::Offline,
    }
}

/// Bots cannot stream without a URL; such activities fall back to playing.
pub fn activity_data(activity: &Activity) -> ActivityData {
    let name = activity.name.clone();
    match activity.kind {
        ActivityKind::Playing | ActivityKind::Streaming => ActivityData::playing(name),
        ActivityKind::Listening => ActivityData::listening(name),
        ActivityKind::Watching => ActivityData::watching(name),
        ActivityKind::Competing => ActivityData::competing(name),
        ActivityKind::Custom => ActivityData::custom(name),
    }
}

fn option_type(kind: OptionKind) -> CommandOptionType {
    match kind {
        OptionKind::String => CommandOptionType::String,
        OptionKind::Integer => CommandOptionType::Integer,
        OptionKind::Number => CommandOptionType::Number,
        OptionKind::Boolean => CommandOptionType::Boolean,
        OptionKind::User => CommandOptionType::User,
        OptionKind::Channel => CommandOptionType::Channel,
        OptionKind::Role => CommandOptionType::Role,
        OptionKind::Mentionable => CommandOptionType::Mentionable,
        OptionKind::Attachment => CommandOptionType::Attachment,
    }
}

fn command_option(option: &OptionSpec) -> CreateCommandOption {
    CreateCommandOption::new(option_type(option.kind), &option.name, &option.description)
        .required(option.required)
}

pub fn commands(payload: &[CommandSpec]) -> Vec<CreateCommand> {
    payload
        .iter()
        .map(|spec| {
            let mut command = CreateCommand::new(&spec.name).description(&spec.description);
            for option in &spec.options {
                command = command.add_option(command_option(option));
            }
            for sub in &spec.subcommands {
                let mut subcommand = CreateCommandOption::new(
                    CommandOptionType::SubCommand,
                    &sub.name,
                    &sub.description,
                );
                for option in &sub.options {
                    subcommand = subcommand.add_sub_option(command_option(option));
                }
                command = command.add_option(subcommand);
            }
            command
        })
        .collect()
}

fn button_style(style: ButtonStyle) -> SerenityButtonStyle {
    match style {
        ButtonStyle::Primary => SerenityButtonStyle::Primary,
        ButtonStyle::Secondary => SerenityButtonStyle::Secondary,
        ButtonStyle::Success => SerenityButtonStyle::Success,
        ButtonStyle::Danger => SerenityButtonStyle::Danger,
    }
}

fn action_rows(rows: &[ButtonRow]) -> Vec<CreateActionRow> {
    rows.iter()
        .map(|row| {
            CreateActionRow::Buttons(
                row.iter()
                    .map(|b| {
                        CreateButton::new(&b.custom_id)
                            .label(&b.label)
                            .style(button_style(b.style))
                            .disabled(b.disabled)
                    })
                    .collect(),
            )
        })
        .collect()
}

fn response_message(reply: &ReplyMessage) -> CreateInteractionResponseMessage {
    CreateInteractionResponseMessage::new()
        .content(&reply.content)
        .ephemeral(reply.ephemeral)
        .components(action_rows(&reply.rows))
}

fn modal(form: &ModalForm) -> CreateModal {
    let mut input = CreateInputText::new(
        InputTextStyle::Short,
        &form.input.label,
        &form.input.custom_id,
    )
    .min_length(form.input.min_length)
    .max_length(form.input.max_length)
    .required(true);
    if let Some(value) = &form.input.value {
        input = input.value(value);
    }
    CreateModal::new(&form.custom_id, &form.title)
        .components(vec![CreateActionRow::InputText(input)])
}

pub fn interaction_response(reply: &InteractionReply) -> CreateInteractionResponse {
    match reply {
        InteractionReply::Message(message) => {
            CreateInteractionResponse::Message(response_message(message))
        }
        InteractionReply::Update(message) => {
            CreateInteractionResponse::UpdateMessage(response_message(message))
        }
        InteractionReply::Modal(form) => CreateInteractionResponse::Modal(modal(form)),
        InteractionReply::Defer { ephemeral } => CreateInteractionResponse::Defer(
            CreateInteractionResponseMessage::new().ephemeral(*ephemeral),
        ),
    }
}

/// Build a channel message; a reference becomes a reply to that message.
pub fn create_message(message: &OutgoingMessage) -> Result<CreateMessage, ConnectionError> {
    let mut builder = CreateMessage::new().content(&message.content);
    if let Some(reference) = &message.reference {
        let channel = ChannelId::new(snowflake(&reference.channel_id)?);
        let referenced = MessageId::new(snowflake(&reference.message_id)?);
        builder = builder.reference_message((channel, referenced));
    }
    Ok(builder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use synthos_types::command::SubcommandSpec;
    use synthos_types::interaction::{Button, TextInput};

    fn setup_payload() -> Vec<CommandSpec> {
        vec![CommandSpec {
            name: "setup".to_string(),
            description: "Manage your synth".to_string(),
            options: Vec::new(),
            subcommands: vec![SubcommandSpec {
                name: "token".to_string(),
                description: "Provide a token".to_string(),
                options: vec![OptionSpec {
                    name: "token".to_string(),
                    description: "Bot token".to_string(),
                    kind: OptionKind::String,
                    required: true,
                }],
            }],
        }]
    }

    #[test]
    fn test_commands_nest_subcommand_options() {
        let built = commands(&setup_payload());
        let json = serde_json::to_value(&built).unwrap();

        assert_eq!(json[0]["name"], "setup");
        assert_eq!(json[0]["description"], "Manage your synth");
        let sub = &json[0]["options"][0];
        assert_eq!(sub["name"], "token");
        assert_eq!(sub["type"], 1);
        assert_eq!(sub["options"][0]["type"], 3);
        assert_eq!(sub["options"][0]["required"], true);
    }

    #[test]
    fn test_message_reply_carries_buttons() {
        let reply = InteractionReply::Message(ReplyMessage {
            content: "hello".to_string(),
            ephemeral: true,
            rows: vec![vec![Button::new("max_p1", "Max", ButtonStyle::Primary)]],
        });
        let json = serde_json::to_value(interaction_response(&reply)).unwrap();

        assert_eq!(json["type"], 4);
        assert_eq!(json["data"]["content"], "hello");
        assert_eq!(json["data"]["components"][0]["components"][0]["custom_id"], "max_p1");
    }

    #[test]
    fn test_update_and_defer_response_types() {
        let update = InteractionReply::Update(ReplyMessage::text("menu"));
        let defer = InteractionReply::Defer { ephemeral: false };

        assert_eq!(serde_json::to_value(interaction_response(&update)).unwrap()["type"], 7);
        assert_eq!(serde_json::to_value(interaction_response(&defer)).unwrap()["type"], 5);
    }

    #[test]
    fn test_modal_carries_prefilled_input() {
        let reply = InteractionReply::Modal(ModalForm {
            custom_id: "synth_name_u1".to_string(),
            title: "Rename".to_string(),
            input: TextInput {
                custom_id: "name".to_string(),
                label: "Nickname".to_string(),
                min_length: 1,
                max_length: 32,
                value: Some("synth".to_string()),
            },
        });
        let json = serde_json::to_value(interaction_response(&reply)).unwrap();

        assert_eq!(json["type"], 9);
        assert_eq!(json["data"]["custom_id"], "synth_name_u1");
        let input = &json["data"]["components"][0]["components"][0];
        assert_eq!(input["custom_id"], "name");
        assert_eq!(input["value"], "synth");
        assert_eq!(input["max_length"], 32);
    }

    #[test]
    fn test_create_message_rejects_bad_reference() {
        let message = OutgoingMessage {
            content: "hi beep".to_string(),
            reference: Some(MessageReference {
                message_id: "not-an-id".to_string(),
                channel_id: "1".to_string(),
                guild_id: None,
                kind: ReferenceKind::Reply,
            }),
        };
        assert!(matches!(
            create_message(&message),
            Err(ConnectionError::InvalidId(id)) if id == "not-an-id"
        ));
    }

    #[test]
    fn test_status_round_trip_through_serenity() {
        for status in [
            PresenceStatus::Online,
            PresenceStatus::Idle,
            PresenceStatus::DoNotDisturb,
            PresenceStatus::Invisible,
        ] {
            assert_eq!(presence_status(online_status(status)), status);
        }
    }
}
