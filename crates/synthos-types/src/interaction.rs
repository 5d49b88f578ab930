//! Structured user actions (command invocations, component clicks, modal
//! submissions) and the replies a handler can send back.

use serde::{Deserialize, Serialize};

use crate::platform::{Member, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    Command,
    Component,
    ModalSubmit,
}

/// A single option value supplied with a command invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OptionValue {
    String(String),
    Integer(i64),
    Number(f64),
    Boolean(bool),
    User(String),
    Channel(String),
    Role(String),
    /// A subcommand entry carrying its own nested options.
    SubCommand(Vec<CommandOptionValue>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandOptionValue {
    pub name: String,
    pub value: OptionValue,
}

impl CommandOptionValue {
    pub fn new(name: impl Into<String>, value: OptionValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            OptionValue::String(s) => Some(s),
            _ => None,
        }
    }
}

/// A submitted modal text field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModalField {
    pub custom_id: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InteractionData {
    Command {
        name: String,
        options: Vec<CommandOptionValue>,
    },
    Component {
        custom_id: String,
    },
    ModalSubmit {
        custom_id: String,
        fields: Vec<ModalField>,
    },
}

/// An inbound interaction.
///
/// Direct-message interactions carry `user`; guild interactions carry
/// `member` with the user embedded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionEvent {
    pub id: String,
    /// Continuation token used to reply to this interaction.
    pub token: String,
    pub guild_id: Option<String>,
    pub channel_id: Option<String>,
    pub user: Option<User>,
    pub member: Option<Member>,
    pub data: InteractionData,
}

impl InteractionEvent {
    pub fn kind(&self) -> InteractionKind {
        match self.data {
            InteractionData::Command { .. } => InteractionKind::Command,
            InteractionData::Component { .. } => InteractionKind::Component,
            InteractionData::ModalSubmit { .. } => InteractionKind::ModalSubmit,
        }
    }

    /// Who invoked this interaction: the direct-message user if present,
    /// otherwise the guild member's embedded user.
    pub fn invoker(&self) -> Option<&User> {
        self.user
            .as_ref()
            .or_else(|| self.member.as_ref().and_then(|m| m.user.as_ref()))
    }

    /// Interactions raised inside a guild get ephemeral replies.
    pub fn is_guild(&self) -> bool {
        self.member.is_some()
    }

    pub fn command_name(&self) -> Option<&str> {
        match &self.data {
            InteractionData::Command { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn custom_id(&self) -> Option<&str> {
        match &self.data {
            InteractionData::Component { custom_id } => Some(custom_id),
            InteractionData::ModalSubmit { custom_id, .. } => Some(custom_id),
            InteractionData::Command { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonStyle {
    Primary,
    Secondary,
    Success,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub custom_id: String,
    pub label: String,
    pub style: ButtonStyle,
    pub disabled: bool,
}

impl Button {
    pub fn new(custom_id: impl Into<String>, label: impl Into<String>, style: ButtonStyle) -> Self {
        Self {
            custom_id: custom_id.into(),
            label: label.into(),
            style,
            disabled: false,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }
}

pub type ButtonRow = Vec<Button>;

/// Message body of an interaction reply.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReplyMessage {
    pub content: String,
    /// Only visible to the invoking user.
    pub ephemeral: bool,
    pub rows: Vec<ButtonRow>,
}

impl ReplyMessage {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextInput {
    pub custom_id: String,
    pub label: String,
    pub min_length: u16,
    pub max_length: u16,
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModalForm {
    pub custom_id: String,
    pub title: String,
    pub input: TextInput,
}

/// What a handler answers an interaction with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InteractionReply {
    /// Post a new reply message.
    Message(ReplyMessage),
    /// Replace the message the clicked component belongs to.
    Update(ReplyMessage),
    /// Open a modal form.
    Modal(ModalForm),
    /// Acknowledge now, fill in the reply later with `edit_reply`.
    Defer { ephemeral: bool },
}
