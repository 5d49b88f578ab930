//! Platform-neutral model of chat-platform events and outbound messages.
//!
//! Connection adapters translate their wire types into these before events
//! reach a session, so everything in `synthos-core` can be exercised without
//! a live gateway.

use serde::{Deserialize, Serialize};

use std::fmt;

use crate::interaction::{InteractionEvent, InteractionKind};

/// A platform account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    /// Avatar hash, if the user has a custom avatar.
    pub avatar: Option<String>,
}

impl User {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            avatar: None,
        }
    }
}

/// A guild member. The embedded user is optional on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub user: Option<User>,
    pub nick: Option<String>,
}

/// Identity of a connected session, known once the gateway reports ready.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub user_id: String,
    pub username: String,
    pub application_id: String,
}

/// How a message points at another one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceKind {
    Reply,
    Forward,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageReference {
    pub message_id: String,
    pub channel_id: String,
    pub guild_id: Option<String>,
    pub kind: ReferenceKind,
}

/// An inbound message creation event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEvent {
    pub id: String,
    pub channel_id: String,
    pub guild_id: Option<String>,
    pub author: User,
    pub content: String,
    pub reference: Option<MessageReference>,
}

impl MessageEvent {
    /// The reference, if it is a reply to a message in this same channel.
    pub fn same_channel_reply(&self) -> Option<&MessageReference> {
        self.reference.as_ref().filter(|r| {
            r.kind == ReferenceKind::Reply
                && r.channel_id == self.channel_id
                && r.guild_id == self.guild_id
        })
    }
}

/// A message fetched back from the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub channel_id: String,
    pub author_id: String,
    pub content: String,
}

/// A message to post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    pub content: String,
    pub reference: Option<MessageReference>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresenceStatus {
    Online,
    Idle,
    DoNotDisturb,
    Invisible,
    Offline,
}

impl fmt::Display for PresenceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PresenceStatus::Online => write!(f, "online"),
            PresenceStatus::Idle => write!(f, "idle"),
            PresenceStatus::DoNotDisturb => write!(f, "dnd"),
            PresenceStatus::Invisible => write!(f, "invisible"),
            PresenceStatus::Offline => write!(f, "offline"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Playing,
    Streaming,
    Listening,
    Watching,
    Custom,
    Competing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub kind: ActivityKind,
    pub name: String,
}

/// A presence to set on the session's own identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Presence {
    pub status: PresenceStatus,
    pub activity: Option<Activity>,
}

/// Someone's presence changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceEvent {
    pub user_id: String,
    pub status: PresenceStatus,
    pub activity: Option<Activity>,
}

/// Everything a session can receive from its connection.
#[derive(Debug, Clone, PartialEq)]
pub enum PlatformEvent {
    Ready(SessionInfo),
    Interaction(InteractionEvent),
    Message(MessageEvent),
    Presence(PresenceEvent),
}

/// Key of the per-session listener table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Ready,
    CommandInteraction,
    ComponentInteraction,
    ModalSubmit,
    MessageCreate,
    PresenceUpdate,
}

impl EventKind {
    /// Interactions are answered independently of each other and of the
    /// message stream.
    pub fn is_interaction(self) -> bool {
        matches!(
            self,
            EventKind::CommandInteraction | EventKind::ComponentInteraction | EventKind::ModalSubmit
        )
    }
}

impl PlatformEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            PlatformEvent::Ready(_) => EventKind::Ready,
            PlatformEvent::Interaction(i) => match i.kind() {
                InteractionKind::Command => EventKind::CommandInteraction,
                InteractionKind::Component => EventKind::ComponentInteraction,
                InteractionKind::ModalSubmit => EventKind::ModalSubmit,
            },
            PlatformEvent::Message(_) => EventKind::MessageCreate,
            PlatformEvent::Presence(_) => EventKind::PresenceUpdate,
        }
    }
}
