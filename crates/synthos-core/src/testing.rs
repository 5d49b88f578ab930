//! Hand-written test doubles shared by the unit tests of this crate.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use tokio::sync::mpsc;

use synthos_types::command::CommandSpec;
use synthos_types::error::{ConnectionError, RepositoryError};
use synthos_types::interaction::{
    CommandOptionValue, InteractionData, InteractionEvent, InteractionReply, ModalField,
};
use synthos_types::platform::{
    Member, Message, MessageReference, MessageEvent, OutgoingMessage, PlatformEvent, Presence,
    SessionInfo, User,
};
use synthos_types::tenant::TenantRecord;

use crate::platform::{BoxConnection, Connection, ConnectionFactory, SharedConnection};
use crate::repository::tenant::TenantRepository;

/// Long enough that only a timeout ends it.
const HANG: Duration = Duration::from_secs(3600);

/// A recorded connection call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Open,
    Close,
    Register(Vec<String>),
    DeleteAllCommands,
    Respond(InteractionReply),
    EditReply(String),
    Send {
        channel_id: String,
        message: OutgoingMessage,
    },
    Edit {
        channel_id: String,
        message_id: String,
        content: String,
    },
    Delete {
        channel_id: String,
        message_id: String,
    },
    Fetch {
        channel_id: String,
        message_id: String,
    },
    Presence(Presence),
    SetNickname {
        guild_id: String,
        nickname: String,
    },
    UpdateAvatar(String),
}

/// Operations that can be told to fail or hang.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Open,
    Close,
    Register,
    Respond,
    EditReply,
    Send,
    Edit,
    Delete,
    Fetch,
    Presence,
    Nickname,
    SetNickname,
    Avatar,
}

#[derive(Default)]
struct MockState {
    calls: Mutex<Vec<Call>>,
    failing: Mutex<HashSet<Op>>,
    hanging: Mutex<HashSet<Op>>,
    messages: Mutex<HashMap<String, Message>>,
    nickname: Mutex<Option<String>>,
    sent: AtomicUsize,
}

/// Recording connection. Clones share state, so a test can keep a handle
/// after boxing one into a session.
#[derive(Clone, Default)]
pub struct MockConnection {
    state: Arc<MockState>,
}

impl MockConnection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            user_id: "synth".to_string(),
            username: "Synth".to_string(),
            application_id: "app".to_string(),
        }
    }

    pub fn shared(&self) -> SharedConnection {
        Arc::new(BoxConnection::new(self.clone()))
    }

    pub fn fail(&self, op: Op) {
        self.state.failing.lock().unwrap().insert(op);
    }

    pub fn hang(&self, op: Op) {
        self.state.hanging.lock().unwrap().insert(op);
    }

    pub fn add_message(&self, message: Message) {
        self.state
            .messages
            .lock()
            .unwrap()
            .insert(message.id.clone(), message);
    }

    pub fn set_current_nickname(&self, nickname: &str) {
        *self.state.nickname.lock().unwrap() = Some(nickname.to_string());
    }

    /// Every recorded call in order. Nickname lookups are not recorded.
    pub fn calls(&self) -> Vec<Call> {
        self.state.calls.lock().unwrap().clone()
    }

    pub fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| matches(c)).count()
    }

    fn record(&self, call: Call) {
        self.state.calls.lock().unwrap().push(call);
    }

    fn hangs(&self, op: Op) -> bool {
        self.state.hanging.lock().unwrap().contains(&op)
    }

    async fn run(&self, op: Op) -> Result<(), ConnectionError> {
        if self.hangs(op) {
            tokio::time::sleep(HANG).await;
        }
        if self.state.failing.lock().unwrap().contains(&op) {
            return Err(ConnectionError::Transport(format!("{op:?} failed")));
        }
        Ok(())
    }
}

impl Connection for MockConnection {
    async fn open(&self) -> Result<SessionInfo, ConnectionError> {
        self.record(Call::Open);
        self.run(Op::Open).await?;
        Ok(self.info())
    }

    async fn close(&self) -> Result<(), ConnectionError> {
        self.record(Call::Close);
        self.run(Op::Close).await
    }

    async fn register_commands(&self, payload: &[CommandSpec]) -> Result<(), ConnectionError> {
        self.record(Call::Register(
            payload.iter().map(|c| c.name.clone()).collect(),
        ));
        self.run(Op::Register).await
    }

    async fn delete_all_commands(&self) -> Result<usize, ConnectionError> {
        self.record(Call::DeleteAllCommands);
        Ok(0)
    }

    async fn respond(
        &self,
        _interaction: &InteractionEvent,
        reply: &InteractionReply,
    ) -> Result<(), ConnectionError> {
        self.record(Call::Respond(reply.clone()));
        self.run(Op::Respond).await
    }

    async fn edit_reply(
        &self,
        _interaction: &InteractionEvent,
        content: &str,
    ) -> Result<(), ConnectionError> {
        self.record(Call::EditReply(content.to_string()));
        self.run(Op::EditReply).await
    }

    async fn send_message(
        &self,
        channel_id: &str,
        message: &OutgoingMessage,
    ) -> Result<Message, ConnectionError> {
        self.record(Call::Send {
            channel_id: channel_id.to_string(),
            message: message.clone(),
        });
        self.run(Op::Send).await?;
        let n = self.state.sent.fetch_add(1, Ordering::SeqCst);
        Ok(Message {
            id: format!("sent-{n}"),
            channel_id: channel_id.to_string(),
            author_id: self.info().user_id,
            content: message.content.clone(),
        })
    }

    async fn edit_message(
        &self,
        channel_id: &str,
        message_id: &str,
        content: &str,
    ) -> Result<Message, ConnectionError> {
        self.record(Call::Edit {
            channel_id: channel_id.to_string(),
            message_id: message_id.to_string(),
            content: content.to_string(),
        });
        self.run(Op::Edit).await?;
        Ok(Message {
            id: message_id.to_string(),
            channel_id: channel_id.to_string(),
            author_id: self.info().user_id,
            content: content.to_string(),
        })
    }

    async fn delete_message(&self, channel_id: &str, message_id: &str) -> Result<(), ConnectionError> {
        self.record(Call::Delete {
            channel_id: channel_id.to_string(),
            message_id: message_id.to_string(),
        });
        self.run(Op::Delete).await
    }

    async fn fetch_message(&self, channel_id: &str, message_id: &str) -> Result<Message, ConnectionError> {
        self.record(Call::Fetch {
            channel_id: channel_id.to_string(),
            message_id: message_id.to_string(),
        });
        self.run(Op::Fetch).await?;
        self.state
            .messages
            .lock()
            .unwrap()
            .get(message_id)
            .cloned()
            .ok_or_else(|| ConnectionError::Rejected("unknown message".to_string()))
    }

    async fn update_presence(&self, presence: &Presence) -> Result<(), ConnectionError> {
        self.record(Call::Presence(presence.clone()));
        self.run(Op::Presence).await
    }

    async fn current_nickname(&self, _guild_id: &str) -> Result<Option<String>, ConnectionError> {
        self.run(Op::Nickname).await?;
        Ok(self.state.nickname.lock().unwrap().clone())
    }

    async fn set_nickname(&self, guild_id: &str, nickname: &str) -> Result<(), ConnectionError> {
        self.record(Call::SetNickname {
            guild_id: guild_id.to_string(),
            nickname: nickname.to_string(),
        });
        self.run(Op::SetNickname).await?;
        *self.state.nickname.lock().unwrap() = Some(nickname.to_string());
        Ok(())
    }

    async fn update_avatar(&self, source: &User) -> Result<(), ConnectionError> {
        self.record(Call::UpdateAvatar(source.id.clone()));
        self.run(Op::Avatar).await
    }
}

#[derive(Default)]
struct FactoryState {
    connections: HashMap<String, MockConnection>,
    senders: HashMap<String, mpsc::Sender<PlatformEvent>>,
    rejected: HashSet<String>,
    unconnectable: HashSet<String>,
}

/// Hands out one [`MockConnection`] per token.
#[derive(Clone, Default)]
pub struct MockFactory {
    state: Arc<Mutex<FactoryState>>,
}

impl MockFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// The connection `token` gets; configure it before it is connected.
    pub fn connection(&self, token: &str) -> MockConnection {
        self.state
            .lock()
            .unwrap()
            .connections
            .entry(token.to_string())
            .or_default()
            .clone()
    }

    /// Make `resolve_application` reject `token`.
    pub fn reject(&self, token: &str) {
        self.state.lock().unwrap().rejected.insert(token.to_string());
    }

    /// Make `connect` fail for `token`.
    pub fn refuse_connect(&self, token: &str) {
        self.state
            .lock()
            .unwrap()
            .unconnectable
            .insert(token.to_string());
    }

    /// Event sender of the latest connection made for `token`.
    pub fn sender(&self, token: &str) -> Option<mpsc::Sender<PlatformEvent>> {
        self.state.lock().unwrap().senders.get(token).cloned()
    }
}

impl ConnectionFactory for MockFactory {
    type Connection = MockConnection;

    fn connect(
        &self,
        token: &SecretString,
    ) -> Result<(MockConnection, mpsc::Receiver<PlatformEvent>), ConnectionError> {
        let token = token.expose_secret();
        if self.state.lock().unwrap().unconnectable.contains(token) {
            return Err(ConnectionError::Transport("gateway unreachable".to_string()));
        }
        let connection = self.connection(token);
        let (tx, rx) = mpsc::channel(32);
        self.state
            .lock()
            .unwrap()
            .senders
            .insert(token.to_string(), tx);
        Ok((connection, rx))
    }

    async fn resolve_application(&self, token: &SecretString) -> Result<String, ConnectionError> {
        let token = token.expose_secret();
        if self.state.lock().unwrap().rejected.contains(token) {
            return Err(ConnectionError::Rejected("401: Unauthorized".to_string()));
        }
        Ok(format!("app-{token}"))
    }
}

/// Tenant repository backed by a vector.
#[derive(Clone, Default)]
pub struct InMemoryTenantRepository {
    records: Arc<Mutex<Vec<TenantRecord>>>,
    failing: Arc<AtomicBool>,
}

impl InMemoryTenantRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, record: TenantRecord) {
        self.records.lock().unwrap().push(record);
    }

    pub fn fail_queries(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    fn check(&self) -> Result<(), RepositoryError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(RepositoryError::Query("disk I/O error".to_string()));
        }
        Ok(())
    }
}

impl TenantRepository for InMemoryTenantRepository {
    async fn create(&self, record: &TenantRecord) -> Result<(), RepositoryError> {
        self.check()?;
        let mut records = self.records.lock().unwrap();
        if records.iter().any(|r| r.owner_id == record.owner_id) {
            return Err(RepositoryError::Conflict(format!(
                "owner '{}' already has a tenant",
                record.owner_id
            )));
        }
        records.push(record.clone());
        Ok(())
    }

    async fn get_by_owner(&self, owner_id: &str) -> Result<Option<TenantRecord>, RepositoryError> {
        self.check()?;
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.owner_id == owner_id)
            .cloned())
    }

    async fn list_enabled(&self) -> Result<Vec<TenantRecord>, RepositoryError> {
        self.check()?;
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.enabled)
            .cloned()
            .collect())
    }
}

fn interaction(user_id: &str, guild: bool, data: InteractionData) -> InteractionEvent {
    let user = User::new(user_id, format!("user-{user_id}"));
    let (user, member, guild_id) = if guild {
        let member = Member {
            user: Some(user),
            nick: None,
        };
        (None, Some(member), Some("g1".to_string()))
    } else {
        (Some(user), None, None)
    };
    InteractionEvent {
        id: "i1".to_string(),
        token: "itoken".to_string(),
        guild_id,
        channel_id: Some("c1".to_string()),
        user,
        member,
        data,
    }
}

/// A direct-message command invocation.
pub fn command_event(user_id: &str, name: &str, options: Vec<CommandOptionValue>) -> InteractionEvent {
    interaction(
        user_id,
        false,
        InteractionData::Command {
            name: name.to_string(),
            options,
        },
    )
}

/// A command invocation inside guild `g1`.
pub fn guild_command_event(
    user_id: &str,
    name: &str,
    options: Vec<CommandOptionValue>,
) -> InteractionEvent {
    interaction(
        user_id,
        true,
        InteractionData::Command {
            name: name.to_string(),
            options,
        },
    )
}

/// A button click inside guild `g1`.
pub fn component_event(user_id: &str, custom_id: &str) -> InteractionEvent {
    interaction(
        user_id,
        true,
        InteractionData::Component {
            custom_id: custom_id.to_string(),
        },
    )
}

/// A modal submission inside guild `g1`.
pub fn modal_event(user_id: &str, custom_id: &str, fields: Vec<ModalField>) -> InteractionEvent {
    interaction(
        user_id,
        true,
        InteractionData::ModalSubmit {
            custom_id: custom_id.to_string(),
            fields,
        },
    )
}

/// A message `m1` in channel `c1` of guild `g1`.
pub fn message_event(
    author_id: &str,
    content: &str,
    reference: Option<MessageReference>,
) -> MessageEvent {
    MessageEvent {
        id: "m1".to_string(),
        channel_id: "c1".to_string(),
        guild_id: Some("g1".to_string()),
        author: User::new(author_id, format!("user-{author_id}")),
        content: content.to_string(),
        reference,
    }
}
