//! In-memory fakes for the directory service, record store and event sink.
//!
//! Compiled for unit tests, and for other crates with the `test-support` feature:
//!
//! ```toml
//! [dev-dependencies]
//! chatlink-core = { path = "...", features = ["test-support"] }
//! ```

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;

use crate::{
    activation::events::{ActivationEvent, EventSink},
    directory::{ChatDirectory, DirectoryChat, DirectoryError, DirectoryMember, DirectoryResult},
    domain::{ActivationRecord, AdminEntry, BotId, BotRecord, BotToken, OwnerId},
    errors::Error,
    store::RecordStore,
    Result,
};

pub const BOT_ACCOUNT_ID: u64 = 123456;
pub const TOKEN: &str = "123456:TEST-token";
pub const BOT_USERNAME: &str = "vipbot";

// ── FakeDirectory ─────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DirectoryCall {
    GetChat(String),
    GetChatMember(String, u64),
    GetChatAdministrators(String),
    GetSelf,
    SendMessage(String),
}

/// Scripted directory service that records every call.
///
/// Defaults: unknown chats are "not found", the bot is the only administrator
/// (with invite rights), and messages are delivered.
pub struct FakeDirectory {
    chats: HashMap<String, DirectoryChat>,
    get_chat_error: Option<String>,
    get_chat_delay: Option<Duration>,
    member_status: Option<String>,
    admins: std::result::Result<Vec<AdminEntry>, String>,
    self_id: std::result::Result<u64, String>,
    send_error: Option<String>,
    calls: Mutex<Vec<DirectoryCall>>,
    sent: Mutex<Vec<(String, String)>>,
}

impl Default for FakeDirectory {
    fn default() -> Self {
        Self {
            chats: HashMap::new(),
            get_chat_error: None,
            get_chat_delay: None,
            member_status: None,
            admins: Ok(vec![AdminEntry {
                user_id: BOT_ACCOUNT_ID,
                can_invite_users: true,
            }]),
            self_id: Ok(BOT_ACCOUNT_ID),
            send_error: None,
            calls: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
        }
    }
}

impl FakeDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chat(mut self, identifier: &str, chat: DirectoryChat) -> Self {
        self.chats.insert(identifier.to_string(), chat);
        self
    }

    pub fn get_chat_fails(mut self, description: &str) -> Self {
        self.get_chat_error = Some(description.to_string());
        self
    }

    pub fn get_chat_delayed(mut self, delay: Duration) -> Self {
        self.get_chat_delay = Some(delay);
        self
    }

    pub fn with_member_status(mut self, status: &str) -> Self {
        self.member_status = Some(status.to_string());
        self
    }

    pub fn with_admins(mut self, admins: Vec<AdminEntry>) -> Self {
        self.admins = Ok(admins);
        self
    }

    pub fn admins_fail(mut self, description: &str) -> Self {
        self.admins = Err(description.to_string());
        self
    }

    pub fn get_self_fails(mut self, description: &str) -> Self {
        self.self_id = Err(description.to_string());
        self
    }

    pub fn send_fails(mut self, description: &str) -> Self {
        self.send_error = Some(description.to_string());
        self
    }

    pub fn calls(&self) -> Vec<DirectoryCall> {
        self.calls.lock().unwrap().clone()
    }

    /// `(chat identifier, text)` of every delivered message.
    pub fn sent_messages(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    fn record(&self, call: DirectoryCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ChatDirectory for FakeDirectory {
    async fn get_chat(&self, _token: &BotToken, identifier: &str) -> DirectoryResult<DirectoryChat> {
        self.record(DirectoryCall::GetChat(identifier.to_string()));
        if let Some(delay) = self.get_chat_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(description) = &self.get_chat_error {
            return Err(DirectoryError::new(description.clone()));
        }
        self.chats
            .get(identifier)
            .cloned()
            .ok_or_else(|| DirectoryError::new("Bad Request: chat not found"))
    }

    async fn get_chat_member(
        &self,
        _token: &BotToken,
        identifier: &str,
        account_id: u64,
    ) -> DirectoryResult<DirectoryMember> {
        self.record(DirectoryCall::GetChatMember(identifier.to_string(), account_id));
        self.member_status
            .clone()
            .map(|status| DirectoryMember { status })
            .ok_or_else(|| DirectoryError::new("Bad Request: chat not found"))
    }

    async fn get_chat_administrators(
        &self,
        _token: &BotToken,
        identifier: &str,
    ) -> DirectoryResult<Vec<AdminEntry>> {
        self.record(DirectoryCall::GetChatAdministrators(identifier.to_string()));
        self.admins.clone().map_err(DirectoryError::new)
    }

    async fn get_self(&self, _token: &BotToken) -> DirectoryResult<u64> {
        self.record(DirectoryCall::GetSelf);
        self.self_id.clone().map_err(DirectoryError::new)
    }

    async fn send_message(&self, _token: &BotToken, identifier: &str, html: &str) -> DirectoryResult<()> {
        self.record(DirectoryCall::SendMessage(identifier.to_string()));
        if let Some(description) = &self.send_error {
            return Err(DirectoryError::new(description.clone()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((identifier.to_string(), html.to_string()));
        Ok(())
    }
}

// ── MemoryStore ───────────────────────────────────────────────────────────────

/// Bot rows kept in a map; last write wins.
#[derive(Default)]
pub struct MemoryStore {
    bots: Mutex<HashMap<BotId, BotRecord>>,
    updates: AtomicUsize,
    fail_lookups: bool,
    fail_updates: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store holding one bot (`BOT_USERNAME`, token `TOKEN`) owned by `owner`.
    pub fn with_bot(owner: &OwnerId, bot_id: &str) -> Self {
        let store = Self::new();
        store.insert(BotRecord {
            id: BotId(bot_id.to_string()),
            owner: owner.clone(),
            token: BotToken::new(TOKEN),
            username: BOT_USERNAME.to_string(),
            vip_chat_id: None,
            vip_type: None,
            vip_name: None,
        });
        store
    }

    pub fn insert(&self, bot: BotRecord) {
        self.bots.lock().unwrap().insert(bot.id.clone(), bot);
    }

    pub fn failing_lookups(mut self) -> Self {
        self.fail_lookups = true;
        self
    }

    pub fn failing_updates(mut self) -> Self {
        self.fail_updates = true;
        self
    }

    /// Current VIP association of a bot, if fully set.
    pub fn activation(&self, bot_id: &BotId) -> Option<ActivationRecord> {
        let bots = self.bots.lock().unwrap();
        let bot = bots.get(bot_id)?;
        Some(ActivationRecord {
            bot_id: bot.id.clone(),
            vip_chat_id: bot.vip_chat_id.clone()?,
            vip_type: bot.vip_type?,
            vip_name: bot.vip_name.clone(),
        })
    }

    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn find_bot(&self, owner: &OwnerId, bot_id: &BotId) -> Result<Option<BotRecord>> {
        if self.fail_lookups {
            return Err(Error::External("store unreachable".to_string()));
        }
        let bots = self.bots.lock().unwrap();
        Ok(bots.get(bot_id).filter(|b| &b.owner == owner).cloned())
    }

    async fn update_activation(
        &self,
        owner: &OwnerId,
        record: &ActivationRecord,
    ) -> Result<ActivationRecord> {
        if self.fail_updates {
            return Err(Error::External("store unreachable".to_string()));
        }
        self.updates.fetch_add(1, Ordering::SeqCst);

        let mut bots = self.bots.lock().unwrap();
        let bot = bots
            .get_mut(&record.bot_id)
            .filter(|b| &b.owner == owner)
            .ok_or_else(|| Error::External("no bot row matched".to_string()))?;
        bot.vip_chat_id = Some(record.vip_chat_id.clone());
        bot.vip_type = Some(record.vip_type);
        bot.vip_name = record.vip_name.clone();
        Ok(record.clone())
    }
}

// ── RecordingSink ─────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<ActivationEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<ActivationEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Event names, skipping `stage_entered` and `normalized` bookkeeping.
    pub fn names(&self) -> Vec<&'static str> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(ActivationEvent::name)
            .filter(|n| !matches!(*n, "stage_entered" | "normalized"))
            .collect()
    }

    pub fn stages(&self) -> Vec<crate::activation::Stage> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                ActivationEvent::StageEntered { stage } => Some(*stage),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: ActivationEvent) {
        self.events.lock().unwrap().push(event);
    }
}
