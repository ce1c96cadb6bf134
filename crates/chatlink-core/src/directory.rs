//! Chat directory port (Telegram Bot API today).

use async_trait::async_trait;

use crate::domain::{AdminEntry, BotToken};

/// Failure reported by the directory service, carrying its raw description.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{description}")]
pub struct DirectoryError {
    pub description: String,
}

impl DirectoryError {
    pub const TIMED_OUT: &'static str = "request timed out";

    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }

    pub fn timed_out() -> Self {
        Self::new(Self::TIMED_OUT)
    }
}

pub type DirectoryResult<T> = std::result::Result<T, DirectoryError>;

/// Chat as returned by `GetChat`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirectoryChat {
    pub id: i64,
    /// Raw type string (`group`, `supergroup`, `channel`, `private`, ...).
    pub kind: String,
    pub title: Option<String>,
    pub username: Option<String>,
}

/// Membership as returned by `GetChatMember`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirectoryMember {
    pub status: String,
}

/// Hexagonal port for the chat directory service.
///
/// Every call is made on behalf of one bot, identified by its token. `identifier`
/// is either a numeric chat id, an `@handle`, or an invite link.
#[async_trait]
pub trait ChatDirectory: Send + Sync {
    async fn get_chat(&self, token: &BotToken, identifier: &str) -> DirectoryResult<DirectoryChat>;

    async fn get_chat_member(
        &self,
        token: &BotToken,
        identifier: &str,
        account_id: u64,
    ) -> DirectoryResult<DirectoryMember>;

    async fn get_chat_administrators(
        &self,
        token: &BotToken,
        identifier: &str,
    ) -> DirectoryResult<Vec<AdminEntry>>;

    /// Numeric account id of the bot itself.
    async fn get_self(&self, token: &BotToken) -> DirectoryResult<u64>;

    async fn send_message(&self, token: &BotToken, identifier: &str, html: &str)
        -> DirectoryResult<()>;
}
