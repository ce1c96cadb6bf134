use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::errors::Error;

/// Primary key of a bot row in the record store.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BotId(pub String);

/// Authenticated dashboard user that owns bot rows.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerId(pub String);

/// Telegram bot token (`<account id>:<secret>`).
#[derive(Clone, PartialEq, Eq)]
pub struct BotToken(String);

impl BotToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Numeric account id embedded before the `:` of the token, if any.
    pub fn account_id(&self) -> Option<u64> {
        let (prefix, _) = self.0.split_once(':')?;
        prefix.parse().ok()
    }

    /// Safe-to-log form: the account id prefix only.
    pub fn redacted(&self) -> String {
        match self.0.split_once(':') {
            Some((prefix, _)) => format!("{prefix}:***"),
            None => "***".to_string(),
        }
    }
}

impl fmt::Debug for BotToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BotToken").field(&self.redacted()).finish()
    }
}

/// Chat category an operator can pick, and the only categories we persist.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatKind {
    Group,
    Channel,
}

impl ChatKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ChatKind::Group => "group",
            ChatKind::Channel => "channel",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            ChatKind::Group => "📱",
            ChatKind::Channel => "📢",
        }
    }
}

impl fmt::Display for ChatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChatKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "group" => Ok(ChatKind::Group),
            "channel" => Ok(ChatKind::Channel),
            other => Err(Error::Parse(format!(
                "invalid chat type {other:?} (expected \"group\" or \"channel\")"
            ))),
        }
    }
}

/// Chat type as reported by the directory service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolvedChatType {
    Group,
    Supergroup,
    Channel,
    Other,
}

impl ResolvedChatType {
    pub fn from_api(raw: &str) -> Self {
        match raw {
            "group" => ResolvedChatType::Group,
            "supergroup" => ResolvedChatType::Supergroup,
            "channel" => ResolvedChatType::Channel,
            _ => ResolvedChatType::Other,
        }
    }

    pub fn is_supported(self) -> bool {
        !matches!(self, ResolvedChatType::Other)
    }
}

/// Canonical form of a user-supplied chat reference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CanonicalId {
    /// Signed numeric chat id, kept verbatim.
    Numeric(String),
    /// Public handle including the leading `@`.
    Handle(String),
    /// Full private invite link.
    InviteLink(String),
}

impl CanonicalId {
    pub fn as_str(&self) -> &str {
        match self {
            CanonicalId::Numeric(s) | CanonicalId::Handle(s) | CanonicalId::InviteLink(s) => s,
        }
    }
}

impl fmt::Display for CanonicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatReference {
    pub raw_input: String,
    pub canonical: CanonicalId,
}

/// Chat identity produced by a successful lookup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatMetadata {
    pub id: String,
    pub resolved_type: ResolvedChatType,
    pub title: Option<String>,
    pub handle: Option<String>,
}

impl ChatMetadata {
    /// Name persisted with the activation: title, else handle.
    pub fn display_name(&self) -> Option<String> {
        self.title.clone().or_else(|| self.handle.clone())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdminEntry {
    pub user_id: u64,
    pub can_invite_users: bool,
}

/// Administrator listing; `Unavailable` is distinct from an empty list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AdministratorSet {
    Listed(Vec<AdminEntry>),
    Unavailable { description: String },
}

/// The durable association between a bot and its VIP chat.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationRecord {
    pub bot_id: BotId,
    pub vip_chat_id: String,
    pub vip_type: ChatKind,
    pub vip_name: Option<String>,
}

/// Bot row as owned by a dashboard user.
#[derive(Clone, Debug)]
pub struct BotRecord {
    pub id: BotId,
    pub owner: OwnerId,
    pub token: BotToken,
    pub username: String,
    pub vip_chat_id: Option<String>,
    pub vip_type: Option<ChatKind>,
    pub vip_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_account_id_and_redaction() {
        let token = BotToken::new("123456:ABC-secret");
        assert_eq!(token.account_id(), Some(123456));
        assert_eq!(token.redacted(), "123456:***");
        assert!(!format!("{token:?}").contains("secret"));

        let bad = BotToken::new("nonsense");
        assert_eq!(bad.account_id(), None);
        assert_eq!(bad.redacted(), "***");
    }

    #[test]
    fn chat_kind_parses_only_group_and_channel() {
        assert_eq!("group".parse::<ChatKind>().unwrap(), ChatKind::Group);
        assert_eq!(" Channel ".parse::<ChatKind>().unwrap(), ChatKind::Channel);
        assert!(matches!(
            "supergroup".parse::<ChatKind>(),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn resolved_type_from_api() {
        assert_eq!(ResolvedChatType::from_api("supergroup"), ResolvedChatType::Supergroup);
        assert_eq!(ResolvedChatType::from_api("private"), ResolvedChatType::Other);
        assert!(!ResolvedChatType::Other.is_supported());
    }

    #[test]
    fn display_name_prefers_title() {
        let mut meta = ChatMetadata {
            id: "-100".into(),
            resolved_type: ResolvedChatType::Channel,
            title: Some("VIP".into()),
            handle: Some("vip".into()),
        };
        assert_eq!(meta.display_name().as_deref(), Some("VIP"));
        meta.title = None;
        assert_eq!(meta.display_name().as_deref(), Some("vip"));
        meta.handle = None;
        assert_eq!(meta.display_name(), None);
    }
}
