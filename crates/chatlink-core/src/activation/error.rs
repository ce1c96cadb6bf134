use serde::Serialize;

use crate::{
    directory::DirectoryError,
    domain::{BotId, ChatKind},
};

/// Fieldless classification of a [`ValidationError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidFormat,
    BotNotFound,
    NotFound,
    NotMember,
    Forbidden,
    MalformedRequest,
    InsufficientPermissions,
    UnsupportedChatType,
    PermissionDenied,
    PersistenceFailure,
    Unknown,
}

/// Why the bot's administrative standing was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PermissionIssue {
    AdminListingRequired,
    NotAdministrator,
    InviteRightsRequired,
}

/// Known directory-service description fragments, checked in order.
///
/// `bot is not a member` must precede `Forbidden`: Telegram reports it as
/// `Forbidden: bot is not a member of the channel chat`.
pub const DESCRIPTION_TABLE: &[(&str, ErrorKind)] = &[
    ("chat not found", ErrorKind::NotFound),
    ("bot is not a member", ErrorKind::NotMember),
    ("Forbidden", ErrorKind::Forbidden),
    ("Bad Request", ErrorKind::MalformedRequest),
];

/// Map a raw description to the error taxonomy; anything unrecognized is `Unknown`.
pub fn classify_description(description: &str) -> ErrorKind {
    DESCRIPTION_TABLE
        .iter()
        .find(|(needle, _)| description.contains(needle))
        .map(|(_, kind)| *kind)
        .unwrap_or(ErrorKind::Unknown)
}

/// Every way an activation attempt can fail.
///
/// `Display` is the operator-facing message: what went wrong and how to fix it.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Could not read {input:?} as a chat. Use a numeric ID (-100XXXXXXXXXX), a t.me link, or an @handle.")]
    InvalidFormat { input: String },

    #[error("Bot {} was not found among your bots.", .bot_id.0)]
    BotNotFound { bot_id: BotId },

    #[error("The {expected} was not found. Check the ID or link, add the bot to the {expected}, promote it to administrator and try again.")]
    NotFound {
        expected: ChatKind,
        diagnostic: String,
    },

    #[error("The bot is not a member of this {expected}. Add the bot to the {expected} first and try again.")]
    NotMember {
        expected: ChatKind,
        diagnostic: String,
    },

    #[error("The bot is not allowed to access this {expected}. Check the {expected}'s privacy settings.")]
    Forbidden {
        expected: ChatKind,
        diagnostic: String,
    },

    #[error("The {expected} is invalid or inaccessible. Make sure the bot was added to the {expected} as an administrator.")]
    MalformedRequest {
        expected: ChatKind,
        diagnostic: String,
    },

    #[error("The bot is in the group but cannot read its details. Promote the bot to administrator with all required permissions.")]
    InsufficientPermissions {
        member_status: String,
        diagnostic: String,
    },

    #[error("Unsupported chat type {resolved:?}. Only groups, supergroups and channels are accepted.")]
    UnsupportedChatType { resolved: String },

    #[error("{}", permission_message(.reason, .chat))]
    PermissionDenied {
        chat: ChatKind,
        reason: PermissionIssue,
        diagnostic: Option<String>,
    },

    #[error("Could not activate the {chat}: the record store rejected the update. Try again later.")]
    PersistenceFailure { chat: ChatKind, diagnostic: String },

    #[error("Could not load the bot from the record store. Try again later.")]
    BotLookupFailure { diagnostic: String },

    #[error("Telegram error: {diagnostic}")]
    Unknown { diagnostic: String },
}

fn permission_message(reason: &PermissionIssue, chat: &ChatKind) -> String {
    match reason {
        PermissionIssue::AdminListingRequired => {
            "Could not verify the bot's permissions. Make sure the bot is an administrator of the group."
                .to_string()
        }
        PermissionIssue::NotAdministrator => format!(
            "The bot must be an administrator of the {chat}. Add it as an administrator with permission to invite users."
        ),
        PermissionIssue::InviteRightsRequired => {
            "The bot needs permission to invite users in the channel. Check its administrator settings."
                .to_string()
        }
    }
}

impl ValidationError {
    /// Classify a failed directory lookup for a chat the operator declared as `expected`.
    pub fn from_directory(expected: ChatKind, err: &DirectoryError) -> Self {
        let diagnostic = err.description.clone();
        match classify_description(&err.description) {
            ErrorKind::NotFound => ValidationError::NotFound {
                expected,
                diagnostic,
            },
            ErrorKind::NotMember => ValidationError::NotMember {
                expected,
                diagnostic,
            },
            ErrorKind::Forbidden => ValidationError::Forbidden {
                expected,
                diagnostic,
            },
            ErrorKind::MalformedRequest => ValidationError::MalformedRequest {
                expected,
                diagnostic,
            },
            _ => ValidationError::Unknown { diagnostic },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ValidationError::InvalidFormat { .. } => ErrorKind::InvalidFormat,
            ValidationError::BotNotFound { .. } => ErrorKind::BotNotFound,
            ValidationError::NotFound { .. } => ErrorKind::NotFound,
            ValidationError::NotMember { .. } => ErrorKind::NotMember,
            ValidationError::Forbidden { .. } => ErrorKind::Forbidden,
            ValidationError::MalformedRequest { .. } => ErrorKind::MalformedRequest,
            ValidationError::InsufficientPermissions { .. } => ErrorKind::InsufficientPermissions,
            ValidationError::UnsupportedChatType { .. } => ErrorKind::UnsupportedChatType,
            ValidationError::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            ValidationError::PersistenceFailure { .. }
            | ValidationError::BotLookupFailure { .. } => ErrorKind::PersistenceFailure,
            ValidationError::Unknown { .. } => ErrorKind::Unknown,
        }
    }

    /// Raw description from the failing dependency, for logs.
    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            ValidationError::NotFound { diagnostic, .. }
            | ValidationError::NotMember { diagnostic, .. }
            | ValidationError::Forbidden { diagnostic, .. }
            | ValidationError::MalformedRequest { diagnostic, .. }
            | ValidationError::InsufficientPermissions { diagnostic, .. }
            | ValidationError::PersistenceFailure { diagnostic, .. }
            | ValidationError::BotLookupFailure { diagnostic }
            | ValidationError::Unknown { diagnostic } => Some(diagnostic),
            ValidationError::PermissionDenied { diagnostic, .. } => diagnostic.as_deref(),
            ValidationError::InvalidFormat { .. }
            | ValidationError::BotNotFound { .. }
            | ValidationError::UnsupportedChatType { .. } => None,
        }
    }

    pub fn permission_issue(&self) -> Option<PermissionIssue> {
        match self {
            ValidationError::PermissionDenied { reason, .. } => Some(*reason),
            _ => None,
        }
    }

    /// Setup checklist shown next to lookup failures; empty for other kinds.
    pub fn remediation_steps(&self, bot_username: &str) -> Vec<String> {
        let expected = match self {
            ValidationError::NotFound { expected, .. }
            | ValidationError::NotMember { expected, .. }
            | ValidationError::Forbidden { expected, .. }
            | ValidationError::MalformedRequest { expected, .. } => expected.as_str(),
            ValidationError::Unknown { .. } => "chat",
            _ => return Vec::new(),
        };
        vec![
            format!("1. Create a {expected} in Telegram"),
            format!("2. Add @{bot_username} to the {expected}"),
            "3. Promote the bot to administrator".to_string(),
            "4. Use the link (https://t.me/name) instead of the ID".to_string(),
        ]
    }
}
