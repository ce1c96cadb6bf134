//! Telegram adapter (teloxide).
//!
//! This crate implements the `chatlink-core` ChatDirectory over Telegram Bot API.

use std::time::Duration;

use async_trait::async_trait;

use teloxide::{
    prelude::*,
    types::{ChatMemberKind, ChatMemberStatus, ParseMode, Recipient, UserId},
};

use tokio::time::sleep;

use chatlink_core::{
    directory::{ChatDirectory, DirectoryChat, DirectoryError, DirectoryMember, DirectoryResult},
    domain::{AdminEntry, BotToken},
    errors::Error,
    Result,
};

/// Chat directory backed by the Telegram Bot API.
///
/// One `reqwest::Client` is shared; a lightweight `Bot` is built per token.
#[derive(Clone)]
pub struct TelegramDirectory {
    client: reqwest::Client,
    api_url: reqwest::Url,
}

impl TelegramDirectory {
    pub fn new(api_url: &str, timeout: Duration) -> Result<Self> {
        let api_url = reqwest::Url::parse(api_url)
            .map_err(|e| Error::Config(format!("invalid TELEGRAM_API_URL {api_url:?}: {e}")))?;
        let client = teloxide::net::default_reqwest_settings()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::External(format!("telegram http client error: {e}")))?;
        Ok(Self { client, api_url })
    }

    fn bot(&self, token: &BotToken) -> Bot {
        Bot::with_client(token.expose(), self.client.clone()).set_api_url(self.api_url.clone())
    }

    /// Numeric ids address chats directly; handles and invite links go as strings.
    pub fn recipient(identifier: &str) -> Recipient {
        match identifier.parse::<i64>() {
            Ok(id) => Recipient::Id(teloxide::types::ChatId(id)),
            Err(_) => Recipient::ChannelUsername(identifier.to_string()),
        }
    }

    fn map_err(e: teloxide::RequestError) -> DirectoryError {
        match e {
            teloxide::RequestError::Api(api) => DirectoryError::new(api.to_string()),
            other => DirectoryError::new(other.to_string()),
        }
    }

    async fn with_retry<T, Fut>(&self, op: impl FnMut() -> Fut) -> DirectoryResult<T>
    where
        Fut: std::future::IntoFuture<Output = std::result::Result<T, teloxide::RequestError>>,
        Fut::IntoFuture: Send,
    {
        retry_rate_limited(op).await.map_err(Self::map_err)
    }
}

/// Run `op`, waiting out one `RetryAfter` before giving up.
async fn retry_rate_limited<T, Fut>(
    mut op: impl FnMut() -> Fut,
) -> std::result::Result<T, teloxide::RequestError>
where
    Fut: std::future::IntoFuture<Output = std::result::Result<T, teloxide::RequestError>>,
{
    const MAX_RETRIES: usize = 1;
    let mut attempts = 0usize;
    loop {
        match op().await {
            Ok(v) => return Ok(v),
            Err(teloxide::RequestError::RetryAfter(d)) if attempts < MAX_RETRIES => {
                attempts += 1;
                sleep(d).await;
            }
            Err(other) => return Err(other),
        }
    }
}

fn chat_kind(chat: &teloxide::types::Chat) -> &'static str {
    if chat.is_channel() {
        "channel"
    } else if chat.is_supergroup() {
        "supergroup"
    } else if chat.is_group() {
        "group"
    } else if chat.is_private() {
        "private"
    } else {
        "other"
    }
}

fn member_status(kind: &ChatMemberKind) -> &'static str {
    match kind.status() {
        ChatMemberStatus::Owner => "creator",
        ChatMemberStatus::Administrator => "administrator",
        ChatMemberStatus::Member => "member",
        ChatMemberStatus::Restricted => "restricted",
        ChatMemberStatus::Left => "left",
        ChatMemberStatus::Banned => "kicked",
    }
}

fn admin_entry(member: &teloxide::types::ChatMember) -> Option<AdminEntry> {
    let can_invite_users = match &member.kind {
        ChatMemberKind::Owner(_) => true,
        ChatMemberKind::Administrator(a) => a.can_invite_users,
        _ => return None,
    };
    Some(AdminEntry {
        user_id: member.user.id.0,
        can_invite_users,
    })
}

#[async_trait]
impl ChatDirectory for TelegramDirectory {
    async fn get_chat(&self, token: &BotToken, identifier: &str) -> DirectoryResult<DirectoryChat> {
        let bot = self.bot(token);
        let chat = self
            .with_retry(|| bot.get_chat(Self::recipient(identifier)))
            .await?;

        Ok(DirectoryChat {
            id: chat.id.0,
            kind: chat_kind(&chat).to_string(),
            title: chat.title().map(str::to_string),
            username: chat.username().map(str::to_string),
        })
    }

    async fn get_chat_member(
        &self,
        token: &BotToken,
        identifier: &str,
        account_id: u64,
    ) -> DirectoryResult<DirectoryMember> {
        let bot = self.bot(token);
        let member = self
            .with_retry(|| bot.get_chat_member(Self::recipient(identifier), UserId(account_id)))
            .await?;

        Ok(DirectoryMember {
            status: member_status(&member.kind).to_string(),
        })
    }

    async fn get_chat_administrators(
        &self,
        token: &BotToken,
        identifier: &str,
    ) -> DirectoryResult<Vec<AdminEntry>> {
        let bot = self.bot(token);
        let admins = self
            .with_retry(|| bot.get_chat_administrators(Self::recipient(identifier)))
            .await?;

        Ok(admins.iter().filter_map(admin_entry).collect())
    }

    async fn get_self(&self, token: &BotToken) -> DirectoryResult<u64> {
        let bot = self.bot(token);
        let me = self.with_retry(|| bot.get_me()).await?;
        Ok(me.user.id.0)
    }

    async fn send_message(&self, token: &BotToken, identifier: &str, html: &str) -> DirectoryResult<()> {
        let bot = self.bot(token);
        self.with_retry(|| {
            bot.send_message(Self::recipient(identifier), html.to_string())
                .parse_mode(ParseMode::Html)
        })
        .await?;
        Ok(())
    }
}
