//! Supabase / PostgREST adapter.
//!
//! Implements the `chatlink-core` RecordStore over the `bots` table.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use chatlink_core::{
    domain::{ActivationRecord, BotId, BotRecord, BotToken, ChatKind, OwnerId},
    errors::Error,
    store::RecordStore,
    Result,
};

const BOT_COLUMNS: &str = "id,user_id,bot_token,bot_username,vip_chat_id,vip_type,vip_name";

#[derive(Clone, Debug)]
pub struct SupabaseStore {
    base_url: String,
    service_key: String,
    http: reqwest::Client,
}

/// Row of the `bots` table, limited to the columns we read.
#[derive(Clone, Debug, Deserialize)]
struct BotRow {
    id: String,
    user_id: String,
    bot_token: String,
    #[serde(default)]
    bot_username: Option<String>,
    #[serde(default)]
    vip_chat_id: Option<String>,
    #[serde(default)]
    vip_type: Option<String>,
    #[serde(default)]
    vip_name: Option<String>,
}

impl BotRow {
    fn into_record(self) -> BotRecord {
        BotRecord {
            id: BotId(self.id),
            owner: OwnerId(self.user_id),
            token: BotToken::new(self.bot_token),
            username: self.bot_username.unwrap_or_default(),
            vip_chat_id: self.vip_chat_id,
            vip_type: self.vip_type.and_then(|t| t.parse::<ChatKind>().ok()),
            vip_name: self.vip_name,
        }
    }

    fn into_activation(self) -> Result<ActivationRecord> {
        let vip_chat_id = self
            .vip_chat_id
            .ok_or_else(|| Error::External("updated row has no vip_chat_id".to_string()))?;
        let vip_type = self
            .vip_type
            .as_deref()
            .unwrap_or_default()
            .parse::<ChatKind>()?;
        Ok(ActivationRecord {
            bot_id: BotId(self.id),
            vip_chat_id,
            vip_type,
            vip_name: self.vip_name,
        })
    }
}

#[derive(Debug, Serialize)]
struct ActivationPatch<'a> {
    vip_chat_id: &'a str,
    vip_type: ChatKind,
    vip_name: Option<&'a str>,
}

impl<'a> From<&'a ActivationRecord> for ActivationPatch<'a> {
    fn from(r: &'a ActivationRecord) -> Self {
        Self {
            vip_chat_id: &r.vip_chat_id,
            vip_type: r.vip_type,
            vip_name: r.vip_name.as_deref(),
        }
    }
}

fn row_filters(owner: &OwnerId, bot_id: &BotId) -> [(&'static str, String); 2] {
    [
        ("id", format!("eq.{}", bot_id.0)),
        ("user_id", format!("eq.{}", owner.0)),
    ]
}

impl SupabaseStore {
    pub fn new(
        base_url: impl Into<String>,
        service_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::External(format!("supabase http client error: {e}")))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            service_key: service_key.into(),
            http,
        })
    }

    fn bots_url(&self) -> String {
        format!("{}/rest/v1/bots", self.base_url)
    }

    fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }

    async fn rows(&self, req: reqwest::RequestBuilder) -> Result<Vec<BotRow>> {
        let resp = self
            .authed(req)
            .send()
            .await
            .map_err(|e| Error::External(format!("supabase request error: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::External(format!(
                "supabase request failed: {status} {}",
                body.chars().take(200).collect::<String>()
            )));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| Error::External(format!("supabase body error: {e}")))?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl RecordStore for SupabaseStore {
    async fn find_bot(&self, owner: &OwnerId, bot_id: &BotId) -> Result<Option<BotRecord>> {
        let req = self
            .http
            .get(self.bots_url())
            .query(&row_filters(owner, bot_id))
            .query(&[("select", BOT_COLUMNS)]);

        let rows = self.rows(req).await?;
        Ok(rows.into_iter().next().map(BotRow::into_record))
    }

    async fn update_activation(
        &self,
        owner: &OwnerId,
        record: &ActivationRecord,
    ) -> Result<ActivationRecord> {
        let req = self
            .http
            .patch(self.bots_url())
            .query(&row_filters(owner, &record.bot_id))
            .query(&[("select", BOT_COLUMNS)])
            .header("Prefer", "return=representation")
            .json(&ActivationPatch::from(record));

        let rows = self.rows(req).await?;
        let row = rows.into_iter().next().ok_or_else(|| {
            Error::External(format!("no bot row {} for this owner", record.bot_id.0))
        })?;
        row.into_activation()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(json: serde_json::Value) -> BotRow {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn row_maps_to_bot_record() {
        let record = row(serde_json::json!({
            "id": "b1",
            "user_id": "u1",
            "bot_token": "123:abc",
            "bot_username": "vipbot",
            "vip_chat_id": null,
            "vip_type": "weird"
        }))
        .into_record();

        assert_eq!(record.id, BotId("b1".into()));
        assert_eq!(record.owner, OwnerId("u1".into()));
        assert_eq!(record.token.account_id(), Some(123));
        assert_eq!(record.username, "vipbot");
        assert_eq!(record.vip_type, None);
    }

    #[test]
    fn updated_row_maps_to_activation() {
        let activation = row(serde_json::json!({
            "id": "b1",
            "user_id": "u1",
            "bot_token": "123:abc",
            "vip_chat_id": "-1001",
            "vip_type": "channel",
            "vip_name": "VIP"
        }))
        .into_activation()
        .unwrap();

        assert_eq!(
            activation,
            ActivationRecord {
                bot_id: BotId("b1".into()),
                vip_chat_id: "-1001".into(),
                vip_type: ChatKind::Channel,
                vip_name: Some("VIP".into()),
            }
        );
    }

    #[test]
    fn updated_row_without_vip_fields_is_an_error() {
        let err = row(serde_json::json!({
            "id": "b1",
            "user_id": "u1",
            "bot_token": "123:abc"
        }))
        .into_activation()
        .unwrap_err();
        assert!(matches!(err, Error::External(_)));
    }

    #[test]
    fn unknown_vip_type_is_a_parse_error() {
        let err = row(serde_json::json!({
            "id": "b1",
            "user_id": "u1",
            "bot_token": "123:abc",
            "vip_chat_id": "-1001",
            "vip_type": "supergroup"
        }))
        .into_activation()
        .unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn patch_body_overwrites_all_vip_fields() {
        let record = ActivationRecord {
            bot_id: BotId("b1".into()),
            vip_chat_id: "-1001".into(),
            vip_type: ChatKind::Group,
            vip_name: None,
        };
        let body = serde_json::to_value(ActivationPatch::from(&record)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"vip_chat_id": "-1001", "vip_type": "group", "vip_name": null})
        );
    }

    #[test]
    fn filters_scope_by_owner_and_id() {
        let filters = row_filters(&OwnerId("u1".into()), &BotId("b1".into()));
        assert_eq!(filters[0], ("id", "eq.b1".to_string()));
        assert_eq!(filters[1], ("user_id", "eq.u1".to_string()));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let store =
            SupabaseStore::new("https://db.example.co/", "svc", Duration::from_secs(1)).unwrap();
        assert_eq!(store.bots_url(), "https://db.example.co/rest/v1/bots");
    }
}
