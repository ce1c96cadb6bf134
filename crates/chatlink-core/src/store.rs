//! Record store port for bot rows.

use async_trait::async_trait;

use crate::{
    domain::{ActivationRecord, BotId, BotRecord, OwnerId},
    Result,
};

/// Hexagonal port for the bot record store.
///
/// All calls are scoped to rows owned by `owner`; a row owned by someone else
/// behaves exactly like a missing row.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn find_bot(&self, owner: &OwnerId, bot_id: &BotId) -> Result<Option<BotRecord>>;

    /// Overwrite the VIP fields of the bot row and return what was stored.
    ///
    /// Must be idempotent: repeating the call with the same record leaves the
    /// same stored state.
    async fn update_activation(
        &self,
        owner: &OwnerId,
        record: &ActivationRecord,
    ) -> Result<ActivationRecord>;
}
