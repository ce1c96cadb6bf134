use std::time::Duration;

use crate::{
    activation::{error::ValidationError, events::ActivationEvent, events::EventSink},
    domain::{ActivationRecord, BotId, ChatKind, ChatMetadata, OwnerId},
    store::RecordStore,
};

pub fn build_record(bot_id: &BotId, final_kind: ChatKind, metadata: &ChatMetadata) -> ActivationRecord {
    ActivationRecord {
        bot_id: bot_id.clone(),
        vip_chat_id: metadata.id.clone(),
        vip_type: final_kind,
        vip_name: metadata.display_name(),
    }
}

/// Overwrite the bot's VIP association. Any store failure is fatal.
pub async fn persist(
    store: &dyn RecordStore,
    events: &dyn EventSink,
    timeout: Duration,
    owner: &OwnerId,
    record: &ActivationRecord,
) -> Result<ActivationRecord, ValidationError> {
    let stored = match tokio::time::timeout(timeout, store.update_activation(owner, record)).await
    {
        Ok(Ok(stored)) => stored,
        Ok(Err(e)) => {
            return Err(ValidationError::PersistenceFailure {
                chat: record.vip_type,
                diagnostic: e.to_string(),
            })
        }
        Err(_) => {
            return Err(ValidationError::PersistenceFailure {
                chat: record.vip_type,
                diagnostic: "record store timed out".to_string(),
            })
        }
    };

    events.emit(ActivationEvent::Persisted {
        chat_id: stored.vip_chat_id.clone(),
        kind: stored.vip_type,
    });
    Ok(stored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::ResolvedChatType,
        testing::{MemoryStore, RecordingSink},
    };

    fn metadata() -> ChatMetadata {
        ChatMetadata {
            id: "-1002".into(),
            resolved_type: ResolvedChatType::Channel,
            title: None,
            handle: Some("vipchannel".into()),
        }
    }

    #[test]
    fn record_falls_back_to_handle_for_name() {
        let record = build_record(&BotId("b1".into()), ChatKind::Channel, &metadata());
        assert_eq!(record.vip_chat_id, "-1002");
        assert_eq!(record.vip_name.as_deref(), Some("vipchannel"));
    }

    #[tokio::test]
    async fn repeated_writes_leave_the_same_state() {
        let owner = OwnerId("u1".into());
        let store = MemoryStore::with_bot(&owner, "b1");
        let sink = RecordingSink::default();
        let record = build_record(&BotId("b1".into()), ChatKind::Channel, &metadata());

        let first = persist(&store, &sink, Duration::from_secs(1), &owner, &record)
            .await
            .unwrap();
        let second = persist(&store, &sink, Duration::from_secs(1), &owner, &record)
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(store.activation(&BotId("b1".into())), Some(record));
        assert_eq!(store.update_count(), 2);
    }

    #[tokio::test]
    async fn store_errors_become_persistence_failures() {
        let owner = OwnerId("u1".into());
        let store = MemoryStore::with_bot(&owner, "b1").failing_updates();
        let sink = RecordingSink::default();
        let record = build_record(&BotId("b1".into()), ChatKind::Group, &metadata());

        let err = persist(&store, &sink, Duration::from_secs(1), &owner, &record)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ValidationError::PersistenceFailure {
                chat: ChatKind::Group,
                ..
            }
        ));
        assert!(sink.names().is_empty());
    }
}
