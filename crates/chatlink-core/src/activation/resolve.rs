use crate::{
    activation::{error::ValidationError, events::ActivationEvent, StageContext},
    domain::{ChatKind, ChatMetadata, ChatReference, ResolvedChatType},
};

/// Look the chat up and return its true identity.
///
/// When the lookup fails for a declared group, a membership probe tells apart
/// "the chat does not exist" from "the bot is inside but cannot read it".
pub async fn resolve(
    cx: &StageContext<'_>,
    reference: &ChatReference,
    declared: ChatKind,
) -> Result<ChatMetadata, ValidationError> {
    let identifier = reference.canonical.as_str();

    let chat = match cx.bounded(cx.directory.get_chat(cx.token, identifier)).await {
        Ok(chat) => chat,
        Err(err) => {
            if declared == ChatKind::Group {
                if let Some(account_id) = cx.token.account_id() {
                    let probe = cx
                        .bounded(cx.directory.get_chat_member(cx.token, identifier, account_id))
                        .await;
                    cx.events.emit(ActivationEvent::MembershipProbe {
                        succeeded: probe.is_ok(),
                    });
                    if let Ok(member) = probe {
                        return Err(ValidationError::InsufficientPermissions {
                            member_status: member.status,
                            diagnostic: err.description,
                        });
                    }
                }
            }
            return Err(ValidationError::from_directory(declared, &err));
        }
    };

    let resolved_type = ResolvedChatType::from_api(&chat.kind);
    if !resolved_type.is_supported() {
        return Err(ValidationError::UnsupportedChatType {
            resolved: chat.kind,
        });
    }

    let metadata = ChatMetadata {
        id: chat.id.to_string(),
        resolved_type,
        title: chat.title,
        handle: chat.username,
    };
    cx.events.emit(ActivationEvent::ChatResolved {
        chat_id: metadata.id.clone(),
        resolved_type,
    });
    Ok(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        activation::{error::ErrorKind, normalize::normalize},
        directory::DirectoryChat,
        testing::{DirectoryCall, FakeDirectory, RecordingSink, TOKEN},
    };

    async fn run(
        directory: &FakeDirectory,
        input: &str,
        declared: ChatKind,
    ) -> Result<ChatMetadata, ValidationError> {
        run_with_token(directory, TOKEN, input, declared).await
    }

    async fn run_with_token(
        directory: &FakeDirectory,
        token: &str,
        input: &str,
        declared: ChatKind,
    ) -> Result<ChatMetadata, ValidationError> {
        let sink = RecordingSink::default();
        let token = crate::domain::BotToken::new(token);
        let cx = StageContext::for_tests(directory, &token, &sink);
        resolve(&cx, &normalize(input).unwrap(), declared).await
    }

    #[tokio::test]
    async fn resolves_supergroup_by_handle() {
        let directory = FakeDirectory::new().with_chat(
            "@vipgroup",
            DirectoryChat {
                id: -1001,
                kind: "supergroup".into(),
                title: Some("VIP".into()),
                username: Some("vipgroup".into()),
            },
        );

        let meta = run(&directory, "https://t.me/vipgroup", ChatKind::Group)
            .await
            .unwrap();
        assert_eq!(meta.id, "-1001");
        assert_eq!(meta.resolved_type, ResolvedChatType::Supergroup);
        assert_eq!(meta.title.as_deref(), Some("VIP"));
        assert_eq!(directory.calls(), vec![DirectoryCall::GetChat("@vipgroup".into())]);
    }

    #[tokio::test]
    async fn private_chats_are_unsupported() {
        let directory = FakeDirectory::new().with_chat(
            "@someone",
            DirectoryChat {
                id: 77,
                kind: "private".into(),
                title: None,
                username: Some("someone".into()),
            },
        );

        let err = run(&directory, "@someone", ChatKind::Group).await.unwrap_err();
        assert_eq!(
            err,
            ValidationError::UnsupportedChatType {
                resolved: "private".into()
            }
        );
    }

    #[tokio::test]
    async fn group_probe_success_means_insufficient_permissions() {
        let directory = FakeDirectory::new()
            .get_chat_fails("Bad Request: not enough rights")
            .with_member_status("member");

        let err = run(&directory, "-100555", ChatKind::Group).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientPermissions);
        assert_eq!(err.diagnostic(), Some("Bad Request: not enough rights"));
        assert!(directory
            .calls()
            .contains(&DirectoryCall::GetChatMember("-100555".into(), 123456)));
    }

    #[tokio::test]
    async fn group_probe_failure_classifies_primary_error() {
        let directory = FakeDirectory::new().get_chat_fails("Bad Request: chat not found");

        let err = run(&directory, "-100555", ChatKind::Group).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(directory.calls().len(), 2);
    }

    #[tokio::test]
    async fn token_without_account_id_classifies_group_error_directly() {
        let directory = FakeDirectory::new()
            .get_chat_fails("Bad Request: chat not found")
            .with_member_status("member");

        let err = run_with_token(&directory, "nonsense", "-100555", ChatKind::Group)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(
            directory.calls(),
            vec![DirectoryCall::GetChat("-100555".into())]
        );
    }

    #[tokio::test]
    async fn channels_skip_the_probe() {
        let directory = FakeDirectory::new()
            .get_chat_fails("Forbidden: bot is not a member of the channel chat")
            .with_member_status("administrator");

        let err = run(&directory, "@vipchannel", ChatKind::Channel).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotMember);
        assert_eq!(
            directory.calls(),
            vec![DirectoryCall::GetChat("@vipchannel".into())]
        );
    }

    #[tokio::test]
    async fn unrecognized_description_is_unknown() {
        let directory = FakeDirectory::new().get_chat_fails("Internal Server Error");

        let err = run(&directory, "@vipchannel", ChatKind::Channel).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unknown);
        assert_eq!(err.diagnostic(), Some("Internal Server Error"));
    }
}
