use serde::Serialize;

use crate::{
    activation::{
        error::{PermissionIssue, ValidationError},
        events::ActivationEvent,
        StageContext,
    },
    domain::{AdministratorSet, ChatKind, ChatMetadata},
};

/// How the administrator check concluded when it did not fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminCheck {
    Verified,
    /// Channel whose administrator list could not be read.
    Skipped,
}

pub async fn fetch_administrators(cx: &StageContext<'_>, chat_id: &str) -> AdministratorSet {
    match cx
        .bounded(cx.directory.get_chat_administrators(cx.token, chat_id))
        .await
    {
        Ok(entries) => AdministratorSet::Listed(entries),
        Err(err) => AdministratorSet::Unavailable {
            description: err.description,
        },
    }
}

/// Confirm the bot administers the chat (and can invite users, for channels).
pub async fn verify(
    cx: &StageContext<'_>,
    metadata: &ChatMetadata,
    final_kind: ChatKind,
) -> Result<AdminCheck, ValidationError> {
    let entries = match fetch_administrators(cx, &metadata.id).await {
        AdministratorSet::Listed(entries) => entries,
        AdministratorSet::Unavailable { description } => {
            // Public channels commonly refuse to list their administrators.
            let tolerated = final_kind == ChatKind::Channel;
            cx.events.emit(ActivationEvent::AdminListUnavailable {
                tolerated,
                description: description.clone(),
            });
            if tolerated {
                return Ok(AdminCheck::Skipped);
            }
            return Err(ValidationError::PermissionDenied {
                chat: final_kind,
                reason: PermissionIssue::AdminListingRequired,
                diagnostic: Some(description),
            });
        }
    };

    let account_id = cx
        .bounded(cx.directory.get_self(cx.token))
        .await
        .map_err(|e| ValidationError::from_directory(final_kind, &e))?;

    let Some(entry) = entries.iter().find(|a| a.user_id == account_id) else {
        return Err(ValidationError::PermissionDenied {
            chat: final_kind,
            reason: PermissionIssue::NotAdministrator,
            diagnostic: None,
        });
    };

    if final_kind == ChatKind::Channel && !entry.can_invite_users {
        return Err(ValidationError::PermissionDenied {
            chat: final_kind,
            reason: PermissionIssue::InviteRightsRequired,
            diagnostic: None,
        });
    }

    cx.events.emit(ActivationEvent::AdminVerified { account_id });
    Ok(AdminCheck::Verified)
}
