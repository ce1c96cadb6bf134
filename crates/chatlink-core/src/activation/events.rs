//! Structured, leveled events emitted by the activation pipeline.

use serde::Serialize;

use crate::{
    activation::error::ErrorKind,
    domain::{ChatKind, ResolvedChatType},
};

/// Pipeline state. `Failed` is expressed by [`ActivationEvent::Failed`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Authorizing,
    Normalizing,
    Resolving,
    Reconciling,
    Verifying,
    Persisting,
    Notifying,
    Completed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum EventLevel {
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActivationEvent {
    StageEntered {
        stage: Stage,
    },
    Normalized {
        canonical: String,
    },
    MembershipProbe {
        succeeded: bool,
    },
    ChatResolved {
        chat_id: String,
        resolved_type: ResolvedChatType,
    },
    TypeAutoCorrected {
        declared: ChatKind,
        resolved: ResolvedChatType,
    },
    AdminListUnavailable {
        tolerated: bool,
        description: String,
    },
    AdminVerified {
        account_id: u64,
    },
    Persisted {
        chat_id: String,
        kind: ChatKind,
    },
    NotificationSent,
    NotificationFailed {
        description: String,
    },
    Failed {
        stage: Stage,
        kind: ErrorKind,
        diagnostic: Option<String>,
    },
}

impl ActivationEvent {
    pub fn level(&self) -> EventLevel {
        match self {
            ActivationEvent::StageEntered { .. } | ActivationEvent::Normalized { .. } => {
                EventLevel::Debug
            }
            ActivationEvent::MembershipProbe { .. }
            | ActivationEvent::ChatResolved { .. }
            | ActivationEvent::AdminVerified { .. }
            | ActivationEvent::Persisted { .. }
            | ActivationEvent::NotificationSent => EventLevel::Info,
            ActivationEvent::TypeAutoCorrected { .. }
            | ActivationEvent::NotificationFailed { .. } => EventLevel::Warn,
            ActivationEvent::AdminListUnavailable { tolerated, .. } => {
                if *tolerated {
                    EventLevel::Warn
                } else {
                    EventLevel::Error
                }
            }
            ActivationEvent::Failed { .. } => EventLevel::Error,
        }
    }

    /// Stable machine name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            ActivationEvent::StageEntered { .. } => "stage_entered",
            ActivationEvent::Normalized { .. } => "normalized",
            ActivationEvent::MembershipProbe { .. } => "membership_probe",
            ActivationEvent::ChatResolved { .. } => "chat_resolved",
            ActivationEvent::TypeAutoCorrected { .. } => "type_auto_corrected",
            ActivationEvent::AdminListUnavailable { .. } => "admin_list_unavailable",
            ActivationEvent::AdminVerified { .. } => "admin_verified",
            ActivationEvent::Persisted { .. } => "persisted",
            ActivationEvent::NotificationSent => "notification_sent",
            ActivationEvent::NotificationFailed { .. } => "notification_failed",
            ActivationEvent::Failed { .. } => "failed",
        }
    }
}

/// Injected logger for the pipeline.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: ActivationEvent);
}

/// Forwards events to `tracing` at their level.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: ActivationEvent) {
        let name = event.name();
        let detail = format!("{event:?}");
        match event.level() {
            EventLevel::Debug => tracing::debug!(event = name, %detail, "activation"),
            EventLevel::Info => tracing::info!(event = name, %detail, "activation"),
            EventLevel::Warn => tracing::warn!(event = name, %detail, "activation"),
            EventLevel::Error => tracing::error!(event = name, %detail, "activation"),
        }
    }
}
