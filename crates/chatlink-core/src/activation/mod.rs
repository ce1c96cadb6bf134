//! VIP chat activation pipeline.
//!
//! Authorizing → Normalizing → Resolving → Reconciling → Verifying → Persisting
//! → Notifying → Completed. Every stage before `Notifying` can end the attempt
//! with a [`ValidationError`]; notification failures are absorbed.

pub mod error;
pub mod events;
pub mod normalize;
pub mod notify;
pub mod persist;
pub mod reconcile;
pub mod resolve;
pub mod verify;

use std::{future::Future, sync::Arc, time::Duration};

use serde::Serialize;

use crate::{
    config::Config,
    directory::{ChatDirectory, DirectoryError, DirectoryResult},
    domain::{ActivationRecord, BotId, BotRecord, BotToken, ChatKind, OwnerId, ResolvedChatType},
    store::RecordStore,
    utils::iso_timestamp_utc,
};

pub use error::{classify_description, ErrorKind, PermissionIssue, ValidationError};
pub use events::{ActivationEvent, EventLevel, EventSink, Stage, TracingSink};
pub use verify::AdminCheck;

/// What the caller asks for.
#[derive(Clone, Debug)]
pub struct ActivationRequest {
    pub owner: OwnerId,
    pub bot_id: BotId,
    pub raw_input: String,
    pub declared_type: ChatKind,
}

/// Result of a completed activation.
#[derive(Clone, Debug, Serialize)]
pub struct ActivationOutcome {
    pub final_type: ChatKind,
    pub resolved_type: ResolvedChatType,
    pub title: Option<String>,
    pub auto_corrected: bool,
    pub notified: bool,
    pub admin_check: AdminCheck,
    pub record: ActivationRecord,
    pub completed_at: String,
}

impl ActivationOutcome {
    pub fn summary(&self) -> String {
        let mut line = format!("{} VIP {} activated.", self.final_type.icon(), self.final_type);
        if self.auto_corrected {
            line.push_str(&format!(
                " The chat turned out to be a {}, so the type was corrected.",
                self.final_type
            ));
        }
        line
    }
}

/// An activation result plus the bot username, once the bot row was found.
#[derive(Clone, Debug)]
pub struct ActivationAttempt {
    pub bot_username: Option<String>,
    pub result: Result<ActivationOutcome, ValidationError>,
}

/// Per-attempt handles shared by the network-bound stages.
pub struct StageContext<'a> {
    pub directory: &'a dyn ChatDirectory,
    pub token: &'a BotToken,
    pub events: &'a dyn EventSink,
    pub timeout: Duration,
    pub brand_name: &'a str,
}

impl<'a> StageContext<'a> {
    /// Bound one directory call by the per-call timeout.
    pub async fn bounded<T>(
        &self,
        call: impl Future<Output = DirectoryResult<T>>,
    ) -> DirectoryResult<T> {
        tokio::time::timeout(self.timeout, call)
            .await
            .unwrap_or_else(|_| Err(DirectoryError::timed_out()))
    }

    #[cfg(test)]
    pub(crate) fn for_tests(
        directory: &'a dyn ChatDirectory,
        token: &'a BotToken,
        events: &'a dyn EventSink,
    ) -> Self {
        Self {
            directory,
            token,
            events,
            timeout: Duration::from_secs(1),
            brand_name: "TestBrand",
        }
    }
}

/// Runs activation attempts against a directory service and a record store.
pub struct Activator {
    directory: Arc<dyn ChatDirectory>,
    store: Arc<dyn RecordStore>,
    events: Arc<dyn EventSink>,
    request_timeout: Duration,
    brand_name: String,
}

impl Activator {
    pub fn new(
        directory: Arc<dyn ChatDirectory>,
        store: Arc<dyn RecordStore>,
        cfg: &Config,
    ) -> Self {
        Self {
            directory,
            store,
            events: Arc::new(TracingSink),
            request_timeout: cfg.request_timeout,
            brand_name: cfg.brand_name.clone(),
        }
    }

    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub async fn activate(
        &self,
        req: &ActivationRequest,
    ) -> Result<ActivationOutcome, ValidationError> {
        self.attempt(req).await.result
    }

    /// Like [`Activator::activate`], but also reports the bot loaded while authorizing.
    pub async fn attempt(&self, req: &ActivationRequest) -> ActivationAttempt {
        let mut stage = Stage::Authorizing;
        let mut bot_username = None;
        let result = self.run(req, &mut stage, &mut bot_username).await;
        if let Err(err) = &result {
            self.events.emit(ActivationEvent::Failed {
                stage,
                kind: err.kind(),
                diagnostic: err.diagnostic().map(str::to_string),
            });
        }
        ActivationAttempt {
            bot_username,
            result,
        }
    }

    fn enter(&self, current: &mut Stage, next: Stage) {
        *current = next;
        self.events.emit(ActivationEvent::StageEntered { stage: next });
    }

    async fn run(
        &self,
        req: &ActivationRequest,
        stage: &mut Stage,
        bot_username: &mut Option<String>,
    ) -> Result<ActivationOutcome, ValidationError> {
        self.enter(stage, Stage::Authorizing);
        let bot = self.load_bot(req).await?;
        *bot_username = Some(bot.username.clone());

        self.enter(stage, Stage::Normalizing);
        let reference = normalize::normalize(&req.raw_input)?;
        self.events.emit(ActivationEvent::Normalized {
            canonical: reference.canonical.to_string(),
        });

        let cx = StageContext {
            directory: self.directory.as_ref(),
            token: &bot.token,
            events: self.events.as_ref(),
            timeout: self.request_timeout,
            brand_name: &self.brand_name,
        };

        self.enter(stage, Stage::Resolving);
        let metadata = resolve::resolve(&cx, &reference, req.declared_type).await?;

        self.enter(stage, Stage::Reconciling);
        let reconciled = reconcile::reconcile(req.declared_type, metadata.resolved_type);
        if reconciled.auto_corrected {
            self.events.emit(ActivationEvent::TypeAutoCorrected {
                declared: req.declared_type,
                resolved: metadata.resolved_type,
            });
        }
        let final_kind = reconciled.final_kind;

        self.enter(stage, Stage::Verifying);
        let admin_check = verify::verify(&cx, &metadata, final_kind).await?;

        self.enter(stage, Stage::Persisting);
        let record = persist::build_record(&bot.id, final_kind, &metadata);
        let stored = persist::persist(
            self.store.as_ref(),
            self.events.as_ref(),
            self.request_timeout,
            &req.owner,
            &record,
        )
        .await?;

        self.enter(stage, Stage::Notifying);
        let notified = notify::notify(&cx, &stored.vip_chat_id, final_kind, &bot.username).await;

        self.enter(stage, Stage::Completed);
        Ok(ActivationOutcome {
            final_type: final_kind,
            resolved_type: metadata.resolved_type,
            title: metadata.title,
            auto_corrected: reconciled.auto_corrected,
            notified,
            admin_check,
            record: stored,
            completed_at: iso_timestamp_utc(),
        })
    }

    async fn load_bot(&self, req: &ActivationRequest) -> Result<BotRecord, ValidationError> {
        let lookup = self.store.find_bot(&req.owner, &req.bot_id);
        match tokio::time::timeout(self.request_timeout, lookup).await {
            Ok(Ok(Some(bot))) => Ok(bot),
            Ok(Ok(None)) => Err(ValidationError::BotNotFound {
                bot_id: req.bot_id.clone(),
            }),
            Ok(Err(e)) => Err(ValidationError::BotLookupFailure {
                diagnostic: e.to_string(),
            }),
            Err(_) => Err(ValidationError::BotLookupFailure {
                diagnostic: "record store timed out".to_string(),
            }),
        }
    }
}
