use crate::domain::{ChatKind, ResolvedChatType};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Reconciliation {
    pub final_kind: ChatKind,
    pub auto_corrected: bool,
}

/// Settle on the chat kind to persist; the resolved type always wins.
///
/// `supergroup` collapses into `group`. `Other` never reaches this point in the
/// pipeline (the resolver rejects it) and keeps the declared kind.
pub fn reconcile(declared: ChatKind, resolved: ResolvedChatType) -> Reconciliation {
    let final_kind = match resolved {
        ResolvedChatType::Group | ResolvedChatType::Supergroup => ChatKind::Group,
        ResolvedChatType::Channel => ChatKind::Channel,
        ResolvedChatType::Other => declared,
    };
    Reconciliation {
        final_kind,
        auto_corrected: final_kind != declared,
    }
}
