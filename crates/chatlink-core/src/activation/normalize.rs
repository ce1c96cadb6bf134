use std::sync::OnceLock;

use regex::Regex;

use crate::{
    activation::error::ValidationError,
    domain::{CanonicalId, ChatReference},
};

fn numeric_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^-?[0-9]+$").expect("valid regex"))
}

fn invite_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(?:https?://)?(?:t|telegram)\.me/(?:\+|joinchat/)[A-Za-z0-9_-]+")
            .expect("valid regex")
    })
}

fn public_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(?:https?://)?(?:t|telegram)\.me/([A-Za-z0-9_]+)").expect("valid regex")
    })
}

/// Turn free-form operator input into a canonical chat reference.
///
/// Pure parsing: numeric id, invite link, public link, `@handle`, or a bare
/// handle (which gets an `@` prefix).
pub fn normalize(raw_input: &str) -> Result<ChatReference, ValidationError> {
    let trimmed = raw_input.trim();
    let invalid = || ValidationError::InvalidFormat {
        input: raw_input.to_string(),
    };

    if trimmed.is_empty() {
        return Err(invalid());
    }

    let canonical = if numeric_re().is_match(trimmed) {
        CanonicalId::Numeric(trimmed.to_string())
    } else if let Some(link) = invite_re().find(trimmed) {
        // The directory service accepts invite links as chat identifiers.
        CanonicalId::InviteLink(link.as_str().to_string())
    } else if let Some(caps) = public_re().captures(trimmed) {
        let handle = &caps[1];
        if handle.eq_ignore_ascii_case("joinchat") {
            return Err(invalid());
        }
        CanonicalId::Handle(format!("@{handle}"))
    } else {
        let handle = trimmed.strip_prefix('@').unwrap_or(trimmed);
        if handle.is_empty() || handle.contains(|c: char| c.is_whitespace() || c == '/' || c == '@')
        {
            return Err(invalid());
        }
        CanonicalId::Handle(format!("@{handle}"))
    };

    Ok(ChatReference {
        raw_input: raw_input.to_string(),
        canonical,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canon(input: &str) -> CanonicalId {
        normalize(input).unwrap().canonical
    }

    #[test]
    fn numeric_ids_pass_through_verbatim() {
        assert_eq!(
            canon("-1001234567890"),
            CanonicalId::Numeric("-1001234567890".into())
        );
        assert_eq!(canon("  42 "), CanonicalId::Numeric("42".into()));
    }

    #[test]
    fn public_links_become_handles() {
        assert_eq!(canon("https://t.me/mychannel"), CanonicalId::Handle("@mychannel".into()));
        assert_eq!(canon("t.me/my_group"), CanonicalId::Handle("@my_group".into()));
        assert_eq!(
            canon("http://telegram.me/Vip_Room"),
            CanonicalId::Handle("@Vip_Room".into())
        );
    }

    #[test]
    fn invite_links_are_kept_whole() {
        assert_eq!(
            canon("https://t.me/+AbC123"),
            CanonicalId::InviteLink("https://t.me/+AbC123".into())
        );
        assert_eq!(
            canon(" https://t.me/joinchat/AAAA-bb_c "),
            CanonicalId::InviteLink("https://t.me/joinchat/AAAA-bb_c".into())
        );
    }

    #[test]
    fn invite_link_is_cut_out_of_surrounding_text() {
        let reference = normalize("join https://t.me/+AbC123 now").unwrap();
        assert_eq!(
            reference.canonical,
            CanonicalId::InviteLink("https://t.me/+AbC123".into())
        );
        assert_eq!(reference.raw_input, "join https://t.me/+AbC123 now");
    }

    #[test]
    fn only_ascii_digits_make_a_numeric_id() {
        assert!(!matches!(canon("-١٢٣"), CanonicalId::Numeric(_)));
        assert!(!matches!(canon("４２"), CanonicalId::Numeric(_)));
    }

    #[test]
    fn handles_get_a_single_at_prefix() {
        assert_eq!(canon("@vipchannel"), CanonicalId::Handle("@vipchannel".into()));
        assert_eq!(canon("vipchannel"), CanonicalId::Handle("@vipchannel".into()));
    }

    #[test]
    fn raw_input_is_preserved() {
        let reference = normalize("  https://t.me/mychannel").unwrap();
        assert_eq!(reference.raw_input, "  https://t.me/mychannel");
        assert_eq!(reference.canonical.as_str(), "@mychannel");
    }

    #[test]
    fn garbage_is_invalid_format() {
        for input in ["", "   ", "@", "my channel", "https://t.me/", "t.me/joinchat/", "@@x"] {
            let err = normalize(input).unwrap_err();
            assert!(
                matches!(err, ValidationError::InvalidFormat { .. }),
                "expected InvalidFormat for {input:?}"
            );
        }
    }
}
