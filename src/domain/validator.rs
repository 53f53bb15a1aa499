//! Recipient validation. Total and pure: invalid input is represented in the
//! result, never raised.

use crate::domain::{FormatPolicy, Recipient, ValidationFailure};

/// Normalize a raw input against the policy. Strips every non-digit
/// character, then requires the configured prefix and exact digit count.
/// Duplicates are not deduplicated: each input line maps to one result.
pub fn validate(raw: &str, policy: &FormatPolicy) -> Recipient {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();

    if digits.is_empty() {
        return Recipient {
            raw: raw.to_string(),
            normalized: String::new(),
            rejection: Some(ValidationFailure::Empty),
        };
    }

    if digits.starts_with(&policy.prefix) && digits.len() == policy.digit_len {
        Recipient {
            raw: raw.to_string(),
            normalized: digits,
            rejection: None,
        }
    } else {
        Recipient {
            raw: raw.to_string(),
            normalized: String::new(),
            rejection: Some(ValidationFailure::Format),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> FormatPolicy {
        FormatPolicy::default()
    }

    #[test]
    fn accepts_policy_match_and_rejects_short_input() {
        let ok = validate("966500000001", &policy());
        assert!(ok.is_valid());
        assert_eq!(ok.normalized, "966500000001");

        let short = validate("123", &policy());
        assert!(!short.is_valid());
        assert_eq!(short.rejection, Some(ValidationFailure::Format));
        assert_eq!(short.reported(), "123");
    }

    #[test]
    fn strips_formatting_characters() {
        let r = validate("+966 50-000 0001", &policy());
        assert!(r.is_valid());
        assert_eq!(r.normalized, "966500000001");
    }

    #[test]
    fn rejects_empty_and_digitless_input() {
        assert_eq!(
            validate("", &policy()).rejection,
            Some(ValidationFailure::Empty)
        );
        assert_eq!(
            validate("abc", &policy()).rejection,
            Some(ValidationFailure::Empty)
        );
    }

    #[test]
    fn rejects_wrong_prefix() {
        let r = validate("971500000001", &policy());
        assert_eq!(r.rejection, Some(ValidationFailure::Format));
    }

    #[test]
    fn revalidation_of_normalized_output_is_stable() {
        let first = validate("+966500000001", &policy());
        assert!(first.is_valid());
        let second = validate(&first.normalized, &policy());
        assert!(second.is_valid());
        assert_eq!(second.normalized, first.normalized);
    }

    #[test]
    fn honors_custom_policy() {
        let p = FormatPolicy {
            prefix: "49".into(),
            digit_len: 11,
        };
        assert!(validate("4915123456x7", &p).is_valid());
        assert!(!validate("966500000001", &p).is_valid());
    }
}
