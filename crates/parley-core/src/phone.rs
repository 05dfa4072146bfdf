// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! E.164 phone validation.
//!
//! The external agent contract requires sender phones in E.164 form: a `+`
//! followed by 7 to 15 digits. Validation runs before the outbound request
//! is built, so a malformed phone never reaches the wire.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ParleyError;

static E164: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+[0-9]{7,15}$").expect("E.164 pattern is valid"));

/// Validate a phone number against the E.164 shape.
pub fn validate_e164(phone: &str) -> Result<(), ParleyError> {
    if E164.is_match(phone) {
        Ok(())
    } else {
        Err(ParleyError::InvalidPhoneFormat {
            phone: phone.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn accepts_standard_e164() {
        assert!(validate_e164("+15551234567").is_ok());
        assert!(validate_e164("+5511999999999").is_ok());
        assert!(validate_e164("+1234567").is_ok());
    }

    #[test]
    fn rejects_too_short() {
        // 4 digits is below the 7-digit minimum.
        let err = validate_e164("+1234").unwrap_err();
        assert!(matches!(err, ParleyError::InvalidPhoneFormat { .. }));
    }

    #[test]
    fn rejects_missing_plus() {
        assert!(validate_e164("15551234567").is_err());
    }

    #[test]
    fn rejects_non_digits_and_empty() {
        assert!(validate_e164("+1555-123-4567").is_err());
        assert!(validate_e164("+1555123456a").is_err());
        assert!(validate_e164("").is_err());
        assert!(validate_e164("+").is_err());
    }

    #[test]
    fn rejects_too_long() {
        // 16 digits exceeds the E.164 maximum of 15.
        assert!(validate_e164("+1234567890123456").is_err());
    }

    proptest! {
        #[test]
        fn any_plus_and_7_to_15_digits_is_accepted(digits in "[0-9]{7,15}") {
            let candidate = format!("+{}", digits);
            prop_assert!(validate_e164(&candidate).is_ok());
        }

        #[test]
        fn digits_without_plus_are_rejected(digits in "[0-9]{7,15}") {
            prop_assert!(validate_e164(&digits).is_err());
        }
    }
}
