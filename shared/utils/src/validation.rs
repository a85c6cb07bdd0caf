use crate::error::{JuniperError, JuniperResult};
use regex::Regex;
use validator::{Validate, ValidationErrors};

pub fn validate_model<T: Validate>(model: &T) -> JuniperResult<()> {
    match model.validate() {
        Ok(()) => Ok(()),
        Err(errors) => {
            let error_messages = format_validation_errors(&errors);
            Err(JuniperError::validation("model", error_messages))
        }
    }
}

pub fn format_validation_errors(errors: &ValidationErrors) -> String {
    let mut messages = Vec::new();

    for (field, field_errors) in errors.field_errors() {
        for error in field_errors {
            let message = match &error.code {
                std::borrow::Cow::Borrowed("email") => "Invalid email format".to_string(),
                std::borrow::Cow::Borrowed("length") => {
                    format!("Length validation failed for field '{}'", field)
                }
                std::borrow::Cow::Borrowed("required") => {
                    format!("Field '{}' is required", field)
                }
                _ => format!("Validation failed for field '{}': {}", field, error.code),
            };
            messages.push(message);
        }
    }

    messages.join(", ")
}

pub fn validate_email_address(email: &str) -> JuniperResult<()> {
    let email_regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).unwrap();

    if !email_regex.is_match(email) {
        return Err(JuniperError::validation(
            "email",
            "Invalid email address format",
        ));
    }

    Ok(())
}

/// Presence check for the contact-form contract: a field that is absent or
/// blank after trimming counts as missing.
pub fn require_field<'a>(field: &str, value: Option<&'a str>) -> JuniperResult<&'a str> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(JuniperError::validation(
            field,
            format!("Missing required field: {}", field),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_validate_email_address() {
        assert!(validate_email_address("test@example.com").is_ok());
        assert!(validate_email_address("jane.doe+tag@sub.example.co").is_ok());
        assert!(validate_email_address("invalid-email").is_err());
        assert!(validate_email_address("@example.com").is_err());
        assert!(validate_email_address("jane@").is_err());
    }

    #[test]
    fn test_require_field() {
        assert_eq!(require_field("name", Some("Jane")).unwrap(), "Jane");
        assert_eq!(require_field("name", Some("  Jane ")).unwrap(), "Jane");
        assert!(require_field("name", None).is_err());
        assert!(require_field("name", Some("")).is_err());
        assert!(require_field("name", Some("   ")).is_err());
    }

    #[test]
    fn test_require_field_error_names_the_field() {
        let err = require_field("message", None).unwrap_err();
        assert!(err.to_string().contains("message"));
    }

    proptest! {
        /// Well-formed simple addresses always pass the format check.
        #[test]
        fn prop_simple_addresses_validate(
            local in "[a-z][a-z0-9._]{0,15}",
            domain in "[a-z][a-z0-9-]{0,10}",
            tld in "[a-z]{2,4}",
        ) {
            let email = format!("{}@{}.{}", local, domain, tld);
            prop_assert!(validate_email_address(&email).is_ok());
        }

        /// The checker never panics on arbitrary input.
        #[test]
        fn prop_validation_never_panics(input in ".{0,100}") {
            let _ = validate_email_address(&input);
        }
    }
}
