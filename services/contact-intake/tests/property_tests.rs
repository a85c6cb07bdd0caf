//! Contact Intake Property Tests
//!
//! Property tests for the parsing, escaping, and key-construction
//! invariants of the intake pipeline.

use proptest::prelude::*;

use juniper_contact_intake::parser::{extract_client, reply_subject};
use juniper_contact_intake::service::{contact_rate_key, reply_rate_key};
use juniper_contact_intake::templates::html_paragraph;

// ===== Property: notification parsing recovers the embedded client =====

mod extraction_tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// For any name/email pair embedded in a multi-line notification
        /// body, extraction returns exactly the embedded address and
        /// name, never the wrapper sender.
        #[test]
        fn prop_extraction_recovers_embedded_address(
            name in "[A-Za-z][A-Za-z ]{0,30}[A-Za-z]",
            local in "[a-z][a-z0-9.]{0,12}",
            domain in "[a-z][a-z0-9]{0,10}\\.[a-z]{2,3}",
        ) {
            let email = format!("{}@{}", local, domain);
            let body = format!(
                "Name: {}\nEmail: {}\nPhone: Not provided\n\nMessage:\nHello",
                name, email
            );

            let client = extract_client(&body).unwrap();
            prop_assert_eq!(client.email, email);
            prop_assert_eq!(client.name.unwrap(), name);
        }

        /// Single-line summaries where the tokens run together still
        /// resolve to the embedded address.
        #[test]
        fn prop_extraction_handles_single_line_summaries(
            name in "[A-Za-z][A-Za-z ]{0,30}[A-Za-z]",
            local in "[a-z][a-z0-9.]{0,12}",
            domain in "[a-z][a-z0-9]{0,10}\\.[a-z]{2,3}",
        ) {
            let email = format!("{}@{}", local, domain);
            let body = format!("Name: {} Email: {} Message: Hello", name, email);

            let client = extract_client(&body).unwrap();
            prop_assert_eq!(client.email, email);
            prop_assert_eq!(client.name.unwrap(), name);
        }

        /// Bodies without an `Email:` token are always unparseable.
        #[test]
        fn prop_bodies_without_token_yield_none(body in "[A-Za-z \n]{0,200}") {
            prop_assert!(extract_client(&body).is_none());
        }
    }
}

// ===== Property: user content never reaches HTML unescaped =====

mod escaping_tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Apart from the inserted `<br>` tags, escaped paragraphs carry
        /// no raw angle brackets regardless of input.
        #[test]
        fn prop_paragraphs_carry_no_raw_markup(message in ".{0,200}") {
            let html = html_paragraph(&message).replace("<br>", "");
            prop_assert!(!html.contains('<'));
            prop_assert!(!html.contains('>'));
        }
    }
}

// ===== Property: rate-limit keys are stable and namespaced =====

mod rate_key_tests {
    use super::*;
    use chrono::NaiveDate;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// The contact key is case-insensitive on the address and always
        /// carries its namespace.
        #[test]
        fn prop_contact_key_is_case_insensitive(
            local in "[a-zA-Z][a-zA-Z0-9.]{0,12}",
            domain in "[a-zA-Z][a-zA-Z0-9]{0,10}\\.[a-z]{2,3}",
        ) {
            let email = format!("{}@{}", local, domain);
            let key = contact_rate_key(&email);
            prop_assert_eq!(key.clone(), contact_rate_key(&email.to_uppercase()));
            prop_assert!(key.starts_with("rate_limit_contact:"));
        }

        /// Two distinct calendar dates never share a reply key.
        #[test]
        fn prop_reply_keys_differ_across_days(
            from in "[a-z]{1,10}@[a-z]{1,10}\\.[a-z]{2,3}",
            day in 1u32..28,
        ) {
            let first = NaiveDate::from_ymd_opt(2026, 8, day).unwrap();
            let second = first.succ_opt().unwrap();
            prop_assert_ne!(reply_rate_key(&from, first), reply_rate_key(&from, second));
        }
    }
}

// ===== Property: reply subjects are always reply-shaped =====

mod subject_tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_reply_subject_prefixes_re(subject in "[A-Za-z0-9 ]{0,50}") {
            let result = reply_subject(&subject);
            prop_assert!(result.starts_with("Re: "));
            prop_assert!(!result.contains("New Contact Form Submission from"));
        }
    }
}
