//! Notification Parsing
//!
//! Inbound webhook events can be copies of the service's own contact-form
//! notifications. The true client address then has to be re-derived from
//! the body text. Extraction is best-effort: it returns an Option and
//! never fails the request.

use regex::Regex;

/// Client identity recovered from a notification body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedClient {
    pub email: String,
    pub name: Option<String>,
}

/// Heuristic for "this event is a copy of our own notification": the
/// sender carries the notification-sending domain, or the subject carries
/// the fixed notification template.
pub fn is_notification_copy(from: &str, subject: &str, notification_domain: Option<&str>) -> bool {
    if let Some(domain) = notification_domain {
        if !domain.is_empty() && from.contains(domain) {
            return true;
        }
    }
    subject.contains("New Contact Form Submission")
}

/// Pull `Email:` and `Name:` tokens out of a notification body. Handles
/// both multi-line bodies and single-line summaries where the tokens run
/// together.
pub fn extract_client(body: &str) -> Option<ExtractedClient> {
    let email_re = Regex::new(r"(?i)Email:\s*<([^>]+)>").unwrap();
    let bare_email_re = Regex::new(r"(?i)Email:\s*([^\s<>]+)").unwrap();

    let email = email_re
        .captures(body)
        .or_else(|| bare_email_re.captures(body))
        .map(|c| c[1].trim().to_string())
        .filter(|e| !e.is_empty())?;

    let name_re = Regex::new(r"(?i)Name:\s*([^\r\n]+)").unwrap();
    let name = name_re.captures(body).and_then(|c| {
        // In single-line summaries the captured text runs into the next
        // token; cut everything from "Email:" on.
        let raw = c[1].to_string();
        let cut = Regex::new(r"(?i)\s*Email:.*$").unwrap();
        let cleaned = cut.replace(&raw, "").trim().to_string();
        if cleaned.is_empty() {
            None
        } else {
            Some(cleaned)
        }
    });

    Some(ExtractedClient { email, name })
}

/// Subject for the outbound reply: internal notification phrasing is
/// rewritten before the `Re:` prefix goes on.
pub fn reply_subject(subject: &str) -> String {
    let normalized = subject.replace("New Contact Form Submission from", "Inquiry from");
    format!("Re: {}", normalized)
}
