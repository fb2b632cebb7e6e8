//! Email validation gating the contact page.

const MSG_REQUIRED: &str = "Email is required";
const MSG_MALFORMED: &str = "Please enter a valid email address (e.g., name@gmail.com)";
const MSG_BAD_DOMAIN: &str =
    "Please enter a valid email address with a proper domain (e.g., name@gmail.com)";

/// Domains accepted outright, before the structural rule gets a say.
const ALLOWED_DOMAINS: [&str; 25] = [
    "gmail.com",
    "yahoo.com",
    "hotmail.com",
    "outlook.com",
    "aol.com",
    "icloud.com",
    "mail.com",
    "protonmail.com",
    "yahoo.co.uk",
    "hotmail.co.uk",
    "outlook.co.uk",
    "live.com",
    "msn.com",
    "ymail.com",
    "rocketmail.com",
    "zoho.com",
    "gmx.com",
    "yandex.com",
    "rediffmail.com",
    "sbcglobal.net",
    "att.net",
    "verizon.net",
    "comcast.net",
    "cox.net",
    "earthlink.net",
];

/// Verdict with a user-facing message when invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailValidation {
    pub valid: bool,
    pub message: String,
}

impl EmailValidation {
    fn pass() -> Self {
        Self {
            valid: true,
            message: String::new(),
        }
    }

    fn fail(message: &str) -> Self {
        Self {
            valid: false,
            message: message.to_string(),
        }
    }
}

/// Check an email address the way the contact page does: a simple
/// `local@domain.tld` shape, then the domain against a short allow-list
/// or a structural rule (at least two labels, non-empty first label,
/// final label of two or more characters). Fails closed on empty input.
pub fn validate_email(email: &str) -> EmailValidation {
    if email.trim().is_empty() {
        return EmailValidation::fail(MSG_REQUIRED);
    }
    if !matches_basic_shape(email) {
        return EmailValidation::fail(MSG_MALFORMED);
    }
    let Some((_, domain)) = email.split_once('@') else {
        return EmailValidation::fail(MSG_MALFORMED);
    };
    let domain = domain.to_lowercase();

    let labels: Vec<&str> = domain.split('.').collect();
    let first_label_ok = labels.first().is_some_and(|label| !label.is_empty());
    let last_label_ok = labels.last().is_some_and(|label| label.len() >= 2);
    let structurally_ok = labels.len() >= 2 && first_label_ok && last_label_ok;

    if ALLOWED_DOMAINS.contains(&domain.as_str()) || structurally_ok {
        EmailValidation::pass()
    } else {
        EmailValidation::fail(MSG_BAD_DOMAIN)
    }
}

/// `local@domain` with no whitespace, a single `@`, a non-empty local
/// part, and a dot somewhere strictly inside the domain.
fn matches_basic_shape(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let len = domain.chars().count();
    domain
        .chars()
        .enumerate()
        .any(|(i, c)| c == '.' && i >= 1 && i + 1 < len)
}
