//! Per-parameter sanitization checks: SQL injection, shell
//! metacharacters, path traversal, XSS, URL scheme restrictions, and PII
//! masking. Each check is a pure function over parameter strings so the
//! idempotence law holds trivially: re-running a check on output that
//! already failed it must fail it the same way, and scrubbing is a
//! fixed-point (scrubbing twice equals scrubbing once).

use regex::Regex;
use std::sync::OnceLock;

/// SQL-injection-flavoured substrings that cause an outright block.
const SQL_PATTERNS: &[&str] = &[";--", "drop table", "union select", "xp_cmdshell", "' or '1'='1"];

/// Shell metacharacters checked against OS-class tool arguments.
const SHELL_METACHARACTERS: &[char] = &[';', '|', '&', '`', '>', '<'];

/// Path-traversal and sensitive-path markers.
const SENSITIVE_PATH_PREFIXES: &[&str] = &["/etc", "/root", "c:\\windows"];

fn xss_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)<script[^>]*>.*?</script>|javascript:|on[a-z]+\s*="#)
            .expect("static XSS regex must compile")
    })
}

fn rfc1918_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(10\.|172\.(1[6-9]|2[0-9]|3[0-1])\.|192\.168\.)")
            .expect("static RFC1918 regex must compile")
    })
}

/// Reason a parameter was blocked outright, categorised for observations and
/// audit entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockReason {
    SqlInjection(String),
    ShellMetacharacter(char),
    PathTraversal,
    DisallowedUrlScheme(String),
}

impl std::fmt::Display for BlockReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlockReason::SqlInjection(p) => write!(f, "SQL injection pattern detected: {p}"),
            BlockReason::ShellMetacharacter(c) => write!(f, "shell metacharacter '{c}' is not permitted"),
            BlockReason::PathTraversal => write!(f, "path traversal or access to a sensitive path"),
            BlockReason::DisallowedUrlScheme(s) => write!(f, "disallowed URL scheme or host: {s}"),
        }
    }
}

/// Check `value` for SQL injection patterns.
pub fn detect_sql_injection(value: &str) -> Option<BlockReason> {
    let lower = value.to_lowercase();
    SQL_PATTERNS
        .iter()
        .find(|p| lower.contains(*p))
        .map(|p| BlockReason::SqlInjection((*p).to_owned()))
}

/// Check `value` for shell metacharacters; only meaningful for OS-class
/// tools.
pub fn detect_shell_metacharacters(value: &str) -> Option<BlockReason> {
    value
        .chars()
        .find(|c| SHELL_METACHARACTERS.contains(c))
        .map(BlockReason::ShellMetacharacter)
        .or_else(|| value.contains("$(").then(|| BlockReason::ShellMetacharacter('$')))
}

/// Check `value` for path traversal or access under a sensitive root.
pub fn detect_path_traversal(value: &str) -> Option<BlockReason> {
    let lower = value.to_lowercase();
    if lower.contains("..") || SENSITIVE_PATH_PREFIXES.iter().any(|p| lower.starts_with(p)) {
        Some(BlockReason::PathTraversal)
    } else {
        None
    }
}

/// Remove XSS-flavoured substrings, returning the scrubbed value and whether
/// anything was removed. Idempotent: running this on its own output is a no-op.
pub fn scrub_xss(value: &str) -> (String, bool) {
    let scrubbed = xss_re().replace_all(value, "").into_owned();
    let changed = scrubbed != value;
    (scrubbed, changed)
}

/// Validate a URL parameter against the scheme/host policy.
/// `allow_http_localhost` mirrors `safety.allow_http_localhost`: `true` in
/// dev, `false` in prod.
pub fn validate_url_scheme(
    value: &str,
    allow_http_localhost: bool,
    blocked_domains: &[String],
) -> Option<BlockReason> {
    let Ok(url) = reqwest::Url::parse(value) else {
        // Not a URL at all — nothing for this check to do; other
        // sanitizers still run against the raw string.
        return None;
    };

    let host = url.host_str().unwrap_or_default().to_lowercase();

    if blocked_domains.iter().any(|d| host == d.to_lowercase()) {
        return Some(BlockReason::DisallowedUrlScheme(format!("blocked domain: {host}")));
    }

    match url.scheme() {
        "file" => return Some(BlockReason::DisallowedUrlScheme("file:// is not permitted".to_owned())),
        "http" | "https" => {}
        other => return Some(BlockReason::DisallowedUrlScheme(format!("scheme '{other}' is not permitted"))),
    }

    let is_localhost = host == "localhost" || host == "127.0.0.1" || host == "::1";
    if is_localhost && !allow_http_localhost {
        return Some(BlockReason::DisallowedUrlScheme("localhost is not permitted in this environment".to_owned()));
    }
    if !is_localhost && rfc1918_re().is_match(&host) {
        return Some(BlockReason::DisallowedUrlScheme(format!("RFC1918 address is not permitted: {host}")));
    }
    if url.scheme() == "http" && !is_localhost {
        return Some(BlockReason::DisallowedUrlScheme("non-HTTPS is not permitted".to_owned()));
    }

    None
}

/// PII categories the masker recognises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PiiCategory {
    CreditCard,
    Ssn,
    Email,
    Phone,
}

impl std::fmt::Display for PiiCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PiiCategory::CreditCard => "credit_card",
            PiiCategory::Ssn => "ssn",
            PiiCategory::Email => "email",
            PiiCategory::Phone => "phone",
        };
        write!(f, "{s}")
    }
}

struct PiiPattern {
    category: PiiCategory,
    re: fn() -> &'static Regex,
}

fn credit_card_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(?:\d[ -]?){13,16}\b").expect("static regex must compile"))
}

fn ssn_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").expect("static regex must compile"))
}

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").expect("static regex must compile")
    })
}

fn phone_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(?:\+?1[-. ]?)?\(?\d{3}\)?[-. ]?\d{3}[-. ]?\d{4}\b").expect("static regex must compile")
    })
}

const PII_PATTERNS: &[PiiPattern] = &[
    PiiPattern { category: PiiCategory::CreditCard, re: credit_card_re },
    PiiPattern { category: PiiCategory::Ssn, re: ssn_re },
    PiiPattern { category: PiiCategory::Email, re: email_re },
    PiiPattern { category: PiiCategory::Phone, re: phone_re },
];

/// Mask PII in `value` in place, returning the masked string and the
/// distinct categories that matched. Masking is idempotent:
/// the masked placeholder (`[REDACTED:<category>]`) never matches any of
/// the patterns it was produced from.
pub fn mask_pii(value: &str) -> (String, Vec<PiiCategory>) {
    let mut out = value.to_owned();
    let mut hit = Vec::new();
    for pattern in PII_PATTERNS {
        let re = (pattern.re)();
        if re.is_match(&out) {
            hit.push(pattern.category);
            out = re.replace_all(&out, format!("[REDACTED:{}]", pattern.category)).into_owned();
        }
    }
    (out, hit)
}
