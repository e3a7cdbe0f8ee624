use regex::Regex;
use std::sync::OnceLock;

/// Sanitization patterns for removing credentials from logs
///
/// Upstream error text (control plane, metrics backend) can echo request
/// headers or kubeconfig fragments back, so it goes through here before it
/// is logged or returned to a caller.
pub struct SanitizationPatterns {
    bearer_token: Regex,
    kubeconfig_secret: Regex,
    password_field: Regex,
    encoded_blob: Regex,
    email: Regex,
    ipv4_address: Regex,
    user_path: Regex,
}

static PATTERNS: OnceLock<SanitizationPatterns> = OnceLock::new();

fn compile(pattern: &str) -> Regex {
    // Patterns are literals checked by the tests below
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid sanitization pattern {pattern}: {e}"))
}

/// Get compiled regex patterns for sanitization
pub fn get_patterns() -> &'static SanitizationPatterns {
    PATTERNS.get_or_init(|| SanitizationPatterns {
        bearer_token: compile(r"Bearer\s+[a-zA-Z0-9\-_\.+/=]+"),

        // Credential fields of a kubeconfig, YAML or JSON style
        kubeconfig_secret: compile(
            r#"(?i)"?\b(token|client-key-data|client-certificate-data|certificate-authority-data)"?\s*[:=]\s*"?[^\s",}]+"?"#,
        ),

        password_field: compile(r"(?i)(password|passwd|pwd)\s*[:=]\s*\S+"),

        // Long base64 runs, e.g. an encoded kubeconfig
        encoded_blob: compile(r"[A-Za-z0-9+/]{64,}={0,2}"),

        // Email addresses - keep domain visible
        email: compile(r"\b([a-zA-Z0-9._%+-]+)@([a-zA-Z0-9.-]+\.[a-zA-Z]{2,})\b"),

        // IPv4 addresses - show subnet only
        ipv4_address: compile(r"\b(\d{1,3})\.(\d{1,3})\.(\d{1,3})\.(\d{1,3})\b"),

        user_path: compile(r"/(?:home|Users)/([^/]+)"),
    })
}

/// Sanitize log message by removing sensitive data
///
/// - Bearer tokens and kubeconfig credential fields (shows [REDACTED])
/// - Password fields (shows field=[REDACTED])
/// - Long base64 blobs (shows [REDACTED])
/// - Email addresses (shows ***@domain.com)
/// - IP addresses (shows subnet only like 10.96.x.x)
/// - User paths (shows /[USER]/)
pub fn sanitize_log_message(message: &str) -> String {
    let patterns = get_patterns();
    let mut result = message.to_string();

    result = patterns.bearer_token.replace_all(&result, "Bearer [REDACTED]").to_string();
    result = patterns.kubeconfig_secret.replace_all(&result, "$1=[REDACTED]").to_string();
    result = patterns.password_field.replace_all(&result, "$1=[REDACTED]").to_string();
    result = patterns.encoded_blob.replace_all(&result, "[REDACTED]").to_string();
    result = patterns.email.replace_all(&result, "***@$2").to_string();
    result = patterns.ipv4_address.replace_all(&result, "$1.$2.x.x").to_string();
    result = patterns.user_path.replace_all(&result, "/[USER]").to_string();

    result
}
