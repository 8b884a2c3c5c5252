//! Login page scraping.
//!
//! The portal embeds a per-attempt login token and a challenge marker in
//! the page script rather than exposing them through an API. Both helpers
//! fail soft: an unmatched page means the format drifted and the caller
//! reports a protocol error.

use std::sync::LazyLock;

use regex::Regex;

/// Matches the per-attempt token the page script assigns to `#CAS_LT`.
static LOGIN_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r##"\$\("#CAS_LT"\)\.val\("(.*?)"\);"##).expect("login token pattern")
});

/// Marker the page script sets when the form requires a challenge answer.
const CHALLENGE_MARKER: &str = "var showCode = '1';";

/// Extract the per-attempt login token from the login page markup.
pub(crate) fn extract_login_token(page: &str) -> Option<&str> {
    LOGIN_TOKEN
        .captures(page)
        .and_then(|captures| captures.get(1))
        .map(|token| token.as_str())
}

/// Whether the login form requires a challenge answer.
pub(crate) fn challenge_required(page: &str) -> bool {
    page.contains(CHALLENGE_MARKER)
}
