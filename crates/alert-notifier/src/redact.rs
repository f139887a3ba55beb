//! Keep credentials out of log lines.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

/// `scheme://user:password@` userinfo in a URL.
static URL_PASSWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(https?://[^@/]+:)[^@/]+(@)").expect("URL password pattern is valid")
});

/// Telegram bot token inside a Bot API URL.
static BOT_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/bot[0-9]+:[A-Za-z0-9_-]+").expect("bot token pattern is valid"));

/// Replace the password part of any URL in `s` with `...`.
pub fn redact_url(s: &str) -> Cow<'_, str> {
    URL_PASSWORD.replace_all(s, "$1...$2")
}

/// Redact URL passwords and Telegram bot tokens.
pub fn redact_secrets(s: &str) -> Cow<'_, str> {
    match redact_url(s) {
        Cow::Borrowed(b) => BOT_TOKEN.replace_all(b, "/bot[REDACTED]"),
        Cow::Owned(o) => Cow::Owned(BOT_TOKEN.replace_all(&o, "/bot[REDACTED]").into_owned()),
    }
}
