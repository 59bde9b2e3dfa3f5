use once_cell::sync::Lazy;
use regex::Regex;

pub static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)(https?://[^\s<>"]+|www\.[^\s<>"]+)"#).unwrap());
static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\+?\d[\d\s\-]{7,}\d)").unwrap());
static AMOUNT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(ksh\s?\d+[\d,\.]*|kes\s?\d+[\d,\.]*|\b\d+[\d,\.]*\s?(?:ksh|kes)\b)").unwrap()
});
// Matches its own mask token so re-normalizing already-masked text is
// a no-op.
static OTP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(<otp>|\b(?:otp|one[- ]time password|verification code|auth code)\b)")
        .unwrap()
});
static WS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Canonicalize raw text for rule matching: lowercase, mask URLs, phone
/// numbers, amounts and OTP mentions, collapse whitespace. Pure and
/// idempotent.
pub fn normalize_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let t = text.trim().to_lowercase();
    let t = URL_RE.replace_all(&t, "<url>");
    let t = PHONE_RE.replace_all(&t, "<phone>");
    let t = AMOUNT_RE.replace_all(&t, "<amount>");
    let t = OTP_RE.replace_all(&t, "<otp>");
    WS_RE.replace_all(&t, " ").into_owned()
}
