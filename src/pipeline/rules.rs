use once_cell::sync::Lazy;
use regex::Regex;

use crate::core::types::RuleHit;

/// One weighted heuristic rule. A rule fires at most once per text no
/// matter how many times its pattern occurs.
pub struct Rule {
    pub pattern: Regex,
    pub weight: f64,
    pub reason: &'static str,
}

fn rule(pattern: &str, weight: f64, reason: &'static str) -> Rule {
    Rule {
        pattern: Regex::new(&format!("(?i){pattern}")).expect("static rule pattern"),
        weight,
        reason,
    }
}

/// Mobile-money fraud idioms (Kenyan M-Pesa ecosystem).
pub static MOBILE_MONEY_PACK: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        rule(r"\bmpesa\b|\bm-pesa\b", 0.10, "M-Pesa context detected."),
        rule(r"\bfuliza\b", 0.12, "Fuliza-related prompt detected."),
        rule(
            r"\breversal\b|\breverse\b.*\btransaction\b",
            0.18,
            "Transaction reversal lure detected.",
        ),
        rule(
            r"\bpin\b.*\bconfirm\b|\bshare\b.*\bpin\b",
            0.25,
            "PIN sharing cue detected (high risk).",
        ),
        rule(
            r"\b(you have received|umepewa|umepokea)\b.*\b(amount|ksh|kes)\b",
            0.12,
            "Fake receipt lure detected.",
        ),
        rule(
            r"\bagent\b.*\b(mpesa|m-pesa)\b|\bpaybill\b|\btill\b",
            0.12,
            "Agent/Paybill/Till instruction cues detected.",
        ),
        rule(
            r"\b(verify|thibitisha)\b.*\baccount\b|\bupdate\b.*\baccount\b",
            0.12,
            "Account verification/update request detected.",
        ),
    ]
});

/// Generic urgency/credential/verification language.
pub static GENERAL_PACK: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        rule(
            r"\bverify( now)?\b",
            0.15,
            "Verification pressure detected (verify now).",
        ),
        rule(
            r"\baccount (suspend|suspended|locked|disabled)\b",
            0.20,
            "Threat of account restriction detected.",
        ),
        rule(
            r"\burgent\b|\bimmediately\b|\bwithin\s?\d+\s?(hours|hrs|minutes|mins)\b",
            0.15,
            "Urgency language detected.",
        ),
        rule(
            r"\bpassword\b|\blogin\b|\bcredentials\b",
            0.15,
            "Credential request cues detected.",
        ),
        rule(
            r"\bclick\b.*\blink\b|\bopen\b.*\blink\b",
            0.10,
            "Instruction to click/open a link detected.",
        ),
        rule(
            r"\bconfirm\b.*\bdetails\b|\bupdate\b.*\bdetails\b",
            0.12,
            "Request to confirm/update details detected.",
        ),
    ]
});

/// Normalization constant: total matched weight is divided by this
/// before clamping, so a handful of strong rules saturates the score.
const SCORE_NORM: f64 = 0.9;

/// Bounded heuristic score over both packs for normalized text.
pub fn score_text_rules(clean: &str) -> f64 {
    let mut total = 0.0;
    for r in MOBILE_MONEY_PACK.iter().chain(GENERAL_PACK.iter()) {
        if r.pattern.is_match(clean) {
            total += r.weight;
        }
    }
    (total / SCORE_NORM).min(1.0)
}

/// Matches from one pack, in pack order, weights retained for ranking.
pub fn find_rule_hits(clean: &str, pack: &[Rule]) -> Vec<RuleHit> {
    pack.iter()
        .filter(|r| r.pattern.is_match(clean))
        .map(|r| RuleHit {
            reason: r.reason.to_string(),
            weight: r.weight,
        })
        .collect()
}
