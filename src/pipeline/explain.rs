use crate::core::types::{IntelSignal, RiskLevel};
use crate::pipeline::normalizer::normalize_text;
use crate::pipeline::rules::{find_rule_hits, GENERAL_PACK, MOBILE_MONEY_PACK};

const MAX_REASONS: usize = 7;
const TOP_RULE_HITS: usize = 5;
const NEW_DOMAIN_DAYS: i64 = 30;

/// Ordered, deduplicated reasons plus recommended actions for a text
/// analysis: rule hits ranked by weight, intel-derived reasons, then
/// probability-threshold phrasing.
pub fn explain_text(
    text: &str,
    ml_prob: f64,
    intel: &IntelSignal,
    level: RiskLevel,
) -> (Vec<String>, Vec<String>) {
    let mut reasons = Vec::new();

    let clean = normalize_text(text);
    let mut hits = find_rule_hits(&clean, &MOBILE_MONEY_PACK);
    hits.extend(find_rule_hits(&clean, &GENERAL_PACK));
    hits.sort_by(|a, b| b.weight.partial_cmp(&a.weight).unwrap_or(std::cmp::Ordering::Equal));
    reasons.extend(hits.into_iter().take(TOP_RULE_HITS).map(|h| h.reason));

    if intel.shortener {
        reasons.push("Shortened link detected (often used to hide destination).".to_string());
    }
    if intel.reputation_hit {
        reasons.push("Link/domain appears on a local reputation blocklist.".to_string());
    }
    if let Some(age) = intel.domain_age_days {
        if age < NEW_DOMAIN_DAYS {
            reasons.push(format!("Domain looks newly registered ({age} days)."));
        }
    }

    if ml_prob >= 0.85 {
        reasons.push("Message content strongly matches known phishing/scam patterns.".to_string());
    } else if ml_prob >= 0.65 {
        reasons.push("Message content resembles common scam language patterns.".to_string());
    }

    let reasons = dedupe_and_cap(reasons, MAX_REASONS);
    let reasons = if reasons.is_empty() {
        vec!["No strong indicators found. Use caution with unexpected messages.".to_string()]
    } else {
        reasons
    };

    let mut actions = match level {
        RiskLevel::High | RiskLevel::Critical => vec![
            "Do not click any links or call numbers in the message.".to_string(),
            "Verify the request using official channels you trust.".to_string(),
            "If you already clicked, change passwords and enable 2FA immediately.".to_string(),
        ],
        RiskLevel::Medium => vec![
            "Be cautious: verify the sender and link destination before acting.".to_string(),
            "Avoid sharing OTPs, PINs, or passwords.".to_string(),
        ],
        RiskLevel::Low => {
            vec!["No high-risk indicators detected, but stay alert for unexpected requests."
                .to_string()]
        }
    };
    let upper = text.to_uppercase();
    if matches!(level, RiskLevel::High | RiskLevel::Critical)
        && (upper.contains("MPESA") || upper.contains("M-PESA"))
    {
        actions.push(
            "For M-Pesa related alerts, confirm via the official Safaricom/M-Pesa app or *234#."
                .to_string(),
        );
    }

    (reasons, actions)
}

/// Reasons and actions for a single-URL analysis, derived from the
/// structural facts and intel flags.
pub fn explain_url(ml_prob: f64, intel: &IntelSignal, level: RiskLevel) -> (Vec<String>, Vec<String>) {
    let mut reasons = Vec::new();

    if intel.reputation_hit {
        reasons.push("URL/domain appears on a local reputation blocklist.".to_string());
    }
    if intel.shortener {
        reasons.push("Shortened URL detected (destination may be hidden).".to_string());
    }
    if let Some(facts) = &intel.url_facts {
        if facts.has_ip {
            reasons.push(
                "URL uses an IP address instead of a domain (common in malicious links)."
                    .to_string(),
            );
        }
        if facts.punycode {
            reasons.push(
                "Punycode-encoded host detected (can disguise lookalike characters).".to_string(),
            );
        }
        if facts.has_at {
            reasons.push("URL contains an '@' symbol (can hide the true destination).".to_string());
        }
        if facts.misleading_brand {
            reasons.push(
                "Brand name appears in a domain that is not the brand's official site.".to_string(),
            );
        }
        if facts.suspicious_tld {
            reasons.push("Suspicious top-level domain detected.".to_string());
        }
    }
    if let Some(age) = intel.domain_age_days {
        if age < NEW_DOMAIN_DAYS {
            reasons.push(format!("Domain looks newly registered ({age} days)."));
        }
    }
    if let Some(facts) = &intel.url_facts {
        if facts.url_length >= 80 {
            reasons.push("Unusually long URL (often used to confuse users).".to_string());
        }
        if facts.dot_count >= 4 {
            reasons.push(
                "Many subdomains/dots detected (can be used to mimic legitimate brands)."
                    .to_string(),
            );
        }
    }

    if ml_prob >= 0.85 {
        reasons.push("URL features strongly match known malicious patterns.".to_string());
    } else if ml_prob >= 0.65 {
        reasons.push("URL structure resembles common phishing link patterns.".to_string());
    }

    let reasons = dedupe_and_cap(reasons, MAX_REASONS);
    let reasons = if reasons.is_empty() {
        vec!["No strong indicators found.".to_string()]
    } else {
        reasons
    };

    let actions = match level {
        RiskLevel::High | RiskLevel::Critical => vec![
            "Do not open this link.".to_string(),
            "If you received it in a message, treat the message as suspicious.".to_string(),
            "If you already visited it, run a malware scan and reset credentials if you entered any."
                .to_string(),
        ],
        RiskLevel::Medium => vec![
            "Open with caution only if you can verify the sender and destination.".to_string(),
            "Prefer typing the official website directly rather than clicking.".to_string(),
        ],
        RiskLevel::Low => {
            vec!["No high-risk indicators detected, but verify the destination if unexpected."
                .to_string()]
        }
    };

    (reasons, actions)
}

/// First occurrence wins; output capped.
fn dedupe_and_cap(reasons: Vec<String>, cap: usize) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for r in reasons {
        if !out.contains(&r) {
            out.push(r);
            if out.len() == cap {
                break;
            }
        }
    }
    out
}
