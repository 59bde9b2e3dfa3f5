use std::collections::BTreeMap;
use std::time::Duration;

use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;

use crate::core::error::ShieldError;
use crate::core::types::{IntelSignal, UrlFacts};
use crate::pipeline::normalizer::{normalize_text, URL_RE};
use crate::pipeline::reputation::ReputationStore;
use crate::pipeline::rules::score_text_rules;
use crate::pipeline::url_features::{
    count_dots, has_at_symbol, has_misleading_brand, has_punycode, host_of, is_shortener_domain,
    looks_like_ip_host, registrable_domain, suspicious_tld,
};

const NEW_DOMAIN_DAYS: i64 = 30;
const MAX_TEXT_URLS: usize = 3;

/// Combines reputation lookups, structural URL signals and a
/// best-effort RDAP domain-age lookup into a bounded intel score plus
/// raw facts. Lookup failures degrade to "unknown", never to an error.
pub struct IntelEnricher {
    reputation: ReputationStore,
    client: Client,
    rdap_base_url: String,
    rdap_timeout: Duration,
}

impl IntelEnricher {
    pub fn new(
        reputation: ReputationStore,
        client: Client,
        rdap_base_url: String,
        rdap_timeout: Duration,
    ) -> Self {
        Self {
            reputation,
            client,
            rdap_base_url,
            rdap_timeout,
        }
    }

    /// Enrich free text: extract URLs, fold shortener/reputation/age
    /// signals over the first few, score the text rules once.
    pub async fn inspect_text(&self, text: &str) -> IntelSignal {
        let clean = normalize_text(text);
        let urls = extract_urls(text);
        let h = score_text_rules(&clean);

        let mut shortener = false;
        let mut rep_hit = false;
        let mut domain_age: Option<i64> = None;
        let mut notes = BTreeMap::new();
        let mut t: f64 = 0.0;

        for u in urls.iter().take(MAX_TEXT_URLS) {
            let host = host_of(u);
            let domain = registrable_domain(&host);
            if domain.is_empty() {
                continue;
            }

            if is_shortener_domain(&domain) {
                shortener = true;
                t += 0.25;
            }

            if self.reputation.is_bad_domain(&domain) || self.reputation.is_bad_url(u) {
                rep_hit = true;
                t += 0.50;
            }

            if domain_age.is_none() {
                domain_age = self.domain_age_or_unknown(&domain).await;
                if let Some(age) = domain_age {
                    if age < NEW_DOMAIN_DAYS {
                        t += 0.25;
                        notes.insert(
                            "domain_age_reason".to_string(),
                            format!("Domain looks newly registered ({age} days)."),
                        );
                    }
                }
            }
        }

        IntelSignal {
            urls_found: urls,
            shortener,
            reputation_hit: rep_hit,
            domain_age_days: domain_age,
            redirects: Vec::new(),
            notes,
            heuristic_score: h,
            intel_score: t.min(1.0),
            url_facts: None,
        }
    }

    /// Enrich a single URL: structural heuristic plus reputation/age
    /// intel score.
    pub async fn inspect_url(&self, url: &str) -> IntelSignal {
        let (host, domain, shortener, facts) = build_url_facts(url);
        let score = url_heuristic_score(shortener, &facts);

        let mut rep_hit = false;
        let mut t: f64 = 0.0;
        if !domain.is_empty()
            && (self.reputation.is_bad_domain(&domain) || self.reputation.is_bad_url(url))
        {
            rep_hit = true;
            t += 0.6;
        }

        let mut domain_age: Option<i64> = None;
        if !domain.is_empty() {
            domain_age = self.domain_age_or_unknown(&domain).await;
            if let Some(age) = domain_age {
                if age < NEW_DOMAIN_DAYS {
                    t += 0.25;
                }
            }
        }

        let mut notes = BTreeMap::new();
        notes.insert("domain".to_string(), domain);
        notes.insert("host".to_string(), host);

        IntelSignal {
            urls_found: vec![url.to_string()],
            shortener,
            reputation_hit: rep_hit,
            domain_age_days: domain_age,
            redirects: Vec::new(),
            notes,
            heuristic_score: score,
            intel_score: t.min(1.0),
            url_facts: Some(facts),
        }
    }

    /// Days since the domain's registration event per the RDAP
    /// registry. `Ok(None)` means the lookup succeeded but carried no
    /// usable registration event; `Err` means the lookup itself failed
    /// (timeout, transport, non-2xx, malformed payload). Callers
    /// degrade `Err` to an unknown age, so an analysis never blocks or
    /// fails on RDAP.
    pub async fn domain_age_days(&self, domain: &str) -> Result<Option<i64>, ShieldError> {
        let url = format!("{}/domain/{}", self.rdap_base_url, domain);
        let resp = self
            .client
            .get(&url)
            .timeout(self.rdap_timeout)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(ShieldError::Http(format!(
                "RDAP for {domain} returned {}",
                resp.status()
            )));
        }
        let body: RdapResponse = resp.json().await?;
        // The first registration-type event decides; an unparsable date
        // on it is a null result, not a fallthrough to later events.
        for event in &body.events {
            if matches!(
                event.event_action.as_str(),
                "registration" | "registered" | "creation"
            ) {
                return Ok(match chrono::DateTime::parse_from_rfc3339(&event.event_date) {
                    Ok(dt) => {
                        let days = (Utc::now() - dt.with_timezone(&Utc)).num_days();
                        Some(days.max(0))
                    }
                    Err(_) => None,
                });
            }
        }
        Ok(None)
    }

    /// Degrade a lookup failure to an unknown age at the seam where
    /// the analysis must keep going.
    async fn domain_age_or_unknown(&self, domain: &str) -> Option<i64> {
        match self.domain_age_days(domain).await {
            Ok(age) => age,
            Err(err) => {
                tracing::info!("RDAP lookup failed for {domain}: {err}");
                None
            }
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RdapResponse {
    #[serde(default)]
    events: Vec<RdapEvent>,
}

#[derive(Debug, Default, Deserialize)]
struct RdapEvent {
    #[serde(rename = "eventAction", default)]
    event_action: String,
    #[serde(rename = "eventDate", default)]
    event_date: String,
}

/// Structural facts for one URL: (host, registrable domain, shortener
/// flag, facts).
pub fn build_url_facts(url: &str) -> (String, String, bool, UrlFacts) {
    let host = host_of(url);
    let domain = registrable_domain(&host);
    let facts = UrlFacts {
        url_length: url.len(),
        dot_count: count_dots(&host),
        has_ip: looks_like_ip_host(&host),
        has_at: has_at_symbol(url),
        punycode: has_punycode(&host),
        suspicious_tld: suspicious_tld(&domain),
        misleading_brand: has_misleading_brand(&host),
    };
    let shortener = is_shortener_domain(&domain);
    (host, domain, shortener, facts)
}

/// Additive structural suspicion score with fixed weights, capped at 1.
pub fn url_heuristic_score(shortener: bool, facts: &UrlFacts) -> f64 {
    let mut score: f64 = 0.0;
    if shortener {
        score += 0.25;
    }
    if facts.has_ip {
        score += 0.25;
    }
    if facts.suspicious_tld {
        score += 0.15;
    }
    if facts.has_at {
        score += 0.15;
    }
    if facts.punycode {
        score += 0.15;
    }
    if facts.misleading_brand {
        score += 0.20;
    }
    if facts.url_length >= 80 {
        score += 0.15;
    }
    if facts.dot_count >= 4 {
        score += 0.10;
    }
    score.min(1.0)
}

/// Unique URLs from free text, first-seen order, stray trailing
/// punctuation trimmed, bare www. hosts given a scheme.
pub fn extract_urls(text: &str) -> Vec<String> {
    let mut seen = Vec::new();
    for m in URL_RE.find_iter(text) {
        let mut u = m
            .as_str()
            .trim()
            .trim_end_matches(|c| ").,;!".contains(c))
            .to_string();
        if u.to_lowercase().starts_with("www.") {
            u = format!("http://{u}");
        }
        if !seen.contains(&u) {
            seen.push(u);
        }
    }
    seen
}
