use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisKind {
    Email,
    Sms,
    Url,
}

impl AnalysisKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisKind::Email => "email",
            AnalysisKind::Sms => "sms",
            AnalysisKind::Url => "url",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Fixed thresholds partitioning 0..=100 with no gaps or overlaps.
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=24 => RiskLevel::Low,
            25..=49 => RiskLevel::Medium,
            50..=74 => RiskLevel::High,
            _ => RiskLevel::Critical,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
            RiskLevel::Critical => "CRITICAL",
        }
    }
}

/// ML prediction. `model_version == "fallback"` marks the degraded
/// neutral signal used when no trained artifact is available; its shape
/// is identical to a real prediction so fusion has no special case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MlSignal {
    pub prob_phish: f64,
    pub confidence: f64,
    pub model_version: String,
}

impl MlSignal {
    pub fn fallback() -> Self {
        Self {
            prob_phish: 0.5,
            confidence: 0.5,
            model_version: "fallback".to_string(),
        }
    }

    pub fn from_probability(prob: f64, version: &str) -> Self {
        Self {
            prob_phish: prob,
            confidence: prob.max(1.0 - prob),
            model_version: version.to_string(),
        }
    }
}

/// One matched heuristic rule, weight retained for ranking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleHit {
    pub reason: String,
    pub weight: f64,
}

/// Structural facts about a single analyzed URL, carried for the
/// explainer and the persisted audit signals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlFacts {
    pub url_length: usize,
    pub dot_count: usize,
    pub has_ip: bool,
    pub has_at: bool,
    pub punycode: bool,
    pub suspicious_tld: bool,
    pub misleading_brand: bool,
}

/// Immutable enrichment snapshot for one request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntelSignal {
    pub urls_found: Vec<String>,
    pub shortener: bool,
    pub reputation_hit: bool,
    pub domain_age_days: Option<i64>,
    pub redirects: Vec<String>,
    pub notes: BTreeMap<String, String>,
    pub heuristic_score: f64,
    pub intel_score: f64,
    pub url_facts: Option<UrlFacts>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedResult {
    pub risk_score: u8,
    pub risk_level: RiskLevel,
    pub reasons: Vec<String>,
    pub recommended_actions: Vec<String>,
}

/// Everything memoized under one fingerprint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedAnalysis {
    pub ml: MlSignal,
    pub intel: IntelSignal,
    pub fused: FusedResult,
}

/// Full output of one completed analysis; feeds both the response and
/// the persisted record.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub analysis_id: String,
    pub kind: AnalysisKind,
    pub input_hash: String,
    pub excerpt: String,
    pub ml: MlSignal,
    pub intel: IntelSignal,
    pub fused: FusedResult,
}

/// Response-facing subset of the intel snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntelReport {
    pub urls_found: Vec<String>,
    pub shortener: bool,
    pub domain_age_days: Option<i64>,
    pub reputation_hit: bool,
    pub redirects: Vec<String>,
    pub notes: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    #[serde(rename = "type")]
    pub kind: AnalysisKind,
    pub risk_score: u8,
    pub risk_level: RiskLevel,
    pub ml: MlSignal,
    pub intel: IntelReport,
    pub reasons: Vec<String>,
    pub recommended_actions: Vec<String>,
    pub analysis_id: String,
}

impl AnalyzeResponse {
    pub fn from_outcome(outcome: &AnalysisOutcome) -> Self {
        Self {
            kind: outcome.kind,
            risk_score: outcome.fused.risk_score,
            risk_level: outcome.fused.risk_level,
            ml: outcome.ml.clone(),
            intel: IntelReport {
                urls_found: outcome.intel.urls_found.clone(),
                shortener: outcome.intel.shortener,
                domain_age_days: outcome.intel.domain_age_days,
                reputation_hit: outcome.intel.reputation_hit,
                redirects: outcome.intel.redirects.clone(),
                notes: outcome.intel.notes.clone(),
            },
            reasons: outcome.fused.reasons.clone(),
            recommended_actions: outcome.fused.recommended_actions.clone(),
            analysis_id: outcome.analysis_id.clone(),
        }
    }
}
