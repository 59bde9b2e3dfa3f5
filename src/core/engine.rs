use std::path::Path;
use std::time::Duration;

use crate::config::AppConfig;
use crate::core::cache::FingerprintCache;
use crate::core::error::ShieldError;
use crate::core::hash::fingerprint;
use crate::core::types::{
    AnalysisKind, AnalysisOutcome, CachedAnalysis, FusedResult, IntelSignal, MlSignal,
};
use crate::pipeline::explain::{explain_text, explain_url};
use crate::pipeline::fusion::RiskScorer;
use crate::pipeline::intel::IntelEnricher;
use crate::pipeline::ml::MlScorer;
use crate::pipeline::reputation::ReputationStore;

const EXCERPT_CHARS: usize = 800;

/// Orchestrates one analysis: fingerprint, cache lookup, and on a miss
/// the ML/intel/fusion/explain pipeline. All components are built once
/// at construction and read-only afterwards, so the engine is safe to
/// share across concurrent requests via `Arc`.
pub struct AnalysisEngine {
    ml: MlScorer,
    intel: IntelEnricher,
    risk: RiskScorer,
    cache: FingerprintCache,
}

impl AnalysisEngine {
    pub fn new(config: AppConfig) -> Result<Self, ShieldError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(ShieldError::from)?;

        let reputation = ReputationStore::load(
            Path::new(&config.blocklist_domains_path),
            Path::new(&config.blocklist_urls_path),
        );
        let intel = IntelEnricher::new(
            reputation,
            client,
            config.rdap_base_url.trim_end_matches('/').to_string(),
            Duration::from_millis(config.rdap_timeout_ms),
        );
        let ml = MlScorer::new(
            Path::new(&config.text_model_path),
            Path::new(&config.url_model_path),
        );
        let cache = FingerprintCache::new(
            Duration::from_secs(config.cache_ttl_seconds),
            config.disk_cache_path.as_deref().map(Path::new),
        );

        Ok(Self {
            ml,
            intel,
            risk: RiskScorer::default(),
            cache,
        })
    }

    /// Analyze one input. `raw` is hashed for the fingerprint; rule and
    /// intel scoring run over `user_visible` (for emails the body only,
    /// while the hash covers headers plus body). Every call gets a
    /// fresh analysis id, cache hit or not.
    pub async fn analyze(
        &self,
        kind: AnalysisKind,
        raw: &str,
        user_visible: &str,
    ) -> Result<AnalysisOutcome, ShieldError> {
        let analysis_id = uuid::Uuid::new_v4().simple().to_string();
        let key = fingerprint(kind, raw);

        let cached = match self.cache.get(&key) {
            Some(hit) => {
                tracing::debug!("cache hit for {key}");
                hit
            }
            None => {
                let computed = self.compute(kind, raw, user_visible).await;
                self.cache.put(&key, &computed);
                computed
            }
        };

        Ok(AnalysisOutcome {
            analysis_id,
            kind,
            input_hash: key
                .split_once(':')
                .map(|(_, h)| h.to_string())
                .unwrap_or(key),
            excerpt: user_visible.chars().take(EXCERPT_CHARS).collect(),
            ml: cached.ml,
            intel: cached.intel,
            fused: cached.fused,
        })
    }

    async fn compute(&self, kind: AnalysisKind, raw: &str, user_visible: &str) -> CachedAnalysis {
        let (ml, intel): (MlSignal, IntelSignal) = match kind {
            AnalysisKind::Url => (self.ml.predict_url(raw), self.intel.inspect_url(raw).await),
            AnalysisKind::Email | AnalysisKind::Sms => (
                self.ml.predict_text(raw),
                self.intel.inspect_text(user_visible).await,
            ),
        };

        let (risk_score, risk_level) =
            self.risk
                .score(ml.prob_phish, intel.heuristic_score, intel.intel_score);

        let (reasons, recommended_actions) = match kind {
            AnalysisKind::Url => explain_url(ml.prob_phish, &intel, risk_level),
            AnalysisKind::Email | AnalysisKind::Sms => {
                explain_text(user_visible, ml.prob_phish, &intel, risk_level)
            }
        };

        CachedAnalysis {
            ml,
            intel,
            fused: FusedResult {
                risk_score,
                risk_level,
                reasons,
                recommended_actions,
            },
        }
    }
}
