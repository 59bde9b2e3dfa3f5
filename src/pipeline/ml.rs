use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;
use serde::Deserialize;

use crate::core::types::MlSignal;
use crate::pipeline::normalizer::normalize_text;
use crate::pipeline::url_features::{url_to_features, FEATURE_DIM};

/// Linear text model: token weights over whitespace tokens of the
/// normalized text.
#[derive(Debug, Deserialize)]
struct TextModel {
    version: String,
    bias: f64,
    token_weights: HashMap<String, f64>,
}

/// Linear URL model over the fixed 17-dim feature vector.
#[derive(Debug, Deserialize)]
struct UrlModel {
    version: String,
    bias: f64,
    weights: Vec<f64>,
}

/// Produces a phishing probability and confidence from pre-trained
/// model artifacts, or the neutral fallback when none is loaded. Each
/// artifact is loaded at most once per process; absence is a valid,
/// handled state.
pub struct MlScorer {
    text_path: PathBuf,
    url_path: PathBuf,
    text: OnceCell<Option<TextModel>>,
    url: OnceCell<Option<UrlModel>>,
}

impl MlScorer {
    pub fn new(text_path: &Path, url_path: &Path) -> Self {
        Self {
            text_path: text_path.to_path_buf(),
            url_path: url_path.to_path_buf(),
            text: OnceCell::new(),
            url: OnceCell::new(),
        }
    }

    pub fn predict_text(&self, raw: &str) -> MlSignal {
        let model = self.text.get_or_init(|| load_text_model(&self.text_path));
        let Some(model) = model else {
            return MlSignal::fallback();
        };
        let clean = normalize_text(raw);
        let mut x = model.bias;
        for token in clean.split_whitespace() {
            if let Some(w) = model.token_weights.get(token) {
                x += w;
            }
        }
        MlSignal::from_probability(sigmoid(x), &model.version)
    }

    pub fn predict_url(&self, url: &str) -> MlSignal {
        let model = self.url.get_or_init(|| load_url_model(&self.url_path));
        let Some(model) = model else {
            return MlSignal::fallback();
        };
        let feats = url_to_features(url);
        let x = model.bias
            + model
                .weights
                .iter()
                .zip(feats.iter())
                .map(|(w, f)| w * f)
                .sum::<f64>();
        MlSignal::from_probability(sigmoid(x), &model.version)
    }
}

fn load_text_model(path: &Path) -> Option<TextModel> {
    let data = match fs::read_to_string(path) {
        Ok(d) => d,
        Err(_) => {
            tracing::warn!(
                "text model not found at {}; using neutral fallback",
                path.display()
            );
            return None;
        }
    };
    match serde_json::from_str::<TextModel>(&data) {
        Ok(m) => {
            tracing::info!("loaded text model {} from {}", m.version, path.display());
            Some(m)
        }
        Err(err) => {
            tracing::warn!("text model at {} unreadable: {err}", path.display());
            None
        }
    }
}

fn load_url_model(path: &Path) -> Option<UrlModel> {
    let data = match fs::read_to_string(path) {
        Ok(d) => d,
        Err(_) => {
            tracing::warn!(
                "url model not found at {}; using neutral fallback",
                path.display()
            );
            return None;
        }
    };
    let model = match serde_json::from_str::<UrlModel>(&data) {
        Ok(m) => m,
        Err(err) => {
            tracing::warn!("url model at {} unreadable: {err}", path.display());
            return None;
        }
    };
    // The artifact is trained against the exact feature vector shape.
    if model.weights.len() != FEATURE_DIM {
        tracing::warn!(
            "url model at {} has {} weights, expected {FEATURE_DIM}; using neutral fallback",
            path.display(),
            model.weights.len()
        );
        return None;
    }
    Some(model)
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}
