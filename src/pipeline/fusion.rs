use crate::core::types::RiskLevel;

/// Fuses the ML probability, heuristic score and intel score into one
/// calibrated 0-100 risk score: a linear blend in logit space pushed
/// back through the sigmoid. Pure and deterministic.
#[derive(Debug, Clone)]
pub struct RiskScorer {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    pub bias: f64,
}

impl Default for RiskScorer {
    fn default() -> Self {
        Self {
            alpha: 1.2,
            beta: 1.0,
            gamma: 1.4,
            bias: 0.0,
        }
    }
}

impl RiskScorer {
    pub fn score(&self, p_ml: f64, h: f64, t: f64) -> (u8, RiskLevel) {
        let x = self.alpha * logit(p_ml) + self.beta * h + self.gamma * t + self.bias;
        let s = (100.0 * sigmoid(x)).round();
        let s = s.clamp(0.0, 100.0) as u8;
        (s, RiskLevel::from_score(s))
    }
}

fn logit(p: f64) -> f64 {
    // Clamp away from 0 and 1 so the log stays finite.
    let eps = 1e-6;
    let p = p.clamp(eps, 1.0 - eps);
    (p / (1.0 - p)).ln()
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}
