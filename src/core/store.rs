use std::path::Path;

use anyhow::Result;
use chrono::Utc;
use rusqlite::{params, Connection};
use serde::Serialize;

use crate::core::types::AnalysisOutcome;

/// Append-only persistence for completed analyses. One row per
/// request, cache hits included; rows are never updated or deleted.
pub struct AnalysisStore {
    conn: Connection,
}

impl AnalysisStore {
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS analyses (
              id TEXT PRIMARY KEY,
              type TEXT NOT NULL,
              input_hash TEXT NOT NULL,
              risk_score INTEGER NOT NULL,
              risk_level TEXT NOT NULL,
              ml_prob REAL,
              ml_confidence REAL,
              model_version TEXT,
              created_at TEXT NOT NULL,
              raw_excerpt TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_analyses_hash ON analyses(input_hash);
            CREATE INDEX IF NOT EXISTS idx_analyses_created ON analyses(created_at);

            CREATE TABLE IF NOT EXISTS analysis_signals (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              analysis_id TEXT NOT NULL,
              key TEXT NOT NULL,
              value TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_signals_analysis ON analysis_signals(analysis_id);
            ",
        )?;
        Ok(())
    }

    pub fn insert_outcome(&mut self, outcome: &AnalysisOutcome) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO analyses
             (id, type, input_hash, risk_score, risk_level, ml_prob, ml_confidence,
              model_version, created_at, raw_excerpt)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                outcome.analysis_id,
                outcome.kind.as_str(),
                outcome.input_hash,
                outcome.fused.risk_score as i64,
                outcome.fused.risk_level.as_str(),
                outcome.ml.prob_phish,
                outcome.ml.confidence,
                outcome.ml.model_version,
                Utc::now().to_rfc3339(),
                outcome.excerpt,
            ],
        )?;

        let add = |key: &str, value: String| -> Result<()> {
            tx.execute(
                "INSERT INTO analysis_signals (analysis_id, key, value) VALUES (?1, ?2, ?3)",
                params![outcome.analysis_id, key, value],
            )?;
            Ok(())
        };

        add("heuristic_score", outcome.intel.heuristic_score.to_string())?;
        add("intel_score", outcome.intel.intel_score.to_string())?;
        add("shortener", outcome.intel.shortener.to_string())?;
        add("reputation_hit", outcome.intel.reputation_hit.to_string())?;
        match &outcome.intel.url_facts {
            Some(facts) => {
                add("url_length", facts.url_length.to_string())?;
                add("dot_count", facts.dot_count.to_string())?;
                add("has_ip", facts.has_ip.to_string())?;
            }
            None => {
                add("urls_found", outcome.intel.urls_found.join(","))?;
            }
        }
        if let Some(age) = outcome.intel.domain_age_days {
            add("domain_age_days", age.to_string())?;
        }

        tx.commit()?;
        Ok(())
    }

    pub fn stats(&self) -> Result<StoreStats> {
        let total: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM analyses", [], |r| r.get(0))?;

        let mut by_type = std::collections::BTreeMap::new();
        let mut stmt = self
            .conn
            .prepare("SELECT type, COUNT(*) FROM analyses GROUP BY type")?;
        let rows = stmt.query_map([], |r| Ok((r.get::<_, String>(0)?, r.get::<_, i64>(1)?)))?;
        for row in rows {
            let (kind, count) = row?;
            by_type.insert(kind, count);
        }

        let mut by_level = std::collections::BTreeMap::new();
        let mut stmt = self
            .conn
            .prepare("SELECT risk_level, COUNT(*) FROM analyses GROUP BY risk_level")?;
        let rows = stmt.query_map([], |r| Ok((r.get::<_, String>(0)?, r.get::<_, i64>(1)?)))?;
        for row in rows {
            let (level, count) = row?;
            by_level.insert(level, count);
        }

        let mut stmt = self.conn.prepare(
            "SELECT id, type, risk_score, risk_level, created_at, IFNULL(raw_excerpt, '')
             FROM analyses ORDER BY created_at DESC LIMIT 10",
        )?;
        let rows = stmt.query_map([], |r| {
            Ok(RecentAnalysis {
                id: r.get(0)?,
                kind: r.get(1)?,
                risk_score: r.get::<_, i64>(2)? as u8,
                risk_level: r.get(3)?,
                created_at: r.get(4)?,
                excerpt: truncate_chars(&r.get::<_, String>(5)?, 220),
            })
        })?;
        let mut recent = Vec::new();
        for row in rows {
            recent.push(row?);
        }

        Ok(StoreStats {
            total,
            by_type,
            by_level,
            recent,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct StoreStats {
    pub total: i64,
    pub by_type: std::collections::BTreeMap<String, i64>,
    pub by_level: std::collections::BTreeMap<String, i64>,
    pub recent: Vec<RecentAnalysis>,
}

#[derive(Debug, Serialize)]
pub struct RecentAnalysis {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub risk_score: u8,
    pub risk_level: String,
    pub created_at: String,
    pub excerpt: String,
}

/// Char-boundary-safe prefix.
pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
