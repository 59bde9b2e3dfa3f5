use std::path::Path;
use std::time::Duration;

use httpmock::prelude::*;
use scamshield::config::AppConfig;
use scamshield::core::engine::AnalysisEngine;
use scamshield::core::error::ShieldError;
use scamshield::core::store::AnalysisStore;
use scamshield::core::types::AnalysisKind;
use scamshield::pipeline::intel::IntelEnricher;
use scamshield::pipeline::reputation::ReputationStore;

fn test_config(server: &MockServer, tmp: &tempfile::TempDir) -> AppConfig {
    AppConfig {
        rdap_base_url: server.base_url(),
        rdap_timeout_ms: 2_000,
        cache_ttl_seconds: 3_600,
        db_path: tmp
            .path()
            .join("scamshield.db")
            .to_string_lossy()
            .into_owned(),
        ..AppConfig::default()
    }
}

fn rdap_body(days_ago: i64) -> serde_json::Value {
    let registered = chrono::Utc::now() - chrono::Duration::days(days_ago);
    serde_json::json!({
        "events": [
            { "eventAction": "registration", "eventDate": registered.to_rfc3339() }
        ]
    })
}

fn test_enricher(server: &MockServer, rdap_timeout_ms: u64) -> IntelEnricher {
    IntelEnricher::new(
        ReputationStore::load(Path::new("nope/d.txt"), Path::new("nope/u.txt")),
        reqwest::Client::new(),
        server.base_url(),
        Duration::from_millis(rdap_timeout_ms),
    )
}

#[tokio::test]
async fn rdap_failures_are_errors_while_absent_events_are_null_ages() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/domain/broken.example");
        then.status(500);
    });
    server.mock(|when, then| {
        when.method(GET).path("/domain/slow.example");
        then.status(200)
            .json_body(rdap_body(2))
            .delay(Duration::from_millis(500));
    });
    server.mock(|when, then| {
        when.method(GET).path("/domain/eventless.example");
        then.status(200).json_body(serde_json::json!({
            "events": [
                { "eventAction": "last changed", "eventDate": "2024-01-01T00:00:00Z" }
            ]
        }));
    });
    server.mock(|when, then| {
        when.method(GET).path("/domain/young.example");
        then.status(200).json_body(rdap_body(5));
    });

    let enricher = test_enricher(&server, 50);

    // Failed lookups surface as errors, not as null successes.
    assert!(matches!(
        enricher.domain_age_days("broken.example").await,
        Err(ShieldError::Http(_))
    ));
    assert!(matches!(
        enricher.domain_age_days("slow.example").await,
        Err(ShieldError::Timeout)
    ));

    // A successful lookup with no registration event is a null age.
    assert_eq!(
        enricher.domain_age_days("eventless.example").await.unwrap(),
        None
    );
    assert_eq!(
        enricher.domain_age_days("young.example").await.unwrap(),
        Some(5)
    );
}

#[tokio::test]
async fn first_registration_event_decides_even_when_its_date_is_unparsable() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/domain/mangled.example");
        then.status(200).json_body(serde_json::json!({
            "events": [
                { "eventAction": "registration", "eventDate": "not-a-date" },
                { "eventAction": "registration", "eventDate": "2020-01-01T00:00:00Z" }
            ]
        }));
    });

    let enricher = test_enricher(&server, 2_000);
    assert_eq!(
        enricher.domain_age_days("mangled.example").await.unwrap(),
        None
    );
}

#[tokio::test]
async fn young_domain_boosts_intel_and_reasons() {
    let server = MockServer::start();
    let rdap = server.mock(|when, then| {
        when.method(GET).path("/domain/evil.example");
        then.status(200).json_body(rdap_body(5));
    });
    let tmp = tempfile::tempdir().unwrap();

    let engine = AnalysisEngine::new(test_config(&server, &tmp)).unwrap();
    let text = "URGENT: verify your mpesa account at http://evil.example/verify";
    let outcome = engine
        .analyze(AnalysisKind::Sms, text, text)
        .await
        .unwrap();

    rdap.assert();
    assert_eq!(outcome.intel.domain_age_days, Some(5));
    assert!(outcome.intel.intel_score >= 0.25);
    assert!(outcome
        .fused
        .reasons
        .iter()
        .any(|r| r.contains("newly registered")));
    assert_eq!(
        outcome.intel.urls_found,
        vec!["http://evil.example/verify".to_string()]
    );
}

#[tokio::test]
async fn rdap_server_error_leaves_age_unknown() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/domain/evil.example");
        then.status(500);
    });
    let tmp = tempfile::tempdir().unwrap();

    let engine = AnalysisEngine::new(test_config(&server, &tmp)).unwrap();
    let outcome = engine
        .analyze(AnalysisKind::Url, "http://evil.example/pay", "http://evil.example/pay")
        .await
        .unwrap();

    assert_eq!(outcome.intel.domain_age_days, None);
    assert!(outcome.fused.risk_score <= 100);
}

#[tokio::test]
async fn rdap_timeout_leaves_age_unknown() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/domain/slow.example");
        then.status(200)
            .json_body(rdap_body(2))
            .delay(Duration::from_millis(500));
    });
    let tmp = tempfile::tempdir().unwrap();

    let mut cfg = test_config(&server, &tmp);
    cfg.rdap_timeout_ms = 50;
    let engine = AnalysisEngine::new(cfg).unwrap();
    let outcome = engine
        .analyze(
            AnalysisKind::Url,
            "http://slow.example/login",
            "http://slow.example/login",
        )
        .await
        .unwrap();

    assert_eq!(outcome.intel.domain_age_days, None);
}

#[tokio::test]
async fn identical_inputs_within_ttl_reuse_the_cached_result() {
    let server = MockServer::start();
    let rdap = server.mock(|when, then| {
        when.method(GET).path("/domain/evil.example");
        then.status(200).json_body(rdap_body(3));
    });
    let tmp = tempfile::tempdir().unwrap();

    let engine = AnalysisEngine::new(test_config(&server, &tmp)).unwrap();
    let text = "share your pin to reverse the mpesa transaction http://evil.example/x";

    let first = engine.analyze(AnalysisKind::Sms, text, text).await.unwrap();
    let second = engine.analyze(AnalysisKind::Sms, text, text).await.unwrap();

    // Fused results are byte-identical; the expensive lookup ran once.
    assert_eq!(first.fused, second.fused);
    assert_eq!(first.intel.domain_age_days, second.intel.domain_age_days);
    assert_eq!(rdap.hits(), 1);

    // A fresh random id per call, independent of caching.
    assert_ne!(first.analysis_id, second.analysis_id);
}

#[tokio::test]
async fn zero_ttl_disables_caching() {
    let server = MockServer::start();
    let rdap = server.mock(|when, then| {
        when.method(GET).path("/domain/evil.example");
        then.status(200).json_body(rdap_body(3));
    });
    let tmp = tempfile::tempdir().unwrap();

    let mut cfg = test_config(&server, &tmp);
    cfg.cache_ttl_seconds = 0;
    let engine = AnalysisEngine::new(cfg).unwrap();
    let text = "pay now at http://evil.example/x";

    engine.analyze(AnalysisKind::Sms, text, text).await.unwrap();
    engine.analyze(AnalysisKind::Sms, text, text).await.unwrap();
    assert_eq!(rdap.hits(), 2);
}

#[tokio::test]
async fn every_request_persists_a_row_even_on_cache_hit() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path_contains("/domain/");
        then.status(404);
    });
    let tmp = tempfile::tempdir().unwrap();
    let cfg = test_config(&server, &tmp);
    let db_path = cfg.db_path.clone();

    let engine = AnalysisEngine::new(cfg).unwrap();
    let mut store = AnalysisStore::new(std::path::Path::new(&db_path)).unwrap();

    let text = "confirm your details at http://evil.example/update";
    for _ in 0..2 {
        let outcome = engine.analyze(AnalysisKind::Sms, text, text).await.unwrap();
        store.insert_outcome(&outcome).unwrap();
    }

    let stats = store.stats().unwrap();
    assert_eq!(stats.total, 2);
    assert_eq!(stats.by_type.get("sms"), Some(&2));
}

#[tokio::test]
async fn email_hash_covers_headers_while_scoring_uses_the_body() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path_contains("/domain/");
        then.status(404);
    });
    let tmp = tempfile::tempdir().unwrap();

    let engine = AnalysisEngine::new(test_config(&server, &tmp)).unwrap();
    let body = "verify your account immediately";
    let raw_a = format!("Subject: hello\nFrom: a@example.com\n\n{body}");
    let raw_b = format!("Subject: other\nFrom: b@example.com\n\n{body}");

    let a = engine
        .analyze(AnalysisKind::Email, &raw_a, body)
        .await
        .unwrap();
    let b = engine
        .analyze(AnalysisKind::Email, &raw_b, body)
        .await
        .unwrap();

    // Different headers, different fingerprints...
    assert_ne!(a.input_hash, b.input_hash);
    // ...but identical scoring input, so identical heuristic signals.
    assert_eq!(a.intel.heuristic_score, b.intel.heuristic_score);
    assert_eq!(a.excerpt, body);
}

#[tokio::test]
async fn blocklist_change_within_ttl_does_not_alter_cached_verdict() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path_contains("/domain/");
        then.status(404);
    });
    let tmp = tempfile::tempdir().unwrap();

    let blocklist = tmp.path().join("domains.txt");
    std::fs::write(&blocklist, "unrelated.example\n").unwrap();
    let cache_path = tmp.path().join("cache.json");

    let mut cfg = test_config(&server, &tmp);
    cfg.blocklist_domains_path = blocklist.to_string_lossy().into_owned();
    cfg.disk_cache_path = Some(cache_path.to_string_lossy().into_owned());

    let engine = AnalysisEngine::new(cfg.clone()).unwrap();
    let first = engine
        .analyze(AnalysisKind::Url, "http://evil.example/x", "http://evil.example/x")
        .await
        .unwrap();
    assert!(!first.intel.reputation_hit);

    // The list now condemns the domain, but the fingerprint is still
    // fresh: a new engine sharing the disk cache serves the old verdict.
    std::fs::write(&blocklist, "unrelated.example\nevil.example\n").unwrap();
    let fresh = AnalysisEngine::new(cfg).unwrap();
    let second = fresh
        .analyze(AnalysisKind::Url, "http://evil.example/x", "http://evil.example/x")
        .await
        .unwrap();

    assert!(!second.intel.reputation_hit);
    assert_eq!(first.fused, second.fused);
}

#[tokio::test]
async fn blocklisted_domain_drives_reputation_hit() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path_contains("/domain/");
        then.status(404);
    });
    let tmp = tempfile::tempdir().unwrap();

    let blocklist = tmp.path().join("domains.txt");
    std::fs::write(&blocklist, "evil.example\n").unwrap();

    let mut cfg = test_config(&server, &tmp);
    cfg.blocklist_domains_path = blocklist.to_string_lossy().into_owned();
    let engine = AnalysisEngine::new(cfg).unwrap();

    let outcome = engine
        .analyze(
            AnalysisKind::Url,
            "http://evil.example/steal",
            "http://evil.example/steal",
        )
        .await
        .unwrap();

    assert!(outcome.intel.reputation_hit);
    assert!(outcome.intel.intel_score >= 0.6);
    assert!(outcome
        .fused
        .reasons
        .iter()
        .any(|r| r.contains("reputation blocklist")));
}
