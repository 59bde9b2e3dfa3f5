use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Flat-file denylists, loaded once before first use. Missing files
/// leave the corresponding set empty; lookups then simply never hit.
#[derive(Debug, Default)]
pub struct ReputationStore {
    bad_domains: HashSet<String>,
    bad_urls: HashSet<String>,
}

impl ReputationStore {
    pub fn load(domains_path: &Path, urls_path: &Path) -> Self {
        let bad_domains = read_list(domains_path)
            .into_iter()
            .map(|l| l.to_lowercase())
            .collect::<HashSet<_>>();
        let bad_urls = read_list(urls_path).into_iter().collect::<HashSet<_>>();
        tracing::info!(
            "reputation lists loaded: {} domains, {} urls",
            bad_domains.len(),
            bad_urls.len()
        );
        Self {
            bad_domains,
            bad_urls,
        }
    }

    pub fn is_bad_domain(&self, domain: &str) -> bool {
        !domain.is_empty() && self.bad_domains.contains(&domain.to_lowercase())
    }

    pub fn is_bad_url(&self, url: &str) -> bool {
        !url.is_empty() && self.bad_urls.contains(url.trim())
    }
}

fn read_list(path: &Path) -> Vec<String> {
    match fs::read_to_string(path) {
        Ok(content) => content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .map(str::to_string)
            .collect(),
        Err(_) => {
            tracing::info!("blocklist not found: {} (empty set)", path.display());
            Vec::new()
        }
    }
}
