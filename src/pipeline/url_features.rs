use url::Url;

/// Dimension of the ML feature vector. The URL model artifact is
/// trained against this exact shape; changing order or count
/// invalidates stored models.
pub const FEATURE_DIM: usize = 17;

const SHORTENERS: &[&str] = &[
    "bit.ly",
    "t.co",
    "tinyurl.com",
    "goo.gl",
    "cutt.ly",
    "rb.gy",
    "is.gd",
    "ow.ly",
    "shorturl.at",
];

const SUSPICIOUS_TLDS: &[&str] = &[
    "zip", "mov", "top", "xyz", "click", "link", "info", "icu", "tk", "ml", "ga", "cf", "gq",
];

const BRANDS: &[&str] = &[
    "google",
    "microsoft",
    "paypal",
    "apple",
    "safaricom",
    "mpesa",
    "facebook",
];

/// Country-code second-level suffixes where the registrable domain
/// spans three labels (example.co.ke, not co.ke).
const SECOND_LEVEL_SUFFIXES: &[&str] = &[
    "co.ke", "or.ke", "ac.ke", "go.ke", "ne.ke", "co.uk", "org.uk", "ac.uk", "gov.uk", "me.uk",
    "co.za", "org.za", "com.au", "net.au", "org.au", "com.br", "co.in", "co.jp", "co.nz",
    "com.ng", "com.mx", "com.tr", "com.pk",
];

/// Prefix a bare URL with http:// so it parses; scheme defaults to http
/// when absent.
pub fn ensure_scheme(url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("http://{url}")
    }
}

pub(crate) struct UrlParts {
    pub scheme: String,
    pub host: String,
    pub path: String,
    pub query: String,
}

/// Decompose a URL. Prefers the strict parser, but falls back to a
/// naive split when it rejects the input. Malicious URLs with invalid
/// IDNA labels or stray characters still need features, not errors.
pub(crate) fn split_url(full: &str) -> UrlParts {
    if let Ok(u) = Url::parse(full) {
        if u.host_str().is_some() {
            return UrlParts {
                scheme: u.scheme().to_string(),
                host: u.host_str().unwrap_or("").to_lowercase(),
                path: u.path().to_string(),
                query: u.query().unwrap_or("").to_string(),
            };
        }
    }
    let (scheme, rest) = full
        .split_once("://")
        .map(|(s, r)| (s.to_lowercase(), r))
        .unwrap_or((String::new(), full));
    let authority_end = rest
        .find(|c: char| "/?#".contains(c))
        .unwrap_or(rest.len());
    let authority = &rest[..authority_end];
    let host = authority
        .rsplit_once('@')
        .map(|(_, h)| h)
        .unwrap_or(authority);
    let host = host.split(':').next().unwrap_or("").to_lowercase();
    let tail = &rest[authority_end..];
    let (path, query) = match tail.split_once('?') {
        Some((p, q)) => (
            p.to_string(),
            q.split('#').next().unwrap_or("").to_string(),
        ),
        None => (tail.split('#').next().unwrap_or("").to_string(), String::new()),
    };
    UrlParts {
        scheme,
        host,
        path,
        query,
    }
}

/// Lowercased host of a URL, empty when none can be recovered.
pub fn host_of(url: &str) -> String {
    split_url(&ensure_scheme(url)).host
}

/// Domain + public suffix, excluding subdomains. IP-literal hosts have
/// no registrable domain.
pub fn registrable_domain(host: &str) -> String {
    let host = host.to_lowercase();
    if host.is_empty() || looks_like_ip_host(&host) {
        return String::new();
    }
    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() < 2 {
        return host;
    }
    let last_two = labels[labels.len() - 2..].join(".");
    if SECOND_LEVEL_SUFFIXES.contains(&last_two.as_str()) && labels.len() >= 3 {
        labels[labels.len() - 3..].join(".")
    } else {
        last_two
    }
}

pub fn is_shortener_domain(domain: &str) -> bool {
    SHORTENERS.contains(&domain.to_lowercase().as_str())
}

/// Four dot-separated octets, each 0-255.
pub fn looks_like_ip_host(host: &str) -> bool {
    let parts: Vec<&str> = host.split('.').collect();
    parts.len() == 4 && parts.iter().all(|p| !p.is_empty() && p.parse::<u8>().is_ok())
}

pub fn suspicious_tld(domain: &str) -> bool {
    let tld = domain.rsplit('.').next().unwrap_or("");
    !tld.is_empty() && SUSPICIOUS_TLDS.contains(&tld.to_lowercase().as_str())
}

pub fn count_dots(host: &str) -> usize {
    host.matches('.').count()
}

pub fn has_at_symbol(url: &str) -> bool {
    url.contains('@')
}

pub fn has_punycode(host: &str) -> bool {
    host.contains("xn--")
}

/// A known brand token appears somewhere in the host while the
/// registrable domain is not the brand's own. Covers both subdomain
/// spoofing (paypal.com.evil.example) and lookalike domain labels
/// (xn--paypal-abc.tk, paypal-secure.top).
pub fn has_misleading_brand(host: &str) -> bool {
    if host.is_empty() {
        return false;
    }
    let host = host.to_lowercase();
    let registrable = registrable_domain(&host);
    BRANDS
        .iter()
        .any(|b| host.contains(b) && registrable != format!("{b}.com"))
}

/// Fixed-order numeric feature vector for the URL model.
pub fn url_to_features(url: &str) -> [f64; FEATURE_DIM] {
    let full = ensure_scheme(url);
    let parts = split_url(&full);
    let domain = registrable_domain(&parts.host);

    [
        full.len() as f64,
        parts.host.len() as f64,
        domain.len() as f64,
        parts.path.len() as f64,
        parts.query.len() as f64,
        count_dots(&parts.host) as f64,
        is_shortener_domain(&domain) as u8 as f64,
        looks_like_ip_host(&parts.host) as u8 as f64,
        (parts.scheme == "https") as u8 as f64,
        full.contains('@') as u8 as f64,
        full.contains("..") as u8 as f64,
        full.contains('=') as u8 as f64,
        full.contains('%') as u8 as f64,
        has_punycode(&parts.host) as u8 as f64,
        has_misleading_brand(&parts.host) as u8 as f64,
        full.chars().filter(|c| c.is_ascii_digit()).count() as f64,
        full.chars().filter(|c| "-_.".contains(*c)).count() as f64,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheme_defaults_to_http() {
        assert_eq!(ensure_scheme("evil.example/a"), "http://evil.example/a");
        assert_eq!(ensure_scheme("https://ok.example"), "https://ok.example");
    }

    #[test]
    fn ip_host_detection() {
        assert!(looks_like_ip_host("192.168.0.1"));
        assert!(looks_like_ip_host("1.2.3.255"));
        assert!(!looks_like_ip_host("1.2.3.256"));
        assert!(!looks_like_ip_host("1.2.3"));
        assert!(!looks_like_ip_host("evil.example"));
    }

    #[test]
    fn registrable_domain_strips_subdomains() {
        assert_eq!(registrable_domain("login.paypal.com"), "paypal.com");
        assert_eq!(registrable_domain("a.b.example.co.ke"), "example.co.ke");
        assert_eq!(registrable_domain("example.co.uk"), "example.co.uk");
        assert_eq!(registrable_domain("example.com"), "example.com");
        assert_eq!(registrable_domain("10.0.0.1"), "");
    }

    #[test]
    fn shortener_and_tld_sets() {
        assert!(is_shortener_domain("bit.ly"));
        assert!(!is_shortener_domain("bitly.com"));
        assert!(suspicious_tld("evil.tk"));
        assert!(suspicious_tld("files.zip"));
        assert!(!suspicious_tld("example.com"));
    }

    #[test]
    fn misleading_brand_fires_on_spoofed_hosts() {
        assert!(has_misleading_brand("paypal.com.evil.example"));
        assert!(has_misleading_brand("xn--paypal-abc.tk"));
        assert!(has_misleading_brand("secure-mpesa.top"));
        assert!(!has_misleading_brand("www.paypal.com"));
        assert!(!has_misleading_brand("login.safaricom.com"));
        assert!(!has_misleading_brand("example.com"));
    }

    #[test]
    fn feature_vector_shape_and_order_are_pinned() {
        let feats = url_to_features("https://login.paypal.com.evil.tk/a?b=1%20c");
        assert_eq!(feats.len(), FEATURE_DIM);
        // https flag
        assert_eq!(feats[8], 1.0);
        // '=' and '%' indicators
        assert_eq!(feats[11], 1.0);
        assert_eq!(feats[12], 1.0);
        // misleading brand
        assert_eq!(feats[14], 1.0);
    }

    #[test]
    fn unparsable_url_yields_zeroed_features() {
        let feats = url_to_features("http://");
        assert_eq!(feats[1], 0.0);
        assert_eq!(feats[2], 0.0);
    }

    #[test]
    fn fallback_splitter_recovers_hosts_the_strict_parser_rejects() {
        // Invalid IDNA labels must still produce a host, not an error.
        assert_eq!(host_of("http://xn--paypal-abc.tk/login@evil.com"), "xn--paypal-abc.tk");
        assert_eq!(host_of("http://user@host.example:8080/a?b#c"), "host.example");
        assert_eq!(host_of("bare-host.example/path"), "bare-host.example");
    }
}
