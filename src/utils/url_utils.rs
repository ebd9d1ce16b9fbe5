//! URL string helpers shared by seed parsing, shaping and the binary.

use url::Url;

/// Prefix a scheme onto scheme-less input.
///
/// Ports 80 and 8080 imply plain http; anything else is assumed to be https.
#[must_use]
pub fn add_scheme_if_missing(input: &str) -> String {
    if input.starts_with("http://") || input.starts_with("https://") {
        return input.to_string();
    }
    let authority = input.split(['/', '?', '#']).next().unwrap_or_default();
    match authority.rsplit_once(':').map(|(_, port)| port) {
        Some("80" | "8080") => format!("http://{input}"),
        _ => format!("https://{input}"),
    }
}

/// `scheme://host[:port]` of a URL, without trailing slash
#[must_use]
pub fn origin_of(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{}://{host}:{port}", url.scheme()),
        None => format!("{}://{host}", url.scheme()),
    })
}

/// Order-preserving de-duplication
#[must_use]
pub fn unique_urls(urls: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    urls.into_iter()
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheme_is_chosen_by_port() {
        assert_eq!(add_scheme_if_missing("example.com:80/a"), "http://example.com:80/a");
        assert_eq!(add_scheme_if_missing("example.com:8080"), "http://example.com:8080");
        assert_eq!(add_scheme_if_missing("example.com"), "https://example.com");
        assert_eq!(add_scheme_if_missing("example.com:8443"), "https://example.com:8443");
        assert_eq!(add_scheme_if_missing("https://example.com"), "https://example.com");
    }

    #[test]
    fn unique_keeps_first_occurrence() {
        let urls = vec!["b".to_string(), "a".to_string(), "b".to_string()];
        assert_eq!(unique_urls(urls), vec!["b", "a"]);
    }
}
