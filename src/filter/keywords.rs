//! Blacklist keyword matching for links that must never be followed.

use crate::request::Request;

/// True when the request URL contains any of `keywords` (case-insensitive)
#[must_use]
pub fn is_ignored_by_keywords(req: &Request, keywords: &[String]) -> bool {
    if keywords.is_empty() {
        return false;
    }
    let url = req.url.as_str().to_ascii_lowercase();
    keywords
        .iter()
        .map(|k| k.trim().to_ascii_lowercase())
        .filter(|k| !k.is_empty())
        .any(|k| url.contains(&k))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::RequestSource;

    #[test]
    fn matches_substring_case_insensitively() {
        let req = Request::parse("http://h/account/LogOut?x=1", RequestSource::DomDiscovered)
            .unwrap();
        assert!(is_ignored_by_keywords(&req, &["logout".to_string()]));
        assert!(!is_ignored_by_keywords(&req, &["delete".to_string()]));
        assert!(!is_ignored_by_keywords(&req, &[String::new()]));
    }
}
