//! Path-segment similarity used to cluster shaped URLs

use url::Url;

/// Segments of the URL path, without empty segments
#[must_use]
pub fn path_segments(raw: &str) -> Vec<String> {
    Url::parse(raw)
        .ok()
        .map(|url| {
            url.path()
                .split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Whether two paths belong to the same cluster.
///
/// Depths may differ by at most two. Within that, paths are similar when they
/// share at least three leading segments, or when the shared prefix covers
/// more than 80% of the longer path.
#[must_use]
pub fn is_path_similar<A: AsRef<str>, B: AsRef<str>>(path1: &[A], path2: &[B]) -> bool {
    if path1.len().abs_diff(path2.len()) > 2 {
        return false;
    }
    let common = path1
        .iter()
        .zip(path2)
        .take_while(|(a, b)| a.as_ref() == b.as_ref())
        .count();
    let longest = path1.len().max(path2.len());
    if longest == 0 {
        return false;
    }
    common >= 3 || common as f64 / longest as f64 > 0.8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_prefix_of_three_is_similar() {
        assert!(is_path_similar(&["a", "b", "c", "x"], &["a", "b", "c", "y"]));
        assert!(!is_path_similar(&["a"], &["z"]));
    }

    #[test]
    fn ratio_and_depth_rules() {
        assert!(is_path_similar(&["a"], &["a"]));
        assert!(!is_path_similar(&["a", "b"], &["a", "c"]));
        assert!(!is_path_similar(
            &["a", "b", "c"],
            &["a", "b", "c", "d", "e", "f"]
        ));
        let empty: [&str; 0] = [];
        assert!(!is_path_similar(&empty, &empty));
    }

    #[test]
    fn segments_skip_empty_parts() {
        assert_eq!(path_segments("http://h//a/b/"), vec!["a", "b"]);
        assert!(path_segments("http://h").is_empty());
        assert!(path_segments("not a url").is_empty());
    }
}
