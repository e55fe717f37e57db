const OPTION_DELIMITER: char = '$';
const DOMAIN_ANCHOR: &str = "||";

// Syntax that needs more than declarative network matching.
const UNSUPPORTED_MARKERS: [&str; 5] = ["##", "#@#", "#?#", "#$#", "^$popup"];

/// Splits a filter body at its first unescaped `$` into pattern and option suffix.
pub fn split_options(body: &str) -> (&str, Option<&str>) {
    let bytes = body.as_bytes();
    let mut idx = 0;
    while let Some(offset) = body[idx..].find(OPTION_DELIMITER) {
        let pos = idx + offset;
        if pos == 0 || bytes[pos - 1] != b'\\' {
            return (&body[..pos], Some(&body[pos + 1..]));
        }
        idx = pos + 1;
    }
    (body, None)
}

/// Rewrites a filter body into an anchored match pattern, or `None` when the
/// filter cannot be expressed as a network rule.
///
/// More structured forms are kept verbatim; only bare hosts are rewritten into
/// `*://<host>/*`.
pub fn normalize_pattern(body: &str) -> Option<String> {
    if body.starts_with('!') || UNSUPPORTED_MARKERS.iter().any(|m| body.contains(m)) {
        return None;
    }

    let (pattern, _) = split_options(body);
    if pattern.is_empty() {
        return None;
    }

    if let Some(domain) = pattern.strip_prefix(DOMAIN_ANCHOR) {
        let domain = domain.strip_suffix('^').unwrap_or(domain);
        if domain.is_empty() {
            return None;
        }
        return Some(format!("{DOMAIN_ANCHOR}{domain}"));
    }

    if pattern.starts_with('|') {
        return Some(pattern.to_string());
    }

    if pattern.contains(['*', '^', '/']) {
        return Some(pattern.to_string());
    }

    Some(format!("*://{pattern}/*"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_options() {
        assert_eq!(
            split_options("||a.com^$script,image"),
            ("||a.com^", Some("script,image"))
        );
        assert_eq!(split_options("/ads/banner.gif"), ("/ads/banner.gif", None));
        assert_eq!(split_options("/a\\$b$xhr"), ("/a\\$b", Some("xhr")));
        assert_eq!(split_options("$script"), ("", Some("script")));
    }

    #[test]
    fn test_domain_anchor() {
        assert_eq!(
            normalize_pattern("||ads.example.com^$script"),
            Some("||ads.example.com".to_string())
        );
        assert_eq!(
            normalize_pattern("||cdn.example.com/lib.js|"),
            Some("||cdn.example.com/lib.js|".to_string())
        );
        assert_eq!(normalize_pattern("||^"), None);
        assert_eq!(normalize_pattern("||"), None);
    }

    #[test]
    fn test_verbatim_forms() {
        assert_eq!(
            normalize_pattern("|https://tracker.io/"),
            Some("|https://tracker.io/".to_string())
        );
        assert_eq!(
            normalize_pattern("/banner/*/img"),
            Some("/banner/*/img".to_string())
        );
        assert_eq!(normalize_pattern("ad-frame^"), Some("ad-frame^".to_string()));
        assert_eq!(normalize_pattern("-ad-*.gif"), Some("-ad-*.gif".to_string()));
    }

    #[test]
    fn test_bare_host_is_wrapped() {
        assert_eq!(
            normalize_pattern("trackers.net"),
            Some("*://trackers.net/*".to_string())
        );
        assert_eq!(
            normalize_pattern("trackers.net$image"),
            Some("*://trackers.net/*".to_string())
        );
    }

    #[test]
    fn test_rejections() {
        assert_eq!(normalize_pattern("example.com##.ad"), None);
        assert_eq!(normalize_pattern("example.com#@#.ad"), None);
        assert_eq!(normalize_pattern("example.com#?#div:has(.ad)"), None);
        assert_eq!(normalize_pattern("example.com#$#abort-on-property-read x"), None);
        assert_eq!(normalize_pattern("||popups.example^$popup"), None);
        assert_eq!(normalize_pattern("!not a filter"), None);
        assert_eq!(normalize_pattern("$script,domain=a.com"), None);
    }
}
