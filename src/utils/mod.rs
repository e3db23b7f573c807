//! Utility functions and helpers.

pub mod http;

use url::Url;

/// Resolve a potentially relative URL against a base URL.
pub fn resolve_url(base: &Url, href: &str) -> String {
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Basename of a URL's path, or `None` if the path ends in a directory.
///
/// Query strings and fragments are ignored. Percent escapes are kept as-is.
pub fn filename_from_url(url: &str) -> Option<String> {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    };

    path.rsplit('/')
        .next()
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

/// Trim and collapse internal whitespace runs to single spaces.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_url() {
        let base = Url::parse("https://kakaku.com").unwrap();
        assert_eq!(
            resolve_url(&base, "/card/item/123/"),
            "https://kakaku.com/card/item/123/"
        );
        assert_eq!(
            resolve_url(&base, "//img1.kakaku.k-img.com/a.png"),
            "https://img1.kakaku.k-img.com/a.png"
        );
        assert_eq!(
            resolve_url(&base, "https://other.com/x"),
            "https://other.com/x"
        );
    }

    #[test]
    fn test_filename_from_url() {
        assert_eq!(
            filename_from_url("https://img.example.com/card/abc.jpg?w=120#top"),
            Some("abc.jpg".to_string())
        );
        assert_eq!(
            filename_from_url("images/brand/visa.gif"),
            Some("visa.gif".to_string())
        );
        assert_eq!(filename_from_url("https://img.example.com/card/"), None);
        assert_eq!(filename_from_url("https://img.example.com"), None);
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  永年\n  無料 \t"), "永年 無料");
        assert_eq!(normalize_whitespace(" \n "), "");
    }
}
