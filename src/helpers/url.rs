//! URL helper functions

use crate::config::SiteConfig;

/// Generate a site-relative URL under the base path
///
/// # Examples
/// ```ignore
/// url_for(&config, "/css/theme.css") // -> "/blog/css/theme.css"
/// ```
pub fn url_for(config: &SiteConfig, path: &str) -> String {
    let base = config.base_path.trim_end_matches('/');
    let path = path.trim_start_matches('/');

    if path.is_empty() {
        format!("{}/", base)
    } else {
        format!("{}/{}", base, path)
    }
}

/// Generate a full URL including the domain
///
/// # Examples
/// ```ignore
/// full_url_for(&config, "/about/") // -> "https://example.com/blog/about/"
/// ```
pub fn full_url_for(config: &SiteConfig, path: &str) -> String {
    format!("{}{}", config.url.trim_end_matches('/'), url_for(config, path))
}

/// Decode a percent-encoded URL path, lossily replacing invalid UTF-8
pub fn decode_url(path: &str) -> String {
    percent_encoding::percent_decode_str(path)
        .decode_utf8_lossy()
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> SiteConfig {
        let mut config = SiteConfig::default();
        config.url = "https://example.com".to_string();
        config.base_path = "/blog/".to_string();
        config
    }

    #[test]
    fn test_url_for() {
        let config = test_config();
        assert_eq!(url_for(&config, "/css/theme.css"), "/blog/css/theme.css");
        assert_eq!(url_for(&config, "about/"), "/blog/about/");
        assert_eq!(url_for(&config, ""), "/blog/");
    }

    #[test]
    fn test_url_for_root_base() {
        let config = SiteConfig::default();
        assert_eq!(url_for(&config, "posts/hello/"), "/posts/hello/");
        assert_eq!(url_for(&config, ""), "/");
    }

    #[test]
    fn test_full_url_for() {
        let config = test_config();
        assert_eq!(
            full_url_for(&config, "/about/"),
            "https://example.com/blog/about/"
        );
    }

    #[test]
    fn test_decode_url() {
        assert_eq!(decode_url("/posts/hello%20world/"), "/posts/hello world/");
        assert_eq!(decode_url("/caf%C3%A9/"), "/café/");
        assert_eq!(decode_url("/plain/"), "/plain/");
    }
}
