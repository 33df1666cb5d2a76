use serde::Deserialize;
use tracing::warn;

/// Hosts and limits used while resolving an article. Every field can be
/// overridden from the environment, e.g. `MEDIUM_FETCH_TIMEOUT_SECS=5`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub image_host: String,
    pub media_host: String,
    pub profile_host: String,
    pub fetch_timeout_secs: u64,
    pub user_agent: String,
    pub allowed_hosts: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            image_host: "https://miro.medium.com/".to_string(),
            media_host: "https://medium.com/media/".to_string(),
            profile_host: "https://medium.com/u/".to_string(),
            fetch_timeout_secs: 15,
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
            allowed_hosts: vec!["medium.com".to_string()],
        }
    }
}

impl Settings {
    /// Defaults layered under `MEDIUM_*` environment variables.
    pub fn load() -> Self {
        let built = config::Config::builder()
            .add_source(
                config::Environment::with_prefix("MEDIUM")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("allowed_hosts"),
            )
            .build()
            .and_then(|c| c.try_deserialize::<Settings>());

        match built {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Ignoring environment settings: {}", e);
                Settings::default()
            }
        }
    }

    /// `ImageMetadata:1*abc.png` and bare `1*abc.png` both map to `<image_host>1*abc.png`.
    pub fn image_url(&self, id: &str) -> String {
        format!("{}{}", self.image_host, id_suffix(id))
    }

    pub fn media_url(&self, id: &str) -> String {
        format!("{}{}", self.media_host, id_suffix(id))
    }

    pub fn profile_url(&self, user_id: &str) -> String {
        format!("{}{}", self.profile_host, user_id)
    }

    pub fn is_allowed_host(&self, host: &str) -> bool {
        self.allowed_hosts.iter().any(|h| h == host)
    }
}

/// Last `:`-separated segment of a composite record id.
pub fn id_suffix(id: &str) -> &str {
    id.rsplit(':').next().unwrap_or(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_url_uses_suffix() {
        let s = Settings::default();
        let url = s.image_url("0:abc123");
        assert!(url.ends_with("/abc123"));
        assert_eq!(url, "https://miro.medium.com/abc123");
    }

    #[test]
    fn bare_id_passes_through() {
        assert_eq!(id_suffix("1*xyz.jpeg"), "1*xyz.jpeg");
        assert_eq!(id_suffix("a:b:c"), "c");
        assert_eq!(id_suffix(""), "");
    }

    #[test]
    fn media_url_uses_suffix() {
        let s = Settings::default();
        assert_eq!(s.media_url("MediaResource:f00"), "https://medium.com/media/f00");
    }

    #[test]
    fn default_host_allowed() {
        let s = Settings::default();
        assert!(s.is_allowed_host("medium.com"));
        assert!(!s.is_allowed_host("example.com"));
    }
}
