use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(180);
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(60);

const PREDICT_PATH: &str = "predict_from_png/";
const JSON_PATH: &str = "json/";

/// How the endpoint hands back probabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    /// The upload response body is the probability object.
    Direct,
    /// The upload returns a `file_id`; probabilities are fetched from `/json/{file_id}`.
    FileId,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub fetch_timeout: Duration,
    pub protocol: Protocol,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            protocol: Protocol::Direct,
        }
    }
}

impl ClientConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn predict_url(&self) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), PREDICT_PATH)
    }

    pub fn json_url(&self, file_id: &str) -> String {
        format!(
            "{}/{}{}",
            self.base_url.trim_end_matches('/'),
            JSON_PATH,
            file_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_endpoint_matches_local_api() {
        let config = ClientConfig::default();
        assert_eq!(config.predict_url(), "http://127.0.0.1:8000/predict_from_png/");
        assert_eq!(config.json_url("abc"), "http://127.0.0.1:8000/json/abc");
        assert_eq!(config.timeout, Duration::from_secs(180));
        assert_eq!(config.protocol, Protocol::Direct);
    }

    #[test]
    fn trailing_slashes_are_ignored() {
        let config = ClientConfig::with_base_url("https://api.example.org/xray//");
        assert_eq!(config.predict_url(), "https://api.example.org/xray/predict_from_png/");
    }
}
