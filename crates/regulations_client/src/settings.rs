use std::time::Duration;

use url::Url;

use crate::{ClientError, FailureKind};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/";

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: Url,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub poll_interval: Duration,
}

impl ClientSettings {
    /// Settings with default timeouts for the given backend address.
    pub fn with_base_url(base_url: &str) -> Result<Self, ClientError> {
        let mut url = Url::parse(base_url)
            .map_err(|err| ClientError::new(FailureKind::InvalidUrl, err.to_string()))?;
        if url.cannot_be_a_base() {
            return Err(ClientError::new(
                FailureKind::InvalidUrl,
                format!("{base_url} cannot be used as a base url"),
            ));
        }
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(Self {
            base_url: url,
            ..Self::default()
        })
    }

    /// Joins path segments onto the base url, escaping each segment.
    ///
    /// A trailing `""` segment yields a trailing slash, which the backend
    /// requires on its collection endpoints.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                ClientError::new(
                    FailureKind::InvalidUrl,
                    format!("{} cannot be used as a base url", self.base_url),
                )
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base url is valid"),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
            poll_interval: Duration::from_secs(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_keep_base_path_and_escape_segments() {
        let settings = ClientSettings::with_base_url("http://backend:8000/api").unwrap();

        assert_eq!(
            settings.endpoint(&["create", ""]).unwrap().as_str(),
            "http://backend:8000/api/create/"
        );
        assert_eq!(
            settings
                .endpoint(&["regulations", "koch 2022.xml"])
                .unwrap()
                .as_str(),
            "http://backend:8000/api/regulations/koch%202022.xml"
        );
    }

    #[test]
    fn rejects_non_base_urls() {
        let err = ClientSettings::with_base_url("mailto:admin@example.com").unwrap_err();
        assert_eq!(err.kind, FailureKind::InvalidUrl);

        let err = ClientSettings::with_base_url("not a url").unwrap_err();
        assert_eq!(err.kind, FailureKind::InvalidUrl);
    }
}
