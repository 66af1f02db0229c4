// src/enrich/registry.rs

use anyhow::{anyhow, Context, Result};
use futures::stream::{self, StreamExt};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::RegistryConfig;

/// The fields of a registry organization we care about.
#[derive(Debug, Deserialize)]
pub struct Organization {
    pub title: Option<String>,
    pub name: Option<String>,
}

impl Organization {
    /// `title`, else `name`; blank values count as missing.
    pub fn display_title(self) -> Option<String> {
        self.title
            .filter(|t| !t.trim().is_empty())
            .or(self.name.filter(|n| !n.trim().is_empty()))
    }
}

/// Minimal client for the GBIF registry organization endpoint.
#[derive(Clone)]
pub struct RegistryClient {
    client: Client,
    base: Url,
}

impl RegistryClient {
    pub fn new(config: &RegistryConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .context("building registry HTTP client")?;
        Self::with_client(client, &config.base_url)
    }

    pub fn with_client(client: Client, base_url: &str) -> Result<Self> {
        let base = Url::parse(base_url)
            .with_context(|| format!("parsing registry base URL {}", base_url))?;
        if base.cannot_be_a_base() {
            return Err(anyhow!("registry base URL {} cannot take a path", base_url));
        }
        Ok(Self { client, base })
    }

    /// `{base}/organization/{key}`, with the key percent-encoded as one segment.
    pub fn organization_url(&self, key: &str) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("organization").push(key);
        }
        url
    }

    /// Title of organization `key`. Any failure (non-200, transport, bad JSON)
    /// yields `None`.
    pub async fn org_title(&self, key: &str) -> Option<String> {
        let url = self.organization_url(key);
        let resp = match self.client.get(url.clone()).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(%url, error = %e, "registry request failed");
                return None;
            }
        };
        if resp.status() != StatusCode::OK {
            debug!(%url, status = %resp.status(), "registry returned no organization");
            return None;
        }
        match resp.json::<Organization>().await {
            Ok(org) => org.display_title(),
            Err(e) => {
                warn!(%url, error = %e, "undecodable registry response");
                None
            }
        }
    }

    /// Look up every key once, at most `concurrency` requests in flight.
    pub async fn org_titles(
        &self,
        keys: &[String],
        concurrency: usize,
    ) -> HashMap<String, Option<String>> {
        let titles: HashMap<String, Option<String>> = stream::iter(keys.iter().cloned())
            .map(|key| async move {
                let title = self.org_title(&key).await;
                (key, title)
            })
            .buffer_unordered(concurrency.max(1))
            .collect()
            .await;
        let found = titles.values().filter(|t| t.is_some()).count();
        info!(requested = keys.len(), found, "registry lookups done");
        titles
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn routes(pairs: &[(&str, u16, &str)]) -> HashMap<String, (u16, String)> {
        pairs
            .iter()
            .map(|(p, s, b)| (p.to_string(), (*s, b.to_string())))
            .collect()
    }

    #[test]
    fn builds_organization_urls() -> Result<()> {
        let client = RegistryClient::with_client(Client::new(), "https://api.gbif.org/v1")?;
        assert_eq!(
            client.organization_url("abc").as_str(),
            "https://api.gbif.org/v1/organization/abc"
        );
        let client = RegistryClient::with_client(Client::new(), "https://api.gbif.org/v1/")?;
        assert_eq!(
            client.organization_url("a b").as_str(),
            "https://api.gbif.org/v1/organization/a%20b"
        );
        Ok(())
    }

    #[test]
    fn title_falls_back_to_name() {
        let org = Organization {
            title: Some(" ".into()),
            name: Some("Herbarium".into()),
        };
        assert_eq!(org.display_title().as_deref(), Some("Herbarium"));
        let org = Organization {
            title: None,
            name: None,
        };
        assert_eq!(org.display_title(), None);
    }

    #[tokio::test]
    async fn fetches_titles_and_degrades_failures_to_none() -> Result<()> {
        let base = test_server::serve(routes(&[
            ("/v1/organization/k1", 200, r#"{"title":"Natural History Museum"}"#),
            ("/v1/organization/k2", 200, r#"{"name":"Only Name"}"#),
            ("/v1/organization/k3", 500, "boom"),
            ("/v1/organization/k4", 200, "not json"),
        ]))
        .await;
        let client = RegistryClient::with_client(Client::new(), &format!("{}/v1", base))?;

        let keys: Vec<String> = ["k1", "k2", "k3", "k4", "k5"].iter().map(|s| s.to_string()).collect();
        let titles = client.org_titles(&keys, 2).await;

        assert_eq!(titles.len(), 5);
        assert_eq!(titles["k1"].as_deref(), Some("Natural History Museum"));
        assert_eq!(titles["k2"].as_deref(), Some("Only Name"));
        assert_eq!(titles["k3"], None);
        assert_eq!(titles["k4"], None);
        assert_eq!(titles["k5"], None);
        Ok(())
    }
}
