use anyhow::{Context, Result};
use reqwest::Client;
use std::{fmt, path::PathBuf};
use tokio::fs;
use url::Url;

/// Where a source file is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    File(PathBuf),
    Remote(Url),
}

fn as_http_url(s: &str) -> Option<Url> {
    Url::parse(s)
        .ok()
        .filter(|u| matches!(u.scheme(), "http" | "https"))
}

impl Location {
    /// Resolve `path` against `base`. An absolute http(s) `path` ignores the
    /// base; a URL base is joined as a directory.
    pub fn resolve(base: &str, path: &str) -> Result<Self> {
        if let Some(url) = as_http_url(path) {
            return Ok(Location::Remote(url));
        }
        if let Some(mut base_url) = as_http_url(base) {
            if !base_url.path().ends_with('/') {
                let dir = format!("{}/", base_url.path());
                base_url.set_path(&dir);
            }
            let url = base_url
                .join(path)
                .with_context(|| format!("joining {} onto {}", path, base_url))?;
            return Ok(Location::Remote(url));
        }
        Ok(Location::File(PathBuf::from(base).join(path)))
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::File(p) => write!(f, "{}", p.display()),
            Location::Remote(u) => write!(f, "{}", u),
        }
    }
}

/// Read the whole source into memory.
pub async fn read_location(client: &Client, location: &Location) -> Result<Vec<u8>> {
    match location {
        Location::File(path) => fs::read(path)
            .await
            .with_context(|| format!("reading {}", path.display())),
        Location::Remote(url) => {
            let resp = client
                .get(url.clone())
                .send()
                .await
                .with_context(|| format!("GET {}", url))?
                .error_for_status()?;
            let bytes = resp
                .bytes()
                .await
                .with_context(|| format!("reading body from {}", url))?;
            Ok(bytes.to_vec())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_relative_paths_against_directory() -> Result<()> {
        assert_eq!(
            Location::resolve("data", "pub.csv")?,
            Location::File(PathBuf::from("data/pub.csv"))
        );
        Ok(())
    }

    #[test]
    fn resolves_relative_paths_against_url_base() -> Result<()> {
        let loc = Location::resolve("https://example.org/dash", "out/pub.csv")?;
        assert_eq!(
            loc,
            Location::Remote(Url::parse("https://example.org/dash/out/pub.csv")?)
        );
        assert_eq!(loc.to_string(), "https://example.org/dash/out/pub.csv");
        Ok(())
    }

    #[test]
    fn absolute_url_ignores_base() -> Result<()> {
        let loc = Location::resolve("data", "http://host/x.tsv")?;
        assert_eq!(loc, Location::Remote(Url::parse("http://host/x.tsv")?));
        Ok(())
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let client = Client::new();
        let loc = Location::File(PathBuf::from("/nonexistent/file.csv"));
        assert!(read_location(&client, &loc).await.is_err());
    }
}
