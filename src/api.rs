// Release client: a small blocking HTTP client for the GitHub releases API
// and plain file downloads. Kept synchronous; the launcher only ever does
// one download at a time while the user waits on a spinner.

use crate::error::{ManagerError, Result};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

pub const CANARY_REPO: &str = "xenia-canary/xenia-canary";
pub const NON_CANARY_REPO: &str = "xenia-project/release-builds-windows";
pub const NON_CANARY_ASSET: &str = "xenia_master.zip";
pub const PATCHES_URL: &str =
    "https://github.com/xenia-canary/game-patches/archive/refs/heads/main.zip";

/// Holds the reqwest client plus the API base URL (overridable for mirrors).
#[derive(Clone)]
pub struct ReleaseClient {
    client: Client,
    base_url: String,
    patches_url: String,
}

/// One downloadable file attached to a release.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ReleaseAsset {
    pub name: String,
    pub browser_download_url: String,
    #[serde(default)]
    pub size: u64,
}

/// The subset of the `releases/latest` response we use.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Release {
    #[serde(default)]
    pub tag_name: String,
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

/// How to pick the archive out of a release's assets.
#[derive(Debug, Clone, Copy)]
pub enum AssetSelector<'a> {
    Suffix(&'a str),
    Exact(&'a str),
}

impl AssetSelector<'_> {
    fn matches(&self, name: &str) -> bool {
        match self {
            AssetSelector::Suffix(suffix) => name.ends_with(suffix),
            AssetSelector::Exact(wanted) => name == *wanted,
        }
    }

    fn describe(&self) -> String {
        match self {
            AssetSelector::Suffix(suffix) => format!("*{}", suffix),
            AssetSelector::Exact(wanted) => (*wanted).to_string(),
        }
    }
}

impl Release {
    /// First asset accepted by the selector, or `NoAsset`.
    pub fn find_asset(&self, selector: AssetSelector<'_>) -> Result<&ReleaseAsset> {
        self.assets
            .iter()
            .find(|a| selector.matches(&a.name))
            .ok_or_else(|| ManagerError::NoAsset {
                tag: self.tag_name.clone(),
                wanted: selector.describe(),
            })
    }
}

impl ReleaseClient {
    /// Build a client using `GITHUB_API_URL` and `XENIA_PATCHES_URL` when set.
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("GITHUB_API_URL")
            .unwrap_or_else(|_| "https://api.github.com".into());
        let patches_url = std::env::var("XENIA_PATCHES_URL").unwrap_or_else(|_| PATCHES_URL.into());
        Self::new(base_url, patches_url)
    }

    pub fn new(base_url: impl Into<String>, patches_url: impl Into<String>) -> Result<Self> {
        // GitHub rejects API calls without a User-Agent.
        let client = Client::builder()
            .user_agent(concat!("xenia-manager/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(ReleaseClient {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            patches_url: patches_url.into(),
        })
    }

    pub fn patches_url(&self) -> &str {
        &self.patches_url
    }

    /// GET `/repos/<repo>/releases/latest`.
    pub fn latest_release(&self, repo: &str) -> Result<Release> {
        let url = format!("{}/repos/{}/releases/latest", &self.base_url, repo);
        log::info!("Fetching release metadata from {}", url);
        let res = self.client.get(&url).send()?;
        if !res.status().is_success() {
            let status = res.status();
            let txt = res.text().unwrap_or_default();
            return Err(ManagerError::Network(format!(
                "release lookup failed: {} - {}",
                status, txt
            )));
        }
        let release: Release = res.json()?;
        log::info!("Latest release of {} is {}", repo, release.tag_name);
        Ok(release)
    }

    /// Download a whole file into memory.
    pub fn download(&self, url: &str) -> Result<Vec<u8>> {
        log::info!("Downloading {}", url);
        let res = self.client.get(url).send()?;
        if !res.status().is_success() {
            let status = res.status();
            return Err(ManagerError::Network(format!(
                "download of {} failed: {}",
                url, status
            )));
        }
        let bytes = res.bytes()?;
        log::info!("Downloaded {} bytes", bytes.len());
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn release() -> Release {
        serde_json::from_str(
            r#"{
                "tag_name": "v1.0.2813",
                "assets": [
                    {"name": "xenia_canary.pdb.7z", "browser_download_url": "https://x/pdb", "size": 10},
                    {"name": "xenia_canary.zip", "browser_download_url": "https://x/zip", "size": 20},
                    {"name": "xenia_master.zip", "browser_download_url": "https://x/master"}
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn suffix_selector_takes_first_zip() {
        let r = release();
        let asset = r.find_asset(AssetSelector::Suffix(".zip")).unwrap();
        assert_eq!(asset.browser_download_url, "https://x/zip");
    }

    #[test]
    fn exact_selector_matches_by_name() {
        let r = release();
        let asset = r.find_asset(AssetSelector::Exact(NON_CANARY_ASSET)).unwrap();
        assert_eq!(asset.browser_download_url, "https://x/master");
        assert_eq!(asset.size, 0);
    }

    #[test]
    fn missing_asset_reports_tag() {
        let r = release();
        match r.find_asset(AssetSelector::Exact("xenia_linux.zip")) {
            Err(ManagerError::NoAsset { tag, wanted }) => {
                assert_eq!(tag, "v1.0.2813");
                assert_eq!(wanted, "xenia_linux.zip");
            }
            other => panic!("unexpected: {:?}", other.map(|a| a.name.clone())),
        }
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = ReleaseClient::new("http://localhost:9000/", PATCHES_URL).unwrap();
        assert_eq!(client.base_url, "http://localhost:9000");
        assert_eq!(client.patches_url(), PATCHES_URL);
    }
}
