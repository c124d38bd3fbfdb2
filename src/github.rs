//! GitHub release access for HammerAddons
//!
//! The engine only needs a VersionTag-sortable tag and a byte stream per
//! release; everything wire-level lives here.

use std::error::Error;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::version::VersionTag;

/// Repository the release archives come from
pub const ADDONS_REPO: &str = "TeamSpen210/HammerAddons";

/// Default srctools.vdf, fetched when the game has none yet
pub const SRCTOOLS_TEMPLATE_URL: &str =
    "https://raw.githubusercontent.com/DarviL82/HAInstaller/main/resources/srctools.vdf";

const USER_AGENT: &str = concat!("HAInstaller/", env!("CARGO_PKG_VERSION"));

/// GitHub release metadata
#[derive(Deserialize, Debug, Clone)]
pub struct GithubRelease {
    pub tag_name: String,
    pub assets: Vec<GithubAsset>,
}

/// GitHub release asset
#[derive(Deserialize, Debug, Clone)]
pub struct GithubAsset {
    pub name: String,
    pub browser_download_url: String,
}

impl GithubRelease {
    /// The archive asset to install, if the release carries one
    pub fn zip_asset(&self) -> Option<&GithubAsset> {
        self.assets
            .iter()
            .find(|a| a.name.to_lowercase().ends_with(".zip"))
    }
}

/// List the published releases of a repository.
pub fn fetch_releases(repo: &str) -> Result<Vec<GithubRelease>, Box<dyn Error>> {
    let url = format!("https://api.github.com/repos/{}/releases", repo);
    let response = ureq::get(&url).set("User-Agent", USER_AGENT).call()?;
    let releases: Vec<GithubRelease> = response.into_json()?;
    Ok(releases)
}

/// Pick the release with the greatest version tag.
///
/// Releases whose tags carry no usable version ("experimental", empty) are
/// skipped rather than failing the whole run.
pub fn pick_latest(releases: Vec<GithubRelease>) -> Option<(VersionTag, GithubRelease)> {
    releases
        .into_iter()
        .filter_map(|release| {
            let tag = VersionTag::parse(&release.tag_name).ok()?;
            Some((tag, release))
        })
        .max_by(|(a, _), (b, _)| a.cmp(b))
}

/// Download a file from URL to the specified path
pub fn download_file(url: &str, path: &Path) -> Result<(), Box<dyn Error>> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let response = ureq::get(url).set("User-Agent", USER_AGENT).call()?;
    let mut reader = response.into_reader();
    let mut file = fs::File::create(path)?;
    std::io::copy(&mut reader, &mut file)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn release(tag: &str) -> GithubRelease {
        GithubRelease {
            tag_name: tag.to_string(),
            assets: vec![GithubAsset {
                name: format!("hammeraddons_{}.zip", tag),
                browser_download_url: format!("https://example.invalid/{}.zip", tag),
            }],
        }
    }

    #[test]
    fn test_pick_latest_by_version_order() {
        let releases = vec![release("v2.5.10"), release("v2.5.9"), release("v2.4.0")];
        let (tag, picked) = pick_latest(releases).unwrap();
        assert_eq!(tag.to_string(), "2.5.10");
        assert_eq!(picked.tag_name, "v2.5.10");
    }

    #[test]
    fn test_unparsable_tags_skipped() {
        let releases = vec![release("experimental"), release("v1.2")];
        let (tag, _) = pick_latest(releases).unwrap();
        assert_eq!(tag.to_string(), "1.2");

        assert!(pick_latest(vec![release("nightly")]).is_none());
    }

    #[test]
    fn test_release_deserialization() {
        let json = r#"[{
            "tag_name": "v2.5.10",
            "assets": [{
                "name": "hammeraddons_2510.zip",
                "browser_download_url": "https://example.invalid/hammeraddons_2510.zip"
            }],
            "prerelease": false
        }]"#;
        let releases: Vec<GithubRelease> = serde_json::from_str(json).unwrap();
        assert_eq!(releases[0].tag_name, "v2.5.10");
        assert_eq!(releases[0].zip_asset().unwrap().name, "hammeraddons_2510.zip");
    }

    #[test]
    fn test_zip_asset_selection() {
        let mut rel = release("v2.5.10");
        rel.assets.insert(
            0,
            GithubAsset {
                name: "checksums.txt".to_string(),
                browser_download_url: "https://example.invalid/sums".to_string(),
            },
        );
        assert_eq!(rel.zip_asset().unwrap().name, "hammeraddons_v2.5.10.zip");
    }
}
