//! Engine and dependency downloads.

use domain::catalog::{CatalogEntry, DownloadSource, MIN_ARTIFACT_BYTES};
use domain::ports::network::HttpClient;
use domain::PipelineError;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use url::Url;

pub const GITHUB_API: &str = "https://api.github.com";
pub const MODRINTH_API: &str = "https://api.modrinth.com/v2";
pub const SPIGET_API: &str = "https://api.spiget.org/v2";

/// File name the engine is staged under.
pub const ENGINE_FILE_NAME: &str = "local-engine.jar";

pub struct ArtifactFetcher {
    http: Arc<dyn HttpClient>,
    engine_repository: String,
    game_versions: Vec<String>,
}

impl ArtifactFetcher {
    pub fn new(
        http: Arc<dyn HttpClient>,
        engine_repository: impl Into<String>,
        game_versions: Vec<String>,
    ) -> Self {
        Self {
            http,
            engine_repository: engine_repository.into(),
            game_versions,
        }
    }

    /// Places the engine jar at `dest`.
    ///
    /// A local override is copied verbatim without touching the network;
    /// otherwise the first jar asset of the latest release is downloaded.
    pub async fn fetch_engine(
        &self,
        dest: &Path,
        local_override: Option<&Path>,
    ) -> Result<(), PipelineError> {
        let failed = |reason: String| PipelineError::FetchFailed {
            artifact: "engine".to_string(),
            reason,
        };

        if let Some(local) = local_override {
            if !local.is_file() {
                return Err(failed(format!("local engine jar {:?} does not exist", local)));
            }
            if !has_jar_extension(local) {
                return Err(failed(format!("{:?} is not a .jar file", local)));
            }
            copy_file(local, dest)
                .await
                .map_err(|e| failed(format!("copying {:?}: {}", local, e)))?;
            tracing::info!(source = ?local, "Using local engine jar");
            return Ok(());
        }

        let release_url = format!(
            "{}/repos/{}/releases/latest",
            GITHUB_API, self.engine_repository
        );
        let release = self
            .http
            .get_json(&release_url)
            .await
            .map_err(|e| failed(e.to_string()))?;
        let asset_url = release_jar_url(&release)
            .ok_or_else(|| failed("latest release has no jar asset".to_string()))?;

        let bytes = self
            .http
            .get_bytes(&asset_url)
            .await
            .map_err(|e| failed(e.to_string()))?;
        if bytes.is_empty() {
            return Err(failed(format!("{} returned an empty body", asset_url)));
        }
        write_file(dest, &bytes)
            .await
            .map_err(|e| failed(e.to_string()))?;

        tracing::info!(url = %asset_url, bytes = bytes.len(), "Downloaded engine release");
        Ok(())
    }

    /// Downloads one catalog entry into `dir`, trying its sources in order.
    pub async fn fetch_dependency(
        &self,
        entry: &CatalogEntry,
        dir: &Path,
    ) -> Result<PathBuf, PipelineError> {
        let dest = dir.join(entry.file_name());
        let mut last_error = String::from("no download sources");

        for source in &entry.sources {
            let url = match self.source_url(source, entry).await {
                Ok(Some(url)) => url,
                Ok(None) => {
                    last_error = format!("{}: no release for {:?}", source.label(), self.game_versions);
                    continue;
                }
                Err(reason) => {
                    tracing::warn!(dependency = %entry.key, source = source.label(), %reason, "Source lookup failed");
                    last_error = format!("{}: {}", source.label(), reason);
                    continue;
                }
            };

            match self.http.get_bytes(&url).await {
                Ok(bytes) if (bytes.len() as u64) < MIN_ARTIFACT_BYTES => {
                    tracing::warn!(
                        dependency = %entry.key,
                        source = source.label(),
                        bytes = bytes.len(),
                        "Downloaded file too small, trying next source"
                    );
                    last_error = format!("{}: file too small ({} bytes)", source.label(), bytes.len());
                }
                Ok(bytes) => {
                    write_file(&dest, &bytes).await.map_err(|e| PipelineError::FetchFailed {
                        artifact: entry.key.clone(),
                        reason: e.to_string(),
                    })?;
                    tracing::info!(dependency = %entry.key, source = source.label(), "Downloaded dependency");
                    return Ok(dest);
                }
                Err(e) => {
                    tracing::warn!(dependency = %entry.key, source = source.label(), error = %e, "Download failed");
                    last_error = format!("{}: {}", source.label(), e);
                }
            }
        }

        Err(PipelineError::FetchFailed {
            artifact: entry.key.clone(),
            reason: last_error,
        })
    }

    async fn source_url(
        &self,
        source: &DownloadSource,
        entry: &CatalogEntry,
    ) -> Result<Option<String>, String> {
        match source {
            DownloadSource::Modrinth { project } => {
                let url = format!("{}/project/{}/version", MODRINTH_API, project);
                let versions = self.http.get_json(&url).await.map_err(|e| e.to_string())?;
                Ok(modrinth_file_url(
                    &versions,
                    &self.game_versions,
                    entry.version.as_deref(),
                ))
            }
            DownloadSource::Spiget { resource_id } => Ok(Some(format!(
                "{}/resources/{}/download",
                SPIGET_API, resource_id
            ))),
            DownloadSource::Direct { url } => Ok(Some(url.clone())),
        }
    }
}

fn has_jar_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("jar"))
        .unwrap_or(false)
}

async fn ensure_parent(dest: &Path) -> std::io::Result<()> {
    match dest.parent() {
        Some(parent) => tokio::fs::create_dir_all(parent).await,
        None => Ok(()),
    }
}

async fn write_file(dest: &Path, bytes: &[u8]) -> std::io::Result<()> {
    ensure_parent(dest).await?;
    tokio::fs::write(dest, bytes).await
}

async fn copy_file(src: &Path, dest: &Path) -> std::io::Result<()> {
    ensure_parent(dest).await?;
    tokio::fs::copy(src, dest).await.map(|_| ())
}

fn valid_http_url(raw: &str) -> Option<String> {
    let url = Url::parse(raw).ok()?;
    matches!(url.scheme(), "http" | "https").then(|| url.to_string())
}

/// First `.jar` asset of a GitHub release that is not a sources/javadoc jar.
pub fn release_jar_url(release: &Value) -> Option<String> {
    release
        .get("assets")?
        .as_array()?
        .iter()
        .find(|asset| {
            asset
                .get("name")
                .and_then(Value::as_str)
                .map(|name| {
                    name.ends_with(".jar") && !name.contains("sources") && !name.contains("javadoc")
                })
                .unwrap_or(false)
        })
        .and_then(|asset| asset.get("browser_download_url"))
        .and_then(Value::as_str)
        .and_then(valid_http_url)
}

/// URL of the first file of the first Modrinth version that supports one of
/// `game_versions` (and matches `pinned`, when set).
pub fn modrinth_file_url(
    versions: &Value,
    game_versions: &[String],
    pinned: Option<&str>,
) -> Option<String> {
    versions
        .as_array()?
        .iter()
        .filter(|version| match pinned {
            Some(pin) => version.get("version_number").and_then(Value::as_str) == Some(pin),
            None => true,
        })
        .find(|version| {
            version
                .get("game_versions")
                .and_then(Value::as_array)
                .map(|supported| {
                    supported
                        .iter()
                        .filter_map(Value::as_str)
                        .any(|v| game_versions.iter().any(|wanted| wanted == v))
                })
                .unwrap_or(false)
        })
        .and_then(|version| version.get("files")?.as_array()?.first()?.get("url")?.as_str())
        .and_then(valid_http_url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use domain::ports::network::NetworkError;
    use serde_json::json;

    struct Offline;

    #[async_trait]
    impl HttpClient for Offline {
        async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, NetworkError> {
            Err(NetworkError::Request {
                url: url.to_string(),
                reason: "offline".to_string(),
            })
        }

        async fn get_json(&self, url: &str) -> Result<Value, NetworkError> {
            Err(NetworkError::Request {
                url: url.to_string(),
                reason: "offline".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn local_engine_is_copied_into_a_fresh_staging_dir() {
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join("engine.jar");
        std::fs::write(&local, b"engine bytes").unwrap();
        // plugins/ does not exist yet when the engine is fetched.
        let dest = dir.path().join("staging").join("plugins").join(ENGINE_FILE_NAME);

        let fetcher = ArtifactFetcher::new(Arc::new(Offline), "owner/engine", Vec::new());
        fetcher.fetch_engine(&dest, Some(&local)).await.unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), b"engine bytes");
    }

    #[tokio::test]
    async fn local_engine_must_be_a_jar() {
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join("engine.zip");
        std::fs::write(&local, b"zip").unwrap();

        let fetcher = ArtifactFetcher::new(Arc::new(Offline), "owner/engine", Vec::new());
        let err = fetcher
            .fetch_engine(&dir.path().join("out.jar"), Some(&local))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not a .jar"), "{}", err);
    }

    #[test]
    fn picks_primary_release_asset() {
        let release = json!({
            "assets": [
                {"name": "engine-sources.jar", "browser_download_url": "https://x/s.jar"},
                {"name": "notes.txt", "browser_download_url": "https://x/n.txt"},
                {"name": "engine.jar", "browser_download_url": "https://x/engine.jar"}
            ]
        });
        assert_eq!(release_jar_url(&release).as_deref(), Some("https://x/engine.jar"));
    }

    #[test]
    fn modrinth_matches_game_version() {
        let versions = json!([
            {"version_number": "5.3", "game_versions": ["1.20.4"], "files": [{"url": "https://m/old.jar"}]},
            {"version_number": "5.4", "game_versions": ["1.21.1"], "files": [{"url": "https://m/new.jar"}]}
        ]);
        let wanted = vec!["1.21".to_string(), "1.21.1".to_string()];

        assert_eq!(
            modrinth_file_url(&versions, &wanted, None).as_deref(),
            Some("https://m/new.jar")
        );
        assert_eq!(modrinth_file_url(&versions, &wanted, Some("5.3")), None);
    }
}
