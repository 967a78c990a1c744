//! Static catalog of plugin libraries a project may declare.

use crate::error::PipelineError;
use std::collections::BTreeMap;

/// Downloads smaller than this are treated as error pages, not artifacts.
pub const MIN_ARTIFACT_BYTES: u64 = 100_000;

/// Where a library can be downloaded from. Sources are tried in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadSource {
    /// Modrinth project slug; the first version matching the configured
    /// game versions is used.
    Modrinth { project: String },
    /// Spiget (SpigotMC) resource id.
    Spiget { resource_id: u32 },
    /// A fixed URL, usually a GitHub `releases/latest/download` link.
    Direct { url: String },
}

impl DownloadSource {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Modrinth { .. } => "modrinth",
            Self::Spiget { .. } => "spiget",
            Self::Direct { .. } => "direct",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub key: String,
    pub sources: Vec<DownloadSource>,
    /// Pinned version, when the entry should not track the latest release.
    pub version: Option<String>,
}

impl CatalogEntry {
    /// File name used when staging the artifact.
    pub fn file_name(&self) -> String {
        format!("{}.jar", self.key)
    }
}

/// Read-only lookup from dependency key to download sources.
#[derive(Debug, Clone)]
pub struct DependencyCatalog {
    entries: BTreeMap<String, CatalogEntry>,
}

impl DependencyCatalog {
    pub fn new(entries: impl IntoIterator<Item = CatalogEntry>) -> Self {
        Self {
            entries: entries.into_iter().map(|e| (e.key.clone(), e)).collect(),
        }
    }

    /// The libraries Shipyard knows how to fetch out of the box.
    pub fn builtin() -> Self {
        Self::new([
            CatalogEntry {
                key: "PROTOCOLLIB".into(),
                sources: vec![
                    DownloadSource::Modrinth {
                        project: "protocolib".into(),
                    },
                    DownloadSource::Spiget { resource_id: 86311 },
                    DownloadSource::Direct {
                        url: "https://github.com/dmulloy2/ProtocolLib/releases/latest/download/ProtocolLib.jar".into(),
                    },
                ],
                version: None,
            },
            CatalogEntry {
                key: "LIBSDISGUISES".into(),
                sources: vec![
                    DownloadSource::Spiget { resource_id: 32453 },
                    DownloadSource::Direct {
                        url: "https://github.com/libraryaddict/LibsDisguises/releases/latest/download/LibsDisguises.jar".into(),
                    },
                ],
                version: None,
            },
            CatalogEntry {
                key: "DECENTHOLOGRAMS".into(),
                sources: vec![
                    DownloadSource::Spiget { resource_id: 96927 },
                    DownloadSource::Direct {
                        url: "https://github.com/Andre601/DecentHolograms/releases/latest/download/DecentHolograms.jar".into(),
                    },
                ],
                version: None,
            },
        ])
    }

    pub fn resolve(&self, key: &str) -> Result<&CatalogEntry, PipelineError> {
        self.entries
            .get(key)
            .ok_or_else(|| PipelineError::UnknownDependency(key.to_string()))
    }

    /// Resolves every key, failing on the first unknown one.
    pub fn resolve_all<'a>(
        &'a self,
        keys: &[String],
    ) -> Result<Vec<&'a CatalogEntry>, PipelineError> {
        keys.iter().map(|k| self.resolve(k)).collect()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl Default for DependencyCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
