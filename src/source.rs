//! Catalog data sources
//!
//! The catalog comes either from the realtime database or from a JSON
//! export of it on disk. Both produce the same raw tree.

use std::fmt;
use std::path::PathBuf;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::api::{FirebaseClient, FirebaseError};
use crate::catalog::Catalog;

/// Data source error types
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("No catalog source configured (set database_url or snapshot, or pass --source)")]
    NotConfigured,

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Firebase(#[from] FirebaseError),
}

/// Where the catalog tree comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    /// Realtime database node
    Remote { url: String, path: String },
    /// JSON export; `node` is looked up inside it when present
    File { file: PathBuf, node: String },
}

impl CatalogSource {
    /// URLs select the database, anything else is a file path
    pub fn parse(location: &str, node: &str) -> Self {
        if location.starts_with("http://") || location.starts_with("https://") {
            CatalogSource::Remote {
                url: location.to_string(),
                path: node.to_string(),
            }
        } else {
            CatalogSource::File {
                file: PathBuf::from(location),
                node: node.to_string(),
            }
        }
    }

    /// Whether the source can stream live updates
    pub fn is_live(&self) -> bool {
        matches!(self, CatalogSource::Remote { .. })
    }

    /// Fetch the raw catalog tree
    pub async fn load(&self) -> Result<Value, SourceError> {
        match self {
            CatalogSource::Remote { url, path } => {
                let tree = FirebaseClient::new(url.as_str()).fetch(path).await?;
                info!(source = %self, "catalog fetched");
                Ok(tree)
            }
            CatalogSource::File { file, node } => {
                let text = tokio::fs::read_to_string(file)
                    .await
                    .map_err(|source| SourceError::Io {
                        path: file.clone(),
                        source,
                    })?;
                let root: Value =
                    serde_json::from_str(&text).map_err(|source| SourceError::Parse {
                        path: file.clone(),
                        source,
                    })?;
                info!(source = %self, "catalog snapshot loaded");
                Ok(select_node(root, node))
            }
        }
    }

    /// Fetch and normalize the catalog
    pub async fn catalog(&self) -> Result<Catalog, SourceError> {
        Ok(Catalog::from_tree(&self.load().await?))
    }
}

impl fmt::Display for CatalogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogSource::Remote { url, path } => {
                write!(f, "{}/{}", url.trim_end_matches('/'), path.trim_matches('/'))
            }
            CatalogSource::File { file, .. } => write!(f, "{}", file.display()),
        }
    }
}

/// Descend into `node` when the export contains it; an export of the node
/// itself is used as-is.
fn select_node(root: Value, node: &str) -> Value {
    let mut current = &root;
    for segment in node.split('/').filter(|s| !s.is_empty()) {
        match current.get(segment) {
            Some(child) => current = child,
            None => {
                debug!(node, "snapshot has no such node, using its root");
                return root;
            }
        }
    }
    current.clone()
}
