use reqwest::Method;
use serde::de::DeserializeOwned;
use std::path::PathBuf;
use url::Url;

use super::client::{FetchError, RemoteClient};
use super::wire::SnapshotPayload;

/// Largest snapshot file accepted from disk.
const MAX_SNAPSHOT_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Where pre-generated snapshot collections live.
///
/// The web host publishes them under `/data/`; a local directory with the
/// same files is accepted for offline use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotSource {
    Http(Url),
    Directory(PathBuf),
}

impl SnapshotSource {
    /// Interpret a configured location: `http(s)://` URLs are fetched,
    /// anything else is treated as a directory.
    pub fn parse(location: &str) -> Result<Self, FetchError> {
        let location = location.trim();
        if location.starts_with("http://") || location.starts_with("https://") {
            let url =
                Url::parse(location).map_err(|e| FetchError::InvalidUrl(format!("{location}: {e}")))?;
            Ok(SnapshotSource::Http(url))
        } else {
            Ok(SnapshotSource::Directory(PathBuf::from(location)))
        }
    }

    /// Human-readable location of `file`, for diagnostics.
    pub fn describe(&self, file: &str) -> String {
        match self {
            SnapshotSource::Http(base) => {
                format!("{}/{}", base.as_str().trim_end_matches('/'), file)
            }
            SnapshotSource::Directory(dir) => dir.join(file).display().to_string(),
        }
    }

    /// Load and parse the full collection stored in `file`.
    pub(crate) async fn load<T: DeserializeOwned>(
        &self,
        client: &RemoteClient,
        file: &str,
    ) -> Result<Vec<T>, FetchError> {
        let bytes = match self {
            SnapshotSource::Http(base) => {
                let mut url = base.clone();
                url.path_segments_mut()
                    .map_err(|_| FetchError::InvalidUrl(base.to_string()))?
                    .pop_if_empty()
                    .push(file);
                client.send(Method::GET, url, None::<&()>).await?
            }
            SnapshotSource::Directory(dir) => read_snapshot_file(dir.join(file)).await?,
        };

        let payload: SnapshotPayload<T> =
            serde_json::from_slice(&bytes).map_err(|e| FetchError::parse(self.describe(file), e))?;
        Ok(payload.into_items())
    }
}

async fn read_snapshot_file(path: PathBuf) -> Result<Vec<u8>, FetchError> {
    let metadata = tokio::fs::metadata(&path)
        .await
        .map_err(|source| FetchError::Snapshot {
            path: path.clone(),
            source,
        })?;
    if metadata.len() > MAX_SNAPSHOT_FILE_SIZE {
        return Err(FetchError::ResponseTooLarge(MAX_SNAPSHOT_FILE_SIZE as usize));
    }

    tokio::fs::read(&path)
        .await
        .map_err(|source| FetchError::Snapshot { path, source })
}
