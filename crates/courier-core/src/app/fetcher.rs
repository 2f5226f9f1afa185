//! BlobFetcher - 参照先を scratch ディレクトリにダウンロード
//!
//! 保存先は毎回新しいパス（`<ulid>_<basename>`）で、create-new で開くため
//! 既存ファイルを上書きすることはありません。

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::domain::{AttemptId, BlobReference, CleanupWarning, FetchedResource, TransportError};
use crate::ports::{BlobStore, IdGenerator};

pub struct BlobFetcher {
    store: Arc<dyn BlobStore>,
    ids: Arc<dyn IdGenerator>,
    scratch_dir: PathBuf,
    timeout: Duration,
}

impl BlobFetcher {
    pub fn new(
        store: Arc<dyn BlobStore>,
        ids: Arc<dyn IdGenerator>,
        scratch_dir: PathBuf,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            ids,
            scratch_dir,
            timeout,
        }
    }

    pub async fn fetch(
        &self,
        reference: &BlobReference,
        attempt: AttemptId,
    ) -> Result<FetchedResource, TransportError> {
        let bytes = tokio::time::timeout(self.timeout, self.store.get(reference))
            .await
            .map_err(|_| TransportError::timeout(format!("fetch {reference}"), self.timeout))??;

        let id = self.ids.generate_resource_id();
        let path = self
            .scratch_dir
            .join(format!("{}_{}", id.as_ulid(), reference.base_name()));

        write_new(&path, &bytes)
            .await
            .map_err(|source| TransportError::Scratch {
                path: path.clone(),
                source,
            })?;

        debug!(%reference, path = %path.display(), bytes = bytes.len(), "blob fetched");
        Ok(FetchedResource::new(id, reference.clone(), path, attempt))
    }
}

async fn write_new(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await?;

    let written = async {
        file.write_all(bytes).await?;
        file.flush().await
    }
    .await;

    if written.is_err() {
        // 書きかけのファイルは所有者がいないので、ここで消す
        let _ = tokio::fs::remove_file(path).await;
    }
    written
}

/// Remove every fetched file. Files that are already gone are not reported.
pub async fn release_all(resources: &[FetchedResource]) -> Vec<CleanupWarning> {
    let mut warnings = Vec::new();
    for resource in resources {
        match tokio::fs::remove_file(resource.local_path()).await {
            Ok(()) => debug!(
                resource = %resource.id(),
                attempt = %resource.attempt(),
                path = %resource.local_path().display(),
                "scratch file removed"
            ),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(source) => warnings.push(CleanupWarning {
                path: resource.local_path().to_path_buf(),
                source,
            }),
        }
    }
    warnings
}
