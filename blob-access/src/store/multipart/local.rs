use std::path::{Path, PathBuf};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use crate::store::multipart::store::{MultipartStorage, StorageResult};
use crate::store::types::CompletedPart;

// Content tag for a staged part: lower-case hex SHA-256.
fn compute_etag(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    result.iter().map(|byte| format!("{:02x}", byte)).collect()
}

fn staging_path(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_os_string();
    name.push(".assembling");
    PathBuf::from(name)
}

fn path_component(name: &str) -> StorageResult<&str> {
    if name.is_empty() || name == "." || name == ".." || name.contains('/') || name.contains('\\') {
        return Err(format!("invalid path component: {:?}", name).into());
    }
    Ok(name)
}

/// A `MultipartStorage` that assembles uploads in a local directory.
///
/// Parts are staged at `<root>/<account>/<blob>.parts/<upload>/<part number>` and
/// assembled into `<root>/<account>/<blob>`.
#[derive(Clone, Debug)]
pub struct LocalMultipartStorage {
    directory: PathBuf,
}

impl LocalMultipartStorage {
    pub fn new(directory: PathBuf) -> Self {
        Self { directory }
    }

    fn upload_dir(&self, account_id: &str, blob_id: &str, upload_id: &str) -> StorageResult<PathBuf> {
        Ok(self
            .directory
            .join(path_component(account_id)?)
            .join(format!("{}.parts", path_component(blob_id)?))
            .join(path_component(upload_id)?))
    }

    fn object_path(&self, account_id: &str, blob_id: &str) -> StorageResult<PathBuf> {
        Ok(self
            .directory
            .join(path_component(account_id)?)
            .join(path_component(blob_id)?))
    }

    /// Stages one part and returns its eTag.
    pub async fn put_part(
        &self,
        account_id: &str,
        blob_id: &str,
        upload_id: &str,
        part_number: i32,
        data: &[u8],
    ) -> StorageResult<String> {
        if part_number < 1 {
            return Err(format!("part number must be positive, got {}", part_number).into());
        }
        let dir = self.upload_dir(account_id, blob_id, upload_id)?;
        fs::create_dir_all(&dir).await?;
        fs::write(dir.join(part_number.to_string()), data).await?;
        Ok(compute_etag(data))
    }

    pub async fn get_object(&self, account_id: &str, blob_id: &str) -> StorageResult<Vec<u8>> {
        Ok(fs::read(self.object_path(account_id, blob_id)?).await?)
    }

    async fn assemble(&self, upload_dir: &Path, target: &Path, parts: &[CompletedPart]) -> StorageResult<()> {
        let staging = staging_path(target);
        let mut out = fs::File::create(&staging).await?;
        for part in parts {
            if part.part_number < 1 {
                return Err(format!("part number must be positive, got {}", part.part_number).into());
            }
            let data = fs::read(upload_dir.join(part.part_number.to_string()))
                .await
                .map_err(|e| format!("part {} not found: {}", part.part_number, e))?;
            if compute_etag(&data) != part.e_tag.trim_matches('"') {
                return Err(format!("eTag mismatch for part {}", part.part_number).into());
            }
            out.write_all(&data).await?;
        }
        out.flush().await?;
        drop(out);
        fs::rename(&staging, target).await?;
        Ok(())
    }
}

#[async_trait]
impl MultipartStorage for LocalMultipartStorage {
    async fn complete(
        &self,
        account_id: &str,
        blob_id: &str,
        upload_id: &str,
        parts: &[CompletedPart],
    ) -> StorageResult<()> {
        let upload_dir = self.upload_dir(account_id, blob_id, upload_id)?;
        let target = self.object_path(account_id, blob_id)?;

        if let Err(e) = self.assemble(&upload_dir, &target, parts).await {
            let _ = fs::remove_file(staging_path(&target)).await;
            return Err(e);
        }
        fs::remove_dir_all(&upload_dir).await?;
        tracing::debug!("Assembled {} parts into {}", parts.len(), target.display());
        Ok(())
    }
}
