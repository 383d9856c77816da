use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart as S3CompletedPart};
use aws_sdk_s3::Client as S3Client;
use crate::store::multipart::store::{object_key, MultipartStorage, StorageResult};
use crate::store::types::CompletedPart;

/// Finalizes multipart uploads with the S3 `CompleteMultipartUpload` call.
#[derive(Clone, Debug)]
pub struct S3MultipartStorage {
    bucket: String,
    client: S3Client,
}

impl S3MultipartStorage {
    pub fn new(client: S3Client, bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            client,
        }
    }

    /// Builds a client from the ambient AWS configuration (environment, profile, or
    /// instance role).
    pub async fn from_env(bucket: impl Into<String>) -> Self {
        let shared_config = aws_config::load_defaults(BehaviorVersion::latest()).await;
        Self::new(S3Client::new(&shared_config), bucket)
    }
}

fn to_s3_parts(parts: &[CompletedPart]) -> Vec<S3CompletedPart> {
    parts
        .iter()
        .map(|p| {
            S3CompletedPart::builder()
                .part_number(p.part_number)
                .e_tag(p.e_tag.clone())
                .build()
        })
        .collect()
}

#[async_trait]
impl MultipartStorage for S3MultipartStorage {
    async fn complete(
        &self,
        account_id: &str,
        blob_id: &str,
        upload_id: &str,
        parts: &[CompletedPart],
    ) -> StorageResult<()> {
        let multipart_upload = CompletedMultipartUpload::builder()
            .set_parts(Some(to_s3_parts(parts)))
            .build();

        self.client
            .complete_multipart_upload()
            .bucket(&self.bucket)
            .key(object_key(account_id, blob_id))
            .upload_id(upload_id)
            .multipart_upload(multipart_upload)
            .send()
            .await
            .map_err(|e| format!("failed to complete multipart upload: {}", e))?;
        Ok(())
    }
}
