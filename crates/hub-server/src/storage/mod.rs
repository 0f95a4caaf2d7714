//! S3-compatible blob storage
//!
//! Community icons are the only blobs the hub stores itself. Keys are laid
//! out as `communities/community_{id}/{filename}`.

use anyhow::{Context, Result};
use aws_credential_types::Credentials;
use aws_sdk_s3::{config::Region, primitives::ByteStream, Client};
use tracing::{debug, info, instrument};
use uuid::Uuid;

pub mod config;

#[derive(Clone)]
pub struct Storage {
    client: Client,
    bucket: String,
}

/// An object read back from the bucket
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub data: Vec<u8>,
    pub content_type: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UploadResult {
    pub key: String,
    pub size: i64,
}

impl Storage {
    pub async fn new(config: config::StorageConfig) -> Result<Self> {
        debug!("Initializing storage with config: {:?}", config);

        let mut s3_config_builder = match config.static_credentials() {
            Some((access_key, secret_key)) => aws_sdk_s3::Config::builder()
                .behavior_version(aws_sdk_s3::config::BehaviorVersion::latest())
                .credentials_provider(Credentials::new(
                    access_key,
                    secret_key,
                    None,
                    None,
                    "hub-storage",
                )),
            None => {
                let shared = aws_config::defaults(aws_config::BehaviorVersion::latest())
                    .load()
                    .await;
                aws_sdk_s3::config::Builder::from(&shared)
            },
        };

        s3_config_builder = s3_config_builder
            .region(Region::new(config.region.clone()))
            .force_path_style(config.path_style);

        if let Some(endpoint) = &config.endpoint {
            s3_config_builder = s3_config_builder.endpoint_url(endpoint);
        }

        let client = Client::from_conf(s3_config_builder.build());

        info!("Storage client initialized for bucket: {}", config.bucket);

        Ok(Self {
            client,
            bucket: config.bucket,
        })
    }

    #[instrument(skip(self, data))]
    pub async fn upload(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: Option<String>,
    ) -> Result<UploadResult> {
        let size = data.len() as i64;

        debug!("Uploading {} bytes to s3://{}/{}", size, self.bucket, key);

        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(data));

        if let Some(ct) = content_type {
            request = request.content_type(ct);
        }

        request.send().await.context("Failed to upload to S3")?;

        info!("Successfully uploaded to s3://{}/{}", self.bucket, key);

        Ok(UploadResult {
            key: key.to_string(),
            size,
        })
    }

    #[instrument(skip(self))]
    pub async fn download(&self, key: &str) -> Result<StoredObject> {
        debug!("Downloading from s3://{}/{}", self.bucket, key);

        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .with_context(|| format!("Failed to download from S3: {}", key))?;

        let content_type = response.content_type().map(str::to_string);

        let data = response
            .body
            .collect()
            .await
            .context("Failed to read S3 response body")?
            .into_bytes()
            .to_vec();

        debug!("Downloaded {} bytes from s3://{}/{}", data.len(), self.bucket, key);

        Ok(StoredObject { data, content_type })
    }
}

/// Object key of a community icon.
pub fn community_icon_key(community_id: Uuid, filename: &str) -> String {
    format!("communities/community_{}/{}", community_id, filename)
}
