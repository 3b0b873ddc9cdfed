//! Gateway operations
//!
//! Each operation is a single request/response with no state carried between calls.
//! [`Gateway`] is the async entry point used by the transport: it snapshots the shared
//! configuration and runs the blocking operation on the blocking thread pool.

pub mod cache;
pub mod delete;
pub mod fetch;
pub mod requests;
pub mod results;
pub mod save;

use log::{debug, info};
use std::io;
use std::sync::Arc;

use crate::codec::CodecCapability;
use crate::config::{ConfigUpdate, EffectiveConfig, GatewayConfig, SharedGatewayConfig};
use crate::error::{GatewayError, GatewayResult};

use requests::{
    BatchSaveRequest, CacheAssetRequest, DeleteBatchRequest, DeleteRequest, SaveRequest,
    ThumbnailRequest,
};
use results::{
    AssetMetadata, BatchResult, CacheAssetResult, DeleteResult, FetchedAsset, FileListing,
    SaveResult, StatusReport, ThumbnailResult,
};

/// Facts fixed at startup that operations need alongside the configuration
#[derive(Debug, Clone)]
pub struct GatewayContext {
    /// `http://<bind>:<port>/file/`
    pub file_url_prefix: String,
    pub port: u16,
    pub codec: CodecCapability,
}

/// Shared handle over the configuration and startup context
#[derive(Debug, Clone)]
pub struct Gateway {
    config: SharedGatewayConfig,
    context: Arc<GatewayContext>,
}

impl Gateway {
    pub fn new(config: SharedGatewayConfig, context: GatewayContext) -> Self {
        Self {
            config,
            context: Arc::new(context),
        }
    }

    /// Run `work` against a consistent configuration snapshot on the blocking pool
    async fn run<T, F>(&self, work: F) -> GatewayResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&GatewayConfig, &GatewayContext) -> GatewayResult<T> + Send + 'static,
    {
        let config = self.config.read().await.clone();
        let context = Arc::clone(&self.context);

        tokio::task::spawn_blocking(move || work(&config, &context))
            .await
            .map_err(|e| GatewayError::from(io::Error::other(e.to_string())))?
    }

    pub async fn save(&self, request: SaveRequest) -> GatewayResult<SaveResult> {
        self.run(move |config, _| save::save(request, config)).await
    }

    pub async fn batch_save(&self, request: BatchSaveRequest) -> GatewayResult<BatchResult> {
        self.run(move |config, _| save::batch_save(request, config))
            .await
    }

    pub async fn save_cache_asset(
        &self,
        request: CacheAssetRequest,
    ) -> GatewayResult<CacheAssetResult> {
        self.run(move |config, context| cache::save_cache_asset(request, config, context))
            .await
    }

    pub async fn save_thumbnail(&self, request: ThumbnailRequest) -> GatewayResult<ThumbnailResult> {
        self.run(move |config, context| cache::save_thumbnail(request, config, context))
            .await
    }

    pub async fn delete_file(&self, request: DeleteRequest) -> GatewayResult<DeleteResult> {
        self.run(move |config, context| delete::delete_file(request, config, context))
            .await
    }

    pub async fn delete_batch(&self, request: DeleteBatchRequest) -> GatewayResult<BatchResult> {
        self.run(move |config, context| delete::delete_batch(request, config, context))
            .await
    }

    pub async fn fetch_asset(&self, logical_path: String) -> GatewayResult<FetchedAsset> {
        self.run(move |config, _| fetch::fetch_asset(&logical_path, config))
            .await
    }

    pub async fn asset_metadata(&self, logical_path: String) -> GatewayResult<AssetMetadata> {
        self.run(move |config, _| fetch::asset_metadata(&logical_path, config))
            .await
    }

    pub async fn list_files(&self) -> GatewayResult<FileListing> {
        self.run(|config, _| Ok(fetch::list_files(config))).await
    }

    pub async fn get_config(&self) -> EffectiveConfig {
        self.config.read().await.effective()
    }

    /// Merge `update` under the write lock and return the resulting effective config
    pub async fn update_config(&self, update: ConfigUpdate) -> EffectiveConfig {
        let mut config = self.config.write().await;
        let changed = config.apply(&update);

        if changed.is_empty() {
            debug!("Config update carried no recognised keys");
        } else {
            info!("Configuration updated: {}", changed.join(", "));
        }

        config.effective()
    }

    pub async fn status(&self) -> StatusReport {
        let effective = self.config.read().await.effective();
        StatusReport {
            status: "running",
            version: env!("CARGO_PKG_VERSION"),
            primary_root: effective.primary_root,
            image_root: effective.image_root,
            video_root: effective.video_root,
            port: self.context.port,
            codec_available: self.context.codec.is_available(),
            transcode_enabled: effective.transcode_enabled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::sync::RwLock;

    fn gateway(root: &std::path::Path) -> Gateway {
        let config = Arc::new(RwLock::new(GatewayConfig::with_primary_root(root)));
        Gateway::new(
            config,
            GatewayContext {
                file_url_prefix: "http://127.0.0.1:9527/file/".into(),
                port: 9527,
                codec: CodecCapability::detect(),
            },
        )
    }

    #[tokio::test]
    async fn config_updates_are_visible_to_later_calls() {
        let tmp = TempDir::new().unwrap();
        let gateway = gateway(tmp.path());

        let effective = gateway
            .update_config(ConfigUpdate {
                allow_overwrite: Some(true),
                transcode_quality: Some(250.0),
                image_root: Some(String::new()),
                ..Default::default()
            })
            .await;

        assert!(effective.allow_overwrite);
        assert_eq!(effective.transcode_quality, 100);
        assert_eq!(effective.image_root, effective.primary_root);
        assert_eq!(gateway.get_config().await, effective);
    }

    #[tokio::test]
    async fn operations_run_against_the_current_snapshot() {
        let tmp = TempDir::new().unwrap();
        let gateway = gateway(&tmp.path().join("first"));

        gateway
            .update_config(ConfigUpdate {
                primary_root: Some(tmp.path().join("second").display().to_string()),
                ..Default::default()
            })
            .await;

        let saved = gateway
            .save(SaveRequest {
                filename: Some("a.txt".into()),
                inline_content: Some("aGk=".into()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(saved.size, 2);
        assert!(tmp.path().join("second/a.txt").exists());
        assert!(!tmp.path().join("first").exists());
    }

    #[tokio::test]
    async fn status_reports_roots_and_codec() {
        let tmp = TempDir::new().unwrap();
        let gateway = gateway(tmp.path());

        let status = gateway.status().await;
        assert_eq!(status.status, "running");
        assert_eq!(status.port, 9527);
        assert_eq!(status.primary_root, status.video_root);
        assert!(status.codec_available);
    }
}
