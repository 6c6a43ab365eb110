use std::path::{Path, PathBuf};
use std::fs;
use std::io;
use std::sync::Arc;
use std::env;
use tokio::sync::Mutex;
use reqwest;
use sha2::{Sha256, Digest};
use dirs;
use log;

use crate::models::{ModelInfo, ModelMetadata};

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Model not found: {0}")]
    NotFound(String),
    #[error("Download error: {0}")]
    DownloadError(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Invalid metadata: {0}")]
    MetadataError(#[from] serde_json::Error),
    #[error("Model verification failed: {0}")]
    VerificationFailed(String),
    #[error("Hash mismatch: expected {expected}, got {actual} for {file_type} file")]
    HashMismatch {
        file_type: String,
        expected: String,
        actual: String,
    },
}

/// Locates, verifies and fetches model bundles.
///
/// A bundle is a directory `<models_dir>/<name>/` holding `model.onnx` and
/// the `metadata.json` that carries its feature ordering and labels.
#[derive(Clone)]
pub struct ModelManager {
    models_dir: PathBuf,
    download_lock: Arc<Mutex<()>>,
}

impl ModelManager {
    pub const MODEL_FILE: &'static str = "model.onnx";
    pub const METADATA_FILE: &'static str = "metadata.json";

    /// Creates a new ModelManager with the default models directory
    pub fn new_default() -> io::Result<Self> {
        Self::new(Self::get_default_models_dir())
    }

    /// Returns the default models directory path
    pub fn get_default_models_dir() -> PathBuf {
        if let Ok(path) = env::var("SYMPTOMATIC_CACHE") {
            return PathBuf::from(path).join("models");
        }

        if let Some(cache_dir) = dirs::cache_dir() {
            return cache_dir.join("symptomatic").join("models");
        }

        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(".cache").join("symptomatic").join("models");
        }

        env::temp_dir().join("symptomatic").join("models")
    }

    pub fn new<P: AsRef<Path>>(models_dir: P) -> io::Result<Self> {
        let models_dir = models_dir.as_ref().to_path_buf();
        fs::create_dir_all(&models_dir)?;
        Ok(Self {
            models_dir,
            download_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    pub fn get_model_dir(&self, name: &str) -> PathBuf {
        self.models_dir.join(name)
    }

    pub fn get_model_path(&self, name: &str) -> PathBuf {
        self.get_model_dir(name).join(Self::MODEL_FILE)
    }

    pub fn get_metadata_path(&self, name: &str) -> PathBuf {
        self.get_model_dir(name).join(Self::METADATA_FILE)
    }

    pub fn is_model_downloaded(&self, name: &str) -> bool {
        let model_path = self.get_model_path(name);
        let metadata_path = self.get_metadata_path(name);
        log::debug!("Model path: {:?} (exists: {})", model_path, model_path.exists());
        log::debug!("Metadata path: {:?} (exists: {})", metadata_path, metadata_path.exists());
        model_path.exists() && metadata_path.exists()
    }

    /// Parses a `metadata.json` file.
    pub fn read_metadata(path: &Path) -> Result<ModelMetadata, ModelError> {
        if !path.exists() {
            return Err(ModelError::NotFound(path.display().to_string()));
        }
        let bytes = fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub fn load_metadata(&self, name: &str) -> Result<ModelMetadata, ModelError> {
        Self::read_metadata(&self.get_metadata_path(name))
    }

    fn sha256_hex(bytes: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        format!("{:x}", hasher.finalize())
    }

    fn verify_file(path: &Path, expected_hash: &str) -> Result<bool, ModelError> {
        let bytes = fs::read(path)?;
        let hash = Self::sha256_hex(&bytes);
        log::debug!("Verifying {:?}: {} bytes, hash {}", path, bytes.len(), hash);
        Ok(hash.eq_ignore_ascii_case(expected_hash))
    }

    /// Checks `model.onnx` against the hash recorded in `metadata.json`.
    ///
    /// Returns `Ok(false)` when either file is missing or the metadata does
    /// not record a hash.
    pub fn verify_model(&self, name: &str) -> Result<bool, ModelError> {
        Self::verify_bundle_dir(&self.get_model_dir(name))
    }

    /// Same check as [`verify_model`](Self::verify_model) for a bundle
    /// directory outside the models directory.
    pub fn verify_bundle_dir(dir: &Path) -> Result<bool, ModelError> {
        let model_path = dir.join(Self::MODEL_FILE);
        let metadata_path = dir.join(Self::METADATA_FILE);
        if !model_path.exists() || !metadata_path.exists() {
            log::info!("No complete bundle in {:?}", dir);
            return Ok(false);
        }

        let metadata = Self::read_metadata(&metadata_path)?;
        let Some(expected) = metadata.model_sha256.as_deref() else {
            log::warn!("Metadata in {:?} records no model hash; cannot verify", dir);
            return Ok(false);
        };

        let ok = Self::verify_file(&model_path, expected)?;
        log::info!("Bundle {:?} hash verification: {}", dir, ok);
        Ok(ok)
    }

    /// Downloads a bundle, verifying the model against the hash in the
    /// downloaded metadata before anything is written.
    ///
    /// A bundle already on disk is only replaced once both files have been
    /// fetched and verified. If writing fails partway, the files written by
    /// this call are removed.
    pub async fn download_model(&self, info: &ModelInfo) -> Result<(), ModelError> {
        let _lock = self.download_lock.lock().await;

        let (model_bytes, metadata_bytes) = self.fetch_bundle(info).await.map_err(|e| {
            log::error!("Failed to download model '{}': {}", info.name, e);
            e
        })?;

        if let Err(e) = self.write_bundle(&info.name, &model_bytes, &metadata_bytes) {
            log::error!("Failed to write model '{}': {}", info.name, e);
            if let Err(cleanup) = self.remove_download(&info.name) {
                log::warn!("Failed to clean up partial bundle '{}': {}", info.name, cleanup);
            }
            return Err(e);
        }
        log::info!("Model '{}' downloaded and verified", info.name);
        Ok(())
    }

    /// Fetches both files and checks the model hash. Writes nothing.
    async fn fetch_bundle(&self, info: &ModelInfo) -> Result<(Vec<u8>, Vec<u8>), ModelError> {
        let metadata_bytes = Self::fetch(&info.metadata_url, "metadata").await?;
        let metadata: ModelMetadata = serde_json::from_slice(&metadata_bytes)?;
        let expected = metadata.model_sha256.clone().ok_or_else(|| {
            ModelError::VerificationFailed(format!("metadata for '{}' records no model hash", info.name))
        })?;

        let model_bytes = Self::fetch(&info.model_url, "model").await?;
        let actual = Self::sha256_hex(&model_bytes);
        if !actual.eq_ignore_ascii_case(&expected) {
            log::error!("model hash mismatch: expected {}, got {}", expected, actual);
            return Err(ModelError::HashMismatch {
                file_type: "model".to_string(),
                expected,
                actual,
            });
        }
        Ok((model_bytes, metadata_bytes))
    }

    fn write_bundle(&self, name: &str, model_bytes: &[u8], metadata_bytes: &[u8]) -> Result<(), ModelError> {
        let model_dir = self.get_model_dir(name);
        log::info!("Writing bundle to {:?}", model_dir);
        fs::create_dir_all(&model_dir)?;
        fs::write(self.get_model_path(name), model_bytes)?;
        // Metadata last: its presence marks a complete bundle.
        fs::write(self.get_metadata_path(name), metadata_bytes)?;

        if !self.verify_model(name)? {
            return Err(ModelError::VerificationFailed(format!("written bundle '{}' does not verify", name)));
        }
        Ok(())
    }

    async fn fetch(url: &str, file_type: &str) -> Result<Vec<u8>, ModelError> {
        log::info!("Downloading {} file from {}", file_type, url);
        let response = reqwest::get(url).await?.error_for_status()?;
        let bytes = response.bytes().await?;
        log::info!("Downloaded {} bytes", bytes.len());
        Ok(bytes.to_vec())
    }

    pub fn remove_download(&self, name: &str) -> Result<(), ModelError> {
        let metadata_path = self.get_metadata_path(name);
        let model_path = self.get_model_path(name);

        if metadata_path.exists() {
            fs::remove_file(&metadata_path)?;
        }
        if model_path.exists() {
            fs::remove_file(&model_path)?;
        }
        Ok(())
    }

    /// Ensures that a model is downloaded and verified.
    /// If the model doesn't exist, it will be downloaded.
    /// If verification fails, it will be re-downloaded.
    pub async fn ensure_model_downloaded(&self, info: &ModelInfo) -> Result<(), ModelError> {
        if !self.is_model_downloaded(&info.name) {
            log::info!("Model '{}' not found, downloading...", info.name);
            self.download_model(info).await?;
        } else if !self.verify_model(&info.name)? {
            log::info!("Model '{}' verification failed, re-downloading...", info.name);
            self.remove_download(&info.name)?;
            self.download_model(info).await?;
        }
        Ok(())
    }
}
