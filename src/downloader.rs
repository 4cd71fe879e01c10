use futures::StreamExt;
use reqwest::Client;
use sha1::{Digest, Sha1};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufWriter};

/// One artifact to fetch. The url already carries portal credentials, so
/// errors and log lines reference the destination instead.
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub url: String,
    pub destination: PathBuf,
    pub sha1: String,
}

#[derive(Debug, Clone, Error)]
pub enum DownloadError {
    #[error("network error: {0}")]
    Network(String),
    #[error("io error: {0}")]
    Io(String),
    #[error("checksum mismatch for {path:?}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        expected: String,
        actual: String,
        path: PathBuf,
    },
    #[error("max retries exceeded for {file_name}")]
    MaxRetriesExceeded { file_name: String },
}

impl From<reqwest::Error> for DownloadError {
    fn from(value: reqwest::Error) -> Self {
        // without_url keeps credential-bearing query strings out of errors
        Self::Network(value.without_url().to_string())
    }
}

impl From<std::io::Error> for DownloadError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value.to_string())
    }
}

#[derive(Debug)]
pub struct Downloader {
    client: Client,
}

impl Default for Downloader {
    fn default() -> Self {
        Self::new()
    }
}

impl Downloader {
    pub fn new() -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(300))
                .user_agent(concat!("modlock/", env!("CARGO_PKG_VERSION")))
                .build()
                .expect("failed to build reqwest client"),
        }
    }

    /// Download one artifact with retries and SHA-1 verification.
    ///
    /// A destination whose current content already matches the checksum is
    /// kept without touching the network. A mismatch after download deletes
    /// the file and fails without retrying.
    pub async fn download_file(&self, request: &DownloadRequest) -> Result<PathBuf, DownloadError> {
        let expected = request.sha1.to_ascii_lowercase();
        if matches!(hash_file(&request.destination).await, Ok(actual) if actual == expected) {
            return Ok(request.destination.clone());
        }

        let max_retries = 3;
        let mut attempt = 0;

        loop {
            match self.download_attempt(request).await {
                Ok(()) => {
                    verify_checksum(&request.destination, &expected).await?;
                    return Ok(request.destination.clone());
                }
                Err(e) => {
                    attempt += 1;
                    if attempt >= max_retries {
                        return Err(DownloadError::MaxRetriesExceeded {
                            file_name: file_name(&request.destination),
                        });
                    }
                    // Exponential backoff: 1s, 2s
                    tokio::time::sleep(Duration::from_secs(1 << (attempt - 1))).await;
                    eprintln!(
                        "retrying {} (attempt {}): {}",
                        file_name(&request.destination),
                        attempt + 1,
                        e
                    );
                }
            }
        }
    }

    async fn download_attempt(&self, request: &DownloadRequest) -> Result<(), DownloadError> {
        let response = self.client.get(&request.url).send().await?;
        let response = response.error_for_status()?;

        if let Some(parent) = request.destination.parent() {
            fs::create_dir_all(parent).await?;
        }

        let file = File::create(&request.destination).await?;
        let mut writer = BufWriter::new(file);
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            writer.write_all(&chunk).await?;
        }

        writer.flush().await?;
        Ok(())
    }

    /// Download multiple artifacts with bounded concurrency.
    pub async fn download_parallel(
        &self,
        requests: Vec<DownloadRequest>,
        concurrency: usize,
    ) -> Vec<Result<PathBuf, DownloadError>> {
        futures::stream::iter(
            requests
                .into_iter()
                .map(|request| async move { self.download_file(&request).await }),
        )
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await
    }
}

async fn verify_checksum(path: &Path, expected: &str) -> Result<(), DownloadError> {
    let actual = hash_file(path).await?;
    if actual != expected {
        let _ = fs::remove_file(path).await;
        return Err(DownloadError::ChecksumMismatch {
            expected: expected.to_string(),
            actual,
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

async fn hash_file(path: &Path) -> Result<String, DownloadError> {
    let mut file = File::open(path).await?;
    let mut hasher = Sha1::new();
    let mut buffer = [0u8; 8192];

    loop {
        let n = file.read(&mut buffer).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
