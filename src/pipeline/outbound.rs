//! External hand-off capabilities used by the delivery channels.
//!
//! Channels only see these traits; the server wires in the implementations below and tests
//! substitute in-memory doubles.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::io::AsyncWriteExt;

#[async_trait::async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> anyhow::Result<()>;
}

#[async_trait::async_trait]
pub trait FileStore: Send + Sync {
    async fn write(&self, path: &str, bytes: &[u8]) -> anyhow::Result<()>;
}

#[async_trait::async_trait]
pub trait CloudStore: Send + Sync {
    async fn upload(&self, url: &str, bytes: &[u8]) -> anyhow::Result<()>;
}

#[derive(Clone)]
pub struct Outbound {
    pub mail: Arc<dyn MailTransport>,
    pub files: Arc<dyn FileStore>,
    pub cloud: Arc<dyn CloudStore>,
}

/// Records outgoing mail in the log instead of talking to a relay.
pub struct LogMailTransport;

#[async_trait::async_trait]
impl MailTransport for LogMailTransport {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> anyhow::Result<()> {
        tracing::info!(
            mail.recipient = %recipient,
            mail.subject = %subject,
            mail.size_bytes = body.len(),
            "Report mail handed off"
        );
        Ok(())
    }
}

pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait::async_trait]
impl FileStore for LocalFileStore {
    async fn write(&self, path: &str, bytes: &[u8]) -> anyhow::Result<()> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("creating {}", self.root.display()))?;
        let target = self.root.join(path);
        // Never replace a report that was already delivered.
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
            .await
            .with_context(|| format!("creating {}", target.display()))?;
        file.write_all(bytes)
            .await
            .with_context(|| format!("writing {}", target.display()))?;
        file.flush()
            .await
            .with_context(|| format!("flushing {}", target.display()))?;
        tracing::info!(path = %target.display(), size_bytes = bytes.len(), "Report written");
        Ok(())
    }
}

/// Uploads with a plain HTTP `PUT`.
pub struct HttpCloudStore {
    client: reqwest::Client,
}

impl HttpCloudStore {
    pub fn new() -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl CloudStore for HttpCloudStore {
    async fn upload(&self, url: &str, bytes: &[u8]) -> anyhow::Result<()> {
        let resp = self
            .client
            .put(url)
            .body(bytes.to_vec())
            .send()
            .await
            .with_context(|| format!("uploading to {url}"))?;

        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("upload to {url} returned {status}");
        }
        Ok(())
    }
}
