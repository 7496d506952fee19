#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use report_pipeline::pipeline::outbound::{CloudStore, FileStore, MailTransport};
use report_pipeline::pipeline::{DeliveryDefaults, Outbound, ReportOrchestrator};

/// In-memory stand-in for the mail relay, file system and cloud storage.
#[derive(Default)]
pub struct MemoryOutbound {
    pub mail: Mutex<Vec<(String, String, String)>>,
    pub files: Mutex<Vec<(String, Vec<u8>)>>,
    pub uploads: Mutex<Vec<(String, Vec<u8>)>>,
    pub fail_uploads: bool,
    pub fail_mail: bool,
}

impl MemoryOutbound {
    pub fn failing_uploads() -> Self {
        Self {
            fail_uploads: true,
            ..Self::default()
        }
    }

    pub fn failing_mail() -> Self {
        Self {
            fail_mail: true,
            ..Self::default()
        }
    }
}

#[async_trait::async_trait]
impl MailTransport for MemoryOutbound {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> anyhow::Result<()> {
        if self.fail_mail {
            anyhow::bail!("relay refused connection");
        }
        self.mail.lock().unwrap().push((
            recipient.to_string(),
            subject.to_string(),
            body.to_string(),
        ));
        Ok(())
    }
}

#[async_trait::async_trait]
impl FileStore for MemoryOutbound {
    async fn write(&self, path: &str, bytes: &[u8]) -> anyhow::Result<()> {
        self.files
            .lock()
            .unwrap()
            .push((path.to_string(), bytes.to_vec()));
        Ok(())
    }
}

#[async_trait::async_trait]
impl CloudStore for MemoryOutbound {
    async fn upload(&self, url: &str, bytes: &[u8]) -> anyhow::Result<()> {
        if self.fail_uploads {
            anyhow::bail!("503 service unavailable");
        }
        self.uploads
            .lock()
            .unwrap()
            .push((url.to_string(), bytes.to_vec()));
        Ok(())
    }
}

pub fn outbound(memory: &Arc<MemoryOutbound>) -> Outbound {
    Outbound {
        mail: memory.clone(),
        files: memory.clone(),
        cloud: memory.clone(),
    }
}

pub fn orchestrator(
    memory: &Arc<MemoryOutbound>,
    defaults: DeliveryDefaults,
) -> ReportOrchestrator {
    ReportOrchestrator::new(outbound(memory), defaults)
}

pub fn configured_defaults() -> DeliveryDefaults {
    DeliveryDefaults::default()
        .with_target("email", Some("reports@example.com".to_string()))
        .with_target("cloud", Some("https://storage.example.com/reports".to_string()))
}
