use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::outbound::{CloudStore, FileStore, MailTransport, Outbound};
use super::registry::Registry;
use crate::error::{Axis, PipelineError};

/// Construction arguments for a delivery channel.
#[derive(Clone)]
pub struct DeliverySpec {
    /// Recipient address or destination URL. Unused by downloads.
    pub target: Option<String>,
    pub outbound: Outbound,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeliveryReceipt {
    pub method: String,
    pub destination: String,
    pub file_name: String,
    pub delivered_at: DateTime<Utc>,
}

#[async_trait::async_trait]
pub trait DeliveryChannel: Send + Sync {
    fn method_type(&self) -> &'static str;

    async fn deliver(
        &self,
        content: &str,
        report_type: &str,
        file_extension: &str,
    ) -> Result<DeliveryReceipt, PipelineError>;
}

pub fn builtin_registry() -> Registry<dyn DeliveryChannel, DeliverySpec> {
    let mut registry: Registry<dyn DeliveryChannel, DeliverySpec> = Registry::new(Axis::Delivery);
    registry.register("email", |spec: &DeliverySpec| {
        let channel = EmailDelivery::new(spec.target.clone(), spec.outbound.mail.clone())?;
        Ok(Box::new(channel) as Box<dyn DeliveryChannel>)
    });
    registry.register("download", |spec: &DeliverySpec| {
        let channel = DownloadDelivery::new(spec.outbound.files.clone());
        Ok(Box::new(channel) as Box<dyn DeliveryChannel>)
    });
    registry.register("cloud", |spec: &DeliverySpec| {
        let channel = CloudDelivery::new(spec.target.clone(), spec.outbound.cloud.clone())?;
        Ok(Box::new(channel) as Box<dyn DeliveryChannel>)
    });
    registry
}

fn failed(channel: &str, source: anyhow::Error) -> PipelineError {
    PipelineError::DeliveryFailed {
        channel: channel.to_string(),
        source,
    }
}

pub struct EmailDelivery {
    recipient: String,
    transport: Arc<dyn MailTransport>,
}

impl EmailDelivery {
    pub fn new(
        recipient: Option<String>,
        transport: Arc<dyn MailTransport>,
    ) -> Result<Self, PipelineError> {
        let recipient = recipient
            .filter(|r| !r.trim().is_empty())
            .ok_or(PipelineError::MissingRecipient)?;
        Ok(Self {
            recipient,
            transport,
        })
    }
}

#[async_trait::async_trait]
impl DeliveryChannel for EmailDelivery {
    fn method_type(&self) -> &'static str {
        "email"
    }

    #[tracing::instrument(name = "delivery email", skip(self, content))]
    async fn deliver(
        &self,
        content: &str,
        report_type: &str,
        file_extension: &str,
    ) -> Result<DeliveryReceipt, PipelineError> {
        let file_name = format!("report_{report_type}.{file_extension}");
        let subject = format!("Report: {report_type}");

        self.transport
            .send(&self.recipient, &subject, content)
            .await
            .map_err(|e| failed(self.method_type(), e))?;

        Ok(DeliveryReceipt {
            method: self.method_type().to_string(),
            destination: self.recipient.clone(),
            file_name,
            delivered_at: Utc::now(),
        })
    }
}

pub struct DownloadDelivery {
    store: Arc<dyn FileStore>,
}

impl DownloadDelivery {
    pub fn new(store: Arc<dyn FileStore>) -> Self {
        Self { store }
    }
}

/// `report_<type>_<utc timestamp>_<id>.<ext>`. The id keeps same-millisecond downloads apart.
pub fn download_file_name(
    report_type: &str,
    at: DateTime<Utc>,
    id: Uuid,
    file_extension: &str,
) -> String {
    let id = id.simple().to_string();
    format!(
        "report_{report_type}_{}_{}.{file_extension}",
        at.format("%Y%m%d_%H%M%S_%3f"),
        &id[..8]
    )
}

#[async_trait::async_trait]
impl DeliveryChannel for DownloadDelivery {
    fn method_type(&self) -> &'static str {
        "download"
    }

    #[tracing::instrument(name = "delivery download", skip(self, content))]
    async fn deliver(
        &self,
        content: &str,
        report_type: &str,
        file_extension: &str,
    ) -> Result<DeliveryReceipt, PipelineError> {
        let now = Utc::now();
        let file_name = download_file_name(report_type, now, Uuid::new_v4(), file_extension);

        self.store
            .write(&file_name, content.as_bytes())
            .await
            .map_err(|e| failed(self.method_type(), e))?;

        Ok(DeliveryReceipt {
            method: self.method_type().to_string(),
            destination: file_name.clone(),
            file_name,
            delivered_at: now,
        })
    }
}

pub struct CloudDelivery {
    destination_url: String,
    store: Arc<dyn CloudStore>,
}

impl CloudDelivery {
    pub fn new(
        destination_url: Option<String>,
        store: Arc<dyn CloudStore>,
    ) -> Result<Self, PipelineError> {
        let destination_url = destination_url
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .ok_or(PipelineError::MissingDestination)?;
        Ok(Self {
            destination_url,
            store,
        })
    }
}

#[async_trait::async_trait]
impl DeliveryChannel for CloudDelivery {
    fn method_type(&self) -> &'static str {
        "cloud"
    }

    #[tracing::instrument(name = "delivery cloud", skip(self, content))]
    async fn deliver(
        &self,
        content: &str,
        report_type: &str,
        file_extension: &str,
    ) -> Result<DeliveryReceipt, PipelineError> {
        let file_name = format!("{report_type}.{file_extension}");
        let url = format!("{}/{file_name}", self.destination_url);

        self.store
            .upload(&url, content.as_bytes())
            .await
            .map_err(|e| failed(self.method_type(), e))?;

        Ok(DeliveryReceipt {
            method: self.method_type().to_string(),
            destination: url,
            file_name,
            delivered_at: Utc::now(),
        })
    }
}
