pub mod delivery;
pub mod formatters;
pub mod generators;
pub mod orchestrator;
pub mod outbound;
pub mod registry;

/// Report-type specific input data.
pub type Payload = serde_json::Map<String, serde_json::Value>;

pub use delivery::{DeliveryChannel, DeliveryReceipt, DeliverySpec};
pub use formatters::{FormattedContent, OutputFormatter};
pub use generators::ContentGenerator;
pub use orchestrator::{
    AvailableOptions, DeliveryDefaults, Registries, ReportOrchestrator, ReportRecord, ReportRequest,
};
pub use outbound::Outbound;
pub use registry::Registry;
