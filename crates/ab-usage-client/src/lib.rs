//! AgenticBilling API client.
//!
//! This crate is the transport collaborator of the usage tool: it submits
//! CloudEvents usage envelopes built by `ab-usage-core` and fetches the
//! aggregated usage and cost reports the CLI renders.
//!
//! # Example
//!
//! ```no_run
//! use ab_usage_client::UsageApiClient;
//! use ab_usage_core::{new_template, TemplateKind, UlidIds};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = UsageApiClient::new(
//!     "https://api.agenticbilling.ai",
//!     "your-api-key",
//!     "AgenticBilling.AI",
//! )?;
//!
//! let event = new_template(TemplateKind::AiChat, client.provider(), &UlidIds, &[])?;
//! let response = client.submit_usage(&event).await?;
//! println!("{response}");
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod client;
mod error;
mod types;

pub use client::{ClientOptions, UsageApiClient};
pub use error::ClientError;
pub use types::{GroupedMetadata, GroupedQuery, GroupedReport, ReportPage};
