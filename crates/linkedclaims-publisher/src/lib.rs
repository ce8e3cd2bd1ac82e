//! LinkedClaims Publisher
//!
//! Submits validated claims to a LinkedTrust registry and keeps an explicit
//! review queue for claims that need a human decision first.
//!
//! # Example
//!
//! ```no_run
//! use linkedclaims_publisher::{PublisherConfig, RegistryClient, ReviewQueue};
//! # use linkedclaims_extractor::ExtractionResult;
//!
//! # async fn example(result: ExtractionResult) -> Result<(), Box<dyn std::error::Error>> {
//! let mut queue = ReviewQueue::new();
//! queue.enqueue(&result);
//! queue.approve_above(0.8);
//!
//! let client = RegistryClient::from_env(&PublisherConfig::default())?;
//! let report = client.publish_batch(&queue.drain_approved()).await;
//! println!("{}/{} published", report.succeeded(), report.total());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod client;
mod config;
mod error;
mod queue;
mod report;

pub use client::{check_claim, prepare_payload, RegistryClient};
pub use config::{PublisherConfig, DEFAULT_API_URL, LINKEDTRUST_API_KEY_ENV};
pub use error::PublishError;
pub use queue::{ReviewEntry, ReviewQueue, ReviewStatus};
pub use report::{PublishOutcome, PublishReport, PublishStatus};
