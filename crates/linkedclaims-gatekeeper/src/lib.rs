//! LinkedClaims Gatekeeper
//!
//! Validates claim candidates against a schema before anything is allowed
//! downstream.
//!
//! The Gatekeeper provides:
//! - Required-field and enum checks
//! - Numeric, date, and URI coercion
//! - Confidence defaulting, bounds, and an optional floor
//! - The amount/unit pairing rule
//!
//! # Examples
//!
//! ```
//! use linkedclaims_domain::{ClaimCandidate, Provenance, SchemaRegistry};
//! use linkedclaims_gatekeeper::{Gatekeeper, ValidationConfig};
//! use serde_json::json;
//!
//! let registry = SchemaRegistry::with_builtin();
//! let schema = registry.get_schema("impact").unwrap();
//! let gatekeeper = Gatekeeper::new(ValidationConfig::default()).unwrap();
//!
//! let fields = json!({"subject": "Acme", "claim": "impact", "statement": "Acme planted 500 trees"});
//! let candidate = ClaimCandidate::new(fields.as_object().cloned().unwrap(), 0, "");
//! let outcome = gatekeeper.validate(&candidate, schema, &Provenance::new("https://acme.org/report"));
//! assert!(outcome.is_accepted());
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod validator;

pub use config::{ValidationConfig, DEFAULT_CONFIDENCE};
pub use error::GatekeeperError;
pub use validator::{Gatekeeper, ValidationOutcome};
