//! Response Compatibility Checker
//!
//! Decides whether a candidate JSON response is structurally compatible with a
//! baseline response, i.e. whether a client written against the baseline shape
//! keeps working when handed the candidate.
//!
//! ## Rules
//!
//! - **Scalars**: compatible when both sides have the same kind (`null`, bool,
//!   number, string). Values are never compared.
//! - **Objects**: every baseline key must exist in the candidate, and the values
//!   under each key must be compatible. Extra candidate keys are ignored.
//! - **Homogeneous lists**: every candidate element must have the kind of the
//!   first baseline element. Lengths may differ; composite elements are checked
//!   pairwise up to the shorter length.
//! - **Heterogeneous lists**: lengths must match and every position is checked.
//! - **Empty lists**: an empty list is only compatible with another empty list.
//!
//! The first mismatch aborts the check and is returned as an [`Incompatibility`].
//!
//! ## Example
//!
//! ```
//! use response_compat::CompatibilityChecker;
//! use serde_json::json;
//!
//! let baseline = json!({"items": [{"id": 1}], "total": 1});
//! let candidate = json!({"items": [{"id": 7, "name": "x"}, {"id": 8}], "total": 2, "next": null});
//!
//! assert!(CompatibilityChecker::new().check(&baseline, &candidate).is_ok());
//! ```

pub mod checksum;
pub mod compatibility;
pub mod config;
pub mod error;
pub mod kind;
pub mod report;
pub mod source;

pub use checksum::Fingerprint;
pub use compatibility::{check, CompatibilityChecker, Incompatibility, Reason};
pub use config::CompatConfig;
pub use error::{CompatError, Result};
pub use kind::{NumberPolicy, ValueKind};
pub use report::{OutputFormat, Reporter, Verdict};
pub use source::{DocumentLoader, DocumentSource, Fetcher, HttpFetcher, LoadedDocument};
