//! cdcsink Domain Layer
//!
//! Pure types and functions for turning upstream change events into log
//! records. This crate has no I/O.
//!
//! # Pipeline
//!
//! ```text
//! ChangeEvent → normalize() → CanonicalRecord → Router::route() → PartitionKey
//!                                     ↓
//!                              encode() → JSON document
//! ```
//!
//! # Example
//!
//! ```rust
//! use cdcsink_domain::{normalize, ChangeEvent, Operation, Router};
//! use serde_json::json;
//!
//! let event = ChangeEvent::new(Operation::Insert)
//!     .with_after(json!({"id": 7, "name": "widget"}).as_object().unwrap().clone())
//!     .with_table("products");
//!
//! let record = normalize(&event).unwrap();
//! let route = Router::new("gluesync_events").route(record.metadata());
//!
//! assert_eq!(route.key.as_str(), "gluesync_events:products");
//! assert!(record.encode().unwrap().contains("\"operation\":\"INSERT\""));
//! ```

#![warn(clippy::all)]

pub mod document;
pub mod event;
pub mod normalize;
pub mod record;
pub mod route;

pub use document::{LogDocument, EVENT_FIELD};
pub use event::{ChangeEvent, Metadata, Operation, Row};
pub use normalize::{normalize, Rejection};
pub use record::{CanonicalRecord, ChangeKind};
pub use route::{PartitionKey, Route, Router, UNKNOWN_TABLE};
