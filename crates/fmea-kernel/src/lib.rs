//! # FMEA Kernel
//!
//! Shared vocabulary for the FMEA rule engine. Every other crate speaks in
//! these terms: a [`Row`] is one analysis record addressed through the
//! canonical [`FieldKind`] enum, validators emit [`ViolationRecord`]s, and a
//! [`Session`] carries per-run state (configuration plus the documents read
//! so far) through the pipeline instead of process-wide bookkeeping.
//!
//! ## Architecture
//!
//! ```text
//! FieldKind / Relation   ← canonical field + relation names, alias table
//!     │
//! LifecycleStage         ← required stage tags on cause and control text
//!     │
//! Row / RowSet           ← normalized input schema, validated at ingestion
//!     │
//! ViolationRecord        ← what every validator emits
//!     │
//! EngineConfig / Session ← policy thresholds and per-run context
//! ```

pub mod config;
pub mod error;
pub mod field;
pub mod row;
pub mod session;
pub mod tags;
pub mod text;
pub mod violation;

pub use config::{
    DiamondConfig, EngineConfig, FunctionCoverageConfig, LifecycleBalanceConfig, OrderingConfig,
};
pub use error::KernelError;
pub use field::{ALL_FIELDS, ALL_RELATIONS, FieldKind, Relation};
pub use row::{Row, RowSet};
pub use session::{DocumentRead, Session, sha256_hex};
pub use tags::{ALL_STAGES, LifecycleStage};
pub use violation::{Severity, SeverityCounts, ViolationRecord, rule_id};
