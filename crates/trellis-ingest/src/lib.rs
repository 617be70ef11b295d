//! # trellis-ingest
//!
//! Turns catalog snapshots into a relational hierarchy and a lineage graph.
//!
//! - [`normalize`]: engine-specific column attributes → canonical descriptors
//!   and statistical profiles.
//! - [`hierarchy`]: table → data store → database → service, with a fallback
//!   through data-store membership edges.
//! - [`table`]: column assembly and table/profile/sample emission.
//! - [`lineage`]: report and data-plan edges.
//! - [`sink`]: where emitted records go.
//! - [`run`]: the loop tying it together.

pub mod error;
pub mod hierarchy;
pub mod lineage;
pub mod normalize;
pub mod run;
pub mod sink;
pub mod table;

pub use error::{IngestError, SinkError};
pub use hierarchy::{HierarchyResolver, Resolution, ResolvedHierarchy, Strategy};
pub use lineage::{DashboardLineage, LineageResolver, TraversalState};
pub use run::{IngestRun, RunSummary};
pub use sink::{EntitySink, JsonlSink, MemorySink};
pub use table::{TableIngestor, TableOptions};
