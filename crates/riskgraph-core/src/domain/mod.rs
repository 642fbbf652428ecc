//! Domain model for entity risk profiling.
//!
//! - [`finding`]: `RiskFinding`, `EsgFinding`, `Citation` and their category enums
//! - [`graph`]: `DependencyGraph`, `RiskNode`, `RiskLink`
//! - [`state`]: `PipelineState`, `EntityName`
//! - [`error`]: `ValidationError`

pub mod error;
pub mod finding;
pub mod graph;
pub mod state;

pub use error::ValidationError;
pub use finding::{Citation, EsgFinding, EsgPillar, RiskCategory, RiskFinding, Severity};
pub use graph::{DependencyGraph, RiskLink, RiskNode};
pub use state::{EntityName, PipelineState};
