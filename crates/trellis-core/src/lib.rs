//! Trellis Core - pattern-based test discovery and execution
//!
//! Discovery is driven by [`explorer::PatternTestExplorer`]: framework
//! extensions report which test tools an assembly references, assemblies
//! sharing a tool set share one top-level test, and patterns resolved per
//! code element grow the tree either for a whole assembly or for a single
//! type. The result is a [`model::TestModel`] whose leaves are run through
//! [`invoker::run`], which turns every failure or panic into a
//! [`outcome::TestOutcome`].
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use trellis_core::pattern::{DeclarativePatternResolver, FrameworkExtension, ExtensionError};
//! use trellis_core::reflect::memory::{AssemblyDef, TypeDef};
//! use trellis_core::reflect::AssemblyInfo;
//! use trellis_core::{PatternTestExplorer, ToolInfo};
//!
//! struct Everything;
//!
//! impl FrameworkExtension for Everything {
//!     fn referenced_tools(&self, _: &dyn AssemblyInfo) -> Result<Vec<ToolInfo>, ExtensionError> {
//!         Ok(vec![ToolInfo::new("sample", "Sample")])
//!     }
//! }
//!
//! let explorer = PatternTestExplorer::new(Arc::new(DeclarativePatternResolver), vec![Arc::new(Everything)]);
//! let assembly: Arc<dyn AssemblyInfo> = AssemblyDef::new("Sample.Tests").ty(TypeDef::new("Fixture")).build();
//!
//! let mut top_level = Vec::new();
//! explorer.explore_assembly(&assembly, |node| top_level.push(node.name.clone()));
//! assert_eq!(top_level, vec!["Sample"]);
//! ```

pub mod builder;
pub mod error;
pub mod explorer;
pub mod hash;
pub mod invoker;
pub mod log;
pub mod logging;
pub mod model;
pub mod outcome;
pub mod pattern;
pub mod reflect;
pub mod registry;
pub mod runner;
pub mod tool;

pub use builder::{BuilderId, BuilderTree, PopulateChain, PopulateScope, TestBuilder, TestSpec};
pub use error::{ExploreError, ExploreResult, ModelError, ModelResult};
pub use explorer::{ExplorationDiagnostic, PatternTestExplorer, PopulationState};
pub use hash::Hash64;
pub use invoker::run;
pub use log::{LogSink, LogStream, MemoryLogSink, TracingLogSink};
pub use model::{TestKind, TestModel, TestNode};
pub use outcome::{Failure, TestOutcome, TestStatus};
pub use runner::{RunSummary, TestRun, TestRunner};
pub use tool::{ToolInfo, ToolSet};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
