//! Patterns, resolvers and framework extensions
//!
//! A [`Pattern`] recognizes code elements that contribute tests and turns
//! them into builder nodes. A [`PatternResolver`] finds the patterns that
//! apply to an element. A [`FrameworkExtension`] reports which test tools
//! an assembly references and can contribute assembly initialization hooks.

pub mod bootstrap;
pub mod declarative;

pub use bootstrap::BootstrapAssemblyPattern;
pub use declarative::{DeclarativePatternResolver, PatternAttribute};

use crate::builder::TestBuilder;
use crate::outcome::Failure;
use crate::reflect::{AssemblyInfo, CodeElement};
use crate::tool::ToolInfo;
use std::fmt;
use std::sync::Arc;

/// Error type extensions report enumeration problems with
pub type ExtensionError = Box<dyn std::error::Error + Send + Sync>;

/// Rule that recognizes test-contributing code elements
pub trait Pattern: Send + Sync {
    /// Whether the element contributes tests; must not mutate anything
    fn is_test(&self, resolver: &dyn PatternResolver, element: &CodeElement) -> bool;

    /// Add the element's tests under `builder`
    ///
    /// With `skip_children` set, work for nested elements is deferred onto
    /// the builder's populate chain instead of being done immediately.
    fn consume(&self, builder: &mut TestBuilder<'_>, element: &CodeElement, skip_children: bool);
}

/// Maps a code element to the patterns that apply to it
pub trait PatternResolver: Send + Sync {
    fn patterns_for(&self, element: &CodeElement) -> Vec<Arc<dyn Pattern>>;
}

/// Contributes knowledge about a test tool to discovery
pub trait FrameworkExtension: Send + Sync {
    /// Tools the assembly references; may fail
    fn referenced_tools(&self, assembly: &dyn AssemblyInfo) -> Result<Vec<ToolInfo>, ExtensionError>;
}

/// Signature of an assembly initialization hook
pub type InitializationHook =
    Arc<dyn Fn(&mut TestBuilder<'_>, &dyn AssemblyInfo) -> Result<(), Failure> + Send + Sync>;

/// Named hook run against the top-level builder when an assembly is first explored
///
/// Declared as an attribute on the assembly.
#[derive(Clone)]
pub struct AssemblyInitialization {
    name: String,
    hook: InitializationHook,
}

impl AssemblyInitialization {
    pub fn new<F>(name: impl Into<String>, hook: F) -> Self
    where
        F: Fn(&mut TestBuilder<'_>, &dyn AssemblyInfo) -> Result<(), Failure> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            hook: Arc::new(hook),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn initialize(&self, builder: &mut TestBuilder<'_>, assembly: &dyn AssemblyInfo) -> Result<(), Failure> {
        (self.hook)(builder, assembly)
    }
}

impl fmt::Debug for AssemblyInitialization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssemblyInitialization")
            .field("name", &self.name)
            .finish()
    }
}
