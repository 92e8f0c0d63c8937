//! Shared fixtures for the integration tests
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use trellis_core::builder::{TestBuilder, TestSpec};
use trellis_core::pattern::{
    ExtensionError, FrameworkExtension, Pattern, PatternAttribute, PatternResolver,
};
use trellis_core::reflect::memory::{AssemblyDef, MethodDef, TypeDef};
use trellis_core::reflect::{attributes_of, has_attribute, AssemblyInfo, CodeElement, TypeInfo};
use trellis_core::{Failure, TestKind, ToolInfo};

/// Marks a method as a test case
pub struct TestAttr;

/// Declares a tool an assembly references
pub struct UsesTool(pub &'static str, pub &'static str);

/// Turns a type into a fixture with one test per `TestAttr` method
#[derive(Default)]
pub struct FixturePattern {
    consumed: AtomicUsize,
}

impl FixturePattern {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Number of types consumed so far
    pub fn consumed(&self) -> usize {
        self.consumed.load(Ordering::SeqCst)
    }
}

impl Pattern for FixturePattern {
    fn is_test(&self, _resolver: &dyn PatternResolver, element: &CodeElement) -> bool {
        element.as_type().is_some()
    }

    fn consume(&self, builder: &mut TestBuilder<'_>, element: &CodeElement, _skip_children: bool) {
        let Some(ty) = element.as_type() else {
            return;
        };
        self.consumed.fetch_add(1, Ordering::SeqCst);

        let mut fixture = builder.create_child(
            TestSpec::new(ty.name(), TestKind::Fixture).code_reference(ty.code_reference()),
        );
        for method in ty.methods() {
            if !has_attribute::<TestAttr>(method.attributes()) {
                continue;
            }
            let target = method.clone();
            fixture.add_child(
                TestSpec::new(method.name(), TestKind::Test)
                    .code_reference(method.code_reference())
                    .action(move || target.invoke()),
            );
        }
    }
}

/// Two fixtures and a helper type:
///
/// - `Alpha`: `passes`, `fails`
/// - `Beta`: `unsure` (inconclusive), `panics`
/// - `Helper`: no pattern
pub fn sample_assembly(name: &str, pattern: &Arc<FixturePattern>, tools: &[(&'static str, &'static str)]) -> AssemblyDef {
    let shared: Arc<dyn Pattern> = pattern.clone();

    let mut assembly = AssemblyDef::new(name)
        .ty(TypeDef::new("Alpha")
            .attribute(PatternAttribute::shared(shared.clone()))
            .method(MethodDef::new("passes").attribute(TestAttr))
            .method(MethodDef::new("fails").attribute(TestAttr).body(|| Err(Failure::message("expected 4, got 5"))))
            .method(MethodDef::new("setup")))
        .ty(TypeDef::new("Beta")
            .attribute(PatternAttribute::shared(shared))
            .method(MethodDef::new("unsure").attribute(TestAttr).body(|| Err(Failure::inconclusive("no data"))))
            .method(MethodDef::new("panics").attribute(TestAttr).body(|| panic!("kaboom"))))
        .ty(TypeDef::new("Helper"));

    for &(id, tool_name) in tools {
        assembly = assembly.attribute(UsesTool(id, tool_name));
    }
    assembly
}

pub fn find_type(assembly: &Arc<dyn AssemblyInfo>, name: &str) -> Arc<dyn TypeInfo> {
    assembly
        .types()
        .into_iter()
        .find(|t| t.name() == name)
        .unwrap()
}

/// Reports the tools declared with `UsesTool`
pub struct DeclaredTools;

impl FrameworkExtension for DeclaredTools {
    fn referenced_tools(&self, assembly: &dyn AssemblyInfo) -> Result<Vec<ToolInfo>, ExtensionError> {
        Ok(attributes_of::<UsesTool>(assembly.attributes())
            .map(|tool| ToolInfo::new(tool.0, tool.1))
            .collect())
    }
}

/// Reports the same tools for every assembly
pub struct StaticTools(pub Vec<ToolInfo>);

impl FrameworkExtension for StaticTools {
    fn referenced_tools(&self, _assembly: &dyn AssemblyInfo) -> Result<Vec<ToolInfo>, ExtensionError> {
        Ok(self.0.clone())
    }
}

pub struct FailingExtension;

impl FrameworkExtension for FailingExtension {
    fn referenced_tools(&self, _assembly: &dyn AssemblyInfo) -> Result<Vec<ToolInfo>, ExtensionError> {
        Err("could not read assembly references".into())
    }
}

pub struct PanickingExtension;

impl FrameworkExtension for PanickingExtension {
    fn referenced_tools(&self, _assembly: &dyn AssemblyInfo) -> Result<Vec<ToolInfo>, ExtensionError> {
        panic!("extension bug")
    }
}
