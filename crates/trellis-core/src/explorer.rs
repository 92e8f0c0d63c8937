//! Exploration driver
//!
//! [`PatternTestExplorer`] owns one exploration session: the builder tree,
//! the per-assembly population state and the top-level registry. Every
//! request takes the session lock for its whole check-and-update, so two
//! threads never build the same top-level test twice.
//!
//! Establishing an assembly:
//!
//! 1. ask every extension which tools the assembly references (faults are
//!    logged and skipped)
//! 2. no tools: the assembly is fully populated and contributes nothing
//! 3. otherwise get or create the top-level builder for the tool set
//! 4. run the assembly's initialization hooks; a failing hook becomes an
//!    error node under the root
//! 5. hand the assembly to the bootstrap pattern, deferring type work when
//!    only a single type was asked for
//!
//! Consumers are called after the lock is released. Patterns run with the
//! lock held and must not call back into the explorer.

use crate::builder::{BuilderId, BuilderTree, PopulateScope};
use crate::error::{ExploreError, ExploreResult};
use crate::model::{TestModel, TestNode};
use crate::outcome::Failure;
use crate::pattern::{
    AssemblyInitialization, BootstrapAssemblyPattern, FrameworkExtension, Pattern, PatternResolver,
};
use crate::reflect::{attributes_of, AssemblyInfo, CodeElement, CodeReference, TypeInfo};
use crate::registry::TopLevelRegistry;
use crate::tool::ToolSet;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use trellis_config::ExplorerConfig;

const EXTENSION_FAULT: &str =
    "A pattern test framework extension threw an exception while enumerating referenced tools.";

/// How far an assembly has been explored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PopulationState {
    NotStarted,
    /// Top-level builder and initialization done, types populated on demand
    PartiallyPopulated,
    FullyPopulated,
}

impl fmt::Display for PopulationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PopulationState::NotStarted => write!(f, "not started"),
            PopulationState::PartiallyPopulated => write!(f, "partially populated"),
            PopulationState::FullyPopulated => write!(f, "fully populated"),
        }
    }
}

/// A recovered problem recorded during exploration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExplorationDiagnostic {
    pub assembly: CodeReference,
    pub message: String,
}

struct ExplorationSession {
    tree: BuilderTree,
    states: HashMap<CodeReference, PopulationState>,
    registry: TopLevelRegistry,
    diagnostics: Vec<ExplorationDiagnostic>,
}

/// Discovers tests on demand through patterns and framework extensions
pub struct PatternTestExplorer {
    resolver: Arc<dyn PatternResolver>,
    extensions: Vec<Arc<dyn FrameworkExtension>>,
    bootstrap: BootstrapAssemblyPattern,
    settings: ExplorerConfig,
    session: Mutex<ExplorationSession>,
}

impl PatternTestExplorer {
    /// Start a new exploration session
    pub fn new(resolver: Arc<dyn PatternResolver>, extensions: Vec<Arc<dyn FrameworkExtension>>) -> Self {
        let session = ExplorationSession {
            tree: BuilderTree::new(resolver.clone()),
            states: HashMap::new(),
            registry: TopLevelRegistry::new(),
            diagnostics: Vec::new(),
        };

        Self {
            resolver,
            extensions,
            bootstrap: BootstrapAssemblyPattern::new(),
            settings: ExplorerConfig::default(),
            session: Mutex::new(session),
        }
    }

    pub fn with_settings(mut self, settings: ExplorerConfig) -> Self {
        self.settings = settings;
        self
    }

    fn lock(&self) -> MutexGuard<'_, ExplorationSession> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether an element is recognized as a test; touches no session state
    pub fn is_test(&self, element: &CodeElement) -> bool {
        self.bootstrap.is_test(self.resolver.as_ref(), element)
    }

    /// Fully populate an assembly and offer its top-level tests to `consumer`
    ///
    /// Population happens at most once per assembly and only covers that
    /// assembly, even when its top-level builders are shared; the offer
    /// happens on every call.
    pub fn explore_assembly<F>(&self, assembly: &Arc<dyn AssemblyInfo>, mut consumer: F)
    where
        F: FnMut(Arc<TestNode>),
    {
        let reference = assembly.code_reference();

        let nodes = {
            let mut guard = self.lock();
            let session = &mut *guard;

            if self.ensure(session, assembly, false) != PopulationState::FullyPopulated {
                for id in session.tree.builders_for(&reference) {
                    session
                        .tree
                        .builder(id)
                        .populate_children(PopulateScope::Assembly(&reference));
                }
                session
                    .states
                    .insert(reference.clone(), PopulationState::FullyPopulated);
                tracing::debug!(assembly = %reference, "assembly fully populated");
            }

            build_all(&session.tree, session.tree.builders_for(&reference))
        };

        for node in nodes {
            consumer(node);
        }
    }

    /// Populate only what one type contributes and offer its tests to `consumer`
    ///
    /// Never fully populates the owning assembly. Fails when the type's
    /// assembly is no longer reachable.
    pub fn explore_type<F>(&self, ty: &Arc<dyn TypeInfo>, mut consumer: F) -> ExploreResult<()>
    where
        F: FnMut(Arc<TestNode>),
    {
        let reference = ty.code_reference();
        let assembly = ty.assembly().ok_or_else(|| ExploreError::DetachedType {
            type_name: reference.to_string(),
        })?;

        let nodes = {
            let mut guard = self.lock();
            let session = &mut *guard;

            if self.ensure(session, &assembly, true) != PopulationState::FullyPopulated {
                for id in session.tree.builders_for(&assembly.code_reference()) {
                    session.tree.builder(id).populate_children(PopulateScope::Type(ty));
                }
            }

            build_all(&session.tree, session.tree.builders_for(&reference))
        };

        for node in nodes {
            consumer(node);
        }
        Ok(())
    }

    /// Current state of an assembly
    pub fn population_state(&self, assembly: &dyn AssemblyInfo) -> PopulationState {
        self.lock()
            .states
            .get(&assembly.code_reference())
            .copied()
            .unwrap_or(PopulationState::NotStarted)
    }

    /// Problems recovered from so far
    pub fn diagnostics(&self) -> Vec<ExplorationDiagnostic> {
        self.lock().diagnostics.clone()
    }

    /// Number of distinct tool sets seen so far
    pub fn top_level_count(&self) -> usize {
        self.lock().registry.len()
    }

    /// Snapshot the whole tree built so far as a test model
    pub fn build_model(&self) -> TestModel {
        TestModel::new(self.lock().tree.build_root())
    }

    /// Make sure an assembly has a top-level builder, returning its state
    fn ensure(
        &self,
        session: &mut ExplorationSession,
        assembly: &Arc<dyn AssemblyInfo>,
        skip_children: bool,
    ) -> PopulationState {
        let reference = assembly.code_reference();
        if let Some(state) = session.states.get(&reference) {
            return *state;
        }

        let tools = self.referenced_tools(session, assembly);
        if tools.is_empty() {
            tracing::debug!(assembly = %reference, "assembly references no test tools");
            session
                .states
                .insert(reference, PopulationState::FullyPopulated);
            return PopulationState::FullyPopulated;
        }

        session
            .states
            .insert(reference.clone(), PopulationState::PartiallyPopulated);

        let top = session.registry.get_or_create(&mut session.tree, &tools);
        session.tree.register_element(top, reference.clone());
        tracing::debug!(
            assembly = %reference,
            tool_count = tools.len(),
            top_level = %session.tree.test_id(top),
            "assembly attached to top-level test"
        );

        self.initialize_assembly(session, top, assembly);

        let element = CodeElement::Assembly(assembly.clone());
        self.bootstrap
            .consume(&mut session.tree.builder(top), &element, skip_children);

        PopulationState::PartiallyPopulated
    }

    /// Merge the tools every extension reports, isolating faulty extensions
    fn referenced_tools(&self, session: &mut ExplorationSession, assembly: &Arc<dyn AssemblyInfo>) -> ToolSet {
        let mut tools = Vec::new();

        for (index, extension) in self.extensions.iter().enumerate() {
            let result = panic::catch_unwind(AssertUnwindSafe(|| extension.referenced_tools(&**assembly)));
            let error = match result {
                Ok(Ok(found)) => {
                    tools.extend(found);
                    continue;
                }
                Ok(Err(e)) => e.to_string(),
                Err(payload) => Failure::from_panic(payload).to_string(),
            };

            tracing::warn!(assembly = %assembly.name(), extension = index, error = %error, "{}", EXTENSION_FAULT);
            if self.settings.report_extension_faults {
                session.diagnostics.push(ExplorationDiagnostic {
                    assembly: assembly.code_reference(),
                    message: format!("{} {}", EXTENSION_FAULT, error),
                });
            }
        }

        ToolSet::new(tools)
    }

    /// Run the assembly's initialization hooks against its top-level builder
    fn initialize_assembly(&self, session: &mut ExplorationSession, top: BuilderId, assembly: &Arc<dyn AssemblyInfo>) {
        for init in attributes_of::<AssemblyInitialization>(assembly.attributes()) {
            let result = {
                let mut builder = session.tree.builder(top);
                panic::catch_unwind(AssertUnwindSafe(|| init.initialize(&mut builder, &**assembly)))
            };
            let failure = match result {
                Ok(Ok(())) => continue,
                Ok(Err(failure)) => failure,
                Err(payload) => Failure::from_panic(payload),
            };

            tracing::warn!(
                assembly = %assembly.name(),
                hook = init.name(),
                error = %failure,
                "assembly initialization failed"
            );
            session.tree.add_error_node(
                Some(assembly.code_reference()),
                format!("Error initializing assembly '{}'", assembly.name()),
                &failure,
            );
        }
    }
}

impl fmt::Debug for PatternTestExplorer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let session = self.lock();
        f.debug_struct("PatternTestExplorer")
            .field("extensions", &self.extensions.len())
            .field("assemblies", &session.states.len())
            .field("top_level", &session.registry.len())
            .field("tree", &session.tree)
            .finish()
    }
}

fn build_all(tree: &BuilderTree, ids: Vec<BuilderId>) -> Vec<Arc<TestNode>> {
    ids.into_iter().map(|id| tree.build_node(id)).collect()
}
