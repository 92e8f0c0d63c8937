//! Construction-time test tree
//!
//! Discovery grows a [`BuilderTree`]: an arena of nodes under construction,
//! each with a [`PopulateChain`] that fills in its children on demand,
//! for everything or narrowed to one assembly or one type
//! ([`PopulateScope`]).
//! Patterns work through a [`TestBuilder`], a mutable handle on one node.
//! [`BuilderTree::build_node`] snapshots a subtree into finalized
//! [`TestNode`]s.
//!
//! Ids are derived from the parent's id and the node's local id, so the
//! same discovery always yields the same ids and an id is never handed out
//! twice within one tree.

use crate::hash::Hash64;
use crate::model::{Metadata, TestAction, TestKind, TestNode, DESCRIPTION_KEY};
use crate::outcome::{Failure, TestOutcome};
use crate::pattern::PatternResolver;
use crate::reflect::{CodeReference, TypeInfo};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// Tag hashed into the root test id
pub const ROOT_TAG: &str = "Root";

/// Handle to a node in a [`BuilderTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BuilderId(usize);

/// What a populate chain run covers
///
/// Top-level builders are shared by every assembly with the same tool set,
/// so a full run is always narrowed to the assembly being explored.
#[derive(Debug, Clone, Copy)]
pub enum PopulateScope<'s> {
    /// Everything the chain knows about
    All,
    /// Only what one assembly contributes
    Assembly(&'s CodeReference),
    /// Only what one type contributes
    Type(&'s Arc<dyn TypeInfo>),
}

impl PopulateScope<'_> {
    /// Whether an element of `assembly` falls inside this scope
    pub fn covers_assembly(&self, assembly: &str) -> bool {
        match self {
            PopulateScope::All => true,
            PopulateScope::Assembly(reference) => reference.assembly == assembly,
            PopulateScope::Type(ty) => ty.code_reference().assembly == assembly,
        }
    }
}

/// One link of a populate chain
pub type PopulateAction = Arc<dyn Fn(&mut TestBuilder<'_>, PopulateScope<'_>) + Send + Sync>;

/// Deferred "populate children" logic of a builder, run in insertion order
#[derive(Clone, Default)]
pub struct PopulateChain {
    actions: Vec<PopulateAction>,
}

impl PopulateChain {
    /// Append an action to run after the existing ones
    pub fn after<F>(&mut self, action: F)
    where
        F: Fn(&mut TestBuilder<'_>, PopulateScope<'_>) + Send + Sync + 'static,
    {
        self.actions.push(Arc::new(action));
    }

    /// Append a shared action
    pub fn after_shared(&mut self, action: PopulateAction) {
        self.actions.push(action);
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }
}

impl fmt::Debug for PopulateChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PopulateChain")
            .field("actions", &self.actions.len())
            .finish()
    }
}

/// Parameters of a node to add to the tree
pub struct TestSpec {
    name: String,
    kind: TestKind,
    baseline_local_id: Option<String>,
    code_reference: Option<CodeReference>,
    metadata: Metadata,
    action: Option<TestAction>,
}

impl TestSpec {
    pub fn new(name: impl Into<String>, kind: TestKind) -> Self {
        Self {
            name: name.into(),
            kind,
            baseline_local_id: None,
            code_reference: None,
            metadata: Metadata::new(),
            action: None,
        }
    }

    /// Preferred local id; defaults to the name
    pub fn baseline_local_id(mut self, id: impl Into<String>) -> Self {
        self.baseline_local_id = Some(id.into());
        self
    }

    /// Code element the node was derived from
    pub fn code_reference(mut self, reference: CodeReference) -> Self {
        self.code_reference = Some(reference);
        self
    }

    /// Add a metadata value
    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.entry(key.into()).or_default().push(value.into());
        self
    }

    /// Executable logic for a leaf
    pub fn action<F>(self, action: F) -> Self
    where
        F: Fn() -> Result<(), Failure> + Send + Sync + 'static,
    {
        self.shared_action(Arc::new(action))
    }

    pub fn shared_action(mut self, action: TestAction) -> Self {
        self.action = Some(action);
        self
    }
}

struct BuilderNode {
    id: String,
    name: String,
    kind: TestKind,
    baseline_local_id: String,
    local_id: String,
    parent: Option<BuilderId>,
    children: Vec<BuilderId>,
    /// Local ids taken by `children`
    child_local_ids: HashSet<String>,
    /// Next counter to try per duplicated baseline
    next_suffix: HashMap<String, usize>,
    code_reference: Option<CodeReference>,
    metadata: Metadata,
    action: Option<TestAction>,
    chain: PopulateChain,
}

/// Arena of builders rooted at a single root test
pub struct BuilderTree {
    nodes: Vec<BuilderNode>,
    by_element: HashMap<CodeReference, Vec<BuilderId>>,
    resolver: Arc<dyn PatternResolver>,
}

impl BuilderTree {
    /// Create a tree holding only the root test
    pub fn new(resolver: Arc<dyn PatternResolver>) -> Self {
        let root = BuilderNode {
            id: Hash64::new().add(ROOT_TAG).to_string(),
            name: ROOT_TAG.to_string(),
            kind: TestKind::Root,
            baseline_local_id: ROOT_TAG.to_string(),
            local_id: ROOT_TAG.to_string(),
            parent: None,
            children: Vec::new(),
            child_local_ids: HashSet::new(),
            next_suffix: HashMap::new(),
            code_reference: None,
            metadata: Metadata::new(),
            action: None,
            chain: PopulateChain::default(),
        };

        Self {
            nodes: vec![root],
            by_element: HashMap::new(),
            resolver,
        }
    }

    pub fn root_id(&self) -> BuilderId {
        BuilderId(0)
    }

    /// Number of builders, root included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn resolver(&self) -> Arc<dyn PatternResolver> {
        self.resolver.clone()
    }

    /// Mutable handle on a builder
    ///
    /// # Panics
    ///
    /// Panics if `id` was issued by another tree.
    pub fn builder(&mut self, id: BuilderId) -> TestBuilder<'_> {
        assert!(id.0 < self.nodes.len(), "builder id {:?} out of range", id);
        TestBuilder { tree: self, id }
    }

    pub fn root(&mut self) -> TestBuilder<'_> {
        let id = self.root_id();
        self.builder(id)
    }

    /// Add a top-level test directly under the root
    pub fn add_top_level(&mut self, spec: TestSpec) -> BuilderId {
        let root = self.root_id();
        self.add_node(root, spec, false)
    }

    /// Add a synthetic error test under the root
    ///
    /// Running the error test fails with the recorded failure text.
    pub fn add_error_node(
        &mut self,
        code_reference: Option<CodeReference>,
        message: impl Into<String>,
        failure: &Failure,
    ) -> BuilderId {
        let message = message.into();
        let detail = failure.to_string();
        let report = format!("{}: {}", message, detail);

        let mut spec = TestSpec::new(message, TestKind::Error)
            .metadata(DESCRIPTION_KEY, detail)
            .action(move || Err(Failure::with_outcome(TestOutcome::error(), report.clone())));
        if let Some(reference) = code_reference {
            spec = spec.code_reference(reference);
        }

        let root = self.root_id();
        self.add_node(root, spec, false)
    }

    /// Builders registered for a code element, in registration order
    pub fn builders_for(&self, reference: &CodeReference) -> Vec<BuilderId> {
        self.by_element.get(reference).cloned().unwrap_or_default()
    }

    /// Register a builder as contributing tests for a code element
    pub fn register_element(&mut self, id: BuilderId, reference: CodeReference) {
        let builders = self.by_element.entry(reference).or_default();
        if !builders.contains(&id) {
            builders.push(id);
        }
    }

    /// Id of the test a builder produces
    pub fn test_id(&self, id: BuilderId) -> &str {
        &self.nodes[id.0].id
    }

    /// Snapshot a builder and its subtree as finalized nodes
    pub fn build_node(&self, id: BuilderId) -> Arc<TestNode> {
        let node = &self.nodes[id.0];

        Arc::new(TestNode {
            id: node.id.clone(),
            name: node.name.clone(),
            kind: node.kind,
            baseline_local_id: node.baseline_local_id.clone(),
            local_id: node.local_id.clone(),
            parent_id: node.parent.map(|p| self.nodes[p.0].id.clone()),
            code_reference: node.code_reference.clone(),
            metadata: node.metadata.clone(),
            action: node.action.clone(),
            children: node.children.iter().map(|c| self.build_node(*c)).collect(),
        })
    }

    /// Snapshot the whole tree
    pub fn build_root(&self) -> Arc<TestNode> {
        self.build_node(self.root_id())
    }

    fn add_node(&mut self, parent: BuilderId, spec: TestSpec, register: bool) -> BuilderId {
        let baseline_local_id = spec.baseline_local_id.unwrap_or_else(|| spec.name.clone());
        let local_id = self.unique_local_id(parent, &baseline_local_id);
        let id = Hash64::new()
            .add(&self.nodes[parent.0].id)
            .add(&local_id)
            .to_string();

        let builder_id = BuilderId(self.nodes.len());
        self.nodes.push(BuilderNode {
            id,
            name: spec.name,
            kind: spec.kind,
            baseline_local_id,
            local_id,
            parent: Some(parent),
            children: Vec::new(),
            child_local_ids: HashSet::new(),
            next_suffix: HashMap::new(),
            code_reference: spec.code_reference.clone(),
            metadata: spec.metadata,
            action: spec.action,
            chain: PopulateChain::default(),
        });
        self.nodes[parent.0].children.push(builder_id);

        if register {
            if let Some(reference) = spec.code_reference {
                self.register_element(builder_id, reference);
            }
        }

        builder_id
    }

    /// Claim the baseline id under `parent`, suffixed with a counter if a
    /// sibling already uses it
    fn unique_local_id(&mut self, parent: BuilderId, baseline: &str) -> String {
        let node = &mut self.nodes[parent.0];
        if node.child_local_ids.insert(baseline.to_string()) {
            return baseline.to_string();
        }

        let next = node.next_suffix.entry(baseline.to_string()).or_insert(2);
        loop {
            let candidate = format!("{}{}", baseline, next);
            *next += 1;
            if node.child_local_ids.insert(candidate.clone()) {
                return candidate;
            }
        }
    }
}

impl fmt::Debug for BuilderTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuilderTree")
            .field("nodes", &self.nodes.len())
            .field("elements", &self.by_element.len())
            .finish()
    }
}

/// Mutable handle on one node of a [`BuilderTree`]
pub struct TestBuilder<'a> {
    tree: &'a mut BuilderTree,
    id: BuilderId,
}

impl<'a> TestBuilder<'a> {
    pub fn id(&self) -> BuilderId {
        self.id
    }

    fn node(&self) -> &BuilderNode {
        &self.tree.nodes[self.id.0]
    }

    fn node_mut(&mut self) -> &mut BuilderNode {
        &mut self.tree.nodes[self.id.0]
    }

    /// Id of the test under construction
    pub fn test_id(&self) -> &str {
        &self.node().id
    }

    pub fn name(&self) -> &str {
        &self.node().name
    }

    pub fn kind(&self) -> TestKind {
        self.node().kind
    }

    pub fn local_id(&self) -> &str {
        &self.node().local_id
    }

    pub fn code_reference(&self) -> Option<&CodeReference> {
        self.node().code_reference.as_ref()
    }

    pub fn parent(&self) -> Option<BuilderId> {
        self.node().parent
    }

    pub fn children(&self) -> &[BuilderId] {
        &self.node().children
    }

    /// Resolver patterns use to look up patterns for nested elements
    pub fn resolver(&self) -> Arc<dyn PatternResolver> {
        self.tree.resolver()
    }

    /// Add a metadata value
    pub fn add_metadata(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.node_mut()
            .metadata
            .entry(key.into())
            .or_default()
            .push(value.into());
    }

    /// Attach or replace executable logic
    pub fn set_action<F>(&mut self, action: F)
    where
        F: Fn() -> Result<(), Failure> + Send + Sync + 'static,
    {
        self.node_mut().action = Some(Arc::new(action));
    }

    /// Add a child and register it for its code element
    pub fn add_child(&mut self, spec: TestSpec) -> BuilderId {
        self.tree.add_node(self.id, spec, true)
    }

    /// Add a child and return a handle on it
    pub fn create_child(&mut self, spec: TestSpec) -> TestBuilder<'_> {
        let id = self.add_child(spec);
        TestBuilder {
            tree: &mut *self.tree,
            id,
        }
    }

    /// Handle on another builder of the same tree
    pub fn builder(&mut self, id: BuilderId) -> TestBuilder<'_> {
        self.tree.builder(id)
    }

    /// Register this builder for an additional code element
    pub fn register_element(&mut self, reference: CodeReference) {
        self.tree.register_element(self.id, reference);
    }

    /// The deferred logic that populates this builder's children
    pub fn populate_children_chain(&mut self) -> &mut PopulateChain {
        &mut self.node_mut().chain
    }

    /// Run the populate chain over `scope`
    ///
    /// Actions appended while the chain runs take effect on the next call.
    pub fn populate_children(&mut self, scope: PopulateScope<'_>) {
        let chain = self.node().chain.clone();
        for action in &chain.actions {
            action(&mut *self, scope);
        }
    }

    /// Snapshot of this builder's subtree
    pub fn build(&self) -> Arc<TestNode> {
        self.tree.build_node(self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::DeclarativePatternResolver;
    use crate::reflect::memory::{AssemblyDef, TypeDef};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn tree() -> BuilderTree {
        BuilderTree::new(Arc::new(DeclarativePatternResolver))
    }

    #[test]
    fn test_root_id_is_deterministic() {
        assert_eq!(tree().build_root().id, tree().build_root().id);
        assert_eq!(tree().build_root().kind, TestKind::Root);
    }

    #[test]
    fn test_sibling_local_ids_are_unique() {
        let mut tree = tree();
        let mut root = tree.root();
        let a = root.add_child(TestSpec::new("Fixture", TestKind::Fixture));
        let b = root.add_child(TestSpec::new("Fixture", TestKind::Fixture));
        let c = root.add_child(TestSpec::new("Other", TestKind::Fixture).baseline_local_id("Fixture"));

        let locals: Vec<_> = [a, b, c]
            .iter()
            .map(|id| tree.builder(*id).local_id().to_string())
            .collect();
        assert_eq!(locals, vec!["Fixture", "Fixture2", "Fixture3"]);

        let ids: HashSet<_> = [a, b, c].iter().map(|id| tree.test_id(*id).to_string()).collect();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn test_same_position_same_id() {
        let mut first = tree();
        let mut second = tree();
        let a = first.add_top_level(TestSpec::new("MbUnit", TestKind::Framework));
        let b = second.add_top_level(TestSpec::new("MbUnit", TestKind::Framework));
        assert_eq!(first.test_id(a), second.test_id(b));
    }

    #[test]
    fn test_add_child_registers_code_element() {
        let mut tree = tree();
        let reference = CodeReference::for_type("Asm", "Fixture");
        let top = tree.add_top_level(TestSpec::new("Framework", TestKind::Framework));
        let child = tree
            .builder(top)
            .add_child(TestSpec::new("Fixture", TestKind::Fixture).code_reference(reference.clone()));

        assert_eq!(tree.builders_for(&reference), vec![child]);
        // Top-level nodes are registered explicitly, never implicitly
        assert!(tree.builders_for(&CodeReference::for_assembly("Asm")).is_empty());
    }

    #[test]
    fn test_build_snapshot_links_parents() {
        let mut tree = tree();
        let top = tree.add_top_level(TestSpec::new("Framework", TestKind::Framework));
        {
            let mut builder = tree.builder(top);
            let mut fixture = builder.create_child(TestSpec::new("Fixture", TestKind::Fixture));
            fixture.add_child(TestSpec::new("Case", TestKind::Test).action(|| Ok(())));
        }

        let root = tree.build_root();
        let framework = root.child_named("Framework").unwrap();
        let fixture = framework.child_named("Fixture").unwrap();
        let case = fixture.child_named("Case").unwrap();

        assert_eq!(framework.parent_id.as_deref(), Some(root.id.as_str()));
        assert_eq!(case.parent_id.as_deref(), Some(fixture.id.as_str()));
        assert!(case.is_test_case());
    }

    #[test]
    fn test_populate_chain_runs_in_order_with_scope() {
        let assembly = AssemblyDef::new("Asm").ty(TypeDef::new("Fixture")).build();
        let ty = crate::reflect::AssemblyInfo::types(assembly.as_ref()).remove(0);

        let mut tree = tree();
        let top = tree.add_top_level(TestSpec::new("Framework", TestKind::Framework));
        let calls = Arc::new(AtomicUsize::new(0));

        {
            let mut builder = tree.builder(top);
            let counter = calls.clone();
            builder
                .populate_children_chain()
                .after(move |builder: &mut TestBuilder<'_>, scope: PopulateScope<'_>| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    let name = match scope {
                        PopulateScope::All => "all".to_string(),
                        PopulateScope::Assembly(reference) => reference.assembly.clone(),
                        PopulateScope::Type(ty) => ty.name().to_string(),
                    };
                    builder.add_child(TestSpec::new(name, TestKind::Suite));
                });
            assert_eq!(builder.populate_children_chain().len(), 1);

            builder.populate_children(PopulateScope::All);
            builder.populate_children(PopulateScope::Assembly(&CodeReference::for_assembly("Asm")));
            builder.populate_children(PopulateScope::Type(&ty));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        let framework = tree.build_node(top);
        let names: Vec<_> = framework.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["all", "Asm", "Fixture"]);
    }

    #[test]
    fn test_scope_covers_assembly() {
        let assembly = AssemblyDef::new("Asm").ty(TypeDef::new("Fixture")).build();
        let ty = crate::reflect::AssemblyInfo::types(assembly.as_ref()).remove(0);
        let own = CodeReference::for_assembly("Asm");

        assert!(PopulateScope::All.covers_assembly("Other"));
        assert!(PopulateScope::Assembly(&own).covers_assembly("Asm"));
        assert!(!PopulateScope::Assembly(&own).covers_assembly("Other"));
        assert!(PopulateScope::Type(&ty).covers_assembly("Asm"));
        assert!(!PopulateScope::Type(&ty).covers_assembly("Other"));
    }

    #[test]
    fn test_many_duplicate_siblings_get_sequential_ids() {
        let mut tree = tree();
        let mut root = tree.root();
        root.add_child(TestSpec::new("Fixture2", TestKind::Fixture));
        let ids: Vec<_> = (0..500)
            .map(|_| root.add_child(TestSpec::new("Fixture", TestKind::Fixture)))
            .collect();

        let locals: Vec<_> = ids
            .iter()
            .map(|id| tree.builder(*id).local_id().to_string())
            .collect();
        assert_eq!(locals[0], "Fixture");
        // "Fixture2" was taken by an explicit sibling
        assert_eq!(locals[1], "Fixture3");
        assert_eq!(locals[499], "Fixture501");

        let unique: HashSet<_> = locals.iter().collect();
        assert_eq!(unique.len(), 500);
    }

    #[test]
    fn test_error_node_fails_when_run() {
        let mut tree = tree();
        let id = tree.add_error_node(
            Some(CodeReference::for_assembly("Asm")),
            "Error initializing assembly 'Asm'",
            &Failure::message("hook exploded"),
        );

        let node = tree.build_node(id);
        assert_eq!(node.kind, TestKind::Error);
        assert_eq!(node.metadata_value(DESCRIPTION_KEY), Some("hook exploded"));

        let err = (node.action.as_ref().unwrap())().unwrap_err();
        assert_eq!(err.outcome(), TestOutcome::error());
        assert!(err.to_string().contains("hook exploded"));
    }
}
