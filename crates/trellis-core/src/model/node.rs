//! Finalized test nodes

use crate::outcome::Failure;
use crate::reflect::CodeReference;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Executable test logic attached to a leaf
pub type TestAction = Arc<dyn Fn() -> Result<(), Failure> + Send + Sync>;

/// Ordered multi-valued metadata
pub type Metadata = BTreeMap<String, Vec<String>>;

/// Metadata key holding a human readable description
pub const DESCRIPTION_KEY: &str = "description";

/// What a node in the test tree represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TestKind {
    Root,
    /// One distinct combination of referenced tools
    Framework,
    Assembly,
    Namespace,
    Fixture,
    Suite,
    Test,
    /// Synthetic node describing a discovery failure
    Error,
}

impl fmt::Display for TestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TestKind::Root => "Root",
            TestKind::Framework => "Framework",
            TestKind::Assembly => "Assembly",
            TestKind::Namespace => "Namespace",
            TestKind::Fixture => "Fixture",
            TestKind::Suite => "Suite",
            TestKind::Test => "Test",
            TestKind::Error => "Error",
        };
        f.write_str(s)
    }
}

/// A node of the finalized test tree
///
/// The parent is recorded by id only; resolve it through
/// [`crate::model::TestModel::parent_of`].
#[derive(Clone, Serialize)]
pub struct TestNode {
    pub id: String,
    pub name: String,
    pub kind: TestKind,
    pub baseline_local_id: String,
    /// Baseline local id made unique among siblings
    pub local_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_reference: Option<CodeReference>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: Metadata,
    #[serde(skip)]
    pub action: Option<TestAction>,
    pub children: Vec<Arc<TestNode>>,
}

impl TestNode {
    /// A node with no children, metadata or action
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: TestKind) -> Self {
        let name = name.into();
        Self {
            id: id.into(),
            baseline_local_id: name.clone(),
            local_id: name.clone(),
            name,
            kind,
            parent_id: None,
            code_reference: None,
            metadata: Metadata::new(),
            action: None,
            children: Vec::new(),
        }
    }

    /// Append a child, recording this node as its parent
    pub fn with_child(mut self, mut child: TestNode) -> Self {
        child.parent_id = Some(self.id.clone());
        self.children.push(Arc::new(child));
        self
    }

    /// Attach executable logic
    pub fn with_action<F>(mut self, action: F) -> Self
    where
        F: Fn() -> Result<(), Failure> + Send + Sync + 'static,
    {
        self.action = Some(Arc::new(action));
        self
    }

    /// Whether the node has executable logic
    pub fn is_test_case(&self) -> bool {
        self.action.is_some()
    }

    /// First value stored under a metadata key
    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Find a direct child by name
    pub fn child_named(&self, name: &str) -> Option<&Arc<TestNode>> {
        self.children.iter().find(|c| c.name == name)
    }

    /// This node and all descendants, parents before children
    pub fn pre_order(&self) -> PreOrder<'_> {
        PreOrder { stack: vec![self] }
    }
}

impl fmt::Debug for TestNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestNode")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("local_id", &self.local_id)
            .field("parent_id", &self.parent_id)
            .field("is_test_case", &self.is_test_case())
            .field("children", &self.children)
            .finish()
    }
}

/// Pre-order traversal of a node's subtree
pub struct PreOrder<'a> {
    stack: Vec<&'a TestNode>,
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = &'a TestNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack
            .extend(node.children.iter().rev().map(|child| child.as_ref()));
        Some(node)
    }
}
