//! The test model: a root test plus a lazily built index by id
//!
//! The index is built on first access after the root changes and is handed
//! out as a shared snapshot. Building the index and replacing the root take
//! the same lock, so a reader never sees an index for a stale root.

use crate::error::{ModelError, ModelResult};
use crate::model::node::TestNode;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Snapshot of every node in a tree keyed by id
pub type TestIndex = HashMap<String, Arc<TestNode>>;

struct ModelState {
    root: Arc<TestNode>,
    tests: Option<Arc<TestIndex>>,
}

/// The root of a test tree and its index by id
///
/// Safe to share between threads.
pub struct TestModel {
    state: Mutex<ModelState>,
}

impl TestModel {
    /// Create a model around a root test
    pub fn new(root: impl Into<Arc<TestNode>>) -> Self {
        Self {
            state: Mutex::new(ModelState {
                root: root.into(),
                tests: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ModelState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The current root test
    pub fn root_test(&self) -> Arc<TestNode> {
        self.lock().root.clone()
    }

    /// Replace the root test, invalidating the index
    pub fn set_root_test(&self, root: impl Into<Arc<TestNode>>) {
        let mut state = self.lock();
        state.root = root.into();
        state.tests = None;
    }

    /// Index of every node reachable from the root, keyed by id
    ///
    /// Fails with [`ModelError::DuplicateId`] when two nodes share an id.
    pub fn tests(&self) -> ModelResult<Arc<TestIndex>> {
        let mut state = self.lock();

        if let Some(tests) = &state.tests {
            return Ok(tests.clone());
        }

        let tests = Arc::new(index_tree(&state.root)?);
        state.tests = Some(tests.clone());
        Ok(tests)
    }

    /// Look up a node by id
    pub fn get(&self, id: &str) -> ModelResult<Option<Arc<TestNode>>> {
        Ok(self.tests()?.get(id).cloned())
    }

    /// Resolve a node's parent through the index
    pub fn parent_of(&self, node: &TestNode) -> ModelResult<Option<Arc<TestNode>>> {
        match &node.parent_id {
            Some(parent_id) => self.get(parent_id),
            None => Ok(None),
        }
    }
}

impl std::fmt::Debug for TestModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("TestModel")
            .field("root", &state.root.id)
            .field("indexed", &state.tests.is_some())
            .finish()
    }
}

/// Pre-order walk collecting every node by id
fn index_tree(root: &Arc<TestNode>) -> ModelResult<TestIndex> {
    let mut tests = TestIndex::new();
    let mut stack = vec![root.clone()];

    while let Some(node) = stack.pop() {
        stack.extend(node.children.iter().rev().cloned());

        let id = node.id.clone();
        if tests.insert(id.clone(), node).is_some() {
            return Err(ModelError::DuplicateId { id });
        }
    }

    Ok(tests)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::node::TestKind;
    use std::thread;

    fn sample_tree() -> TestNode {
        TestNode::new("root", "Root", TestKind::Root).with_child(
            TestNode::new("fx", "Fixture", TestKind::Fixture)
                .with_child(TestNode::new("t1", "One", TestKind::Test))
                .with_child(TestNode::new("t2", "Two", TestKind::Test)),
        )
    }

    #[test]
    fn test_index_covers_every_node() {
        let model = TestModel::new(sample_tree());
        let tests = model.tests().unwrap();

        assert_eq!(tests.len(), 4);
        for id in ["root", "fx", "t1", "t2"] {
            assert_eq!(tests[id].id, id);
        }
    }

    #[test]
    fn test_index_is_cached() {
        let model = TestModel::new(sample_tree());
        let first = model.tests().unwrap();
        let second = model.tests().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_set_root_invalidates_index() {
        let model = TestModel::new(sample_tree());
        let before = model.tests().unwrap();
        assert!(before.contains_key("t1"));

        model.set_root_test(TestNode::new("other", "Other", TestKind::Root));
        let after = model.tests().unwrap();

        assert_eq!(after.len(), 1);
        assert!(!after.contains_key("t1"));
        // Old snapshots stay intact for holders
        assert_eq!(before.len(), 4);
    }

    #[test]
    fn test_duplicate_id_is_fatal() {
        let root = TestNode::new("root", "Root", TestKind::Root)
            .with_child(TestNode::new("same", "A", TestKind::Test))
            .with_child(TestNode::new("same", "B", TestKind::Test));
        let model = TestModel::new(root);

        assert_eq!(
            model.tests().unwrap_err(),
            ModelError::DuplicateId {
                id: "same".to_string()
            }
        );
        // Still fatal on retry
        assert!(model.tests().is_err());
    }

    #[test]
    fn test_parent_of() {
        let model = TestModel::new(sample_tree());
        let t1 = model.get("t1").unwrap().unwrap();

        let parent = model.parent_of(&t1).unwrap().unwrap();
        assert_eq!(parent.id, "fx");
        assert!(model.parent_of(&model.root_test()).unwrap().is_none());
    }

    #[test]
    fn test_concurrent_readers() {
        let model = Arc::new(TestModel::new(sample_tree()));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let model = Arc::clone(&model);
                thread::spawn(move || {
                    if i % 4 == 0 {
                        model.set_root_test(sample_tree());
                    }
                    model.tests().unwrap().len()
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 4);
        }
    }
}
