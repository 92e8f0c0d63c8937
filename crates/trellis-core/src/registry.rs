//! Top-level test registry
//!
//! Assemblies referencing the same set of tools share one top-level test.
//! The registry maps a tool set's id to the builder created for it.

use crate::builder::{BuilderId, BuilderTree, TestSpec};
use crate::model::TestKind;
use crate::tool::ToolSet;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct TopLevelRegistry {
    builders: HashMap<String, BuilderId>,
}

impl TopLevelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The builder for a tool set, created under the root on first request
    ///
    /// The new test is named after the tools and uses the tool set id as its
    /// baseline local id.
    pub fn get_or_create(&mut self, tree: &mut BuilderTree, tools: &ToolSet) -> BuilderId {
        let key = tools.top_level_id();
        if let Some(id) = self.builders.get(&key) {
            return *id;
        }

        let name = tools.top_level_name();
        let id = tree.add_top_level(TestSpec::new(name.clone(), TestKind::Framework).baseline_local_id(key.clone()));
        tracing::debug!(top_level = %name, id = %key, "created top-level test");

        self.builders.insert(key, id);
        id
    }

    pub fn get(&self, tools: &ToolSet) -> Option<BuilderId> {
        self.builders.get(&tools.top_level_id()).copied()
    }

    /// Builders in no particular order
    pub fn builders(&self) -> impl Iterator<Item = BuilderId> + '_ {
        self.builders.values().copied()
    }

    pub fn len(&self) -> usize {
        self.builders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.builders.is_empty()
    }
}
