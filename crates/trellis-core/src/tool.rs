//! Referenced testing tools and the tool-set identity of top-level tests

use crate::hash::Hash64;
use serde::Serialize;

/// Seed tag folded into every top-level test id
pub const TOP_LEVEL_TAG: &str = "PatternTestFramework";

/// A testing tool (framework or convention) referenced by an assembly
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ToolInfo {
    /// Stable identifier, used for ordering and hashing
    pub id: String,
    /// Display name
    pub name: String,
}

impl ToolInfo {
    /// Create a tool description
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// The tools referenced by one assembly, sorted by id with duplicates removed
///
/// Two assemblies that reference the same tools produce equal sets no matter
/// which extension reported which tool, or in what order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ToolSet {
    tools: Vec<ToolInfo>,
}

impl ToolSet {
    /// Build a set from tools in any order
    pub fn new(mut tools: Vec<ToolInfo>) -> Self {
        // Stable sort: the first contribution of a duplicated id wins
        tools.sort_by(|a, b| a.id.cmp(&b.id));
        tools.dedup_by(|later, earlier| later.id == earlier.id);
        Self { tools }
    }

    /// Whether no tools are referenced
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Number of distinct tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Tools in id order
    pub fn tools(&self) -> &[ToolInfo] {
        &self.tools
    }

    /// Deterministic id of the top-level test for this set
    pub fn top_level_id(&self) -> String {
        self.tools
            .iter()
            .fold(Hash64::new().add(TOP_LEVEL_TAG), |hash, tool| {
                hash.add(&tool.id)
            })
            .to_string()
    }

    /// Display name of the top-level test: tool names joined in id order
    pub fn top_level_name(&self) -> String {
        self.tools
            .iter()
            .map(|t| t.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl FromIterator<ToolInfo> for ToolSet {
    fn from_iter<I: IntoIterator<Item = ToolInfo>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn mbunit() -> ToolInfo {
        ToolInfo::new("MbUnit", "MbUnit v3")
    }

    fn xunit() -> ToolInfo {
        ToolInfo::new("Xunit", "xUnit.net")
    }

    #[test]
    fn test_sorted_by_id() {
        let set = ToolSet::new(vec![xunit(), mbunit()]);
        let ids: Vec<_> = set.tools().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["MbUnit", "Xunit"]);
    }

    #[test]
    fn test_name_joins_in_id_order() {
        let set = ToolSet::new(vec![xunit(), mbunit()]);
        assert_eq!(set.top_level_name(), "MbUnit v3, xUnit.net");
    }

    #[rstest]
    #[case(vec![mbunit(), xunit()])]
    #[case(vec![xunit(), mbunit()])]
    #[case(vec![xunit(), mbunit(), xunit()])]
    fn test_id_independent_of_order_and_duplicates(#[case] tools: Vec<ToolInfo>) {
        let reference = ToolSet::new(vec![mbunit(), xunit()]);
        let set = ToolSet::new(tools);
        assert_eq!(set, reference);
        assert_eq!(set.top_level_id(), reference.top_level_id());
    }

    #[test]
    fn test_different_sets_differ() {
        let one = ToolSet::new(vec![mbunit()]);
        let two = ToolSet::new(vec![mbunit(), xunit()]);
        assert_ne!(one.top_level_id(), two.top_level_id());
    }

    #[test]
    fn test_empty_set() {
        let set: ToolSet = std::iter::empty().collect();
        assert!(set.is_empty());
        assert_eq!(set.top_level_name(), "");
        assert_eq!(set.top_level_id(), Hash64::new().add(TOP_LEVEL_TAG).to_string());
    }
}
