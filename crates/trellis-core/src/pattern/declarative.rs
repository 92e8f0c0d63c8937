//! Attribute-driven pattern resolution

use crate::pattern::{Pattern, PatternResolver};
use crate::reflect::{attributes_of, CodeElement};
use std::fmt;
use std::sync::Arc;

/// Attribute declaring that a pattern applies to the element carrying it
#[derive(Clone)]
pub struct PatternAttribute(pub Arc<dyn Pattern>);

impl PatternAttribute {
    pub fn new<P: Pattern + 'static>(pattern: P) -> Self {
        Self(Arc::new(pattern))
    }

    pub fn shared(pattern: Arc<dyn Pattern>) -> Self {
        Self(pattern)
    }
}

impl fmt::Debug for PatternAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PatternAttribute")
    }
}

/// Resolves the patterns declared on an element through [`PatternAttribute`]s
#[derive(Debug, Default, Clone, Copy)]
pub struct DeclarativePatternResolver;

impl PatternResolver for DeclarativePatternResolver {
    fn patterns_for(&self, element: &CodeElement) -> Vec<Arc<dyn Pattern>> {
        attributes_of::<PatternAttribute>(element.attributes())
            .map(|attribute| attribute.0.clone())
            .collect()
    }
}
