//! Entry point pattern applied to every assembly
//!
//! The bootstrap pattern does not create nodes of its own. Consuming an
//! assembly hands each of its types to the patterns the resolver finds for
//! them, either right away or lazily through the top-level builder's
//! populate chain. Each type is consumed at most once per assembly, no
//! matter how often or in which scope the chain runs. A deferred action
//! only answers scopes that cover its own assembly, since other assemblies
//! may share the same top-level builder.

use crate::builder::{PopulateAction, PopulateScope, TestBuilder};
use crate::pattern::{Pattern, PatternResolver};
use crate::reflect::{AssemblyInfo, CodeElement, CodeReference, TypeInfo};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug, Default, Clone, Copy)]
pub struct BootstrapAssemblyPattern;

impl BootstrapAssemblyPattern {
    pub fn new() -> Self {
        Self
    }
}

impl Pattern for BootstrapAssemblyPattern {
    fn is_test(&self, resolver: &dyn PatternResolver, element: &CodeElement) -> bool {
        resolver
            .patterns_for(element)
            .iter()
            .any(|pattern| pattern.is_test(resolver, element))
    }

    fn consume(&self, builder: &mut TestBuilder<'_>, element: &CodeElement, skip_children: bool) {
        let Some(assembly) = element.as_assembly() else {
            tracing::debug!(element = %element.code_reference(), "bootstrap ignores non-assembly element");
            return;
        };

        let populate = populate_assembly(assembly.clone());
        if skip_children {
            builder.populate_children_chain().after_shared(populate);
        } else {
            let reference = assembly.code_reference();
            populate(builder, PopulateScope::Assembly(&reference));
        }
    }
}

/// Chain action consuming the types of one assembly
fn populate_assembly(assembly: Arc<dyn AssemblyInfo>) -> PopulateAction {
    let assembly_name = assembly.code_reference().assembly;
    let populated: Mutex<HashSet<CodeReference>> = Mutex::new(HashSet::new());

    Arc::new(move |builder: &mut TestBuilder<'_>, scope: PopulateScope<'_>| {
        if !scope.covers_assembly(&assembly_name) {
            return;
        }
        let types = match scope {
            PopulateScope::Type(ty) => vec![ty.clone()],
            PopulateScope::All | PopulateScope::Assembly(_) => assembly.types(),
        };
        for ty in types {
            if mark_populated(&populated, &ty) {
                consume_type(builder, &ty);
            }
        }
    })
}

/// Record a type as populated; false if it already was
fn mark_populated(populated: &Mutex<HashSet<CodeReference>>, ty: &Arc<dyn TypeInfo>) -> bool {
    populated
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(ty.code_reference())
}

fn consume_type(builder: &mut TestBuilder<'_>, ty: &Arc<dyn TypeInfo>) {
    let resolver = builder.resolver();
    let element = CodeElement::Type(ty.clone());

    for pattern in resolver.patterns_for(&element) {
        pattern.consume(builder, &element, false);
    }
    tracing::trace!(ty = %element.code_reference(), "consumed type");
}
