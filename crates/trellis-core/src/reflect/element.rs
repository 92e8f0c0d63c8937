//! Code element traits and identities

use crate::outcome::Failure;
use serde::Serialize;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Attribute-style metadata attached to a code element
///
/// Attributes are looked up by their concrete (marker) type, see
/// [`crate::reflect::attributes_of`].
pub type Attribute = Arc<dyn Any + Send + Sync>;

/// Kind of code element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CodeElementKind {
    Assembly,
    Type,
    Method,
}

/// Identity of a code element: assembly, optionally narrowed to a type and member
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CodeReference {
    pub assembly: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member: Option<String>,
}

impl CodeReference {
    /// Reference to a whole assembly
    pub fn for_assembly(assembly: impl Into<String>) -> Self {
        Self {
            assembly: assembly.into(),
            type_name: None,
            member: None,
        }
    }

    /// Reference to a type within an assembly
    pub fn for_type(assembly: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            assembly: assembly.into(),
            type_name: Some(type_name.into()),
            member: None,
        }
    }

    /// Reference to a member of a type
    pub fn for_member(
        assembly: impl Into<String>,
        type_name: impl Into<String>,
        member: impl Into<String>,
    ) -> Self {
        Self {
            assembly: assembly.into(),
            type_name: Some(type_name.into()),
            member: Some(member.into()),
        }
    }

    /// Reference to the assembly containing this element
    pub fn assembly_reference(&self) -> CodeReference {
        CodeReference::for_assembly(self.assembly.clone())
    }
}

impl fmt::Display for CodeReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.assembly)?;
        if let Some(type_name) = &self.type_name {
            write!(f, "::{}", type_name)?;
        }
        if let Some(member) = &self.member {
            write!(f, ".{}", member)?;
        }
        Ok(())
    }
}

/// Common surface of every code element
pub trait CodeElementInfo: Send + Sync + fmt::Debug {
    /// Short name (assembly name, type name or member name)
    fn name(&self) -> &str;

    fn kind(&self) -> CodeElementKind;

    /// Identity used to key exploration state and builder lookups
    fn code_reference(&self) -> CodeReference;

    /// Attribute-style metadata
    fn attributes(&self) -> &[Attribute];
}

/// An assembly scope
pub trait AssemblyInfo: CodeElementInfo {
    /// Types declared in the assembly
    fn types(&self) -> Vec<Arc<dyn TypeInfo>>;
}

/// A type scope
pub trait TypeInfo: CodeElementInfo {
    /// Owning assembly; `None` when the assembly is no longer reachable
    fn assembly(&self) -> Option<Arc<dyn AssemblyInfo>>;

    /// Methods declared on the type
    fn methods(&self) -> Vec<Arc<dyn MethodInfo>>;
}

/// A method that can be invoked as test logic
pub trait MethodInfo: CodeElementInfo {
    fn declaring_type(&self) -> Option<Arc<dyn TypeInfo>>;

    /// Run the method; failures of the body come back wrapped in
    /// [`Failure::Invocation`]
    fn invoke(&self) -> Result<(), Failure>;
}

/// A code element handle of any kind
#[derive(Debug, Clone)]
pub enum CodeElement {
    Assembly(Arc<dyn AssemblyInfo>),
    Type(Arc<dyn TypeInfo>),
    Method(Arc<dyn MethodInfo>),
}

impl CodeElement {
    pub fn name(&self) -> &str {
        match self {
            CodeElement::Assembly(a) => a.name(),
            CodeElement::Type(t) => t.name(),
            CodeElement::Method(m) => m.name(),
        }
    }

    pub fn kind(&self) -> CodeElementKind {
        match self {
            CodeElement::Assembly(_) => CodeElementKind::Assembly,
            CodeElement::Type(_) => CodeElementKind::Type,
            CodeElement::Method(_) => CodeElementKind::Method,
        }
    }

    pub fn code_reference(&self) -> CodeReference {
        match self {
            CodeElement::Assembly(a) => a.code_reference(),
            CodeElement::Type(t) => t.code_reference(),
            CodeElement::Method(m) => m.code_reference(),
        }
    }

    pub fn attributes(&self) -> &[Attribute] {
        match self {
            CodeElement::Assembly(a) => a.attributes(),
            CodeElement::Type(t) => t.attributes(),
            CodeElement::Method(m) => m.attributes(),
        }
    }

    pub fn as_assembly(&self) -> Option<&Arc<dyn AssemblyInfo>> {
        match self {
            CodeElement::Assembly(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_type(&self) -> Option<&Arc<dyn TypeInfo>> {
        match self {
            CodeElement::Type(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_method(&self) -> Option<&Arc<dyn MethodInfo>> {
        match self {
            CodeElement::Method(m) => Some(m),
            _ => None,
        }
    }
}
