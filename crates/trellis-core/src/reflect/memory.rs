//! In-memory code model
//!
//! Hosts without a compiled-artifact reader (and the test suite) describe
//! assemblies with [`AssemblyDef`], [`TypeDef`] and [`MethodDef`], then call
//! [`AssemblyDef::build`]. Types and methods keep weak back-references to
//! their owners, so the assembly `Arc` must stay alive while they are used.

use crate::outcome::Failure;
use crate::reflect::element::{
    AssemblyInfo, Attribute, CodeElementInfo, CodeElementKind, CodeReference, MethodInfo,
    TypeInfo,
};
use std::any::Any;
use std::fmt;
use std::sync::{Arc, Weak};

/// Body of an in-memory method
pub type MethodBody = Arc<dyn Fn() -> Result<(), Failure> + Send + Sync>;

/// Definition of an assembly
#[derive(Default)]
pub struct AssemblyDef {
    name: String,
    attributes: Vec<Attribute>,
    types: Vec<TypeDef>,
}

/// Definition of a type
#[derive(Default)]
pub struct TypeDef {
    name: String,
    attributes: Vec<Attribute>,
    methods: Vec<MethodDef>,
}

/// Definition of a method
#[derive(Default)]
pub struct MethodDef {
    name: String,
    attributes: Vec<Attribute>,
    body: Option<MethodBody>,
}

impl AssemblyDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Attach an attribute
    pub fn attribute<A: Any + Send + Sync>(mut self, attribute: A) -> Self {
        self.attributes.push(Arc::new(attribute));
        self
    }

    /// Attach an already shared attribute
    pub fn shared_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Declare a type
    pub fn ty(mut self, ty: TypeDef) -> Self {
        self.types.push(ty);
        self
    }

    /// Materialize the assembly and everything it declares
    pub fn build(self) -> Arc<MemoryAssembly> {
        let AssemblyDef {
            name,
            attributes,
            types,
        } = self;

        Arc::new_cyclic(|assembly| MemoryAssembly {
            types: types
                .into_iter()
                .map(|ty| ty.build(assembly.clone(), &name))
                .collect(),
            name,
            attributes,
        })
    }
}

impl TypeDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn attribute<A: Any + Send + Sync>(mut self, attribute: A) -> Self {
        self.attributes.push(Arc::new(attribute));
        self
    }

    pub fn shared_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Declare a method
    pub fn method(mut self, method: MethodDef) -> Self {
        self.methods.push(method);
        self
    }

    fn build(self, assembly: Weak<MemoryAssembly>, assembly_name: &str) -> Arc<MemoryType> {
        let TypeDef {
            name,
            attributes,
            methods,
        } = self;
        let reference = CodeReference::for_type(assembly_name, name.clone());

        Arc::new_cyclic(|ty| MemoryType {
            methods: methods
                .into_iter()
                .map(|method| method.build(ty.clone(), &reference))
                .collect(),
            name,
            reference,
            assembly,
            attributes,
        })
    }
}

impl MethodDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn attribute<A: Any + Send + Sync>(mut self, attribute: A) -> Self {
        self.attributes.push(Arc::new(attribute));
        self
    }

    /// Set the code run by [`MethodInfo::invoke`]
    pub fn body<F>(mut self, body: F) -> Self
    where
        F: Fn() -> Result<(), Failure> + Send + Sync + 'static,
    {
        self.body = Some(Arc::new(body));
        self
    }

    fn build(self, declaring_type: Weak<MemoryType>, type_reference: &CodeReference) -> Arc<MemoryMethod> {
        let reference = CodeReference {
            member: Some(self.name.clone()),
            ..type_reference.clone()
        };

        Arc::new(MemoryMethod {
            name: self.name,
            reference,
            declaring_type,
            attributes: self.attributes,
            body: self.body,
        })
    }
}

/// An assembly held in memory
#[derive(Debug)]
pub struct MemoryAssembly {
    name: String,
    attributes: Vec<Attribute>,
    types: Vec<Arc<MemoryType>>,
}

/// A type held in memory
#[derive(Debug)]
pub struct MemoryType {
    name: String,
    reference: CodeReference,
    assembly: Weak<MemoryAssembly>,
    attributes: Vec<Attribute>,
    methods: Vec<Arc<MemoryMethod>>,
}

/// A method held in memory
pub struct MemoryMethod {
    name: String,
    reference: CodeReference,
    declaring_type: Weak<MemoryType>,
    attributes: Vec<Attribute>,
    body: Option<MethodBody>,
}

impl MemoryAssembly {
    /// Concrete handle to a declared type, by name
    pub fn find_type(&self, name: &str) -> Option<Arc<MemoryType>> {
        self.types.iter().find(|t| t.name == name).cloned()
    }
}

impl MemoryType {
    pub fn find_method(&self, name: &str) -> Option<Arc<MemoryMethod>> {
        self.methods.iter().find(|m| m.name == name).cloned()
    }
}

impl fmt::Debug for MemoryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryMethod")
            .field("reference", &self.reference)
            .field("attributes", &self.attributes.len())
            .field("has_body", &self.body.is_some())
            .finish()
    }
}

impl CodeElementInfo for MemoryAssembly {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> CodeElementKind {
        CodeElementKind::Assembly
    }

    fn code_reference(&self) -> CodeReference {
        CodeReference::for_assembly(self.name.clone())
    }

    fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }
}

impl AssemblyInfo for MemoryAssembly {
    fn types(&self) -> Vec<Arc<dyn TypeInfo>> {
        self.types
            .iter()
            .map(|t| t.clone() as Arc<dyn TypeInfo>)
            .collect()
    }
}

impl CodeElementInfo for MemoryType {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> CodeElementKind {
        CodeElementKind::Type
    }

    fn code_reference(&self) -> CodeReference {
        self.reference.clone()
    }

    fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }
}

impl TypeInfo for MemoryType {
    fn assembly(&self) -> Option<Arc<dyn AssemblyInfo>> {
        self.assembly
            .upgrade()
            .map(|a| a as Arc<dyn AssemblyInfo>)
    }

    fn methods(&self) -> Vec<Arc<dyn MethodInfo>> {
        self.methods
            .iter()
            .map(|m| m.clone() as Arc<dyn MethodInfo>)
            .collect()
    }
}

impl CodeElementInfo for MemoryMethod {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> CodeElementKind {
        CodeElementKind::Method
    }

    fn code_reference(&self) -> CodeReference {
        self.reference.clone()
    }

    fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }
}

impl MethodInfo for MemoryMethod {
    fn declaring_type(&self) -> Option<Arc<dyn TypeInfo>> {
        self.declaring_type
            .upgrade()
            .map(|t| t as Arc<dyn TypeInfo>)
    }

    fn invoke(&self) -> Result<(), Failure> {
        match &self.body {
            Some(body) => body().map_err(|e| Failure::invocation(self.reference.to_string(), e)),
            None => Ok(()),
        }
    }
}
