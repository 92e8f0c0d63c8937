//! Code element abstraction
//!
//! Discovery never inspects compiled artifacts itself. A host describes
//! the code under test through the traits in [`element`]: assemblies own
//! types, types own methods, and every element exposes an identity
//! ([`CodeReference`]) plus attribute-style metadata.
//!
//! [`memory`] contains a ready-made in-memory implementation.
//!
//! # Examples
//!
//! ```
//! use trellis_core::reflect::memory::{AssemblyDef, MethodDef, TypeDef};
//! use trellis_core::reflect::{AssemblyInfo, CodeElementInfo};
//!
//! let assembly = AssemblyDef::new("Calculator.Tests")
//!     .ty(TypeDef::new("AdditionFixture").method(MethodDef::new("AddsTwoNumbers")))
//!     .build();
//!
//! let types = assembly.types();
//! assert_eq!(types[0].code_reference().to_string(), "Calculator.Tests::AdditionFixture");
//! ```

pub mod attributes;
pub mod element;
pub mod memory;

pub use attributes::{attributes_of, has_attribute};
pub use element::{
    AssemblyInfo, Attribute, CodeElement, CodeElementInfo, CodeElementKind, CodeReference,
    MethodInfo, TypeInfo,
};
