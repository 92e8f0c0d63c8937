//! Attribute lookup by marker type

use crate::reflect::element::Attribute;
use std::any::Any;

/// Every attribute whose concrete type is `T`, in declaration order
pub fn attributes_of<T: Any>(attributes: &[Attribute]) -> impl Iterator<Item = &T> {
    attributes.iter().filter_map(|a| (**a).downcast_ref::<T>())
}

/// Whether any attribute has concrete type `T`
pub fn has_attribute<T: Any>(attributes: &[Attribute]) -> bool {
    attributes_of::<T>(attributes).next().is_some()
}
