//! Work-queue elements
//!
//! Each element is one pending assignment: a source value and the place where
//! its clone goes.

use replica_value::{ObjectRef, PropertyAttributes, PropertyDescriptor, PropertyKey, Value};

use crate::path::ClonePath;
use crate::transform::Assigner;

/// Where a finished clone is installed
pub(crate) enum Destination {
    /// The result of the call
    Root,
    /// An own property of a parent clone
    Property {
        parent: ObjectRef,
        key: PropertyKey,
        /// Attributes of the original property
        attributes: Option<PropertyAttributes>,
    },
    /// A strategy- or customizer-supplied callback
    Assigner(Assigner),
    /// The prototype slot of a clone (fully mode)
    Prototype { child: ObjectRef },
}

/// What the value is to its parent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Role {
    /// Ordinary data
    Value,
    /// A prototype being cloned in fully mode; its methods are shared
    Prototype,
}

pub(crate) struct QueueElement {
    pub(crate) value: Value,
    pub(crate) destination: Destination,
    pub(crate) path: Option<ClonePath>,
    pub(crate) role: Role,
}

impl QueueElement {
    pub(crate) fn root(value: Value, path: Option<ClonePath>) -> Self {
        Self {
            value,
            destination: Destination::Root,
            path,
            role: Role::Value,
        }
    }
}

impl Destination {
    /// Install `clone`; the root slot receives it for [`Destination::Root`]
    pub(crate) fn install(self, clone: Value, root: &mut Value) {
        match self {
            Destination::Root => *root = clone,
            Destination::Property {
                parent,
                key,
                attributes,
            } => {
                let attributes = attributes.unwrap_or_else(PropertyAttributes::data);
                parent.define_property(key, PropertyDescriptor::data_with_attrs(clone, attributes));
            }
            Destination::Assigner(assign) => assign(clone),
            Destination::Prototype { child } => child.set_prototype(clone.as_object().cloned()),
        }
    }
}
