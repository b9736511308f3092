//! Descriptor-preserving property copier

use replica_value::{ObjectRef, PropertyDescriptor, PropertyKey};

use crate::path::{ClonePath, Segment, extend};
use crate::queue::{Destination, QueueElement, Role};
use crate::scheduler::Traversal;

impl Traversal<'_> {
    /// Queue every own property of `original` for installation on `shell`
    ///
    /// Covers string, index and symbol keys regardless of enumerability.
    /// Data values are cloned and reinstalled with their original attributes.
    /// Accessors are installed as-is: the getter and setter functions are
    /// shared, never called.
    pub(crate) fn copy_properties(
        &mut self,
        original: &ObjectRef,
        shell: &ObjectRef,
        ignore_keys: &[PropertyKey],
        role: Role,
        path: &Option<ClonePath>,
    ) {
        for key in original.own_keys() {
            if ignore_keys.contains(&key) {
                continue;
            }
            let Some(desc) = original.get_own_property(&key) else {
                continue;
            };
            match desc {
                PropertyDescriptor::Data { value, attributes } => {
                    // Methods on a cloned prototype stay shared
                    if role == Role::Prototype && value.is_callable() {
                        shell.define_property(
                            key,
                            PropertyDescriptor::data_with_attrs(value, attributes),
                        );
                        continue;
                    }
                    let child_path = extend(path, Segment::Key(key.clone()));
                    self.queue.push_back(QueueElement {
                        value,
                        destination: Destination::Property {
                            parent: shell.clone(),
                            key,
                            attributes: Some(attributes),
                        },
                        path: child_path,
                        role: Role::Value,
                    });
                }
                accessor @ PropertyDescriptor::Accessor { .. } => {
                    shell.define_property(key, accessor);
                }
            }
        }
    }
}
