// SPDX-License-Identifier: GPL-3.0-only
//! Device attribute lists
//!
//! A backend assembles an [`AttributeList`] while describing a newly
//! discovered device, then either hands it to device creation (which moves the
//! contents out) or frees it. The list is never shared.

use crate::error::Result;

/// Device node path (e.g. `/dev/dri/card0`)
pub const PATH: i32 = 1;
/// Kernel sysfs path
pub const SYSPATH: i32 = 2;
/// Bus identifier string
pub const BUSID: i32 = 3;

const INITIAL_CAPACITY: usize = 4;

/// A single backend-supplied descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub id: i32,
    pub name: String,
}

/// Ordered, owned list of attributes. The first attribute added is the
/// primary one.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct AttributeList {
    attributes: Vec<Attribute>,
}

impl AttributeList {
    /// Create an empty list
    pub fn allocate() -> Result<Self> {
        let mut attributes = Vec::new();
        attributes.try_reserve(INITIAL_CAPACITY).map_err(|err| {
            error!("Failed to allocate attribute list: {}", err);
            err
        })?;
        Ok(Self { attributes })
    }

    /// Append a copy of `name` tagged with `id`
    ///
    /// On allocation failure the list is left unchanged.
    pub fn add(&mut self, id: i32, name: &str) -> Result<()> {
        let mut owned = String::new();
        if let Err(err) = owned
            .try_reserve_exact(name.len())
            .and_then(|_| self.attributes.try_reserve(1))
        {
            error!("Failed to add attribute {} ({:?}): {}", id, name, err);
            return Err(err.into());
        }
        owned.push_str(name);
        self.attributes.push(Attribute { id, name: owned });
        Ok(())
    }

    /// Drop every attribute but keep the list itself usable
    pub fn free_attributes(&mut self) {
        self.attributes.clear();
    }

    /// Release the list and everything in it
    pub fn free(mut self) {
        self.free_attributes();
    }

    /// Name of the first attribute with the given id
    pub fn get(&self, id: i32) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.id == id)
            .map(|a| a.name.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Attribute> {
        self.attributes.iter()
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Move the attributes out, consuming the list
    pub fn into_attributes(self) -> Vec<Attribute> {
        self.attributes
    }
}

impl<'a> IntoIterator for &'a AttributeList {
    type Item = &'a Attribute;
    type IntoIter = std::slice::Iter<'a, Attribute>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
