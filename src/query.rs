// Copyright (c) Chris Gunn.
// Licensed under the MIT license.

// Two-level path addressing over trees: `on(key)` selects the values of every mapping entry
// named `key` (first match per path), `get(property)` narrows to direct children of the
// selection, `remove(property)` deletes direct children of the selection.


use std::sync::Arc;

use tracing::debug;

use crate::{
    cow_yaml::Node,
    error::{Error, Result},
};

/// Read-only query cursor over a tree.
pub struct Query<'a> {
    root: &'a Node,
    current: Option<Vec<&'a Node>>,
}

impl<'a> Query<'a> {
    pub fn new(root: &'a Node) -> Query<'a> {
        Query { root, current: None }
    }

    /// Starts a new chain: selects the value of every mapping entry keyed `key`.
    pub fn on(mut self, key: &str) -> Query<'a> {
        let mut matches = Vec::new();
        find_key(self.root, key, &mut matches);
        debug!(key, matches = matches.len(), "query on");
        self.current = Some(matches);
        self
    }

    pub fn get(mut self, property: &str) -> Result<Query<'a>> {
        let current = self.current.take().ok_or(Error::InvalidQueryState { op: "get" })?;

        let mut narrowed = Vec::new();
        for node in current {
            select_property(node, property, &mut narrowed);
        }
        debug!(property, matches = narrowed.len(), "query get");
        self.current = Some(narrowed);
        Ok(self)
    }

    pub fn selection(&self) -> Result<&[&'a Node]> {
        self.current
            .as_deref()
            .ok_or(Error::InvalidQueryState { op: "selection" })
    }

    pub fn to_list<T: FromNode>(&self) -> Result<Vec<T>> {
        let current = self
            .current
            .as_ref()
            .ok_or(Error::InvalidQueryState { op: "to_list" })?;
        current.iter().map(|node| T::from_node(node)).collect()
    }
}

fn find_key<'a>(node: &'a Node, key: &str, matches: &mut Vec<&'a Node>) {
    match node {
        Node::Mapping(map) => {
            for (entry_key, value) in map.iter() {
                if entry_key == key {
                    matches.push(value);
                } else {
                    find_key(value, key, matches);
                }
            }
        }
        Node::Sequence(seq) => {
            for item in seq.iter() {
                find_key(item, key, matches);
            }
        }
        Node::Scalar(_) => {}
    }
}

fn select_property<'a>(node: &'a Node, property: &str, matches: &mut Vec<&'a Node>) {
    match node {
        Node::Mapping(map) => {
            if let Some(value) = map.get(property) {
                matches.push(value);
            }
        }
        Node::Sequence(seq) => {
            for item in seq.iter() {
                select_property(item, property, matches);
            }
        }
        Node::Scalar(_) => {}
    }
}

/// Mutating query cursor. The selection is resolved when `remove` runs.
pub struct QueryMut<'a> {
    root: &'a mut Node,
    key: Option<String>,
    properties: Vec<String>,
}

impl<'a> QueryMut<'a> {
    pub fn new(root: &'a mut Node) -> QueryMut<'a> {
        QueryMut {
            root,
            key: None,
            properties: Vec::new(),
        }
    }

    pub fn on(mut self, key: &str) -> QueryMut<'a> {
        self.key = Some(key.to_string());
        self.properties.clear();
        self
    }

    pub fn get(mut self, property: &str) -> Result<QueryMut<'a>> {
        if self.key.is_none() {
            return Err(Error::InvalidQueryState { op: "get" });
        }
        self.properties.push(property.to_string());
        Ok(self)
    }

    /// Deletes the entry keyed `property` from every selected mapping, going element-wise
    /// through selected sequences. Returns the number of removed entries.
    pub fn remove(self, property: &str) -> Result<usize> {
        let key = self.key.ok_or(Error::InvalidQueryState { op: "remove" })?;

        let mut selected = Vec::new();
        find_key_mut(self.root, &key, &mut selected);
        for narrow in &self.properties {
            let mut narrowed = Vec::new();
            for node in selected {
                select_property_mut(node, narrow, &mut narrowed);
            }
            selected = narrowed;
        }

        let removed: usize = selected
            .into_iter()
            .map(|node| remove_property(node, property))
            .sum();
        debug!(key = key.as_str(), property, removed, "query remove");
        Ok(removed)
    }
}

fn find_key_mut<'a>(node: &'a mut Node, key: &str, matches: &mut Vec<&'a mut Node>) {
    match node {
        Node::Mapping(map) => {
            for (entry_key, value) in Arc::make_mut(map).iter_mut() {
                if entry_key == key {
                    matches.push(value);
                } else {
                    find_key_mut(value, key, matches);
                }
            }
        }
        Node::Sequence(seq) => {
            for item in Arc::make_mut(seq).iter_mut() {
                find_key_mut(item, key, matches);
            }
        }
        Node::Scalar(_) => {}
    }
}

fn select_property_mut<'a>(node: &'a mut Node, property: &str, matches: &mut Vec<&'a mut Node>) {
    match node {
        Node::Mapping(map) => {
            if let Some(value) = Arc::make_mut(map).get_mut(property) {
                matches.push(value);
            }
        }
        Node::Sequence(seq) => {
            for item in Arc::make_mut(seq).iter_mut() {
                select_property_mut(item, property, matches);
            }
        }
        Node::Scalar(_) => {}
    }
}

fn remove_property(node: &mut Node, property: &str) -> usize {
    match node {
        Node::Mapping(map) => {
            if !map.contains_key(property) {
                return 0;
            }
            Arc::make_mut(map).remove(property);
            1
        }
        Node::Sequence(seq) => Arc::make_mut(seq)
            .iter_mut()
            .map(|item| remove_property(item, property))
            .sum(),
        Node::Scalar(_) => 0,
    }
}

/// Conversion used by [`Query::to_list`].
pub trait FromNode: Sized {
    fn from_node(node: &Node) -> Result<Self>;
}

impl FromNode for Node {
    fn from_node(node: &Node) -> Result<Self> {
        Ok(node.clone())
    }
}

impl FromNode for String {
    fn from_node(node: &Node) -> Result<Self> {
        node.as_str().map(str::to_string).ok_or(Error::TypeMismatch {
            expected: "scalar",
            found: node.type_name(),
        })
    }
}

macro_rules! from_node_parse {
    ($($ty:ty => $name:expr,)*) => {
    $(
        impl FromNode for $ty {
            fn from_node(node: &Node) -> Result<Self> {
                let mismatch = Error::TypeMismatch {
                    expected: $name,
                    found: node.type_name(),
                };
                let text = node.as_str().ok_or(mismatch)?;
                text.trim().parse::<$ty>().map_err(|_| Error::TypeMismatch {
                    expected: $name,
                    found: "scalar",
                })
            }
        }
    )*
    }
}

from_node_parse! {
    bool => "boolean",
    i64 => "integer",
    u64 => "unsigned integer",
    f64 => "number",
}

impl<T: FromNode> FromNode for Vec<T> {
    fn from_node(node: &Node) -> Result<Self> {
        let seq = node.as_sequence().ok_or(Error::TypeMismatch {
            expected: "sequence",
            found: node.type_name(),
        })?;
        seq.iter().map(T::from_node).collect()
    }
}
