// Copyright (c) Chris Gunn.
// Licensed under the MIT license.

// Provides copy-on-write variant of a YAML object.

mod loader;

use std::sync::Arc;

use hashlink::LinkedHashMap;

use crate::query::Query;

pub use loader::{parse_yaml_str, to_saphyr};

pub type Sequence = Vec<Node>;
pub type Mapping = LinkedHashMap<String, Node>;

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Node {
    Scalar(Scalar),
    Sequence(Arc<Sequence>),
    Mapping(Arc<Mapping>),
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Scalar {
    pub text: String,
    pub style: ScalarStyle,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ScalarStyle {
    // Type is resolved from the text when emitted (e.g. `8080` is an integer, empty is null).
    Plain,
    // Always a string.
    Quoted,
}

impl Node {
    pub fn scalar(text: impl Into<String>) -> Node {
        Node::Scalar(Scalar {
            text: text.into(),
            style: ScalarStyle::Plain,
        })
    }

    pub fn quoted(text: impl Into<String>) -> Node {
        Node::Scalar(Scalar {
            text: text.into(),
            style: ScalarStyle::Quoted,
        })
    }

    pub fn null() -> Node {
        Node::scalar("")
    }

    pub fn sequence(values: Sequence) -> Node {
        Node::Sequence(Arc::new(values))
    }

    pub fn mapping(entries: Mapping) -> Node {
        Node::Mapping(Arc::new(entries))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Node::Scalar(Scalar { text, style: ScalarStyle::Plain }) if text.is_empty())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::Scalar(scalar) => Some(&scalar.text),
            Node::Sequence(_) | Node::Mapping(_) => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&Sequence> {
        match self {
            Node::Sequence(seq) => Some(seq),
            Node::Scalar(_) | Node::Mapping(_) => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Node::Mapping(map) => Some(map),
            Node::Scalar(_) | Node::Sequence(_) => None,
        }
    }

    /// Looks up a direct entry of a mapping node.
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.as_mapping()?.get(key)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Node::Scalar(_) if self.is_null() => "null",
            Node::Scalar(_) => "scalar",
            Node::Sequence(_) => "sequence",
            Node::Mapping(_) => "mapping",
        }
    }

    pub fn query(&self) -> Query<'_> {
        Query::new(self)
    }
}

impl From<&str> for Node {
    fn from(value: &str) -> Self {
        Node::scalar(value)
    }
}

impl From<String> for Node {
    fn from(value: String) -> Self {
        Node::scalar(value)
    }
}

impl From<Sequence> for Node {
    fn from(value: Sequence) -> Self {
        Node::sequence(value)
    }
}

impl From<Mapping> for Node {
    fn from(value: Mapping) -> Self {
        Node::mapping(value)
    }
}

impl<K: Into<String>, V: Into<Node>> FromIterator<(K, V)> for Node {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let map = iter.into_iter().map(|(key, value)| (key.into(), value.into())).collect();
        Node::mapping(map)
    }
}
