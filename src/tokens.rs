// Copyright (c) Chris Gunn.
// Licensed under the MIT license.

// Token substitution: rewrites `__KEY__` placeholders in scalar leaves.

mod placeholder_parser;


use std::{collections::HashSet, sync::Arc};

use tracing::debug;

use crate::{
    cow_yaml::Node,
    error::{Error, Result},
};

pub use placeholder_parser::PlaceholderParser;

pub const PLACEHOLDER_DELIMITER: &str = "__";

/// A single substitution: every `__key__` becomes `value`.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct FluxConfig {
    pub key: String,
    pub value: String,
}

impl FluxConfig {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> FluxConfig {
        FluxConfig {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn placeholder(&self) -> String {
        format!("{PLACEHOLDER_DELIMITER}{}{PLACEHOLDER_DELIMITER}", self.key)
    }
}

/// Applies one token to every scalar leaf of `node`. Mapping keys are left alone.
///
/// Plain numbers and booleans are matched on their text like any other scalar.
/// Returns the number of rewritten leaves.
pub fn substitute(node: &mut Node, token: &FluxConfig) -> usize {
    let placeholder = token.placeholder();
    let count = substitute_placeholder(node, &placeholder, &token.value);
    debug!(token = token.key.as_str(), leaves = count, "substituted token");
    count
}

/// Applies each token as its own pass, in order.
pub fn substitute_all(node: &mut Node, tokens: &[FluxConfig]) -> usize {
    tokens.iter().map(|token| substitute(node, token)).sum()
}

fn substitute_placeholder(node: &mut Node, placeholder: &str, value: &str) -> usize {
    match node {
        Node::Scalar(scalar) => {
            if !scalar.text.contains(placeholder) {
                return 0;
            }
            scalar.text = scalar.text.replace(placeholder, value);
            1
        }
        Node::Sequence(seq) => {
            if !seq.iter().any(|item| contains_text(item, placeholder)) {
                return 0;
            }
            Arc::make_mut(seq)
                .iter_mut()
                .map(|item| substitute_placeholder(item, placeholder, value))
                .sum()
        }
        Node::Mapping(map) => {
            if !map.values().any(|item| contains_text(item, placeholder)) {
                return 0;
            }
            Arc::make_mut(map)
                .values_mut()
                .map(|item| substitute_placeholder(item, placeholder, value))
                .sum()
        }
    }
}

// Lets substitution skip untouched branches so shared storage stays shared.
fn contains_text(node: &Node, needle: &str) -> bool {
    match node {
        Node::Scalar(scalar) => scalar.text.contains(needle),
        Node::Sequence(seq) => seq.iter().any(|item| contains_text(item, needle)),
        Node::Mapping(map) => map.values().any(|item| contains_text(item, needle)),
    }
}

/// Placeholder names in `text`, in order of appearance.
pub fn placeholders_in(text: &str) -> Vec<String> {
    PlaceholderParser::new().scan(text)
}

impl Node {
    /// Names of placeholders still present in scalar leaves, deduplicated, in traversal order.
    pub fn unresolved_placeholders(&self) -> Vec<String> {
        let parser = PlaceholderParser::new();
        let mut seen = HashSet::new();
        let mut names = Vec::new();
        collect_placeholders(self, &parser, &mut seen, &mut names);
        names
    }
}

fn collect_placeholders(node: &Node, parser: &PlaceholderParser, seen: &mut HashSet<String>, names: &mut Vec<String>) {
    match node {
        Node::Scalar(scalar) => {
            if !scalar.text.contains(PLACEHOLDER_DELIMITER) {
                return;
            }
            for name in parser.scan(&scalar.text) {
                if seen.insert(name.clone()) {
                    names.push(name);
                }
            }
        }
        Node::Sequence(seq) => {
            for item in seq.iter() {
                collect_placeholders(item, parser, seen, names);
            }
        }
        Node::Mapping(map) => {
            for item in map.values() {
                collect_placeholders(item, parser, seen, names);
            }
        }
    }
}

/// Checks that a token set gives the same result whatever order it is applied in.
///
/// Rejects names that don't form a placeholder, duplicate names, and values that contain
/// another token's placeholder (a later pass would rewrite an earlier pass's output).
pub fn validate_tokens(tokens: &[FluxConfig]) -> Result<()> {
    let parser = PlaceholderParser::new();
    let mut keys = HashSet::new();
    for token in tokens {
        if parser.scan(&token.placeholder()) != [token.key.as_str()] {
            return Err(Error::InvalidTokenName(token.key.clone()));
        }
        if !keys.insert(token.key.as_str()) {
            return Err(Error::DuplicateToken(token.key.clone()));
        }
    }

    for token in tokens {
        for other in tokens {
            if other.key != token.key && token.value.contains(&other.placeholder()) {
                return Err(Error::OverlappingTokens {
                    key: token.key.clone(),
                    other: other.key.clone(),
                });
            }
        }
    }

    Ok(())
}
