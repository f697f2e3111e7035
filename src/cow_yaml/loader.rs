// Copyright (c) Chris Gunn.
// Licensed under the MIT license.

use std::str::Chars;

use saphyr::{Hash, Yaml};
use saphyr_parser::{Event, Parser as YamlParser, ScanError, TScalarStyle, Tag};
use tracing::debug;

use super::{Mapping, Node, Scalar, ScalarStyle};
use crate::error::{Error, Result};

/// Parses a YAML stream into one tree per document.
///
/// `name` identifies the source (usually a file path) in error messages.
pub fn parse_yaml_str(name: &str, input: &str) -> Result<Vec<Node>> {
    let mut loader = Loader {
        name,
        parser: YamlParser::new_from_str(input),
    };
    let docs = loader.parse_stream()?;

    debug!(name, docs = docs.len(), "parsed yaml");
    Ok(docs)
}

// Builds trees from the parser's event stream so the scalar style of the source survives.
struct Loader<'a> {
    name: &'a str,
    parser: YamlParser<Chars<'a>>,
}

impl<'a> Loader<'a> {
    fn next(&mut self) -> Result<Event> {
        let name = self.name;
        match self.parser.next_token() {
            Ok((event, _)) => Ok(event),
            Err(err) => Err(parse_error(name, err)),
        }
    }

    fn peek(&mut self) -> Result<&Event> {
        let name = self.name;
        match self.parser.peek() {
            Ok((event, _)) => Ok(event),
            Err(err) => Err(parse_error(name, err)),
        }
    }

    fn parse_stream(&mut self) -> Result<Vec<Node>> {
        match self.next()? {
            Event::StreamStart => {}
            event => return Err(self.unexpected(&event)),
        }

        let mut docs = Vec::new();
        loop {
            match self.next()? {
                Event::DocumentStart => {
                    docs.push(self.parse_node()?);
                    match self.next()? {
                        Event::DocumentEnd => {}
                        event => return Err(self.unexpected(&event)),
                    }
                }
                Event::StreamEnd => return Ok(docs),
                event => return Err(self.unexpected(&event)),
            }
        }
    }

    fn parse_node(&mut self) -> Result<Node> {
        match self.next()? {
            Event::Scalar(text, style, _, tag) => self.parse_scalar(text, style, tag),
            Event::SequenceStart(..) => self.parse_sequence(),
            Event::MappingStart(..) => self.parse_mapping(),
            Event::Alias(_) => Err(unsupported(self.name, "yaml aliases not supported")),
            event => Err(self.unexpected(&event)),
        }
    }

    fn parse_sequence(&mut self) -> Result<Node> {
        let mut items = Vec::new();
        while !matches!(self.peek()?, Event::SequenceEnd) {
            items.push(self.parse_node()?);
        }
        self.next()?;
        Ok(Node::sequence(items))
    }

    fn parse_mapping(&mut self) -> Result<Node> {
        let mut map = Mapping::new();
        while !matches!(self.peek()?, Event::MappingEnd) {
            let key = self.parse_key()?;
            let value = self.parse_node()?;
            // `1` and `'1'` are different yaml keys but the same key here.
            if map.contains_key(&key) {
                return Err(unsupported(self.name, &format!("duplicate mapping key '{key}'")));
            }
            map.insert(key, value);
        }
        self.next()?;
        Ok(Node::mapping(map))
    }

    fn parse_key(&mut self) -> Result<String> {
        match self.next()? {
            Event::Scalar(text, _, _, _) => Ok(text),
            Event::Alias(_) => Err(unsupported(self.name, "yaml aliases not supported")),
            _ => Err(unsupported(self.name, "mapping keys must be scalars")),
        }
    }

    fn parse_scalar(&self, text: String, style: TScalarStyle, tag: Option<Tag>) -> Result<Node> {
        match (style, tag) {
            (TScalarStyle::Plain, Some(_)) => Err(unsupported(self.name, "yaml tags not supported")),
            // Typed plain values are stored in the form the emitter writes them back in.
            (TScalarStyle::Plain, None) => match Yaml::from_str(&text) {
                Yaml::Null => Ok(Node::null()),
                Yaml::Integer(value) => Ok(Node::scalar(value.to_string())),
                Yaml::Boolean(value) => Ok(Node::scalar(value.to_string())),
                _ => Ok(Node::scalar(text)),
            },
            // Quoted and block scalars are always strings.
            _ => Ok(Node::quoted(text)),
        }
    }

    fn unexpected(&self, event: &Event) -> Error {
        Error::Parse {
            name: self.name.to_string(),
            reason: format!("unexpected yaml event {event:?}"),
        }
    }
}

fn parse_error(name: &str, err: ScanError) -> Error {
    Error::Parse {
        name: name.to_string(),
        reason: err.to_string(),
    }
}

fn unsupported(name: &str, reason: &str) -> Error {
    Error::UnsupportedValue {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}

/// Converts a tree back into the YAML layer's representation for emitting.
pub fn to_saphyr(node: &Node) -> Yaml {
    match node {
        Node::Scalar(Scalar { text, style }) => match style {
            ScalarStyle::Plain if text.is_empty() => Yaml::Null,
            ScalarStyle::Plain => Yaml::from_str(text),
            ScalarStyle::Quoted => Yaml::String(text.clone()),
        },
        Node::Sequence(seq) => Yaml::Array(seq.iter().map(to_saphyr).collect()),
        Node::Mapping(map) => {
            let mut hash = Hash::new();
            for (key, value) in map.iter() {
                hash.insert(Yaml::from_str(key), to_saphyr(value));
            }
            Yaml::Hash(hash)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_one(input: &str) -> Node {
        let mut docs = parse_yaml_str("test.yaml", input).unwrap();
        assert_eq!(docs.len(), 1);
        docs.remove(0)
    }

    #[test]
    fn typed_scalars_become_plain_text() {
        let root = parse_one("port: 8080\nratio: 1.5\nenabled: true\nempty:\n");
        assert_eq!(root.get("port"), Some(&Node::scalar("8080")));
        assert_eq!(root.get("ratio"), Some(&Node::scalar("1.5")));
        assert_eq!(root.get("enabled"), Some(&Node::scalar("true")));
        assert!(root.get("empty").unwrap().is_null());
    }

    #[test]
    fn quoted_numbers_stay_strings() {
        let root = parse_one("version: \"1\"\nname: web\nblank: ''\n");
        assert_eq!(root.get("version"), Some(&Node::quoted("1")));
        assert_eq!(root.get("name"), Some(&Node::scalar("web")));
        assert_eq!(root.get("blank"), Some(&Node::quoted("")));
    }

    #[test]
    fn quoted_scalars_stay_quoted() {
        let root = parse_one("version: '__VERSION__'\nenabled: \"__ENABLED__\"\nimage: __IMAGE__\nscript: |\n  run\n");
        assert_eq!(root.get("version"), Some(&Node::quoted("__VERSION__")));
        assert_eq!(root.get("enabled"), Some(&Node::quoted("__ENABLED__")));
        assert_eq!(root.get("image"), Some(&Node::scalar("__IMAGE__")));
        assert_eq!(root.get("script"), Some(&Node::quoted("run\n")));
    }

    #[test]
    fn null_forms_are_null() {
        let root = parse_one("a: ~\nb: null\nc:\n");
        for key in ["a", "b", "c"] {
            assert!(root.get(key).unwrap().is_null(), "{key}");
        }
    }

    #[test]
    fn duplicate_keys_rejected() {
        let err = parse_yaml_str("keys.yaml", "1: a\n'1': b\n").unwrap_err();
        match err {
            Error::UnsupportedValue { name, reason } => {
                assert_eq!(name, "keys.yaml");
                assert_eq!(reason, "duplicate mapping key '1'");
            }
            other => panic!("expected UnsupportedValue, got {other:?}"),
        }

        let err = parse_yaml_str("keys.yaml", "spec:\n  name: a\n  name: b\n").unwrap_err();
        assert!(matches!(err, Error::UnsupportedValue { .. }));
    }

    #[test]
    fn aliases_and_tags_rejected() {
        let err = parse_yaml_str("alias.yaml", "base: &base a\ncopy: *base\n").unwrap_err();
        assert!(err.to_string().contains("aliases"));

        let err = parse_yaml_str("tag.yaml", "port: !!int 80\n").unwrap_err();
        assert!(err.to_string().contains("tags"));
    }

    #[test]
    fn empty_stream_has_no_documents() {
        assert!(parse_yaml_str("empty.yaml", "").unwrap().is_empty());
    }

    #[test]
    fn nested_collections() {
        let root = parse_one("environments:\n  - name: dev\n  - name: prod\n");
        let envs = root.get("environments").and_then(Node::as_sequence).unwrap();
        assert_eq!(envs.len(), 2);
        assert_eq!(envs[1].get("name"), Some(&Node::scalar("prod")));
    }

    #[test]
    fn multiple_documents() {
        let docs = parse_yaml_str("multi.yaml", "a: 1\n---\nb: 2\n").unwrap();
        assert_eq!(docs.len(), 2);
    }

    #[test]
    fn non_scalar_keys_rejected() {
        let err = parse_yaml_str("keys.yaml", "? [a, b]\n: value\n").unwrap_err();
        assert!(matches!(err, Error::UnsupportedValue { ref name, .. } if name == "keys.yaml"));
    }

    #[test]
    fn parse_errors_name_the_source() {
        let err = parse_yaml_str("broken.yaml", "a: [1, 2\n").unwrap_err();
        assert!(matches!(err, Error::Parse { ref name, .. } if name == "broken.yaml"));
    }

    #[test]
    fn to_saphyr_restores_types() {
        assert_eq!(to_saphyr(&Node::scalar("8080")), Yaml::Integer(8080));
        assert_eq!(to_saphyr(&Node::quoted("8080")), Yaml::String("8080".into()));
        assert_eq!(to_saphyr(&Node::null()), Yaml::Null);
        assert_eq!(to_saphyr(&Node::scalar("true")), Yaml::Boolean(true));
    }
}
