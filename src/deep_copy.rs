// Copyright (c) Chris Gunn.
// Licensed under the MIT license.

// `Node::clone` shares containers copy-on-write. These produce trees that share no storage
// with their source at all.

use std::sync::Arc;

use crate::{
    cow_yaml::{parse_yaml_str, Node},
    error::{Error, Result},
    yaml_utils::yaml_emit_to_string,
};

/// Recursive structural copy into freshly allocated containers.
pub fn deep_copy(node: &Node) -> Node {
    match node {
        Node::Scalar(scalar) => Node::Scalar(scalar.clone()),
        Node::Sequence(seq) => Node::Sequence(Arc::new(seq.iter().map(deep_copy).collect())),
        Node::Mapping(map) => Node::Mapping(Arc::new(
            map.iter().map(|(key, value)| (key.clone(), deep_copy(value))).collect(),
        )),
    }
}

/// Copies by emitting YAML text and parsing it again.
///
/// Only succeeds when the tree survives the text format unchanged; `name` identifies the
/// template in the error.
pub fn round_trip_copy(name: &str, node: &Node) -> Result<Node> {
    let text = yaml_emit_to_string(std::slice::from_ref(node))?;
    let mut docs = parse_yaml_str(name, &text)?;
    let copy = match docs.len() {
        1 => docs.remove(0),
        count => {
            return Err(Error::UnsupportedValue {
                name: name.to_string(),
                reason: format!("round trip produced {count} documents"),
            })
        }
    };

    if &copy != node {
        return Err(Error::UnsupportedValue {
            name: name.to_string(),
            reason: "tree does not survive a yaml round trip".to_string(),
        });
    }
    Ok(copy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cow_yaml::{Scalar, ScalarStyle},
        query::QueryMut,
        tokens::{substitute, FluxConfig},
    };

    fn template() -> Node {
        parse_yaml_str(
            "service.yaml",
            "
name: __SERVICE_NAME__
environments:
  - name: dev
    manifest:
      generate: true
  - name: prod
    manifest:
      generate: true
",
        )
        .unwrap()
        .remove(0)
    }

    fn shares_storage(a: &Node, b: &Node) -> bool {
        match (a, b) {
            (Node::Sequence(x), Node::Sequence(y)) => {
                Arc::ptr_eq(x, y) || x.iter().zip(y.iter()).any(|(x, y)| shares_storage(x, y))
            }
            (Node::Mapping(x), Node::Mapping(y)) => {
                Arc::ptr_eq(x, y) || x.values().zip(y.values()).any(|(x, y)| shares_storage(x, y))
            }
            _ => false,
        }
    }

    #[test]
    fn deep_copy_is_equal_and_unshared() {
        let original = template();
        let copy = deep_copy(&original);
        assert_eq!(copy, original);
        assert!(!shares_storage(&original, &copy));
        assert!(shares_storage(&original, &original.clone()));
    }

    #[test]
    fn emitting_copy_matches_original() {
        let original = template();
        let copy = deep_copy(&original);
        assert_eq!(
            yaml_emit_to_string(&[copy]).unwrap(),
            yaml_emit_to_string(&[original]).unwrap()
        );
    }

    #[test]
    fn mutating_copy_leaves_original() {
        let original = template();
        let snapshot = yaml_emit_to_string(std::slice::from_ref(&original)).unwrap();

        let mut copy = deep_copy(&original);
        substitute(&mut copy, &FluxConfig::new("SERVICE_NAME", "billing"));
        QueryMut::new(&mut copy).on("environments").remove("manifest").unwrap();

        assert_eq!(yaml_emit_to_string(&[original]).unwrap(), snapshot);
        assert_eq!(copy.get("name"), Some(&Node::scalar("billing")));
    }

    #[test]
    fn round_trip_copy_matches() {
        let original = template();
        let copy = round_trip_copy("service.yaml", &original).unwrap();
        assert_eq!(copy, original);
        assert!(!shares_storage(&original, &copy));
    }

    #[test]
    fn round_trip_copy_rejects_lossy_trees() {
        // A plain scalar holding text that the yaml layer reads back as a different value.
        let lossy = Node::Scalar(Scalar {
            text: "0x10".to_string(),
            style: ScalarStyle::Plain,
        });
        let err = round_trip_copy("lossy.yaml", &lossy).unwrap_err();
        assert!(matches!(err, Error::UnsupportedValue { ref name, .. } if name == "lossy.yaml"));
    }
}
