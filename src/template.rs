// Copyright (c) Chris Gunn.
// Licensed under the MIT license.

use std::path::Path;

use tracing::info;

use crate::{
    cow_yaml::{parse_yaml_str, Node},
    deep_copy::deep_copy,
    error::{Error, Result},
};

/// A named manifest template. The content is read-only; mutate the trees `instantiate`
/// hands out instead.
#[derive(Debug)]
pub struct TemplateFile {
    name: String,
    content: Node,
}

impl TemplateFile {
    pub fn new(name: impl Into<String>, content: Node) -> TemplateFile {
        TemplateFile {
            name: name.into(),
            content,
        }
    }

    /// Parses a single-document template. An empty document is a null template.
    pub fn parse(name: &str, input: &str) -> Result<TemplateFile> {
        let docs = parse_yaml_str(name, input)?;
        let content = match <[Node; 1]>::try_from(docs) {
            Ok([doc]) => doc,
            Err(docs) if docs.is_empty() => Node::null(),
            Err(docs) => {
                return Err(Error::UnsupportedValue {
                    name: name.to_string(),
                    reason: format!("template must contain a single document, found {}", docs.len()),
                })
            }
        };
        Ok(TemplateFile::new(name, content))
    }

    pub fn load(path: &Path) -> Result<TemplateFile> {
        let input = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let template = TemplateFile::parse(&path.display().to_string(), &input)?;
        info!(template = template.name.as_str(), "loaded template");
        Ok(template)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content(&self) -> &Node {
        &self.content
    }

    /// Returns an independent copy of the content for one output.
    pub fn instantiate(&self) -> Node {
        deep_copy(&self.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::{substitute, FluxConfig};

    #[test]
    fn parse_single_document() {
        let template = TemplateFile::parse("svc.yaml", "name: __SERVICE_NAME__\n").unwrap();
        assert_eq!(template.name(), "svc.yaml");
        assert_eq!(template.content().get("name"), Some(&Node::scalar("__SERVICE_NAME__")));
    }

    #[test]
    fn parse_empty_document() {
        let template = TemplateFile::parse("empty.yaml", "").unwrap();
        assert!(template.content().is_null());
    }

    #[test]
    fn parse_rejects_multiple_documents() {
        let err = TemplateFile::parse("multi.yaml", "a: 1\n---\nb: 2\n").unwrap_err();
        assert!(err.to_string().contains("single document, found 2"));
    }

    #[test]
    fn instances_are_independent() {
        let template = TemplateFile::parse("svc.yaml", "name: __SERVICE_NAME__-__ENV__\n").unwrap();

        let mut first = template.instantiate();
        substitute(&mut first, &FluxConfig::new("SERVICE_NAME", "service-A"));
        let mut second = template.instantiate();
        substitute(&mut second, &FluxConfig::new("SERVICE_NAME", "service-B"));

        assert_eq!(first.get("name"), Some(&Node::scalar("service-A-__ENV__")));
        assert_eq!(second.get("name"), Some(&Node::scalar("service-B-__ENV__")));
        assert_eq!(template.content().get("name"), Some(&Node::scalar("__SERVICE_NAME__-__ENV__")));
    }
}
