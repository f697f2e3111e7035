// Copyright (c) Chris Gunn.
// Licensed under the MIT license.

// Renders one output per (service, environment) from a shared template.

mod descriptor;
pub mod pool;


use tracing::{debug, warn};

use crate::{
    cow_yaml::Node,
    error::{Error, Result},
    query::QueryMut,
    template::TemplateFile,
    tokens::{substitute_all, validate_tokens, FluxConfig},
};

pub use descriptor::{EnvironmentDescriptor, ServiceDescriptor};

/// Names one output and the tokens it is rendered with.
#[derive(Clone, Debug, PartialEq)]
pub struct OutputSpec {
    pub name: String,
    pub tokens: Vec<FluxConfig>,
}

/// Removes entry `remove` from the selection of `on(key)`.
#[derive(Clone, Debug, PartialEq)]
pub struct Prune {
    pub on: String,
    pub remove: String,
}

impl std::str::FromStr for Prune {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((on, remove)) if !on.is_empty() && !remove.is_empty() => Ok(Prune {
                on: on.to_string(),
                remove: remove.to_string(),
            }),
            _ => Err(format!("expected KEY:PROPERTY, got '{s}'")),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct GenerateOptions {
    pub prune: Vec<Prune>,
    // Fail outputs that still contain placeholders after substitution.
    pub strict: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Output {
    pub name: String,
    pub content: Node,
}

pub fn generate_output(template: &TemplateFile, spec: &OutputSpec, options: &GenerateOptions) -> Result<Output> {
    validate_tokens(&spec.tokens)?;

    let mut content = template.instantiate();

    for prune in &options.prune {
        QueryMut::new(&mut content).on(&prune.on).remove(&prune.remove)?;
    }

    let leaves = substitute_all(&mut content, &spec.tokens);
    debug!(
        template = template.name(),
        output = spec.name.as_str(),
        leaves,
        "rendered output"
    );

    let unresolved = content.unresolved_placeholders();
    if !unresolved.is_empty() {
        if options.strict {
            return Err(Error::UnresolvedPlaceholders {
                output: spec.name.clone(),
                names: unresolved,
            });
        }
        warn!(output = spec.name.as_str(), names = ?unresolved, "unresolved placeholders");
    }

    Ok(Output {
        name: spec.name.clone(),
        content,
    })
}

/// Merges token sources; a later source overrides an earlier token with the same key.
pub fn merge_tokens<'a>(sources: impl IntoIterator<Item = &'a [FluxConfig]>) -> Vec<FluxConfig> {
    let mut merged: Vec<FluxConfig> = Vec::new();
    for source in sources {
        for token in source {
            match merged.iter_mut().find(|existing| existing.key == token.key) {
                Some(existing) => existing.value = token.value.clone(),
                None => merged.push(token.clone()),
            }
        }
    }
    merged
}
