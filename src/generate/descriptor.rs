// Copyright (c) Chris Gunn.
// Licensed under the MIT license.

use crate::{
    cow_yaml::Node,
    error::{Error, Result},
    tokens::FluxConfig,
};

use super::{merge_tokens, OutputSpec};

pub const SERVICE_NAME_TOKEN: &str = "SERVICE_NAME";
pub const ENVIRONMENT_TOKEN: &str = "ENVIRONMENT";

/// A service and the environments it is deployed to.
///
/// ```yaml
/// name: billing
/// tokens: { REGISTRY: ghcr.io/acme }
/// environments:
///   - name: dev
///     tokens: { REPLICAS: 1 }
///     manifest: { generate: true }
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct ServiceDescriptor {
    pub name: String,
    pub tokens: Vec<FluxConfig>,
    pub environments: Vec<EnvironmentDescriptor>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EnvironmentDescriptor {
    pub name: String,
    pub tokens: Vec<FluxConfig>,
    pub generate: bool,
}

impl ServiceDescriptor {
    pub fn from_node(node: &Node) -> Result<ServiceDescriptor> {
        let name = required_str(node, "name", "service")?;
        let tokens = tokens_from(node.get("tokens"), &name)?;

        let environments = match node.get("environments") {
            None => Vec::new(),
            Some(envs) if envs.is_null() => Vec::new(),
            Some(Node::Sequence(envs)) => envs
                .iter()
                .map(EnvironmentDescriptor::from_node)
                .collect::<Result<Vec<_>>>()?,
            Some(other) => {
                return Err(Error::InvalidDescriptor(format!(
                    "'environments' of service '{name}' must be a sequence, found {}",
                    other.type_name()
                )))
            }
        };

        Ok(ServiceDescriptor {
            name,
            tokens,
            environments,
        })
    }

    /// Names of all environments, in descriptor order.
    pub fn environment_names(node: &Node) -> Result<Vec<String>> {
        node.query().on("environments").get("name")?.to_list()
    }

    /// One output per environment with generation enabled. `overrides` are applied last.
    pub fn output_specs(&self, overrides: &[FluxConfig]) -> Vec<OutputSpec> {
        let service_token = [FluxConfig::new(SERVICE_NAME_TOKEN, &self.name)];
        self.environments
            .iter()
            .filter(|env| env.generate)
            .map(|env| {
                let env_token = [FluxConfig::new(ENVIRONMENT_TOKEN, &env.name)];
                let tokens = merge_tokens([
                    &service_token[..],
                    &env_token[..],
                    &self.tokens[..],
                    &env.tokens[..],
                    overrides,
                ]);
                OutputSpec {
                    name: env.name.clone(),
                    tokens,
                }
            })
            .collect()
    }
}

impl EnvironmentDescriptor {
    fn from_node(node: &Node) -> Result<EnvironmentDescriptor> {
        let name = required_str(node, "name", "environment")?;
        // Rendered outputs are written to a directory named after the environment.
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(Error::InvalidDescriptor(format!(
                "environment name '{name}' must be a single path component"
            )));
        }
        let tokens = tokens_from(node.get("tokens"), &name)?;

        let generate = node.query().on("manifest").get("generate")?.to_list::<bool>()?;
        let generate = generate.first().copied().unwrap_or(true);

        Ok(EnvironmentDescriptor {
            name,
            tokens,
            generate,
        })
    }
}

fn required_str(node: &Node, key: &str, what: &str) -> Result<String> {
    match node.get(key) {
        Some(value) if !value.is_null() => value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| Error::InvalidDescriptor(format!("{what} '{key}' must be a scalar"))),
        _ => Err(Error::InvalidDescriptor(format!("{what} is missing '{key}'"))),
    }
}

fn tokens_from(node: Option<&Node>, owner: &str) -> Result<Vec<FluxConfig>> {
    let map = match node {
        None => return Ok(Vec::new()),
        Some(node) if node.is_null() => return Ok(Vec::new()),
        Some(Node::Mapping(map)) => map,
        Some(other) => {
            return Err(Error::InvalidDescriptor(format!(
                "tokens of '{owner}' must be a mapping, found {}",
                other.type_name()
            )))
        }
    };

    map.iter()
        .map(|(key, value)| match value.as_str() {
            Some(text) => Ok(FluxConfig::new(key.as_str(), text)),
            None => Err(Error::InvalidDescriptor(format!(
                "token '{key}' of '{owner}' must be a scalar, found {}",
                value.type_name()
            ))),
        })
        .collect()
}
