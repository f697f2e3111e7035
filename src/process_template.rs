// Copyright (c) Chris Gunn.
// Licensed under the MIT license.

#[cfg(test)]
mod tests;

use anyhow::{anyhow, Error};

use crate::{
    cow_yaml::{parse_yaml_str, Node},
    generate::{generate_output, GenerateOptions, OutputSpec},
    template::TemplateFile,
    tokens::FluxConfig,
    yaml_utils::yaml_emit_to_string,
};

pub fn process_yaml_template_str(filename: &str, template_string: &str, tokens_string: &str) -> Result<String, Error> {
    let doc = process_yaml_template(filename, template_string, tokens_string)?;
    let out_str = yaml_emit_to_string(&[doc])?;
    Ok(out_str)
}

pub fn process_yaml_template(filename: &str, template_string: &str, tokens_string: &str) -> Result<Node, Error> {
    let template = TemplateFile::parse(filename, template_string)?;
    let tokens = parse_tokens(filename, tokens_string)?;

    let spec = OutputSpec {
        name: filename.to_string(),
        tokens,
    };
    let output = generate_output(&template, &spec, &GenerateOptions::default())?;
    Ok(output.content)
}

/// Reads a token set from a YAML mapping of `KEY: value` pairs, keeping file order.
pub fn parse_tokens(filename: &str, tokens_string: &str) -> Result<Vec<FluxConfig>, Error> {
    let docs = parse_yaml_str(filename, tokens_string)?;
    let tokens = match &docs[..] {
        [] => return Ok(Vec::new()),
        [tokens] => tokens,
        _ => return Err(anyhow!("tokens yaml must only have a single document")),
    };

    let map = match tokens {
        Node::Mapping(map) => map,
        tokens if tokens.is_null() => return Ok(Vec::new()),
        tokens => return Err(anyhow!("tokens yaml must be a mapping, found {}", tokens.type_name())),
    };

    let mut result = Vec::new();
    for (key, value) in map.iter() {
        let Some(text) = value.as_str() else {
            return Err(anyhow!("token '{}' must be a scalar, found {}", key, value.type_name()));
        };
        result.push(FluxConfig::new(key.as_str(), text));
    }
    Ok(result)
}
