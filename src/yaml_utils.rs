// Copyright (c) Chris Gunn.
// Licensed under the MIT license.

use std::{fs, path::Path};

use saphyr::YamlEmitter;

use crate::{
    cow_yaml::{parse_yaml_str, to_saphyr, Node},
    error::{Error, Result},
};

pub fn yaml_emit_to_string(docs: &[Node]) -> Result<String> {
    let mut out_str = String::new();
    for doc in docs {
        // The emitter doesn't terminate documents, so each one gets its own buffer.
        let mut doc_str = String::new();
        let mut emitter = YamlEmitter::new(&mut doc_str);
        emitter
            .dump(&to_saphyr(doc))
            .map_err(|err| Error::Emit(err.to_string()))?;
        out_str.push_str(&doc_str);
        out_str.push('\n');
    }
    Ok(out_str)
}

pub fn yaml_emit_to_file(docs: &[Node], filename: &Path) -> Result<()> {
    let out = yaml_emit_to_string(docs)?;
    if let Some(parent) = filename.parent() {
        fs::create_dir_all(parent).map_err(|source| Error::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(filename, out).map_err(|source| Error::Io {
        path: filename.to_path_buf(),
        source,
    })
}

pub fn yaml_load_from_file(filename: &Path) -> Result<Vec<Node>> {
    let input = fs::read_to_string(filename).map_err(|source| Error::Io {
        path: filename.to_path_buf(),
        source,
    })?;
    parse_yaml_str(&filename.display().to_string(), &input)
}
