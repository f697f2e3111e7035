// Copyright (c) Chris Gunn.
// Licensed under the MIT license.

pub mod cli;
pub mod cow_yaml;
pub mod deep_copy;
pub mod error;
pub mod generate;
pub mod process_template;
pub mod query;
pub mod template;
pub mod tokens;
pub mod yaml_utils;

pub use cow_yaml::{Node, Scalar, ScalarStyle};
pub use error::{Error, Result};
pub use query::{FromNode, Query, QueryMut};
pub use template::TemplateFile;
pub use tokens::FluxConfig;
