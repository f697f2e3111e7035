// Copyright (c) Chris Gunn.
// Licensed under the MIT license.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    thread,
};

use anyhow::{anyhow, bail, Context, Error};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::{
    cow_yaml::Node,
    generate::{generate_output, merge_tokens, pool::generate_all, GenerateOptions, OutputSpec, Prune, ServiceDescriptor},
    process_template::parse_tokens,
    query::QueryMut,
    template::TemplateFile,
    tokens::FluxConfig,
    yaml_utils::{yaml_emit_to_file, yaml_emit_to_string, yaml_load_from_file},
};

#[derive(Parser, Debug)]
#[command(name = "fluxgen")]
#[command(about = "Query, prune and render GitOps manifest templates")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Disable colored log output")]
    pub no_color: bool,

    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Full, help = "Log line format")]
    pub log_format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Full,
    Compact,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render a template once per environment of a service descriptor
    Render(RenderArgs),
    /// Print the values selected by a query
    Query(QueryArgs),
    /// Remove a property from every node selected by a query
    Prune(PruneArgs),
    /// Replace `__KEY__` placeholders in a single document
    Substitute(SubstituteArgs),
}

#[derive(clap::Args, Debug)]
pub struct RenderArgs {
    #[arg(help = "Path to the manifest template")]
    pub template: PathBuf,

    #[arg(short, long, help = "Path to the service descriptor")]
    pub descriptor: PathBuf,

    #[arg(short, long = "token", value_parser = parse_token, help = "Override a token (KEY=VALUE)")]
    pub tokens: Vec<FluxConfig>,

    #[arg(long, help = "Remove a property before substituting (KEY:PROPERTY)")]
    pub prune: Vec<Prune>,

    #[arg(short, long, help = "Write outputs to DIR/<environment>/ instead of stdout")]
    pub out_dir: Option<PathBuf>,

    #[arg(long, help = "Fail outputs that still contain placeholders")]
    pub strict: bool,

    #[arg(short, long, help = "Number of worker threads")]
    pub workers: Option<usize>,
}

#[derive(clap::Args, Debug)]
pub struct QueryArgs {
    #[arg(help = "Path to a YAML document")]
    pub file: PathBuf,

    #[arg(long, help = "Key to search for")]
    pub on: String,

    #[arg(long, help = "Narrow the selection to a child property")]
    pub get: Vec<String>,
}

#[derive(clap::Args, Debug)]
pub struct PruneArgs {
    #[arg(help = "Path to a YAML document")]
    pub file: PathBuf,

    #[arg(long, help = "Key to search for")]
    pub on: String,

    #[arg(long, help = "Narrow the selection to a child property")]
    pub get: Vec<String>,

    #[arg(long, help = "Property to remove from the selection")]
    pub remove: String,
}

#[derive(clap::Args, Debug)]
pub struct SubstituteArgs {
    #[arg(help = "Path to a YAML document")]
    pub file: PathBuf,

    #[arg(short, long = "token", value_parser = parse_token, help = "Token to apply (KEY=VALUE)")]
    pub tokens: Vec<FluxConfig>,

    #[arg(long = "tokens", help = "YAML mapping of tokens; --token values win")]
    pub tokens_file: Option<PathBuf>,

    #[arg(long, help = "Fail if placeholders remain")]
    pub strict: bool,
}

pub fn parse_token(arg: &str) -> Result<FluxConfig, String> {
    match arg.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok(FluxConfig::new(key, value)),
        _ => Err(format!("invalid token '{arg}', expected KEY=VALUE")),
    }
}

/// Logs go to stderr so rendered YAML on stdout stays clean.
pub fn init_logging(args: &Args) {
    let log_level = if args.verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    match args.log_format {
        LogFormat::Compact => {
            tracing_subscriber::fmt()
                .compact()
                .with_env_filter(env_filter)
                .with_ansi(!args.no_color)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Full => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_ansi(!args.no_color)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
    }

    debug!("logging initialized with level: {}", log_level);
}

pub fn run(args: Args) -> Result<(), Error> {
    let output = match args.command {
        Commands::Render(render_args) => render(&render_args)?,
        Commands::Query(query_args) => query(&query_args)?,
        Commands::Prune(prune_args) => prune(&prune_args)?,
        Commands::Substitute(substitute_args) => substitute(&substitute_args)?,
    };
    print!("{}", output);
    Ok(())
}

/// Returns the multi-document stream when no output directory is set, otherwise an empty string.
pub fn render(args: &RenderArgs) -> Result<String, Error> {
    let template = TemplateFile::load(&args.template)?;
    let file_name = args
        .template
        .file_name()
        .ok_or_else(|| anyhow!("template path '{}' has no file name", args.template.display()))?;

    let descriptor = load_single_doc(&args.descriptor)?;
    let descriptor = ServiceDescriptor::from_node(&descriptor)
        .with_context(|| format!("failed to read service descriptor {}", args.descriptor.display()))?;

    let specs = descriptor.output_specs(&args.tokens);
    if specs.is_empty() {
        warn!(service = descriptor.name.as_str(), "no environments to render");
        return Ok(String::new());
    }

    let worker_count = args.workers.unwrap_or_else(default_worker_count);
    let options = Arc::new(GenerateOptions {
        prune: args.prune.clone(),
        strict: args.strict,
    });
    let results = generate_all(Arc::new(template), specs, options, worker_count);
    let total = results.len();

    let mut failed = Vec::new();
    let mut docs = Vec::new();
    for (name, result) in results {
        let output = match result {
            Ok(output) => output,
            Err(err) => {
                failed.push(format!("{name}: {err:#}"));
                continue;
            }
        };

        match &args.out_dir {
            Some(out_dir) => {
                let path = out_dir.join(&output.name).join(file_name);
                yaml_emit_to_file(std::slice::from_ref(&output.content), &path)?;
                info!(output = output.name.as_str(), path = %path.display(), "wrote output");
            }
            None => docs.push(output.content),
        }
    }

    if !failed.is_empty() {
        bail!("{} of {} outputs failed:\n  {}", failed.len(), total, failed.join("\n  "));
    }

    Ok(yaml_emit_to_string(&docs)?)
}

pub fn query(args: &QueryArgs) -> Result<String, Error> {
    let doc = load_single_doc(&args.file)?;

    let mut query = doc.query().on(&args.on);
    for property in &args.get {
        query = query.get(property)?;
    }
    let selection = query.to_list::<Node>()?;
    info!(key = args.on.as_str(), matches = selection.len(), "query finished");

    Ok(yaml_emit_to_string(&[Node::sequence(selection)])?)
}

pub fn prune(args: &PruneArgs) -> Result<String, Error> {
    let mut doc = load_single_doc(&args.file)?;

    let mut query = QueryMut::new(&mut doc).on(&args.on);
    for property in &args.get {
        query = query.get(property)?;
    }
    let removed = query.remove(&args.remove)?;
    info!(key = args.on.as_str(), property = args.remove.as_str(), removed, "pruned");

    Ok(yaml_emit_to_string(&[doc])?)
}

pub fn substitute(args: &SubstituteArgs) -> Result<String, Error> {
    let template = TemplateFile::load(&args.file)?;

    let file_tokens = match &args.tokens_file {
        Some(path) => {
            let input =
                fs::read_to_string(path).with_context(|| format!("failed to read tokens {}", path.display()))?;
            parse_tokens(&path.display().to_string(), &input)?
        }
        None => Vec::new(),
    };

    let spec = OutputSpec {
        name: template.name().to_string(),
        tokens: merge_tokens([&file_tokens[..], &args.tokens[..]]),
    };
    let options = GenerateOptions {
        strict: args.strict,
        ..GenerateOptions::default()
    };
    let output = generate_output(&template, &spec, &options)?;

    Ok(yaml_emit_to_string(&[output.content])?)
}

fn load_single_doc(path: &Path) -> Result<Node, Error> {
    let mut docs = yaml_load_from_file(path)?;
    if docs.len() != 1 {
        bail!("{}: expected a single yaml document, found {}", path.display(), docs.len());
    }
    Ok(docs.remove(0))
}

fn default_worker_count() -> usize {
    thread::available_parallelism().map(usize::from).unwrap_or(1)
}
