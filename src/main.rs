// Copyright (c) Chris Gunn.
// Licensed under the MIT license.

use clap::Parser;

use fluxgen::cli::{self, Args};

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    cli::init_logging(&args);
    cli::run(args)
}
