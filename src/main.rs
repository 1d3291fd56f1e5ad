// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::env;
use std::path::Path;

use anyhow::{Context, Result};
use the_millrace::cancel::CancellationToken;
use the_millrace::config::{load_and_validate_config, Config};
use the_millrace::observability::init_tracing;
use the_millrace::runner::Runner;

fn usage(program: &str) {
    eprintln!("Usage: {} [--config <file.yaml|file.toml>] <list | all | demo-name>", program);
    eprintln!("Example: {} list", program);
    eprintln!("Example: {} --config configs/millrace.yaml fan", program);
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("info");

    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("millrace");
    let mut rest: &[String] = args.get(1..).unwrap_or_default();

    let mut config = Config::default();
    if rest.first().map(String::as_str) == Some("--config") {
        let path = rest.get(1).context("--config needs a file path")?;
        config = load_and_validate_config(Path::new(path))
            .with_context(|| format!("failed to load config '{}'", path))?;
        rest = &rest[2..];
    }

    let Some(command) = rest.first() else {
        usage(program);
        std::process::exit(1);
    };

    let token = CancellationToken::new();
    let ctrl_c = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let runner = Runner::with_all_demos(config, token);

    println!("🌊 The Millrace - concurrency toolkit demos");
    println!("═══════════════════════════════════════════");
    println!();

    match command.as_str() {
        "list" => {
            println!("Available demos:");
            for (i, demo) in runner.list().iter().enumerate() {
                println!("  {}. {} - {}", i + 1, demo.name, demo.description);
            }
            Ok(())
        }
        "all" => {
            runner.run_all().await?;
            println!("\n🎉 All demos complete!");
            Ok(())
        }
        name => runner.run(name).await,
    }
}
