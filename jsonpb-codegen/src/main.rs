//! CLI entry point for jsonpb-codegen

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::ffi::OsString;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use jsonpb_codegen::config::CodegenConfig;
use jsonpb_codegen::syntax::{parse, NodeKind};
use jsonpb_codegen::{CodegenError, Engine, Generated, Mode};

#[derive(Parser)]
#[command(name = "jsonpb-codegen")]
#[command(about = "Add MarshalJSON methods to protoc-gen-go structs")]
#[command(version)]
struct Cli {
    /// Path to configuration file (TOML format)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Go source file to read (required here or in the config file)
    #[arg(short, long = "src")]
    src: Option<PathBuf>,

    /// Destination file; empty or absent writes to stdout
    #[arg(short, long = "dest")]
    dest: Option<OsString>,

    /// Generation mode: inplace or template
    #[arg(short, long)]
    mode: Option<Mode>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Skip types that already declare MarshalJSON
    #[arg(long)]
    skip_existing: bool,

    /// Template mode: write to <base>_json.<ext> next to the source
    #[arg(long)]
    companion: bool,

    /// Dry run - show which types would get methods without writing files
    #[arg(long)]
    dry_run: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the methods (default)
    Generate,
    /// Inspect the source (show parsed declarations and matched types)
    Inspect,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first (before logging, so we can use config.log_level)
    let mut config = match &cli.config {
        Some(config_path) => CodegenConfig::from_file(config_path)?,
        None => CodegenConfig::load(None)?,
    };

    // Initialize logging
    // Priority: RUST_LOG env var > --debug > config.log_level > warn
    let log_level = if cli.debug || config.debug {
        "debug"
    } else {
        config.log_level.as_deref().unwrap_or("warn")
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .init();

    // Apply CLI overrides
    if let Some(src) = cli.src {
        config.source = src;
    }
    if let Some(dest) = cli.dest {
        config.destination = (!dest.is_empty()).then(|| PathBuf::from(dest));
    }
    if let Some(mode) = cli.mode {
        config.mode = mode;
    }
    if cli.debug {
        config.debug = true;
    }
    if cli.skip_existing {
        config.skip_existing = true;
    }
    if cli.companion {
        config.companion = true;
    }
    if cli.dry_run {
        config.dry_run = true;
    }

    if config.source.as_os_str().is_empty() {
        anyhow::bail!("--src is required");
    }

    if let Some(Commands::Inspect) = &cli.command {
        return inspect_source(&config);
    }

    // Validate configuration
    config.validate()?;

    info!("Generating from {:?} in {} mode", config.source, config.mode);

    let generated = match jsonpb_codegen::generate(&config) {
        Ok(generated) => generated,
        Err(err @ CodegenError::Print { .. }) => {
            if let Some(partial) = err.partial_output() {
                eprintln!("partial output:\n{}", partial);
            }
            return Err(err.into());
        }
        Err(err) => return Err(err.into()),
    };
    report(&generated);

    if config.dry_run {
        println!("Dry run mode - would generate:");
        for type_name in &generated.matched {
            println!("  {}: func (*{}) {}", config.mode, type_name, config.runtime.method);
        }
        match config.destination_path() {
            Some(dest) => println!("  into {}", dest.display()),
            None => println!("  into stdout"),
        }
        return Ok(());
    }

    info!("Code generation completed successfully");
    Ok(())
}

/// Non-fatal diagnostics go to stderr whatever the log level
fn report(generated: &Generated) {
    for diagnostic in &generated.diagnostics {
        eprintln!("jsonpb-codegen: {}", diagnostic);
    }
}

fn inspect_source(config: &CodegenConfig) -> Result<()> {
    let source = std::fs::read_to_string(&config.source)?;
    let tree = parse(&source)?;

    let decls = tree.children(tree.root());
    println!("Parsed {} top-level declarations:\n", decls.len());
    for &id in decls {
        let line = tree
            .span(id)
            .map(|span| source[..span.start].matches('\n').count() + 1)
            .unwrap_or(0);
        println!("  {:>5}  {}", line, tree.kind(id).label());
        for &child in tree.children(id) {
            if let NodeKind::TypeSpec { name } = tree.kind(child) {
                let shape = match tree.struct_of(child) {
                    Some(s) => format!("struct with {} fields", tree.children(s).len()),
                    None => "not a struct".to_string(),
                };
                println!("         - {} ({})", name, shape);
            }
        }
    }

    let manifest = Engine::from_config(config).collect(&source, None)?;
    println!(
        "\nMatched {} types in package {}:",
        manifest.types.len(),
        manifest.package
    );
    for type_name in &manifest.types {
        println!("  - {}", type_name);
    }

    Ok(())
}
