use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use quadshade_common::ShellConfig;
use quadshade_render::ShaderSources;
use quadshade_render::uniforms::CONTRACT;
use quadshade_render_wgpu::{UniformLayout, compile_program};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "quadshade-cli", about = "CLI tool for quadshade shaders")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and defaults
    Info,
    /// Print the uniforms the shell sets every frame
    Contract,
    /// Print the default config as YAML
    DefaultConfig,
    /// Compile a shader pair and report its uniform block
    Check {
        /// YAML config to take shader paths from
        #[arg(long)]
        config: Option<PathBuf>,
        /// Vertex shader path
        #[arg(long)]
        vertex: Option<PathBuf>,
        /// Fragment shader path
        #[arg(long)]
        fragment: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Info => {
            let config = ShellConfig::default();
            println!("quadshade-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("shader language: GLSL 450 (naga glsl-in)");
            println!("uniform block: std140, set = 0, binding = 0");
            println!("default vertex: {}", config.shaders.vertex.display());
            println!("default fragment: {}", config.shaders.fragment.display());
            println!(
                "default window: {}x{}",
                config.window.width, config.window.height
            );
        }
        Commands::Contract => {
            for (name, kind) in CONTRACT {
                println!("{kind:<6} {name}");
            }
        }
        Commands::DefaultConfig => {
            let yaml = serde_yaml::to_string(&ShellConfig::default())
                .context("failed to serialize default config")?;
            print!("{yaml}");
        }
        Commands::Check {
            config,
            vertex,
            fragment,
        } => {
            let config = match config {
                Some(path) => ShellConfig::load(&path)?,
                None => ShellConfig::default(),
            };
            let mut sources = ShaderSources::from(&config.shaders);
            if let Some(vertex) = vertex {
                sources.vertex = vertex;
            }
            if let Some(fragment) = fragment {
                sources.fragment = fragment;
            }
            check(&sources)?;
        }
    }

    Ok(())
}

fn check(sources: &ShaderSources) -> Result<()> {
    let program = compile_program(sources).with_context(|| {
        format!(
            "{} + {} failed to build",
            sources.vertex.display(),
            sources.fragment.display()
        )
    })?;
    println!(
        "OK: {} + {}",
        sources.vertex.display(),
        sources.fragment.display()
    );

    let Some(layout) = program.uniforms else {
        println!("no uniform block declared; the shell will set nothing");
        return Ok(());
    };

    println!("uniform block: {} bytes", layout.span);
    let mut fields: Vec<_> = layout.fields.iter().collect();
    fields.sort_by_key(|(_, field)| field.offset);
    for (name, field) in fields {
        println!("  {:>4}  {:<6} {name}", field.offset, field.kind);
    }

    let missing = missing_contract(&layout);
    if missing.is_empty() {
        println!("all contract uniforms present");
    } else {
        println!("not declared (skipped at runtime): {}", missing.join(", "));
    }
    Ok(())
}

fn missing_contract(layout: &UniformLayout) -> Vec<&'static str> {
    CONTRACT
        .iter()
        .filter(|(name, kind)| layout.get(name).map(|f| f.kind) != Some(*kind))
        .map(|(name, _)| *name)
        .collect()
}
