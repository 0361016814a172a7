use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use tarn::{assemble_program, compilation_order, import_graph_dot, load_units, resolve_config, SourceInput};
use tarn_core::ast::Construct;
use tarn_core::config::BuildConfig;

#[derive(Parser)]
#[command(name = "tarn")]
#[command(about = "Resolve dependencies between Tarn source files and assemble them into one program", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble a directory or a single file into a program
    Assemble {
        /// Source directory or source file
        path: PathBuf,

        /// Configuration file (defaults to tarn.toml beside the sources)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Summary)]
        format: OutputFormat,

        /// Write the result to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the import graph of a source directory as Graphviz DOT
    Graph {
        /// Source directory
        dir: PathBuf,

        /// Configuration file (defaults to tarn.toml in the directory)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// List the runtime functions exposed to programs
    Runtime {
        /// Configuration file declaring the runtime functions
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    /// Root name and the files in compilation order
    Summary,
    /// The full program root as JSON
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.debug {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };

    // RUST_LOG wins over the flags when set
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(cli.debug) // Show target module in debug mode
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Assemble {
            path,
            config,
            format,
            output,
        } => handle_assemble(path, config.as_deref(), format, output.as_deref()),
        Commands::Graph { dir, config } => handle_graph(dir, config.as_deref()),
        Commands::Runtime { config } => handle_runtime(config.as_deref()),
    }
}

fn handle_assemble(
    path: PathBuf,
    config: Option<&Path>,
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<()> {
    info!("Assembling {:?}", path);

    let input = SourceInput::from_path(path);
    let config = resolve_config(config, &input).context("Failed to load configuration")?;
    let root = assemble_program(input, &config)?;

    let rendered = match format {
        OutputFormat::Summary => render_summary(&root),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&root).context("Failed to serialize program")?;
            json + "\n"
        }
    };

    write_output(&rendered, output)
}

fn handle_graph(dir: PathBuf, config: Option<&Path>) -> Result<()> {
    let input = SourceInput::Directory(dir);
    let config = resolve_config(config, &input).context("Failed to load configuration")?;
    let units = load_units(&input, &config)?;

    println!("{}", import_graph_dot(&units));
    Ok(())
}

fn handle_runtime(config: Option<&Path>) -> Result<()> {
    let config = match config {
        Some(path) => BuildConfig::load(path)?,
        None => BuildConfig::discover(&std::env::current_dir()?)?,
    };
    let library = config.runtime_library()?;

    if library.is_empty() {
        info!("No runtime functions declared");
        return Ok(());
    }
    for (name, signature) in library.signatures() {
        println!("{}: {}", name, signature);
    }
    Ok(())
}

fn render_summary(root: &Construct) -> String {
    let mut out = format!("{} {}\n", root.kind, root.name);
    for (position, name) in compilation_order(root).iter().enumerate() {
        out.push_str(&format!("  {:>3}. {}\n", position + 1, name));
    }
    out
}

fn write_output(rendered: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, rendered)
                .with_context(|| format!("Failed to write output: {:?}", path))?;
            info!("Program written to {:?}", path);
        }
        None => print!("{}", rendered),
    }
    Ok(())
}
