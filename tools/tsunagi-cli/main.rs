use clap::{Parser, ValueEnum};
use std::fs;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use tsunagi::prelude::*;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TargetCli {
    Javascript,
    Reason,
}

impl From<TargetCli> for TargetLanguage {
    fn from(target: TargetCli) -> Self {
        match target {
            TargetCli::Javascript => TargetLanguage::JavaScript,
            TargetCli::Reason => TargetLanguage::ReasonML,
        }
    }
}

/// Compiles a saved block program to JavaScript or ReasonML
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the program document JSON file
    program_path: String,

    /// The language to emit
    #[arg(short, long, value_enum, default_value = "javascript")]
    target: TargetCli,

    /// Entry point to use instead of `main` or the first function
    #[arg(short, long)]
    entrypoint: Option<String>,

    /// Spaces per indentation level
    #[arg(long, default_value_t = 2)]
    indent: usize,

    /// Print the compilation result as JSON
    #[arg(long)]
    json: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let total_start = Instant::now();

    let json = fs::read_to_string(&cli.program_path).unwrap_or_else(|e| {
        exit_with_error(&format!(
            "Failed to read program file '{}': {}",
            cli.program_path, e
        ))
    });

    let load_start = Instant::now();
    let mut session = Session::new();
    let ids = session
        .load(json.as_str())
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to load program: {}", e)));
    let load_duration = load_start.elapsed();

    let unresolved = session.unresolved_usages();
    if !unresolved.is_empty() {
        eprintln!(
            "Warning: {} reference(s) have no declaration and will compile as free names",
            unresolved.len()
        );
    }

    let mut builder = Compiler::builder(cli.target.into()).with_indent(cli.indent);
    if let Some(entrypoint) = &cli.entrypoint {
        builder = builder.with_entrypoint(entrypoint);
    }
    let compiler = builder.build();

    let compile_start = Instant::now();
    let result = session
        .compile_with(&compiler)
        .unwrap_or_else(|e| exit_with_error(&format!("Compilation failed: {}", e)));
    let compile_duration = compile_start.elapsed();

    if cli.json {
        let text = serde_json::to_string_pretty(&result)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to serialize result: {}", e)));
        println!("{}", text);
    } else {
        println!("{}", result.code);
    }

    eprintln!("\n--- Summary ---");
    eprintln!("Blocks Loaded:    {}", ids.len());
    eprintln!("Entry Point:      {}", result.entrypoint);
    eprintln!("Runtime Args:     {}", result.arg_names.join(", "));
    eprintln!("Loading:          {:?}", load_duration);
    eprintln!("Compilation:      {:?}", compile_duration);
    eprintln!("Total:            {:?}", total_start.elapsed());
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
