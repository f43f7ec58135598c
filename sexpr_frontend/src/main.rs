// Command-line driver: compiles one script and prints either its syntax tree,
// the checked program, or the first diagnostic.

use std::{
    io::{self, Read},
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use codespan_reporting::{
    files::SimpleFile,
    term::{
        self,
        termcolor::{ColorChoice, StandardStream},
    },
};
use sexpr_frontend::{parse, process_program, wire, Diagnostic};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(about = "Parse and check a lifecycle script")]
struct Cli {
    /// A script to compile, or `-` to read standard input.
    script: PathBuf,

    /// What to print when the script compiles.
    #[arg(long, value_enum, default_value_t = Emit::Program)]
    emit: Emit,

    /// Print diagnostics as JSON on stdout instead of rendering them.
    #[arg(long)]
    json: bool,

    /// When to color rendered diagnostics.
    #[arg(long, value_enum, default_value_t = Color::Auto)]
    color: Color,

    /// Log each compilation stage (overridden by RUST_LOG).
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Emit {
    /// The parsed syntax tree, as JSON.
    Syntax,
    /// The checked program.
    Program,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Color {
    Auto,
    Always,
    Never,
}

impl From<Color> for ColorChoice {
    fn from(color: Color) -> ColorChoice {
        match color {
            Color::Auto => ColorChoice::Auto,
            Color::Always => ColorChoice::Always,
            Color::Never => ColorChoice::Never,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::from(2)
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

// whether the script compiled
fn run(cli: &Cli) -> anyhow::Result<bool> {
    let (name, code) = read_script(&cli.script)?;

    let nodes = match parse(&code) {
        Ok(nodes) => nodes,
        Err(diagnostic) => {
            report(cli, &name, &code, &diagnostic)?;
            return Ok(false);
        }
    };

    let output = match cli.emit {
        Emit::Syntax => serde_json::to_string_pretty(&wire::encode_nodes(&nodes)?)?,
        Emit::Program => match process_program(nodes) {
            Ok(program) => program.to_string(),
            Err(diagnostic) => {
                report(cli, &name, &code, &diagnostic)?;
                return Ok(false);
            }
        },
    };

    println!("{output}");
    Ok(true)
}

fn read_script(path: &Path) -> anyhow::Result<(String, String)> {
    if path.as_os_str() == "-" {
        let mut code = String::new();
        io::stdin()
            .read_to_string(&mut code)
            .context("failed to read standard input")?;
        return Ok(("<stdin>".to_string(), code));
    }

    let code = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok((path.display().to_string(), code))
}

fn report(cli: &Cli, name: &str, code: &str, diagnostic: &Diagnostic) -> anyhow::Result<()> {
    if cli.json {
        println!("{}", wire::encode_diagnostic(diagnostic)?);
        return Ok(());
    }

    let writer = StandardStream::stderr(cli.color.into());
    let config = term::Config::default();
    let file = SimpleFile::new(name, code);

    term::emit(&mut writer.lock(), &config, &file, &diagnostic.to_codespan(code))
        .context("failed to render diagnostic")?;
    Ok(())
}
