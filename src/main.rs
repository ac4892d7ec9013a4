//! SQL Compositor CLI
//!
//! Usage:
//!   sql-compositor [OPTIONS] [FILE]
//!
//! Options:
//!   -c, --config <FILE>          Formatter configuration (TOML format)
//!   --script                     Print the sp_executesql diagnostic script
//!   --tags                       Show the placeholder tag reference
//!   --check-id <NAME>            Check a name against the identifier pattern
//!   --check-json-path <PATH>     Check a path against the JSON path pattern
//!   -v, --verbose                Log build details to stderr
//!   -h, --help                   Print help

use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sql_compositor::{build_with_config, FormatterConfig, QueryDocument, Tag};

#[derive(Parser)]
#[command(name = "sql-compositor")]
#[command(about = "Compose SQL from templates with injection-checked placeholders")]
struct Cli {
    /// Query document (reads from stdin if not provided)
    input: Option<PathBuf>,

    /// Formatter configuration file (TOML format)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the sp_executesql diagnostic script instead of text and parameters
    #[arg(long)]
    script: bool,

    /// Show the placeholder tag reference
    #[arg(long)]
    tags: bool,

    /// Check a name against the identifier pattern
    #[arg(long, value_name = "NAME")]
    check_id: Option<String>,

    /// Check a path against the JSON path pattern
    #[arg(long, value_name = "PATH")]
    check_json_path: Option<String>,

    /// Log build details to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "sql_compositor=debug"
    } else {
        "sql_compositor=warn"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with(fmt::layer().with_writer(io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.tags {
        print_tags();
        return;
    }

    let formatter = match &cli.config {
        Some(path) => match FormatterConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error loading config '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => FormatterConfig::default(),
    };

    if cli.check_id.is_some() || cli.check_json_path.is_some() {
        let mut all_valid = true;
        if let Some(name) = &cli.check_id {
            all_valid &= report_check("identifier", name, formatter.is_valid_identifier(name));
        }
        if let Some(path) = &cli.check_json_path {
            all_valid &= report_check("JSON path", path, formatter.is_valid_json_path(path));
        }
        std::process::exit(if all_valid { 0 } else { 1 });
    }

    // No document and an interactive terminal: show intro help
    if cli.input.is_none() && io::stdin().is_terminal() {
        print_intro();
        return;
    }

    let source = match &cli.input {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                eprintln!("Error reading file '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => {
            let mut buffer = String::new();
            match io::stdin().read_to_string(&mut buffer) {
                Ok(_) => buffer,
                Err(e) => {
                    eprintln!("Error reading from stdin: {}", e);
                    std::process::exit(1);
                }
            }
        }
    };

    let document = match QueryDocument::from_str(&source) {
        Ok(document) => document,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let filename = cli
        .input
        .as_deref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "<stdin>".to_string());
    let config = document
        .build_config()
        .with_formatter(formatter)
        .with_origin(filename.clone());

    match build_with_config(&document.template, config) {
        Ok(compiled) if cli.script => println!("{}", compiled),
        Ok(compiled) => {
            println!("{}", compiled.sql());
            if !compiled.parameters().is_empty() {
                println!();
                for (name, value) in compiled.parameters().iter() {
                    println!("-- {} = {} ({})", name, value, value.kind());
                }
            }
        }
        Err(e) => {
            eprint!("{}", e.format(&filename));
            std::process::exit(1);
        }
    }
}

fn report_check(what: &str, value: &str, valid: bool) -> bool {
    if valid {
        println!("valid {}: {}", what, value);
    } else {
        println!("invalid {}: {}", what, value);
    }
    valid
}

fn print_intro() {
    println!(
        r#"SQL Compositor - SQL templates with injection-checked placeholders

USAGE:
    sql-compositor [OPTIONS] [FILE]
    cat query.toml | sql-compositor

OPTIONS:
    -c, --config <FILE>        Formatter configuration (TOML file)
    --script                   Print the sp_executesql diagnostic script
    --tags                     Show the placeholder tag reference
    --check-id <NAME>          Validate an identifier
    --check-json-path <PATH>   Validate a JSON path
    -v, --verbose              Log build details to stderr
    -h, --help                 Print help

QUICK START:
    printf 'sql = "SELECT * FROM {{0:id}} WHERE Id = {{1:value}}"\nargs = ["Users", 5]\n' | sql-compositor

Run --tags for the placeholder reference."#
    );
}

fn print_tags() {
    println!("PLACEHOLDER TAGS");
    println!("================");
    println!();
    println!("Placeholders are written {{index:tag}}; literal braces are {{{{ and }}}}.");
    println!();
    for tag in Tag::ALL {
        println!("{:<14}{}", tag.name(), tag.description());
    }
    println!();
    println!("A null argument renders as nothing for every tag except value.");
}
