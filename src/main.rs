//! Interactive shell for running WCQL queries against a workflow catalog.
//!
//! # Usage
//!
//! ```bash
//! wcql catalog.json
//! wcql --config wcql.json --verbose catalog.json
//! wcql catalog.json --query 'variable("CPU", "%") AND name="B"'
//! ```
//!
//! Shell commands: a bare line is a query, `:sql <query>` prints the compiled
//! SQL, `:tokens <query>` prints the tokens, `:quit` exits.

use std::env;
use std::process::ExitCode;

use anyhow::{anyhow, Context, Result};
use log::{info, warn};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use workflow_catalog_query::catalog::Catalog;
use workflow_catalog_query::config::CatalogConfig;
use workflow_catalog_query::lexer::tokenize;
use workflow_catalog_query::sql_compiler::SqlCompiler;
use workflow_catalog_query::{Query, QueryError, APP_NAME, VERSION};

const DEFAULT_CONFIG: &str = "wcql.json";

#[derive(Debug, Default)]
struct Args {
    catalog_path: Option<String>,
    config_path: Option<String>,
    query: Option<String>,
    verbose: bool,
    help: bool,
}

fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format(|buf, record| {
            use std::io::Write;

            match record.level() {
                log::Level::Warn | log::Level::Error => {
                    writeln!(buf, "[{}] {}", record.level(), record.args())
                }
                _ => writeln!(buf, "{}", record.args()),
            }
        })
        .init();
}

fn print_usage() {
    println!("Usage: {} [OPTIONS] <CATALOG_JSON>", APP_NAME);
    println!();
    println!("Options:");
    println!("  --config PATH   Configuration file (default: {})", DEFAULT_CONFIG);
    println!("  --query QUERY   Run one query and exit");
    println!("  --verbose       Enable debug logging");
    println!("  --help          Show this help message");
}

fn parse_arguments(args: &[String]) -> Result<Args> {
    let mut parsed = Args::default();
    let mut iter = args.iter().skip(1);

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                let path = iter.next().ok_or_else(|| anyhow!("--config requires a path"))?;
                parsed.config_path = Some(path.clone());
            }
            "--query" => {
                let query = iter.next().ok_or_else(|| anyhow!("--query requires a query"))?;
                parsed.query = Some(query.clone());
            }
            "--verbose" | "-v" => parsed.verbose = true,
            "--help" | "-h" => parsed.help = true,
            other if other.starts_with("--") => return Err(anyhow!("unknown option: {}", other)),
            other => {
                if parsed.catalog_path.replace(other.to_string()).is_some() {
                    return Err(anyhow!("only one catalog file may be given"));
                }
            }
        }
    }

    Ok(parsed)
}

fn load_config(path: Option<&str>) -> CatalogConfig {
    let path = path.unwrap_or(DEFAULT_CONFIG);
    match CatalogConfig::from_json_file(path) {
        Ok(config) => {
            info!("loaded configuration from {}", path);
            config
        }
        Err(e) => {
            warn!("{}, using default configuration", e);
            CatalogConfig::default()
        }
    }
}

fn report_query_error(source: &str, error: &QueryError) {
    println!("✗ {}", error);
    println!("  {}", source);
    println!("  {}^", " ".repeat(source[..error.offset()].chars().count()));
}

fn run_query(catalog: &Catalog, config: &CatalogConfig, source: &str) {
    let query = match Query::parse(source) {
        Ok(query) => query,
        Err(e) => return report_query_error(source, &e),
    };

    for bucket in catalog.buckets() {
        match catalog.find_most_recent_revisions(bucket.id, &query, config.page_size) {
            Ok(revisions) if revisions.is_empty() => {}
            Ok(revisions) => {
                println!("[{}]", bucket.name);
                for revision in revisions {
                    println!(
                        "  {} (workflow {}, revision {})",
                        revision.metadata.name, revision.workflow_id, revision.revision_id
                    );
                }
            }
            Err(e) => println!("✗ {}", e),
        }
    }
}

fn print_sql(config: &CatalogConfig, source: &str) {
    let query = match Query::parse(source) {
        Ok(query) => query,
        Err(e) => return report_query_error(source, &e),
    };
    match SqlCompiler::from_config(config) {
        Ok(compiler) => {
            let result = compiler.compile(query.predicate());
            println!("{}", result.sql);
            for optimization in &result.optimizations {
                println!("• {:?}", optimization);
            }
        }
        Err(e) => println!("✗ {}", e),
    }
}

fn print_tokens(source: &str) {
    match tokenize(source) {
        Ok(tokens) => {
            for token in tokens {
                println!("{:>4}..{:<4} {}", token.span.start, token.span.end, token.kind);
            }
        }
        Err(e) => report_query_error(source, &QueryError::from(e)),
    }
}

fn repl(catalog: &Catalog, config: &CatalogConfig) -> Result<()> {
    let mut editor = DefaultEditor::new()?;

    loop {
        match editor.readline("wcql> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                editor.add_history_entry(line)?;

                if line == ":quit" || line == ":q" {
                    break;
                } else if let Some(source) = line.strip_prefix(":sql ") {
                    print_sql(config, source.trim());
                } else if let Some(source) = line.strip_prefix(":tokens ") {
                    print_tokens(source.trim());
                } else {
                    run_query(catalog, config, line);
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}

fn run(args: Args) -> Result<()> {
    let config = load_config(args.config_path.as_deref());

    let catalog_path = args
        .catalog_path
        .ok_or_else(|| anyhow!("missing catalog file, see --help"))?;
    let catalog = Catalog::from_json_file(&catalog_path)
        .with_context(|| format!("failed to load catalog {}", catalog_path))?;

    match args.query {
        Some(source) => {
            run_query(&catalog, &config, &source);
            Ok(())
        }
        None => {
            println!("{} v{} (:quit to exit)", APP_NAME, VERSION);
            repl(&catalog, &config)
        }
    }
}

fn main() -> ExitCode {
    let raw_args: Vec<String> = env::args().collect();
    let args = match parse_arguments(&raw_args) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {}", e);
            print_usage();
            return ExitCode::FAILURE;
        }
    };

    if args.help {
        print_usage();
        return ExitCode::SUCCESS;
    }

    setup_logging(args.verbose);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
