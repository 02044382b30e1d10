//! semcache-cli: 语义缓存命令行工具：查询、回放与配置查看
//!
//! Usage:
//!   semcache-cli query <text...>                 Process one query
//!   semcache-cli replay [--file <path>]          Process one query per line (stdin by default)
//!   semcache-cli config                          Print the effective configuration

use ai_lib_semcache::{
    CacheConfig, EmbeddingClient, SavingsModel, SemanticCache, TemplateGenerator,
    UnavailableVectorizer, Vectorizer,
};
use anyhow::{anyhow, bail, Context};
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let result = match args[1].as_str() {
        "query" => cmd_query(&args[2..]).await,
        "replay" => cmd_replay(&args[2..]).await,
        "config" => cmd_config(&args[2..]),
        "version" | "--version" | "-V" => {
            cmd_version();
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn print_usage() {
    println!(
        r#"semcache-cli: 语义缓存命令行工具

USAGE:
    semcache-cli <COMMAND> [OPTIONS]

COMMANDS:
    query <text...>             Process one query, print the response and stats
    replay [--file <path>]      Process each non-empty line (stdin by default)
    config                      Print the effective configuration as YAML
    version                     Show version information
    help                        Show this help message

OPTIONS:
    --config <path>             Load configuration from a YAML file
    --pricing <model>           Use preset pricing (gpt-4o, gpt-4o-mini, claude-3-5-sonnet, claude-3-haiku)

ENVIRONMENT:
    SEMCACHE_*                  Configuration overrides when --config is not given
    OPENAI_API_KEY              Enables semantic matching via the embeddings API
    RUST_LOG                    Log filter (e.g. ai_lib_semcache=debug)"#
    );
}

fn cmd_version() {
    println!("semcache-cli {}", env!("CARGO_PKG_VERSION"));
}

/// Value following `flag`, if present.
fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

/// Options that consume the following argument.
const VALUE_FLAGS: [&str; 3] = ["--config", "--pricing", "--file"];

/// Arguments with known `--flag value` pairs removed.
fn positional(args: &[String]) -> Vec<&str> {
    let mut out = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if VALUE_FLAGS.contains(&arg.as_str()) {
            iter.next();
        } else {
            out.push(arg.as_str());
        }
    }
    out
}

fn load_config(args: &[String]) -> anyhow::Result<CacheConfig> {
    let config = match flag_value(args, "--config") {
        Some(path) => CacheConfig::from_file(PathBuf::from(path))?,
        None => CacheConfig::from_env()?,
    };
    Ok(config)
}

fn build_cache(args: &[String]) -> anyhow::Result<SemanticCache> {
    let config = load_config(args)?;
    let vectorizer: Arc<dyn Vectorizer> = if std::env::var("OPENAI_API_KEY").is_ok() {
        Arc::new(EmbeddingClient::builder().build()?)
    } else {
        tracing::warn!("OPENAI_API_KEY not set; semantic matching disabled");
        Arc::new(UnavailableVectorizer::new())
    };
    let mut builder = SemanticCache::builder()
        .vectorizer(vectorizer)
        .generator(Arc::new(TemplateGenerator::new()));
    if let Some(model) = flag_value(args, "--pricing") {
        let savings = SavingsModel::for_model(model)
            .ok_or_else(|| anyhow!("no pricing preset for {model}"))?;
        builder = builder.savings_model(savings);
    }
    Ok(builder.config(config).build()?)
}

async fn cmd_query(args: &[String]) -> anyhow::Result<()> {
    let text = positional(args).join(" ");
    if text.trim().is_empty() {
        bail!("query text is required");
    }
    let cache = build_cache(args)?;
    let resp = cache.process_query(&text).await?;
    println!("{}", serde_json::to_string(&resp)?);
    println!("{}", serde_json::to_string_pretty(&cache.stats()?)?);
    Ok(())
}

async fn cmd_replay(args: &[String]) -> anyhow::Result<()> {
    let cache = build_cache(args)?;
    let reader: Box<dyn BufRead> = match flag_value(args, "--file") {
        Some(path) => Box::new(std::io::BufReader::new(
            std::fs::File::open(path).with_context(|| format!("cannot open {path}"))?,
        )),
        None => Box::new(std::io::stdin().lock()),
    };
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let resp = cache.process_query(&line).await?;
        println!("{}", serde_json::to_string(&resp)?);
    }
    let stats = cache.stats()?;
    println!("{}", serde_json::to_string_pretty(&stats)?);
    eprintln!(
        "saved {} across {} requests",
        cache.savings_model().format(stats.cost_savings),
        stats.total_requests
    );
    Ok(())
}

fn cmd_config(args: &[String]) -> anyhow::Result<()> {
    let config = load_config(args)?;
    print!("{}", serde_yaml::to_string(&config)?);
    Ok(())
}
