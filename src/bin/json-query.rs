//! json-query CLI
//!
//! Stand-alone debug runner for the `json.query` processor: reads NDJSON (one raw record payload
//! per line), runs it through the processor in batches, and writes the transformed payloads to
//! stdout as NDJSON. Logs and the run summary go to stderr.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use tracing::Level;
use tracing_subscriber::fmt;

use json_query_processor::execution::{ExecutionEngine, ExecutionOptions};
use json_query_processor::processing::normalize;
use json_query_processor::specification::specification;
use json_query_processor::types::{Payload, Record};
use json_query_processor::{JsonQueryProcessor, Processor, ProcessorConfig, QueryLanguage};

/// Query and transform JSON payloads using JMESPath or jq expressions.
///
/// ## Examples
///
/// Extract a field from every line:
///   json-query --type jmespath --query user.name --input events.ndjson
///
/// Sum a list with jq, reading stdin:
///   cat orders.ndjson | json-query -t jq -q '.items | map(.price) | add'
#[derive(Parser, Debug)]
#[command(name = "json-query")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Query engine type
    #[arg(short = 't', long = "type", value_enum, required_unless_present_any = ["config", "print_spec"])]
    query_type: Option<QueryType>,

    /// Query expression
    #[arg(short = 'q', long, required_unless_present_any = ["config", "print_spec"])]
    query: Option<String>,

    /// JSON file with {"type": ..., "query": ...} (alternative to --type/--query)
    #[arg(short = 'c', long, conflicts_with_all = ["query_type", "query"])]
    config: Option<PathBuf>,

    /// NDJSON input file (default: stdin)
    #[arg(short = 'i', long)]
    input: Option<PathBuf>,

    /// Records per batch handed to the processor (must be >= 1)
    #[arg(long, default_value = "1000", value_parser = parse_positive_usize)]
    batch_size: usize,

    /// Worker threads; values above 1 process large batches in parallel
    #[arg(long, default_value = "1", value_parser = parse_positive_usize)]
    threads: usize,

    /// Log level
    #[arg(long, value_enum, default_value = "info")]
    log_level: LogLevel,

    /// Print the processor specification as JSON and exit
    #[arg(long)]
    print_spec: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum QueryType {
    Jmespath,
    Jq,
}

impl From<QueryType> for QueryLanguage {
    fn from(value: QueryType) -> Self {
        match value {
            QueryType::Jmespath => QueryLanguage::JmesPath,
            QueryType::Jq => QueryLanguage::Jq,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for Level {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

fn parse_positive_usize(s: &str) -> Result<usize, String> {
    let n: usize = s.parse().map_err(|e| format!("{e}"))?;
    if n == 0 {
        return Err("must be >= 1".to_string());
    }
    Ok(n)
}

/// Counters reported at the end of a run.
#[derive(Debug, Default)]
struct RunStats {
    records_read: u64,
    records_emitted: u64,
    batches: u64,
}

fn main() -> Result<()> {
    let args = Cli::parse();

    // stderr so stdout carries only output records
    fmt::Subscriber::builder()
        .with_max_level(Level::from(args.log_level))
        .with_writer(io::stderr)
        .init();

    if args.print_spec {
        println!("{}", serde_json::to_string_pretty(&specification())?);
        return Ok(());
    }

    let config = load_config(&args)?;
    let mut processor = JsonQueryProcessor::from_config(config).context("invalid processor configuration")?;
    if args.threads > 1 {
        let engine = ExecutionEngine::new(ExecutionOptions {
            num_threads: Some(args.threads),
            parallel_threshold: args.batch_size.min(ExecutionOptions::default().parallel_threshold),
            ..Default::default()
        })?;
        processor = processor.with_execution(engine);
    }
    processor.open()?;

    let reader: Box<dyn BufRead> = match &args.input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("failed to open {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(io::stdin().lock())),
    };
    let mut out = BufWriter::new(io::stdout().lock());

    let stats = run(&processor, reader, &mut out, args.batch_size)?;
    out.flush()?;
    processor.teardown()?;

    eprintln!();
    eprintln!("json-query completed:");
    eprintln!("  Batches:         {}", stats.batches);
    eprintln!("  Records read:    {}", stats.records_read);
    eprintln!("  Records emitted: {}", stats.records_emitted);
    eprintln!("  Records dropped: {}", stats.records_read - stats.records_emitted);
    Ok(())
}

fn load_config(args: &Cli) -> Result<ProcessorConfig> {
    if let Some(path) = &args.config {
        let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
        let config: ProcessorConfig = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("failed to parse {}", path.display()))?;
        return Ok(config);
    }
    match (args.query_type, &args.query) {
        (Some(kind), Some(query)) => Ok(ProcessorConfig::new(kind.into(), query.clone())),
        _ => bail!("--type and --query are required unless --config is given"),
    }
}

fn run(
    processor: &JsonQueryProcessor,
    reader: Box<dyn BufRead>,
    out: &mut impl Write,
    batch_size: usize,
) -> Result<RunStats> {
    let mut stats = RunStats::default();
    let mut batch = Vec::with_capacity(batch_size);

    for (idx, line) in reader.lines().enumerate() {
        let line = line.context("failed to read input")?;
        if line.trim().is_empty() {
            continue;
        }
        stats.records_read += 1;
        // position is the 1-based input line number
        batch.push(Record::new((idx + 1).to_string(), Payload::raw(line.into_bytes())));
        if batch.len() >= batch_size {
            flush_batch(processor, &mut batch, out, &mut stats)?;
        }
    }
    if !batch.is_empty() {
        flush_batch(processor, &mut batch, out, &mut stats)?;
    }
    Ok(stats)
}

fn flush_batch(
    processor: &JsonQueryProcessor,
    batch: &mut Vec<Record>,
    out: &mut impl Write,
    stats: &mut RunStats,
) -> Result<()> {
    stats.batches += 1;
    for record in processor.process(std::mem::take(batch)) {
        match record.after() {
            Some(Payload::Raw(raw)) => out.write_all(raw.as_bytes())?,
            Some(structured @ Payload::Structured(_)) => {
                let value = normalize(Some(structured))?;
                serde_json::to_writer(&mut *out, &value)?;
            }
            None => continue,
        }
        out.write_all(b"\n")?;
        stats.records_emitted += 1;
    }
    Ok(())
}
