use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use lexoffice_dispatch::batch::{BatchOptions, BatchRunner};
use lexoffice_dispatch::config::Config;
use lexoffice_dispatch::input::JsonInput;
use lexoffice_dispatch::resource::{Dispatcher, Operation, ResourceType, ValidationPolicy};
use lexoffice_dispatch::LexofficeClient;
use serde_json::{Map, Value};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Run lexoffice resource operations over a batch of input records
#[derive(Parser, Debug)]
#[command(name = "lexdispatch", version, about, long_about = None)]
struct Args {
    /// Resource tag, e.g. `contact` or `down-payment-invoice`
    #[arg(short, long)]
    resource: ResourceType,

    /// Operation tag, e.g. `get-all`
    #[arg(short, long)]
    operation: Operation,

    /// JSON or YAML file holding one record or an array of records
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Field applied to every record, `name=value` (value parsed as JSON when possible)
    #[arg(short, long = "field", value_parser = parse_field)]
    fields: Vec<(String, Value)>,

    /// Emit an error record for failed inputs instead of aborting
    #[arg(long)]
    continue_on_failure: bool,

    #[arg(long, env = "LEXOFFICE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[arg(long, env = "LEXOFFICE_RESOURCE_URL")]
    resource_url: Option<String>,

    #[arg(long, value_enum)]
    validation_policy: Option<PolicyArg>,

    /// Persist the effective settings to the config file (the API key only with --save-api-key)
    #[arg(long)]
    save_config: bool,

    /// With --save-config, also store the API key in the config file as plain text
    #[arg(long, requires = "save_config")]
    save_api_key: bool,

    /// Pretty-print the output
    #[arg(long)]
    pretty: bool,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off")]
    log_level: LogLevel,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PolicyArg {
    CreateOnly,
    Uniform,
}

impl From<PolicyArg> for ValidationPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::CreateOnly => ValidationPolicy::CreateOnly,
            PolicyArg::Uniform => ValidationPolicy::Uniform,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn parse_field(raw: &str) -> Result<(String, Value), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{}'", raw))?;
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((name.to_string(), value))
}

fn setup_logging(level: LogLevel) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let tracing_level = level.to_tracing_level()?;

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Failed to open log file {:?}: {}", log_path, e);
            return None;
        },
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("lexdispatch started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Some(guard)
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("lexdispatch").join("lexdispatch.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".lexdispatch").join("lexdispatch.log");
    }
    PathBuf::from("lexdispatch.log")
}

/// Read the input file (YAML is a superset of JSON) and apply `--field` overrides
fn load_input(args: &Args) -> Result<JsonInput> {
    let mut records: Vec<Map<String, Value>> = match &args.input {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read input file {:?}", path))?;
            let value: Value = serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse input file {:?}", path))?;
            match value {
                Value::Object(map) => vec![map],
                Value::Array(items) => items
                    .into_iter()
                    .enumerate()
                    .map(|(i, item)| match item {
                        Value::Object(map) => Ok(map),
                        _ => Err(anyhow::anyhow!("Input record {} is not an object", i)),
                    })
                    .collect::<Result<_>>()?,
                Value::Null => Vec::new(),
                _ => anyhow::bail!("Input must be an object or an array of objects"),
            }
        },
        None => Vec::new(),
    };

    if !args.fields.is_empty() {
        if records.is_empty() {
            records.push(Map::new());
        }
        for record in &mut records {
            for (name, value) in &args.fields {
                record.insert(name.clone(), value.clone());
            }
        }
    }

    Ok(JsonInput::new(records))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level);

    // CLI > env > config file
    let stored = Config::load();
    let mut config = stored.clone();
    if let Some(key) = &args.api_key {
        config.api_key = Some(key.clone());
    }
    if let Some(url) = &args.resource_url {
        config.resource_url = url.clone();
    }
    if let Some(policy) = args.validation_policy {
        config.validation_policy = policy.into();
    }
    if args.save_config {
        config
            .for_saving(&stored, args.save_api_key)
            .save()
            .context("Failed to save configuration")?;
    }

    tracing::info!("Using config: {:?}", config);

    let input = load_input(&args)?;
    let client = LexofficeClient::with_reqwest(config.credentials()?)?;
    let dispatcher = Dispatcher::new(client)
        .with_policy(config.validation_policy)
        .with_limits(config.paging_limits());

    let runner = BatchRunner::new(&dispatcher, args.resource, args.operation).with_options(
        BatchOptions {
            continue_on_failure: args.continue_on_failure,
        },
    );

    let (records, failure) = match runner.run(&input).await {
        Ok(records) => (records, None),
        Err(mut failure) => (std::mem::take(&mut failure.completed), Some(failure)),
    };

    let output = if args.pretty {
        serde_json::to_string_pretty(&records)?
    } else {
        serde_json::to_string(&records)?
    };
    println!("{}", output);

    match failure {
        Some(failure) => Err(anyhow::Error::new(failure)),
        None => Ok(()),
    }
}
