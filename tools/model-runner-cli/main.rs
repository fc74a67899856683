use clap::{Parser, Subcommand};
use model_runner::prelude::*;
use serde_json::Value;
use std::fs;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Browse, fill in and run gateway-hosted models from the command line
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Gateway base URL
    #[arg(long, env = "MODEL_RUNNER_GATEWAY_URL")]
    gateway: Option<String>,

    /// Read the model catalog from a JSON file instead of the gateway
    #[arg(long)]
    catalog: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the models in the catalog
    List {
        /// Only show models whose name or description contains this text
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Show a model's header and its input form with default values
    Show { slug: String },
    /// Run a model
    Run {
        slug: String,
        /// JSON file with input values, keyed by field path
        #[arg(short, long)]
        input: Option<String>,
        #[arg(long, default_value_t = 1)]
        chain_id: u64,
        /// A block number, or "latest"
        #[arg(long, default_value = "latest")]
        block_number: String,
        /// A pinned model version, or "latest"
        #[arg(long, default_value = "latest")]
        version: String,
        /// Chart key (math path) used as the y-axis and as `val`
        #[arg(short, long)]
        key: Option<String>,
        /// Transform expression applied to every chart point
        #[arg(short, long)]
        transform: Option<String>,
    },
    /// List the chart keys of a saved run result
    Keys {
        slug: String,
        /// JSON file holding the run output
        result: String,
        /// Check a transform expression against the discovered keys
        #[arg(short, long)]
        transform: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config =
        Config::from_env().unwrap_or_else(|e| exit_with_error(&format!("Invalid configuration: {}", e)));
    if let Some(gateway) = cli.gateway.clone() {
        config.gateway_url = gateway;
    }
    let gateway: Arc<dyn ModelGateway> = Arc::new(
        HttpGateway::from_config(&config)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to create gateway client: {}", e))),
    );

    let catalog = load_catalog(cli.catalog.as_deref(), gateway.as_ref()).await;

    match cli.command {
        Command::List { search } => list_models(&catalog, search.as_deref().unwrap_or("")),
        Command::Show { slug } => show_model(&catalog, &slug, &config, gateway),
        Command::Run {
            slug,
            input,
            chain_id,
            block_number,
            version,
            key,
            transform,
        } => {
            let block_number = block_number.parse::<BlockNumber>().unwrap_or_else(|e| {
                exit_with_error(&format!("Invalid block number '{}': {}", block_number, e))
            });
            let run_config = RunConfig {
                chain_id,
                block_number,
                version: version.parse().unwrap_or_default(),
            };
            let options = RunOptions {
                input,
                run_config,
                key,
                transform,
            };
            run_model(&catalog, &slug, &config, gateway, options).await;
        }
        Command::Keys {
            slug,
            result,
            transform,
        } => list_keys(&catalog, &slug, &result, transform.as_deref(), &config),
    }
}

struct RunOptions {
    input: Option<String>,
    run_config: RunConfig,
    key: Option<String>,
    transform: Option<String>,
}

async fn load_catalog(path: Option<&str>, gateway: &dyn ModelGateway) -> Catalog {
    let loaded = match path {
        Some(path) => Catalog::from_file(path),
        None => Catalog::fetch(gateway).await,
    };
    loaded.unwrap_or_else(|e| exit_with_error(&format!("Failed to load catalog: {}", e)))
}

fn find_model(catalog: &Catalog, slug: &str) -> ModelMetadata {
    Selection::new(slug)
        .resolve(catalog)
        .cloned()
        .unwrap_or_else(|| exit_with_error(&format!("No model with slug '{}'", slug)))
}

fn list_models(catalog: &Catalog, search: &str) {
    let models = catalog.search(search);
    println!("{} model(s)", models.len());
    for model in models {
        println!("  {:<40} {}", model.slug, model.label());
        if let Some(description) = model.description.as_deref() {
            println!("  {:<40} {}", "", description);
        }
    }
}

fn show_model(catalog: &Catalog, slug: &str, config: &Config, gateway: Arc<dyn ModelGateway>) {
    let model = find_model(catalog, slug);
    let session = ModelSession::new(model, gateway, TransformEvaluator::new(config.precision))
        .unwrap_or_else(|e| exit_with_error(&format!("Invalid input schema: {}", e)));

    println!("{}\n", session.model().header());
    let fields = session
        .fields()
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to render form: {}", e)));
    print!("{}", fields);
    println!("\n{}", selection_link(slug));
}

async fn run_model(
    catalog: &Catalog,
    slug: &str,
    config: &Config,
    gateway: Arc<dyn ModelGateway>,
    options: RunOptions,
) {
    let model = find_model(catalog, slug);
    let mut session = ModelSession::new(model, gateway, TransformEvaluator::new(config.precision))
        .unwrap_or_else(|e| exit_with_error(&format!("Invalid input schema: {}", e)));

    if let Some(path) = options.input.as_deref() {
        for (key_path, value) in read_input(path) {
            session.form_mut().set_value(&key_path, value);
        }
    }
    session.runner().set_config(options.run_config);

    println!("Running {} ...", session.model().label());
    let start = Instant::now();
    let submission = session
        .submit()
        .await
        .unwrap_or_else(|e| exit_with_error(&format!("Model run failed: {}", e)));
    let duration = start.elapsed();

    match submission {
        Submission::Invalid(errors) => {
            eprintln!("\nThe input is not valid:");
            for (path, message) in errors.messages() {
                eprintln!("  {}: {}", if path.is_empty() { "input" } else { path.as_str() }, message);
            }
            std::process::exit(1);
        }
        Submission::Completed(RunOutcome::Failure(_)) => {
            if let Some(panel) = session.error_panel() {
                eprintln!("\n{}", panel);
            }
            std::process::exit(1);
        }
        Submission::Completed(RunOutcome::Success(output)) => {
            println!("Run finished in {:?}\n", duration);
            println!("{}", pretty(&output));
        }
    }

    let Some(chart) = session.chart_mut() else {
        return;
    };
    if !chart.has_chart_tab() {
        return;
    }
    print_keys(chart.keys());

    if let Some(key) = options.key.as_deref() {
        if !chart.select_key(key) {
            exit_with_error(&format!("Unknown chart key '{}'", key));
        }
    }
    if let Some(transform) = options.transform {
        chart.set_transform(transform);
        if !chart.is_transform_valid() {
            exit_with_error(&format!("Invalid expression: '{}'", chart.transform()));
        }
    }
    if options.key.is_none() && chart.transform().trim().is_empty() {
        return;
    }

    let line = session
        .chart_line()
        .transpose()
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to evaluate chart: {}", e)));
    if let Some(line) = line {
        println!("\n--- {} ---", line.name);
        for point in line.points {
            let timestamp = point
                .timestamp
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "-".to_string());
            println!("  {}  {}", timestamp, point.value);
        }
    }
}

fn list_keys(catalog: &Catalog, slug: &str, result_path: &str, transform: Option<&str>, config: &Config) {
    let model = find_model(catalog, slug);
    let result = read_json(result_path);
    let keys = discover(&model.output, &result)
        .unwrap_or_else(|e| exit_with_error(&format!("Invalid output schema: {}", e)));
    print_keys(&keys);

    if let Some(transform) = transform {
        let evaluator = TransformEvaluator::new(config.precision);
        if evaluator.validate(transform, &keys) {
            println!("\nExpression '{}' is valid", transform);
        } else {
            exit_with_error(&format!("Invalid expression: '{}'", transform));
        }
    }
}

fn print_keys(keys: &[ChartKey]) {
    println!("\n{} chart key(s)", keys.len());
    for key in keys {
        println!("  {:<30} {}", key.math_path, key.title.as_deref().unwrap_or(""));
    }
}

fn read_json(path: &str) -> Value {
    let content = fs::read_to_string(path)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to read '{}': {}", path, e)));
    serde_json::from_str(&content)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to parse '{}': {}", path, e)))
}

fn read_input(path: &str) -> Vec<(String, Value)> {
    match read_json(path) {
        Value::Object(values) => values.into_iter().collect(),
        _ => exit_with_error(&format!("Input file '{}' must hold a JSON object", path)),
    }
}

fn selection_link(slug: &str) -> String {
    Selection::new(slug).to_query()
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
