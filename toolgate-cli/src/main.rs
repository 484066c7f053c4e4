//! Toolgate CLI
//!
//! Converts OpenAPI documents into function definitions, calls single
//! operations, and asks an agent questions answered from the live API.

#![allow(clippy::print_stdout)] // CLI program intentionally uses stdout

mod config;
mod error;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::Value;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use toolgate::prelude::*;

use crate::config::{ToolgateConfig, config_path, init_config, load_config_from};
use crate::error::{CliError, Result};

/// Toolgate - expose OpenAPI-described APIs to LLMs as function tools
#[derive(Parser)]
#[command(name = "toolgate")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file path
    #[arg(short, long, env = "TOOLGATE_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert an OpenAPI document into function definitions
    Convert(ConvertArgs),

    /// List the operations of an OpenAPI document
    Operations(SpecArgs),

    /// Execute one function against the API
    Call(CallArgs),

    /// Ask an agent a question answered from the API
    Ask(AskArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

/// Where the OpenAPI document and the API live
#[derive(Args)]
struct SpecArgs {
    /// OpenAPI document URL or file (overrides api.spec)
    #[arg(short, long)]
    spec: Option<String>,

    /// Base URL for API calls (overrides api.base_url)
    #[arg(long)]
    api_url: Option<String>,

    /// Extra header sent with API calls, as `Name: value`
    #[arg(short = 'H', long = "header")]
    headers: Vec<String>,

    /// Generate strict definitions (api.strict also enables this)
    #[arg(long)]
    strict: bool,
}

impl SpecArgs {
    const fn strict(&self, config: &ToolgateConfig) -> bool {
        self.strict || config.api.strict
    }
}

/// Arguments for the convert command
#[derive(Args)]
struct ConvertArgs {
    #[command(flatten)]
    spec: SpecArgs,

    /// Output file for the definitions (overrides output.functions_file)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Output file for the fetched document (overrides output.raw_spec_file)
    #[arg(long)]
    raw_out: Option<PathBuf>,
}

/// Arguments for the call command
#[derive(Args)]
struct CallArgs {
    #[command(flatten)]
    spec: SpecArgs,

    /// Function name
    name: String,

    /// JSON object of arguments
    #[arg(short, long, default_value = "{}")]
    args: String,
}

#[derive(Clone, Copy, ValueEnum)]
enum Toolkit {
    /// One tool per API operation
    Openapi,
    /// Generic HTTP request tools
    Requests,
    /// Tools that explore the OpenAPI document itself
    Json,
    /// Document exploration tools plus generic HTTP request tools
    Explorer,
}

/// Arguments for the ask command
#[derive(Args)]
struct AskArgs {
    #[command(flatten)]
    spec: SpecArgs,

    /// Model to use (overrides config)
    #[arg(short, long)]
    model: Option<String>,

    /// Maximum model round-trips
    #[arg(long)]
    max_steps: Option<usize>,

    /// Output token limit per model response (overrides agent.max_output_tokens)
    #[arg(long)]
    max_output_tokens: Option<u32>,

    /// Ask the model for at most one function call per response
    #[arg(long)]
    no_parallel_tool_calls: bool,

    /// Which tools the agent gets
    #[arg(short, long, value_enum, default_value_t = Toolkit::Openapi)]
    toolkit: Toolkit,

    /// Also offer POST, PUT, PATCH and DELETE request tools
    #[arg(long)]
    allow_dangerous_requests: bool,

    /// Add the tools of an MCP server; the OpenAPI document becomes optional
    #[cfg(feature = "mcp")]
    #[arg(long)]
    mcp_url: Option<String>,

    /// Only offer this MCP tool (repeatable; default: every tool)
    #[cfg(feature = "mcp")]
    #[arg(long = "mcp-tool", value_name = "NAME", requires = "mcp_url")]
    mcp_tools: Vec<String>,

    /// The question
    prompt: String,
}

/// Arguments for the config command
#[derive(Args)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Show configuration file path
    Path,
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("failed to create tokio runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match rt.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Initialize logging with the given verbosity level.
fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "toolgate={level},toolgate_cli={level},{}",
            if verbosity >= 3 { "debug" } else { "warn" }
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbosity >= 2)
        .with_writer(std::io::stderr)
        .init();
}

/// Main async entry point.
async fn run(cli: Cli) -> Result<()> {
    let path = cli.config.unwrap_or_else(config_path);
    match cli.command {
        Commands::Convert(args) => cmd_convert(args, &load_config_from(&path).await?).await,
        Commands::Operations(args) => cmd_operations(args, &load_config_from(&path).await?).await,
        Commands::Call(args) => cmd_call(args, &load_config_from(&path).await?).await,
        Commands::Ask(args) => cmd_ask(args, &load_config_from(&path).await?).await,
        Commands::Config(args) => cmd_config(args, path).await,
    }
}

/// Build a processor from flags layered over the `[api]` section.
fn processor(args: &SpecArgs, config: &ToolgateConfig) -> Result<OpenApiProcessor> {
    let spec = args
        .spec
        .as_deref()
        .or(config.api.spec.as_deref())
        .ok_or_else(|| CliError::usage("no OpenAPI document: pass --spec or set api.spec"))?;

    let mut processor = OpenApiProcessor::new(SpecSource::parse(spec));
    if let Some(url) = args.api_url.as_ref().or(config.api.base_url.as_ref()) {
        processor = processor.with_api_url(url);
    }
    for (name, value) in &config.api.headers {
        processor = processor.with_header(name, value);
    }
    for (name, value) in parse_headers(&args.headers)? {
        processor = processor.with_header(name, value);
    }
    Ok(processor)
}

fn parse_headers(raw: &[String]) -> Result<Vec<(&str, &str)>> {
    raw.iter()
        .map(|header| {
            header
                .split_once(':')
                .map(|(name, value)| (name.trim(), value.trim()))
                .filter(|(name, _)| !name.is_empty())
                .ok_or_else(|| CliError::usage(format!("invalid header '{header}', expected 'Name: value'")))
        })
        .collect()
}

async fn cmd_convert(args: ConvertArgs, config: &ToolgateConfig) -> Result<()> {
    let out = args.out.unwrap_or_else(|| config.output.functions_file.clone());
    let raw_out = args
        .raw_out
        .unwrap_or_else(|| config.output.raw_spec_file.clone());

    let mut processor = processor(&args.spec, config)?
        .with_functions_file(&out)
        .with_raw_spec_file(&raw_out);
    let functions = processor.process(args.spec.strict(config)).await?;

    println!(
        "Wrote {} function definitions to {}",
        functions.len(),
        out.display()
    );
    println!("Wrote the OpenAPI document to {}", raw_out.display());
    Ok(())
}

async fn cmd_operations(args: SpecArgs, config: &ToolgateConfig) -> Result<()> {
    let mut processor = processor(&args, config)?;
    processor.process(args.strict(config)).await?;
    let Some(document) = processor.document() else {
        return Ok(());
    };

    for op in document.operations() {
        println!(
            "{:<32} {:<7} {:<32} {}",
            op.function_name(),
            op.method,
            op.path,
            op.description().lines().next().unwrap_or_default()
        );
    }
    Ok(())
}

async fn cmd_call(args: CallArgs, config: &ToolgateConfig) -> Result<()> {
    serde_json::from_str::<Value>(&args.args)?;

    let mut processor = processor(&args.spec, config)?;
    processor.process(args.spec.strict(config)).await?;
    let result = processor
        .execute(&FunctionCall::new("cli", &args.name, &args.args))
        .await?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

async fn cmd_ask(args: AskArgs, config: &ToolgateConfig) -> Result<()> {
    let openai = config.openai_config(|name| std::env::var(name).ok())?;
    let provider: SharedProvider = Arc::new(OpenAI::new(openai)?);

    let (tools, default_instructions) = if mcp_only(&args, config) {
        (
            ToolBox::new(),
            "Answer the user's question with the tools provided.".to_owned(),
        )
    } else {
        let mut processor = processor(&args.spec, config)?;
        processor.process(args.spec.strict(config)).await?;
        toolkit(&args, config, &processor)?
    };

    #[cfg(feature = "mcp")]
    let tools = match &args.mcp_url {
        Some(url) => {
            let client = toolgate::mcp::McpClient::http(url.as_str())
                .await
                .map_err(toolgate::Error::from)?;
            let mut tools = tools;
            tools.extend(client.toolbox_filtered(&args.mcp_tools));
            tools
        }
        None => tools,
    };

    let mut agent = Agent::new("toolgate")
        .provider(provider)
        .tools(tools)
        .max_steps(args.max_steps.unwrap_or(config.agent.max_steps))
        .instructions(
            config
                .agent
                .instructions
                .clone()
                .unwrap_or(default_instructions),
        );
    if let Some(model) = args.model.as_ref().or(config.agent.model.as_ref()) {
        agent = agent.model(model);
    }
    if let Some(limit) = args.max_output_tokens.or(config.agent.max_output_tokens) {
        agent = agent.max_output_tokens(limit);
    }
    if args.no_parallel_tool_calls {
        agent = agent.parallel_tool_calls(false);
    }

    let result = agent.run(args.prompt).await?;
    tracing::info!(
        steps = result.steps,
        tool_calls = result.tool_calls.len(),
        total_tokens = result.usage.total_tokens,
        "agent finished"
    );
    println!("{}", result.output);
    Ok(())
}

/// True when the agent runs on MCP tools alone: a server URL but no document.
fn mcp_only(args: &AskArgs, config: &ToolgateConfig) -> bool {
    #[cfg(feature = "mcp")]
    let mcp = args.mcp_url.is_some();
    #[cfg(not(feature = "mcp"))]
    let mcp = false;
    mcp && args.spec.spec.is_none() && config.api.spec.is_none()
}

fn toolkit(
    args: &AskArgs,
    config: &ToolgateConfig,
    processor: &OpenApiProcessor,
) -> Result<(ToolBox, String)> {
    let document = processor
        .document()
        .ok_or_else(|| CliError::usage("OpenAPI document not loaded"))?;

    Ok(match args.toolkit {
        Toolkit::Openapi => (
            processor.toolbox()?,
            "Answer the user's question by calling the API functions. \
             Report API errors plainly."
                .to_owned(),
        ),
        Toolkit::Requests => {
            let (tools, base_url) = requests_tools(args, config, document)?;
            (
                tools,
                format!(
                    "Answer the user's question by sending HTTP requests to the API at {base_url}.\n\
                     Available endpoints:\n{}",
                    endpoint_list(document)
                ),
            )
        }
        Toolkit::Json => (
            JsonSpec::new(document.raw().clone()).toolbox(),
            "Answer the user's question about this OpenAPI document by exploring it \
             with the JSON tools. Start with the top-level keys."
                .to_owned(),
        ),
        Toolkit::Explorer => {
            let (requests, base_url) = requests_tools(args, config, document)?;
            let mut tools = JsonSpec::new(document.raw().clone()).toolbox();
            tools.extend(requests);
            (
                tools,
                format!(
                    "Answer the user's question by sending HTTP requests to the API at {base_url}. \
                     Explore its OpenAPI document with the JSON tools first to find the endpoint, \
                     its parameters and its request body."
                ),
            )
        }
    })
}

/// The `requests_*` tools and the base URL they are meant for.
fn requests_tools(
    args: &AskArgs,
    config: &ToolgateConfig,
    document: &Document,
) -> Result<(ToolBox, String)> {
    let base_url = args
        .spec
        .api_url
        .as_deref()
        .or(config.api.base_url.as_deref())
        .or_else(|| document.base_url())
        .ok_or_else(|| CliError::usage("the requests toolkit needs --api-url or a document server"))?
        .to_owned();

    let headers: Vec<(&str, &str)> = config
        .api
        .headers
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .chain(parse_headers(&args.spec.headers)?)
        .collect();

    let toolkit = RequestsToolkit::new()?
        .with_domain_headers(base_url.clone(), headers)?
        .allow_dangerous_requests(args.allow_dangerous_requests);
    Ok((toolkit.tools().into_iter().collect(), base_url))
}

fn endpoint_list(document: &Document) -> String {
    document
        .operations()
        .map(|op| format!("- {} {}: {}\n", op.method, op.path, op.description()))
        .collect()
}

/// Configuration management.
async fn cmd_config(args: ConfigArgs, path: PathBuf) -> Result<()> {
    match args.command {
        ConfigCommands::Path => {
            println!("{}", path.display());
        }
        ConfigCommands::Show => {
            let config = load_config_from(&path).await?.redacted();
            let text = toml::to_string_pretty(&config).map_err(config::ConfigError::from)?;
            println!("# {}", path.display());
            println!("{text}");
        }
        ConfigCommands::Init { force } => {
            init_config(&path, force).await?;
            println!("Configuration created: {}", path.display());
            println!();
            println!("Next steps:");
            println!("  1. set api.spec in {}", path.display());
            println!("  2. export OPENAI_API_KEY=<key>");
            println!("  3. toolgate ask \"<question>\"");
        }
    }
    Ok(())
}
