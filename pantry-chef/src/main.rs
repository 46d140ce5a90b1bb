//! Pantry Chef - turn leftover ingredients into recipe suggestions.
//!
//! Wires a single `web_search` tool and a fixed chef persona to an agent
//! built from `OPENAI_*` settings, then runs one request or an interactive
//! conversation.

#![allow(clippy::print_stdout)] // CLI program intentionally uses stdout

use std::io::{Write as _, stdin, stdout};
use std::process::ExitCode;

use clap::Parser;
use pantry::prelude::*;
use tracing::{Level, debug};
use tracing_subscriber::EnvFilter;

/// System prompt for the chef agent.
const CHEF_PROMPT: &str = "\
You are a personal chef. The user will give you a list of ingredients they have left over in their house.

Using the web search tool, search the web for recipes that can be made with the ingredients they have.

Return recipe suggestions and eventually the recipe instructions to the user, if requested.";

/// Pantry Chef - recipe ideas from what is left in your kitchen
#[derive(Parser)]
#[command(name = "pantry-chef")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Leftover ingredients, e.g. `eggs spinach feta`
    #[arg(required_unless_present = "interactive")]
    ingredients: Vec<String>,

    /// Model to use instead of OPENAI_MODEL_NAME
    #[arg(short, long)]
    model: Option<String>,

    /// Sampling temperature
    #[arg(short, long)]
    temperature: Option<f32>,

    /// Maximum reasoning steps per request
    #[arg(long)]
    max_steps: Option<usize>,

    /// Keep the conversation going (e.g. ask for the full recipe)
    #[arg(short, long)]
    interactive: bool,
}

impl Cli {
    fn model_overrides(&self) -> ModelOverrides {
        let mut overrides = ModelOverrides::new();
        if let Some(model) = &self.model {
            overrides = overrides.model(model);
        }
        if let Some(temperature) = self.temperature {
            overrides = overrides.temperature(temperature);
        }
        overrides
    }
}

#[derive(Debug, thiserror::Error)]
enum ChefError {
    #[error(transparent)]
    Pantry(#[from] pantry::Error),

    #[error("web search unavailable: {0}")]
    Tool(#[from] ToolError),

    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
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
        _ => Level::DEBUG,
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "pantry_chef={level},pantry={level},{}",
            if verbosity >= 2 { "debug" } else { "warn" }
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbosity >= 2)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> std::result::Result<(), ChefError> {
    let settings = ModelSettings::from_env();
    let factory = ClientFactory::new(&settings);

    let mut request = AgentOverrides::new()
        .name("chef")
        .tool(Box::new(WebSearchTool::from_env()?))
        .system_prompt(CHEF_PROMPT);
    let overrides = cli.model_overrides();
    if overrides != ModelOverrides::default() {
        request = request.model(factory.get_model(overrides)?);
    }
    if let Some(max_steps) = cli.max_steps {
        request = request.max_steps(max_steps);
    }
    let agent = factory.get_agent(request)?;
    debug!(?agent, "Chef agent ready");

    let first = if cli.ingredients.is_empty() {
        println!("Pantry Chef | type 'exit' to quit\n");
        match prompt("Ingredients: ")? {
            Some(line) => line,
            None => return Ok(()),
        }
    } else {
        cli.ingredients.join(", ")
    };

    let mut result = agent.run(first).await?;
    println!("\n{}\n", result.output);
    debug!(steps = result.steps, usage = %result.usage, "Request completed");

    if !cli.interactive {
        return Ok(());
    }

    while let Some(line) = prompt("You: ")? {
        let mut history = result.messages;
        history.push(Message::user(line));
        result = agent.run_conversation(history).await?;
        println!("\n{}\n", result.output);
    }
    Ok(())
}

/// Read one line from stdin. `None` on EOF, a blank line, or `exit`/`quit`.
fn prompt(label: &str) -> std::io::Result<Option<String>> {
    print!("{label}");
    stdout().flush()?;

    let mut line = String::new();
    if stdin().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    let line = line.trim();
    if line.is_empty() || matches!(line, "exit" | "quit") {
        return Ok(None);
    }
    Ok(Some(line.to_owned()))
}
