use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use skybook_client::{HttpBackendConfig, HttpFlightBackend};
use skybook_core::{
    normalize_text, parse_explicit_date, LocationCatalog, QueryResolver, ResolverConfig,
};
use skybook_dispatch::{ChatAssistant, CommandRegistry, Dispatcher, DEFAULT_SEARCH_LIMIT};
use skybook_observability::{init_tracing, DispatchMetrics};

#[derive(Debug, Parser)]
#[command(name = "skybook")]
#[command(about = "Skybook flight-search assistant CLI")]
struct Cli {
    /// JSON location catalog; the built-in catalog is used when absent.
    #[arg(long, env = "SKYBOOK_CATALOG", global = true)]
    catalog: Option<PathBuf>,

    /// JSON command registry; the built-in table is used when absent.
    #[arg(long, env = "SKYBOOK_COMMANDS", global = true)]
    commands: Option<PathBuf>,

    /// Reference day for relative dates (YYYY-MM-DD).
    #[arg(long, global = true)]
    today: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    Parse {
        text: String,
    },
    Dispatch {
        text: String,
    },
    Chat {
        #[arg(long)]
        api_url: Option<String>,
        #[arg(long, env = "SKYBOOK_SEARCH_LIMIT", default_value_t = DEFAULT_SEARCH_LIMIT)]
        limit: usize,
    },
    Catalog,
    Commands,
}

struct Setup {
    catalog: Arc<LocationCatalog>,
    registry: Arc<CommandRegistry>,
    resolver: QueryResolver,
    today: NaiveDate,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("skybook_cli");
    let cli = Cli::parse();

    let setup = load_setup(&cli)?;

    match cli.command {
        Command::Parse { text } => {
            let intent = setup
                .resolver
                .resolve(&normalize_text(&text), &setup.catalog, setup.today);
            println!("{}", serde_json::to_string_pretty(&intent)?);
        }
        Command::Dispatch { text } => {
            let text = normalize_text(&text);
            let intent = setup.resolver.resolve(&text, &setup.catalog, setup.today);
            let decision = Dispatcher::new(setup.registry.clone()).dispatch(&text, &intent);
            println!("{}", serde_json::to_string_pretty(&decision)?);
        }
        Command::Chat { api_url, limit } => {
            let mut config = HttpBackendConfig::from_env();
            if let Some(url) = api_url {
                config = config.with_base_url(url);
            }
            let backend = HttpFlightBackend::new(config)?;
            let fixed_today = cli.today.is_some();

            let mut assistant = ChatAssistant::new(
                setup.catalog,
                setup.resolver,
                Dispatcher::new(setup.registry),
                Arc::new(backend),
                DispatchMetrics::shared(),
            )
            .with_search_limit(limit);
            if fixed_today {
                assistant = assistant.with_today(setup.today);
            }

            run_chat(assistant).await?;
        }
        Command::Catalog => {
            println!("{}", serde_json::to_string_pretty(setup.catalog.locations())?);
        }
        Command::Commands => {
            for line in setup.registry.usage_lines() {
                println!("{line}");
            }
        }
    }

    Ok(())
}

async fn run_chat(assistant: ChatAssistant<HttpFlightBackend>) -> Result<()> {
    println!("Skybook chat mode. type 'exit' to quit.");

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            break;
        }

        let message = line.trim();
        if message.eq_ignore_ascii_case("exit") || message.eq_ignore_ascii_case("quit") {
            break;
        }

        if message.is_empty() {
            continue;
        }

        let reply = assistant.handle_message(message).await;

        println!("\n{}\n", reply.text);

        if !reply.suggestions.is_empty() {
            println!("Suggestions:");
            for suggestion in reply.suggestions {
                println!("- {suggestion}");
            }
            println!();
        }
    }

    let snapshot = assistant.metrics().snapshot();
    println!("{}", serde_json::to_string_pretty(&snapshot)?);

    Ok(())
}

fn load_setup(cli: &Cli) -> Result<Setup> {
    let catalog = match &cli.catalog {
        Some(path) => LocationCatalog::from_path(path)
            .with_context(|| format!("failed loading location catalog from {}", path.display()))?,
        None => LocationCatalog::builtin(),
    };

    let registry = match &cli.commands {
        Some(path) => CommandRegistry::from_path(path)
            .with_context(|| format!("failed loading command registry from {}", path.display()))?,
        None => CommandRegistry::builtin(),
    };

    let config = ResolverConfig::from_env().context("invalid resolver configuration")?;

    let today = match &cli.today {
        Some(raw) => parse_explicit_date(raw)
            .with_context(|| format!("invalid --today value `{raw}`"))?,
        None => Local::now().date_naive(),
    };

    Ok(Setup {
        catalog: Arc::new(catalog),
        registry: Arc::new(registry),
        resolver: QueryResolver::new(config),
        today,
    })
}
