//! Command-line interface.
//!
//! Every subcommand is turned into a [`Command`] and handed to the
//! [`Pipeline`]; `interactive` builds the same value from prompts.

mod hooks;
mod interactive;
mod report;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use console::style;

use crate::config::{load_settings_with_options, Config, LoadOptions, Settings};
use crate::crawl::{CrawlConfig, CrawlMode};
use crate::llm::{LlmClient, LlmConfig, LlmProvider};
use crate::pipeline::{Command, DiscoverTarget, Pipeline, ReplaySource};
use crate::scrapers::create_fetcher;
use crate::sitemap::SitemapSource;

use self::hooks::TerminalHooks;

#[derive(Parser)]
#[command(name = "selectorkit")]
#[command(about = "Discover CSS selectors with an LLM once, then scrape with them")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Base output directory (overrides config file)
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

/// LLM overrides for discovery.
#[derive(Args, Debug, Clone, Default)]
pub struct LlmArgs {
    /// LLM provider: ollama, openai, anthropic (claude) or gemini
    #[arg(long, value_parser = parse_provider)]
    provider: Option<LlmProvider>,

    /// Model name (provider default when omitted)
    #[arg(long)]
    model: Option<String>,

    /// API key for hosted providers
    #[arg(long)]
    api_key: Option<String>,

    /// API endpoint (provider default when omitted)
    #[arg(long)]
    endpoint: Option<String>,
}

fn parse_provider(s: &str) -> Result<LlmProvider, String> {
    LlmProvider::parse(s).ok_or_else(|| {
        format!(
            "unknown provider '{}'; expected ollama, openai, anthropic or gemini",
            s
        )
    })
}

impl LlmArgs {
    /// Apply flags on top of the configured LLM settings.
    fn apply(&self, base: LlmConfig) -> LlmConfig {
        let mut config = match self.provider {
            Some(provider) => base.with_provider(provider),
            None => base,
        };
        if let Some(ref model) = self.model {
            config = config.with_model(model);
        }
        if let Some(ref endpoint) = self.endpoint {
            config = config.with_endpoint(endpoint);
        }
        if let Some(ref key) = self.api_key {
            config = config.with_api_key(key);
        }
        config
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a page and save its raw and clean HTML
    Collect {
        /// Page URL
        url: String,
    },

    /// Discover selectors with the LLM
    Discover {
        #[command(subcommand)]
        target: DiscoverCommands,
    },

    /// Scrape with previously discovered selectors (no LLM)
    Replay {
        #[command(subcommand)]
        source: ReplayCommands,
    },

    /// Crawl a site and export its pages
    Crawl {
        /// Start URL
        url: String,
        /// Traversal order
        #[arg(long, value_enum, default_value = "bfs")]
        mode: CrawlStrategy,
        /// Keywords for best-first scoring
        #[arg(long, num_args = 1..)]
        keywords: Vec<String>,
        /// Maximum pages to fetch
        #[arg(long)]
        max_pages: Option<usize>,
        /// Maximum link depth from the start page
        #[arg(long)]
        max_depth: Option<usize>,
        /// Follow links to other domains
        #[arg(long)]
        include_external: bool,
        /// Write per-page artifacts even outside best-first mode
        #[arg(long)]
        export: bool,
    },

    /// Run a Lighthouse audit
    Audit {
        /// Page URL
        url: String,
    },

    /// Answer prompts instead of passing flags
    Interactive,
}

#[derive(Subcommand)]
enum DiscoverCommands {
    /// Discover product-page selectors from one product page
    Product {
        url: String,
        #[command(flatten)]
        llm: LlmArgs,
    },
    /// Discover listing selectors, bootstrap product selectors, then scrape
    /// every product on the listing
    Listing {
        url: String,
        #[command(flatten)]
        llm: LlmArgs,
    },
    /// Discover selectors from a sampled sitemap page, then scrape every URL
    Sitemap {
        /// Sitemap or sitemap index URL
        url: String,
        #[command(flatten)]
        llm: LlmArgs,
    },
}

#[derive(Subcommand)]
enum ReplayCommands {
    /// Scrape every product linked from a listing page
    Listing { url: String },
    /// Scrape every URL in a sitemap
    Sitemap { url: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CrawlStrategy {
    /// Breadth-first
    Bfs,
    /// Depth-first
    Dfs,
    /// Keyword-scored best-first
    Best,
}

impl CrawlStrategy {
    fn into_mode(self, keywords: Vec<String>) -> CrawlMode {
        match self {
            CrawlStrategy::Bfs => CrawlMode::Breadth,
            CrawlStrategy::Dfs => CrawlMode::Depth,
            CrawlStrategy::Best => CrawlMode::BestFirst { keywords },
        }
    }
}

/// Translate parsed arguments into a pipeline command plus LLM overrides.
/// `None` for `interactive`, which asks for the command instead.
fn to_command(command: Commands) -> Option<(Command, LlmArgs)> {
    let discover = |target, url, llm| (Command::Discover { target, url }, llm);
    let translated = match command {
        Commands::Collect { url } => (Command::Collect { url }, LlmArgs::default()),
        Commands::Discover { target } => match target {
            DiscoverCommands::Product { url, llm } => discover(DiscoverTarget::Product, url, llm),
            DiscoverCommands::Listing { url, llm } => discover(DiscoverTarget::Listing, url, llm),
            DiscoverCommands::Sitemap { url, llm } => discover(DiscoverTarget::Sitemap, url, llm),
        },
        Commands::Replay { source } => {
            let (source, url) = match source {
                ReplayCommands::Listing { url } => (ReplaySource::Listing, url),
                ReplayCommands::Sitemap { url } => (ReplaySource::Sitemap, url),
            };
            (Command::Replay { source, url }, LlmArgs::default())
        }
        Commands::Crawl {
            url,
            mode,
            keywords,
            max_pages,
            max_depth,
            include_external,
            export,
        } => {
            let limits = CrawlConfig {
                max_pages,
                max_depth,
                include_external: include_external.then_some(true),
                export: export.then_some(true),
                ..Default::default()
            };
            let command = Command::Crawl {
                url,
                mode: mode.into_mode(keywords),
                limits,
            };
            (command, LlmArgs::default())
        }
        Commands::Audit { url } => (Command::Audit { url }, LlmArgs::default()),
        Commands::Interactive => return None,
    };
    Some(translated)
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (command, llm_args, base_dir) = match to_command(cli.command) {
        Some((command, llm_args)) => (command, llm_args, cli.base_dir),
        None => {
            let answers = interactive::prompt(cli.base_dir.as_deref())?;
            let llm_args = answers.llm.unwrap_or_default();
            (answers.command, llm_args, Some(answers.base_dir))
        }
    };

    let options = LoadOptions {
        config_path: cli.config,
        base_dir,
    };
    let (settings, config) = load_settings_with_options(options).await;
    let llm = command
        .needs_llm()
        .then(|| llm_args.apply(config.llm.clone()));
    execute(&settings, &config, command, llm).await
}

async fn execute(
    settings: &Settings,
    config: &Config,
    command: Command,
    llm_config: Option<LlmConfig>,
) -> anyhow::Result<()> {
    let fetcher = create_fetcher(
        &config.browser,
        &settings.user_agent,
        std::time::Duration::from_secs(settings.request_timeout),
    )
    .context("Failed to set up the page fetcher")?;
    let sitemaps = SitemapSource::new(Some(&settings.user_agent), settings.sitemap_timeout)
        .context("Failed to set up the sitemap client")?;

    let llm = match llm_config {
        Some(llm_config) => {
            println!(
                "{} LLM: {} ({})",
                style("→").cyan(),
                llm_config.provider,
                llm_config.model()
            );
            Some(LlmClient::new(llm_config)?)
        }
        None => None,
    };

    let mut pipeline = Pipeline::new(fetcher.as_ref(), &sitemaps, &settings.base_dir)
        .with_crawl_defaults(config.crawl.clone());
    if let Some(ref llm) = llm {
        pipeline = pipeline.with_llm(llm);
    }

    println!(
        "{} Output directory: {}",
        style("→").cyan(),
        settings.base_dir.display()
    );

    let mut hooks = TerminalHooks::new();
    let result = pipeline.run(command, &mut hooks).await;
    hooks.finish();
    fetcher.close().await;

    let outcome = result?;
    report::print_outcome(&outcome);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crawl_flags_become_limits() {
        let cli = Cli::parse_from([
            "selectorkit",
            "crawl",
            "https://shop.com",
            "--mode",
            "best",
            "--keywords",
            "phones",
            "galaxy",
            "--max-pages",
            "10",
        ]);
        let (command, _) = to_command(cli.command).unwrap();
        assert_eq!(
            command,
            Command::Crawl {
                url: "https://shop.com".to_string(),
                mode: CrawlMode::BestFirst {
                    keywords: vec!["phones".to_string(), "galaxy".to_string()]
                },
                limits: CrawlConfig {
                    max_pages: Some(10),
                    ..Default::default()
                },
            }
        );
    }

    #[test]
    fn test_discover_flags() {
        let cli = Cli::parse_from([
            "selectorkit",
            "-v",
            "discover",
            "listing",
            "https://shop.com/c/shoes",
            "--provider",
            "claude",
            "--model",
            "claude-3-5-sonnet-latest",
        ]);
        assert!(cli.verbose);
        let (command, llm) = to_command(cli.command).unwrap();
        assert!(command.needs_llm());
        assert_eq!(
            command,
            Command::Discover {
                target: DiscoverTarget::Listing,
                url: "https://shop.com/c/shoes".to_string()
            }
        );
        let config = llm.apply(LlmConfig::for_provider(LlmProvider::Ollama));
        assert_eq!(config.provider, LlmProvider::Anthropic);
        assert_eq!(config.model(), "claude-3-5-sonnet-latest");
    }

    #[test]
    fn test_unknown_provider_is_rejected() {
        let result = Cli::try_parse_from([
            "selectorkit",
            "discover",
            "product",
            "https://shop.com/p/1",
            "--provider",
            "mystery",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_replay_needs_no_llm() {
        let cli = Cli::parse_from([
            "selectorkit",
            "replay",
            "sitemap",
            "https://shop.com/sitemap.xml",
        ]);
        let (command, _) = to_command(cli.command).unwrap();
        assert!(!command.needs_llm());
    }

    #[test]
    fn test_interactive_has_no_direct_command() {
        let cli = Cli::parse_from(["selectorkit", "interactive"]);
        assert!(to_command(cli.command).is_none());
    }
}
