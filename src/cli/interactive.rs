//! Prompt-driven front end producing the same [`Command`] the subcommands do.

use std::path::{Path, PathBuf};

use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Select};

use super::LlmArgs;
use crate::crawl::{CrawlConfig, CrawlMode};
use crate::llm::LlmProvider;
use crate::pipeline::{Command, DiscoverTarget, ReplaySource};
use crate::utils::is_http_url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Product,
    Listing,
    Sitemap,
    Replay,
    Crawl,
    Audit,
}

const MODES: [(Mode, &str); 6] = [
    (Mode::Product, "Product page: discover product selectors"),
    (Mode::Listing, "Listing page: discover, bootstrap and scrape"),
    (Mode::Sitemap, "Sitemap: sample a page, discover and scrape every URL"),
    (Mode::Replay, "Replay saved selectors (no LLM)"),
    (Mode::Crawl, "Crawl a site"),
    (Mode::Audit, "Lighthouse audit"),
];

const PROVIDERS: [LlmProvider; 4] = [
    LlmProvider::Ollama,
    LlmProvider::OpenAI,
    LlmProvider::Anthropic,
    LlmProvider::Gemini,
];

/// Everything the prompts collected.
pub struct Answers {
    pub command: Command,
    pub base_dir: PathBuf,
    /// Set when the LLM was switched on.
    pub llm: Option<LlmArgs>,
}

/// Walk the user through choosing what to run.
pub fn prompt(base_dir: Option<&Path>) -> anyhow::Result<Answers> {
    let theme = ColorfulTheme::default();

    let labels: Vec<&str> = MODES.iter().map(|(_, label)| *label).collect();
    let choice = Select::with_theme(&theme)
        .with_prompt("What do you want to do?")
        .items(&labels)
        .default(0)
        .interact()?;
    let mode = MODES[choice].0;

    let url: String = Input::with_theme(&theme)
        .with_prompt(match mode {
            Mode::Sitemap => "Sitemap URL",
            _ => "URL",
        })
        .validate_with(|input: &String| -> Result<(), &str> {
            if is_http_url(input.trim()) {
                Ok(())
            } else {
                Err("enter an http:// or https:// URL")
            }
        })
        .interact_text()?;
    let url = url.trim().to_string();

    let default_dir = base_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(|| crate::config::Settings::default().base_dir);
    let base_dir: String = Input::with_theme(&theme)
        .with_prompt("Output directory")
        .default(default_dir.display().to_string())
        .interact_text()?;

    let command = match mode {
        Mode::Product | Mode::Listing | Mode::Sitemap => {
            let use_llm = Confirm::with_theme(&theme)
                .with_prompt("Use the LLM to discover selectors?")
                .default(true)
                .interact()?;
            if !use_llm {
                println!(
                    "{} LLM off: using selectors saved by an earlier discovery",
                    style("!").yellow()
                );
            }
            let llm = if use_llm {
                Some(prompt_llm(&theme)?)
            } else {
                None
            };
            return Ok(Answers {
                command: discovery_command(mode, url, use_llm),
                base_dir: PathBuf::from(base_dir),
                llm,
            });
        }
        Mode::Replay => {
            let source = Select::with_theme(&theme)
                .with_prompt("Replay targets come from")
                .items(&["Listing page", "Sitemap"])
                .default(0)
                .interact()?;
            let source = if source == 0 {
                ReplaySource::Listing
            } else {
                ReplaySource::Sitemap
            };
            Command::Replay { source, url }
        }
        Mode::Crawl => prompt_crawl(&theme, url)?,
        Mode::Audit => Command::Audit { url },
    };

    Ok(Answers {
        command,
        base_dir: PathBuf::from(base_dir),
        llm: None,
    })
}

/// Map a discovery mode to its command. Without the LLM, listing and sitemap
/// runs fall back to replay and product runs only collect the page.
fn discovery_command(mode: Mode, url: String, use_llm: bool) -> Command {
    let target = match mode {
        Mode::Listing => DiscoverTarget::Listing,
        Mode::Sitemap => DiscoverTarget::Sitemap,
        _ => DiscoverTarget::Product,
    };
    if use_llm {
        return Command::Discover { target, url };
    }
    match target {
        DiscoverTarget::Product => Command::Collect { url },
        DiscoverTarget::Listing => Command::Replay {
            source: ReplaySource::Listing,
            url,
        },
        DiscoverTarget::Sitemap => Command::Replay {
            source: ReplaySource::Sitemap,
            url,
        },
    }
}

fn prompt_llm(theme: &ColorfulTheme) -> anyhow::Result<LlmArgs> {
    let names: Vec<String> = PROVIDERS.iter().map(|p| p.to_string()).collect();
    let choice = Select::with_theme(theme)
        .with_prompt("LLM provider")
        .items(&names)
        .default(0)
        .interact()?;
    let provider = PROVIDERS[choice];

    let model: String = Input::with_theme(theme)
        .with_prompt("Model")
        .default(provider.default_model().to_string())
        .interact_text()?;

    let api_key = match provider.api_key_env() {
        Some(var) if std::env::var(var).map(|k| !k.is_empty()).unwrap_or(false) => {
            println!("{} Using API key from {}", style("→").cyan(), var);
            None
        }
        Some(_) => {
            let key: String = Input::with_theme(theme)
                .with_prompt(format!("{} API key", provider))
                .interact_text()?;
            Some(key.trim().to_string()).filter(|k| !k.is_empty())
        }
        None => None,
    };

    Ok(LlmArgs {
        provider: Some(provider),
        model: Some(model),
        api_key,
        endpoint: None,
    })
}

fn prompt_crawl(theme: &ColorfulTheme, url: String) -> anyhow::Result<Command> {
    let order = Select::with_theme(theme)
        .with_prompt("Crawl order")
        .items(&["Breadth-first", "Depth-first", "Best-first (keyword scored)"])
        .default(0)
        .interact()?;
    let mode = match order {
        0 => CrawlMode::Breadth,
        1 => CrawlMode::Depth,
        _ => {
            let keywords: String = Input::with_theme(theme)
                .with_prompt("Keywords (space separated)")
                .allow_empty(true)
                .interact_text()?;
            CrawlMode::BestFirst {
                keywords: keywords.split_whitespace().map(str::to_string).collect(),
            }
        }
    };
    Ok(Command::Crawl {
        url,
        mode,
        limits: CrawlConfig::default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_llm_off_falls_back_to_replay() {
        let url = "https://shop.com/c".to_string();
        assert_eq!(
            discovery_command(Mode::Listing, url.clone(), false),
            Command::Replay {
                source: ReplaySource::Listing,
                url: url.clone()
            }
        );
        assert_eq!(
            discovery_command(Mode::Sitemap, url.clone(), false),
            Command::Replay {
                source: ReplaySource::Sitemap,
                url: url.clone()
            }
        );
        assert_eq!(
            discovery_command(Mode::Product, url.clone(), false),
            Command::Collect { url }
        );
    }

    #[test]
    fn test_llm_on_discovers() {
        let command = discovery_command(Mode::Sitemap, "https://shop.com/s.xml".to_string(), true);
        assert_eq!(
            command,
            Command::Discover {
                target: DiscoverTarget::Sitemap,
                url: "https://shop.com/s.xml".to_string()
            }
        );
        assert!(command.needs_llm());
    }
}
