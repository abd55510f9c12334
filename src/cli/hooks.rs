//! Terminal side of a pipeline run: sample prompts and progress bars.

use console::style;
use dialoguer::{theme::ColorfulTheme, Select};
use indicatif::{ProgressBar, ProgressStyle};

use crate::crawl::CrawledPage;
use crate::pipeline::PipelineHooks;
use crate::replay::ReplayStep;
use crate::selectors::PageKind;
use crate::sitemap::PickerEvent;

const SAMPLE_CHOICES: [&str; 3] = ["Product page", "Listing page", "Re-do (pick another URL)"];

#[derive(Default)]
pub struct TerminalHooks {
    replay: Option<ProgressBar>,
    crawl: Option<ProgressBar>,
}

impl TerminalHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear any bars still on screen.
    pub fn finish(&mut self) {
        if let Some(pb) = self.replay.take() {
            pb.finish_and_clear();
        }
        if let Some(pb) = self.crawl.take() {
            pb.finish_and_clear();
        }
    }

    fn replay_bar(&mut self, total: usize) -> &ProgressBar {
        self.replay.get_or_insert_with(|| {
            let pb = ProgressBar::new(total as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {wide_msg}")
                    .unwrap()
                    .progress_chars("█▓░"),
            );
            pb
        })
    }

    fn crawl_spinner(&mut self) -> &ProgressBar {
        self.crawl.get_or_insert_with(|| {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} {msg}")
                    .unwrap(),
            );
            pb.enable_steady_tick(std::time::Duration::from_millis(100));
            pb
        })
    }
}

impl PipelineHooks for TerminalHooks {
    fn classify_sample(&mut self, url: &str) -> PickerEvent {
        println!("{} Sample page: {}", style("→").cyan(), url);
        let choice = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("What kind of page is this?")
            .items(&SAMPLE_CHOICES)
            .default(0)
            .interact();
        match choice {
            Ok(0) => PickerEvent::Classify(PageKind::Product),
            Ok(1) => PickerEvent::Classify(PageKind::Listing),
            Ok(_) => PickerEvent::Redo,
            Err(e) => {
                eprintln!("{} {}", style("!").yellow(), e);
                PickerEvent::Invalid
            }
        }
    }

    fn replay_step(&mut self, step: ReplayStep<'_>) {
        let pb = self.replay_bar(step.total);
        if !step.scraped {
            pb.println(format!("{} Skipped {}", style("!").yellow(), step.url));
        }
        pb.set_message(step.url.to_string());
        pb.set_position((step.index + 1) as u64);
        if step.index + 1 >= step.total {
            pb.finish_and_clear();
            self.replay = None;
        }
    }

    fn page_crawled(&mut self, page: &CrawledPage) {
        let pb = self.crawl_spinner();
        pb.inc(1);
        pb.set_message(format!(
            "{} pages; depth {} {}",
            pb.position(),
            page.depth,
            page.url
        ));
    }
}
