//! Human-readable summaries of pipeline outcomes.

use console::style;

use crate::dataset::WriteOutcome;
use crate::pipeline::{DatasetReport, Outcome};
use crate::selectors::{BootstrapOutcome, Discovered};

pub fn print_outcome(outcome: &Outcome) {
    match outcome {
        Outcome::Collected(page) => {
            println!("{} Collected {}", style("✓").green(), page.url);
            for path in [&page.raw_path, &page.clean_path].into_iter().flatten() {
                println!("  {}", path.display());
            }
        }
        Outcome::Product(discovered) => print_discovered("Product", discovered),
        Outcome::Listing {
            listing,
            bootstrap,
            dataset,
        } => {
            print_discovered("Listing", listing);
            match bootstrap {
                BootstrapOutcome::AlreadyPresent(path) => println!(
                    "{} Product selectors already present at {}",
                    style("→").cyan(),
                    path.display()
                ),
                BootstrapOutcome::Discovered {
                    product_url,
                    discovered,
                } => {
                    println!("{} Bootstrapped from {}", style("→").cyan(), product_url);
                    print_discovered("Product", discovered);
                }
            }
            print_dataset(dataset);
        }
        Outcome::Sitemap {
            sample,
            kind,
            dataset,
        } => {
            println!(
                "{} Discovered {} selectors from {}",
                style("✓").green(),
                kind,
                sample
            );
            print_dataset(dataset);
        }
        Outcome::Replayed(dataset) => print_dataset(dataset),
        Outcome::Crawled(summary) => {
            println!(
                "{} Crawled {} pages ({} failed)",
                style("✓").green(),
                summary.pages,
                summary.failed
            );
            if summary.exported > 0 {
                println!("  {} artifacts exported", summary.exported);
            }
        }
        Outcome::Audited(report) => {
            println!("{} Lighthouse report written", style("✓").green());
            println!("  {}", report.html.display());
            println!("  {}", report.json.display());
        }
    }
}

fn print_discovered<S>(label: &str, discovered: &Discovered<S>) {
    println!(
        "{} {} selectors for {} saved to {}",
        style("✓").green(),
        label,
        discovered.domain,
        discovered.path.display()
    );
}

fn print_dataset(report: &DatasetReport) {
    match &report.written {
        WriteOutcome::NoRows => println!(
            "{} No rows scraped for {} ({} targets); nothing written",
            style("!").yellow(),
            report.domain,
            report.targets
        ),
        WriteOutcome::Written { path, rows } => println!(
            "{} {} of {} targets scraped into {}",
            style("✓").green(),
            rows,
            report.targets,
            path.display()
        ),
    }
}
