//! selectorkit - LLM-assisted CSS selector discovery and replay.
//!
//! An LLM looks at one sample page per site template and proposes CSS
//! selectors; every selector is checked against the live DOM and saved per
//! domain. Later runs replay the saved selectors over listing pages or whole
//! sitemaps without calling the LLM again, writing one CSV per domain. A
//! site crawler and a Lighthouse wrapper round out the toolkit.

pub mod audit;
pub mod cli;
pub mod config;
pub mod crawl;
pub mod dataset;
pub mod llm;
pub mod pipeline;
pub mod replay;
pub mod scrapers;
pub mod selectors;
pub mod sitemap;
pub mod storage;
pub mod utils;
