//! LLM integration for selector discovery.

mod client;

pub use client::{
    parse_json_response, CompletionBackend, CompletionRequest, LlmClient, LlmConfig, LlmError,
    LlmProvider, LISTING_SELECTOR_PROMPT, PRODUCT_SELECTOR_PROMPT,
};
