//! Minimal end-to-end run: OpenAI-compatible provider plus the built-in
//! datetime tool.
//!
//! Requires `OPENAI_API_KEY`; `OPENAI_BASE_URL` and `OPENAI_MODEL` are
//! optional. Pass the prompt as the first argument:
//!
//! ```text
//! cargo run --example tool_agent -- "What time is it right now?"
//! ```

use std::sync::Arc;

use agent_core::{Agent, DateTimeTool};
use agent_runtime::OpenAiProvider;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();

    let provider = OpenAiProvider::from_env()?;
    let model = std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into());

    let agent = Agent::builder()
        .provider(Arc::new(provider))
        .model(model)
        .system_prompt("You are a concise assistant.")
        .tool(DateTimeTool)
        .verbose(true)
        .build()?;

    let prompt = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "What time is it right now?".into());

    let outcome = agent.run(&prompt).await?;

    println!("{}", outcome.text);
    tracing::info!(messages = outcome.messages.len(), "run finished");

    Ok(())
}
