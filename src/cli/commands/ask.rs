//! Ask command - send one message to an agent.

use crate::agent::{AgentFactory, AgentResponse, Assistant};
use crate::cli::preflight::{self, Operation};
use crate::cli::{AgentChoice, Output};
use crate::config::Settings;
use crate::tools::RequestConfig;
use anyhow::Result;
use console::style;

/// Run the ask command.
pub async fn run_ask(
    message: &str,
    agent: AgentChoice,
    model: Option<String>,
    settings: Settings,
) -> Result<()> {
    let mut required = vec![Operation::Agent];
    match agent {
        AgentChoice::Documents => required.push(Operation::Documents),
        AgentChoice::Movies => required.push(Operation::Movies),
        AgentChoice::Supervisor => {}
    }
    for operation in required {
        if let Err(e) = preflight::check(operation, &settings) {
            Output::error(&format!("{}", e));
            Output::info("Run 'docmate doctor' for detailed diagnostics.");
            return Err(e.into());
        }
    }

    let factory = AgentFactory::from_settings(&settings, model.as_deref())?;
    let config = RequestConfig::new(settings.general.user_id.clone());

    let assistant: Box<dyn Assistant> = match agent {
        AgentChoice::Supervisor => Box::new(factory.supervisor(&config)),
        AgentChoice::Documents => Box::new(factory.document_agent(&config)),
        AgentChoice::Movies => Box::new(factory.movie_agent(&config)?),
    };

    let spinner = Output::spinner("Thinking...");
    let conversation = [crate::agent::user_message(message)?];

    match assistant.respond(&conversation).await {
        Ok(response) => {
            spinner.finish_and_clear();
            print_response(&response);
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Agent failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}

fn print_response(response: &AgentResponse) {
    println!("\n{}\n", response.content);

    if !response.tool_calls.is_empty() {
        Output::header(&format!("Tool calls ({})", response.tool_calls.len()));
        for call in &response.tool_calls {
            let mark = if call.failed {
                style("✗").red()
            } else {
                style("✓").green()
            };
            println!("  {} {}", mark, truncate(&call.to_string(), 80));
        }
        println!();
    }

    Output::info(&format!(
        "Answered by {} in {} iteration(s)",
        response.agent, response.iterations
    ));
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("list_documents({})", 80), "list_documents({})");
        assert_eq!(truncate("abcdefghij", 6), "abc...");
    }
}
