//! Interactive chat command backed by the supervisor.

use crate::agent::{open_checkpointer, AgentFactory, ChatSession, Checkpointer};
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::tools::RequestConfig;
use console::style;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

/// Run the interactive chat command.
pub async fn run_chat(
    thread: Option<String>,
    model: Option<String>,
    settings: Settings,
) -> anyhow::Result<()> {
    if let Err(e) = preflight::check(Operation::Agent, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'docmate doctor' for detailed diagnostics.");
        return Err(e.into());
    }
    if let Err(e) = preflight::check(Operation::Documents, &settings) {
        Output::warning(&format!("{}; document tools will refuse requests.", e));
    }

    let factory = AgentFactory::from_settings(&settings, model.as_deref())?;

    let mut config = RequestConfig::new(settings.general.user_id.clone());
    if let Some(thread) = thread {
        config = config.with_thread(thread);
    }

    let checkpointer = open_checkpointer(&settings)?;
    let key = config.checkpoint_key();
    let resumed = checkpointer.load(&key).await?.len();

    let supervisor = factory.supervisor(&config);
    let agents = supervisor.agent_names().join(", ");
    let session = ChatSession::new(
        Arc::new(supervisor),
        checkpointer,
        settings.agent.history_limit,
    );

    println!("\n{}", style("Docmate Chat").bold().cyan());
    println!("{}", style(format!("Agents: {}", agents)).dim());
    println!("{}", style(format!("Thread: {}", config.thread_id)).dim());
    if resumed > 0 {
        println!(
            "{}",
            style(format!("Resuming thread with {} earlier messages.", resumed)).dim()
        );
    }
    println!(
        "{}\n",
        style("Type your message, or 'exit' to quit. Use 'clear' to reset conversation.").dim()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }

        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            Output::info("Goodbye!");
            break;
        }

        if input.eq_ignore_ascii_case("clear") {
            session.clear(&key).await?;
            Output::info("Conversation history cleared.");
            continue;
        }

        match session.send(&key, input).await {
            Ok(response) => {
                for call in &response.tool_calls {
                    let mark = if call.failed {
                        style("✗").red()
                    } else {
                        style("✓").green()
                    };
                    println!("{} {}", style(format!("  [{}]", call.name)).dim(), mark);
                }
                println!("\n{} {}\n", style("Docmate:").cyan().bold(), response.content);
            }
            Err(e) => {
                Output::error(&format!("Error: {}", e));
            }
        }
    }

    Ok(())
}
