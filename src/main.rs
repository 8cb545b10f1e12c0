//! threadloop CLI binary entry point.

use std::sync::Arc;

use threadloop::cli::{ChatArgs, Cli, Commands, HistoryArgs};
use threadloop::config::ThreadloopConfig;
use threadloop::orchestrator::{open_store, AgentEvent, OrchestratorBuilder};
use threadloop::types::Role;

#[tokio::main]
async fn main() {
    threadloop::telemetry::init_tracing();
    let cli = Cli::parse_args();

    let result = match load_config(&cli) {
        Ok(config) => match cli.command {
            Commands::Chat(args) => handle_chat(&config, args).await,
            Commands::History(args) => handle_history(&config, args).await,
            Commands::Threads => handle_threads(&config).await,
        },
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn load_config(cli: &Cli) -> Result<ThreadloopConfig, threadloop::error::ThreadloopError> {
    let mut config = ThreadloopConfig::load(cli.config.as_deref())?;
    if let Some(steps) = cli.max_steps {
        config.max_steps = steps;
        config.validate()?;
    }
    Ok(config)
}

async fn handle_chat(
    config: &ThreadloopConfig,
    args: ChatArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let thread_id = args
        .thread
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let mut builder = OrchestratorBuilder::from_config(config).await?;
    if args.verbose {
        builder = builder.with_event_sink(Arc::new(|event: AgentEvent| match event {
            AgentEvent::ToolCallStarted { call, .. } => {
                eprintln!("⚡ {} ({}) {}", call.name, call.id, call.arguments);
            }
            AgentEvent::ToolCallCompleted {
                tool_name, is_error, ..
            } => {
                let mark = if is_error { "❌" } else { "✅" };
                eprintln!("  {mark} {tool_name}");
            }
            _ => {}
        }));
    }
    let orchestrator = builder.build()?;

    let response = orchestrator.invoke(&thread_id, &args.message).await;
    println!("thread: {thread_id}");
    println!("{response}");
    Ok(())
}

async fn handle_history(
    config: &ThreadloopConfig,
    args: HistoryArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(&config.checkpoint).await?;
    let Some(state) = store.load(&args.thread).await? else {
        eprintln!("No history for thread '{}'", args.thread);
        return Ok(());
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(state.messages())?);
        return Ok(());
    }
    for message in state.messages() {
        match message.role {
            Role::Tool => {
                let id = message.tool_call_id.as_deref().unwrap_or("?");
                println!("[tool {id}] {}", message.content);
            }
            Role::Assistant if message.has_tool_calls() => {
                for call in &message.tool_calls {
                    println!("[assistant → {}] {}", call.name, call.arguments);
                }
            }
            role => println!("[{role}] {}", message.content),
        }
    }
    Ok(())
}

async fn handle_threads(config: &ThreadloopConfig) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(&config.checkpoint).await?;
    for thread_id in store.list_threads().await? {
        println!("{thread_id}");
    }
    Ok(())
}
