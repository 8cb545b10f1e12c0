//! Threadloop: a tool-using conversational agent loop.
//!
//! Each invocation appends the user's message to a thread, lets the model
//! reason and call tools until it answers, and checkpoints the thread after
//! every step.
//!
//! # Quick Start
//!
//! ```no_run
//! use threadloop::prelude::*;
//!
//! # async fn example() -> threadloop::error::Result<()> {
//! let config = ThreadloopConfig::load(None)?;
//! let agent = Orchestrator::from_config(&config).await?;
//! let answer = agent.invoke("thread-1", "¿Cuándo empieza el año escolar?").await;
//! println!("{answer}");
//! # Ok(())
//! # }
//! ```

pub mod checkpoint;
pub mod config;
pub mod error;
pub mod nodes;
pub mod orchestrator;
pub mod prelude;
pub mod prompt;
pub mod provider;
pub mod router;
pub mod telemetry;
pub mod tools;
pub mod types;

#[cfg(feature = "cli")]
pub mod cli;
