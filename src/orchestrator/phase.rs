use serde::{Deserialize, Serialize};
use strum::Display;

/// Position of an invocation in the loop.
///
/// `Start → Reason`, then `Reason → Act → Reason` while the model requests
/// tools, and `Reason → End` once it answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Phase {
    Start,
    Reason,
    Act,
    End,
}
