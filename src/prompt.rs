//! System directive rendering for the reasoner.

use bon::Builder;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

const DEFAULT_LANGUAGE: &str = "Spanish";
const DEFAULT_PERSONA: &str = "Eres un asistente útil experto en las reglas y regulaciones de LAUSD \
que responde en español. Siempre utiliza la herramienta de búsqueda web para obtener información \
actualizada. Siempre provee enlaces a la información que encuentres.";

/// Persona and response-format instructions, fixed at startup.
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    /// Language every answer must be written in.
    #[builder(into, default = DEFAULT_LANGUAGE.to_string())]
    pub response_language: String,
    /// Domain persona appended after the generic instructions.
    #[builder(into, default = DEFAULT_PERSONA.to_string())]
    pub persona: String,
    /// Ask the model to cite the links it used.
    #[builder(default = true)]
    pub require_citations: bool,
    /// Ask the model to consult tools before answering.
    #[builder(default = true)]
    pub use_tools_first: bool,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Render the system directive placed before the thread history.
pub fn render_system_directive(
    config: &PromptConfig,
    tool_names: &[&str],
    now: DateTime<Utc>,
) -> String {
    let mut lines = vec![format!(
        "You are a helpful AI assistant who responds in {}. Use tools to make progress.",
        config.response_language
    )];
    lines.push("Do not repeat tasks endlessly.".to_string());
    if config.use_tools_first && !tool_names.is_empty() {
        lines.push("Always use the tools before giving your final answer.".to_string());
    }
    if config.require_citations {
        lines.push("Always include links to the sources you used.".to_string());
    }
    let tools = if tool_names.is_empty() {
        "none".to_string()
    } else {
        tool_names.join(", ")
    };
    lines.push(format!("Available tools: {tools}."));
    if !config.persona.trim().is_empty() {
        lines.push(config.persona.trim().to_string());
    }
    lines.push(format!(
        "Current time: {}",
        now.to_rfc3339_opts(SecondsFormat::Millis, true)
    ));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 1, 12, 30, 0).unwrap()
    }

    #[test]
    fn default_directive_lists_tools_time_and_persona() {
        let text = render_system_directive(
            &PromptConfig::default(),
            &["tavily_search_results_json"],
            fixed_now(),
        );

        assert!(text.starts_with("You are a helpful AI assistant who responds in Spanish."));
        assert!(text.contains("Available tools: tavily_search_results_json."));
        assert!(text.contains("Always use the tools"));
        assert!(text.contains("Always include links"));
        assert!(text.contains("LAUSD"));
        assert!(text.ends_with("Current time: 2024-07-01T12:30:00.000Z"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let config = PromptConfig::default();
        let a = render_system_directive(&config, &["a", "b"], fixed_now());
        let b = render_system_directive(&config, &["a", "b"], fixed_now());

        assert_eq!(a, b);
        assert!(a.contains("Available tools: a, b."));
    }

    #[test]
    fn optional_instructions_can_be_disabled() {
        let config = PromptConfig::builder()
            .response_language("English")
            .persona("")
            .require_citations(false)
            .use_tools_first(false)
            .build();

        let text = render_system_directive(&config, &[], fixed_now());

        assert!(text.contains("responds in English"));
        assert!(text.contains("Available tools: none."));
        assert!(!text.contains("Always use the tools"));
        assert!(!text.contains("links"));
        assert_eq!(text.lines().count(), 4);
    }

    #[test]
    fn deserializes_partial_config_over_defaults() {
        let config: PromptConfig = toml::from_str("response_language = \"English\"").unwrap();

        assert_eq!(config.response_language, "English");
        assert!(config.require_citations);
        assert_eq!(config.persona, DEFAULT_PERSONA);
    }
}
