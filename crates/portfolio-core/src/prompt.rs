//! System preamble templating.
//!
//! Templates use `{{name}}` placeholders. Names with no matching variable
//! render as nothing.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use regex::{Captures, Regex};

use crate::content::ContentRecord;

/// Variable holding the serialized content record.
pub const PORTFOLIO_CONTEXT_VAR: &str = "portfolioContext";

pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are REN-AI, the assistant on a personal portfolio. Answer questions about the \
portfolio owner using only the details below. Keep answers short and friendly, \
and say so when the portfolio does not cover something.

Portfolio:
{{portfolioContext}}";

/// Builds preamble text from a variables mapping.
pub type PromptGenerator = Arc<dyn Fn(&HashMap<String, String>) -> String + Send + Sync>;

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("placeholder pattern is valid")
    })
}

pub fn render_template(template: &str, vars: &HashMap<String, String>) -> String {
    placeholder_re()
        .replace_all(template, |caps: &Captures| {
            vars.get(&caps[1]).cloned().unwrap_or_default()
        })
        .into_owned()
}

pub fn template_generator(template: impl Into<String>) -> PromptGenerator {
    let template = template.into();
    Arc::new(move |vars| render_template(&template, vars))
}

pub fn prompt_variables(content: &ContentRecord) -> HashMap<String, String> {
    HashMap::from([(PORTFOLIO_CONTEXT_VAR.to_string(), content.context_json())])
}
