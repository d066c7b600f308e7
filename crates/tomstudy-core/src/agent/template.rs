//! Prompt template substitution.
//!
//! Templates use `{slot}` placeholders filled from the accumulated
//! pipeline context (snippet fields, user input, prior stage outputs).
//! Unknown slots are left in place. Substitution is a single pass, so
//! braces inside substituted values (code snippets, say) are never
//! re-expanded.

use std::collections::HashMap;

/// A prompt for one pipeline stage: the system message plus extra user
/// instruction turns appended after the participant's input.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    pub system: &'static str,
    pub instructions: &'static [&'static str],
}

/// Fill `{slot}` placeholders from the context map.
pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
    let re = regex::Regex::new(r"\{([a-z_]+)\}").unwrap();
    re.replace_all(template, |caps: &regex::Captures| {
        let key = &caps[1];
        vars.get(key)
            .cloned()
            .unwrap_or_else(|| format!("{{{}}}", key))
    })
    .to_string()
}
