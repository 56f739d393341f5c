//! Deterministic prompt assembly.
//!
//! The chat pipeline builds its prompt from an ordered list of sections
//! rather than ad-hoc string pushes, so the exact layout can be asserted in
//! tests. Section order is load-bearing: standing instructions first, then
//! reference material, then conversation history, then the current message —
//! later sections win the model's attention if the prompt is ever truncated
//! from the front.

/// Instruction used when an agent carries no `system_instructions`.
pub const DEFAULT_SYSTEM_INSTRUCTIONS: &str =
    "You are a helpful AI assistant designed for educational scenarios.";

/// Placeholder an agent's prompt template may use for the current message.
pub const MESSAGE_PLACEHOLDER: &str = "{message}";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Builder
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone)]
struct Section {
    /// Rendered as a `<label>:` line above the body when present.
    label: Option<String>,
    body: String,
}

/// An ordered list of labeled sections that serializes deterministically.
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    sections: Vec<Section>,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an unlabeled section. Empty bodies are skipped.
    pub fn push(&mut self, body: impl Into<String>) -> &mut Self {
        let body = body.into();
        if !body.trim().is_empty() {
            self.sections.push(Section { label: None, body });
        }
        self
    }

    /// Append a section under a `<label>:` heading. Empty bodies are skipped.
    pub fn push_labeled(&mut self, label: impl Into<String>, body: impl Into<String>) -> &mut Self {
        let body = body.into();
        if !body.trim().is_empty() {
            self.sections.push(Section {
                label: Some(label.into()),
                body,
            });
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Serialize the sections in insertion order, separated by blank lines.
    pub fn render(&self) -> String {
        let blocks: Vec<String> = self
            .sections
            .iter()
            .map(|s| match &s.label {
                Some(label) => format!("{}:\n{}", label, s.body),
                None => s.body.clone(),
            })
            .collect();
        blocks.join("\n\n")
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Template substitution
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Fold the current message into an agent's prompt template.
///
/// If the template contains [`MESSAGE_PLACEHOLDER`], the message is
/// substituted at every occurrence; otherwise the message is appended after
/// the template text. An empty template yields the message verbatim.
pub fn apply_template(template: &str, message: &str) -> String {
    let template = template.trim();
    if template.is_empty() {
        return message.to_owned();
    }
    if template.contains(MESSAGE_PLACEHOLDER) {
        template.replace(MESSAGE_PLACEHOLDER, message)
    } else {
        format!("{template}\n\n{message}")
    }
}
