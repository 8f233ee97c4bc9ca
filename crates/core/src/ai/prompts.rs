//! Prompt templates for question and answer generation

use crate::config::PromptOverrides;
use crate::error::Result;
use handlebars::Handlebars;
use serde_json::json;
use std::collections::HashMap;

/// Template name for question prompts
pub const QUESTION_TEMPLATE: &str = "question";
/// Template name for answer prompts
pub const ANSWER_TEMPLATE: &str = "answer";

const BUILTIN_QUESTION_TEMPLATE: &str = include_str!("../../templates/question.hbs");
const BUILTIN_ANSWER_TEMPLATE: &str = include_str!("../../templates/answer.hbs");

/// Handlebars prompt library
///
/// Templates render without HTML escaping since the output goes to a model,
/// not a browser.
///
/// # Examples
///
/// ```
/// use qagen_core::ai::PromptLibrary;
///
/// let prompts = PromptLibrary::new();
/// let prompt = prompts.question_prompt("Rust is a systems language.").unwrap();
/// assert!(prompt.contains("Context: Rust is a systems language."));
/// assert!(prompt.ends_with("Question:"));
/// ```
#[derive(Debug, Clone)]
pub struct PromptLibrary {
    handlebars: Handlebars<'static>,
    templates: HashMap<String, String>,
}

impl PromptLibrary {
    /// Create a library with the built-in templates
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();
        handlebars.register_escape_fn(handlebars::no_escape);

        let mut library = Self {
            handlebars,
            templates: HashMap::new(),
        };

        library.register_template(QUESTION_TEMPLATE, BUILTIN_QUESTION_TEMPLATE);
        library.register_template(ANSWER_TEMPLATE, BUILTIN_ANSWER_TEMPLATE);
        library
    }

    /// Built-in templates with configured overrides applied
    pub fn with_overrides(overrides: &PromptOverrides) -> Result<Self> {
        let mut library = Self::new();
        if let Some(template) = &overrides.question {
            library.add_template(QUESTION_TEMPLATE, template)?;
        }
        if let Some(template) = &overrides.answer {
            library.add_template(ANSWER_TEMPLATE, template)?;
        }
        Ok(library)
    }

    fn register_template(&mut self, name: &str, template: &str) {
        if let Err(e) = self.handlebars.register_template_string(name, template) {
            tracing::warn!("Failed to register template '{}': {}", name, e);
            return;
        }
        self.templates.insert(name.to_string(), template.to_string());
    }

    /// Add or replace a template, failing on invalid syntax
    pub fn add_template(&mut self, name: &str, template: &str) -> Result<()> {
        self.handlebars
            .register_template_string(name, template)
            .map_err(|e| {
                crate::QagenError::validation(format!("Invalid template '{}': {}", name, e))
            })?;
        self.templates.insert(name.to_string(), template.to_string());
        Ok(())
    }

    /// Prompt asking for one open-ended question about `context`
    pub fn question_prompt(&self, context: &str) -> Result<String> {
        let rendered = self
            .handlebars
            .render(QUESTION_TEMPLATE, &json!({ "context": context }))?;
        Ok(rendered)
    }

    /// Prompt asking for a concise answer to `question` from `context`
    pub fn answer_prompt(&self, question: &str, context: &str) -> Result<String> {
        let rendered = self.handlebars.render(
            ANSWER_TEMPLATE,
            &json!({ "context": context, "question": question }),
        )?;
        Ok(rendered)
    }

    /// Names of registered templates
    pub fn template_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.templates.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for PromptLibrary {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_library_creation() {
        let library = PromptLibrary::new();
        assert_eq!(library.template_names(), vec!["answer", "question"]);
    }

    #[test]
    fn test_question_prompt_forbids_multiple_choice() {
        let prompt = PromptLibrary::new().question_prompt("ctx").unwrap();
        assert!(prompt.starts_with("Generate a question based on the following context."));
        assert!(prompt.contains("Don't make a multiple answer question"));
        assert!(prompt.contains("\n\nContext: ctx\n\nQuestion:"));
    }

    #[test]
    fn test_answer_prompt() {
        let prompt = PromptLibrary::new()
            .answer_prompt("What is <it>?", "It & that")
            .unwrap();
        assert!(prompt.starts_with("You are teacher making a test."));
        assert!(prompt.contains("Context: It & that\n\nQuestion: What is <it>?\n\nAnswer:"));
    }

    #[test]
    fn test_overrides() {
        let overrides = PromptOverrides {
            question: Some("Q for {{context}}".to_string()),
            answer: None,
        };
        let library = PromptLibrary::with_overrides(&overrides).unwrap();
        assert_eq!(library.question_prompt("x").unwrap(), "Q for x");
        assert!(library.answer_prompt("q", "c").unwrap().ends_with("Answer:"));
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let overrides = PromptOverrides {
            question: Some("{{#if}}".to_string()),
            answer: None,
        };
        assert!(PromptLibrary::with_overrides(&overrides).is_err());
    }
}
