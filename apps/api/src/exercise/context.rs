//! Lesson context assembly: scenario text plus any attached mock documents,
//! and the URL acknowledgment note for web-search exercises.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::exercise::prompts::URL_ACKNOWLEDGMENT_NOTE;

/// A mock document the learner "loaded" into the exercise (meeting notes,
/// campaign brief, analytics dashboard).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextDocument {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LessonContext {
    pub scenario: String,
    pub documents: Vec<ContextDocument>,
}

impl LessonContext {
    pub fn new(scenario: impl Into<String>) -> Self {
        Self {
            scenario: scenario.into(),
            documents: Vec::new(),
        }
    }

    pub fn with_document(mut self, title: impl Into<String>, content: impl Into<String>) -> Self {
        self.documents.push(ContextDocument {
            title: title.into(),
            content: content.into(),
        });
        self
    }

    /// Scenario first, then each document as `\n\n{title}:\n{content}`.
    pub fn render(&self) -> String {
        let mut out = self.scenario.clone();
        for doc in &self.documents {
            out.push_str("\n\n");
            out.push_str(&doc.title);
            out.push_str(":\n");
            out.push_str(&doc.content);
        }
        out
    }
}

fn url_pattern() -> &'static Regex {
    static URL: OnceLock<Regex> = OnceLock::new();
    URL.get_or_init(|| Regex::new(r"[A-Za-z][A-Za-z0-9+.\-]*://\S+").expect("invalid url regex"))
}

/// Every `scheme://...` run in the prompt, in order of appearance.
pub fn detect_urls(prompt: &str) -> Vec<&str> {
    url_pattern().find_iter(prompt).map(|m| m.as_str()).collect()
}

/// The context passed to the simulate call. URLs are never fetched; when web
/// search is on and the prompt has any, the model is told to acknowledge them.
pub fn context_for_simulation(context: &str, prompt: &str, enable_web_search: bool) -> String {
    if enable_web_search && !detect_urls(prompt).is_empty() {
        format!("{context}\n\n{URL_ACKNOWLEDGMENT_NOTE}")
    } else {
        context.to_string()
    }
}
