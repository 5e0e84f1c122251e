//! Diagnostics
//!
//! The engine reports user-visible problems (mostly shader compile failures)
//! through the [`DiagnosticsSink`] trait. Messages are grouped by pipeline
//! item name so that a later successful compile can clear exactly the
//! diagnostics that belong to it.
//!
//! [`MessageStack`] is the default sink. It keeps every message in insertion
//! order and forwards it to the `log` facade.

use std::fmt;

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
    Message,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => f.write_str("error"),
            Self::Warning => f.write_str("warning"),
            Self::Message => f.write_str("message"),
        }
    }
}

/// Write-only diagnostics channel used by the engine.
pub trait DiagnosticsSink {
    fn report(&mut self, severity: Severity, group: &str, text: &str);
    fn clear_group(&mut self, group: &str);
}

/// One reported diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub severity: Severity,
    pub group: String,
    pub text: String,
}

/// Ordered, grouped list of diagnostics.
#[derive(Debug, Default, Clone)]
pub struct MessageStack {
    messages: Vec<Message>,
}

impl MessageStack {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages in the order they were reported.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Messages reported under `group`.
    pub fn group<'a>(&'a self, group: &'a str) -> impl Iterator<Item = &'a Message> + 'a {
        self.messages.iter().filter(move |m| m.group == group)
    }

    #[must_use]
    pub fn has_group(&self, group: &str) -> bool {
        self.group(group).next().is_some()
    }

    #[must_use]
    pub fn error_count(&self) -> usize {
        self.messages
            .iter()
            .filter(|m| m.severity == Severity::Error)
            .count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

impl DiagnosticsSink for MessageStack {
    fn report(&mut self, severity: Severity, group: &str, text: &str) {
        match severity {
            Severity::Error => log::error!("[{group}] {text}"),
            Severity::Warning => log::warn!("[{group}] {text}"),
            Severity::Message => log::info!("[{group}] {text}"),
        }
        self.messages.push(Message {
            severity,
            group: group.to_string(),
            text: text.to_string(),
        });
    }

    fn clear_group(&mut self, group: &str) {
        self.messages.retain(|m| m.group != group);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_group_only_removes_that_group() {
        let mut stack = MessageStack::new();
        stack.report(Severity::Error, "A", "broken");
        stack.report(Severity::Warning, "B", "suspicious");
        stack.report(Severity::Error, "A", "still broken");

        assert_eq!(stack.group("A").count(), 2);
        assert_eq!(stack.error_count(), 2);

        stack.clear_group("A");
        assert!(!stack.has_group("A"));
        assert!(stack.has_group("B"));
        assert_eq!(stack.messages().len(), 1);
    }
}
