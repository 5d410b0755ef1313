//! Pluggable permission rules.
//!
//! A [`RuleRegistry`] maps operation names (e.g. `"shape.create"`) to
//! boolean-ish predicates. Rules are consulted by callers *before* a command
//! is dispatched, never by the handlers themselves; the outcome is attached
//! to the command context so handlers can act on conditional-allow reason
//! tokens such as [`DETACH`](super::move_shape::DETACH).
//!
//! The registry is a plain value composed into whatever owns the editing
//! session; concrete rule sets are built by registering their predicates at
//! initialization time.

use indexmap::IndexMap;
use std::fmt;

use super::command_stack::Command;
use crate::model::Diagram;

/// Trinary verdict of a rule evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleOutcome {
    /// The operation may proceed.
    Allowed,
    /// The operation must not be attempted.
    Denied,
    /// The operation may proceed, with special handling identified by a
    /// reason token (e.g. `"detach"`).
    AllowedWith(String),
}

impl RuleOutcome {
    /// Conditional allow with the given reason token.
    pub fn allowed_with(reason: impl Into<String>) -> Self {
        RuleOutcome::AllowedWith(reason.into())
    }

    pub fn is_allowed(&self) -> bool {
        !matches!(self, RuleOutcome::Denied)
    }

    /// The reason token of a conditional allow, if any.
    pub fn reason(&self) -> Option<&str> {
        match self {
            RuleOutcome::AllowedWith(reason) => Some(reason),
            _ => None,
        }
    }
}

type RuleFn = Box<dyn Fn(&Diagram, &Command) -> RuleOutcome>;

/// Predicate registry keyed by operation name.
#[derive(Default)]
pub struct RuleRegistry {
    rules: IndexMap<String, RuleFn>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `rule` for `operation`.
    ///
    /// At most one rule is kept per operation name: registering a second
    /// rule replaces the first, so the most recent registration wins.
    pub fn add_rule<F>(&mut self, operation: impl Into<String>, rule: F)
    where
        F: Fn(&Diagram, &Command) -> RuleOutcome + 'static,
    {
        self.rules.insert(operation.into(), Box::new(rule));
    }

    /// Evaluate the rule registered for `operation` against `command`.
    ///
    /// Operations without a registered rule are allowed.
    pub fn evaluate(&self, operation: &str, diagram: &Diagram, command: &Command) -> RuleOutcome {
        match self.rules.get(operation) {
            Some(rule) => rule(diagram, command),
            None => RuleOutcome::Allowed,
        }
    }
}

impl fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleRegistry")
            .field("operations", &self.rules.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Delta;
    use crate::modeling::move_shape::MoveContext;

    fn dummy_command(diagram: &mut Diagram) -> Command {
        let root = diagram.add_root("root");
        let shape = diagram.add_shape("shape", 0, 0, 10, 10, root).unwrap();
        Command::MoveShape(MoveContext::new(shape, Delta::new(1, 1)))
    }

    #[test]
    fn test_unregistered_operation_is_allowed() {
        let mut diagram = Diagram::new();
        let command = dummy_command(&mut diagram);
        let registry = RuleRegistry::new();

        assert_eq!(
            registry.evaluate("shape.move", &diagram, &command),
            RuleOutcome::Allowed
        );
    }

    #[test]
    fn test_last_registration_wins() {
        let mut diagram = Diagram::new();
        let command = dummy_command(&mut diagram);

        let mut registry = RuleRegistry::new();
        registry.add_rule("shape.move", |_, _| RuleOutcome::Denied);
        registry.add_rule("shape.move", |_, _| RuleOutcome::Allowed);

        assert_eq!(
            registry.evaluate("shape.move", &diagram, &command),
            RuleOutcome::Allowed
        );
    }

    #[test]
    fn test_reason_token_round_trips() {
        let mut diagram = Diagram::new();
        let command = dummy_command(&mut diagram);

        let mut registry = RuleRegistry::new();
        registry.add_rule("shape.move", |_, _| RuleOutcome::allowed_with("detach"));

        let outcome = registry.evaluate("shape.move", &diagram, &command);
        assert!(outcome.is_allowed());
        assert_eq!(outcome.reason(), Some("detach"));
    }
}
