//! # Message Log
//!
//! Sink for the errors, warnings and notes produced while compiling a Blueprint.
//!
//! Messages use `@@` placeholders that are filled in, in order, with the labels
//! of the source tokens passed alongside. Every token is resolved to its *true*
//! source before it is stored: compiler-generated nodes and pins are registered
//! through [`MessageLog::notify_intermediate_object_creation`], so a diagnostic
//! raised on an expanded node points the editor back at what the user authored.
//!
//! Every appended message is mirrored as a `tracing` event.

use crate::graph::{NodeId, PinId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Identifies an object a diagnostic can point at.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectRef {
    Blueprint(String),
    Graph(String),
    Node { graph: String, node: NodeId },
    Pin { graph: String, node: NodeId, pin: PinId },
    Property(String),
    Function(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceToken {
    pub object: ObjectRef,
    pub label: String,
}

impl SourceToken {
    pub fn new(object: ObjectRef, label: impl Into<String>) -> Self {
        Self {
            object,
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub severity: Severity,
    pub text: String,
    pub tokens: Vec<SourceToken>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct MessageLog {
    pub messages: Vec<Message>,
    pub num_errors: usize,
    pub num_warnings: usize,
    /// Intermediate object -> object it was created from.
    #[serde(skip)]
    source_map: HashMap<ObjectRef, ObjectRef>,
    /// Expanded node -> node inside the macro graph it was cloned from.
    #[serde(skip)]
    macro_sources: HashMap<ObjectRef, ObjectRef>,
    /// Macro graph node -> macro instance nodes that expanded it.
    #[serde(skip)]
    macro_instances: HashMap<ObjectRef, Vec<ObjectRef>>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, text: &str, tokens: &[SourceToken]) {
        self.push(Severity::Error, text, tokens);
    }

    pub fn warning(&mut self, text: &str, tokens: &[SourceToken]) {
        self.push(Severity::Warning, text, tokens);
    }

    pub fn note(&mut self, text: &str, tokens: &[SourceToken]) {
        self.push(Severity::Note, text, tokens);
    }

    fn push(&mut self, severity: Severity, text: &str, tokens: &[SourceToken]) {
        let resolved: Vec<SourceToken> = tokens
            .iter()
            .map(|token| SourceToken {
                object: self.find_source_object(&token.object),
                label: token.label.clone(),
            })
            .collect();
        let text = substitute_tokens(text, &resolved);

        match severity {
            Severity::Error => {
                self.num_errors += 1;
                tracing::error!("[PBCC] {}", text);
            }
            Severity::Warning => {
                self.num_warnings += 1;
                tracing::warn!("[PBCC] {}", text);
            }
            Severity::Note => tracing::info!("[PBCC] {}", text),
        }

        self.messages.push(Message {
            severity,
            text,
            tokens: resolved,
        });
    }

    pub fn has_errors(&self) -> bool {
        self.num_errors > 0
    }

    pub fn errors(&self) -> impl Iterator<Item = &Message> + '_ {
        self.messages.iter().filter(|m| m.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Message> + '_ {
        self.messages.iter().filter(|m| m.severity == Severity::Warning)
    }

    /// Records that `new` was generated from `source`.
    pub fn notify_intermediate_object_creation(&mut self, new: ObjectRef, source: ObjectRef) {
        if new != source {
            self.source_map.insert(new, source);
        }
    }

    /// Records a node cloned out of a macro graph by expanding `instance`.
    pub fn notify_intermediate_macro_node(
        &mut self,
        new: ObjectRef,
        macro_source: ObjectRef,
        instance: ObjectRef,
    ) {
        self.notify_intermediate_object_creation(new.clone(), instance.clone());
        let instances = self.macro_instances.entry(macro_source.clone()).or_default();
        if !instances.contains(&instance) {
            instances.push(instance);
        }
        self.macro_sources.insert(new, macro_source);
    }

    /// Follows the provenance chain to the object the user authored.
    pub fn find_source_object(&self, object: &ObjectRef) -> ObjectRef {
        let mut current = object;
        // chains are acyclic; the bound only guards against a corrupt table
        for _ in 0..self.source_map.len() + 1 {
            match self.source_map.get(current) {
                Some(next) => current = next,
                None => break,
            }
        }
        current.clone()
    }

    /// The macro-graph node an expanded node was cloned from.
    pub fn macro_source_of(&self, object: &ObjectRef) -> Option<&ObjectRef> {
        self.macro_sources.get(object)
    }

    /// Every macro instance that expanded the given macro-graph node.
    pub fn macro_instances_of(&self, macro_source: &ObjectRef) -> &[ObjectRef] {
        self.macro_instances
            .get(macro_source)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The full intermediate -> source table.
    pub fn source_map(&self) -> &HashMap<ObjectRef, ObjectRef> {
        &self.source_map
    }
}

fn substitute_tokens(text: &str, tokens: &[SourceToken]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut labels = tokens.iter();
    let mut rest = text;
    while let Some(index) = rest.find("@@") {
        out.push_str(&rest[..index]);
        match labels.next() {
            Some(token) => out.push_str(&token.label),
            None => out.push_str("@@"),
        }
        rest = &rest[index + 2..];
    }
    out.push_str(rest);
    out
}
