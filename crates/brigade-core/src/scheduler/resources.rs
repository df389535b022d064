//! Shared-resource tagging for instructions.
//!
//! Two steps that share a tag (an oven, a single stovetop burner) may not
//! overlap in time even when different chefs run them. Tagging is pluggable
//! so exclusivity can be switched on without touching the encoder.

use std::collections::BTreeSet;
use std::fmt;

use crate::models::Instruction;

/// Classifies the physical resources an instruction occupies.
pub trait ResourceClassifier: Send + Sync + fmt::Debug {
    fn resources(&self, instruction: &Instruction) -> BTreeSet<String>;
}

/// Declares no resources, which leaves resource exclusivity vacuous.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoResources;

impl ResourceClassifier for NoResources {
    fn resources(&self, _instruction: &Instruction) -> BTreeSet<String> {
        BTreeSet::new()
    }
}

/// Tags instructions whose text contains a keyword (case-insensitive).
#[derive(Debug, Clone, Default)]
pub struct KeywordResources {
    rules: Vec<(String, String)>,
}

impl KeywordResources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rule: steps mentioning `keyword` occupy `resource`.
    pub fn with_rule(mut self, keyword: impl Into<String>, resource: impl Into<String>) -> Self {
        self.rules
            .push((keyword.into().to_lowercase(), resource.into()));
        self
    }

    /// Any baking step needs the (single) oven.
    pub fn oven() -> Self {
        Self::new().with_rule("bake", "oven")
    }
}

impl ResourceClassifier for KeywordResources {
    fn resources(&self, instruction: &Instruction) -> BTreeSet<String> {
        let text = instruction.task.to_lowercase();
        self.rules
            .iter()
            .filter(|(keyword, _)| text.contains(keyword.as_str()))
            .map(|(_, resource)| resource.clone())
            .collect()
    }
}
