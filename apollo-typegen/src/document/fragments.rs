//! Fragment table and fragment closure resolution.
use std::collections::BTreeSet;

use apollo_compiler::Name;
use apollo_compiler::Node;
use apollo_compiler::ast;
use indexmap::IndexMap;

use crate::error::DocumentError;

/// A fragment definition and the document that declares it.
#[derive(Debug, Clone)]
pub struct FragmentEntry {
    pub origin: String,
    pub definition: Node<ast::FragmentDefinition>,
}

/// Every fragment of a document set, by name, in discovery order.
#[derive(Debug, Clone, Default)]
pub struct FragmentTable {
    entries: IndexMap<Name, FragmentEntry>,
}

impl FragmentTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a fragment. Names are unique across the whole document set.
    pub fn insert(
        &mut self,
        origin: &str,
        definition: Node<ast::FragmentDefinition>,
    ) -> Result<(), DocumentError> {
        if let Some(existing) = self.entries.get(&definition.name) {
            return Err(DocumentError::DuplicateFragment {
                name: definition.name.to_string(),
                first: existing.origin.clone(),
                second: origin.to_owned(),
            });
        }
        self.entries.insert(
            definition.name.clone(),
            FragmentEntry {
                origin: origin.to_owned(),
                definition,
            },
        );
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&FragmentEntry> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Name, &FragmentEntry)> {
        self.entries.iter()
    }

    pub(crate) fn retain(&mut self, mut keep: impl FnMut(&FragmentEntry) -> bool) {
        self.entries.retain(|_, entry| keep(entry));
    }

    /// Fragments transitively referenced from `selections`, sorted by name.
    ///
    /// Spreads of fragments missing from the table are reported as well; validation rejects them.
    pub fn closure(&self, selections: &[ast::Selection]) -> Vec<Name> {
        let mut visited = BTreeSet::new();
        self.visit(selections, &mut visited);
        visited.into_iter().collect()
    }

    /// Closure of a fragment's own selection set. The fragment itself is included only when it
    /// is reached through a cycle.
    pub fn closure_of_fragment(&self, name: &str) -> Vec<Name> {
        match self.entries.get(name) {
            Some(entry) => self.closure(&entry.definition.selection_set),
            None => Vec::new(),
        }
    }

    fn visit(&self, selections: &[ast::Selection], visited: &mut BTreeSet<Name>) {
        for selection in selections {
            match selection {
                ast::Selection::Field(field) => self.visit(&field.selection_set, visited),
                ast::Selection::InlineFragment(inline) => {
                    self.visit(&inline.selection_set, visited)
                }
                ast::Selection::FragmentSpread(spread) => {
                    if visited.insert(spread.fragment_name.clone()) {
                        if let Some(entry) = self.entries.get(&spread.fragment_name) {
                            self.visit(&entry.definition.selection_set, visited);
                        }
                    }
                }
            }
        }
    }
}

/// Names of the fragments spread directly in `selections`, in first-appearance order.
pub(crate) fn direct_spreads(selections: &[ast::Selection]) -> Vec<Name> {
    fn visit(selections: &[ast::Selection], spreads: &mut Vec<Name>) {
        for selection in selections {
            match selection {
                ast::Selection::Field(field) => visit(&field.selection_set, spreads),
                ast::Selection::InlineFragment(inline) => visit(&inline.selection_set, spreads),
                ast::Selection::FragmentSpread(spread) => {
                    if !spreads.contains(&spread.fragment_name) {
                        spreads.push(spread.fragment_name.clone());
                    }
                }
            }
        }
    }
    let mut spreads = Vec::new();
    visit(selections, &mut spreads);
    spreads
}
