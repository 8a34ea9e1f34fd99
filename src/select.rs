// Row selection: pick one representative row per timestamp.
//
// A selector is an ordered list of rules. For each timestamp the rules are
// tried in order; the first rule matching any row wins, taking the first
// matching row in input order. A timestamp no rule matches is dropped.

use std::collections::BTreeMap;

use crate::models::{Identified, Timestamp};
use crate::sources::{SourceKind, SourceTable};

#[derive(Debug, Clone, PartialEq)]
pub enum SelectionRule {
    /// Identifier equals the requested device / interface / CPU id.
    Exact(String),
    /// Identifier is one of the aggregate sentinels; earlier sentinels win.
    Sentinel(Vec<String>),
    /// First row with a non-empty identifier not starting with an excluded prefix.
    FirstNonExcluded(Vec<String>),
    /// First row, whatever it is.
    First,
}

impl SelectionRule {
    fn pick<'a, S: Identified>(&self, rows: &'a [S]) -> Option<&'a S> {
        match self {
            SelectionRule::Exact(id) => rows.iter().find(|r| r.identifier() == id),
            SelectionRule::Sentinel(ids) => ids
                .iter()
                .find_map(|id| rows.iter().find(|r| r.identifier() == id)),
            SelectionRule::FirstNonExcluded(prefixes) => rows.iter().find(|r| {
                let id = r.identifier();
                !id.is_empty() && !prefixes.iter().any(|p| id.starts_with(p.as_str()))
            }),
            SelectionRule::First => rows.first(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowSelector {
    rules: Vec<SelectionRule>,
}

impl RowSelector {
    pub fn new(rules: Vec<SelectionRule>) -> Self {
        Self { rules }
    }

    /// Requested id only when one is given, otherwise the aggregate sentinels.
    pub fn cpu(requested: Option<&str>, sentinels: &[String]) -> Self {
        match requested {
            Some(id) => Self::new(vec![SelectionRule::Exact(id.to_string())]),
            None => Self::new(vec![SelectionRule::Sentinel(sentinels.to_vec())]),
        }
    }

    pub fn single_row() -> Self {
        Self::new(vec![SelectionRule::First])
    }

    /// Only the named device; timestamps without it are dropped.
    pub fn strict(name: &str) -> Self {
        Self::new(vec![SelectionRule::Exact(name.to_string())])
    }

    /// The named device when present, else the first non-excluded one.
    pub fn preferring(requested: Option<&str>, excluded_prefixes: &[String]) -> Self {
        let mut rules = Vec::with_capacity(2);
        if let Some(name) = requested {
            rules.push(SelectionRule::Exact(name.to_string()));
        }
        rules.push(SelectionRule::FirstNonExcluded(excluded_prefixes.to_vec()));
        Self::new(rules)
    }

    pub fn pick<'a, S: Identified>(&self, rows: &'a [S]) -> Option<&'a S> {
        self.rules.iter().find_map(|rule| rule.pick(rows))
    }

    pub fn select<S: Identified + Clone>(
        &self,
        kind: SourceKind,
        table: &SourceTable<S>,
    ) -> Selected<S> {
        let rows: BTreeMap<Timestamp, S> = table
            .iter()
            .filter_map(|(ts, rows)| self.pick(rows).map(|s| (*ts, s.clone())))
            .collect();
        if rows.len() < table.len() {
            tracing::debug!(
                source = kind.name(),
                dropped = table.len() - rows.len(),
                "timestamps without a selectable row"
            );
        }
        Selected { kind, rows }
    }
}

/// A source after selection: at most one sample per timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct Selected<S> {
    pub kind: SourceKind,
    pub rows: BTreeMap<Timestamp, S>,
}

impl<S> Selected<S> {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
