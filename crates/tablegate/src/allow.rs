//! The fixed set of tables a gate may query.

use crate::error::{GateError, GateResult};
use crate::ident::Ident;
use std::collections::BTreeSet;

/// Immutable table allow-list.
///
/// Names are compared exactly. Every entry is a valid identifier, so a name
/// that passes [`TableAllowList::check`] can be written into SQL text as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableAllowList {
    tables: BTreeSet<String>,
}

impl TableAllowList {
    /// Build an allow-list, rejecting malformed or duplicate names.
    pub fn new<I, S>(tables: I) -> GateResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = BTreeSet::new();
        for table in tables {
            let ident = Ident::parse(table.as_ref().trim())?;
            if !set.insert(ident.into_string()) {
                return Err(GateError::validation(format!(
                    "duplicate table in allow-list: {}",
                    table.as_ref().trim()
                )));
            }
        }
        Ok(Self { tables: set })
    }

    pub fn contains(&self, table: &str) -> bool {
        self.tables.contains(table)
    }

    /// `Ok(())` if `table` may be queried, else [`GateError::TableNotAllowed`].
    pub fn check(&self, table: &str) -> GateResult<()> {
        if self.contains(table) {
            Ok(())
        } else {
            Err(GateError::TableNotAllowed(table.to_string()))
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
