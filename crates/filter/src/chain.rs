use crate::{Filter, FilterError};
use ssparse_types::{MessageSummary, PacketSummary, TransactionSummary};
use tracing::debug;

/// An ordered conjunction of filters.
///
/// A unit is retained only if every filter accepts it. An empty chain
/// accepts everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterChain {
    filters: Vec<Filter>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile every specification, failing on the first malformed one.
    pub fn parse<I, S>(specs: I) -> Result<Self, FilterError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut chain = Self::new();
        for spec in specs {
            let filter = Filter::parse(spec.as_ref())?;
            debug!(
                filter = %filter,
                field = %filter.field(),
                accept = filter.accepts_matches(),
                "Compiled filter"
            );
            chain.push(filter);
        }
        Ok(chain)
    }

    pub fn push(&mut self, filter: Filter) {
        self.filters.push(filter);
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Filter> {
        self.filters.iter()
    }

    pub fn transaction(&self, unit: &TransactionSummary) -> bool {
        self.filters.iter().all(|filter| filter.transaction(unit))
    }

    pub fn message(&self, unit: &MessageSummary) -> bool {
        self.filters.iter().all(|filter| filter.message(unit))
    }

    pub fn packet(&self, unit: &PacketSummary) -> bool {
        self.filters.iter().all(|filter| filter.packet(unit))
    }
}
