//! Ordered occurrence detection over a clip's qualifier sequence.
//!
//! The scan keeps the position of the next expected criterion. A qualifier
//! meeting it advances that position, anything else resets it to zero
//! without re-testing the current qualifier against the first criterion.
//! After a complete occurrence the cursor rewinds by `len - 1`, so the next
//! attempt starts one qualifier after the occurrence began and overlapping
//! occurrences are still found.
use crate::construct::Qualifier;
use crate::criteria::Criterion;

/// Which test a qualifier has to pass to meet a criterion of the pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// Category, name and exact attribute pairs.
    Qualifier,
    /// Category and name, the qualifier must carry attributes, and empty
    /// attribute names are wildcards.
    AttributeSequence,
}

#[derive(Debug, Clone, Copy)]
pub struct PatternMatcher<'p> {
    pattern: &'p [Criterion],
    gate: Gate,
}

#[derive(Debug, Default)]
struct Scan {
    search_index: usize,
    cursor: usize,
}

impl<'p> PatternMatcher<'p> {
    pub fn new(pattern: &'p [Criterion]) -> Self {
        Self { pattern, gate: Gate::Qualifier }
    }
    pub fn with_gate(mut self, gate: Gate) -> Self {
        self.gate = gate;
        self
    }
    pub fn len(&self) -> usize {
        self.pattern.len()
    }
    pub fn is_empty(&self) -> bool {
        self.pattern.is_empty()
    }

    fn meets(&self, qualifier: &Qualifier, criterion: &Criterion) -> bool {
        match self.gate {
            Gate::Qualifier => criterion.matches(qualifier),
            Gate::AttributeSequence => criterion.matches_attribute_gate(qualifier),
        }
    }

    /// Start positions of every occurrence, in the order they complete.
    pub fn occurrences(&self, qualifiers: &[Qualifier]) -> Vec<usize> {
        let mut found = Vec::new();
        let k = self.pattern.len();
        if k == 0 {
            return found;
        }
        let mut scan = Scan::default();
        while scan.cursor < qualifiers.len() {
            let expected = &self.pattern[scan.search_index];
            if self.meets(&qualifiers[scan.cursor], expected) {
                scan.search_index += 1;
                if scan.search_index == k {
                    // k consecutive hits end here, so cursor >= k - 1
                    let start = scan.cursor + 1 - k;
                    found.push(start);
                    scan.search_index = 0;
                    scan.cursor = start;
                }
            } else {
                scan.search_index = 0;
            }
            scan.cursor += 1;
        }
        found
    }

    pub fn count(&self, qualifiers: &[Qualifier]) -> usize {
        self.occurrences(qualifiers).len()
    }
}
