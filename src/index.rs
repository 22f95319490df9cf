//! Name and category listings over a [`Timeline`].
//!
//! Every listing is duplicate free and keeps first-seen order. Rows without
//! clips still show up in plain row-name listings, but contribute nothing to
//! qualifier or attribute listings.
use std::hash::Hash;

use indexmap::IndexSet;

use crate::construct::{Attribute, OtherHasher, Qualifier, Row, Timeline};

/// First-seen de-duplication of any sequence.
pub fn unique<T, I>(items: I) -> Vec<T>
where
    T: Hash + Eq,
    I: IntoIterator<Item = T>,
{
    items
        .into_iter()
        .collect::<IndexSet<T, OtherHasher>>()
        .into_iter()
        .collect()
}

fn owned<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    unique(names).into_iter().map(String::from).collect()
}

pub struct Indexer<'t> {
    timeline: &'t Timeline,
    row: Option<String>,
}

impl<'t> Indexer<'t> {
    pub fn new(timeline: &'t Timeline) -> Self {
        Self { timeline, row: None }
    }
    /// Restricts qualifier and attribute listings to rows with this exact name.
    pub fn in_row(mut self, row_name: &str) -> Self {
        self.row = Some(row_name.to_owned());
        self
    }

    fn rows(&self) -> impl Iterator<Item = &'t Row> + '_ {
        self.timeline
            .rows()
            .iter()
            .filter(|row| self.row.as_deref().is_none_or(|name| row.name() == name))
    }
    fn qualifiers(&self) -> impl Iterator<Item = &'t Qualifier> + '_ {
        self.rows()
            .flat_map(|row| row.clips())
            .flat_map(|clip| clip.qualifiers())
    }
    fn attributes(&self) -> impl Iterator<Item = &'t Attribute> + '_ {
        self.qualifiers().flat_map(|qualifier| qualifier.attributes())
    }

    pub fn row_names(&self) -> Vec<String> {
        owned(self.rows().map(Row::name))
    }
    pub fn row_names_in_category(&self, category: &str) -> Vec<String> {
        owned(
            self.rows()
                .filter(|row| row.has_clips() && row.category() == Some(category))
                .map(Row::name),
        )
    }
    pub fn row_names_in_colour(&self, colour: &str) -> Vec<String> {
        owned(
            self.rows()
                .filter(|row| row.has_clips() && row.color() == Some(colour))
                .map(Row::name),
        )
    }
    pub fn row_categories(&self) -> Vec<String> {
        owned(self.rows().filter_map(Row::category))
    }

    pub fn qualifier_names(&self) -> Vec<String> {
        owned(self.qualifiers().map(Qualifier::name))
    }
    pub fn qualifier_categories(&self) -> Vec<String> {
        owned(self.qualifiers().map(Qualifier::category))
    }
    pub fn qualifier_names_in_category(&self, category: &str) -> Vec<String> {
        owned(
            self.qualifiers()
                .filter(|qualifier| qualifier.category() == category)
                .map(Qualifier::name),
        )
    }

    pub fn attribute_names(&self) -> Vec<String> {
        owned(self.attributes().map(Attribute::name))
    }
    pub fn attribute_categories(&self) -> Vec<String> {
        owned(self.attributes().map(Attribute::category))
    }
    pub fn attribute_names_in_category(&self, category: &str) -> Vec<String> {
        owned(
            self.attributes()
                .filter(|attribute| attribute.category() == category)
                .map(Attribute::name),
        )
    }
}
