use std::collections::HashSet;

use crate::constants::DEFAULT_UNWANTED_LABELS;
use crate::types::Entity;

/// Label-based deny list applied to recognized entities.
///
/// Keeps every entity whose label is not unwanted, in the original order
/// and with duplicates intact.
#[derive(Debug, Clone)]
pub struct EntityFilter {
    unwanted: HashSet<String>,
}

impl Default for EntityFilter {
    fn default() -> Self {
        Self::with_unwanted_labels(DEFAULT_UNWANTED_LABELS)
    }
}

impl EntityFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_unwanted_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            unwanted: labels.into_iter().map(|l| l.as_ref().to_string()).collect(),
        }
    }

    pub fn is_unwanted(&self, label: &str) -> bool {
        self.unwanted.contains(label)
    }

    pub fn filter(&self, entities: Vec<Entity>) -> Vec<Entity> {
        entities
            .into_iter()
            .filter(|e| !self.is_unwanted(&e.label))
            .collect()
    }
}

/// Applies the default unwanted-label policy
pub fn filter(entities: Vec<Entity>) -> Vec<Entity> {
    EntityFilter::default().filter(entities)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn e(text: &str, label: &str) -> Entity {
        Entity::new(text, label)
    }

    #[test]
    fn drops_every_default_unwanted_label() {
        let input: Vec<Entity> = DEFAULT_UNWANTED_LABELS
            .iter()
            .map(|label| e("x", label))
            .collect();
        assert!(filter(input).is_empty());
    }

    #[test]
    fn keeps_order_and_duplicates() {
        let input = vec![
            e("Apple", "ORG"),
            e("September", "DATE"),
            e("iPhone", "PRODUCT"),
            e("$999", "MONEY"),
            e("Apple", "ORG"),
        ];
        let output = filter(input.clone());
        assert_eq!(output, vec![e("Apple", "ORG"), e("iPhone", "PRODUCT"), e("Apple", "ORG")]);

        // output is an order-preserving subsequence of the input
        let mut rest = input.iter();
        for kept in &output {
            assert!(rest.any(|candidate| candidate == kept));
        }
    }

    #[test]
    fn labels_are_matched_exactly() {
        let output = filter(vec![e("2024", "date"), e("Q3", "DATE_RANGE")]);
        assert_eq!(output.len(), 2);
    }

    #[test]
    fn custom_deny_list_replaces_default() {
        let filter = EntityFilter::with_unwanted_labels(["ORG"]);
        let output = filter.filter(vec![e("Apple", "ORG"), e("September", "DATE")]);
        assert_eq!(output, vec![e("September", "DATE")]);
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(filter(Vec::new()).is_empty());
    }
}
