//! Final ranking of extracted search results

use crate::models::{ProductDraft, ProductRecord};

/// Caps `drafts` at `target_count` and numbers them 1..=N in input order.
///
/// Items are not de-duplicated; marketplaces can repeat a product across
/// pages and each occurrence keeps its own rank.
pub fn assemble<I>(drafts: I, target_count: usize) -> Vec<ProductRecord>
where
    I: IntoIterator<Item = ProductDraft>,
{
    drafts
        .into_iter()
        .take(target_count)
        .enumerate()
        .map(|(index, draft)| ProductRecord::from_draft(index + 1, draft))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Field;

    fn draft(id: &str) -> ProductDraft {
        ProductDraft {
            external_id: Some(id.to_string()),
            title: Field::Found(format!("Item {id}")),
            ..ProductDraft::default()
        }
    }

    #[test]
    fn ranks_are_dense_and_capped() {
        let drafts = (0..7).map(|i| draft(&i.to_string()));
        let records = assemble(drafts, 5);
        assert_eq!(records.len(), 5);
        let ranks: Vec<usize> = records.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3, 4, 5]);
        assert_eq!(records[4].external_id.as_deref(), Some("4"));
    }

    #[test]
    fn fewer_items_than_target() {
        let records = assemble(vec![draft("a"), draft("b")], 10);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].rank, 2);
    }

    #[test]
    fn duplicates_are_kept() {
        let records = assemble(vec![draft("a"), draft("a")], 10);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].external_id, records[1].external_id);
        assert_ne!(records[0].rank, records[1].rank);
    }

    #[test]
    fn zero_target_yields_nothing() {
        assert!(assemble(vec![draft("a")], 0).is_empty());
    }
}
