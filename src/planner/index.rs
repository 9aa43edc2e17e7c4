//! Index selection by leftmost-prefix matching.

use std::collections::HashMap;

use tracing::debug;

use crate::catalog::TabMeta;
use crate::query::{CompOp, Condition};

/// Picks the best index on `tab` for the given table-local conditions.
///
/// Each index is scored by walking its key columns in order: a column
/// bound by an equality predicate extends the usable prefix, a column
/// bound by a range predicate extends it and ends it, an unbound column
/// ends it. The index with the strictly greatest score wins;
/// earlier-declared indexes win ties. No score ≥ 1 means no index.
///
/// On a match, returns the **full** ordered key-column list of the
/// chosen index (the executor pads unmatched suffix columns with
/// wildcards when building probe keys) and reorders `conds` so the
/// matched conditions come first, in index-key order, with the
/// remainder in their original order. The reorder is observable and
/// part of the scan's executor contract.
pub(crate) fn match_index_cols(
    tab: &TabMeta,
    conds: &mut Vec<Condition>,
) -> Option<Vec<String>> {
    // Partition by column name. A column under both an equality and a
    // range predicate scores through the equality map.
    let mut eq_map: HashMap<&str, usize> = HashMap::new();
    let mut neq_map: HashMap<&str, usize> = HashMap::new();
    for (i, cond) in conds.iter().enumerate() {
        if cond.op == CompOp::Eq {
            eq_map.insert(cond.lhs_col.col_name.as_str(), i);
        } else {
            neq_map.insert(cond.lhs_col.col_name.as_str(), i);
        }
    }

    let mut best: Option<(usize, usize)> = None; // (index position, prefix score)
    for (i, index) in tab.indexes.iter().enumerate() {
        let mut score = 0;
        for col in &index.cols {
            if eq_map.contains_key(col.name.as_str()) {
                score += 1;
            } else if neq_map.contains_key(col.name.as_str()) {
                score += 1;
                break; // a range predicate ends the usable prefix
            } else {
                break;
            }
        }
        if score > best.map_or(0, |(_, s)| s) {
            best = Some((i, score));
        }
    }
    let (best_pos, matched_len) = best?;
    let index = &tab.indexes[best_pos];

    // Positions of the matched conditions, in index-key order.
    let mut matched: Vec<usize> = Vec::with_capacity(matched_len);
    for col in index.cols.iter().take(matched_len) {
        let pos = eq_map
            .get(col.name.as_str())
            .or_else(|| neq_map.get(col.name.as_str()));
        if let Some(&p) = pos {
            matched.push(p);
        }
    }

    // Matched conditions first, remainder in original order.
    let mut slots: Vec<Option<Condition>> =
        std::mem::take(conds).into_iter().map(Some).collect();
    let mut reordered = Vec::with_capacity(slots.len());
    for &p in &matched {
        if let Some(cond) = slots[p].take() {
            reordered.push(cond);
        }
    }
    reordered.extend(slots.into_iter().flatten());
    *conds = reordered;

    let col_names = index.col_names();
    debug!(
        table = %tab.name,
        index = ?col_names,
        matched = matched_len,
        "index scan selected"
    );
    Some(col_names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::datum::{ColType, Value};
    use crate::query::TabCol;
    use crate::sql::ColDef;

    fn catalog_with_index(index_cols: &[&str]) -> Catalog {
        let mut catalog = Catalog::new();
        let cols: Vec<ColDef> = ["a", "b", "c", "d"]
            .iter()
            .map(|n| ColDef {
                name: n.to_string(),
                ty: ColType::Int,
                len: 4,
            })
            .collect();
        catalog.create_table("t", &cols).unwrap();
        let names: Vec<String> = index_cols.iter().map(|s| s.to_string()).collect();
        catalog.create_index("t", &names).unwrap();
        catalog
    }

    fn eq_cond(col: &str, v: i32) -> Condition {
        Condition::with_val(TabCol::new("t", col), CompOp::Eq, Value::Int(v))
    }

    fn gt_cond(col: &str, v: i32) -> Condition {
        Condition::with_val(TabCol::new("t", col), CompOp::Gt, Value::Int(v))
    }

    #[test]
    fn test_full_equality_prefix() {
        let catalog = catalog_with_index(&["a", "b", "c"]);
        let tab = catalog.get_table("t").unwrap();
        let mut conds = vec![eq_cond("b", 1), eq_cond("a", 2), gt_cond("c", 0)];

        let cols = match_index_cols(tab, &mut conds).unwrap();
        assert_eq!(cols, vec!["a", "b", "c"]);
        // Matched conditions first, in index-key order
        assert_eq!(conds[0].lhs_col.col_name, "a");
        assert_eq!(conds[1].lhs_col.col_name, "b");
        assert_eq!(conds[2].lhs_col.col_name, "c");
    }

    #[test]
    fn test_range_ends_prefix() {
        let catalog = catalog_with_index(&["a", "b", "c"]);
        let tab = catalog.get_table("t").unwrap();
        // a > 0 ends the prefix at length 1; b = 1 is left in place
        let mut conds = vec![gt_cond("a", 0), eq_cond("b", 1)];

        let cols = match_index_cols(tab, &mut conds).unwrap();
        assert_eq!(cols, vec!["a", "b", "c"]);
        assert_eq!(conds[0].lhs_col.col_name, "a");
        assert_eq!(conds[1].lhs_col.col_name, "b");
    }

    #[test]
    fn test_no_leading_column_no_index() {
        let catalog = catalog_with_index(&["a", "b"]);
        let tab = catalog.get_table("t").unwrap();
        let mut conds = vec![eq_cond("b", 1), gt_cond("c", 0)];

        assert!(match_index_cols(tab, &mut conds).is_none());
        // Condition order untouched when no index matches
        assert_eq!(conds[0].lhs_col.col_name, "b");
    }

    #[test]
    fn test_ties_resolve_to_earliest_index() {
        let mut catalog = catalog_with_index(&["a", "c"]);
        catalog
            .create_index("t", &["a".to_string(), "d".to_string()])
            .unwrap();
        let tab = catalog.get_table("t").unwrap();
        // Only `a` is bound: both indexes score 1, first declared wins
        let mut conds = vec![eq_cond("a", 5)];

        let cols = match_index_cols(tab, &mut conds).unwrap();
        assert_eq!(cols, vec!["a", "c"]);
    }

    #[test]
    fn test_strictly_longer_prefix_wins() {
        let mut catalog = catalog_with_index(&["a"]);
        catalog
            .create_index("t", &["b".to_string(), "c".to_string()])
            .unwrap();
        let tab = catalog.get_table("t").unwrap();
        let mut conds = vec![eq_cond("a", 1), eq_cond("b", 2), eq_cond("c", 3)];

        let cols = match_index_cols(tab, &mut conds).unwrap();
        assert_eq!(cols, vec!["b", "c"]);
        assert_eq!(conds[0].lhs_col.col_name, "b");
        assert_eq!(conds[1].lhs_col.col_name, "c");
        assert_eq!(conds[2].lhs_col.col_name, "a");
    }

    #[test]
    fn test_equality_beats_range_on_same_column() {
        let catalog = catalog_with_index(&["a", "b"]);
        let tab = catalog.get_table("t").unwrap();
        // `a` carries both an equality and a range predicate; the
        // equality extends the prefix so `b` still matches.
        let mut conds = vec![gt_cond("a", 0), eq_cond("a", 1), eq_cond("b", 2)];

        let cols = match_index_cols(tab, &mut conds).unwrap();
        assert_eq!(cols, vec!["a", "b"]);
        assert_eq!(conds[0], eq_cond("a", 1));
        assert_eq!(conds[1], eq_cond("b", 2));
        assert_eq!(conds[2], gt_cond("a", 0));
    }
}
