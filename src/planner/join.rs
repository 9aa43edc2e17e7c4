//! Join-tree construction and predicate placement.
//!
//! `make_one_rel` turns the query's table list and condition list into
//! a single relation: one scan per table (with its local predicates
//! pushed onto it), joined bottom-up by the remaining cross-table
//! conditions, with a cartesian closure for tables no condition
//! mentions.

use tracing::debug;

use crate::catalog::Catalog;
use crate::query::{Condition, Query};

use super::error::PlannerError;
use super::index::match_index_cols;
use super::plan::{JoinKind, JoinPlan, Plan, ScanKind, ScanPlan};
use super::Planner;

/// Outcome of pushing a condition toward the leaves of a join tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PushDown {
    /// The subtree wholly owns the condition's left column.
    Left,
    /// The subtree wholly owns the condition's right column.
    Right,
    /// The condition was attached to a join below; stop.
    Attached,
    /// Neither side of the condition lives in the subtree.
    NoMatch,
}

/// Removes and returns the conditions local to `tab_name`: predicates
/// on that table with a literal rhs, and column-vs-column predicates
/// with both sides on that table. Cross-table conditions stay in
/// `conds` for the join operators above.
pub(crate) fn pop_conds(conds: &mut Vec<Condition>, tab_name: &str) -> Vec<Condition> {
    let mut solved = Vec::new();
    let mut i = 0;
    while i < conds.len() {
        let cond = &conds[i];
        let local = cond.lhs_col.tab_name == tab_name
            && match cond.rhs_col() {
                None => true,
                Some(rhs) => rhs.tab_name == tab_name,
            };
        if local {
            solved.push(conds.remove(i));
        } else {
            i += 1;
        }
    }
    solved
}

/// Pushes `cond` down to the deepest join whose two subtrees cover its
/// two sides, normalizing so the condition's lhs names the left
/// subtree (swapping the sides and inverting the operator when the
/// left child matched the right side).
pub(crate) fn push_conds(cond: &mut Condition, plan: &mut Plan) -> PushDown {
    match plan {
        Plan::Scan(scan) => {
            if scan.tab_name == cond.lhs_col.tab_name {
                PushDown::Left
            } else if cond
                .rhs_col()
                .is_some_and(|rhs| rhs.tab_name == scan.tab_name)
            {
                PushDown::Right
            } else {
                PushDown::NoMatch
            }
        }
        Plan::Join(join) => {
            let left_res = push_conds(cond, &mut join.left);
            if left_res == PushDown::Attached {
                return PushDown::Attached;
            }
            let right_res = push_conds(cond, &mut join.right);
            if right_res == PushDown::Attached {
                return PushDown::Attached;
            }
            if left_res == PushDown::NoMatch || right_res == PushDown::NoMatch {
                // At most one side is covered here; report it upward.
                return if left_res == PushDown::NoMatch {
                    right_res
                } else {
                    left_res
                };
            }
            if left_res == PushDown::Right {
                cond.swap_sides();
            }
            join.conds.push(cond.clone());
            PushDown::Attached
        }
        _ => PushDown::NoMatch,
    }
}

/// Builds the scan for one table: local predicates via [`pop_conds`],
/// then an index scan if leftmost-prefix matching finds one.
fn build_scan(
    catalog: &Catalog,
    tab_name: &str,
    conds: &mut Vec<Condition>,
) -> Result<Plan, PlannerError> {
    let mut curr_conds = pop_conds(conds, tab_name);
    let tab = catalog.get_table(tab_name)?;
    let scan = match match_index_cols(tab, &mut curr_conds) {
        Some(index_col_names) => ScanPlan {
            kind: ScanKind::Index,
            tab_name: tab_name.to_string(),
            conds: curr_conds,
            index_col_names,
        },
        None => ScanPlan {
            kind: ScanKind::Seq,
            tab_name: tab_name.to_string(),
            conds: curr_conds,
            index_col_names: Vec::new(),
        },
    };
    Ok(Plan::Scan(scan))
}

/// Takes the not-yet-joined scan for `table` out of the scan list and
/// records the table as joined.
fn pop_scan(
    scans: &mut [Option<Plan>],
    tables: &[String],
    joined: &mut Vec<String>,
    table: &str,
) -> Option<Plan> {
    let i = tables.iter().position(|t| t == table)?;
    let plan = scans[i].take()?;
    joined.push(table.to_string());
    Some(plan)
}

/// Probes for an index on the lhs table of `cond` whose leading key
/// column is the join column. `for_rhs` probes the rhs side instead.
fn covering_index(
    catalog: &Catalog,
    cond: &Condition,
    for_rhs: bool,
) -> Result<Option<Vec<String>>, PlannerError> {
    let mut probe = cond.clone();
    if for_rhs {
        probe.swap_sides();
    }
    let tab = catalog.get_table(&probe.lhs_col.tab_name)?;
    let mut probe_conds = vec![probe];
    Ok(match_index_cols(tab, &mut probe_conds))
}

/// Builds the first join, choosing the strategy from the enabled join
/// executors. NestLoop is the default; with only sort-merge enabled,
/// two covering indexes upgrade the join to SortMergeWithIndex over
/// condition-free index scans.
fn build_first_join(
    planner: &Planner,
    catalog: &Catalog,
    left: Plan,
    right: Plan,
    cond: Condition,
) -> Result<Plan, PlannerError> {
    let kind = if planner.enable_nestedloop_join {
        JoinKind::NestLoop
    } else if planner.enable_sortmerge_join {
        let left_cols = covering_index(catalog, &cond, false)?;
        let right_cols = covering_index(catalog, &cond, true)?;
        if let (Some(left_cols), Some(right_cols)) = (left_cols, right_cols) {
            let rhs_col = cond
                .rhs_col()
                .ok_or_else(|| {
                    PlannerError::Internal("join condition rhs is not a column".to_string())
                })?
                .clone();
            let left = Plan::Scan(ScanPlan {
                kind: ScanKind::Index,
                tab_name: cond.lhs_col.tab_name.clone(),
                conds: Vec::new(),
                index_col_names: left_cols,
            });
            let right = Plan::Scan(ScanPlan {
                kind: ScanKind::Index,
                tab_name: rhs_col.tab_name,
                conds: Vec::new(),
                index_col_names: right_cols,
            });
            debug!(kind = "sort_merge_with_index", "join strategy chosen");
            return Ok(Plan::Join(JoinPlan {
                kind: JoinKind::SortMergeWithIndex,
                left: Box::new(left),
                right: Box::new(right),
                conds: vec![cond],
            }));
        }
        JoinKind::SortMerge
    } else {
        return Err(PlannerError::Config(
            "no join executor enabled".to_string(),
        ));
    };
    debug!(kind = ?kind, "join strategy chosen");
    Ok(Plan::Join(JoinPlan {
        kind,
        left: Box::new(left),
        right: Box::new(right),
        conds: vec![cond],
    }))
}

/// Builds the single-relation plan for the query: scans, joins, and
/// cartesian closure.
///
/// The first join honors the FROM-clause table order: when the first
/// condition names its tables in reverse FROM order, the children and
/// the condition's sides are swapped, so a downstream ORDER BY sees
/// rows in the user-facing order. Every subsequent join is a NestLoop
/// with the accumulated tree on the right.
pub(crate) fn make_one_rel(
    planner: &Planner,
    query: &mut Query,
    catalog: &Catalog,
) -> Result<Plan, PlannerError> {
    let tables = query.tables.clone();
    let mut scans: Vec<Option<Plan>> = Vec::with_capacity(tables.len());
    for tab_name in &tables {
        scans.push(Some(build_scan(catalog, tab_name, &mut query.conds)?));
    }

    if tables.len() == 1 {
        return scans[0]
            .take()
            .ok_or_else(|| PlannerError::Internal("missing scan for single table".to_string()));
    }

    let mut conds = std::mem::take(&mut query.conds);
    let mut joined: Vec<String> = Vec::new();

    let mut root = if conds.is_empty() {
        joined.push(tables[0].clone());
        scans[0]
            .take()
            .ok_or_else(|| PlannerError::Internal("missing scan for first table".to_string()))?
    } else {
        // First join: honor FROM order.
        let mut cond = conds.remove(0);
        let rhs_col = cond
            .rhs_col()
            .cloned()
            .ok_or_else(|| {
                PlannerError::Internal("join condition rhs is not a column".to_string())
            })?;
        let lhs_pos = tables.iter().position(|t| *t == cond.lhs_col.tab_name);
        let rhs_pos = tables.iter().position(|t| *t == rhs_col.tab_name);
        if let (Some(lhs_pos), Some(rhs_pos)) = (lhs_pos, rhs_pos)
            && lhs_pos > rhs_pos
        {
            cond.swap_sides();
        }
        let left_tab = cond.lhs_col.tab_name.clone();
        let right_tab = cond
            .rhs_col()
            .map(|c| c.tab_name.clone())
            .unwrap_or_default();
        let left = pop_scan(&mut scans, &tables, &mut joined, &left_tab).ok_or_else(|| {
            PlannerError::Internal(format!("table \"{}\" is not in the query", left_tab))
        })?;
        let right = pop_scan(&mut scans, &tables, &mut joined, &right_tab).ok_or_else(|| {
            PlannerError::Internal(format!("table \"{}\" is not in the query", right_tab))
        })?;
        build_first_join(planner, catalog, left, right, cond)?
    };

    // Remaining conditions: join in an unjoined side, start a fresh
    // bottom join for two unjoined tables, or push down.
    while !conds.is_empty() {
        let mut cond = conds.remove(0);
        let rhs_tab = cond.rhs_col().map(|c| c.tab_name.clone());

        let mut fresh_left = None;
        if !joined.contains(&cond.lhs_col.tab_name) {
            let lhs_tab = cond.lhs_col.tab_name.clone();
            fresh_left = pop_scan(&mut scans, &tables, &mut joined, &lhs_tab);
        }
        let mut fresh_right = None;
        if let Some(rhs_tab) = &rhs_tab
            && !joined.contains(rhs_tab)
        {
            fresh_right = pop_scan(&mut scans, &tables, &mut joined, rhs_tab);
        }

        match (fresh_left, fresh_right) {
            (Some(left), Some(right)) => {
                let bottom = Plan::Join(JoinPlan {
                    kind: JoinKind::NestLoop,
                    left: Box::new(left),
                    right: Box::new(right),
                    conds: vec![cond],
                });
                root = Plan::Join(JoinPlan {
                    kind: JoinKind::NestLoop,
                    left: Box::new(bottom),
                    right: Box::new(root),
                    conds: Vec::new(),
                });
            }
            (Some(left), None) => {
                root = Plan::Join(JoinPlan {
                    kind: JoinKind::NestLoop,
                    left: Box::new(left),
                    right: Box::new(root),
                    conds: vec![cond],
                });
            }
            (None, Some(right)) => {
                cond.swap_sides();
                root = Plan::Join(JoinPlan {
                    kind: JoinKind::NestLoop,
                    left: Box::new(right),
                    right: Box::new(root),
                    conds: vec![cond],
                });
            }
            (None, None) => {
                // Both tables already joined somewhere below.
                push_conds(&mut cond, &mut root);
            }
        }
    }

    // Cartesian closure: cross-join any table no condition reached.
    for scan in scans.iter_mut() {
        if let Some(scan) = scan.take() {
            root = Plan::Join(JoinPlan {
                kind: JoinKind::NestLoop,
                left: Box::new(scan),
                right: Box::new(root),
                conds: Vec::new(),
            });
        }
    }

    Ok(root)
}
