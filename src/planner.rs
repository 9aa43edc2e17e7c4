//! Query planner.
//!
//! Turns a validated [`Query`] into a [`Plan`] tree of physical
//! operators: table-local predicates are pushed onto scans, scans are
//! upgraded to index scans by leftmost-prefix matching, cross-table
//! predicates drive join-tree construction, and the result is wrapped
//! by aggregation, sort, and projection operators as the statement
//! requires.
//!
//! The planner reads the catalog and nothing else; the emitted tree is
//! immutable and owned top-down, and executing it is the job of
//! external volcano-style executors.

mod error;
mod index;
mod join;
mod plan;

pub use error::PlannerError;
pub use plan::{
    AggregationPlan, DdlKind, DdlPlan, DmlKind, DmlPlan, JoinKind, JoinPlan, Plan,
    ProjectionPlan, ScanKind, ScanPlan, SortPlan,
};

use tracing::debug;

use crate::catalog::Catalog;
use crate::query::{Condition, Query, TabCol};
use crate::sql::Statement;

use self::index::match_index_cols;
use self::join::make_one_rel;

/// The query planner.
///
/// The join-executor flags mirror the engine's feature switches: with
/// nested-loop enabled it is always chosen; with only sort-merge
/// enabled, joins use sort-merge (index-backed when both sides have a
/// covering index); with neither, planning a join fails.
#[derive(Debug, Clone)]
pub struct Planner {
    /// Whether the nested-loop join executor is available.
    pub enable_nestedloop_join: bool,
    /// Whether the sort-merge join executor is available.
    pub enable_sortmerge_join: bool,
}

impl Default for Planner {
    fn default() -> Self {
        Planner {
            enable_nestedloop_join: true,
            enable_sortmerge_join: true,
        }
    }
}

impl Planner {
    /// Creates a planner with both join executors enabled.
    pub fn new() -> Self {
        Planner::default()
    }

    /// Plans a statement. The single entry point.
    ///
    /// # Errors
    ///
    /// [`PlannerError::Internal`] for malformed input,
    /// [`PlannerError::Config`] when a join is required but no join
    /// executor is enabled, [`PlannerError::AmbiguousColumn`] /
    /// [`PlannerError::ColumnNotFound`] from ORDER BY resolution, and
    /// catalog lookup failures.
    pub fn do_planner(&self, mut query: Query, catalog: &Catalog) -> Result<Plan, PlannerError> {
        let stmt = query.stmt.clone();
        let plan = match stmt {
            Statement::CreateTable(x) => Plan::Ddl(DdlPlan {
                kind: DdlKind::CreateTable,
                tab_name: x.table,
                col_names: Vec::new(),
                col_defs: x.columns,
            }),
            Statement::DropTable(x) => Plan::Ddl(DdlPlan {
                kind: DdlKind::DropTable,
                tab_name: x.table,
                col_names: Vec::new(),
                col_defs: Vec::new(),
            }),
            Statement::CreateIndex(x) => Plan::Ddl(DdlPlan {
                kind: DdlKind::CreateIndex,
                tab_name: x.table,
                col_names: x.columns,
                col_defs: Vec::new(),
            }),
            Statement::DropIndex(x) => Plan::Ddl(DdlPlan {
                kind: DdlKind::DropIndex,
                tab_name: x.table,
                col_names: x.columns,
                col_defs: Vec::new(),
            }),
            Statement::ShowIndex(x) => Plan::Ddl(DdlPlan {
                kind: DdlKind::ShowIndex,
                tab_name: x.table,
                col_names: Vec::new(),
                col_defs: Vec::new(),
            }),
            Statement::Insert(x) => Plan::Dml(DmlPlan {
                kind: DmlKind::Insert,
                child: None,
                tab_name: x.table,
                values: std::mem::take(&mut query.values),
                conds: Vec::new(),
                set_clauses: Vec::new(),
            }),
            Statement::Delete(x) => {
                let scan = self.target_table_scan(&x.table, &mut query, catalog)?;
                Plan::Dml(DmlPlan {
                    kind: DmlKind::Delete,
                    child: Some(Box::new(scan)),
                    tab_name: x.table,
                    values: Vec::new(),
                    conds: std::mem::take(&mut query.conds),
                    set_clauses: Vec::new(),
                })
            }
            Statement::Update(x) => {
                let scan = self.target_table_scan(&x.table, &mut query, catalog)?;
                Plan::Dml(DmlPlan {
                    kind: DmlKind::Update,
                    child: Some(Box::new(scan)),
                    tab_name: x.table,
                    values: Vec::new(),
                    conds: std::mem::take(&mut query.conds),
                    set_clauses: std::mem::take(&mut query.set_clauses),
                })
            }
            Statement::Select(_) => {
                let projection = self.generate_select_plan(&mut query, catalog)?;
                Plan::Dml(DmlPlan {
                    kind: DmlKind::Select,
                    child: Some(Box::new(projection)),
                    tab_name: String::new(),
                    values: Vec::new(),
                    conds: Vec::new(),
                    set_clauses: Vec::new(),
                })
            }
        };
        Ok(plan)
    }

    /// Builds the scan for a DELETE/UPDATE target table. A single
    /// table needs no join planning; index selection still applies and
    /// reorders the statement conditions in place.
    fn target_table_scan(
        &self,
        tab_name: &str,
        query: &mut Query,
        catalog: &Catalog,
    ) -> Result<Plan, PlannerError> {
        let tab = catalog.get_table(tab_name)?;
        let scan = match match_index_cols(tab, &mut query.conds) {
            Some(index_col_names) => ScanPlan {
                kind: ScanKind::Index,
                tab_name: tab_name.to_string(),
                conds: query.conds.clone(),
                index_col_names,
            },
            None => ScanPlan {
                kind: ScanKind::Seq,
                tab_name: tab_name.to_string(),
                conds: query.conds.clone(),
                index_col_names: Vec::new(),
            },
        };
        Ok(Plan::Scan(scan))
    }

    /// Plans a SELECT: join tree, then aggregation, then sort, then
    /// the final projection.
    fn generate_select_plan(
        &self,
        query: &mut Query,
        catalog: &Catalog,
    ) -> Result<Plan, PlannerError> {
        let sel_cols = query.cols.clone();

        let mut plan = make_one_rel(self, query, catalog)?;
        plan = self.generate_aggregation_group_plan(query, plan);
        plan = self.generate_sort_plan(query, plan, catalog)?;

        debug!(tables = ?query.tables, "select plan built");
        Ok(Plan::Projection(ProjectionPlan {
            child: Box::new(plan),
            cols: sel_cols,
        }))
    }

    /// Wraps `plan` in an aggregation node when the query aggregates
    /// or groups; pass-through otherwise.
    fn generate_aggregation_group_plan(&self, query: &Query, plan: Plan) -> Plan {
        if !query.has_agg && query.group_cols.is_empty() {
            return plan;
        }
        Plan::Aggregation(AggregationPlan {
            child: Box::new(plan),
            cols: query.cols.clone(),
            group_cols: query.group_cols.clone(),
            having_conds: query.having_conds.clone(),
        })
    }

    /// Wraps `plan` in a sort node when the query has ORDER BY.
    ///
    /// The order column is unqualified; it is resolved against the
    /// schemas of every selected table. No match and multiple matches
    /// are errors.
    fn generate_sort_plan(
        &self,
        query: &Query,
        plan: Plan,
        catalog: &Catalog,
    ) -> Result<Plan, PlannerError> {
        let Statement::Select(select) = &query.stmt else {
            return Ok(plan);
        };
        let Some(order) = &select.order_by else {
            return Ok(plan);
        };

        let mut sel_col: Option<TabCol> = None;
        for tab_name in &query.tables {
            let tab = catalog.get_table(tab_name)?;
            if let Some(col) = tab.get_col(&order.col_name) {
                if sel_col.is_some() {
                    return Err(PlannerError::AmbiguousColumn {
                        name: order.col_name.clone(),
                    });
                }
                sel_col = Some(TabCol::new(&col.tab_name, &col.name));
            }
        }
        let col = sel_col.ok_or_else(|| PlannerError::ColumnNotFound {
            name: order.col_name.clone(),
        })?;

        Ok(Plan::Sort(SortPlan {
            child: Box::new(plan),
            col,
            descending: order.desc,
        }))
    }
}

/// Checks the join-condition invariants of a plan tree: every join
/// condition references one table in each subtree, with the lhs on the
/// left. Used by tests and debug assertions.
pub fn check_join_conds(plan: &Plan) -> bool {
    match plan {
        Plan::Join(join) => {
            let left_tables = join.left.scan_tables();
            let right_tables = join.right.scan_tables();
            join.conds.iter().all(|cond| normalized(cond, &left_tables, &right_tables))
                && check_join_conds(&join.left)
                && check_join_conds(&join.right)
        }
        Plan::Scan(_) | Plan::Ddl(_) => true,
        Plan::Sort(sort) => check_join_conds(&sort.child),
        Plan::Aggregation(agg) => check_join_conds(&agg.child),
        Plan::Projection(proj) => check_join_conds(&proj.child),
        Plan::Dml(dml) => dml.child.as_deref().is_none_or(check_join_conds),
    }
}

fn normalized(cond: &Condition, left_tables: &[String], right_tables: &[String]) -> bool {
    let lhs_ok = left_tables.contains(&cond.lhs_col.tab_name);
    let rhs_ok = cond
        .rhs_col()
        .is_some_and(|rhs| right_tables.contains(&rhs.tab_name));
    lhs_ok && rhs_ok
}
