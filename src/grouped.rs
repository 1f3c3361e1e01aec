use crate::aggregation::{Aggregation, AggregationRegistry};
use crate::column::Column;
use crate::error::{Result, TableError};
use crate::grouper::GroupStats;
use crate::index::RowIndex;
use crate::table::{NamedColumn, Table, check_name};

/// Row groups of a table, produced by [Table::group_by].
#[derive(Debug, Clone, Default)]
pub struct Grouped {
    table: Table,
    columns: Vec<String>,
    groups: Vec<RowIndex>,
    stats: GroupStats,
    err: Option<TableError>,
}

impl Grouped {
    pub(crate) fn new(
        table: Table,
        columns: Vec<String>,
        groups: Vec<RowIndex>,
        stats: GroupStats,
    ) -> Self {
        Self {
            table,
            columns,
            groups,
            stats,
            err: None,
        }
    }

    pub(crate) fn with_err(err: TableError) -> Self {
        Self {
            err: Some(err),
            ..Self::default()
        }
    }

    pub fn err(&self) -> Option<&TableError> {
        self.err.as_ref()
    }

    pub fn stats(&self) -> GroupStats {
        self.stats
    }

    /// Row positions of every group, in order of first appearance.
    pub fn groups(&self) -> &[RowIndex] {
        &self.groups
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// One row per group: the grouping columns, read from the first row of each group,
    /// followed by one column per aggregation.
    pub fn aggregate(&self, aggregations: &[Aggregation], registry: &AggregationRegistry) -> Table {
        if let Some(err) = &self.err {
            return Table::with_err(err.clone());
        }
        self.try_aggregate(aggregations, registry)
            .unwrap_or_else(Table::with_err)
    }

    fn try_aggregate(
        &self,
        aggregations: &[Aggregation],
        registry: &AggregationRegistry,
    ) -> Result<Table> {
        let firsts: Vec<u32> = self.groups.iter().map(|group| group[0]).collect();

        let mut columns = Vec::with_capacity(self.columns.len() + aggregations.len());
        for name in &self.columns {
            let column = self.table.column(name)?;
            columns.push(NamedColumn::new(name.as_str(), column.subset(&firsts)));
        }

        for aggregation in aggregations {
            let arity = aggregation.columns.len();
            if !(1..=2).contains(&arity) {
                return Err(TableError::InvalidAggregation(format!(
                    "{} takes one or two columns, got {arity}",
                    aggregation.function
                )));
            }
            if let Some(grouped) = aggregation
                .columns
                .iter()
                .find(|c| self.columns.contains(c))
            {
                return Err(TableError::AggregateOnGroupColumn(grouped.clone()));
            }

            let source = self.table.column(&aggregation.columns[0])?;
            let other: Option<&dyn Column> = match aggregation.columns.get(1) {
                Some(name) => Some(&**self.table.column(name)?),
                None => None,
            };

            let output = aggregation.output_name();
            check_name(output)?;
            if columns.iter().any(|c: &NamedColumn| c.name == output) {
                return Err(TableError::DuplicateAggregate(output.to_string()));
            }

            let function = registry.lookup(source.data_type(), arity, &aggregation.function)?;
            let column = source.aggregate(&self.groups, function, other)?;
            columns.push(NamedColumn::new(output, column));
        }

        Ok(Table::assembled(columns, RowIndex::ascending(self.groups.len())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::ReduceFn;
    use crate::config::GroupByConfig;
    use crate::table::ColumnData;

    fn table() -> Table {
        Table::from_columns(vec![
            ("k", ColumnData::from(vec!["a", "b", "a", "c", "b"])),
            ("x", ColumnData::Int(vec![1, 2, 3, 4, 5])),
            ("y", ColumnData::Float(vec![0.5, 1.5, f64::NAN, 2.0, 1.0])),
        ])
    }

    // ─────────────────────────────────────────────────────────────
    // Test 1 : grouping columns come first, then aggregates
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_aggregate_layout() {
        let registry = AggregationRegistry::default();
        let result = table()
            .group_by(GroupByConfig::new().columns(["k"]))
            .aggregate(
                &[
                    Aggregation::new("sum", "x"),
                    Aggregation::new("max", "y").alias("top"),
                ],
                &registry,
            )
            .into_result()
            .unwrap();

        assert_eq!(result.column_names(), vec!["k", "x", "top"]);
        let keys: Vec<_> = result.string_view("k").unwrap().iter().collect();
        assert_eq!(keys, vec![Some("a"), Some("b"), Some("c")]);
        let sums: Vec<_> = result.int_view("x").unwrap().iter().collect();
        assert_eq!(sums, vec![4, 7, 4]);
        let tops: Vec<_> = result.float_view("top").unwrap().iter().collect();
        assert_eq!(tops, vec![0.5, 1.5, 2.0]);
    }

    // ─────────────────────────────────────────────────────────────
    // Test 2 : invalid aggregations
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_aggregate_errors() {
        let registry = AggregationRegistry::default();
        let grouped = table().group_by(GroupByConfig::new().columns(["k"]));

        let on_key = grouped.aggregate(&[Aggregation::new("count", "k")], &registry);
        assert_eq!(on_key.err(), Some(&TableError::AggregateOnGroupColumn("k".into())));

        let twice = grouped.aggregate(
            &[Aggregation::new("sum", "x"), Aggregation::new("max", "x")],
            &registry,
        );
        assert_eq!(twice.err(), Some(&TableError::DuplicateAggregate("x".into())));

        let unknown = grouped.aggregate(&[Aggregation::new("sum", "zz")], &registry);
        assert_eq!(unknown.err(), Some(&TableError::UnknownColumn("zz".into())));

        let no_avg = grouped.aggregate(&[Aggregation::new("avg", "x")], &registry);
        assert!(matches!(no_avg.err(), Some(TableError::UnknownAggregation { .. })));

        let bad_group = table().group_by(GroupByConfig::new().columns(["k", "k"]));
        assert_eq!(bad_group.err(), Some(&TableError::DuplicateColumn("k".into())));
        assert_eq!(
            bad_group.aggregate(&[], &registry).err(),
            Some(&TableError::DuplicateColumn("k".into()))
        );
    }

    // ─────────────────────────────────────────────────────────────
    // Test 3 : no grouping columns, custom and binary reductions
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_single_group_and_custom_functions() {
        let mut registry = AggregationRegistry::default();
        registry.register(
            "dot",
            ReduceFn::int2(|a, b| a.iter().zip(b).map(|(x, y)| x * y).sum()),
        );

        let t = table().copy_column("z", "x");
        let grouped = t.group_by(GroupByConfig::new());
        assert_eq!(grouped.len(), 1);

        let result = grouped.aggregate(
            &[
                Aggregation::binary("dot", "x", "z").alias("dot"),
                Aggregation::new("count", "k").alias("n"),
            ],
            &registry,
        );
        assert_eq!(result.column_names(), vec!["dot", "n"]);
        assert_eq!(result.int_view("dot").unwrap().get(0), 55);
        assert_eq!(result.int_view("n").unwrap().get(0), 5);
    }

    // ─────────────────────────────────────────────────────────────
    // Test 4 : empty input has no groups
    // ─────────────────────────────────────────────────────────────
    #[test]
    fn test_empty_table() {
        let registry = AggregationRegistry::default();
        let empty = table().slice(0, 0);
        let grouped = empty.group_by(GroupByConfig::new().columns(["k"]));
        assert!(grouped.is_empty());

        let result = grouped.aggregate(&[Aggregation::new("sum", "x")], &registry);
        assert_eq!(result.column_names(), vec!["k", "x"]);
        assert!(result.is_empty());
    }
}
