use coltab::{
    Clause, ColumnData, DistinctConfig, DistinctStrategy, Filter, GroupByConfig, Operator, Order,
    Table,
};
use proptest::prelude::*;

type Row = (i64, Option<i32>, Option<String>);

fn build(rows: &[Row]) -> Table {
    Table::from_columns(vec![
        ("a", ColumnData::Int(rows.iter().map(|r| r.0).collect())),
        (
            "f",
            ColumnData::Float(rows.iter().map(|r| r.1.map_or(f64::NAN, f64::from)).collect()),
        ),
        (
            "s",
            ColumnData::NullableString(rows.iter().map(|r| r.2.clone()).collect()),
        ),
    ])
}

fn rows() -> impl Strategy<Value = Vec<Row>> {
    prop::collection::vec(
        (
            0i64..5,
            prop::option::of(0i32..4),
            prop::option::of("[ab]{0,2}"),
        ),
        0..40,
    )
}

fn relation() -> impl Strategy<Value = Operator> + Clone {
    prop::sample::select(vec![
        Operator::Eq,
        Operator::Neq,
        Operator::Lt,
        Operator::Lte,
        Operator::Gt,
        Operator::Gte,
    ])
}

fn atomic() -> impl Strategy<Value = Filter> {
    let op = relation();
    let filter = prop_oneof![
        (op.clone(), 0i64..5).prop_map(|(op, v)| Filter::new("a", op, v)),
        (op.clone(), 0i32..4).prop_map(|(op, v)| Filter::new("f", op, f64::from(v))),
        (op, "[ab]{0,2}").prop_map(|(op, v)| Filter::new("s", op, v)),
        Just(Filter::unary("f", Operator::IsNull)),
        Just(Filter::unary("s", Operator::IsNotNull)),
    ];
    (filter, any::<bool>()).prop_map(|(f, inverse)| if inverse { f.inverse() } else { f })
}

fn orders() -> impl Strategy<Value = Vec<Order>> {
    let order = (
        prop::sample::select(vec!["a", "f", "s"]),
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(|(column, reverse, nulls_last)| {
            let order = if reverse {
                Order::desc(column)
            } else {
                Order::asc(column)
            };
            if nulls_last { order.nulls_last() } else { order }
        });
    prop::collection::vec(order, 1..3)
}

fn group_columns() -> impl Strategy<Value = Vec<&'static str>> {
    prop::sample::subsequence(vec!["a", "f", "s"], 1..=3)
}

/// Whether two rows are equal on `columns` under a null policy.
fn rows_equal(a: &Row, b: &Row, columns: &[&str], nulls_equal: bool) -> bool {
    fn cell<T: PartialEq>(x: &Option<T>, y: &Option<T>, nulls_equal: bool) -> bool {
        match (x, y) {
            (Some(x), Some(y)) => x == y,
            (None, None) => nulls_equal,
            _ => false,
        }
    }

    columns.iter().all(|&c| match c {
        "a" => a.0 == b.0,
        "f" => cell(&a.1, &b.1, nulls_equal),
        _ => cell(&a.2, &b.2, nulls_equal),
    })
}

/// Quadratic grouping in first-appearance order.
fn brute_force_groups(rows: &[Row], columns: &[&str], nulls_equal: bool) -> Vec<Vec<u32>> {
    let mut groups: Vec<Vec<u32>> = Vec::new();
    for (i, row) in rows.iter().enumerate() {
        match groups
            .iter_mut()
            .find(|g| rows_equal(&rows[g[0] as usize], row, columns, nulls_equal))
        {
            Some(group) => group.push(i as u32),
            None => groups.push(vec![i as u32]),
        }
    }
    groups
}

/// `cell op v` in f64, a missing cell being NaN.
fn float_relation(op: Operator, cell: Option<i32>, v: i32) -> bool {
    let (a, b) = (cell.map_or(f64::NAN, f64::from), f64::from(v));
    match op {
        Operator::Eq => a == b,
        Operator::Neq => a != b,
        Operator::Lt => a < b,
        Operator::Lte => a <= b,
        Operator::Gt => a > b,
        Operator::Gte => a >= b,
        _ => unreachable!("not a relation: {op}"),
    }
}

fn positions(table: &Table) -> Vec<u32> {
    table.row_index().to_vec()
}

proptest! {
    #[test]
    fn filter_never_grows(rows in rows(), f in atomic()) {
        let table = build(&rows);
        let filtered = table.filter(f);
        prop_assert!(filtered.err().is_none());
        prop_assert!(filtered.len() <= table.len());
    }

    #[test]
    fn chained_filters_equal_and(rows in rows(), f in atomic(), g in atomic()) {
        let table = build(&rows);
        let chained = table.filter(f.clone()).filter(g.clone());
        let combined = table.filter(Clause::and([f.into(), g.into()]));
        prop_assert_eq!(positions(&chained), positions(&combined));
    }

    #[test]
    fn double_negation(rows in rows(), f in atomic()) {
        let table = build(&rows);
        let twice = table.filter(Clause::not(Clause::not(f.clone())));
        prop_assert_eq!(positions(&twice), positions(&table.filter(f)));
    }

    #[test]
    fn inverted_float_relation_runs_inverse_operator(
        rows in rows(),
        op in relation(),
        v in 0i32..4,
    ) {
        let table = build(&rows);
        let inverse = op.inverse().unwrap();
        let expected: Vec<u32> = rows
            .iter()
            .enumerate()
            .filter(|(_, r)| float_relation(inverse, r.1, v))
            .map(|(i, _)| i as u32)
            .collect();

        let filter = Filter::new("f", op, f64::from(v));
        prop_assert_eq!(positions(&table.filter(filter.clone().inverse())), expected.clone());
        prop_assert_eq!(positions(&table.filter(Clause::not(filter))), expected);
    }

    #[test]
    fn or_matches_union(rows in rows(), f in atomic(), g in atomic()) {
        let table = build(&rows).sort(&[Order::desc("a")]);
        let either = table.filter(Clause::or([f.clone().into(), g.clone().into()]));

        let left = positions(&table.filter(f));
        let right = positions(&table.filter(g));
        let expected: Vec<u32> = positions(&table)
            .into_iter()
            .filter(|p| left.contains(p) || right.contains(p))
            .collect();
        prop_assert_eq!(positions(&either), expected);
    }

    #[test]
    fn sort_is_an_idempotent_permutation(rows in rows(), orders in orders()) {
        let table = build(&rows);
        let sorted = table.sort(&orders);
        prop_assert_eq!(sorted.len(), table.len());

        let mut seen = positions(&sorted);
        seen.sort_unstable();
        prop_assert_eq!(seen, positions(&table));

        prop_assert_eq!(positions(&sorted.sort(&orders)), positions(&sorted));
    }

    #[test]
    fn group_by_partitions_the_index(
        rows in rows(),
        columns in group_columns(),
        group_by_null in any::<bool>(),
    ) {
        let table = build(&rows).sort(&[Order::asc("s")]);
        let grouped = table.group_by(
            GroupByConfig::new().columns(columns).group_by_null(group_by_null),
        );

        let mut members: Vec<u32> = grouped.groups().iter().flat_map(|g| g.to_vec()).collect();
        members.sort_unstable();
        let mut expected = positions(&table);
        expected.sort_unstable();
        prop_assert_eq!(members, expected);
    }

    #[test]
    fn hash_grouping_matches_brute_force(
        rows in rows(),
        columns in group_columns(),
        group_by_null in any::<bool>(),
    ) {
        let table = build(&rows);
        let grouped = table.group_by(
            GroupByConfig::new().columns(columns.clone()).group_by_null(group_by_null),
        );
        let groups: Vec<Vec<u32>> = grouped.groups().iter().map(|g| g.to_vec()).collect();

        prop_assert_eq!(groups, brute_force_groups(&rows, &columns, group_by_null));
    }

    #[test]
    fn distinct_is_idempotent(
        rows in rows(),
        columns in group_columns(),
        group_by_null in any::<bool>(),
        hash in any::<bool>(),
    ) {
        let strategy = if hash { DistinctStrategy::Hash } else { DistinctStrategy::Sort };
        let config = DistinctConfig::new()
            .columns(columns)
            .group_by_null(group_by_null)
            .strategy(strategy);

        let table = build(&rows);
        let once = table.distinct(config.clone());
        prop_assert!(once.len() <= table.len());
        prop_assert_eq!(positions(&once.distinct(config)), positions(&once));
    }

    #[test]
    fn distinct_strategies_agree(
        rows in rows(),
        columns in group_columns(),
        group_by_null in any::<bool>(),
    ) {
        let table = build(&rows);
        let config = DistinctConfig::new().columns(columns).group_by_null(group_by_null);

        let mut by_sort = positions(&table.distinct(config.clone()));
        let mut by_hash = positions(&table.distinct(config.strategy(DistinctStrategy::Hash)));
        by_sort.sort_unstable();
        by_hash.sort_unstable();
        prop_assert_eq!(by_sort, by_hash);
    }
}
