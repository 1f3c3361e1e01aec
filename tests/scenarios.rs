use coltab::{
    Aggregation, AggregationRegistry, Clause, ColumnData, DistinctConfig, Filter, GroupByConfig,
    Operator, Order, Table,
};

fn col1() -> Table {
    Table::from_columns(vec![("COL1", ColumnData::Int(vec![1, 2, 3, 4, 5]))])
}

fn col1_values(table: &Table) -> Vec<i64> {
    table.int_view("COL1").unwrap().iter().collect()
}

// ─────────────────────────────────────────────────────────────
// Scenario 1 : single relational filter
// ─────────────────────────────────────────────────────────────
#[test]
fn test_filter_greater_than() {
    let result = col1().filter(Filter::new("COL1", Operator::Gt, 3));
    assert_eq!(col1_values(&result), vec![4, 5]);
}

// ─────────────────────────────────────────────────────────────
// Scenario 2 : or keeps the original order
// ─────────────────────────────────────────────────────────────
#[test]
fn test_or_preserves_order() {
    let clause = Clause::or([
        Filter::new("COL1", Operator::Gt, 4).into(),
        Filter::new("COL1", Operator::Lt, 2).into(),
    ]);
    assert_eq!(col1_values(&col1().filter(clause)), vec![1, 5]);

    // same result on a reordered table, in that table's order
    let reversed = col1().sort(&[Order::desc("COL1")]);
    let clause = Clause::or([
        Filter::new("COL1", Operator::Lt, 2).into(),
        Clause::and([Filter::new("COL1", Operator::Gt, 4).into()]),
    ]);
    assert_eq!(col1_values(&reversed.filter(clause)), vec![5, 1]);
}

// ─────────────────────────────────────────────────────────────
// Scenario 3 : not of or
// ─────────────────────────────────────────────────────────────
#[test]
fn test_not_or() {
    let clause = Clause::not(Clause::or([
        Filter::new("COL1", Operator::Eq, 1).into(),
        Filter::new("COL1", Operator::Eq, 2).into(),
    ]));
    assert_eq!(col1_values(&col1().filter(clause)), vec![3, 4, 5]);
}

// ─────────────────────────────────────────────────────────────
// Scenario 4 : group by two columns and sum a third
// ─────────────────────────────────────────────────────────────
#[test]
fn test_group_by_sum() {
    let table = Table::from_columns(vec![
        ("COL1", ColumnData::Int(vec![0, 0, 1, 2])),
        ("COL2", ColumnData::Int(vec![0, 0, 1, 1])),
        ("COL3", ColumnData::Int(vec![1, 2, 5, 7])),
    ]);
    let result = table
        .group_by(GroupByConfig::new().columns(["COL1", "COL2"]))
        .aggregate(
            &[Aggregation::new("sum", "COL3")],
            &AggregationRegistry::default(),
        )
        .into_result()
        .unwrap();

    let c1 = result.int_view("COL1").unwrap();
    let c2 = result.int_view("COL2").unwrap();
    let c3 = result.int_view("COL3").unwrap();
    let mut rows: Vec<(i64, i64, i64)> = (0..result.len())
        .map(|i| (c1.get(i), c2.get(i), c3.get(i)))
        .collect();
    rows.sort();
    assert_eq!(rows, vec![(0, 0, 3), (1, 1, 5), (2, 1, 7)]);
}

// ─────────────────────────────────────────────────────────────
// Scenario 5 : null and empty string are different values
// ─────────────────────────────────────────────────────────────
#[test]
fn test_null_is_not_empty_string() {
    let table = Table::from_columns(vec![(
        "s",
        ColumnData::from(vec![Some("a"), None, Some(""), Some("b")]),
    )]);

    let nulls = table.filter(Filter::unary("s", Operator::IsNull));
    let empties = table.filter(Filter::new("s", Operator::Eq, ""));
    assert_eq!(nulls.row_index().as_slice(), &[1]);
    assert_eq!(empties.row_index().as_slice(), &[2]);

    let not_null = table.filter(Filter::unary("s", Operator::IsNotNull));
    assert_eq!(not_null.row_index().as_slice(), &[0, 2, 3]);
}

// ─────────────────────────────────────────────────────────────
// Scenario 6 : NaN grouping follows group_by_null
// ─────────────────────────────────────────────────────────────
#[test]
fn test_nan_grouping() {
    let table = Table::from_columns(vec![(
        "f",
        ColumnData::Float(vec![1.0, f64::NAN, 2.0, f64::NAN]),
    )]);

    let scattered = table.group_by(GroupByConfig::new().columns(["f"]));
    assert_eq!(scattered.len(), 4);

    let together = table.group_by(GroupByConfig::new().columns(["f"]).group_by_null(true));
    assert_eq!(together.len(), 3);
    assert_eq!(together.groups()[1].as_slice(), &[1, 3]);

    let single = Table::from_columns(vec![("f", ColumnData::Float(vec![1.0, f64::NAN, 2.0]))]);
    assert_eq!(single.group_by(GroupByConfig::new().columns(["f"])).len(), 3);
    assert_eq!(
        single
            .distinct(DistinctConfig::new().group_by_null(true))
            .len(),
        3
    );
}

// ─────────────────────────────────────────────────────────────
// Pipelines carry the first error to the end
// ─────────────────────────────────────────────────────────────
#[test]
fn test_pipeline_error_is_reported_once() {
    let result = col1()
        .filter(Filter::new("COL1", Operator::Like, "1%"))
        .sort(&[Order::asc("COL1")])
        .group_by(GroupByConfig::new().columns(["COL1"]))
        .aggregate(&[], &AggregationRegistry::default())
        .into_result();

    let err = result.unwrap_err();
    assert_eq!(
        err.to_string(),
        "filter column \"COL1\": operator like is not supported for int columns"
    );
}

// ─────────────────────────────────────────────────────────────
// Enum columns filter through their dictionary
// ─────────────────────────────────────────────────────────────
#[test]
fn test_enum_filters() {
    let table = Table::new(
        [(
            "size".to_string(),
            ColumnData::from(vec![Some("small"), Some("large"), None, Some("medium")]),
        )]
        .into(),
        coltab::NewTableConfig::new().strict_enum("size", ["small", "medium", "large"]),
    );

    let at_least_medium = table.filter(Filter::new("size", Operator::Gte, "medium"));
    assert_eq!(at_least_medium.row_index().as_slice(), &[1, 3]);

    let like = table.filter(Filter::new("size", Operator::ILike, "%L%"));
    assert_eq!(like.row_index().as_slice(), &[0, 1]);

    let unknown = table.filter(Filter::new("size", Operator::Eq, "huge"));
    assert!(matches!(
        unknown.err(),
        Some(coltab::TableError::Filter { source, .. })
            if **source == coltab::TableError::UnknownEnumValue("huge".into())
    ));
}

// ─────────────────────────────────────────────────────────────
// Inverted relations keep the null behavior of the inverse operator
// ─────────────────────────────────────────────────────────────
fn rows(table: &Table, clause: impl Into<Clause>) -> Vec<u32> {
    let filtered = table.filter(clause).into_result().unwrap();
    filtered.row_index().to_vec()
}

#[test]
fn test_inverted_float_relations() {
    let table = Table::from_columns(vec![("x", ColumnData::Float(vec![1.0, f64::NAN, 5.0]))]);

    assert_eq!(rows(&table, Clause::not(Filter::new("x", Operator::Lt, 3.0))), vec![2]);
    assert_eq!(rows(&table, Filter::new("x", Operator::Lt, 3.0).inverse()), vec![2]);
    assert_eq!(rows(&table, Filter::new("x", Operator::Neq, 1.0)), vec![1, 2]);
    assert_eq!(rows(&table, Clause::not(Filter::new("x", Operator::Eq, 1.0))), vec![1, 2]);
    assert_eq!(rows(&table, Clause::not(Filter::unary("x", Operator::IsNull))), vec![0, 2]);
}

#[test]
fn test_inverted_string_relations() {
    let table = Table::from_columns(vec![(
        "s",
        ColumnData::from(vec![Some("a"), None, Some("b")]),
    )]);

    assert_eq!(rows(&table, Clause::not(Filter::new("s", Operator::Lt, "b"))), vec![2]);
    assert_eq!(rows(&table, Filter::new("s", Operator::Neq, "a")), vec![2]);
    assert_eq!(rows(&table, Clause::not(Filter::new("s", Operator::Eq, "a"))), vec![2]);
    assert_eq!(rows(&table, Clause::not(Filter::new("s", Operator::Like, "a%"))), vec![1, 2]);
}

#[test]
fn test_inverted_enum_relations() {
    let table = Table::new(
        [(
            "e".to_string(),
            ColumnData::from(vec![Some("a"), None, Some("b")]),
        )]
        .into(),
        coltab::NewTableConfig::new().enum_column("e"),
    );

    assert_eq!(rows(&table, Clause::not(Filter::new("e", Operator::Lt, "b"))), vec![2]);
    assert_eq!(rows(&table, Filter::new("e", Operator::Neq, "a")), vec![1, 2]);
    assert_eq!(rows(&table, Clause::not(Filter::new("e", Operator::Eq, "a"))), vec![1, 2]);
    assert_eq!(rows(&table, Filter::new("e", Operator::Neq, "zz")), vec![0, 1, 2]);
}

#[test]
fn test_and_reports_errors_after_empty_result() {
    let table = Table::from_columns(vec![("a", ColumnData::Int(vec![1, 2, 3]))]);
    let result = table.filter(Clause::and([
        Filter::new("a", Operator::Gt, 10).into(),
        Filter::new("nope", Operator::Eq, 1).into(),
    ]));

    assert_eq!(result.err(), Some(&coltab::TableError::UnknownColumn("nope".into())));
}
