use coltab::*;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("In-Memory Columnar Table Demo\n");

    // Create table "users"
    let users = Table::from_columns(vec![
        ("id", ColumnData::Int(vec![1, 2, 3, 4, 5, 6])),
        (
            "name",
            ColumnData::from(vec!["Alice", "Bob", "Charlie", "Dana", "Eve", "Frank"]),
        ),
        (
            "age",
            // NaN: Bob's age is unknown
            ColumnData::Float(vec![30.0, f64::NAN, 25.0, 41.0, 30.0, 25.0]),
        ),
        (
            "city",
            ColumnData::from(vec![
                Some("Paris"),
                Some("Lyon"),
                Some("Paris"),
                None,
                Some("Lyon"),
                Some("Paris"),
            ]),
        ),
    ])
    .into_result()?;
    println!("{users}\n");

    // Filter
    println!("Users older than 26 or without a city:");
    let clause = Clause::or([
        Filter::new("age", Operator::Gt, 26.0).into(),
        Filter::unary("city", Operator::IsNull).into(),
    ]);
    println!("{clause}");
    println!("{}\n", users.filter(clause).into_result()?);

    // Sort
    println!("Sorted by age, unknown ages last:");
    let sorted = users.sort(&[Order::asc("age").nulls_last(), Order::asc("name")]);
    println!("{}\n", sorted.into_result()?);

    // Group and aggregate
    println!("Average age per city:");
    let registry = AggregationRegistry::default();
    let grouped = users.group_by(GroupByConfig::new().columns(["city"]));
    println!("{:?}", grouped.stats());
    let per_city = grouped
        .aggregate(
            &[
                Aggregation::new("avg", "age"),
                Aggregation::new("count", "id").alias("users"),
            ],
            &registry,
        )
        .into_result()?;
    println!("{per_city}\n");

    // Distinct
    println!("Distinct ages:");
    let ages = users
        .distinct(DistinctConfig::new().columns(["age"]).group_by_null(true))
        .select(&["age"])
        .into_result()?;
    for age in ages.float_view("age")?.iter() {
        println!("  - {age}");
    }

    // Rolling mean of ages, in id order
    println!("\nRolling mean of three ages:");
    let mean = ReduceFn::float(|w| w.iter().sum::<f64>() / w.len() as f64);
    let rolled = users
        .sort(&[Order::asc("id")])
        .rolling("age_mean", "age", &mean, RollingConfig::new().window_size(3))
        .select(&["id", "age", "age_mean"])
        .into_result()?;
    println!("{rolled}\n");

    // Age everyone in Paris by one year, then add last year's users
    let older = users
        .filtered_apply(
            Filter::new("city", Operator::Eq, "Paris"),
            &[Instruction::map(
                "age",
                "age",
                MapFn::float(|a| Value::from(a + 1.0)),
                DataType::Float,
            )],
        )
        .append(&[&users]);
    println!("{} rows after append", older.len());

    // Errors stay attached to the table until checked
    let failed = users
        .filter(Filter::new("name", Operator::Gt, 3))
        .sort(&[Order::asc("id")]);
    if let Some(err) = failed.err() {
        println!("\nError: {err}");
    }

    Ok(())
}
