pub mod aggregation;
pub mod apply;
pub mod clause;
pub mod column;
pub mod config;
pub mod data_type;
pub mod error;
pub mod grouped;
pub mod hash;
pub mod index;
pub mod predicate;
pub mod sorter;
pub mod table;
pub mod value;
pub mod view;

mod grouper;
mod rolling;

pub use aggregation::{Aggregation, AggregationRegistry, ReduceFn};
pub use apply::{Instruction, MapFn, ZipFn};
pub use clause::{Clause, Filter};
pub use column::{Column, ColumnRef, CompareResult, EnumColumn};
pub use config::{
    DistinctConfig, DistinctStrategy, GroupByConfig, NewTableConfig, RollingConfig, WindowPosition,
};
pub use data_type::DataType;
pub use error::{Result, TableError};
pub use grouped::Grouped;
pub use grouper::GroupStats;
pub use index::RowIndex;
pub use predicate::{Arg, Operator, Predicate};
pub use sorter::Order;
pub use table::{ColumnData, Table};
pub use value::Value;
pub use view::{BoolView, ColumnView, FloatView, IntView, StringView};
