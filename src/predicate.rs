//! Typed filter predicates.
//!
//! A filter names an operator token or a user function, plus an argument. Which element type
//! a user function takes is part of its [Predicate] variant, so columns resolve it by matching.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::column::Column;
use crate::error::TableError;

/// Built-in filter operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    In,
    Like,
    ILike,
    IsNull,
    IsNotNull,
    AnyBits,
    AllBits,
}

impl Operator {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Neq => "!=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::In => "in",
            Self::Like => "like",
            Self::ILike => "ilike",
            Self::IsNull => "isnull",
            Self::IsNotNull => "isnotnull",
            Self::AnyBits => "any_bits",
            Self::AllBits => "all_bits",
        }
    }

    /// Operators that take no argument.
    pub fn is_unary(self) -> bool {
        matches!(self, Self::IsNull | Self::IsNotNull)
    }

    /// The relation selecting the complement of non-null rows, e.g. `>=` for `<`.
    ///
    /// An inverted filter runs this operator instead of negating the result, so null cells
    /// keep the null behavior of the inverse relation.
    pub fn inverse(self) -> Option<Self> {
        let inverse = match self {
            Self::Eq => Self::Neq,
            Self::Neq => Self::Eq,
            Self::Lt => Self::Gte,
            Self::Lte => Self::Gt,
            Self::Gt => Self::Lte,
            Self::Gte => Self::Lt,
            _ => return None,
        };
        Some(inverse)
    }
}

impl FromStr for Operator {
    type Err = TableError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let op = match token.to_ascii_lowercase().as_str() {
            "=" | "==" | "eq" => Self::Eq,
            "!=" | "<>" | "neq" => Self::Neq,
            "<" | "lt" => Self::Lt,
            "<=" | "lte" => Self::Lte,
            ">" | "gt" => Self::Gt,
            ">=" | "gte" => Self::Gte,
            "in" => Self::In,
            "like" => Self::Like,
            "ilike" => Self::ILike,
            "isnull" => Self::IsNull,
            "isnotnull" => Self::IsNotNull,
            "any_bits" => Self::AnyBits,
            "all_bits" => Self::AllBits,
            _ => return Err(TableError::UnknownOperator(token.to_string())),
        };
        Ok(op)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Literal operand of a filter, as given by the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    None,
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    IntSet(Vec<i64>),
    StrSet(Vec<String>),
    /// Another column of the same table, compared row by row.
    Column(String),
}

impl Arg {
    pub fn column(name: impl Into<String>) -> Self {
        Self::Column(name.into())
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("-"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Str(s) => write!(f, "{s:?}"),
            Self::IntSet(v) => write!(f, "{v:?}"),
            Self::StrSet(v) => write!(f, "{v:?}"),
            Self::Column(c) => write!(f, "col({c})"),
        }
    }
}

impl From<i64> for Arg {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Arg {
    fn from(v: i32) -> Self {
        Self::Int(v.into())
    }
}

impl From<f64> for Arg {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for Arg {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for Arg {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for Arg {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<Vec<i64>> for Arg {
    fn from(v: Vec<i64>) -> Self {
        Self::IntSet(v)
    }
}

impl From<Vec<&str>> for Arg {
    fn from(v: Vec<&str>) -> Self {
        Self::StrSet(v.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<String>> for Arg {
    fn from(v: Vec<String>) -> Self {
        Self::StrSet(v)
    }
}

pub type IntFn = Arc<dyn Fn(i64) -> bool + Send + Sync>;
pub type IntFn2 = Arc<dyn Fn(i64, i64) -> bool + Send + Sync>;
pub type FloatFn = Arc<dyn Fn(f64) -> bool + Send + Sync>;
pub type FloatFn2 = Arc<dyn Fn(f64, f64) -> bool + Send + Sync>;
pub type BoolFn = Arc<dyn Fn(bool) -> bool + Send + Sync>;
pub type BoolFn2 = Arc<dyn Fn(bool, bool) -> bool + Send + Sync>;
pub type StrFn = Arc<dyn Fn(Option<&str>) -> bool + Send + Sync>;
pub type StrFn2 = Arc<dyn Fn(Option<&str>, Option<&str>) -> bool + Send + Sync>;

/// What a filter evaluates per row: an operator token, or a user function over one element
/// (unary) or over this column and another same-typed column (binary).
#[derive(Clone)]
pub enum Predicate {
    Op(Operator),
    Int(IntFn),
    Int2(IntFn2),
    Float(FloatFn),
    Float2(FloatFn2),
    Bool(BoolFn),
    Bool2(BoolFn2),
    /// Used by String and Enum columns. `None` is a null cell.
    Str(StrFn),
    Str2(StrFn2),
}

impl Predicate {
    pub fn int(f: impl Fn(i64) -> bool + Send + Sync + 'static) -> Self {
        Self::Int(Arc::new(f))
    }

    pub fn int2(f: impl Fn(i64, i64) -> bool + Send + Sync + 'static) -> Self {
        Self::Int2(Arc::new(f))
    }

    pub fn float(f: impl Fn(f64) -> bool + Send + Sync + 'static) -> Self {
        Self::Float(Arc::new(f))
    }

    pub fn float2(f: impl Fn(f64, f64) -> bool + Send + Sync + 'static) -> Self {
        Self::Float2(Arc::new(f))
    }

    pub fn bool(f: impl Fn(bool) -> bool + Send + Sync + 'static) -> Self {
        Self::Bool(Arc::new(f))
    }

    pub fn bool2(f: impl Fn(bool, bool) -> bool + Send + Sync + 'static) -> Self {
        Self::Bool2(Arc::new(f))
    }

    pub fn str(f: impl Fn(Option<&str>) -> bool + Send + Sync + 'static) -> Self {
        Self::Str(Arc::new(f))
    }

    pub fn str2(f: impl Fn(Option<&str>, Option<&str>) -> bool + Send + Sync + 'static) -> Self {
        Self::Str2(Arc::new(f))
    }

    /// Name used in messages for function predicates.
    fn kind(&self) -> &'static str {
        match self {
            Self::Op(_) => "operator",
            Self::Int(_) => "fn(int)",
            Self::Int2(_) => "fn(int, int)",
            Self::Float(_) => "fn(float)",
            Self::Float2(_) => "fn(float, float)",
            Self::Bool(_) => "fn(bool)",
            Self::Bool2(_) => "fn(bool, bool)",
            Self::Str(_) => "fn(string)",
            Self::Str2(_) => "fn(string, string)",
        }
    }
}

impl From<Operator> for Predicate {
    fn from(op: Operator) -> Self {
        Self::Op(op)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Op(op) => write!(f, "Op({op})"),
            other => f.write_str(other.kind()),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Op(op) => write!(f, "{op}"),
            other => f.write_str(other.kind()),
        }
    }
}

/// Filter argument with column references resolved against the table.
#[derive(Clone, Copy)]
pub enum Comparatee<'a> {
    None,
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(&'a str),
    IntSet(&'a [i64]),
    StrSet(&'a [String]),
    Column(&'a dyn Column),
}

impl Comparatee<'_> {
    /// Short description of the argument for error messages.
    pub fn describe(&self) -> String {
        match self {
            Self::None => "none".into(),
            Self::Int(i) => format!("int {i}"),
            Self::Float(x) => format!("float {x}"),
            Self::Bool(b) => format!("bool {b}"),
            Self::Str(s) => format!("string {s:?}"),
            Self::IntSet(_) => "int set".into(),
            Self::StrSet(_) => "string set".into(),
            Self::Column(c) => format!("{} column", c.data_type()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_operator_tokens() {
        assert_eq!("==".parse::<Operator>().unwrap(), Operator::Eq);
        assert_eq!(">=".parse::<Operator>().unwrap(), Operator::Gte);
        assert_eq!("ILIKE".parse::<Operator>().unwrap(), Operator::ILike);
        assert_eq!("isnotnull".parse::<Operator>().unwrap(), Operator::IsNotNull);
        assert_eq!(
            "~".parse::<Operator>(),
            Err(TableError::UnknownOperator("~".into()))
        );
    }

    #[test]
    fn test_operator_inverse() {
        assert_eq!(Operator::Lt.inverse(), Some(Operator::Gte));
        assert_eq!(Operator::Gt.inverse(), Some(Operator::Lte));
        assert_eq!(Operator::Eq.inverse(), Some(Operator::Neq));
        for op in [
            Operator::Eq,
            Operator::Neq,
            Operator::Lt,
            Operator::Lte,
            Operator::Gt,
            Operator::Gte,
        ] {
            assert_eq!(op.inverse().and_then(Operator::inverse), Some(op));
        }
        assert_eq!(Operator::In.inverse(), None);
        assert_eq!(Operator::Like.inverse(), None);
    }

    #[test]
    fn test_arg_conversions() {
        assert_eq!(Arg::from(3), Arg::Int(3));
        assert_eq!(Arg::from("a"), Arg::Str("a".into()));
        assert_eq!(
            Arg::from(vec!["a", "b"]),
            Arg::StrSet(vec!["a".into(), "b".into()])
        );
        assert_eq!(Arg::column("x"), Arg::Column("x".into()));
    }

    #[test]
    fn test_predicate_debug() {
        assert_eq!(format!("{:?}", Predicate::Op(Operator::Lt)), "Op(<)");
        assert_eq!(format!("{:?}", Predicate::int(|x| x > 0)), "fn(int)");
        assert_eq!(Predicate::str2(|a, b| a == b).to_string(), "fn(string, string)");
    }
}
