use std::fmt;

/// The element types a table column can hold.
/// Every column of a [crate::Table] has exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// A 64-bit signed integer. Cannot be null.
    Int,
    /// A 64-bit floating-point number. `NaN` is the null value.
    Float,
    /// A boolean value. Cannot be null.
    Bool,
    /// A UTF-8 string stored in a shared byte blob, with an explicit null flag.
    String,
    /// A dictionary encoded string with at most 255 distinct values.
    Enum,
}

impl DataType {
    /// Returns `true` if the type has a representation for missing values.
    pub fn is_nullable(self) -> bool {
        matches!(self, Self::Float | Self::String | Self::Enum)
    }

    /// Element type seen by user functions. Enum columns hand out plain strings.
    pub fn element_type(self) -> DataType {
        match self {
            Self::Enum => Self::String,
            other => other,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::String => "string",
            Self::Enum => "enum",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nullable_types() {
        assert!(!DataType::Int.is_nullable());
        assert!(!DataType::Bool.is_nullable());
        assert!(DataType::Float.is_nullable());
        assert!(DataType::String.is_nullable());
        assert!(DataType::Enum.is_nullable());
    }

    #[test]
    fn test_enum_elements_are_strings() {
        assert_eq!(DataType::Enum.element_type(), DataType::String);
        assert_eq!(DataType::Int.element_type(), DataType::Int);
    }

    #[test]
    fn test_display() {
        assert_eq!(DataType::Float.to_string(), "float");
        assert_eq!(DataType::Enum.to_string(), "enum");
    }
}
