use crate::errors::LimitsError;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// The two row tables of the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    Limit,
    ExpectedState,
}

impl TableKind {
    pub const ALL: [TableKind; 2] = [TableKind::Limit, TableKind::ExpectedState];

    /// Argument spelling (`limit` / `expected_state`)
    pub fn as_str(&self) -> &'static str {
        match self {
            TableKind::Limit => "limit",
            TableKind::ExpectedState => "expected_state",
        }
    }

    /// SQL table holding rows of this kind
    pub fn table_name(&self) -> &'static str {
        match self {
            TableKind::Limit => "limits",
            TableKind::ExpectedState => "expected_states",
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TableKind {
    type Err = LimitsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "limit" => Ok(TableKind::Limit),
            "expected_state" => Ok(TableKind::ExpectedState),
            _ => Err(LimitsError::InvalidTableType {
                value: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("LIMIT".parse::<TableKind>().unwrap(), TableKind::Limit);
        assert_eq!(
            "expected_state".parse::<TableKind>().unwrap(),
            TableKind::ExpectedState
        );
    }

    #[test]
    fn test_invalid_table_type_message() {
        let err = "limits".parse::<TableKind>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Argument 'tabletype' is entered as limits, should be either 'limit' or 'expected_state'"
        );
    }
}
