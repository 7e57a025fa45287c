//! ABOUTME: Composable filter/sort/paginate builder for the joined activist listing
//! ABOUTME: Every caller-supplied value goes through push_bind, never into the SQL text

use rc_core::{Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite};

/// Joined listing: identity, membership, and attendance aggregates per activist
const SELECT_EXTRA: &str = r#"
SELECT
  a.id,
  a.name,
  a.email,
  a.chapter,
  a.phone,
  a.location,
  a.facebook,
  a.liberation_pledge,
  a.activist_level,
  a.exclude_from_leaderboard,
  a.core_staff,
  a.global_team_member,
  MIN(e.date) AS first_event,
  MAX(e.date) AS last_event,
  COUNT(e.id) AS total_events
FROM activists a
LEFT JOIN event_attendance ea
  ON ea.activist_id = a.id
LEFT JOIN events e
  ON ea.event_id = e.id
"#;

/// Wire value for ascending order in range options
pub const ASC_ORDER: i64 = 1;
/// Wire value for descending order in range options
pub const DESC_ORDER: i64 = 2;

/// Direction of a name-ordered listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    fn keyword(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "ASC",
            SortOrder::Descending => "DESC",
        }
    }
}

impl TryFrom<i64> for SortOrder {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self> {
        match value {
            ASC_ORDER => Ok(SortOrder::Ascending),
            DESC_ORDER => Ok(SortOrder::Descending),
            other => Err(Error::Validation(format!(
                "Range order must be ascending ({}) or descending ({}), got {}",
                ASC_ORDER, DESC_ORDER, other
            ))),
        }
    }
}

/// Range listing options as they arrive in JSON
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RangeOptions {
    /// Exclusive cursor; empty means start from the first name
    pub name: String,
    /// Maximum rows; zero or negative means unlimited
    pub limit: i64,
    pub order: i64,
}

impl RangeOptions {
    /// Check the options and turn them into a keyset page query
    pub fn to_query(&self) -> Result<ActivistQuery> {
        let order = SortOrder::try_from(self.order)?;

        let filter = match (self.name.is_empty(), order) {
            (true, _) => ActivistFilter::All,
            (false, SortOrder::Ascending) => ActivistFilter::NameAfter(self.name.clone()),
            (false, SortOrder::Descending) => ActivistFilter::NameBefore(self.name.clone()),
        };

        Ok(ActivistQuery {
            filter,
            group: Grouping::ByName,
            order: Some(order),
            limit: (self.limit > 0).then_some(self.limit),
        })
    }
}

/// Row selection for the joined listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivistFilter {
    All,
    Id(i64),
    Name(String),
    /// Strictly greater than the cursor name
    NameAfter(String),
    /// Strictly less than the cursor name
    NameBefore(String),
}

/// Grouping key for the attendance aggregates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grouping {
    ById,
    ByName,
}

/// A fully described listing query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivistQuery {
    pub filter: ActivistFilter,
    pub group: Grouping,
    /// Order by name; None orders by id
    pub order: Option<SortOrder>,
    pub limit: Option<i64>,
}

impl ActivistQuery {
    pub fn all() -> Self {
        Self {
            filter: ActivistFilter::All,
            group: Grouping::ById,
            order: None,
            limit: None,
        }
    }

    pub fn by_id(id: i64) -> Self {
        Self {
            filter: ActivistFilter::Id(id),
            ..Self::all()
        }
    }

    /// Grouped by id so duplicate names stay visible as separate rows
    pub fn by_name(name: &str) -> Self {
        Self {
            filter: ActivistFilter::Name(name.to_string()),
            ..Self::all()
        }
    }

    /// Build the parameterized statement
    pub fn builder(&self) -> QueryBuilder<'static, Sqlite> {
        let mut builder = QueryBuilder::new(SELECT_EXTRA);

        match &self.filter {
            ActivistFilter::All => {}
            ActivistFilter::Id(id) => {
                builder.push(" WHERE a.id = ");
                builder.push_bind(*id);
            }
            ActivistFilter::Name(name) => {
                builder.push(" WHERE a.name = ");
                builder.push_bind(name.clone());
            }
            ActivistFilter::NameAfter(name) => {
                builder.push(" WHERE a.name > ");
                builder.push_bind(name.clone());
            }
            ActivistFilter::NameBefore(name) => {
                builder.push(" WHERE a.name < ");
                builder.push_bind(name.clone());
            }
        }

        builder.push(match self.group {
            Grouping::ById => " GROUP BY a.id",
            Grouping::ByName => " GROUP BY a.name",
        });

        match self.order {
            Some(order) => {
                builder.push(" ORDER BY a.name ");
                builder.push(order.keyword());
            }
            None => {
                builder.push(" ORDER BY a.id");
            }
        }

        if let Some(limit) = self.limit {
            builder.push(" LIMIT ");
            builder.push_bind(limit);
        }

        builder
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalized(query: &ActivistQuery) -> String {
        let builder = query.builder();
        builder.sql().split_whitespace().collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_order_values() {
        assert_eq!(SortOrder::try_from(1).unwrap(), SortOrder::Ascending);
        assert_eq!(SortOrder::try_from(2).unwrap(), SortOrder::Descending);

        for bad in [0, 3, -1] {
            let err = SortOrder::try_from(bad).unwrap_err();
            assert!(matches!(err, Error::Validation(_)));
        }
    }

    #[test]
    fn test_first_page_has_no_cursor() {
        let options = RangeOptions {
            name: String::new(),
            limit: 0,
            order: ASC_ORDER,
        };
        let query = options.to_query().unwrap();

        assert_eq!(query.filter, ActivistFilter::All);
        assert_eq!(query.limit, None);

        let sql = normalized(&query);
        assert!(!sql.contains("WHERE"));
        assert!(sql.ends_with("GROUP BY a.name ORDER BY a.name ASC"));
    }

    #[test]
    fn test_descending_cursor_binds_name() {
        let options = RangeOptions {
            name: "Bob".into(),
            limit: 10,
            order: DESC_ORDER,
        };
        let query = options.to_query().unwrap();
        assert_eq!(query.filter, ActivistFilter::NameBefore("Bob".into()));

        let sql = normalized(&query);
        assert!(sql.contains("WHERE a.name < ?"));
        assert!(sql.ends_with("ORDER BY a.name DESC LIMIT ?"));
        assert!(!sql.contains("Bob"));
    }

    #[test]
    fn test_negative_limit_is_unlimited() {
        let options = RangeOptions {
            name: "Bob".into(),
            limit: -5,
            order: ASC_ORDER,
        };
        let query = options.to_query().unwrap();
        assert_eq!(query.limit, None);
        assert!(normalized(&query).contains("WHERE a.name > ?"));
    }

    #[test]
    fn test_invalid_order_rejected() {
        let options = RangeOptions {
            name: "Bob".into(),
            limit: 2,
            order: 3,
        };
        assert!(matches!(options.to_query(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_name_lookup_groups_by_id() {
        let sql = normalized(&ActivistQuery::by_name("Robert'); DROP TABLE activists;--"));
        assert!(sql.contains("WHERE a.name = ? GROUP BY a.id"));
        assert!(!sql.contains("DROP"));
    }

    #[test]
    fn test_range_options_from_json() {
        let options: RangeOptions =
            serde_json::from_str(r#"{"name":"Carol","limit":25,"order":2}"#).unwrap();
        assert_eq!(options.name, "Carol");
        assert_eq!(options.limit, 25);
        assert_eq!(options.order, DESC_ORDER);

        // Missing fields fall back to defaults, which leaves an invalid order
        let options: RangeOptions = serde_json::from_str("{}").unwrap();
        assert!(options.to_query().is_err());
    }
}
