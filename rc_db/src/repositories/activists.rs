//! ABOUTME: Activist repository with attendance aggregates and keyset range listing
//! ABOUTME: Covers lookups by id and name, get-or-create by name, and full updates

use crate::models::{Activist, ActivistExtra, ActivistJson, AttendanceSummary, Membership};
use crate::query::{ActivistQuery, RangeOptions};
use crate::status::{DefaultStatusPolicy, StatusPolicy};
use chrono::NaiveDate;
use rc_core::{time::parse_event_date, today, Error, Result};
use sqlx::{sqlite::SqliteRow, FromRow, Row, SqliteConnection, SqlitePool};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

const SELECT_ACTIVIST: &str = r#"
SELECT id, name, email, chapter, phone, location, facebook, liberation_pledge
FROM activists
"#;

/// Activist repository
pub struct ActivistRepository<'a> {
    pool: &'a SqlitePool,
    policy: Arc<dyn StatusPolicy>,
    as_of: Option<NaiveDate>,
}

impl<'a> ActivistRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self {
            pool,
            policy: Arc::new(DefaultStatusPolicy::default()),
            as_of: None,
        }
    }

    /// Use a different status policy
    pub fn with_policy(mut self, policy: Arc<dyn StatusPolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Derive statuses as of a fixed day instead of today
    pub fn as_of(mut self, day: NaiveDate) -> Self {
        self.as_of = Some(day);
        self
    }

    /// Find an activist with attendance and membership data by id
    #[instrument(skip(self))]
    pub async fn get_by_id(&self, id: i64) -> Result<ActivistExtra> {
        debug!(id, "Finding activist by id");

        self.fetch_extra(&ActivistQuery::by_id(id), "get_by_id", id)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound(format!("Activist {} not found", id)))
    }

    /// List every activist with attendance and membership data
    #[instrument(skip(self))]
    pub async fn get_all(&self) -> Result<Vec<ActivistExtra>> {
        debug!("Listing all activists");

        let activists = self
            .fetch_extra(&ActivistQuery::all(), "get_all", "all")
            .await?;

        debug!("Found {} activists", activists.len());
        Ok(activists)
    }

    /// Find the single activist with this name
    #[instrument(skip(self))]
    pub async fn get_by_name(&self, name: &str) -> Result<ActivistExtra> {
        debug!(name = %name, "Finding activist by name");

        let matches = self
            .fetch_extra(&ActivistQuery::by_name(name), "get_by_name", name)
            .await?;

        single(matches, name)
    }

    /// One keyset page of activists ordered by name
    ///
    /// The cursor is exclusive: ascending pages hold names after it, descending pages names before it.
    #[instrument(skip(self))]
    pub async fn list_range(&self, options: &RangeOptions) -> Result<Vec<ActivistExtra>> {
        let query = options.to_query()?;

        debug!(
            cursor = %options.name,
            limit = options.limit,
            order = ?query.order,
            "Listing activist range"
        );

        let activists = self.fetch_extra(&query, "list_range", &options.name).await?;

        debug!("Range returned {} activists", activists.len());
        Ok(activists)
    }

    /// Attendance aggregates for one activist, without the joined listing
    #[instrument(skip(self))]
    pub async fn event_aggregate(&self, activist_id: i64) -> Result<AttendanceSummary> {
        debug!(activist_id, "Loading event aggregate");

        let row = sqlx::query(
            r#"
            SELECT
              MIN(e.date) AS first_event,
              MAX(e.date) AS last_event,
              COUNT(*) AS total_events
            FROM events e
            JOIN event_attendance ea
              ON ea.event_id = e.id
            WHERE ea.activist_id = ?1
            "#,
        )
        .bind(activist_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| Error::database("event_aggregate", activist_id, e))?;

        self.summary_from_row(&row)
            .map_err(|e| Error::database("event_aggregate", activist_id, e))
    }

    /// Identity fields for the single activist with this name
    #[instrument(skip(self))]
    pub async fn find_by_name(&self, name: &str) -> Result<Activist> {
        debug!(name = %name, "Finding basic activist by name");

        let matches =
            sqlx::query_as::<_, Activist>(&format!("{} WHERE name = ?1", SELECT_ACTIVIST))
                .bind(name)
                .fetch_all(self.pool)
                .await
                .map_err(|e| Error::database("find_by_name", name, e))?;

        single(matches, name)
    }

    /// Identity fields for every activist, ordered by name
    #[instrument(skip(self))]
    pub async fn list_basic(&self) -> Result<Vec<Activist>> {
        debug!("Listing basic activists");

        sqlx::query_as::<_, Activist>(&format!("{} ORDER BY name", SELECT_ACTIVIST))
            .fetch_all(self.pool)
            .await
            .map_err(|e| Error::database("list_basic", "all", e))
    }

    /// Return the activist with this name, inserting a bare row if none exists
    ///
    /// Two callers racing on the same new name can both miss the lookup. If the store
    /// rejects the second insert as a unique violation, the winner's row is returned;
    /// without a unique index both inserts succeed and later name lookups report
    /// the duplicate as ambiguous.
    #[instrument(skip(self))]
    pub async fn get_or_create(&self, name: &str) -> Result<Activist> {
        match self.find_by_name(name).await {
            Ok(activist) => return Ok(activist),
            Err(Error::NotFound(_)) => {}
            Err(e) => return Err(e),
        }

        debug!(name = %name, "Creating activist");

        // Insert and re-read atomically so a failed read never leaves a stray row
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| Error::database("get_or_create.begin", name, e))?;

        let inserted = sqlx::query("INSERT INTO activists (name) VALUES (?1)")
            .bind(name)
            .execute(&mut *tx)
            .await;

        if let Err(e) = inserted {
            let conflict = e
                .as_database_error()
                .is_some_and(|db| db.is_unique_violation());
            // Dropping the transaction rolls it back
            drop(tx);

            if conflict {
                warn!(name = %name, "Concurrent insert won the race, fetching existing row");
                return self.find_by_name(name).await;
            }
            return Err(Error::database("get_or_create.insert", name, e));
        }

        let created = read_activist_by_name(&mut *tx, name)
            .await
            .map_err(|e| Error::database("get_or_create.read", name, e))?;

        tx.commit()
            .await
            .map_err(|e| Error::database("get_or_create.commit", name, e))?;

        debug!(id = created.id, "Successfully created activist");
        Ok(created)
    }

    /// Overwrite every mutable field of an existing activist
    #[instrument(skip(self, record), fields(id = record.activist.id))]
    pub async fn update_full(&self, record: &ActivistExtra) -> Result<i64> {
        let ActivistExtra {
            activist,
            membership,
            ..
        } = record;

        debug!("Updating activist");

        let result = sqlx::query(
            r#"
            UPDATE activists
            SET
              name = ?1,
              email = ?2,
              chapter = ?3,
              phone = ?4,
              location = ?5,
              facebook = ?6,
              activist_level = ?7,
              exclude_from_leaderboard = ?8,
              core_staff = ?9,
              global_team_member = ?10,
              liberation_pledge = ?11
            WHERE id = ?12
            "#,
        )
        .bind(&activist.name)
        .bind(&activist.email)
        .bind(&activist.chapter)
        .bind(&activist.phone)
        .bind(&activist.location)
        .bind(&activist.facebook)
        .bind(&membership.activist_level)
        .bind(membership.exclude_from_leaderboard)
        .bind(membership.core_staff)
        .bind(membership.global_team_member)
        .bind(activist.liberation_pledge)
        .bind(activist.id)
        .execute(self.pool)
        .await
        .map_err(|e| Error::database("update_full", activist.id, e))?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("Activist {} not found", activist.id)));
        }

        debug!("Successfully updated activist");
        Ok(activist.id)
    }

    pub async fn get_all_json(&self) -> Result<Vec<ActivistJson>> {
        Ok(self.get_all().await?.into_iter().map(Into::into).collect())
    }

    pub async fn get_json_by_id(&self, id: i64) -> Result<ActivistJson> {
        Ok(self.get_by_id(id).await?.into())
    }

    pub async fn list_range_json(&self, options: &RangeOptions) -> Result<Vec<ActivistJson>> {
        Ok(self
            .list_range(options)
            .await?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    async fn fetch_extra(
        &self,
        query: &ActivistQuery,
        operation: &'static str,
        key: impl ToString,
    ) -> Result<Vec<ActivistExtra>> {
        let mut builder = query.builder();

        let rows = builder
            .build()
            .fetch_all(self.pool)
            .await
            .map_err(|e| Error::database(operation, key.to_string(), e))?;

        rows.iter()
            .map(|row| self.extra_from_row(row))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::database(operation, key.to_string(), e))
    }

    fn extra_from_row(&self, row: &SqliteRow) -> std::result::Result<ActivistExtra, sqlx::Error> {
        Ok(ActivistExtra {
            activist: Activist::from_row(row)?,
            attendance: self.summary_from_row(row)?,
            membership: Membership {
                core_staff: row.try_get("core_staff")?,
                exclude_from_leaderboard: row.try_get("exclude_from_leaderboard")?,
                global_team_member: row.try_get("global_team_member")?,
                activist_level: row.try_get("activist_level")?,
            },
        })
    }

    fn summary_from_row(
        &self,
        row: &SqliteRow,
    ) -> std::result::Result<AttendanceSummary, sqlx::Error> {
        let first_event = date_column(row, "first_event")?;
        let last_event = date_column(row, "last_event")?;
        let total_events: i64 = row.try_get("total_events")?;

        let day = self.as_of.unwrap_or_else(today);
        let status = self
            .policy
            .status(first_event, last_event, total_events, day);

        Ok(AttendanceSummary {
            first_event,
            last_event,
            total_events,
            status,
        })
    }
}

fn single<T>(mut matches: Vec<T>, name: &str) -> Result<T> {
    match matches.len() {
        0 => Err(Error::NotFound(format!("No activist named {}", name))),
        1 => Ok(matches.remove(0)),
        n => Err(Error::Ambiguous(format!(
            "Found {} activists named {}",
            n, name
        ))),
    }
}

async fn read_activist_by_name(
    conn: &mut SqliteConnection,
    name: &str,
) -> std::result::Result<Activist, sqlx::Error> {
    sqlx::query_as::<_, Activist>(&format!("{} WHERE name = ?1", SELECT_ACTIVIST))
        .bind(name)
        .fetch_one(conn)
        .await
}

fn date_column(row: &SqliteRow, column: &str) -> std::result::Result<Option<NaiveDate>, sqlx::Error> {
    let raw: Option<String> = row.try_get(column)?;
    match raw {
        None => Ok(None),
        Some(raw) => parse_event_date(&raw).map(Some).ok_or_else(|| {
            sqlx::Error::ColumnDecode {
                index: column.to_string(),
                source: format!("invalid event date: {}", raw).into(),
            }
        }),
    }
}
