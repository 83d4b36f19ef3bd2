//! SQLite warrior store implementation.
//!
//! Every operation borrows one handle from the [`DbPool`] for its duration.
//! A connection-level failure marks the handle broken, so the pool discards
//! and replaces it instead of lending it out again.

use std::sync::Arc;
use std::time::Duration;

use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::sql_types::{BigInt, Text};
use tracing::warn;

use crate::adapter::outbound::sqlite::database::connection::DbPool;
use crate::adapter::outbound::sqlite::database::model::WarriorRow;
use crate::adapter::outbound::sqlite::database::schema::warrior;
use crate::domain::warrior::truncate_search_term;
use crate::domain::{NewWarrior, Warrior, WarriorId};
use crate::error::{Error, Result};
use crate::port::outbound::store::WarriorStore;

/// Name matches rank first, then birth-date matches, then skill matches.
const SEARCH_SQL: &str = "\
    SELECT id, name, dob, fight_skills FROM warrior \
    WHERE name LIKE ? \
       OR dob LIKE ? \
       OR EXISTS (SELECT 1 FROM json_each(warrior.fight_skills) AS skill \
                  WHERE lower(skill.value) = lower(?)) \
    ORDER BY CASE WHEN name LIKE ? THEN 1 \
                  WHEN dob LIKE ? THEN 2 \
                  ELSE 3 END, \
             name \
    LIMIT ?";

/// SQLite-backed warrior store.
pub struct SqliteWarriorStore {
    pool: Arc<DbPool>,
}

impl SqliteWarriorStore {
    #[must_use]
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &Arc<DbPool> {
        &self.pool
    }

    /// Borrow a handle for one query, discarding it on connection faults.
    fn with_conn<T>(
        &self,
        timeout: Duration,
        query: impl FnOnce(&mut SqliteConnection) -> QueryResult<T>,
    ) -> Result<T> {
        let mut conn = self.pool.get_timeout(timeout)?;
        match query(&mut *conn) {
            Ok(value) => Ok(value),
            Err(e) => {
                if is_connection_fault(&e) {
                    warn!(connection_id = conn.id(), error = %e, "Connection fault, discarding handle");
                    conn.mark_broken();
                }
                Err(e.into())
            }
        }
    }

    fn acquire_timeout(&self) -> Duration {
        self.pool.config().acquire_timeout()
    }

    fn to_row(record: &Warrior) -> Result<WarriorRow> {
        Ok(WarriorRow {
            id: record.id.to_string(),
            name: record.name.clone(),
            dob: record.dob.clone(),
            fight_skills: serde_json::to_string(&record.fight_skills)?,
        })
    }

    fn from_row(row: WarriorRow) -> Result<Warrior> {
        let id = WarriorId::parse(&row.id)
            .ok_or_else(|| Error::Database(format!("stored warrior id '{}' is not a UUID", row.id)))?;
        Ok(Warrior {
            id,
            name: row.name,
            dob: row.dob,
            fight_skills: serde_json::from_str(&row.fight_skills)?,
        })
    }
}

/// Errors meaning the handle itself is unusable, not just the statement.
fn is_connection_fault(err: &DieselError) -> bool {
    matches!(
        err,
        DieselError::DatabaseError(
            DatabaseErrorKind::ClosedConnection | DatabaseErrorKind::UnableToSendCommand,
            _
        ) | DieselError::BrokenTransactionManager
    )
}

impl WarriorStore for SqliteWarriorStore {
    fn create(&self, new: NewWarrior) -> Result<Warrior> {
        let record = new.into_warrior(WarriorId::generate());
        let row = Self::to_row(&record)?;

        self.with_conn(self.acquire_timeout(), |conn| {
            diesel::insert_into(warrior::table)
                .values(&row)
                .execute(conn)
        })?;
        Ok(record)
    }

    fn get(&self, id: &WarriorId) -> Result<Option<Warrior>> {
        let row = self.with_conn(self.acquire_timeout(), |conn| {
            warrior::table
                .find(id.as_str())
                .select(WarriorRow::as_select())
                .first(conn)
                .optional()
        })?;
        row.map(Self::from_row).transpose()
    }

    fn search(&self, term: &str, limit: usize) -> Result<Vec<Warrior>> {
        let term = truncate_search_term(term);
        let pattern = format!("%{term}%");
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let rows: Vec<WarriorRow> = self.with_conn(self.acquire_timeout(), |conn| {
            diesel::sql_query(SEARCH_SQL)
                .bind::<Text, _>(&pattern)
                .bind::<Text, _>(&pattern)
                .bind::<Text, _>(term)
                .bind::<Text, _>(&pattern)
                .bind::<Text, _>(&pattern)
                .bind::<BigInt, _>(limit)
                .load(conn)
        })?;
        rows.into_iter().map(Self::from_row).collect()
    }

    fn count(&self) -> Result<u64> {
        let count: i64 = self.with_conn(self.acquire_timeout(), |conn| {
            warrior::table.count().get_result(conn)
        })?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    fn ping(&self) -> Result<()> {
        let timeout = self.pool.config().health_probe_timeout();
        self.with_conn(timeout, |conn| diesel::sql_query("SELECT 1").execute(conn))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_connection_is_a_connection_fault() {
        let err = DieselError::DatabaseError(
            DatabaseErrorKind::ClosedConnection,
            Box::new("connection closed".to_string()),
        );
        assert!(is_connection_fault(&err));
        assert!(is_connection_fault(&DieselError::BrokenTransactionManager));
    }

    #[test]
    fn statement_errors_keep_the_handle() {
        let err = DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new("UNIQUE constraint failed".to_string()),
        );
        assert!(!is_connection_fault(&err));
        assert!(!is_connection_fault(&DieselError::NotFound));
    }

    #[test]
    fn from_row_rejects_corrupt_skills() {
        let row = WarriorRow {
            id: WarriorId::generate().to_string(),
            name: "Bruce".into(),
            dob: "1940-11-27".into(),
            fight_skills: "not json".into(),
        };
        assert!(matches!(
            SqliteWarriorStore::from_row(row),
            Err(Error::Json(_))
        ));
    }
}
