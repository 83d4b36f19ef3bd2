//! Database model types for Diesel ORM.

use diesel::prelude::*;

use super::schema::warrior;

/// Database row for a warrior.
///
/// `fight_skills` holds the skills as a JSON array.
#[derive(Queryable, QueryableByName, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = warrior)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct WarriorRow {
    pub id: String,
    pub name: String,
    pub dob: String,
    pub fight_skills: String,
}
