//! Локальное зеркало серверных данных (SQLite).
//!
//! Три вида записей - события, пользователи, брони - с ключом из серверного id.
//! Операции: `upsert` (создать или частично обновить, идемпотентно), `find`,
//! `query` (порядок вставки), `soft_delete` (надгробие, запись пропадает из выборок).
//! Несколько upsert одного прохода синхронизации выполняются через [`WriteBatch`]
//! одной транзакцией: либо видно всё, либо ничего.

use chrono::Utc;
use serde::Serialize;
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteConnection, SqliteRow};
use sqlx::{FromRow, Sqlite, Transaction};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use crate::database::Database;
use crate::error::MirrorError;
use crate::models::{Booking, BookingAttributes, Event, EventAttributes, User, UserAttributes};

pub mod bookings;
pub mod columns;
pub mod events;
pub mod users;

use columns::{SqlValue, Table, DELETED_AT_COLUMN, ID_COLUMN};

/// Вид записи зеркала: модель, её таблица и тип частичных атрибутов.
pub trait MirrorRecord: for<'r> FromRow<'r, SqliteRow> + Send + Unpin {
    const TABLE: &'static Table;
    type Attributes: Serialize + Sync;
}

impl MirrorRecord for Event {
    const TABLE: &'static Table = &columns::EVENTS;
    type Attributes = EventAttributes;
}

impl MirrorRecord for User {
    const TABLE: &'static Table = &columns::USERS;
    type Attributes = UserAttributes;
}

impl MirrorRecord for Booking {
    const TABLE: &'static Table = &columns::BOOKINGS;
    type Attributes = BookingAttributes;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upserted {
    Created,
    Updated,
}

/// Условие выборки: равенства и `IN (...)` по колонкам таблицы, через AND.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    clauses: Vec<Clause>,
}

#[derive(Debug, Clone)]
enum Clause {
    Eq(&'static str, String),
    OneOf(&'static str, Vec<String>),
}

impl Filter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: &'static str, value: impl Into<String>) -> Self {
        self.clauses.push(Clause::Eq(column, value.into()));
        self
    }

    pub fn one_of<I, S>(mut self, column: &'static str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.clauses.push(Clause::OneOf(column, values.into_iter().map(Into::into).collect()));
        self
    }

    fn to_sql(&self, table: &Table) -> Result<(String, Vec<String>), MirrorError> {
        let mut sql = format!("{} IS NULL", DELETED_AT_COLUMN);
        let mut binds = Vec::new();

        for clause in &self.clauses {
            let column = match clause {
                Clause::Eq(column, _) | Clause::OneOf(column, _) => *column,
            };
            if !table.has_column(column) {
                return Err(MirrorError::UnknownColumn { table: table.name, column });
            }
            match clause {
                Clause::Eq(column, value) => {
                    sql.push_str(&format!(" AND {} = ?", column));
                    binds.push(value.clone());
                }
                Clause::OneOf(_, values) if values.is_empty() => {
                    sql.push_str(" AND 0");
                }
                Clause::OneOf(column, values) => {
                    let placeholders = vec!["?"; values.len()].join(", ");
                    sql.push_str(&format!(" AND {} IN ({})", column, placeholders));
                    binds.extend(values.iter().cloned());
                }
            }
        }

        Ok((sql, binds))
    }
}

#[derive(Clone)]
pub struct MirrorStore {
    db: Database,
    // один писатель за раз: пакеты записи сериализуются
    write_lock: Arc<Mutex<()>>,
}

impl MirrorStore {
    pub fn new(db: Database) -> Self {
        Self { db, write_lock: Arc::new(Mutex::new(())) }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Открывает атомарный пакет записи. Пока пакет жив, другие писатели ждут.
    pub async fn begin(&self) -> Result<WriteBatch, MirrorError> {
        let guard = self.write_lock.clone().lock_owned().await;
        let tx = self.db.pool.begin().await?;
        Ok(WriteBatch { tx, _guard: guard })
    }

    pub async fn upsert<R: MirrorRecord>(&self, id: &str, attributes: &R::Attributes) -> Result<Upserted, MirrorError> {
        let mut batch = self.begin().await?;
        let outcome = batch.upsert::<R>(id, attributes).await?;
        batch.commit().await?;
        Ok(outcome)
    }

    /// Запись по id. Мягко удалённые записи не находятся.
    pub async fn find<R: MirrorRecord>(&self, id: &str) -> Result<Option<R>, MirrorError> {
        let mut found = self.query::<R>(&Filter::all().eq(ID_COLUMN, id)).await?;
        Ok(found.pop())
    }

    pub async fn query<R: MirrorRecord>(&self, filter: &Filter) -> Result<Vec<R>, MirrorError> {
        let (conditions, binds) = filter.to_sql(R::TABLE)?;
        let sql = format!(
            "SELECT {} FROM {} WHERE {} ORDER BY rowid",
            R::TABLE.select_list(),
            R::TABLE.name,
            conditions
        );

        let mut query = sqlx::query_as::<_, R>(&sql);
        for value in binds {
            query = query.bind(value);
        }
        Ok(query.fetch_all(&self.db.pool).await?)
    }

    pub async fn soft_delete<R: MirrorRecord>(&self, id: &str) -> Result<bool, MirrorError> {
        let mut batch = self.begin().await?;
        let deleted = batch.soft_delete::<R>(id).await?;
        batch.commit().await?;
        Ok(deleted)
    }

    /// id мягко удалённых записей вида `R`.
    pub async fn deleted_ids<R: MirrorRecord>(&self) -> Result<Vec<String>, MirrorError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE {} IS NOT NULL ORDER BY rowid",
            ID_COLUMN,
            R::TABLE.name,
            DELETED_AT_COLUMN
        );
        Ok(sqlx::query_scalar::<_, String>(&sql).fetch_all(&self.db.pool).await?)
    }
}

/// Атомарный пакет записи поверх одной транзакции SQLite.
/// Без `commit` все изменения пакета откатываются при drop.
pub struct WriteBatch {
    tx: Transaction<'static, Sqlite>,
    _guard: OwnedMutexGuard<()>,
}

impl WriteBatch {
    pub async fn upsert<R: MirrorRecord>(&mut self, id: &str, attributes: &R::Attributes) -> Result<Upserted, MirrorError> {
        upsert_in(&mut *self.tx, R::TABLE, id, attributes).await
    }

    pub async fn soft_delete<R: MirrorRecord>(&mut self, id: &str) -> Result<bool, MirrorError> {
        let sql = format!(
            "UPDATE {} SET {} = ? WHERE {} = ? AND {} IS NULL",
            R::TABLE.name,
            DELETED_AT_COLUMN,
            ID_COLUMN,
            DELETED_AT_COLUMN
        );
        let result = sqlx::query(&sql)
            .bind(Utc::now())
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub(crate) fn connection(&mut self) -> &mut SqliteConnection {
        &mut *self.tx
    }

    pub async fn commit(self) -> Result<(), MirrorError> {
        self.tx.commit().await?;
        Ok(())
    }

    pub async fn rollback(self) -> Result<(), MirrorError> {
        self.tx.rollback().await?;
        Ok(())
    }
}

/// Существует ли запись, включая мягко удалённые.
async fn exists_any(conn: &mut SqliteConnection, table: &Table, id: &str) -> Result<bool, MirrorError> {
    let sql = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE {} = ?)", table.name, ID_COLUMN);
    Ok(sqlx::query_scalar::<_, bool>(&sql).bind(id).fetch_one(conn).await?)
}

// Надгробие при upsert не снимается: удалённая админом запись не воскресает от синхронизации
async fn upsert_in<A: Serialize + Sync>(
    conn: &mut SqliteConnection,
    table: &Table,
    id: &str,
    attributes: &A,
) -> Result<Upserted, MirrorError> {
    let values = table.encode(attributes)?;

    if exists_any(&mut *conn, table, id).await? {
        if values.is_empty() {
            return Ok(Upserted::Updated);
        }
        let assignments: Vec<String> = values.iter().map(|(column, _)| format!("{} = ?", column)).collect();
        let sql = format!(
            "UPDATE {} SET {} WHERE {} = ?",
            table.name,
            assignments.join(", "),
            ID_COLUMN
        );
        let mut query = sqlx::query(&sql);
        for (_, value) in values {
            query = bind_value(query, value);
        }
        query.bind(id).execute(&mut *conn).await?;
        debug!("Mirror: updated {} {}", table.name, id);
        Ok(Upserted::Updated)
    } else {
        let mut columns = vec![ID_COLUMN];
        columns.extend(values.iter().map(|(column, _)| *column));
        let placeholders = vec!["?"; columns.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table.name,
            columns.join(", "),
            placeholders
        );
        let mut query = sqlx::query(&sql).bind(id.to_string());
        for (_, value) in values {
            query = bind_value(query, value);
        }
        query.execute(&mut *conn).await?;
        debug!("Mirror: created {} {}", table.name, id);
        Ok(Upserted::Created)
    }
}

fn bind_value<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: SqlValue,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        SqlValue::Text(text) => query.bind(text),
        SqlValue::Integer(number) => query.bind(number),
        SqlValue::Bool(flag) => query.bind(flag),
        SqlValue::Null => query.bind(Option::<String>::None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_builds_conditions_in_order() {
        let filter = Filter::all().eq("event_id", "e1").one_of("user_id", ["u1", "u2"]);
        let (sql, binds) = filter.to_sql(&columns::BOOKINGS).unwrap();
        assert_eq!(sql, "deleted_at IS NULL AND event_id = ? AND user_id IN (?, ?)");
        assert_eq!(binds, vec!["e1", "u1", "u2"]);
    }

    #[test]
    fn empty_one_of_matches_nothing() {
        let (sql, binds) = Filter::all().one_of("id", Vec::<String>::new()).to_sql(&columns::EVENTS).unwrap();
        assert_eq!(sql, "deleted_at IS NULL AND 0");
        assert!(binds.is_empty());
    }

    #[test]
    fn filter_rejects_unknown_columns() {
        let err = Filter::all().eq("price", "1").to_sql(&columns::EVENTS).unwrap_err();
        assert!(matches!(err, MirrorError::UnknownColumn { column: "price", .. }));
    }
}
