//! SQLite implementation of EntriesAdapter.
//!
//! Persists entries to the embedded `entries` table. Built without a pool the
//! adapter runs **detached**: encoded rows live in an in-memory map and go
//! through the same codec, filters, and ordering as the database path.
//!
//! SQLite admits one writer at a time, and a transaction that reads before it
//! writes fails with `SQLITE_BUSY` instead of waiting when another write is in
//! progress. Every write therefore runs under the adapter's write gate, while
//! reads go straight to the pool. The adapter (and its clones) must be the
//! only writer of its database file.

use async_trait::async_trait;
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{FromRow, QueryBuilder, Row, Sqlite, SqlitePool, Transaction};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard, RwLock};

use crate::domain::entry::{
    AccountFilter, AckDecision, DeletedFilter, Entry, EntryError, EntryFilter, EntryPatch,
    EntrySnapshot, MarkSyncedOutcome, NewEntry, PullOutcome, SortOrder,
};
use crate::domain::foundation::{EntryId, Timestamp, ValidationError};
use crate::ports::{Clock, EntriesAdapter, IdGenerator};

use super::row::EntryRow;

const SELECT_COLUMNS: &str = "SELECT id, created_at, updated_at, adversity, belief, \
consequence, dispute, energy, ai_response, ai_retry_count, dispute_history, dirty_since, \
is_deleted, account_id FROM entries";

#[derive(Clone)]
enum Backend {
    Pool {
        pool: SqlitePool,
        writes: Arc<Mutex<()>>,
    },
    Detached(Arc<RwLock<BTreeMap<String, EntryRow>>>),
}

/// SQLite entries adapter.
#[derive(Clone)]
pub struct SqlEntriesAdapter {
    backend: Backend,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
}

fn db_error(action: &str, e: sqlx::Error) -> EntryError {
    match e {
        sqlx::Error::ColumnDecode { index, source } => {
            EntryError::corrupt("<unknown>", format!("column {}: {}", index, source))
        }
        other => EntryError::storage(format!("Failed to {}: {}", action, other)),
    }
}

impl SqlEntriesAdapter {
    /// `None` runs detached, without a database.
    pub fn new(pool: Option<SqlitePool>, clock: Arc<dyn Clock>, ids: Arc<dyn IdGenerator>) -> Self {
        let backend = match pool {
            Some(pool) => Backend::Pool {
                pool,
                writes: Arc::new(Mutex::new(())),
            },
            None => Backend::Detached(Arc::new(RwLock::new(BTreeMap::new()))),
        };
        Self {
            backend,
            clock,
            ids,
        }
    }

    pub fn is_detached(&self) -> bool {
        matches!(self.backend, Backend::Detached(_))
    }

    pub fn pool(&self) -> Option<&SqlitePool> {
        match &self.backend {
            Backend::Pool { pool, .. } => Some(pool),
            Backend::Detached(_) => None,
        }
    }

    /// Begin a write transaction while holding the write gate.
    ///
    /// The guard must outlive the transaction; dropping both before commit
    /// rolls the write back.
    async fn begin_write<'a>(
        pool: &'a SqlitePool,
        writes: &'a Mutex<()>,
    ) -> Result<(MutexGuard<'a, ()>, Transaction<'static, Sqlite>), EntryError> {
        let gate = writes.lock().await;
        let tx = pool.begin().await.map_err(|e| db_error("begin", e))?;
        Ok((gate, tx))
    }

    /// Delete every row, keeping the schema.
    pub async fn wipe(&self) -> Result<(), EntryError> {
        match &self.backend {
            Backend::Pool { pool, writes } => {
                let _gate = writes.lock().await;
                sqlx::query("DELETE FROM entries")
                    .execute(pool)
                    .await
                    .map_err(|e| db_error("wipe entries", e))?;
            }
            Backend::Detached(rows) => rows.write().await.clear(),
        }
        Ok(())
    }

    /// Store a raw row, bypassing the codec's encode side.
    #[cfg(test)]
    pub(crate) async fn put_row(&self, row: EntryRow) -> Result<(), EntryError> {
        match &self.backend {
            Backend::Pool { pool, writes } => {
                let (_gate, mut tx) = Self::begin_write(pool, writes).await?;
                upsert_row(&mut tx, &row).await?;
                tx.commit().await.map_err(|e| db_error("commit", e))?;
            }
            Backend::Detached(rows) => {
                rows.write().await.insert(row.id.clone(), row);
            }
        }
        Ok(())
    }

    /// Read-modify-write of one entry, atomically.
    ///
    /// `mutate` returns whether it changed the entry; unchanged entries are
    /// not written back.
    async fn modify<T, F>(&self, id: &EntryId, mutate: F) -> Result<T, EntryError>
    where
        F: FnOnce(&mut Entry) -> Result<(bool, T), EntryError> + Send,
        T: Send,
    {
        match &self.backend {
            Backend::Pool { pool, writes } => {
                let (_gate, mut tx) = Self::begin_write(pool, writes).await?;
                let row = fetch_row(&mut tx, id.as_str())
                    .await?
                    .ok_or_else(|| EntryError::not_found(id))?;
                let mut entry = row.decode()?;

                let (changed, out) = mutate(&mut entry)?;
                if changed {
                    upsert_row(&mut tx, &EntryRow::encode(&entry)?).await?;
                }
                tx.commit().await.map_err(|e| db_error("commit", e))?;
                Ok(out)
            }
            Backend::Detached(rows) => {
                let mut rows = rows.write().await;
                let row = rows
                    .get(id.as_str())
                    .cloned()
                    .ok_or_else(|| EntryError::not_found(id))?;
                let mut entry = row.decode()?;

                let (changed, out) = mutate(&mut entry)?;
                if changed {
                    rows.insert(id.as_str().to_string(), EntryRow::encode(&entry)?);
                }
                Ok(out)
            }
        }
    }
}

async fn fetch_row(
    tx: &mut Transaction<'_, Sqlite>,
    id: &str,
) -> Result<Option<EntryRow>, EntryError> {
    sqlx::query(&format!("{} WHERE id = ?", SELECT_COLUMNS))
        .bind(id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| db_error("fetch entry", e))?
        .map(read_row)
        .transpose()
}

/// Maps a result row, naming the record when a column fails to decode.
fn read_row(row: SqliteRow) -> Result<EntryRow, EntryError> {
    let id: String = row.try_get("id").map_err(|e| db_error("read entry id", e))?;
    EntryRow::from_row(&row).map_err(|e| match e {
        sqlx::Error::ColumnDecode { index, source } => {
            EntryError::corrupt(id, format!("column {}: {}", index, source))
        }
        other => db_error("read entry", other),
    })
}

const INSERT_ROW: &str = r#"
INSERT INTO entries (
    id, created_at, updated_at, adversity, belief, consequence, dispute, energy,
    ai_response, ai_retry_count, dispute_history, dirty_since, is_deleted, account_id
) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

const UPSERT_ROW: &str = r#"
INSERT INTO entries (
    id, created_at, updated_at, adversity, belief, consequence, dispute, energy,
    ai_response, ai_retry_count, dispute_history, dirty_since, is_deleted, account_id
) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
ON CONFLICT (id) DO UPDATE SET
    created_at = excluded.created_at,
    updated_at = excluded.updated_at,
    adversity = excluded.adversity,
    belief = excluded.belief,
    consequence = excluded.consequence,
    dispute = excluded.dispute,
    energy = excluded.energy,
    ai_response = excluded.ai_response,
    ai_retry_count = excluded.ai_retry_count,
    dispute_history = excluded.dispute_history,
    dirty_since = excluded.dirty_since,
    is_deleted = excluded.is_deleted,
    account_id = excluded.account_id
"#;

fn bind_row<'q>(sql: &'q str, row: &'q EntryRow) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    sqlx::query(sql)
        .bind(row.id.as_str())
        .bind(row.created_at.as_str())
        .bind(row.updated_at.as_str())
        .bind(row.adversity.as_str())
        .bind(row.belief.as_str())
        .bind(row.consequence.as_deref())
        .bind(row.dispute.as_deref())
        .bind(row.energy.as_deref())
        .bind(row.ai_response.as_deref())
        .bind(row.ai_retry_count)
        .bind(row.dispute_history.as_str())
        .bind(row.dirty_since.as_deref())
        .bind(row.is_deleted)
        .bind(row.account_id.as_deref())
}

/// Plain insert: an existing id (tombstones included) is a validation error.
async fn insert_row(pool: &SqlitePool, row: &EntryRow) -> Result<(), EntryError> {
    bind_row(INSERT_ROW, row)
        .execute(pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                ValidationError::already_exists("id", row.id.as_str()).into()
            }
            other => db_error("insert entry", other),
        })?;
    Ok(())
}

async fn upsert_row(tx: &mut Transaction<'_, Sqlite>, row: &EntryRow) -> Result<(), EntryError> {
    bind_row(UPSERT_ROW, row)
        .execute(&mut **tx)
        .await
        .map_err(|e| db_error("write entry", e))?;
    Ok(())
}

/// Translates a filter into `WHERE`, `ORDER BY` and `LIMIT` clauses.
fn push_filter(query: &mut QueryBuilder<'_, Sqlite>, filter: &EntryFilter) {
    query.push(" WHERE 1 = 1");
    match filter.deleted {
        DeletedFilter::Exclude => {
            query.push(" AND is_deleted = 0");
        }
        DeletedFilter::Include => {}
        DeletedFilter::Only => {
            query.push(" AND is_deleted = 1");
        }
    }
    match &filter.account {
        AccountFilter::Any => {}
        AccountFilter::Unclaimed => {
            query.push(" AND account_id IS NULL");
        }
        AccountFilter::Account(id) => {
            query.push(" AND account_id = ").push_bind(id.as_str().to_string());
        }
    }
    if filter.dirty_only {
        query.push(" AND dirty_since IS NOT NULL");
    }
    if filter.pending_enrichment {
        query.push(" AND ai_response IS NULL AND is_deleted = 0");
    }

    query.push(match filter.order {
        SortOrder::UpdatedDesc => " ORDER BY updated_at DESC, id ASC",
        SortOrder::UpdatedAsc => " ORDER BY updated_at ASC, id ASC",
        SortOrder::CreatedDesc => " ORDER BY created_at DESC, id ASC",
    });
    if let Some(limit) = filter.limit {
        query
            .push(" LIMIT ")
            .push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
    }
}

#[async_trait]
impl EntriesAdapter for SqlEntriesAdapter {
    async fn create(&self, draft: NewEntry) -> Result<Entry, EntryError> {
        draft.validate()?;
        let id = match draft.id.clone() {
            Some(id) => id,
            None => self.ids.next_id(),
        };
        let entry = Entry::create(id, draft, self.clock.now())?;
        let row = EntryRow::encode(&entry)?;

        match &self.backend {
            Backend::Pool { pool, writes } => {
                let _gate = writes.lock().await;
                insert_row(pool, &row).await?;
            }
            Backend::Detached(rows) => {
                let mut rows = rows.write().await;
                if rows.contains_key(&row.id) {
                    return Err(ValidationError::already_exists("id", row.id).into());
                }
                rows.insert(row.id.clone(), row);
            }
        }

        tracing::debug!(entry_id = %entry.id(), "Created entry");
        Ok(entry)
    }

    async fn update(&self, id: &EntryId, patch: EntryPatch) -> Result<Entry, EntryError> {
        let now = self.clock.now();
        self.modify(id, |entry| {
            let changed = entry.apply_patch(patch, now)?;
            if changed {
                tracing::debug!(entry_id = %entry.id(), "Updated entry");
            }
            Ok((changed, entry.clone()))
        })
        .await
    }

    async fn soft_delete(&self, id: &EntryId) -> Result<Entry, EntryError> {
        let now = self.clock.now();
        self.modify(id, |entry| {
            let changed = entry.soft_delete(now)?;
            if changed {
                tracing::debug!(entry_id = %entry.id(), "Soft-deleted entry");
            }
            Ok((changed, entry.clone()))
        })
        .await
    }

    async fn get_by_id(&self, id: &EntryId) -> Result<Option<Entry>, EntryError> {
        let row = match &self.backend {
            Backend::Pool { pool, .. } => sqlx::query(&format!("{} WHERE id = ?", SELECT_COLUMNS))
                .bind(id.as_str())
                .fetch_optional(pool)
                .await
                .map_err(|e| db_error("fetch entry", e))?
                .map(read_row)
                .transpose()?,
            Backend::Detached(rows) => rows.read().await.get(id.as_str()).cloned(),
        };
        row.map(EntryRow::decode).transpose()
    }

    async fn list(&self, filter: EntryFilter) -> Result<Vec<Entry>, EntryError> {
        match &self.backend {
            Backend::Pool { pool, .. } => {
                let mut query = QueryBuilder::<Sqlite>::new(SELECT_COLUMNS);
                push_filter(&mut query, &filter);
                let rows = query
                    .build()
                    .fetch_all(pool)
                    .await
                    .map_err(|e| db_error("list entries", e))?;
                rows.into_iter()
                    .map(|row| read_row(row)?.decode())
                    .collect()
            }
            Backend::Detached(rows) => {
                let decoded = rows
                    .read()
                    .await
                    .values()
                    .cloned()
                    .map(EntryRow::decode)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(filter.apply(decoded))
            }
        }
    }

    async fn mark_synced(
        &self,
        id: &EntryId,
        synced_at: Timestamp,
    ) -> Result<MarkSyncedOutcome, EntryError> {
        self.modify(id, |entry| {
            let decision = entry.acknowledge_sync(synced_at)?;
            let changed = matches!(decision, AckDecision::Acknowledged(_));
            Ok((changed, MarkSyncedOutcome::from_decision(entry.clone(), decision)))
        })
        .await
    }

    async fn apply_remote(&self, remote: EntrySnapshot) -> Result<PullOutcome, EntryError> {
        let remote = Entry::from_remote(remote)?;
        let key = remote.id().as_str().to_string();

        match &self.backend {
            Backend::Pool { pool, writes } => {
                let (_gate, mut tx) = Self::begin_write(pool, writes).await?;
                let local = fetch_row(&mut tx, &key).await?.map(EntryRow::decode).transpose()?;
                let outcome = PullOutcome::resolve(local, remote);
                if outcome.needs_write() {
                    upsert_row(&mut tx, &EntryRow::encode(outcome.entry())?).await?;
                }
                tx.commit().await.map_err(|e| db_error("commit", e))?;
                Ok(outcome)
            }
            Backend::Detached(rows) => {
                let mut rows = rows.write().await;
                let local = rows.get(&key).cloned().map(EntryRow::decode).transpose()?;
                let outcome = PullOutcome::resolve(local, remote);
                if outcome.needs_write() {
                    rows.insert(key, EntryRow::encode(outcome.entry())?);
                }
                Ok(outcome)
            }
        }
    }
}
