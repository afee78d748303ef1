//! SQLite implementation of the `DocumentStore` trait.
//!
//! Every document is one row of the `documents` table keyed by its full path.
//! Each row carries a `version` that is bumped on every write. Transactions
//! take SQLite's write lock up front (`BEGIN IMMEDIATE`), so a read-compute-write
//! on one document never interleaves with another writer; contending callers
//! wait on the busy timeout instead of failing.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{migrate::MigrateDatabase, QueryBuilder, Row, Sqlite, SqliteConnection, SqlitePool};
use tracing::{info, warn};

use super::paths::{CollectionPath, DocPath};
use super::traits::{
    Direction, Document, DocumentStore, Query, StoreError, StoreResult, TransactionFn,
};

/// DbConnection manages the SQLite pool backing the document store
#[derive(Clone)]
pub struct DbConnection {
    pool: Arc<SqlitePool>,
}

impl DbConnection {
    /// Create a new database connection, creating the database file if needed
    pub async fn new(url: &str) -> StoreResult<Self> {
        if !Sqlite::database_exists(url).await.unwrap_or(false) {
            info!("Creating database {}", url);
            Sqlite::create_database(url).await?;
        }

        let options = SqliteConnectOptions::from_str(url)?
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));
        let pool = SqlitePoolOptions::new().connect_with(options).await?;

        Self::setup_schema(&pool).await?;

        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    /// Initialize a private in-memory database for tests.
    ///
    /// The pool holds exactly one connection that is never recycled, since an
    /// in-memory database lives and dies with its connection.
    #[cfg(test)]
    pub async fn init_test() -> StoreResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        Self::setup_schema(&pool).await?;

        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    /// Set up the required database schema
    async fn setup_schema(pool: &SqlitePool) -> StoreResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                path TEXT PRIMARY KEY,
                collection TEXT NOT NULL,
                doc_id TEXT NOT NULL,
                data TEXT NOT NULL,
                version INTEGER NOT NULL DEFAULT 1,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_documents_collection
            ON documents(collection);
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Get the underlying SQLite pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn decode(path: &str, raw: &str) -> StoreResult<Value> {
    serde_json::from_str(raw).map_err(|e| StoreError::MalformedDocument {
        path: path.to_string(),
        reason: e.to_string(),
    })
}

fn json_path(field: &str) -> String {
    format!("$.\"{}\"", field.replace('"', "\\\""))
}

fn push_filter_value(
    builder: &mut QueryBuilder<'_, Sqlite>,
    field: &str,
    value: &Value,
) -> StoreResult<()> {
    match value {
        Value::String(s) => {
            builder.push_bind(s.clone());
        }
        Value::Bool(b) => {
            builder.push_bind(*b);
        }
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                builder.push_bind(i);
            } else if let Some(f) = n.as_f64() {
                builder.push_bind(f);
            } else {
                return Err(StoreError::UnsupportedFilter(field.to_string()));
            }
        }
        Value::Null | Value::Array(_) | Value::Object(_) => {
            return Err(StoreError::UnsupportedFilter(field.to_string()));
        }
    }
    Ok(())
}

#[async_trait]
impl DocumentStore for DbConnection {
    async fn get(&self, path: &DocPath) -> StoreResult<Option<Value>> {
        let key = path.to_string();
        let row = sqlx::query("SELECT data FROM documents WHERE path = ?")
            .bind(&key)
            .fetch_optional(self.pool())
            .await?;

        match row {
            Some(r) => Ok(Some(decode(&key, r.get("data"))?)),
            None => Ok(None),
        }
    }

    async fn set(&self, path: &DocPath, data: Value) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO documents (path, collection, doc_id, data)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(path) DO UPDATE
            SET data = excluded.data, version = documents.version + 1
            "#,
        )
        .bind(path.to_string())
        .bind(path.parent().as_str())
        .bind(path.id())
        .bind(serde_json::to_string(&data)?)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    async fn add(&self, collection: &CollectionPath, data: Value) -> StoreResult<String> {
        let id = uuid::Uuid::new_v4().simple().to_string();
        let path = collection.doc(&id)?;
        self.set(&path, data).await?;
        Ok(id)
    }

    async fn delete(&self, path: &DocPath) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE path = ?")
            .bind(path.to_string())
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, collection: &CollectionPath) -> StoreResult<Vec<Document>> {
        self.query(collection, &Query::new()).await
    }

    async fn query(&self, collection: &CollectionPath, query: &Query) -> StoreResult<Vec<Document>> {
        let mut builder =
            QueryBuilder::<Sqlite>::new("SELECT doc_id, data FROM documents WHERE collection = ");
        builder.push_bind(collection.as_str().to_string());

        for filter in &query.filters {
            builder.push(" AND json_extract(data, ");
            builder.push_bind(json_path(&filter.field));
            builder.push(") ");
            builder.push(filter.op.as_sql());
            builder.push(" ");
            push_filter_value(&mut builder, &filter.field, &filter.value)?;
        }

        match &query.order_by {
            Some((field, direction)) => {
                let direction = match direction {
                    Direction::Ascending => "ASC",
                    Direction::Descending => "DESC",
                };
                builder.push(" ORDER BY json_extract(data, ");
                builder.push_bind(json_path(field));
                builder.push(format!(") {direction}, rowid {direction}"));
            }
            None => {
                builder.push(" ORDER BY rowid ASC");
            }
        }

        if let Some(limit) = query.limit {
            builder.push(" LIMIT ");
            builder.push_bind(i64::from(limit));
        }

        let rows = builder.build().fetch_all(self.pool()).await?;

        rows.iter()
            .map(|row| {
                let id: String = row.get("doc_id");
                let data = decode(&format!("{collection}/{id}"), row.get("data"))?;
                Ok(Document { id, data })
            })
            .collect()
    }

    async fn run_transaction(&self, path: &DocPath, apply: TransactionFn<'_>) -> StoreResult<Value> {
        let mut lock = WriteLock::acquire(self.pool()).await?;

        let outcome = read_modify_write(lock.connection()?, path, apply).await;
        match outcome {
            Ok(next) => {
                lock.commit().await?;
                Ok(next)
            }
            Err(e) => {
                if let Err(rollback) = lock.rollback().await {
                    warn!(path = %path, "rollback failed: {}", rollback);
                }
                Err(e)
            }
        }
    }
}

async fn read_modify_write(
    conn: &mut SqliteConnection,
    path: &DocPath,
    apply: TransactionFn<'_>,
) -> StoreResult<Value> {
    let key = path.to_string();
    let row = sqlx::query("SELECT data FROM documents WHERE path = ?")
        .bind(&key)
        .fetch_optional(&mut *conn)
        .await?;

    let current = match row {
        Some(r) => Some(decode(&key, r.get("data"))?),
        None => None,
    };

    let next = apply(current.as_ref())?;

    sqlx::query(
        r#"
        INSERT INTO documents (path, collection, doc_id, data)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(path) DO UPDATE
        SET data = excluded.data, version = documents.version + 1
        "#,
    )
    .bind(&key)
    .bind(path.parent().as_str())
    .bind(path.id())
    .bind(serde_json::to_string(&next)?)
    .execute(&mut *conn)
    .await?;

    Ok(next)
}

/// A pooled connection holding the database write lock (`BEGIN IMMEDIATE`).
///
/// Other writers queue on the busy timeout until `commit` or `rollback`. If
/// the guard is dropped with the transaction still open (a cancelled request),
/// the connection is closed rather than handed back to the pool, and SQLite
/// rolls the transaction back.
struct WriteLock {
    conn: Option<PoolConnection<Sqlite>>,
}

impl WriteLock {
    async fn acquire(pool: &SqlitePool) -> StoreResult<Self> {
        let mut conn = pool.acquire().await?;
        sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;
        Ok(Self { conn: Some(conn) })
    }

    fn connection(&mut self) -> StoreResult<&mut SqliteConnection> {
        self.conn
            .as_deref_mut()
            .ok_or(StoreError::Database(sqlx::Error::PoolClosed))
    }

    async fn commit(mut self) -> StoreResult<()> {
        self.finish("COMMIT").await
    }

    async fn rollback(mut self) -> StoreResult<()> {
        self.finish("ROLLBACK").await
    }

    async fn finish(&mut self, statement: &'static str) -> StoreResult<()> {
        sqlx::query(statement).execute(self.connection()?).await?;
        // back to the pool
        self.conn.take();
        Ok(())
    }
}

impl Drop for WriteLock {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            warn!("Closing connection left inside an open write transaction");
            drop(conn.detach());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn setup_test() -> DbConnection {
        DbConnection::init_test()
            .await
            .expect("Failed to create test database")
    }

    fn users() -> CollectionPath {
        CollectionPath::root("users")
    }

    #[tokio::test]
    async fn test_set_and_get_document() {
        let db = setup_test().await;
        let path = users().doc("alice").unwrap();

        db.set(&path, json!({"email": "alice@example.com"})).await.unwrap();

        let doc = db.get(&path).await.unwrap().unwrap();
        assert_eq!(doc["email"], "alice@example.com");
        assert!(db.get(&users().doc("bob").unwrap()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_overwrites_whole_document() {
        let db = setup_test().await;
        let path = users().doc("alice").unwrap();

        db.set(&path, json!({"a": 1, "b": 2})).await.unwrap();
        db.set(&path, json!({"a": 3})).await.unwrap();

        assert_eq!(db.get(&path).await.unwrap().unwrap(), json!({"a": 3}));
    }

    #[tokio::test]
    async fn test_merge_keeps_untouched_fields() {
        let db = setup_test().await;
        let path = CollectionPath::root("system_data").doc("idmap").unwrap();

        let mut first = serde_json::Map::new();
        first.insert("12345".into(), json!("alice"));
        db.merge(&path, first).await.unwrap();

        let mut second = serde_json::Map::new();
        second.insert("67890".into(), json!("bob"));
        db.merge(&path, second).await.unwrap();

        assert_eq!(
            db.get(&path).await.unwrap().unwrap(),
            json!({"12345": "alice", "67890": "bob"})
        );
    }

    #[tokio::test]
    async fn test_update_requires_existing_document() {
        let db = setup_test().await;
        let path = users().doc("ghost").unwrap();

        let mut fields = serde_json::Map::new();
        fields.insert("weight".into(), json!(70));
        let result = db.update(&path, fields).await;

        assert!(matches!(result, Err(StoreError::NotFound(_))));
        assert!(db.get(&path).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_refuses_to_overwrite() {
        let db = setup_test().await;
        let path = users().doc("alice").unwrap();

        db.create(&path, json!({"n": 1})).await.unwrap();
        let second = db.create(&path, json!({"n": 2})).await;

        assert!(matches!(second, Err(StoreError::AlreadyExists(_))));
        assert_eq!(db.get(&path).await.unwrap().unwrap(), json!({"n": 1}));
    }

    #[tokio::test]
    async fn test_array_union_skips_equal_values() {
        let db = setup_test().await;
        let path = users().doc("alice").unwrap();

        db.array_union(&path, "tags", vec![json!("a"), json!("b")]).await.unwrap();
        db.array_union(&path, "tags", vec![json!("b"), json!("c")]).await.unwrap();

        assert_eq!(
            db.get(&path).await.unwrap().unwrap(),
            json!({"tags": ["a", "b", "c"]})
        );
    }

    #[tokio::test]
    async fn test_add_list_and_delete() {
        let db = setup_test().await;
        let contacts = users().doc("alice").unwrap().collection("contacts");

        let first = db.add(&contacts, json!({"name": "Bob"})).await.unwrap();
        let second = db.add(&contacts, json!({"name": "Carol"})).await.unwrap();
        assert_ne!(first, second);

        let docs = db.list(&contacts).await.unwrap();
        let names: Vec<_> = docs.iter().map(|d| d.data["name"].clone()).collect();
        assert_eq!(names, vec![json!("Bob"), json!("Carol")]);

        assert!(db.delete(&contacts.doc(&first).unwrap()).await.unwrap());
        assert!(!db.delete(&contacts.doc(&first).unwrap()).await.unwrap());
        assert_eq!(db.list(&contacts).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_is_scoped_to_one_collection() {
        let db = setup_test().await;
        let alice = users().doc("alice").unwrap().collection("meals");
        let bob = users().doc("bob").unwrap().collection("meals");

        db.add(&alice, json!({"meal": "toast"})).await.unwrap();
        db.add(&bob, json!({"meal": "soup"})).await.unwrap();

        let docs = db.list(&alice).await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].data["meal"], "toast");
    }

    #[tokio::test]
    async fn test_query_filters_orders_and_limits() {
        let db = setup_test().await;
        let readings = users().doc("alice").unwrap().collection("glucoseData");

        for (level, ts) in [
            (110, "2024-01-03T08:00:00.000Z"),
            (95, "2024-01-01T08:00:00.000Z"),
            (130, "2024-01-05T08:00:00.000Z"),
            (120, "2024-01-04T08:00:00.000Z"),
        ] {
            db.add(&readings, json!({"glucose_level": level, "timestamp": ts}))
                .await
                .unwrap();
        }

        let query = Query::new()
            .where_gte("timestamp", "2024-01-02T00:00:00.000Z")
            .where_lte("timestamp", "2024-01-04T23:59:59.999Z")
            .order_by("timestamp", Direction::Ascending);
        let docs = db.query(&readings, &query).await.unwrap();
        let levels: Vec<_> = docs.iter().map(|d| d.data["glucose_level"].clone()).collect();
        assert_eq!(levels, vec![json!(110), json!(120)]);

        let latest = Query::new()
            .order_by("timestamp", Direction::Descending)
            .limit(2);
        let docs = db.query(&readings, &latest).await.unwrap();
        let levels: Vec<_> = docs.iter().map(|d| d.data["glucose_level"].clone()).collect();
        assert_eq!(levels, vec![json!(130), json!(120)]);
    }

    #[tokio::test]
    async fn test_query_by_equality() {
        let db = setup_test().await;
        db.set(&users().doc("alice").unwrap(), json!({"patientID": "12345"}))
            .await
            .unwrap();
        db.set(&users().doc("bob").unwrap(), json!({"patientID": "67890"}))
            .await
            .unwrap();

        let docs = db
            .query(&users(), &Query::new().where_eq("patientID", "67890"))
            .await
            .unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, "bob");
    }

    #[tokio::test]
    async fn test_query_rejects_structured_filter_values() {
        let db = setup_test().await;
        let query = Query::new().where_eq("tags", json!(["a"]));

        let result = db.query(&users(), &query).await;
        assert!(matches!(result, Err(StoreError::UnsupportedFilter(_))));
    }

    #[tokio::test]
    async fn test_transaction_aborts_without_writing() {
        let db = setup_test().await;
        let path = users().doc("alice").unwrap();

        let abort = |_: Option<&Value>| -> StoreResult<Value> {
            Err(StoreError::NotFound("nothing to do".into()))
        };
        assert!(db.run_transaction(&path, &abort).await.is_err());
        assert!(db.get(&path).await.unwrap().is_none());

        // the rolled back transaction released the only connection
        db.set(&path, json!({"n": 1})).await.unwrap();
        let bump = |current: Option<&Value>| -> StoreResult<Value> {
            let n = current.and_then(|d| d["n"].as_u64()).unwrap_or(0);
            Ok(json!({"n": n + 1}))
        };
        assert_eq!(db.run_transaction(&path, &bump).await.unwrap(), json!({"n": 2}));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_transactions_on_file_database_lose_no_updates() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("store.db").display());
        let db = DbConnection::new(&url).await.unwrap();
        let path = CollectionPath::root("counters").doc("shared").unwrap();

        let mut handles = Vec::new();
        for _ in 0..200 {
            let db = db.clone();
            let path = path.clone();
            handles.push(tokio::spawn(async move {
                let increment = |current: Option<&Value>| -> StoreResult<Value> {
                    let n = current.and_then(|d| d["n"].as_u64()).unwrap_or(0);
                    Ok(json!({"n": n + 1}))
                };
                db.run_transaction(&path, &increment).await.unwrap()
            }));
        }

        let mut seen = Vec::new();
        for handle in handles {
            seen.push(handle.await.unwrap()["n"].as_u64().unwrap());
        }
        seen.sort_unstable();

        assert_eq!(seen, (1..=200).collect::<Vec<_>>());
        assert_eq!(db.get(&path).await.unwrap().unwrap(), json!({"n": 200}));
    }
}
