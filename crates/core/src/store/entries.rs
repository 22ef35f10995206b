//! Entry CRUD operations for the SQLite store.
//!
//! Each write is a single upsert or one transaction, so a reader never sees
//! a half-written response.

use async_trait::async_trait;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::{self, OptionalExtension};

use super::connection::SqliteStore;
use super::hash::{canonical_url, compute_cache_key};
use super::{Store, StoredEntry};
use crate::Error;
use crate::http::{Headers, Request, Response};

const UPSERT_ENTRY: &str = "INSERT INTO entries (
        cache_name, key_hash, method, url, status, status_text, headers_json, body, stored_at
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
    ON CONFLICT(cache_name, key_hash) DO UPDATE SET
        method = excluded.method,
        url = excluded.url,
        status = excluded.status,
        status_text = excluded.status_text,
        headers_json = excluded.headers_json,
        body = excluded.body,
        stored_at = excluded.stored_at";

const ENSURE_CACHE: &str = "INSERT OR IGNORE INTO caches (name, created_at) VALUES (?1, ?2)";

/// Row-ready form of one entry, built before entering the connection thread.
struct EntryRow {
    key_hash: String,
    method: String,
    url: String,
    status: i64,
    status_text: String,
    headers_json: String,
    body: Vec<u8>,
}

impl EntryRow {
    fn new(request: &Request, response: &Response) -> Result<Self, Error> {
        Ok(Self {
            key_hash: compute_cache_key(&request.method, &request.url),
            method: request.method.to_ascii_uppercase(),
            url: canonical_url(&request.url),
            status: i64::from(response.status),
            status_text: response.status_text.clone(),
            headers_json: serde_json::to_string(&response.headers)?,
            body: response.body.to_vec(),
        })
    }

    fn write(&self, conn: &rusqlite::Connection, cache_name: &str, stored_at: &str) -> Result<(), rusqlite::Error> {
        conn.execute(ENSURE_CACHE, params![cache_name, stored_at])?;
        conn.execute(
            UPSERT_ENTRY,
            params![
                cache_name,
                &self.key_hash,
                &self.method,
                &self.url,
                self.status,
                &self.status_text,
                &self.headers_json,
                &self.body,
                stored_at,
            ],
        )?;
        Ok(())
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn open(&self, name: &str) -> Result<(), Error> {
        let name = name.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(ENSURE_CACHE, params![name, now])?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn put(&self, name: &str, request: &Request, response: &Response) -> Result<(), Error> {
        let row = EntryRow::new(request, response)?;
        let name = name.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                row.write(&tx, &name, &now)?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn put_all(&self, name: &str, entries: &[(Request, Response)]) -> Result<(), Error> {
        let rows = entries
            .iter()
            .map(|(req, resp)| EntryRow::new(req, resp))
            .collect::<Result<Vec<_>, _>>()?;
        let name = name.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute(ENSURE_CACHE, params![&name, &now])?;
                for row in &rows {
                    row.write(&tx, &name, &now)?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn lookup(&self, name: &str, request: &Request) -> Result<Option<Response>, Error> {
        let name = name.to_string();
        let key_hash = compute_cache_key(&request.method, &request.url);
        let row = self
            .conn
            .call(move |conn| -> Result<Option<(i64, String, String, Vec<u8>)>, Error> {
                let row = conn
                    .query_row(
                        "SELECT status, status_text, headers_json, body
                         FROM entries WHERE cache_name = ?1 AND key_hash = ?2",
                        params![name, key_hash],
                        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
                    )
                    .optional()?;
                Ok(row)
            })
            .await
            .map_err(Error::from)?;

        let Some((status, status_text, headers_json, body)) = row else {
            return Ok(None);
        };

        let status = u16::try_from(status).map_err(|_| Error::CorruptEntry(format!("status {status} out of range")))?;
        let headers: Headers = serde_json::from_str(&headers_json)?;

        Ok(Some(Response { status, status_text, headers, body: body.into() }))
    }

    async fn delete(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM caches WHERE name = ?1", params![name])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    async fn names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM caches ORDER BY created_at, name")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    async fn entries(&self, name: &str) -> Result<Vec<StoredEntry>, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<StoredEntry>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT method, url, status, length(body), stored_at
                     FROM entries WHERE cache_name = ?1 ORDER BY url",
                )?;
                let rows = stmt
                    .query_map(params![name], |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, i64>(2)?,
                            row.get::<_, i64>(3)?,
                            row.get::<_, String>(4)?,
                        ))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;

                rows.into_iter()
                    .map(|(method, url, status, body_len, stored_at)| {
                        Ok(StoredEntry {
                            method,
                            url,
                            status: u16::try_from(status)
                                .map_err(|_| Error::CorruptEntry(format!("status {status} out of range")))?,
                            body_len: usize::try_from(body_len).unwrap_or_default(),
                            stored_at,
                        })
                    })
                    .collect()
            })
            .await
            .map_err(Error::from)
    }
}
