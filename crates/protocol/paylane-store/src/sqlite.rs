//! SQLite-backed ledger and purchase log.
//!
//! Both stores share one `Arc<Mutex<Connection>>`. Unsigned amounts and
//! timestamps are stored as SQLite integers.

use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

use paylane_types::{
    Amount, ContentEntry, ContentFilter, Fingerprint, Identity, License, PurchaseRecord, Strategy,
    Timestamp, TrackingTag,
};

use crate::error::{Result, StoreError};
use crate::traits::{LedgerStore, PurchaseLog};

const CONTENT_COLUMNS: &str =
    "fingerprint, price, owner, uri, active, revenue, access_count, created_at, updated_at";

const LICENSE_COLUMNS: &str =
    "holder, fingerprint, price_paid, transfer_ref, issued_at, expires_at, active";

const PURCHASE_COLUMNS: &str =
    "fingerprint, payer, price, transfer_ref, timestamp, tag, strategy";

fn lock(conn: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>> {
    conn.lock()
        .map_err(|_| StoreError::lock_poisoned("database connection lock poisoned"))
}

fn conversion_error(
    col: usize,
    ty: Type,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(col, ty, Box::new(err))
}

fn fingerprint_at(row: &rusqlite::Row, col: usize) -> rusqlite::Result<Fingerprint> {
    let bytes: Vec<u8> = row.get(col)?;
    let array: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
        conversion_error(
            col,
            Type::Blob,
            paylane_types::FingerprintError::InvalidLength(bytes.len()),
        )
    })?;
    Ok(Fingerprint::from_bytes(array))
}

// =============================================================================
// Ledger
// =============================================================================

/// SQLite-based content and license store.
pub struct SqliteLedgerStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteLedgerStore {
    /// Create a new store with the given database connection.
    ///
    /// The schema must already be initialized.
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn deserialize_entry(row: &rusqlite::Row) -> rusqlite::Result<ContentEntry> {
        let price: i64 = row.get(1)?;
        let owner: String = row.get(2)?;
        let active: bool = row.get(4)?;
        let revenue: i64 = row.get(5)?;
        let access_count: i64 = row.get(6)?;
        let created_at: i64 = row.get(7)?;
        let updated_at: i64 = row.get(8)?;

        Ok(ContentEntry {
            fingerprint: fingerprint_at(row, 0)?,
            price: price as Amount,
            owner: Identity::new(owner),
            uri: row.get(3)?,
            active,
            revenue: revenue as Amount,
            access_count: access_count as u64,
            created_at: created_at as Timestamp,
            updated_at: updated_at as Timestamp,
        })
    }

    fn deserialize_license(row: &rusqlite::Row) -> rusqlite::Result<License> {
        let holder: String = row.get(0)?;
        let price_paid: i64 = row.get(2)?;
        let issued_at: i64 = row.get(4)?;
        let expires_at: i64 = row.get(5)?;

        Ok(License {
            holder: Identity::new(holder),
            fingerprint: fingerprint_at(row, 1)?,
            price_paid: price_paid as Amount,
            transfer_ref: row.get(3)?,
            issued_at: issued_at as Timestamp,
            expires_at: expires_at as Timestamp,
            active: row.get(6)?,
        })
    }

    fn write_entry(conn: &Connection, entry: &ContentEntry) -> Result<()> {
        let changed = conn.execute(
            "UPDATE content SET price = ?2, uri = ?3, active = ?4, revenue = ?5,
                 access_count = ?6, updated_at = ?7
             WHERE fingerprint = ?1",
            params![
                entry.fingerprint.as_bytes().to_vec(),
                entry.price as i64,
                entry.uri,
                entry.active,
                entry.revenue as i64,
                entry.access_count as i64,
                entry.updated_at as i64,
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::ContentNotFound(entry.fingerprint));
        }
        Ok(())
    }

    fn write_license(conn: &Connection, license: &License) -> Result<()> {
        conn.execute(
            "INSERT OR REPLACE INTO licenses (holder, fingerprint, price_paid, transfer_ref,
                 issued_at, expires_at, active)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                license.holder.as_str(),
                license.fingerprint.as_bytes().to_vec(),
                license.price_paid as i64,
                license.transfer_ref,
                license.issued_at as i64,
                license.expires_at as i64,
                license.active,
            ],
        )?;
        Ok(())
    }
}

impl LedgerStore for SqliteLedgerStore {
    fn insert_content(&mut self, entry: &ContentEntry) -> Result<()> {
        let conn = lock(&self.conn)?;
        let inserted = conn.execute(
            &format!(
                "INSERT OR IGNORE INTO content ({CONTENT_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
            ),
            params![
                entry.fingerprint.as_bytes().to_vec(),
                entry.price as i64,
                entry.owner.as_str(),
                entry.uri,
                entry.active,
                entry.revenue as i64,
                entry.access_count as i64,
                entry.created_at as i64,
                entry.updated_at as i64,
            ],
        )?;
        if inserted == 0 {
            return Err(StoreError::AlreadyExists(entry.fingerprint));
        }
        Ok(())
    }

    fn get_content(&self, fingerprint: &Fingerprint) -> Result<Option<ContentEntry>> {
        let conn = lock(&self.conn)?;
        let entry = conn
            .query_row(
                &format!("SELECT {CONTENT_COLUMNS} FROM content WHERE fingerprint = ?1"),
                [fingerprint.as_bytes().to_vec()],
                Self::deserialize_entry,
            )
            .optional()?;
        Ok(entry)
    }

    fn update_content(&mut self, entry: &ContentEntry) -> Result<()> {
        let conn = lock(&self.conn)?;
        Self::write_entry(&conn, entry)
    }

    fn list_content(&self, filter: &ContentFilter) -> Result<Vec<ContentEntry>> {
        let conn = lock(&self.conn)?;

        let mut sql = format!("SELECT {CONTENT_COLUMNS} FROM content WHERE 1 = 1");
        let mut args: Vec<Value> = Vec::new();
        if let Some(ref owner) = filter.owner {
            sql.push_str(" AND owner = ?");
            args.push(Value::Text(owner.as_str().to_string()));
        }
        if let Some(active) = filter.active {
            sql.push_str(" AND active = ?");
            args.push(Value::Integer(active as i64));
        }
        sql.push_str(" ORDER BY created_at ASC, rowid ASC");
        if let Some(limit) = filter.limit {
            sql.push_str(" LIMIT ?");
            args.push(Value::Integer(limit.min(i64::MAX as usize) as i64));
        }

        let mut stmt = conn.prepare(&sql)?;
        let entries = stmt
            .query_map(params_from_iter(args.iter()), Self::deserialize_entry)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }

    fn put_license(&mut self, license: &License) -> Result<()> {
        let conn = lock(&self.conn)?;
        Self::write_license(&conn, license)
    }

    fn get_license(&self, holder: &Identity, fingerprint: &Fingerprint) -> Result<Option<License>> {
        let conn = lock(&self.conn)?;
        let license = conn
            .query_row(
                &format!(
                    "SELECT {LICENSE_COLUMNS} FROM licenses WHERE holder = ?1 AND fingerprint = ?2"
                ),
                params![holder.as_str(), fingerprint.as_bytes().to_vec()],
                Self::deserialize_license,
            )
            .optional()?;
        Ok(license)
    }

    fn licenses_for(&self, holder: &Identity) -> Result<Vec<License>> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {LICENSE_COLUMNS} FROM licenses WHERE holder = ?1
             ORDER BY issued_at ASC, fingerprint ASC"
        ))?;
        let licenses = stmt
            .query_map([holder.as_str()], Self::deserialize_license)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(licenses)
    }

    fn commit_license(&mut self, license: &License, entry: &ContentEntry) -> Result<()> {
        let mut conn = lock(&self.conn)?;
        let tx = conn.transaction()?;
        Self::write_license(&tx, license)?;
        Self::write_entry(&tx, entry)?;
        tx.commit()?;
        Ok(())
    }
}

// =============================================================================
// Purchase log
// =============================================================================

/// SQLite-based append-only purchase log.
pub struct SqlitePurchaseLog {
    conn: Arc<Mutex<Connection>>,
}

impl SqlitePurchaseLog {
    /// Create a new log with the given database connection.
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// Number of logged purchases.
    pub fn count(&self) -> Result<u64> {
        let conn = lock(&self.conn)?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM purchases", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn deserialize_record(row: &rusqlite::Row) -> rusqlite::Result<PurchaseRecord> {
        let payer: String = row.get(1)?;
        let price: i64 = row.get(2)?;
        let timestamp: i64 = row.get(4)?;
        let tag_bytes: Vec<u8> = row.get(5)?;
        let strategy: String = row.get(6)?;

        let tag: [u8; 32] = tag_bytes.as_slice().try_into().map_err(|_| {
            conversion_error(
                5,
                Type::Blob,
                paylane_types::FingerprintError::InvalidLength(tag_bytes.len()),
            )
        })?;
        let strategy = Strategy::from_str(&strategy).map_err(|e| {
            conversion_error(
                6,
                Type::Text,
                std::io::Error::new(std::io::ErrorKind::InvalidData, e),
            )
        })?;

        Ok(PurchaseRecord {
            fingerprint: fingerprint_at(row, 0)?,
            payer: Identity::new(payer),
            price: price as Amount,
            transfer_ref: row.get(3)?,
            timestamp: timestamp as Timestamp,
            tag: TrackingTag(tag),
            strategy,
        })
    }

    fn query(&self, clause: &str, args: &[Value]) -> Result<Vec<PurchaseRecord>> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {PURCHASE_COLUMNS} FROM purchases {clause} ORDER BY id ASC"
        ))?;
        let records = stmt
            .query_map(params_from_iter(args.iter()), Self::deserialize_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }
}

impl PurchaseLog for SqlitePurchaseLog {
    fn append(&mut self, record: &PurchaseRecord) -> Result<()> {
        let conn = lock(&self.conn)?;
        conn.execute(
            &format!(
                "INSERT INTO purchases ({PURCHASE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
            ),
            params![
                record.fingerprint.as_bytes().to_vec(),
                record.payer.as_str(),
                record.price as i64,
                record.transfer_ref,
                record.timestamp as i64,
                record.tag.as_bytes().to_vec(),
                record.strategy.as_str(),
            ],
        )?;
        Ok(())
    }

    fn all(&self) -> Result<Vec<PurchaseRecord>> {
        self.query("", &[])
    }

    fn for_payer(&self, payer: &Identity) -> Result<Vec<PurchaseRecord>> {
        self.query(
            "WHERE payer = ?1",
            &[Value::Text(payer.as_str().to_string())],
        )
    }

    fn for_content(&self, fingerprint: &Fingerprint) -> Result<Vec<PurchaseRecord>> {
        self.query(
            "WHERE fingerprint = ?1",
            &[Value::Blob(fingerprint.as_bytes().to_vec())],
        )
    }

    fn total_spent(&self, payer: &Identity, since: Timestamp) -> Result<Amount> {
        let conn = lock(&self.conn)?;
        let total: i64 = conn.query_row(
            "SELECT COALESCE(SUM(price), 0) FROM purchases WHERE payer = ?1 AND timestamp >= ?2",
            params![payer.as_str(), since as i64],
            |row| row.get(0),
        )?;
        Ok(total as Amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::initialize_schema;

    fn test_conn() -> Arc<Mutex<Connection>> {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();
        Arc::new(Mutex::new(conn))
    }

    fn test_entry(seed: &[u8], owner: &str, created_at: Timestamp) -> ContentEntry {
        ContentEntry::new(
            Fingerprint::of(seed),
            50_000,
            format!("https://example.com/{}", seed.len()),
            Identity::new(owner),
            created_at,
        )
    }

    #[test]
    fn test_content_roundtrip() {
        let mut store = SqliteLedgerStore::new(test_conn());
        let entry = test_entry(b"doc", "alice", 100);
        store.insert_content(&entry).unwrap();

        let loaded = store.get_content(&entry.fingerprint).unwrap().unwrap();
        assert_eq!(loaded, entry);
        assert!(store.get_content(&Fingerprint::of(b"nope")).unwrap().is_none());
    }

    #[test]
    fn test_insert_duplicate() {
        let mut store = SqliteLedgerStore::new(test_conn());
        let entry = test_entry(b"doc", "alice", 100);
        store.insert_content(&entry).unwrap();
        assert!(matches!(
            store.insert_content(&entry),
            Err(StoreError::AlreadyExists(_))
        ));
    }

    #[test]
    fn test_update_content() {
        let mut store = SqliteLedgerStore::new(test_conn());
        let mut entry = test_entry(b"doc", "alice", 100);
        store.insert_content(&entry).unwrap();

        entry.price = 75_000;
        entry.active = false;
        entry.updated_at = 200;
        store.update_content(&entry).unwrap();

        let loaded = store.get_content(&entry.fingerprint).unwrap().unwrap();
        assert_eq!(loaded.price, 75_000);
        assert!(!loaded.active);
        assert_eq!(loaded.created_at, 100);

        let missing = test_entry(b"other", "alice", 1);
        assert!(matches!(
            store.update_content(&missing),
            Err(StoreError::ContentNotFound(_))
        ));
    }

    #[test]
    fn test_list_filters() {
        let mut store = SqliteLedgerStore::new(test_conn());
        store.insert_content(&test_entry(b"a", "alice", 3)).unwrap();
        store.insert_content(&test_entry(b"bb", "bob", 1)).unwrap();
        let mut inactive = test_entry(b"ccc", "alice", 2);
        inactive.active = false;
        store.insert_content(&inactive).unwrap();

        let all = store.list_content(&ContentFilter::new()).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].owner.as_str(), "bob");

        let alice_active = store
            .list_content(
                &ContentFilter::new()
                    .with_owner(Identity::new("alice"))
                    .with_active(true),
            )
            .unwrap();
        assert_eq!(alice_active.len(), 1);
        assert_eq!(alice_active[0].fingerprint, Fingerprint::of(b"a"));

        let limited = store
            .list_content(&ContentFilter::new().with_limit(2))
            .unwrap();
        assert_eq!(limited.len(), 2);
    }

    #[test]
    fn test_license_upsert() {
        let mut store = SqliteLedgerStore::new(test_conn());
        let holder = Identity::new("agent");
        let fp = Fingerprint::of(b"doc");

        store
            .put_license(&License::issue(holder.clone(), fp, 10, "r1", 100))
            .unwrap();
        store
            .put_license(&License::issue(holder.clone(), fp, 10, "r2", 500))
            .unwrap();

        let license = store.get_license(&holder, &fp).unwrap().unwrap();
        assert_eq!(license.transfer_ref, "r2");
        assert_eq!(license.issued_at, 500);
        assert_eq!(store.licenses_for(&holder).unwrap().len(), 1);
        assert!(store
            .get_license(&Identity::new("other"), &fp)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_commit_license_rolls_back_without_entry() {
        let mut store = SqliteLedgerStore::new(test_conn());
        let entry = test_entry(b"doc", "alice", 1);
        let license = License::issue(Identity::new("agent"), entry.fingerprint, 1, "r", 5);

        assert!(matches!(
            store.commit_license(&license, &entry),
            Err(StoreError::ContentNotFound(_))
        ));
        assert!(store
            .get_license(&license.holder, &entry.fingerprint)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_purchase_log() {
        let conn = test_conn();
        let mut log = SqlitePurchaseLog::new(Arc::clone(&conn));
        let payer = Identity::new("agent");
        let fp = Fingerprint::of(b"doc");

        for (i, strategy) in [Strategy::Sequential, Strategy::Batch].iter().enumerate() {
            log.append(&PurchaseRecord {
                fingerprint: fp,
                payer: payer.clone(),
                price: 50_000,
                transfer_ref: format!("0xref{i}"),
                timestamp: 1_000 + i as u64,
                tag: TrackingTag::derive(&fp, 1_000, i as u32),
                strategy: *strategy,
            })
            .unwrap();
        }

        assert_eq!(log.count().unwrap(), 2);
        let all = log.all().unwrap();
        assert_eq!(all[1].strategy, Strategy::Batch);
        assert_eq!(all[1].tag.decode().2, 1);
        assert_eq!(log.for_payer(&payer).unwrap().len(), 2);
        assert_eq!(log.for_content(&fp).unwrap().len(), 2);
        assert_eq!(log.total_spent(&payer, 1_001).unwrap(), 50_000);
        assert_eq!(log.total_spent(&Identity::new("x"), 0).unwrap(), 0);
    }
}
