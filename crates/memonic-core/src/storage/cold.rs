//! On-disk metadata for everything not in the hot tier. A warm-tier row
//! additionally carries `warm_offset`, pointing into the quantized-embedding
//! slab; a cold-tier row has no offset at all — embeddings are absent and
//! recall must re-embed the payload from scratch if the node resurfaces.
//!
//! Backed by SQLite, tuned the way the rest of this codebase tunes its
//! connections (WAL journal mode, relaxed synchronous, large page cache).

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};

use crate::id::NodeId;
use crate::memory::{Confidence, Edge, NodeKind, Provenance, Tier};

use super::error::{Result, StorageError};

pub struct ColdMeta {
    conn: Mutex<Connection>,
}

/// Everything a demoted node needs except its embedding.
#[derive(Debug, Clone)]
pub struct ColdRecord {
    pub id: NodeId,
    pub kind: NodeKind,
    pub payload_bytes: Vec<u8>,
    pub text: Option<String>,
    pub tags: Vec<String>,
    pub edges: Vec<Edge>,
    pub confidence: Confidence,
    pub epsilon: f32,
    pub delta: f32,
    pub tau_created: i64,
    pub tau_accessed: i64,
    pub tier: Tier,
    pub provenance: Option<Provenance>,
    pub times_retrieved: u64,
    /// Set only while `tier == Warm`: byte offset into the warm slab.
    pub warm_offset: Option<u64>,
}

fn configure(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;
         PRAGMA cache_size = -32000;
         PRAGMA temp_store = MEMORY;
         PRAGMA foreign_keys = ON;
         PRAGMA busy_timeout = 5000;",
    )?;
    Ok(())
}

impl ColdMeta {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        configure(&conn)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS demoted_nodes (
                id TEXT PRIMARY KEY,
                kind TEXT NOT NULL,
                payload_bytes BLOB NOT NULL,
                text TEXT,
                tags TEXT NOT NULL,
                edges TEXT NOT NULL,
                mu REAL NOT NULL,
                sigma2 REAL NOT NULL,
                n INTEGER NOT NULL,
                epsilon REAL NOT NULL,
                delta REAL NOT NULL,
                tau_created INTEGER NOT NULL,
                tau_accessed INTEGER NOT NULL,
                tier TEXT NOT NULL,
                provenance TEXT,
                times_retrieved INTEGER NOT NULL,
                warm_offset INTEGER
            );
            CREATE TABLE IF NOT EXISTS quarantine (
                id TEXT PRIMARY KEY,
                reason TEXT NOT NULL,
                quarantined_at INTEGER NOT NULL
            );",
        )?;
        Ok(ColdMeta {
            conn: Mutex::new(conn),
        })
    }

    pub fn in_memory() -> Result<Self> {
        Self::open(":memory:")
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StorageError::Init("cold metadata connection poisoned".into()))
    }

    pub fn upsert(&self, record: &ColdRecord) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO demoted_nodes
                (id, kind, payload_bytes, text, tags, edges, mu, sigma2, n, epsilon, delta,
                 tau_created, tau_accessed, tier, provenance, times_retrieved, warm_offset)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
             ON CONFLICT(id) DO UPDATE SET
               kind=excluded.kind, payload_bytes=excluded.payload_bytes, text=excluded.text,
               tags=excluded.tags, edges=excluded.edges, mu=excluded.mu, sigma2=excluded.sigma2,
               n=excluded.n, epsilon=excluded.epsilon, delta=excluded.delta,
               tau_created=excluded.tau_created, tau_accessed=excluded.tau_accessed,
               tier=excluded.tier, provenance=excluded.provenance,
               times_retrieved=excluded.times_retrieved, warm_offset=excluded.warm_offset",
            params![
                record.id.to_string_hex(),
                record.kind.as_str(),
                record.payload_bytes,
                record.text,
                serde_json::to_string(&record.tags).unwrap_or_default(),
                serde_json::to_string(&record.edges).unwrap_or_default(),
                record.confidence.mu,
                record.confidence.sigma2,
                record.confidence.n,
                record.epsilon,
                record.delta,
                record.tau_created,
                record.tau_accessed,
                record.tier.to_string(),
                record.provenance.as_ref().map(|p| serde_json::to_string(p).unwrap_or_default()),
                record.times_retrieved as i64,
                record.warm_offset.map(|o| o as i64),
            ],
        )?;
        Ok(())
    }

    pub fn get(&self, id: &NodeId) -> Result<Option<ColdRecord>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT kind, payload_bytes, text, tags, edges, mu, sigma2, n, epsilon, delta,
                        tau_created, tau_accessed, tier, provenance, times_retrieved, warm_offset
                 FROM demoted_nodes WHERE id = ?1",
                params![id.to_string_hex()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, Vec<u8>>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, f32>(5)?,
                        row.get::<_, f32>(6)?,
                        row.get::<_, u32>(7)?,
                        row.get::<_, f32>(8)?,
                        row.get::<_, f32>(9)?,
                        row.get::<_, i64>(10)?,
                        row.get::<_, i64>(11)?,
                        row.get::<_, String>(12)?,
                        row.get::<_, Option<String>>(13)?,
                        row.get::<_, i64>(14)?,
                        row.get::<_, Option<i64>>(15)?,
                    ))
                },
            )
            .optional()?;

        let Some((
            kind_str, payload_bytes, text, tags_json, edges_json, mu, sigma2, n, epsilon, delta,
            tau_created, tau_accessed, tier_str, provenance_json, times_retrieved, warm_offset,
        )) = row
        else {
            return Ok(None);
        };

        let kind = kind_str
            .parse()
            .map_err(StorageError::SnapshotCorruption)?;
        let tier = match tier_str.as_str() {
            "hot" => Tier::Hot,
            "warm" => Tier::Warm,
            _ => Tier::Cold,
        };
        Ok(Some(ColdRecord {
            id: *id,
            kind,
            payload_bytes,
            text,
            tags: serde_json::from_str(&tags_json).unwrap_or_default(),
            edges: serde_json::from_str(&edges_json).unwrap_or_default(),
            confidence: Confidence::new(mu, sigma2, n),
            epsilon,
            delta,
            tau_created,
            tau_accessed,
            tier,
            provenance: provenance_json.and_then(|s| serde_json::from_str(&s).ok()),
            times_retrieved: times_retrieved as u64,
            warm_offset: warm_offset.map(|o| o as u64),
        }))
    }

    pub fn remove(&self, id: &NodeId) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "DELETE FROM demoted_nodes WHERE id = ?1",
            params![id.to_string_hex()],
        )?;
        Ok(())
    }

    pub fn count_tier(&self, tier: Tier) -> Result<usize> {
        let conn = self.lock()?;
        let n: i64 = conn.query_row(
            "SELECT COUNT(*) FROM demoted_nodes WHERE tier = ?1",
            params![tier.to_string()],
            |r| r.get(0),
        )?;
        Ok(n as usize)
    }

    pub fn all_ids(&self) -> Result<Vec<NodeId>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT id FROM demoted_nodes")?;
        let rows = stmt.query_map([], |r| r.get::<_, String>(0))?;
        let mut out = Vec::new();
        for row in rows {
            if let Some(id) = NodeId::from_string_hex(&row?) {
                out.push(id);
            }
        }
        Ok(out)
    }

    pub fn quarantine(&self, id: &NodeId, reason: &str, now_ms: i64) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO quarantine (id, reason, quarantined_at) VALUES (?1, ?2, ?3)",
            params![id.to_string_hex(), reason, now_ms],
        )?;
        conn.execute(
            "DELETE FROM demoted_nodes WHERE id = ?1",
            params![id.to_string_hex()],
        )?;
        Ok(())
    }

    pub fn quarantined_count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM quarantine", [], |r| r.get(0))?;
        Ok(n as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(id: NodeId, tier: Tier) -> ColdRecord {
        ColdRecord {
            id,
            kind: NodeKind::Episode,
            payload_bytes: b"hi".to_vec(),
            text: Some("hi".into()),
            tags: vec!["a".into()],
            edges: vec![],
            confidence: Confidence::default(),
            epsilon: 0.0,
            delta: 0.05,
            tau_created: 1,
            tau_accessed: 2,
            tier,
            provenance: None,
            times_retrieved: 0,
            warm_offset: None,
        }
    }

    #[test]
    fn upsert_then_get_roundtrips() {
        let meta = ColdMeta::in_memory().unwrap();
        let id = NodeId::new();
        meta.upsert(&sample(id, Tier::Cold)).unwrap();
        let got = meta.get(&id).unwrap().unwrap();
        assert_eq!(got.tags, vec!["a".to_string()]);
        assert_eq!(got.tier, Tier::Cold);
        assert_eq!(got.text.as_deref(), Some("hi"));
    }

    #[test]
    fn remove_drops_record() {
        let meta = ColdMeta::in_memory().unwrap();
        let id = NodeId::new();
        meta.upsert(&sample(id, Tier::Warm)).unwrap();
        meta.remove(&id).unwrap();
        assert!(meta.get(&id).unwrap().is_none());
    }

    #[test]
    fn count_tier_filters_correctly() {
        let meta = ColdMeta::in_memory().unwrap();
        meta.upsert(&sample(NodeId::new(), Tier::Warm)).unwrap();
        meta.upsert(&sample(NodeId::new(), Tier::Cold)).unwrap();
        meta.upsert(&sample(NodeId::new(), Tier::Cold)).unwrap();
        assert_eq!(meta.count_tier(Tier::Warm).unwrap(), 1);
        assert_eq!(meta.count_tier(Tier::Cold).unwrap(), 2);
    }

    #[test]
    fn quarantine_removes_from_live_set() {
        let meta = ColdMeta::in_memory().unwrap();
        let id = NodeId::new();
        meta.upsert(&sample(id, Tier::Cold)).unwrap();
        meta.quarantine(&id, "checksum mismatch", 0).unwrap();
        assert!(meta.get(&id).unwrap().is_none());
        assert_eq!(meta.quarantined_count().unwrap(), 1);
    }
}
