//! Map persistence.
//!
//! The graph serialises to a [`MapDocument`]: a flat, camelCase record
//! layout with string ids only, no handles, no timestamps.  Recency is
//! session-local by design, so `lastSeen` / `lastTraversed` are dropped
//! on save and reset to load time on restore.
//!
//! Two [`MapStorage`] backends ship with the crate:
//!
//! * [`JsonFileStorage`] — one pretty-printed JSON file, the format the
//!   document layout was designed around.
//! * [`SqliteStorage`] — two tables in a single SQLite file, each save a
//!   full transactional rewrite.
//!
//! Loading is lenient where it can afford to be: excess records are
//! truncated to capacity, edges referencing unknown node ids are
//! dropped, and the id counter is advanced past every ingested id.  A
//! file that fails to parse is [`StorageError::Malformed`], a backend
//! that cannot be opened at all is [`StorageError::Unavailable`], and a
//! missing file is simply an empty map (`Ok(None)`).

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::graph::{MapEdge, MapNode, NodeHandle, SpatialGraph};

// ────────────────────────────────────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),

    #[error("stored map is malformed: {0}")]
    Malformed(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

// ────────────────────────────────────────────────────────────────────────────
// Document model
// ────────────────────────────────────────────────────────────────────────────

/// Serialisable snapshot of a [`SpatialGraph`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MapDocument {
    pub nodes: Vec<NodeRecord>,
    pub edges: Vec<EdgeRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NodeRecord {
    pub id: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(rename = "type")]
    pub kind: String,
    pub is_obstacle: bool,
    pub visit_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EdgeRecord {
    pub id: String,
    pub source_id: String,
    pub target_id: String,
    pub weight: f64,
    pub traverse_count: u32,
}

// ────────────────────────────────────────────────────────────────────────────
// Storage trait and backends
// ────────────────────────────────────────────────────────────────────────────

/// Durable home for a [`MapDocument`].
pub trait MapStorage {
    fn save(&self, doc: &MapDocument) -> Result<(), StorageError>;

    /// `Ok(None)` means nothing has been saved yet, which is a normal
    /// first-boot condition, not an error.
    fn load(&self) -> Result<Option<MapDocument>, StorageError>;

    fn delete(&self) -> Result<(), StorageError>;
}

/// Single-file JSON backend.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MapStorage for JsonFileStorage {
    fn save(&self, doc: &MapDocument) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(doc)
            .map_err(|e| StorageError::Malformed(e.to_string()))?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    fn load(&self) -> Result<Option<MapDocument>, StorageError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&self.path)?;
        let doc = serde_json::from_str(&json)
            .map_err(|e| StorageError::Malformed(e.to_string()))?;
        Ok(Some(doc))
    }

    fn delete(&self) -> Result<(), StorageError> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

/// SQLite backend: `map_nodes` and `map_edges` tables, a full rewrite
/// per save inside one transaction.  A connection is opened per
/// operation; saves are minutes apart, so connection reuse buys nothing.
#[derive(Debug, Clone)]
pub struct SqliteStorage {
    path: PathBuf,
}

impl SqliteStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self) -> Result<Connection, StorageError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        // A file that cannot be opened as a database (locked, corrupt,
        // not sqlite at all) means the backend is unusable, which is a
        // different condition from a malformed record inside it.
        let conn = Connection::open(&self.path)
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        // seq preserves insertion order across the save/load boundary.
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS map_nodes (
                 seq            INTEGER PRIMARY KEY,
                 id             TEXT NOT NULL UNIQUE,
                 lat            REAL NOT NULL,
                 lng            REAL NOT NULL,
                 kind           TEXT NOT NULL,
                 is_obstacle    INTEGER NOT NULL,
                 visit_count    INTEGER NOT NULL
             );
             CREATE TABLE IF NOT EXISTS map_edges (
                 seq            INTEGER PRIMARY KEY,
                 id             TEXT NOT NULL UNIQUE,
                 source_id      TEXT NOT NULL,
                 target_id      TEXT NOT NULL,
                 weight         REAL NOT NULL,
                 traverse_count INTEGER NOT NULL
             );",
        )
        .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        Ok(conn)
    }
}

impl MapStorage for SqliteStorage {
    fn save(&self, doc: &MapDocument) -> Result<(), StorageError> {
        let mut conn = self.open()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM map_nodes", [])?;
        tx.execute("DELETE FROM map_edges", [])?;
        for (seq, node) in doc.nodes.iter().enumerate() {
            tx.execute(
                "INSERT INTO map_nodes (seq, id, lat, lng, kind, is_obstacle, visit_count)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    seq as i64,
                    node.id,
                    node.lat,
                    node.lng,
                    node.kind,
                    node.is_obstacle,
                    node.visit_count,
                ],
            )?;
        }
        for (seq, edge) in doc.edges.iter().enumerate() {
            tx.execute(
                "INSERT INTO map_edges (seq, id, source_id, target_id, weight, traverse_count)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    seq as i64,
                    edge.id,
                    edge.source_id,
                    edge.target_id,
                    edge.weight,
                    edge.traverse_count,
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn load(&self) -> Result<Option<MapDocument>, StorageError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let conn = self.open()?;

        let mut stmt = conn.prepare(
            "SELECT id, lat, lng, kind, is_obstacle, visit_count
             FROM map_nodes ORDER BY seq",
        )?;
        let nodes = stmt
            .query_map([], |row| {
                Ok(NodeRecord {
                    id: row.get(0)?,
                    lat: row.get(1)?,
                    lng: row.get(2)?,
                    kind: row.get(3)?,
                    is_obstacle: row.get(4)?,
                    visit_count: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut stmt = conn.prepare(
            "SELECT id, source_id, target_id, weight, traverse_count
             FROM map_edges ORDER BY seq",
        )?;
        let edges = stmt
            .query_map([], |row| {
                Ok(EdgeRecord {
                    id: row.get(0)?,
                    source_id: row.get(1)?,
                    target_id: row.get(2)?,
                    weight: row.get(3)?,
                    traverse_count: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(MapDocument { nodes, edges }))
    }

    fn delete(&self) -> Result<(), StorageError> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Graph ⇄ document conversion
// ────────────────────────────────────────────────────────────────────────────

impl SpatialGraph {
    /// Snapshot the graph into a serialisable document.
    pub fn to_document(&self) -> MapDocument {
        MapDocument {
            nodes: self
                .nodes()
                .map(|(_, n)| NodeRecord {
                    id: n.id.clone(),
                    lat: n.lat,
                    lng: n.lng,
                    kind: n.kind.clone(),
                    is_obstacle: n.is_obstacle,
                    visit_count: n.visit_count,
                })
                .collect(),
            edges: self
                .edges()
                .map(|(_, e)| EdgeRecord {
                    id: e.id.clone(),
                    source_id: self.node(e.source).id.clone(),
                    target_id: self.node(e.target).id.clone(),
                    weight: e.weight_m,
                    traverse_count: e.traverse_count,
                })
                .collect(),
        }
    }

    /// Replace the graph's contents from a document.
    ///
    /// Infallible by policy: excess records truncate to capacity, edges
    /// with unresolvable endpoints drop with a warning, and every
    /// recency timestamp resets to load time.  All previously held
    /// handles are invalidated.
    pub fn load_document(&mut self, doc: &MapDocument) {
        let now = Instant::now();

        if doc.nodes.len() > self.node_capacity() {
            warn!(
                stored = doc.nodes.len(),
                capacity = self.node_capacity(),
                "stored map has more nodes than fit, truncating"
            );
        }
        let nodes: Vec<MapNode> = doc
            .nodes
            .iter()
            .take(self.node_capacity())
            .map(|r| MapNode {
                id: r.id.clone(),
                lat: r.lat,
                lng: r.lng,
                kind: r.kind.clone(),
                is_obstacle: r.is_obstacle,
                last_seen: now,
                visit_count: r.visit_count.max(1),
            })
            .collect();

        let index: std::collections::HashMap<&str, usize> = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.as_str(), i))
            .collect();

        let mut edges: Vec<MapEdge> = Vec::new();
        for record in &doc.edges {
            if edges.len() >= self.edge_capacity() {
                warn!(
                    stored = doc.edges.len(),
                    capacity = self.edge_capacity(),
                    "stored map has more edges than fit, truncating"
                );
                break;
            }
            let (Some(&s), Some(&t)) = (
                index.get(record.source_id.as_str()),
                index.get(record.target_id.as_str()),
            ) else {
                warn!(edge = %record.id, "dropping edge with unknown endpoint");
                continue;
            };
            edges.push(MapEdge {
                id: record.id.clone(),
                source: NodeHandle(s),
                target: NodeHandle(t),
                weight_m: record.weight,
                last_traversed: now,
                traverse_count: record.traverse_count.max(1),
            });
        }

        debug!(nodes = nodes.len(), edges = edges.len(), "map restored");
        self.replace_contents(nodes, edges);
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Convenience operations
// ────────────────────────────────────────────────────────────────────────────

/// Persist the graph's current contents.
pub fn save_map(graph: &SpatialGraph, storage: &dyn MapStorage) -> Result<(), StorageError> {
    storage.save(&graph.to_document())
}

/// Restore the graph from storage.  Returns `Ok(true)` when a document
/// was found and loaded, `Ok(false)` when storage was empty (the graph
/// is left untouched).
pub fn load_map(graph: &mut SpatialGraph, storage: &dyn MapStorage) -> Result<bool, StorageError> {
    match storage.load()? {
        Some(doc) => {
            graph.load_document(&doc);
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Empty the in-memory graph and delete its durable copy.
pub fn clear_map(graph: &mut SpatialGraph, storage: &dyn MapStorage) -> Result<(), StorageError> {
    graph.clear();
    storage.delete()
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
