//! StorageEngine: owns the ConnectionPool, runs migrations on open, and
//! implements IMemoryStore + IGraphStore.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::Connection;

use sift_core::errors::SiftResult;
use sift_core::models::{
    Entity, MemoryEntityAssociation, MemoryRecord, MergeHistoryEntry, MergePlan, MergeStats,
    Relation,
};
use sift_core::traits::{IGraphStore, IMemoryStore};

use crate::migrations;
use crate::pool::{pragmas, ConnectionPool, PoolOptions, WriteConnection};
use crate::queries::{
    association_ops, entity_ops, memory_crud, memory_query, memory_search, merge_ops,
    relation_ops, vector_search,
};

pub struct StorageEngine {
    pool: ConnectionPool,
}

impl StorageEngine {
    /// Open (or create) a database file and bring its schema up to date.
    pub fn open(path: &Path) -> SiftResult<Self> {
        Self::open_with(path, PoolOptions::default())
    }

    pub fn open_with(path: &Path, options: PoolOptions) -> SiftResult<Self> {
        // Migrations must run before read-only handles are opened on the file.
        WriteConnection::open(path, options)?
            .with_conn(|conn| migrations::run_migrations(conn).map(|_| ()))?;
        let pool = ConnectionPool::open(path, options)?;
        Ok(Self { pool })
    }

    /// In-memory database; every read goes through the writer.
    pub fn open_in_memory() -> SiftResult<Self> {
        let pool = ConnectionPool::open_in_memory(PoolOptions::default())?;
        pool.write(|conn| migrations::run_migrations(conn).map(|_| ()))?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    /// Whether the writer runs in WAL mode. False for in-memory databases.
    pub fn is_wal(&self) -> SiftResult<bool> {
        self.with_writer(pragmas::verify_wal_mode)
    }

    pub fn schema_version(&self) -> SiftResult<u32> {
        self.with_reader(migrations::current_version)
    }

    fn with_reader<F, T>(&self, f: F) -> SiftResult<T>
    where
        F: FnOnce(&Connection) -> SiftResult<T>,
    {
        self.pool.read(f)
    }

    fn with_writer<F, T>(&self, f: F) -> SiftResult<T>
    where
        F: FnOnce(&Connection) -> SiftResult<T>,
    {
        self.pool.write(f)
    }
}

impl IMemoryStore for StorageEngine {
    fn insert_memory(&self, memory: &MemoryRecord) -> SiftResult<()> {
        self.with_writer(|conn| memory_crud::insert_memory(conn, memory))
    }

    fn get_memory(&self, id: &str) -> SiftResult<Option<MemoryRecord>> {
        self.with_reader(|conn| memory_crud::get_memory(conn, id))
    }

    fn get_memories(&self, ids: &[String]) -> SiftResult<Vec<MemoryRecord>> {
        self.with_reader(|conn| memory_crud::bulk_get(conn, ids))
    }

    fn update_content(
        &self,
        id: &str,
        content: &str,
        tags: &[String],
        updated_at: DateTime<Utc>,
    ) -> SiftResult<()> {
        self.with_writer(|conn| memory_crud::update_content(conn, id, content, tags, updated_at))
    }

    fn set_embedding(&self, id: &str, embedding: &[f32], model: &str) -> SiftResult<()> {
        self.with_writer(|conn| memory_crud::set_embedding(conn, id, embedding, model))
    }

    fn mark_extracted(&self, id: &str) -> SiftResult<()> {
        self.with_writer(|conn| memory_crud::mark_extracted(conn, id))
    }

    fn recent_with_embeddings(
        &self,
        context: &str,
        since: DateTime<Utc>,
    ) -> SiftResult<Vec<MemoryRecord>> {
        self.with_reader(|conn| memory_query::recent_with_embeddings(conn, context, since))
    }

    fn embedded_in_context(&self, context: &str) -> SiftResult<Vec<MemoryRecord>> {
        self.with_reader(|conn| memory_query::embedded_in_context(conn, context))
    }

    fn memories_between(
        &self,
        context: Option<&str>,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> SiftResult<Vec<MemoryRecord>> {
        self.with_reader(|conn| memory_query::memories_between(conn, context, from, to))
    }

    fn search_text(
        &self,
        query: &str,
        context: Option<&str>,
        limit: usize,
    ) -> SiftResult<Vec<(MemoryRecord, f64)>> {
        self.with_reader(|conn| memory_search::search_fts5(conn, query, context, limit))
    }

    fn search_vector(
        &self,
        query: &[f32],
        context: Option<&str>,
        limit: usize,
    ) -> SiftResult<Vec<(MemoryRecord, f64)>> {
        self.with_reader(|conn| vector_search::search_vector(conn, query, context, limit))
    }
}

impl IGraphStore for StorageEngine {
    fn insert_entity(&self, entity: &Entity) -> SiftResult<()> {
        self.with_writer(|conn| entity_ops::insert_entity(conn, entity))
    }

    fn update_entity(&self, entity: &Entity) -> SiftResult<()> {
        self.with_writer(|conn| entity_ops::update_entity(conn, entity))
    }

    fn get_entity(&self, id: &str) -> SiftResult<Option<Entity>> {
        self.with_reader(|conn| entity_ops::get_entity(conn, id))
    }

    fn list_entities(&self) -> SiftResult<Vec<Entity>> {
        self.with_reader(entity_ops::list_entities)
    }

    fn find_entities_by_name(&self, name: &str) -> SiftResult<Vec<Entity>> {
        self.with_reader(|conn| entity_ops::find_by_name(conn, name))
    }

    fn replace_associations(
        &self,
        memory_id: &str,
        associations: &[MemoryEntityAssociation],
    ) -> SiftResult<()> {
        self.with_writer(|conn| association_ops::replace_associations(conn, memory_id, associations))
    }

    fn associations_for_memory(&self, memory_id: &str) -> SiftResult<Vec<MemoryEntityAssociation>> {
        self.with_reader(|conn| association_ops::for_memory(conn, memory_id))
    }

    fn associations_for_entities(
        &self,
        entity_ids: &[String],
    ) -> SiftResult<Vec<MemoryEntityAssociation>> {
        self.with_reader(|conn| association_ops::for_entities(conn, entity_ids))
    }

    fn add_relation(&self, relation: &Relation) -> SiftResult<bool> {
        self.with_writer(|conn| relation_ops::add_relation(conn, relation))
    }

    fn relations_touching(&self, entity_ids: &[String]) -> SiftResult<Vec<Relation>> {
        self.with_reader(|conn| relation_ops::touching(conn, entity_ids))
    }

    fn apply_merge(&self, plan: &MergePlan) -> SiftResult<MergeStats> {
        self.with_writer(|conn| merge_ops::apply_merge(conn, plan))
    }

    fn merge_history_for(&self, entity_id: &str) -> SiftResult<Vec<MergeHistoryEntry>> {
        self.with_reader(|conn| merge_ops::history_for(conn, entity_id))
    }

    fn forwarded_to(&self, retired_id: &str) -> SiftResult<Option<String>> {
        self.with_reader(|conn| merge_ops::forwarded_to(conn, retired_id))
    }
}
