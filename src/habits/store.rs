//! Store seam for habit documents
//!
//! The service operates on [`HabitStore`] rather than a concrete
//! database handle so tests can substitute an in-memory double.

use async_trait::async_trait;
use bson::{doc, oid::ObjectId, Document};

use crate::db::mongo::{MongoClient, MongoCollection};
use crate::db::schemas::{HabitDoc, HABIT_COLLECTION};
use crate::types::HabitusError;

use super::types::Habit;

/// Per-document CRUD plus the one filtered query the service needs
#[async_trait]
pub trait HabitStore: Send + Sync {
    /// Fetch a habit by id. `Ok(None)` when no document exists for it.
    async fn get_by_id(&self, habit_id: &str) -> Result<Option<Habit>, HabitusError>;

    /// All habits owned by `username`, most recent first
    async fn list_by_owner(&self, username: &str) -> Result<Vec<Habit>, HabitusError>;

    /// Insert a record, returning the assigned id
    async fn insert(&self, doc: HabitDoc) -> Result<String, HabitusError>;

    /// Merge the provided fields into an existing document. Absent
    /// fields are left untouched.
    async fn update_fields(
        &self,
        habit_id: &str,
        title: Option<String>,
        body: Option<String>,
    ) -> Result<(), HabitusError>;

    /// Remove the document permanently
    async fn delete_by_id(&self, habit_id: &str) -> Result<(), HabitusError>;
}

/// MongoDB-backed habit store
pub struct MongoHabitStore {
    collection: MongoCollection<HabitDoc>,
}

impl MongoHabitStore {
    /// Open the habits collection (applies indexes)
    pub async fn new(mongo: &MongoClient) -> Result<Self, HabitusError> {
        Ok(Self {
            collection: mongo.collection::<HabitDoc>(HABIT_COLLECTION).await?,
        })
    }
}

/// Attach the store-assigned id, producing the wire-facing record
fn doc_to_habit(doc: HabitDoc) -> Option<Habit> {
    let id = doc._id?;
    Some(Habit {
        habit_id: id.to_hex(),
        title: doc.title,
        body: doc.body,
        created_at: doc.created_at,
        username: doc.username,
    })
}

/// Build an `_id` filter. A string that is not a valid ObjectId cannot
/// match any document.
fn id_filter(habit_id: &str) -> Option<Document> {
    let oid = ObjectId::parse_str(habit_id).ok()?;
    Some(doc! { "_id": oid })
}

#[async_trait]
impl HabitStore for MongoHabitStore {
    async fn get_by_id(&self, habit_id: &str) -> Result<Option<Habit>, HabitusError> {
        let filter = match id_filter(habit_id) {
            Some(f) => f,
            None => return Ok(None),
        };

        let doc = self.collection.find_one(filter).await?;
        Ok(doc.and_then(doc_to_habit))
    }

    async fn list_by_owner(&self, username: &str) -> Result<Vec<Habit>, HabitusError> {
        let docs = self
            .collection
            .find_many(doc! { "username": username }, doc! { "created_at": -1 })
            .await?;

        Ok(docs.into_iter().filter_map(doc_to_habit).collect())
    }

    async fn insert(&self, doc: HabitDoc) -> Result<String, HabitusError> {
        let id = self.collection.insert_one(doc).await?;
        Ok(id.to_hex())
    }

    async fn update_fields(
        &self,
        habit_id: &str,
        title: Option<String>,
        body: Option<String>,
    ) -> Result<(), HabitusError> {
        let filter = id_filter(habit_id)
            .ok_or_else(|| HabitusError::Database(format!("invalid document id: {}", habit_id)))?;

        let mut set = Document::new();
        if let Some(title) = title {
            set.insert("title", title);
        }
        if let Some(body) = body {
            set.insert("body", body);
        }
        if set.is_empty() {
            return Ok(());
        }

        let result = self.collection.update_one(filter, doc! { "$set": set }).await?;
        if result.matched_count == 0 {
            return Err(HabitusError::Database(format!(
                "no document matched id {}",
                habit_id
            )));
        }

        Ok(())
    }

    async fn delete_by_id(&self, habit_id: &str) -> Result<(), HabitusError> {
        let filter = id_filter(habit_id)
            .ok_or_else(|| HabitusError::Database(format!("invalid document id: {}", habit_id)))?;

        self.collection.delete_one(filter).await?;
        Ok(())
    }
}
