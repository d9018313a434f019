//! Habit service operations
//!
//! The decision core of the API: input validation, per-record ownership
//! enforcement, and store-state to typed-result mapping. Each operation
//! takes the store as an explicit dependency and suspends only on store
//! I/O. Failures are surfaced once, with no retries.

use chrono::{SecondsFormat, Utc};
use tracing::warn;

use crate::db::schemas::HabitDoc;
use crate::types::HabitusError;

use super::store::HabitStore;
use super::types::{Habit, HabitError, HabitPatch, NewHabit, UpdateOutcome};

fn internal(err: HabitusError) -> HabitError {
    HabitError::Internal {
        code: Some(err.to_string()),
    }
}

/// All habits owned by the caller, most recent first
pub async fn list_mine(store: &dyn HabitStore, username: &str) -> Result<Vec<Habit>, HabitError> {
    store.list_by_owner(username).await.map_err(internal)
}

/// Fetch a single habit
///
/// Existence is checked before ownership: a missing id is NotFound for
/// every caller, and only a record that exists can yield Forbidden. The
/// two guards are deliberately separate steps.
pub async fn get_one(
    store: &dyn HabitStore,
    habit_id: &str,
    username: &str,
) -> Result<Habit, HabitError> {
    let habit = match store.get_by_id(habit_id).await.map_err(internal)? {
        Some(habit) => habit,
        None => return Err(HabitError::NotFound),
    };

    if habit.username != username {
        return Err(HabitError::Forbidden);
    }

    Ok(habit)
}

/// Create a habit owned by the caller
///
/// `body` is validated before `title`; the first empty field wins.
/// Store failures are reported without the store's error code, unlike
/// every other operation.
pub async fn create(
    store: &dyn HabitStore,
    username: &str,
    input: NewHabit,
) -> Result<Habit, HabitError> {
    if input.body.trim().is_empty() {
        return Err(HabitError::Validation { field: "body" });
    }
    if input.title.trim().is_empty() {
        return Err(HabitError::Validation { field: "title" });
    }

    let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    let doc = HabitDoc::new(
        input.title.clone(),
        input.body.clone(),
        created_at.clone(),
        username.to_string(),
    );

    let habit_id = match store.insert(doc).await {
        Ok(id) => id,
        Err(err) => {
            warn!("habit insert failed: {}", err);
            return Err(HabitError::Internal { code: None });
        }
    };

    Ok(Habit {
        habit_id,
        title: input.title,
        body: input.body,
        created_at,
        username: username.to_string(),
    })
}

/// Merge the provided fields into an existing habit
///
/// No ownership check is performed here. A patch naming the immutable
/// `habitId`/`createdAt` fields is reported as rejected, but the merge
/// of the remaining fields still runs; the rejection is what the caller
/// sees even when that merge also fails.
pub async fn update(
    store: &dyn HabitStore,
    habit_id: &str,
    patch: HabitPatch,
) -> Result<UpdateOutcome, HabitError> {
    let rejected = patch.names_immutable_fields();

    let result = store.update_fields(habit_id, patch.title, patch.body).await;

    if rejected {
        if let Err(err) = result {
            warn!(
                "habit {} update failed after immutable-field rejection: {}",
                habit_id, err
            );
        }
        return Ok(UpdateOutcome::RejectedImmutableFields);
    }

    result.map_err(internal)?;
    Ok(UpdateOutcome::Applied)
}

/// Delete a habit owned by the caller
///
/// Strict gate sequence: fetch, NotFound on absence, Forbidden on owner
/// mismatch, then delete.
pub async fn delete(
    store: &dyn HabitStore,
    habit_id: &str,
    username: &str,
) -> Result<(), HabitError> {
    let habit = match store.get_by_id(habit_id).await.map_err(internal)? {
        Some(habit) => habit,
        None => return Err(HabitError::NotFound),
    };

    if habit.username != username {
        return Err(HabitError::Forbidden);
    }

    store.delete_by_id(habit_id).await.map_err(internal)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
    use std::sync::Mutex;

    /// In-memory store double
    #[derive(Default)]
    struct MemoryHabitStore {
        habits: Mutex<Vec<Habit>>,
        next_id: AtomicU64,
        fail_next_update: AtomicBool,
    }

    impl MemoryHabitStore {
        fn new() -> Self {
            Self::default()
        }

        fn get(&self, habit_id: &str) -> Option<Habit> {
            self.habits
                .lock()
                .unwrap()
                .iter()
                .find(|h| h.habit_id == habit_id)
                .cloned()
        }
    }

    #[async_trait]
    impl HabitStore for MemoryHabitStore {
        async fn get_by_id(&self, habit_id: &str) -> Result<Option<Habit>, HabitusError> {
            Ok(self.get(habit_id))
        }

        async fn list_by_owner(&self, username: &str) -> Result<Vec<Habit>, HabitusError> {
            let mut habits: Vec<Habit> = self
                .habits
                .lock()
                .unwrap()
                .iter()
                .filter(|h| h.username == username)
                .cloned()
                .collect();
            habits.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(habits)
        }

        async fn insert(&self, doc: HabitDoc) -> Result<String, HabitusError> {
            let habit_id = format!("habit-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
            self.habits.lock().unwrap().push(Habit {
                habit_id: habit_id.clone(),
                title: doc.title,
                body: doc.body,
                created_at: doc.created_at,
                username: doc.username,
            });
            Ok(habit_id)
        }

        async fn update_fields(
            &self,
            habit_id: &str,
            title: Option<String>,
            body: Option<String>,
        ) -> Result<(), HabitusError> {
            if self.fail_next_update.swap(false, Ordering::SeqCst) {
                return Err(HabitusError::Database("injected update failure".into()));
            }

            let mut habits = self.habits.lock().unwrap();
            let habit = habits
                .iter_mut()
                .find(|h| h.habit_id == habit_id)
                .ok_or_else(|| HabitusError::Database(format!("no document matched id {}", habit_id)))?;

            if let Some(title) = title {
                habit.title = title;
            }
            if let Some(body) = body {
                habit.body = body;
            }
            Ok(())
        }

        async fn delete_by_id(&self, habit_id: &str) -> Result<(), HabitusError> {
            self.habits.lock().unwrap().retain(|h| h.habit_id != habit_id);
            Ok(())
        }
    }

    fn new_habit(title: &str, body: &str) -> NewHabit {
        NewHabit {
            title: title.to_string(),
            body: body.to_string(),
        }
    }

    async fn seed(store: &MemoryHabitStore, username: &str, created_at: &str) -> String {
        store
            .insert(HabitDoc::new(
                "title".to_string(),
                "body".to_string(),
                created_at.to_string(),
                username.to_string(),
            ))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn list_is_scoped_to_owner() {
        let store = MemoryHabitStore::new();
        let mine = create(&store, "alice", new_habit("Run", "5k")).await.unwrap();
        create(&store, "bob", new_habit("Read", "A chapter a day"))
            .await
            .unwrap();

        let alice_habits = list_mine(&store, "alice").await.unwrap();
        assert_eq!(alice_habits.len(), 1);
        assert_eq!(alice_habits[0].habit_id, mine.habit_id);

        let bob_habits = list_mine(&store, "bob").await.unwrap();
        assert_eq!(bob_habits.len(), 1);
        assert_ne!(bob_habits[0].habit_id, mine.habit_id);

        assert!(list_mine(&store, "carol").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_is_sorted_newest_first() {
        let store = MemoryHabitStore::new();
        seed(&store, "alice", "2026-01-01T00:00:00.000Z").await;
        seed(&store, "alice", "2026-03-01T00:00:00.000Z").await;
        seed(&store, "alice", "2026-02-01T00:00:00.000Z").await;

        let habits = list_mine(&store, "alice").await.unwrap();
        let stamps: Vec<&str> = habits.iter().map(|h| h.created_at.as_str()).collect();
        assert_eq!(
            stamps,
            vec![
                "2026-03-01T00:00:00.000Z",
                "2026-02-01T00:00:00.000Z",
                "2026-01-01T00:00:00.000Z",
            ]
        );
    }

    #[tokio::test]
    async fn get_missing_is_not_found_for_any_caller() {
        let store = MemoryHabitStore::new();
        assert_eq!(
            get_one(&store, "nonexistent", "alice").await.unwrap_err(),
            HabitError::NotFound
        );
        assert_eq!(
            get_one(&store, "nonexistent", "bob").await.unwrap_err(),
            HabitError::NotFound
        );
    }

    #[tokio::test]
    async fn get_other_owner_is_forbidden_not_not_found() {
        let store = MemoryHabitStore::new();
        let habit = create(&store, "alice", new_habit("Run", "5k")).await.unwrap();

        assert_eq!(
            get_one(&store, &habit.habit_id, "bob").await.unwrap_err(),
            HabitError::Forbidden
        );

        let fetched = get_one(&store, &habit.habit_id, "alice").await.unwrap();
        assert_eq!(fetched, habit);
    }

    #[tokio::test]
    async fn create_validates_body_before_title() {
        let store = MemoryHabitStore::new();

        assert_eq!(
            create(&store, "alice", new_habit("nonempty", ""))
                .await
                .unwrap_err(),
            HabitError::Validation { field: "body" }
        );
        assert_eq!(
            create(&store, "alice", new_habit("", "nonempty"))
                .await
                .unwrap_err(),
            HabitError::Validation { field: "title" }
        );
        // Both empty: body wins
        assert_eq!(
            create(&store, "alice", new_habit("", "")).await.unwrap_err(),
            HabitError::Validation { field: "body" }
        );
        // Whitespace counts as empty
        assert_eq!(
            create(&store, "alice", new_habit("nonempty", "   "))
                .await
                .unwrap_err(),
            HabitError::Validation { field: "body" }
        );
    }

    #[tokio::test]
    async fn create_stamps_owner_and_timestamp() {
        let store = MemoryHabitStore::new();
        let habit = create(&store, "alice", new_habit("Run", "5k")).await.unwrap();

        assert!(!habit.habit_id.is_empty());
        assert_eq!(habit.username, "alice");
        assert_eq!(habit.title, "Run");
        assert_eq!(habit.body, "5k");
        assert!(chrono::DateTime::parse_from_rfc3339(&habit.created_at).is_ok());

        // Persisted record matches the returned one
        assert_eq!(store.get(&habit.habit_id).unwrap(), habit);
    }

    #[tokio::test]
    async fn delete_by_owner_removes_record() {
        let store = MemoryHabitStore::new();
        let habit = create(&store, "alice", new_habit("Run", "5k")).await.unwrap();

        delete(&store, &habit.habit_id, "alice").await.unwrap();
        assert_eq!(
            get_one(&store, &habit.habit_id, "alice").await.unwrap_err(),
            HabitError::NotFound
        );
    }

    #[tokio::test]
    async fn delete_by_non_owner_is_forbidden_and_keeps_record() {
        let store = MemoryHabitStore::new();
        let habit = create(&store, "alice", new_habit("Run", "5k")).await.unwrap();

        assert_eq!(
            delete(&store, &habit.habit_id, "bob").await.unwrap_err(),
            HabitError::Forbidden
        );
        assert!(get_one(&store, &habit.habit_id, "alice").await.is_ok());
    }

    #[tokio::test]
    async fn delete_missing_is_not_found() {
        let store = MemoryHabitStore::new();
        assert_eq!(
            delete(&store, "nonexistent", "alice").await.unwrap_err(),
            HabitError::NotFound
        );
    }

    #[tokio::test]
    async fn update_changes_only_given_fields() {
        let store = MemoryHabitStore::new();
        let habit = create(&store, "alice", new_habit("Run", "5k")).await.unwrap();

        let outcome = update(
            &store,
            &habit.habit_id,
            HabitPatch {
                title: Some("Swim".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(outcome, UpdateOutcome::Applied);

        let updated = store.get(&habit.habit_id).unwrap();
        assert_eq!(updated.title, "Swim");
        assert_eq!(updated.body, habit.body);
        assert_eq!(updated.created_at, habit.created_at);
        assert_eq!(updated.username, habit.username);
        assert_eq!(updated.habit_id, habit.habit_id);
    }

    #[tokio::test]
    async fn update_has_no_ownership_check() {
        let store = MemoryHabitStore::new();
        let habit = create(&store, "alice", new_habit("Run", "5k")).await.unwrap();

        // Any authenticated caller can edit; the service never looks at
        // the caller here
        let outcome = update(
            &store,
            &habit.habit_id,
            HabitPatch {
                body: Some("10k".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(outcome, UpdateOutcome::Applied);
        assert_eq!(store.get(&habit.habit_id).unwrap().body, "10k");
    }

    #[tokio::test]
    async fn update_rejects_immutable_fields_but_still_merges() {
        let store = MemoryHabitStore::new();
        let habit = create(&store, "alice", new_habit("Run", "5k")).await.unwrap();

        let outcome = update(
            &store,
            &habit.habit_id,
            HabitPatch {
                title: Some("Swim".to_string()),
                created_at: Some("2020-01-01T00:00:00.000Z".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(outcome, UpdateOutcome::RejectedImmutableFields);

        // The mutable field was merged anyway; the immutable one was not
        let updated = store.get(&habit.habit_id).unwrap();
        assert_eq!(updated.title, "Swim");
        assert_eq!(updated.created_at, habit.created_at);
    }

    #[tokio::test]
    async fn update_rejected_path_masks_store_failure() {
        let store = MemoryHabitStore::new();
        let habit = create(&store, "alice", new_habit("Run", "5k")).await.unwrap();

        store.fail_next_update.store(true, Ordering::SeqCst);
        let outcome = update(
            &store,
            &habit.habit_id,
            HabitPatch {
                title: Some("Swim".to_string()),
                habit_id: Some("forged".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(outcome, UpdateOutcome::RejectedImmutableFields);
    }

    #[tokio::test]
    async fn update_store_failure_surfaces_internal_with_code() {
        let store = MemoryHabitStore::new();
        let habit = create(&store, "alice", new_habit("Run", "5k")).await.unwrap();

        store.fail_next_update.store(true, Ordering::SeqCst);
        let err = update(
            &store,
            &habit.habit_id,
            HabitPatch {
                title: Some("Swim".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

        match err {
            HabitError::Internal { code: Some(code) } => {
                assert!(code.contains("injected update failure"));
            }
            other => panic!("expected internal failure with code, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn update_missing_habit_surfaces_internal() {
        let store = MemoryHabitStore::new();
        let err = update(
            &store,
            "nonexistent",
            HabitPatch {
                title: Some("Swim".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, HabitError::Internal { code: Some(_) }));
    }

    #[tokio::test]
    async fn ownership_scenario_end_to_end() {
        let store = MemoryHabitStore::new();

        // alice creates a habit
        let habit = create(&store, "alice", new_habit("Run", "5k")).await.unwrap();
        assert!(!habit.habit_id.is_empty());
        assert_eq!(habit.username, "alice");

        // bob cannot read it
        assert_eq!(
            get_one(&store, &habit.habit_id, "bob").await.unwrap_err(),
            HabitError::Forbidden
        );

        // alice deletes it, then a re-read is NotFound
        delete(&store, &habit.habit_id, "alice").await.unwrap();
        assert_eq!(
            get_one(&store, &habit.habit_id, "alice").await.unwrap_err(),
            HabitError::NotFound
        );
    }
}
