//! Coordination primitives shared by the services.
//!
//! Three pieces keep multi-document operations consistent without storage
//! transactions:
//!
//! - [`KeyedLocks`] serializes work on one key (an event) inside this process;
//! - [`with_retry`] re-runs a whole read-validate-write operation when a
//!   compare-and-set write loses to another writer;
//! - [`Saga`] records how to undo completed writes so a failure halfway through
//!   an operation leaves the earlier documents as they were.

use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::db::{Store, StoreResult};
use crate::error::{AppError, AppResult};
use crate::models::{Event, Project, Team};

/// Idle lock entries are pruned once the map grows past this size
const PRUNE_THRESHOLD: usize = 1024;

/// One async mutex per key, created on first use
pub struct KeyedLocks<K> {
    locks: DashMap<K, Arc<Mutex<()>>>,
}

impl<K: Eq + Hash + Clone> KeyedLocks<K> {
    pub fn new() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }

    /// Wait for the lock on `key`. Released when the guard is dropped.
    pub async fn lock(&self, key: K) -> OwnedMutexGuard<()> {
        if self.locks.len() > PRUNE_THRESHOLD {
            self.prune_idle();
        }
        let mutex = Arc::clone(self.locks.entry(key).or_default().value());
        mutex.lock_owned().await
    }

    /// Drop entries nobody holds or waits on
    pub fn prune_idle(&self) {
        self.locks.retain(|_, mutex| Arc::strong_count(mutex) > 1);
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

impl<K: Eq + Hash + Clone> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// Run `attempt` until it succeeds, fails permanently, or has lost
/// `max_attempts` compare-and-set races.
///
/// Each attempt must re-read everything it validates; nothing from a failed
/// attempt is reused.
pub async fn with_retry<T, F, Fut>(max_attempts: u32, operation: &'static str, mut attempt: F) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let mut tries = 1;
    loop {
        match attempt().await {
            Err(err) if err.is_retryable() && tries < max_attempts => {
                tracing::warn!(operation, attempt = tries, error = %err, "Concurrent update, retrying");
                tries += 1;
            }
            Err(AppError::TransientStorageConflict(detail)) => {
                tracing::warn!(operation, attempts = tries, "Giving up after repeated concurrent updates");
                return Err(AppError::TransientStorageConflict(format!(
                    "{operation} gave up after {tries} attempts: {detail}"
                )));
            }
            other => return other,
        }
    }
}

/// Undo action for a write that already succeeded
#[derive(Debug, Clone)]
pub enum Compensation {
    /// Remove a team this operation inserted
    DeleteTeam(Uuid),
    /// Put a roster back the way it was
    RestoreRoster { team_id: Uuid, members: Vec<Uuid> },
    /// Re-insert a team this operation deleted
    RecreateTeam(Box<Team>),
    /// Restore an event's membership sets from a snapshot
    RestoreEventSets(Box<Event>),
    /// Restore a participant's event list
    RestoreParticipantEvents { participant_id: Uuid, events: Vec<Uuid> },
    /// Put back a team's project link
    RestoreProjectLink { team_id: Uuid, project_id: Option<Uuid> },
    /// Hand a moved project back to its previous team
    RestoreProjectTeam { project_id: Uuid, team_id: Uuid },
    /// Re-insert a project this operation deleted
    RecreateProject(Box<Project>),
}

/// Ordered log of compensations for one operation.
///
/// Writes go through [`Saga::step`]; when a step fails, every recorded
/// compensation runs in reverse order before the error is returned.
pub struct Saga<'a> {
    operation: &'static str,
    store: &'a dyn Store,
    undo: Vec<Compensation>,
}

impl<'a> Saga<'a> {
    pub fn new(operation: &'static str, store: &'a dyn Store) -> Self {
        Self {
            operation,
            store,
            undo: Vec::new(),
        }
    }

    /// Remember how to revert the write that just succeeded
    pub fn record(&mut self, compensation: Compensation) {
        self.undo.push(compensation);
    }

    /// Await a write; on failure roll back everything recorded so far
    pub async fn step<T>(&mut self, write: impl Future<Output = StoreResult<T>>) -> AppResult<T> {
        match write.await {
            Ok(value) => Ok(value),
            Err(err) => {
                self.rollback().await;
                Err(err.into())
            }
        }
    }

    /// Roll back after a non-storage failure between steps
    pub async fn abort(&mut self, err: AppError) -> AppError {
        self.rollback().await;
        err
    }

    /// Run compensations newest first. Failures are logged, not returned.
    pub async fn rollback(&mut self) {
        while let Some(compensation) = self.undo.pop() {
            if let Err(err) = self.compensate(&compensation).await {
                tracing::error!(
                    operation = self.operation,
                    ?compensation,
                    error = %err,
                    "Compensation failed; documents may need repair"
                );
            }
        }
    }

    async fn compensate(&self, compensation: &Compensation) -> StoreResult<()> {
        match compensation {
            Compensation::DeleteTeam(team_id) => {
                if let Some(team) = self.store.team(*team_id).await? {
                    self.store.delete_team(&team).await?;
                }
            }
            Compensation::RestoreRoster { team_id, members } => {
                if let Some(mut team) = self.store.team(*team_id).await? {
                    team.members = members.clone();
                    self.store.update_team(&team).await?;
                }
            }
            Compensation::RecreateTeam(team) => {
                let mut team = team.as_ref().clone();
                team.version = 0;
                self.store.insert_team(&team).await?;
            }
            Compensation::RestoreEventSets(snapshot) => {
                if let Some(mut event) = self.store.event(snapshot.id).await? {
                    event.participants = snapshot.participants.clone();
                    event.teams = snapshot.teams.clone();
                    event.checked_in = snapshot.checked_in.clone();
                    event.projects = snapshot.projects.clone();
                    self.store.update_event(&event).await?;
                }
            }
            Compensation::RestoreParticipantEvents {
                participant_id,
                events,
            } => {
                if let Some(mut participant) = self.store.participant(*participant_id).await? {
                    participant.events = events.clone();
                    self.store.save_participant(&participant).await?;
                }
            }
            Compensation::RestoreProjectLink {
                team_id,
                project_id,
            } => {
                if let Some(mut team) = self.store.team(*team_id).await? {
                    team.project_id = *project_id;
                    self.store.update_team(&team).await?;
                }
            }
            Compensation::RestoreProjectTeam {
                project_id,
                team_id,
            } => {
                if let Some(mut project) = self.store.project(*project_id).await? {
                    project.team_id = *team_id;
                    self.store.update_project(&project).await?;
                }
            }
            Compensation::RecreateProject(project) => {
                let mut project = project.as_ref().clone();
                project.version = 0;
                self.store.insert_project(&project).await?;
            }
        }
        tracing::debug!(operation = self.operation, ?compensation, "Compensation applied");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryStore, StoreError};
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_keyed_locks_serialize_same_key() {
        let locks = Arc::new(KeyedLocks::new());
        let counter = Arc::new(Mutex::new(Vec::new()));
        let key = Uuid::new_v4();

        let guard = locks.lock(key).await;
        let waiter = {
            let locks = Arc::clone(&locks);
            let counter = Arc::clone(&counter);
            tokio::spawn(async move {
                let _guard = locks.lock(key).await;
                counter.lock().await.push("second");
            })
        };
        tokio::task::yield_now().await;
        counter.lock().await.push("first");
        drop(guard);
        waiter.await.unwrap();

        assert_eq!(*counter.lock().await, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_prune_idle_keeps_held_locks() {
        let locks = KeyedLocks::new();
        let held = locks.lock(1u32).await;
        drop(locks.lock(2u32).await);

        locks.prune_idle();
        assert_eq!(locks.len(), 1);
        drop(held);
        locks.prune_idle();
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_with_retry_gives_up_after_bound() {
        let calls = &AtomicU32::new(0);
        let result: AppResult<()> = with_retry(3, "always_stale", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::stale("team", Uuid::nil()).into())
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(matches!(result, Err(AppError::TransientStorageConflict(_))));
    }

    #[tokio::test]
    async fn test_with_retry_does_not_retry_permanent_errors() {
        let calls = &AtomicU32::new(0);
        let result: AppResult<()> = with_retry(3, "forbidden", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(AppError::Forbidden("no".to_string()))
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_saga_rolls_back_in_reverse() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let team = store
            .insert_team(&Team::solo(Uuid::new_v4(), owner, "SAGA22".to_string()))
            .await
            .unwrap();

        let mut saga = Saga::new("test", &store);
        let mut grown = team.clone();
        grown.members.push(Uuid::new_v4());
        let grown = saga.step(store.update_team(&grown)).await.unwrap();
        saga.record(Compensation::RestoreRoster {
            team_id: team.id,
            members: team.members.clone(),
        });

        // Writing with the stale version fails and triggers the rollback.
        let result = saga.step(store.update_team(&team)).await;
        assert!(result.is_err());
        assert_eq!(grown.members.len(), 2);

        let restored = store.team(team.id).await.unwrap().unwrap();
        assert_eq!(restored.members, vec![owner]);
    }
}
