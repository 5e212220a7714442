//! Apply: persists a confirmed profile.
//!
//! This is the only code path that writes artists. Each request is validated,
//! serialized against other requests for the same identity, and written in a
//! single store transaction. Nothing is retried.

use crate::artist_store::{
    validate_profile, validate_target, ArtistProfile, ArtistStore, StoreError, ValidationError,
};
use crate::dedup::normalize_name;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyRequest {
    pub profile: ArtistProfile,
    #[serde(default)]
    pub exists: bool,
    #[serde(default)]
    pub matched_id: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyOutcome {
    pub id: i64,
    pub created: bool,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Persistence(#[from] StoreError),
}

impl ApplyError {
    pub fn kind(&self) -> &'static str {
        match self {
            ApplyError::Validation(_) => "validation",
            ApplyError::Persistence(StoreError::NotFound(_)) => "not_found",
            ApplyError::Persistence(StoreError::DuplicateName(_)) => "duplicate",
            ApplyError::Persistence(StoreError::Constraint(_)) => "constraint",
            ApplyError::Persistence(StoreError::Storage(_)) => "storage",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum IdentityLockKey {
    Id(i64),
    Name(String),
}

/// Hands out one async mutex per identity. Entries are dropped once nobody
/// holds or waits on them.
#[derive(Default)]
struct IdentityLocks {
    locks: Mutex<HashMap<IdentityLockKey, Arc<tokio::sync::Mutex<()>>>>,
}

/// A reference to one identity's mutex. Dropping it, even from an abandoned
/// request still waiting on the mutex, removes the map entry if it was the
/// last reference.
struct IdentityLock<'a> {
    locks: &'a IdentityLocks,
    key: IdentityLockKey,
    mutex: Arc<tokio::sync::Mutex<()>>,
}

impl IdentityLock<'_> {
    async fn lock(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.mutex.lock().await
    }
}

impl Drop for IdentityLock<'_> {
    fn drop(&mut self) {
        drop(std::mem::take(&mut self.mutex));
        self.locks.release(&self.key);
    }
}

impl IdentityLocks {
    fn acquire(&self, key: IdentityLockKey) -> IdentityLock<'_> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        let mutex = locks.entry(key.clone()).or_default().clone();
        IdentityLock {
            locks: self,
            key,
            mutex,
        }
    }

    fn release(&self, key: &IdentityLockKey) {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        // one reference in the map, none outside
        if locks.get(key).map(Arc::strong_count) == Some(1) {
            locks.remove(key);
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks.lock().unwrap().len()
    }
}

pub struct ApplyService {
    store: Arc<dyn ArtistStore>,
    locks: IdentityLocks,
}

impl ApplyService {
    pub fn new(store: Arc<dyn ArtistStore>) -> Self {
        Self {
            store,
            locks: IdentityLocks::default(),
        }
    }

    pub async fn apply(&self, mut request: ApplyRequest) -> Result<ApplyOutcome, ApplyError> {
        request.profile.name = request.profile.name.trim().to_string();
        validate_profile(&request.profile)?;
        let target = validate_target(request.exists, request.matched_id)?;

        let key = match target {
            Some(id) => IdentityLockKey::Id(id),
            None => IdentityLockKey::Name(normalize_name(&request.profile.name)),
        };
        let result = {
            let identity = self.locks.acquire(key);
            let _guard = identity.lock().await;
            self.write(target, request.profile).await
        };

        if let Err(e) = &result {
            match e {
                ApplyError::Persistence(StoreError::Storage(msg)) => {
                    warn!("Apply failed with storage error: {}", msg)
                }
                other => info!("Apply rejected: {}", other),
            }
        }
        result
    }

    async fn write(
        &self,
        target: Option<i64>,
        profile: ArtistProfile,
    ) -> Result<ApplyOutcome, ApplyError> {
        let store = self.store.clone();
        let name = profile.name.clone();

        let written = tokio::task::spawn_blocking(move || match target {
            Some(id) => store.update_partial(id, &profile).map(|_| (id, false)),
            None => store.insert_if_absent(&profile).map(|id| (id, true)),
        })
        .await
        .map_err(|e| StoreError::Storage(format!("apply task failed: {}", e)))??;

        let (id, created) = written;
        let message = if created {
            format!("Inserted artist '{}' with id {}", name, id)
        } else {
            format!("Updated artist '{}' (id {})", name, id)
        };
        info!("{}", message);
        Ok(ApplyOutcome {
            id,
            created,
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artist_store::SqliteArtistStore;
    use std::time::Duration;
    use tempfile::TempDir;

    fn service() -> (ApplyService, Arc<SqliteArtistStore>, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(SqliteArtistStore::new(dir.path().join("artists.db")).unwrap());
        (ApplyService::new(store.clone()), store, dir)
    }

    fn insert_request(name: &str) -> ApplyRequest {
        ApplyRequest {
            profile: ArtistProfile::new(name),
            exists: false,
            matched_id: None,
        }
    }

    #[tokio::test]
    async fn insert_then_update() {
        let (service, store, _dir) = service();

        let inserted = service.apply(insert_request("IU")).await.unwrap();
        assert!(inserted.created);

        let updated = service
            .apply(ApplyRequest {
                profile: ArtistProfile {
                    height_cm: Some(162),
                    ..ArtistProfile::new("IU")
                },
                exists: true,
                matched_id: Some(inserted.id),
            })
            .await
            .unwrap();
        assert!(!updated.created);
        assert_eq!(updated.id, inserted.id);
        assert_eq!(
            store.get(inserted.id).unwrap().unwrap().profile.height_cm,
            Some(162)
        );
    }

    #[tokio::test]
    async fn validation_runs_before_the_store() {
        let (service, store, _dir) = service();

        let err = service.apply(insert_request(" ")).await.unwrap_err();
        assert!(matches!(err, ApplyError::Validation(_)));

        let err = service
            .apply(ApplyRequest {
                exists: true,
                ..insert_request("IU")
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ApplyError::Validation(ValidationError::MissingMatchedId)
        ));
        assert_eq!(store.count(None).unwrap(), 0);
    }

    #[tokio::test]
    async fn second_insert_of_same_name_is_rejected() {
        let (service, store, _dir) = service();
        service.apply(insert_request("IU")).await.unwrap();

        let err = service.apply(insert_request("iu")).await.unwrap_err();
        assert_eq!(err.kind(), "duplicate");
        assert_eq!(store.count(None).unwrap(), 1);
    }

    #[tokio::test]
    async fn update_of_missing_row_is_not_found() {
        let (service, _store, _dir) = service();
        let err = service
            .apply(ApplyRequest {
                exists: true,
                matched_id: Some(77),
                ..insert_request("IU")
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ApplyError::Persistence(StoreError::NotFound(77))
        ));
    }

    #[tokio::test]
    async fn padded_name_is_stored_trimmed() {
        let (service, store, _dir) = service();
        let outcome = service.apply(insert_request("  IU  ")).await.unwrap();

        assert_eq!(
            outcome.message,
            format!("Inserted artist 'IU' with id {}", outcome.id)
        );
        assert_eq!(store.get(outcome.id).unwrap().unwrap().profile.name, "IU");
    }

    #[tokio::test]
    async fn abandoned_waiter_leaves_no_lock_entry() {
        let locks = IdentityLocks::default();
        let key = || IdentityLockKey::Name("iu".to_string());
        {
            let holder = locks.acquire(key());
            let guard = holder.lock().await;

            let waiter = async {
                let identity = locks.acquire(key());
                let _guard = identity.lock().await;
            };
            tokio::pin!(waiter);
            let waited = tokio::time::timeout(Duration::from_millis(20), &mut waiter).await;
            assert!(waited.is_err());

            // the holder finishes first while the waiter is still queued
            drop(guard);
            drop(holder);
            assert_eq!(locks.len(), 1);
        }
        assert_eq!(locks.len(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_inserts_create_one_row() {
        let (service, store, _dir) = service();
        let service = Arc::new(service);

        let tasks: Vec<_> = (0..8)
            .map(|i| {
                let service = service.clone();
                let name = if i % 2 == 0 { "IU" } else { " iu " };
                tokio::spawn(async move { service.apply(insert_request(name)).await })
            })
            .collect();

        let mut created = 0;
        for task in tasks {
            if task.await.unwrap().is_ok() {
                created += 1;
            }
        }
        assert_eq!(created, 1);
        assert_eq!(store.count(None).unwrap(), 1);
        assert_eq!(service.locks.len(), 0);
    }
}
