//! First-use key bootstrap with a single-flight guard.
//!
//! `bootstrap` is idempotent: when the device already holds a private key
//! for the user it does nothing.  Otherwise exactly one concurrent caller
//! generates the pair, persists the private half locally, and publishes
//! the public half to the directory; late callers wait on the per-user
//! guard and then observe the stored key instead of generating a second
//! pair.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use lp_crypto::keypair::{RsaKeyPair, MODULUS_BITS};
use lp_proto::envelope::UserId;

use crate::error::ClientError;
use crate::key_store::LocalKeyStore;
use crate::remote::Directory;

/// Device-side keypair lifecycle manager.  Cheap to clone; clones share
/// the single-flight state.
#[derive(Clone)]
pub struct KeyManager {
    store: LocalKeyStore,
    inflight: Arc<Mutex<HashMap<UserId, Arc<Mutex<()>>>>>,
    modulus_bits: usize,
}

impl KeyManager {
    pub fn new(store: LocalKeyStore) -> Self {
        Self {
            store,
            inflight: Arc::new(Mutex::new(HashMap::new())),
            modulus_bits: MODULUS_BITS,
        }
    }

    /// Override the modulus size.  Tests use small keys; production code
    /// keeps the default.
    pub fn with_modulus_bits(mut self, bits: usize) -> Self {
        self.modulus_bits = bits;
        self
    }

    pub fn key_store(&self) -> &LocalKeyStore {
        &self.store
    }

    /// Does this device hold a private key for `user_id`?
    pub fn has_key_pair(&self, user_id: UserId) -> bool {
        self.store.contains(user_id)
    }

    /// Ensure `user_id` has a keypair: generate, persist, and publish on
    /// first use; a no-op afterwards.  Concurrent calls for the same user
    /// collapse into exactly one generation.
    pub async fn bootstrap<D>(&self, user_id: UserId, directory: &D) -> Result<(), ClientError>
    where
        D: Directory + ?Sized,
    {
        if self.store.contains(user_id) {
            return Ok(());
        }

        let guard = {
            let mut map = self.inflight.lock().await;
            map.entry(user_id)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        let _flight = guard.lock().await;

        // Re-check under the guard: the winner may have finished while we
        // waited.
        if self.store.contains(user_id) {
            return Ok(());
        }

        tracing::info!(user_id, "generating keypair");
        let bits = self.modulus_bits;
        let pair = tokio::task::spawn_blocking(move || RsaKeyPair::generate_with_bits(bits)).await??;

        self.store.save(user_id, pair.private_key())?;
        directory.publish_key(user_id, &pair.public_jwk()).await?;
        tracing::info!(user_id, "public key published");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use lp_crypto::keypair::PublicKeyJwk;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;
    use tokio::sync::Mutex as AsyncMutex;

    #[derive(Default)]
    struct CountingDirectory {
        published: AsyncMutex<HashMap<UserId, PublicKeyJwk>>,
        publishes: AtomicUsize,
    }

    #[async_trait]
    impl Directory for CountingDirectory {
        async fn fetch_key(&self, user_id: UserId) -> Result<Option<PublicKeyJwk>, ClientError> {
            Ok(self.published.lock().await.get(&user_id).cloned())
        }

        async fn publish_key(&self, user_id: UserId, key: &PublicKeyJwk) -> Result<(), ClientError> {
            self.publishes.fetch_add(1, Ordering::SeqCst);
            self.published.lock().await.insert(user_id, key.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn bootstrap_generates_persists_and_publishes_once() {
        let dir = tempdir().unwrap();
        let manager = KeyManager::new(LocalKeyStore::open(dir.path()).unwrap()).with_modulus_bits(1024);
        let directory = CountingDirectory::default();

        assert!(!manager.has_key_pair(1));
        manager.bootstrap(1, &directory).await.unwrap();

        assert!(manager.has_key_pair(1));
        assert!(directory.fetch_key(1).await.unwrap().is_some());
        assert_eq!(directory.publishes.load(Ordering::SeqCst), 1);

        // Second call is a no-op.
        manager.bootstrap(1, &directory).await.unwrap();
        assert_eq!(directory.publishes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn published_key_matches_the_stored_private_half() {
        let dir = tempdir().unwrap();
        let manager = KeyManager::new(LocalKeyStore::open(dir.path()).unwrap()).with_modulus_bits(1024);
        let directory = CountingDirectory::default();
        manager.bootstrap(1, &directory).await.unwrap();

        let private = manager.key_store().load(1).unwrap().unwrap();
        let published = directory.fetch_key(1).await.unwrap().unwrap();
        assert_eq!(
            published.to_public_key().unwrap(),
            rsa::RsaPublicKey::from(&private)
        );
    }

    #[tokio::test]
    async fn concurrent_bootstraps_collapse_into_one_generation() {
        let dir = tempdir().unwrap();
        let manager = KeyManager::new(LocalKeyStore::open(dir.path()).unwrap()).with_modulus_bits(1024);
        let directory = Arc::new(CountingDirectory::default());

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let manager = manager.clone();
            let directory = directory.clone();
            tasks.push(tokio::spawn(async move { manager.bootstrap(1, directory.as_ref()).await }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(directory.publishes.load(Ordering::SeqCst), 1);
        assert!(manager.has_key_pair(1));
    }

    #[tokio::test]
    async fn distinct_users_bootstrap_independently() {
        let dir = tempdir().unwrap();
        let manager = KeyManager::new(LocalKeyStore::open(dir.path()).unwrap()).with_modulus_bits(1024);
        let directory = CountingDirectory::default();

        manager.bootstrap(1, &directory).await.unwrap();
        manager.bootstrap(2, &directory).await.unwrap();

        assert_eq!(directory.publishes.load(Ordering::SeqCst), 2);
        assert_ne!(
            directory.fetch_key(1).await.unwrap().unwrap(),
            directory.fetch_key(2).await.unwrap().unwrap()
        );
    }
}
