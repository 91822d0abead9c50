//! Device-local private-key store.
//!
//! One PKCS#8 PEM file per user under an injected root directory, mode
//! 0600 on unix.  The directory is exclusively owned by this device;
//! nothing stored here is ever serialised over a network boundary.

use std::fs;
use std::path::{Path, PathBuf};

use rsa::RsaPrivateKey;
use zeroize::Zeroizing;

use lp_crypto::keypair;
use lp_proto::envelope::UserId;

use crate::error::ClientError;

#[derive(Debug, Clone)]
pub struct LocalKeyStore {
    root: PathBuf,
}

impl LocalKeyStore {
    /// Open the store rooted at `root`, creating the directory if needed.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, ClientError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn key_path(&self, user_id: UserId) -> PathBuf {
        self.root.join(format!("user-{user_id}-private.pem"))
    }

    /// Persist the private half for `user_id`.  Overwrites any prior key.
    pub fn save(&self, user_id: UserId, key: &RsaPrivateKey) -> Result<(), ClientError> {
        let pem = keypair::private_key_to_pem(key)?;
        let path = self.key_path(user_id);
        fs::write(&path, pem.as_bytes())?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o600))?;
        }
        tracing::debug!(user_id, path = %path.display(), "private key persisted");
        Ok(())
    }

    /// `Ok(None)` when no key has been generated on this device.
    pub fn load(&self, user_id: UserId) -> Result<Option<RsaPrivateKey>, ClientError> {
        let path = self.key_path(user_id);
        if !path.exists() {
            return Ok(None);
        }
        let pem = Zeroizing::new(fs::read_to_string(&path)?);
        Ok(Some(keypair::private_key_from_pem(&pem)?))
    }

    /// Existence query, no parsing.
    pub fn contains(&self, user_id: UserId) -> bool {
        self.key_path(user_id).exists()
    }

    /// Remove one user's key.  Missing keys are a no-op.
    pub fn remove(&self, user_id: UserId) -> Result<(), ClientError> {
        let path = self.key_path(user_id);
        if path.exists() {
            fs::remove_file(&path)?;
            tracing::debug!(user_id, "private key removed");
        }
        Ok(())
    }

    /// Logout wipe: delete every stored private key.
    pub fn clear(&self) -> Result<(), ClientError> {
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "pem") {
                fs::remove_file(path)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lp_crypto::RsaKeyPair;
    use std::sync::OnceLock;
    use tempfile::tempdir;

    fn test_pair() -> &'static RsaKeyPair {
        static PAIR: OnceLock<RsaKeyPair> = OnceLock::new();
        PAIR.get_or_init(|| RsaKeyPair::generate_with_bits(1024).unwrap())
    }

    #[test]
    fn save_load_round_trip() {
        let dir = tempdir().unwrap();
        let store = LocalKeyStore::open(dir.path()).unwrap();

        assert!(!store.contains(1));
        assert!(store.load(1).unwrap().is_none());

        store.save(1, test_pair().private_key()).unwrap();
        assert!(store.contains(1));
        let loaded = store.load(1).unwrap().unwrap();
        assert_eq!(rsa::RsaPublicKey::from(&loaded), *test_pair().public_key());
    }

    #[test]
    fn keys_are_scoped_per_user() {
        let dir = tempdir().unwrap();
        let store = LocalKeyStore::open(dir.path()).unwrap();
        store.save(1, test_pair().private_key()).unwrap();
        assert!(!store.contains(2));
        assert!(store.load(2).unwrap().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn key_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempdir().unwrap();
        let store = LocalKeyStore::open(dir.path()).unwrap();
        store.save(1, test_pair().private_key()).unwrap();

        let mode = fs::metadata(dir.path().join("user-1-private.pem"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn remove_and_clear() {
        let dir = tempdir().unwrap();
        let store = LocalKeyStore::open(dir.path()).unwrap();
        store.save(1, test_pair().private_key()).unwrap();
        store.save(2, test_pair().private_key()).unwrap();

        store.remove(1).unwrap();
        assert!(!store.contains(1));
        store.remove(1).unwrap(); // second removal is a no-op

        store.clear().unwrap();
        assert!(!store.contains(2));
    }
}
