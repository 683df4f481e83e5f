//! On-disk vault store
//!
//! Owns the vault file. Loads take the read lock; creating and rotating take
//! the write lock for the whole decrypt-encrypt-replace cycle, so nobody can
//! read a half-rotated record.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::{info, warn};

use super::encryption::{self, EncryptedVault};
use super::secret::Secret;
use crate::error::{Error, Result};

/// Thread-safe handle to a vault file
#[derive(Clone)]
pub struct VaultStore {
    path: PathBuf,
    lock: Arc<RwLock<()>>,
}

impl VaultStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Arc::new(RwLock::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if a vault file is present
    pub async fn exists(&self) -> bool {
        tokio::fs::try_exists(&self.path).await.unwrap_or(false)
    }

    /// Read and structurally validate the vault
    pub async fn load(&self) -> Result<EncryptedVault> {
        let _guard = self.lock.read().await;
        self.read_vault().await
    }

    /// Seal a secret into a new vault file. Never overwrites an existing vault.
    pub async fn create(&self, secret: &Secret, password: &str, iterations: u32) -> Result<EncryptedVault> {
        let _guard = self.lock.write().await;

        if tokio::fs::try_exists(&self.path).await? {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} already exists; rotate the password instead", self.path.display()),
            )));
        }

        let vault = encryption::encrypt(secret.expose(), password, iterations)?;
        self.replace(&vault).await?;
        info!("[Vault] Created {} ({} iterations)", self.path.display(), iterations);
        Ok(vault)
    }

    /// Decrypt the stored secret. Key derivation runs on the blocking pool.
    pub async fn unlock(&self, password: &str) -> Result<Secret> {
        let vault = self.load().await?;
        let password = password.to_owned();

        let result = tokio::task::spawn_blocking(move || encryption::decrypt(&vault, &password))
            .await
            .map_err(|e| Error::Io(io::Error::other(e)))?;

        match &result {
            Ok(_) => info!("[Vault] Unlocked {}", self.path.display()),
            Err(Error::Authentication) => warn!("[Vault] Unlock failed for {}", self.path.display()),
            Err(_) => {}
        }
        result
    }

    /// Re-encrypt under a new password and atomically replace the file
    pub async fn rotate_password(&self, old_password: &str, new_password: &str, iterations: u32) -> Result<()> {
        let _guard = self.lock.write().await;

        let vault = self.read_vault().await?;
        let old_password = old_password.to_owned();
        let new_password = new_password.to_owned();
        let rotated = tokio::task::spawn_blocking(move || {
            encryption::rotate(&vault, &old_password, &new_password, iterations)
        })
        .await
        .map_err(|e| Error::Io(io::Error::other(e)))??;

        self.replace(&rotated).await?;
        info!("[Vault] Rotated password for {} ({} iterations)", self.path.display(), iterations);
        Ok(())
    }

    async fn read_vault(&self) -> Result<EncryptedVault> {
        let json = tokio::fs::read_to_string(&self.path).await?;
        EncryptedVault::from_json(&json)
    }

    /// Write to a sibling temp file, fsync, then rename over the vault.
    /// The temp file is removed if any step fails.
    async fn replace(&self, vault: &EncryptedVault) -> Result<()> {
        let json = vault.to_json()?;
        let tmp = self.temp_path();

        let written = async {
            let mut file = tokio::fs::File::create(&tmp).await?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                file.set_permissions(std::fs::Permissions::from_mode(0o600)).await?;
            }
            file.write_all(json.as_bytes()).await?;
            file.sync_all().await?;
            drop(file);
            tokio::fs::rename(&tmp, &self.path).await
        }
        .await;

        if let Err(e) = written {
            if let Err(cleanup) = tokio::fs::remove_file(&tmp).await {
                if cleanup.kind() != io::ErrorKind::NotFound {
                    warn!("[Vault] Could not remove {}: {}", tmp.display(), cleanup);
                }
            }
            return Err(e.into());
        }
        Ok(())
    }

    /// `<file name>.<random>.tmp` next to the vault, never the vault itself
    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "vault".to_string());
        let suffix = hex::encode(rand::random::<[u8; 8]>());
        self.path.with_file_name(format!("{}.{}.tmp", name, suffix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::encryption::MIN_ITERATIONS;

    fn store_in(dir: &tempfile::TempDir) -> VaultStore {
        VaultStore::new(dir.path().join("vault.json"))
    }

    #[tokio::test]
    async fn test_create_and_unlock() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert!(!store.exists().await);

        store.create(&Secret::new(vec![0xaa; 32]), "pw", MIN_ITERATIONS).await.unwrap();
        assert!(store.exists().await);

        let secret = store.unlock("pw").await.unwrap();
        assert_eq!(secret.expose(), &[0xaa_u8; 32]);
    }

    #[tokio::test]
    async fn test_file_never_contains_plaintext() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.create(&Secret::new(vec![0xaa; 32]), "pw", MIN_ITERATIONS).await.unwrap();

        let contents = tokio::fs::read_to_string(store.path()).await.unwrap();
        assert!(!contents.contains(&hex::encode([0xaa_u8; 32])));
    }

    #[tokio::test]
    async fn test_create_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.create(&Secret::new(vec![1; 32]), "pw", MIN_ITERATIONS).await.unwrap();

        let second = store.create(&Secret::new(vec![2; 32]), "pw", MIN_ITERATIONS).await;
        assert!(matches!(second, Err(Error::Io(e)) if e.kind() == io::ErrorKind::AlreadyExists));
        assert_eq!(store.unlock("pw").await.unwrap().expose(), &[1u8; 32]);
    }

    #[tokio::test]
    async fn test_unlock_wrong_password() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.create(&Secret::new(vec![1; 32]), "correct-horse", MIN_ITERATIONS).await.unwrap();

        assert!(matches!(store.unlock("wrong-horse").await, Err(Error::Authentication)));
    }

    #[tokio::test]
    async fn test_rotate_password() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.create(&Secret::new(vec![5; 32]), "old", MIN_ITERATIONS).await.unwrap();

        store.rotate_password("old", "new", MIN_ITERATIONS).await.unwrap();

        assert!(matches!(store.unlock("old").await, Err(Error::Authentication)));
        assert_eq!(store.unlock("new").await.unwrap().expose(), &[5u8; 32]);

        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(entries, ["vault.json"]);
    }

    #[test]
    fn test_temp_path_is_unique_per_vault() {
        let dir = tempfile::tempdir().unwrap();
        let json = VaultStore::new(dir.path().join("vault.json")).temp_path();
        let toml = VaultStore::new(dir.path().join("vault.toml")).temp_path();
        assert_ne!(json, toml);
        assert_eq!(json.parent(), Some(dir.path()));

        let store = VaultStore::new(dir.path().join("keys.tmp"));
        let tmp = store.temp_path();
        assert_ne!(tmp.as_path(), store.path());
        assert!(tmp.file_name().unwrap().to_str().unwrap().starts_with("keys.tmp."));
    }

    #[tokio::test]
    async fn test_vault_named_like_a_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = VaultStore::new(dir.path().join("keys.tmp"));
        store.create(&Secret::new(vec![3; 32]), "old", MIN_ITERATIONS).await.unwrap();
        store.rotate_password("old", "new", MIN_ITERATIONS).await.unwrap();

        assert_eq!(store.unlock("new").await.unwrap().expose(), &[3u8; 32]);
    }

    #[tokio::test]
    async fn test_failed_write_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        // Renaming a file over a non-empty directory fails after the temp file is written
        let target = dir.path().join("vault.json");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("keep"), b"x").unwrap();
        let store = VaultStore::new(target.clone());

        let vault = encryption::encrypt(&[1; 32], "pw", MIN_ITERATIONS).unwrap();
        assert!(matches!(store.replace(&vault).await, Err(Error::Io(_))));

        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(entries, ["vault.json"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_unlock_during_rotation_sees_one_whole_vault() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.create(&Secret::new(vec![7; 32]), "old", MIN_ITERATIONS).await.unwrap();

        let (rotated, with_old, with_new) = tokio::join!(
            store.rotate_password("old", "new", MIN_ITERATIONS),
            store.unlock("old"),
            store.unlock("new"),
        );
        rotated.unwrap();

        // Each unlock read either the old record or the new one, never a torn file
        for result in [with_old, with_new] {
            match result {
                Ok(secret) => assert_eq!(secret.expose(), &[7u8; 32]),
                Err(Error::Authentication) => {}
                Err(e) => panic!("unexpected error: {}", e),
            }
        }
        assert_eq!(store.unlock("new").await.unwrap().expose(), &[7u8; 32]);
    }

    #[tokio::test]
    async fn test_rotate_with_wrong_password_leaves_vault_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let original = store.create(&Secret::new(vec![5; 32]), "old", MIN_ITERATIONS).await.unwrap();

        let result = store.rotate_password("guess", "new", MIN_ITERATIONS).await;
        assert!(matches!(result, Err(Error::Authentication)));
        assert_eq!(store.load().await.unwrap(), original);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        tokio::fs::write(store.path(), "{\"version\":1}").await.unwrap();

        assert!(matches!(store.load().await, Err(Error::Format(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_vault_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.create(&Secret::new(vec![1; 32]), "pw", MIN_ITERATIONS).await.unwrap();

        let mode = tokio::fs::metadata(store.path()).await.unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
