//! On-disk cache of the last login, so the CLI keeps its token between runs.
//!
//! The file holds one JSON [`AuthSession`]. It is written on login and
//! removed on logout.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use taskpulse_core::{AuthSession, Result};

/// Location of the cached session.
#[derive(Debug, Clone)]
pub struct AuthCache {
    path: PathBuf,
}

impl AuthCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `TASKPULSE_SESSION_FILE`, else `$HOME/.taskpulse/session.json`.
    pub fn from_env() -> Option<Self> {
        if let Ok(path) = std::env::var("TASKPULSE_SESSION_FILE") {
            return Some(Self::new(path));
        }
        std::env::var_os("HOME")
            .map(|home| Self::new(Path::new(&home).join(".taskpulse").join("session.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Cached session, or `None` when nothing usable is stored.
    ///
    /// A corrupt file is treated as absent.
    pub fn load(&self) -> Result<Option<AuthSession>> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_str::<AuthSession>(&data) {
            Ok(auth) if !auth.token.is_empty() => Ok(Some(auth)),
            Ok(_) => Ok(None),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Ignoring unreadable session cache");
                Ok(None)
            }
        }
    }

    pub fn save(&self, auth: &AuthSession) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(&self.path, serde_json::to_vec_pretty(auth)?)?;
        restrict_permissions(&self.path)?;
        debug!(path = %self.path.display(), username = %auth.user.username, "Session cached");
        Ok(())
    }

    /// Remove the cache. Returns whether a file was removed.
    pub fn clear(&self) -> Result<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskpulse_core::User;

    fn auth() -> AuthSession {
        AuthSession {
            token: "tok".to_string(),
            user: User {
                id: "u1".to_string(),
                username: "alice".to_string(),
                email: Some("alice@example.com".to_string()),
            },
        }
    }

    #[test]
    fn test_save_load_clear() {
        let dir = tempfile::tempdir().unwrap();
        let cache = AuthCache::new(dir.path().join("nested").join("session.json"));

        assert!(cache.load().unwrap().is_none());
        cache.save(&auth()).unwrap();
        assert_eq!(cache.load().unwrap(), Some(auth()));

        assert!(cache.clear().unwrap());
        assert!(!cache.clear().unwrap());
        assert!(cache.load().unwrap().is_none());
    }

    #[test]
    fn test_corrupt_or_empty_token_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let cache = AuthCache::new(dir.path().join("session.json"));

        fs::write(cache.path(), "not json").unwrap();
        assert!(cache.load().unwrap().is_none());

        let mut empty = auth();
        empty.token.clear();
        cache.save(&empty).unwrap();
        assert!(cache.load().unwrap().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_cache_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let cache = AuthCache::new(dir.path().join("session.json"));
        cache.save(&auth()).unwrap();
        let mode = fs::metadata(cache.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
