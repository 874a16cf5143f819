use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

use crate::error::QueuerError;

/// Cookie holding the controller's selected playback client.
pub const CONTROLLER_COOKIE: &str = "ytqueuer-controller";
/// Cookie holding the identity of this playback client.
pub const PLAYBACK_CLIENT_COOKIE: &str = "ytqueuer-playback_client";

const COOKIE_MAX_AGE: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// A stored cookie. `value` is the JSON text of whatever was saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    /// Expiry as seconds since the Unix epoch.
    pub expires: u64,
    pub path: String,
    pub secure: bool,
    pub same_site: String,
}

impl Cookie {
    fn new(name: &str, value: String, now: u64) -> Self {
        Self {
            name: name.to_string(),
            value,
            expires: now + COOKIE_MAX_AGE.as_secs(),
            path: "/".to_string(),
            secure: true,
            same_site: "None".to_string(),
        }
    }

    pub fn is_expired(&self, now: u64) -> bool {
        self.expires <= now
    }

    /// Render as a `Set-Cookie` header value.
    pub fn header_value(&self, now: u64) -> String {
        let mut header = format!(
            "{}={}; Max-Age={}; Path={}; SameSite={}",
            self.name,
            self.value,
            self.expires.saturating_sub(now),
            self.path,
            self.same_site
        );
        if self.secure {
            header.push_str("; Secure");
        }
        header
    }
}

/// Client-side identity persistence: named cookies with JSON values, kept in
/// memory and mirrored to a JSON file when one is configured.
#[derive(Debug)]
pub struct SessionStore {
    path: Option<PathBuf>,
    cookies: Mutex<HashMap<String, Cookie>>,
}

impl SessionStore {
    /// Open the store backed by `path`, loading any cookies already saved
    /// there. A missing file is an empty store.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, QueuerError> {
        let path = path.as_ref().to_path_buf();
        let cookies = match fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => HashMap::new(),
            Ok(text) => serde_json::from_str(&text)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };
        debug!("Loaded {} cookie(s) from {}", cookies.len(), path.display());

        Ok(Self {
            path: Some(path),
            cookies: Mutex::new(cookies),
        })
    }

    pub fn in_memory() -> Self {
        Self {
            path: None,
            cookies: Mutex::new(HashMap::new()),
        }
    }

    pub fn set_cookie<T: Serialize>(&self, name: &str, value: &T) -> Result<(), QueuerError> {
        let data = serde_json::to_string(value)?;
        let cookie = Cookie::new(name, data, unix_now());
        let mut cookies = self.lock();
        cookies.insert(name.to_string(), cookie);
        self.persist(&cookies)
    }

    /// Read and decode a cookie. Missing and expired cookies are `None`.
    pub fn get_cookie<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, QueuerError> {
        let now = unix_now();
        let cookies = self.lock();
        match cookies.get(name) {
            Some(cookie) if cookie.is_expired(now) => {
                debug!("Cookie {} expired", name);
                Ok(None)
            }
            Some(cookie) if cookie.value.is_empty() => Ok(None),
            Some(cookie) => Ok(Some(serde_json::from_str(&cookie.value)?)),
            None => Ok(None),
        }
    }

    pub fn delete_cookie(&self, name: &str) -> Result<(), QueuerError> {
        let mut cookies = self.lock();
        if cookies.remove(name).is_some() {
            debug!("Deleted cookie {}", name);
        }
        self.persist(&cookies)
    }

    pub fn cookie(&self, name: &str) -> Option<Cookie> {
        self.lock().get(name).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Cookie>> {
        match self.cookies.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("Cookie store mutex poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn persist(&self, cookies: &HashMap<String, Cookie>) -> Result<(), QueuerError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let now = unix_now();
        let live: HashMap<&String, &Cookie> =
            cookies.iter().filter(|(_, c)| !c.is_expired(now)).collect();
        fs::write(path, serde_json::to_string_pretty(&live)?)?;
        Ok(())
    }
}

pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
