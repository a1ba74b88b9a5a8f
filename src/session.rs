use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

const SESSION_DIR: &str = "soccer_terminal";
const SESSION_FILE: &str = "session.json";

/// The signed-in identity plus the opaque bearer token the backend minted for
/// it. Created at sign-in/sign-up success, destroyed at sign-out; passed
/// explicitly to every network call site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub token: String,
}

/// Reads the stored session. Every failure mode (no storage dir, unreadable
/// file, bad JSON) degrades silently to None: callers treat that as
/// unauthenticated and carry on, letting the backend answer with a 401-class
/// status.
pub fn load() -> Option<Session> {
    let path = session_path()?;
    load_from(&path)
}

pub fn load_from(path: &Path) -> Option<Session> {
    let raw = fs::read_to_string(path).ok()?;
    serde_json::from_str(&raw).ok()
}

pub fn store(session: &Session) {
    let Some(path) = session_path() else {
        return;
    };
    store_to(&path, session);
}

pub fn store_to(path: &Path, session: &Session) {
    let Some(dir) = path.parent() else {
        return;
    };
    let _ = fs::create_dir_all(dir);
    let Ok(json) = serde_json::to_string(session) else {
        return;
    };
    let tmp = path.with_extension("json.tmp");
    if fs::write(&tmp, json).is_ok() {
        let _ = fs::rename(&tmp, path);
    }
}

pub fn clear() {
    let Some(path) = session_path() else {
        return;
    };
    clear_at(&path);
}

pub fn clear_at(path: &Path) {
    let _ = fs::remove_file(path);
}

fn session_path() -> Option<PathBuf> {
    // Explicit override first, mostly for scripted runs.
    if let Ok(base) = std::env::var("SOCCER_SESSION_DIR") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join(SESSION_FILE));
        }
    }
    if let Ok(base) = std::env::var("XDG_STATE_HOME") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join(SESSION_DIR).join(SESSION_FILE));
        }
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(
        PathBuf::from(home)
            .join(".local")
            .join("state")
            .join(SESSION_DIR)
            .join(SESSION_FILE),
    )
}
