use std::fs;
use std::time::{SystemTime, UNIX_EPOCH};

use tempfile::tempdir;
use ytqueuer_client::session::Cookie;
use ytqueuer_client::{PlaybackClient, SessionStore, CONTROLLER_COOKIE, PLAYBACK_CLIENT_COOKIE};

fn living_room() -> PlaybackClient {
    PlaybackClient {
        id: "c1".to_string(),
        name: "Living Room".to_string(),
    }
}

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

#[test]
fn test_missing_cookie_is_none() {
    let store = SessionStore::in_memory();
    let value: Option<PlaybackClient> = store.get_cookie(CONTROLLER_COOKIE).unwrap();
    assert!(value.is_none());
}

#[test]
fn test_set_and_get_cookie() {
    let store = SessionStore::in_memory();
    store.set_cookie(CONTROLLER_COOKIE, &living_room()).unwrap();

    let value: Option<PlaybackClient> = store.get_cookie(CONTROLLER_COOKIE).unwrap();
    assert_eq!(value, Some(living_room()));

    let cookie = store.cookie(CONTROLLER_COOKIE).unwrap();
    assert_eq!(cookie.path, "/");
    assert!(cookie.secure);
    assert_eq!(cookie.same_site, "None");
    // One year, give or take the time the test took
    let remaining = cookie.expires - now();
    assert!(remaining > 364 * 24 * 60 * 60);
    assert!(remaining <= 365 * 24 * 60 * 60);
}

#[test]
fn test_header_value() {
    let store = SessionStore::in_memory();
    store.set_cookie(PLAYBACK_CLIENT_COOKIE, &living_room()).unwrap();
    let cookie = store.cookie(PLAYBACK_CLIENT_COOKIE).unwrap();

    let header = cookie.header_value(cookie.expires - 100);
    assert_eq!(
        header,
        r#"ytqueuer-playback_client={"id":"c1","name":"Living Room"}; Max-Age=100; Path=/; SameSite=None; Secure"#
    );
}

#[test]
fn test_delete_cookie() {
    let store = SessionStore::in_memory();
    store.set_cookie(PLAYBACK_CLIENT_COOKIE, &living_room()).unwrap();
    store.delete_cookie(PLAYBACK_CLIENT_COOKIE).unwrap();

    let value: Option<PlaybackClient> = store.get_cookie(PLAYBACK_CLIENT_COOKIE).unwrap();
    assert!(value.is_none());
    // Deleting twice is fine
    store.delete_cookie(PLAYBACK_CLIENT_COOKIE).unwrap();
}

#[test]
fn test_cookies_persist_across_opens() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("session.json");

    {
        let store = SessionStore::open(&path).unwrap();
        store.set_cookie(CONTROLLER_COOKIE, &living_room()).unwrap();
    }

    let reopened = SessionStore::open(&path).unwrap();
    let value: Option<PlaybackClient> = reopened.get_cookie(CONTROLLER_COOKIE).unwrap();
    assert_eq!(value, Some(living_room()));
}

#[test]
fn test_open_missing_file_is_empty() {
    let dir = tempdir().unwrap();
    let store = SessionStore::open(dir.path().join("nope.json")).unwrap();
    assert!(store.cookie(CONTROLLER_COOKIE).is_none());
}

#[test]
fn test_expired_cookie_reads_as_absent() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("session.json");
    let expired = Cookie {
        name: CONTROLLER_COOKIE.to_string(),
        value: r#"{"id":"c1","name":"Living Room"}"#.to_string(),
        expires: now() - 1,
        path: "/".to_string(),
        secure: true,
        same_site: "None".to_string(),
    };
    let saved = serde_json::json!({ CONTROLLER_COOKIE: expired });
    fs::write(&path, saved.to_string()).unwrap();

    let store = SessionStore::open(&path).unwrap();
    let value: Option<PlaybackClient> = store.get_cookie(CONTROLLER_COOKIE).unwrap();
    assert!(value.is_none());
}

#[test]
fn test_corrupt_cookie_value_is_an_error() {
    let store = SessionStore::in_memory();
    store.set_cookie(CONTROLLER_COOKIE, &"just a string").unwrap();
    let value = store.get_cookie::<PlaybackClient>(CONTROLLER_COOKIE);
    assert!(value.is_err());
}
