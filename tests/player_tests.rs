use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;
use tokio::sync::mpsc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use ytqueuer_client::{
    Advance, ApiClient, PlaybackClient, PlaybackStatus, PlayerController, PlayerEvent, PlayerState,
    QueuerError, QueuerEvent, SessionStore, Settings, VideoPlayer, PLAYBACK_CLIENT_COOKIE,
};

#[derive(Default, Clone)]
struct RecordingPlayer {
    loaded: Arc<Mutex<Vec<(String, u32)>>>,
}

impl RecordingPlayer {
    fn loaded(&self) -> Vec<(String, u32)> {
        self.loaded.lock().unwrap().clone()
    }
}

impl VideoPlayer for RecordingPlayer {
    fn load_video(&self, video_id: &str, start_seconds: u32) {
        self.loaded
            .lock()
            .unwrap()
            .push((video_id.to_string(), start_seconds));
    }
}

fn settings(server: &MockServer) -> Settings {
    Settings {
        base_url: server.uri(),
        ..Settings::default()
    }
}

fn living_room() -> PlaybackClient {
    PlaybackClient {
        id: "c1".to_string(),
        name: "Living Room".to_string(),
    }
}

fn registered_session() -> Arc<SessionStore> {
    let session = Arc::new(SessionStore::in_memory());
    session
        .set_cookie(PLAYBACK_CLIENT_COOKIE, &living_room())
        .unwrap();
    session
}

fn player_with(
    server: &MockServer,
    session: Arc<SessionStore>,
    settings: &Settings,
) -> (PlayerController<RecordingPlayer>, RecordingPlayer) {
    let api = ApiClient::new(&server.uri(), Duration::from_secs(5), None).unwrap();
    let recorder = RecordingPlayer::default();
    let player = PlayerController::new(api, session, recorder.clone(), settings);
    (player, recorder)
}

async fn requests(server: &MockServer, verb: &str, p: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.method.as_str() == verb && r.url.path() == p)
        .count()
}

async fn mount_next(server: &MockServer, video_id: &str) {
    Mock::given(method("GET"))
        .and(path("/playlists/c1/next"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "video_id": video_id,
            "title": "A video",
            "start_seconds": 30
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_startup_without_identity() {
    let server = MockServer::start().await;
    let (player, _) = player_with(&server, Arc::new(SessionStore::in_memory()), &settings(&server));
    let mut events = player.event_receiver();

    assert_eq!(player.startup().await, PlayerState::Unregistered);
    assert!(matches!(
        events.recv().await.unwrap(),
        QueuerEvent::RegistrationRequired
    ));
    assert!(player.client().await.is_none());
}

#[tokio::test]
async fn test_startup_with_identity() {
    let server = MockServer::start().await;
    let (player, _) = player_with(&server, registered_session(), &settings(&server));
    let mut events = player.event_receiver();

    assert_eq!(player.startup().await, PlayerState::Idle);
    match events.recv().await.unwrap() {
        QueuerEvent::PlayerReady(client) => assert_eq!(client, living_room()),
        other => panic!("unexpected event: {:?}", other),
    }
}

#[tokio::test]
async fn test_register_with_empty_name() {
    let server = MockServer::start().await;
    let (player, _) = player_with(&server, Arc::new(SessionStore::in_memory()), &settings(&server));

    let err = player.register("   ").await.unwrap_err();
    assert!(matches!(err, QueuerError::EmptyName));
    assert_eq!(player.results().await.latest(), Some("name cannot be empty"));
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn test_register() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/pbcs/register"))
        .and(query_param("name", "Living Room"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": "c1", "name": "Living Room"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let session = Arc::new(SessionStore::in_memory());
    let (player, _) = player_with(&server, session.clone(), &settings(&server));
    player.startup().await;

    let client = player.register("Living Room").await.unwrap();
    assert_eq!(client, living_room());
    assert_eq!(player.state().await, PlayerState::Idle);
    assert_eq!(
        player.results().await.latest(),
        Some("playback client registered")
    );
    let saved: Option<PlaybackClient> = session.get_cookie(PLAYBACK_CLIENT_COOKIE).unwrap();
    assert_eq!(saved, Some(client));
}

#[tokio::test]
async fn test_first_play_next_removes_nothing() {
    let server = MockServer::start().await;
    mount_next(&server, "ABC123").await;
    let (player, recorder) = player_with(&server, registered_session(), &settings(&server));
    player.startup().await;

    let outcome = player.play_next().await;
    assert!(matches!(outcome, Advance::Loaded(ref e) if e.video_id == "ABC123"));
    assert_eq!(recorder.loaded(), vec![("ABC123".to_string(), 30)]);
    assert_eq!(player.state().await, PlayerState::Playing);
    assert_eq!(requests(&server, "DELETE", "/playlists/c1/ABC123").await, 0);
}

#[tokio::test]
async fn test_play_next_removes_finished_video() {
    let server = MockServer::start().await;
    mount_next(&server, "ABC123").await;
    Mock::given(method("DELETE"))
        .and(path("/playlists/c1/ABC123"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    let (player, recorder) = player_with(&server, registered_session(), &settings(&server));
    player.startup().await;

    player.play_next().await;
    player.play_next().await;
    assert_eq!(recorder.loaded().len(), 2);
}

#[tokio::test]
async fn test_failed_removal_still_advances() {
    let server = MockServer::start().await;
    mount_next(&server, "ABC123").await;
    Mock::given(method("DELETE"))
        .and(path("/playlists/c1/ABC123"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let (player, recorder) = player_with(&server, registered_session(), &settings(&server));
    player.startup().await;

    player.play_next().await;
    let outcome = player.play_next().await;
    assert!(matches!(outcome, Advance::Loaded(_)));
    assert_eq!(recorder.loaded().len(), 2);
    let log = player.results().await;
    assert!(log
        .entries()
        .any(|l| l == "Failed to remove video from playlist: (500)"));
}

#[tokio::test]
async fn test_empty_queue_retries_after_short_delay() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/playlists/c1/next"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;
    let (player, recorder) = player_with(&server, registered_session(), &settings(&server));
    player.startup().await;

    assert_eq!(
        player.advance().await,
        Advance::RetryAfter(Duration::from_secs(2))
    );
    // Still waiting on the queue until the retry lands
    assert_eq!(player.state().await, PlayerState::FetchingNext);
    assert!(recorder.loaded().is_empty());
}

#[tokio::test]
async fn test_backend_error_retries_after_long_delay() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/playlists/c1/next"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "oops"})))
        .mount(&server)
        .await;
    let (player, _) = player_with(&server, registered_session(), &settings(&server));
    player.startup().await;

    assert_eq!(
        player.advance().await,
        Advance::RetryAfter(Duration::from_secs(10))
    );
    assert_eq!(player.state().await, PlayerState::FetchingNext);
    assert_eq!(
        player.results().await.latest(),
        Some("Failed to get next video: (500) oops")
    );
}

#[tokio::test]
async fn test_unknown_client_resets_identity() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/playlists/c1/next"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let session = registered_session();
    let (player, _) = player_with(&server, session.clone(), &settings(&server));
    player.startup().await;
    let mut events = player.event_receiver();

    assert_eq!(player.advance().await, Advance::Unregistered);
    assert_eq!(player.state().await, PlayerState::Unregistered);
    assert!(player.client().await.is_none());
    assert_eq!(
        player.results().await.latest(),
        Some("Failed to get next video: Playback client not recognized by the backend")
    );
    assert!(session.cookie(PLAYBACK_CLIENT_COOKIE).is_none());
    assert!(matches!(events.recv().await.unwrap(), QueuerEvent::Log(_)));
    assert!(matches!(
        events.recv().await.unwrap(),
        QueuerEvent::RegistrationRequired
    ));
}

#[tokio::test]
async fn test_advance_without_identity_sends_nothing() {
    let server = MockServer::start().await;
    let (player, _) = player_with(&server, Arc::new(SessionStore::in_memory()), &settings(&server));
    player.startup().await;

    assert_eq!(player.advance().await, Advance::Unregistered);
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn test_older_response_is_superseded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/playlists/c1/next"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"video_id": "ABC123"}))
                .set_delay(Duration::from_millis(100)),
        )
        .mount(&server)
        .await;
    let (player, recorder) = player_with(&server, registered_session(), &settings(&server));
    player.startup().await;

    let (first, second) = tokio::join!(player.advance(), player.advance());
    assert_eq!(first, Advance::Superseded);
    assert!(matches!(second, Advance::Loaded(_)));
    assert_eq!(recorder.loaded().len(), 1);
}

#[tokio::test]
async fn test_peek() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/playlists/c1/peek"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;
    let (player, _) = player_with(&server, registered_session(), &settings(&server));
    player.startup().await;

    assert!(player.peek().await.unwrap().is_none());
}

#[tokio::test]
async fn test_run_retries_until_a_video_arrives() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/playlists/c1/next"))
        .respond_with(ResponseTemplate::new(204))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    mount_next(&server, "ABC123").await;

    let settings = Settings {
        empty_queue_retry: Duration::from_millis(50),
        ..settings(&server)
    };
    let (player, recorder) = player_with(&server, registered_session(), &settings);
    let player = Arc::new(player);
    player.startup().await;

    let (tx, rx) = mpsc::channel(16);
    let runner = player.clone();
    let run = tokio::spawn(async move { runner.run(rx).await });

    tx.send(PlayerEvent::Ready).await.unwrap();
    tokio::time::sleep(Duration::from_millis(500)).await;

    assert_eq!(recorder.loaded(), vec![("ABC123".to_string(), 30)]);
    assert_eq!(requests(&server, "GET", "/playlists/c1/next").await, 3);

    player.shutdown();
    run.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_run_ignores_ended_while_retry_pending() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/playlists/c1/next"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let (player, _) = player_with(&server, registered_session(), &settings(&server));
    let player = Arc::new(player);
    player.startup().await;

    let (tx, rx) = mpsc::channel(16);
    let runner = player.clone();
    let run = tokio::spawn(async move { runner.run(rx).await });

    tx.send(PlayerEvent::Ready).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    for _ in 0..3 {
        tx.send(PlayerEvent::StateChange(PlaybackStatus::Ended))
            .await
            .unwrap();
    }
    tx.send(PlayerEvent::StateChange(PlaybackStatus::Paused))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    // The 10s retry is still pending; nothing else went out
    assert_eq!(requests(&server, "GET", "/playlists/c1/next").await, 1);

    player.shutdown();
    run.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_run_stops_when_channel_closes() {
    let server = MockServer::start().await;
    let (player, _) = player_with(&server, registered_session(), &settings(&server));

    let (tx, rx) = mpsc::channel(1);
    drop(tx);
    player.run(rx).await.unwrap();
}
