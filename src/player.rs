//! Playback side: a registered client that keeps pulling the head of its own
//! queue and feeding it to an embedded video player.

use std::pin::Pin;
use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};

use tokio::sync::{broadcast, mpsc, Mutex, Notify};
use tokio::time::{sleep, Duration, Sleep};
use tracing::{debug, info, trace, warn};

use crate::api::ApiClient;
use crate::error::QueuerError;
use crate::events::QueuerEvent;
use crate::models::{PlaybackClient, PlaylistEntry};
use crate::results::ResultLog;
use crate::session::{SessionStore, PLAYBACK_CLIENT_COOKIE};
use crate::settings::Settings;

/// Embedded player state, using the IFrame API codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStatus {
    /// Not started yet (-1)
    Unstarted,
    /// Video has ended (0)
    Ended,
    /// Video is currently playing (1)
    Playing,
    /// Video is paused (2)
    Paused,
    /// Video is buffering (3)
    Buffering,
    /// Video is cued (5)
    Cued,
    Unknown,
}

impl PlaybackStatus {
    pub fn from_i32(state: i32) -> Self {
        match state {
            -1 => PlaybackStatus::Unstarted,
            0 => PlaybackStatus::Ended,
            1 => PlaybackStatus::Playing,
            2 => PlaybackStatus::Paused,
            3 => PlaybackStatus::Buffering,
            5 => PlaybackStatus::Cued,
            _ => PlaybackStatus::Unknown,
        }
    }

    pub fn to_i32(self) -> i32 {
        match self {
            PlaybackStatus::Unstarted => -1,
            PlaybackStatus::Ended => 0,
            PlaybackStatus::Playing => 1,
            PlaybackStatus::Paused => 2,
            PlaybackStatus::Buffering => 3,
            PlaybackStatus::Cued => 5,
            PlaybackStatus::Unknown => -99,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PlaybackStatus::Unstarted => "UNSTARTED",
            PlaybackStatus::Ended => "ENDED",
            PlaybackStatus::Playing => "PLAYING",
            PlaybackStatus::Paused => "PAUSED",
            PlaybackStatus::Buffering => "BUFFERING",
            PlaybackStatus::Cued => "CUED",
            PlaybackStatus::Unknown => "UNKNOWN",
        }
    }
}

/// Events coming back from the embedded player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerEvent {
    Ready,
    StateChange(PlaybackStatus),
}

/// The embedded video player being driven.
pub trait VideoPlayer: Send + Sync {
    fn load_video(&self, video_id: &str, start_seconds: u32);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Unregistered,
    Idle,
    /// A next-video request is out or its retry is pending.
    FetchingNext,
    Playing,
}

/// Outcome of one request for the next video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    Loaded(PlaylistEntry),
    /// Nothing was loaded; try again after the delay.
    RetryAfter(Duration),
    /// The backend does not know this client; registration is needed.
    Unregistered,
    /// A newer request was issued while this one was out.
    Superseded,
}

#[derive(Debug)]
struct PlayerInner {
    state: PlayerState,
    client: Option<PlaybackClient>,
    current: Option<PlaylistEntry>,
    results: ResultLog,
}

pub struct PlayerController<P: VideoPlayer> {
    api: ApiClient,
    session: Arc<SessionStore>,
    player: P,
    inner: Mutex<PlayerInner>,
    seq: AtomicU64,
    event_sender: broadcast::Sender<QueuerEvent>,
    empty_queue_retry: Duration,
    error_retry: Duration,
    stop_signal: AtomicBool,
    shutdown_notify: Notify,
}

impl<P: VideoPlayer> PlayerController<P> {
    pub fn new(api: ApiClient, session: Arc<SessionStore>, player: P, settings: &Settings) -> Self {
        let (event_tx, _) = broadcast::channel(100);
        Self {
            api,
            session,
            player,
            inner: Mutex::new(PlayerInner {
                state: PlayerState::Unregistered,
                client: None,
                current: None,
                results: ResultLog::new(),
            }),
            seq: AtomicU64::new(0),
            event_sender: event_tx,
            empty_queue_retry: settings.empty_queue_retry,
            error_retry: settings.error_retry,
            stop_signal: AtomicBool::new(false),
            shutdown_notify: Notify::new(),
        }
    }

    pub fn event_receiver(&self) -> broadcast::Receiver<QueuerEvent> {
        self.event_sender.subscribe()
    }

    pub fn player(&self) -> &P {
        &self.player
    }

    pub async fn state(&self) -> PlayerState {
        self.inner.lock().await.state
    }

    pub async fn client(&self) -> Option<PlaybackClient> {
        self.inner.lock().await.client.clone()
    }

    /// The video most recently loaded into the player.
    pub async fn current(&self) -> Option<PlaylistEntry> {
        self.inner.lock().await.current.clone()
    }

    pub async fn results(&self) -> ResultLog {
        self.inner.lock().await.results.clone()
    }

    fn send_event(&self, event: QueuerEvent) {
        if self.event_sender.send(event).is_err() {
            trace!("No event receivers");
        }
    }

    async fn log(&self, text: impl Into<String>) {
        let text = text.into();
        self.inner.lock().await.results.push(text.clone());
        self.send_event(QueuerEvent::Log(text));
    }

    async fn report(&self, context: &str, err: &QueuerError) {
        warn!(error = %err, "{}", context);
        self.log(err.describe(context)).await;
    }

    /// Load the saved identity, if any.
    pub async fn startup(&self) -> PlayerState {
        let saved = match self
            .session
            .get_cookie::<PlaybackClient>(PLAYBACK_CLIENT_COOKIE)
        {
            Ok(saved) => saved.filter(|c| !c.id.is_empty()),
            Err(e) => {
                self.report("Failed to read playback client", &e).await;
                None
            }
        };

        match saved {
            Some(client) => {
                info!("Playback client: {} ({})", client.name, client.id);
                {
                    let mut inner = self.inner.lock().await;
                    inner.client = Some(client.clone());
                    inner.state = PlayerState::Idle;
                }
                self.send_event(QueuerEvent::PlayerReady(client));
                PlayerState::Idle
            }
            None => {
                info!("No playback client registered.");
                {
                    let mut inner = self.inner.lock().await;
                    inner.client = None;
                    inner.state = PlayerState::Unregistered;
                }
                self.send_event(QueuerEvent::RegistrationRequired);
                PlayerState::Unregistered
            }
        }
    }

    /// Register under `name`, save the new identity and start up with it.
    pub async fn register(&self, name: &str) -> Result<PlaybackClient, QueuerError> {
        let name = name.trim();
        if name.is_empty() {
            self.log(QueuerError::EmptyName.to_string()).await;
            return Err(QueuerError::EmptyName);
        }

        let client = match self.api.register_client(name).await {
            Ok(client) => client,
            Err(e) => {
                self.report("Failed to register playback client", &e).await;
                return Err(e);
            }
        };
        if let Err(e) = self.session.set_cookie(PLAYBACK_CLIENT_COOKIE, &client) {
            self.report("Failed to save playback client", &e).await;
            return Err(e);
        }

        self.log("playback client registered").await;
        self.startup().await;
        Ok(client)
    }

    /// Drop the confirmed current video from the queue, then fetch the next.
    pub async fn play_next(&self) -> Advance {
        let (client, previous) = {
            let mut inner = self.inner.lock().await;
            (inner.client.clone(), inner.current.take())
        };

        if let (Some(client), Some(previous)) = (client, previous) {
            debug!("Removing finished video {}", previous.video_id);
            if let Err(e) = self
                .api
                .remove_video(&client.id, &previous.video_id)
                .await
            {
                self.report("Failed to remove video from playlist", &e).await;
            }
        }

        self.advance().await
    }

    /// Ask the backend for the head of the queue and load it.
    pub async fn advance(&self) -> Advance {
        let client = {
            let mut inner = self.inner.lock().await;
            let Some(client) = inner.client.clone() else {
                return Advance::Unregistered;
            };
            inner.state = PlayerState::FetchingNext;
            client
        };
        let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;

        let result = self.api.next_video(&client.id).await;

        if self.seq.load(Ordering::SeqCst) != seq {
            debug!("Discarding superseded next-video response #{}", seq);
            return Advance::Superseded;
        }

        match result {
            Ok(Some(entry)) => {
                info!("Loading video {} at {}s", entry.video_id, entry.start_seconds);
                self.player.load_video(&entry.video_id, entry.start_seconds);
                {
                    let mut inner = self.inner.lock().await;
                    inner.current = Some(entry.clone());
                    inner.state = PlayerState::Playing;
                }
                self.send_event(QueuerEvent::VideoLoaded(entry.clone()));
                Advance::Loaded(entry)
            }
            Ok(None) => {
                debug!("Queue empty, retrying in {:?}", self.empty_queue_retry);
                Advance::RetryAfter(self.empty_queue_retry)
            }
            Err(e @ QueuerError::ClientNotRecognized) => {
                self.report("Failed to get next video", &e).await;
                self.forget_identity().await;
                Advance::Unregistered
            }
            Err(e) => {
                self.report("Failed to get next video", &e).await;
                Advance::RetryAfter(self.error_retry)
            }
        }
    }

    async fn forget_identity(&self) {
        if let Err(e) = self.session.delete_cookie(PLAYBACK_CLIENT_COOKIE) {
            warn!(error = %e, "Failed to delete playback client cookie");
        }
        {
            let mut inner = self.inner.lock().await;
            inner.client = None;
            inner.current = None;
            inner.state = PlayerState::Unregistered;
        }
        self.send_event(QueuerEvent::RegistrationRequired);
    }

    /// Look at the head of the queue without taking it.
    pub async fn peek(&self) -> Result<Option<PlaylistEntry>, QueuerError> {
        let Some(client) = self.client().await else {
            return Ok(None);
        };
        self.api.peek_video(&client.id).await
    }

    /// Drive the player from its events until shut down or the channel closes.
    ///
    /// At most one retry timer exists at a time. `Ended` events are ignored
    /// while a retry is pending, and events that piled up during a fetch are
    /// discarded once it completes.
    pub async fn run(&self, mut events: mpsc::Receiver<PlayerEvent>) -> Result<(), QueuerError> {
        let mut retry: Option<Pin<Box<Sleep>>> = None;
        info!("Player event loop started.");

        loop {
            if self.stop_signal.load(Ordering::Relaxed) {
                break;
            }

            let outcome = tokio::select! {
                biased;
                _ = self.shutdown_notify.notified() => break,
                _ = wait_retry(&mut retry) => {
                    trace!("Retry timer fired");
                    self.advance().await
                }
                event = events.recv() => match event {
                    None => {
                        debug!("Player event channel closed");
                        break;
                    }
                    Some(PlayerEvent::Ready) if retry.is_none() => self.play_next().await,
                    Some(PlayerEvent::StateChange(PlaybackStatus::Ended)) if retry.is_none() => {
                        self.play_next().await
                    }
                    Some(event) => {
                        trace!(?event, "Ignoring player event");
                        continue;
                    }
                },
            };

            let mut dropped = 0;
            while events.try_recv().is_ok() {
                dropped += 1;
            }
            if dropped > 0 {
                debug!("Dropped {} player event(s) received during fetch", dropped);
            }

            retry = match outcome {
                Advance::RetryAfter(delay) => Some(Box::pin(sleep(delay))),
                _ => None,
            };
        }

        info!("Player event loop finished.");
        Ok(())
    }

    pub fn shutdown(&self) {
        self.stop_signal.store(true, Ordering::SeqCst);
        self.shutdown_notify.notify_one();
    }
}

async fn wait_retry(retry: &mut Option<Pin<Box<Sleep>>>) {
    match retry.as_mut() {
        Some(timer) => timer.await,
        None => std::future::pending().await,
    }
}

impl<P: VideoPlayer> std::fmt::Debug for PlayerController<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerController")
            .field("api", &self.api)
            .field("empty_queue_retry", &self.empty_queue_retry)
            .field("error_retry", &self.error_retry)
            .finish()
    }
}
