mod api;
pub use api::ApiClient;
mod error;
pub use error::QueuerError;
mod events;
pub use events::QueuerEvent;
pub mod models;
pub use models::{
    AddPosition, CecCommand, CecConfig, CecPowerStatus, PlaybackClient, PlaylistEntry, PowerKind,
    WolConfig,
};
pub mod player;
pub use player::{Advance, PlaybackStatus, PlayerController, PlayerEvent, PlayerState, VideoPlayer};
pub mod power;
pub use power::{CecForm, PowerSettingsPanel, PowerTab, QuickAction, WolForm};
pub mod results;
pub use results::{ResultLog, RESULT_LOG_SIZE};
pub mod session;
pub use session::{SessionStore, CONTROLLER_COOKIE, PLAYBACK_CLIENT_COOKIE};
pub mod settings;
pub use settings::{Settings, SETTINGS};
mod state;
pub use state::AppState;
pub mod utils;
pub mod view;

use futures::future;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tokio::sync::{broadcast, Notify, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tracing::{debug, info, trace, warn};

use crate::utils::extract_video_id;

/// Result of one pass of the playback-client watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Completed,
    /// Another refresh was still in flight.
    Skipped,
    Failed,
}

/// Controller side of the queue: tracks the available playback clients, the
/// selected client's playlist and its power settings.
///
/// All state lives in a single [`AppState`] behind a `RwLock`; the lock is
/// never held across a backend request. Failures are appended to the result
/// log as well as returned, so a front end can simply render
/// [`AppState::results`].
///
/// # Logging
///
/// This library uses the `tracing` crate for logging. To see the logs,
/// initialize a subscriber in your application:
/// ```no_run
/// use tracing::Level;
/// use tracing_subscriber::FmtSubscriber;
///
/// let subscriber = FmtSubscriber::builder()
///     .with_max_level(Level::DEBUG)
///     .finish();
/// tracing::subscriber::set_global_default(subscriber)
///     .expect("Failed to set tracing subscriber");
/// ```
///
/// Result-log lines are emitted at `INFO` under the `ytqueuer::results` target.
#[derive(Clone)]
pub struct Controller {
    api: ApiClient,
    session: Arc<SessionStore>,
    state: Arc<RwLock<AppState>>,
    event_sender: broadcast::Sender<QueuerEvent>,
    poll_interval: Duration,
    refreshing: Arc<AtomicBool>,
}

/// Keeps the in-flight flag set for as long as it lives.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl Controller {
    pub fn new(api: ApiClient, session: Arc<SessionStore>, settings: &Settings) -> Self {
        let (event_tx, _) = broadcast::channel(100);
        Self {
            api,
            session,
            state: Arc::new(RwLock::new(AppState::default())),
            event_sender: event_tx,
            poll_interval: settings.poll_interval,
            refreshing: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Build a controller with its own HTTP client and file-backed session.
    pub fn from_settings(settings: &Settings) -> Result<Self, QueuerError> {
        let api = ApiClient::new(&settings.base_url, settings.request_timeout, None)?;
        let session = Arc::new(SessionStore::open(&settings.session_file)?);
        Ok(Self::new(api, session, settings))
    }

    pub fn event_receiver(&self) -> broadcast::Receiver<QueuerEvent> {
        self.event_sender.subscribe()
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Snapshot of the current state.
    pub async fn state(&self) -> AppState {
        self.state.read().await.clone()
    }

    pub async fn current_selection(&self) -> Option<PlaybackClient> {
        self.state.read().await.selection().cloned()
    }

    #[inline]
    fn send_event(&self, event: QueuerEvent) {
        // No receivers is fine; nobody is rendering yet.
        if self.event_sender.send(event).is_err() {
            trace!("No event receivers");
        }
    }

    /// Append a line to the result log.
    pub async fn log(&self, text: impl Into<String>) {
        let text = text.into();
        self.state.write().await.results.push(text.clone());
        self.send_event(QueuerEvent::Log(text));
    }

    async fn report(&self, context: &str, err: &QueuerError) {
        warn!(error = %err, "{}", context);
        self.log(err.describe(context)).await;
    }

    async fn require_selection(&self) -> Result<PlaybackClient, QueuerError> {
        match self.current_selection().await {
            Some(client) => Ok(client),
            None => {
                self.log(QueuerError::NoSelection.to_string()).await;
                Err(QueuerError::NoSelection)
            }
        }
    }

    /// Restore the selection saved by a previous session and load its
    /// playlist and power menu.
    pub async fn startup(&self) -> Result<(), QueuerError> {
        let saved = match self.session.get_cookie::<PlaybackClient>(CONTROLLER_COOKIE) {
            Ok(saved) => saved,
            Err(e) => {
                self.report("Failed to read saved selection", &e).await;
                None
            }
        };
        let Some(client) = saved.filter(|c| !c.id.is_empty()) else {
            debug!("No saved selection found");
            return Ok(());
        };

        info!("Restoring selection: {}", client.name);
        {
            let mut state = self.state.write().await;
            state.selected_label = client.name.clone();
            state.current_playlist = Some(client.clone());
        }
        self.send_event(QueuerEvent::SelectionChanged(Some(client)));

        if let Err(e) = self.get_playlist().await {
            debug!(error = %e, "Initial playlist fetch failed");
        }
        self.update_power_settings_menu().await
    }

    // --- Playback client watcher ---

    /// Fetch the playback clients, rebuild the selection menu and refresh the
    /// selected playlist. Concurrent calls are collapsed: while one refresh is
    /// in flight, others return [`RefreshOutcome::Skipped`].
    pub async fn refresh_clients(&self) -> RefreshOutcome {
        if self
            .refreshing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            trace!("Client refresh already in flight, skipping.");
            return RefreshOutcome::Skipped;
        }
        let _in_flight = InFlight(&self.refreshing);

        let clients = match self.api.list_clients().await {
            Ok(Some(clients)) => clients,
            Ok(None) => {
                warn!("Backend returned no playback client list");
                self.log("Failed to get playlists.").await;
                return RefreshOutcome::Failed;
            }
            Err(e) => {
                self.report("Failed to get available playlists", &e).await;
                return RefreshOutcome::Failed;
            }
        };
        debug!("Fetched {} playback client(s)", clients.len());

        let (before, after) = {
            let mut state = self.state.write().await;
            let before = state.selection().cloned();
            state.set_clients(clients.clone());
            (before, state.selection().cloned())
        };
        self.send_event(QueuerEvent::ClientsUpdated(clients));
        if before != after {
            self.send_event(QueuerEvent::SelectionChanged(after.clone()));
        }

        if after.is_some() && self.get_playlist().await.is_err() {
            return RefreshOutcome::Failed;
        }
        RefreshOutcome::Completed
    }

    /// Run [`Controller::refresh_clients`] now and then every poll interval,
    /// whatever the outcome, until the returned handle is stopped or dropped.
    pub fn start_watcher(&self) -> WatcherHandle {
        let stop_signal = Arc::new(AtomicBool::new(false));
        let shutdown_notify = Arc::new(Notify::new());

        let controller = self.clone();
        let stop = stop_signal.clone();
        let notify = shutdown_notify.clone();
        let interval = self.poll_interval;

        let handle = tokio::spawn(async move {
            info!("Playback client watcher started.");
            loop {
                if stop.load(Ordering::Relaxed) {
                    break;
                }

                tokio::select! {
                    biased;
                    _ = notify.notified() => break,
                    outcome = controller.refresh_clients() => {
                        trace!(?outcome, "Watcher cycle finished");
                    }
                }

                tokio::select! {
                    biased;
                    _ = notify.notified() => break,
                    _ = sleep(interval) => {}
                }
            }
            info!("Playback client watcher finished.");
        });

        WatcherHandle {
            stop_signal,
            shutdown_notify,
            task: Some(handle),
        }
    }

    /// Select the client at `index` in the last fetched list, persist the
    /// choice and load its playlist and power menu.
    pub async fn select_client(&self, index: usize) -> Result<PlaybackClient, QueuerError> {
        let selected = {
            let mut state = self.state.write().await;
            match state.clients.get(index).cloned() {
                Some(client) => {
                    state.selected_label = client.name.clone();
                    state.current_playlist = Some(client.clone());
                    Some(client)
                }
                None => None,
            }
        };
        let Some(client) = selected else {
            self.log("Invalid playlist selected.").await;
            return Err(QueuerError::InvalidField {
                field: "selection",
                reason: format!("no playback client at index {}", index),
            });
        };

        info!("Selected playback client: {}", client.name);
        if let Err(e) = self.session.set_cookie(CONTROLLER_COOKIE, &client) {
            self.report("Failed to save selection", &e).await;
        }
        self.send_event(QueuerEvent::SelectionChanged(Some(client.clone())));

        if let Err(e) = self.get_playlist().await {
            debug!(error = %e, "Playlist fetch after selection failed");
        }
        if let Err(e) = self.update_power_settings_menu().await {
            debug!(error = %e, "Power menu rebuild after selection failed");
        }
        Ok(client)
    }

    // --- Playlist ---

    /// Fetch and render the selected client's playlist.
    pub async fn get_playlist(&self) -> Result<Vec<PlaylistEntry>, QueuerError> {
        let client = self.require_selection().await?;
        let entries = match self.api.get_playlist(&client.id).await {
            Ok(entries) => entries,
            Err(e) => {
                self.report(&format!("Failed to get playlist for '{}'", client.name), &e)
                    .await;
                return Err(e);
            }
        };

        {
            let mut state = self.state.write().await;
            // The selection may have moved on while the request was out.
            if state.selection().map(|c| c.id.as_str()) != Some(client.id.as_str()) {
                debug!("Discarding playlist for deselected client {}", client.id);
                return Ok(entries);
            }
            state.set_playlist(entries.clone());
        }
        self.send_event(QueuerEvent::PlaylistUpdated(entries.clone()));
        Ok(entries)
    }

    /// Append the video whose URL is in `clipboard`.
    pub async fn add_video(&self, clipboard: &str) -> Result<(), QueuerError> {
        self.add(clipboard, AddPosition::Back).await
    }

    /// Put the video whose URL is in `clipboard` at the top of the playlist.
    pub async fn add_next(&self, clipboard: &str) -> Result<(), QueuerError> {
        self.add(clipboard, AddPosition::Front).await
    }

    async fn add(&self, clipboard: &str, position: AddPosition) -> Result<(), QueuerError> {
        let client = self.require_selection().await?;
        let video_id = match extract_video_id(clipboard) {
            Ok(video_id) => video_id,
            Err(e) => {
                self.log(format!("Failed to get data from clipboard: '{}'", e))
                    .await;
                return Err(e);
            }
        };

        match self.api.add_video(&client.id, &video_id, position).await {
            Ok(message) => {
                self.log(message.unwrap_or_else(|| format!("video {} added to playlist", video_id)))
                    .await;
            }
            Err(e) => {
                let context = match position {
                    AddPosition::Back => "Failed to add video to playlist",
                    AddPosition::Front => "Failed to add video to top of playlist",
                };
                self.report(context, &e).await;
                return Err(e);
            }
        }

        self.get_playlist().await.map(|_| ())
    }

    pub async fn remove_video(&self, video_id: &str) -> Result<(), QueuerError> {
        let client = self.require_selection().await?;
        if let Err(e) = self.api.remove_video(&client.id, video_id).await {
            self.report("Failed to remove video from playlist", &e).await;
            return Err(e);
        }

        self.log("video removed").await;
        self.get_playlist().await.map(|_| ())
    }

    pub async fn clear_playlist(&self) -> Result<(), QueuerError> {
        let client = self.require_selection().await?;
        if let Err(e) = self.api.clear_playlist(&client.id).await {
            self.report("Failed to clear playlist", &e).await;
            return Err(e);
        }

        self.log("playlist cleared").await;
        self.get_playlist().await.map(|_| ())
    }

    // --- Power settings ---

    /// Run `f` against the settings panel, e.g. to edit form fields.
    pub async fn with_panel<R>(&self, f: impl FnOnce(&mut PowerSettingsPanel) -> R) -> R {
        let mut state = self.state.write().await;
        f(&mut state.panel)
    }

    pub async fn show_power_settings(&self) -> Result<(), QueuerError> {
        self.require_selection().await?;
        self.state.write().await.panel.open();
        Ok(())
    }

    pub async fn hide_power_settings(&self) {
        self.state.write().await.panel.close();
    }

    pub async fn switch_power_tab(&self, tab: PowerTab) {
        self.state.write().await.panel.switch_tab(tab);
    }

    /// Re-fetch both power configs for the selected client and rebuild the
    /// power menu. Form fields are only refreshed while the panel is closed.
    pub async fn update_power_settings_menu(&self) -> Result<(), QueuerError> {
        let Some(client) = self.current_selection().await else {
            self.log(QueuerError::NoSelection.to_string()).await;
            self.state.write().await.power_menu.hide();
            return Err(QueuerError::NoSelection);
        };

        let (cec, wol) =
            future::join(self.api.get_cec(&client.id), self.api.get_wol(&client.id)).await;

        // `None` keeps whatever was cached before a failed fetch
        let cec = match cec {
            Ok(cec) => Some(cec),
            Err(e) => {
                self.report("Failed to get CEC", &e).await;
                None
            }
        };
        let wol = match wol {
            Ok(wol) => Some(wol),
            Err(e) => {
                self.report("Failed to get Wake On LAN", &e).await;
                None
            }
        };

        {
            let mut guard = self.state.write().await;
            let state = &mut *guard;
            if let Some(cec) = cec {
                state.cec = cec;
            }
            if let Some(wol) = wol {
                state.wol = wol;
            }
            if !state.panel.sync_forms(state.wol.as_ref(), state.cec.as_ref()) {
                debug!("Power settings panel open, leaving form fields alone.");
            }
            state.rebuild_power_menu();
            state.power_menu.show();
        }
        self.send_event(QueuerEvent::PowerMenuUpdated);
        Ok(())
    }

    /// Submit whichever form the panel's active tab shows.
    pub async fn submit_power_settings(&self) -> Result<(), QueuerError> {
        let (tab, wol_form, cec_form) = {
            let state = self.state.read().await;
            (
                state.panel.active_tab(),
                state.panel.wol_form.clone(),
                state.panel.cec_form.clone(),
            )
        };
        match tab {
            PowerTab::Wol => self.submit_wol(wol_form).await,
            PowerTab::Cec => self.submit_cec(cec_form).await,
        }
    }

    /// Create or update the Wake-on-LAN config from a submitted form.
    pub async fn submit_wol(&self, form: WolForm) -> Result<(), QueuerError> {
        self.hide_power_settings().await;
        let client = self.require_selection().await?;
        let wol = match form.to_config() {
            Ok(wol) => wol,
            Err(e) => {
                self.log(e.to_string()).await;
                return Err(e);
            }
        };

        let exists = self.state.read().await.wol.is_some();
        let (result, context) = if exists {
            (
                self.api.update_wol(&client.id, &wol).await,
                "Failed to update Wake On LAN",
            )
        } else {
            (
                self.api.create_wol(&client.id, &wol).await,
                "Failed to create Wake On LAN",
            )
        };
        if let Err(e) = result {
            self.report(context, &e).await;
            return Err(e);
        }

        self.log(format!("Wake On LAN settings saved for {}.", client.name))
            .await;
        self.update_power_settings_menu().await
    }

    /// Create or update the CEC config from a submitted form.
    pub async fn submit_cec(&self, form: CecForm) -> Result<(), QueuerError> {
        self.hide_power_settings().await;
        let client = self.require_selection().await?;
        let cec = match form.to_config() {
            Ok(cec) => cec,
            Err(e) => {
                self.log(e.to_string()).await;
                return Err(e);
            }
        };

        let exists = self.state.read().await.cec.is_some();
        let (result, context) = if exists {
            (self.api.update_cec(&client.id, &cec).await, "Failed to update CEC")
        } else {
            (self.api.create_cec(&client.id, &cec).await, "Failed to create CEC")
        };
        if let Err(e) = result {
            self.report(context, &e).await;
            return Err(e);
        }

        self.log(format!("CEC settings saved for {}.", client.name))
            .await;
        self.update_power_settings_menu().await
    }

    /// Delete a power config. The menu is rebuilt whether or not the delete
    /// succeeded.
    pub async fn delete_power_settings(&self, kind: PowerKind) -> Result<(), QueuerError> {
        self.hide_power_settings().await;
        let client = self.require_selection().await?;

        let result = match kind {
            PowerKind::Wol => self.api.delete_wol(&client.id).await,
            PowerKind::Cec => self.api.delete_cec(&client.id).await,
        };
        match &result {
            Ok(()) => {
                self.log(format!("{} settings deleted.", kind.label()))
                    .await
            }
            Err(e) => {
                self.report(&format!("Failed to delete {}", kind.label()), e)
                    .await
            }
        }

        let rebuilt = self.update_power_settings_menu().await;
        result.and(rebuilt)
    }

    pub async fn wol_wake(&self) -> Result<(), QueuerError> {
        let client = self.require_selection().await?;
        self.log(format!("Requesting Wake On Lan for {}...", client.name))
            .await;
        match self.api.wake(&client.id).await {
            Ok(()) => {
                self.log(format!("Wake On Lan sent to {}.", client.name))
                    .await;
                Ok(())
            }
            Err(e) => {
                self.report("Failed to send Wake On LAN", &e).await;
                Err(e)
            }
        }
    }

    pub async fn cec_power(&self, command: CecCommand) -> Result<(), QueuerError> {
        let client = self.require_selection().await?;
        let label = command.label();
        self.log(format!("Requesting {} for {}...", label, client.name))
            .await;
        match self.api.cec_power(&client.id, command).await {
            Ok(()) => {
                self.log(format!("{} sent to {}.", label, client.name))
                    .await;
                Ok(())
            }
            Err(e) => {
                self.report(&format!("Failed to send {}", label), &e).await;
                Err(e)
            }
        }
    }

    pub async fn cec_power_status(&self) -> Result<String, QueuerError> {
        let client = self.require_selection().await?;
        self.log(format!("Requesting CEC Power Status for {}...", client.name))
            .await;
        match self.api.cec_power_status(&client.id).await {
            Ok(status) => {
                self.state.write().await.power_status = Some(status.power.clone());
                self.log(format!(
                    "CEC Power Status for {}: {}",
                    client.name, status.power
                ))
                .await;
                Ok(status.power)
            }
            Err(e) => {
                self.report("Failed to get CEC Power Status", &e).await;
                Err(e)
            }
        }
    }

    /// Dispatch a power-menu item.
    pub async fn trigger(&self, action: QuickAction) -> Result<(), QueuerError> {
        match action {
            QuickAction::Wake => self.wol_wake().await,
            QuickAction::CecPowerOn => self.cec_power(CecCommand::On).await,
            QuickAction::CecPowerOff => self.cec_power(CecCommand::Off).await,
            QuickAction::CecPowerStatus => self.cec_power_status().await.map(|_| ()),
            QuickAction::EditPowerSettings => self.show_power_settings().await,
        }
    }
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("api", &self.api)
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

/// Owns the background watcher task started by [`Controller::start_watcher`].
pub struct WatcherHandle {
    stop_signal: Arc<AtomicBool>,
    shutdown_notify: Arc<Notify>,
    task: Option<JoinHandle<()>>,
}

impl WatcherHandle {
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Signal the watcher to stop and wait for it to finish.
    pub async fn stop(mut self) -> Result<(), QueuerError> {
        self.stop_signal.store(true, Ordering::SeqCst);
        self.shutdown_notify.notify_one();
        if let Some(task) = self.task.take() {
            debug!("Awaiting watcher task termination...");
            task.await?;
        }
        Ok(())
    }
}

// Ensure the watcher stops when the handle goes away
impl Drop for WatcherHandle {
    fn drop(&mut self) {
        if self.task.is_some() {
            debug!("Dropping WatcherHandle, signaling watcher to stop.");
            self.stop_signal.store(true, Ordering::SeqCst);
            self.shutdown_notify.notify_one();
        }
    }
}
