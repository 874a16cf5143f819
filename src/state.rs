use crate::models::{CecConfig, PlaybackClient, PlaylistEntry, WolConfig};
use crate::power::{render_power_menu, PowerSettingsPanel};
use crate::results::ResultLog;
use crate::view::{render_client_menu, render_playlist, Element};

/// Everything the controller page shows, owned in one place.
#[derive(Debug, Clone)]
pub struct AppState {
    pub current_playlist: Option<PlaybackClient>,
    pub clients: Vec<PlaybackClient>,
    pub playlist: Vec<PlaylistEntry>,
    pub wol: Option<WolConfig>,
    pub cec: Option<CecConfig>,
    pub power_status: Option<String>,
    pub results: ResultLog,
    pub panel: PowerSettingsPanel,
    pub selected_label: String,
    pub client_menu: Element,
    pub playlist_view: Element,
    pub power_menu: Element,
}

impl Default for AppState {
    fn default() -> Self {
        let mut power_menu = render_power_menu(None, None);
        power_menu.hide();
        Self {
            current_playlist: None,
            clients: Vec::new(),
            playlist: Vec::new(),
            wol: None,
            cec: None,
            power_status: None,
            results: ResultLog::new(),
            panel: PowerSettingsPanel::default(),
            selected_label: "Select a Playlist".to_string(),
            client_menu: render_client_menu(&[]),
            playlist_view: render_playlist(&[]),
            power_menu,
        }
    }
}

impl AppState {
    pub fn selection(&self) -> Option<&PlaybackClient> {
        self.current_playlist.as_ref().filter(|c| !c.id.is_empty())
    }

    pub(crate) fn set_clients(&mut self, clients: Vec<PlaybackClient>) {
        self.client_menu = render_client_menu(&clients);
        if clients.is_empty() {
            self.selected_label = "No Playback Clients Available".to_string();
            self.current_playlist = None;
        } else if self.selection().is_none() {
            self.selected_label = "Select a Playlist".to_string();
            self.current_playlist = None;
        }
        self.clients = clients;
    }

    pub(crate) fn set_playlist(&mut self, entries: Vec<PlaylistEntry>) {
        self.playlist_view = render_playlist(&entries);
        self.playlist = entries;
    }

    pub(crate) fn rebuild_power_menu(&mut self) {
        self.power_menu = render_power_menu(self.wol.as_ref(), self.cec.as_ref());
    }

    pub fn results_view(&self) -> Element {
        self.results.render()
    }
}
