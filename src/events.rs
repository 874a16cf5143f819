use crate::models::{PlaybackClient, PlaylistEntry};

// Event types broadcast to whatever renders the controller or player
#[derive(Debug, Clone)]
pub enum QueuerEvent {
    /// A line was appended to the result log.
    Log(String),
    ClientsUpdated(Vec<PlaybackClient>),
    SelectionChanged(Option<PlaybackClient>),
    PlaylistUpdated(Vec<PlaylistEntry>),
    PowerMenuUpdated,
    /// The player has no identity and must show the registration prompt.
    RegistrationRequired,
    /// The player has an identity and can show the embedded player.
    PlayerReady(PlaybackClient),
    VideoLoaded(PlaylistEntry),
}

impl QueuerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            QueuerEvent::Log(_) => "log",
            QueuerEvent::ClientsUpdated(_) => "clientsUpdated",
            QueuerEvent::SelectionChanged(_) => "selectionChanged",
            QueuerEvent::PlaylistUpdated(_) => "playlistUpdated",
            QueuerEvent::PowerMenuUpdated => "powerMenuUpdated",
            QueuerEvent::RegistrationRequired => "registrationRequired",
            QueuerEvent::PlayerReady(_) => "playerReady",
            QueuerEvent::VideoLoaded(_) => "videoLoaded",
        }
    }
}
