use std::error::Error;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;
use ytqueuer_client::{
    ApiClient, PlaybackStatus, PlayerController, PlayerEvent, PlayerState, QueuerEvent,
    SessionStore, VideoPlayer, SETTINGS,
};

/// Prints what it would play instead of embedding a real player.
struct ConsolePlayer;

impl VideoPlayer for ConsolePlayer {
    fn load_video(&self, video_id: &str, start_seconds: u32) {
        println!("Now playing https://www.youtube.com/watch?v={}&t={}", video_id, start_seconds);
    }
}

/// Play a queue, pretending every video lasts `seconds` (default 30).
///
/// Registers under the first argument when no identity has been saved yet.
#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let name = std::env::args().nth(1).unwrap_or_else(|| "Rust Player".to_string());
    let video_length = std::env::args()
        .nth(2)
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(30);

    let api = ApiClient::new(&SETTINGS.base_url, SETTINGS.request_timeout, None)?;
    let session = Arc::new(SessionStore::open(&SETTINGS.session_file)?);
    let player = Arc::new(PlayerController::new(api, session, ConsolePlayer, &SETTINGS));

    if player.startup().await == PlayerState::Unregistered {
        let client = player.register(&name).await?;
        println!("Registered as {} ({})", client.name, client.id);
    }

    let (tx, rx) = mpsc::channel(16);
    let mut receiver = player.event_receiver();

    // Fake the end of each video after a fixed time
    let ended_tx = tx.clone();
    tokio::spawn(async move {
        while let Ok(event) = receiver.recv().await {
            match event {
                QueuerEvent::VideoLoaded(entry) => {
                    println!("Loaded: {}", entry.title);
                    let tx = ended_tx.clone();
                    tokio::spawn(async move {
                        sleep(Duration::from_secs(video_length)).await;
                        let _ = tx.send(PlayerEvent::StateChange(PlaybackStatus::Ended)).await;
                    });
                }
                QueuerEvent::RegistrationRequired => {
                    println!("Backend forgot this player, restart to register again.");
                }
                QueuerEvent::Log(line) => println!("> {}", line),
                _ => {}
            }
        }
    });

    tx.send(PlayerEvent::Ready).await?;

    let runner = player.clone();
    let run = tokio::spawn(async move { runner.run(rx).await });

    tokio::signal::ctrl_c().await?;
    player.shutdown();
    run.await??;
    Ok(())
}
