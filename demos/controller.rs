use std::error::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;
use ytqueuer_client::{CecCommand, Controller, PowerKind, QueuerEvent, SETTINGS};

/// Drive a queue from the terminal. Reads one command per line:
///
/// `list`, `select <n>`, `add <url>`, `next <url>`, `rm <video_id>`, `clear`,
/// `wake`, `on`, `off`, `status`, `delete-wol`, `delete-cec`, `quit`
#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let controller = Controller::from_settings(&SETTINGS)?;
    let mut receiver = controller.event_receiver();

    tokio::spawn(async move {
        while let Ok(event) = receiver.recv().await {
            match event {
                QueuerEvent::Log(line) => println!("> {}", line),
                QueuerEvent::ClientsUpdated(clients) => {
                    for (i, client) in clients.iter().enumerate() {
                        println!("  [{}] {}", i, client.name);
                    }
                }
                QueuerEvent::PlaylistUpdated(entries) => {
                    println!("Playlist ({} videos):", entries.len());
                    for entry in entries {
                        println!("  {} - {} ({})", entry.video_id, entry.title, entry.author_name);
                    }
                }
                other => println!("Event: {}", other.name()),
            }
        }
    });

    controller.startup().await?;
    let watcher = controller.start_watcher();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let mut parts = line.split_whitespace();
        let command = parts.next().unwrap_or_default();
        let arg = parts.next().unwrap_or_default();

        // Failures already land in the result log
        let _ = match command {
            "list" => {
                controller.refresh_clients().await;
                Ok(())
            }
            "select" => match arg.parse::<usize>() {
                Ok(index) => controller.select_client(index).await.map(|_| ()),
                Err(_) => {
                    println!("usage: select <n>");
                    Ok(())
                }
            },
            "add" => controller.add_video(arg).await,
            "next" => controller.add_next(arg).await,
            "rm" => controller.remove_video(arg).await,
            "clear" => controller.clear_playlist().await,
            "wake" => controller.wol_wake().await,
            "on" => controller.cec_power(CecCommand::On).await,
            "off" => controller.cec_power(CecCommand::Off).await,
            "status" => controller.cec_power_status().await.map(|_| ()),
            "delete-wol" => controller.delete_power_settings(PowerKind::Wol).await,
            "delete-cec" => controller.delete_power_settings(PowerKind::Cec).await,
            "quit" => break,
            "" => Ok(()),
            other => {
                println!("unknown command: {}", other);
                Ok(())
            }
        };
    }

    watcher.stop().await?;
    Ok(())
}
