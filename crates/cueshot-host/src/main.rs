use tracing_subscriber::EnvFilter;

use cueshot_core::snapshot;
use cueshot_host::session::{SessionBroadcast, SessionCommand, spawn_table_session};
use cueshot_table::aiming::AimInput;
use cueshot_table::config::{POWER_MAX, TableConfig};
use cueshot_table::table::default_layout;
use cueshot_table::zones::load_zones_from_file;
use cueshot_table::{RewardTable, TableInput};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = TableConfig::load();
    let mut layout = default_layout();
    if let Ok(path) = std::env::var("CUESHOT_ZONES")
        && let Some(zones) = load_zones_from_file(&path)
    {
        tracing::info!(%path, count = zones.len(), "Loaded zones");
        layout.zones = zones;
    }

    let power = std::env::var("CUESHOT_POWER")
        .ok()
        .and_then(|v| v.parse::<u8>().ok())
        .unwrap_or(POWER_MAX);

    let table = match RewardTable::with_config(config, layout) {
        Ok(t) => t,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build reward table");
            std::process::exit(1);
        },
    };
    let anchor = table.aim().anchor();

    tracing::info!(power, "Cueshot host starting");
    let (cmd_tx, mut broadcast_rx, handle) = spawn_table_session(Box::new(table));

    // Pointer straight below the cue ball sends it up the table.
    let script = [
        TableInput::Aim(AimInput::PointerMove {
            x: anchor.x,
            y: anchor.y + 100.0,
        }),
        TableInput::LockAim,
        TableInput::Shoot { power },
    ];
    for input in &script {
        match snapshot::encode(input) {
            Ok(data) => {
                let _ = cmd_tx.send(SessionCommand::Input(data));
            },
            Err(e) => tracing::error!(error = %e, ?input, "Failed to encode input"),
        }
    }

    while let Some(msg) = broadcast_rx.recv().await {
        match msg {
            SessionBroadcast::Frame { tick, updates } => {
                tracing::trace!(tick, updates = updates.len(), "Frame");
            },
            SessionBroadcast::ShotSettled(result) => {
                tracing::info!(
                    zone = %result.name,
                    color = %result.color,
                    discount = result.discount,
                    "Reward"
                );
                let _ = cmd_tx.send(SessionCommand::Stop);
            },
            SessionBroadcast::SessionEnded => break,
        }
    }

    let _ = handle.await;
}
