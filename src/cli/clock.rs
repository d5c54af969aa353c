use anyhow::{bail, Result};
use serde_json::json;
use tracing::info;

use crate::app::build_clock_machine;
use crate::attendance::AttendanceEvent;
use crate::clock::{settle, ClockOutcome, ClockRequest, Interrupt};
use crate::config::Config;
use crate::roster::Directory;
use crate::state::{AppState, StateHandle};

use super::args::ClockCliArgs;

pub async fn handle_clock_command(args: ClockCliArgs) -> Result<()> {
    let config = Config::load()?;
    let state = StateHandle::new(AppState::new(Directory::with_defaults()));
    let member = state
        .clocking_member(&args.username, &args.password)
        .await?;

    let mut machine = build_clock_machine(&config, state)?;
    let request = ClockRequest {
        member,
        kind: args.kind.into(),
        accuracy: args
            .accuracy
            .map(Into::into)
            .unwrap_or(config.location.accuracy),
    };

    println!(
        "Look at the camera, capturing in {}s (Ctrl-C to cancel)",
        config.camera.countdown_from
    );

    let interrupt = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
        Interrupt::Cancel
    };

    match machine.clock(request, interrupt).await? {
        ClockOutcome::Recorded {
            provisional,
            enrichment,
        } => {
            info!("Still captured, waiting for greeting and location");
            let record = settle(provisional, enrichment).await;
            println!("{}", serde_json::to_string_pretty(&printable(&record))?);
            Ok(())
        }
        ClockOutcome::Cancelled => {
            println!("Capture cancelled, nothing recorded.");
            Ok(())
        }
        ClockOutcome::CameraDenied => bail!(
            "Camera access denied: make sure {:?} exists and holds a binary PPM frame",
            config.camera.frame_path()?
        ),
    }
}

/// The record without its inline photo, which is far too long for a terminal.
fn printable(record: &AttendanceEvent) -> serde_json::Value {
    json!({
        "id": record.id,
        "staff_name": record.staff_name,
        "kind": record.kind,
        "timestamp": record.timestamp,
        "greeting": record.greeting,
        "location": record.location,
        "pending": record.pending,
        "photo_bytes": record.photo.len(),
    })
}
