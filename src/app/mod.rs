use crate::api::{ApiCommand, ApiServer, ClockReply};
use crate::capture::{CaptureSession, FileCamera, SessionSettings};
use crate::clock::{ClockMachine, ClockOutcome, Interrupt};
use crate::config::Config;
use crate::enrichment::Enricher;
use crate::greeting::build_greeter;
use crate::location::{CachingLocator, FixedLocator, GeolocationProvider};
use crate::roster::Directory;
use crate::state::{AppState, StateHandle};
use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

pub async fn run_service() -> Result<()> {
    info!("Starting StaffSnap service");

    let config = Config::load()?;
    let state = StateHandle::new(AppState::new(Directory::with_defaults()));

    let (tx, rx) = mpsc::channel::<ApiCommand>(10);
    let machine = build_clock_machine(&config, state.clone())?;

    let api_server = ApiServer::new(tx, machine.status_handle(), state, &config);
    tokio::spawn(async move {
        if let Err(e) = api_server.start().await {
            error!("API server failed: {}", e);
        }
    });

    info!("StaffSnap is ready!");
    info!(
        "Try: curl -X POST http://127.0.0.1:{}/clock -H 'Content-Type: application/json' \
         -d '{{\"username\":\"staff\",\"password\":\"staff\",\"kind\":\"in\"}}'",
        config.api.port
    );

    process_commands(machine, rx).await;

    Ok(())
}

/// Run clock commands one at a time until every sender is gone.
pub async fn process_commands(mut machine: ClockMachine, mut rx: mpsc::Receiver<ApiCommand>) {
    while let Some(command) = rx.recv().await {
        match command {
            ApiCommand::Clock { request, reply } => {
                let interrupt = wait_for_interrupt(&mut rx);
                let answer = match machine.clock(request, interrupt).await {
                    Ok(ClockOutcome::Recorded { provisional, .. }) => {
                        info!(
                            "Recorded {} for {}",
                            provisional.kind.as_str(),
                            provisional.staff_name
                        );
                        ClockReply::Recorded(provisional)
                    }
                    Ok(ClockOutcome::CameraDenied) => ClockReply::Denied,
                    Ok(ClockOutcome::Cancelled) => ClockReply::Cancelled,
                    Err(e) => {
                        error!("Failed to clock: {:#}", e);
                        ClockReply::Failed(format!("{:#}", e))
                    }
                };
                if reply.send(answer).is_err() {
                    warn!("Clock caller went away before the reply");
                }
            }
            ApiCommand::CancelCapture => info!("Cancel requested with no capture running"),
            ApiCommand::CaptureNow => info!("Capture requested with no capture running"),
        }
    }
}

/// Resolves on the next cancel or capture command. Clock requests arriving
/// meanwhile are refused as busy.
async fn wait_for_interrupt(rx: &mut mpsc::Receiver<ApiCommand>) -> Interrupt {
    while let Some(command) = rx.recv().await {
        match command {
            ApiCommand::CancelCapture => return Interrupt::Cancel,
            ApiCommand::CaptureNow => return Interrupt::CaptureNow,
            ApiCommand::Clock { reply, .. } => {
                warn!("Clock requested while a capture is running");
                let _ = reply.send(ClockReply::Busy);
            }
        }
    }
    std::future::pending().await
}

pub fn build_clock_machine(config: &Config, state: StateHandle) -> Result<ClockMachine> {
    let camera = FileCamera::new(config.camera.frame_path()?);
    let session = CaptureSession::new(Box::new(camera), SessionSettings::from(&config.camera));

    let greeter = build_greeter(&config.greeting)?;
    info!("Using {} greetings", greeter.name());

    let locator: Box<dyn GeolocationProvider> = Box::new(CachingLocator::new(
        FixedLocator::from_config(&config.location),
    ));

    Ok(ClockMachine::new(
        session,
        Enricher::new(greeter, Some(locator)),
        state,
    ))
}
