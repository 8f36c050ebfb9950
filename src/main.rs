// Demo runner for the `sentinel_vision` library. A real deployment replaces
// `TestPatternSource` with a camera-backed `FrameSource` and `LoggingChannel`
// with an actual transport; everything else is production wiring: load and
// validate settings, install the stop signal, run the monitor loop on a
// blocking task, exit non-zero on fatal errors.

use chrono::Utc;
use sentinel_vision::{
    Frame, FrameSource, LoggingChannel, Monitor, MonitorSettings, SentinelError,
};
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const DEMO_WIDTH: u32 = 320;
const DEMO_HEIGHT: u32 = 240;
const DEMO_FRAMES: u32 = 120;

/// Synthetic frame source: a static gray scene with a bright block that
/// wanders through periodically, so the full detect-and-alert path exercises
/// itself without a camera.
struct TestPatternSource {
    emitted: u32,
}

impl FrameSource for TestPatternSource {
    fn open(&mut self) -> Result<(), SentinelError> {
        info!("test pattern source opened ({DEMO_WIDTH}x{DEMO_HEIGHT})");
        Ok(())
    }

    fn read_frame(&mut self) -> Option<Frame> {
        if self.emitted >= DEMO_FRAMES {
            return None;
        }
        let index = self.emitted;
        self.emitted += 1;

        let mut data = [60u8, 60, 60, 255].repeat((DEMO_WIDTH * DEMO_HEIGHT) as usize);
        // An intruder block appears every 40 frames, after warm-up.
        if index >= 40 && index % 40 < 4 {
            let left = 80 + (index % 40) * 8;
            for y in 60..110u32 {
                for x in left..left + 50 {
                    let offset = ((y * DEMO_WIDTH + x) * 4) as usize;
                    data[offset] = 230;
                    data[offset + 1] = 230;
                    data[offset + 2] = 230;
                }
            }
        }
        Some(Frame::new(DEMO_WIDTH, DEMO_HEIGHT, data, Utc::now()))
    }

    fn close(&mut self) {
        info!("test pattern source closed");
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = match MonitorSettings::from_env() {
        Ok(settings) => settings,
        Err(problems) => {
            error!("{problems}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(problems) = settings.validate() {
        error!("{problems}");
        error!("please check your environment configuration");
        return ExitCode::FAILURE;
    }

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("interrupt received, stopping after the current frame");
                stop.store(true, Ordering::SeqCst);
            }
        });
    }

    // The detection loop is synchronous by design; keep it off the async
    // runtime's worker threads.
    let handle = tokio::task::spawn_blocking(move || {
        let mut source = TestPatternSource { emitted: 0 };
        let mut monitor = Monitor::new(&settings, LoggingChannel, stop);
        monitor.run(&mut source)
    });

    match handle.await {
        Ok(Ok(summary)) => {
            info!(
                frames = summary.frames_processed,
                delivered = summary.alerts_delivered,
                "monitor exited cleanly"
            );
            ExitCode::SUCCESS
        }
        Ok(Err(error)) => {
            error!("{error}");
            ExitCode::FAILURE
        }
        Err(join_error) => {
            error!("monitor task panicked: {join_error}");
            ExitCode::FAILURE
        }
    }
}
