use anyhow::Error;
use common::Command;
use log::{debug, error, warn};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::{engine::Engine, selftest};

/// What happened to one line of input
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Routed to the engine
    Handled,
    /// Blank line or a command type nobody handles
    Ignored,
    /// Not JSON at all
    Malformed,
    /// JSON, but with missing or out of range fields
    Invalid,
}

/// Hand a parsed command to the engine entry point it belongs to
pub async fn dispatch(engine: &mut Engine, command: Command) -> Outcome {
    match command {
        Command::SetLed { state } => engine.apply_steady_state(state).await,
        Command::PingFail { target } => engine.handle_ping_failure(target).await,
        Command::Spike { percent_diff } => engine.handle_spike(percent_diff).await,
        Command::KeepAlive { keep_alive_type } => engine.handle_keep_alive(&keep_alive_type).await,
        Command::Unknown => return Outcome::Ignored,
    }

    Outcome::Handled
}

/// Parse and dispatch one line. Bad input is logged and skipped, it never
/// touches the engine.
pub async fn dispatch_line(engine: &mut Engine, line: &str) -> Outcome {
    let line = line.trim();
    if line.is_empty() {
        return Outcome::Ignored;
    }

    match serde_json::from_str::<Command>(line) {
        Ok(command) => {
            debug!("Command: {:?}", command);
            let outcome = dispatch(engine, command).await;
            if outcome == Outcome::Ignored {
                debug!("Ignoring unknown command: {}", line);
            }
            outcome
        }
        Err(e) if e.is_data() => {
            warn!("Invalid command {}: {}", line, e);
            Outcome::Invalid
        }
        Err(e) => {
            error!("Bad data: {} ({})", line, e);
            Outcome::Malformed
        }
    }
}

/// Same as [`dispatch_line`] for a line straight off the input, which may
/// not be text at all.
pub async fn dispatch_bytes(engine: &mut Engine, line: &[u8]) -> Outcome {
    match std::str::from_utf8(line) {
        Ok(line) => dispatch_line(engine, line).await,
        Err(e) => {
            error!("Bad data: {} ({})", String::from_utf8_lossy(line), e);
            Outcome::Malformed
        }
    }
}

/// Process commands line by line until the input ends. Each command runs
/// to completion before the next line is read, so commands that arrive
/// during an animation wait in the reader.
pub async fn run<R>(engine: &mut Engine, reader: R) -> Result<(), Error>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.split(b'\n');

    while let Some(line) = lines.next_segment().await? {
        dispatch_bytes(engine, &line).await;
    }

    debug!("End of input");
    Ok(())
}

/// Sweep, then play the self test or follow `input` until it ends. Meant
/// to be raced against an interrupt, it leaves the engine usable when
/// dropped at any point.
pub async fn serve<R>(engine: &mut Engine, self_test: bool, input: R) -> Result<(), Error>
where
    R: AsyncBufRead + Unpin,
{
    engine.power_on_sweep().await;

    if self_test {
        selftest::run(engine).await;
        Ok(())
    } else {
        run(engine, input).await
    }
}
