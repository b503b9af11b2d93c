use std::time::Duration;

use common::{Command, Segment, SegmentStates, Severity};
use log::info;
use tokio::time::sleep;

use crate::{animation, dispatch::dispatch, engine::Engine};

/// Time each state stays on the strip
pub const STEP_PAUSE: Duration = Duration::from_secs(2);

const RAINBOW_STEP: Duration = Duration::from_millis(20);
const RAINBOW_ITERATIONS: usize = 2;

#[derive(Clone, Debug, PartialEq)]
pub struct Step {
    pub label: String,
    pub command: Command,
    pub pause: Duration,
}

fn set_led(local: Severity, gateway: Severity, internet: Severity) -> Command {
    Command::SetLed {
        state: SegmentStates::new(local, gateway, internet),
    }
}

/// Every indicator state, in the order a person watching the strip can
/// follow: internet escalation, gateway and local failures on top of an
/// outage, recovery, then the transient flashes.
pub fn script() -> Vec<Step> {
    use Severity::*;

    let mut steps = Vec::new();
    let mut push = |label: String, command: Command, pause: Duration| {
        steps.push(Step {
            label,
            command,
            pause,
        })
    };

    for internet in Severity::ALL {
        push(
            format!("Internet sev {}", internet.level()),
            set_led(Healthy, Healthy, internet),
            STEP_PAUSE,
        );
    }

    for gateway in [Low, Medium, High, Outage] {
        push(
            format!("Internet sev 4, gateway sev {}", gateway.level()),
            set_led(Healthy, gateway, Outage),
            STEP_PAUSE,
        );
    }

    for local in [Low, Medium, High, Outage] {
        push(
            format!(
                "Internet sev 4, gateway sev 4, local sev {}",
                local.level()
            ),
            set_led(local, Outage, Outage),
            STEP_PAUSE,
        );
    }

    push(
        "Internet sev 0".into(),
        set_led(Healthy, Healthy, Healthy),
        STEP_PAUSE,
    );

    for attempt in 1..=2 {
        push(
            format!("Ping timeout {}", attempt),
            Command::PingFail {
                target: Segment::Internet,
            },
            STEP_PAUSE * 2,
        );
    }

    for percent_diff in [0.5, 1.0, 1.5, 2.0] {
        push(
            format!("Spike {:.0}%", percent_diff * 100.0),
            Command::Spike { percent_diff },
            STEP_PAUSE * 2,
        );
    }

    push(
        "Keep alive".into(),
        Command::KeepAlive {
            keep_alive_type: "pingpong".into(),
        },
        STEP_PAUSE,
    );

    steps
}

/// Play the script once, then a rainbow
pub async fn run_once(engine: &mut Engine) {
    info!("Self test: starting");

    for step in script() {
        info!("Self test: {}", step.label);
        dispatch(engine, step.command).await;
        sleep(step.pause).await;
    }

    // The rainbow draws over everything, so leave outage first
    engine
        .apply_steady_state(SegmentStates::new(
            Severity::Healthy,
            Severity::Healthy,
            Severity::Healthy,
        ))
        .await;

    info!("Self test: rainbow");
    animation::rainbow_cycle(engine.strip(), RAINBOW_STEP, RAINBOW_ITERATIONS).await;
}

/// Play the self test until the task is dropped
pub async fn run(engine: &mut Engine) {
    loop {
        run_once(engine).await;
    }
}
