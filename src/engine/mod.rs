use std::time::Duration;

use common::{Segment, SegmentStates, Severity};
use log::{debug, info};
use smart_leds::RGB8;
use tokio::time::sleep;

use crate::{
    animation::{self, HIGHLIGHT_STEP, WAVE},
    blink::BlinkController,
    lights::{color_for, lit_span, SegmentMap, BLUE, OFF, RED},
    strip::{Frame, StripHandle},
};

/// How long the strip stays red after a ping failure
pub const PING_FAIL_HOLD: Duration = Duration::from_millis(500);
/// How long the strip stays blue after a latency spike
pub const SPIKE_HOLD: Duration = Duration::from_secs(1);

/// Last reported severity of every segment. `None` until the first
/// `set_led` command arrives.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IndicatorState {
    pub local: Option<Severity>,
    pub gateway: Option<Severity>,
    pub internet: Option<Severity>,
}

impl IndicatorState {
    pub fn get(&self, segment: Segment) -> Option<Severity> {
        match segment {
            Segment::Local => self.local,
            Segment::Gateway => self.gateway,
            Segment::Internet => self.internet,
        }
    }

    /// Every segment reported and healthy
    pub fn is_healthy(&self) -> bool {
        Segment::ALL
            .iter()
            .all(|&segment| self.get(segment) == Some(Severity::Healthy))
    }

    pub fn in_outage(&self) -> bool {
        self.internet == Some(Severity::Outage)
    }
}

impl From<SegmentStates> for IndicatorState {
    fn from(states: SegmentStates) -> Self {
        Self {
            local: Some(states.local),
            gateway: Some(states.gateway),
            internet: Some(states.internet),
        }
    }
}

/// Decides what the strip shows. Holds the current severities, the
/// snapshot taken around a transient override and the blink controller.
/// Every command handler runs to completion before the next one starts.
pub struct Engine {
    strip: StripHandle,
    segments: SegmentMap,
    step_delay: Duration,
    state: IndicatorState,
    saved: Option<IndicatorState>,
    blink: BlinkController,
}

impl Engine {
    pub fn new(strip: StripHandle, segments: SegmentMap, step_delay: Duration) -> Self {
        Self {
            blink: BlinkController::new(strip.clone()),
            strip,
            segments,
            step_delay,
            state: IndicatorState::default(),
            saved: None,
        }
    }

    pub fn state(&self) -> &IndicatorState {
        &self.state
    }

    pub fn blink(&self) -> &BlinkController {
        &self.blink
    }

    pub fn strip(&self) -> &StripHandle {
        &self.strip
    }

    /// Whether a transient override still has a snapshot to restore
    pub fn has_saved_state(&self) -> bool {
        self.saved.is_some()
    }

    /// Wipe red, green, blue and off across the strip to show every pixel
    /// works.
    pub async fn power_on_sweep(&mut self) {
        info!("Running power on sweep");
        for color in [
            RGB8::new(127, 0, 0),
            RGB8::new(0, 127, 0),
            RGB8::new(0, 0, 127),
            OFF,
        ] {
            animation::color_wipe(&self.strip, color, self.step_delay).await;
        }
    }

    /// Render new severities. Only the internet segment is drawn outside of
    /// an outage, as a bar that gets shorter as things get worse.
    pub async fn apply_steady_state(&mut self, new: SegmentStates) {
        if new.internet.is_outage() {
            self.enter_outage(new).await;
            return;
        }

        self.leave_outage_if_needed().await;

        let changed = self.state.internet != Some(new.internet);
        self.state = new.into();

        if changed {
            info!("Internet severity is now {}", new.internet.level());
            self.render_bar(new.internet).await;
        }
    }

    /// Blink the internet segment, and any other segment that is down as
    /// well. Segments that still work keep their steady color.
    pub async fn enter_outage(&mut self, new: SegmentStates) {
        let changed = !self.state.in_outage();
        if changed {
            info!("Internet outage");
        }

        self.state = new.into();
        self.render_outage(changed).await;
    }

    pub async fn leave_outage_if_needed(&mut self) {
        if self.blink.is_active() {
            info!("Internet is back, leaving outage");
            self.blink.stop().await;
        }
    }

    /// Flash the strip red, then go back to what was shown before
    pub async fn handle_ping_failure(&mut self, target: Segment) {
        info!("Ping to {} failed", target);
        self.transient_override(RED, PING_FAIL_HOLD).await;
    }

    /// Flash the strip blue, then go back to what was shown before
    pub async fn handle_spike(&mut self, percent_diff: f64) {
        info!("Latency spike of {:.0}%", percent_diff * 100.0);
        self.transient_override(BLUE, SPIKE_HOLD).await;
    }

    pub async fn handle_keep_alive(&mut self, kind: &str) {
        match kind {
            "pingpong" => self.traveling_highlight().await,
            other => debug!("Ignoring keep-alive of kind {:?}", other),
        }
    }

    /// Keep-alive sweep. Only runs while everything is healthy, so it never
    /// hides a problem.
    pub async fn traveling_highlight(&mut self) {
        if !self.state.is_healthy() {
            debug!("Skipping keep-alive sweep, not everything is healthy");
            return;
        }

        animation::ping_pong(&self.strip, color_for(Severity::Healthy), WAVE, HIGHLIGHT_STEP)
            .await;
    }

    /// Stop blinking before the strip is handed back to the writer's other
    /// users.
    pub async fn shutdown(&mut self) {
        self.blink.stop().await;
        self.strip.flush().await;
    }

    async fn transient_override(&mut self, color: RGB8, hold: Duration) {
        self.saved = Some(self.state);

        // The blink task would draw over the flash
        self.blink.stop().await;

        animation::color_wipe(&self.strip, color, Duration::ZERO).await;
        sleep(hold).await;

        self.restore().await;
    }

    async fn restore(&mut self) {
        let Some(saved) = self.saved.take() else {
            return;
        };

        self.state = saved;
        match saved.internet {
            None => animation::color_wipe(&self.strip, OFF, Duration::ZERO).await,
            Some(Severity::Outage) => self.render_outage(true).await,
            Some(severity) => self.render_bar(severity).await,
        }
    }

    async fn render_bar(&mut self, severity: Severity) {
        let color = color_for(severity);
        let lit = lit_span(severity, self.strip.pixel_count());

        animation::color_wipe(&self.strip, OFF, Duration::ZERO).await;
        self.strip
            .frame(Frame::shown((0..lit).map(|i| (i, color))))
            .await;
    }

    async fn render_outage(&mut self, blank: bool) {
        // Stopped first so nothing from the old generation lands after the blank
        self.blink.stop().await;

        if blank {
            animation::color_wipe(&self.strip, OFF, Duration::ZERO).await;
        }

        let mut targets = vec![Segment::Internet];
        let mut steady = Vec::new();
        for segment in [Segment::Gateway, Segment::Local] {
            match self.state.get(segment) {
                Some(Severity::Outage) => targets.push(segment),
                Some(severity) => steady.extend(
                    self.segments
                        .pixels_for(segment)
                        .iter()
                        .map(|&i| (i, color_for(severity))),
                ),
                None => steady.extend(
                    self.segments
                        .pixels_for(segment)
                        .iter()
                        .map(|&i| (i, OFF)),
                ),
            }
        }

        self.strip.frame(Frame::shown(steady)).await;

        let pixels = self.segments.pixels_of(&targets);
        self.blink.start(targets, pixels).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        blink::BLINK_INTERVAL,
        lights::{SegmentPixels, AMBER, GREEN, YELLOW},
        strip::{spawn, MemoryStrip},
    };

    fn states(local: u8, gateway: u8, internet: u8) -> SegmentStates {
        SegmentStates::new(
            Severity::try_from(local).unwrap(),
            Severity::try_from(gateway).unwrap(),
            Severity::try_from(internet).unwrap(),
        )
    }

    fn engine() -> (Engine, MemoryStrip) {
        let strip = MemoryStrip::new(8, false);
        let (handle, _writer) = spawn(strip.clone());
        let segments = SegmentMap::new(SegmentPixels::default(), 8).unwrap();
        (Engine::new(handle, segments, Duration::ZERO), strip)
    }

    #[tokio::test(start_paused = true)]
    async fn test_steady_bar_per_severity() {
        let (mut engine, strip) = engine();

        engine.apply_steady_state(states(0, 0, 1)).await;
        engine.strip().flush().await;

        let mut expected = vec![YELLOW; 6];
        expected.extend([OFF, OFF]);
        assert_eq!(strip.displayed(), expected);
        assert_eq!(engine.state().internet, Some(Severity::Low));
        assert!(!engine.blink().is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unchanged_internet_does_not_redraw() {
        let (mut engine, strip) = engine();

        engine.apply_steady_state(states(0, 0, 2)).await;
        engine.strip().flush().await;
        let shows = strip.shows();

        engine.apply_steady_state(states(1, 2, 2)).await;
        engine.strip().flush().await;

        assert_eq!(strip.shows(), shows);
        assert_eq!(engine.state().gateway, Some(Severity::Medium));
    }

    #[tokio::test(start_paused = true)]
    async fn test_outage_blinks_internet_only() {
        let (mut engine, strip) = engine();

        engine.apply_steady_state(states(1, 2, 4)).await;
        assert!(engine.blink().is_active());
        assert_eq!(engine.blink().targets(), &[Segment::Internet]);

        sleep(BLINK_INTERVAL + BLINK_INTERVAL / 2).await;
        engine.strip().flush().await;

        let displayed = strip.displayed();
        assert_eq!(displayed[7], RED);
        assert_eq!(displayed[3], AMBER);
        assert_eq!(displayed[0], YELLOW);

        engine.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_outage_blinks_every_failed_segment() {
        let (mut engine, _strip) = engine();

        engine.apply_steady_state(states(4, 4, 4)).await;

        assert_eq!(
            engine.blink().targets(),
            &[Segment::Internet, Segment::Gateway, Segment::Local]
        );

        engine.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_outage_keeps_one_generation() {
        let (mut engine, _strip) = engine();

        engine.enter_outage(states(0, 0, 4)).await;
        engine.enter_outage(states(0, 4, 4)).await;

        assert!(engine.blink().is_active());
        assert_eq!(engine.blink().generation(), 2);
        assert_eq!(
            engine.blink().targets(),
            &[Segment::Internet, Segment::Gateway]
        );

        engine.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_leaving_outage_stops_blink() {
        let (mut engine, strip) = engine();

        engine.apply_steady_state(states(0, 0, 4)).await;
        sleep(Duration::from_secs(2)).await;
        engine.apply_steady_state(states(0, 0, 0)).await;
        assert!(!engine.blink().is_active());

        engine.strip().flush().await;
        let shows = strip.shows();
        assert_eq!(strip.displayed(), vec![GREEN; 8]);

        sleep(Duration::from_secs(3)).await;
        engine.strip().flush().await;
        assert_eq!(strip.shows(), shows);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overrides_restore_state() {
        let (mut engine, strip) = engine();

        engine.apply_steady_state(states(0, 1, 1)).await;
        engine.strip().flush().await;
        let before_state = *engine.state();
        let before_pixels = strip.displayed();

        engine.handle_ping_failure(Segment::Internet).await;
        engine.strip().flush().await;
        assert!(strip.history().contains(&vec![RED; 8]));
        assert_eq!(*engine.state(), before_state);
        assert_eq!(strip.displayed(), before_pixels);
        assert!(!engine.has_saved_state());

        engine.handle_spike(0.5).await;
        engine.strip().flush().await;
        assert!(strip.history().contains(&vec![BLUE; 8]));
        assert_eq!(*engine.state(), before_state);
        assert_eq!(strip.displayed(), before_pixels);
        assert!(!engine.has_saved_state());
    }

    #[tokio::test(start_paused = true)]
    async fn test_override_holds_for_its_duration() {
        let (mut engine, _strip) = engine();
        engine.apply_steady_state(states(0, 0, 0)).await;

        let started = tokio::time::Instant::now();
        engine.handle_spike(1.0).await;
        assert!(started.elapsed() >= SPIKE_HOLD);

        let started = tokio::time::Instant::now();
        engine.handle_ping_failure(Segment::Local).await;
        assert!(started.elapsed() >= PING_FAIL_HOLD);
    }

    #[tokio::test(start_paused = true)]
    async fn test_override_during_outage_resumes_blinking() {
        let (mut engine, _strip) = engine();

        engine.apply_steady_state(states(0, 4, 4)).await;
        let before_state = *engine.state();

        engine.handle_ping_failure(Segment::Internet).await;

        assert_eq!(*engine.state(), before_state);
        assert!(engine.blink().is_active());
        assert_eq!(engine.blink().generation(), 2);
        assert_eq!(
            engine.blink().targets(),
            &[Segment::Internet, Segment::Gateway]
        );

        engine.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_override_before_any_report_blanks() {
        let (mut engine, strip) = engine();

        engine.handle_spike(2.0).await;
        engine.strip().flush().await;

        assert_eq!(strip.displayed(), vec![OFF; 8]);
        assert_eq!(*engine.state(), IndicatorState::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_keep_alive_only_when_healthy() {
        let (mut engine, strip) = engine();

        // Nothing reported yet
        engine.handle_keep_alive("pingpong").await;
        engine.strip().flush().await;
        assert_eq!(strip.writes(), 0);

        engine.apply_steady_state(states(0, 1, 0)).await;
        engine.strip().flush().await;
        let writes = strip.writes();

        engine.handle_keep_alive("pingpong").await;
        engine.strip().flush().await;
        assert_eq!(strip.writes(), writes);

        engine.apply_steady_state(states(0, 0, 0)).await;
        engine.handle_keep_alive("pingpong").await;
        engine.strip().flush().await;
        assert!(strip.history().iter().any(|frame| frame.contains(&WAVE)));
        assert_eq!(strip.displayed(), vec![GREEN; 8]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_keep_alive_kind_is_ignored() {
        let (mut engine, strip) = engine();

        engine.apply_steady_state(states(0, 0, 0)).await;
        engine.strip().flush().await;
        let shows = strip.shows();

        engine.handle_keep_alive("heartbeat").await;
        engine.strip().flush().await;
        assert_eq!(strip.shows(), shows);
    }

    #[tokio::test(start_paused = true)]
    async fn test_power_on_sweep_ends_dark() {
        let (mut engine, strip) = engine();

        engine.power_on_sweep().await;
        engine.strip().flush().await;

        assert_eq!(strip.shows(), 4);
        assert_eq!(strip.displayed(), vec![OFF; 8]);
    }
}
