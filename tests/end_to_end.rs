use std::time::Duration;

use health_indicator::prelude::*;
use smart_leds::RGB8;
use tokio::time::sleep;

fn engine() -> (Engine, MemoryStrip) {
    let strip = MemoryStrip::new(8, true);
    let (handle, _writer) = spawn(strip.clone());
    let segments = SegmentMap::new(SegmentPixels::default(), 8).unwrap();
    (Engine::new(handle, segments, Duration::ZERO), strip)
}

#[tokio::test(start_paused = true)]
async fn test_outage_then_recovery() {
    let (mut engine, strip) = engine();

    let outcome = dispatch_line(
        &mut engine,
        r#"{"type":"set_led","state":{"local":0,"gateway":0,"internet":4}}"#,
    )
    .await;
    assert_eq!(outcome, Outcome::Handled);
    assert!(engine.blink().is_active());
    assert_eq!(engine.blink().targets(), &[Segment::Internet]);

    // Let the internet pixel blink a few times
    sleep(Duration::from_millis(1750)).await;
    engine.strip().flush().await;
    let internet_pixel: Vec<RGB8> = strip.history().iter().map(|frame| frame[7]).collect();
    assert!(internet_pixel.contains(&RED));
    assert!(internet_pixel.contains(&OFF));

    dispatch_line(
        &mut engine,
        r#"{"type":"set_led","state":{"local":0,"gateway":0,"internet":0}}"#,
    )
    .await;
    assert!(!engine.blink().is_active());

    engine.strip().flush().await;
    let shows = strip.shows();
    assert_eq!(strip.displayed(), vec![GREEN; 8]);

    sleep(Duration::from_secs(5)).await;
    engine.strip().flush().await;
    assert_eq!(strip.shows(), shows);
    assert_eq!(strip.displayed(), vec![GREEN; 8]);
}

#[tokio::test(start_paused = true)]
async fn test_ping_fail_returns_to_steady_rendering() {
    let (mut engine, strip) = engine();

    dispatch_line(
        &mut engine,
        r#"{"type":"set_led","state":{"local":0,"gateway":0,"internet":1}}"#,
    )
    .await;
    engine.strip().flush().await;
    let steady = strip.displayed();
    let state = *engine.state();
    let shows = strip.shows();

    let mut expected = vec![YELLOW; 6];
    expected.extend([OFF; 2]);
    assert_eq!(steady, expected);

    dispatch_line(&mut engine, r#"{"type":"ping_fail","target":"internet"}"#).await;
    engine.strip().flush().await;

    let flashes: Vec<Vec<RGB8>> = strip.history().split_off(shows);
    assert_eq!(flashes.first(), Some(&vec![RED; 8]));
    assert_eq!(strip.displayed(), steady);
    assert_eq!(*engine.state(), state);
}

#[tokio::test(start_paused = true)]
async fn test_command_stream_with_bad_lines() {
    let (mut engine, strip) = engine();
    let input = [
        r#"{"type":"set_led","state":{"local":0,"gateway":0,"internet":0}}"#,
        r#"{"type":"keep-alive","keep_alive_type":"pingpong"}"#,
        "{\"type\": \"set_led\", \"state\": ",
        r#"{"type":"set_led","state":{"local":0,"gateway":0}}"#,
        r#"{"type":"firmware_update","url":"http://example.com"}"#,
        r#"{"type":"spike","percent_diff":1.25}"#,
    ]
    .join("\n");

    run(&mut engine, input.as_bytes()).await.unwrap();
    engine.strip().flush().await;

    assert!(engine.state().is_healthy());
    assert!(strip
        .history()
        .iter()
        .any(|frame| frame.contains(&WAVE)));
    assert!(strip.history().contains(&vec![BLUE; 8]));
    assert_eq!(strip.displayed(), vec![GREEN; 8]);

    // Gamma and the default brightness of the strip are applied on the way out
    assert_eq!(strip.output(), vec![GREEN; 8]);
}
