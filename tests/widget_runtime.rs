#![cfg(feature = "sim")]

//! Event-loop tests on a paused tokio clock

use std::time::Duration;

use adoverlay::platform::{AdEvent, ContentEvent, PlaybackState};
use adoverlay::sim::{EngineCall, Response, SimAdEngine, SimBehavior, SimContentPlayer};
use adoverlay::{AdSessionState, Widget, WidgetConfig};
use tokio::time::sleep;

fn loading_engine() -> SimAdEngine {
    SimAdEngine::with_behavior(SimBehavior {
        response: Response::Load,
        ..Default::default()
    })
}

#[tokio::test(start_paused = true)]
async fn preroll_runs_to_completion() {
    let player = SimContentPlayer::new();
    let probe = player.probe();
    let engine = loading_engine();
    let calls = engine.probe();
    let (widget, sink) = Widget::install(WidgetConfig::default(), Box::new(player), Box::new(engine)).unwrap();
    let handle = tokio::spawn(widget.run());

    probe.user_play();
    sleep(Duration::from_millis(100)).await;
    // The started session asked for the content to pause
    assert_eq!(probe.state(), PlaybackState::Paused);
    assert_eq!(calls.count(|c| matches!(c, EngineCall::RequestSession(_))), 1);

    sink.mute_clicked();
    sink.ad(AdEvent::ContentResumeRequested);
    sink.ad(AdEvent::AllAdsCompleted);
    sleep(Duration::from_millis(100)).await;
    assert_eq!(probe.state(), PlaybackState::Playing);
    assert_eq!(calls.volumes(), vec![1.0]);

    probe.finish();
    sleep(Duration::from_secs(5)).await;
    sink.dismiss_clicked();

    let outcome = handle.await.unwrap();
    assert_eq!(outcome.state, AdSessionState::Completed);
    assert!(outcome.removed);
    assert!(!outcome.session_live);
    assert_eq!(calls.count(|c| *c == EngineCall::ContentComplete), 1);
    assert_eq!(calls.count(|c| *c == EngineCall::Destroy), 1);
}

#[tokio::test(start_paused = true)]
async fn dismiss_button_appears_after_delay() {
    let player = SimContentPlayer::new();
    let probe = player.probe();
    let (widget, sink) = Widget::install(WidgetConfig::default(), Box::new(player), Box::new(SimAdEngine::new())).unwrap();
    let handle = tokio::spawn(widget.run());

    sink.dismiss_clicked();
    sleep(Duration::from_millis(4900)).await;
    assert!(!probe.is_removed());
    assert!(!handle.is_finished());

    sleep(Duration::from_millis(200)).await;
    sink.dismiss_clicked();
    let outcome = handle.await.unwrap();
    assert!(outcome.removed);
    assert!(probe.is_removed());
    assert_eq!(outcome.state, AdSessionState::Dismissed);
}

#[tokio::test(start_paused = true)]
async fn no_timeout_by_default() {
    let player = SimContentPlayer::new();
    let probe = player.probe();
    let engine = SimAdEngine::new();
    let calls = engine.probe();
    let (widget, sink) = Widget::install(WidgetConfig::default(), Box::new(player), Box::new(engine)).unwrap();
    let handle = tokio::spawn(widget.run());

    probe.user_play();
    sleep(Duration::from_secs(120)).await;
    assert_eq!(probe.play_calls(), 1);

    // Dismiss, then the engine finally answers
    sink.dismiss_clicked();
    sink.ad(AdEvent::SessionLoaded(calls.session()));
    let outcome = handle.await.unwrap();

    assert_eq!(outcome.state, AdSessionState::Dismissed);
    assert!(!outcome.session_live);
    assert_eq!(calls.count(|c| *c == EngineCall::Destroy), 1);

    // The widget is gone; a session delivered now is still released
    assert!(!sink.ad(AdEvent::SessionLoaded(calls.session())));
    assert_eq!(calls.count(|c| *c == EngineCall::Destroy), 2);
}

#[tokio::test(start_paused = true)]
async fn load_timeout_falls_back_to_content() {
    let player = SimContentPlayer::new();
    let probe = player.probe();
    let engine = SimAdEngine::new();
    let calls = engine.probe();
    let config = WidgetConfig {
        ad_load_timeout_ms: Some(2000),
        ..Default::default()
    };
    let (widget, sink) = Widget::install(config, Box::new(player), Box::new(engine)).unwrap();
    let handle = tokio::spawn(widget.run());

    // Play attempt whose playback the browser held back
    sink.content(ContentEvent::Play);
    sleep(Duration::from_millis(1900)).await;
    assert_eq!(probe.state(), PlaybackState::Idle);

    sleep(Duration::from_millis(200)).await;
    assert_eq!(probe.state(), PlaybackState::Playing);
    assert_eq!(probe.play_calls(), 1);

    sink.ad(AdEvent::SessionLoaded(calls.session()));
    sleep(Duration::from_secs(5)).await;
    sink.dismiss_clicked();

    let outcome = handle.await.unwrap();
    assert_eq!(outcome.state, AdSessionState::Errored);
    assert!(!outcome.session_live);
    assert_eq!(calls.count(|c| matches!(c, EngineCall::Start(..))), 0);
    assert_eq!(calls.count(|c| *c == EngineCall::Destroy), 1);
}

#[tokio::test(start_paused = true)]
async fn failed_start_keeps_content_playing() {
    let player = SimContentPlayer::new();
    let probe = player.probe();
    let engine = SimAdEngine::with_behavior(SimBehavior {
        response: Response::Load,
        fail_start: true,
        ..Default::default()
    });
    let (widget, sink) = Widget::install(WidgetConfig::default(), Box::new(player), Box::new(engine)).unwrap();
    let handle = tokio::spawn(widget.run());

    probe.user_play();
    sleep(Duration::from_secs(6)).await;
    assert_eq!(probe.state(), PlaybackState::Playing);

    sink.dismiss_clicked();
    let outcome = handle.await.unwrap();
    assert_eq!(outcome.state, AdSessionState::Errored);
}

#[tokio::test(start_paused = true)]
async fn run_returns_when_host_drops_sink() {
    let player = SimContentPlayer::new();
    let probe = player.probe();
    let (widget, sink) = Widget::install(WidgetConfig::default(), Box::new(player), Box::new(SimAdEngine::new())).unwrap();
    drop(sink);

    let outcome = tokio::time::timeout(Duration::from_secs(3600), widget.run())
        .await
        .expect("run should return once every host sink is gone");
    assert!(!outcome.removed);
    assert!(!outcome.session_live);
    assert!(probe.is_removed());
}

#[tokio::test(start_paused = true)]
async fn dropping_sink_mid_ad_destroys_session() {
    let player = SimContentPlayer::new();
    let probe = player.probe();
    let engine = loading_engine();
    let calls = engine.probe();
    let (widget, sink) = Widget::install(WidgetConfig::default(), Box::new(player), Box::new(engine)).unwrap();
    let handle = tokio::spawn(widget.run());

    probe.user_play();
    sleep(Duration::from_millis(100)).await;
    assert_eq!(probe.state(), PlaybackState::Paused);
    assert_eq!(calls.count(|c| *c == EngineCall::Destroy), 0);

    drop(sink);
    let outcome = tokio::time::timeout(Duration::from_secs(3600), handle)
        .await
        .expect("run should return once every host sink is gone")
        .unwrap();
    assert_eq!(outcome.state, AdSessionState::Dismissed);
    assert!(!outcome.session_live);
    assert_eq!(calls.count(|c| *c == EngineCall::Destroy), 1);
    assert_eq!(calls.count(|c| *c == EngineCall::DestroyDisplay), 1);
}

#[test]
fn drain_handles_queued_events() {
    let player = SimContentPlayer::new();
    let probe = player.probe();
    let (mut widget, _sink) = Widget::install(WidgetConfig::default(), Box::new(player), Box::new(loading_engine())).unwrap();

    probe.user_play();
    // play -> session loaded -> (content play, pause requested)
    assert!(widget.drain() >= 3);
    let ctl = widget.shell().controller();
    assert_eq!(ctl.state(), AdSessionState::Active);
    assert!(ctl.surface().is_mounted());
    assert_eq!(probe.state(), PlaybackState::Paused);
}
