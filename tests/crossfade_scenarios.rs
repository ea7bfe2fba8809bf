mod common;

use common::{Behavior, Rig, crossfade, non_decreasing, non_increasing, probe, station, url};
use rrradio::error::{PlaybackError, SinkError};
use rrradio::media_session::{MediaPlaybackState, RemoteCommand};
use rrradio::playback::{PlaybackEvent, PlaybackState, SkipDirection, TransitionState};
use std::time::Duration;
use tokio::time::Instant;

use common::MediaCall;

const EPS: f32 = 1e-4;

#[tokio::test(start_paused = true)]
async fn cold_start_from_idle() {
    let mut rig = Rig::start(crossfade(true, 2000), &[]);

    rig.handle.play_station(station("1")).await.expect("plays");
    rig.drain();

    let states: Vec<_> = rig.statuses().iter().map(|s| s.state).collect();
    assert_eq!(
        states,
        vec![PlaybackState::Idle, PlaybackState::Loading, PlaybackState::Playing]
    );
    let last = rig.last_status();
    assert_eq!(last.station.map(|s| s.id), Some("1".to_owned()));
    assert_eq!(last.transition, TransitionState::Inactive);

    let a = probe(&rig.a);
    assert_eq!(a.source.as_deref(), Some(url("1").as_str()));
    assert!((a.volume - 0.7).abs() < EPS);
    let b = probe(&rig.b);
    assert!(b.source.is_none());
    assert_eq!(b.volume, 0.0);

    let calls = rig.media.calls.lock().expect("media").clone();
    assert!(calls.iter().any(|c| matches!(
        c,
        MediaCall::Metadata(Some(m)) if m.title == "Station 1"
    )));
    assert_eq!(calls.last(), Some(&MediaCall::State(MediaPlaybackState::Playing)));
}

#[tokio::test(start_paused = true)]
async fn switching_without_crossfade_reuses_the_active_sink() {
    let mut rig = Rig::start(crossfade(false, 2000), &[]);
    rig.handle.play_station(station("1")).await.expect("first");
    rig.handle.play_station(station("2")).await.expect("second");
    rig.drain();

    let statuses = rig.statuses();
    assert!(statuses.iter().all(|s| s.transition == TransitionState::Inactive));
    let tail: Vec<_> = statuses[statuses.len() - 2..]
        .iter()
        .map(|s| (s.state, s.station.as_ref().map(|st| st.id.clone())))
        .collect();
    assert_eq!(
        tail,
        vec![
            (PlaybackState::Loading, Some("2".to_owned())),
            (PlaybackState::Playing, Some("2".to_owned())),
        ]
    );

    let a = probe(&rig.a);
    assert_eq!(a.sources_seen, vec![url("1"), url("2")]);
    let b = probe(&rig.b);
    assert!(b.sources_seen.is_empty());
    assert!(b.volume_log.iter().all(|v| *v == 0.0));
}

#[tokio::test(start_paused = true)]
async fn crossfade_swaps_sinks_after_the_fade() {
    let mut rig = Rig::start(crossfade(true, 2000), &[]);
    rig.handle.play_station(station("1")).await.expect("first");

    let t0 = Instant::now();
    rig.handle.play_station(station("2")).await.expect("second");
    assert!(t0.elapsed() >= Duration::from_millis(2000));
    rig.drain();

    let statuses = rig.statuses();
    let preparing = statuses
        .iter()
        .position(|s| s.transition == TransitionState::Preparing)
        .expect("preparing seen");
    let fading = statuses
        .iter()
        .position(|s| s.transition == TransitionState::Fading)
        .expect("fading seen");
    assert!(preparing < fading);
    // The outgoing station stays current until the commit.
    assert_eq!(
        statuses[fading].station.as_ref().map(|s| s.id.as_str()),
        Some("1")
    );
    let last = rig.last_status();
    assert_eq!(last.state, PlaybackState::Playing);
    assert_eq!(last.transition, TransitionState::Inactive);
    assert_eq!(last.station.map(|s| s.id), Some("2".to_owned()));

    let a = probe(&rig.a);
    assert!(a.source.is_none());
    assert_eq!(a.volume, 0.0);
    assert!(non_increasing(&a.volume_log));
    let b = probe(&rig.b);
    assert_eq!(b.source.as_deref(), Some(url("2").as_str()));
    assert!((b.volume - 0.7).abs() < EPS);
    assert!(non_decreasing(&b.volume_log));
    assert!(b.volume_log.len() > 10, "fade ran over many frames");
}

#[tokio::test(start_paused = true)]
async fn stalled_standby_times_out_and_cold_starts() {
    let mut rig = Rig::start(crossfade(true, 2000), &[("2", Behavior::StallOnce)]);
    rig.handle.play_station(station("1")).await.expect("first");

    let t0 = Instant::now();
    rig.handle
        .play_station(station("2"))
        .await
        .expect("cold start after timeout");
    assert!(t0.elapsed() >= Duration::from_secs(10));
    rig.drain();

    assert!(rig
        .statuses()
        .iter()
        .all(|s| s.transition != TransitionState::Fading));
    let last = rig.last_status();
    assert_eq!(last.state, PlaybackState::Playing);
    assert_eq!(last.transition, TransitionState::Inactive);
    assert_eq!(last.station.map(|s| s.id), Some("2".to_owned()));
    assert!(rig.notices().is_empty());

    let b = probe(&rig.b);
    assert!(b.source.is_none());
    assert_eq!(b.volume, 0.0);
    assert_eq!(b.play_calls, 0);
    let a = probe(&rig.a);
    assert_eq!(a.source.as_deref(), Some(url("2").as_str()));
    assert!((a.volume - 0.7).abs() < EPS);
}

#[tokio::test(start_paused = true)]
async fn dead_station_times_out_then_fails_cold_start() {
    let mut rig = Rig::start(crossfade(true, 2000), &[("2", Behavior::NeverReady)]);
    rig.handle.play_station(station("1")).await.expect("first");

    let res = rig.handle.play_station(station("2")).await;
    assert!(matches!(
        res,
        Err(PlaybackError::PlaybackRejected { ref station_id, .. }) if station_id == "2"
    ));
    rig.drain();

    let last = rig.last_status();
    assert_eq!(last.state, PlaybackState::Error);
    assert_eq!(last.transition, TransitionState::Inactive);
    assert_eq!(last.station.map(|s| s.id), Some("2".to_owned()));
    assert_eq!(rig.notices().len(), 1);
    assert!(probe(&rig.b).source.is_none());
}

#[tokio::test(start_paused = true)]
async fn stop_mid_fade_cancels_and_silences_ticks() {
    let mut rig = Rig::start(crossfade(true, 2000), &[]);
    rig.handle.play_station(station("1")).await.expect("first");

    let h = rig.handle.clone();
    let pending = tokio::spawn(async move { h.play_station(station("2")).await });
    rig.wait_status(|s| s.transition == TransitionState::Fading)
        .await;
    tokio::time::sleep(Duration::from_millis(500)).await;

    rig.handle.stop().await.expect("stop sent");
    let res = pending.await.expect("join");
    assert!(matches!(res, Err(PlaybackError::Cancelled)));
    let idle = rig
        .wait_status(|s| s.state == PlaybackState::Idle)
        .await;
    assert!(idle.station.is_none());
    assert_eq!(idle.transition, TransitionState::Inactive);

    let (a_len, b_len) = (probe(&rig.a).volume_log.len(), probe(&rig.b).volume_log.len());
    tokio::time::sleep(Duration::from_secs(1)).await;
    rig.drain();

    let a = probe(&rig.a);
    let b = probe(&rig.b);
    assert_eq!(a.volume_log.len(), a_len, "no frames after stop");
    assert_eq!(b.volume_log.len(), b_len, "no frames after stop");
    assert!(a.source.is_none());
    assert!((a.volume - 0.7).abs() < EPS);
    assert!(b.source.is_none());
    assert_eq!(b.volume, 0.0);
    assert!(rig.notices().is_empty(), "clearing the source is not an error");
    assert_eq!(rig.last_status().state, PlaybackState::Idle);
}

#[tokio::test(start_paused = true)]
async fn load_error_is_reported_once() {
    let mut rig = Rig::start(
        crossfade(true, 2000),
        &[("1", Behavior::LoadError("404 Not Found".to_owned()))],
    );

    let res = rig.handle.play_station(station("1")).await;
    assert!(matches!(
        res,
        Err(PlaybackError::LoadError { ref message, .. }) if message == "404 Not Found"
    ));
    tokio::time::sleep(Duration::from_millis(200)).await;
    rig.drain();

    let states: Vec<_> = rig.statuses().iter().map(|s| s.state).collect();
    assert_eq!(
        states,
        vec![PlaybackState::Idle, PlaybackState::Loading, PlaybackState::Error]
    );
    assert_eq!(rig.notices(), vec!["Error loading stream".to_owned()]);
    assert_eq!(rig.last_status().station.map(|s| s.id), Some("1".to_owned()));
}

#[tokio::test(start_paused = true)]
async fn rejected_play_is_not_retried() {
    let mut rig = Rig::start(
        crossfade(true, 2000),
        &[("1", Behavior::RejectPlay("autoplay blocked".to_owned()))],
    );

    let res = rig.handle.play_station(station("1")).await;
    match res {
        Err(PlaybackError::PlaybackRejected { station_id, source }) => {
            assert_eq!(station_id, "1");
            assert_eq!(source, SinkError::Rejected("autoplay blocked".to_owned()));
        }
        other => panic!("unexpected {other:?}"),
    }

    tokio::time::sleep(Duration::from_secs(5)).await;
    rig.drain();
    assert_eq!(probe(&rig.a).play_calls, 1);
    let last = rig.last_status();
    assert_eq!(last.state, PlaybackState::Error);
    assert_eq!(last.station.map(|s| s.id), Some("1".to_owned()));
    assert_eq!(
        rig.notices(),
        vec!["Error playing stream. Please check the URL.".to_owned()]
    );
}

#[tokio::test(start_paused = true)]
async fn overlapping_station_change_is_rejected() {
    let mut rig = Rig::start(crossfade(true, 2000), &[]);
    rig.handle.play_station(station("1")).await.expect("first");

    let h = rig.handle.clone();
    let pending = tokio::spawn(async move { h.play_station(station("2")).await });
    rig.wait_status(|s| s.transition != TransitionState::Inactive)
        .await;

    let res = rig.handle.play_station(station("3")).await;
    assert!(matches!(res, Err(PlaybackError::IllegalTransition)));

    pending.await.expect("join").expect("second still lands");
    rig.drain();
    assert_eq!(rig.last_status().station.map(|s| s.id), Some("2".to_owned()));
    assert!(!probe(&rig.a).sources_seen.contains(&url("3")));
    assert!(!probe(&rig.b).sources_seen.contains(&url("3")));
}

#[tokio::test(start_paused = true)]
async fn volume_change_mid_fade_lands_on_incoming_station() {
    let mut rig = Rig::start(crossfade(true, 2000), &[]);
    rig.handle.play_station(station("1")).await.expect("first");

    let h = rig.handle.clone();
    let pending = tokio::spawn(async move { h.play_station(station("2")).await });
    rig.wait_status(|s| s.transition == TransitionState::Fading)
        .await;
    tokio::time::sleep(Duration::from_millis(400)).await;
    rig.handle.set_volume(40.0).await.expect("volume sent");

    pending.await.expect("join").expect("second");

    let a = probe(&rig.a);
    assert!(non_increasing(&a.volume_log), "outgoing only ever fades down");
    assert_eq!(a.volume, 0.0);
    let b = probe(&rig.b);
    assert!((b.volume - 0.4).abs() < EPS);
    assert!(b.volume_log.iter().all(|v| *v <= 0.7 + EPS));
}

#[tokio::test(start_paused = true)]
async fn playing_the_same_station_toggles_pause() {
    let mut rig = Rig::start(crossfade(true, 2000), &[]);
    rig.handle.play_station(station("1")).await.expect("play");

    rig.handle.play_station(station("1")).await.expect("pause");
    let paused = rig
        .wait_status(|s| s.state == PlaybackState::Paused)
        .await;
    assert_eq!(paused.station.map(|s| s.id), Some("1".to_owned()));

    rig.handle.play_station(station("1")).await.expect("resume");
    rig.wait_status(|s| s.state == PlaybackState::Playing)
        .await;

    assert_eq!(probe(&rig.a).sources_seen, vec![url("1")]);
    assert!(probe(&rig.b).sources_seen.is_empty());
    let calls = rig.media.calls.lock().expect("media").clone();
    assert!(calls.contains(&MediaCall::State(MediaPlaybackState::Paused)));
}

#[tokio::test(start_paused = true)]
async fn pause_during_crossfade_aborts_and_restores() {
    let mut rig = Rig::start(crossfade(true, 2000), &[]);
    rig.handle.play_station(station("1")).await.expect("first");

    let h = rig.handle.clone();
    let pending = tokio::spawn(async move { h.play_station(station("2")).await });
    rig.wait_status(|s| s.transition == TransitionState::Fading)
        .await;
    tokio::time::sleep(Duration::from_millis(300)).await;

    rig.handle.toggle_pause().await.expect("toggle sent");
    assert!(matches!(
        pending.await.expect("join"),
        Err(PlaybackError::Cancelled)
    ));
    let paused = rig
        .wait_status(|s| s.state == PlaybackState::Paused)
        .await;
    assert_eq!(paused.station.map(|s| s.id), Some("1".to_owned()));
    assert_eq!(paused.transition, TransitionState::Inactive);

    let a = probe(&rig.a);
    assert!((a.volume - 0.7).abs() < EPS);
    assert_eq!(a.source.as_deref(), Some(url("1").as_str()));
    let b = probe(&rig.b);
    assert!(b.source.is_none());
    assert_eq!(b.volume, 0.0);
}

#[tokio::test(start_paused = true)]
async fn standby_load_error_falls_back_to_cold_start() {
    let mut rig = Rig::start(
        crossfade(true, 2000),
        &[("2", Behavior::LoadError("bad stream".to_owned()))],
    );
    rig.handle.play_station(station("1")).await.expect("first");

    let res = rig.handle.play_station(station("2")).await;
    assert!(matches!(
        res,
        Err(PlaybackError::LoadError { ref station_id, .. }) if station_id == "2"
    ));
    assert_eq!(probe(&rig.a).source.as_deref(), Some(url("2").as_str()));
    assert!(probe(&rig.b).source.is_none());
    assert_eq!(probe(&rig.b).volume, 0.0);
}

#[tokio::test(start_paused = true)]
async fn standby_play_rejection_falls_back_to_cold_start() {
    let mut rig = Rig::start(
        crossfade(true, 2000),
        &[("2", Behavior::RejectPlay("decoder refused".to_owned()))],
    );
    rig.handle.play_station(station("1")).await.expect("first");

    let res = rig.handle.play_station(station("2")).await;
    match res {
        Err(PlaybackError::PlaybackRejected { station_id, source }) => {
            assert_eq!(station_id, "2");
            assert_eq!(source, SinkError::Rejected("decoder refused".to_owned()));
        }
        other => panic!("unexpected {other:?}"),
    }
    tokio::time::sleep(Duration::from_millis(200)).await;
    rig.drain();

    let b = probe(&rig.b);
    assert!(b.source.is_none());
    assert_eq!(b.volume, 0.0);
    assert_eq!(b.play_calls, 1);
    drop(b);
    assert_eq!(probe(&rig.a).source.as_deref(), Some(url("2").as_str()));

    let last = rig.last_status();
    assert_eq!(last.state, PlaybackState::Error);
    assert_eq!(last.transition, TransitionState::Inactive);
    assert_eq!(last.station.map(|s| s.id), Some("2".to_owned()));
    assert_eq!(
        rig.notices(),
        vec!["Error playing stream. Please check the URL.".to_owned()]
    );
}

#[tokio::test(start_paused = true)]
async fn remote_next_is_forwarded() {
    let mut rig = Rig::start(crossfade(true, 2000), &[]);
    rig.handle.play_station(station("1")).await.expect("first");
    rig.handle.remote(RemoteCommand::Next).await.expect("sent");

    let skip = tokio::time::timeout(Duration::from_secs(1), async {
        loop {
            if let Some(PlaybackEvent::SkipRequested(dir)) = rig.events.recv().await {
                return dir;
            }
        }
    })
    .await
    .expect("skip event");
    assert_eq!(skip, SkipDirection::Next);
}

#[tokio::test(start_paused = true)]
async fn remote_pause_and_play() {
    let mut rig = Rig::start(crossfade(true, 2000), &[]);
    rig.handle.play_station(station("1")).await.expect("first");

    rig.handle.remote(RemoteCommand::Pause).await.expect("sent");
    rig.wait_status(|s| s.state == PlaybackState::Paused)
        .await;
    rig.handle.remote(RemoteCommand::Play).await.expect("sent");
    rig.wait_status(|s| s.state == PlaybackState::Playing)
        .await;
    rig.handle.remote(RemoteCommand::Stop).await.expect("sent");
    let idle = rig
        .wait_status(|s| s.state == PlaybackState::Idle)
        .await;
    assert!(idle.station.is_none());
}
