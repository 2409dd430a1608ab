//! Ad session orchestration
//!
//! [`AdSessionController`] owns the single ad session of a page view and the
//! state machine around it:
//!
//! ```text
//! Uninitialized -> Requested -> Loaded -> Active -> Completed
//!                      |           |        |
//!                      +-----------+--------+-----> Errored
//! (any non-terminal state) ---------------------> Dismissed
//! ```
//!
//! Nothing can fail before the single request goes out, so an ad error in
//! Uninitialized is ignored rather than closing off the page view's ad.
//!
//! Every handler runs to completion and is a guarded no-op when the event
//! does not apply to the current state. Ad failures never propagate: they are
//! logged and the content is played without ads.

use log::{debug, info, warn};

use crate::platform::{
    AdEngine, AdError, AdEvent, AdRequest, AdSession, ContentEvent, ContentPlayer, EventSink,
    PlaybackState, ViewMode,
};
use crate::surface::{AdSurface, MuteToggle};
use crate::{Error, Result, WidgetConfig};

/// Lifecycle of the page view's ad session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdSessionState {
    #[default]
    Uninitialized,
    Requested,
    Loaded,
    Active,
    Completed,
    Errored,
    /// The user removed the widget
    Dismissed,
}

impl AdSessionState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            AdSessionState::Completed | AdSessionState::Errored | AdSessionState::Dismissed
        )
    }

    /// Whether `next` is a legal successor of this state
    pub fn can_advance_to(self, next: AdSessionState) -> bool {
        use AdSessionState::*;
        match (self, next) {
            (from, Dismissed) => !from.is_terminal(),
            (Requested, Errored) | (Loaded, Errored) | (Active, Errored) => true,
            (Uninitialized, Requested) => true,
            (Requested, Loaded) => true,
            (Loaded, Active) => true,
            (Loaded, Completed) | (Active, Completed) => true,
            _ => false,
        }
    }

    /// Whether the ad engine may still drive the content player
    fn has_session(self) -> bool {
        matches!(self, AdSessionState::Loaded | AdSessionState::Active)
    }
}

/// Mediates between content playback and the ad engine's lifecycle.
///
/// One controller exists per widget. It requests at most one ad session
/// (the request guard latches on the first content play attempt and never
/// resets) and keeps the content player and ad surface consistent with the
/// session state after every event.
pub struct AdSessionController {
    state: AdSessionState,
    request_guard: bool,
    /// Content is paused because the ad asked for it
    content_paused_by_ad: bool,
    request: AdRequest,
    view_mode: ViewMode,
    player: Box<dyn ContentPlayer>,
    engine: Box<dyn AdEngine>,
    surface: AdSurface,
    session: Option<Box<dyn AdSession>>,
    sink: EventSink,
}

impl AdSessionController {
    pub fn new(
        config: &WidgetConfig,
        player: Box<dyn ContentPlayer>,
        engine: Box<dyn AdEngine>,
        sink: EventSink,
    ) -> Self {
        let mute = MuteToggle::new(config.muted_icon_url.clone(), config.unmuted_icon_url.clone());
        Self {
            state: AdSessionState::Uninitialized,
            request_guard: false,
            content_paused_by_ad: false,
            request: AdRequest::preroll(config.ad_tag_url.clone()),
            view_mode: config.view_mode,
            player,
            engine,
            surface: AdSurface::new(mute),
            session: None,
            sink,
        }
    }

    pub fn state(&self) -> AdSessionState {
        self.state
    }

    /// Whether the page view's ad session has already been requested
    pub fn has_requested(&self) -> bool {
        self.request_guard
    }

    /// Whether a live session object is held
    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    pub fn player(&self) -> &dyn ContentPlayer {
        self.player.as_ref()
    }

    pub fn surface(&self) -> &AdSurface {
        &self.surface
    }

    /// Dispatch an event from the ad engine
    pub fn handle_ad(&mut self, event: AdEvent) {
        debug!("ad event: {}", event.name());
        match event {
            AdEvent::SessionLoaded(session) => self.on_session_loaded(session),
            AdEvent::AdError(err) => self.on_session_error(err),
            AdEvent::AllAdsCompleted => self.on_all_ads_completed(),
            AdEvent::ContentPauseRequested => self.on_content_pause_requested(),
            AdEvent::ContentResumeRequested => self.on_content_resume_requested(),
        }
    }

    /// Dispatch a native event of the content player
    pub fn handle_content(&mut self, event: ContentEvent) {
        match event {
            ContentEvent::Play => self.on_content_play_attempt(),
            ContentEvent::Ended => self.on_content_ended(),
        }
    }

    /// Request the ad session on the first play attempt. Every later call is a
    /// no-op, so this can be wired to every "play" event of the content.
    pub fn on_content_play_attempt(&mut self) {
        match self.request_session() {
            Ok(()) => {}
            Err(err @ Error::DuplicateRequest) | Err(err @ Error::LateCallback(_)) => {
                debug!("{}", err)
            }
            Err(err) => self.fail(err),
        }
    }

    fn request_session(&mut self) -> Result<()> {
        if self.request_guard {
            return Err(Error::DuplicateRequest);
        }
        if self.state.is_terminal() {
            return Err(Error::LateCallback(format!("play attempt in {:?}", self.state)));
        }
        self.request_guard = true;
        self.advance(AdSessionState::Requested);
        info!("requesting ad session for {}", self.request.tag_url);
        self.engine
            .request_session(&self.request, self.sink.clone())
            .map_err(|e| match e {
                Error::RequestError(_) => e,
                other => Error::RequestError(other.to_string()),
            })
    }

    /// The engine produced the session. Content starts playing and the mute
    /// toggle is mounted before the ad is started; if starting fails the
    /// session is dropped and content keeps playing.
    pub fn on_session_loaded(&mut self, mut session: Box<dyn AdSession>) {
        if self.state != AdSessionState::Requested {
            debug!("session loaded in {:?}, destroying it", self.state);
            session.destroy();
            return;
        }
        self.advance(AdSessionState::Loaded);
        self.player.play();
        self.surface.mount();
        self.session = Some(session);

        if let Err(err) = self.start_session() {
            self.fail(err);
        }
    }

    fn start_session(&mut self) -> Result<()> {
        self.surface.attach_display(self.engine.as_mut())?;
        let size = self.player.current_rendered_size();
        let view_mode = self.view_mode;
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| Error::StartError("no session to start".to_string()))?;
        session.start(size, view_mode).map_err(|e| match e {
            Error::StartError(_) => e,
            other => Error::StartError(other.to_string()),
        })?;
        info!("ad session started at {}x{}", size.width, size.height);
        self.advance(AdSessionState::Active);
        Ok(())
    }

    /// Ad error reported by the engine. Final for this page view.
    pub fn on_session_error(&mut self, error: AdError) {
        let err = match self.state {
            AdSessionState::Uninitialized => {
                self.ignore(&format!("ad-error ({})", error));
                return;
            }
            AdSessionState::Requested => Error::RequestError(error.to_string()),
            _ => Error::PlaybackError(error.to_string()),
        };
        self.fail(err);
    }

    pub fn on_all_ads_completed(&mut self) {
        if !self.state.has_session() {
            self.ignore("all-ads-completed");
            return;
        }
        self.advance(AdSessionState::Completed);
        self.release_ad_resources();
        if self.content_paused_by_ad {
            self.resume_content();
        }
    }

    pub fn on_content_pause_requested(&mut self) {
        if !self.state.has_session() {
            self.ignore("content-pause-requested");
            return;
        }
        self.player.pause();
        self.content_paused_by_ad = true;
    }

    pub fn on_content_resume_requested(&mut self) {
        if !self.state.has_session() {
            self.ignore("content-resume-requested");
            return;
        }
        self.resume_content();
    }

    /// Content reached its end; the engine is told so it can finalize.
    pub fn on_content_ended(&mut self) {
        if self.state == AdSessionState::Dismissed {
            self.ignore("content ended");
            return;
        }
        self.engine.content_complete();
    }

    /// Forward a volume directive to the live session and sync the toggle icon
    pub fn set_muted(&mut self, muted: bool) {
        self.surface.mute_mut().set_muted(muted);
        let level = self.surface.mute().volume();
        match self.session.as_mut() {
            Some(session) => session.set_volume(level),
            None => debug!("no live ad session, dropping volume {}", level),
        }
    }

    /// Click on the mute toggle. Ignored while the toggle is not mounted.
    pub fn toggle_mute(&mut self) {
        if !self.surface.is_mounted() {
            debug!("mute toggle not mounted, ignoring click");
            return;
        }
        let muted = self.surface.mute_mut().toggle();
        self.set_muted(muted);
    }

    /// The engine did not answer within `timeout_ms`
    pub fn on_ad_load_timeout(&mut self, timeout_ms: u64) {
        if self.state != AdSessionState::Requested {
            self.ignore("ad load timeout");
            return;
        }
        self.fail(Error::Timeout(timeout_ms));
    }

    /// Unconditional cancellation: destroy the session, take the ad surface
    /// and the content player off the page. Safe to call repeatedly.
    pub fn teardown(&mut self) {
        if self.state.can_advance_to(AdSessionState::Dismissed) {
            self.advance(AdSessionState::Dismissed);
        }
        self.content_paused_by_ad = false;
        if let Some(mut session) = self.session.take() {
            session.destroy();
        }
        self.surface.remove(self.engine.as_mut());
        self.player.remove();
    }

    /// Enter Errored: drop the session and its UI, then make sure content is
    /// playing if the ad never got to play or left it paused.
    fn fail(&mut self, err: Error) {
        if !self.state.can_advance_to(AdSessionState::Errored) {
            debug!("{}", Error::LateCallback(err.to_string()));
            return;
        }
        warn!("ad session failed in {:?}: {}", self.state, err);
        let before_playback = self.state != AdSessionState::Active;
        self.advance(AdSessionState::Errored);
        self.release_ad_resources();
        if before_playback || self.content_paused_by_ad {
            self.resume_content();
        }
    }

    fn release_ad_resources(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.destroy();
        }
        self.surface.unmount();
        self.surface.release_display(self.engine.as_mut());
    }

    fn resume_content(&mut self) {
        self.content_paused_by_ad = false;
        if self.player.state() != PlaybackState::Playing {
            self.player.play();
        }
    }

    fn ignore(&self, what: &str) {
        debug!("{}", Error::LateCallback(format!("{} in {:?}", what, self.state)));
    }

    fn advance(&mut self, next: AdSessionState) {
        if !self.state.can_advance_to(next) {
            debug!("refusing ad session transition {:?} -> {:?}", self.state, next);
            return;
        }
        info!("ad session: {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::AdSessionState::*;
    use super::*;

    #[test]
    fn transition_table() {
        assert!(Uninitialized.can_advance_to(Requested));
        assert!(Requested.can_advance_to(Loaded));
        assert!(Requested.can_advance_to(Errored));
        assert!(Loaded.can_advance_to(Active));
        assert!(Active.can_advance_to(Completed));
        assert!(Active.can_advance_to(Dismissed));

        assert!(Uninitialized.can_advance_to(Dismissed));

        assert!(!Uninitialized.can_advance_to(Loaded));
        assert!(!Uninitialized.can_advance_to(Errored));
        assert!(!Requested.can_advance_to(Active));
        assert!(!Active.can_advance_to(Requested));
    }

    #[test]
    fn terminal_states_are_final() {
        for from in [Completed, Errored, Dismissed] {
            assert!(from.is_terminal());
            for to in [Uninitialized, Requested, Loaded, Active, Completed, Errored, Dismissed] {
                assert!(!from.can_advance_to(to), "{:?} -> {:?}", from, to);
            }
        }
    }

    #[cfg(feature = "sim")]
    mod with_sim {
        use super::super::*;
        use crate::platform::PlaybackState;
        use crate::sim::{EngineCall, SimAdEngine, SimContentPlayer};

        #[test]
        fn sync_request_failure_falls_back_to_content() {
            let player = SimContentPlayer::new();
            let probe = player.probe();
            let engine = SimAdEngine::rejecting("blocked by extension");
            let calls = engine.probe();
            let (sink, _rx) = EventSink::channel();
            let mut ctl = AdSessionController::new(
                &WidgetConfig::default(),
                Box::new(player),
                Box::new(engine),
                sink,
            );

            ctl.on_content_play_attempt();
            assert_eq!(ctl.state(), AdSessionState::Errored);
            assert_eq!(probe.state(), PlaybackState::Playing);

            ctl.on_content_play_attempt();
            assert_eq!(calls.count(|c| matches!(c, EngineCall::RequestSession(_))), 1);
        }

        #[test]
        fn ad_error_before_request_is_ignored() {
            let player = SimContentPlayer::new();
            let probe = player.probe();
            let engine = SimAdEngine::new();
            let calls = engine.probe();
            let (sink, _rx) = EventSink::channel();
            let mut ctl = AdSessionController::new(
                &WidgetConfig::default(),
                Box::new(player),
                Box::new(engine),
                sink,
            );

            ctl.on_session_error(AdError::new("stray"));
            ctl.on_ad_load_timeout(1000);
            assert_eq!(ctl.state(), AdSessionState::Uninitialized);
            assert_eq!(probe.state(), PlaybackState::Idle);

            ctl.on_content_play_attempt();
            assert!(ctl.has_requested());
            assert_eq!(ctl.state(), AdSessionState::Requested);
            assert_eq!(calls.count(|c| matches!(c, EngineCall::RequestSession(_))), 1);
        }

        #[test]
        fn late_session_after_timeout_is_destroyed() {
            let engine = SimAdEngine::new();
            let calls = engine.probe();
            let (sink, _rx) = EventSink::channel();
            let mut ctl = AdSessionController::new(
                &WidgetConfig::default(),
                Box::new(SimContentPlayer::new()),
                Box::new(engine),
                sink,
            );

            ctl.on_content_play_attempt();
            ctl.on_ad_load_timeout(3000);
            assert_eq!(ctl.state(), AdSessionState::Errored);

            ctl.on_session_loaded(calls.session());
            assert_eq!(ctl.state(), AdSessionState::Errored);
            assert!(!ctl.has_session());
            assert_eq!(calls.count(|c| *c == EngineCall::Destroy), 1);
            assert_eq!(calls.count(|c| matches!(c, EngineCall::Start(..))), 0);
        }
    }
}
