//! In-memory collaborators for tests and the CLI harness.
//!
//! [`SimContentPlayer`] keeps playback state in memory and fires its hooks the
//! way a media element fires DOM events. [`SimAdEngine`] records every call it
//! receives (including calls on the sessions it hands out) so tests can assert
//! on the exact sequence of directives the controller issued.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::platform::{
    AdEngine, AdError, AdEvent, AdRequest, AdSession, ContentPlayer, EventSink, MediaHook,
    PlaybackState, ViewMode,
};
use crate::{Error, Result, Size};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Default)]
struct PlayerInner {
    state: PlaybackState,
    removed: bool,
    play_calls: usize,
    play_hooks: Vec<MediaHook>,
    ended_hooks: Vec<MediaHook>,
}

impl PlayerInner {
    fn play(&mut self) {
        if self.removed {
            return;
        }
        self.state = PlaybackState::Playing;
        self.play_calls += 1;
        for hook in &self.play_hooks {
            hook();
        }
    }
}

/// Content player backed by in-memory state
pub struct SimContentPlayer {
    inner: Arc<Mutex<PlayerInner>>,
    size: Size,
}

impl SimContentPlayer {
    pub fn new() -> Self {
        Self::with_size(Size::default())
    }

    pub fn with_size(size: Size) -> Self {
        Self {
            inner: Arc::new(Mutex::new(PlayerInner::default())),
            size,
        }
    }

    /// Observation handle that stays valid after the player is boxed away
    pub fn probe(&self) -> PlayerProbe {
        PlayerProbe {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Default for SimContentPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentPlayer for SimContentPlayer {
    fn play(&mut self) {
        lock(&self.inner).play();
    }

    fn pause(&mut self) {
        let mut inner = lock(&self.inner);
        if inner.state == PlaybackState::Playing {
            inner.state = PlaybackState::Paused;
        }
    }

    fn state(&self) -> PlaybackState {
        lock(&self.inner).state
    }

    fn current_rendered_size(&self) -> Size {
        self.size
    }

    fn on_play(&mut self, hook: MediaHook) {
        lock(&self.inner).play_hooks.push(hook);
    }

    fn on_ended(&mut self, hook: MediaHook) {
        lock(&self.inner).ended_hooks.push(hook);
    }

    fn remove(&mut self) {
        let mut inner = lock(&self.inner);
        inner.removed = true;
        // Detached media elements stop playing
        if inner.state == PlaybackState::Playing {
            inner.state = PlaybackState::Paused;
        }
    }
}

/// Shared view of a [`SimContentPlayer`]
#[derive(Clone)]
pub struct PlayerProbe {
    inner: Arc<Mutex<PlayerInner>>,
}

impl PlayerProbe {
    pub fn state(&self) -> PlaybackState {
        lock(&self.inner).state
    }

    pub fn is_removed(&self) -> bool {
        lock(&self.inner).removed
    }

    /// Number of `play()` calls that reached the element
    pub fn play_calls(&self) -> usize {
        lock(&self.inner).play_calls
    }

    /// The user pressed play on the native controls
    pub fn user_play(&self) {
        lock(&self.inner).play();
    }

    /// Playback reached the end of the media
    pub fn finish(&self) {
        let mut inner = lock(&self.inner);
        if inner.removed {
            return;
        }
        inner.state = PlaybackState::Ended;
        for hook in &inner.ended_hooks {
            hook();
        }
    }
}

/// A call received by the simulated engine or one of its sessions
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    RequestSession(AdRequest),
    InitializeDisplay,
    DestroyDisplay,
    ContentComplete,
    Start(Size, ViewMode),
    SetVolume(f64),
    Destroy,
}

/// How the simulated engine answers a session request
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Response {
    /// Say nothing; the test delivers events itself
    #[default]
    Silent,
    /// Deliver a session right away; it asks for content pause when started
    Load,
    /// Deliver an ad error right away
    Error(AdError),
}

/// Knobs for [`SimAdEngine`]
#[derive(Debug, Clone, Default)]
pub struct SimBehavior {
    /// `request_session` fails synchronously with this message
    pub reject_request: Option<String>,
    pub response: Response,
    pub fail_display: bool,
    /// Sessions handed out fail in `start`
    pub fail_start: bool,
}

/// Ad engine that records calls instead of talking to an ad server
pub struct SimAdEngine {
    calls: Arc<Mutex<Vec<EngineCall>>>,
    behavior: SimBehavior,
}

impl SimAdEngine {
    pub fn new() -> Self {
        Self::with_behavior(SimBehavior::default())
    }

    pub fn with_behavior(behavior: SimBehavior) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            behavior,
        }
    }

    /// Engine whose request fails before anything is sent
    pub fn rejecting(message: &str) -> Self {
        Self::with_behavior(SimBehavior {
            reject_request: Some(message.to_string()),
            ..Default::default()
        })
    }

    pub fn probe(&self) -> EngineProbe {
        EngineProbe {
            calls: Arc::clone(&self.calls),
            fail_start: self.behavior.fail_start,
        }
    }
}

impl Default for SimAdEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AdEngine for SimAdEngine {
    fn request_session(&mut self, request: &AdRequest, sink: EventSink) -> Result<()> {
        lock(&self.calls).push(EngineCall::RequestSession(request.clone()));
        if let Some(msg) = &self.behavior.reject_request {
            return Err(Error::RequestError(msg.clone()));
        }
        match &self.behavior.response {
            Response::Silent => {}
            Response::Load => {
                let session = SimSession {
                    calls: Arc::clone(&self.calls),
                    fail_start: self.behavior.fail_start,
                    sink: Some(sink.clone()),
                };
                sink.ad(AdEvent::SessionLoaded(Box::new(session)));
            }
            Response::Error(err) => {
                sink.ad(AdEvent::AdError(err.clone()));
            }
        }
        Ok(())
    }

    fn initialize_display(&mut self) -> Result<()> {
        lock(&self.calls).push(EngineCall::InitializeDisplay);
        if self.behavior.fail_display {
            return Err(Error::StartError("display container unavailable".to_string()));
        }
        Ok(())
    }

    fn destroy_display(&mut self) {
        lock(&self.calls).push(EngineCall::DestroyDisplay);
    }

    fn content_complete(&mut self) {
        lock(&self.calls).push(EngineCall::ContentComplete);
    }
}

/// Session handed out by [`SimAdEngine`]
pub struct SimSession {
    calls: Arc<Mutex<Vec<EngineCall>>>,
    fail_start: bool,
    sink: Option<EventSink>,
}

impl AdSession for SimSession {
    fn start(&mut self, size: Size, view_mode: ViewMode) -> Result<()> {
        lock(&self.calls).push(EngineCall::Start(size, view_mode));
        if self.fail_start {
            return Err(Error::StartError("creative failed to render".to_string()));
        }
        if let Some(sink) = &self.sink {
            sink.ad(AdEvent::ContentPauseRequested);
        }
        Ok(())
    }

    fn set_volume(&mut self, level: f64) {
        lock(&self.calls).push(EngineCall::SetVolume(level));
    }

    fn destroy(&mut self) {
        lock(&self.calls).push(EngineCall::Destroy);
        self.sink = None;
    }
}

/// Shared view of the calls a [`SimAdEngine`] received
#[derive(Clone)]
pub struct EngineProbe {
    calls: Arc<Mutex<Vec<EngineCall>>>,
    fail_start: bool,
}

impl EngineProbe {
    pub fn calls(&self) -> Vec<EngineCall> {
        lock(&self.calls).clone()
    }

    pub fn count(&self, pred: impl Fn(&EngineCall) -> bool) -> usize {
        lock(&self.calls).iter().filter(|c| pred(c)).count()
    }

    /// Volume levels set on sessions, in order
    pub fn volumes(&self) -> Vec<f64> {
        lock(&self.calls)
            .iter()
            .filter_map(|c| match c {
                EngineCall::SetVolume(v) => Some(*v),
                _ => None,
            })
            .collect()
    }

    /// A silent session recording into this probe, for delivering by hand
    pub fn session(&self) -> Box<dyn AdSession> {
        Box::new(SimSession {
            calls: Arc::clone(&self.calls),
            fail_start: self.fail_start,
            sink: None,
        })
    }
}
