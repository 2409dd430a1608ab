//! Ad engine seam: the narrow capability surface the controller needs from
//! the third-party ad SDK.
//!
//! The SDK owns VAST parsing, creative rendering and impression tracking. The
//! widget only asks it for one session, starts that session at the content
//! player's size, sets its volume and destroys it. Everything the SDK reports
//! back arrives asynchronously as an [`AdEvent`] through the [`EventSink`]
//! handed over with the request.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::EventSink;
use crate::{Result, Size};

/// Parameters of the single ad-session request issued per page view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdRequest {
    /// VAST ad tag URL
    pub tag_url: String,
    /// The ad will start without a user gesture
    pub autoplay: bool,
    /// The ad will start with its volume at zero
    pub play_muted: bool,
}

impl AdRequest {
    /// Autoplaying, muted pre-roll for `tag_url`
    pub fn preroll(tag_url: impl Into<String>) -> Self {
        Self {
            tag_url: tag_url.into(),
            autoplay: true,
            play_muted: true,
        }
    }
}

/// How the ad session lays out its creative
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Normal,
    Fullscreen,
}

/// Error payload reported by the ad engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdError {
    /// Engine-specific error code (VAST error codes for most SDKs)
    pub code: Option<u32>,
    pub message: String,
}

impl AdError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(code: u32, message: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            message: message.into(),
        }
    }
}

impl fmt::Display for AdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "[{}] {}", code, self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Entry point of the ad SDK
pub trait AdEngine: Send {
    /// Issue an ad-session request. The outcome is delivered later through
    /// `sink` as [`AdEvent::SessionLoaded`] or [`AdEvent::AdError`]; an `Err`
    /// here means the request could not even be sent.
    fn request_session(&mut self, request: &AdRequest, sink: EventSink) -> Result<()>;

    /// Create the display container the creatives are rendered into
    fn initialize_display(&mut self) -> Result<()>;

    /// Destroy the display container; the surface stops intercepting input
    fn destroy_display(&mut self);

    /// Content reached its end (lets the engine finish post-roll bookkeeping)
    fn content_complete(&mut self);
}

/// One loaded, playable ad unit
pub trait AdSession: Send {
    /// Begin ad playback at the given size
    fn start(&mut self, size: Size, view_mode: ViewMode) -> Result<()>;

    /// Volume directive, 0.0 (muted) or 1.0 (full)
    fn set_volume(&mut self, level: f64);

    /// Release every resource held by the session
    fn destroy(&mut self);
}

/// Lifecycle events emitted by the ad engine
pub enum AdEvent {
    SessionLoaded(Box<dyn AdSession>),
    AdError(AdError),
    AllAdsCompleted,
    ContentPauseRequested,
    ContentResumeRequested,
}

impl AdEvent {
    /// Event name as used in logs
    pub fn name(&self) -> &'static str {
        match self {
            AdEvent::SessionLoaded(_) => "session-loaded",
            AdEvent::AdError(_) => "ad-error",
            AdEvent::AllAdsCompleted => "all-ads-completed",
            AdEvent::ContentPauseRequested => "content-pause-requested",
            AdEvent::ContentResumeRequested => "content-resume-requested",
        }
    }
}

impl fmt::Debug for AdEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdEvent::AdError(err) => f.debug_tuple("AdError").field(err).finish(),
            other => f.write_str(other.name()),
        }
    }
}
