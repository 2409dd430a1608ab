//! Floating video overlay with inline pre-roll advertising
//!
//! `adoverlay` positions a small content video player in a fixed corner of the
//! host page and coordinates it with a single ad session served by an external
//! ad engine. The interesting part is [`AdSessionController`]: it requests at
//! most one ad session per page view, pauses and resumes the content around
//! the ad, forwards mute directives, and tears the ad UI down when the ad
//! finishes, fails, or the user dismisses the widget.
//!
//! # Features
//!
//! - **Trait seams**: the content player and the ad engine are reached only
//!   through [`platform::ContentPlayer`], [`platform::AdEngine`] and
//!   [`platform::AdSession`], so real bindings and test doubles swap freely
//! - **Ads never block content**: every ad failure degrades to content-only
//!   playback and is logged, never propagated
//! - **Single event loop**: [`Widget::run`] handles one event to completion
//!   before receiving the next
//!
//! # Example
//!
//! ```no_run
//! # #[cfg(feature = "sim")]
//! # async fn demo() -> adoverlay::Result<()> {
//! use adoverlay::sim::{SimAdEngine, SimContentPlayer};
//! use adoverlay::{Widget, WidgetConfig};
//!
//! let player = SimContentPlayer::new();
//! let probe = player.probe();
//! let (widget, sink) = Widget::install(
//!     WidgetConfig::default(),
//!     Box::new(player),
//!     Box::new(SimAdEngine::new()),
//! )?;
//! // The user presses play; the widget requests its one ad session
//! probe.user_play();
//! // The host goes away: the loop drains what is queued and tears down
//! drop(sink);
//! let outcome = widget.run().await;
//! assert!(!outcome.removed);
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};

pub mod error;
pub use error::{Error, Result};

// External collaborator seams (content player, ad engine, event sink)
pub mod platform;

pub mod controller;
pub mod runtime;
pub mod shell;
pub mod surface;

// In-memory doubles for the collaborators
#[cfg(feature = "sim")]
pub mod sim;

pub use controller::{AdSessionController, AdSessionState};
pub use platform::{PlaybackState, ViewMode};
pub use runtime::{Outcome, Widget};
pub use shell::{ShellContainer, ShellLayout};
pub use surface::{AdSurface, MuteToggle};

/// Ad tag for a single skippable linear pre-roll
pub const DEFAULT_AD_TAG_URL: &str = "https://pubads.g.doubleclick.net/gampad/ads?iu=/21775744923/external/single_preroll_skippable&sz=640x480&cust_params=sample_ct%3Dlinear&ciu_szs=300x250%2C728x90&gdfp_req=1&output=vast&unviewed_position_start=1&env=vp&impl=s&correlator=";

/// Content video shown in the player
pub const DEFAULT_CONTENT_URL: &str =
    "https://commondatastorage.googleapis.com/gtv-videos-bucket/sample/BigBuckBunny.mp4";

pub const DEFAULT_MUTED_ICON_URL: &str = "https://i.imgur.com/7kvOpST.png";
pub const DEFAULT_UNMUTED_ICON_URL: &str = "https://i.imgur.com/tu2MoyN.png";

/// Static configuration of one widget instance
///
/// The defaults reproduce the stock widget: a 340x190 muted player in the
/// bottom-right corner, a skippable pre-roll tag, and a dismiss button that
/// shows up five seconds after the widget appears.
///
/// # Examples
///
/// ```
/// let cfg = adoverlay::WidgetConfig::default();
/// assert_eq!(cfg.player_size.width, 340);
/// assert!(cfg.ad_load_timeout_ms.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetConfig {
    /// VAST ad tag requested once per page view
    pub ad_tag_url: String,
    /// Content media URL
    pub content_url: String,
    /// Icon shown by the mute toggle while the ad is muted
    pub muted_icon_url: String,
    /// Icon shown by the mute toggle while the ad is audible
    pub unmuted_icon_url: String,
    /// Page corner the widget is pinned to
    pub corner: Corner,
    /// Distance from both page edges, in em
    pub offset_em: f32,
    /// Rendered size of the content player
    pub player_size: Size,
    /// Delay before the dismiss affordance is shown, in milliseconds
    pub dismiss_delay_ms: u64,
    /// Give up on the ad and start content after this long (None => wait forever)
    pub ad_load_timeout_ms: Option<u64>,
    /// View mode passed to `AdSession::start`
    pub view_mode: ViewMode,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            ad_tag_url: DEFAULT_AD_TAG_URL.to_string(),
            content_url: DEFAULT_CONTENT_URL.to_string(),
            muted_icon_url: DEFAULT_MUTED_ICON_URL.to_string(),
            unmuted_icon_url: DEFAULT_UNMUTED_ICON_URL.to_string(),
            corner: Corner::default(),
            offset_em: 0.6,
            player_size: Size::default(),
            dismiss_delay_ms: 5000,
            ad_load_timeout_ms: None,
            view_mode: ViewMode::Normal,
        }
    }
}

impl WidgetConfig {
    /// Parse a JSON document; missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let cfg: WidgetConfig = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check URLs and dimensions.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("ad_tag_url", &self.ad_tag_url),
            ("content_url", &self.content_url),
            ("muted_icon_url", &self.muted_icon_url),
            ("unmuted_icon_url", &self.unmuted_icon_url),
        ] {
            url::Url::parse(value)
                .map_err(|e| Error::ConfigError(format!("{}: {} ({})", field, e, value)))?;
        }
        if self.player_size.width == 0 || self.player_size.height == 0 {
            return Err(Error::ConfigError(format!(
                "player_size must be non-zero, got {}x{}",
                self.player_size.width, self.player_size.height
            )));
        }
        if !self.offset_em.is_finite() || self.offset_em < 0.0 {
            return Err(Error::ConfigError(format!("offset_em must be >= 0, got {}", self.offset_em)));
        }
        Ok(())
    }
}

/// Rendered dimensions in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Default for Size {
    fn default() -> Self {
        Self {
            width: 340,
            height: 190,
        }
    }
}

/// Corner of the viewport the widget is fixed to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    #[default]
    BottomRight,
}
