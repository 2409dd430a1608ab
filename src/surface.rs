//! Ad surface: the rectangle over the content player the ad engine renders
//! into, plus the mute toggle mounted on top of it while a session is live.

use log::debug;

use crate::platform::AdEngine;
use crate::Result;

/// Two-state mute control bound to the live ad session's volume
#[derive(Debug, Clone, PartialEq)]
pub struct MuteToggle {
    muted: bool,
    muted_icon: String,
    unmuted_icon: String,
}

impl MuteToggle {
    /// Starts muted, matching the muted pre-roll request
    pub fn new(muted_icon: impl Into<String>, unmuted_icon: impl Into<String>) -> Self {
        Self {
            muted: true,
            muted_icon: muted_icon.into(),
            unmuted_icon: unmuted_icon.into(),
        }
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Icon currently shown by the control
    pub fn icon(&self) -> &str {
        if self.muted {
            &self.muted_icon
        } else {
            &self.unmuted_icon
        }
    }

    /// Volume level matching the flag
    pub fn volume(&self) -> f64 {
        if self.muted {
            0.0
        } else {
            1.0
        }
    }

    /// Flip the flag and return the new value. The caller forwards it to
    /// `AdSessionController::set_muted`.
    pub fn toggle(&mut self) -> bool {
        self.muted = !self.muted;
        self.muted
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }
}

/// Mount point for ad creatives.
///
/// The display container itself belongs to the ad engine; the surface only
/// remembers whether one is live so it is destroyed exactly once.
#[derive(Debug)]
pub struct AdSurface {
    mute: MuteToggle,
    mute_mounted: bool,
    display_live: bool,
    removed: bool,
}

impl AdSurface {
    pub fn new(mute: MuteToggle) -> Self {
        Self {
            mute,
            mute_mounted: false,
            display_live: false,
            removed: false,
        }
    }

    /// Attach the mute toggle. Refused once the surface left the page.
    pub fn mount(&mut self) -> bool {
        if self.removed {
            debug!("surface removed, not mounting mute toggle");
            return false;
        }
        self.mute_mounted = true;
        true
    }

    pub fn unmount(&mut self) {
        self.mute_mounted = false;
    }

    /// Whether the mute toggle is attached
    pub fn is_mounted(&self) -> bool {
        self.mute_mounted
    }

    /// Ask the engine for a display container over this surface
    pub fn attach_display(&mut self, engine: &mut dyn AdEngine) -> Result<()> {
        if self.display_live {
            return Ok(());
        }
        engine.initialize_display()?;
        self.display_live = true;
        Ok(())
    }

    /// Destroy the engine's display container if one is live
    pub fn release_display(&mut self, engine: &mut dyn AdEngine) {
        if self.display_live {
            engine.destroy_display();
            self.display_live = false;
        }
    }

    pub fn has_display(&self) -> bool {
        self.display_live
    }

    /// Tear the surface down: unmount the toggle, release the display and
    /// take the surface off the page. Safe to repeat.
    pub fn remove(&mut self, engine: &mut dyn AdEngine) {
        self.unmount();
        self.release_display(engine);
        self.removed = true;
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }

    pub fn mute(&self) -> &MuteToggle {
        &self.mute
    }

    pub fn mute_mut(&mut self) -> &mut MuteToggle {
        &mut self.mute
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{AdRequest, EventSink};

    #[derive(Default)]
    struct CountingEngine {
        initialized: usize,
        destroyed: usize,
        fail_init: bool,
    }

    impl AdEngine for CountingEngine {
        fn request_session(&mut self, _request: &AdRequest, _sink: EventSink) -> Result<()> {
            Ok(())
        }

        fn initialize_display(&mut self) -> Result<()> {
            if self.fail_init {
                return Err(crate::Error::StartError("no container".into()));
            }
            self.initialized += 1;
            Ok(())
        }

        fn destroy_display(&mut self) {
            self.destroyed += 1;
        }

        fn content_complete(&mut self) {}
    }

    #[test]
    fn mute_toggle_flips_icon() {
        let mut m = MuteToggle::new("muted.png", "unmuted.png");
        assert!(m.is_muted());
        assert_eq!(m.icon(), "muted.png");
        assert_eq!(m.volume(), 0.0);

        assert!(!m.toggle());
        assert_eq!(m.icon(), "unmuted.png");
        assert_eq!(m.volume(), 1.0);

        assert!(m.toggle());
        assert_eq!(m.icon(), "muted.png");
    }

    #[test]
    fn display_is_released_once() {
        let mut engine = CountingEngine::default();
        let mut s = AdSurface::new(MuteToggle::new("a", "b"));
        s.attach_display(&mut engine).unwrap();
        s.attach_display(&mut engine).unwrap();
        assert_eq!(engine.initialized, 1);

        s.release_display(&mut engine);
        s.release_display(&mut engine);
        assert_eq!(engine.destroyed, 1);
        assert!(!s.has_display());
    }

    #[test]
    fn failed_display_is_not_live() {
        let mut engine = CountingEngine {
            fail_init: true,
            ..Default::default()
        };
        let mut s = AdSurface::new(MuteToggle::new("a", "b"));
        assert!(s.attach_display(&mut engine).is_err());
        s.remove(&mut engine);
        assert_eq!(engine.destroyed, 0);
    }

    #[test]
    fn removed_surface_refuses_mount() {
        let mut engine = CountingEngine::default();
        let mut s = AdSurface::new(MuteToggle::new("a", "b"));
        assert!(s.mount());
        s.remove(&mut engine);
        assert!(!s.is_mounted());
        assert!(!s.mount());
        assert!(s.is_removed());
    }
}
