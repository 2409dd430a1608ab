//! Content player seam: the one playable media element the widget wraps

use crate::Size;

/// Playback state of the content video
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Idle,
    Playing,
    Paused,
    Ended,
}

/// Hook invoked by the player on a native media event
pub type MediaHook = Box<dyn Fn() + Send + Sync>;

/// The content video element as seen by the controller.
///
/// Implementations wrap a real media element; playback state is owned by the
/// player and only changes through `play`/`pause` or natural playback (ended).
pub trait ContentPlayer: Send {
    fn play(&mut self);
    fn pause(&mut self);
    fn state(&self) -> PlaybackState;

    /// Size the element is currently rendered at (the ad is started at this size)
    fn current_rendered_size(&self) -> Size;

    /// Register a hook fired on every native "play" event
    fn on_play(&mut self, hook: MediaHook);

    /// Register a hook fired when playback reaches the end of the media
    fn on_ended(&mut self, hook: MediaHook);

    /// Detach the element from the page
    fn remove(&mut self);
}
