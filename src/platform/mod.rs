//! Platform seams: the content player, the ad engine, and the event sink
//!
//! Everything outside the widget's own state (the media element, the ad SDK,
//! DOM input) talks to the widget by pushing a [`WidgetEvent`] into an
//! [`EventSink`]. The runtime drains the matching receiver one event at a
//! time, so no handler ever runs interleaved with another.

pub mod ads;
pub mod media;

pub use ads::{AdEngine, AdError, AdEvent, AdRequest, AdSession, ViewMode};
pub use media::{ContentPlayer, MediaHook, PlaybackState};

use log::debug;
use tokio::sync::mpsc::error::SendError;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender, WeakUnboundedSender};

/// Native events of the content video element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentEvent {
    Play,
    Ended,
}

/// Everything the widget reacts to
#[derive(Debug)]
pub enum WidgetEvent {
    Content(ContentEvent),
    Ad(AdEvent),
    MuteClicked,
    DismissClicked,
}

#[derive(Debug, Clone)]
enum Sender {
    Strong(UnboundedSender<WidgetEvent>),
    Weak(WeakUnboundedSender<WidgetEvent>),
}

/// Cloneable handle for delivering events to a widget.
///
/// Sending never fails loudly: once the widget is gone the receiver is
/// dropped and late events are discarded. Weak sinks (see
/// [`EventSink::downgrade`]) do not keep the channel open; the event loop
/// ends when the last strong sink is dropped.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: Sender,
}

impl EventSink {
    /// Create a sink and the receiver the event loop drains
    pub fn channel() -> (Self, UnboundedReceiver<WidgetEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                tx: Sender::Strong(tx),
            },
            rx,
        )
    }

    /// A sink delivering to the same widget without keeping it alive
    pub fn downgrade(&self) -> Self {
        let weak = match &self.tx {
            Sender::Strong(tx) => tx.downgrade(),
            Sender::Weak(weak) => weak.clone(),
        };
        Self {
            tx: Sender::Weak(weak),
        }
    }

    pub fn is_weak(&self) -> bool {
        matches!(self.tx, Sender::Weak(_))
    }

    /// Deliver an event; returns false if the widget no longer exists
    pub fn send(&self, event: WidgetEvent) -> bool {
        let sent = match &self.tx {
            Sender::Strong(tx) => tx.send(event),
            Sender::Weak(weak) => match weak.upgrade() {
                Some(tx) => tx.send(event),
                None => Err(SendError(event)),
            },
        };
        match sent {
            Ok(()) => true,
            Err(err) => {
                debug!("widget gone, dropping event {:?}", err.0);
                // A session nobody will ever receive still has to be released
                if let WidgetEvent::Ad(AdEvent::SessionLoaded(mut session)) = err.0 {
                    session.destroy();
                }
                false
            }
        }
    }

    pub fn ad(&self, event: AdEvent) -> bool {
        self.send(WidgetEvent::Ad(event))
    }

    pub fn content(&self, event: ContentEvent) -> bool {
        self.send(WidgetEvent::Content(event))
    }

    pub fn mute_clicked(&self) -> bool {
        self.send(WidgetEvent::MuteClicked)
    }

    pub fn dismiss_clicked(&self) -> bool {
        self.send(WidgetEvent::DismissClicked)
    }

    /// Media hook that forwards `event` into this sink
    pub fn content_hook(&self, event: ContentEvent) -> MediaHook {
        let sink = self.clone();
        Box::new(move || {
            sink.content(event);
        })
    }
}
