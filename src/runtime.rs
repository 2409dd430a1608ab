//! Widget installation and the event loop
//!
//! [`Widget::install`] wires the collaborators together and returns the
//! [`EventSink`] the host feeds DOM input and ad engine callbacks into.
//! [`Widget::run`] drains that sink one event at a time and fires the two
//! timers the widget owns: the deferred dismiss button and the optional ad
//! load timeout.

use std::time::Duration;

use log::{debug, info};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::{self, Instant};

use crate::controller::{AdSessionController, AdSessionState};
use crate::platform::{AdEngine, ContentEvent, ContentPlayer, EventSink, PlaybackState, WidgetEvent};
use crate::shell::{ShellContainer, ShellLayout};
use crate::{Result, WidgetConfig};

/// Final state of a widget once its event loop returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub state: AdSessionState,
    pub playback: PlaybackState,
    /// Whether the user dismissed the widget (false when the host dropped it)
    pub removed: bool,
    /// Whether a live ad session object was still held
    pub session_live: bool,
}

/// An installed widget
pub struct Widget {
    shell: ShellContainer,
    rx: UnboundedReceiver<WidgetEvent>,
    dismiss_delay: Duration,
    load_timeout: Option<Duration>,
}

impl Widget {
    /// Validate `config`, hook the player's native events and build the shell
    pub fn install(
        config: WidgetConfig,
        mut player: Box<dyn ContentPlayer>,
        engine: Box<dyn AdEngine>,
    ) -> Result<(Self, EventSink)> {
        config.validate()?;
        let (sink, rx) = EventSink::channel();
        // Only the host's sink keeps the loop alive
        let internal = sink.downgrade();
        player.on_play(internal.content_hook(ContentEvent::Play));
        player.on_ended(internal.content_hook(ContentEvent::Ended));

        let controller = AdSessionController::new(&config, player, engine, internal);
        let shell = ShellContainer::new(ShellLayout::from_config(&config), controller);
        info!("widget installed for {}", config.content_url);

        Ok((
            Self {
                shell,
                rx,
                dismiss_delay: Duration::from_millis(config.dismiss_delay_ms),
                load_timeout: config.ad_load_timeout_ms.map(Duration::from_millis),
            },
            sink,
        ))
    }

    pub fn shell(&self) -> &ShellContainer {
        &self.shell
    }

    pub fn shell_mut(&mut self) -> &mut ShellContainer {
        &mut self.shell
    }

    /// Handle every event already queued, without waiting. Returns how many
    /// were handled. Timers are not driven.
    pub fn drain(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.rx.try_recv() {
            self.shell.handle(event);
            handled += 1;
        }
        handled
    }

    /// Run until the widget is dismissed or every strong [`EventSink`] is
    /// dropped. In the latter case the ad session is torn down as well.
    pub async fn run(mut self) -> Outcome {
        let mut reveal_at = Some(Instant::now() + self.dismiss_delay);
        let mut load_deadline: Option<Instant> = None;
        let mut timeout_armed = self.load_timeout.is_some();

        while !self.shell.is_removed() {
            tokio::select! {
                event = self.rx.recv() => match event {
                    Some(event) => self.shell.handle(event),
                    None => {
                        info!("every host sink dropped, tearing the widget down");
                        self.shell.controller_mut().teardown();
                        break;
                    }
                },
                () = sleep_until_opt(reveal_at) => {
                    reveal_at = None;
                    self.shell.reveal_dismiss();
                }
                () = sleep_until_opt(load_deadline) => {
                    load_deadline = None;
                    let ms = self.load_timeout.map_or(0, |t| t.as_millis() as u64);
                    self.shell.controller_mut().on_ad_load_timeout(ms);
                }
            }

            // The deadline counts from the moment the request went out
            if timeout_armed && self.shell.controller().state() == AdSessionState::Requested {
                timeout_armed = false;
                load_deadline = self.load_timeout.map(|t| Instant::now() + t);
            }
        }

        self.finish()
    }

    /// Close the channel and let the controller dispose of whatever was
    /// still in flight (a late session gets destroyed rather than dropped).
    fn finish(mut self) -> Outcome {
        self.rx.close();
        let late = self.drain();
        if late > 0 {
            debug!("handled {} late events after shutdown", late);
        }
        outcome(self.shell.controller(), self.shell.is_removed())
    }
}

fn outcome(controller: &AdSessionController, removed: bool) -> Outcome {
    Outcome {
        state: controller.state(),
        playback: controller.player().state(),
        removed,
        session_live: controller.has_session(),
    }
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
