//! Shell container: the fixed-corner box holding the player, the ad surface
//! and the deferred dismiss button.

use log::{debug, info};

use crate::controller::AdSessionController;
use crate::platform::WidgetEvent;
use crate::{Corner, Size, WidgetConfig};

/// Placement of the widget on the host page
#[derive(Debug, Clone, PartialEq)]
pub struct ShellLayout {
    pub corner: Corner,
    /// Distance from both edges of the corner, in em
    pub offset_em: f32,
    pub player_size: Size,
}

impl ShellLayout {
    pub fn from_config(config: &WidgetConfig) -> Self {
        Self {
            corner: config.corner,
            offset_em: config.offset_em,
            player_size: config.player_size,
        }
    }

    /// Inline style declarations for the outer container
    pub fn container_style(&self) -> Vec<(&'static str, String)> {
        let (vertical, horizontal) = match self.corner {
            Corner::TopLeft => ("top", "left"),
            Corner::TopRight => ("top", "right"),
            Corner::BottomLeft => ("bottom", "left"),
            Corner::BottomRight => ("bottom", "right"),
        };
        let offset = format!("{}em", self.offset_em);
        vec![
            ("position", "fixed".to_string()),
            (vertical, offset.clone()),
            (horizontal, offset),
        ]
    }
}

/// Root of the composed widget.
///
/// Owns the controller and routes every [`WidgetEvent`] to it; `dismiss`
/// cancels whatever the ad session is doing and removes the whole widget.
pub struct ShellContainer {
    layout: ShellLayout,
    controller: AdSessionController,
    dismiss_visible: bool,
    removed: bool,
}

impl ShellContainer {
    pub fn new(layout: ShellLayout, controller: AdSessionController) -> Self {
        Self {
            layout,
            controller,
            dismiss_visible: false,
            removed: false,
        }
    }

    /// Single dispatch entry point: handles `event` to completion
    pub fn handle(&mut self, event: WidgetEvent) {
        match event {
            WidgetEvent::Content(ev) => self.controller.handle_content(ev),
            WidgetEvent::Ad(ev) => self.controller.handle_ad(ev),
            WidgetEvent::MuteClicked => self.controller.toggle_mute(),
            WidgetEvent::DismissClicked => {
                if self.dismiss_visible {
                    self.dismiss();
                } else {
                    debug!("dismiss button not shown yet, ignoring click");
                }
            }
        }
    }

    /// Show the dismiss button
    pub fn reveal_dismiss(&mut self) {
        if !self.removed && !self.dismiss_visible {
            debug!("showing dismiss button");
            self.dismiss_visible = true;
        }
    }

    /// Remove the widget from the page, destroying any live ad session.
    /// Safe to call at any time and more than once.
    pub fn dismiss(&mut self) {
        if self.removed {
            debug!("widget already dismissed");
            return;
        }
        info!("dismissing widget in {:?}", self.controller.state());
        self.controller.teardown();
        self.dismiss_visible = false;
        self.removed = true;
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }

    pub fn is_dismiss_visible(&self) -> bool {
        self.dismiss_visible
    }

    pub fn layout(&self) -> &ShellLayout {
        &self.layout
    }

    pub fn controller(&self) -> &AdSessionController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut AdSessionController {
        &mut self.controller
    }
}
