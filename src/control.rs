// src/control.rs

use crate::catalog::PAD_SELECT_ADDRESS;
use crate::mirror::ParameterMirror;
use crate::outbound::{OutboundCommand, OutboundSlot};
use std::ops::ControlFlow;

/// Abstract user intents produced by the input layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    NextPad,
    PrevPad,
    NextCommand,
    PrevCommand,
    Increment,
    Decrement,
    Quit,
}

/// State shared by the control thread and the block callback for the
/// lifetime of one transport session.
#[derive(Debug, Default)]
pub struct ControlContext {
    pub mirror: ParameterMirror,
    pub outbound: OutboundSlot,
}

impl ControlContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one user action. Breaks when the user asked to quit.
    pub fn on_key(&self, action: KeyAction) -> ControlFlow<()> {
        match action {
            KeyAction::NextPad | KeyAction::PrevPad => {
                let delta = if action == KeyAction::NextPad { 1 } else { -1 };
                let pad = self.mirror.navigate_pad(delta);
                self.post(OutboundCommand::new(PAD_SELECT_ADDRESS, pad as u8));
            }
            KeyAction::NextCommand => {
                self.mirror.navigate_command(1);
            }
            KeyAction::PrevCommand => {
                self.mirror.navigate_command(-1);
            }
            KeyAction::Increment | KeyAction::Decrement => {
                let delta = if action == KeyAction::Increment { 1 } else { -1 };
                let (descriptor, value) = self.mirror.adjust_selected(delta);
                self.post(OutboundCommand::new(descriptor.device_address, value));
            }
            KeyAction::Quit => return ControlFlow::Break(()),
        }
        ControlFlow::Continue(())
    }

    fn post(&self, command: OutboundCommand) {
        if let Some(dropped) = self.outbound.post(command) {
            tracing::debug!(?dropped, ?command, "outbound command replaced before send");
        }
    }
}
