/*
    MartyPC
    https://github.com/dbalsom/martypc

    Copyright 2022-2025 Daniel Balsom

    Permission is hereby granted, free of charge, to any person obtaining a
    copy of this software and associated documentation files (the “Software”),
    to deal in the Software without restriction, including without limitation
    the rights to use, copy, modify, merge, publish, distribute, sublicense,
    and/or sell copies of the Software, and to permit persons to whom the
    Software is furnished to do so, subject to the following conditions:

    The above copyright notice and this permission notice shall be included in
    all copies or substantial portions of the Software.

    THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
    IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
    FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
    AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
    LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
    FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
    DEALINGS IN THE SOFTWARE.

    ---------------------------------------------------------------------------

    devices::gdc::commands.rs

    Command decoding and dispatch.

    Opcodes are matched against an ordered list of (mask, value) rules, first
    match wins. Each decoded command carries an arity that tells the dispatcher
    when its parameters are complete. Parameter bytes are held in the FIFO until
    the command fires or a new command byte resolves it.

*/

use serde_derive::{Deserialize, Serialize};
use strum_macros::IntoStaticStr;

use super::{
    fifo::FifoDirection,
    regs::{TransferType, WriteMode, PRAM_SIZE, SYNC_PARAM_COUNT},
    Gdc,
};
use crate::device_traits::vram::DisplayMemory;

#[derive(Copy, Clone, Debug, Eq, PartialEq, IntoStaticStr, Serialize, Deserialize)]
pub enum CommandKind {
    Reset,
    Sync,
    Vsync,
    Cchar,
    Start,
    Bctrl,
    Zoom,
    Curs,
    Pitch,
    Mask,
    Figs,
    Figd,
    Gchrd,
    Curd,
    Lprd,
    Pram,
    Wdat,
    Rdat,
    Dmaw,
    Dmar,
}

pub struct DecodeRule {
    pub mask:  u8,
    pub value: u8,
    pub kind:  CommandKind,
}

const fn rule(mask: u8, value: u8, kind: CommandKind) -> DecodeRule {
    DecodeRule { mask, value, kind }
}

pub const DECODE_RULES: [DecodeRule; 20] = [
    rule(0xFF, 0x00, CommandKind::Reset),
    rule(0xFE, 0x0E, CommandKind::Sync),
    rule(0xFE, 0x6E, CommandKind::Vsync),
    rule(0xFF, 0x4B, CommandKind::Cchar),
    rule(0xFF, 0x6B, CommandKind::Start),
    rule(0xFE, 0x0C, CommandKind::Bctrl),
    rule(0xFF, 0x46, CommandKind::Zoom),
    rule(0xFF, 0x49, CommandKind::Curs),
    rule(0xFF, 0x47, CommandKind::Pitch),
    rule(0xFF, 0x4A, CommandKind::Mask),
    rule(0xFF, 0x4C, CommandKind::Figs),
    rule(0xFF, 0x6C, CommandKind::Figd),
    rule(0xFF, 0x68, CommandKind::Gchrd),
    rule(0xFF, 0xE0, CommandKind::Curd),
    rule(0xFF, 0xC0, CommandKind::Lprd),
    rule(0xF0, 0x70, CommandKind::Pram),
    rule(0xE4, 0x20, CommandKind::Wdat),
    rule(0xE4, 0xA0, CommandKind::Rdat),
    rule(0xE4, 0x24, CommandKind::Dmaw),
    rule(0xE4, 0xA4, CommandKind::Dmar),
];

/// How many parameter bytes a command takes.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Arity {
    /// Exactly n bytes.
    Fixed(u8),
    /// Either none or exactly n bytes.
    Optional(u8),
    /// Between min and max bytes.
    Range(u8, u8),
    /// Any number of units of the given size, until the next command.
    Stream(u8),
}

impl Arity {
    /// Number of queued parameter bytes at which the command fires without waiting for
    /// another command byte.
    pub fn fires_at(&self) -> usize {
        match *self {
            Arity::Fixed(n) | Arity::Optional(n) => n as usize,
            Arity::Range(_, max) => max as usize,
            Arity::Stream(unit) => unit.max(1) as usize,
        }
    }

    /// Whether a command that was interrupted with `count` parameter bytes may be applied.
    pub fn accepts_partial(&self, count: usize) -> bool {
        match *self {
            Arity::Fixed(n) | Arity::Optional(n) => count == n as usize,
            Arity::Range(min, max) => count >= min as usize && count <= max as usize,
            Arity::Stream(_) => false,
        }
    }

    /// Whether being interrupted with `count` bytes is an ordinary way for the command to end.
    pub fn ends_quietly(&self, count: usize) -> bool {
        match *self {
            Arity::Optional(_) | Arity::Stream(_) => count == 0,
            _ => false,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Command {
    Reset,
    Sync { display_enable: bool },
    Vsync { master: bool },
    Cchar,
    Start,
    Bctrl { display_enable: bool },
    Zoom,
    Curs,
    Pitch,
    Mask,
    Figs,
    Figd,
    Gchrd,
    Curd,
    Lprd,
    Pram { offset: u8 },
    Wdat { transfer: TransferType, mode: WriteMode },
    Rdat { transfer: TransferType },
    Dmaw { transfer: TransferType, mode: WriteMode },
    Dmar { transfer: TransferType },
}

impl Command {
    pub fn decode(opcode: u8) -> Option<Command> {
        let kind = DECODE_RULES
            .iter()
            .find(|r| opcode & r.mask == r.value)
            .map(|r| r.kind)?;

        let cmd = match kind {
            CommandKind::Reset => Command::Reset,
            CommandKind::Sync => Command::Sync {
                display_enable: opcode & 0x01 != 0,
            },
            CommandKind::Vsync => Command::Vsync {
                master: opcode & 0x01 != 0,
            },
            CommandKind::Cchar => Command::Cchar,
            CommandKind::Start => Command::Start,
            CommandKind::Bctrl => Command::Bctrl {
                display_enable: opcode & 0x01 != 0,
            },
            CommandKind::Zoom => Command::Zoom,
            CommandKind::Curs => Command::Curs,
            CommandKind::Pitch => Command::Pitch,
            CommandKind::Mask => Command::Mask,
            CommandKind::Figs => Command::Figs,
            CommandKind::Figd => Command::Figd,
            CommandKind::Gchrd => Command::Gchrd,
            CommandKind::Curd => Command::Curd,
            CommandKind::Lprd => Command::Lprd,
            CommandKind::Pram => Command::Pram { offset: opcode & 0x0F },
            CommandKind::Wdat => Command::Wdat {
                transfer: TransferType::from_opcode(opcode),
                mode: WriteMode::from(opcode),
            },
            CommandKind::Rdat => Command::Rdat {
                transfer: TransferType::from_opcode(opcode),
            },
            CommandKind::Dmaw => Command::Dmaw {
                transfer: TransferType::from_opcode(opcode),
                mode: WriteMode::from(opcode),
            },
            CommandKind::Dmar => Command::Dmar {
                transfer: TransferType::from_opcode(opcode),
            },
        };
        Some(cmd)
    }

    pub fn kind(&self) -> CommandKind {
        match self {
            Command::Reset => CommandKind::Reset,
            Command::Sync { .. } => CommandKind::Sync,
            Command::Vsync { .. } => CommandKind::Vsync,
            Command::Cchar => CommandKind::Cchar,
            Command::Start => CommandKind::Start,
            Command::Bctrl { .. } => CommandKind::Bctrl,
            Command::Zoom => CommandKind::Zoom,
            Command::Curs => CommandKind::Curs,
            Command::Pitch => CommandKind::Pitch,
            Command::Mask => CommandKind::Mask,
            Command::Figs => CommandKind::Figs,
            Command::Figd => CommandKind::Figd,
            Command::Gchrd => CommandKind::Gchrd,
            Command::Curd => CommandKind::Curd,
            Command::Lprd => CommandKind::Lprd,
            Command::Pram { .. } => CommandKind::Pram,
            Command::Wdat { .. } => CommandKind::Wdat,
            Command::Rdat { .. } => CommandKind::Rdat,
            Command::Dmaw { .. } => CommandKind::Dmaw,
            Command::Dmar { .. } => CommandKind::Dmar,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind().into()
    }

    pub fn arity(&self) -> Arity {
        match self {
            Command::Reset => Arity::Optional(SYNC_PARAM_COUNT as u8),
            Command::Sync { .. } => Arity::Fixed(SYNC_PARAM_COUNT as u8),
            Command::Cchar => Arity::Fixed(3),
            Command::Zoom | Command::Pitch => Arity::Fixed(1),
            Command::Mask => Arity::Fixed(2),
            Command::Curs => Arity::Range(3, 4),
            Command::Figs => Arity::Range(1, 11),
            Command::Pram { .. } => Arity::Stream(1),
            Command::Wdat { transfer, .. } => Arity::Stream(transfer.unit_size()),
            Command::Vsync { .. }
            | Command::Start
            | Command::Bctrl { .. }
            | Command::Figd
            | Command::Gchrd
            | Command::Curd
            | Command::Lprd
            | Command::Rdat { .. }
            | Command::Dmaw { .. }
            | Command::Dmar { .. } => Arity::Fixed(0),
        }
    }

    /// The state of a streaming command after it has consumed `count` parameter bytes.
    pub fn advanced(&self, count: usize) -> Command {
        match *self {
            Command::Pram { offset } => Command::Pram {
                offset: (offset as usize + count).min(PRAM_SIZE) as u8,
            },
            other => other,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum DispatchState {
    #[default]
    Idle,
    AwaitingParams(Command),
}

impl Gdc {
    /// Handle a byte written to the command port.
    pub(super) fn write_command<'m>(&mut self, byte: u8, mut vram: Option<&mut (dyn DisplayMemory + 'm)>) {
        let Some(cmd) = Command::decode(byte)
        else {
            log::warn!("GDC: Unknown command byte: {:02X}", byte);
            return;
        };

        self.fifo.set_direction(FifoDirection::Write);

        if let Command::Reset = cmd {
            self.cancel_pending();
        }
        else {
            self.resolve_pending(vram.as_deref_mut());
        }

        self.fifo.enqueue(byte, true);
        if let Some(entry) = self.fifo.dequeue() {
            self.command_register = entry.data;
        }

        self.log_cmd(cmd, &format!("{:02X}", byte));

        if let Command::Reset = cmd {
            self.reset_controller();
        }

        match cmd.arity() {
            Arity::Fixed(0) => {
                self.dispatch = DispatchState::Idle;
                self.execute(cmd, &[], vram);
            }
            _ => {
                self.dispatch = DispatchState::AwaitingParams(cmd);
            }
        }
    }

    /// Handle a byte written to the parameter port.
    pub(super) fn write_parameter<'m>(&mut self, byte: u8, vram: Option<&mut (dyn DisplayMemory + 'm)>) {
        self.fifo.set_direction(FifoDirection::Write);

        let cmd = match self.dispatch {
            DispatchState::Idle => {
                log::warn!("GDC: Parameter byte {:02X} with no command pending, dropped", byte);
                return;
            }
            DispatchState::AwaitingParams(cmd) => cmd,
        };

        if !self.fifo.enqueue(byte, false) {
            return;
        }

        let arity = cmd.arity();
        if self.fifo.len() < arity.fires_at() {
            return;
        }

        let params = self.drain_params();
        match arity {
            Arity::Stream(_) => {
                self.dispatch = DispatchState::AwaitingParams(cmd.advanced(params.len()));
                self.execute(cmd, &params, vram);
            }
            _ => {
                self.dispatch = DispatchState::Idle;
                self.execute(cmd, &params, vram);
            }
        }
    }

    /// A new command has arrived: apply the pending command if it has enough parameters,
    /// otherwise discard them.
    fn resolve_pending<'m>(&mut self, vram: Option<&mut (dyn DisplayMemory + 'm)>) {
        let DispatchState::AwaitingParams(cmd) = self.dispatch
        else {
            return;
        };
        self.dispatch = DispatchState::Idle;

        let params = self.drain_params();
        let arity = cmd.arity();
        if arity.accepts_partial(params.len()) {
            self.execute(cmd, &params, vram);
        }
        else if !arity.ends_quietly(params.len()) {
            log::warn!(
                "GDC: {} interrupted with {} of {:?} parameter bytes, discarded",
                cmd.name(),
                params.len(),
                arity
            );
        }
    }

    fn cancel_pending(&mut self) {
        if let DispatchState::AwaitingParams(cmd) = self.dispatch {
            let discarded = self.drain_params();
            if !discarded.is_empty() {
                log::trace!("GDC: RESET cancelled {} with {} parameter bytes", cmd.name(), discarded.len());
            }
        }
        self.dispatch = DispatchState::Idle;
    }

    fn drain_params(&mut self) -> Vec<u8> {
        let mut params = Vec::with_capacity(self.fifo.len());
        while let Some(byte) = self.fifo.dequeue_parameter() {
            params.push(byte);
        }
        params
    }

    pub fn dispatch_state(&self) -> DispatchState {
        self.dispatch
    }

    pub fn command_register(&self) -> u8 {
        self.command_register
    }
}
