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

    devices::gdc::mod.rs

    Implementation of the NEC uPD7220 / Intel 82720 Graphics Display Controller.

    The GDC is driven entirely by the host: port writes feed the command FIFO
    and dispatcher, run() advances the sync generator, and update() renders the
    display through a DisplayPixelSink. Display memory is owned by the machine
    and lent to the GDC for the duration of each call that needs it.

*/

pub mod commands;
pub mod draw;
pub mod execute;
pub mod fifo;
pub mod io;
pub mod regs;
pub mod render;
pub mod state;
pub mod timing;

use modular_bitfield::prelude::*;

use crate::{
    bus::DeviceRunTimeUnit,
    config::GdcConfig,
    device_traits::lines::{GdcLine, GdcLineHandler, NullLineHandler},
};
use gdc_common::HistoryBuffer;

use commands::{Command, DispatchState};
use fifo::{CommandFifo, FifoDirection};
use regs::{RegisterFile, TransferType, WriteMode, EAD_MASK};
use timing::{ScreenTiming, TimerKind, TimingGenerator};

pub use state::GdcState;

pub const GDC_LOG_LEN: usize = 256;
const LINE_COUNT: usize = 5;

#[bitfield]
#[derive(Copy, Clone)]
pub struct GdcStatus {
    pub data_ready: bool,
    pub fifo_full: bool,
    pub fifo_empty: bool,
    /// Drawing finishes inside the command write, so this reads 0 between accesses.
    pub drawing: bool,
    pub dma_execute: bool,
    pub vsync: bool,
    pub hblank: bool,
    pub light_pen: bool,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, serde_derive::Serialize, serde_derive::Deserialize)]
pub struct DmaRequest {
    /// True for DMAW (memory is written), false for DMAR.
    pub write: bool,
    pub transfer: TransferType,
    pub mode: WriteMode,
    /// Transfer units left before DRQ is released.
    pub remaining: u32,
}

#[derive(Clone, Debug, Default)]
pub struct GdcDebugState {
    pub status: u8,
    pub command_register: u8,
    pub pending_command: Option<String>,
    pub fifo_len: usize,
    pub fifo_direction: FifoDirection,
    pub regs: RegisterFile,
    pub timing: ScreenTiming,
    pub frame: u64,
    pub int: bool,
    pub drq: bool,
    pub cmd_log: Vec<String>,
}

pub struct Gdc {
    config: GdcConfig,
    regs: RegisterFile,
    fifo: CommandFifo,
    dispatch: DispatchState,
    command_register: u8,

    lpen_detect: bool,
    dma: Option<DmaRequest>,

    timing: TimingGenerator,
    clock_accumulator: f64,
    tick_accumulator: u64,

    lines: Box<dyn GdcLineHandler>,
    line_levels: [bool; LINE_COUNT],

    cmd_log: HistoryBuffer<String>,
}

impl Gdc {
    pub fn new(config: GdcConfig) -> Self {
        let regs = RegisterFile::new();
        let timing = TimingGenerator::new(&regs);
        Self {
            config,
            regs,
            fifo: CommandFifo::new(),
            dispatch: DispatchState::Idle,
            command_register: 0,

            lpen_detect: false,
            dma: None,

            timing,
            clock_accumulator: 0.0,
            tick_accumulator: 0,

            lines: Box::new(NullLineHandler),
            line_levels: [false; LINE_COUNT],

            cmd_log: HistoryBuffer::new(GDC_LOG_LEN),
        }
    }

    pub fn set_line_handler(&mut self, handler: Box<dyn GdcLineHandler>) {
        self.lines = handler;
    }

    pub fn config(&self) -> &GdcConfig {
        &self.config
    }

    pub fn regs(&self) -> &RegisterFile {
        &self.regs
    }

    pub fn fifo_len(&self) -> usize {
        self.fifo.len()
    }

    pub fn fifo_is_empty(&self) -> bool {
        self.fifo.is_empty()
    }

    pub fn fifo_direction(&self) -> FifoDirection {
        self.fifo.direction()
    }

    pub fn display_enabled(&self) -> bool {
        self.regs.display_enabled
    }

    pub fn screen_timing(&self) -> ScreenTiming {
        self.timing.screen()
    }

    pub fn frame_count(&self) -> u64 {
        self.timing.frame()
    }

    /// Raster position as (line, word clock) within the current frame.
    pub fn raster_position(&self) -> (u32, u32) {
        self.timing.position()
    }

    pub fn line_level(&self, line: GdcLine) -> bool {
        self.line_levels[line as usize]
    }

    pub fn status(&self) -> GdcStatus {
        GdcStatus::new()
            .with_data_ready(self.fifo.direction() == FifoDirection::Read && !self.fifo.is_empty())
            .with_fifo_full(self.fifo.is_full())
            .with_fifo_empty(self.fifo.is_empty())
            .with_dma_execute(self.dma.is_some())
            .with_vsync(self.timing.level(TimerKind::Vsync))
            .with_hblank(self.timing.level(TimerKind::Blank))
            .with_light_pen(self.lpen_detect)
    }

    pub fn status_byte(&self) -> u8 {
        self.status().into_bytes()[0]
    }

    /// Drive an output line, notifying the line handler only on a change of level.
    fn set_line(&mut self, line: GdcLine, level: bool) {
        let idx = line as usize;
        if self.line_levels[idx] != level {
            self.line_levels[idx] = level;
            self.lines.line_changed(line, level);
        }
    }

    fn apply_line_events(&mut self, events: Vec<(GdcLine, bool)>) {
        for (line, level) in events {
            self.set_line(line, level);
            if line == GdcLine::Vsync && level {
                self.set_line(GdcLine::Int, true);
            }
        }
    }

    /// Run the sync generator for the given elapsed time.
    pub fn run(&mut self, delta: DeviceRunTimeUnit) {
        let clocks = match delta {
            DeviceRunTimeUnit::Microseconds(us) => {
                if !us.is_finite() {
                    log::warn!("GDC: run with non-finite delta {} ignored", us);
                    return;
                }
                if us <= 0.0 {
                    return;
                }
                self.clock_accumulator += us * self.config.clock_mhz;
                let whole = self.clock_accumulator.floor();
                self.clock_accumulator -= whole;
                whole as u64
            }
            DeviceRunTimeUnit::SystemTicks(ticks) => {
                let divisor = self.config.clock_divisor.max(1) as u64;
                self.tick_accumulator += ticks as u64;
                let clocks = self.tick_accumulator / divisor;
                self.tick_accumulator %= divisor;
                clocks
            }
        };
        self.run_clocks(clocks);
    }

    /// Run the sync generator for a number of word clocks.
    pub fn run_clocks(&mut self, clocks: u64) {
        if clocks == 0 {
            return;
        }
        let mut events = Vec::new();
        self.timing.run(clocks, &mut events);
        self.apply_line_events(events);
    }

    /// Recompute screen timing from the register file and restart the frame.
    fn rearm_timing(&mut self) {
        let mut events = Vec::new();
        self.timing.rearm(&self.regs, &mut events);
        self.apply_line_events(events);
    }

    /// An external vertical sync pulse. Only honored in slave mode.
    pub fn external_vsync(&mut self) {
        if self.regs.vsync_master {
            log::trace!("GDC: external vsync ignored in master mode");
            return;
        }
        let mut events = Vec::new();
        self.timing.restart_frame(&mut events);
        self.apply_line_events(events);
    }

    /// Latch the display address under the beam into the light pen register.
    pub fn strobe_light_pen(&mut self) {
        let (line, col) = self.timing.position();
        let screen = self.timing.screen();
        if line >= screen.al || col >= screen.aw {
            log::trace!("GDC: light pen strobe outside active area ({}, {})", line, col);
            return;
        }
        let repeats = self.regs.zoom_display.max(1) as u32;
        if let Some(address) = self.display_address(line / repeats, col) {
            self.regs.lpen_address = address & EAD_MASK;
            self.lpen_detect = true;
            log::trace!("GDC: light pen latched {:05X}", self.regs.lpen_address);
        }
    }

    pub fn light_pen_detected(&self) -> bool {
        self.lpen_detect
    }

    pub fn dma_request(&self) -> Option<DmaRequest> {
        self.dma
    }

    /// Acknowledge one DMA transfer unit. Returns true while the GDC still requests transfers.
    pub fn dma_acknowledge(&mut self) -> bool {
        let Some(mut dma) = self.dma
        else {
            return false;
        };
        dma.remaining = dma.remaining.saturating_sub(1);
        if dma.remaining == 0 {
            self.dma = None;
            self.set_line(GdcLine::Drq, false);
            log::trace!("GDC: DMA complete");
            false
        }
        else {
            self.dma = Some(dma);
            true
        }
    }

    /// Controller state effects of RESET.
    fn reset_controller(&mut self) {
        self.regs.reset();
        self.fifo.clear();
        self.lpen_detect = false;
        if self.dma.take().is_some() {
            log::trace!("GDC: RESET aborted DMA request");
        }
        self.set_line(GdcLine::Drq, false);
        self.rearm_timing();
    }

    fn log_cmd(&mut self, cmd: Command, s: &str) {
        self.cmd_log.push(format!("{}: {}", cmd.name(), s));
        log::trace!("GDC command {:?}: {}", cmd, s);
    }

    pub fn get_debug_state(&self) -> GdcDebugState {
        GdcDebugState {
            status: self.status_byte(),
            command_register: self.command_register,
            pending_command: match self.dispatch {
                DispatchState::AwaitingParams(cmd) => Some(cmd.name().to_string()),
                DispatchState::Idle => None,
            },
            fifo_len: self.fifo.len(),
            fifo_direction: self.fifo.direction(),
            regs: self.regs.clone(),
            timing: self.timing.screen(),
            frame: self.timing.frame(),
            int: self.line_level(GdcLine::Int),
            drq: self.line_level(GdcLine::Drq),
            cmd_log: self.cmd_log.as_vec(),
        }
    }
}
