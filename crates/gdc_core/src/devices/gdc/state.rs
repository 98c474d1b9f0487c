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

    devices::gdc::state.rs

    Save state support for the GDC.

*/

use serde_derive::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use super::{
    commands::DispatchState,
    fifo::{FifoDirection, FifoEntry},
    regs::RegisterFile,
    timing::TimingGenerator,
    DmaRequest,
    Gdc,
    LINE_COUNT,
};
use crate::device_traits::lines::GdcLine;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GdcState {
    pub regs: RegisterFile,
    pub fifo_direction: FifoDirection,
    pub fifo: Vec<FifoEntry>,
    pub dispatch: DispatchState,
    pub command_register: u8,
    pub lpen_detect: bool,
    pub dma: Option<DmaRequest>,
    pub timing: TimingGenerator,
    pub line_levels: [bool; LINE_COUNT],
    pub clock_accumulator: f64,
    pub tick_accumulator: u64,
}

impl Gdc {
    pub fn save_state(&self) -> GdcState {
        GdcState {
            regs: self.regs.clone(),
            fifo_direction: self.fifo.direction(),
            fifo: self.fifo.entries(),
            dispatch: self.dispatch,
            command_register: self.command_register,
            lpen_detect: self.lpen_detect,
            dma: self.dma,
            timing: self.timing.clone(),
            line_levels: self.line_levels,
            clock_accumulator: self.clock_accumulator,
            tick_accumulator: self.tick_accumulator,
        }
    }

    /// Restore a saved state. The line handler is told about any line whose level differs.
    pub fn load_state(&mut self, state: &GdcState) {
        self.regs = state.regs.clone();
        self.fifo.restore(state.fifo_direction, &state.fifo);
        self.dispatch = state.dispatch;
        self.command_register = state.command_register;
        self.lpen_detect = state.lpen_detect;
        self.dma = state.dma;
        self.timing = state.timing.clone();
        self.clock_accumulator = state.clock_accumulator;
        self.tick_accumulator = state.tick_accumulator;

        for line in GdcLine::iter() {
            self.set_line(line, state.line_levels[line as usize]);
        }
        log::debug!("GDC: state loaded, frame {}", self.timing.frame());
    }
}
