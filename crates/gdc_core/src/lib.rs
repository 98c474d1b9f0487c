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

    lib.rs

    Graphics Display Controller emulation core.

    Models the NEC uPD7220 / Intel 82720 GDC: the command FIFO, register file,
    command processor, scanline renderer and sync generator. Display memory,
    the frame buffer and the interrupt/DMA wiring belong to the host machine
    and are reached through the traits in device_traits.

*/

#![allow(dead_code)]

pub mod bus;
pub mod config;
pub mod device_traits;
pub mod devices;

pub use crate::{
    config::{GdcConfig, GdcVariant},
    device_traits::{
        display::{CellAttributes, CellKind, CellVideo, DisplayCell, DisplayPixelSink},
        lines::{GdcLine, GdcLineHandler, NullLineHandler},
        vram::DisplayMemory,
    },
    devices::{
        framebuffer::MonoFrameBuffer,
        gdc::{Gdc, GdcDebugState, GdcState},
        vram::VideoRam,
    },
};
