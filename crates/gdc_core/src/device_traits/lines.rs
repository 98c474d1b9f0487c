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

    device_traits::lines.rs

    Defines the output lines the GDC drives and the handler trait a host
    implements to observe them.

*/

use strum_macros::{Display, EnumIter};

#[derive(Copy, Clone, Debug, Display, EnumIter, Eq, PartialEq)]
pub enum GdcLine {
    /// DMA request
    Drq,
    /// Vertical retrace interrupt
    Int,
    Hsync,
    Vsync,
    Blank,
}

pub trait GdcLineHandler {
    /// Called only when the level of a line actually changes.
    fn line_changed(&mut self, line: GdcLine, level: bool);
}

/// Handler for a GDC that is not wired to anything.
#[derive(Default)]
pub struct NullLineHandler;

impl GdcLineHandler for NullLineHandler {
    fn line_changed(&mut self, _line: GdcLine, _level: bool) {}
}
