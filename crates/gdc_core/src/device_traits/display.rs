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

    device_traits::display.rs

    Defines the per-cell display callback.

    The renderer does not own a frame buffer. For every character or graphics
    cell of every scanline it hands a DisplayCell to a DisplayPixelSink, which
    decides what pixels to produce.

*/

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CellKind {
    Text,
    Graphics,
}

/// Resolved video treatment of a cell.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CellVideo {
    Blank,
    Lit,
    Reversed,
    Normal,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct CellAttributes {
    /// Light enable: force all dots of the line on (cursor, underline).
    pub lten: bool,
    /// Reverse video.
    pub rvv: bool,
    /// Video suppress: force all dots of the line off (blink off phase).
    pub vsp: bool,
    /// General purpose attribute bits.
    pub gpa: u8,
    /// Highlight.
    pub hlgt: bool,
}

impl CellAttributes {
    /// Suppression wins over light enable, which wins over reverse video.
    pub fn video(&self) -> CellVideo {
        if self.vsp {
            CellVideo::Blank
        }
        else if self.lten {
            CellVideo::Lit
        }
        else if self.rvv {
            CellVideo::Reversed
        }
        else {
            CellVideo::Normal
        }
    }
}

#[derive(Copy, Clone, Debug)]
pub struct DisplayCell {
    /// Left edge of the cell in output pixels.
    pub x: u32,
    /// Output row.
    pub y: u32,
    pub column: u16,
    /// Line within the character row (always 0 for graphics).
    pub linecount: u8,
    /// Display memory word address the cell was fetched from.
    pub address: u32,
    /// Character code or 16-bit graphics word.
    pub code: u16,
    /// Raw attribute byte of a text cell.
    pub line_attributes: u8,
    pub attr: CellAttributes,
    pub kind: CellKind,
    /// Dots in the cell before horizontal zoom.
    pub width: u8,
    pub zoom: u8,
}

pub trait DisplayPixelSink {
    fn display_pixels(&mut self, cell: &DisplayCell);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suppression_beats_light_enable_beats_reverse() {
        let mut attr = CellAttributes {
            lten: true,
            rvv: true,
            vsp: true,
            ..Default::default()
        };
        assert_eq!(attr.video(), CellVideo::Blank);
        attr.vsp = false;
        assert_eq!(attr.video(), CellVideo::Lit);
        attr.lten = false;
        assert_eq!(attr.video(), CellVideo::Reversed);
        attr.rvv = false;
        assert_eq!(attr.video(), CellVideo::Normal);
    }
}
