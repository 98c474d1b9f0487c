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

    devices::gdc::render.rs

    The GDC scanline renderer.

    Source lines are assigned to display partitions in parameter RAM order. For
    each source line every active word is fetched from display memory and handed
    to the DisplayPixelSink as a DisplayCell, once per output row the line
    occupies after zoom and interlace.

*/

use super::{
    regs::{Partition, EAD_MASK},
    Gdc,
};
use crate::device_traits::{
    display::{CellAttributes, CellKind, DisplayCell, DisplayPixelSink},
    vram::DisplayMemory,
};

pub const ATTR_HIGHLIGHT: u8 = 0x01;
pub const ATTR_BLINK: u8 = 0x02;
pub const ATTR_GPA_SHIFT: u8 = 2;
pub const ATTR_REVERSE: u8 = 0x10;
pub const ATTR_UNDERLINE: u8 = 0x20;

impl Gdc {
    /// Number of source lines described by the partition table, limited to the active lines.
    pub fn display_lines(&self) -> u32 {
        let total: u32 = (0..self.regs.partition_count())
            .map(|i| self.regs.get_display_partition(i).span())
            .sum();
        total.min(self.regs.active_lines as u32)
    }

    /// Render every source line of the display. Returns the number of source lines rendered.
    pub fn update(&self, vram: &dyn DisplayMemory, sink: &mut dyn DisplayPixelSink) -> u32 {
        if !self.regs.display_enabled {
            return 0;
        }
        let lines = self.display_lines();
        for line in 0..lines {
            self.render_scanline(line, vram, sink);
        }
        lines
    }

    /// Render a single source line. Returns false if the line is outside the display.
    pub fn render_scanline(&self, line: u32, vram: &dyn DisplayMemory, sink: &mut dyn DisplayPixelSink) -> bool {
        if !self.regs.display_enabled {
            return false;
        }
        let Some((part, rel)) = self.locate_line(line)
        else {
            return false;
        };

        let text = self.regs.partition_is_text(&part);
        let (row_address, linecount) = self.row_address(&part, rel, text);
        let zoom = self.regs.zoom_display.max(1) as u32;
        let repeats = zoom * self.regs.interlace.line_multiplier();
        let (kind, width) = match (text, part.wide) {
            (true, _) => (CellKind::Text, self.config.char_width),
            (false, true) => (CellKind::Graphics, 16),
            (false, false) => (CellKind::Graphics, 8),
        };
        let blink_on = self.blink_phase_on();

        for rep in 0..repeats {
            let y = line * repeats + rep;
            for column in 0..self.regs.active_words as u32 {
                let (address, raw) = fetch_cell(vram, &part, row_address, column);
                let (code, line_attributes, attr) = if text {
                    self.text_cell(raw, part.wide, address, linecount, blink_on)
                }
                else {
                    (raw, 0, CellAttributes::default())
                };

                sink.display_pixels(&DisplayCell {
                    x: column * width as u32 * zoom,
                    y,
                    column: column as u16,
                    linecount: linecount as u8,
                    address,
                    code,
                    line_attributes,
                    attr,
                    kind,
                    width,
                    zoom: zoom as u8,
                });
            }
        }
        true
    }

    /// Find the partition holding a source line and the line's offset within it.
    fn locate_line(&self, line: u32) -> Option<(Partition, u32)> {
        if line >= self.regs.active_lines as u32 {
            return None;
        }
        let mut top = 0;
        for i in 0..self.regs.partition_count() {
            let part = self.regs.get_display_partition(i);
            if line < top + part.span() {
                return Some((part, line - top));
            }
            top += part.span();
        }
        None
    }

    fn row_address(&self, part: &Partition, rel: u32, text: bool) -> (u32, u32) {
        let pitch = self.regs.pitch as u32;
        if text {
            let lpr = self.regs.lines_per_row.max(1) as u32;
            ((part.start + (rel / lpr) * pitch) & EAD_MASK, rel % lpr)
        }
        else {
            ((part.start + rel * pitch) & EAD_MASK, 0)
        }
    }

    /// Display memory word address of a cell on a source line.
    pub fn display_address(&self, line: u32, column: u32) -> Option<u32> {
        let (part, rel) = self.locate_line(line)?;
        let text = self.regs.partition_is_text(&part);
        let (row_address, _) = self.row_address(&part, rel, text);
        let offset = if part.wide { column } else { column / 2 };
        Some((row_address + offset) & EAD_MASK)
    }

    fn blink_phase_on(&self) -> bool {
        let period = 2 * self.regs.blink_rate.max(1) as u64;
        (self.timing.frame() / period) % 2 == 0
    }

    fn text_cell(
        &self,
        raw: u16,
        wide: bool,
        address: u32,
        linecount: u32,
        blink_on: bool,
    ) -> (u16, u8, CellAttributes) {
        let code = raw & 0x00FF;
        let attr_byte = if wide { (raw >> 8) as u8 } else { 0 };
        let last_line = self.regs.lines_per_row.max(1) as u32 - 1;

        let cursor = self.regs.cursor_enabled
            && address == self.regs.ead
            && linecount >= self.regs.cursor_top as u32
            && linecount <= self.regs.cursor_bottom as u32
            && (self.regs.cursor_steady || blink_on);
        let underline = attr_byte & ATTR_UNDERLINE != 0 && linecount == last_line;

        let attr = CellAttributes {
            lten: cursor || underline,
            rvv: attr_byte & ATTR_REVERSE != 0,
            vsp: attr_byte & ATTR_BLINK != 0 && !blink_on,
            gpa: (attr_byte >> ATTR_GPA_SHIFT) & 0x03,
            hlgt: attr_byte & ATTR_HIGHLIGHT != 0,
        };
        (code, attr_byte, attr)
    }
}

/// Fetch a cell: a whole word for wide partitions, otherwise one byte, low byte first.
#[inline]
fn fetch_cell(vram: &dyn DisplayMemory, part: &Partition, row_address: u32, column: u32) -> (u32, u16) {
    if part.wide {
        let address = (row_address + column) & EAD_MASK;
        (address, vram.read_word(address))
    }
    else {
        let address = (row_address + column / 2) & EAD_MASK;
        let word = vram.read_word(address);
        let byte = if column & 1 == 0 { word & 0x00FF } else { word >> 8 };
        (address, byte)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::GdcConfig,
        device_traits::display::CellVideo,
        devices::vram::VideoRam,
    };

    const AW: u32 = 80;

    #[derive(Default)]
    struct Recorder {
        cells: Vec<DisplayCell>,
    }

    impl DisplayPixelSink for Recorder {
        fn display_pixels(&mut self, cell: &DisplayCell) {
            self.cells.push(*cell);
        }
    }

    fn send(gdc: &mut Gdc, cmd: u8, params: &[u8]) {
        gdc.write_command(cmd, None);
        for &p in params {
            gdc.write_parameter(p, None);
        }
    }

    fn partition_bytes(start: u32, length: u16, image: bool, wide: bool) -> [u8; 4] {
        [
            start as u8,
            (start >> 8) as u8,
            ((start >> 16) & 0x03) as u8 | ((length & 0x0F) as u8) << 4,
            ((length >> 4) & 0x3F) as u8 | (image as u8) << 6 | (wide as u8) << 7,
        ]
    }

    /// A character mode display, 80 words by 360 lines.
    fn character_gdc() -> Gdc {
        let mut gdc = Gdc::new(GdcConfig::default());
        send(&mut gdc, 0x0F, &[0x20, 0x4E, 0x27, 0x0E, 0x28, 0x06, 0x68, 0x01]);
        gdc
    }

    fn load_partitions(gdc: &mut Gdc, parts: &[(u32, u16, bool, bool)]) {
        let bytes: Vec<u8> = parts
            .iter()
            .flat_map(|&(start, len, image, wide)| partition_bytes(start, len, image, wide))
            .collect();
        send(gdc, 0x70, &bytes);
    }

    #[test]
    fn four_partitions_render_every_line() {
        let mut gdc = character_gdc();
        // 2 lines per row, cursor off
        send(&mut gdc, 0x4B, &[0x01, 0x00, 0x00]);
        let parts = [(0x0000, 2, false, true), (0x1000, 4, false, true), (0x0800, 1, false, true), (0x2000, 3, false, true)];
        load_partitions(&mut gdc, &parts);

        let vram = VideoRam::new(0x4000);
        let mut rec = Recorder::default();
        let lines = gdc.update(&vram, &mut rec);
        assert_eq!(lines, 14);
        assert_eq!(rec.cells.len() as u32, 14 * AW);

        let mut line = 0;
        for &(start, len, _, _) in &parts {
            for rel in 0..=len as u32 {
                let row: Vec<&DisplayCell> = rec.cells.iter().filter(|c| c.y == line).collect();
                assert_eq!(row.len() as u32, AW, "line {}", line);
                for cell in row {
                    let expected = start + (rel / 2) * AW + cell.column as u32;
                    assert_eq!(cell.address, expected, "line {} column {}", line, cell.column);
                    assert_eq!(cell.linecount as u32, rel % 2);
                }
                line += 1;
            }
        }
    }

    #[test]
    fn disabled_display_renders_nothing() {
        let mut gdc = character_gdc();
        load_partitions(&mut gdc, &[(0, 10, false, true)]);
        send(&mut gdc, 0x0C, &[]);

        let vram = VideoRam::new(0x1000);
        let mut rec = Recorder::default();
        assert_eq!(gdc.update(&vram, &mut rec), 0);
        assert!(rec.cells.is_empty());
    }

    #[test]
    fn zoom_and_interlace_repeat_lines() {
        let mut gdc = Gdc::new(GdcConfig::default());
        // graphics, interlaced
        send(&mut gdc, 0x0F, &[0x0B, 0x4E, 0x27, 0x0E, 0x28, 0x06, 0x68, 0x01]);
        send(&mut gdc, 0x46, &[0x10]);
        load_partitions(&mut gdc, &[(0x0000, 1, true, true), (0x0000, 0, true, true)]);

        let vram = VideoRam::new(0x1000);
        let mut rec = Recorder::default();
        assert_eq!(gdc.update(&vram, &mut rec), 3);
        // 3 source lines, zoom 2, interlace 2
        assert_eq!(rec.cells.len() as u32, 3 * 4 * AW);
        let max_y = rec.cells.iter().map(|c| c.y).max();
        assert_eq!(max_y, Some(11));
        let first = rec.cells.iter().find(|c| c.y == 5 && c.column == 1).map(|c| (c.address, c.x));
        assert_eq!(first, Some((AW + 1, 16 * 2)));
    }

    #[test]
    fn mixed_mode_uses_image_flag() {
        let mut gdc = Gdc::new(GdcConfig::default());
        send(&mut gdc, 0x0F, &[0x00, 0x4E, 0x27, 0x0E, 0x28, 0x06, 0x68, 0x01]);
        load_partitions(&mut gdc, &[(0x0000, 0, false, true), (0x0100, 0, true, false)]);

        let mut vram = VideoRam::new(0x1000);
        vram.write_word(0x100, 0xBBAA);
        let mut rec = Recorder::default();
        gdc.update(&vram, &mut rec);

        let text = &rec.cells[0];
        assert_eq!(text.kind, CellKind::Text);
        assert_eq!(text.width, 8);

        let graphics: Vec<&DisplayCell> = rec.cells.iter().filter(|c| c.y == 1).take(2).collect();
        assert_eq!(graphics[0].kind, CellKind::Graphics);
        assert_eq!(graphics[0].width, 8);
        assert_eq!(graphics[0].code, 0xAA);
        assert_eq!(graphics[1].code, 0xBB);
        assert_eq!(graphics[1].address, 0x100);
    }

    #[test]
    fn cursor_lights_cell_at_ead() {
        let mut gdc = character_gdc();
        // 16 lines per row, cursor on, steady, lines 14..15
        send(&mut gdc, 0x4B, &[0x8F, 0x2E, 15 << 3]);
        load_partitions(&mut gdc, &[(0x0000, 31, false, true)]);
        send(&mut gdc, 0x49, &[0x55, 0x00, 0x00, 0x00]);

        let vram = VideoRam::new(0x1000);
        let mut rec = Recorder::default();
        gdc.update(&vram, &mut rec);

        let lit: Vec<(u32, u8)> = rec
            .cells
            .iter()
            .filter(|c| c.attr.lten)
            .map(|c| (c.address, c.linecount))
            .collect();
        assert_eq!(lit, vec![(0x55, 14), (0x55, 15)]);
    }

    #[test]
    fn blink_off_phase_suppresses_over_everything() {
        let mut gdc = character_gdc();
        // 2 lines per row, blink rate 1
        send(&mut gdc, 0x4B, &[0x01, 0x40, 0x00]);
        load_partitions(&mut gdc, &[(0x0000, 1, false, true)]);

        let mut vram = VideoRam::new(0x1000);
        let attr = ATTR_BLINK | ATTR_REVERSE | ATTR_UNDERLINE;
        vram.write_word(0, (attr as u16) << 8 | 0x41);

        let mut rec = Recorder::default();
        gdc.update(&vram, &mut rec);
        let cell = rec.cells.iter().find(|c| c.address == 0 && c.linecount == 1).copied();
        assert_eq!(cell.map(|c| c.attr.video()), Some(CellVideo::Lit));

        let frame = gdc.screen_timing().frame_clocks();
        gdc.run_clocks(frame * 2 + 1);
        assert_eq!(gdc.frame_count(), 2);

        let mut rec = Recorder::default();
        gdc.update(&vram, &mut rec);
        let cell = rec.cells.iter().find(|c| c.address == 0 && c.linecount == 1).copied();
        let attr = cell.map(|c| c.attr);
        assert_eq!(attr.map(|a| (a.vsp, a.lten, a.rvv)), Some((true, true, true)));
        assert_eq!(attr.map(|a| a.video()), Some(CellVideo::Blank));
    }
}
