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

    devices::vram.rs

    A plain block of word-addressed display memory.

*/

use crate::{config::GdcConfig, device_traits::vram::DisplayMemory};

pub struct VideoRam {
    words: Vec<u16>,
}

impl VideoRam {
    pub fn new(size_words: u32) -> Self {
        Self {
            words: vec![0; size_words.max(1) as usize],
        }
    }

    /// Display memory sized for the configured controller.
    pub fn from_config(config: &GdcConfig) -> Self {
        Self::new(config.vram_words)
    }

    pub fn clear(&mut self) {
        self.words.fill(0);
    }

    pub fn as_slice(&self) -> &[u16] {
        &self.words
    }

    #[inline]
    fn index(&self, address: u32) -> usize {
        address as usize % self.words.len()
    }
}

impl DisplayMemory for VideoRam {
    fn size_words(&self) -> u32 {
        self.words.len() as u32
    }

    #[inline]
    fn read_word(&self, address: u32) -> u16 {
        self.words[self.index(address)]
    }

    #[inline]
    fn write_word(&mut self, address: u32, data: u16) {
        let idx = self.index(address);
        self.words[idx] = data;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vram_wraps_addresses() {
        let mut vram = VideoRam::new(0x100);
        vram.write_word(0x105, 0xBEEF);
        assert_eq!(vram.read_word(0x005), 0xBEEF);
        assert_eq!(vram.read_word(0x205), 0xBEEF);
    }

    #[test]
    fn vram_sized_from_config() {
        let config = GdcConfig::from_toml_str("vram_words = 0x8000").unwrap();
        let vram = VideoRam::from_config(&config);
        assert_eq!(vram.size_words(), 0x8000);
        assert_eq!(VideoRam::from_config(&GdcConfig::default()).size_words(), 0x20000);
    }
}
