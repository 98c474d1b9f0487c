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

    devices::gdc::fifo.rs

    The GDC's 16-entry bidirectional FIFO.

    In write direction the FIFO carries command and parameter bytes from the
    host, each tagged with a command flag. In read direction it carries bytes
    produced by RDAT, CURD and LPRD back to the host. Changing direction
    discards whatever is queued.

*/

use arraydeque::{ArrayDeque, Saturating};
use serde_derive::{Deserialize, Serialize};

pub const GDC_FIFO_DEPTH: usize = 16;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum FifoDirection {
    /// Host to GDC
    #[default]
    Write,
    /// GDC to host
    Read,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct FifoEntry {
    pub data: u8,
    pub is_command: bool,
}

#[derive(Clone, Debug)]
pub struct CommandFifo {
    queue: ArrayDeque<FifoEntry, GDC_FIFO_DEPTH, Saturating>,
    direction: FifoDirection,
    overflows: u64,
}

impl Default for CommandFifo {
    fn default() -> Self {
        Self {
            queue: ArrayDeque::new(),
            direction: FifoDirection::Write,
            overflows: 0,
        }
    }
}

impl CommandFifo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a byte. A byte written to a full FIFO is dropped.
    pub fn enqueue(&mut self, data: u8, is_command: bool) -> bool {
        match self.queue.push_back(FifoEntry { data, is_command }) {
            Ok(()) => true,
            Err(_) => {
                self.overflows += 1;
                log::warn!(
                    "GDC FIFO full, dropped {} byte: {:02X}",
                    if is_command { "command" } else { "parameter" },
                    data
                );
                false
            }
        }
    }

    pub fn dequeue(&mut self) -> Option<FifoEntry> {
        self.queue.pop_front()
    }

    /// Remove the entry at the head of the FIFO only if it is a parameter byte.
    pub fn dequeue_parameter(&mut self) -> Option<u8> {
        if self.peek_is_parameter() {
            self.queue.pop_front().map(|e| e.data)
        }
        else {
            None
        }
    }

    pub fn peek_is_command(&self) -> bool {
        matches!(self.queue.front(), Some(e) if e.is_command)
    }

    pub fn peek_is_parameter(&self) -> bool {
        matches!(self.queue.front(), Some(e) if !e.is_command)
    }

    pub fn set_direction(&mut self, direction: FifoDirection) {
        if direction != self.direction {
            if !self.queue.is_empty() {
                log::trace!(
                    "GDC FIFO direction change to {:?} discarded {} entries",
                    direction,
                    self.queue.len()
                );
            }
            self.queue.clear();
            self.direction = direction;
        }
    }

    pub fn direction(&self) -> FifoDirection {
        self.direction
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.queue.is_full()
    }

    pub fn overflows(&self) -> u64 {
        self.overflows
    }

    pub fn entries(&self) -> Vec<FifoEntry> {
        self.queue.iter().copied().collect()
    }

    /// Rebuild the FIFO from saved entries. Entries beyond the FIFO depth are dropped.
    pub fn restore(&mut self, direction: FifoDirection, entries: &[FifoEntry]) {
        self.queue.clear();
        self.direction = direction;
        for entry in entries.iter().take(GDC_FIFO_DEPTH) {
            let _ = self.queue.push_back(*entry);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    #[test]
    fn fifo_full_and_empty_track_length() {
        let mut rng = StdRng::seed_from_u64(0x7220);
        let mut fifo = CommandFifo::new();
        let mut shadow = std::collections::VecDeque::new();

        for _ in 0..2000 {
            if rng.gen_bool(0.55) {
                let byte: u8 = rng.gen();
                let accepted = fifo.enqueue(byte, rng.gen_bool(0.2));
                assert_eq!(accepted, shadow.len() < GDC_FIFO_DEPTH);
                if accepted {
                    shadow.push_back(byte);
                }
            }
            else {
                assert_eq!(fifo.dequeue().map(|e| e.data), shadow.pop_front());
            }
            assert!(fifo.len() <= GDC_FIFO_DEPTH);
            assert_eq!(fifo.is_full(), fifo.len() == GDC_FIFO_DEPTH);
            assert_eq!(fifo.is_empty(), fifo.len() == 0);
            assert!(!(fifo.is_full() && fifo.is_empty()));
        }
    }

    #[test]
    fn seventeenth_byte_is_dropped() {
        let mut fifo = CommandFifo::new();
        for i in 0..GDC_FIFO_DEPTH as u8 {
            assert!(fifo.enqueue(i, false));
        }
        assert!(!fifo.enqueue(0xAA, false));
        assert_eq!(fifo.len(), GDC_FIFO_DEPTH);
        assert_eq!(fifo.overflows(), 1);
        assert_eq!(fifo.entries().last().map(|e| e.data), Some(15));
    }

    #[test]
    fn direction_change_clears_fifo() {
        let mut fifo = CommandFifo::new();
        fifo.enqueue(0x47, true);
        fifo.enqueue(0x28, false);

        fifo.set_direction(FifoDirection::Write);
        assert_eq!(fifo.len(), 2);

        fifo.set_direction(FifoDirection::Read);
        assert!(fifo.is_empty());
        assert_eq!(fifo.direction(), FifoDirection::Read);
    }

    #[test]
    fn dequeue_parameter_stops_at_command() {
        let mut fifo = CommandFifo::new();
        fifo.enqueue(0x10, false);
        fifo.enqueue(0x4A, true);
        assert_eq!(fifo.dequeue_parameter(), Some(0x10));
        assert_eq!(fifo.dequeue_parameter(), None);
        assert!(fifo.peek_is_command());
    }
}
