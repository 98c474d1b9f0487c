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

    devices::gdc::timing.rs

    The GDC sync generator.

    Time is counted in word clocks from the start of the current frame. Each
    output (BLANK, HSYNC, VSYNC) has a timer holding its level and the clock of
    its next edge. A horizontal line is laid out as
    [active][front porch][sync][back porch], and the frame likewise in lines.

*/

use serde_derive::{Deserialize, Serialize};

use super::regs::RegisterFile;
use crate::device_traits::lines::GdcLine;

pub const MIN_HTOTAL: u32 = 8;
pub const MIN_VTOTAL: u32 = 8;
/// The generator stops advancing past this clock count.
pub const CLOCK_LIMIT: u64 = 1 << 62;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum TimerKind {
    Blank,
    Hsync,
    Vsync,
}

const TIMER_KINDS: [TimerKind; 3] = [TimerKind::Blank, TimerKind::Hsync, TimerKind::Vsync];

impl TimerKind {
    pub fn line(&self) -> GdcLine {
        match self {
            TimerKind::Blank => GdcLine::Blank,
            TimerKind::Hsync => GdcLine::Hsync,
            TimerKind::Vsync => GdcLine::Vsync,
        }
    }
}

/// Screen geometry in word clocks and lines.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ScreenTiming {
    pub aw: u32,
    pub hfp: u32,
    pub hs: u32,
    pub hbp: u32,
    pub htotal: u32,
    pub al: u32,
    pub vfp: u32,
    pub vs: u32,
    pub vbp: u32,
    pub vtotal: u32,
}

impl ScreenTiming {
    pub fn from_registers(regs: &RegisterFile) -> Self {
        let mut t = ScreenTiming {
            aw: regs.active_words as u32,
            hfp: regs.hfront_porch as u32,
            hs: regs.hsync_width as u32,
            hbp: regs.hback_porch as u32,
            htotal: 0,
            al: regs.active_lines as u32,
            vfp: regs.vfront_porch as u32,
            vs: regs.vsync_width as u32,
            vbp: regs.vback_porch as u32,
            vtotal: 0,
        };
        t.htotal = t.aw + t.hfp + t.hs + t.hbp;
        t.vtotal = t.al + t.vfp + t.vs + t.vbp;

        if t.htotal < MIN_HTOTAL {
            log::warn!("GDC: horizontal total of {} words clamped to {}", t.htotal, MIN_HTOTAL);
            t.htotal = MIN_HTOTAL;
        }
        if t.vtotal < MIN_VTOTAL {
            log::warn!("GDC: vertical total of {} lines clamped to {}", t.vtotal, MIN_VTOTAL);
            t.vtotal = MIN_VTOTAL;
        }
        t
    }

    #[inline]
    pub fn frame_clocks(&self) -> u64 {
        self.htotal as u64 * self.vtotal as u64
    }

    #[inline]
    pub fn hsync_start(&self) -> u32 {
        self.aw + self.hfp
    }

    #[inline]
    pub fn vsync_start(&self) -> u32 {
        self.al + self.vfp
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
struct Timer {
    level: bool,
    next:  u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TimingGenerator {
    screen: ScreenTiming,
    now: u64,
    origin: u64,
    frame: u64,
    timers: [Timer; 3],
}

impl TimingGenerator {
    pub fn new(regs: &RegisterFile) -> Self {
        Self {
            screen: ScreenTiming::from_registers(regs),
            now: 0,
            origin: 0,
            frame: 0,
            timers: [Timer::default(); 3],
        }
    }

    pub fn screen(&self) -> ScreenTiming {
        self.screen
    }

    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn level(&self, kind: TimerKind) -> bool {
        self.timers[kind as usize].level
    }

    /// Current raster position as (line, word) within the frame.
    pub fn position(&self) -> (u32, u32) {
        let rel = (self.now - self.origin) % self.screen.frame_clocks();
        let htotal = self.screen.htotal as u64;
        ((rel / htotal) as u32, (rel % htotal) as u32)
    }

    /// Recompute geometry and restart the frame. Any active output is released.
    pub fn rearm(&mut self, regs: &RegisterFile, events: &mut Vec<(GdcLine, bool)>) {
        self.screen = ScreenTiming::from_registers(regs);
        log::debug!(
            "GDC timing: {}x{} clocks per line/lines per frame",
            self.screen.htotal,
            self.screen.vtotal
        );
        self.restart_frame(events);
    }

    /// Start a new frame at the current clock.
    pub fn restart_frame(&mut self, events: &mut Vec<(GdcLine, bool)>) {
        self.origin = self.now;
        for (timer, kind) in self.timers.iter_mut().zip(TIMER_KINDS) {
            if timer.level {
                timer.level = false;
                events.push((kind.line(), false));
            }
            timer.next = self.now;
        }
    }

    /// Advance by a number of clocks, collecting line changes in time order.
    pub fn run(&mut self, clocks: u64, events: &mut Vec<(GdcLine, bool)>) {
        let target = self.now.saturating_add(clocks).min(CLOCK_LIMIT);
        self.skip_frames(target);
        loop {
            let mut pick: Option<usize> = None;
            for (i, timer) in self.timers.iter().enumerate() {
                if timer.next <= target && pick.map_or(true, |p| timer.next < self.timers[p].next) {
                    pick = Some(i);
                }
            }
            let Some(i) = pick
            else {
                break;
            };

            let kind = TIMER_KINDS[i];
            let at = self.timers[i].next;
            self.now = at;

            let level = self.level_at(kind, at);
            if level != self.timers[i].level {
                self.timers[i].level = level;
                events.push((kind.line(), level));
                if kind == TimerKind::Vsync && level {
                    self.frame += 1;
                }
            }
            self.timers[i].next = self.next_edge(kind, at);
        }
        self.now = target;
    }

    /// Advance over whole frames that end before `target` without stepping their edges.
    /// Output levels are a function of the raster phase, so only the frame counter moves.
    fn skip_frames(&mut self, target: u64) {
        let frame_clocks = self.screen.frame_clocks();
        let whole = target.saturating_sub(self.now) / frame_clocks;
        if whole < 2 {
            return;
        }
        let skip = whole - 1;
        let shift = skip * frame_clocks;
        self.now += shift;
        for timer in self.timers.iter_mut() {
            timer.next = timer.next.saturating_add(shift);
        }
        self.frame += skip;
        log::trace!("GDC timing: skipped {} frames", skip);
    }

    fn split(&self, t: u64) -> (u64, u64, u32) {
        let s = &self.screen;
        let rel = (t - self.origin) % s.frame_clocks();
        let frame_start = t - rel;
        let line_start = t - rel % s.htotal as u64;
        let col = (rel % s.htotal as u64) as u32;
        (frame_start, line_start, col)
    }

    fn level_at(&self, kind: TimerKind, t: u64) -> bool {
        let s = &self.screen;
        let (frame_start, _, col) = self.split(t);
        match kind {
            TimerKind::Blank => col >= s.aw,
            TimerKind::Hsync => col >= s.hsync_start() && col < s.hsync_start() + s.hs,
            TimerKind::Vsync => {
                let line = ((t - frame_start) / s.htotal as u64) as u32;
                line >= s.vsync_start() && line < s.vsync_start() + s.vs
            }
        }
    }

    /// Clock of the first possible edge of an output strictly after `t`.
    fn next_edge(&self, kind: TimerKind, t: u64) -> u64 {
        let s = &self.screen;
        let (frame_start, line_start, col) = self.split(t);
        let htotal = s.htotal as u64;
        match kind {
            TimerKind::Blank => {
                if col < s.aw {
                    line_start + s.aw as u64
                }
                else {
                    line_start + htotal
                }
            }
            TimerKind::Hsync => {
                let start = s.hsync_start() as u64;
                let end = start + s.hs as u64;
                if (col as u64) < start {
                    line_start + start
                }
                else if (col as u64) < end {
                    line_start + end
                }
                else {
                    line_start + htotal + start
                }
            }
            TimerKind::Vsync => {
                let rel = t - frame_start;
                let start = s.vsync_start() as u64 * htotal;
                let end = start + s.vs as u64 * htotal;
                if rel < start {
                    frame_start + start
                }
                else if rel < end {
                    frame_start + end
                }
                else {
                    frame_start + s.frame_clocks() + start
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_line_produces_edges_in_order() {
        let regs = RegisterFile::new();
        let mut timing = TimingGenerator::new(&regs);
        let s = timing.screen();
        assert_eq!(s.htotal, 56);

        let mut events = Vec::new();
        timing.run(s.htotal as u64, &mut events);
        assert_eq!(
            events,
            vec![
                (GdcLine::Blank, true),
                (GdcLine::Hsync, true),
                (GdcLine::Hsync, false),
                (GdcLine::Blank, false),
            ]
        );
        assert_eq!(timing.position(), (1, 0));
    }

    #[test]
    fn vsync_counts_frames() {
        let regs = RegisterFile::new();
        let mut timing = TimingGenerator::new(&regs);
        let frame = timing.screen().frame_clocks();

        let mut events = Vec::new();
        timing.run(frame * 3, &mut events);
        assert_eq!(timing.frame(), 3);
        let rises = events.iter().filter(|e| **e == (GdcLine::Vsync, true)).count();
        let falls = events.iter().filter(|e| **e == (GdcLine::Vsync, false)).count();
        assert_eq!(rises, 3);
        assert_eq!(falls, 3);
    }

    #[test]
    fn vsync_spans_configured_lines() {
        let regs = RegisterFile::new();
        let mut timing = TimingGenerator::new(&regs);
        let s = timing.screen();
        let mut events = Vec::new();

        timing.run(s.vsync_start() as u64 * s.htotal as u64 - 1, &mut events);
        assert!(!timing.level(TimerKind::Vsync));
        timing.run(1, &mut events);
        assert!(timing.level(TimerKind::Vsync));
        timing.run(s.vs as u64 * s.htotal as u64 - 1, &mut events);
        assert!(timing.level(TimerKind::Vsync));
        timing.run(1, &mut events);
        assert!(!timing.level(TimerKind::Vsync));
    }

    #[test]
    fn degenerate_geometry_is_clamped() {
        let mut regs = RegisterFile::new();
        regs.active_words = 2;
        regs.hfront_porch = 1;
        regs.hsync_width = 1;
        regs.hback_porch = 1;
        regs.active_lines = 0;
        regs.vfront_porch = 0;
        regs.vsync_width = 0;
        regs.vback_porch = 0;

        let mut timing = TimingGenerator::new(&regs);
        let s = timing.screen();
        assert_eq!(s.htotal, MIN_HTOTAL);
        assert_eq!(s.vtotal, MIN_VTOTAL);

        let mut events = Vec::new();
        timing.run(s.frame_clocks() * 4, &mut events);
        assert!(!events.iter().any(|e| e.0 == GdcLine::Vsync));
        assert_eq!(events.iter().filter(|e| **e == (GdcLine::Hsync, true)).count(), 32);
    }

    #[test]
    fn rearm_is_idempotent() {
        let regs = RegisterFile::new();
        let mut timing = TimingGenerator::new(&regs);
        let mut events = Vec::new();
        timing.run(45, &mut events);
        assert!(timing.level(TimerKind::Hsync));

        let mut first = Vec::new();
        timing.rearm(&regs, &mut first);
        assert_eq!(first, vec![(GdcLine::Blank, false), (GdcLine::Hsync, false)]);
        let screen = timing.screen();
        let position = timing.position();

        let mut second = Vec::new();
        timing.rearm(&regs, &mut second);
        assert!(second.is_empty());
        assert_eq!(timing.screen(), screen);
        assert_eq!(timing.position(), position);
        assert_eq!(position, (0, 0));
    }

    #[test]
    fn restart_frame_moves_origin() {
        let regs = RegisterFile::new();
        let mut timing = TimingGenerator::new(&regs);
        let mut events = Vec::new();
        timing.run(1000, &mut events);
        assert_ne!(timing.position(), (0, 0));
        timing.restart_frame(&mut events);
        assert_eq!(timing.position(), (0, 0));
        assert_eq!(timing.now(), 1000);
    }

    #[test]
    fn long_run_matches_stepped_run() {
        let regs = RegisterFile::new();
        let mut long = TimingGenerator::new(&regs);
        let mut stepped = TimingGenerator::new(&regs);
        let total = long.screen().frame_clocks() * 10 + 1234;

        let mut events = Vec::new();
        long.run(total, &mut events);
        for _ in 0..total / 100 {
            stepped.run(100, &mut events);
        }
        stepped.run(total % 100, &mut events);

        assert_eq!(long.now(), stepped.now());
        assert_eq!(long.frame(), stepped.frame());
        assert_eq!(long.position(), stepped.position());
        for kind in TIMER_KINDS {
            assert_eq!(long.level(kind), stepped.level(kind));
        }
    }

    #[test]
    fn run_saturates_at_clock_limit() {
        let regs = RegisterFile::new();
        let mut timing = TimingGenerator::new(&regs);
        let mut events = Vec::new();
        timing.run(u64::MAX, &mut events);
        assert_eq!(timing.now(), CLOCK_LIMIT);
        assert!(timing.frame() >= CLOCK_LIMIT / timing.screen().frame_clocks() - 1);
        timing.run(u64::MAX, &mut events);
        assert_eq!(timing.now(), CLOCK_LIMIT);
    }
}
