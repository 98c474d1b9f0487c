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

    devices::gdc::execute.rs

    Application of decoded commands to the controller.

*/

use super::{
    commands::Command,
    regs::{TransferType, WriteMode, SYNC_PARAM_COUNT},
    DmaRequest,
    Gdc,
};
use crate::device_traits::{lines::GdcLine, vram::DisplayMemory};

impl Gdc {
    /// Apply a command whose parameters are complete.
    pub(super) fn execute<'m>(&mut self, cmd: Command, params: &[u8], vram: Option<&mut (dyn DisplayMemory + 'm)>) {
        match cmd {
            Command::Reset => {
                // The reset itself took effect when the command byte arrived.
                if params.len() == SYNC_PARAM_COUNT {
                    self.command_sync(params, false);
                }
            }
            Command::Sync { display_enable } => self.command_sync(params, display_enable),
            Command::Vsync { master } => {
                self.regs.vsync_master = master;
                log::debug!("VSYNC: {} mode", if master { "master" } else { "slave" });
            }
            Command::Cchar => match <[u8; 3]>::try_from(params) {
                Ok(p) => self.regs.apply_cchar(&p),
                Err(_) => log::warn!("CCHAR: expected 3 parameter bytes, got {}", params.len()),
            },
            Command::Start => {
                self.regs.display_enabled = true;
                log::debug!("START: display enabled");
            }
            Command::Bctrl { display_enable } => {
                self.regs.display_enabled = display_enable;
                log::debug!("BCTRL: display enabled: {}", display_enable);
            }
            Command::Zoom => {
                if let Some(&b) = params.first() {
                    self.regs.apply_zoom(b);
                    log::debug!(
                        "ZOOM: display {} graphics character {}",
                        self.regs.zoom_display,
                        self.regs.zoom_gchr
                    );
                }
            }
            Command::Curs => {
                self.regs.apply_curs(params);
                log::debug!("CURS: EAD {:05X} DAD {}", self.regs.ead, self.regs.dad);
            }
            Command::Pitch => {
                if let Some(&b) = params.first() {
                    self.regs.apply_pitch(b);
                    log::debug!("PITCH: {} words", self.regs.pitch);
                }
            }
            Command::Mask => {
                if let [lo, hi] = params {
                    self.regs.apply_mask(*lo, *hi);
                }
            }
            Command::Figs => {
                self.regs.apply_figs(params);
                log::debug!("FIGS: {:?}", self.regs.figs);
            }
            Command::Figd => {
                if let Some(mem) = self.memory_for(cmd, vram) {
                    self.figd(mem);
                }
            }
            Command::Gchrd => {
                if let Some(mem) = self.memory_for(cmd, vram) {
                    self.gchrd(mem);
                }
            }
            Command::Curd => self.curd(),
            Command::Lprd => self.lprd(),
            Command::Pram { offset } => {
                for (i, &b) in params.iter().enumerate() {
                    let addr = offset as usize + i;
                    if addr >= self.regs.pram.len() || !self.regs.write_pram(addr as u8, b) {
                        log::trace!("PRAM: write past end of parameter RAM ignored: {:02X}", b);
                    }
                }
            }
            Command::Wdat { transfer, mode } => {
                self.regs.write_mode = mode;
                if let Some(mem) = self.memory_for(cmd, vram) {
                    self.wdat(transfer, params, mem);
                }
            }
            Command::Rdat { transfer } => {
                if let Some(mem) = self.memory_for(cmd, vram) {
                    self.rdat(transfer, mem);
                }
            }
            Command::Dmaw { transfer, mode } => {
                self.regs.write_mode = mode;
                self.start_dma(true, transfer, mode);
            }
            Command::Dmar { transfer } => {
                self.start_dma(false, transfer, self.regs.write_mode);
            }
        }
    }

    fn memory_for<'a, 'm>(
        &self,
        cmd: Command,
        vram: Option<&'a mut (dyn DisplayMemory + 'm)>,
    ) -> Option<&'a mut (dyn DisplayMemory + 'm)> {
        if vram.is_none() {
            log::warn!("GDC: {} needs display memory but none is attached", cmd.name());
        }
        vram
    }

    fn command_sync(&mut self, params: &[u8], display_enable: bool) {
        let Ok(p) = <[u8; SYNC_PARAM_COUNT]>::try_from(params)
        else {
            log::warn!("SYNC: expected {} parameter bytes, got {}", SYNC_PARAM_COUNT, params.len());
            return;
        };
        self.regs.apply_sync(&p);
        self.regs.display_enabled = display_enable;
        self.rearm_timing();
    }

    fn start_dma(&mut self, write: bool, transfer: TransferType, mode: WriteMode) {
        let remaining = self.regs.figs.dc as u32 + 1;
        self.dma = Some(DmaRequest {
            write,
            transfer,
            mode,
            remaining,
        });
        self.regs.figs.dc = 0;
        log::trace!(
            "GDC: DMA{} requested, {} {} units",
            if write { "W" } else { "R" },
            remaining,
            transfer
        );
        self.set_line(GdcLine::Drq, true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GdcConfig;

    #[test]
    fn bctrl_and_start_toggle_display() {
        let mut gdc = Gdc::new(GdcConfig::default());
        gdc.write_command(0x6B, None);
        assert!(gdc.display_enabled());
        gdc.write_command(0x0C, None);
        assert!(!gdc.display_enabled());
        gdc.write_command(0x0D, None);
        assert!(gdc.display_enabled());
    }

    #[test]
    fn vsync_selects_master_or_slave() {
        let mut gdc = Gdc::new(GdcConfig::default());
        gdc.write_command(0x6E, None);
        assert!(!gdc.regs().vsync_master);
        gdc.write_command(0x6F, None);
        assert!(gdc.regs().vsync_master);
    }

    #[test]
    fn drawing_without_memory_is_harmless() {
        let mut gdc = Gdc::new(GdcConfig::default());
        gdc.write_command(0x4A, None);
        gdc.write_parameter(0xFF, None);
        gdc.write_parameter(0xFF, None);
        gdc.write_command(0x20, None);
        gdc.write_parameter(0x12, None);
        gdc.write_parameter(0x34, None);
        gdc.write_command(0x6C, None);
        gdc.write_command(0x68, None);
        assert_eq!(gdc.regs().ead, 0);
        assert!(gdc.fifo_is_empty());
    }
}
