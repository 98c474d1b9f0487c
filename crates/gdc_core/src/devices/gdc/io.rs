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

    devices::gdc::io.rs

    Port decode and the IoDevice implementation for the GDC.

    The uPD7220 decodes its two ports on A0: reads return status (A0=0) or FIFO
    data (A0=1), writes are parameters (A0=0) or commands (A0=1). The i82720 as
    wired on the Compis uses offsets 0 and 2 for the same functions.

*/

use super::{fifo::FifoDirection, Gdc};
use crate::{
    bus::{DeviceRunTimeUnit, IoDevice, NO_IO_BYTE},
    config::GdcVariant,
    device_traits::{lines::GdcLine, vram::DisplayMemory},
};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum GdcPort {
    /// Status on read, parameter on write.
    StatusParameter,
    /// FIFO data on read, command on write.
    DataCommand,
    Unmapped,
}

pub fn decode_port(variant: GdcVariant, offset: u16) -> GdcPort {
    match variant {
        GdcVariant::Upd7220 => match offset {
            0 => GdcPort::StatusParameter,
            1 => GdcPort::DataCommand,
            _ => GdcPort::Unmapped,
        },
        GdcVariant::I82720 => match offset {
            0 => GdcPort::StatusParameter,
            2 => GdcPort::DataCommand,
            _ => GdcPort::Unmapped,
        },
    }
}

impl Gdc {
    /// Read from a port, given as an offset from the device base.
    pub fn port_read(&mut self, offset: u16) -> u8 {
        match decode_port(self.config.variant, offset) {
            GdcPort::StatusParameter => {
                let status = self.status_byte();
                self.set_line(GdcLine::Int, false);
                status
            }
            GdcPort::DataCommand => self.read_fifo_data(),
            GdcPort::Unmapped => {
                log::warn!("GDC: read from unmapped port offset {}", offset);
                NO_IO_BYTE
            }
        }
    }

    /// Write to a port, given as an offset from the device base.
    pub fn port_write<'m>(&mut self, offset: u16, data: u8, vram: Option<&mut (dyn DisplayMemory + 'm)>) {
        match decode_port(self.config.variant, offset) {
            GdcPort::StatusParameter => {
                log::trace!("GDC: parameter write {:02X}", data);
                self.write_parameter(data, vram);
            }
            GdcPort::DataCommand => {
                log::trace!("GDC: command write {:02X}", data);
                self.write_command(data, vram);
            }
            GdcPort::Unmapped => {
                log::warn!("GDC: write to unmapped port offset {}: {:02X}", offset, data);
            }
        }
    }

    fn read_fifo_data(&mut self) -> u8 {
        if self.fifo.direction() != FifoDirection::Read {
            log::warn!("GDC: FIFO data read while FIFO is in write direction");
            return 0;
        }
        match self.fifo.dequeue() {
            Some(entry) => {
                log::trace!("GDC: FIFO data read {:02X}", entry.data);
                entry.data
            }
            None => {
                log::trace!("GDC: FIFO data read with FIFO empty");
                0
            }
        }
    }
}

impl IoDevice for Gdc {
    fn read_u8(&mut self, port: u16, delta: DeviceRunTimeUnit) -> u8 {
        self.run(delta);
        self.port_read(port.wrapping_sub(self.config.io_base))
    }

    fn write_u8(&mut self, port: u16, data: u8, vram: Option<&mut dyn DisplayMemory>, delta: DeviceRunTimeUnit) {
        self.run(delta);
        self.port_write(port.wrapping_sub(self.config.io_base), data, vram);
    }

    fn port_list(&self) -> Vec<(String, u16)> {
        let base = self.config.io_base;
        let data_offset = match self.config.variant {
            GdcVariant::Upd7220 => 1,
            GdcVariant::I82720 => 2,
        };
        vec![
            (String::from("GDC Status/Parameter"), base),
            (String::from("GDC FIFO/Command"), base.wrapping_add(data_offset)),
        ]
    }
}
