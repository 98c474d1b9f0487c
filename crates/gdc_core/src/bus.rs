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

    bus.rs

    Bus-facing device interface.

    The host machine owns address decoding and routes port accesses to the
    device through IoDevice. A delta time accompanies each access so that the
    device can catch up its internal timing before the access is serviced.

*/

use crate::device_traits::vram::DisplayMemory;

pub const NO_IO_BYTE: u8 = 0xFF;
pub const NULL_DELTA_US: DeviceRunTimeUnit = DeviceRunTimeUnit::Microseconds(0.0);

/// Elapsed time handed to a device so that it may run up to the current moment.
#[derive(Copy, Clone, Debug)]
pub enum DeviceRunTimeUnit {
    SystemTicks(u32),
    Microseconds(f64),
}

pub trait IoDevice {
    /// Read a byte from the specified port, given a delta time that may be used to 'catch up'
    /// the device state. The default implementation returns NO_IO_BYTE (0xFF).
    fn read_u8(&mut self, _port: u16, _delta: DeviceRunTimeUnit) -> u8 {
        NO_IO_BYTE
    }

    /// Write a byte to the specified port, given a delta time that may be used to 'catch up'
    /// the device state. Display memory is provided for devices that execute memory
    /// operations as a side effect of a port write.
    /// The default implementation does nothing.
    fn write_u8(
        &mut self,
        _port: u16,
        _data: u8,
        _vram: Option<&mut dyn DisplayMemory>,
        _delta: DeviceRunTimeUnit,
    ) {
    }

    /// Return a list of the ports this device responds to, with a descriptive name for each.
    fn port_list(&self) -> Vec<(String, u16)>;
}
