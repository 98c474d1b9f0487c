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

    config.rs

    Configuration for a GDC instance.

    Configuration is read from a TOML fragment. Every field has a default, so an
    empty document produces a usable uPD7220 at the PC-9801 port base.

*/

use std::{fmt, str::FromStr};

use anyhow::{anyhow, Error};
use serde::Deserializer;
use serde_derive::Deserialize;

pub const DEFAULT_IO_BASE: u16 = 0x60;
pub const DEFAULT_CLOCK_MHZ: f64 = 2.5;
pub const DEFAULT_VRAM_WORDS: u32 = 0x20000;
pub const DEFAULT_CHAR_WIDTH: u8 = 8;
pub const MAX_VRAM_WORDS: u32 = 0x40000;

/// The bus interface flavor of the controller. The two parts share a command set but decode
/// their two ports at different offsets.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum GdcVariant {
    #[default]
    Upd7220,
    I82720,
}

impl fmt::Display for GdcVariant {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            GdcVariant::Upd7220 => write!(f, "uPD7220"),
            GdcVariant::I82720 => write!(f, "i82720"),
        }
    }
}

impl FromStr for GdcVariant {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, String>
    where
        Self: Sized,
    {
        match s.to_lowercase().as_str() {
            "upd7220" | "7220" => Ok(GdcVariant::Upd7220),
            "i82720" | "82720" => Ok(GdcVariant::I82720),
            _ => Err(format!("Bad value for GDC variant: {}", s)),
        }
    }
}

impl<'de> serde::Deserialize<'de> for GdcVariant {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct GdcVariantVisitor;

        impl serde::de::Visitor<'_> for GdcVariantVisitor {
            type Value = GdcVariant;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("`upd7220` or `i82720`")
            }

            fn visit_str<E>(self, value: &str) -> Result<GdcVariant, E>
            where
                E: serde::de::Error,
            {
                GdcVariant::from_str(value).map_err(E::custom)
            }
        }

        deserializer.deserialize_str(GdcVariantVisitor)
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct GdcConfig {
    pub variant: GdcVariant,
    /// First port of the device. The controller occupies base and base+1 (uPD7220) or
    /// base and base+2 (i82720).
    pub io_base: u16,
    /// Word clock rate in MHz, used to convert microsecond deltas into character clocks.
    pub clock_mhz: f64,
    /// Number of system ticks per character clock when run with SystemTicks.
    pub clock_divisor: u32,
    /// Size of attached display memory in 16-bit words.
    pub vram_words: u32,
    /// Dots per character cell for narrow (byte) character partitions.
    pub char_width: u8,
}

impl Default for GdcConfig {
    fn default() -> Self {
        Self {
            variant: GdcVariant::default(),
            io_base: DEFAULT_IO_BASE,
            clock_mhz: DEFAULT_CLOCK_MHZ,
            clock_divisor: 1,
            vram_words: DEFAULT_VRAM_WORDS,
            char_width: DEFAULT_CHAR_WIDTH,
        }
    }
}

impl GdcConfig {
    pub fn from_toml_str(toml_str: &str) -> Result<GdcConfig, Error> {
        let config: GdcConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.clock_mhz.is_nan() || self.clock_mhz <= 0.0 {
            return Err(anyhow!("clock_mhz must be positive (got {})", self.clock_mhz));
        }
        if self.clock_divisor == 0 {
            return Err(anyhow!("clock_divisor must be non-zero"));
        }
        if self.vram_words == 0 || self.vram_words > MAX_VRAM_WORDS {
            return Err(anyhow!(
                "vram_words must be between 1 and {:#X} (got {:#X})",
                MAX_VRAM_WORDS,
                self.vram_words
            ));
        }
        if self.char_width == 0 || self.char_width > 16 {
            return Err(anyhow!("char_width must be between 1 and 16 (got {})", self.char_width));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = GdcConfig::from_toml_str("").unwrap();
        assert_eq!(config.variant, GdcVariant::Upd7220);
        assert_eq!(config.io_base, DEFAULT_IO_BASE);
        assert_eq!(config.vram_words, DEFAULT_VRAM_WORDS);
        assert_eq!(config.char_width, 8);
    }

    #[test]
    fn config_parses_variant_case_insensitively() {
        let config = GdcConfig::from_toml_str(
            r#"
            variant = "I82720"
            io_base = 0x80
            clock_mhz = 5.0
            "#,
        )
        .unwrap();
        assert_eq!(config.variant, GdcVariant::I82720);
        assert_eq!(config.io_base, 0x80);
        assert_eq!(config.clock_mhz, 5.0);
    }

    #[test]
    fn config_rejects_bad_values() {
        assert!(GdcConfig::from_toml_str("variant = \"mc6845\"").is_err());
        assert!(GdcConfig::from_toml_str("vram_words = 0").is_err());
        assert!(GdcConfig::from_toml_str("clock_divisor = 0").is_err());
        assert!(GdcConfig::from_toml_str("char_width = 17").is_err());
    }
}
