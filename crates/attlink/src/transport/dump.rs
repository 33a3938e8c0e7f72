//! Hex/ASCII rendering of raw PDUs for diagnostics

use std::fmt;

/// Renders bytes 16 per line as `hh hh ...  |ascii|`
pub struct HexDump<'a>(pub &'a [u8]);

impl fmt::Display for HexDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.0.chunks(16) {
            for byte in line {
                write!(f, "{:02x} ", byte)?;
            }
            for _ in line.len()..16 {
                f.write_str("   ")?;
            }
            f.write_str(" |")?;
            for &byte in line {
                let c = if byte > 0x20 && byte < 0x7f { byte as char } else { '.' };
                write!(f, "{}", c)?;
            }
            f.write_str("|\n")?;
        }
        Ok(())
    }
}
