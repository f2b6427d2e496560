//! Binary and GNU-assembly back ends. Both take an already-assembled
//! [`Assembled`] buffer and a [`std::io::Write`] sink rather than a
//! bare file path, so they're unit-testable against an in-memory
//! buffer without touching `FileReader` at all.

use std::io::{self, Write};

use crate::assembler::Assembled;
use crate::dialect::Dialect;

/// Writes the assembled words as contiguous little-endian `u32`s.
pub fn write_bin<W: Write>(out: &mut W, assembled: &Assembled) -> io::Result<()> {
    for word in &assembled.words {
        out.write_all(&word.to_le_bytes())?;
    }
    Ok(())
}

/// Writes a GNU-assembly `.data` section exporting `vcp_program` (and,
/// under the newer dialect, `vcp_program_start`) plus `vcp_program_words`,
/// matching the original tool's `write_asm`.
pub fn write_asm<W: Write>(
    out: &mut W,
    assembled: &Assembled,
    source_path: &str,
    dialect: Dialect,
) -> io::Result<()> {
    writeln!(out, "; Source file: {source_path}")?;
    writeln!(out, "; Assembled by {}\n", dialect.name())?;
    writeln!(out, "    .data\n")?;
    writeln!(out, "    .global vcp_program")?;
    if dialect == Dialect::Vcpas {
        writeln!(out, "    .global vcp_program_start")?;
    }
    writeln!(out, "    .global vcp_program_words\n")?;
    if dialect == Dialect::Vcpas {
        let start = assembled.start.unwrap_or(0);
        writeln!(out, "vcp_program_start = {start:#x}")?;
    }
    writeln!(out, "vcp_program_words = {}\n", assembled.words.len())?;
    writeln!(out, "vcp_program:")?;
    for word in &assembled.words {
        writeln!(out, "    .word   {word:#010x}")?;
    }
    Ok(())
}
