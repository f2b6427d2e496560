/*
Copyright 2025 Connor Nolan

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

pub mod assembler;
pub mod dialect;
pub mod emitter;
pub mod errors;
pub mod expr;
pub mod file_reader;
pub mod reader;
pub mod tables;

use std::path::Path;

use anyhow::Context;
use dialect::Dialect;
use errors::{AssemblerError, Warning};
use file_reader::FileReader;

/// Which output container to produce. `Auto` defers to the output
/// file's extension (`.s`/`.inc` → [`OutputFormat::Asm`], anything
/// else → [`OutputFormat::Bin`]), matching the original tool's
/// `get_format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Auto,
    Asm,
    Bin,
}

impl std::str::FromStr for OutputFormat {
    type Err = AssemblerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(OutputFormat::Auto),
            "asm" => Ok(OutputFormat::Asm),
            "bin" => Ok(OutputFormat::Bin),
            other => Err(AssemblerError::UnrecognizedFormat(other.to_string())),
        }
    }
}

fn resolve_format(format: OutputFormat, output_path: &Path) -> OutputFormat {
    match format {
        OutputFormat::Auto => match output_path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("s") || ext.eq_ignore_ascii_case("inc") => {
                OutputFormat::Asm
            }
            _ => OutputFormat::Bin,
        },
        other => other,
    }
}

/// Assembles `source_path` under `dialect`, producing the output bytes
/// for `output_path`'s resolved format (see [`resolve_format`]) plus any
/// non-fatal warnings collected along the way. Reentrant: holds no
/// process-global state, and is safe to call repeatedly or
/// concurrently given independent `FileReader`s.
pub fn assemble<R: FileReader>(
    source_path: &Path,
    output_path: &Path,
    format: OutputFormat,
    dialect: Dialect,
    reader: &R,
) -> Result<(Vec<u8>, Vec<Warning>), AssemblerError> {
    let (statements, mut warnings) = reader::read_source(source_path, dialect, reader)
        .with_context(|| format!("failed to read {}", source_path.display()))
        .map_err(to_assembler_error)?;

    let (assembled, assembler_warnings) = assembler::assemble_statements(&statements, dialect)?;
    warnings.extend(assembler_warnings);

    let resolved_format = resolve_format(format, output_path);
    let mut out = Vec::new();
    match resolved_format {
        OutputFormat::Bin => {
            emitter::write_bin(&mut out, &assembled).expect("writing to a Vec<u8> cannot fail");
        }
        OutputFormat::Asm => {
            emitter::write_asm(&mut out, &assembled, &source_path.display().to_string(), dialect)
                .expect("writing to a Vec<u8> cannot fail");
        }
        OutputFormat::Auto => unreachable!("resolve_format never returns Auto"),
    }

    Ok((out, warnings))
}

/// `read_source` already reports its own failures as `AssemblerError`;
/// this recovers that typed error from the `anyhow` context chain
/// added above, per the crate's convention of using `anyhow` for
/// narrative context while keeping `AssemblerError` as the leaf type
/// callers can match on.
fn to_assembler_error(err: anyhow::Error) -> AssemblerError {
    match err.downcast::<AssemblerError>() {
        Ok(inner) => inner,
        Err(err) => AssemblerError::Io {
            path: String::new(),
            message: err.to_string(),
        },
    }
}
