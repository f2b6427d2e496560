//! The Source Reader: turns a root `.vcp` file into a flat, ordered
//! sequence of [`Statement`]s, stripping comments, tokenizing each
//! non-empty line, and recursively splicing in `.include`/`.incbin`
//! content. This is a hand-written lexer rather than a `pest` grammar:
//! the rule set is a literal character-level algorithm (find the first
//! `;`, split at the first whitespace run, split the rest on commas),
//! not a context-free grammar worth a PEG.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::dialect::Dialect;
use crate::errors::{AssemblerError, Warning};
use crate::file_reader::FileReader;

/// A parsed input line, tagged with the source line it came from.
/// `cmd` is lowercased; `args` are the pre-evaluation operand strings,
/// already stripped of surrounding whitespace and surrounding double
/// quotes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub line: usize,
    pub cmd: String,
    pub args: Vec<String>,
}

/// Bounds runaway `.include` recursion; the source tools have no cycle
/// guard at all, so this is an implementation-defined backstop.
const MAX_INCLUDE_DEPTH: usize = 256;

/// Reads `path` and every file it transitively `.include`s/`.incbin`s,
/// producing one flat statement stream in source order.
pub fn read_source<R: FileReader>(
    path: &Path,
    dialect: Dialect,
    reader: &R,
) -> Result<(Vec<Statement>, Vec<Warning>), AssemblerError> {
    let mut warnings = Vec::new();
    let mut stack: Vec<PathBuf> = Vec::new();
    let mut seen: HashSet<PathBuf> = HashSet::new();
    let statements = read_recursive(path, 0, dialect, reader, &mut stack, &mut seen, &mut warnings)?;
    Ok((statements, warnings))
}

fn read_recursive<R: FileReader>(
    path: &Path,
    including_line: usize,
    dialect: Dialect,
    reader: &R,
    stack: &mut Vec<PathBuf>,
    seen: &mut HashSet<PathBuf>,
    warnings: &mut Vec<Warning>,
) -> Result<Vec<Statement>, AssemblerError> {
    if stack.len() >= MAX_INCLUDE_DEPTH {
        return Err(AssemblerError::IncludeTooDeep {
            line: including_line,
            path: path.display().to_string(),
            max: MAX_INCLUDE_DEPTH,
        });
    }
    if !seen.insert(path.to_path_buf()) {
        return Err(AssemblerError::IncludeCycle {
            line: including_line,
            path: path.display().to_string(),
        });
    }
    stack.push(path.to_path_buf());

    let text = reader.read_to_string(path).map_err(|source| AssemblerError::Io {
        path: path.display().to_string(),
        message: source.to_string(),
    })?;

    let mut statements = Vec::new();
    for (idx, raw_line) in text.lines().enumerate() {
        let line_no = idx + 1;

        let without_comment = match raw_line.find(';') {
            Some(pos) => &raw_line[..pos],
            None => raw_line,
        };
        let trimmed = without_comment.trim();
        if trimmed.is_empty() {
            continue;
        }

        let (cmd, args) = split_statement(trimmed, dialect);

        match cmd.as_str() {
            ".include" => {
                let target = args.first().ok_or_else(|| AssemblerError::MalformedOperands {
                    line: line_no,
                    cmd: cmd.clone(),
                })?;
                let include_path = resolve_relative(path, target);
                let included = read_recursive(
                    &include_path,
                    line_no,
                    dialect,
                    reader,
                    stack,
                    seen,
                    warnings,
                )?;
                statements.extend(included);
            }
            ".incbin" => {
                let target = args.first().ok_or_else(|| AssemblerError::MalformedOperands {
                    line: line_no,
                    cmd: cmd.clone(),
                })?;
                let include_path = resolve_relative(path, target);
                let bytes = reader.read_binary(&include_path).map_err(|source| AssemblerError::Io {
                    path: include_path.display().to_string(),
                    message: source.to_string(),
                })?;
                statements.extend(incbin_statements(&bytes, line_no, warnings));
            }
            _ => statements.push(Statement {
                line: line_no,
                cmd,
                args,
            }),
        }
    }

    stack.pop();
    seen.remove(path);
    Ok(statements)
}

/// Splits a comment-free, trimmed line into a lowercase command token
/// and its operand list. The `.word EXPR[, EXPR...]`-style comma list
/// never needs to be parenthesis-aware: the only calls in the operand
/// expression language (`sin`, `cos`) take a single argument, so a
/// plain split on `,` always lands on operand boundaries.
fn split_statement(line: &str, dialect: Dialect) -> (String, Vec<String>) {
    match line.find(char::is_whitespace) {
        Some(pos) => {
            let cmd = line[..pos].to_lowercase();
            let rest = line[pos..].trim();
            let args_str = match dialect {
                // The older dialect has no expression language, so it
                // simply discards all whitespace before splitting.
                Dialect::VcpAs => rest.chars().filter(|c| !c.is_whitespace()).collect(),
                // The newer dialect needs internal whitespace intact
                // so that expressions like `1 + 2` parse correctly.
                Dialect::Vcpas => rest.to_string(),
            };
            let args = args_str.split(',').map(strip_arg).collect();
            (cmd, args)
        }
        None => (line.to_lowercase(), Vec::new()),
    }
}

fn strip_arg(arg: &str) -> String {
    let trimmed = arg.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        trimmed[1..trimmed.len() - 1].to_string()
    } else {
        trimmed.to_string()
    }
}

fn resolve_relative(including_file: &Path, target: &str) -> PathBuf {
    let base = including_file.parent().unwrap_or_else(|| Path::new("."));
    base.join(target)
}

/// Groups `.incbin` bytes into little-endian 32-bit words, zero-padding
/// a trailing partial word and warning about it, and emits one
/// synthetic `.word 0x...` statement per word, tagged with the
/// including line.
fn incbin_statements(data: &[u8], line: usize, warnings: &mut Vec<Warning>) -> Vec<Statement> {
    let mut statements = Vec::with_capacity(data.len().div_ceil(4));
    let mut chunks = data.chunks_exact(4);

    for chunk in &mut chunks {
        let word = u32::from_le_bytes(chunk.try_into().unwrap());
        statements.push(Statement {
            line,
            cmd: ".word".to_string(),
            args: vec![format!("{word:#x}")],
        });
    }

    let remainder = chunks.remainder();
    if !remainder.is_empty() {
        let mut padded = [0u8; 4];
        padded[..remainder.len()].copy_from_slice(remainder);
        let word = u32::from_le_bytes(padded);
        warnings.push(Warning::new(
            line,
            format!(
                ".incbin data length is not a multiple of 4 bytes; zero-padded the final word to {word:#010x}"
            ),
        ));
        statements.push(Statement {
            line,
            cmd: ".word".to_string(),
            args: vec![format!("{word:#x}")],
        });
    }

    statements
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_reader::MockFileReader;

    #[test]
    fn strips_comments_and_blank_lines() {
        let mut reader = MockFileReader::default();
        reader.add_file("a.vcp", "; a header\nnop ; trailing\n\n   \nrts\n");
        let (statements, warnings) = read_source(Path::new("a.vcp"), Dialect::Vcpas, &reader).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0].cmd, "nop");
        assert_eq!(statements[0].line, 2);
        assert_eq!(statements[1].cmd, "rts");
        assert_eq!(statements[1].line, 5);
    }

    #[test]
    fn splits_command_and_operands() {
        let mut reader = MockFileReader::default();
        reader.add_file("a.vcp", "setreg 2, 0x10\n");
        let (statements, _) = read_source(Path::new("a.vcp"), Dialect::Vcpas, &reader).unwrap();
        assert_eq!(statements[0].cmd, "setreg");
        assert_eq!(statements[0].args, vec!["2", "0x10"]);
    }

    #[test]
    fn newer_dialect_preserves_internal_whitespace() {
        let mut reader = MockFileReader::default();
        reader.add_file("a.vcp", "setreg 2, 1 + 2\n");
        let (statements, _) = read_source(Path::new("a.vcp"), Dialect::Vcpas, &reader).unwrap();
        assert_eq!(statements[0].args[1], "1 + 2");
    }

    #[test]
    fn older_dialect_strips_internal_whitespace() {
        let mut reader = MockFileReader::default();
        reader.add_file("a.vcp", "setreg 2, 0x10\n");
        let (statements, _) = read_source(Path::new("a.vcp"), Dialect::VcpAs, &reader).unwrap();
        assert_eq!(statements[0].args, vec!["2", "0x10"]);
    }

    #[test]
    fn include_splices_statements_from_the_including_files_directory() {
        let mut reader = MockFileReader::default();
        reader.add_file("dir/a.vcp", ".include \"b.vcp\"\nrts\n");
        reader.add_file("dir/b.vcp", "nop\n");
        let (statements, _) =
            read_source(Path::new("dir/a.vcp"), Dialect::Vcpas, &reader).unwrap();
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0].cmd, "nop");
        assert_eq!(statements[1].cmd, "rts");
    }

    #[test]
    fn include_cycle_is_a_fatal_error() {
        let mut reader = MockFileReader::default();
        reader.add_file("a.vcp", ".include \"a.vcp\"\n");
        let err = read_source(Path::new("a.vcp"), Dialect::Vcpas, &reader).unwrap_err();
        assert!(matches!(err, AssemblerError::IncludeCycle { .. }));
    }

    #[test]
    fn incbin_groups_little_endian_words() {
        let mut reader = MockFileReader::default();
        reader.add_file("a.vcp", ".incbin \"data.bin\"\n");
        reader.add_binary_file("data.bin", &[0x01, 0x02, 0x03, 0x04]);
        let (statements, warnings) =
            read_source(Path::new("a.vcp"), Dialect::Vcpas, &reader).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(statements.len(), 1);
        assert_eq!(statements[0].cmd, ".word");
        assert_eq!(statements[0].args, vec!["0x4030201"]);
    }

    #[test]
    fn incbin_zero_pads_a_trailing_partial_word_and_warns() {
        let mut reader = MockFileReader::default();
        reader.add_file("a.vcp", ".incbin \"data.bin\"\n");
        reader.add_binary_file("data.bin", &[0x01, 0x02, 0x03]);
        let (statements, warnings) =
            read_source(Path::new("a.vcp"), Dialect::Vcpas, &reader).unwrap();
        assert_eq!(statements.len(), 1);
        assert_eq!(statements[0].args, vec!["0x30201"]);
        assert_eq!(warnings.len(), 1);
    }
}
