//! The Assembler Core: the two-pass engine that turns a flat
//! [`Statement`](crate::reader::Statement) stream into a word buffer.
//!
//! Pass 1 resolves every label's address (all label names are
//! pre-seeded to `0` before either pass starts, so a branch to a label
//! defined later in the file — or never defined at all — still
//! evaluates, just to `0` if it's never actually assigned). Pass 2
//! re-runs the same statement stream with a fresh symbol table and
//! emits words.

mod encode;
mod lerp;

use std::collections::{HashMap, HashSet};

use crate::dialect::Dialect;
use crate::errors::{AssemblerError, Warning};
use crate::expr;
use crate::reader::Statement;
use crate::tables::{LabelTable, SymbolTable};

/// The assembled program: its words in emission order, and the first
/// `.org` value seen (used by the assembly emitter as
/// `vcp_program_start`).
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Assembled {
    pub words: Vec<u32>,
    pub start: Option<i64>,
}

/// Directives/commands only meaningful under the newer dialect.
const VCPAS_ONLY: &[&str] = &["waitx", "waity"];
/// Directives/commands only meaningful under the older dialect.
const VCP_AS_ONLY: &[&str] = &["wait"];

pub fn assemble_statements(
    statements: &[Statement],
    dialect: Dialect,
) -> Result<(Assembled, Vec<Warning>), AssemblerError> {
    let mut warnings = Vec::new();
    let mut labels: LabelTable = HashMap::new();
    for statement in statements {
        if let Some(label) = statement.cmd.strip_suffix(':') {
            labels.insert(label.to_string(), 0);
        }
    }

    let mut words = Vec::new();
    let mut start: Option<i64> = None;

    for pass_no in 1..=2 {
        let first_pass = pass_no == 1;
        let mut symbols: SymbolTable = HashMap::new();
        let mut defined_labels: HashSet<String> = HashSet::new();
        let mut rept_start: Option<usize> = None;
        let mut rept_count: i64 = 0;
        let mut pc: Option<i64> = None;
        let mut statement_no = 0usize;

        while statement_no < statements.len() {
            let statement = &statements[statement_no];
            let line = statement.line;
            let cmd = statement.cmd.as_str();
            let args = &statement.args;

            if let Some(label) = cmd.strip_suffix(':') {
                if rept_start.is_some() {
                    return Err(AssemblerError::LabelInRept {
                        line,
                        name: label.to_string(),
                    });
                }
                if first_pass {
                    if !defined_labels.insert(label.to_string()) {
                        return Err(AssemblerError::DuplicateLabel {
                            line,
                            name: label.to_string(),
                        });
                    }
                    let here = current_pc(pc, line)?;
                    labels.insert(label.to_string(), here);
                }
            } else if cmd == ".org" {
                let value = eval_one(args, 0, cmd, line, dialect, &labels, &symbols)?;
                pc = Some(value);
                if start.is_none() {
                    start = Some(value);
                }
            } else if cmd == ".set" {
                let name = arg_at(args, 0, cmd, line)?.clone();
                let value = eval_one(args, 1, cmd, line, dialect, &labels, &symbols)?;
                symbols.insert(name, value);
            } else if cmd == ".add" {
                require_dialect(Dialect::VcpAs, dialect, cmd, line)?;
                let name = arg_at(args, 0, cmd, line)?.clone();
                let delta = eval_one(args, 1, cmd, line, dialect, &labels, &symbols)?;
                let current = *symbols
                    .get(&name)
                    .ok_or_else(|| AssemblerError::UndefinedSymbol {
                        line,
                        name: name.clone(),
                    })?;
                symbols.insert(name, current + delta);
            } else if cmd == ".word" {
                let here = current_pc(pc, line)?;
                for arg in args {
                    if !first_pass {
                        let value = expr::evaluate(arg, dialect, &labels, &symbols, line)?;
                        words.push(value as u32);
                    }
                }
                pc = Some(here + args.len() as i64);
            } else if cmd == ".lerp" {
                let here = current_pc(pc, line)?;
                let first = eval_one(args, 0, cmd, line, dialect, &labels, &symbols)?;
                let last = eval_one(args, 1, cmd, line, dialect, &labels, &symbols)?;
                let count = eval_one(args, 2, cmd, line, dialect, &labels, &symbols)?;
                if count < 1 {
                    return Err(AssemblerError::InvalidReptCount { line, count });
                }
                let lerp_words = lerp::lerp(first, last, count);
                if !first_pass {
                    words.extend(&lerp_words);
                }
                pc = Some(here + lerp_words.len() as i64);
            } else if cmd == ".rept" {
                if rept_start.is_some() {
                    return Err(AssemblerError::NestedRept { line });
                }
                let count = eval_one(args, 0, cmd, line, dialect, &labels, &symbols)?;
                if count < 1 {
                    return Err(AssemblerError::InvalidReptCount { line, count });
                }
                rept_start = Some(statement_no);
                rept_count = count;
            } else if cmd == ".endr" {
                let back_to = rept_start.ok_or(AssemblerError::EndrWithoutRept { line })?;
                rept_count -= 1;
                if rept_count > 0 {
                    statement_no = back_to;
                    continue;
                }
                rept_start = None;
            } else if let Some(directive) = cmd.strip_prefix('.') {
                return Err(AssemblerError::UnrecognizedDirective {
                    line,
                    directive: format!(".{directive}"),
                });
            } else {
                require_not_other_dialect(cmd, dialect, line)?;
                let here = current_pc(pc, line)?;
                if !first_pass {
                    let values = args
                        .iter()
                        .map(|arg| expr::evaluate(arg, dialect, &labels, &symbols, line))
                        .collect::<Result<Vec<_>, _>>()?;
                    let word = encode::encode(dialect, cmd, &values, line, &mut warnings)?;
                    words.push(word);
                }
                pc = Some(here + 1);
            }

            statement_no += 1;
        }

        if rept_start.is_some() {
            return Err(AssemblerError::UnterminatedRept {
                line: statements.last().map_or(0, |s| s.line),
            });
        }
    }

    Ok((Assembled { words, start }, warnings))
}

fn current_pc(pc: Option<i64>, line: usize) -> Result<i64, AssemblerError> {
    pc.ok_or(AssemblerError::Expression {
        line,
        reason: "no .org has set the program counter yet".to_string(),
    })
}

fn arg_at<'a>(args: &'a [String], index: usize, cmd: &str, line: usize) -> Result<&'a String, AssemblerError> {
    args.get(index).ok_or_else(|| AssemblerError::MalformedOperands {
        line,
        cmd: cmd.to_string(),
    })
}

fn eval_one(
    args: &[String],
    index: usize,
    cmd: &str,
    line: usize,
    dialect: Dialect,
    labels: &LabelTable,
    symbols: &SymbolTable,
) -> Result<i64, AssemblerError> {
    let arg = arg_at(args, index, cmd, line)?;
    expr::evaluate(arg, dialect, labels, symbols, line)
}

fn require_dialect(
    required: Dialect,
    actual: Dialect,
    cmd: &str,
    line: usize,
) -> Result<(), AssemblerError> {
    if actual.name() == required.name() {
        Ok(())
    } else {
        Err(AssemblerError::DialectMismatch {
            line,
            directive: cmd.to_string(),
            dialect: actual.name(),
        })
    }
}

/// Rejects commands that belong to the *other* dialect before they
/// reach the encoder (which would otherwise just report them as
/// unrecognized, losing the more useful "wrong dialect" diagnostic).
fn require_not_other_dialect(cmd: &str, dialect: Dialect, line: usize) -> Result<(), AssemblerError> {
    let other_only = match dialect {
        Dialect::Vcpas => VCP_AS_ONLY.contains(&cmd),
        Dialect::VcpAs => VCPAS_ONLY.contains(&cmd),
    };
    if other_only {
        Err(AssemblerError::DialectMismatch {
            line,
            directive: cmd.to_string(),
            dialect: dialect.name(),
        })
    } else {
        Ok(())
    }
}
