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

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser as ClapParser;

use vcpas::dialect::Dialect;
use vcpas::file_reader::AsmFileReader;
use vcpas::{assemble, OutputFormat};

/// MC1 Video Control Program (VCP) assembler
#[derive(ClapParser)]
#[clap(version, author = "Connor Nolan")]
struct Opts {
    /// The VCP program to assemble
    #[clap(value_name = "VCP_FILE")]
    vcp: PathBuf,

    /// The output file
    #[clap(short, long)]
    output: PathBuf,

    /// The output format
    #[clap(short, long, default_value = "auto")]
    format: String,

    /// The opcode dialect to assemble for
    #[clap(short, long, default_value = "vcpas")]
    dialect: String,
}

fn main() -> ExitCode {
    let opts = Opts::parse();

    let format: OutputFormat = match opts.format.parse() {
        Ok(format) => format,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };
    let dialect: Dialect = match opts.dialect.parse() {
        Ok(dialect) => dialect,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };

    let reader = AsmFileReader;
    let (bytes, warnings) = match assemble(&opts.vcp, &opts.output, format, dialect, &reader) {
        Ok(result) => result,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = std::fs::write(&opts.output, bytes) {
        eprintln!("failed to write \"{}\": {err}", opts.output.display());
        return ExitCode::FAILURE;
    }

    for warning in &warnings {
        eprintln!("{warning}");
    }

    ExitCode::SUCCESS
}
