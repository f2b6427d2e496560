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

use std::path::Path;

use vcpas::dialect::Dialect;
use vcpas::errors::AssemblerError;
use vcpas::file_reader::{AsmFileReader, MockFileReader};
use vcpas::{assemble, OutputFormat};

fn words_of(bytes: &[u8]) -> Vec<u32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| u32::from_le_bytes(chunk.try_into().unwrap()))
        .collect()
}

#[test]
fn empty_program_assembles_to_nothing() {
    let mut reader = MockFileReader::default();
    reader.add_file("empty.vcp", "; nothing here\n");
    let (bytes, warnings) = assemble(
        Path::new("empty.vcp"),
        Path::new("out.bin"),
        OutputFormat::Bin,
        Dialect::Vcpas,
        &reader,
    )
    .unwrap();
    assert!(bytes.is_empty());
    assert!(warnings.is_empty());
}

#[test]
fn single_nop_assembles_to_one_word() {
    let mut reader = MockFileReader::default();
    reader.add_file("nop.vcp", ".org 0\nnop\n");
    let (bytes, _) = assemble(
        Path::new("nop.vcp"),
        Path::new("out.bin"),
        OutputFormat::Bin,
        Dialect::Vcpas,
        &reader,
    )
    .unwrap();
    assert_eq!(words_of(&bytes), vec![0x30000000]);
}

#[test]
fn forward_branch_resolves_across_the_whole_program() {
    let mut reader = MockFileReader::default();
    reader.add_file(
        "branch.vcp",
        ".org 0\n\
         jmp forward\n\
         nop\n\
         forward:\n\
         rts\n",
    );
    let (bytes, _) = assemble(
        Path::new("branch.vcp"),
        Path::new("out.bin"),
        OutputFormat::Bin,
        Dialect::Vcpas,
        &reader,
    )
    .unwrap();
    assert_eq!(words_of(&bytes), vec![0x00000002, 0x30000000, 0x20000000]);
}

#[test]
fn setpal_count_is_biased_by_one_under_the_newer_dialect() {
    let mut reader = MockFileReader::default();
    reader.add_file("pal.vcp", ".org 0\nsetpal 0, 4\n");
    let (bytes, _) = assemble(
        Path::new("pal.vcp"),
        Path::new("out.bin"),
        OutputFormat::Bin,
        Dialect::Vcpas,
        &reader,
    )
    .unwrap();
    // 4 palette entries encode as count-1 = 3 in the low byte.
    assert_eq!(words_of(&bytes), vec![0x60000003]);
}

#[test]
fn lerp_sweeps_a_palette_gradient() {
    let mut reader = MockFileReader::default();
    reader.add_file("lerp.vcp", ".org 0\n.lerp 0x00000000, 0xff000000, 3\n");
    let (bytes, _) = assemble(
        Path::new("lerp.vcp"),
        Path::new("out.bin"),
        OutputFormat::Bin,
        Dialect::Vcpas,
        &reader,
    )
    .unwrap();
    assert_eq!(
        words_of(&bytes),
        vec![0x00000000, 0x80000000, 0xff000000]
    );
}

#[test]
fn rept_repeats_its_body_the_requested_number_of_times() {
    let mut reader = MockFileReader::default();
    reader.add_file("rept.vcp", ".org 0\n.rept 4\nnop\n.endr\nrts\n");
    let (bytes, _) = assemble(
        Path::new("rept.vcp"),
        Path::new("out.bin"),
        OutputFormat::Bin,
        Dialect::Vcpas,
        &reader,
    )
    .unwrap();
    assert_eq!(
        words_of(&bytes),
        vec![0x30000000, 0x30000000, 0x30000000, 0x30000000, 0x20000000]
    );
}

#[test]
fn symbol_arithmetic_feeds_an_operand() {
    let mut reader = MockFileReader::default();
    reader.add_file(
        "sym.vcp",
        ".org 0\n.set N, 5\nsetreg 2, N * 3\n",
    );
    let (bytes, _) = assemble(
        Path::new("sym.vcp"),
        Path::new("out.bin"),
        OutputFormat::Bin,
        Dialect::Vcpas,
        &reader,
    )
    .unwrap();
    assert_eq!(words_of(&bytes), vec![0x8200000f]);
}

#[test]
fn older_dialect_encodes_with_a_different_opcode_layout() {
    let mut reader = MockFileReader::default();
    reader.add_file("old.vcp", ".org 0\nsetreg 2, 0x10\n");
    let (bytes, _) = assemble(
        Path::new("old.vcp"),
        Path::new("out.bin"),
        OutputFormat::Bin,
        Dialect::VcpAs,
        &reader,
    )
    .unwrap();
    assert_eq!(words_of(&bytes), vec![0x82000010]);
}

#[test]
fn older_dialect_supports_the_add_directive() {
    let mut reader = MockFileReader::default();
    reader.add_file(
        "add.vcp",
        ".org 0\n.set n, 10\n.add n, 5\n.word n\n",
    );
    let (bytes, _) = assemble(
        Path::new("add.vcp"),
        Path::new("out.bin"),
        OutputFormat::Bin,
        Dialect::VcpAs,
        &reader,
    )
    .unwrap();
    assert_eq!(words_of(&bytes), vec![15]);
}

#[test]
fn older_dialect_rejects_expression_operators() {
    let mut reader = MockFileReader::default();
    reader.add_file("bad.vcp", ".org 0\nsetreg 2, 1 + 2\n");
    let err = assemble(
        Path::new("bad.vcp"),
        Path::new("out.bin"),
        OutputFormat::Bin,
        Dialect::VcpAs,
        &reader,
    )
    .unwrap_err();
    assert!(matches!(err, AssemblerError::Expression { .. }));
}

#[test]
fn asm_output_omits_program_start_under_the_older_dialect() {
    let mut reader = MockFileReader::default();
    reader.add_file("old.vcp", ".org 0\nnop\n");
    let (bytes, _) = assemble(
        Path::new("old.vcp"),
        Path::new("out.s"),
        OutputFormat::Auto,
        Dialect::VcpAs,
        &reader,
    )
    .unwrap();
    let text = String::from_utf8(bytes).unwrap();
    assert!(!text.contains("vcp_program_start"));
    assert!(text.contains("; Assembled by vcp-as"));
}

#[test]
fn include_cycle_is_reported_as_a_fatal_error() {
    let mut reader = MockFileReader::default();
    reader.add_file("a.vcp", ".include \"a.vcp\"\n");
    let err = assemble(
        Path::new("a.vcp"),
        Path::new("out.bin"),
        OutputFormat::Bin,
        Dialect::Vcpas,
        &reader,
    )
    .unwrap_err();
    assert!(matches!(err, AssemblerError::IncludeCycle { .. }));
}

#[test]
fn include_resolves_against_the_real_filesystem() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("main.vcp"), ".org 0\n.include \"child.vcp\"\n").unwrap();
    std::fs::write(dir.path().join("child.vcp"), "nop\n").unwrap();

    let reader = AsmFileReader;
    let (bytes, _) = assemble(
        &dir.path().join("main.vcp"),
        Path::new("out.bin"),
        OutputFormat::Bin,
        Dialect::Vcpas,
        &reader,
    )
    .unwrap();
    assert_eq!(words_of(&bytes), vec![0x30000000]);
}
