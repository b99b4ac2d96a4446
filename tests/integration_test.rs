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

//! End-to-end scenarios (spec.md §8) driven entirely through `MockFileReader`
//! — no real filesystem access, matching the crate's file-I/O seam.

use std::path::{Path, PathBuf};

use cicasm::file_reader::{AsmFileReader, MockFileReader};
use cicasm::{assemble, format};

fn assemble_str(src: &str) -> cicasm::AssembledProgram {
    let mut reader = MockFileReader::default();
    reader.add_file("main.scp", src);
    assemble(Path::new("main.scp"), 0, PathBuf::from("."), &reader).expect("expected a successful assembly")
}

#[test]
fn immediate_move_and_jump_loop_emits_expected_words() {
    let result = assemble_str("start:\nmove RA 0x01\njump start\n");
    assert_eq!(result.final_program.words, vec![0x0001, 0x8000]);
    assert_eq!(format::asc(&result.final_program), "0000 0001 8000\n");
}

#[test]
fn forward_label_reference_resolves_after_layout() {
    // `jump later` is bound before `later` has been declared; layout must
    // still resolve it once the whole program's addresses are known.
    let result = assemble_str("start:\njump later\nlater:\nmove RA 0x02\n");
    assert_eq!(result.final_program.words.len(), 2);
    // `jump` at address 0 should target address 1, where `later` begins.
    assert_eq!(result.final_program.words[0], 0x8000 | 0x0001);
    assert_eq!(result.final_program.words[1], 0x0002);
}

#[test]
fn strn_embeds_string_with_trailing_nul() {
    let result = assemble_str("start:\n.strn \"A\"\njump start\n");
    // .strn "A" -> [0x0041, 0x0000], followed by the `jump start` word.
    assert_eq!(result.final_program.words, vec![0x0041, 0x0000, 0x8000]);
}

#[test]
fn duplicate_label_declaration_appends_to_the_original() {
    let result = assemble_str("start:\nmove RA 0x01\nloop:\nadd RA 0x01\nstart:\njump loop\n");
    // Re-declaring `start` appends `jump loop` onto the original `start`
    // label's instruction list rather than creating a second label, so it
    // lands right after `move` and before `loop`'s own instructions — not
    // at the textual end of the file (spec.md §4.7).
    assert_eq!(result.final_program.words.len(), 3);
    assert_eq!(result.final_program.words[0], 0x0001); // start: move RA 1
    assert_eq!(result.final_program.words[1], 0x8000 | 0x0002); // start: jump loop (loop at address 2)
    assert_eq!(result.final_program.words[2], 0x1001); // loop: add RA 1
}

#[test]
fn disassembly_round_trips_legacy_instructions_textually() {
    // The disassembler re-emits each legacy argument's original source
    // text verbatim, so the literal written here ("1", not "0x01") is
    // exactly what must reappear.
    let result = assemble_str("start:\nmove RA 1\nloadr RA RB\njump start\n");
    let text = result.disassemble();
    assert!(text.contains("start:\n"));
    assert!(text.contains("    move RA 1\n"));
    assert!(text.contains("    load RA (RB)\n"));
    assert!(text.contains("    jump start\n"));
}

#[test]
fn disassembly_round_trips_legacy_instructions_byte_for_byte() {
    // spec.md §4.11 / Invariant 2 / Scenario 5: re-assembling the
    // disassembler's own output for a legacy-only program must reproduce
    // the original word stream exactly, not just resemble it textually.
    // `mover`/`loadr` exercise the F-group two-register forms, which the
    // disassembler aliases to `move`/`load` — the very mnemonics that must
    // now accept a register second operand to round-trip.
    let original = assemble_str("start:\nmove RA 1\nmover RB RA\nloadr RA RB\nstorer RB RA\njump start\n");
    let text = original.disassemble();

    let mut reader = MockFileReader::default();
    reader.add_file("roundtrip.scp", &text);
    let reassembled =
        assemble(Path::new("roundtrip.scp"), 0, PathBuf::from("."), &reader).expect("disassembled output must re-assemble");

    assert_eq!(reassembled.final_program.words, original.final_program.words);
}

#[test]
fn unknown_label_reference_is_fatal_and_produces_no_output() {
    let mut reader = MockFileReader::default();
    reader.add_file("main.scp", "start:\njump nowhere\n");
    let outcome = assemble(Path::new("main.scp"), 0, PathBuf::from("."), &reader);
    assert!(outcome.is_err());
}

#[test]
fn include_and_language_resolve_against_the_real_filesystem() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path().to_path_buf();

    std::fs::write(
        root.join("lib.scp"),
        ".routine:\n    move RA 0x09\n    ret\n",
    )
    .unwrap();

    let language_json = r#"[{"kind": "alu_immediate", "name": "xor_imm", "opcode": 3, "docstring": "xor immediate"}]"#;
    std::fs::write(root.join("extra.lang.json"), language_json).unwrap();

    std::fs::write(
        root.join("main.scp"),
        "-language \"extra.lang.json\"\nstart:\n    xor_imm RA 0x1\n    -include \"lib.scp\"\n    jump start\n",
    )
    .unwrap();

    let reader = AsmFileReader;
    let result = assemble(&root.join("main.scp"), 0, root.clone(), &reader).expect("real-filesystem assembly");

    // `start` lays out first (xor_imm RA 0x1 -> 0x3001, jump start -> 0x8000),
    // then the included `.routine` label follows as `lib.routine`
    // (move RA 0x09 -> 0x0009, ret -> 0xF000).
    assert_eq!(result.final_program.words, vec![0x3001, 0x8000, 0x0009, 0xF000]);
    assert_eq!(result.final_program.addresses["lib.routine"], 2);
}
