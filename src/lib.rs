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

//! `cicasm`: an assembler and disassembler for the 16-bit educational
//! simpleCPU, source dialect SCP. The library is the whole compilation
//! pipeline; `main.rs` is a thin CLI wrapper that reads/writes files and
//! renders diagnostics.
//!
//! Pipeline: [`source`] normalisation -> [`lexer`] tokenising -> [`alias`]
//! substitution and [`snippet`] execution -> the [`press`] (parser) ->
//! [`precompute`] expansion -> [`rearrange`]ment -> the [`typer`] -> two-pass
//! [`layout`]. [`disasm`] inverts the pipeline's tail for the legacy subset;
//! [`format`] renders the final word stream into the output file formats.

pub mod alias;
pub mod builtins;
pub mod compilation;
pub mod disasm;
pub mod error;
pub mod file_reader;
pub mod format;
pub mod instruction;
pub mod language;
pub mod layout;
pub mod lexer;
pub mod precompute;
pub mod press;
pub mod rearrange;
pub mod snippet;
pub mod source;
pub mod typer;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::alias::AliasTable;
use crate::compilation::Compilation;
use crate::error::AsmError;
use crate::file_reader::FileReader;
use crate::instruction::InstructionTable;
use crate::layout::{lay_out, FinalProgram};
use crate::rearrange::rearrange;
use crate::snippet::{ExprEvaluator, ScopeStore, SnippetEvaluator};
use crate::typer::{type_program, TypedProgram};

/// The result of a full, successful compilation run: the final word stream
/// and address map, the typed IR the disassembler needs, and any warnings
/// collected along the way. Constructed only on `Ok` — per spec.md §7,
/// there is no partial output on a fatal error.
pub struct AssembledProgram {
    pub final_program: FinalProgram,
    pub typed: TypedProgram,
    pub instructions: InstructionTable,
    pub warnings: Vec<String>,
    origin: PathBuf,
}

impl AssembledProgram {
    pub fn disassemble(&self) -> String {
        disasm::disassemble(&self.typed, &self.instructions, &self.final_program.addresses, &[self.origin.as_path()])
    }
}

/// Compiles `input` relative to `root`, at base address `base`, using the
/// deterministic [`ExprEvaluator`] as the snippet evaluator. The standard
/// instruction set is always preloaded; an explicit `-language standard`
/// in source is then a harmless no-op (spec.md §4.5's idempotent load).
pub fn assemble<F: FileReader>(input: &Path, base: u16, root: PathBuf, reader: &F) -> Result<AssembledProgram, AsmError> {
    assemble_with_evaluator(input, base, root, reader, &mut ExprEvaluator)
}

/// Like [`assemble`], but with a caller-supplied snippet evaluator — the
/// seam spec.md §9 calls out as an external collaborator the core treats
/// as an opaque callback.
pub fn assemble_with_evaluator<F: FileReader>(
    input: &Path,
    base: u16,
    root: PathBuf,
    reader: &F,
    evaluator: &mut dyn SnippetEvaluator,
) -> Result<AssembledProgram, AsmError> {
    let mut aliases = AliasTable::new();
    let mut instructions = InstructionTable::new();
    builtins::load_standard(&mut instructions);
    instructions.mark_loaded("standard");
    let mut scopes = ScopeStore::new();

    let (program, warnings) = {
        let mut compilation = Compilation {
            aliases: &mut aliases,
            instructions: &mut instructions,
            scopes: &mut scopes,
            evaluator,
            reader,
            root,
            warnings: Vec::new(),
            include_stack: HashSet::new(),
        };
        let program = compilation.compile_unit(input, true)?;
        (program, compilation.warnings)
    };

    let rearranged = rearrange(&program);
    let typed = type_program(&rearranged, &instructions)?;
    let final_program = lay_out(&typed, &instructions, base)?;

    Ok(AssembledProgram { final_program, typed, instructions, warnings, origin: input.to_path_buf() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_reader::MockFileReader;

    #[test]
    fn assembles_a_minimal_move_and_jump_loop() {
        let mut reader = MockFileReader::default();
        reader.add_file("main.scp", "start:\nmove RA 0x01\njump start\n");
        let result = assemble(Path::new("main.scp"), 0, PathBuf::from("."), &reader).unwrap();
        assert_eq!(result.final_program.words, vec![0x0001, 0x8000]);
    }

    #[test]
    fn unknown_label_reference_is_fatal() {
        let mut reader = MockFileReader::default();
        reader.add_file("main.scp", "start:\njump nowhere\n");
        assert!(assemble(Path::new("main.scp"), 0, PathBuf::from("."), &reader).is_err());
    }
}
