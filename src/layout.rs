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

//! Layout and emitter (spec.md §4.9): a two-pass resolver. Pass 1 measures
//! each instruction's width with labels dummied to zero; that fixes every
//! label's address. Pass 2 recompiles with real addresses and asserts the
//! word count hasn't moved (Invariant A).

use std::collections::{HashMap, HashSet};

use crate::error::AsmError;
use crate::instruction::{strip_tildes, InstructionTable};
use crate::typer::TypedProgram;

#[derive(Debug, Clone)]
pub struct FinalProgram {
    pub base: u16,
    pub words: Vec<u16>,
    pub addresses: HashMap<String, u16>,
}

pub fn lay_out(typed: &TypedProgram, instructions: &InstructionTable, base: u16) -> Result<FinalProgram, AsmError> {
    let empty_labels = HashMap::new();

    let mut widths: HashMap<String, Vec<usize>> = HashMap::new();
    for label in typed.order() {
        let instrs = typed.instructions(label).unwrap();
        let mut label_widths = Vec::with_capacity(instrs.len());
        for instr in instrs {
            let desc = instructions
                .get(&instr.name)
                .ok_or_else(|| AsmError::layout(format!("unknown instruction '{}' at layout time", instr.name)))?;
            label_widths.push((desc.compile)(&instr.values, &empty_labels).len());
        }
        widths.insert(label.clone(), label_widths);
    }

    let mut addresses: HashMap<String, u16> = HashMap::new();
    let mut pointer = base;
    for label in typed.order() {
        let bare = strip_tildes(label);
        addresses.entry(bare.to_string()).or_insert(pointer);

        let sum: usize = widths[label].iter().sum();
        pointer = pointer
            .checked_add(sum as u16)
            .ok_or_else(|| AsmError::layout(format!("program exceeds the 16-bit address space at label '{label}'")))?;
    }

    let mut words = Vec::new();
    for label in typed.order() {
        let instrs = typed.instructions(label).unwrap();
        let expected_widths = &widths[label];
        for (instr, expected) in instrs.iter().zip(expected_widths.iter()) {
            let desc = instructions.get(&instr.name).unwrap();
            let emitted = (desc.compile)(&instr.values, &addresses);
            if emitted.len() != *expected {
                return Err(AsmError::layout(format!(
                    "'{}' at {}:{} produced {} word(s) on the real compile but {} on the dummy compile",
                    instr.name,
                    instr.origin.display(),
                    instr.line,
                    emitted.len(),
                    expected
                )));
            }
            words.extend(emitted);
        }
    }

    Ok(FinalProgram { base, words, addresses })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alias::AliasTable;
    use crate::builtins;
    use crate::compilation::Compilation;
    use crate::file_reader::MockFileReader;
    use crate::rearrange::rearrange;
    use crate::snippet::{ExprEvaluator, ScopeStore};
    use crate::typer::type_program;
    use std::path::{Path, PathBuf};

    fn lay_out_src(src: &str, base: u16) -> Result<FinalProgram, AsmError> {
        let mut aliases = AliasTable::new();
        let mut instructions = InstructionTable::new();
        builtins::load_standard(&mut instructions);
        let mut scopes = ScopeStore::new();
        let mut evaluator = ExprEvaluator;
        let reader = MockFileReader::default();
        let mut compilation = Compilation {
            aliases: &mut aliases,
            instructions: &mut instructions,
            scopes: &mut scopes,
            evaluator: &mut evaluator,
            reader: &reader,
            root: PathBuf::from("."),
            warnings: Vec::new(),
            include_stack: HashSet::new(),
        };
        let program = compilation.compile_text(src, Path::new("main.scp"), true)?;
        let typed = type_program(&rearrange(&program), &instructions)?;
        lay_out(&typed, &instructions, base)
    }

    #[test]
    fn single_word_instructions_lay_out_sequentially() {
        let result = lay_out_src("start:\nmove RA 1\nmove RB 2\n", 0).unwrap();
        assert_eq!(result.words, vec![0x0001, 0x0402]);
        assert_eq!(result.addresses["start"], 0);
    }

    #[test]
    fn forward_label_resolves_to_its_own_address() {
        let result = lay_out_src("start:\njump loop\nloop:\nmove RA 1\n", 0).unwrap();
        assert_eq!(result.addresses["start"], 0);
        assert_eq!(result.addresses["loop"], 1);
        assert_eq!(result.words[0], 0x8000 | 1);
    }

    #[test]
    fn base_address_offset_shifts_every_label() {
        let result = lay_out_src("start:\nmove RA 1\nloop:\nmove RB 2\n", 0x10).unwrap();
        assert_eq!(result.addresses["start"], 0x10);
        assert_eq!(result.addresses["loop"], 0x11);
    }

    #[test]
    fn duplicate_label_words_share_the_first_address() {
        let result = lay_out_src("start:\nmove RA 1\nloop:\nmove RB 2\nstart:\nmove RC 3\n", 0).unwrap();
        assert_eq!(result.words.len(), 3);
        assert_eq!(result.addresses["start"], 0);
        assert_eq!(result.addresses["loop"], 1);
    }

    #[test]
    fn str_literal_emits_one_word_per_character() {
        let result = lay_out_src("start:\n.str \"AB\"\n", 0).unwrap();
        assert_eq!(result.words, vec![0x0041, 0x0042]);
    }
}
