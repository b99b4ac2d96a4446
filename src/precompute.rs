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

//! Pre-computer (spec.md §4.6): expands instructions whose descriptor
//! provides `precompute_compile` into further source text, re-lexed and
//! re-parsed in place. Runs after the main parse and after each include's
//! parse (i.e. once per `Compilation::compile_text` call, on that call's
//! own `ParsedProgram` only — nested includes already precomputed
//! themselves recursively).
//!
//! An expansion's replacement instructions land under a fresh synthetic
//! continuation label (`~insert`, renamed to the computed insertion label)
//! spliced immediately after the label the expanding instruction lived in
//! — not inlined into that label's own instruction list — since the
//! expanding instruction itself contributes no words of its own.

use std::collections::HashSet;
use std::path::Path;

use crate::error::AsmError;
use crate::file_reader::FileReader;
use crate::{compilation::Compilation, press::ParsedProgram};

pub fn run<F: FileReader>(program: &mut ParsedProgram, file: &Path, compilation: &mut Compilation<F>) -> Result<(), AsmError> {
    let labels: Vec<String> = program.labels_in_order().to_vec();

    for label in labels {
        let Some(original) = program.instructions(&label).map(|s| s.to_vec()) else { continue };
        let mut kept = Vec::with_capacity(original.len());
        let mut anchor = label.clone();

        for instr in original {
            let expanding = compilation
                .instructions
                .get(&instr.name)
                .and_then(|desc| desc.precompute_compile.clone());

            let Some(precompute_fn) = expanding else {
                kept.push(instr);
                continue;
            };

            let base = crate::instruction::strip_tildes(&label).to_string();
            let depth = deepest_tilde_depth(program, &base) + 1;
            let insertion_label = format!("{base}{}", "~".repeat(depth));

            let text = precompute_fn(&instr.args, &base).replace("~insert", &insertion_label);
            let nested = compilation.compile_text(&text, file, false)?;

            let mut spliced_this_round: Vec<String> = Vec::new();
            for (name, instrs) in nested.iter() {
                if is_insertion_label(name, &insertion_label) {
                    program
                        .insert_label_after(&anchor, name.clone(), instrs.clone())
                        .map_err(|collision| AsmError::layout(format!("pre-computer label collision: '{collision}'")))?;
                    spliced_this_round.push(name.clone());
                } else {
                    program
                        .insert_fresh_label(name.clone(), instrs.clone())
                        .map_err(|collision| AsmError::layout(format!("pre-computer label collision: '{collision}'")))?;
                }
            }
            if let Some(last) = spliced_this_round.into_iter().last() {
                anchor = last;
            } else {
                anchor = insertion_label;
            }
        }

        *program.instructions_mut(&label).unwrap() = kept;
    }

    Ok(())
}

fn is_insertion_label(name: &str, insertion_label: &str) -> bool {
    name == insertion_label
        || name.strip_prefix(insertion_label).is_some_and(|rest| !rest.is_empty() && rest.chars().all(|c| c == '~'))
}

fn deepest_tilde_depth(program: &ParsedProgram, base: &str) -> usize {
    let mut max_depth = 0usize;
    for name in program.labels_in_order() {
        if name == base {
            continue;
        }
        if let Some(rest) = name.strip_prefix(base) {
            if !rest.is_empty() && rest.chars().all(|c| c == '~') {
                max_depth = max_depth.max(rest.len());
            }
        }
    }
    max_depth
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alias::AliasTable;
    use crate::builtins;
    use crate::file_reader::MockFileReader;
    use crate::instruction::InstructionTable;
    use crate::snippet::{ExprEvaluator, ScopeStore};
    use std::path::PathBuf;

    fn compile(src: &str) -> Result<ParsedProgram, AsmError> {
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
        compilation.compile_text(src, Path::new("main.scp"), true)
    }

    #[test]
    fn halt_expands_to_self_jump_under_a_fresh_continuation_label() {
        let program = compile("start:\nmove RA 1\n.halt\n").unwrap();
        assert!(program.contains_label("start~"));
        assert!(program.instructions("start").unwrap().iter().all(|i| i.name != ".halt"));
        let instrs = program.instructions("start~").unwrap();
        assert_eq!(instrs.len(), 1);
        assert_eq!(instrs[0].name, "jump");
        assert_eq!(instrs[0].args, vec!["start~".to_string()]);
    }

    #[test]
    fn continuation_label_is_ordered_right_after_its_origin() {
        let program = compile("start:\nmove RA 1\n.halt\nother:\nmove RB 2\n").unwrap();
        let order = program.labels_in_order();
        let start_pos = order.iter().position(|n| n == "start").unwrap();
        let cont_pos = order.iter().position(|n| n == "start~").unwrap();
        let other_pos = order.iter().position(|n| n == "other").unwrap();
        assert!(start_pos < cont_pos && cont_pos < other_pos);
    }
}
