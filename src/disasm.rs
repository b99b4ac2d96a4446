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

//! Disassembler (spec.md §4.11): renders the rearranged, argument-typed IR
//! back into source text in a fixed legacy dialect. Legacy instructions
//! re-emit textually (with the F-group disassembly aliases); anything else
//! degrades to `.data` words annotated with a comment.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::instruction::{InstructionCategory, InstructionTable};
use crate::typer::TypedProgram;

/// The two-register instructions whose second argument is a memory
/// operand, wrapped in parentheses on disassembly (spec.md §4.11). `load`
/// and `store` are included alongside their `loadr`/`storer` F-group
/// spellings because both now accept the same two-register form (see
/// `builtins::memory::register_indirect_descriptor`), so a program
/// disassembled, re-assembled, and disassembled again still renders the
/// memory operand consistently.
const PARENTHESISED_SECOND_ARG: &[&str] = &["loadr", "storer", "load", "store"];

pub fn disassemble(
    typed: &TypedProgram,
    instructions: &InstructionTable,
    addresses: &HashMap<String, u16>,
    origins: &[&Path],
) -> String {
    let (canonical, renames) = canonicalize_labels(typed);

    let mut out = String::new();
    let mut dead: Vec<String> = Vec::new();

    for label in typed.order() {
        let name = &canonical[label];
        out.push_str(name);
        out.push_str(":\n");

        for instr in typed.instructions(label).unwrap() {
            let Some(desc) = instructions.get(&instr.name) else {
                dead.push(instr.name.clone());
                continue;
            };

            if desc.category == InstructionCategory::Legacy {
                let display_name = desc.disasm_alias.as_deref().unwrap_or(&instr.name);
                let mut rendered_args = Vec::with_capacity(instr.raw_args.len());
                for (i, raw) in instr.raw_args.iter().enumerate() {
                    let text = canonical.get(raw.as_str()).cloned().unwrap_or_else(|| raw.clone());
                    let text = if PARENTHESISED_SECOND_ARG.contains(&instr.name.as_str()) && i == 1 {
                        format!("({text})")
                    } else {
                        text
                    };
                    rendered_args.push(text);
                }
                if rendered_args.is_empty() {
                    out.push_str(&format!("    {display_name}\n"));
                } else {
                    out.push_str(&format!("    {display_name} {}\n", rendered_args.join(" ")));
                }
            } else {
                let words = (desc.compile)(&instr.values, addresses);
                let comment = std::iter::once(instr.name.as_str())
                    .chain(instr.raw_args.iter().map(String::as_str))
                    .collect::<Vec<_>>()
                    .join(":");
                out.push_str(&format!("    # {comment}\n"));
                for word in words {
                    out.push_str(&format!("    .data 0x{word:04X}\n"));
                }
            }
        }
    }

    out.push_str("\n# --- footer ---\n");
    out.push_str("# originating files:\n");
    for origin in origins {
        out.push_str(&format!("#   {}\n", origin.display()));
    }
    if !renames.is_empty() {
        out.push_str("# root renames:\n");
        for (original, canonical_name) in &renames {
            out.push_str(&format!("#   {original} -> {canonical_name}\n"));
        }
    }
    if !dead.is_empty() {
        out.push_str("# dead (non-representable) instructions:\n");
        for name in &dead {
            out.push_str(&format!("#   {name}\n"));
        }
    }

    out
}

/// Assigns every label a dialect-legal name: unchanged if it's already
/// `[A-Za-z0-9]+`, otherwise a fresh `UnsupportedRoot<hex>` in first-seen
/// order. Returns the full mapping plus the (renamed-only) rename list for
/// the footer.
fn canonicalize_labels(typed: &TypedProgram) -> (HashMap<String, String>, Vec<(String, String)>) {
    let mut canonical = HashMap::new();
    let mut renames = Vec::new();
    let mut next_id: u32 = 0;

    for label in typed.order() {
        if label.chars().all(|c| c.is_ascii_alphanumeric()) {
            canonical.insert(label.clone(), label.clone());
        } else {
            let fresh = format!("UnsupportedRoot{next_id:04X}");
            next_id += 1;
            canonical.insert(label.clone(), fresh.clone());
            renames.push((label.clone(), fresh));
        }
    }

    (canonical, renames)
}
