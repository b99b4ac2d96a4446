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

//! The standard instruction set (spec.md §4.10), loaded by `-language
//! standard`. Split by family the way the original descriptor file groups
//! them: immediate ALU ops, absolute-memory ops, control flow, F-group
//! register ops, and the data directives.

pub(crate) mod alu;
pub(crate) mod control;
mod directives;
pub(crate) mod fgroup;
pub(crate) mod memory;

use crate::instruction::InstructionTable;

/// Registers every built-in descriptor into `table`. Idempotent at the
/// call-site level via `InstructionTable::mark_loaded`; this function
/// itself just (re-)inserts the descriptors.
pub fn load_standard(table: &mut InstructionTable) {
    alu::register(table);
    memory::register(table);
    control::register(table);
    fgroup::register(table);
    directives::register(table);
}

/// Shared helpers for reading typed arguments out of a `compile` closure's
/// argument slice, with the defaulting behaviour the standard set relies on
/// (an omitted VALUE/REGISTER argument resolves to 0).
pub(crate) mod args {
    use std::collections::HashMap;

    use crate::instruction::{ArgValue, Register};

    pub fn register_at(args: &[ArgValue], idx: usize) -> Register {
        match args.get(idx) {
            Some(ArgValue::Register(r)) => *r,
            _ => Register(0),
        }
    }

    /// Like `register_at`, but defaults to `fallback` rather than R0 when
    /// the argument was omitted — used by `rol`/`ror`/`aslr`, whose second
    /// operand defaults to the first (spec.md §9 open-question resolution).
    pub fn register_at_or(args: &[ArgValue], idx: usize, fallback: Register) -> Register {
        match args.get(idx) {
            Some(ArgValue::Register(r)) => *r,
            _ => fallback,
        }
    }

    pub fn value_at(args: &[ArgValue], idx: usize, labels: &HashMap<String, u16>) -> u16 {
        match args.get(idx) {
            Some(v) => v.resolved_int(labels),
            None => 0,
        }
    }

    pub fn raw_at(args: &[ArgValue], idx: usize) -> String {
        match args.get(idx) {
            Some(ArgValue::Raw(s)) => strip_quotes(s),
            Some(other) => format!("{other:?}"),
            None => String::new(),
        }
    }

    fn strip_quotes(s: &str) -> String {
        let s = s.strip_prefix('"').unwrap_or(s);
        let s = s.strip_suffix('"').unwrap_or(s);
        s.to_string()
    }
}
