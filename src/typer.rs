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

//! Argument typer (spec.md §4.8): coerces raw lexemes into typed argument
//! values, checked against each positional argument's declared flags.
//! Original raw arguments are kept alongside so the disassembler can fall
//! back to them for instructions outside the legacy set.

use std::collections::HashSet;
use std::path::PathBuf;

use crate::error::{AsmError, Diagnostic};
use crate::instruction::{strip_tildes, ArgFlags, ArgValue, InstructionTable, Register};
use crate::rearrange::RearrangedProgram;
use crate::snippet::parse_int_literal;

#[derive(Debug, Clone)]
pub struct TypedInstruction {
    pub name: String,
    pub values: Vec<ArgValue>,
    pub raw_args: Vec<String>,
    pub line: usize,
    pub origin: PathBuf,
}

#[derive(Debug, Clone, Default)]
pub struct TypedProgram {
    order: Vec<String>,
    labels: std::collections::HashMap<String, Vec<TypedInstruction>>,
}

impl TypedProgram {
    pub fn order(&self) -> &[String] {
        &self.order
    }

    pub fn instructions(&self, name: &str) -> Option<&[TypedInstruction]> {
        self.labels.get(name).map(Vec::as_slice)
    }
}

pub fn type_program(rearranged: &RearrangedProgram, instructions: &InstructionTable) -> Result<TypedProgram, AsmError> {
    let known_labels: HashSet<String> = rearranged.order().iter().map(|s| strip_tildes(s).to_string()).collect();

    let mut order = Vec::new();
    let mut labels = std::collections::HashMap::new();

    for name in rearranged.order() {
        order.push(name.clone());
        let mut typed_instrs = Vec::new();
        for instr in rearranged.instructions(name).unwrap() {
            let desc = instructions.get(&instr.name).ok_or_else(|| {
                AsmError::typ(Diagnostic::new(instr.origin.clone(), instr.line), format!("unknown instruction '{}'", instr.name))
            })?;

            if instr.args.len() < desc.required_arguments() {
                return Err(AsmError::typ(
                    Diagnostic::new(instr.origin.clone(), instr.line).with_docstring(desc.docstring.clone()),
                    format!("'{}' requires {} argument(s), got {}", instr.name, desc.required_arguments(), instr.args.len()),
                ));
            }

            let mut values = Vec::with_capacity(instr.args.len());
            for (i, raw) in instr.args.iter().enumerate() {
                let flags = desc.arguments.get(i).map(|a| a.flags).unwrap_or(ArgFlags::NONE);
                let diag = || Diagnostic::new(instr.origin.clone(), instr.line).with_docstring(desc.docstring.clone());
                values.push(type_arg(raw, flags, &known_labels, diag)?);
            }

            typed_instrs.push(TypedInstruction {
                name: instr.name.clone(),
                values,
                raw_args: instr.args.clone(),
                line: instr.line,
                origin: instr.origin.clone(),
            });
        }
        labels.insert(name.clone(), typed_instrs);
    }

    Ok(TypedProgram { order, labels })
}

fn type_arg(
    raw: &str,
    flags: ArgFlags,
    known_labels: &HashSet<String>,
    diag: impl Fn() -> Diagnostic,
) -> Result<ArgValue, AsmError> {
    if flags.contains(ArgFlags::UNCHECKED) {
        return Ok(ArgValue::Raw(raw.to_string()));
    }

    let accepts_value = flags.contains(ArgFlags::VALUE) || flags.contains(ArgFlags::REFERENCE);

    // An argument can declare both REGISTER and VALUE (e.g. the ALU
    // immediate/F-group overloads in builtins::alu and builtins::memory):
    // try register first, and only fail outright if nothing else is
    // accepted; otherwise fall through to the value/label attempt below.
    if flags.contains(ArgFlags::REGISTER) {
        if let Some(r) = Register::parse(raw) {
            return Ok(ArgValue::Register(r));
        }
        if !accepts_value {
            return Err(AsmError::typ(diag(), format!("expected register reference, got '{raw}'")));
        }
    }

    if accepts_value {
        if let Some(n) = parse_int_literal(raw) {
            if !(0..=0xFFFF).contains(&n) {
                return Err(AsmError::typ(diag(), format!("numeric literal out of range: '{raw}'")));
            }
            return Ok(ArgValue::Integer(n as u16));
        }
        let bare = strip_tildes(raw);
        if known_labels.contains(bare) {
            return Ok(ArgValue::LabelRef(raw.to_string()));
        }
        if flags.contains(ArgFlags::REGISTER) {
            return Err(AsmError::typ(diag(), format!("expected register or value, got '{raw}'")));
        }
        return Err(AsmError::typ(diag(), format!("unresolved label reference: '{raw}'")));
    }

    Ok(ArgValue::Raw(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins;
    use crate::press::{ParsedInstruction, ParsedProgram};
    use crate::rearrange::rearrange;
    use std::path::Path;

    fn instr(name: &str, args: &[&str]) -> ParsedInstruction {
        ParsedInstruction {
            name: name.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
            line: 1,
            origin: Path::new("t.scp").to_path_buf(),
        }
    }

    #[test]
    fn resolves_label_reference() {
        let mut table = InstructionTable::new();
        builtins::load_standard(&mut table);

        let mut program = ParsedProgram::new();
        program.ensure_label("start");
        program.instructions_mut("start").unwrap().push(instr("jump", &["start"]));

        let typed = type_program(&rearrange(&program), &table).unwrap();
        let values = &typed.instructions("start").unwrap()[0].values;
        assert_eq!(values[0], ArgValue::LabelRef("start".to_string()));
    }

    #[test]
    fn overflow_literal_is_rejected() {
        let mut table = InstructionTable::new();
        builtins::load_standard(&mut table);

        let mut program = ParsedProgram::new();
        program.ensure_label("start");
        program.instructions_mut("start").unwrap().push(instr("jump", &["0x10000"]));

        assert!(type_program(&rearrange(&program), &table).is_err());
    }

    #[test]
    fn unresolved_label_is_a_type_error() {
        let mut table = InstructionTable::new();
        builtins::load_standard(&mut table);

        let mut program = ParsedProgram::new();
        program.ensure_label("start");
        program.instructions_mut("start").unwrap().push(instr("jump", &["nowhere"]));

        assert!(type_program(&rearrange(&program), &table).is_err());
    }

    #[test]
    fn register_argument_parses() {
        let mut table = InstructionTable::new();
        builtins::load_standard(&mut table);

        let mut program = ParsedProgram::new();
        program.ensure_label("start");
        program.instructions_mut("start").unwrap().push(instr("move", &["RB", "0x5"]));

        let typed = type_program(&rearrange(&program), &table).unwrap();
        let values = &typed.instructions("start").unwrap()[0].values;
        assert_eq!(values[0], ArgValue::Register(crate::instruction::Register(1)));
        assert_eq!(values[1], ArgValue::Integer(5));
    }

    #[test]
    fn overloaded_second_argument_prefers_register_over_value() {
        let mut table = InstructionTable::new();
        builtins::load_standard(&mut table);

        let mut program = ParsedProgram::new();
        program.ensure_label("start");
        program.instructions_mut("start").unwrap().push(instr("move", &["RA", "RB"]));

        let typed = type_program(&rearrange(&program), &table).unwrap();
        let values = &typed.instructions("start").unwrap()[0].values;
        assert_eq!(values[1], ArgValue::Register(crate::instruction::Register(1)));
    }

    #[test]
    fn overloaded_argument_rejecting_neither_kind_is_a_type_error() {
        let mut table = InstructionTable::new();
        builtins::load_standard(&mut table);

        let mut program = ParsedProgram::new();
        program.ensure_label("start");
        program.instructions_mut("start").unwrap().push(instr("move", &["RA", "nowhere"]));

        assert!(type_program(&rearrange(&program), &table).is_err());
    }
}
