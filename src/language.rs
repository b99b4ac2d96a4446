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

//! Data-driven `-language` descriptor sets (spec.md §4.5/§9): a `-language`
//! directive whose location isn't the literal `standard` is read as JSON
//! and parameterizes one of the built-in instruction *kinds* instead of
//! embedding a second scripting language alongside the snippet evaluator.

use serde::Deserialize;

use crate::builtins::{alu, control, fgroup, memory};
use crate::instruction::{ArgFlags, ArgSpec, InstructionCategory, InstructionDescriptor, InstructionTable};

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum DescriptorSpec {
    AluImmediate {
        name: String,
        opcode: u16,
        #[serde(default)]
        docstring: Option<String>,
        #[serde(default)]
        rtl: Option<String>,
    },
    MemoryAbsolute {
        name: String,
        opcode: u16,
        #[serde(default)]
        docstring: Option<String>,
        #[serde(default)]
        rtl: Option<String>,
    },
    ControlFlow {
        name: String,
        opcode: u16,
        #[serde(default)]
        docstring: Option<String>,
        #[serde(default)]
        rtl: Option<String>,
    },
    FGroup {
        name: String,
        low: u16,
        #[serde(default)]
        rs_defaults_to_rd: bool,
        #[serde(default)]
        disasm_alias: Option<String>,
        #[serde(default)]
        docstring: Option<String>,
        #[serde(default)]
        rtl: Option<String>,
    },
    /// A raw data word, parameterised only by name: an extension-category
    /// mnemonic with a single UNCHECKED argument, behaving like `.data`.
    DataWord {
        name: String,
        #[serde(default)]
        docstring: Option<String>,
    },
}

/// Parses `contents` as a JSON array of descriptor specs and registers one
/// `InstructionDescriptor` per entry. A malformed document or an unknown
/// `kind` tag is reported as a plain `String` reason, wrapped by the caller
/// into an `AsmError::include` with file/line context.
pub fn load_descriptor_set(table: &mut InstructionTable, contents: &str) -> Result<(), String> {
    let specs: Vec<DescriptorSpec> = serde_json::from_str(contents).map_err(|e| format!("malformed language file: {e}"))?;

    for spec in specs {
        let descriptor = match spec {
            DescriptorSpec::AluImmediate { name, opcode, docstring, rtl } => alu::descriptor(
                &name,
                opcode,
                docstring.as_deref().unwrap_or(""),
                rtl.as_deref().unwrap_or(""),
            ),
            DescriptorSpec::MemoryAbsolute { name, opcode, docstring, rtl } => memory::descriptor(
                &name,
                opcode,
                docstring.as_deref().unwrap_or(""),
                rtl.as_deref().unwrap_or(""),
            ),
            DescriptorSpec::ControlFlow { name, opcode, docstring, rtl } => control::descriptor(
                &name,
                opcode,
                docstring.as_deref().unwrap_or(""),
                rtl.as_deref().unwrap_or(""),
            ),
            DescriptorSpec::FGroup { name, low, rs_defaults_to_rd, disasm_alias, docstring, rtl } => fgroup::two_register(
                &name,
                low,
                rs_defaults_to_rd,
                disasm_alias.as_deref(),
                docstring.as_deref().unwrap_or(""),
                rtl.as_deref().unwrap_or(""),
            ),
            DescriptorSpec::DataWord { name, docstring } => data_word_descriptor(&name, docstring.as_deref()),
        };
        table.register(descriptor);
    }

    Ok(())
}

fn data_word_descriptor(name: &str, docstring: Option<&str>) -> InstructionDescriptor {
    InstructionDescriptor {
        name: name.to_string(),
        arguments: vec![ArgSpec { name: "value".to_string(), flags: ArgFlags::UNCHECKED }],
        compile: std::sync::Arc::new(|args, labels| {
            let raw = crate::builtins::args::raw_at(args, 0);
            let value = if raw.is_empty() {
                0
            } else if let Some(addr) = labels.get(crate::instruction::strip_tildes(&raw)) {
                *addr
            } else {
                crate::snippet::parse_int_literal(&raw).unwrap_or(0) as u16
            };
            vec![value]
        }),
        precompute_compile: None,
        docstring: docstring.map(str::to_string),
        rtl_string: None,
        category: InstructionCategory::Extension,
        disasm_alias: None,
    }
}
