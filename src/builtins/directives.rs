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

//! Data directives (spec.md §4.10): `.data .chr .str .strn`, plus the
//! expanding `.halt` example that targets its own synthetic continuation
//! label via `precompute_compile`.

use std::sync::Arc;

use super::args::raw_at;
use crate::instruction::{ArgFlags, ArgSpec, InstructionCategory, InstructionDescriptor, InstructionTable};
use crate::snippet::parse_int_literal;

pub fn register(table: &mut InstructionTable) {
    table.register(InstructionDescriptor {
        name: ".data".to_string(),
        arguments: vec![ArgSpec { name: "value".to_string(), flags: ArgFlags::UNCHECKED }],
        compile: Arc::new(|args, labels| {
            let raw = raw_at(args, 0);
            let value = if raw.is_empty() {
                0
            } else if let Some(addr) = labels.get(crate::instruction::strip_tildes(&raw)) {
                *addr
            } else {
                parse_int_literal(&raw).unwrap_or(0) as u16
            };
            vec![value]
        }),
        precompute_compile: None,
        docstring: Some("Data: raw word, default 0".to_string()),
        rtl_string: None,
        category: InstructionCategory::Legacy,
        disasm_alias: None,
    });

    table.register(InstructionDescriptor {
        name: ".chr".to_string(),
        arguments: vec![ArgSpec { name: "c".to_string(), flags: ArgFlags::UNCHECKED | ArgFlags::REQUIRED }],
        compile: Arc::new(|args, _labels| {
            let raw = raw_at(args, 0);
            let ch = raw.chars().next().unwrap_or('\0');
            vec![ch as u16]
        }),
        precompute_compile: None,
        docstring: Some("Char: single character as a word".to_string()),
        rtl_string: None,
        category: InstructionCategory::Extension,
        disasm_alias: None,
    });

    table.register(InstructionDescriptor {
        name: ".str".to_string(),
        arguments: vec![ArgSpec { name: "s".to_string(), flags: ArgFlags::UNCHECKED | ArgFlags::REQUIRED }],
        compile: Arc::new(|args, _labels| {
            let raw = raw_at(args, 0);
            raw.chars().map(|c| c as u16).collect()
        }),
        precompute_compile: None,
        docstring: Some("String: sequence of character words".to_string()),
        rtl_string: None,
        category: InstructionCategory::Extension,
        disasm_alias: None,
    });

    table.register(InstructionDescriptor {
        name: ".strn".to_string(),
        arguments: vec![ArgSpec { name: "s".to_string(), flags: ArgFlags::UNCHECKED | ArgFlags::REQUIRED }],
        compile: Arc::new(|args, _labels| {
            let raw = raw_at(args, 0);
            let mut words: Vec<u16> = raw.chars().map(|c| c as u16).collect();
            words.push(0);
            words
        }),
        precompute_compile: None,
        docstring: Some("String (null-terminated): character words followed by 0x0000".to_string()),
        rtl_string: None,
        category: InstructionCategory::Extension,
        disasm_alias: None,
    });

    table.register(InstructionDescriptor {
        name: ".halt".to_string(),
        arguments: vec![],
        compile: Arc::new(|_args, _labels| vec![]),
        precompute_compile: Some(Arc::new(|_args, _root| "~insert:\n    jump ~insert\n".to_string())),
        docstring: Some("Halt: expands to an infinite jump onto itself".to_string()),
        rtl_string: Some("PC <- PC".to_string()),
        category: InstructionCategory::Extension,
        disasm_alias: None,
    });
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::instruction::ArgValue;

    #[test]
    fn data_with_no_argument_emits_one_zero_word() {
        let mut table = InstructionTable::new();
        register(&mut table);
        let desc = table.get(".data").unwrap();
        assert_eq!((desc.compile)(&[], &HashMap::new()), vec![0]);
    }

    #[test]
    fn str_emits_one_word_per_character() {
        let mut table = InstructionTable::new();
        register(&mut table);
        let desc = table.get(".str").unwrap();
        let words = (desc.compile)(&[ArgValue::Raw("\"A\"".to_string())], &HashMap::new());
        assert_eq!(words, vec![0x0041]);
    }

    #[test]
    fn strn_appends_zero_terminator() {
        let mut table = InstructionTable::new();
        register(&mut table);
        let desc = table.get(".strn").unwrap();
        let words = (desc.compile)(&[ArgValue::Raw("\"A\"".to_string())], &HashMap::new());
        assert_eq!(words, vec![0x0041, 0x0000]);
    }

    #[test]
    fn halt_is_an_expanding_instruction() {
        let mut table = InstructionTable::new();
        register(&mut table);
        let desc = table.get(".halt").unwrap();
        assert!(desc.precompute_compile.is_some());
        assert_eq!((desc.compile)(&[], &HashMap::new()), Vec::<u16>::new());
    }
}
