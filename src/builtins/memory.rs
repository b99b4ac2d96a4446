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

//! Memory-absolute instructions: `load store addm subm`, opcodes 0x4..0x7.
//! Single argument `A`, a 12-bit address (may be a label reference),
//! default 0. Encoding: `op<<12 | A12`.
//!
//! `load`/`store` are also the disassembler's display alias for the
//! F-group register-indirect `loadr`/`storer` (`RX <- M[RY]` / `M[RY] <-
//! RX`, second operand parenthesized). For that disassembled text to
//! re-assemble, `load`/`store` accept a second REGISTER argument and
//! `compile` switches to the F-group encoding when both operands parsed as
//! registers; otherwise the lone operand is the absolute address.

use std::sync::Arc;

use super::args::value_at;
use crate::instruction::{ArgFlags, ArgSpec, ArgValue, InstructionCategory, InstructionDescriptor, InstructionTable};

pub(crate) fn descriptor(name: &str, opcode: u16, docstring: &str, rtl: &str) -> InstructionDescriptor {
    InstructionDescriptor {
        name: name.to_string(),
        arguments: vec![ArgSpec { name: "a".to_string(), flags: ArgFlags::VALUE }],
        compile: Arc::new(move |args, labels| {
            let a = value_at(args, 0, labels) & 0x0FFF;
            vec![(opcode << 12) | a]
        }),
        precompute_compile: None,
        docstring: Some(docstring.to_string()),
        rtl_string: Some(rtl.to_string()),
        category: InstructionCategory::Legacy,
        disasm_alias: None,
    }
}

pub(crate) fn register_indirect_descriptor(name: &str, opcode: u16, fgroup_low: u16, docstring: &str, rtl: &str) -> InstructionDescriptor {
    InstructionDescriptor {
        name: name.to_string(),
        arguments: vec![
            ArgSpec { name: "a_or_rd".to_string(), flags: ArgFlags::VALUE | ArgFlags::REGISTER | ArgFlags::REQUIRED },
            ArgSpec { name: "rs".to_string(), flags: ArgFlags::REGISTER },
        ],
        compile: Arc::new(move |args, labels| {
            if let (Some(ArgValue::Register(rd)), Some(ArgValue::Register(rs))) = (args.first(), args.get(1)) {
                let value = (rd.encoded_bits() << 2) | rs.encoded_bits();
                return vec![0xF000 | (value << 8) | fgroup_low];
            }
            let a = value_at(args, 0, labels) & 0x0FFF;
            vec![(opcode << 12) | a]
        }),
        precompute_compile: None,
        docstring: Some(docstring.to_string()),
        rtl_string: Some(rtl.to_string()),
        category: InstructionCategory::Legacy,
        disasm_alias: None,
    }
}

pub fn register(table: &mut InstructionTable) {
    table.register(register_indirect_descriptor("load", 0x4, 0x2, "Load: RA <- M[AAA]", "RA <- M[AAA]"));
    table.register(register_indirect_descriptor("store", 0x5, 0x3, "Store: M[AAA] <- RA", "M[AAA] <- RA"));
    table.register(descriptor("addm", 0x6, "Add Memory: RA <- RA + M[AAA]", "RA <- RA + M[AAA]"));
    table.register(descriptor("subm", 0x7, "Sub Memory: RA <- RA - M[AAA]", "RA <- RA - M[AAA]"));
}
