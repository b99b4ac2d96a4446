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

//! Immediate-form ALU/move instructions: `move add sub and or`, opcode
//! nibbles 0x0..0x3, 0xD. `(Rd, K)`, K optional (default 0). Encoding:
//! `op<<12 | (Rd<<2)<<8 | K8`.
//!
//! Each of these mnemonics is also the disassembler's display alias for its
//! F-group two-register twin (`mover`, `addr`, ...; see `builtins::fgroup`).
//! For the disassembler's output to re-assemble, `move RA RB` must encode
//! as the F-group register form rather than failing to type `RB` as an
//! immediate, so the second argument accepts REGISTER as well as VALUE and
//! `compile` dispatches on which kind actually showed up.

use std::sync::Arc;

use super::args::{register_at, value_at};
use crate::instruction::{ArgFlags, ArgSpec, ArgValue, InstructionCategory, InstructionDescriptor, InstructionTable};

pub(crate) fn descriptor(name: &str, opcode: u16, fgroup_low: u16, docstring: &str, rtl: &str) -> InstructionDescriptor {
    InstructionDescriptor {
        name: name.to_string(),
        arguments: vec![
            ArgSpec { name: "rd".to_string(), flags: ArgFlags::REGISTER | ArgFlags::REQUIRED },
            ArgSpec { name: "kk_or_rs".to_string(), flags: ArgFlags::VALUE | ArgFlags::REGISTER },
        ],
        compile: Arc::new(move |args, labels| {
            let rd = register_at(args, 0);
            if let Some(ArgValue::Register(rs)) = args.get(1) {
                let value = (rd.encoded_bits() << 2) | rs.encoded_bits();
                return vec![0xF000 | (value << 8) | fgroup_low];
            }
            let kk = value_at(args, 1, labels) & 0x00FF;
            vec![(opcode << 12) | (rd.encoded_bits() << 10) | kk]
        }),
        precompute_compile: None,
        docstring: Some(docstring.to_string()),
        rtl_string: Some(rtl.to_string()),
        category: InstructionCategory::Legacy,
        disasm_alias: None,
    }
}

pub fn register(table: &mut InstructionTable) {
    table.register(descriptor("move", 0x0, 0x1, "Move: RX <- K", "RX <- ((K7)8 || KK)"));
    table.register(descriptor("add", 0x1, 0x6, "Add: RX <- RX + K", "RX <- RX + ((K7)8 || KK)"));
    table.register(descriptor("sub", 0x2, 0x7, "Sub: RX <- RX - K", "RX <- RX - ((K7)8 || KK)"));
    table.register(descriptor("and", 0x3, 0x8, "And: RX <- RX & K", "RX <- RX & ((0)8 || KK)"));
    table.register(descriptor("or", 0xD, 0x9, "Or: RX <- RX | K", "RX <- RX | ((0)8 || KK)"));
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::instruction::{ArgValue, Register};

    #[test]
    fn move_encodes_register_and_immediate() {
        let mut table = InstructionTable::new();
        register(&mut table);
        let desc = table.get("move").unwrap();
        let words = (desc.compile)(&[ArgValue::Register(Register(1)), ArgValue::Integer(0x33)], &HashMap::new());
        assert_eq!(words, vec![0x0433]);
    }

    #[test]
    fn add_defaults_immediate_to_zero() {
        let mut table = InstructionTable::new();
        register(&mut table);
        let desc = table.get("add").unwrap();
        let words = (desc.compile)(&[ArgValue::Register(Register(0))], &HashMap::new());
        assert_eq!(words, vec![0x1000]);
    }

    #[test]
    fn move_with_two_registers_encodes_the_fgroup_mover_form() {
        // `move RA RB` must compile identically to `mover RA RB`, since the
        // disassembler displays `mover` as `move` and re-assembly has to
        // round-trip (spec.md §4.11 / Invariant 2).
        let mut table = InstructionTable::new();
        register(&mut table);
        crate::builtins::fgroup::register(&mut table);
        let move_words = (table.get("move").unwrap().compile)(
            &[ArgValue::Register(Register(0)), ArgValue::Register(Register(1))],
            &HashMap::new(),
        );
        let mover_words = (table.get("mover").unwrap().compile)(
            &[ArgValue::Register(Register(0)), ArgValue::Register(Register(1))],
            &HashMap::new(),
        );
        assert_eq!(move_words, mover_words);
    }
}
