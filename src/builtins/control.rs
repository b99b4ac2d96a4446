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

//! Control-flow instructions: `jump jumpz jumpnz jumpc` (0x8..0xB) and
//! `call` (0xC). A single 12-bit address argument, which is overwhelmingly
//! a label reference in practice.

use std::sync::Arc;

use super::args::value_at;
use crate::instruction::{ArgFlags, ArgSpec, InstructionCategory, InstructionDescriptor, InstructionTable};

pub(crate) fn descriptor(name: &str, opcode: u16, docstring: &str, rtl: &str) -> InstructionDescriptor {
    InstructionDescriptor {
        name: name.to_string(),
        arguments: vec![ArgSpec { name: "aa".to_string(), flags: ArgFlags::VALUE | ArgFlags::REFERENCE }],
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

pub fn register(table: &mut InstructionTable) {
    table.register(descriptor("jump", 0x8, "Jump: PC <- AAA", "PC <- AAA"));
    table.register(descriptor(
        "jumpz",
        0x9,
        "Jump Zero: IF Z=1 THEN PC <- AAA ELSE PC <- PC + 1",
        "IF Z=1 THEN PC <- AAA ELSE PC <- PC + 1",
    ));
    table.register(descriptor(
        "jumpnz",
        0xA,
        "Jump Not Zero: IF Z=0 THEN PC <- AAA ELSE PC <- PC + 1",
        "IF Z=0 THEN PC <- AAA ELSE PC <- PC + 1",
    ));
    table.register(descriptor(
        "jumpc",
        0xB,
        "Jump Carry: IF C=1 THEN PC <- AAA ELSE PC <- PC + 1",
        "IF C=1 THEN PC <- AAA ELSE PC <- PC + 1",
    ));
    table.register(descriptor(
        "call",
        0xC,
        "Call: STACK[SP] <- PC + 1; SP <- SP + 1; PC <- AAA",
        "STACK[SP] <- PC + 1\nSP <- SP + 1\nPC <- AAA",
    ));
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::instruction::ArgValue;

    #[test]
    fn jump_encodes_label_address() {
        let mut table = InstructionTable::new();
        register(&mut table);
        let mut labels = HashMap::new();
        labels.insert("loop".to_string(), 0x010);
        let desc = table.get("jump").unwrap();
        let words = (desc.compile)(&[ArgValue::LabelRef("loop".to_string())], &labels);
        assert_eq!(words, vec![0x8010]);
    }

    #[test]
    fn call_uses_opcode_c() {
        let mut table = InstructionTable::new();
        register(&mut table);
        let desc = table.get("call").unwrap();
        let words = (desc.compile)(&[ArgValue::Integer(0x300)], &HashMap::new());
        assert_eq!(words, vec![0xC300]);
    }
}
