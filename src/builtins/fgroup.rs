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

//! F-group register operations: high nibble 0xF, low nibble distinguishes
//! `ret mover loadr storer rol ror addr subr andr orr xorr aslr`. Two-
//! register ops encode `(Rd<<2)|Rs` in bits 11..8.
//!
//! `rol`/`ror`/`aslr` take a second register operand here (unlike the
//! source this was ported from, which only ever reads one): when omitted,
//! it defaults to the first register rather than to R0, so `rol RA` keeps
//! encoding identically to `rol RA RA`.

use std::sync::Arc;

use super::args::{register_at, register_at_or};
use crate::instruction::{ArgFlags, ArgSpec, InstructionCategory, InstructionDescriptor, InstructionTable};

pub(crate) fn two_register(
    name: &str,
    low: u16,
    rs_defaults_to_rd: bool,
    disasm_alias: Option<&str>,
    docstring: &str,
    rtl: &str,
) -> InstructionDescriptor {
    InstructionDescriptor {
        name: name.to_string(),
        arguments: vec![
            ArgSpec { name: "rd".to_string(), flags: ArgFlags::REGISTER | ArgFlags::REQUIRED },
            ArgSpec { name: "rs".to_string(), flags: ArgFlags::REGISTER },
        ],
        compile: Arc::new(move |args, _labels| {
            let rd = register_at(args, 0);
            let rs = if rs_defaults_to_rd {
                register_at_or(args, 1, rd)
            } else {
                register_at(args, 1)
            };
            let value = (rd.encoded_bits() << 2) | rs.encoded_bits();
            vec![0xF000 | (value << 8) | low]
        }),
        precompute_compile: None,
        docstring: Some(docstring.to_string()),
        rtl_string: Some(rtl.to_string()),
        category: InstructionCategory::Legacy,
        disasm_alias: disasm_alias.map(str::to_string),
    }
}

pub fn register(table: &mut InstructionTable) {
    table.register(InstructionDescriptor {
        name: "ret".to_string(),
        arguments: vec![],
        compile: Arc::new(|_args, _labels| vec![0xF000]),
        precompute_compile: None,
        docstring: Some("Return: SP <- SP - 1; PC <- STACK[SP]".to_string()),
        rtl_string: Some("SP <- SP - 1\nPC <- STACK[SP]".to_string()),
        category: InstructionCategory::Legacy,
        disasm_alias: None,
    });

    table.register(two_register("mover", 0x1, false, Some("move"), "Move (Register): RX <- RY", "RX <- RY"));
    table.register(two_register("loadr", 0x2, false, Some("load"), "Load (Register): RX <- M[RY]", "RX <- M[RY]"));
    table.register(two_register("storer", 0x3, false, Some("store"), "Store (Register): M[RY] <- RX", "M[RY] <- RX"));
    table.register(two_register(
        "rol",
        0x4,
        true,
        None,
        "Rotate Left: RX <- (RX(14:0) || RX(15))",
        "RX <- (RX(14:0) || RX(15))",
    ));
    table.register(two_register(
        "ror",
        0x5,
        true,
        None,
        "Rotate Right: RX <- (RX(0) || RX(15:1))",
        "RX <- (RX(0) || RX(15:1))",
    ));
    table.register(two_register("addr", 0x6, false, Some("add"), "Add (Register): RX <- RX + RY", "RX <- RX + RY"));
    table.register(two_register("subr", 0x7, false, Some("sub"), "Sub (Register): RX <- RX - RY", "RX <- RX - RY"));
    table.register(two_register("andr", 0x8, false, Some("and"), "And (Register): RX <- RX & RY", "RX <- RX & RY"));
    table.register(two_register("orr", 0x9, false, Some("or"), "Or (Register): RX <- RX | RY", "RX <- RX | RY"));
    table.register(two_register("xorr", 0xA, false, Some("xor"), "Xor (Register): RX <- RX ^ RY", "RX <- RX ^ RY"));
    table.register(two_register(
        "aslr",
        0xB,
        true,
        Some("asl"),
        "Arithmetic Shift Left: RX <- (RX(14:0) || 0)",
        "RX <- (RX(14:0) || 0)",
    ));

    // `xor`/`asl` have no ALU-immediate twin to overload (unlike
    // move/add/sub/and/or), so they're registered as plain synonyms of
    // `xorr`/`aslr` purely so the disassembler's `xorr->xor`/`aslr->asl`
    // aliasing round-trips (spec.md §4.11 / Invariant 2).
    table.register(two_register("xor", 0xA, false, None, "Xor: RX <- RX ^ RY", "RX <- RX ^ RY"));
    table.register(two_register(
        "asl",
        0xB,
        true,
        None,
        "Arithmetic Shift Left: RX <- (RX(14:0) || 0)",
        "RX <- (RX(14:0) || 0)",
    ));
}
