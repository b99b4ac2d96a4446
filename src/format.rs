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

//! Output formatters (spec.md §4.12/§6): deterministic derivations of the
//! emitted word stream. `.asc` is the canonical form; everything else is a
//! reshaping of the same `base`/`words` pair.

use crate::layout::FinalProgram;

pub fn asc(program: &FinalProgram) -> String {
    let mut parts = vec![format!("{:04x}", program.base)];
    parts.extend(program.words.iter().map(|w| format!("{w:04x}")));
    format!("{}\n", parts.join(" "))
}

pub fn high_byte_asc(program: &FinalProgram) -> String {
    let mut parts = vec![format!("{:04x}", program.base)];
    parts.extend(program.words.iter().map(|w| format!("{:02x}", (w >> 8) as u8)));
    format!("{}\n", parts.join(" "))
}

pub fn low_byte_asc(program: &FinalProgram) -> String {
    let mut parts = vec![format!("{:04x}", program.base)];
    parts.extend(program.words.iter().map(|w| format!("{:02x}", (w & 0x00FF) as u8)));
    format!("{}\n", parts.join(" "))
}

pub fn dat(program: &FinalProgram) -> String {
    let mut out = String::new();
    for (i, word) in program.words.iter().enumerate() {
        let address = program.base.wrapping_add(i as u16);
        out.push_str(&format!("{address:04} {word:016b}\n"));
    }
    out
}

pub fn mem(program: &FinalProgram) -> String {
    let mut out = String::new();
    for (i, word) in program.words.iter().enumerate() {
        let byte_address = (2u32 * (program.base as u32 + i as u32)) as u16;
        out.push_str(&format!("@{:04X} {:04X}\n", byte_address, reverse_hex_digits(*word)));
    }
    out
}

/// Swaps a word's two bytes and each byte's nibbles, i.e. reverses the
/// order of its four hex digits (spec.md §6).
fn reverse_hex_digits(word: u16) -> u16 {
    let digits = format!("{word:04X}");
    let reversed: String = digits.chars().rev().collect();
    u16::from_str_radix(&reversed, 16).expect("four hex digits reversed are still four hex digits")
}

pub fn mif(program: &FinalProgram) -> String {
    let mut out = String::new();
    out.push_str("DEPTH = 32;\n");
    out.push_str("WIDTH = 16;\n");
    out.push_str("ADDRESS_RADIX = HEX;\n");
    out.push_str("DATA_RADIX = BIN;\n");
    out.push_str("CONTENT\n");
    out.push_str("BEGIN\n");
    for (i, word) in program.words.iter().enumerate() {
        let address = program.base.wrapping_add(i as u16);
        out.push_str(&format!("{address:04X} : {word:016b};\n"));
    }
    out.push_str("END;\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn program(base: u16, words: Vec<u16>) -> FinalProgram {
        FinalProgram { base, words, addresses: HashMap::new() }
    }

    #[test]
    fn asc_renders_base_then_lowercase_words() {
        let text = asc(&program(0, vec![0x0401, 0x8000]));
        assert_eq!(text, "0000 0401 8000\n");
    }

    #[test]
    fn high_and_low_byte_asc_split_each_word() {
        let p = program(0, vec![0xAB12]);
        assert_eq!(high_byte_asc(&p), "0000 ab\n");
        assert_eq!(low_byte_asc(&p), "0000 12\n");
    }

    #[test]
    fn dat_emits_decimal_address_and_binary_word() {
        let text = dat(&program(0, vec![0x0001]));
        assert_eq!(text, "0000 0000000000000001\n");
    }

    #[test]
    fn mem_reverses_hex_digits_and_doubles_address() {
        let text = mem(&program(0, vec![0xAB12]));
        assert_eq!(text, "@0000 21BA\n");
    }

    #[test]
    fn mif_has_altera_header_and_terminator() {
        let text = mif(&program(0, vec![0x0001]));
        assert!(text.starts_with("DEPTH = 32;\n"));
        assert!(text.contains("0000 : 0000000000000001;\n"));
        assert!(text.ends_with("END;\n"));
    }
}
