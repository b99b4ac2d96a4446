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

//! The extensible instruction table (spec.md §3/§4.10): mnemonic ->
//! descriptor, argument flag-sets, and the typed argument value produced by
//! the argument typer.

use std::collections::HashMap;
use std::fmt;

/// A tiny `bitflags!`-shaped macro, scoped to this module's single use, so
/// `ArgFlags` supports the usual `contains`/`|`/`insert` vocabulary without
/// pulling in the `bitflags` crate for one five-variant set.
macro_rules! bitflags_like {
    (
        $(#[$meta:meta])*
        pub struct $Name:ident: $Ty:ty {
            $(const $Variant:ident = $value:expr;)*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
        pub struct $Name(pub $Ty);

        impl $Name {
            $(pub const $Variant: $Name = $Name($value);)*

            pub const NONE: $Name = $Name(0);

            pub fn contains(&self, other: $Name) -> bool {
                (self.0 & other.0) == other.0
            }

            pub fn insert(&mut self, other: $Name) {
                self.0 |= other.0;
            }
        }

        impl std::ops::BitOr for $Name {
            type Output = $Name;
            fn bitor(self, rhs: $Name) -> $Name {
                $Name(self.0 | rhs.0)
            }
        }
    };
}

bitflags_like! {
    /// Argument flags, spec.md §3. A bit-set rather than an enum because an
    /// argument can be e.g. both REQUIRED and REGISTER.
    pub struct ArgFlags: u8 {
        const REQUIRED  = 0b0000_0001;
        const REFERENCE = 0b0000_0010;
        const REGISTER  = 0b0000_0100;
        const VALUE     = 0b0000_1000;
        const UNCHECKED = 0b0001_0000;
    }
}

/// Register reference: 0..15, displayed as `R` followed by `A`..`P`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Register(pub u8);

impl Register {
    pub fn from_index(idx: u8) -> Option<Register> {
        if idx < 16 {
            Some(Register(idx))
        } else {
            None
        }
    }

    /// Parses `R` + a letter `A`..`P` (case-insensitive on the letter).
    /// Tolerates one layer of enclosing parentheses, since the disassembler
    /// wraps a memory-operand register in them (spec.md §4.11) and that
    /// text must parse back.
    pub fn parse(text: &str) -> Option<Register> {
        let text = match text.strip_prefix('(').and_then(|t| t.strip_suffix(')')) {
            Some(inner) => inner,
            None => text,
        };
        let mut chars = text.chars();
        let r = chars.next()?;
        if r != 'R' && r != 'r' {
            return None;
        }
        let letter = chars.next()?;
        if chars.next().is_some() {
            return None;
        }
        let upper = letter.to_ascii_uppercase();
        if !('A'..='P').contains(&upper) {
            return None;
        }
        Some(Register((upper as u8) - b'A'))
    }

    /// Masks the register index to the two bits most encodings have room
    /// for. Registers 0..15 are addressable by name, but opcode encodings
    /// only ever carve out two bits per register slot (spec.md §3), so any
    /// index above 3 wraps rather than overflowing into neighbouring
    /// encoding bits.
    pub fn encoded_bits(&self) -> u16 {
        (self.0 & 0b11) as u16
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}", (b'A' + self.0) as char)
    }
}

/// Typed argument value, produced by the argument typer (spec.md §4.8).
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Integer(u16),
    Register(Register),
    LabelRef(String),
    Raw(String),
}

impl ArgValue {
    /// Resolves to an integer for `compile`, substituting 0 for an
    /// unresolved label (dummy-compile) or the given address (real
    /// compile). `Raw` values resolve to 0; UNCHECKED-flagged arguments are
    /// expected to be consulted as their original string elsewhere.
    pub fn resolved_int(&self, labels: &HashMap<String, u16>) -> u16 {
        match self {
            ArgValue::Integer(n) => *n,
            ArgValue::Register(r) => r.encoded_bits(),
            ArgValue::LabelRef(name) => *labels.get(strip_tildes(name)).unwrap_or(&0),
            ArgValue::Raw(_) => 0,
        }
    }
}

pub fn strip_tildes(label: &str) -> &str {
    label.trim_end_matches('~')
}

/// One positional argument's declared name and flag-set.
#[derive(Debug, Clone)]
pub struct ArgSpec {
    pub name: String,
    pub flags: ArgFlags,
}

/// A compile closure: typed arguments in, emitted words out.
pub type CompileFn = std::sync::Arc<dyn Fn(&[ArgValue], &HashMap<String, u16>) -> Vec<u16> + Send + Sync>;

/// An expansion closure for *expanding* instructions (spec.md §4.6):
/// produces replacement source text given the raw argument lexemes and the
/// tilde-stripped current root label.
pub type PrecomputeFn = std::sync::Arc<dyn Fn(&[String], &str) -> String + Send + Sync>;

#[derive(Clone)]
pub struct InstructionDescriptor {
    pub name: String,
    pub arguments: Vec<ArgSpec>,
    pub compile: CompileFn,
    pub precompute_compile: Option<PrecomputeFn>,
    pub docstring: Option<String>,
    pub rtl_string: Option<String>,
    /// Whether this mnemonic belongs to the legacy set the disassembler
    /// recognises directly (spec.md §4.11), and if so, the alias it should
    /// be displayed under (`None` if displayed under its own name).
    pub category: InstructionCategory,
    pub disasm_alias: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstructionCategory {
    /// Recognised directly by the disassembler.
    Legacy,
    /// Not part of the legacy set; disassembles as raw `.data` words.
    Extension,
}

impl InstructionDescriptor {
    pub fn required_arguments(&self) -> usize {
        self.arguments.iter().filter(|a| a.flags.contains(ArgFlags::REQUIRED)).count()
    }

    pub fn total_arguments(&self) -> usize {
        self.arguments.len()
    }
}

impl fmt::Debug for InstructionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstructionDescriptor")
            .field("name", &self.name)
            .field("arguments", &self.arguments)
            .field("category", &self.category)
            .field("disasm_alias", &self.disasm_alias)
            .finish()
    }
}

/// Process-scoped mnemonic -> descriptor map, mutable via `-language`.
#[derive(Default)]
pub struct InstructionTable {
    descriptors: HashMap<String, InstructionDescriptor>,
    loaded_sources: Vec<String>,
}

impl InstructionTable {
    pub fn new() -> Self {
        InstructionTable::default()
    }

    pub fn register(&mut self, descriptor: InstructionDescriptor) {
        self.descriptors.insert(descriptor.name.clone(), descriptor);
    }

    pub fn get(&self, name: &str) -> Option<&InstructionDescriptor> {
        self.descriptors.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.descriptors.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &InstructionDescriptor> {
        self.descriptors.values()
    }

    /// `-language` is idempotent: loading an already-loaded source is
    /// skipped (spec.md §4.5). Returns `true` if this call actually loaded
    /// something.
    pub fn mark_loaded(&mut self, source: &str) -> bool {
        if self.loaded_sources.iter().any(|s| s == source) {
            false
        } else {
            self.loaded_sources.push(source.to_string());
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_parses_letter_suffix() {
        assert_eq!(Register::parse("RA"), Some(Register(0)));
        assert_eq!(Register::parse("RP"), Some(Register(15)));
        assert_eq!(Register::parse("RQ"), None);
        assert_eq!(Register::parse("XA"), None);
    }

    #[test]
    fn register_parses_through_enclosing_parens() {
        assert_eq!(Register::parse("(RB)"), Some(Register(1)));
        assert_eq!(Register::parse("(RQ)"), None);
    }

    #[test]
    fn register_display_round_trips() {
        assert_eq!(Register(0).to_string(), "RA");
        assert_eq!(Register(15).to_string(), "RP");
    }

    #[test]
    fn register_encoded_bits_mask_to_two_bits() {
        assert_eq!(Register(3).encoded_bits(), 0b11);
        assert_eq!(Register(4).encoded_bits(), 0b00);
        assert_eq!(Register(15).encoded_bits(), 0b11);
    }

    #[test]
    fn arg_flags_combine() {
        let flags = ArgFlags::REQUIRED | ArgFlags::REGISTER;
        assert!(flags.contains(ArgFlags::REQUIRED));
        assert!(flags.contains(ArgFlags::REGISTER));
        assert!(!flags.contains(ArgFlags::VALUE));
    }

    #[test]
    fn instruction_table_language_load_is_idempotent() {
        let mut table = InstructionTable::new();
        assert!(table.mark_loaded("standard"));
        assert!(!table.mark_loaded("standard"));
    }
}
