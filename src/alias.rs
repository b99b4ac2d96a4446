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

//! Alias table and substituter (spec.md §4.3): a mutable `$name$` -> text
//! map threaded through the whole compilation, seeded with `.randomname`.

use std::collections::HashMap;

/// Process-scoped `$key$` -> replacement map. One instance lives for the
/// whole compilation and is mutated by the `-alias` directive.
#[derive(Debug, Default)]
pub struct AliasTable {
    entries: HashMap<String, String>,
    random_seq: u64,
}

impl AliasTable {
    pub fn new() -> Self {
        AliasTable::default()
    }

    pub fn bind(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Produces the next deterministic `.randomname` identifier. Real
    /// randomness would make two runs over identical source produce
    /// different object code, which Invariant 1 forbids.
    pub fn next_random_name(&mut self) -> String {
        self.random_seq += 1;
        format!("rnd{:x}", self.random_seq)
    }

    /// Replace every `$key$` occurrence in `token` with its bound value.
    /// Non-recursive: the output of one key's substitution is not rescanned
    /// for further `$...$` occurrences. `$.randomname$` is special-cased
    /// (spec.md §3): each occurrence mints a fresh deterministic identifier
    /// rather than reading a fixed table entry.
    pub fn substitute(&mut self, token: &str) -> String {
        if !token.contains('$') {
            return token.to_string();
        }

        let mut out = String::with_capacity(token.len());
        let bytes: Vec<char> = token.chars().collect();
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] == '$' {
                if let Some(end) = bytes[i + 1..].iter().position(|&c| c == '$') {
                    let key: String = bytes[i + 1..i + 1 + end].iter().collect();
                    if key == ".randomname" {
                        out.push_str(&self.next_random_name());
                        i += end + 2;
                        continue;
                    }
                    if let Some(value) = self.entries.get(&key) {
                        out.push_str(value);
                        i += end + 2;
                        continue;
                    }
                }
            }
            out.push(bytes[i]);
            i += 1;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_bound_key() {
        let mut table = AliasTable::new();
        table.bind("width", "16");
        assert_eq!(table.substitute("movi RA $width$"), "movi RA 16");
    }

    #[test]
    fn unbound_key_is_left_untouched() {
        let mut table = AliasTable::new();
        assert_eq!(table.substitute("$missing$"), "$missing$");
    }

    #[test]
    fn substitution_is_not_recursive() {
        let mut table = AliasTable::new();
        table.bind("a", "$b$");
        table.bind("b", "oops");
        assert_eq!(table.substitute("$a$"), "$b$");
    }

    #[test]
    fn randomname_alias_mints_a_fresh_identifier_per_occurrence() {
        let mut table = AliasTable::new();
        let first = table.substitute("$.randomname$");
        let second = table.substitute("$.randomname$");
        assert_ne!(first, second);
    }

    #[test]
    fn random_names_are_distinct_and_deterministic() {
        let mut table = AliasTable::new();
        let a = table.next_random_name();
        let b = table.next_random_name();
        assert_ne!(a, b);

        let mut other = AliasTable::new();
        assert_eq!(other.next_random_name(), a);
    }
}
