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

//! Character source (spec.md §4.1): normalises raw source text into the
//! character stream the tokeniser consumes. Tabs become four spaces;
//! anything outside 0x20..0x7E is dropped except the newline, which the
//! tokeniser needs to count lines.

/// Normalise `raw` per spec.md §4.1 and return the resulting characters.
pub fn normalize(raw: &str) -> Vec<char> {
    let mut out = Vec::with_capacity(raw.len());

    for ch in raw.chars() {
        if ch == '\t' {
            out.extend(['\x20', '\x20', '\x20', '\x20']);
            continue;
        }

        if ch == '\n' {
            out.push(ch);
            continue;
        }

        if ('\x20'..='\x7E').contains(&ch) {
            out.push(ch);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tabs_become_four_spaces() {
        assert_eq!(normalize("a\tb"), vec!['a', ' ', ' ', ' ', ' ', 'b']);
    }

    #[test]
    fn newline_preserved() {
        assert_eq!(normalize("a\nb"), vec!['a', '\n', 'b']);
    }

    #[test]
    fn non_ascii_dropped() {
        assert_eq!(normalize("a\u{2603}b"), vec!['a', 'b']);
    }

    #[test]
    fn control_chars_dropped() {
        assert_eq!(normalize("a\x01b"), vec!['a', 'b']);
    }
}
