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

//! Rearranger (spec.md §4.7): normalises label order so `start` comes
//! first, then ordinary labels in original order, then dotted (included)
//! labels in original order with their leading `.` stripped.

use crate::press::{ParsedInstruction, ParsedProgram};

#[derive(Debug, Clone, Default)]
pub struct RearrangedProgram {
    order: Vec<String>,
    labels: std::collections::HashMap<String, Vec<ParsedInstruction>>,
}

impl RearrangedProgram {
    pub fn order(&self) -> &[String] {
        &self.order
    }

    pub fn instructions(&self, name: &str) -> Option<&[ParsedInstruction]> {
        self.labels.get(name).map(Vec::as_slice)
    }
}

pub fn rearrange(program: &ParsedProgram) -> RearrangedProgram {
    let mut order = Vec::new();
    let mut labels = std::collections::HashMap::new();

    if program.contains_label("start") {
        order.push("start".to_string());
        labels.insert("start".to_string(), program.instructions("start").unwrap().to_vec());
    }

    for name in program.labels_in_order() {
        if name == "start" || name.starts_with('.') {
            continue;
        }
        order.push(name.clone());
        labels.insert(name.clone(), program.instructions(name).unwrap().to_vec());
    }

    for name in program.labels_in_order() {
        if let Some(bare) = name.strip_prefix('.') {
            order.push(bare.to_string());
            labels.insert(bare.to_string(), program.instructions(name).unwrap().to_vec());
        }
    }

    RearrangedProgram { order, labels }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::press::ParsedInstruction;
    use std::path::PathBuf;

    fn instr(name: &str) -> ParsedInstruction {
        ParsedInstruction { name: name.to_string(), args: Vec::new(), line: 1, origin: PathBuf::from("t.scp") }
    }

    #[test]
    fn start_comes_first_then_ordinary_then_dotted() {
        let mut program = ParsedProgram::new();
        program.ensure_label(".lib");
        program.instructions_mut(".lib").unwrap().push(instr("ret"));
        program.ensure_label("loop");
        program.instructions_mut("loop").unwrap().push(instr("jump"));
        program.ensure_label("start");
        program.instructions_mut("start").unwrap().push(instr("move"));

        let rearranged = rearrange(&program);
        assert_eq!(rearranged.order(), &["start", "loop", "lib"]);
    }
}
