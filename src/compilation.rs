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

//! The compilation driver (spec.md §5): owns the three structures shared
//! for the lifetime of one compilation run (instruction table, alias
//! table, snippet scope store) and the recursion entry point used by
//! `-include` and the pre-computer to compile a file or a spliced-in piece
//! of source text as a nested sub-compilation.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::alias::AliasTable;
use crate::error::AsmError;
use crate::file_reader::FileReader;
use crate::instruction::InstructionTable;
use crate::lexer::{self, Token};
use crate::press::{self, ParsedProgram};
use crate::precompute;
use crate::snippet::{ScopeStore, SnippetEvaluator};
use crate::source;

pub struct Compilation<'a, F: FileReader> {
    pub aliases: &'a mut AliasTable,
    pub instructions: &'a mut InstructionTable,
    pub scopes: &'a mut ScopeStore,
    pub evaluator: &'a mut dyn SnippetEvaluator,
    pub reader: &'a F,
    pub root: PathBuf,
    pub warnings: Vec<String>,
    /// Canonical paths of `-include`s currently being compiled, guarding
    /// against infinite inclusion cycles (spec.md §5). Entered on
    /// `compile_unit` and left on return, so re-entering a file already on
    /// the active stack is a cycle, not just a re-include.
    pub include_stack: HashSet<PathBuf>,
}

impl<'a, F: FileReader> Compilation<'a, F> {
    /// Reads `path` and runs it through the whole per-file pipeline: source
    /// normalisation, tokenising, alias substitution, snippet execution,
    /// the instruction press, and the pre-computer. Used for the top-level
    /// input file, `-include`d files, and (with in-memory text) pre-computer
    /// splices.
    pub fn compile_unit(&mut self, path: &Path, enforce_start: bool) -> Result<ParsedProgram, AsmError> {
        let canonical = self.reader.canonicalize(path);
        if !self.include_stack.insert(canonical.clone()) {
            return Err(AsmError::include(
                crate::error::Diagnostic::new(path.to_path_buf(), 0),
                format!("cyclic -include: '{}' is already being compiled", path.display()),
            ));
        }
        let raw = self.reader.read_to_string(path);
        let result = match raw {
            Ok(raw) => self.compile_text(&raw, path, enforce_start),
            Err(e) => Err(e),
        };
        self.include_stack.remove(&canonical);
        result
    }

    pub fn compile_text(&mut self, raw: &str, origin: &Path, enforce_start: bool) -> Result<ParsedProgram, AsmError> {
        let chars = source::normalize(raw);
        let tokens = lexer::tokenize(&chars, origin)?;
        let tokens = self.run_alias_and_snippets(tokens, origin)?;
        let mut program = press::parse(tokens, origin, enforce_start, self)?;
        precompute::run(&mut program, origin, self)?;
        Ok(program)
    }

    fn run_alias_and_snippets(&mut self, tokens: Vec<Token>, file: &Path) -> Result<Vec<Token>, AsmError> {
        let mut out = Vec::with_capacity(tokens.len());
        for tok in tokens {
            let substituted = self.aliases.substitute(&tok.lexeme);
            let tok = Token { lexeme: substituted, line: tok.line };
            let spliced = crate::snippet::execute_token(&tok, self.evaluator, self.scopes, file)?;
            out.extend(spliced);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use crate::file_reader::MockFileReader;
    use std::path::Path;

    #[test]
    fn cyclic_include_is_rejected() {
        let mut reader = MockFileReader::default();
        reader.add_file("main.scp", "start:\n-include \"b.scp\"\njump start\n");
        reader.add_file("b.scp", ".loop:\n-include \"main.scp\"\n");
        let result = crate::assemble(Path::new("main.scp"), 0, std::path::PathBuf::from("."), &reader);
        assert!(result.is_err());
    }
}
