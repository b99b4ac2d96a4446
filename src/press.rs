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

//! Instruction press (spec.md §4.5): the parser. Consumes the token stream,
//! handles `-alias`/`-language`/`-include` and subroot syntax, recognises
//! labels and instructions, and binds following tokens as positional
//! arguments up to each instruction's declared arity.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::compilation::Compilation;
use crate::error::{AsmError, Diagnostic};
use crate::file_reader::FileReader;
use crate::lexer::Token;

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedInstruction {
    pub name: String,
    pub args: Vec<String>,
    pub line: usize,
    pub origin: PathBuf,
}

/// An *ordered* label -> instruction-list mapping (spec.md §3): order
/// defines the default layout order, so a bare `HashMap` can't stand in for
/// it — declaration order must survive alongside O(1) lookup.
#[derive(Debug, Clone, Default)]
pub struct ParsedProgram {
    order: Vec<String>,
    labels: HashMap<String, Vec<ParsedInstruction>>,
}

impl ParsedProgram {
    pub fn new() -> Self {
        ParsedProgram::default()
    }

    pub fn contains_label(&self, name: &str) -> bool {
        self.labels.contains_key(name)
    }

    pub fn ensure_label(&mut self, name: &str) {
        if !self.labels.contains_key(name) {
            self.order.push(name.to_string());
            self.labels.insert(name.to_string(), Vec::new());
        }
    }

    pub fn instructions_mut(&mut self, name: &str) -> Option<&mut Vec<ParsedInstruction>> {
        self.labels.get_mut(name)
    }

    pub fn instructions(&self, name: &str) -> Option<&[ParsedInstruction]> {
        self.labels.get(name).map(Vec::as_slice)
    }

    pub fn labels_in_order(&self) -> &[String] {
        &self.order
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<ParsedInstruction>)> {
        self.order.iter().map(move |name| (name, &self.labels[name]))
    }

    /// Merges a label produced elsewhere (an include or a pre-computer
    /// splice) into this program. Any name collision is fatal (spec.md
    /// §4.6/§4.5): the caller is responsible for re-keying dotted include
    /// labels before calling this.
    pub fn insert_fresh_label(&mut self, name: String, instrs: Vec<ParsedInstruction>) -> Result<(), String> {
        if self.labels.contains_key(&name) {
            return Err(name);
        }
        self.order.push(name.clone());
        self.labels.insert(name, instrs);
        Ok(())
    }

    /// Like `insert_fresh_label`, but places `name` immediately after
    /// `anchor` in layout order rather than at the end — used by the
    /// pre-computer so an expansion's synthetic continuation label lands
    /// right where the expanding instruction was (spec.md §4.6).
    pub fn insert_label_after(&mut self, anchor: &str, name: String, instrs: Vec<ParsedInstruction>) -> Result<(), String> {
        if self.labels.contains_key(&name) {
            return Err(name);
        }
        let pos = self.order.iter().position(|n| n == anchor).map(|p| p + 1).unwrap_or(self.order.len());
        self.order.insert(pos, name.clone());
        self.labels.insert(name, instrs);
        Ok(())
    }
}

/// Strips the file extension and joins path components with `.`, used to
/// build the namespace prefix for `-include`d labels (spec.md §4.5).
pub fn dot_joined_stem(path: &Path) -> String {
    let stem = path.with_extension("");
    stem.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(".")
}

struct ParserState {
    current_label: Option<String>,
    /// base label -> deepest subroot nesting depth already used.
    tilde_depth: HashMap<String, usize>,
    pending_continuation: Option<String>,
    file: PathBuf,
}

impl ParserState {
    fn base_of(&self, label: &str) -> String {
        crate::instruction::strip_tildes(label).to_string()
    }

    /// Checks that the label's last instruction (if any) has met its
    /// required argument count; spec.md §4.5's "unfulfilled instruction".
    fn check_last_fulfilled<F: FileReader>(
        &self,
        program: &ParsedProgram,
        compilation: &Compilation<F>,
    ) -> Result<(), AsmError> {
        let Some(label) = &self.current_label else { return Ok(()) };
        let Some(instrs) = program.instructions(label) else { return Ok(()) };
        let Some(last) = instrs.last() else { return Ok(()) };
        let Some(desc) = compilation.instructions.get(&last.name) else { return Ok(()) };
        if last.args.len() < desc.required_arguments() {
            return Err(AsmError::parse(
                Diagnostic::new(self.file.clone(), last.line).with_docstring(desc.docstring.clone()),
                format!(
                    "unfulfilled instruction: {} requires {} argument(s), got {}",
                    last.name,
                    desc.required_arguments(),
                    last.args.len()
                ),
            ));
        }
        Ok(())
    }
}

/// Parses an already alias-substituted, snippet-executed token stream into
/// a `ParsedProgram`. `enforce_start` is false for includes and pre-computer
/// sub-compilations (spec.md §4.5/§4.6).
pub fn parse<F: FileReader>(
    tokens: Vec<Token>,
    file: &Path,
    enforce_start: bool,
    compilation: &mut Compilation<F>,
) -> Result<ParsedProgram, AsmError> {
    let mut program = ParsedProgram::new();
    let mut state = ParserState {
        current_label: None,
        tilde_depth: HashMap::new(),
        pending_continuation: None,
        file: file.to_path_buf(),
    };

    let mut iter = tokens.into_iter().peekable();

    while let Some(tok) = iter.next() {
        let lexeme = tok.lexeme.as_str();

        if lexeme == "-alias" {
            let key = iter.next().ok_or_else(|| {
                AsmError::parse(Diagnostic::new(state.file.clone(), tok.line), "-alias missing key")
            })?;
            let value = iter.next().ok_or_else(|| {
                AsmError::parse(Diagnostic::new(state.file.clone(), tok.line), "-alias missing value")
            })?;
            compilation.aliases.bind(key.lexeme, value.lexeme);
            continue;
        }

        if lexeme == "-language" {
            let loc = iter.next().ok_or_else(|| {
                AsmError::parse(Diagnostic::new(state.file.clone(), tok.line), "-language missing location")
            })?;
            load_language(&strip_quotes(&loc.lexeme), &state.file, tok.line, compilation)?;
            continue;
        }

        if lexeme == "-include" {
            let path_tok = iter.next().ok_or_else(|| {
                AsmError::parse(Diagnostic::new(state.file.clone(), tok.line), "-include missing path")
            })?;
            let raw_path = strip_quotes(&path_tok.lexeme);
            let included = compilation.root.join(&raw_path);
            let nested = compilation.compile_unit(&included, false)?;
            merge_include(&mut program, nested, Path::new(&raw_path), &included)
                .map_err(|reason| AsmError::include(Diagnostic::new(state.file.clone(), tok.line), reason))?;
            continue;
        }

        if let Some(label_name) = lexeme.strip_suffix(':') {
            state.check_last_fulfilled(&program, compilation)?;
            state.pending_continuation = None;
            if compilation.instructions.contains(label_name) {
                return Err(AsmError::parse(
                    Diagnostic::new(state.file.clone(), tok.line),
                    format!("label '{label_name}' collides with a registered mnemonic"),
                ));
            }
            program.ensure_label(label_name);
            state.current_label = Some(label_name.to_string());
            continue;
        }

        if compilation.instructions.contains(lexeme) {
            state.check_last_fulfilled(&program, compilation)?;

            if let Some(cont) = state.pending_continuation.take() {
                program.ensure_label(&cont);
                state.current_label = Some(cont);
            }

            if state.current_label.is_none() {
                program.ensure_label("start");
                state.current_label = Some("start".to_string());
            }

            let label = state.current_label.clone().unwrap();
            program.ensure_label(&label);
            program.instructions_mut(&label).unwrap().push(ParsedInstruction {
                name: lexeme.to_string(),
                args: Vec::new(),
                line: tok.line,
                origin: state.file.clone(),
            });
            continue;
        }

        // Subroot marker: `-NAME` immediately after an instruction with no
        // bound arguments yet.
        if let Some(name) = lexeme.strip_prefix('-') {
            let is_subroot = state
                .current_label
                .as_ref()
                .and_then(|l| program.instructions(l))
                .and_then(|instrs| instrs.last())
                .map(|last| last.args.is_empty())
                .unwrap_or(false);

            if is_subroot {
                let current = state.current_label.clone().unwrap();
                let base = state.base_of(&current);
                let sub_label = format!("{base}.{name}");
                if program.contains_label(&sub_label) {
                    return Err(AsmError::parse(
                        Diagnostic::new(state.file.clone(), tok.line),
                        format!("subroot label '{sub_label}' already exists"),
                    ));
                }
                let last_instr = program.instructions_mut(&current).unwrap().pop().unwrap();
                program.ensure_label(&sub_label);
                program.instructions_mut(&sub_label).unwrap().push(last_instr);

                let depth = state.tilde_depth.entry(base.clone()).or_insert(0);
                *depth += 1;
                let continuation = format!("{base}{}", "~".repeat(*depth));
                state.pending_continuation = Some(continuation);
                continue;
            }
        }

        // Ordinary argument token.
        if let Some(label) = &state.current_label {
            if let Some(instrs) = program.instructions_mut(label) {
                if let Some(last) = instrs.last_mut() {
                    let desc = compilation.instructions.get(&last.name);
                    let total = desc.map(|d| d.total_arguments()).unwrap_or(0);
                    if last.args.len() < total {
                        last.args.push(tok.lexeme.clone());
                    }
                    // else: ignored with a (non-fatal) warning.
                    else {
                        compilation
                            .warnings
                            .push(format!("{}:{}: ignored extra token '{}'", state.file.display(), tok.line, tok.lexeme));
                    }
                    continue;
                }
            }
        }

        compilation
            .warnings
            .push(format!("{}:{}: ignored stray token '{}'", state.file.display(), tok.line, tok.lexeme));
    }

    state.check_last_fulfilled(&program, compilation)?;

    if enforce_start && !program.contains_label("start") {
        return Err(AsmError::parse(
            Diagnostic::new(state.file.clone(), 0),
            "program has no 'start' label",
        ));
    }

    Ok(program)
}

fn strip_quotes(s: &str) -> String {
    let s = s.strip_prefix('"').unwrap_or(s);
    let s = s.strip_suffix('"').unwrap_or(s);
    s.to_string()
}

fn load_language<F: FileReader>(
    loc: &str,
    file: &Path,
    line: usize,
    compilation: &mut Compilation<F>,
) -> Result<(), AsmError> {
    if !compilation.instructions.mark_loaded(loc) {
        compilation
            .warnings
            .push(format!("{}:{}: '-language {}' already loaded, skipping", file.display(), line, loc));
        return Ok(());
    }

    if loc == "standard" {
        crate::builtins::load_standard(compilation.instructions);
        return Ok(());
    }

    let path = compilation.root.join(loc);
    let contents = compilation.reader.read_to_string(&path)?;
    crate::language::load_descriptor_set(compilation.instructions, &contents)
        .map_err(|reason| AsmError::include(Diagnostic::new(path, line), reason))
}

/// Merges an included sub-compilation's labels into `program`, re-keying
/// each dotted label with the include path's namespace (spec.md §4.5).
/// The namespace is derived from `raw_path` as written in the `-include`
/// directive (not `resolved_path`, which is root-joined and may be
/// absolute) so the same `-include "lib.scp"` line produces the same
/// namespace regardless of where the project root happens to live on disk.
/// Static (non-dotted) labels in the included file are an error.
fn merge_include(program: &mut ParsedProgram, nested: ParsedProgram, raw_path: &Path, resolved_path: &Path) -> Result<(), String> {
    let namespace = dot_joined_stem(raw_path);
    for (name, instrs) in nested.iter() {
        let Some(bare) = name.strip_prefix('.') else {
            return Err(format!("static (non-dotted) label '{name}' in included file '{}'", resolved_path.display()));
        };
        let rekeyed = format!(".{namespace}.{bare}");
        program
            .insert_fresh_label(rekeyed.clone(), instrs.clone())
            .map_err(|collision| format!("include label collision: '{collision}'"))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alias::AliasTable;
    use crate::builtins;
    use crate::file_reader::MockFileReader;
    use crate::instruction::InstructionTable;
    use crate::snippet::{ExprEvaluator, ScopeStore};
    use crate::source::normalize;
    use std::path::PathBuf;

    fn parse_src(src: &str) -> Result<ParsedProgram, AsmError> {
        let mut aliases = AliasTable::new();
        let mut instructions = InstructionTable::new();
        builtins::load_standard(&mut instructions);
        let mut scopes = ScopeStore::new();
        let mut evaluator = ExprEvaluator;
        let reader = MockFileReader::default();
        let mut compilation = Compilation {
            aliases: &mut aliases,
            instructions: &mut instructions,
            scopes: &mut scopes,
            evaluator: &mut evaluator,
            reader: &reader,
            root: PathBuf::from("."),
            warnings: Vec::new(),
            include_stack: HashSet::new(),
        };
        let chars = normalize(src);
        let file = Path::new("main.scp");
        let tokens = crate::lexer::tokenize(&chars, file)?;
        parse(tokens, file, true, &mut compilation)
    }

    #[test]
    fn synthesizes_start_label() {
        let program = parse_src("move RA 1\njump start\n").unwrap();
        assert!(program.contains_label("start"));
        assert_eq!(program.instructions("start").unwrap().len(), 2);
    }

    #[test]
    fn explicit_labels_accumulate_instructions() {
        let program = parse_src("start:\nmove RA 1\nloop:\nadd RA 1\njump loop\n").unwrap();
        assert_eq!(program.labels_in_order(), &["start", "loop"]);
        assert_eq!(program.instructions("loop").unwrap().len(), 2);
    }

    #[test]
    fn duplicate_label_appends_to_original() {
        let program = parse_src("start:\nmove RA 1\nloop:\nadd RA 1\nstart:\njump loop\n").unwrap();
        assert_eq!(program.labels_in_order(), &["start", "loop"]);
        assert_eq!(program.instructions("start").unwrap().len(), 2);
    }

    #[test]
    fn label_colliding_with_mnemonic_is_an_error() {
        assert!(parse_src("move:\nmove RA 1\n").is_err());
    }

    #[test]
    fn missing_start_label_is_fatal() {
        assert!(parse_src(".data 1\n").is_err());
    }

    #[test]
    fn unfulfilled_instruction_is_fatal() {
        // `move` requires a register argument; `jump` arriving immediately
        // after with zero bound args trips the check.
        assert!(parse_src("start:\nmove\njump start\n").is_err());
    }

    #[test]
    fn include_namespace_is_independent_of_an_absolute_project_root() {
        // The namespace for an included file's labels must come from the
        // `-include` directive's own text, not from joining it onto
        // whatever absolute path the project root resolves to — otherwise
        // the same source would produce different label names depending on
        // where the project happened to be checked out on disk.
        let mut aliases = AliasTable::new();
        let mut instructions = InstructionTable::new();
        builtins::load_standard(&mut instructions);
        let mut scopes = ScopeStore::new();
        let mut evaluator = ExprEvaluator;
        let mut reader = MockFileReader::default();
        reader.add_file("/abs/project/lib.scp", ".routine:\nret\n");
        let mut compilation = Compilation {
            aliases: &mut aliases,
            instructions: &mut instructions,
            scopes: &mut scopes,
            evaluator: &mut evaluator,
            reader: &reader,
            root: PathBuf::from("/abs/project"),
            warnings: Vec::new(),
            include_stack: HashSet::new(),
        };
        let chars = normalize("start:\n-include \"lib.scp\"\nmove RA 1\n");
        let file = Path::new("/abs/project/main.scp");
        let tokens = crate::lexer::tokenize(&chars, file).unwrap();
        let program = parse(tokens, file, true, &mut compilation).unwrap();
        assert!(program.contains_label(".lib.routine"));
    }
}
