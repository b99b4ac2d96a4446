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

//! Snippet executor (spec.md §4.4): splices the text produced by an
//! external `SnippetEvaluator` into tokens containing `{{…}}` or `{!…!}`
//! regions, then re-lexes the spliced text so any new delimiters or
//! whitespace it introduces are handled like ordinary source.
//!
//! spec.md §9 treats evaluation itself as an opaque, pluggable concern; the
//! `ExprEvaluator` here is the narrow expression-language implementation the
//! design notes call out as an acceptable minimal port.

use std::collections::HashMap;
use std::path::Path;

use crate::error::AsmError;
use crate::lexer::{self, Token};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnippetMode {
    /// `{{expr}}` — the evaluator returns the expression's value as text.
    Line,
    /// `{!stmts!}` — the evaluator returns the statement list's "standard
    /// output" as text.
    Block,
}

/// Per-file variable bindings, addressable cross-file by dotted path
/// (`utils.counter` -> key `counter` in the scope for file `utils.scp`).
#[derive(Debug, Default)]
pub struct ScopeStore {
    files: HashMap<String, HashMap<String, String>>,
}

impl ScopeStore {
    pub fn new() -> Self {
        ScopeStore::default()
    }

    fn scope_key(path: &Path) -> String {
        path.with_extension("").to_string_lossy().replace('\\', "/")
    }

    pub fn get(&self, current_file: &Path, name: &str) -> Option<&str> {
        if let Some((qualifier, bare)) = name.rsplit_once('.') {
            self.files
                .get(qualifier)
                .and_then(|scope| scope.get(bare))
                .map(String::as_str)
        } else {
            self.files
                .get(&Self::scope_key(current_file))
                .and_then(|scope| scope.get(name))
                .map(String::as_str)
        }
    }

    pub fn set(&mut self, current_file: &Path, name: &str, value: impl Into<String>) {
        self.files
            .entry(Self::scope_key(current_file))
            .or_default()
            .insert(name.to_string(), value.into());
    }
}

/// External, pluggable evaluator for the host-language code embedded in
/// snippet regions. The core makes no assumption about the evaluated
/// language beyond: deterministic, side-effect-free outside the supplied
/// scope, and terminating.
pub trait SnippetEvaluator {
    fn evaluate(
        &mut self,
        source: &str,
        scope: &mut ScopeStore,
        file: &Path,
        mode: SnippetMode,
    ) -> Result<String, AsmError>;
}

/// Minimal conforming evaluator: integer literals, `+ - * / %`, parens,
/// identifier lookup, and a deterministic stand-in for `.randomname`.
#[derive(Default)]
pub struct ExprEvaluator;

impl SnippetEvaluator for ExprEvaluator {
    fn evaluate(
        &mut self,
        source: &str,
        scope: &mut ScopeStore,
        file: &Path,
        mode: SnippetMode,
    ) -> Result<String, AsmError> {
        match mode {
            SnippetMode::Line => {
                let value = eval_expr(source.trim(), scope, file)?;
                Ok(value.to_string())
            }
            SnippetMode::Block => {
                // The narrow statement language supports only
                // `name = expr` assignments, one per line, with the final
                // line's value becoming "standard output".
                let mut last = 0i64;
                for stmt in source.split(['\n', ';']) {
                    let stmt = stmt.trim();
                    if stmt.is_empty() {
                        continue;
                    }
                    if let Some((name, expr)) = stmt.split_once('=') {
                        let name = name.trim();
                        let value = eval_expr(expr.trim(), scope, file)?;
                        scope.set(file, name, value.to_string());
                        last = value;
                    } else {
                        last = eval_expr(stmt, scope, file)?;
                    }
                }
                Ok(last.to_string())
            }
        }
    }
}

fn eval_expr(expr: &str, scope: &ScopeStore, file: &Path) -> Result<i64, AsmError> {
    let tokens = lex_expr(expr);
    let mut pos = 0;
    let value = parse_add_sub(&tokens, &mut pos, scope, file)?;
    if pos != tokens.len() {
        return Err(AsmError::Include {
            reason: format!("unexpected trailing tokens in snippet expression: {expr}"),
            diagnostic: Default::default(),
        });
    }
    Ok(value)
}

#[derive(Debug, Clone, PartialEq)]
enum ExprTok {
    Num(i64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    LParen,
    RParen,
}

fn lex_expr(src: &str) -> Vec<ExprTok> {
    let chars: Vec<char> = src.chars().collect();
    let mut out = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' => i += 1,
            '+' => {
                out.push(ExprTok::Plus);
                i += 1;
            }
            '-' => {
                out.push(ExprTok::Minus);
                i += 1;
            }
            '*' => {
                out.push(ExprTok::Star);
                i += 1;
            }
            '/' => {
                out.push(ExprTok::Slash);
                i += 1;
            }
            '%' => {
                out.push(ExprTok::Percent);
                i += 1;
            }
            '(' => {
                out.push(ExprTok::LParen);
                i += 1;
            }
            ')' => {
                out.push(ExprTok::RParen);
                i += 1;
            }
            _ if c.is_ascii_digit() => {
                let start = i;
                if c == '0' && matches!(chars.get(i + 1), Some('x') | Some('b') | Some('o')) {
                    i += 2;
                    while i < chars.len() && chars[i].is_ascii_alphanumeric() {
                        i += 1;
                    }
                } else {
                    while i < chars.len() && chars[i].is_ascii_digit() {
                        i += 1;
                    }
                }
                let lexeme: String = chars[start..i].iter().collect();
                out.push(ExprTok::Num(parse_int_literal(&lexeme).unwrap_or(0)));
            }
            _ if c.is_alphabetic() || c == '_' || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '.') {
                    i += 1;
                }
                out.push(ExprTok::Ident(chars[start..i].iter().collect()));
            }
            _ => i += 1,
        }
    }
    out
}

/// Parses `0x`/`0b`/`0o`-prefixed or plain-decimal integer literals.
pub fn parse_int_literal(text: &str) -> Option<i64> {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).ok()
    } else if let Some(bin) = text.strip_prefix("0b").or_else(|| text.strip_prefix("0B")) {
        i64::from_str_radix(bin, 2).ok()
    } else if let Some(oct) = text.strip_prefix("0o").or_else(|| text.strip_prefix("0O")) {
        i64::from_str_radix(oct, 8).ok()
    } else {
        text.parse::<i64>().ok()
    }
}

fn parse_add_sub(tokens: &[ExprTok], pos: &mut usize, scope: &ScopeStore, file: &Path) -> Result<i64, AsmError> {
    let mut value = parse_mul_div(tokens, pos, scope, file)?;
    loop {
        match tokens.get(*pos) {
            Some(ExprTok::Plus) => {
                *pos += 1;
                value += parse_mul_div(tokens, pos, scope, file)?;
            }
            Some(ExprTok::Minus) => {
                *pos += 1;
                value -= parse_mul_div(tokens, pos, scope, file)?;
            }
            _ => break,
        }
    }
    Ok(value)
}

fn parse_mul_div(tokens: &[ExprTok], pos: &mut usize, scope: &ScopeStore, file: &Path) -> Result<i64, AsmError> {
    let mut value = parse_unary(tokens, pos, scope, file)?;
    loop {
        match tokens.get(*pos) {
            Some(ExprTok::Star) => {
                *pos += 1;
                value *= parse_unary(tokens, pos, scope, file)?;
            }
            Some(ExprTok::Slash) => {
                *pos += 1;
                let rhs = parse_unary(tokens, pos, scope, file)?;
                value = if rhs == 0 { 0 } else { value / rhs };
            }
            Some(ExprTok::Percent) => {
                *pos += 1;
                let rhs = parse_unary(tokens, pos, scope, file)?;
                value = if rhs == 0 { 0 } else { value % rhs };
            }
            _ => break,
        }
    }
    Ok(value)
}

fn parse_unary(tokens: &[ExprTok], pos: &mut usize, scope: &ScopeStore, file: &Path) -> Result<i64, AsmError> {
    if let Some(ExprTok::Minus) = tokens.get(*pos) {
        *pos += 1;
        return Ok(-parse_unary(tokens, pos, scope, file)?);
    }
    parse_primary(tokens, pos, scope, file)
}

fn parse_primary(tokens: &[ExprTok], pos: &mut usize, scope: &ScopeStore, file: &Path) -> Result<i64, AsmError> {
    match tokens.get(*pos) {
        Some(ExprTok::Num(n)) => {
            *pos += 1;
            Ok(*n)
        }
        Some(ExprTok::Ident(name)) => {
            *pos += 1;
            let name = name.clone();
            match scope.get(file, &name) {
                Some(value) => Ok(parse_int_literal(value).unwrap_or(0)),
                None => Err(AsmError::Include {
                    reason: format!("unbound snippet identifier: {name}"),
                    diagnostic: Default::default(),
                }),
            }
        }
        Some(ExprTok::LParen) => {
            *pos += 1;
            let value = parse_add_sub(tokens, pos, scope, file)?;
            if matches!(tokens.get(*pos), Some(ExprTok::RParen)) {
                *pos += 1;
            }
            Ok(value)
        }
        _ => Err(AsmError::Include {
            reason: "malformed snippet expression".to_string(),
            diagnostic: Default::default(),
        }),
    }
}

/// One `{{…}}` or `{!…!}` region located within a token.
struct Region {
    start: usize,
    end: usize,
    mode: SnippetMode,
    source: String,
}

fn find_regions(token: &str) -> Vec<Region> {
    let chars: Vec<char> = token.chars().collect();
    let mut regions = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '{' && chars.get(i + 1) == Some(&'{') {
            if let Some(end) = find_close(&chars, i + 2, '}', '}') {
                let source: String = chars[i + 2..end].iter().collect();
                regions.push(Region { start: i, end: end + 2, mode: SnippetMode::Line, source });
                i = end + 2;
                continue;
            }
        } else if chars[i] == '{' && chars.get(i + 1) == Some(&'!') {
            if let Some(end) = find_close(&chars, i + 2, '!', '}') {
                let source: String = chars[i + 2..end].iter().collect();
                regions.push(Region { start: i, end: end + 2, mode: SnippetMode::Block, source });
                i = end + 2;
                continue;
            }
        }
        i += 1;
    }
    regions
}

fn find_close(chars: &[char], from: usize, a: char, b: char) -> Option<usize> {
    let mut i = from;
    while i + 1 < chars.len() {
        if chars[i] == a && chars[i + 1] == b {
            return Some(i);
        }
        i += 1;
    }
    None
}

/// Executes every snippet region in `token`, splices the evaluated text
/// back in, then re-lexes the spliced result so any new delimiters or
/// whitespace the evaluation introduced are handled as ordinary source.
/// Returns the (possibly several) tokens the splice produced.
pub fn execute_token(
    token: &Token,
    evaluator: &mut dyn SnippetEvaluator,
    scope: &mut ScopeStore,
    file: &Path,
) -> Result<Vec<Token>, AsmError> {
    let regions = find_regions(&token.lexeme);
    if regions.is_empty() {
        return Ok(vec![token.clone()]);
    }

    let chars: Vec<char> = token.lexeme.chars().collect();
    let mut spliced = String::new();
    let mut cursor = 0usize;
    for region in &regions {
        spliced.push_str(&chars[cursor..region.start].iter().collect::<String>());
        let text = evaluator.evaluate(&region.source, scope, file, region.mode)?;
        spliced.push_str(&text);
        cursor = region.end;
    }
    spliced.push_str(&chars[cursor..].iter().collect::<String>());

    if spliced.contains(' ') || spliced.contains('\n') || !find_regions(&spliced).is_empty() {
        let renormalized: Vec<char> = spliced.chars().collect();
        lexer::tokenize(&renormalized, file)
    } else {
        Ok(vec![Token { lexeme: spliced, line: token.line }])
    }
}
