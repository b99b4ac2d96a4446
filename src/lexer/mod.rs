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

//! Tokeniser (spec.md §4.2): a stateful recogniser that emits
//! `(lexeme, line)` pairs, honouring string literals, line/block comments
//! and the two kinds of embedded-snippet region. Space and newline are the
//! only token delimiters — a comma is ordinary lexeme content, per the
//! canonical behaviour spec.md §9 settles on.

pub mod cursor;


use std::path::Path;

use cursor::Cursor;

use crate::error::{context_window, AsmError};

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub lexeme: String,
    pub line: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Normal,
    LineComment,
    BlockComment,
    LineSnippet,
    BlockSnippet,
    Str,
}

/// Tokenise an already-normalised character buffer.
pub fn tokenize(chars: &[char], file: &Path) -> Result<Vec<Token>, AsmError> {
    let mut cursor = Cursor::new(chars);
    let mut tokens = Vec::new();
    let mut token = String::new();
    let mut token_line = 1usize;
    let mut state = State::Normal;
    let mut escape = false;

    macro_rules! flush {
        () => {
            if !token.is_empty() {
                tokens.push(Token {
                    lexeme: std::mem::take(&mut token),
                    line: token_line,
                });
            }
        };
    }

    while let Some(ch) = cursor.peek() {
        if escape {
            if token.is_empty() {
                token_line = cursor.line();
            }
            token.push(ch);
            escape = false;
            cursor.advance();
            continue;
        }

        match state {
            State::LineComment => {
                cursor.advance();
                if ch == '\n' {
                    state = State::Normal;
                }
                continue;
            }
            State::BlockComment => {
                if ch == '/' && cursor.peek_at(1) == Some('#') {
                    cursor.advance();
                    cursor.advance();
                    state = State::Normal;
                    continue;
                }
                cursor.advance();
                continue;
            }
            State::Str => {
                if token.is_empty() {
                    token_line = cursor.line();
                }
                token.push(ch);
                cursor.advance();
                if ch == '\\' {
                    escape = true;
                } else if ch == '"' {
                    state = State::Normal;
                }
                continue;
            }
            State::LineSnippet => {
                if ch == '}' && cursor.peek_at(1) == Some('}') {
                    token.push('}');
                    token.push('}');
                    cursor.advance();
                    cursor.advance();
                    state = State::Normal;
                    continue;
                }
                if ch == '{' && cursor.peek_at(1) == Some('!') {
                    return Err(AsmError::lex(
                        file.to_path_buf(),
                        cursor.line(),
                        format!(
                            "cannot open a block-snippet inside a line-snippet: {}",
                            context_window(chars, cursor.pos())
                        ),
                    ));
                }
                if token.is_empty() {
                    token_line = cursor.line();
                }
                token.push(ch);
                cursor.advance();
                if ch == '\\' {
                    escape = true;
                }
                continue;
            }
            State::BlockSnippet => {
                if ch == '!' && cursor.peek_at(1) == Some('}') {
                    token.push('!');
                    token.push('}');
                    cursor.advance();
                    cursor.advance();
                    state = State::Normal;
                    continue;
                }
                if ch == '{' && cursor.peek_at(1) == Some('{') {
                    return Err(AsmError::lex(
                        file.to_path_buf(),
                        cursor.line(),
                        format!(
                            "cannot open a line-snippet inside a block-snippet: {}",
                            context_window(chars, cursor.pos())
                        ),
                    ));
                }
                if token.is_empty() {
                    token_line = cursor.line();
                }
                token.push(ch);
                cursor.advance();
                if ch == '\\' {
                    escape = true;
                }
                continue;
            }
            State::Normal => {
                if ch == '#' {
                    flush!();
                    if cursor.peek_at(1) == Some('/') {
                        cursor.advance();
                        cursor.advance();
                        state = State::BlockComment;
                    } else {
                        cursor.advance();
                        state = State::LineComment;
                    }
                    continue;
                }

                if ch == '"' {
                    if token.is_empty() {
                        token_line = cursor.line();
                    }
                    token.push(ch);
                    cursor.advance();
                    state = State::Str;
                    continue;
                }

                if ch == '{' && cursor.peek_at(1) == Some('{') {
                    if token.is_empty() {
                        token_line = cursor.line();
                    }
                    token.push('{');
                    token.push('{');
                    cursor.advance();
                    cursor.advance();
                    state = State::LineSnippet;
                    continue;
                }

                if ch == '{' && cursor.peek_at(1) == Some('!') {
                    if token.is_empty() {
                        token_line = cursor.line();
                    }
                    token.push('{');
                    token.push('!');
                    cursor.advance();
                    cursor.advance();
                    state = State::BlockSnippet;
                    continue;
                }

                if ch == ' ' || ch == '\n' {
                    flush!();
                    cursor.advance();
                    continue;
                }

                if ch == '\\' {
                    if token.is_empty() {
                        token_line = cursor.line();
                    }
                    token.push(ch);
                    cursor.advance();
                    escape = true;
                    continue;
                }

                if token.is_empty() {
                    token_line = cursor.line();
                }
                token.push(ch);
                cursor.advance();
            }
        }
    }

    match state {
        State::Str => {
            return Err(AsmError::lex(
                file.to_path_buf(),
                token_line,
                format!(
                    "unterminated string literal: {}",
                    context_window(chars, cursor.pos())
                ),
            ));
        }
        State::LineSnippet | State::BlockSnippet => {
            return Err(AsmError::lex(
                file.to_path_buf(),
                token_line,
                format!(
                    "unterminated snippet: {}",
                    context_window(chars, cursor.pos())
                ),
            ));
        }
        _ => {}
    }

    flush!();

    Ok(tokens)
}
