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

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::AsmError;

pub trait FileReader {
    fn read_to_string(&self, path: &Path) -> Result<String, AsmError>;

    /// Canonical form of `path`, used to key the `-include` cycle guard
    /// (spec.md §5). Falls back to `path` itself when canonicalisation
    /// isn't meaningful (e.g. an in-memory reader, or a path that doesn't
    /// exist on disk yet).
    fn canonicalize(&self, path: &Path) -> PathBuf {
        path.to_path_buf()
    }
}

/// production file reader
pub struct AsmFileReader;

impl FileReader for AsmFileReader {
    fn read_to_string(&self, path: &Path) -> Result<String, AsmError> {
        Ok(fs::read_to_string(path)?)
    }

    fn canonicalize(&self, path: &Path) -> PathBuf {
        fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
    }
}

/// mock file reader for testing, and for the `MockFileReader`-backed
/// scenarios in tests/integration_test.rs
#[derive(Default)]
pub struct MockFileReader {
    files: HashMap<PathBuf, String>,
}

impl MockFileReader {
    pub fn add_file(&mut self, path: &str, content: &str) {
        self.files.insert(PathBuf::from(path), content.to_string());
    }
}

impl FileReader for MockFileReader {
    fn read_to_string(&self, path: &Path) -> Result<String, AsmError> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| AsmError::Io {
                reason: format!("mock file not found: {}", path.display()),
            })
    }
}
