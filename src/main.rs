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

//! Thin CLI wrapper around the `cicasm` library (spec.md §6): argument
//! parsing, file I/O, and `Context`-wrapped calls into `assemble`. The core
//! never touches a filesystem or prints anything; that's all here.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use cicasm::file_reader::AsmFileReader;
use cicasm::snippet::parse_int_literal;
use cicasm::{assemble, format};

/// An assembler and disassembler for the simpleCPU SCP dialect.
#[derive(Parser)]
#[clap(name = "cicasm", version, author = "Connor Nolan")]
struct Opts {
    /// Input source file.
    #[clap(short = 'i', long)]
    input: PathBuf,

    /// Base address the program is laid out at, e.g. `0x100`.
    #[clap(short = 'A', long, default_value = "0", value_parser = parse_address)]
    address: u16,

    /// Emit `<stem>.asc`, `<stem>_high_byte.asc`, `<stem>_low_byte.asc`.
    #[clap(short = 'a')]
    asc_stem: Option<PathBuf>,

    /// Emit `<stem>.dat`.
    #[clap(short = 'd')]
    dat_stem: Option<PathBuf>,

    /// Emit `<stem>.mem`.
    #[clap(short = 'm')]
    mem_stem: Option<PathBuf>,

    /// Emit `<stem>.mif`.
    #[clap(short = 'f')]
    mif_stem: Option<PathBuf>,

    /// Shorthand: emit every format above to `<stem>.*`.
    #[clap(short = 'o')]
    all_stem: Option<PathBuf>,

    /// Emit `<stem>.dec.asm`, the disassembly.
    #[clap(short = 'D')]
    disasm_stem: Option<PathBuf>,

    /// Project root for `-include`/`-language` resolution (default: the
    /// input file's parent directory).
    #[clap(short = 'R', long)]
    root: Option<PathBuf>,

    /// Raise log verbosity. Repeatable.
    #[clap(short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,

    /// Raise log verbosity further than `-v`.
    #[clap(short = 'V', action = clap::ArgAction::Count)]
    very_verbose: u8,
}

fn parse_address(text: &str) -> Result<u16, String> {
    let value = parse_int_literal(text).ok_or_else(|| format!("not a valid integer literal: '{text}'"))?;
    u16::try_from(value).map_err(|_| format!("address offset out of range: '{text}'"))
}

fn stem_file(stem: &Path, suffix: &str) -> PathBuf {
    PathBuf::from(format!("{}{suffix}", stem.display()))
}

fn main() -> Result<()> {
    let opts = Opts::parse();
    let verbosity = opts.verbose + opts.very_verbose * 2;

    let root = opts
        .root
        .clone()
        .unwrap_or_else(|| opts.input.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from(".")));

    if verbosity > 0 {
        eprintln!("cicasm: assembling {} (root {})", opts.input.display(), root.display());
    }

    let reader = AsmFileReader;
    let result = assemble(&opts.input, opts.address, root, &reader)
        .with_context(|| format!("failed to assemble {}", opts.input.display()))?;

    if verbosity > 0 {
        eprintln!(
            "cicasm: emitted {} word(s) at base 0x{:04x}",
            result.final_program.words.len(),
            result.final_program.base
        );
    }
    if verbosity > 1 {
        for warning in &result.warnings {
            eprintln!("cicasm: warning: {warning}");
        }
    }

    // Buffer every requested output before writing any of them: spec.md §7
    // forbids partial-file output on a fatal error, and nothing past this
    // point is fallible in a way that should leave a half-written run.
    let mut outputs: Vec<(PathBuf, String)> = Vec::new();

    if let Some(stem) = &opts.asc_stem {
        outputs.push((stem_file(stem, ".asc"), format::asc(&result.final_program)));
        outputs.push((stem_file(stem, "_high_byte.asc"), format::high_byte_asc(&result.final_program)));
        outputs.push((stem_file(stem, "_low_byte.asc"), format::low_byte_asc(&result.final_program)));
    }
    if let Some(stem) = &opts.dat_stem {
        outputs.push((stem_file(stem, ".dat"), format::dat(&result.final_program)));
    }
    if let Some(stem) = &opts.mem_stem {
        outputs.push((stem_file(stem, ".mem"), format::mem(&result.final_program)));
    }
    if let Some(stem) = &opts.mif_stem {
        outputs.push((stem_file(stem, ".mif"), format::mif(&result.final_program)));
    }
    if let Some(stem) = &opts.all_stem {
        outputs.push((stem_file(stem, ".asc"), format::asc(&result.final_program)));
        outputs.push((stem_file(stem, "_high_byte.asc"), format::high_byte_asc(&result.final_program)));
        outputs.push((stem_file(stem, "_low_byte.asc"), format::low_byte_asc(&result.final_program)));
        outputs.push((stem_file(stem, ".dat"), format::dat(&result.final_program)));
        outputs.push((stem_file(stem, ".mem"), format::mem(&result.final_program)));
        outputs.push((stem_file(stem, ".mif"), format::mif(&result.final_program)));
    }
    if let Some(stem) = &opts.disasm_stem {
        outputs.push((stem_file(stem, ".dec.asm"), result.disassemble()));
    }

    for (path, contents) in &outputs {
        fs::write(path, contents).with_context(|| format!("failed to write output file {}", path.display()))?;
        if verbosity > 0 {
            eprintln!("cicasm: wrote {}", path.display());
        }
    }

    Ok(())
}
