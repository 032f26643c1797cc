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

pub mod assembler;
pub mod errors;
pub mod file_reader;
pub mod word;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use assembler::Session;
use errors::{AssemblyError, AssemblyWarning};
use file_reader::{FileReader, OutputWriter};

/// What one source file produced: every warning collected, the paths
/// actually written, and whether assembly reached output at all. `errors` is
/// empty on complete success. A first-pass or patch-resolution error leaves
/// `written` empty; an `.entry`-only error still leaves `.ob`/`.ext` in
/// `written`, with `errors` describing just the entries that didn't resolve.
pub struct AssembleReport {
    pub warnings: Vec<AssemblyWarning>,
    pub errors: Vec<AssemblyError>,
    pub written: Vec<PathBuf>,
}

impl AssembleReport {
    pub fn succeeded(&self) -> bool {
        self.errors.is_empty()
    }
}

fn with_extension(path: &Path, ext: &str) -> PathBuf {
    let mut renamed = path.to_path_buf();
    renamed.set_extension(ext);
    renamed
}

/// Assembles one `.as` file end to end: read source, run both passes, and
/// write whichever of `.ob`/`.ent`/`.ext` the run produced next to the input
/// file. A first-pass error or an unresolved patch aborts before anything is
/// written; an unresolved `.entry` label only drops `.ent` — `.ob` and `.ext`
/// are written regardless, since neither one ever depended on it.
///
/// Errors from reading the file itself are propagated via `anyhow::Context`,
/// since that is a genuine stage-boundary failure (bad path, permissions);
/// errors discovered while assembling are collected into the returned
/// [`AssembleReport`] instead, since a single malformed line should never
/// abort the rest of the file.
pub fn assemble_file<R: FileReader, W: OutputWriter>(
    source_path: &Path,
    reader: &R,
    writer: &mut W,
) -> Result<AssembleReport> {
    let source = reader
        .read_to_string(source_path)
        .with_context(|| format!("Failed to read input file: {}", source_path.display()))?;

    let mut session = Session::new();
    session.run_first_pass(&source);

    if !session.first_pass_ok() {
        return Ok(AssembleReport {
            warnings: session.warnings,
            errors: session.errors,
            written: Vec::new(),
        });
    }

    let output = match session.run_second_pass() {
        Ok(output) => output,
        Err(errors) => {
            return Ok(AssembleReport {
                warnings: session.warnings,
                errors,
                written: Vec::new(),
            });
        }
    };

    let mut written = Vec::new();

    let object_path = with_extension(source_path, "ob");
    writer
        .write(&object_path, &output.object_file)
        .with_context(|| format!("Failed to write object file: {}", object_path.display()))?;
    written.push(object_path);

    let entries_path = with_extension(source_path, "ent");
    match output.entries_file {
        Some(contents) => {
            writer
                .write(&entries_path, &contents)
                .with_context(|| format!("Failed to write entries file: {}", entries_path.display()))?;
            written.push(entries_path);
        }
        None => {
            writer.remove(&entries_path).ok();
        }
    }

    let externs_path = with_extension(source_path, "ext");
    match output.externs_file {
        Some(contents) => {
            writer
                .write(&externs_path, &contents)
                .with_context(|| format!("Failed to write externs file: {}", externs_path.display()))?;
            written.push(externs_path);
        }
        None => {
            writer.remove(&externs_path).ok();
        }
    }

    Ok(AssembleReport {
        warnings: session.warnings,
        errors: output.entry_errors,
        written,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use file_reader::{MockFileReader, MockOutputWriter};

    #[test]
    fn successful_assembly_writes_object_file_only() {
        let mut reader = MockFileReader::default();
        reader.add_file("prog.as", "MAIN: mov #5, r1\nstop\n");
        let mut writer = MockOutputWriter::default();

        let report = assemble_file(Path::new("prog.as"), &reader, &mut writer).unwrap();
        assert!(report.succeeded());
        assert_eq!(report.written, vec![PathBuf::from("prog.ob")]);
        assert!(writer.files.contains_key(Path::new("prog.ob")));
        assert!(!writer.files.contains_key(Path::new("prog.ent")));
        assert!(!writer.files.contains_key(Path::new("prog.ext")));
    }

    #[test]
    fn assembly_with_errors_writes_nothing() {
        let mut reader = MockFileReader::default();
        reader.add_file("bad.as", "1garbage: .data 1\n");
        let mut writer = MockOutputWriter::default();

        let report = assemble_file(Path::new("bad.as"), &reader, &mut writer).unwrap();
        assert!(!report.succeeded());
        assert!(report.written.is_empty());
        assert!(writer.files.is_empty());
    }

    #[test]
    fn entries_file_is_written_alongside_the_object_file() {
        let mut reader = MockFileReader::default();
        reader.add_file("prog.as", "L: rts\n.entry L\n");
        let mut writer = MockOutputWriter::default();

        let report = assemble_file(Path::new("prog.as"), &reader, &mut writer).unwrap();
        assert!(report.succeeded());
        assert!(writer.files.contains_key(Path::new("prog.ent")));
        assert!(!writer.files.contains_key(Path::new("prog.ext")));
    }

    #[test]
    fn unresolved_entry_label_suppresses_only_the_entries_file() {
        let mut reader = MockFileReader::default();
        reader.add_file("prog.as", ".entry GHOST\nstop\n");
        let mut writer = MockOutputWriter::default();

        let report = assemble_file(Path::new("prog.as"), &reader, &mut writer).unwrap();
        assert!(!report.succeeded());
        assert_eq!(
            report.errors,
            vec![AssemblyError::EntryLabelMissing { line: 1, name: "GHOST".to_string() }]
        );
        assert!(writer.files.contains_key(Path::new("prog.ob")));
        assert!(!writer.files.contains_key(Path::new("prog.ent")));
    }

    #[test]
    fn missing_input_file_is_a_context_error_not_a_report() {
        let reader = MockFileReader::default();
        let mut writer = MockOutputWriter::default();
        let result = assemble_file(Path::new("missing.as"), &reader, &mut writer);
        assert!(result.is_err());
    }
}
