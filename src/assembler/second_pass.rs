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

//! Resolves every deferred record against the finished symbol table, then
//! renders the three output files. Patch sites are walked in the order the
//! first pass recorded them (source order), so error line numbers come out
//! in the order a reader would expect.

use super::memory_image::{MemoryImage, BASE_ADDRESS};
use super::symbol_table::{SymbolKind, SymbolTable};
use super::Session;
use crate::errors::AssemblyError;
use crate::word::Word;

/// Patches one ABSOLUTE-mode operand slot against the final symbol table.
///
/// Only `Data` and `Extern` symbols are valid ABSOLUTE targets; a reference
/// to an instruction label (or any preloaded name) is rejected here, even
/// though `.entry` is happy to export one.
fn resolve_absolute(memory: &mut MemoryImage, symbols: &SymbolTable, name: &str, code_index: u32, line: usize) -> Result<(), AssemblyError> {
    let symbol = symbols
        .get(name)
        .ok_or_else(|| AssemblyError::UndeclaredVariable { line, name: name.to_string() })?;

    match &symbol.kind {
        SymbolKind::Extern => {
            // ARE = 01 (external); the address field carries no information,
            // since the linker has no base to resolve it against here.
            memory.set_code(code_index, Word::new(0b01));
        }
        SymbolKind::Data { address, .. } => {
            let resolved = BASE_ADDRESS + memory.ic() + address;
            memory.set_code(code_index, Word::new(((resolved as i32) << 2) | 0b10));
        }
        _ => {
            return Err(AssemblyError::OperandNotDataOrExtern { line, name: name.to_string() });
        }
    }
    Ok(())
}

/// Patches one STRUCT-mode operand slot, which must name a label declared
/// with `.struct`.
fn resolve_struct(memory: &mut MemoryImage, symbols: &SymbolTable, name: &str, code_index: u32, line: usize) -> Result<(), AssemblyError> {
    let symbol = symbols
        .get(name)
        .ok_or_else(|| AssemblyError::UndeclaredVariable { line, name: name.to_string() })?;

    match &symbol.kind {
        SymbolKind::Data { address, is_struct: true } => {
            let resolved = BASE_ADDRESS + memory.ic() + address;
            memory.set_code(code_index, Word::new(((resolved as i32) << 2) | 0b10));
            Ok(())
        }
        _ => Err(AssemblyError::OperandNotStruct { line, name: name.to_string() }),
    }
}

/// Walks every reserved code slot the first pass recorded and writes its
/// final word.
fn resolve_patches(session: &mut Session) -> Vec<AssemblyError> {
    let mut errors = Vec::new();
    let patches = std::mem::take(&mut session.deferred.patches);
    for patch in &patches {
        let result = if patch.is_struct {
            resolve_struct(&mut session.memory, &session.symbols, &patch.name, patch.code_index, patch.line)
        } else {
            resolve_absolute(&mut session.memory, &session.symbols, &patch.name, patch.code_index, patch.line)
        };
        if let Err(e) = result {
            errors.push(e);
        }
    }
    session.deferred.patches = patches;
    errors
}

fn resolve_entries(session: &Session) -> Result<Vec<(String, u32)>, Vec<AssemblyError>> {
    let mut resolved = Vec::new();
    let mut errors = Vec::new();
    for entry in &session.deferred.entries {
        match session.symbols.get(&entry.name).map(|s| &s.kind) {
            None => errors.push(AssemblyError::EntryLabelMissing {
                line: entry.line,
                name: entry.name.clone(),
            }),
            Some(SymbolKind::Data { address, .. }) => {
                resolved.push((entry.name.clone(), BASE_ADDRESS + session.memory.ic() + address));
            }
            Some(SymbolKind::InstructionLabel { address }) => {
                resolved.push((entry.name.clone(), BASE_ADDRESS + address));
            }
            Some(_) => errors.push(AssemblyError::EntryLabelNotData {
                line: entry.line,
                name: entry.name.clone(),
            }),
        }
    }
    if errors.is_empty() {
        Ok(resolved)
    } else {
        Err(errors)
    }
}

/// The three source-independent extern references this pass selects for the
/// `.ext` file: every ABSOLUTE-mode use of a name the table resolves to
/// `Extern`, addressed by the slot that holds it.
fn resolve_externs(session: &Session) -> Vec<(String, u32)> {
    session
        .deferred
        .externs
        .iter()
        .filter(|use_site| matches!(session.symbols.get(&use_site.name).map(|s| &s.kind), Some(SymbolKind::Extern)))
        .map(|use_site| (use_site.name.clone(), BASE_ADDRESS + use_site.code_index))
        .collect()
}

/// Renders the memory image as the `.ob` text: a header line with IC and DC
/// each base-32 encoded separately, then one `ADDRESS WORD` line per code
/// word and per data word, data continuing the address space right after code.
pub fn render_object_file(memory: &MemoryImage) -> String {
    let mut out = String::new();
    out.push_str(&Word::new(memory.ic() as i32).to_awkward_base());
    out.push('\t');
    out.push_str(&Word::new(memory.dc() as i32).to_awkward_base());
    out.push('\n');

    for (i, word) in memory.code().iter().enumerate() {
        out.push_str(&Word::new((BASE_ADDRESS + i as u32) as i32).to_awkward_base());
        out.push('\t');
        out.push_str(&word.to_awkward_base());
        out.push('\n');
    }
    for (i, word) in memory.data().iter().enumerate() {
        let address = BASE_ADDRESS + memory.ic() + i as u32;
        out.push_str(&Word::new(address as i32).to_awkward_base());
        out.push('\t');
        out.push_str(&word.to_awkward_base());
        out.push('\n');
    }
    out
}

fn render_name_address_lines(entries: &[(String, u32)]) -> String {
    let mut out = String::new();
    for (name, address) in entries {
        out.push_str(name);
        out.push(' ');
        out.push_str(&Word::new(*address as i32).to_awkward_base());
        out.push('\n');
    }
    out
}

pub fn render_entries_file(entries: &[(String, u32)]) -> String {
    render_name_address_lines(entries)
}

pub fn render_externs_file(externs: &[(String, u32)]) -> String {
    render_name_address_lines(externs)
}

/// The rendered outputs a completed assembly run would write, already
/// filtered per the suppress-if-empty rule: `entries`/`externs` are `None`
/// when there is nothing to report, rather than an empty file. `entry_errors`
/// is separate from the fatal errors that prevent `run` from returning at
/// all: an `.entry` label that fails to resolve drops only `entries_file`,
/// the object and externs files are still produced.
#[derive(Debug)]
pub struct SecondPassOutput {
    pub object_file: String,
    pub entries_file: Option<String>,
    pub externs_file: Option<String>,
    pub entry_errors: Vec<AssemblyError>,
}

/// Runs the second pass over a [`Session`] already populated by the first.
///
/// Patch resolution failures are fatal: they are the same errors that would
/// have left a reserved word holding its placeholder zero, so no output file
/// is produced at all. Entry resolution is not fatal in the same way: a
/// missing or misused `.entry` label only suppresses the entries file, since
/// the object and externs files never depended on it in the first place.
pub fn run(session: &mut Session) -> Result<SecondPassOutput, Vec<AssemblyError>> {
    let patch_errors = resolve_patches(session);
    if !patch_errors.is_empty() {
        return Err(patch_errors);
    }

    let (entries, entry_errors) = match resolve_entries(session) {
        Ok(entries) => (entries, Vec::new()),
        Err(entry_errors) => (Vec::new(), entry_errors),
    };
    let externs = resolve_externs(session);

    Ok(SecondPassOutput {
        object_file: render_object_file(&session.memory),
        entries_file: if entries.is_empty() { None } else { Some(render_entries_file(&entries)) },
        externs_file: if externs.is_empty() { None } else { Some(render_externs_file(&externs)) },
        entry_errors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_from(source: &str) -> Session {
        let mut session = Session::new();
        session.run_first_pass(source);
        session
    }

    #[test]
    fn resolves_data_label_to_relocatable_word() {
        let mut session = session_from("X: .data 5\njmp X\n");
        let out = run(&mut session).expect("no resolution errors");
        assert!(out.entries_file.is_none());
        assert!(out.externs_file.is_none());
        let patched = session.memory.code()[1];
        assert_eq!(patched.value() & 0b11, 0b10);
    }

    #[test]
    fn absolute_reference_to_instruction_label_is_rejected() {
        let mut session = session_from("L: jmp L\n");
        let errors = run(&mut session).unwrap_err();
        assert_eq!(
            errors,
            vec![AssemblyError::OperandNotDataOrExtern { line: 1, name: "L".to_string() }]
        );
    }

    #[test]
    fn extern_operand_resolves_to_are_external() {
        let mut session = session_from(".extern K\njmp K\n");
        run(&mut session).expect("no resolution errors");
        let patched = session.memory.code()[1];
        assert_eq!(patched.value(), 0b01);
    }

    #[test]
    fn unresolved_label_is_reported() {
        let mut session = session_from("jmp GHOST\n");
        let errors = run(&mut session).unwrap_err();
        assert_eq!(
            errors,
            vec![AssemblyError::UndeclaredVariable { line: 1, name: "GHOST".to_string() }]
        );
    }

    #[test]
    fn entry_on_instruction_label_is_rendered_with_address() {
        let mut session = session_from("L: rts\n.entry L\n");
        let out = run(&mut session).expect("no resolution errors");
        assert_eq!(out.entries_file.as_deref(), Some("L $%\n"));
    }

    #[test]
    fn extern_use_is_rendered_in_externs_file() {
        let mut session = session_from(".extern K\njmp K\n");
        let out = run(&mut session).expect("no resolution errors");
        assert_eq!(out.externs_file.as_deref(), Some("K $^\n"));
    }

    #[test]
    fn entry_on_extern_label_drops_only_the_entries_file() {
        let mut session = session_from(".extern K\njmp K\n.entry K\n");
        let out = run(&mut session).expect("patch resolution still succeeds");
        assert!(out.entries_file.is_none());
        assert_eq!(
            out.entry_errors,
            vec![AssemblyError::EntryLabelNotData { line: 3, name: "K".to_string() }]
        );
        assert_eq!(out.externs_file.as_deref(), Some("K $^\n"));
        assert!(!out.object_file.is_empty());
    }
}
