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

use std::path::Path;

use cicasm::assemble_file;
use cicasm::errors::{AssemblyError, AssemblyWarning};
use cicasm::file_reader::{AsmFileReader, FsOutputWriter, MockFileReader, MockOutputWriter};
use cicasm::word::Word;

#[test]
fn two_register_instruction_produces_a_two_word_object_file() {
    let mut reader = MockFileReader::default();
    reader.add_file("prog.as", "MAIN: mov r3, r5\n");
    let mut writer = MockOutputWriter::default();

    let report = assemble_file(Path::new("prog.as"), &reader, &mut writer).unwrap();
    assert!(report.succeeded(), "{:?}", report.errors);

    let ob = writer.files.get(Path::new("prog.ob")).unwrap();
    let mut lines = ob.lines();

    let header = lines.next().unwrap();
    let mut header_fields = header.split('\t');
    assert_eq!(Word::from_awkward_base(header_fields.next().unwrap()).unwrap().value(), 1); // IC
    assert_eq!(Word::from_awkward_base(header_fields.next().unwrap()).unwrap().value(), 0); // DC

    let instr_line = lines.next().unwrap();
    let mut instr_fields = instr_line.split('\t');
    assert_eq!(Word::from_awkward_base(instr_fields.next().unwrap()).unwrap().value(), 100);
    let instr_word = Word::from_awkward_base(instr_fields.next().unwrap()).unwrap();
    assert_eq!(instr_word.value(), (3i32 << 4) | (3i32 << 2));

    let combo_line = lines.next().unwrap();
    let combo_word = Word::from_awkward_base(combo_line.split('\t').nth(1).unwrap()).unwrap();
    assert_eq!(combo_word.value(), (3i32 << 6) | (5i32 << 2));

    assert!(lines.next().is_none());
}

#[test]
fn entry_on_out_of_range_data_warns_and_still_produces_entries_file() {
    let mut reader = MockFileReader::default();
    reader.add_file("prog.as", ".entry X\nX: .data 5,-3,600\n");
    let mut writer = MockOutputWriter::default();

    let report = assemble_file(Path::new("prog.as"), &reader, &mut writer).unwrap();
    assert!(report.succeeded(), "{:?}", report.errors);
    assert_eq!(
        report.warnings,
        vec![AssemblyWarning::DataOutOfRange { line: 2, value: 600 }]
    );

    let entries = writer.files.get(Path::new("prog.ent")).unwrap();
    assert_eq!(entries, &format!("X {}\n", Word::new(100).to_awkward_base()));
}

#[test]
fn extern_jump_target_resolves_and_is_listed_in_externs_file() {
    let mut reader = MockFileReader::default();
    reader.add_file("prog.as", ".extern K\njmp K\n");
    let mut writer = MockOutputWriter::default();

    let report = assemble_file(Path::new("prog.as"), &reader, &mut writer).unwrap();
    assert!(report.succeeded(), "{:?}", report.errors);

    let ext = writer.files.get(Path::new("prog.ext")).unwrap();
    assert_eq!(ext, &format!("K {}\n", Word::new(101).to_awkward_base()));
    assert!(!writer.files.contains_key(Path::new("prog.ent")));
}

#[test]
fn unresolved_entry_label_still_produces_object_and_externs_files() {
    let mut reader = MockFileReader::default();
    reader.add_file("prog.as", ".extern K\njmp K\n.entry GHOST\n");
    let mut writer = MockOutputWriter::default();

    let report = assemble_file(Path::new("prog.as"), &reader, &mut writer).unwrap();
    assert!(!report.succeeded());
    assert_eq!(
        report.errors,
        vec![AssemblyError::EntryLabelMissing { line: 3, name: "GHOST".to_string() }]
    );

    assert!(writer.files.contains_key(Path::new("prog.ob")));
    assert!(writer.files.contains_key(Path::new("prog.ext")));
    assert!(!writer.files.contains_key(Path::new("prog.ent")));
}

#[test]
fn struct_operand_is_patched_through_the_second_pass() {
    let mut reader = MockFileReader::default();
    reader.add_file("prog.as", "S: .struct 7,\"hi\"\nlea S.2, r1\n");
    let mut writer = MockOutputWriter::default();

    let report = assemble_file(Path::new("prog.as"), &reader, &mut writer).unwrap();
    assert!(report.succeeded(), "{:?}", report.errors);
    assert!(writer.files.contains_key(Path::new("prog.ob")));
}

#[test]
fn duplicate_label_suppresses_all_output_files() {
    let mut reader = MockFileReader::default();
    reader.add_file("prog.as", "L: .data 1\nL: .data 2\n");
    let mut writer = MockOutputWriter::default();

    let report = assemble_file(Path::new("prog.as"), &reader, &mut writer).unwrap();
    assert!(!report.succeeded());
    assert_eq!(
        report.errors,
        vec![AssemblyError::DuplicateSymbol { line: 2, name: "L".to_string() }]
    );
    assert!(writer.files.is_empty());
}

#[test]
fn unterminated_string_fails_the_whole_session() {
    let mut reader = MockFileReader::default();
    reader.add_file("prog.as", ".string \"abc\n");
    let mut writer = MockOutputWriter::default();

    let report = assemble_file(Path::new("prog.as"), &reader, &mut writer).unwrap();
    assert!(!report.succeeded());
    assert_eq!(report.errors, vec![AssemblyError::MissingClosingQuote { line: 1 }]);
    assert!(writer.files.is_empty());
}

#[test]
fn real_filesystem_round_trip_via_tempfile() {
    let dir = tempfile::tempdir().unwrap();
    let source_path = dir.path().join("prog.as");
    std::fs::write(&source_path, "MAIN: mov #5, r1\nstop\n").unwrap();

    let reader = AsmFileReader;
    let mut writer = FsOutputWriter;
    let report = assemble_file(&source_path, &reader, &mut writer).unwrap();
    assert!(report.succeeded(), "{:?}", report.errors);

    let object_path = dir.path().join("prog.ob");
    assert!(object_path.exists());
    let contents = std::fs::read_to_string(&object_path).unwrap();
    assert!(contents.lines().count() >= 1);
}
