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

use crate::errors::AssemblyError;
use crate::word::Word;
use std::collections::HashMap;

pub const REGISTER_COUNT: u8 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    Data,
    String,
    Struct,
    Entry,
    Extern,
}

impl DirectiveKind {
    pub fn from_keyword(s: &str) -> Option<DirectiveKind> {
        match s {
            ".data" => Some(DirectiveKind::Data),
            ".string" => Some(DirectiveKind::String),
            ".struct" => Some(DirectiveKind::Struct),
            ".entry" => Some(DirectiveKind::Entry),
            ".extern" => Some(DirectiveKind::Extern),
            _ => None,
        }
    }
}

/// The per-kind payload a symbol carries: every consumer matches on this
/// directly rather than branching on a separate type tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolKind {
    Instruction {
        opcode: u8,
        input_mask: u8,
        output_mask: u8,
    },
    Register {
        input_operand: Word,
        output_operand: Word,
    },
    Directive(DirectiveKind),
    InstructionLabel {
        address: u32,
    },
    Data {
        address: u32,
        is_struct: bool,
    },
    Extern,
}

impl SymbolKind {
    pub fn is_preloaded(&self) -> bool {
        matches!(
            self,
            SymbolKind::Instruction { .. } | SymbolKind::Register { .. } | SymbolKind::Directive(_)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub kind: SymbolKind,
}

pub type SymbolTable = HashMap<String, Symbol>;

const INSTRUCTIONS: &[(&str, u8, u8, u8)] = &[
    ("mov", 0, 2, 1),
    ("cmp", 1, 2, 2),
    ("add", 2, 2, 1),
    ("sub", 3, 2, 1),
    ("not", 4, 0, 1),
    ("clr", 5, 0, 1),
    ("lea", 6, 1, 1),
    ("inc", 7, 0, 1),
    ("dec", 8, 0, 1),
    ("jmp", 9, 0, 1),
    ("bne", 10, 0, 1),
    ("red", 11, 0, 1),
    ("prn", 12, 0, 2),
    ("jsr", 13, 0, 1),
    ("rts", 14, 0, 0),
    ("stop", 15, 0, 0),
];

/// Builds a fresh table preloaded with the 16 instruction mnemonics, the 9
/// register names (`r0`..`r7`, `PSW`), and the 5 directive keywords.
///
/// Panics if two preloaded names collide, which would only happen if the
/// static table above were edited incorrectly.
pub fn preloaded_table() -> SymbolTable {
    let mut table = SymbolTable::new();

    for &(name, opcode, input_mask, output_mask) in INSTRUCTIONS {
        insert_preloaded(
            &mut table,
            name,
            SymbolKind::Instruction {
                opcode,
                input_mask,
                output_mask,
            },
        );
    }

    for code in 0..REGISTER_COUNT {
        insert_preloaded(
            &mut table,
            &format!("r{code}"),
            SymbolKind::Register {
                input_operand: Word::new((code as i32) << 6),
                output_operand: Word::new((code as i32) << 2),
            },
        );
    }
    // PSW's cached input word is 8<<6 = 512, which sign-extends to -512
    // through the same Word path every other register uses.
    insert_preloaded(
        &mut table,
        "PSW",
        SymbolKind::Register {
            input_operand: Word::new((REGISTER_COUNT as i32) << 6),
            output_operand: Word::new((REGISTER_COUNT as i32) << 2),
        },
    );

    for keyword in [".data", ".struct", ".string", ".entry", ".extern"] {
        let kind = DirectiveKind::from_keyword(keyword).expect("keyword is one of the five above");
        insert_preloaded(&mut table, keyword, SymbolKind::Directive(kind));
    }

    table
}

fn insert_preloaded(table: &mut SymbolTable, name: &str, kind: SymbolKind) {
    if table.insert(name.to_string(), Symbol { kind }).is_some() {
        panic!("duplicate preloaded symbol: {name}");
    }
}

/// Inserts a user-defined label. Fails with error #2 if the name is already
/// taken by any symbol, preloaded or user-defined.
pub fn insert_label(
    table: &mut SymbolTable,
    name: &str,
    kind: SymbolKind,
    line: usize,
) -> Result<(), AssemblyError> {
    if table.contains_key(name) {
        return Err(AssemblyError::DuplicateSymbol {
            line,
            name: name.to_string(),
        });
    }
    table.insert(name.to_string(), Symbol { kind });
    Ok(())
}

pub fn is_command(table: &SymbolTable, name: &str) -> bool {
    matches!(
        table.get(name).map(|s| &s.kind),
        Some(SymbolKind::Instruction { .. }) | Some(SymbolKind::Directive(_))
    )
}

pub fn is_register(table: &SymbolTable, name: &str) -> bool {
    matches!(table.get(name).map(|s| &s.kind), Some(SymbolKind::Register { .. }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preloaded_table_has_expected_counts() {
        let table = preloaded_table();
        let instructions = table
            .values()
            .filter(|s| matches!(s.kind, SymbolKind::Instruction { .. }))
            .count();
        let registers = table
            .values()
            .filter(|s| matches!(s.kind, SymbolKind::Register { .. }))
            .count();
        let directives = table
            .values()
            .filter(|s| matches!(s.kind, SymbolKind::Directive(_)))
            .count();
        assert_eq!(instructions, 16);
        assert_eq!(registers, 9);
        assert_eq!(directives, 5);
    }

    #[test]
    fn psw_input_operand_wraps_negative() {
        let table = preloaded_table();
        match &table.get("PSW").unwrap().kind {
            SymbolKind::Register { input_operand, output_operand } => {
                assert_eq!(input_operand.value(), -512);
                assert_eq!(output_operand.value(), 32);
            }
            _ => panic!("PSW should be a register"),
        }
    }

    #[test]
    fn insert_label_rejects_duplicates() {
        let mut table = preloaded_table();
        insert_label(&mut table, "L", SymbolKind::InstructionLabel { address: 0 }, 1).unwrap();
        let err = insert_label(&mut table, "L", SymbolKind::Data { address: 0, is_struct: false }, 2)
            .unwrap_err();
        assert_eq!(
            err,
            AssemblyError::DuplicateSymbol {
                line: 2,
                name: "L".to_string()
            }
        );
    }

    #[test]
    fn insert_label_rejects_preloaded_name() {
        let mut table = preloaded_table();
        let err =
            insert_label(&mut table, "mov", SymbolKind::Data { address: 0, is_struct: false }, 1)
                .unwrap_err();
        assert!(matches!(err, AssemblyError::DuplicateSymbol { .. }));
    }
}
