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

//! The line-oriented front end: recognizes one line at a time, dispatches to
//! instruction or directive processing, and emits words/deferred records into
//! the running [`Session`].

use super::deferred::{EntryRequest, ExternUse, PatchSite};
use super::symbol_table::{self, DirectiveKind, SymbolKind};
use super::Session;
use crate::errors::{shorten_label, AssemblyError, AssemblyWarning};
use crate::word::Word;

/// A cursor over one line's bytes. Lines never contain embedded newlines (the
/// caller splits on them), so running off the end of the slice doubles as
/// end-of-line: nothing separate to check for.
#[derive(Debug, Clone, Copy)]
struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(line: &'a str) -> Self {
        Cursor {
            bytes: line.as_bytes(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn skip_whites(&mut self) {
        while matches!(self.peek(), Some(b' ') | Some(b'\t')) {
            self.pos += 1;
        }
    }

    /// Skips whitespace and reports the next character without consuming it.
    fn peek_next_char(&self) -> Option<u8> {
        let mut probe = *self;
        probe.skip_whites();
        probe.peek()
    }
}

/// Reads the next whitespace/colon-delimited token, consuming a trailing
/// colon (if any) into the token and trailing whitespace after it. Used for
/// labels, command names, and `.entry`/`.extern` operand names.
fn read_next_string(c: &mut Cursor) -> String {
    c.skip_whites();
    let mut s = String::new();
    loop {
        match c.peek() {
            None => break,
            Some(b':') => {
                c.bump();
                s.push(':');
                break;
            }
            Some(b' ') | Some(b'\t') => break,
            Some(byte) => {
                s.push(byte as char);
                c.bump();
            }
        }
    }
    c.skip_whites();
    s
}

/// Reads an operand token: stops at whitespace, comma, or end of line, but
/// (unlike `read_next_string`) does not treat a colon specially.
fn read_operand_token(c: &mut Cursor) -> String {
    let mut s = String::new();
    while let Some(b) = c.peek() {
        if b == b',' || b == b' ' || b == b'\t' {
            break;
        }
        s.push(b as char);
        c.bump();
    }
    s
}

/// Reads an optional sign followed by one or more digits. Leaves the cursor
/// unmoved and returns `None` if no digits are found: a lone `+`/`-` is never
/// a number by itself.
fn read_next_number(c: &mut Cursor) -> Option<i32> {
    let start = *c;
    let sign: i64 = match c.peek() {
        Some(b'+') => {
            c.bump();
            1
        }
        Some(b'-') => {
            c.bump();
            -1
        }
        _ => 1,
    };
    let mut value: i64 = 0;
    let mut digits = 0;
    while let Some(b) = c.peek() {
        if b.is_ascii_digit() {
            value = value * 10 + (b - b'0') as i64;
            c.bump();
            digits += 1;
        } else {
            break;
        }
    }
    if digits == 0 {
        *c = start;
        None
    } else {
        Some((sign * value) as i32)
    }
}

enum LabelProblem {
    MustStartWithLetter,
    MissingColon,
    TooLong,
    IllegalCharacters,
}

/// Letter first, alphanumeric thereafter, length-limited, and (when
/// `is_new_label`) terminated by a colon that isn't counted against the limit.
fn is_legal_label(label: &str, is_new_label: bool) -> Result<(), LabelProblem> {
    let bytes = label.as_bytes();
    if bytes.is_empty() || !bytes[0].is_ascii_alphabetic() {
        return Err(LabelProblem::MustStartWithLetter);
    }
    if is_new_label && bytes.last() != Some(&b':') {
        return Err(LabelProblem::MissingColon);
    }
    let len = bytes.len();
    let max_len = if is_new_label { 31 } else { 30 };
    if len > max_len {
        return Err(LabelProblem::TooLong);
    }
    let body_end = len.saturating_sub(1);
    for &b in &bytes[1..body_end] {
        if !b.is_ascii_alphanumeric() {
            return Err(LabelProblem::IllegalCharacters);
        }
    }
    if !is_new_label && len > 1 && !bytes[len - 1].is_ascii_alphanumeric() {
        return Err(LabelProblem::IllegalCharacters);
    }
    Ok(())
}

fn label_error(problem: LabelProblem, label: &str, line: usize) -> AssemblyError {
    match problem {
        LabelProblem::MustStartWithLetter => AssemblyError::LabelMustStartWithLetter {
            line,
            label: label.to_string(),
        },
        LabelProblem::MissingColon => AssemblyError::MissingColon {
            line,
            label: label.to_string(),
        },
        LabelProblem::TooLong => AssemblyError::LabelTooLong {
            line,
            label: shorten_label(label),
        },
        LabelProblem::IllegalCharacters => AssemblyError::IllegalLabelCharacters {
            line,
            label: label.to_string(),
        },
    }
}

fn is_comment_or_empty(cursor: &Cursor) -> bool {
    matches!(cursor.peek_next_char(), None | Some(b';'))
}

struct PreProcessed {
    label: Option<String>,
    command: String,
}

/// Determines whether the line opens with a label, and what instruction or
/// directive name follows. Reports at most one of: duplicate label (#2),
/// label followed by nothing (#31), unknown command (#3), or whatever
/// [`is_legal_label`] itself reports for a malformed first token.
fn pre_process_line(session: &Session, cursor: &mut Cursor, line: usize) -> Result<PreProcessed, AssemblyError> {
    let str1 = read_next_string(cursor);
    if symbol_table::is_command(&session.symbols, &str1) {
        return Ok(PreProcessed {
            label: None,
            command: str1,
        });
    }

    match is_legal_label(&str1, true) {
        Ok(()) => {
            let bare = str1.trim_end_matches(':').to_string();
            if session.symbols.contains_key(&bare) {
                return Err(AssemblyError::DuplicateSymbol { line, name: bare });
            }
            let str2 = read_next_string(cursor);
            if symbol_table::is_command(&session.symbols, &str2) {
                return Ok(PreProcessed {
                    label: Some(bare),
                    command: str2,
                });
            }
            if str2.is_empty() {
                Err(AssemblyError::LabelFollowedByEmptyText { line, label: bare })
            } else {
                Err(AssemblyError::UnknownCommand { line, name: str2 })
            }
        }
        Err(problem) => Err(label_error(problem, &str1, line)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AddrMode {
    Immediate,
    Absolute,
    Struct,
    Register,
}

fn mode_bits(mode: AddrMode) -> i32 {
    match mode {
        AddrMode::Immediate => 0,
        AddrMode::Absolute => 1,
        AddrMode::Struct => 2,
        AddrMode::Register => 3,
    }
}

fn detect_operand_type(token: &str, session: &Session) -> Option<AddrMode> {
    if token.is_empty() {
        return None;
    }
    if token.starts_with('#') {
        return Some(AddrMode::Immediate);
    }
    let bytes = token.as_bytes();
    let len = bytes.len();
    if len >= 2 && bytes[len - 2] == b'.' && matches!(bytes[len - 1], b'1' | b'2') {
        return Some(AddrMode::Struct);
    }
    if symbol_table::is_register(&session.symbols, token) {
        return Some(AddrMode::Register);
    }
    Some(AddrMode::Absolute)
}

struct OperandScan {
    op1: Option<String>,
    op1_mode: Option<AddrMode>,
    op2: Option<String>,
    op2_mode: Option<AddrMode>,
}

/// Reads however many operand tokens `input_mask`/`output_mask` call for and
/// classifies their addressing mode. Both tokens are read even when the
/// separating comma is missing, so a too-few-operands error always takes
/// precedence over a missing-comma error.
fn detect_operands_and_types(
    cursor: &mut Cursor,
    session: &Session,
    line: usize,
    input_mask: u8,
    output_mask: u8,
) -> Result<OperandScan, AssemblyError> {
    let mut op1 = None;
    let mut op1_mode = None;
    let mut op1_attempted = false;
    if input_mask != 0 {
        let tok = read_operand_token(cursor);
        op1_mode = detect_operand_type(&tok, session);
        op1_attempted = true;
        op1 = Some(tok);
    }

    let mut comma_detected = true;
    if input_mask != 0 && output_mask != 0 {
        cursor.skip_whites();
        if cursor.peek() == Some(b',') {
            cursor.bump();
            cursor.skip_whites();
        } else {
            comma_detected = false;
        }
    }

    let mut op2 = None;
    let mut op2_mode = None;
    let mut op2_attempted = false;
    if output_mask != 0 {
        let tok = read_operand_token(cursor);
        op2_mode = detect_operand_type(&tok, session);
        op2_attempted = true;
        op2 = Some(tok);
    }

    let op1_missing = op1_attempted && op1_mode.is_none();
    let op2_missing = op2_attempted && op2_mode.is_none();
    if op1_missing || op2_missing {
        return Err(AssemblyError::TooFewParameters { line });
    }
    if !comma_detected {
        return Err(AssemblyError::MissingOperandComma { line });
    }
    if cursor.peek_next_char().is_some() {
        return Err(AssemblyError::ExcessiveText { line });
    }

    Ok(OperandScan {
        op1,
        op1_mode,
        op2,
        op2_mode,
    })
}

fn check_operand_masks(
    scan: &OperandScan,
    input_mask: u8,
    output_mask: u8,
    line: usize,
) -> Result<(), AssemblyError> {
    if let Some(mode) = scan.op1_mode {
        if input_mask == 1 && matches!(mode, AddrMode::Immediate | AddrMode::Register) {
            return Err(AssemblyError::BadInputOperandType { line });
        }
    }
    if let Some(mode) = scan.op2_mode {
        if output_mask == 1 && matches!(mode, AddrMode::Immediate) {
            return Err(AssemblyError::BadOutputOperandType { line });
        }
    }
    Ok(())
}

fn atoi_like(s: &str) -> i32 {
    let bytes = s.as_bytes();
    let mut i = 0;
    let mut sign: i64 = 1;
    if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
        if bytes[i] == b'-' {
            sign = -1;
        }
        i += 1;
    }
    let mut value: i64 = 0;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        value = value * 10 + (bytes[i] - b'0') as i64;
        i += 1;
    }
    (sign * value) as i32
}

fn is_number(s: &str) -> bool {
    let bytes = s.as_bytes();
    if bytes.is_empty() {
        return false;
    }
    if bytes.len() == 1 {
        return bytes[0].is_ascii_digit();
    }
    if !(bytes[0].is_ascii_digit() || bytes[0] == b'+' || bytes[0] == b'-') {
        return false;
    }
    bytes[1..].iter().all(|b| b.is_ascii_digit())
}

/// Inserts the operand word unconditionally, before validating the digits, so
/// a malformed immediate still occupies its reserved slot.
fn process_immediate(session: &mut Session, line: usize, token: &str) -> Result<(), AssemblyError> {
    let raw = &token[1..];
    let value = atoi_like(raw);
    let truncated_8 = value as i8 as i32;
    session.memory.push_code(Word::new(truncated_8 << 2));
    if Word::overflows_8_bit(value) {
        session
            .warnings
            .push(AssemblyWarning::ImmediateOutOfRange { line, value });
    }
    if !is_number(raw) {
        return Err(AssemblyError::NotANumber {
            line,
            token: raw.to_string(),
        });
    }
    Ok(())
}

fn register_operand_word(session: &Session, token: &str, is_input: bool) -> Word {
    match &session.symbols.get(token).expect("detected as REGISTER").kind {
        SymbolKind::Register {
            input_operand,
            output_operand,
        } => {
            if is_input {
                *input_operand
            } else {
                *output_operand
            }
        }
        _ => unreachable!("REGISTER mode only detected for register symbols"),
    }
}

fn process_absolute(session: &mut Session, line: usize, token: &str) -> Result<(), AssemblyError> {
    is_legal_label(token, false).map_err(|p| label_error(p, token, line))?;
    let index = session.memory.ic();
    session.deferred.patches.push(PatchSite {
        name: token.to_string(),
        code_index: index,
        line,
        is_struct: false,
    });
    session.deferred.externs.push(ExternUse {
        name: token.to_string(),
        code_index: index,
    });
    session.memory.push_code(Word::new(0));
    Ok(())
}

fn process_struct_operand(session: &mut Session, line: usize, token: &str) -> Result<(), AssemblyError> {
    let bytes = token.as_bytes();
    let field = bytes[bytes.len() - 1] - b'0';
    let base = &token[..token.len() - 2];
    is_legal_label(base, false).map_err(|p| label_error(p, base, line))?;
    let index = session.memory.ic();
    session.deferred.patches.push(PatchSite {
        name: base.to_string(),
        code_index: index,
        line,
        is_struct: true,
    });
    session.memory.push_code(Word::new(0));
    session.memory.push_code(Word::new((field as i32) << 2));
    Ok(())
}

fn process_operand(session: &mut Session, line: usize, mode: AddrMode, token: &str, is_input: bool) -> Result<(), AssemblyError> {
    match mode {
        AddrMode::Register => {
            let word = register_operand_word(session, token, is_input);
            session.memory.push_code(word);
            Ok(())
        }
        AddrMode::Immediate => process_immediate(session, line, token),
        AddrMode::Absolute => process_absolute(session, line, token),
        AddrMode::Struct => process_struct_operand(session, line, token),
    }
}

fn process_instruction(
    session: &mut Session,
    cursor: &mut Cursor,
    line: usize,
    label: Option<String>,
    opcode: u8,
    input_mask: u8,
    output_mask: u8,
) -> Result<(), AssemblyError> {
    if let Some(name) = &label {
        symbol_table::insert_label(
            &mut session.symbols,
            name,
            SymbolKind::InstructionLabel { address: session.memory.ic() },
            line,
        )?;
    }

    let scan = detect_operands_and_types(cursor, session, line, input_mask, output_mask)?;
    check_operand_masks(&scan, input_mask, output_mask, line)?;

    let in_bits = scan.op1_mode.map(mode_bits).unwrap_or(0);
    let out_bits = scan.op2_mode.map(mode_bits).unwrap_or(0);
    let instruction_word = Word::new(((opcode as i32) << 6) | (in_bits << 4) | (out_bits << 2));
    session.memory.push_code(instruction_word);

    if matches!(scan.op1_mode, Some(AddrMode::Register)) && matches!(scan.op2_mode, Some(AddrMode::Register)) {
        let in_word = register_operand_word(session, scan.op1.as_deref().unwrap(), true);
        let out_word = register_operand_word(session, scan.op2.as_deref().unwrap(), false);
        session.memory.push_code(Word::new(in_word.value() + out_word.value()));
        return Ok(());
    }

    if let Some(mode) = scan.op1_mode {
        process_operand(session, line, mode, scan.op1.as_deref().unwrap(), true)?;
    }
    if let Some(mode) = scan.op2_mode {
        process_operand(session, line, mode, scan.op2.as_deref().unwrap(), false)?;
    }
    Ok(())
}

fn read_numbers_list(session: &mut Session, cursor: &mut Cursor, line: usize) -> Result<(), AssemblyError> {
    let mut numbers_read = 0usize;
    loop {
        match read_next_number(cursor) {
            None => break,
            Some(number) => {
                numbers_read += 1;
                if Word::overflows_10_bit(number) {
                    session.warnings.push(AssemblyWarning::DataOutOfRange { line, value: number });
                }
                session.memory.push_data(Word::new(number));
                match cursor.peek_next_char() {
                    None => return Ok(()),
                    Some(b',') => {
                        cursor.skip_whites();
                        cursor.bump();
                        cursor.skip_whites();
                    }
                    _ => break,
                }
            }
        }
    }

    let c = cursor.peek_next_char();
    if numbers_read == 0 && matches!(c, None | Some(b',')) {
        return Err(AssemblyError::EmptyNumbersList { line });
    }
    match c {
        None => Err(AssemblyError::ExcessiveTrailingComma { line }),
        Some(b) if b.is_ascii_digit() => Err(AssemblyError::MissingCommaBetweenNumbers { line }),
        Some(b'+') | Some(b'-') => {
            let mut after_sign = *cursor;
            after_sign.skip_whites();
            after_sign.bump();
            if matches!(after_sign.peek_next_char(), Some(d) if d.is_ascii_digit()) {
                Err(AssemblyError::MissingCommaBetweenNumbers { line })
            } else {
                Err(AssemblyError::IllegalCharacter { line, ch: c.unwrap() as char })
            }
        }
        Some(b) => Err(AssemblyError::IllegalCharacter { line, ch: b as char }),
    }
}

fn read_string(session: &mut Session, cursor: &mut Cursor, line: usize) -> Result<(), AssemblyError> {
    match cursor.peek() {
        None => Err(AssemblyError::EmptyStringDefinition { line }),
        Some(b'"') => {
            cursor.bump();
            let mut closed = false;
            loop {
                match cursor.peek() {
                    None => break,
                    Some(b'"') => {
                        cursor.bump();
                        closed = true;
                        break;
                    }
                    Some(b) => {
                        session.memory.push_data(Word::new(b as i32));
                        cursor.bump();
                    }
                }
            }
            if !closed {
                return Err(AssemblyError::MissingClosingQuote { line });
            }
            if cursor.peek_next_char().is_some() {
                return Err(AssemblyError::ExcessiveTextAfterString { line });
            }
            session.memory.push_data(Word::new(0));
            Ok(())
        }
        Some(_) => Err(AssemblyError::MissingOpeningQuote { line }),
    }
}

fn process_directive_struct(session: &mut Session, cursor: &mut Cursor, line: usize) -> Result<(), AssemblyError> {
    match read_next_number(cursor) {
        None => match cursor.peek_next_char() {
            None => Err(AssemblyError::EmptyStructDefinition { line }),
            Some(b',') => Err(AssemblyError::MissingNumberDefinition { line }),
            Some(b) => Err(AssemblyError::IllegalCharacterDetected { line, ch: b as char }),
        },
        Some(number) => {
            session.memory.push_data(Word::new(number));
            if cursor.peek_next_char() == Some(b',') {
                cursor.skip_whites();
                cursor.bump();
                cursor.skip_whites();
                read_string(session, cursor, line)
            } else {
                Err(AssemblyError::StructNumberMissingComma { line })
            }
        }
    }
}

/// Handles `.entry`/`.extern`. The leading-label warning is unconditional:
/// the directive's operand is read independently of any leading label, so
/// there is no comparison between the two names.
fn process_entry_extern(
    session: &mut Session,
    cursor: &mut Cursor,
    line: usize,
    label: Option<String>,
    is_extern: bool,
) -> Result<(), AssemblyError> {
    if label.is_some() {
        session.warnings.push(AssemblyWarning::EntryExternLabelIgnored { line });
    }

    let name = read_next_string(cursor);
    if name.is_empty() {
        return Err(AssemblyError::TooFewParameters { line });
    }
    is_legal_label(&name, false).map_err(|p| label_error(p, &name, line))?;

    if is_extern {
        let already_taken = session.symbols.contains_key(&name) || session.deferred.find_entry(&name).is_some();
        if already_taken {
            return Err(AssemblyError::DuplicateEntryExternLabel { line, label: name });
        }
        symbol_table::insert_label(&mut session.symbols, &name, SymbolKind::Extern, line)?;
    } else {
        let already_entry = session.deferred.find_entry(&name).is_some();
        let existing_is_extern = matches!(session.symbols.get(&name).map(|s| &s.kind), Some(SymbolKind::Extern));
        if already_entry || existing_is_extern {
            return Err(AssemblyError::DuplicateEntryExternLabel { line, label: name });
        }
        session.deferred.entries.push(EntryRequest { name, line });
    }

    if cursor.peek_next_char().is_some() {
        return Err(AssemblyError::ExcessiveText { line });
    }
    Ok(())
}

fn process_directive(
    session: &mut Session,
    cursor: &mut Cursor,
    line: usize,
    label: Option<String>,
    kind: DirectiveKind,
) -> Result<(), AssemblyError> {
    match kind {
        DirectiveKind::Entry => process_entry_extern(session, cursor, line, label, false),
        DirectiveKind::Extern => process_entry_extern(session, cursor, line, label, true),
        DirectiveKind::Data | DirectiveKind::String | DirectiveKind::Struct => {
            let is_struct = matches!(kind, DirectiveKind::Struct);
            if let Some(name) = &label {
                symbol_table::insert_label(
                    &mut session.symbols,
                    name,
                    SymbolKind::Data { address: session.memory.dc(), is_struct },
                    line,
                )?;
            }
            match kind {
                DirectiveKind::Data => read_numbers_list(session, cursor, line),
                DirectiveKind::String => read_string(session, cursor, line),
                DirectiveKind::Struct => process_directive_struct(session, cursor, line),
                _ => unreachable!(),
            }
        }
    }
}

/// Processes one source line, pushing any diagnostic it produces onto
/// `session.errors`. At most one error is recorded per line: the first
/// condition detected wins and the rest of the line is discarded.
pub fn process_line(session: &mut Session, raw_line: &str, line: usize) {
    let mut cursor = Cursor::new(raw_line);
    if is_comment_or_empty(&cursor) {
        return;
    }

    let pre = match pre_process_line(session, &mut cursor, line) {
        Ok(pre) => pre,
        Err(e) => {
            session.errors.push(e);
            return;
        }
    };

    let kind = session
        .symbols
        .get(&pre.command)
        .map(|s| s.kind.clone())
        .expect("pre_process_line only returns names present in the symbol table");

    let result = match kind {
        SymbolKind::Instruction { opcode, input_mask, output_mask } => {
            process_instruction(session, &mut cursor, line, pre.label, opcode, input_mask, output_mask)
        }
        SymbolKind::Directive(dkind) => process_directive(session, &mut cursor, line, pre.label, dkind),
        _ => unreachable!("pre_process_line only resolves commands to Instruction or Directive"),
    };

    if let Err(e) = result {
        session.errors.push(e);
    }
}
