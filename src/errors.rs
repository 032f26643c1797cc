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

use thiserror::Error;

/// One diagnostic detected while assembling a line or resolving a deferred record.
///
/// Each variant owns the exact message text a user would see; there is no
/// separate numeric-code-to-string lookup table.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssemblyError {
    #[error("Error, line {line}: \"{label}\" is an illegal label.")]
    IllegalLabel { line: usize, label: String },

    #[error("Error, line {line}: \"{name}\" such symbol already exists.")]
    DuplicateSymbol { line: usize, name: String },

    #[error("Error, line {line}: \"{name}\" is an unknown command.")]
    UnknownCommand { line: usize, name: String },

    #[error("Error, line {line}: \"{label}\" is missing a colon \":\".")]
    MissingColon { line: usize, label: String },

    #[error("Error, line {line}: operands should be separated with commas.")]
    MissingOperandComma { line: usize },

    #[error("Error, line {line}: excessive text at the end of line.")]
    ExcessiveText { line: usize },

    #[error("Error, line {line}: too few parameters.")]
    TooFewParameters { line: usize },

    #[error("Error, line {line}: incorrect input operand type.")]
    BadInputOperandType { line: usize },

    #[error("Error, line {line}: incorrect output operand type.")]
    BadOutputOperandType { line: usize },

    #[error("Error, line {line}: \"{token}\" is not a legal number.")]
    NotANumber { line: usize, token: String },

    #[error("Error, line {line}: \"{label}\" label name has too many characters.")]
    LabelTooLong { line: usize, label: String },

    #[error("Error, line {line}: \"{label}\" label name should start with a letter.")]
    LabelMustStartWithLetter { line: usize, label: String },

    #[error("Error, line {line}: \"{label}\" label contains illegal characters.")]
    IllegalLabelCharacters { line: usize, label: String },

    #[error("Error, line {line}: missing comma between numbers.")]
    MissingCommaBetweenNumbers { line: usize },

    #[error("Error, line {line}: '{ch}' illegal character.")]
    IllegalCharacter { line: usize, ch: char },

    #[error("Error, line {line}: excessive comma at the end of numbers list.")]
    ExcessiveTrailingComma { line: usize },

    #[error("Error, line {line}: string definition is missing opening double quotes.")]
    MissingOpeningQuote { line: usize },

    #[error("Error, line {line}: string definition is missing closing double quotes.")]
    MissingClosingQuote { line: usize },

    #[error("Error, line {line}: excessive text following string definition.")]
    ExcessiveTextAfterString { line: usize },

    #[error("Error, line {line}: '{ch}' illegal character detected.")]
    IllegalCharacterDetected { line: usize, ch: char },

    #[error("Error, line {line}: empty structure definition.")]
    EmptyStructDefinition { line: usize },

    #[error("Error, line {line}: missing number definition.")]
    MissingNumberDefinition { line: usize },

    #[error("Error, line {line}: number in structure definition should be followed by a comma.")]
    StructNumberMissingComma { line: usize },

    #[error("Error, line {line}: \"{label}\" entry/extern declaration error: such label already exists.")]
    DuplicateEntryExternLabel { line: usize, label: String },

    #[error("Error, line {line}: numbers list is empty.")]
    EmptyNumbersList { line: usize },

    #[error("Error, line {line}: \"{name}\" undeclared variable.")]
    UndeclaredVariable { line: usize, name: String },

    #[error("Error, line {line}: \"{name}\" operand is not of data/extern type.")]
    OperandNotDataOrExtern { line: usize, name: String },

    #[error("Error, line {line}: \"{name}\" operand is not a structure.")]
    OperandNotStruct { line: usize, name: String },

    #[error("Error, line {line}: \"{name}\" the specified label does not exist.")]
    EntryLabelMissing { line: usize, name: String },

    #[error("Error, line {line}: \"{name}\" the specified label is not of data type.")]
    EntryLabelNotData { line: usize, name: String },

    #[error("Error, line {line}: \"{label}\" the label was followed by empty text.")]
    LabelFollowedByEmptyText { line: usize, label: String },

    #[error("Error, line {line}: the string definition is empty.")]
    EmptyStringDefinition { line: usize },

    /// Unreachable under normal operation: Rust's global allocator aborts the
    /// process on allocation failure rather than handing safe code a recoverable
    /// error. Kept so the diagnostic catalog documents this failure mode at all.
    #[error("Fatal Error: unable to allocate memory, exiting program!")]
    FatalAllocation,
}

/// A non-fatal diagnostic: the line is still fully processed and output files
/// are still produced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssemblyWarning {
    #[error("Warning, line {line}: \"{value}\" value will not fit in 8 bits.")]
    ImmediateOutOfRange { line: usize, value: i32 },

    #[error(
        "Warning, line {line}: line opening label will be ignored with \".entry\"/\".extern\" declarations."
    )]
    EntryExternLabelIgnored { line: usize },

    #[error("Warning, line {line}: \"{value}\" value will not fit in 10 bits.")]
    DataOutOfRange { line: usize, value: i32 },
}

/// Truncates `label` to its first 5 characters followed by `...`, matching the
/// display convention used when printing overlong labels in diagnostics.
pub fn shorten_label(label: &str) -> String {
    let prefix: String = label.chars().take(5).collect();
    format!("{prefix}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shortens_overlong_labels() {
        assert_eq!(shorten_label("ABCDEFGHIJ"), "ABCDE...");
    }

    #[test]
    fn renders_expected_text() {
        let err = AssemblyError::DuplicateSymbol {
            line: 4,
            name: "L".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Error, line 4: \"L\" such symbol already exists."
        );
    }
}
