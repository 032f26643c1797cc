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

use crate::word::Word;

/// Load-address base: the first code word lands at this address.
pub const BASE_ADDRESS: u32 = 100;
/// Combined cap on `code.len() + data.len()`.
pub const MEMORY_SIZE: usize = 256;

/// The two append-only word arrays the first pass fills and the second pass
/// patches, plus the sticky saturation flag.
#[derive(Debug, Default)]
pub struct MemoryImage {
    code: Vec<Word>,
    data: Vec<Word>,
    memory_full: bool,
}

impl MemoryImage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ic(&self) -> u32 {
        self.code.len() as u32
    }

    pub fn dc(&self) -> u32 {
        self.data.len() as u32
    }

    pub fn memory_full(&self) -> bool {
        self.memory_full
    }

    fn has_room(&self) -> bool {
        self.code.len() + self.data.len() < MEMORY_SIZE
    }

    /// Appends `word` to the code array and returns its index, unless the
    /// image is already saturated, in which case the insert is dropped and
    /// `memory_full` becomes sticky.
    pub fn push_code(&mut self, word: Word) -> Option<u32> {
        if !self.has_room() {
            self.memory_full = true;
            eprintln!("Error: memory is full.");
            return None;
        }
        let index = self.code.len() as u32;
        self.code.push(word);
        Some(index)
    }

    pub fn push_data(&mut self, word: Word) -> Option<u32> {
        if !self.has_room() {
            self.memory_full = true;
            eprintln!("Error: memory is full.");
            return None;
        }
        let index = self.data.len() as u32;
        self.data.push(word);
        Some(index)
    }

    /// Overwrites a previously reserved code slot; used by the second pass to
    /// back-patch operand words.
    pub fn set_code(&mut self, index: u32, word: Word) {
        self.code[index as usize] = word;
    }

    pub fn code(&self) -> &[Word] {
        &self.code
    }

    pub fn data(&self) -> &[Word] {
        &self.data
    }
}
