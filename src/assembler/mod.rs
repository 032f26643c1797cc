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

pub mod deferred;
pub mod first_pass;
pub mod memory_image;
pub mod second_pass;
pub mod symbol_table;

use deferred::DeferredLists;
use memory_image::MemoryImage;
use symbol_table::SymbolTable;

use crate::errors::{AssemblyError, AssemblyWarning};

/// Everything one source file accumulates across both passes: the symbol
/// table, the growing memory image, the deferred resolution lists, and every
/// diagnostic collected along the way. One assembly run owns exactly one of
/// these, so nothing about a file's state outlives its `Session`.
#[derive(Debug)]
pub struct Session {
    pub symbols: SymbolTable,
    pub memory: MemoryImage,
    pub deferred: DeferredLists,
    pub errors: Vec<AssemblyError>,
    pub warnings: Vec<AssemblyWarning>,
}

impl Session {
    pub fn new() -> Self {
        Session {
            symbols: symbol_table::preloaded_table(),
            memory: MemoryImage::new(),
            deferred: DeferredLists::new(),
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Walks every source line once, recording at most one error per line
    /// plus any warnings. Never stops early: a bad line is abandoned but the
    /// rest of the file is still assembled.
    pub fn run_first_pass(&mut self, source: &str) {
        for (index, raw_line) in source.lines().enumerate() {
            first_pass::process_line(self, raw_line, index + 1);
        }
    }

    /// Resolves deferred patches/entries/externs and renders the three
    /// output files, unless the first pass (or memory saturation) already
    /// made that pointless.
    pub fn run_second_pass(&mut self) -> Result<second_pass::SecondPassOutput, Vec<AssemblyError>> {
        second_pass::run(self)
    }

    /// `true` when first-pass errors and memory saturation permit a second
    /// pass to run at all.
    pub fn first_pass_ok(&self) -> bool {
        self.errors.is_empty() && !self.memory.memory_full()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
