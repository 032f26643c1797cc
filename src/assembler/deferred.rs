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

//! The three insertion-ordered sequences pass 1 records and pass 2 consumes.
//! Names are resolved against the symbol table by string, never by pointer,
//! so these lists stay independent of the table's internal storage.

/// A reserved code-array slot whose final word depends on a label defined
/// later (or earlier) in the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchSite {
    pub name: String,
    pub code_index: u32,
    pub line: usize,
    pub is_struct: bool,
}

/// One occurrence of `.entry NAME`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryRequest {
    pub name: String,
    pub line: usize,
}

/// One ABSOLUTE-mode operand occurrence, recorded regardless of whether the
/// name turns out to be extern; pass 2 filters by symbol kind when writing
/// `.ext`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternUse {
    pub name: String,
    pub code_index: u32,
}

#[derive(Debug, Default)]
pub struct DeferredLists {
    pub patches: Vec<PatchSite>,
    pub entries: Vec<EntryRequest>,
    pub externs: Vec<ExternUse>,
}

impl DeferredLists {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find_entry(&self, name: &str) -> Option<&EntryRequest> {
        self.entries.iter().find(|e| e.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_entry_matches_by_name() {
        let mut lists = DeferredLists::new();
        lists.entries.push(EntryRequest {
            name: "X".to_string(),
            line: 3,
        });
        assert!(lists.find_entry("X").is_some());
        assert!(lists.find_entry("Y").is_none());
    }
}
