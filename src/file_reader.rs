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

use anyhow::Result;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub trait FileReader {
    fn read_to_string(&self, path: &Path) -> Result<String>;
}

/// Production reader backed by the real filesystem.
pub struct AsmFileReader;

impl FileReader for AsmFileReader {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        Ok(fs::read_to_string(path)?)
    }
}

/// In-memory reader for tests that should not touch the real filesystem.
#[derive(Default)]
pub struct MockFileReader {
    files: HashMap<PathBuf, String>,
}

impl MockFileReader {
    pub fn add_file(&mut self, path: &str, content: &str) {
        self.files.insert(PathBuf::from(path), content.to_string());
    }
}

impl FileReader for MockFileReader {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("Mock file not found: {}", path.display()))
    }
}

/// Mirrors [`FileReader`] on the output side: the second pass writes `.ob`,
/// `.ent` and `.ext` through this trait rather than calling `std::fs` directly,
/// so its file-production rules (suppress `.ent` on entry errors, suppress
/// `.ext` when empty, and so on) can be asserted on in tests without a temp
/// directory.
pub trait OutputWriter {
    fn write(&mut self, path: &Path, content: &str) -> Result<()>;

    /// Called instead of `write` when a file that was tentatively opened
    /// should not be produced after all (e.g. an empty `.ext`).
    fn remove(&mut self, _path: &Path) -> Result<()> {
        Ok(())
    }
}

/// Production writer backed by the real filesystem.
pub struct FsOutputWriter;

impl OutputWriter for FsOutputWriter {
    fn write(&mut self, path: &Path, content: &str) -> Result<()> {
        Ok(fs::write(path, content)?)
    }
}

/// In-memory writer for tests; records exactly which files would have been
/// produced and their final contents.
#[derive(Default)]
pub struct MockOutputWriter {
    pub files: HashMap<PathBuf, String>,
}

impl OutputWriter for MockOutputWriter {
    fn write(&mut self, path: &Path, content: &str) -> Result<()> {
        self.files.insert(path.to_path_buf(), content.to_string());
        Ok(())
    }

    fn remove(&mut self, path: &Path) -> Result<()> {
        self.files.remove(path);
        Ok(())
    }
}
