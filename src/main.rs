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

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use cicasm::assemble_file;
use cicasm::file_reader::{AsmFileReader, FsOutputWriter};

#[derive(Parser)]
#[clap(version = "0.1.0", author = "Connor Nolan")]
struct Opts {
    /// One or more `.as` source files to assemble.
    #[clap(required = true)]
    files: Vec<PathBuf>,
}

fn main() -> Result<ExitCode> {
    let opts = Opts::parse();
    let reader = AsmFileReader;
    let mut writer = FsOutputWriter;

    let mut any_failed = false;

    for path in &opts.files {
        println!("Processing file {}...", path.display());

        let report = assemble_file(path, &reader, &mut writer)?;

        for warning in &report.warnings {
            eprintln!("{warning}");
        }
        for error in &report.errors {
            eprintln!("{error}");
        }

        if report.succeeded() {
            println!("Done processing file {}.", path.display());
        } else {
            eprintln!("Failed to assemble {}.", path.display());
            any_failed = true;
        }
    }

    Ok(if any_failed { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}
