// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::helpers::*;
use anyhow::Result;
use std::time::Instant;

pub fn test() -> Result<()> {
    print_task_start("Running All Tests", GREEN);
    execute_command("cargo", &["test", "--workspace"], "Tests")
}

/// Reruns the core tests with the binding cache cross-checking every bind
/// against the driver.
pub fn test_verbose() -> Result<()> {
    print_task_start("Running Core Tests With Verbose Checks", YELLOW);
    execute_command(
        "cargo",
        &["test", "-p", "baldr-core", "--features", "verbose"],
        "Verbose tests",
    )
}

pub fn check() -> Result<()> {
    print_task_start("Checking All Crates", CYAN);
    execute_command("cargo", &["check", "--workspace", "--all-targets"], "Check")
}

pub fn clippy() -> Result<()> {
    print_task_start("Running Clippy", YELLOW);
    execute_command(
        "cargo",
        &["clippy", "--workspace", "--all-features", "--", "-D", "warnings"],
        "Clippy",
    )
}

pub fn all() -> Result<()> {
    let start_time = Instant::now();
    let tasks = [
        ("Check", check as fn() -> Result<()>),
        ("Test", test),
        ("Verbose test", test_verbose),
        ("Clippy", clippy),
    ];
    let failed = tasks
        .iter()
        .enumerate()
        .filter_map(|(i, (name, task))| {
            println!("\n{BOLD}{BLUE}[{}/{}] {name}{RESET}", i + 1, tasks.len());
            task().err().map(|_| *name)
        })
        .collect::<Vec<_>>();

    println!(
        "\n{BOLD}{BLUE}Total time: {:.2}s{RESET}",
        start_time.elapsed().as_secs_f64()
    );
    if !failed.is_empty() {
        anyhow::bail!("Pipeline failed in: {}", failed.join(", "));
    }
    print_success(&format!("All {} tasks completed", tasks.len()));
    Ok(())
}
