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

use anyhow::Result;
use std::process::Command;
use std::time::Instant;

// ANSI color codes
pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";
pub const GREEN: &str = "\x1b[32m";
pub const RED: &str = "\x1b[31m";
pub const BLUE: &str = "\x1b[34m";
pub const YELLOW: &str = "\x1b[33m";
pub const CYAN: &str = "\x1b[36m";

pub fn print_help() {
    println!("{BOLD}{YELLOW}Usage:{RESET} cargo xtask <command>\n");
    println!("{BOLD}Available commands:{RESET}");
    println!("  {BOLD}test{RESET}     - Run every test in the workspace.");
    println!("  {BOLD}verbose{RESET}  - Run the core tests with the `verbose` feature.");
    println!("  {BOLD}check{RESET}    - Run `cargo check` on every target.");
    println!("  {BOLD}clippy{RESET}   - Run clippy with all features, warnings as errors.");
    println!("  {BOLD}all{RESET}      - Run every task above, as CI does.");
}

pub fn print_task_start(task_name: &str, color: &str) {
    println!("\n{BOLD}{color}━━━ {task_name} ━━━{RESET}");
}

pub fn print_success(message: &str) {
    println!("{BOLD}{GREEN}✓ {message}{RESET}");
}

pub fn print_error(message: &str) {
    println!("{BOLD}{RED}✗ {message}{RESET}");
}

pub fn execute_command(cmd: &str, args: &[&str], task_name: &str) -> Result<()> {
    let start_time = Instant::now();
    println!("{BOLD}{CYAN}Command:{RESET} {cmd} {}", args.join(" "));

    let status = Command::new(cmd).args(args).status()?;
    let seconds = start_time.elapsed().as_secs_f64();
    if status.success() {
        print_success(&format!("{task_name} completed in {seconds:.2}s"));
        Ok(())
    } else {
        print_error(&format!("{task_name} failed after {seconds:.2}s"));
        anyhow::bail!("{task_name} failed with status: {status}");
    }
}
