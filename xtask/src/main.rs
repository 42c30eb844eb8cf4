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

// Build automation for the baldr workspace.
// Run with: cargo xtask <command>

mod ci;
mod helpers;

use helpers::{print_error, print_help};

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let Some(command) = args.get(1) else {
        print_help();
        return;
    };

    let result = match command.as_str() {
        "test" => ci::test(),
        "verbose" => ci::test_verbose(),
        "check" => ci::check(),
        "clippy" => ci::clippy(),
        "all" => ci::all(),
        _ => {
            print_error(&format!("Unknown command: {command}"));
            print_help();
            return;
        }
    };
    if let Err(err) = result {
        print_error(&format!("{err:#}"));
        std::process::exit(1);
    }
}
