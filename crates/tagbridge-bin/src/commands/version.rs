// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! The `version` command.

/// Prints component versions.
pub fn execute() {
    println!("tagbridge {}", tagbridge_core::VERSION);
    println!("  {} {}", tagbridge_core::NAME, tagbridge_core::VERSION);
    println!("  {} {}", tagbridge_engine::NAME, tagbridge_engine::VERSION);
}
