//! Output formatting for the CLI

use crate::gridworld::{Action, GridState};

/// Print a section header
pub fn print_section(title: &str) {
    println!("\n{}", "=".repeat(60));
    println!("{title}");
    println!("{}", "=".repeat(60));
}

/// Format a number with thousands separators
pub fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i.is_multiple_of(3) {
            result.insert(0, ',');
        }
        result.insert(0, c);
    }
    result
}

/// Print a key-value pair
pub fn print_kv(key: &str, value: &str) {
    println!("  {:20} {}", format!("{}:", key), value);
}

/// One grid row of values, fixed width so columns line up
pub fn format_value_row(values: &[f64]) -> String {
    values
        .iter()
        .map(|value| format!("{value:9.3}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// One grid row of greedy actions as arrows, with the goal shown as `G`
pub fn format_policy_row(row: usize, actions: &[Action], goal: GridState) -> String {
    actions
        .iter()
        .enumerate()
        .map(|(col, action)| {
            if GridState::new(row, col) == goal {
                "G".to_string()
            } else {
                action.arrow().to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
