//! List commands implementation

use crate::adapters::available_adapters;

/// List all supported adapters
pub fn list_adapters() {
    println!("Supported adapters:");
    println!();
    for adapter in available_adapters() {
        println!("  {:8} - {}", adapter.name, adapter.description);
        if !adapter.aliases.is_empty() {
            println!("  {:8}   aliases: {}", "", adapter.aliases.join(", "));
        }
    }
}
