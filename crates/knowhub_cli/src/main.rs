//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `knowhub_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

fn main() {
    println!("knowhub_core ping={}", knowhub_core::ping());
    println!("knowhub_core version={}", knowhub_core::core_version());
    println!(
        "knowhub_core schema_version={}",
        knowhub_core::db::migrations::latest_version()
    );
}
