// Build script to extract version from Cargo.toml
// and optionally override patch version from CI/CD pipeline

use std::env;

fn main() {
    // Get version from Cargo.toml
    let version = env::var("CARGO_PKG_VERSION").expect("CARGO_PKG_VERSION not set");

    let parts: Vec<&str> = version.split('.').collect();
    if parts.len() != 3 {
        panic!("Invalid version format in Cargo.toml: {}", version);
    }

    // Release builds may stamp their own patch number
    let patch = env::var("MENU_SCOUT_PATCH_VERSION").unwrap_or_else(|_| parts[2].to_string());

    println!(
        "cargo:rustc-env=MENU_SCOUT_VERSION={}.{}.{}",
        parts[0], parts[1], patch
    );
    println!("cargo:rerun-if-changed=Cargo.toml");
    println!("cargo:rerun-if-env-changed=MENU_SCOUT_PATCH_VERSION");
}
