//! # Tenant App Config Validator
//!
//! A command-line utility for checking tenant application configuration
//! files before they are deployed.
//!
//! ## Usage
//!
//! ### Validate a Single File
//!
//! ```bash
//! cargo run --bin config-validator config/tenant1-app1.json
//! ```
//!
//! ### Validate All Files in a Directory
//!
//! ```bash
//! cargo run --bin config-validator ./config/
//! ```
//!
//! ## Output Examples
//!
//! ```text
//! Validating config file: config/tenant1-app1.json
//! ✓ Config is valid!
//!
//! Config Summary:
//!   App: app1 (asset asset1)
//!   Tenant: tenant1
//!   Subtenant: subtenant2
//!   Storage tenant: hosttenant
//!   Scope group: sub
//! ```
//!
//! ## Validation Rules
//!
//! - Must be valid JSON with `identity` and `groups` objects
//! - Identity fields must not be empty
//! - The six well-known group ids must be set and distinct
//! - In a directory, no two files may configure the same app of the same
//!   tenant and subtenant
//!
//! ## Exit Codes
//!
//! - `0`: All configs are valid
//! - `1`: One or more configs are invalid or validation error occurred
//!
//! Set `RUST_LOG=debug` for details on what was checked.

use app_tenancy::TenantAppConfig;
use log::debug;
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;
use std::process;

fn main() {
    env_logger::init();
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <config-file-or-directory>", args[0]);
        eprintln!();
        eprintln!("Examples:");
        eprintln!("  {} config/tenant1-app1.json", args[0]);
        eprintln!("  {} ./config/", args[0]);
        process::exit(1);
    }

    let path = Path::new(&args[1]);

    if path.is_file() {
        validate_single_file(path);
    } else if path.is_dir() {
        validate_directory(path);
    } else {
        eprintln!(
            "Error: '{}' is not a valid file or directory",
            path.display()
        );
        process::exit(1);
    }
}

fn validate_single_file(file_path: &Path) {
    println!("Validating config file: {}", file_path.display());

    match TenantAppConfig::from_file(file_path) {
        Ok(config) => {
            println!("✓ Config is valid!");
            print_config_summary(&config);
        }
        Err(e) => {
            eprintln!("❌ Config validation failed: {}", e);
            process::exit(1);
        }
    }
}

fn validate_directory(dir_path: &Path) {
    println!("Validating configs in directory: {}", dir_path.display());

    let entries = match fs::read_dir(dir_path) {
        Ok(entries) => entries,
        Err(e) => {
            eprintln!("Error reading directory: {}", e);
            process::exit(1);
        }
    };

    let mut paths: Vec<_> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.extension().and_then(|s| s.to_str()) == Some("json"))
        .collect();
    paths.sort();

    let mut valid = Vec::new();
    let mut error_count = 0;

    for path in &paths {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        println!("\nValidating: {}", name);

        match TenantAppConfig::from_file(path) {
            Ok(config) => {
                println!(
                    "  ✓ Valid - {} for {}",
                    config.identity.app_id,
                    scope_label(&config)
                );
                valid.push((name, config));
            }
            Err(e) => {
                eprintln!("  ❌ Invalid - {}", e);
                error_count += 1;
            }
        }
    }

    println!("\nValidation Summary:");
    println!("  Valid configs: {}", valid.len());
    println!("  Invalid configs: {}", error_count);

    if error_count > 0 {
        process::exit(1);
    }

    println!("\nChecking for duplicate installations...");
    let duplicates = find_duplicates(&valid);
    if duplicates.is_empty() {
        println!("✓ No app is configured twice");
    } else {
        for (first, second) in &duplicates {
            eprintln!("❌ {} and {} configure the same app", first, second);
        }
        process::exit(1);
    }
}

/// Pairs of file names configuring the same app for the same (sub)tenant.
fn find_duplicates(configs: &[(String, TenantAppConfig)]) -> Vec<(String, String)> {
    let mut seen: HashMap<(String, Option<String>, String), &str> = HashMap::new();
    let mut duplicates = Vec::new();

    for (name, config) in configs {
        let identity = &config.identity;
        let key = (
            identity.app_tenant.clone(),
            identity.subtenant_id.clone(),
            identity.app_id.clone(),
        );
        debug!("Installation key of {}: {:?}", name, key);
        if let Some(first) = seen.get(&key) {
            duplicates.push((first.to_string(), name.clone()));
        } else {
            seen.insert(key, name);
        }
    }
    duplicates
}

fn scope_label(config: &TenantAppConfig) -> String {
    match &config.identity.subtenant_id {
        Some(subtenant) => format!("{}/{}", config.identity.app_tenant, subtenant),
        None => config.identity.app_tenant.clone(),
    }
}

fn print_config_summary(config: &TenantAppConfig) {
    let identity = &config.identity;
    println!();
    println!("Config Summary:");
    println!("  App: {} (asset {})", identity.app_id, identity.asset_id);
    println!("  Tenant: {}", identity.app_tenant);
    if let Some(subtenant) = &identity.subtenant_id {
        println!("  Subtenant: {}", subtenant);
    }
    println!("  Storage tenant: {}", identity.storage_tenant);
    println!(
        "  Scope group: {}",
        config.groups.scope_group(identity.is_subtenant_app())
    );
}
