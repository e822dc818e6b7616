use std::{env, path::PathBuf};

// Client builds have no runtime environment, so console defaults are baked in
// at compile time from `.env`.
const BAKED_PREFIX: &str = "LOG_CONSOLE_";

fn main() {
    let Ok(manifest_dir) = env::var("CARGO_MANIFEST_DIR") else {
        return;
    };
    let env_path = PathBuf::from(&manifest_dir).join(".env");

    println!("cargo:rerun-if-changed={}", env_path.display());

    if !env_path.exists() {
        return;
    }
    let entries = match dotenvy::from_path_iter(&env_path) {
        Ok(entries) => entries,
        Err(err) => {
            println!("cargo:warning=could not read {}: {}", env_path.display(), err);
            return;
        }
    };
    for item in entries {
        match item {
            Ok((key, val)) if key.starts_with(BAKED_PREFIX) => {
                println!("cargo:rustc-env={}={}", key, val);
            }
            Ok(_) => {}
            Err(err) => println!("cargo:warning=skipping .env entry: {}", err),
        }
    }
}
