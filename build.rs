use std::env;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-env-changed=BRAW_LIBRARIES");

    let location = match env::var("BRAW_LIBRARIES") {
        Ok(value) if !value.trim().is_empty() => PathBuf::from(value),
        _ => {
            println!(
                "cargo:warning=BRAW_LIBRARIES is not set. Clips can only be opened when OpenOptions::with_library_path names the Blackmagic RAW library."
            );
            return;
        }
    };

    if !location.exists() {
        println!(
            "cargo:warning=BRAW_LIBRARIES points at {}, which does not exist on the build machine.",
            location.display(),
        );
    }
}
