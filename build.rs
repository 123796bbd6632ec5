use std::time::{SystemTime, UNIX_EPOCH};

const TEMPLATE_DIR: &str = "templates";

fn main() {
    // Askama compiles templates into the binary. A directory hint makes cargo
    // rescan every file under it, so new pages are picked up too.
    println!("cargo:rerun-if-changed={TEMPLATE_DIR}");
    println!("cargo:rerun-if-changed=build.rs");

    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default();
    let version = std::env::var("CARGO_PKG_VERSION").unwrap_or_default();
    println!("cargo:rustc-env=RETIRO_BUILD_ID={version}+{stamp}");
}
