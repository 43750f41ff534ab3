use std::env;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-env-changed=CARGO_FEATURE_FTDI");

    // The simulated sensor needs no native libraries
    if env::var_os("CARGO_FEATURE_FTDI").is_none() {
        return;
    }

    let manifest_dir = env::var("CARGO_MANIFEST_DIR").unwrap();
    let project_root = PathBuf::from(&manifest_dir);

    // Shared FTDI libraries live next to the project unless overridden
    let mpsse_lib_path = env::var("MPSSE_LIB_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| project_root.join("FTDI MPSSE").join("build").join("Win32").join("DLL"));

    println!("cargo:rerun-if-env-changed=MPSSE_LIB_DIR");
    println!("cargo:rustc-link-search=native={}", mpsse_lib_path.display());

    // libmpsse.dll depends on FTD2XX.dll, which is loaded at runtime
    println!("cargo:rustc-link-lib=dylib=libmpsse");
}
