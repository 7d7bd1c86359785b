use std::path::Path;

/// Exposes the workspace `VERSION` file as `NOTEWALL_VERSION`.
fn main() {
    let version_file = Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .map(|root| root.join("VERSION"))
        .expect("notewall-app lives two levels below the workspace root");
    println!("cargo:rerun-if-changed={}", version_file.display());

    let contents = std::fs::read_to_string(&version_file)
        .unwrap_or_else(|err| panic!("cannot read {}: {err}", version_file.display()));
    match contents.lines().map(str::trim).find(|line| !line.is_empty()) {
        Some(version) => println!("cargo:rustc-env=NOTEWALL_VERSION={version}"),
        None => panic!("{} holds no version", version_file.display()),
    }
}
