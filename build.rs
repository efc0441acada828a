use std::process::Command;

fn main() {
    // Compiler version reported as the runtime version in process metrics
    let rustc = std::env::var("RUSTC").unwrap_or_else(|_| "rustc".to_string());
    let rustc_version = Command::new(rustc)
        .arg("--version")
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|version| version.trim().to_string())
        .filter(|version| !version.is_empty())
        .unwrap_or_else(|| "rustc unknown".to_string());

    println!("cargo:rustc-env=BOTWATCH_RUSTC_VERSION={}", rustc_version);
    println!("cargo:rerun-if-env-changed=RUSTC");
}
