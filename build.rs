use std::process::Command;

/// Embeds the commit this binary is built from, used by the compatibility check.
fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-env-changed=MACHTIANI_HEAD_OID");

    if std::env::var("MACHTIANI_HEAD_OID").is_ok() {
        return;
    }

    let head_oid = Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|oid| oid.trim().to_string())
        .filter(|oid| !oid.is_empty())
        .unwrap_or_else(|| "none".to_string());

    println!("cargo:rustc-env=MACHTIANI_HEAD_OID={}", head_oid);
}
