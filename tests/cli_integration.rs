//! CLI integration tests for sslpack.
//!
//! These drive the binary end to end for everything that does not need a
//! real toolchain: planning, info, packaging and error reporting.

use std::fs;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get the sslpack binary command.
fn sslpack() -> Command {
    let mut cmd = Command::cargo_bin("sslpack").unwrap();
    cmd.env_remove("SSLPACK_PROFILE");
    cmd
}

fn temp_dir() -> TempDir {
    TempDir::new().unwrap()
}

const LINUX: [&str; 6] = ["--os", "Linux", "--arch", "x86_64", "--compiler", "gcc"];

// ============================================================================
// sslpack plan
// ============================================================================

#[test]
fn test_plan_prints_json() {
    let output = sslpack()
        .arg("plan")
        .args(LINUX)
        .args(["--host", "Linux"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let plan: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(plan["configure_target"], "linux-x86_64");
    assert_eq!(plan["extra_flags"], serde_json::json!([]));
    assert_eq!(plan["steps"][0]["type"], "configure");
}

#[test]
fn test_plan_debug_adds_debug_flags() {
    sslpack()
        .args(["plan", "--os", "Linux", "--arch", "x86", "--compiler", "gcc"])
        .args(["--build-type", "Debug"])
        .assert()
        .success()
        .stdout(predicate::str::contains("debug-linux-generic32"))
        .stdout(predicate::str::contains("no-asm"))
        .stdout(predicate::str::contains("-fno-omit-frame-pointer"));
}

#[test]
fn test_plan_options_are_hyphenated() {
    sslpack()
        .arg("plan")
        .args(LINUX)
        .args(["-o", "shared=True", "-o", "no_md2=true"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"no-md2\""))
        .stdout(predicate::str::contains("\"shared\""));
}

#[test]
fn test_plan_with_zlib() {
    sslpack()
        .arg("plan")
        .args(LINUX)
        .args(["--zlib-include", "/opt/zlib/include", "--zlib-lib", "/opt/zlib/lib"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--with-zlib-lib=/opt/zlib/lib"))
        .stdout(predicate::str::contains("-lefence"));
}

#[test]
fn test_plan_from_profile_with_override() {
    let tmp = temp_dir();
    let profile = tmp.path().join("sunos.toml");
    fs::write(
        &profile,
        "[settings]\nos = \"SunOS\"\narch = \"sparc\"\ncompiler = \"gcc\"\n\n[options]\nno_rc5 = true\n",
    )
    .unwrap();

    sslpack()
        .arg("plan")
        .arg("--profile")
        .arg(&profile)
        .args(["--build-type", "Debug"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"solaris-sparc-gcc\""))
        .stdout(predicate::str::contains("no-rc5"));
}

// ============================================================================
// errors
// ============================================================================

#[test]
fn test_unsupported_architecture() {
    sslpack()
        .args(["plan", "--os", "Linux", "--arch", "riscv64", "--compiler", "gcc"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported architecture"))
        .stderr(predicate::str::contains("riscv64"))
        .stderr(predicate::str::contains("sslpack info --targets"));
}

#[test]
fn test_unsupported_platform() {
    sslpack()
        .args(["plan", "--os", "Emscripten", "--arch", "wasm", "--compiler", "clang"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported platform"));
}

#[test]
fn test_unknown_option() {
    sslpack()
        .arg("plan")
        .args(LINUX)
        .args(["-o", "no_thread=True"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown build option `no_thread`"));
}

#[test]
fn test_unknown_option_in_profile() {
    let tmp = temp_dir();
    let profile = tmp.path().join("bad.toml");
    fs::write(&profile, "[options]\nno_thread = true\n").unwrap();

    sslpack()
        .arg("plan")
        .arg("--profile")
        .arg(&profile)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no_thread"));
}

// ============================================================================
// sslpack info
// ============================================================================

#[test]
fn test_info_link_libraries() {
    sslpack()
        .arg("info")
        .args(LINUX)
        .assert()
        .success()
        .stdout(predicate::str::contains("link libs: ssl crypto dl"))
        .stdout(predicate::str::contains("target:    linux-x86_64"));

    sslpack()
        .args(["info", "--os", "Windows", "--arch", "x86_64", "--compiler", "msvc"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ssleay32 libeay32 crypt32 msi ws2_32"));
}

#[test]
fn test_info_lists_options_and_targets() {
    sslpack()
        .args(["info", "--options"])
        .assert()
        .success()
        .stdout(predicate::str::contains("no_threads"))
        .stdout(predicate::str::contains("no-threads"));

    sslpack()
        .args(["info", "--targets"])
        .assert()
        .success()
        .stdout(predicate::str::contains("linux-aarch64"))
        .stdout(predicate::str::contains("VC-WIN64A"))
        .stdout(predicate::str::contains("solaris64-sparcv9-cc"));
}

// ============================================================================
// sslpack package
// ============================================================================

#[test]
fn test_package_static_linux_tree() {
    let tmp = temp_dir();
    let src = tmp.path().join("openssl-1.0.2p");
    fs::create_dir_all(src.join("include/openssl")).unwrap();
    fs::write(src.join("include/openssl/ssl.h"), "").unwrap();
    fs::write(src.join("libcrypto.a"), "").unwrap();
    fs::write(src.join("libssl.a"), "").unwrap();
    fs::write(src.join("LICENSE"), "").unwrap();

    sslpack()
        .arg("package")
        .args(LINUX)
        .arg("--source")
        .arg(&src)
        .arg("--dest")
        .arg(tmp.path().join("out"))
        .assert()
        .success();

    assert!(tmp.path().join("out/lib/libssl.a").exists());
    assert!(tmp.path().join("out/include/openssl/ssl.h").exists());
    assert!(tmp.path().join("out/LICENSE").exists());
}

#[test]
fn test_package_missing_library_fails() {
    let tmp = temp_dir();
    let src = tmp.path().join("openssl-1.0.2p");
    fs::create_dir_all(&src).unwrap();

    sslpack()
        .arg("package")
        .args(LINUX)
        .args(["-o", "shared=True"])
        .arg("--source")
        .arg(&src)
        .arg("--dest")
        .arg(tmp.path().join("out"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("libcrypto.so"));
}

// ============================================================================
// sslpack completions
// ============================================================================

#[test]
fn test_completions_bash() {
    sslpack()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sslpack"));
}
