use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::{TempDir, tempdir};

const RED_GREEN: [u8; 6] = [0xFF, 0x00, 0x00, 0x00, 0xFF, 0x00];
const GREEN_RED: [u8; 6] = [0x00, 0xFF, 0x00, 0xFF, 0x00, 0x00];

const MANIFEST: &str = r#"
[[session]]
name = "scenario_a"
frames = ["frame0.raw"]
byte_order = "little"

[session.format]
width = 2
height = 1
kind = "direct"
number_of_colors = 256
bpp = 24
bytes_per_pixel = 3
red = { pos = 0, size = 8 }
green = { pos = 8, size = 8 }
blue = { pos = 16, size = 8 }
"#;

fn workspace(frame: &[u8]) -> (TempDir, PathBuf) {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("frame0.raw"), frame).unwrap();
    let manifest = dir.path().join("run.toml");
    fs::write(&manifest, MANIFEST).unwrap();
    (dir, manifest)
}

fn fbcheck(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_fbcheck"))
        .args(args)
        .arg("--config")
        .arg(dir.join("no-config.toml"))
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

#[test]
fn sum_prints_label_index_and_checksum() {
    let (dir, manifest) = workspace(&RED_GREEN);
    let out = fbcheck(dir.path(), &["sum", manifest.to_str().unwrap()]);
    assert!(out.status.success());
    assert_eq!(
        String::from_utf8_lossy(&out.stdout).trim(),
        "scenario_a_2x1xbgra8880:0 0xdccab04b"
    );
}

#[test]
fn recorded_table_verifies_and_catches_changes() {
    let (dir, manifest) = workspace(&RED_GREEN);
    let table = dir.path().join("table.toml");
    let out = fbcheck(
        dir.path(),
        &[
            "record",
            manifest.to_str().unwrap(),
            "--out",
            table.to_str().unwrap(),
        ],
    );
    assert!(out.status.success());
    let text = fs::read_to_string(&table).unwrap();
    assert!(text.contains("scenario_a"));
    assert!(text.contains(&0xDCCA_B04Bu32.to_string()));

    let verify = |dumps: &Path| {
        fbcheck(
            dir.path(),
            &[
                "verify",
                manifest.to_str().unwrap(),
                "--table",
                table.to_str().unwrap(),
                "--dump-dir",
                dumps.to_str().unwrap(),
            ],
        )
    };

    let dumps = dir.path().join("dumps");
    assert!(verify(&dumps).status.success());
    assert!(!dumps.exists());

    fs::write(dir.path().join("frame0.raw"), GREEN_RED).unwrap();
    let out = verify(&dumps);
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Checksum scenario_a_2x1xbgra8880:0 failed:"));
    assert!(dumps.join("scenario_a_2x1xbgra8880_0.bmp").is_file());
}

#[test]
fn verify_without_table_reports_unexpected_and_count() {
    let (dir, manifest) = workspace(&RED_GREEN);
    let out = fbcheck(dir.path(), &["verify", manifest.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Unexpected checksum scenario_a_2x1xbgra8880:0: 0xdccab04b"));
    assert!(stderr.contains("Not enough checksums scenario_a_2x1xbgra8880: 1 vs 0"));
}

#[test]
fn rust_style_record_is_pasteable() {
    let (dir, manifest) = workspace(&RED_GREEN);
    let out_file = dir.path().join("table.rs");
    let out = fbcheck(
        dir.path(),
        &[
            "record",
            manifest.to_str().unwrap(),
            "--out",
            out_file.to_str().unwrap(),
            "--style",
            "rust",
        ],
    );
    assert!(out.status.success());
    let text = fs::read_to_string(out_file).unwrap();
    assert!(text.contains("// scenario_a_2x1xbgra8880"));
    assert!(text.contains("&[0xdccab04b]"));
}

#[test]
fn missing_manifest_exits_with_load_error() {
    let dir = tempdir().unwrap();
    let out = fbcheck(dir.path(), &["sum", "does-not-exist.toml"]);
    assert_eq!(out.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&out.stderr).contains("does-not-exist.toml"));
}
