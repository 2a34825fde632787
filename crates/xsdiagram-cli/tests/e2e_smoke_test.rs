use std::{
    fs,
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use tempfile::tempdir;

use xsdiagram_cli::Args;

fn demos_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos")
}

/// Collects all .xsd files from a directory
fn collect_xsd_files(dir: PathBuf) -> Vec<PathBuf> {
    let mut files = if let Ok(entries) = fs::read_dir(&dir) {
        entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("xsd")
            })
            .collect()
    } else {
        Vec::new()
    };

    // Sort for consistent test output
    files.sort();
    files
}

fn args(input: &Path, output: &Path) -> Args {
    let mut args = Args::new(input.to_string_lossy(), output.to_string_lossy());
    args.log_level = "off".to_string();
    args
}

#[test]
fn e2e_smoke_test_valid_demos() {
    let temp_dir = tempdir().expect("Failed to create temp directory");

    let valid_demos = collect_xsd_files(demos_dir());
    assert!(!valid_demos.is_empty(), "No demo schemas found in demos/");

    let mut failed_demos = Vec::new();

    for demo_path in &valid_demos {
        let output_filename = format!(
            "{}.svg",
            demo_path.file_stem().unwrap().to_string_lossy()
        );
        let output_path = temp_dir.path().join(output_filename);

        let mut args = args(demo_path, &output_path);
        args.expand_level = 3;

        match xsdiagram_cli::run(&args) {
            Ok(()) => {
                let svg = fs::read_to_string(&output_path).expect("Output should exist");
                assert!(svg.contains("<svg"), "{} is not SVG", output_path.display());
            }
            Err(e) => failed_demos.push((demo_path.clone(), e)),
        }
    }

    if !failed_demos.is_empty() {
        eprintln!("\nDemo schemas that failed:");
        for (path, err) in &failed_demos {
            eprintln!("  - {}: {}", path.display(), err);
        }
        panic!("{} demo schema(s) failed unexpectedly", failed_demos.len());
    }

    println!("✅ All {} demo schemas passed", valid_demos.len());
}

#[test]
fn e2e_smoke_test_error_demos() {
    let temp_dir = tempdir().expect("Failed to create temp directory");

    let error_demos = collect_xsd_files(demos_dir().join("errors"));
    assert!(
        !error_demos.is_empty(),
        "No error schemas found in demos/errors/"
    );

    let mut unexpectedly_succeeded = Vec::new();

    for demo_path in &error_demos {
        let output_filename = format!(
            "error_{}.svg",
            demo_path.file_stem().unwrap().to_string_lossy()
        );
        let output_path = temp_dir.path().join(&output_filename);

        if xsdiagram_cli::run(&args(demo_path, &output_path)).is_ok() {
            unexpectedly_succeeded.push(demo_path.clone());
        }
        assert!(!output_path.exists(), "{output_filename} should not be written");
    }

    if !unexpectedly_succeeded.is_empty() {
        eprintln!("\nError schemas that unexpectedly succeeded:");
        for path in &unexpectedly_succeeded {
            eprintln!("  - {}", path.display());
        }
        panic!(
            "{} error schema(s) succeeded unexpectedly",
            unexpectedly_succeeded.len()
        );
    }
}

#[test]
fn e2e_raster_output_with_roots_and_scale() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let output_path = temp_dir.path().join("order.png");

    let mut args = args(&demos_dir().join("purchase-order.xsd"), &output_path);
    args.roots = vec!["purchaseOrder".to_string(), "USAddress".to_string()];
    args.scale = 2.0;
    args.alignment = Some("near".to_string());

    xsdiagram_cli::run(&args).expect("Raster export should succeed");
    let bytes = fs::read(&output_path).expect("Output should exist");
    assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
}

#[test]
fn e2e_oversized_output_with_yes() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "[export]\nlarge_image_threshold = 10\n")
        .expect("Failed to write config");
    let output_path = temp_dir.path().join("order");

    let mut args = args(&demos_dir().join("purchase-order.xsd"), &output_path);
    args.format = Some("jpeg".to_string());
    args.config = Some(config_path.to_string_lossy().to_string());
    args.yes = true;

    xsdiagram_cli::run(&args).expect("Confirmed export should succeed");
    let bytes = fs::read(output_path.with_extension("jpg")).expect("Output should exist");
    assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
}

#[test]
fn e2e_oversized_output_headless_without_yes() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "[export]\nlarge_image_threshold = 10\n")
        .expect("Failed to write config");
    let output_path = temp_dir.path().join("order.png");

    let status = Command::new(env!("CARGO_BIN_EXE_xsdiagram"))
        .arg(demos_dir().join("purchase-order.xsd"))
        .arg("--output")
        .arg(&output_path)
        .arg("--config")
        .arg(&config_path)
        .args(["--log-level", "off"])
        .stdin(Stdio::null())
        .status()
        .expect("Failed to start xsdiagram");

    assert!(status.success());
    let bytes = fs::read(&output_path).expect("Headless export should not be blocked");
    assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
}

#[test]
fn e2e_invalid_alignment_is_rejected() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let output_path = temp_dir.path().join("order.svg");

    let mut args = args(&demos_dir().join("purchase-order.xsd"), &output_path);
    args.alignment = Some("sideways".to_string());

    let err = xsdiagram_cli::run(&args).expect_err("Unknown alignment should fail");
    assert!(err.to_string().contains("unknown alignment"));
}
