use std::{fs, path::PathBuf};

use tempfile::tempdir;

use blockctx_cli::{Args, Command, NodeArgs, run};

/// Collects all .toml files from a directory
fn collect_documents(dir: PathBuf) -> Vec<PathBuf> {
    let mut files = if let Ok(entries) = fs::read_dir(&dir) {
        entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("toml")
            })
            .collect()
    } else {
        Vec::new()
    };

    files.sort();
    files
}

/// Demos are at workspace root, relative to workspace not the crate
fn demos_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("demos")
}

fn args(document: impl Into<String>, command: Command) -> Args {
    Args {
        document: document.into(),
        command,
        config: None,
        log_level: "off".to_string(),
    }
}

fn run_to_string(args: &Args) -> String {
    let mut out = Vec::new();
    run(args, &mut out).expect("command should succeed");
    String::from_utf8(out).unwrap()
}

fn block(id: u64) -> NodeArgs {
    NodeArgs {
        block: Some(id),
        diagram: 1,
    }
}

#[test]
fn e2e_smoke_test_valid_demos() {
    let valid_demos = collect_documents(demos_path());
    assert!(!valid_demos.is_empty(), "No demos found in demos/");

    let mut failed = Vec::new();
    for path in &valid_demos {
        let args = args(path.to_string_lossy(), Command::Check);
        let mut out = Vec::new();
        if let Err(e) = run(&args, &mut out) {
            failed.push((path.clone(), e));
        }
    }

    if !failed.is_empty() {
        eprintln!("\nValid demos that failed:");
        for (path, err) in &failed {
            eprintln!("  - {}: {}", path.display(), err);
        }
        panic!("{} valid demo(s) failed unexpectedly", failed.len());
    }
}

#[test]
fn e2e_smoke_test_error_demos() {
    let error_demos = collect_documents(demos_path().join("errors"));
    assert!(!error_demos.is_empty(), "No error demos found in demos/errors/");

    let unexpectedly_succeeded: Vec<_> = error_demos
        .iter()
        .filter(|path| {
            let mut out = Vec::new();
            run(&args(path.to_string_lossy(), Command::Check), &mut out).is_ok()
        })
        .collect();

    assert!(
        unexpectedly_succeeded.is_empty(),
        "Error demos that succeeded: {unexpectedly_succeeded:?}"
    );
}

#[test]
fn e2e_resolve_and_evaluate() {
    let plant = demos_path().join("plant.toml");
    let plant = plant.to_string_lossy();

    let resolved = run_to_string(&args(plant.clone(), Command::Resolve(block(11))));
    let lines: Vec<&str> = resolved.lines().collect();
    assert_eq!(lines[0], "Ts = 0.01");
    assert!(lines.contains(&"Ki = Kp / 2"));
    assert_eq!(lines.last(), Some(&"rate = 1 / Ts"));

    let evaluated = run_to_string(&args(plant, Command::Evaluate(block(11))));
    assert!(evaluated.contains("Kp = 4\n"));
    assert!(evaluated.contains("Ki = 2\n"));
    assert!(evaluated.contains("upper = 10\n"));
    assert!(evaluated.contains("label = \"PI controller\"\n"));
    assert!(evaluated.contains("rate = 100\n"));
}

#[test]
fn e2e_mask_and_wire() {
    let plant = demos_path().join("plant.toml");
    let plant = plant.to_string_lossy();

    let mask = run_to_string(&args(
        plant.clone(),
        Command::Mask {
            node: block(11),
            rows: Some(3),
            title: None,
        },
    ));
    let lines: Vec<&str> = mask.lines().collect();
    assert_eq!(lines[0], "# PI Controller");
    assert_eq!(lines[1], "Kd = 0  # Derivative gain");
    assert_eq!(lines.len(), 4);
    assert!(lines[3].starts_with("Ts = 0.01"));

    let wire = run_to_string(&args(plant, Command::Wire(block(11))));
    assert!(wire.contains("type = \"list\""));
    assert!(wire.contains("PI Controller"));

    let legacy = demos_path().join("legacy.toml");
    let legacy_mask = run_to_string(&args(
        legacy.to_string_lossy(),
        Command::Mask {
            node: block(2),
            rows: None,
            title: None,
        },
    ));
    assert_eq!(legacy_mask, "# Set block parameters\n");
}

#[test]
fn e2e_config_file() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "[resolution]\nmax_depth = 1\n").unwrap();

    let mut args = args(
        demos_path().join("plant.toml").to_string_lossy(),
        Command::Resolve(block(11)),
    );
    args.config = Some(config_path.to_string_lossy().to_string());

    let mut out = Vec::new();
    assert!(run(&args, &mut out).is_err());
}
