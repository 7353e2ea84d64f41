use std::fs;
use std::path::{Path, PathBuf};

fn rs_files(root: &Path) -> Vec<PathBuf> {
    if root.is_file() {
        return vec![root.to_path_buf()];
    }
    let mut out = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(_) => continue,
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else if path.extension().and_then(|s| s.to_str()) == Some("rs") {
                out.push(path);
            }
        }
    }
    out.sort();
    out
}

fn rel(path: &Path) -> String {
    let root = Path::new(env!("CARGO_MANIFEST_DIR"));
    let rel = path
        .strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .to_string();
    rel.replace('\\', "/")
}

fn violations_in(dir: &str, forbidden: &[&str]) -> Vec<String> {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join(dir);
    let mut violations = Vec::new();
    for file in rs_files(&root) {
        let content = fs::read_to_string(&file).unwrap_or_default();
        for needle in forbidden {
            if content.contains(needle) {
                violations.push(format!(
                    "{} imports forbidden dependency `{}`",
                    rel(&file),
                    needle
                ));
            }
        }
    }
    violations
}

#[test]
fn sampling_layer_is_terminal_free() {
    let violations = violations_in(
        "src/system",
        &["crate::ui", "crate::app", "ratatui", "crossterm"],
    );
    assert!(
        violations.is_empty(),
        "Sampling layer violations:\n{}",
        violations.join("\n")
    );
}

#[test]
fn formatter_is_pure() {
    let violations = violations_in("src/format.rs", &["crate::system", "crate::ui", "ratatui"]);
    assert!(
        violations.is_empty(),
        "Formatter violations:\n{}",
        violations.join("\n")
    );
}

#[test]
fn ui_reads_proc_only_through_sampling_layer() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("src/ui");
    let mut violations = Vec::new();

    for file in rs_files(&root) {
        let content = fs::read_to_string(&file).unwrap_or_default();
        for needle in ["std::fs", "crate::system::source"] {
            if content.contains(needle) {
                violations.push(format!("{} uses `{}` directly", rel(&file), needle));
            }
        }
    }

    assert!(
        violations.is_empty(),
        "UI/sampling boundary violations:\n{}",
        violations.join("\n")
    );
}
