use std::path::Path;
use std::process::{Command, Output};

const LIB_V1: &str = "/// Adds two numbers.\npub fn add(a: i32, b: i32) -> i32 {\n    a + b\n}\n\npub fn unused() {}\n";

const DOC: &str = "# API\n\n<!-- docsync:start id=\"11111111-1111-4111-8111-111111111111\" code_ref=\"src/lib.rs#add\" -->\nAdds two `i32` values.\n<!-- docsync:end id=\"11111111-1111-4111-8111-111111111111\" -->\n\nFooter stays.\n";

fn docsync(root: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_docsync"))
        .current_dir(root)
        .args(args)
        .env_remove("DOCSYNC_LOG")
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

fn read(root: &Path, rel: &str) -> String {
    std::fs::read_to_string(root.join(rel)).unwrap()
}

/// A project with one documented function, already initialized.
fn initialized_project() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "src/lib.rs", LIB_V1);
    write(dir.path(), "docs/api.md", DOC);
    let init = docsync(dir.path(), &["init"]);
    assert!(init.status.success(), "init failed: {}", stderr(&init));
    dir
}

#[test]
fn init_then_check_passes() {
    let dir = initialized_project();

    assert!(dir.path().join(".docsync.toml").exists(), "config not scaffolded");
    let map: serde_json::Value = serde_json::from_str(&read(dir.path(), ".docsync/map.json")).unwrap();
    assert_eq!(map["version"], "1.0.0");
    assert_eq!(map["entries"][0]["id"], "11111111-1111-4111-8111-111111111111");
    assert_eq!(map["entries"][0]["codeRef"]["symbolName"], "add");
    assert_eq!(map["entries"][0]["docRef"]["filePath"], "docs/api.md");

    let check = docsync(dir.path(), &["check"]);
    assert!(check.status.success(), "check failed: {}", stdout(&check));
    assert!(stdout(&check).contains("All 1 anchors fresh"));
}

#[test]
fn body_and_comment_edits_are_not_drift() {
    let dir = initialized_project();
    write(
        dir.path(),
        "src/lib.rs",
        "// Reworded comment.\npub fn add(a: i32, b: i32) -> i32 {\n    b + a // commutative\n}\n\npub fn unused() {}\n",
    );

    let check = docsync(dir.path(), &["check"]);
    assert!(check.status.success(), "unexpected drift: {}", stdout(&check));
}

#[test]
fn signature_change_drifts_and_fix_repairs_it() {
    let dir = initialized_project();
    write(dir.path(), "src/lib.rs", "pub fn add(a: i64, b: i64) -> i64 {\n    a + b\n}\n\npub fn unused() {}\n");

    let check = docsync(dir.path(), &["check"]);
    assert_eq!(check.status.code(), Some(1));
    assert!(stdout(&check).contains("DRIFT   src/lib.rs#add (docs/api.md)"));

    let fix = docsync(dir.path(), &["fix", "--no-ai"]);
    assert!(fix.status.success(), "fix failed: {}{}", stdout(&fix), stderr(&fix));
    assert!(stdout(&fix).contains("1 fixed, 0 failed (of 1), 1 drifted, 0 missing"));

    let doc = read(dir.path(), "docs/api.md");
    assert!(doc.starts_with("# API\n\n<!-- docsync:start id=\"11111111-1111-4111-8111-111111111111\""));
    assert!(doc.contains("```rust\npub fn add(a: i64, b: i64) -> i64\n```"));
    assert!(doc.ends_with("<!-- docsync:end id=\"11111111-1111-4111-8111-111111111111\" -->\n\nFooter stays.\n"));
    assert!(!doc.contains("Adds two `i32` values."));

    let recheck = docsync(dir.path(), &["check"]);
    assert!(recheck.status.success(), "still drifted: {}", stdout(&recheck));

    // A second run has nothing to do and touches nothing.
    let map_before = read(dir.path(), ".docsync/map.json");
    let again = docsync(dir.path(), &["fix", "--no-ai"]);
    assert!(again.status.success());
    assert!(stdout(&again).contains("Nothing to fix"));
    assert_eq!(read(dir.path(), "docs/api.md"), doc);
    assert_eq!(read(dir.path(), ".docsync/map.json"), map_before);
}

#[test]
fn dry_run_fix_changes_nothing() {
    let dir = initialized_project();
    write(dir.path(), "src/lib.rs", "pub fn add(a: u8, b: u8) -> u8 {\n    a + b\n}\n");
    let map_before = read(dir.path(), ".docsync/map.json");

    let fix = docsync(dir.path(), &["fix", "--no-ai", "--dry-run"]);

    assert!(fix.status.success());
    assert!(stdout(&fix).contains("PREVIEW src/lib.rs#add"));
    assert_eq!(read(dir.path(), "docs/api.md"), DOC);
    assert_eq!(read(dir.path(), ".docsync/map.json"), map_before);
    assert_eq!(docsync(dir.path(), &["check"]).status.code(), Some(1));
}

#[cfg(unix)]
#[test]
fn configured_generator_output_is_injected() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "src/lib.rs", LIB_V1);
    write(dir.path(), "docs/api.md", DOC);
    write(
        dir.path(),
        ".docsync.toml",
        "[generator]\ncommand = [\"sh\", \"-c\", \"cat > /dev/null; echo 'Adds two wide integers.'\"]\n",
    );
    assert!(docsync(dir.path(), &["init"]).status.success());
    write(dir.path(), "src/lib.rs", "pub fn add(a: i128, b: i128) -> i128 {\n    a + b\n}\n");

    let fix = docsync(dir.path(), &["fix"]);

    assert!(fix.status.success(), "fix failed: {}", stderr(&fix));
    assert!(stdout(&fix).contains("(generated)"));
    assert!(read(dir.path(), "docs/api.md").contains("-->\nAdds two wide integers.\n<!-- docsync:end"));
}

#[cfg(unix)]
#[test]
fn generator_request_carries_project_context() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "Cargo.toml", "[package]\nname = \"calc\"\nversion = \"0.3.0\"\n");
    write(dir.path(), "src/lib.rs", LIB_V1);
    write(dir.path(), "src/main.rs", "mod lib;\nfn main() {}\n");
    write(dir.path(), "docs/api.md", DOC);
    write(
        dir.path(),
        ".docsync.toml",
        "[generator]\ncommand = [\"sh\", \"-c\", \"cat > request.json; echo 'Adds.'\"]\n",
    );
    assert!(docsync(dir.path(), &["init"]).status.success());
    write(dir.path(), "src/lib.rs", "pub fn add(a: u16, b: u16) -> u16 {\n    a + b\n}\n");

    let fix = docsync(dir.path(), &["fix"]);

    assert!(fix.status.success(), "fix failed: {}", stderr(&fix));
    let request: serde_json::Value = serde_json::from_str(&read(dir.path(), "request.json")).unwrap();
    assert_eq!(request["symbolName"], "add");
    assert_eq!(request["context"]["path"], "src/lib.rs");
    assert_eq!(request["context"]["importedBy"][0], "src/main.rs");
    assert_eq!(request["context"]["package"]["name"], "calc");
    assert_eq!(request["context"]["package"]["version"], "0.3.0");
}

#[cfg(unix)]
#[test]
fn failing_generator_falls_back_to_placeholder() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "src/lib.rs", LIB_V1);
    write(dir.path(), "docs/api.md", DOC);
    write(dir.path(), ".docsync.toml", "[generator]\ncommand = [\"sh\", \"-c\", \"exit 1\"]\n");
    assert!(docsync(dir.path(), &["init"]).status.success());
    write(dir.path(), "src/lib.rs", "pub fn add(a: f64, b: f64) -> f64 {\n    a + b\n}\n");

    let fix = docsync(dir.path(), &["fix"]);

    assert!(fix.status.success());
    assert!(stdout(&fix).contains("(placeholder)"));
    assert!(read(dir.path(), "docs/api.md").contains("pub fn add(a: f64, b: f64) -> f64"));
}

#[test]
fn check_without_map_explains_how_to_init() {
    let dir = tempfile::tempdir().unwrap();

    let check = docsync(dir.path(), &["check"]);

    assert_eq!(check.status.code(), Some(1));
    assert!(stderr(&check).contains("Anchor Map Not Found"));
    assert!(stderr(&check).contains("docsync init"));
}

#[test]
fn track_appends_block_and_entry() {
    let dir = initialized_project();

    let track = docsync(dir.path(), &["track", "docs/more.md", "src/lib.rs#unused"]);
    assert!(track.status.success(), "track failed: {}", stderr(&track));

    let doc = read(dir.path(), "docs/more.md");
    assert!(doc.contains("code_ref=\"src/lib.rs#unused\""));
    assert!(doc.contains("pub fn unused()"));
    let map: serde_json::Value = serde_json::from_str(&read(dir.path(), ".docsync/map.json")).unwrap();
    assert_eq!(map["entries"].as_array().unwrap().len(), 2);
    assert!(docsync(dir.path(), &["check"]).status.success());

    let unknown = docsync(dir.path(), &["track", "docs/more.md", "src/lib.rs#ad"]);
    assert_eq!(unknown.status.code(), Some(1));
    assert!(stderr(&unknown).contains("Symbol Not Found"));
}

#[test]
fn prune_removes_entries_for_deleted_symbols() {
    let dir = initialized_project();
    write(dir.path(), "src/lib.rs", "pub fn unused() {}\n");

    let status = docsync(dir.path(), &["status"]);
    assert!(status.status.success());
    assert!(stdout(&status).contains("MISSING src/lib.rs#add (symbol not found)"));

    let preview = docsync(dir.path(), &["prune", "--dry-run"]);
    assert!(stdout(&preview).contains("would be pruned"));
    assert!(read(dir.path(), ".docsync/map.json").contains("\"add\""));

    let prune = docsync(dir.path(), &["prune"]);
    assert!(prune.status.success());
    assert!(stdout(&prune).contains("Pruned 1 entries"));
    assert!(docsync(dir.path(), &["check"]).status.success());
}

#[test]
fn duplicate_anchor_ids_track_only_the_first_block() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "src/lib.rs", LIB_V1);
    let duplicated = format!("{DOC}\n<!-- docsync:start id=\"11111111-1111-4111-8111-111111111111\" code_ref=\"src/lib.rs#unused\" -->\nSecond.\n<!-- docsync:end id=\"11111111-1111-4111-8111-111111111111\" -->\n");
    write(dir.path(), "docs/api.md", &duplicated);

    let init = docsync(dir.path(), &["init"]);

    assert!(init.status.success());
    assert!(stderr(&init).contains("duplicate anchor id"));
    let map: serde_json::Value = serde_json::from_str(&read(dir.path(), ".docsync/map.json")).unwrap();
    let entries = map["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["codeRef"]["symbolName"], "add");
}

#[test]
fn project_root_flag_selects_directory() {
    let dir = initialized_project();
    let elsewhere = tempfile::tempdir().unwrap();

    let check = docsync(elsewhere.path(), &["-C", dir.path().to_str().unwrap(), "check"]);

    assert!(check.status.success(), "check failed: {}", stderr(&check));
}
