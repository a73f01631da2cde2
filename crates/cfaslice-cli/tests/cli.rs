use assert_cmd::Command;
use cfaslice_core::{instructions::ComparePredicate, save_module, ModuleBuilder, Type};
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

/// `main` stores one of two handlers in a slot and calls through it.
fn write_image(dir: &TempDir) -> PathBuf {
    let mut mb = ModuleBuilder::new("handlers");
    let on_read = mb.declare_function("on_read", vec![], Type::Void);
    let on_write = mb.declare_function("on_write", vec![], Type::Void);
    let on_read = mb.function_value(on_read);
    let on_write = mb.function_value(on_write);

    let mut f = mb.function("main", vec![Type::Int(32)], Type::Int(32));
    let kind = f.name_param(0, "kind");
    let zero = f.const_int(0, 32);
    let entry = f.block("entry");
    let mut b = f.at(entry);
    let slot = b.alloca(Type::Ptr);
    b.named(slot, "slot");
    let is_read = b.compare(ComparePredicate::Eq, kind, zero);
    let chosen = b.select(is_read, on_read, on_write);
    b.named(chosen, "chosen");
    b.store(chosen, slot);
    let handler = b.load(Type::Ptr, slot);
    b.named(handler, "handler");
    b.call_typed(Type::Void, handler, vec![]);
    b.ret(kind);
    f.finish();

    let path = dir.path().join("handlers.json");
    save_module(&mb.build().unwrap(), &path).unwrap();
    path
}

fn cfaslice() -> Command {
    let mut cmd = Command::cargo_bin("cfaslice").unwrap();
    cmd.env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_cfa_prints_resolved_targets() {
    let dir = TempDir::new().unwrap();
    let image = write_image(&dir);

    cfaslice()
        .args(["cfa", "--sequential", "--print"])
        .arg(&image)
        .assert()
        .success()
        .stdout(predicate::str::contains("3 function(s)"))
        .stdout(predicate::str::contains("Sequential mode"))
        .stdout(predicate::str::contains("{%slot, @on_read, @on_write}"))
        .stdout(predicate::str::contains("Analysis time:"));
}

#[test]
fn test_cfa_json_output() {
    let dir = TempDir::new().unwrap();
    let image = write_image(&dir);

    let output = cfaslice()
        .args(["cfa", "--threads", "2", "--json"])
        .arg(&image)
        .output()
        .unwrap();
    assert!(output.status.success());

    let entries: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let entries = entries.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["function"], "main");
    assert_eq!(
        entries[0]["targets"],
        serde_json::json!(["%slot", "@on_read", "@on_write"])
    );
}

#[test]
fn test_cfa_stats_report_every_worker() {
    let dir = TempDir::new().unwrap();
    let image = write_image(&dir);

    cfaslice()
        .args(["cfa", "--threads", "3", "--stats"])
        .arg(&image)
        .assert()
        .success()
        .stdout(predicate::str::contains("Concurrent mode (3 threads)"))
        .stdout(predicate::str::contains("Thread 2\ttime:"));
}

#[test]
fn test_cfa_writes_timing_table() {
    let dir = TempDir::new().unwrap();
    let image = write_image(&dir);
    let csv = dir.path().join("timings.csv");

    cfaslice()
        .args(["cfa", "--sequential", "--runs", "2", "--csv"])
        .arg(&csv)
        .arg(&image)
        .assert()
        .success();

    let table = std::fs::read_to_string(&csv).unwrap();
    let lines: Vec<_> = table.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], "name,size,inum,time(us)");
    assert!(lines[1].starts_with("main,1,7,"));
}

#[test]
fn test_csv_needs_sequential_mode() {
    let dir = TempDir::new().unwrap();
    let image = write_image(&dir);

    cfaslice()
        .args(["cfa", "--csv", "out.csv"])
        .arg(&image)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--sequential"));
}

#[test]
fn test_missing_input_fails() {
    cfaslice()
        .args(["cfa", "/nonexistent/program.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot load program image"));
}

#[test]
fn test_missing_entry_fails() {
    let dir = TempDir::new().unwrap();
    let image = write_image(&dir);

    cfaslice()
        .args(["cfa", "--entry", "start"])
        .arg(&image)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Function not found: start"));
}

#[test]
fn test_slice_point_marks_the_dump() {
    let dir = TempDir::new().unwrap();
    let image = write_image(&dir);

    cfaslice()
        .args(["slice", "--function", "main", "--seed", "handler"])
        .arg(&image)
        .assert()
        .success()
        .stdout(predicate::str::contains("Slice of %handler in @main"))
        .stdout(predicate::str::contains("%handler = load ptr, ptr %slot\t[slice]"))
        .stdout(predicate::str::contains("\t[slice]").count(2));
}

#[test]
fn test_whole_module_slicing() {
    let dir = TempDir::new().unwrap();
    let image = write_image(&dir);

    cfaslice()
        .args(["slice", "--sequential", "--print", "--stats"])
        .arg(&image)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 seed(s)"))
        .stdout(predicate::str::contains("%slot in @main (Forward)"))
        .stdout(predicate::str::contains("values in slice"));
}

#[test]
fn test_unknown_seed_fails() {
    let dir = TempDir::new().unwrap();
    let image = write_image(&dir);

    cfaslice()
        .args(["slice", "--function", "main", "--seed", "nope"])
        .arg(&image)
        .assert()
        .failure();
}

#[test]
fn test_inspect_lists_functions() {
    let dir = TempDir::new().unwrap();
    let image = write_image(&dir);

    cfaslice()
        .args(["inspect"])
        .arg(&image)
        .assert()
        .success()
        .stdout(predicate::str::contains("@on_read (declaration)"))
        .stdout(predicate::str::contains(
            "@main: 1 block(s), 7 instruction(s), 1 call(s)",
        ));
}

#[test]
fn test_inspect_rejects_garbage() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.json");
    std::fs::write(&path, "[1, 2, 3]").unwrap();

    cfaslice().arg("inspect").arg(&path).assert().failure();
}
