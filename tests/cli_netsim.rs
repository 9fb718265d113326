use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "routesim-rs-{prefix}-{}-{nanos}",
        std::process::id()
    ));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn write_file(dir: &PathBuf, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write temp file");
    path
}

fn netsim(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_netsim"))
        .args(args)
        .output()
        .expect("run netsim")
}

const TRIANGLE: &str = r#"
{
    "endTime": 100,
    "clientSendRate": 10,
    "routers": ["A", "B", "C"],
    "clients": ["a", "c"],
    "links": [
        ["a", "A", 1], ["A", "B", 1], ["B", "C", 1], ["A", "C", 5], ["C", "c", 1]
    ],
    "correctRoutes": [
        ["a", "A", "B", "C", "c"],
        ["c", "C", "B", "A", "a"]
    ]
}
"#;

#[test]
fn netsim_prints_correct_routes_for_each_protocol() {
    let dir = unique_temp_dir("netsim-triangle");
    let network = write_file(&dir, "triangle.json", TRIANGLE);

    for protocol in ["dv", "LS"] {
        let output = netsim(&[network.to_str().unwrap(), protocol]);
        assert!(
            output.status.success(),
            "netsim {protocol} failed: stderr={}",
            String::from_utf8_lossy(&output.stderr)
        );

        let stdout = String::from_utf8_lossy(&output.stdout);
        let lines: Vec<&str> = stdout.lines().collect();
        assert_eq!(lines.first(), Some(&""), "stdout={stdout}");
        assert!(lines.contains(&"a -> c: [a, A, B, C, c]"), "stdout={stdout}");
        assert!(lines.contains(&"c -> a: [c, C, B, A, a]"), "stdout={stdout}");
        assert!(lines.contains(&"ALL ROUTES CORRECT!"), "stdout={stdout}");

        let done = lines.last().expect("summary line");
        assert!(done.starts_with("done @ 14000ms"), "summary={done}");
        assert!(done.contains(&format!("protocol={}", protocol.to_lowercase())), "summary={done}");
        assert!(done.contains("converged=true"), "summary={done}");
    }

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn netsim_mirror_is_default_and_reports_no_routes() {
    let dir = unique_temp_dir("netsim-mirror");
    let network = write_file(&dir, "triangle.json", TRIANGLE);

    let output = netsim(&[network.to_str().unwrap(), "--until-ms", "2000"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(!stdout.contains("ALL ROUTES CORRECT!"), "stdout={stdout}");
    assert!(!stdout.contains(" -> "), "stdout={stdout}");
    assert!(stdout.contains("done @ 6000ms, protocol=mirror"), "stdout={stdout}");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn netsim_dump_tables_lists_every_router() {
    let dir = unique_temp_dir("netsim-dump");
    let network = write_file(&dir, "triangle.json", TRIANGLE);

    let output = netsim(&[network.to_str().unwrap(), "dv", "--dump-tables"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    for header in ["A (dv):", "B (dv):", "C (dv):"] {
        assert!(stdout.lines().any(|l| l == header), "missing {header}: {stdout}");
    }
    assert!(stdout.contains("  c cost=3 via B (p2)"), "stdout={stdout}");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn netsim_rejects_bad_input() {
    let dir = unique_temp_dir("netsim-bad");
    let broken = write_file(
        &dir,
        "broken.json",
        r#"{ "endTime": 10, "clientSendRate": 1, "routers": ["A"], "links": [["A", "Q", 1]] }"#,
    );

    let output = netsim(&[broken.to_str().unwrap(), "dv"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown node Q"), "stderr={stderr}");

    let missing = dir.join("nope.json");
    let output = netsim(&[missing.to_str().unwrap(), "ls"]);
    assert!(!output.status.success());

    let output = netsim(&[broken.to_str().unwrap(), "ospf"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ospf"), "stderr={stderr}");

    let _ = fs::remove_dir_all(&dir);
}
