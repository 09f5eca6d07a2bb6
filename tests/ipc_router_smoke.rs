use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

struct Sidecar {
    child: Child,
    reader: BufReader<TcpStream>,
    writer: TcpStream,
}

impl Drop for Sidecar {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

fn spawn_sidecar(store: &Path, reports_dir: &Path) -> Sidecar {
    let exe = env!("CARGO_BIN_EXE_assessd");
    let mut child = Command::new(exe)
        .arg("--port")
        .arg("0")
        .arg("--store")
        .arg(store)
        .arg("--reports-dir")
        .arg(reports_dir)
        .env_remove("ASSESSD_CONFIG")
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn assessd");
    let stdout = child.stdout.take().expect("child stdout");
    let mut banner = String::new();
    BufReader::new(stdout)
        .read_line(&mut banner)
        .expect("read banner");
    let addr = banner
        .trim()
        .strip_prefix("assessd listening on ")
        .expect("listen banner")
        .to_string();
    let writer = TcpStream::connect(&addr).expect("connect");
    let reader = BufReader::new(writer.try_clone().expect("clone stream"));
    Sidecar {
        child,
        reader,
        writer,
    }
}

fn request(sc: &mut Sidecar, id: &str, method: &str, params: serde_json::Value) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(sc.writer, "{}", payload).expect("write request");
    sc.writer.flush().expect("flush request");

    let mut line = String::new();
    sc.reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(sc: &mut Sidecar, id: &str, method: &str, params: serde_json::Value) -> serde_json::Value {
    let value = request(sc, id, method, params);
    assert_eq!(
        value.get("ok").and_then(|v| v.as_bool()),
        Some(true),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn error_code(value: &serde_json::Value) -> &str {
    value
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
        .unwrap_or("")
}

const RECORDS: &str = "Student_ID,Name,Surname,Course,Mode,Module,Title,Supervisor,Marks,Comment\n\
1001,Ada,Lovelace,Computing,Full-time,Analytical Engines,Notes on the Engine,Dr Babbage,,\n\
1002,Alan,Turing,Mathematics,Part-time,Computability,On Computable Numbers,Dr Church,72.5,Strong work\n\
0042,Grace,Hopper,Computing,Full-time,Compilers,A-0 System,Dr Aiken,,\n";

#[test]
fn router_dispatch_smoke_covers_handler_families() {
    let workspace = temp_dir("assessd-router-smoke");
    let store = workspace.join("records.csv");
    std::fs::write(&store, RECORDS).expect("write records");
    let mut sc = spawn_sidecar(&store, &workspace.join("reports"));

    let health = request_ok(&mut sc, "1", "health", json!({}));
    assert!(health.get("version").and_then(|v| v.as_str()).is_some());
    assert!(!health["sessionId"].as_str().unwrap_or("").is_empty());

    let check = request_ok(&mut sc, "2", "store.check", json!({}));
    assert_eq!(check["readable"], json!(true));
    assert_eq!(check["rowCount"], json!(3));
    assert_eq!(check["idColumn"], json!("Student_ID"));

    let rubric = request_ok(&mut sc, "3", "rubric.get", json!({}));
    let weights: u64 = rubric["criteria"]
        .as_array()
        .expect("criteria")
        .iter()
        .map(|c| c["weight"].as_u64().unwrap_or(0))
        .sum();
    assert_eq!(weights, 100);
    assert_eq!(rubric["bands"].as_array().map(|b| b.len()), Some(7));
    assert_eq!(rubric["minCommentWords"], json!(15));

    let list = request_ok(&mut sc, "4", "students.list", json!({}));
    assert_eq!(list["studentIds"], json!(["1001", "1002", "0042"]));

    let _ = request_ok(&mut sc, "5", "students.select", json!({ "studentId": "1001" }));
    let _ = request_ok(
        &mut sc,
        "6",
        "form.setField",
        json!({ "field": "assessorName", "value": "Dr Menabrea" }),
    );
    let _ = request_ok(
        &mut sc,
        "7",
        "criteria.setBand",
        json!({ "criterion": "research", "band": "B" }),
    );
    let _ = request_ok(
        &mut sc,
        "8",
        "criteria.setScore",
        json!({ "criterion": "research", "score": 66 }),
    );
    let _ = request_ok(&mut sc, "9", "criteria.clear", json!({ "criterion": "research" }));
    let _ = request_ok(&mut sc, "10", "comment.set", json!({ "text": "fine" }));
    let _ = request_ok(&mut sc, "11", "comment.optIn", json!({ "enabled": false }));
    let _ = request_ok(&mut sc, "12", "assessment.status", json!({}));

    let gen = request(&mut sc, "13", "assessment.generate", json!({}));
    assert_eq!(gen["ok"], json!(false));
    assert_eq!(error_code(&gen), "validation_failed");

    let _ = request_ok(&mut sc, "14", "assessment.reset", json!({}));

    let unknown = request(&mut sc, "15", "grades.explode", json!({}));
    assert_eq!(error_code(&unknown), "not_implemented");
}

#[test]
fn malformed_lines_and_params_get_error_envelopes() {
    let workspace = temp_dir("assessd-router-errors");
    let store = workspace.join("records.csv");
    std::fs::write(&store, RECORDS).expect("write records");
    let mut sc = spawn_sidecar(&store, &workspace.join("reports"));

    writeln!(sc.writer, "{{not json").expect("write garbage");
    sc.writer.flush().expect("flush");
    let mut line = String::new();
    sc.reader.read_line(&mut line).expect("read bad_json response");
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse");
    assert_eq!(value["ok"], json!(false));
    assert_eq!(error_code(&value), "bad_json");

    let bad_band = request(
        &mut sc,
        "1",
        "criteria.setBand",
        json!({ "criterion": "research", "band": "Z" }),
    );
    assert_eq!(error_code(&bad_band), "bad_params");

    let bad_criterion = request(
        &mut sc,
        "2",
        "criteria.setBand",
        json!({ "criterion": "charisma", "band": "A" }),
    );
    assert_eq!(error_code(&bad_criterion), "bad_params");

    let out_of_range = request(
        &mut sc,
        "3",
        "criteria.setScore",
        json!({ "criterion": "research", "score": 101 }),
    );
    assert_eq!(error_code(&out_of_range), "bad_params");

    let fractional = request(
        &mut sc,
        "3b",
        "criteria.setScore",
        json!({ "criterion": "research", "score": 45.0 }),
    );
    assert_eq!(error_code(&fractional), "bad_params");
    assert_eq!(
        fractional["error"]["message"],
        json!("score must be an integer between 0 and 100")
    );

    let _ = request_ok(
        &mut sc,
        "4",
        "criteria.setBand",
        json!({ "criterion": "research", "band": "C" }),
    );
    let outside_band = request(
        &mut sc,
        "5",
        "criteria.setScore",
        json!({ "criterion": "research", "score": 75 }),
    );
    assert_eq!(error_code(&outside_band), "validation_failed");

    let bad_field = request(
        &mut sc,
        "6",
        "form.setField",
        json!({ "field": "shoeSize", "value": "9" }),
    );
    assert_eq!(error_code(&bad_field), "bad_params");

    // The connection survives every error above.
    let _ = request_ok(&mut sc, "7", "health", json!({}));
}

#[test]
fn missing_store_is_reported_not_fatal() {
    let workspace = temp_dir("assessd-router-nostore");
    let mut sc = spawn_sidecar(&workspace.join("absent.csv"), &workspace.join("reports"));

    let check = request_ok(&mut sc, "1", "store.check", json!({}));
    assert_eq!(check["exists"], json!(false));
    assert_eq!(check["readable"], json!(false));

    let list = request(&mut sc, "2", "students.list", json!({}));
    assert_eq!(error_code(&list), "io_failed");
}
