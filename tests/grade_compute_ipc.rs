use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_classroomd");
    let mut child = Command::new(exe)
        .env("CLASSROOMD_LOAD_ON_START", "0")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn classroomd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
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

fn compute(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    absences: serde_json::Value,
    labs: [serde_json::Value; 3],
) -> serde_json::Value {
    let [lab1, lab2, lab3] = labs;
    request(
        stdin,
        reader,
        id,
        "grade.compute",
        json!({ "absences": absences, "lab1": lab1, "lab2": lab2, "lab3": lab3 }),
    )
}

#[test]
fn compute_returns_view_remark_and_metrics() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let res = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "grade.compute",
        json!({ "absences": "0", "lab1": "100", "lab2": "100", "lab3": "100" }),
    );
    assert_eq!(res["view"]["attendance"], json!("100%"));
    assert_eq!(res["view"]["labAverage"], json!("100"));
    assert_eq!(res["view"]["classStanding"], json!("100"));
    assert_eq!(res["view"]["requiredPass"], json!("64"));
    assert_eq!(res["view"]["requiredExcel"], json!("100"));
    assert_eq!(res["remark"]["category"], json!("passingAchievable"));
    assert_eq!(res["remark"]["excel"]["kind"], json!("achievable"));
    assert_eq!(res["remark"]["title"], json!("You Can Pass!"));
    let pass = res["metrics"]["requiredPassScore"].as_f64().expect("pass score");
    assert!((pass - 45.0 / 0.70).abs() < 1e-9);

    // Numbers are accepted as well as text.
    let res = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "grade.compute",
        json!({ "absences": 3, "lab1": 0, "lab2": 0.0, "lab3": "0" }),
    );
    assert_eq!(res["view"]["attendance"], json!("70%"));
    assert_eq!(res["view"]["classStanding"], json!("28"));
    assert_eq!(res["view"]["requiredPass"], json!("95"));
    assert_eq!(res["view"]["requiredExcel"], json!("Not Possible"));
    assert_eq!(res["remark"]["excel"]["kind"], json!("notAchievable"));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn four_absences_is_automatic_failure_with_placeholders() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let res = compute(
        &mut stdin,
        &mut reader,
        "1",
        json!("4"),
        [json!("100"), json!("100"), json!("100")],
    );
    let result = &res["result"];
    assert_eq!(result["metrics"], serde_json::Value::Null);
    assert_eq!(result["view"]["attendance"], json!("FAIL"));
    assert_eq!(result["view"]["requiredPass"], json!("—"));
    assert_eq!(result["remark"]["category"], json!("automaticFailure"));
    assert_eq!(result["remark"]["absences"], json!(4));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn validation_errors_keep_previous_result() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let first = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "grade.compute",
        json!({ "absences": "0", "lab1": "0", "lab2": "0", "lab3": "0" }),
    );
    assert_eq!(first["view"]["requiredPass"], json!("90"));

    let bad_abs = compute(
        &mut stdin,
        &mut reader,
        "2",
        json!("5"),
        [json!("0"), json!("0"), json!("0")],
    );
    assert_eq!(error_code(&bad_abs), "invalid_absences");
    assert_eq!(bad_abs["error"]["details"]["field"], json!("absences"));

    let bad_lab = compute(
        &mut stdin,
        &mut reader,
        "3",
        json!("1"),
        [json!("50"), json!("101"), json!("50")],
    );
    assert_eq!(error_code(&bad_lab), "invalid_lab_score");
    assert_eq!(bad_lab["error"]["details"]["field"], json!("lab2"));

    let missing = request(&mut stdin, &mut reader, "4", "grade.compute", json!({}));
    assert_eq!(error_code(&missing), "invalid_absences");

    let current = request_ok(&mut stdin, &mut reader, "5", "grade.current", json!({}));
    assert_eq!(current["result"], first);

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn reset_clears_current_result() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let empty = request_ok(&mut stdin, &mut reader, "1", "grade.current", json!({}));
    assert_eq!(empty["result"], serde_json::Value::Null);

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "grade.compute",
        json!({ "absences": "2", "lab1": "88", "lab2": "91", "lab3": "79" }),
    );
    let health = request_ok(&mut stdin, &mut reader, "3", "health", json!({}));
    assert_eq!(health["hasGradeResult"], json!(true));

    let reset = request_ok(&mut stdin, &mut reader, "4", "grade.reset", json!({}));
    assert_eq!(reset["result"], serde_json::Value::Null);
    let after = request_ok(&mut stdin, &mut reader, "5", "grade.current", json!({}));
    assert_eq!(after["result"], serde_json::Value::Null);

    drop(stdin);
    let _ = child.wait();
}
