use serde_json::json;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
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

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_examseatd");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn examseatd");
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

#[test]
fn signing_sheets_pack_one_roster_per_classroom() {
    let workspace = temp_dir("examseat-sign");
    let out_dir = temp_dir("examseat-sign-out");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    // Seven students in one department: six rows fill Room 101's column A,
    // the seventh opens Room 102.
    let names = ["Aa", "Bb", "Cc", "Dd", "Ee", "Ff", "Gg"];
    let rows: Vec<serde_json::Value> = (1..=7)
        .map(|i| {
            json!({
                "Student": format!("Kavya {} 21CS00{}", names[i - 1], i),
                "Branch Name": "CS",
                "Course": "Data Structures",
                "Exam Date": "2024-05-02",
                "Session": "Afternoon"
            })
        })
        .collect();
    let resp = request(
        &mut stdin,
        &mut reader,
        "2",
        "allocation.upload",
        json!({ "rows": rows }),
    );
    assert_eq!(resp.get("ok").and_then(|v| v.as_bool()), Some(true), "{resp}");
    assert_eq!(
        resp.get("result")
            .and_then(|r| r.get("newRecords"))
            .and_then(|v| v.as_u64()),
        Some(7)
    );

    let resp = request(
        &mut stdin,
        &mut reader,
        "3",
        "reports.signingSheets",
        json!({
            "examDate": "2024-05-02",
            "session": "Forenoon",
            "outPath": out_dir.join("wrong.zip").to_string_lossy()
        }),
    );
    assert_eq!(
        resp.get("error")
            .and_then(|e| e.get("code"))
            .and_then(|v| v.as_str()),
        Some("not_found")
    );

    let archive_path = out_dir.join("signing-sheets.zip");
    let resp = request(
        &mut stdin,
        &mut reader,
        "4",
        "reports.signingSheets",
        json!({
            "examDate": "2024-05-02",
            "session": "Afternoon",
            "outPath": archive_path.to_string_lossy()
        }),
    );
    assert_eq!(resp.get("ok").and_then(|v| v.as_bool()), Some(true), "{resp}");
    assert_eq!(
        resp.get("result")
            .and_then(|r| r.get("entryCount"))
            .and_then(|v| v.as_u64()),
        Some(2)
    );

    let f = std::fs::File::open(&archive_path).expect("open archive");
    let mut archive = zip::ZipArchive::new(f).expect("open zip archive");
    let mut room_101 = String::new();
    archive
        .by_name("Room_101_signing_sheet.txt")
        .expect("room 101 entry")
        .read_to_string(&mut room_101)
        .expect("read room 101 roster");
    assert!(room_101.starts_with("SIGNING SHEET  2024-05-02  Afternoon  Room 101\n"));
    assert!(room_101.contains("Register No"));
    assert!(room_101.contains("21CS001"));
    assert!(room_101.contains("Kavya Aa"));
    assert!(room_101.contains("____"));
    // Seat order within the roster.
    let a1 = room_101.find("A1").expect("seat A1");
    let a6 = room_101.find("A6").expect("seat A6");
    assert!(a1 < a6);

    let mut room_102 = String::new();
    archive
        .by_name("Room_102_signing_sheet.txt")
        .expect("room 102 entry")
        .read_to_string(&mut room_102)
        .expect("read room 102 roster");
    assert!(room_102.contains("21CS007"));
    assert!(!room_102.contains("21CS006"));

    // Scratch files are request-scoped and cleaned after packaging.
    let scratch_root = workspace.join("scratch");
    if scratch_root.exists() {
        let leftovers: Vec<_> = std::fs::read_dir(&scratch_root)
            .expect("read scratch root")
            .collect();
        assert!(leftovers.is_empty(), "scratch not cleaned: {:?}", leftovers);
    }

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
    let _ = std::fs::remove_dir_all(out_dir);
}
