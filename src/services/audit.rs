use std::path::Path;

/// Append a record of a chain-mutating operation to the state dir's audit
/// log. Best effort: auditing never fails the operation itself.
pub fn audit(state_dir: &Path, action: &str, data: serde_json::Value) {
    let path = state_dir.join("audit.jsonl");
    let event = serde_json::json!({
        "ts": unix_now(),
        "action": action,
        "data": data
    });
    let line = format!("{}\n", event);
    let _ = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .and_then(|mut f| std::io::Write::write_all(&mut f, line.as_bytes()));
}

fn unix_now() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    ts.to_string()
}
