use std::fs;
use std::path::PathBuf;
use std::process::Command;

use serde_json::Value;

fn cli() -> Command {
    Command::new(env!("CARGO_BIN_EXE_danger_cli"))
}

/// Fresh scratch directory for one test
fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "danger_cli_{}_{}",
        name,
        std::process::id()
    ));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}

/// 8 kHz, 1-second windows keep the CLI runs short
fn write_small_config(dir: &std::path::Path) -> String {
    let path = dir.join("config.json");
    fs::write(
        &path,
        r#"{ "analysis": { "sample_rate": 8000, "window_seconds": 1 } }"#,
    )
    .expect("write config");
    path.to_string_lossy().into_owned()
}

fn synth(args: &[&str]) {
    let output = cli()
        .arg("synth")
        .args(args)
        .output()
        .expect("failed to run danger_cli synth");
    assert!(
        output.status.success(),
        "synth exited with {:?}: {}",
        output.status.code(),
        String::from_utf8_lossy(&output.stderr)
    );
}

fn stdout_json(output: &std::process::Output) -> Value {
    let stdout = String::from_utf8(output.stdout.clone()).expect("stdout UTF-8");
    serde_json::from_str(stdout.trim()).expect("JSON payload")
}

#[test]
fn analyze_silence_reports_floor_danger() {
    let dir = scratch_dir("analyze");
    let wav = dir.join("silence.wav");
    let wav_arg = wav.to_string_lossy().into_owned();
    synth(&[
        "--pattern",
        "silence",
        "--output",
        &wav_arg,
        "--duration",
        "2.5",
        "--sample-rate",
        "8000",
    ]);

    let output = cli()
        .args(["--config", &write_small_config(&dir), "analyze", "--input", &wav_arg])
        .output()
        .expect("failed to run analyze");
    assert!(output.status.success(), "analyze exited with {:?}", output.status.code());

    let json = stdout_json(&output);
    assert_eq!(json["summary"]["window_count"], 2);
    assert_eq!(json["summary"]["dominant_cry_type"], "none");
    let windows = json["windows"].as_array().expect("windows array");
    assert_eq!(windows.len(), 2);
    for window in windows {
        assert_eq!(window["danger"].as_f64(), Some(10.0));
        assert_eq!(window["moy_danger"].as_f64(), Some(10.0));
        assert_eq!(window["title"], "silence.wav");
    }

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn analyze_dir_keeps_going_past_bad_files() {
    let dir = scratch_dir("analyze_dir");
    let config = write_small_config(&dir);
    let good = dir.join("a_tone.wav").to_string_lossy().into_owned();
    synth(&[
        "--pattern",
        "sine",
        "--output",
        &good,
        "--duration",
        "1.0",
        "--sample-rate",
        "8000",
        "--frequency",
        "440",
    ]);
    fs::write(dir.join("b_broken.wav"), b"not a wav file").expect("write broken file");
    fs::write(dir.join("notes.txt"), b"ignored").expect("write text file");

    let output = cli()
        .args(["--config", &config, "analyze-dir", "--dir"])
        .arg(&dir)
        .output()
        .expect("failed to run analyze-dir");
    assert_eq!(output.status.code(), Some(2));

    let json = stdout_json(&output);
    assert_eq!(json["file_count"], 2);
    assert_eq!(json["failed_count"], 1);
    let files = json["files"].as_array().expect("files array");
    assert!(files[0]["path"].as_str().unwrap_or_default().ends_with("a_tone.wav"));
    assert_eq!(files[0]["summary"]["window_count"], 1);
    assert!(files[1]["error"].is_string());

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn report_and_envelope_outputs() {
    let dir = scratch_dir("report");
    let config = write_small_config(&dir);
    let wav = dir.join("noise.wav").to_string_lossy().into_owned();
    synth(&[
        "--pattern",
        "noise",
        "--output",
        &wav,
        "--duration",
        "2.0",
        "--sample-rate",
        "8000",
    ]);

    let output = cli()
        .args(["--config", &config, "report", "--input", &wav])
        .output()
        .expect("failed to run report");
    assert!(output.status.success());
    let report = stdout_json(&output);
    assert_eq!(report["window_count"], 2);
    let percent = report["percent"].as_u64().expect("percent");
    assert!((10..=100).contains(&percent), "percent = {percent}");
    assert!(report["risk"].is_string());

    let output = cli()
        .args(["envelope", "--input", &wav, "--limit", "20"])
        .output()
        .expect("failed to run envelope");
    assert!(output.status.success());
    let envelope = stdout_json(&output);
    assert_eq!(envelope["amplitudes"].as_array().map(Vec::len), Some(20));
    assert!(envelope["danger"]["percent"].as_u64().unwrap_or(101) <= 100);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn missing_input_fails_with_exit_code_one() {
    let output = cli()
        .args(["analyze", "--input", "/nonexistent/missing.wav"])
        .output()
        .expect("failed to run analyze");
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).expect("stderr UTF-8");
    assert!(stderr.contains("FileNotFound"), "unexpected stderr: {stderr}");
}

#[test]
fn report_on_too_short_file_fails() {
    let dir = scratch_dir("short");
    let wav = dir.join("short.wav").to_string_lossy().into_owned();
    synth(&[
        "--pattern",
        "sine",
        "--output",
        &wav,
        "--duration",
        "0.5",
        "--sample-rate",
        "8000",
    ]);

    let output = cli()
        .args(["--config", &write_small_config(&dir), "report", "--input", &wav])
        .output()
        .expect("failed to run report");
    assert_eq!(output.status.code(), Some(1));

    let _ = fs::remove_dir_all(&dir);
}
