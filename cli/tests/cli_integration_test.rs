use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

fn temp_wav(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("tonemodem-cli-{}", std::process::id()));
    fs::create_dir_all(&dir).expect("Failed to create temp dir");
    dir.join(name)
}

fn run_tonemodem(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tonemodem"))
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("Failed to execute tonemodem")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn test_encode_then_decode() {
    let wav = temp_wav("hello_world.wav");
    let wav_str = wav.to_str().unwrap();

    let encoded = run_tonemodem(&["encode", "hello", "world", "-o", wav_str]);
    assert!(encoded.status.success(), "encode failed: {:?}", encoded);
    assert!(stdout(&encoded).contains("Encoded \"HELLO WORLD\""));
    assert!(wav.exists(), "Output file was not created");

    // preamble + 12 tones + postamble at 16-bit mono
    let expected_bytes = 2 * (13230 + 12 * 8820 + 13230) as u64;
    let file_size = fs::metadata(&wav).unwrap().len();
    assert!(file_size >= expected_bytes && file_size < expected_bytes + 100);

    let decoded = run_tonemodem(&["decode", wav_str]);
    assert!(decoded.status.success(), "decode failed: {:?}", decoded);
    assert!(
        stdout(&decoded).contains("Decoded message: 'HELLO WORLD'"),
        "got: {}",
        stdout(&decoded)
    );
}

#[test]
fn test_default_message() {
    let wav = temp_wav("default.wav");
    let wav_str = wav.to_str().unwrap();

    assert!(run_tonemodem(&["encode", "-o", wav_str]).status.success());
    let decoded = run_tonemodem(&["decode", wav_str]);
    assert!(stdout(&decoded).contains("Decoded message: 'HELLO'"));
}

#[test]
fn test_listen_matches_decode() {
    let wav = temp_wav("listen.wav");
    let wav_str = wav.to_str().unwrap();

    assert!(run_tonemodem(&["encode", "STREAM TEST", "-o", wav_str]).status.success());

    let listened = run_tonemodem(&["listen", wav_str, "--chunk-ms", "50"]);
    assert!(listened.status.success(), "listen failed: {:?}", listened);
    let text = stdout(&listened);
    assert!(text.contains("Partial: 'S"), "got: {}", text);
    assert!(text.contains("Decoded message: 'STREAM TEST'"), "got: {}", text);
}

#[test]
fn test_custom_parameters_round_trip() {
    let wav = temp_wav("custom.wav");
    let wav_str = wav.to_str().unwrap();

    let encoded = run_tonemodem(&[
        "encode", "FAST", "-o", wav_str, "--sample-rate", "16000", "--tone-ms", "100", "--fade-ms",
        "5",
    ]);
    assert!(encoded.status.success(), "encode failed: {:?}", encoded);

    let decoded = run_tonemodem(&["decode", wav_str, "--tone-ms", "100", "--fade-ms", "5"]);
    assert!(stdout(&decoded).contains("Decoded message: 'FAST'"), "got: {}", stdout(&decoded));
}

#[test]
fn test_unframed_round_trip() {
    let wav = temp_wav("unframed.wav");
    let wav_str = wav.to_str().unwrap();

    let encoded = run_tonemodem(&[
        "encode", "SOS", "-o", wav_str, "--unframed", "--sample-rate", "8000", "--tone-ms", "50",
    ]);
    assert!(encoded.status.success(), "encode failed: {:?}", encoded);

    let decoded = run_tonemodem(&["decode", wav_str, "--unframed", "--tone-ms", "50"]);
    assert!(stdout(&decoded).contains("Decoded message: 'SOS'"), "got: {}", stdout(&decoded));
}

#[test]
fn test_decode_missing_file_fails() {
    let output = run_tonemodem(&["decode", "/nonexistent/input.wav"]);
    assert!(!output.status.success());
}

#[test]
fn test_invalid_parameters_rejected() {
    let wav = temp_wav("invalid.wav");
    let output = run_tonemodem(&["encode", "X", "-o", wav.to_str().unwrap(), "--amplitude", "2"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("amplitude"));
}
