//! End-to-end runs of the countrun binary.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn countrun(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_countrun"))
        .args(args)
        .output()
        .expect("Failed to run countrun")
}

fn stdout_of(output: &Output) -> String {
    assert!(
        output.status.success(),
        "countrun failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

fn write_reads(dir: &TempDir) -> std::path::PathBuf {
    let reads = dir.path().join("reads.bed");
    fs::write(
        &reads,
        "chr1\t10\t20\nchr1\t15\t25\nchr2\t0\t5\nchr1\t100\t110\n",
    )
    .unwrap();
    reads
}

#[test]
fn test_depth_then_decode() {
    let dir = TempDir::new().unwrap();
    let reads = write_reads(&dir);
    let out = dir.path().join("depth");

    stdout_of(&countrun(&["depth", "-i", path_str(&reads), "-o", path_str(&out)]));
    assert!(out.join("chr1.counts").exists());
    assert!(out.join("chr2.counts").exists());

    let decoded = stdout_of(&countrun(&["decode", "-i", path_str(&out.join("chr1.counts"))]));
    assert_eq!(
        decoded,
        "chr1\t10\t15\t1\nchr1\t15\t20\t2\nchr1\t20\t25\t1\nchr1\t100\t110\t1\n"
    );

    let all = stdout_of(&countrun(&[
        "decode",
        "-i",
        path_str(&out.join("chr2.counts")),
        "--chrom",
        "chrII",
        "--all",
    ]));
    assert_eq!(all, "chrII\t0\t5\t1\n");
}

#[test]
fn test_merge_and_peaks() {
    let dir = TempDir::new().unwrap();
    let reads = write_reads(&dir);
    let out = dir.path().join("depth");
    stdout_of(&countrun(&["depth", "-i", path_str(&reads), "-o", path_str(&out)]));
    let chr1 = out.join("chr1.counts");

    let merged = stdout_of(&countrun(&[
        "merge",
        "-i",
        path_str(&chr1),
        path_str(&chr1),
        "--offset",
        "0",
        "5",
        "--chrom",
        "chr1",
    ]));
    let first_line = merged.lines().next().unwrap();
    assert_eq!(first_line, "chr1\t10\t15\t1");

    let peaks = stdout_of(&countrun(&["peaks", "-i", path_str(&chr1), "--threshold", "1"]));
    assert_eq!(peaks, "chr1\t15\t20\t5\t2\n");
}

#[test]
fn test_expression() {
    let dir = TempDir::new().unwrap();
    let reads = write_reads(&dir);
    let genes = dir.path().join("genes.bed");
    fs::write(
        &genes,
        "chr1\t10\t110\tg1\t0\t+\t10\t110\t0\t2\t5,10,\t0,90,\nchr5\t0\t10\tg2\t0\t-\n",
    )
    .unwrap();

    let output = stdout_of(&countrun(&[
        "expression",
        "-r",
        path_str(&reads),
        "-a",
        path_str(&genes),
    ]));
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines.len(), 2);
    // exons [10,14] [100,109]: reads 10-20 and 100-110; 15-25 sits in the intron
    assert!(lines[0].starts_with("g1\tchr1\t10\t110\t2\t"), "{}", lines[0]);
    assert_eq!(lines[1], "g2\tchr5\t0\t10\t0\t0");
}

#[test]
fn test_missing_input_fails() {
    let output = countrun(&["decode", "-i", "/nonexistent/file.counts"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).starts_with("Error:"));
}
