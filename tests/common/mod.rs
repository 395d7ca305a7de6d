//! Shared CSV fixtures
#![allow(dead_code)]

use std::fs;
use std::path::Path;

pub fn header() -> String {
    let mut cols = vec!["Time".to_string()];
    cols.extend((1..=28).map(|i| format!("V{}", i)));
    cols.push("Amount".to_string());
    cols.push("Class".to_string());
    cols.join(",")
}

/// One transaction line; fraud rows sit far from legit ones on V1..V4
pub fn line(i: usize, fraud: bool) -> String {
    let mut cells = vec![format!("{}", i * 10)];
    for v in 1..=28 {
        let base = if fraud && v <= 4 { -4.0 } else { 0.5 };
        cells.push(format!("{:.3}", base + ((i * v) % 7) as f64 * 0.01));
    }
    cells.push(format!("{:.2}", if fraud { 1.0 } else { 50.0 } + i as f64));
    cells.push(format!("\"{}\"", if fraud { 1 } else { 0 }));
    cells.join(",")
}

/// CSV with `fraud` fraud rows followed by `legit` non-fraud rows
pub fn csv(fraud: usize, legit: usize) -> String {
    let mut lines = vec![header()];
    lines.extend((0..fraud).map(|i| line(i, true)));
    lines.extend((0..legit).map(|i| line(fraud + i, false)));
    lines.join("\n") + "\n"
}

pub fn write_csv(path: &Path, fraud: usize, legit: usize) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, csv(fraud, legit)).unwrap();
}
