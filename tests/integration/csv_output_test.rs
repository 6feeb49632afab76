//! Integration tests for the CSV output, reading results back from disk

use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};

use tabular_csv::{
    CsvOutput, CsvOutputConfig, EntryKind, LogEntry, LogOutput, MigrationError, TabularCsvError,
    TabularInput,
};
use tempfile::tempdir;

/// Helper: build a tabular entry from string pairs
fn table(pairs: &[(&str, &str)]) -> LogEntry {
    let mut input = TabularInput::new();
    for (key, value) in pairs {
        input.record(key, *value);
    }
    LogEntry::Tabular(input)
}

/// Helper: an output with warnings disabled
fn quiet_output(path: &Path) -> CsvOutput {
    CsvOutput::with_config(CsvOutputConfig::new(path).with_warnings_disabled())
        .expect("Failed to create output")
}

/// Helper: parse a CSV file into its header and rows keyed by column
fn read_back(path: &Path) -> (Vec<String>, Vec<HashMap<String, String>>) {
    let mut reader = csv::Reader::from_path(path).expect("Failed to open CSV");
    let header: Vec<String> = reader
        .headers()
        .expect("Missing header")
        .iter()
        .map(String::from)
        .collect();
    let rows = reader
        .records()
        .map(|record| {
            let record = record.expect("Malformed row");
            header
                .iter()
                .cloned()
                .zip(record.iter().map(String::from))
                .collect()
        })
        .collect();
    (header, rows)
}

/// Writer that collects everything a tracing subscriber prints
#[derive(Clone, Default)]
struct CapturedOutput(Arc<Mutex<Vec<u8>>>);

impl CapturedOutput {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl io::Write for CapturedOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Runs `f` with a subscriber capturing events, returning the warning lines
fn capture_warnings(f: impl FnOnce()) -> Vec<String> {
    let captured = CapturedOutput::default();
    let sink = captured.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || sink.clone())
        .with_ansi(false)
        .finish();
    tracing::subscriber::with_default(subscriber, f);

    captured
        .contents()
        .lines()
        .filter(|line| line.contains("CsvOutputWarning"))
        .map(String::from)
        .collect()
}

/// Record {x:1}, then {y:2}: the second record widens the header and the
/// first row gets a blank y.
#[test]
fn test_scenario_new_column_backfills_previous_rows() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("progress.csv");

    let mut output = quiet_output(&path);
    output.record(&mut table(&[("x", "1")])).unwrap();
    output.record(&mut table(&[("y", "2")])).unwrap();
    output.close().unwrap();

    let (header, rows) = read_back(&path);
    assert_eq!(header, vec!["x", "y"]);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["x"], "1");
    assert_eq!(rows[0]["y"], "");
    assert_eq!(rows[1]["x"], "");
    assert_eq!(rows[1]["y"], "2");
}

/// Three records with the same keys: one header, three rows, one file open.
#[test]
fn test_scenario_steady_state_single_open() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("progress.csv");

    let mut output = quiet_output(&path);
    for i in 0..3 {
        let a = i.to_string();
        let b = (i * 2).to_string();
        output
            .record(&mut table(&[("a", a.as_str()), ("b", b.as_str())]))
            .unwrap();
    }
    output.close().unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(content.lines().filter(|l| *l == "a,b").count(), 1);
    assert_eq!(content.lines().count(), 4);
    assert_eq!(output.stats().file_opens, 1);
    assert_eq!(output.stats().migrations, 0);
}

/// Same keys in a different order do not trigger a migration.
#[test]
fn test_scenario_key_order_does_not_matter() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("progress.csv");

    let mut output = quiet_output(&path);
    output.record(&mut table(&[("a", "1"), ("b", "2")])).unwrap();
    output.record(&mut table(&[("b", "4"), ("a", "3")])).unwrap();
    output.close().unwrap();

    assert_eq!(output.stats().migrations, 0);
    let (header, rows) = read_back(&path);
    assert_eq!(header, vec!["a", "b"]);
    assert_eq!(rows[1]["a"], "3");
    assert_eq!(rows[1]["b"], "4");
}

/// {a,b} then {b,c}: header is the union and each row is blank where its
/// record had no value.
#[test]
fn test_overlapping_key_sets_union() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("progress.csv");

    let mut output = quiet_output(&path);
    output.record(&mut table(&[("a", "1"), ("b", "2")])).unwrap();
    output.record(&mut table(&[("b", "3"), ("c", "4")])).unwrap();
    output.close().unwrap();

    let (header, rows) = read_back(&path);
    assert_eq!(header, vec!["a", "b", "c"]);
    assert_eq!(rows[0]["c"], "");
    assert_eq!(rows[1]["a"], "");
    assert_eq!(rows[1]["b"], "3");
    assert_eq!(rows[1]["c"], "4");
}

/// Values that need quoting survive a rewrite unchanged.
#[test]
fn test_quoted_values_survive_migration() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("progress.csv");
    let tricky = "say \"hi\", then\nleave";

    let mut output = quiet_output(&path);
    output.record(&mut table(&[("note", tricky)])).unwrap();
    output.record(&mut table(&[("note", "plain"), ("extra", "1,2")])).unwrap();
    output.close().unwrap();

    let (header, rows) = read_back(&path);
    assert_eq!(header, vec!["note", "extra"]);
    assert_eq!(rows[0]["note"], tricky);
    assert_eq!(rows[0]["extra"], "");
    assert_eq!(rows[1]["extra"], "1,2");
}

/// A text entry leaves the file byte-for-byte unchanged.
#[test]
fn test_rejected_entry_leaves_file_unchanged() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("progress.csv");

    let mut output = quiet_output(&path);
    output.record(&mut table(&[("a", "1")])).unwrap();
    output.dump().unwrap();
    let before = std::fs::read(&path).unwrap();

    let err = output
        .record(&mut LogEntry::Text("hello".to_string()))
        .unwrap_err();
    assert!(matches!(
        err,
        TabularCsvError::UnacceptableInputType(EntryKind::Text)
    ));

    output.dump().unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), before);
    assert_eq!(output.header(), ["a"]);

    // The output keeps working afterwards
    output.record(&mut table(&[("a", "2")])).unwrap();
    output.close().unwrap();
    let (_, rows) = read_back(&path);
    assert_eq!(rows.len(), 2);
}

/// Removing the file under the output makes the next migration fail loudly,
/// and the output refuses to write afterwards.
#[test]
fn test_migration_failure_makes_output_unusable() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("progress.csv");

    let mut output = quiet_output(&path);
    output.record(&mut table(&[("a", "1")])).unwrap();
    output.dump().unwrap();
    std::fs::remove_file(&path).unwrap();

    let err = output.record(&mut table(&[("b", "2")])).unwrap_err();
    match err {
        TabularCsvError::HeaderMigration { path: failed, .. } => assert_eq!(failed, path),
        other => panic!("expected HeaderMigration, got {other:?}"),
    }

    let err = output.record(&mut table(&[("a", "3")])).unwrap_err();
    assert!(matches!(err, TabularCsvError::Unusable(_)));
    assert!(matches!(output.dump(), Err(TabularCsvError::Unusable(_))));
    output.close().unwrap();
}

/// A row whose width differs from the header cannot be read back, so the
/// migration fails and the output refuses to write afterwards.
#[test]
fn test_malformed_row_fails_migration() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("progress.csv");

    let mut output = quiet_output(&path);
    output.record(&mut table(&[("a", "1")])).unwrap();
    output.dump().unwrap();
    let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
    io::Write::write_all(&mut file, b"1,2,3\n").unwrap();
    drop(file);

    let err = output.record(&mut table(&[("b", "2")])).unwrap_err();
    assert!(
        matches!(
            err,
            TabularCsvError::HeaderMigration {
                source: MigrationError::Csv(_),
                ..
            }
        ),
        "expected a CSV migration error, got {err:?}"
    );

    let err = output.record(&mut table(&[("a", "3")])).unwrap_err();
    assert!(matches!(err, TabularCsvError::Unusable(_)));
    output.close().unwrap();
}

/// A header on disk with a different width than the one written fails the
/// migration instead of misplacing cells.
#[test]
fn test_header_width_change_fails_migration() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("progress.csv");

    let mut output = quiet_output(&path);
    output.record(&mut table(&[("a", "1")])).unwrap();
    output.dump().unwrap();
    std::fs::write(&path, "a,b\n1,2\n").unwrap();

    let err = output.record(&mut table(&[("c", "3")])).unwrap_err();
    match err {
        TabularCsvError::HeaderMigration {
            source: MigrationError::HeaderMismatch { expected, found },
            ..
        } => {
            assert_eq!(expected, 1);
            assert_eq!(found, 2);
        }
        other => panic!("expected HeaderMismatch, got {other:?}"),
    }
    output.close().unwrap();
}

/// Cells are backfilled under the columns that were written, even when the
/// first column name starts with a byte order mark the reader would strip.
#[test]
fn test_leading_bom_column_survives_migration() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("progress.csv");

    let mut output = quiet_output(&path);
    output
        .record(&mut table(&[("\u{feff}k", "v1")]))
        .unwrap();
    output.record(&mut table(&[("z", "2")])).unwrap();
    output.close().unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    assert_eq!(contents, "\u{feff}k,z\nv1,\n,2\n");
    assert_eq!(output.header(), &["\u{feff}k", "z"]);
}

/// Each accepted record has its written keys marked.
#[test]
fn test_written_keys_are_marked() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("progress.csv");

    let mut input = TabularInput::new();
    input.push_prefix("eval/");
    input.record("return", 12.5);
    input.record("per_step", serde_json::json!([1.0, 2.0]));
    input.pop_prefix();
    input.record("itr", 7);
    let mut entry = LogEntry::Tabular(input);

    let mut output = quiet_output(&path);
    output.record(&mut entry).unwrap();
    output.close().unwrap();

    let LogEntry::Tabular(input) = entry else {
        panic!("entry kind changed");
    };
    assert!(input.is_marked("eval/return"));
    assert!(input.is_marked("itr"));
    assert_eq!(input.unmarked_keys(), vec!["eval/per_step"]);

    let (header, rows) = read_back(&path);
    assert_eq!(header, vec!["eval/return", "itr"]);
    assert_eq!(rows[0]["eval/return"], "12.5");
}

/// A dispatcher holding several outputs only forwards what each accepts.
#[test]
fn test_dispatch_through_log_output_trait() {
    let dir = tempdir().unwrap();
    let first = dir.path().join("first.csv");
    let second = dir.path().join("logs").join("second.csv");

    let mut outputs: Vec<Box<dyn LogOutput>> =
        vec![Box::new(quiet_output(&first)), Box::new(quiet_output(&second))];

    let mut entries = vec![
        table(&[("step", "1")]),
        LogEntry::from("a text line"),
        table(&[("step", "2"), ("loss", "0.1")]),
    ];
    for entry in &mut entries {
        for output in outputs.iter_mut() {
            if output.accepts(entry.kind()) {
                output.record(entry).unwrap();
            }
        }
    }
    for output in outputs.iter_mut() {
        output.close().unwrap();
    }

    for path in [&first, &second] {
        let (header, rows) = read_back(path);
        assert_eq!(header, vec!["step", "loss"]);
        assert_eq!(rows.len(), 2);
    }
}

/// Repeated migrations produce a single visible warning.
#[test]
fn test_migration_warning_is_visible_once() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("progress.csv");

    let warnings = capture_warnings(|| {
        let mut output = CsvOutput::new(&path).unwrap();
        output.record(&mut table(&[("a", "1")])).unwrap();
        output.record(&mut table(&[("b", "2")])).unwrap();
        output.record(&mut table(&[("c", "3")])).unwrap();
        output.close().unwrap();
    });

    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("Inefficient CSV header rewrite"));
    assert!(warnings[0].contains("tabular_csv::warning"));
}

/// Disabled warnings are never printed, and dedup state is per output.
#[test]
fn test_warning_state_is_per_output() {
    let dir = tempdir().unwrap();

    let warnings = capture_warnings(|| {
        let mut loud = CsvOutput::new(dir.path().join("loud.csv")).unwrap();
        let mut other = CsvOutput::new(dir.path().join("other.csv")).unwrap();
        let mut quiet = CsvOutput::new(dir.path().join("quiet.csv")).unwrap();
        quiet.disable_warnings();

        assert!(loud.warn("shared message"));
        assert!(!loud.warn("shared message"));
        assert!(other.warn("shared message"));
        assert!(!quiet.warn("shared message"));
    });

    assert_eq!(warnings.len(), 2);
}
