//! CSV loading for observation and reconstruction files.
//!
//! Observation files are wide: one row per (year, day) with a count column
//! per cell (`Year,Day,Cell1,...,CellN`). Reconstruction files are long:
//! one row per moved cell pair (`Year,Day,FromCell,ToCell,NumberOfBirds`).
//! Blank lines are ignored and malformed rows are skipped and counted; a
//! missing file or an unusable header is an error.

use std::io::BufRead;
use std::path::Path;
use std::str::FromStr;
use std::sync::LazyLock;

use flowmap_core::error::{FlowMapError, Result};
use flowmap_core::models::{FlowRecord, ObservationRecord};
use flowmap_core::settings::CellIndexBase;
use regex::Regex;
use tracing::{debug, warn};

/// Matches `CellN` observation headers, capturing `N`.
static CELL_COLUMN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^cell\s*(\d+)$").expect("regex is valid"));

// ── Public types ──────────────────────────────────────────────────────────────

/// Row counters reported alongside the parsed records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct ReadStats {
    /// Non-blank data rows seen (header excluded).
    pub rows_read: usize,
    /// Rows dropped because they were malformed.
    pub rows_skipped: usize,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load an observation file from disk.
pub fn load_observations(
    path: &Path,
    base: CellIndexBase,
) -> Result<(Vec<ObservationRecord>, ReadStats)> {
    let reader = open(path)?;
    parse_observations(reader, path, base)
}

/// Load a reconstruction file from disk.
pub fn load_flows(path: &Path, base: CellIndexBase) -> Result<(Vec<FlowRecord>, ReadStats)> {
    let reader = open(path)?;
    parse_flows(reader, path, base)
}

/// Parse observation rows from any buffered reader.
///
/// `source` is only used in log and error messages.
pub fn parse_observations<R: BufRead>(
    reader: R,
    source: &Path,
    base: CellIndexBase,
) -> Result<(Vec<ObservationRecord>, ReadStats)> {
    let mut lines = data_lines(reader, source);

    let (_, header) = lines.next().transpose()?.ok_or_else(|| FlowMapError::Parse {
        path: source.to_path_buf(),
        message: "file is empty".to_string(),
    })?;
    let cells = observation_columns(&header, source, base)?;

    let mut records = Vec::new();
    let mut stats = ReadStats::default();

    for line in lines {
        let (line_no, line) = line?;
        stats.rows_read += 1;

        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() != cells.len() + 2 {
            warn!(
                "{}:{}: expected {} fields, found {}",
                source.display(),
                line_no,
                cells.len() + 2,
                fields.len()
            );
            stats.rows_skipped += 1;
            continue;
        }

        let parsed = parse_field::<u32>(fields[0])
            .zip(parse_field::<u32>(fields[1]))
            .and_then(|(year, day)| {
                fields[2..]
                    .iter()
                    .map(|f| parse_field::<u64>(f))
                    .collect::<Option<Vec<u64>>>()
                    .map(|counts| (year, day, counts))
            });

        let Some((year, day, counts)) = parsed else {
            debug!("{}:{}: unparseable row skipped", source.display(), line_no);
            stats.rows_skipped += 1;
            continue;
        };

        records.extend(cells.iter().zip(counts).map(|(&cell, count)| ObservationRecord {
            year,
            day,
            cell,
            count,
        }));
    }

    debug!(
        "File {}: {} rows read, {} skipped, {} observation records",
        source.display(),
        stats.rows_read,
        stats.rows_skipped,
        records.len()
    );

    Ok((records, stats))
}

/// Parse reconstruction rows from any buffered reader.
pub fn parse_flows<R: BufRead>(
    reader: R,
    source: &Path,
    base: CellIndexBase,
) -> Result<(Vec<FlowRecord>, ReadStats)> {
    let mut lines = data_lines(reader, source);

    let (_, header) = lines.next().transpose()?.ok_or_else(|| FlowMapError::Parse {
        path: source.to_path_buf(),
        message: "file is empty".to_string(),
    })?;
    check_flow_header(&header, source)?;

    let mut records = Vec::new();
    let mut stats = ReadStats::default();

    for line in lines {
        let (line_no, line) = line?;
        stats.rows_read += 1;

        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() != 5 {
            warn!(
                "{}:{}: expected 5 fields, found {}",
                source.display(),
                line_no,
                fields.len()
            );
            stats.rows_skipped += 1;
            continue;
        }

        let (Some(year), Some(day), Some(from_id), Some(to_id), Some(count)) = (
            parse_field::<u32>(fields[0]),
            parse_field::<u32>(fields[1]),
            parse_field::<usize>(fields[2]),
            parse_field::<usize>(fields[3]),
            parse_field::<i64>(fields[4]),
        ) else {
            debug!("{}:{}: unparseable row skipped", source.display(), line_no);
            stats.rows_skipped += 1;
            continue;
        };

        let from_cell = zero_based(from_id, base, source, line_no)?;
        let to_cell = zero_based(to_id, base, source, line_no)?;

        records.push(FlowRecord {
            year,
            day,
            from_cell,
            to_cell,
            count,
        });
    }

    debug!(
        "File {}: {} rows read, {} skipped, {} flow records",
        source.display(),
        stats.rows_read,
        stats.rows_skipped,
        records.len()
    );

    Ok((records, stats))
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn open(path: &Path) -> Result<std::io::BufReader<std::fs::File>> {
    std::fs::File::open(path)
        .map(std::io::BufReader::new)
        .map_err(|source| FlowMapError::FileRead {
            path: path.to_path_buf(),
            source,
        })
}

/// Non-blank lines paired with their 1-based line numbers.
fn data_lines<'a, R: BufRead + 'a>(
    reader: R,
    source: &'a Path,
) -> impl Iterator<Item = Result<(usize, String)>> + 'a {
    reader
        .lines()
        .enumerate()
        .filter_map(move |(i, line)| match line {
            Ok(l) if l.trim().is_empty() => None,
            Ok(l) => Some(Ok((i + 1, l))),
            Err(source_err) => Some(Err(FlowMapError::FileRead {
                path: source.to_path_buf(),
                source: source_err,
            })),
        })
}

fn parse_field<T: FromStr>(s: &str) -> Option<T> {
    s.trim().parse().ok()
}

fn is_year_day(fields: &[&str]) -> bool {
    fields.len() >= 2
        && fields[0].eq_ignore_ascii_case("year")
        && fields[1].eq_ignore_ascii_case("day")
}

/// Resolve the `CellN` header columns to 0-based cell ids.
fn observation_columns(header: &str, source: &Path, base: CellIndexBase) -> Result<Vec<usize>> {
    let fields: Vec<&str> = header.split(',').map(str::trim).collect();

    let bad_header = |message: String| FlowMapError::Parse {
        path: source.to_path_buf(),
        message,
    };

    if !is_year_day(&fields) {
        return Err(bad_header(
            "header must start with Year,Day".to_string(),
        ));
    }
    if fields.len() < 3 {
        return Err(bad_header("header has no cell columns".to_string()));
    }

    fields[2..]
        .iter()
        .map(|name| {
            let id = CELL_COLUMN
                .captures(name)
                .and_then(|c| c[1].parse::<usize>().ok())
                .ok_or_else(|| bad_header(format!("unexpected column {name:?}")))?;
            base.to_zero_based(id)
                .ok_or_else(|| bad_header(format!("column {name:?} is below the cell base")))
        })
        .collect()
}

fn check_flow_header(header: &str, source: &Path) -> Result<()> {
    let fields: Vec<&str> = header.split(',').map(str::trim).collect();
    if fields.len() == 5 && is_year_day(&fields) {
        Ok(())
    } else {
        Err(FlowMapError::Parse {
            path: source.to_path_buf(),
            message: "header must be Year,Day,FromCell,ToCell,NumberOfBirds".to_string(),
        })
    }
}

fn zero_based(id: usize, base: CellIndexBase, source: &Path, line_no: usize) -> Result<usize> {
    base.to_zero_based(id).ok_or_else(|| FlowMapError::Parse {
        path: source.to_path_buf(),
        message: format!("line {line_no}: cell id {id} is below the cell base"),
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn src() -> PathBuf {
        PathBuf::from("test.csv")
    }

    fn write_csv(dir: &Path, name: &str, lines: &[&str]) -> PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        path
    }

    // ── observations ──────────────────────────────────────────────────────────

    #[test]
    fn test_parse_observations_expands_cells() {
        let csv = "Year,Day,Cell1,Cell2,Cell3\n0,0,5,0,2\n0,1,1,1,1\n";
        let (records, stats) =
            parse_observations(Cursor::new(csv), &src(), CellIndexBase::One).unwrap();

        assert_eq!(stats, ReadStats { rows_read: 2, rows_skipped: 0 });
        assert_eq!(records.len(), 6);
        assert_eq!(
            records[0],
            ObservationRecord { year: 0, day: 0, cell: 0, count: 5 }
        );
        assert_eq!(records[2].cell, 2);
        assert_eq!(records[2].count, 2);
        assert_eq!(records[5].day, 1);
    }

    #[test]
    fn test_parse_observations_zero_base_columns() {
        let csv = "year,day,cell0,cell1\n1,3,4,9\n";
        let (records, _) =
            parse_observations(Cursor::new(csv), &src(), CellIndexBase::Zero).unwrap();
        assert_eq!(records[0].cell, 0);
        assert_eq!(records[1].cell, 1);
        assert_eq!(records[1].count, 9);
    }

    #[test]
    fn test_cell_column_headers() {
        let columns =
            observation_columns("Year,Day,Cell1, cell 2,CELL10", &src(), CellIndexBase::One)
                .unwrap();
        assert_eq!(columns, vec![0, 1, 9]);

        // The shared pattern is reused across calls.
        let again = observation_columns("Year,Day,Cell3", &src(), CellIndexBase::One).unwrap();
        assert_eq!(again, vec![2]);
        assert!(!CELL_COLUMN.is_match("Cellar"));
    }

    #[test]
    fn test_parse_observations_skips_bad_rows() {
        let csv = "Year,Day,Cell1,Cell2\n0,0,1\n\n0,0,x,2\n0,1,3,4\n";
        let (records, stats) =
            parse_observations(Cursor::new(csv), &src(), CellIndexBase::One).unwrap();
        assert_eq!(stats.rows_read, 3);
        assert_eq!(stats.rows_skipped, 2);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].day, 1);
    }

    #[test]
    fn test_parse_observations_rejects_negative_count() {
        let csv = "Year,Day,Cell1\n0,0,-4\n";
        let (records, stats) =
            parse_observations(Cursor::new(csv), &src(), CellIndexBase::One).unwrap();
        assert!(records.is_empty());
        assert_eq!(stats.rows_skipped, 1);
    }

    #[test]
    fn test_parse_observations_bad_header() {
        let csv = "Day,Year,Cell1\n0,0,1\n";
        let err = parse_observations(Cursor::new(csv), &src(), CellIndexBase::One).unwrap_err();
        assert!(matches!(err, FlowMapError::Parse { .. }));

        let csv = "Year,Day,Count\n0,0,1\n";
        assert!(parse_observations(Cursor::new(csv), &src(), CellIndexBase::One).is_err());
    }

    #[test]
    fn test_parse_observations_empty_input() {
        let err = parse_observations(Cursor::new(""), &src(), CellIndexBase::One).unwrap_err();
        assert!(err.to_string().contains("file is empty"));
    }

    #[test]
    fn test_load_observations_from_disk() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(dir.path(), "obs.csv", &["Year,Day,Cell1,Cell2", "2,5,10,20"]);
        let (records, _) = load_observations(&path, CellIndexBase::One).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].year, 2);
        assert_eq!(records[1].count, 20);
    }

    #[test]
    fn test_load_observations_missing_file() {
        let err = load_observations(
            Path::new("/tmp/does-not-exist-flowmap-obs.csv"),
            CellIndexBase::One,
        )
        .unwrap_err();
        assert!(matches!(err, FlowMapError::FileRead { .. }));
    }

    // ── flows ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_parse_flows_one_based() {
        let csv = "Year,Day,FromCell,ToCell,NumberOfBirds\n0,3,6,31,7\n0,3,31,6,-2\n";
        let (records, stats) = parse_flows(Cursor::new(csv), &src(), CellIndexBase::One).unwrap();
        assert_eq!(stats.rows_read, 2);
        assert_eq!(
            records[0],
            FlowRecord { year: 0, day: 3, from_cell: 5, to_cell: 30, count: 7 }
        );
        assert_eq!(records[1].count, -2);
    }

    #[test]
    fn test_parse_flows_zero_based() {
        let csv = "Year,Day,FromCell,ToCell,NumberOfBirds\n1,0,0,99,4\n";
        let (records, _) = parse_flows(Cursor::new(csv), &src(), CellIndexBase::Zero).unwrap();
        assert_eq!(records[0].from_cell, 0);
        assert_eq!(records[0].to_cell, 99);
    }

    #[test]
    fn test_parse_flows_cell_below_base_is_error() {
        let csv = "Year,Day,FromCell,ToCell,NumberOfBirds\n0,0,0,5,1\n";
        let err = parse_flows(Cursor::new(csv), &src(), CellIndexBase::One).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_parse_flows_skips_malformed() {
        let csv = "Year,Day,FromCell,ToCell,NumberOfBirds\n0,0,1,2\n0,0,1,2,many\n0,0,1,2,3\n";
        let (records, stats) = parse_flows(Cursor::new(csv), &src(), CellIndexBase::One).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(stats.rows_skipped, 2);
    }

    #[test]
    fn test_parse_flows_bad_header() {
        let csv = "Year,Day,From,To\n0,0,1,2\n";
        assert!(parse_flows(Cursor::new(csv), &src(), CellIndexBase::One).is_err());
    }

    #[test]
    fn test_load_flows_from_disk() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            dir.path(),
            "moves.csv",
            &["Year,Day,FromCell,ToCell,NumberOfBirds", "0,0,4,21,12", ""],
        );
        let (records, stats) = load_flows(&path, CellIndexBase::One).unwrap();
        assert_eq!(stats.rows_read, 1);
        assert_eq!(records[0].to_cell, 20);
    }
}
