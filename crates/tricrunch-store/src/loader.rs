use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use flate2::read::GzDecoder;
use tricrunch_config::DatasetConfig;
use tricrunch_core::{Interest, Knows, Person, parse_calendar_date};
use walkdir::WalkDir;

use crate::{GraphStore, StoreError};

const PERSON_COLUMNS: [&str; 3] = ["personId", "birthday", "locatedIn"];
const INTEREST_COLUMNS: [&str; 2] = ["personId", "interest"];
const KNOWS_COLUMNS: [&str; 2] = ["personId", "friendId"];

/// Loads `person*`, `interest*` and `knows*` record files from `dir` and
/// builds the graph. Every file starts with a header row; columns are found
/// by name, so extra columns are ignored.
pub fn load_dataset(dir: &Path, config: &DatasetConfig) -> Result<GraphStore, StoreError> {
    let delimiter = config.delimiter_char();

    let persons = read_kind(
        dir,
        "person",
        &config.person_prefix,
        delimiter,
        &PERSON_COLUMNS,
        |cells| {
            Ok(Person {
                id: parse_id(PERSON_COLUMNS[0], cells[0])?,
                birthday: parse_optional_date(PERSON_COLUMNS[1], cells[1])?,
                city: parse_optional_id(PERSON_COLUMNS[2], cells[2])?,
            })
        },
    )?;

    let interests = read_kind(
        dir,
        "interest",
        &config.interest_prefix,
        delimiter,
        &INTEREST_COLUMNS,
        |cells| {
            Ok(Interest {
                person: parse_id(INTEREST_COLUMNS[0], cells[0])?,
                tag: parse_id(INTEREST_COLUMNS[1], cells[1])?,
            })
        },
    )?;

    let knows = read_kind(
        dir,
        "knows",
        &config.knows_prefix,
        delimiter,
        &KNOWS_COLUMNS,
        |cells| {
            Ok(Knows {
                person: parse_id(KNOWS_COLUMNS[0], cells[0])?,
                friend: parse_id(KNOWS_COLUMNS[1], cells[1])?,
            })
        },
    )?;

    tracing::info!(
        dir = %dir.display(),
        persons = persons.len(),
        interests = interests.len(),
        knows = knows.len(),
        "loaded dataset records"
    );

    GraphStore::new(persons, interests, knows)
}

fn read_kind<T>(
    dir: &Path,
    kind: &'static str,
    prefix: &str,
    delimiter: char,
    columns: &[&'static str],
    parse: impl Fn(&[&str]) -> Result<T, String>,
) -> Result<Vec<T>, StoreError> {
    let files = matching_files(dir, kind, prefix)?;
    let mut records = Vec::new();

    for path in files {
        let before = records.len();
        read_file(&path, delimiter, columns, &parse, &mut records)?;
        tracing::debug!(
            file = %path.display(),
            kind,
            rows = records.len() - before,
            "read record file"
        );
    }

    Ok(records)
}

fn read_file<T>(
    path: &Path,
    delimiter: char,
    columns: &[&'static str],
    parse: &impl Fn(&[&str]) -> Result<T, String>,
    records: &mut Vec<T>,
) -> Result<(), StoreError> {
    let content = read_content(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut lines = content
        .lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line.trim_end_matches('\r')))
        .filter(|(_, line)| !line.trim().is_empty());

    let Some((_, header)) = lines.next() else {
        // An empty file contributes no rows.
        return Ok(());
    };
    let positions = resolve_columns(path, header, delimiter, columns)?;
    let min_fields = positions.iter().max().map_or(0, |max| max + 1);

    let mut cells = Vec::with_capacity(columns.len());
    for (line_no, line) in lines {
        let fields: Vec<&str> = line.split(delimiter).collect();
        if fields.len() < min_fields {
            return Err(StoreError::Malformed {
                path: path.to_path_buf(),
                line: line_no,
                message: format!(
                    "expected at least {min_fields} fields, found {}",
                    fields.len()
                ),
            });
        }

        cells.clear();
        cells.extend(positions.iter().map(|&position| {
            let cell: &str = fields[position];
            cell.trim()
        }));
        let record = parse(&cells).map_err(|message| StoreError::Malformed {
            path: path.to_path_buf(),
            line: line_no,
            message,
        })?;
        records.push(record);
    }

    Ok(())
}

fn resolve_columns(
    path: &Path,
    header: &str,
    delimiter: char,
    columns: &[&'static str],
) -> Result<Vec<usize>, StoreError> {
    let names: Vec<&str> = header.split(delimiter).map(str::trim).collect();
    columns
        .iter()
        .map(|&column| {
            names
                .iter()
                .position(|name| *name == column)
                .ok_or_else(|| StoreError::MissingColumn {
                    path: path.to_path_buf(),
                    column,
                })
        })
        .collect()
}

/// Files directly inside `dir` whose name starts with `prefix` and contains
/// `.csv`, sorted by file name.
fn matching_files(
    dir: &Path,
    kind: &'static str,
    prefix: &str,
) -> Result<Vec<PathBuf>, StoreError> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|source| StoreError::Scan {
            path: dir.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        if !name.starts_with(prefix) || !name.contains(".csv") {
            continue;
        }
        if name.ends_with(".bz2") || name.ends_with(".zst") || name.ends_with(".xz") {
            return Err(StoreError::Compressed {
                path: entry.into_path(),
            });
        }
        files.push(entry.into_path());
    }

    if files.is_empty() {
        return Err(StoreError::MissingFiles {
            kind,
            prefix: prefix.to_owned(),
            dir: dir.to_path_buf(),
        });
    }

    Ok(files)
}

/// Reads a record file as text, decompressing `.gz` files on the fly.
fn read_content(path: &Path) -> std::io::Result<String> {
    if !is_gzip(path) {
        return fs::read_to_string(path);
    }
    let mut content = String::new();
    GzDecoder::new(File::open(path)?).read_to_string(&mut content)?;
    Ok(content)
}

fn is_gzip(path: &Path) -> bool {
    path.extension().is_some_and(|extension| extension == "gz")
}

fn parse_id(column: &str, value: &str) -> Result<u64, String> {
    value
        .parse()
        .map_err(|_| format!("invalid {column} '{value}', expected an unsigned integer"))
}

fn parse_optional_id(column: &str, value: &str) -> Result<Option<u64>, String> {
    if value.is_empty() {
        return Ok(None);
    }
    parse_id(column, value).map(Some)
}

fn parse_optional_date(column: &str, value: &str) -> Result<Option<NaiveDate>, String> {
    if value.is_empty() {
        return Ok(None);
    }
    parse_calendar_date(value)
        .map(Some)
        .map_err(|err| format!("invalid {column} '{value}': {err}"))
}
