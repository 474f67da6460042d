use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io::{Cursor, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Instant, SystemTime};

use calamine::{Data, Range, Reader};
use polars::prelude::*;
use sha2::{Digest, Sha256};
use tracing::{debug, error, info, trace};

use crate::domain::DashError;
use crate::table::Table;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileType {
    CSV,
    PARQUET,
    ARROW,
    SPREADSHEET,
}

#[derive(Debug)]
struct FileInfo {
    path: PathBuf,
    file_size: u64,
    modified: Option<SystemTime>,
    file_type: FileType,
}

/// Input of the loader. `Bytes` is an uploaded file: its name is only used to
/// detect the format.
#[derive(Debug, Clone)]
pub enum Source {
    Path(PathBuf),
    Bytes { name: String, data: Arc<Vec<u8>> },
    Empty,
}

impl Source {
    pub fn bytes(name: impl Into<String>, data: Vec<u8>) -> Self {
        Source::Bytes {
            name: name.into(),
            data: Arc::new(data),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Path(path) => write!(f, "{}", path.display()),
            Source::Bytes { name, .. } => write!(f, "{name}"),
            Source::Empty => write!(f, "<no file>"),
        }
    }
}

/// Cache key: files by location, size and modification time, uploads by content.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum SourceKey {
    File {
        path: PathBuf,
        file_size: u64,
        modified: Option<SystemTime>,
    },
    Content(String),
}

/// Result of a load. On failure `table` is empty and `error` says why.
#[derive(Debug)]
pub struct Loaded {
    pub table: Table,
    pub error: Option<DashError>,
    pub cached: bool,
}

pub struct Loader {
    cost_column: String,
    cache: HashMap<SourceKey, Table>,
}

impl Loader {
    /// `cost_column` is both the name matched case-insensitively in the
    /// source and the name the matched column gets in the loaded table.
    pub fn new(cost_column: impl Into<String>) -> Self {
        Self {
            cost_column: cost_column.into(),
            cache: HashMap::new(),
        }
    }

    pub fn load(&mut self, source: &Source) -> Loaded {
        match self.try_load(source) {
            Ok((table, cached)) => Loaded {
                table,
                error: None,
                cached,
            },
            Err(e) => {
                error!("Error loading {source}: {e}");
                Loaded {
                    table: Table::empty(),
                    error: Some(e),
                    cached: false,
                }
            }
        }
    }

    /// Drops the cached table of a source. Returns true if there was one.
    pub fn invalidate(&mut self, source: &Source) -> bool {
        match Self::source_key(source) {
            Ok(Some(key)) => self.cache.remove(&key).is_some(),
            _ => false,
        }
    }

    pub fn clear(&mut self) {
        debug!("Clearing {} cached tables", self.cache.len());
        self.cache.clear();
    }

    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }

    fn try_load(&mut self, source: &Source) -> Result<(Table, bool), DashError> {
        let Some(key) = Self::source_key(source)? else {
            debug!("No source given, using an empty table");
            return Ok((Table::empty(), false));
        };
        if let Some(table) = self.cache.get(&key) {
            debug!("Cache hit for {source}");
            return Ok((table.clone(), true));
        }
        debug!("Cache miss for {source}");

        let start_time = Instant::now();
        let frame = match source {
            Source::Path(path) => {
                let info = Self::get_file_info(path)?;
                let data = fs::read(&info.path)?;
                if data.is_empty() {
                    return Err(DashError::EmptySource(source.to_string()));
                }
                Self::parse(info.file_type, data)?
            }
            Source::Bytes { name, data } => {
                if data.is_empty() {
                    return Err(DashError::EmptySource(name.clone()));
                }
                let file_type = Self::detect_file_type(Path::new(name))?;
                Self::parse(file_type, data.as_ref().clone())?
            }
            Source::Empty => return Ok((Table::empty(), false)),
        };
        let frame = normalize_columns(frame, &self.cost_column)?;
        let table = Table::from_frame(frame);
        info!(
            "Loaded {source}: {} rows, {} columns in {}ms",
            table.height(),
            table.column_names().len(),
            start_time.elapsed().as_millis()
        );

        self.cache.insert(key, table.clone());
        Ok((table, false))
    }

    fn source_key(source: &Source) -> Result<Option<SourceKey>, DashError> {
        match source {
            Source::Empty => Ok(None),
            Source::Path(path) => {
                let info = Self::get_file_info(path)?;
                let path = fs::canonicalize(&info.path).unwrap_or(info.path);
                Ok(Some(SourceKey::File {
                    path,
                    file_size: info.file_size,
                    modified: info.modified,
                }))
            }
            Source::Bytes { data, .. } => {
                Ok(Some(SourceKey::Content(hex::encode(Sha256::digest(data.as_slice())))))
            }
        }
    }

    fn get_file_info(path: &Path) -> Result<FileInfo, DashError> {
        let metadata = fs::metadata(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => DashError::FileNotFound(path.to_path_buf()),
            ErrorKind::PermissionDenied => DashError::PermissionDenied(path.to_path_buf()),
            _ => DashError::IoError(e),
        })?;
        if !metadata.is_file() {
            return Err(DashError::NotAFile(path.to_path_buf()));
        }

        Ok(FileInfo {
            path: path.to_path_buf(),
            file_size: metadata.len(),
            modified: metadata.modified().ok(),
            file_type: Self::detect_file_type(path)?,
        })
    }

    fn detect_file_type(path: &Path) -> Result<FileType, DashError> {
        match path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_uppercase())
            .as_deref()
        {
            Some("CSV") => Ok(FileType::CSV),
            Some("PARQUET") | Some("PQ") => Ok(FileType::PARQUET),
            Some("XLSX") | Some("XLSM") | Some("XLS") | Some("XLSB") | Some("ODS") => {
                Ok(FileType::SPREADSHEET)
            }
            Some("ARROW") | Some("IPC") | Some("FEATHER") => Ok(FileType::ARROW),
            _ => Err(DashError::UnknownFileType(path.display().to_string())),
        }
    }

    fn parse(file_type: FileType, data: Vec<u8>) -> Result<DataFrame, DashError> {
        trace!("Parsing {} bytes as {file_type:?}", data.len());
        let frame = match file_type {
            FileType::CSV => CsvReadOptions::default()
                .with_has_header(true)
                .into_reader_with_file_handle(Cursor::new(data))
                .finish()?,
            FileType::PARQUET => ParquetReader::new(Cursor::new(data)).finish()?,
            FileType::ARROW => IpcReader::new(Cursor::new(data)).finish()?,
            FileType::SPREADSHEET => {
                let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(data))?;
                match workbook.worksheet_range_at(0) {
                    Some(range) => range_to_frame(&range?)?,
                    None => DataFrame::empty(),
                }
            }
        };
        Ok(frame)
    }
}

/// Trims column names and brings the cost column under its internal name,
/// adding an all-missing one if the source has none.
fn normalize_columns(frame: DataFrame, cost_column: &str) -> Result<DataFrame, DashError> {
    let height = frame.height();
    let mut names = unique_names(
        frame
            .get_column_names()
            .iter()
            .map(|name| name.trim().to_string()),
    );

    let wanted = cost_column.to_lowercase();
    let cost_idx = names.iter().position(|n| n == cost_column).or_else(|| {
        names
            .iter()
            .position(|n| n.to_lowercase() == wanted)
    });
    match cost_idx {
        Some(idx) => {
            trace!("Using column \"{}\" as {cost_column}", names[idx]);
            names[idx] = cost_column.to_string();
        }
        None => debug!("No {cost_column} column found, adding an empty one"),
    }

    let mut columns: Vec<Column> = frame
        .get_columns()
        .iter()
        .zip(names)
        .map(|(column, name)| {
            let mut column = column.clone();
            column.rename(name.into());
            column
        })
        .collect();
    if cost_idx.is_none() {
        columns.push(Column::full_null(
            cost_column.into(),
            height,
            &DataType::Float64,
        ));
    }
    Ok(DataFrame::new(columns)?)
}

/// Suffixes repeated names with `.1`, `.2`, ... so every name is unique.
fn unique_names(names: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut out: Vec<String> = Vec::new();
    for name in names {
        let mut candidate = name.clone();
        while out.contains(&candidate) {
            let counter = seen.entry(name.clone()).or_insert(0);
            *counter += 1;
            candidate = format!("{name}.{counter}");
        }
        out.push(candidate);
    }
    out
}

enum Cell {
    Missing,
    Number(f64),
    Text(String),
}

fn classify(cell: &Data) -> Cell {
    match cell {
        Data::Empty | Data::Error(_) => Cell::Missing,
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::String(s) if s.is_empty() => Cell::Missing,
        Data::String(s) => Cell::Text(s.clone()),
        other => Cell::Text(other.to_string()),
    }
}

fn is_integral(value: f64) -> bool {
    value.fract() == 0.0 && value.abs() < 9.0e15
}

fn format_number(value: f64) -> String {
    if is_integral(value) {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

fn header_name(idx: usize, cell: &Data) -> String {
    let name = match classify(cell) {
        Cell::Missing => String::new(),
        Cell::Number(n) => format_number(n),
        Cell::Text(s) => s,
    };
    if name.trim().is_empty() {
        format!("Unnamed: {idx}")
    } else {
        name
    }
}

fn cells_to_column(name: &str, cells: Vec<Cell>) -> Column {
    let all_numeric = cells.iter().all(|c| !matches!(c, Cell::Text(_)));
    let any_value = cells.iter().any(|c| !matches!(c, Cell::Missing));
    if all_numeric && any_value {
        let numbers: Vec<Option<f64>> = cells
            .iter()
            .map(|c| match c {
                Cell::Number(n) => Some(*n),
                _ => None,
            })
            .collect();
        if numbers.iter().flatten().all(|&n| is_integral(n)) {
            let ints: Vec<Option<i64>> = numbers.iter().map(|n| n.map(|v| v as i64)).collect();
            Column::new(name.into(), ints)
        } else {
            Column::new(name.into(), numbers)
        }
    } else {
        let texts: Vec<Option<String>> = cells
            .into_iter()
            .map(|c| match c {
                Cell::Missing => None,
                Cell::Number(n) => Some(format_number(n)),
                Cell::Text(s) => Some(s),
            })
            .collect();
        Column::new(name.into(), texts)
    }
}

/// Converts a worksheet into a frame. The first row is the header.
fn range_to_frame(range: &Range<Data>) -> Result<DataFrame, DashError> {
    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(DataFrame::empty());
    };
    let names = unique_names(
        header
            .iter()
            .enumerate()
            .map(|(idx, cell)| header_name(idx, cell)),
    );

    let mut body: Vec<&[Data]> = rows.collect();
    while body
        .last()
        .is_some_and(|row| row.iter().all(|c| matches!(c, Data::Empty)))
    {
        body.pop();
    }

    let columns = names
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let cells = body
                .iter()
                .map(|row| row.get(idx).map(classify).unwrap_or(Cell::Missing))
                .collect();
            cells_to_column(name, cells)
        })
        .collect();
    Ok(DataFrame::new(columns)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const STOCK_CSV: &str = "\
 itembarcode ,description, Category ,COST
87654321,Blue T-Shirt,Apparel,12.5
11112222,Hammer,Tools,7
";

    fn sheet(rows: &[&[Data]]) -> Range<Data> {
        let width = rows.iter().map(|r| r.len()).max().unwrap_or(1) as u32;
        let mut range = Range::new((0, 0), (rows.len() as u32 - 1, width - 1));
        for (r, row) in rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                range.set_value((r as u32, c as u32), cell.clone());
            }
        }
        range
    }

    fn text(s: &str) -> Data {
        Data::String(s.to_string())
    }

    #[test]
    fn csv_upload_is_normalized() {
        let mut loader = Loader::new("cost");
        let loaded = loader.load(&Source::bytes("stock.csv", STOCK_CSV.as_bytes().to_vec()));
        assert!(loaded.error.is_none());
        let table = loaded.table;
        assert_eq!(
            table.column_names(),
            vec!["itembarcode", "description", "Category", "cost"]
        );
        assert_eq!(table.height(), 2);
        assert_eq!(
            table.text_column("cost").unwrap()[0].as_deref(),
            Some("12.5")
        );
    }

    #[test]
    fn missing_cost_column_is_added_empty() {
        let mut loader = Loader::new("cost");
        let csv = "itembarcode,description\n1,Nail\n2,Screw\n";
        let table = loader.load(&Source::bytes("a.csv", csv.as_bytes().to_vec())).table;
        assert!(table.has_column("cost"));
        assert_eq!(table.text_column("cost").unwrap(), vec![None, None]);
    }

    #[test]
    fn exact_cost_name_wins_over_other_casings() {
        let frame = DataFrame::new(vec![
            Column::new("COST".into(), &[1i64]),
            Column::new("cost".into(), &[2i64]),
        ])
        .unwrap();
        let frame = normalize_columns(frame, "cost").unwrap();
        let names: Vec<String> = frame.get_column_names().iter().map(|n| n.to_string()).collect();
        assert_eq!(names, vec!["COST", "cost"]);
    }

    #[test]
    fn trimming_keeps_names_unique() {
        let frame = DataFrame::new(vec![
            Column::new("a ".into(), &[1i64]),
            Column::new("a".into(), &[2i64]),
        ])
        .unwrap();
        let frame = normalize_columns(frame, "cost").unwrap();
        let names: Vec<String> = frame.get_column_names().iter().map(|n| n.to_string()).collect();
        assert_eq!(names, vec!["a", "a.1", "cost"]);
    }

    #[test]
    fn missing_file_and_empty_upload_both_give_empty_tables() {
        let mut loader = Loader::new("cost");
        let missing = loader.load(&Source::Path("/nonexistent/stock ware.xlsx".into()));
        let empty_upload = loader.load(&Source::bytes("upload.xlsx", Vec::new()));
        let absent = loader.load(&Source::Empty);

        assert!(matches!(missing.error, Some(DashError::FileNotFound(_))));
        assert!(matches!(empty_upload.error, Some(DashError::EmptySource(_))));
        assert!(absent.error.is_none());
        assert_eq!(missing.table, empty_upload.table);
        assert_eq!(missing.table, absent.table);
        assert!(missing.table.is_empty());
    }

    #[test]
    fn corrupt_spreadsheet_gives_empty_table() {
        let mut loader = Loader::new("cost");
        let loaded = loader.load(&Source::bytes("stock.xlsx", b"definitely not a zip".to_vec()));
        assert!(loaded.error.is_some());
        assert!(loaded.table.is_empty());
        assert_eq!(loader.cached_entries(), 0);
    }

    fn workbook_fixture() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/stock.xlsx")
    }

    fn assert_stock_workbook(table: &Table) {
        assert_eq!(
            table.column_names(),
            vec!["itembarcode", "description", "Category", "cost"]
        );
        assert_eq!(table.height(), 3);
        assert_eq!(
            table.text_column("itembarcode").unwrap()[0].as_deref(),
            Some("87654321")
        );
        assert_eq!(
            table.text_column("cost").unwrap(),
            vec![Some("12.5".to_string()), Some("7.25".to_string()), None]
        );
    }

    #[test]
    fn workbook_file_reads_first_sheet() {
        let mut loader = Loader::new("cost");
        let loaded = loader.load(&Source::Path(workbook_fixture()));
        assert!(loaded.error.is_none(), "{:?}", loaded.error);
        assert_stock_workbook(&loaded.table);
    }

    #[test]
    fn workbook_upload_matches_file() {
        let data = fs::read(workbook_fixture()).unwrap();
        let mut loader = Loader::new("cost");
        let uploaded = loader.load(&Source::bytes("stock.xlsx", data));
        assert!(uploaded.error.is_none(), "{:?}", uploaded.error);
        assert_stock_workbook(&uploaded.table);
        assert_eq!(
            uploaded.table,
            loader.load(&Source::Path(workbook_fixture())).table
        );
    }

    #[test]
    fn unknown_extension_is_reported() {
        let mut loader = Loader::new("cost");
        let loaded = loader.load(&Source::bytes("stock.txt", b"a,b\n1,2\n".to_vec()));
        assert!(matches!(loaded.error, Some(DashError::UnknownFileType(_))));
    }

    #[test]
    fn directory_is_not_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut loader = Loader::new("cost");
        let loaded = loader.load(&Source::Path(dir.path().to_path_buf()));
        assert!(matches!(loaded.error, Some(DashError::NotAFile(_))));
    }

    #[test]
    fn repeated_loads_hit_the_cache() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(STOCK_CSV.as_bytes()).unwrap();
        file.flush().unwrap();
        let source = Source::Path(file.path().to_path_buf());

        let mut loader = Loader::new("cost");
        let first = loader.load(&source);
        let second = loader.load(&source);
        assert!(!first.cached);
        assert!(second.cached);
        assert_eq!(first.table, second.table);
        assert_eq!(loader.cached_entries(), 1);

        assert!(loader.invalidate(&source));
        assert!(!loader.load(&source).cached);
    }

    #[test]
    fn changed_file_is_reloaded() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(STOCK_CSV.as_bytes()).unwrap();
        file.flush().unwrap();
        let source = Source::Path(file.path().to_path_buf());

        let mut loader = Loader::new("cost");
        assert_eq!(loader.load(&source).table.height(), 2);

        file.write_all(b"33334444,Wrench,Tools,9\n").unwrap();
        file.flush().unwrap();
        let reloaded = loader.load(&source);
        assert!(!reloaded.cached);
        assert_eq!(reloaded.table.height(), 3);
    }

    #[test]
    fn uploads_are_keyed_by_content() {
        let mut loader = Loader::new("cost");
        let a = Source::bytes("a.csv", STOCK_CSV.as_bytes().to_vec());
        let b = Source::bytes("renamed.csv", STOCK_CSV.as_bytes().to_vec());
        loader.load(&a);
        assert!(loader.load(&b).cached);
        loader.clear();
        assert_eq!(loader.cached_entries(), 0);
    }

    #[test]
    fn worksheet_numbers_and_text_are_typed() {
        let range = sheet(&[
            &[text("itembarcode"), text(" description "), text("Category"), text("Cost")],
            &[Data::Float(87654321.0), text("Blue T-Shirt"), text("Apparel"), Data::Float(12.5)],
            &[Data::Float(11112222.0), text("Hammer"), Data::Empty, Data::Int(7)],
        ]);
        let frame = range_to_frame(&range).unwrap();
        assert_eq!(frame.column("itembarcode").unwrap().dtype(), &DataType::Int64);
        assert_eq!(frame.column("Cost").unwrap().dtype(), &DataType::Float64);
        assert_eq!(frame.column("Category").unwrap().null_count(), 1);

        let table = Table::from_frame(normalize_columns(frame, "cost").unwrap());
        assert_eq!(
            table.column_names(),
            vec!["itembarcode", "description", "Category", "cost"]
        );
        assert_eq!(
            table.text_column("itembarcode").unwrap()[0].as_deref(),
            Some("87654321")
        );
    }

    #[test]
    fn worksheet_mixed_columns_become_text() {
        let range = sheet(&[
            &[text("itembarcode")],
            &[Data::Float(123.0)],
            &[text("ABC-1")],
        ]);
        let frame = range_to_frame(&range).unwrap();
        let table = Table::from_frame(frame);
        assert_eq!(
            table.text_column("itembarcode").unwrap(),
            vec![Some("123".to_string()), Some("ABC-1".to_string())]
        );
    }

    #[test]
    fn worksheet_blank_and_duplicate_headers() {
        let range = sheet(&[
            &[text("qty"), Data::Empty, text("qty")],
            &[Data::Int(1), Data::Int(2), Data::Int(3)],
            &[Data::Empty, Data::Empty, Data::Empty],
        ]);
        let frame = range_to_frame(&range).unwrap();
        let names: Vec<String> = frame.get_column_names().iter().map(|n| n.to_string()).collect();
        assert_eq!(names, vec!["qty", "Unnamed: 1", "qty.1"]);
        assert_eq!(frame.height(), 1);
    }

    #[test]
    fn worksheet_with_only_a_header_has_no_rows() {
        let range = sheet(&[&[text("itembarcode"), text("description")]]);
        let frame = range_to_frame(&range).unwrap();
        assert_eq!(frame.height(), 0);
        assert_eq!(frame.width(), 2);
    }
}
