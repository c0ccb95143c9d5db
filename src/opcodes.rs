use std::{
    collections::HashMap,
    fmt,
    fs::File,
    io,
    path::{Path, PathBuf},
};

use thiserror::Error;

/// Category used for rows without a category column.
pub const DEFAULT_CATEGORY: &str = "Opcode";

#[derive(Error, Debug)]
pub enum TableError {
    #[error("Opcode table not found: {}", path.display())]
    NotFound { path: PathBuf },
    #[error("Malformed opcode table {}, line {line}: {reason}", path.display())]
    Malformed {
        path: PathBuf,
        line: u64,
        reason: String,
    },
    #[error("Unable to parse opcode table {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("Unable to read opcode table {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A single row of the opcode table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpcodeEntry {
    /// Canonical mnemonic, e.g. `MOV`
    pub mnemonic: String,
    /// Human readable description shown on hover
    pub description: String,
    /// Free form grouping such as `Opcode` or `Directive`
    pub category: String,
}

impl fmt::Display for OpcodeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.mnemonic, self.category, self.description)
    }
}

/// Where the interesting columns live in a table row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Columns {
    mnemonic: usize,
    description: usize,
    category: Option<usize>,
}

impl Columns {
    const POSITIONAL: Columns = Columns {
        mnemonic: 0,
        description: 1,
        category: Some(2),
    };

    /// Locate the columns by name if `record` is a header row.
    fn from_header(record: &csv::StringRecord) -> Option<Columns> {
        fn find(record: &csv::StringRecord, names: &[&str]) -> Option<usize> {
            record
                .iter()
                .position(|field| names.iter().any(|name| field.eq_ignore_ascii_case(name)))
        }

        let mnemonic = find(record, &["mnemonic"])?;
        Some(Columns {
            mnemonic,
            description: find(record, &["description"]).unwrap_or(mnemonic + 1),
            category: find(record, &["category", "type"]),
        })
    }

    fn required(&self) -> usize {
        self.mnemonic.max(self.description) + 1
    }
}

/// Mapping from canonical mnemonic to its table entry.
#[derive(Debug, Default)]
pub struct OpcodeTable {
    entries: HashMap<String, OpcodeEntry>,
    case_sensitive: bool,
}

impl OpcodeTable {
    pub fn new(case_sensitive: bool) -> Self {
        Self {
            entries: HashMap::new(),
            case_sensitive,
        }
    }

    /// Load a table with case insensitive mnemonics.
    pub fn load(path: &Path) -> Result<Self, TableError> {
        Self::load_with(path, false)
    }

    #[tracing::instrument]
    pub fn load_with(path: &Path, case_sensitive: bool) -> Result<Self, TableError> {
        let file = File::open(path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => TableError::NotFound {
                path: path.to_owned(),
            },
            _ => TableError::Io {
                path: path.to_owned(),
                source,
            },
        })?;

        let table = Self::from_reader(file, path, case_sensitive)?;
        tracing::debug!("Loaded {} opcodes from {}", table.len(), path.display());
        Ok(table)
    }

    /// Parse a table from any reader. `origin` is only used in error messages.
    pub fn from_reader<R: io::Read>(
        reader: R,
        origin: &Path,
        case_sensitive: bool,
    ) -> Result<Self, TableError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .comment(Some(b'#'))
            .from_reader(reader);

        let mut table = Self::new(case_sensitive);
        let mut columns = None;

        for result in reader.records() {
            let record = result.map_err(|source| TableError::Csv {
                path: origin.to_owned(),
                source,
            })?;
            let line = record.position().map_or(0, |pos| pos.line());

            if record.iter().all(str::is_empty) {
                continue;
            }

            let layout = match columns {
                Some(layout) => layout,
                None => {
                    let layout = Columns::from_header(&record);
                    columns = Some(layout.unwrap_or(Columns::POSITIONAL));
                    if layout.is_some() {
                        continue;
                    }
                    Columns::POSITIONAL
                }
            };

            let malformed = |reason: String| TableError::Malformed {
                path: origin.to_owned(),
                line,
                reason,
            };

            if record.len() < layout.required() {
                return Err(malformed(format!(
                    "expected at least {} columns, found {}",
                    layout.required(),
                    record.len()
                )));
            }

            let mnemonic = &record[layout.mnemonic];
            if mnemonic.is_empty() {
                return Err(malformed("empty mnemonic".to_owned()));
            }

            let category = layout
                .category
                .and_then(|ix| record.get(ix))
                .filter(|category| !category.is_empty())
                .unwrap_or(DEFAULT_CATEGORY);

            table.insert(OpcodeEntry {
                mnemonic: mnemonic.to_owned(),
                description: record[layout.description].to_owned(),
                category: category.to_owned(),
            });
        }

        Ok(table)
    }

    /// Add an entry unless its mnemonic is already present. The first definition wins.
    pub fn insert(&mut self, mut entry: OpcodeEntry) -> bool {
        let key = self.canonicalize(&entry.mnemonic);
        if self.entries.contains_key(&key) {
            tracing::warn!("Ignoring duplicate opcode table entry '{}'", entry.mnemonic);
            return false;
        }
        entry.mnemonic = key.clone();
        self.entries.insert(key, entry);
        true
    }

    pub fn lookup(&self, token: &str) -> Option<&OpcodeEntry> {
        self.entries.get(&self.canonicalize(token))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    fn canonicalize(&self, mnemonic: &str) -> String {
        let mnemonic = mnemonic.trim();
        if self.case_sensitive {
            mnemonic.to_owned()
        } else {
            mnemonic.to_uppercase()
        }
    }
}

impl FromIterator<(&'static str, &'static str)> for OpcodeTable {
    fn from_iter<I: IntoIterator<Item = (&'static str, &'static str)>>(iter: I) -> Self {
        let mut table = OpcodeTable::new(false);
        for (mnemonic, description) in iter {
            table.insert(OpcodeEntry {
                mnemonic: mnemonic.to_owned(),
                description: description.to_owned(),
                category: DEFAULT_CATEGORY.to_owned(),
            });
        }
        table
    }
}
