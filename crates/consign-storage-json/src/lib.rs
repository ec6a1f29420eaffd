use std::{
    cmp::Reverse,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info, warn};

use consign_domain::{Ledger, CURRENT_SCHEMA_VERSION};
use consign_engine::{
    storage::{ledger_warnings, LedgerBackupInfo, LedgerStorage},
    CoreError, CoreResult,
};

const LEDGER_EXTENSION: &str = "json";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S%3f";
const TMP_SUFFIX: &str = "tmp";
const DEFAULT_RETENTION: usize = 5;

/// Directories the storage reads from and writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoragePaths {
    pub ledger_root: PathBuf,
    pub backup_root: PathBuf,
}

/// Filesystem-backed JSON persistence for ledgers and their backups.
#[derive(Clone)]
pub struct JsonLedgerStorage {
    paths: StoragePaths,
    retention: usize,
}

impl JsonLedgerStorage {
    pub fn new(paths: StoragePaths) -> CoreResult<Self> {
        Self::with_retention(paths, DEFAULT_RETENTION)
    }

    pub fn with_retention(paths: StoragePaths, retention: usize) -> CoreResult<Self> {
        fs::create_dir_all(&paths.ledger_root)?;
        fs::create_dir_all(&paths.backup_root)?;
        Ok(Self {
            paths,
            retention: retention.max(1),
        })
    }

    pub fn paths(&self) -> &StoragePaths {
        &self.paths
    }

    pub fn ledger_path(&self, name: &str) -> PathBuf {
        self.paths
            .ledger_root
            .join(format!("{}.{}", canonical_name(name), LEDGER_EXTENSION))
    }

    /// Loads a ledger and logs every dangling reference it carries.
    pub fn load_checked(&self, name: &str) -> CoreResult<(Ledger, Vec<String>)> {
        let ledger = self.load_ledger(name)?;
        let warnings = ledger_warnings(&ledger);
        for warning in &warnings {
            warn!(ledger = %ledger.name, "{warning}");
        }
        Ok((ledger, warnings))
    }

    pub fn list_ledger_metadata(&self) -> CoreResult<Vec<LedgerMetadata>> {
        let mut entries = Vec::new();
        for slug in self.list_ledgers()? {
            let ledger = self.load_ledger(&slug)?;
            entries.push(LedgerMetadata {
                path: self.ledger_path(&slug),
                slug,
                name: ledger.name.clone(),
                created_at: ledger.created_at,
                updated_at: ledger.updated_at,
                item_count: ledger.items.len(),
                unsold_count: ledger.items.iter().filter(|item| item.is_unsold()).count(),
                payment_count: ledger.client_payments.len(),
                total_received: ledger.client_payments.iter().map(|p| p.amount).sum(),
                total_paid_out: ledger.vendor_payouts.iter().map(|p| p.amount).sum(),
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    pub fn list_backup_metadata(&self, name: &str) -> CoreResult<Vec<BackupMetadata>> {
        let mut rows: Vec<BackupMetadata> = self
            .list_backups(name)?
            .into_iter()
            .map(|entry| BackupMetadata {
                created_at: parse_backup_timestamp(&entry.id),
                size_bytes: fs::metadata(&entry.path).map(|meta| meta.len()).unwrap_or(0),
                name: entry.id,
                path: entry.path,
            })
            .collect();
        rows.sort_by_key(|meta| Reverse(meta.created_at));
        Ok(rows)
    }

    fn backup_dir(&self, name: &str) -> PathBuf {
        self.paths.backup_root.join(canonical_name(name))
    }

    // Picks a file name that does not exist yet; same-millisecond backups get a counter.
    fn next_backup_path(&self, name: &str, note: Option<&str>) -> CoreResult<(PathBuf, String)> {
        let dir = self.backup_dir(name);
        fs::create_dir_all(&dir)?;
        let timestamp = Utc::now().format(BACKUP_TIMESTAMP_FORMAT).to_string();
        let mut stem = format!("{}_{}", canonical_name(name), timestamp);
        if let Some(label) = sanitize_backup_note(note) {
            stem.push('_');
            stem.push_str(&label);
        }
        let mut path = dir.join(format!("{stem}.{LEDGER_EXTENSION}"));
        let mut counter = 1;
        while path.exists() {
            path = dir.join(format!("{stem}_{counter:03}.{LEDGER_EXTENSION}"));
            counter += 1;
        }
        Ok((path, timestamp))
    }

    fn write_backup_file(
        &self,
        ledger: &Ledger,
        name: &str,
        note: Option<&str>,
    ) -> CoreResult<LedgerBackupInfo> {
        let (path, timestamp) = self.next_backup_path(name, note)?;
        write_atomic(&path, &serialize_ledger(ledger)?)?;
        self.prune_backups(name)?;
        let id = file_name(&path)?;
        info!(ledger = %canonical_name(name), backup = %id, "created ledger backup");
        Ok(LedgerBackupInfo {
            ledger: canonical_name(name),
            id,
            created_at: timestamp,
            path,
        })
    }

    fn backup_existing_file(&self, name: &str, path: &Path) -> CoreResult<()> {
        if !path.exists() {
            return Ok(());
        }
        let (backup_path, _) = self.next_backup_path(name, None)?;
        fs::copy(path, &backup_path)?;
        debug!(backup = %backup_path.display(), "backed up ledger before overwrite");
        self.prune_backups(name)
    }

    fn prune_backups(&self, name: &str) -> CoreResult<()> {
        for entry in self.list_backups(name)?.into_iter().skip(self.retention) {
            if let Err(err) = fs::remove_file(&entry.path) {
                warn!(backup = %entry.id, %err, "failed to prune old backup");
            }
        }
        Ok(())
    }
}

impl LedgerStorage for JsonLedgerStorage {
    fn save_ledger(&self, name: &str, ledger: &Ledger) -> CoreResult<()> {
        let path = self.ledger_path(name);
        self.backup_existing_file(name, &path)?;
        save_ledger_to_path(ledger, &path)?;
        info!(ledger = %canonical_name(name), "saved ledger");
        Ok(())
    }

    fn load_ledger(&self, name: &str) -> CoreResult<Ledger> {
        let path = self.ledger_path(name);
        if !path.exists() {
            return Err(CoreError::LedgerNotFound(name.to_string()));
        }
        load_ledger_from_path(&path)
    }

    fn list_ledgers(&self) -> CoreResult<Vec<String>> {
        if !self.paths.ledger_root.exists() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.paths.ledger_root)? {
            let path = entry?.path();
            if !path.is_file() || !has_ledger_extension(&path) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn save_ledger_to_path(&self, ledger: &Ledger, path: &Path) -> CoreResult<()> {
        if path.starts_with(&self.paths.ledger_root) {
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                self.backup_existing_file(stem, path)?;
            }
        }
        save_ledger_to_path(ledger, path)
    }

    fn load_ledger_from_path(&self, path: &Path) -> CoreResult<Ledger> {
        load_ledger_from_path(path)
    }

    fn backup_ledger(
        &self,
        name: &str,
        ledger: &Ledger,
        note: Option<&str>,
    ) -> CoreResult<LedgerBackupInfo> {
        self.write_backup_file(ledger, name, note)
    }

    /// Newest first.
    fn list_backups(&self, name: &str) -> CoreResult<Vec<LedgerBackupInfo>> {
        let dir = self.backup_dir(name);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let ledger_slug = canonical_name(name);
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if !has_ledger_extension(&path) {
                continue;
            }
            if let Some(file_name) = path.file_name().and_then(|name| name.to_str()) {
                entries.push(LedgerBackupInfo {
                    ledger: ledger_slug.clone(),
                    id: file_name.to_string(),
                    created_at: parse_backup_timestamp(file_name)
                        .map(|ts| ts.format(BACKUP_TIMESTAMP_FORMAT).to_string())
                        .unwrap_or_default(),
                    path,
                });
            }
        }
        entries.sort_by(|a, b| {
            parse_backup_timestamp(&b.id)
                .cmp(&parse_backup_timestamp(&a.id))
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(entries)
    }

    fn restore_backup(&self, backup: &LedgerBackupInfo) -> CoreResult<Ledger> {
        if !backup.path.exists() {
            return Err(CoreError::Storage(format!("backup `{}` not found", backup.id)));
        }
        let ledger = load_ledger_from_path(&backup.path)?;
        let target = self.ledger_path(&backup.ledger);
        self.backup_existing_file(&backup.ledger, &target)?;
        save_ledger_to_path(&ledger, &target)?;
        info!(ledger = %backup.ledger, backup = %backup.id, "restored ledger backup");
        Ok(ledger)
    }
}

/// Saves a ledger to an arbitrary path on disk through a temp file and rename.
pub fn save_ledger_to_path(ledger: &Ledger, path: &Path) -> CoreResult<()> {
    let tmp = tmp_path(path);
    write_atomic(&tmp, &serialize_ledger(ledger)?)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Loads a ledger from the provided filesystem path.
pub fn load_ledger_from_path(path: &Path) -> CoreResult<Ledger> {
    let data = fs::read_to_string(path)?;
    let ledger: Ledger =
        serde_json::from_str(&data).map_err(|err| CoreError::Serde(err.to_string()))?;
    if ledger.schema_version > CURRENT_SCHEMA_VERSION {
        return Err(CoreError::Storage(format!(
            "ledger `{}` uses schema version {} but this build reads up to {}",
            ledger.name, ledger.schema_version, CURRENT_SCHEMA_VERSION
        )));
    }
    Ok(ledger)
}

#[derive(Debug, Clone, Serialize)]
pub struct LedgerMetadata {
    pub slug: String,
    pub name: String,
    pub path: PathBuf,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub item_count: usize,
    pub unsold_count: usize,
    pub payment_count: usize,
    pub total_received: Decimal,
    pub total_paid_out: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct BackupMetadata {
    pub name: String,
    pub created_at: Option<DateTime<Utc>>,
    pub size_bytes: u64,
    pub path: PathBuf,
}

/// File-system slug for a ledger name: lowercase ASCII alphanumerics, the rest
/// collapsed to `_`.
pub fn canonical_name(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' => c,
            _ => '_',
        })
        .collect();
    if sanitized.trim_matches('_').is_empty() {
        "ledger".into()
    } else {
        sanitized
    }
}

fn sanitize_backup_note(note: Option<&str>) -> Option<String> {
    let raw = note?.trim();
    let mut sanitized = String::new();
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            sanitized.push(ch.to_ascii_lowercase());
        } else if !sanitized.is_empty() && !sanitized.ends_with('-') {
            sanitized.push('-');
        }
    }
    let trimmed = sanitized.trim_matches('-');
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

// `<slug>_<YYYYMMDD>_<HHMMSSmmm>[_note][_NNN].json`; the slug may itself contain `_`.
fn parse_backup_timestamp(name: &str) -> Option<DateTime<Utc>> {
    let stem = name.strip_suffix(&format!(".{LEDGER_EXTENSION}"))?;
    let segments: Vec<&str> = stem.split('_').collect();
    segments.windows(2).rev().find_map(|pair| {
        let (date, time) = (pair[0], pair[1]);
        if !is_digits(date, 8) || !is_digits(time, 9) {
            return None;
        }
        NaiveDateTime::parse_from_str(&format!("{date}{time}"), "%Y%m%d%H%M%S%3f")
            .ok()
            .map(|naive| naive.and_utc())
    })
}

fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.chars().all(|c| c.is_ascii_digit())
}

fn has_ledger_extension(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some(LEDGER_EXTENSION)
}

fn file_name(path: &Path) -> CoreResult<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| CoreError::Storage(format!("invalid backup path {}", path.display())))
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{existing}.{TMP_SUFFIX}"),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_atomic(path: &Path, data: &str) -> CoreResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.sync_all()?;
    Ok(())
}

fn serialize_ledger(ledger: &Ledger) -> CoreResult<String> {
    serde_json::to_string_pretty(ledger).map_err(|err| CoreError::Serde(err.to_string()))
}
