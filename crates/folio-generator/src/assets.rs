//! Static file synchronization.
//!
//! Mirrors the site's files directory into the deploy directory. A file is
//! only processed when its destination is missing or older than the source,
//! so repeated builds do no redundant work. Copies keep the source's
//! modification time; transformed outputs are stamped by the command that
//! writes them.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    process::Command,
    time::SystemTime,
};

use folio_core::{CoreError, SiteConfig, config::file_pattern};
use regex::Regex;
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Asset synchronization errors.
#[derive(Debug, Error)]
pub enum AssetError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Directory walk error.
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// Invalid asset path.
    #[error("invalid asset path: {0}")]
    InvalidPath(PathBuf),

    /// Invalid exclude or include pattern.
    #[error(transparent)]
    Config(#[from] CoreError),

    /// A transform command could not run or exited unsuccessfully.
    #[error("`{command}` failed for {src}: {output}")]
    Transform {
        command: String,
        src: PathBuf,
        output: String,
    },
}

/// Result type for asset operations.
pub type Result<T> = std::result::Result<T, AssetError>;

/// How a file reaches the deploy directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transform {
    /// Byte copy, keeping the modification time.
    Copy,

    /// External command line with `{src}` and `{dest}` placeholders.
    Command(String),
}

impl Transform {
    fn apply(&self, src: &Path, dest: &Path, modified: SystemTime) -> Result<()> {
        match self {
            Self::Copy => {
                fs::copy(src, dest)?;
                fs::File::options()
                    .write(true)
                    .open(dest)?
                    .set_modified(modified)?;
                Ok(())
            }
            Self::Command(template) => run_command(template, src, dest),
        }
    }
}

fn run_command(template: &str, src: &Path, dest: &Path) -> Result<()> {
    let src_arg = src.to_string_lossy();
    let dest_arg = dest.to_string_lossy();
    let argv: Vec<String> = template
        .split_whitespace()
        .map(|token| token.replace("{src}", &src_arg).replace("{dest}", &dest_arg))
        .collect();

    let failure = |output: String| AssetError::Transform {
        command: template.to_string(),
        src: src.to_path_buf(),
        output,
    };

    let (program, args) = argv
        .split_first()
        .ok_or_else(|| failure("empty command".to_string()))?;

    debug!(program = %program, "running transform");
    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|e| failure(e.to_string()))?;

    if !output.status.success() {
        let mut message = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if message.is_empty() {
            message = String::from_utf8_lossy(&output.stdout).trim().to_string();
        }
        if message.is_empty() {
            message = output.status.to_string();
        }
        return Err(failure(message));
    }

    Ok(())
}

static COPY: Transform = Transform::Copy;

fn matches_start(pattern: &Regex, name: &str) -> bool {
    pattern.find(name).is_some_and(|m| m.start() == 0)
}

/// Counters for one synchronization run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Files copied or transformed.
    pub processed: usize,

    /// Files whose destination was already current.
    pub up_to_date: usize,

    /// Files skipped by the exclude pattern.
    pub excluded: usize,
}

/// Mirrors a source tree into a destination tree.
#[derive(Debug)]
pub struct AssetSynchronizer {
    exclude: Regex,
    include: Regex,
    rename: BTreeMap<String, String>,
    transforms: BTreeMap<String, Transform>,
}

impl AssetSynchronizer {
    /// Create a synchronizer that copies every file not excluded.
    #[must_use]
    pub fn new(exclude: Regex, include: Regex) -> Self {
        Self {
            exclude,
            include,
            rename: BTreeMap::new(),
            transforms: BTreeMap::new(),
        }
    }

    /// Build the synchronizer described by the site configuration.
    pub fn from_config(config: &SiteConfig) -> Result<Self> {
        let mut sync = Self::new(
            file_pattern(&config.files_exclude)?,
            file_pattern(&config.files_include)?,
        );
        for (from, to) in &config.files_rename {
            sync = sync.with_rename(from, to);
        }
        for (ext, command) in &config.files_transform {
            sync = sync.with_transform(ext, Transform::Command(command.clone()));
        }
        Ok(sync)
    }

    /// Give destination files ending in `from` the suffix `to` instead.
    #[must_use]
    pub fn with_rename(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.rename.insert(from.into(), to.into());
        self
    }

    /// Process source files with extension `ext` (with dot) through `transform`.
    #[must_use]
    pub fn with_transform(mut self, ext: impl Into<String>, transform: Transform) -> Self {
        self.transforms.insert(ext.into(), transform);
        self
    }

    /// Transform registered for a dotted extension; plain copy when none is.
    pub fn transform_for(&self, ext: &str) -> &Transform {
        match self.transforms.get(ext) {
            Some(transform) => transform,
            None => &COPY,
        }
    }

    /// Whether a file name is skipped. Both patterns must match at the
    /// start of the name.
    pub fn is_excluded(&self, name: &str) -> bool {
        matches_start(&self.exclude, name) && !matches_start(&self.include, name)
    }

    /// Destination file name after applying the rename table.
    pub fn dest_name(&self, name: &str) -> String {
        for (from, to) in &self.rename {
            if let Some(stem) = name.strip_suffix(from.as_str()) {
                return format!("{stem}{to}");
            }
        }
        name.to_string()
    }

    /// Synchronize `source_dir` into `dest_dir`.
    pub fn sync(&self, source_dir: &Path, dest_dir: &Path) -> Result<SyncStats> {
        let mut stats = SyncStats::default();

        if !source_dir.is_dir() {
            debug!(source = %source_dir.display(), "files directory does not exist, skipping");
            return Ok(stats);
        }

        info!(
            source = %source_dir.display(),
            dest = %dest_dir.display(),
            "synchronizing files"
        );

        for entry in WalkDir::new(source_dir).sort_by_file_name() {
            let entry = entry?;
            let relative = entry
                .path()
                .strip_prefix(source_dir)
                .map_err(|_| AssetError::InvalidPath(entry.path().to_path_buf()))?;

            if entry.file_type().is_dir() {
                fs::create_dir_all(dest_dir.join(relative))?;
                continue;
            }

            let name = entry.file_name().to_string_lossy();
            if self.is_excluded(&name) {
                debug!(file = %relative.display(), "excluded");
                stats.excluded += 1;
                continue;
            }

            let dest = dest_dir.join(relative).with_file_name(self.dest_name(&name));
            if self.sync_file(entry.path(), &dest)? {
                stats.processed += 1;
            } else {
                stats.up_to_date += 1;
            }
        }

        info!(
            processed = stats.processed,
            up_to_date = stats.up_to_date,
            excluded = stats.excluded,
            "files synchronized"
        );
        Ok(stats)
    }

    /// Bring one destination file up to date. Returns whether work was done.
    fn sync_file(&self, src: &Path, dest: &Path) -> Result<bool> {
        let modified = fs::metadata(src)?.modified()?;

        if let Ok(existing) = fs::metadata(dest)
            && existing.modified()? >= modified
        {
            return Ok(false);
        }

        let ext = src
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();

        info!("{} => {}", src.display(), dest.display());
        self.transform_for(&ext).apply(src, dest, modified)?;
        Ok(true)
    }
}
