//! Time-rotated log files with a stable link to the current one.
//!
//! Naming inside the log directory, for prefix `zap` and minutely rotation:
//! ```text
//! zap-202610191405.log          general stream, one file per period
//! zap.log -> zap-202610191405.log
//! zap-202610191405-error.log    tagged stream
//! zap-error.log -> zap-202610191405-error.log
//! ```
//! Files whose period started more than the retention window ago are removed
//! whenever a new file is opened. Streams sharing a directory only ever prune
//! their own files.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{Local, NaiveDateTime, Timelike};
use tracing_subscriber::fmt::writer::MakeWriter;

use crate::config::schema::RotationPolicy;

const STAMP_FORMAT: &str = "%Y%m%d%H%M";
const STAMP_LEN: usize = 12;
const EXTENSION: &str = ".log";

/// File naming for one stream: `<prefix>-<stamp>[-<tag>].log`, linked from
/// `<prefix>[-<tag>].log`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePattern {
    prefix: String,
    tag: Option<String>,
}

impl FilePattern {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            tag: None,
        }
    }

    pub fn tagged(prefix: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            tag: Some(tag.into()),
        }
    }

    fn tail(&self) -> String {
        match &self.tag {
            Some(tag) => format!("-{tag}{EXTENSION}"),
            None => EXTENSION.to_string(),
        }
    }

    /// Name of the file holding records for the period starting at `start`.
    pub fn file_name(&self, start: NaiveDateTime) -> String {
        format!("{}-{}{}", self.prefix, start.format(STAMP_FORMAT), self.tail())
    }

    /// Name of the stable link to the current file.
    pub fn link_name(&self) -> String {
        format!("{}{}", self.prefix, self.tail())
    }

    /// Period start encoded in `name`, if `name` belongs to this stream.
    pub fn parse(&self, name: &str) -> Option<NaiveDateTime> {
        let stamp = name
            .strip_prefix(self.prefix.as_str())?
            .strip_prefix('-')?
            .strip_suffix(self.tail().as_str())?;
        if stamp.len() != STAMP_LEN || !stamp.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        NaiveDateTime::parse_from_str(stamp, STAMP_FORMAT).ok()
    }
}

/// Start of the rotation period containing `now`.
fn period_start(rotation: RotationPolicy, now: NaiveDateTime) -> NaiveDateTime {
    let truncated = match rotation {
        RotationPolicy::Minutely | RotationPolicy::Never => now.date().and_hms_opt(now.hour(), now.minute(), 0),
        RotationPolicy::Hourly => now.date().and_hms_opt(now.hour(), 0, 0),
        RotationPolicy::Daily => now.date().and_hms_opt(0, 0, 0),
    };
    truncated.unwrap_or(now)
}

fn next_rollover(rotation: RotationPolicy, start: NaiveDateTime) -> Option<NaiveDateTime> {
    let interval = chrono::Duration::from_std(rotation.interval()?).ok()?;
    start.checked_add_signed(interval)
}

struct State {
    file: File,
    next_rollover: Option<NaiveDateTime>,
}

struct Inner {
    directory: PathBuf,
    pattern: FilePattern,
    rotation: RotationPolicy,
    max_age: Duration,
    state: Mutex<State>,
}

/// Shared handle onto one rotating stream.
///
/// Every clone writes to the same current file; each write is appended
/// under the stream's lock.
#[derive(Clone)]
pub struct RollingFile {
    inner: Arc<Inner>,
}

impl RollingFile {
    /// Create the directory if needed, open the file for the current period
    /// and point the link at it.
    pub fn open(
        directory: &Path,
        pattern: FilePattern,
        rotation: RotationPolicy,
        max_age: Duration,
    ) -> io::Result<Self> {
        fs::create_dir_all(directory)?;
        let now = Local::now().naive_local();
        let start = period_start(rotation, now);
        let file = open_period(directory, &pattern, start)?;
        let inner = Inner {
            directory: directory.to_path_buf(),
            pattern,
            rotation,
            max_age,
            state: Mutex::new(State {
                file,
                next_rollover: next_rollover(rotation, start),
            }),
        };
        inner.prune(now);
        Ok(Self { inner: Arc::new(inner) })
    }

    pub fn directory(&self) -> &Path {
        &self.inner.directory
    }

    pub fn link_path(&self) -> PathBuf {
        self.inner.directory.join(self.inner.pattern.link_name())
    }

    /// Flush the current file to disk. The stream stays usable.
    pub fn sync(&self) -> io::Result<()> {
        let state = self.inner.lock();
        state.file.sync_data()
    }

    fn write_record(&self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.inner.lock();
        let now = Local::now().naive_local();
        if state.next_rollover.is_some_and(|at| now >= at) {
            self.inner.roll(&mut state, now);
        }
        state.file.write_all(buf)?;
        Ok(buf.len())
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Switch to the file of the period containing `now`. On failure the
    /// previous file keeps receiving records until the next period.
    fn roll(&self, state: &mut State, now: NaiveDateTime) {
        let start = period_start(self.rotation, now);
        state.next_rollover = next_rollover(self.rotation, start);
        match open_period(&self.directory, &self.pattern, start) {
            Ok(file) => {
                let _ = state.file.flush();
                state.file = file;
                self.prune(now);
            }
            Err(err) => eprintln!("log rotation in {} failed: {err}", self.directory.display()),
        }
    }

    /// Remove this stream's files whose period began before the retention window.
    fn prune(&self, now: NaiveDateTime) {
        let Ok(max_age) = chrono::Duration::from_std(self.max_age) else {
            return;
        };
        let Some(cutoff) = now.checked_sub_signed(max_age) else {
            return;
        };
        let Ok(entries) = fs::read_dir(&self.directory) else {
            return;
        };
        for entry in entries.filter_map(Result::ok) {
            let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
            let name = entry.file_name();
            let started = name.to_str().and_then(|name| self.pattern.parse(name));
            if is_file && started.is_some_and(|started| started < cutoff) {
                let _ = fs::remove_file(entry.path());
            }
        }
    }
}

fn open_period(directory: &Path, pattern: &FilePattern, start: NaiveDateTime) -> io::Result<File> {
    let name = pattern.file_name(start);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(directory.join(&name))?;
    refresh_link(&directory.join(pattern.link_name()), &name)?;
    Ok(file)
}

/// Point `link` at `target`, a file name in the link's own directory.
#[cfg(unix)]
fn refresh_link(link: &Path, target: &str) -> io::Result<()> {
    match fs::remove_file(link) {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => return Err(err),
    }
    std::os::unix::fs::symlink(target, link)
}

#[cfg(not(unix))]
fn refresh_link(_link: &Path, _target: &str) -> io::Result<()> {
    Ok(())
}

/// Writer handed out per record.
pub struct RollingWriter<'a> {
    file: &'a RollingFile,
}

impl Write for RollingWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write_record(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.inner.lock().file.flush()
    }
}

impl<'a> MakeWriter<'a> for RollingFile {
    type Writer = RollingWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        RollingWriter { file: self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .and_then(|date| date.and_hms_opt(h, mi, 0))
            .unwrap()
    }

    #[test]
    fn names_for_plain_and_tagged_streams() {
        let start = at(2026, 10, 19, 14, 5);
        let general = FilePattern::new("zap");
        let errors = FilePattern::tagged("zap", "error");

        assert_eq!(general.file_name(start), "zap-202610191405.log");
        assert_eq!(general.link_name(), "zap.log");
        assert_eq!(errors.file_name(start), "zap-202610191405-error.log");
        assert_eq!(errors.link_name(), "zap-error.log");
    }

    #[test]
    fn streams_only_claim_their_own_files() {
        let general = FilePattern::new("zap");
        let errors = FilePattern::tagged("zap", "error");

        assert_eq!(general.parse("zap-202610191405.log"), Some(at(2026, 10, 19, 14, 5)));
        assert_eq!(general.parse("zap-202610191405-error.log"), None);
        assert_eq!(errors.parse("zap-202610191405-error.log"), Some(at(2026, 10, 19, 14, 5)));
        assert_eq!(errors.parse("zap-202610191405.log"), None);
        assert_eq!(general.parse("zap.log"), None);
        assert_eq!(general.parse("zap-2026101914.log"), None);
        assert_eq!(general.parse("other-202610191405.log"), None);
    }

    #[test]
    fn periods_truncate_to_the_rotation_unit() {
        let now = NaiveDate::from_ymd_opt(2026, 10, 19)
            .and_then(|d| d.and_hms_opt(14, 5, 42))
            .unwrap();
        assert_eq!(period_start(RotationPolicy::Minutely, now), at(2026, 10, 19, 14, 5));
        assert_eq!(period_start(RotationPolicy::Hourly, now), at(2026, 10, 19, 14, 0));
        assert_eq!(period_start(RotationPolicy::Daily, now), at(2026, 10, 19, 0, 0));

        let start = at(2026, 10, 19, 23, 59);
        assert_eq!(next_rollover(RotationPolicy::Minutely, start), Some(at(2026, 10, 20, 0, 0)));
        assert_eq!(next_rollover(RotationPolicy::Never, start), None);
    }

    #[test]
    fn open_creates_directory_file_and_link() {
        let dir = tempfile::tempdir().unwrap();
        let log_dir = dir.path().join("nested").join("log");
        let file = RollingFile::open(
            &log_dir,
            FilePattern::new("zap"),
            RotationPolicy::Minutely,
            Duration::from_secs(7 * 24 * 60 * 60),
        )
        .unwrap();

        file.make_writer().write_all(b"first line\n").unwrap();
        file.sync().unwrap();
        file.make_writer().write_all(b"after sync\n").unwrap();

        let files: Vec<_> = fs::read_dir(&log_dir)
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().unwrap().is_file())
            .collect();
        assert_eq!(files.len(), 1);
        let name = files[0].file_name().into_string().unwrap();
        assert!(FilePattern::new("zap").parse(&name).is_some(), "{name}");

        #[cfg(unix)]
        {
            assert_eq!(fs::read_link(file.link_path()).unwrap(), PathBuf::from(&name));
            assert_eq!(fs::read_to_string(file.link_path()).unwrap(), "first line\nafter sync\n");
        }
    }

    #[test]
    fn expired_files_of_the_same_stream_are_pruned() {
        let dir = tempfile::tempdir().unwrap();
        let stale = ["zap-200001010000.log", "zap-200001010000-error.log", "keep-200001010000.log"];
        for name in stale {
            fs::write(dir.path().join(name), b"old").unwrap();
        }

        RollingFile::open(
            dir.path(),
            FilePattern::new("zap"),
            RotationPolicy::Minutely,
            Duration::from_secs(24 * 60 * 60),
        )
        .unwrap();

        assert!(!dir.path().join("zap-200001010000.log").exists());
        assert!(dir.path().join("zap-200001010000-error.log").exists());
        assert!(dir.path().join("keep-200001010000.log").exists());
    }

    #[test]
    fn unopenable_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("occupied");
        fs::write(&blocker, b"not a directory").unwrap();

        let result = RollingFile::open(&blocker, FilePattern::new("zap"), RotationPolicy::Minutely, Duration::from_secs(60));
        assert!(result.is_err());
    }
}
