use crate::error::{Result, TdError};
use crate::parser::{self, FrontMatter, Task};
use chrono::{DateTime, SecondsFormat, Utc};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const CREATED: &str = "created";
pub const MODIFIED: &str = "modified";

/// ISO-8601 UTC with millisecond precision, e.g. `2026-10-19T08:31:00.123Z`.
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Resolve `path` against the current working directory.
pub fn resolve_path(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

/// Read the tasks stored at `path`. A missing file is an empty list.
pub fn read_tasks(path: &Path) -> Result<Vec<Task>> {
    let path = resolve_path(path)?;
    match std::fs::read_to_string(&path) {
        Ok(content) => {
            let tasks = parser::parse_tasks(&content);
            debug!(path = %path.display(), count = tasks.len(), "loaded tasks");
            Ok(tasks)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "no task file yet");
            Ok(Vec::new())
        }
        Err(e) => Err(e.into()),
    }
}

/// Build the metadata block for the next write.
///
/// `existing` is the current document and the file's creation time, or
/// `None` for a fresh document.
pub fn refresh_front_matter(
    existing: Option<(&str, DateTime<Utc>)>,
    now: DateTime<Utc>,
) -> FrontMatter {
    let now_stamp = timestamp(now);
    match existing {
        Some((content, file_created)) => match parser::split_front_matter(content) {
            Some((meta, _)) => {
                let mut front = FrontMatter::parse(meta);
                front.set(MODIFIED, &now_stamp);
                if front.get(CREATED).is_none() {
                    front.set(CREATED, &timestamp(file_created));
                }
                front
            }
            None => {
                let mut front = FrontMatter::default();
                front.set(CREATED, &timestamp(file_created));
                front.set(MODIFIED, &now_stamp);
                front
            }
        },
        None => {
            let mut front = FrontMatter::default();
            front.set(CREATED, &now_stamp);
            front.set(MODIFIED, &now_stamp);
            front
        }
    }
}

pub fn render_document(front: &FrontMatter, tasks: &[Task]) -> String {
    format!(
        "---\n{}\n---\n\n{}",
        front.render(),
        parser::format_tasks(tasks)
    )
}

/// Creation time of the file, falling back to its modification time and
/// then to `now` on platforms that report neither.
fn file_created(path: &Path, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let meta = std::fs::metadata(path)?;
    Ok(meta
        .created()
        .or_else(|_| meta.modified())
        .map(DateTime::<Utc>::from)
        .unwrap_or(now))
}

/// Write `tasks` to `path`, keeping the existing front matter and
/// refreshing its `modified` stamp.
pub fn write_tasks(tasks: &[Task], path: &Path) -> Result<()> {
    let path = resolve_path(path)?;
    let now = Utc::now();

    let existing = match std::fs::read_to_string(&path) {
        Ok(content) => {
            let created = file_created(&path, now)?;
            Some((content, created))
        }
        Err(e) if e.kind() == ErrorKind::NotFound => None,
        Err(e) => return Err(e.into()),
    };

    let front = refresh_front_matter(
        existing.as_ref().map(|(content, created)| (content.as_str(), *created)),
        now,
    );
    let document = render_document(&front, tasks);
    atomic_write(&path, document.as_bytes())?;
    debug!(path = %path.display(), count = tasks.len(), "wrote tasks");
    Ok(())
}

/// Replace `path` with `data` through a temp file in the same directory.
/// The permissions of an existing file carry over. A symlink is followed
/// so the link itself stays in place.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    use std::io::Write;

    let target = match std::fs::canonicalize(path) {
        Ok(resolved) => resolved,
        Err(e) if e.kind() == ErrorKind::NotFound => path.to_path_buf(),
        Err(e) => return Err(e.into()),
    };
    let path = target.as_path();
    let dir = path.parent().ok_or_else(|| {
        TdError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "path has no parent directory",
        ))
    })?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    if let Ok(meta) = std::fs::metadata(path) {
        tmp.as_file().set_permissions(meta.permissions())?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| TdError::Io(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn stamp_of(content: &str, key: &str) -> DateTime<Utc> {
        let (meta, _) = parser::split_front_matter(content).unwrap();
        let value = FrontMatter::parse(meta).get(key).unwrap().to_string();
        DateTime::parse_from_rfc3339(&value).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_absent_file_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        let tasks = read_tasks(&dir.path().join("nonexistent.md")).unwrap();
        assert!(tasks.is_empty());
    }

    #[test]
    fn test_read_failure_other_than_absence_propagates() {
        let dir = TempDir::new().unwrap();
        assert!(read_tasks(dir.path()).is_err());
    }

    #[test]
    fn test_fresh_write_stamps_both_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("todo.md");
        write_tasks(&[Task::new("buy milk")], &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(stamp_of(&content, CREATED), stamp_of(&content, MODIFIED));
        assert!(content.ends_with("---\n\n# TODO\n\n- [ ] buy milk\n"));
        assert_eq!(read_tasks(&path).unwrap(), vec![Task::new("buy milk")]);
    }

    #[test]
    fn test_second_write_keeps_created() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("todo.md");

        write_tasks(&[Task::new("a")], &path).unwrap();
        let first = std::fs::read_to_string(&path).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        write_tasks(&[Task::new("a"), Task::new("b")], &path).unwrap();
        let second = std::fs::read_to_string(&path).unwrap();

        assert_eq!(stamp_of(&first, CREATED), stamp_of(&second, CREATED));
        assert!(stamp_of(&second, MODIFIED) >= stamp_of(&first, MODIFIED));
    }

    #[test]
    fn test_existing_file_without_front_matter_gets_one() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("todo.md");
        std::fs::write(&path, "# TODO\n- [x] old\n").unwrap();

        write_tasks(&[Task::new("new")], &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();

        assert!(content.starts_with("---\ncreated: "));
        assert!(stamp_of(&content, CREATED) <= stamp_of(&content, MODIFIED));
        assert_eq!(read_tasks(&path).unwrap(), vec![Task::new("new")]);
    }

    #[test]
    fn test_unknown_front_matter_fields_survive() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("todo.md");
        std::fs::write(
            &path,
            "---\nauthor: sam\nmodified: 2020-01-01T00:00:00.000Z\n---\n\n- [ ] a\n",
        )
        .unwrap();

        write_tasks(&[Task::new("a")], &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        let (meta, _) = parser::split_front_matter(&content).unwrap();
        let front = FrontMatter::parse(meta);

        assert_eq!(front.get("author"), Some("sam"));
        assert_ne!(front.get(MODIFIED), Some("2020-01-01T00:00:00.000Z"));
        assert!(front.get(CREATED).is_some());
        assert!(meta.starts_with("author: sam\nmodified: "));
    }

    #[test]
    fn test_refresh_front_matter_backfills_created() {
        let file_created = DateTime::parse_from_rfc3339("2025-03-04T05:06:07.000Z")
            .unwrap()
            .with_timezone(&Utc);
        let now = Utc::now();
        let front = refresh_front_matter(
            Some(("---\nmodified: 2025-03-04T05:06:07.000Z\n---\n", file_created)),
            now,
        );
        assert_eq!(front.get(CREATED), Some("2025-03-04T05:06:07.000Z"));
        assert_eq!(front.get(MODIFIED), Some(timestamp(now).as_str()));
    }

    #[test]
    fn test_empty_list_writes_empty_body() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("todo.md");
        write_tasks(&[], &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.ends_with("\n---\n\n"));
        assert!(read_tasks(&path).unwrap().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_write_through_symlink_keeps_link() {
        let dir = TempDir::new().unwrap();
        let real = dir.path().join("real.md");
        let link = dir.path().join("todo.md");
        write_tasks(&[Task::new("a")], &real).unwrap();
        std::os::unix::fs::symlink(&real, &link).unwrap();

        write_tasks(&[Task::new("b")], &link).unwrap();

        assert!(std::fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(read_tasks(&real).unwrap(), vec![Task::new("b")]);
    }

    #[test]
    fn test_resolve_keeps_absolute_paths() {
        let dir = TempDir::new().unwrap();
        assert_eq!(resolve_path(dir.path()).unwrap(), dir.path());
    }
}
