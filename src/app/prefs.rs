// src/app/prefs.rs
use std::path::{Path, PathBuf};
use std::{fs, io};

use tracing::warn;

/// Durable session memory: the last page the user was looking at.
///
/// Stored as a tiny `key=value` text file so it survives restarts.
#[derive(Clone, Debug)]
pub struct SessionPrefs {
    path: Option<PathBuf>,
    remembered_page: Option<u32>,
}

impl SessionPrefs {
    /// Load from disk. A missing or unreadable file just means "nothing remembered".
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let remembered_page = match fs::read_to_string(&path) {
            Ok(txt) => parse_prefs(&txt),
            Err(err) if err.kind() == io::ErrorKind::NotFound => None,
            Err(err) => {
                warn!("failed to read session prefs {}: {err}", path.display());
                None
            }
        };
        Self {
            path: Some(path),
            remembered_page,
        }
    }

    /// Prefs that never touch the filesystem.
    pub fn in_memory(remembered_page: Option<u32>) -> Self {
        Self {
            path: None,
            remembered_page: remembered_page.filter(|p| *p >= 1),
        }
    }

    pub fn remembered_page(&self) -> Option<u32> {
        self.remembered_page
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Remember `page` and write it through immediately.
    pub fn remember_page(&mut self, page: u32) {
        self.remembered_page = Some(page);
        if let Err(err) = self.save() {
            warn!("failed to persist session prefs: {err}");
        }
    }

    fn save(&self) -> io::Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let txt = format!(
            "# cinedex session\n\
             remembered_page={}\n",
            self.remembered_page.unwrap_or(1)
        );
        fs::write(path, txt)
    }
}

fn parse_prefs(txt: &str) -> Option<u32> {
    let mut page = None;
    for line in txt.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((k, v)) = line.split_once('=') else {
            continue;
        };
        if k.trim() == "remembered_page" {
            page = v.trim().parse::<u32>().ok().filter(|n| *n >= 1);
        }
    }
    page
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_remembers_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = SessionPrefs::load(dir.path().join("session_prefs.txt"));
        assert_eq!(prefs.remembered_page(), None);
    }

    #[test]
    fn write_then_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session_prefs.txt");
        let mut prefs = SessionPrefs::load(&path);
        prefs.remember_page(17);

        let reloaded = SessionPrefs::load(&path);
        assert_eq!(reloaded.remembered_page(), Some(17));
    }

    #[test]
    fn ignores_junk_and_zero() {
        assert_eq!(parse_prefs("# header\nremembered_page = 4\nother=1\n"), Some(4));
        assert_eq!(parse_prefs("remembered_page=0"), None);
        assert_eq!(parse_prefs("remembered_page=abc"), None);
        assert_eq!(parse_prefs("garbage line"), None);
    }

    #[test]
    fn in_memory_never_writes() {
        let mut prefs = SessionPrefs::in_memory(Some(3));
        prefs.remember_page(9);
        assert_eq!(prefs.remembered_page(), Some(9));
        assert!(prefs.path().is_none());
    }
}
