//! Directory browser for picking tracks.
//!
//! One directory at a time: a `..` entry (unless at the filesystem root), then
//! subdirectories, then files, each group sorted by name. The browser tracks the
//! highlighted row and a scroll offset that keeps it on screen.

use log::warn;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use wavetty::constants::PLAYABLE_EXTENSIONS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Parent,
    Directory,
    File,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub path: PathBuf,
    pub kind: EntryKind,
}

impl Entry {
    pub fn is_playable(&self) -> bool {
        self.kind == EntryKind::File && is_playable(&self.path)
    }

    /// Row text as shown in the listing.
    pub fn label(&self) -> String {
        match self.kind {
            EntryKind::Parent => " ..".to_string(),
            EntryKind::Directory => format!(" [D] {}/", self.name),
            EntryKind::File => format!(" [F] {}", self.name),
        }
    }
}

pub struct Browser {
    pub dir: PathBuf,
    pub entries: Vec<Entry>,
    pub selected: usize,
    pub offset: usize,
}

impl Browser {
    pub fn new(dir: &Path) -> Self {
        let mut browser = Self {
            dir: dir.to_path_buf(),
            entries: Vec::new(),
            selected: 0,
            offset: 0,
        };
        if let Err(e) = browser.scan_directory(dir) {
            warn!("Could not list {}: {e}", dir.display());
        }
        browser
    }

    /// Replace the listing with the contents of `path` and reset the cursor.
    /// On error the previous listing is kept.
    pub fn scan_directory(&mut self, path: &Path) -> io::Result<()> {
        let dir = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        let mut dirs = Vec::new();
        let mut files = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry in {}: {e}", dir.display());
                    continue;
                }
            };
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().to_string();
            if path.is_dir() {
                dirs.push(Entry {
                    name,
                    path,
                    kind: EntryKind::Directory,
                });
            } else {
                files.push(Entry {
                    name,
                    path,
                    kind: EntryKind::File,
                });
            }
        }
        dirs.sort_by(|a, b| a.name.cmp(&b.name));
        files.sort_by(|a, b| a.name.cmp(&b.name));

        let mut entries = Vec::with_capacity(dirs.len() + files.len() + 1);
        if let Some(parent) = dir.parent() {
            entries.push(Entry {
                name: "..".to_string(),
                path: parent.to_path_buf(),
                kind: EntryKind::Parent,
            });
        }
        entries.extend(dirs);
        entries.extend(files);

        self.dir = dir;
        self.entries = entries;
        self.selected = 0;
        self.offset = 0;
        Ok(())
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.entries.len() {
            self.selected += 1;
        }
    }

    pub fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn selected_entry(&self) -> Option<&Entry> {
        self.entries.get(self.selected)
    }

    /// Scroll so the highlighted row is inside a window of `rows` lines.
    pub fn ensure_visible(&mut self, rows: usize) {
        let rows = rows.max(1);
        if self.selected < self.offset {
            self.offset = self.selected;
        }
        if self.selected >= self.offset + rows {
            self.offset = self.selected + 1 - rows;
        }
        self.offset = self.offset.min(self.entries.len().saturating_sub(rows));
    }

    /// Every playable file in the current directory, in listing order.
    pub fn playable_files(&self) -> Vec<PathBuf> {
        self.entries
            .iter()
            .filter(|e| e.is_playable())
            .map(|e| e.path.clone())
            .collect()
    }
}

pub fn is_playable(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            PLAYABLE_EXTENSIONS
                .iter()
                .any(|p| p.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn populated_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("zeta")).unwrap();
        fs::create_dir(dir.path().join("alpha")).unwrap();
        fs::write(dir.path().join("b.mp3"), b"").unwrap();
        fs::write(dir.path().join("a.wav"), b"").unwrap();
        fs::write(dir.path().join("notes.txt"), b"").unwrap();
        fs::write(dir.path().join("C.FLAC"), b"").unwrap();
        dir
    }

    #[test]
    fn test_is_playable() {
        assert!(is_playable(Path::new("song.mp3")));
        assert!(is_playable(Path::new("take.WAV")));
        assert!(is_playable(Path::new("mix.flac")));
        assert!(!is_playable(Path::new("cover.jpg")));
        assert!(!is_playable(Path::new("README")));
    }

    #[test]
    fn test_listing_order() {
        let dir = populated_dir();
        let browser = Browser::new(dir.path());

        let names: Vec<&str> = browser.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["..", "alpha", "zeta", "C.FLAC", "a.wav", "b.mp3", "notes.txt"]
        );
        assert_eq!(browser.entries[0].kind, EntryKind::Parent);
        assert_eq!(browser.entries[1].label(), " [D] alpha/");
        assert_eq!(browser.entries[4].label(), " [F] a.wav");
    }

    #[test]
    fn test_playable_files() {
        let dir = populated_dir();
        let browser = Browser::new(dir.path());

        let files: Vec<String> = browser
            .playable_files()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(files, vec!["C.FLAC", "a.wav", "b.mp3"]);
    }

    #[test]
    fn test_navigation_stays_in_bounds() {
        let dir = populated_dir();
        let mut browser = Browser::new(dir.path());

        browser.select_previous();
        assert_eq!(browser.selected, 0);

        for _ in 0..20 {
            browser.select_next();
        }
        assert_eq!(browser.selected, browser.entries.len() - 1);
        assert_eq!(browser.selected_entry().unwrap().name, "notes.txt");
    }

    #[test]
    fn test_ensure_visible_scrolls() {
        let dir = populated_dir();
        let mut browser = Browser::new(dir.path());

        for _ in 0..5 {
            browser.select_next();
        }
        browser.ensure_visible(3);
        assert_eq!(browser.offset, 3);

        browser.selected = 1;
        browser.ensure_visible(3);
        assert_eq!(browser.offset, 1);

        // A taller window never scrolls past the end
        browser.ensure_visible(100);
        assert_eq!(browser.offset, 0);
    }

    #[test]
    fn test_enter_directory_and_back() {
        let dir = populated_dir();
        let mut browser = Browser::new(dir.path());
        let root = browser.dir.clone();

        let alpha = browser.entries[1].path.clone();
        browser.scan_directory(&alpha).unwrap();
        assert!(browser.dir.ends_with("alpha"));
        assert_eq!(browser.entries.len(), 1);

        let parent = browser.entries[0].path.clone();
        browser.scan_directory(&parent).unwrap();
        assert_eq!(browser.dir, root);
    }

    #[test]
    fn test_failed_scan_keeps_listing() {
        let dir = populated_dir();
        let mut browser = Browser::new(dir.path());
        let before = browser.entries.clone();

        assert!(
            browser
                .scan_directory(&dir.path().join("missing"))
                .is_err()
        );
        assert_eq!(browser.entries, before);
    }
}
