/// Depth-first iterator over all files on an ATR image

use crate::filesystem::Directory;
use crate::format::constants::MAX_DIRECTORY_DEPTH;
use crate::image::AtrImage;
use crate::io::SectorSource;
use log::{trace, warn};

/// Iterator over every file in the directory tree, yielding full paths
///
/// Descent stops at [`MAX_DIRECTORY_DEPTH`] levels; deeper directories are
/// skipped. A subdirectory whose first sector is already open on the stack
/// (a cycle in a corrupted image) is skipped as well.
pub struct RecursiveLister<'a, S> {
    directories: Vec<Directory<'a, S>>,
    /// Path of the innermost open directory, with trailing slash
    directory_path: String,
    file_path: String,
}

impl<'a, S: SectorSource> RecursiveLister<'a, S> {
    /// Start listing a disk image from its root directory
    pub fn new(disk: &'a AtrImage<S>) -> Self {
        let mut directories = Vec::with_capacity(MAX_DIRECTORY_DEPTH);
        directories.push(Directory::root(disk));
        Self {
            directories,
            directory_path: String::new(),
            file_path: String::new(),
        }
    }

    /// Current depth (0 for the root directory)
    pub fn depth(&self) -> usize {
        self.directories.len() - 1
    }

    /// Advance to the next file
    ///
    /// Returns the full path of the file (e.g. `DIR/SUB/FILE.EXT`), borrowed
    /// until the next call, or `None` once the whole tree has been listed.
    pub fn next_file(&mut self) -> Option<&str> {
        loop {
            let depth = self.depth();
            if !self.directories[depth].advance() {
                if depth == 0 {
                    return None;
                }
                self.directories.pop();
                self.pop_directory_path();
                continue;
            }

            let directory = &self.directories[depth];
            if !directory.is_entry_directory() {
                self.file_path.clear();
                self.file_path.push_str(&self.directory_path);
                self.file_path.push_str(directory.filename());
                return Some(&self.file_path);
            }

            if depth + 1 >= MAX_DIRECTORY_DEPTH {
                trace!(
                    "Not descending into {}{}: depth limit reached",
                    self.directory_path,
                    directory.filename()
                );
                continue;
            }

            let first_sector = directory.entry_first_sector();
            if self.directories.iter().any(|d| d.first_sector() == first_sector) {
                warn!(
                    "Directory {}{} loops back to sector {}",
                    self.directory_path,
                    directory.filename(),
                    first_sector
                );
                continue;
            }

            let child = Directory::open(directory);
            self.directory_path.push_str(directory.filename());
            self.directory_path.push('/');
            self.directories.push(child);
        }
    }

    /// Strip the last `NAME/` component from the directory path
    fn pop_directory_path(&mut self) {
        let parent = self.directory_path.trim_end_matches('/');
        let len = parent.rfind('/').map_or(0, |i| i + 1);
        self.directory_path.truncate(len);
    }

    /// Directory iterator pointing at the file returned by [`RecursiveLister::next_file`]
    pub fn directory(&self) -> &Directory<'a, S> {
        &self.directories[self.depth()]
    }
}
