//! Recursive traversal, built on a stack of [`DirIterator`]s rather than
//! actual call-stack recursion, so depth is bounded only by heap memory.

use tracing::instrument;

use crate::error::Result;
use crate::path::{FsPath, FsPathBuf};
use crate::query::FileType;

use super::{DirEntry, DirIterator, IterateOptions};

/// A recursive directory walk, pre-order by default or post-order with
/// [`IterateOptions::CHILDREN_FIRST`].
///
/// Internally every nested [`DirIterator`] is opened with full paths
/// forced on (descending requires the full path regardless of what the
/// caller asked to see); the public-facing path is trimmed back down to
/// just the entry name on the way out when the caller didn't request
/// [`IterateOptions::FULL_PATHS`].
pub struct RecursiveDirIterator {
    // Each frame pairs an open directory stream with the entry that caused
    // it to be pushed (`None` for the root). In `CHILDREN_FIRST` mode that
    // entry is yielded only once its frame is exhausted and popped.
    stack: Vec<(DirIterator, Option<DirEntry>)>,
    options: IterateOptions,
    max_depth: Option<usize>,
    stopped: bool,
}

impl RecursiveDirIterator {
    #[instrument(skip(options), level = "trace")]
    pub fn new(p: &FsPath, options: IterateOptions, max_depth: Option<usize>) -> Result<Self> {
        let root = DirIterator::new(p, options | IterateOptions::FULL_PATHS)?;
        Ok(Self {
            stack: vec![(root, None)],
            options,
            max_depth,
            stopped: false,
        })
    }

    fn internal_options(&self) -> IterateOptions {
        self.options | IterateOptions::FULL_PATHS
    }

    fn should_descend(&self, entry: &DirEntry) -> bool {
        match entry.file_type {
            Some(FileType::Directory) => true,
            Some(FileType::Symlink) if self.options.contains(IterateOptions::FOLLOW_SYMLINKS) => {
                crate::query::get_filesystem_type(entry.path.as_path())
                    .map(|t| t == FileType::Directory)
                    .unwrap_or(false)
            }
            _ => false,
        }
    }

    fn finalize(&self, mut entry: DirEntry) -> DirEntry {
        if !self.options.contains(IterateOptions::FULL_PATHS) {
            entry.path = FsPathBuf::from(crate::path::filename(entry.path.as_path()));
        }
        entry
    }

    fn next_children_first(&mut self) -> Option<Result<DirEntry>> {
        loop {
            let top = self.stack.len().checked_sub(1)?;
            let item = self.stack[top].0.next();
            match item {
                Some(Ok(mut entry)) => {
                    entry.depth = top;
                    if self.max_depth.map_or(true, |m| top < m) && self.should_descend(&entry) {
                        match DirIterator::new(entry.path.as_path(), self.internal_options()) {
                            Ok(child) => {
                                self.stack.push((child, Some(entry)));
                                continue;
                            }
                            Err(e) => {
                                if self.options.contains(IterateOptions::STOP_ON_ERROR) {
                                    self.stopped = true;
                                    return Some(Err(e));
                                }
                                tracing::debug!(?e, "failed to descend, yielding entry instead");
                                return Some(Ok(self.finalize(entry)));
                            }
                        }
                    }
                    return Some(Ok(self.finalize(entry)));
                }
                Some(Err(e)) => {
                    if self.options.contains(IterateOptions::STOP_ON_ERROR) {
                        self.stopped = true;
                        return Some(Err(e));
                    }
                    tracing::debug!(?e, "swallowing entry error, continuing with next sibling");
                    continue;
                }
                None => {
                    let (_, pending) = self.stack.pop().unwrap();
                    if let Some(entry) = pending {
                        return Some(Ok(self.finalize(entry)));
                    }
                    // Root exhausted with nothing pending: keep looping so an
                    // empty stack correctly yields `None` next iteration.
                    if self.stack.is_empty() {
                        return None;
                    }
                }
            }
        }
    }

    fn next_pre_order(&mut self) -> Option<Result<DirEntry>> {
        loop {
            let top = self.stack.len().checked_sub(1)?;
            let item = self.stack[top].0.next();
            match item {
                Some(Ok(mut entry)) => {
                    entry.depth = top;
                    let result = entry.clone();
                    if self.max_depth.map_or(true, |m| top < m) && self.should_descend(&entry) {
                        match DirIterator::new(entry.path.as_path(), self.internal_options()) {
                            Ok(child) => self.stack.push((child, None)),
                            Err(e) => {
                                if self.options.contains(IterateOptions::STOP_ON_ERROR) {
                                    self.stopped = true;
                                    return Some(Err(e));
                                }
                                tracing::debug!(?e, "failed to descend into directory");
                            }
                        }
                    }
                    return Some(Ok(self.finalize(result)));
                }
                Some(Err(e)) => {
                    if self.options.contains(IterateOptions::STOP_ON_ERROR) {
                        self.stopped = true;
                        return Some(Err(e));
                    }
                    tracing::debug!(?e, "swallowing entry error, continuing with next sibling");
                    continue;
                }
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

impl Iterator for RecursiveDirIterator {
    type Item = Result<DirEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.stopped {
            return None;
        }
        if self.options.contains(IterateOptions::CHILDREN_FIRST) {
            self.next_children_first()
        } else {
            self.next_pre_order()
        }
    }
}
