use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};

use tree_sitter::Tree;

use crate::error::{IoError, ParserError, Result};
use crate::java::JavaParser;

const MAX_FILE_CACHE_SIZE: usize = 100;

/// A source file together with its parse tree.
pub struct CachedFile {
    pub source: String,
    pub tree: Tree,
}

/// Parsed Java files, evicted oldest-first once the cache is full.
#[derive(Default)]
pub struct FileCache {
    entries: HashMap<PathBuf, CachedFile>,
    load_order: VecDeque<PathBuf>,
}

impl FileCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&mut self, path: PathBuf, entry: CachedFile) {
        if self.entries.insert(path.clone(), entry).is_some() {
            return;
        }
        self.load_order.push_back(path);
        while self.entries.len() > MAX_FILE_CACHE_SIZE {
            let Some(oldest) = self.load_order.pop_front() else {
                break;
            };
            self.entries.remove(&oldest);
        }
    }

    pub fn get_file(&self, path: &Path) -> Option<&CachedFile> {
        self.entries.get(path)
    }

    /// Returns the cached parse of `path`, reading and parsing it first if
    /// it is not cached yet.
    pub fn get_or_load(&mut self, path: &Path, parser: &mut JavaParser) -> Result<&CachedFile> {
        if !self.entries.contains_key(path) {
            let source = fs::read_to_string(path).map_err(|e| IoError::read_error(path, e))?;
            let tree = parser
                .parse(&source)
                .ok_or_else(|| ParserError::parse_failed(path))?;
            self.add_file(path.to_path_buf(), CachedFile { source, tree });
        }
        self.entries
            .get(path)
            .ok_or_else(|| IoError::file_not_found(path).into())
    }

    pub fn file_count(&self) -> usize {
        self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.load_order.clear();
    }
}
