//! Run and per-file contexts handed to the rules.

use crate::front_matter::{self, FrontMatter, PageType};
use crate::page::{Block, BlockKind, Page};
use escheck_core::{Catalog, Section};
use eyre::{Result, WrapErr};
use globset::GlobSet;
use rayon::prelude::*;
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, Mutex, MutexGuard, PoisonError};

/// Where the JavaScript reference lives inside a content checkout.
pub const JAVASCRIPT_DIR: &str = "files/en-us/web/javascript";

static MACRO_ONLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\{\{.*\}\}$").expect("valid regex"));

/// One parsed documentation page.
#[derive(Debug, Clone)]
pub struct Document {
    pub path: PathBuf,
    pub front_matter: FrontMatter,
    pub page: Page,
}

impl Document {
    pub fn parse(path: impl Into<PathBuf>, source: &str) -> Result<Self> {
        let path = path.into();
        let (yaml, body) = front_matter::split(source)
            .ok_or_else(|| eyre::eyre!("Missing front matter on {}", path.display()))?;
        let front_matter = front_matter::parse(yaml, &path.display().to_string())?;
        Ok(Self {
            path,
            front_matter,
            page: Page::parse(body),
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read {}", path.display()))?;
        Self::parse(path, &source)
    }
}

/// Memoized page descriptions, keyed by page directory.
///
/// Values are computed outside the lock; concurrent callers may compute the
/// same entry twice, and the first insert wins.
#[derive(Debug, Default)]
pub struct DescriptionCache {
    entries: Mutex<HashMap<PathBuf, String>>,
}

impl DescriptionCache {
    fn lock(&self) -> MutexGuard<'_, HashMap<PathBuf, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The cached value for `key`, computing it on a miss. Misses that
    /// compute to `None` are not cached and yield an empty string.
    pub fn get_or_compute(&self, key: &Path, compute: impl FnOnce() -> Option<String>) -> String {
        if let Some(hit) = self.lock().get(key) {
            return hit.clone();
        }
        let Some(value) = compute() else {
            return String::new();
        };
        self.lock()
            .entry(key.to_path_buf())
            .or_insert(value)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Everything shared by one checking run.
#[derive(Debug)]
pub struct RunContext {
    root: PathBuf,
    javascript: PathBuf,
    documents: BTreeMap<PathBuf, Document>,
    catalog: Catalog,
    descriptions: DescriptionCache,
}

impl RunContext {
    pub fn new(
        content_root: impl Into<PathBuf>,
        documents: impl IntoIterator<Item = Document>,
        catalog: Catalog,
    ) -> Self {
        let root = content_root.into();
        Self {
            javascript: root.join(JAVASCRIPT_DIR),
            root,
            documents: documents
                .into_iter()
                .map(|doc| (doc.path.clone(), doc))
                .collect(),
            catalog,
            descriptions: DescriptionCache::default(),
        }
    }

    /// Discover and parse every page under the JavaScript reference of
    /// `content_root`, skipping paths matched by `exclude`.
    pub fn load(content_root: &Path, catalog: Catalog, exclude: &GlobSet) -> Result<Self> {
        use ignore::WalkBuilder;

        let javascript = content_root.join(JAVASCRIPT_DIR);
        if !javascript.is_dir() {
            eyre::bail!("No JavaScript reference found at {}", javascript.display());
        }

        let walker = WalkBuilder::new(&javascript)
            .follow_links(true)
            .hidden(false)
            .git_ignore(true)
            .build();

        let mut paths = Vec::new();
        for entry in walker {
            let entry = entry?;
            let path = entry.path();

            // Only process .md files
            if path.extension().is_none_or(|ext| ext != "md") {
                continue;
            }

            let relative = path.strip_prefix(content_root).unwrap_or(path);
            if exclude.is_match(relative) {
                tracing::debug!("Excluded {}", relative.display());
                continue;
            }
            paths.push(path.to_path_buf());
        }

        let documents = paths
            .par_iter()
            .map(|path| Document::load(path))
            .collect::<Result<Vec<_>>>()?;
        tracing::info!("Parsed {} pages", documents.len());

        Ok(Self::new(content_root, documents, catalog))
    }

    pub fn documents(&self) -> &BTreeMap<PathBuf, Document> {
        &self.documents
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn descriptions(&self) -> &DescriptionCache {
        &self.descriptions
    }

    /// A path as shown in reports: relative to the content root, with `/`.
    pub fn display_path(&self, path: &Path) -> String {
        slash_path(path.strip_prefix(&self.root).unwrap_or(path))
    }

    /// The page in directory `relative` (below the JavaScript reference).
    pub fn page_at(&self, relative: &str) -> Option<&Document> {
        self.documents
            .get(&self.javascript.join(relative).join("index.md"))
    }

    /// First prose paragraph of the page in `relative`, on one line.
    /// Paragraphs consisting of a single macro call are skipped.
    pub fn description(&self, relative: &str) -> String {
        let key = self.javascript.join(relative);
        self.descriptions.get_or_compute(&key, || {
            let doc = self.page_at(relative)?;
            let paragraph = doc.page.blocks().iter().find(|b| {
                b.kind == BlockKind::Paragraph && !MACRO_ONLY.is_match(doc.page.text(b).trim())
            })?;
            Some(doc.page.text(paragraph).trim().replace('\n', " "))
        })
    }
}

fn slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// What a rule sees while checking one page.
pub struct FileContext<'a> {
    run: &'a RunContext,
    document: &'a Document,
    messages: Vec<String>,
}

impl<'a> FileContext<'a> {
    pub fn new(run: &'a RunContext, document: &'a Document) -> Self {
        Self {
            run,
            document,
            messages: Vec::new(),
        }
    }

    pub fn run(&self) -> &'a RunContext {
        self.run
    }

    pub fn catalog(&self) -> &'a Catalog {
        &self.run.catalog
    }

    pub fn path(&self) -> &'a Path {
        &self.document.path
    }

    pub fn front_matter(&self) -> &'a FrontMatter {
        &self.document.front_matter
    }

    pub fn title(&self) -> &'a str {
        &self.document.front_matter.title
    }

    pub fn page_type(&self) -> PageType {
        self.document.front_matter.page_type
    }

    pub fn page(&self) -> &'a Page {
        &self.document.page
    }

    /// Source text of a block of this page.
    pub fn text(&self, block: &Block) -> &'a str {
        self.document.page.text(block)
    }

    pub fn section(&self, title: &str) -> Option<&'a Section> {
        self.document.page.section(title)
    }

    pub fn section_blocks(&self, section: &Section) -> &'a [Block] {
        self.document.page.section_blocks(section)
    }

    /// This page's directory, relative to the JavaScript reference.
    pub fn relative_dir(&self) -> String {
        let dir = self.document.path.parent().unwrap_or(Path::new(""));
        slash_path(dir.strip_prefix(&self.run.javascript).unwrap_or(dir))
    }

    /// Pages one directory below this one.
    pub fn subpages(&self) -> Vec<&'a Document> {
        let base = self.document.path.parent();
        self.run
            .documents
            .values()
            .filter(|doc| doc.path.parent().and_then(Path::parent) == base)
            .collect()
    }

    /// The page one directory above this one.
    pub fn parent_page(&self) -> Option<&'a Document> {
        let grandparent = self.document.path.parent()?.parent()?;
        self.run.documents.get(&grandparent.join("index.md"))
    }

    pub fn page_at(&self, relative: &str) -> Option<&'a Document> {
        self.run.page_at(relative)
    }

    /// This page's description paragraph.
    pub fn description(&self) -> String {
        self.run.description(&self.relative_dir())
    }

    pub fn report(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }

    pub fn into_messages(self) -> Vec<String> {
        self.messages
    }
}

/// What a rule sees once every page has been checked.
pub struct ExitContext<'a> {
    run: &'a RunContext,
    messages: Vec<String>,
}

impl<'a> ExitContext<'a> {
    pub fn new(run: &'a RunContext) -> Self {
        Self {
            run,
            messages: Vec::new(),
        }
    }

    pub fn run(&self) -> &'a RunContext {
        self.run
    }

    pub fn report(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }

    pub fn into_messages(self) -> Vec<String> {
        self.messages
    }
}
