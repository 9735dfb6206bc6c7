//! Remote package repository: provider capability, manifest cache, and
//! per-category page state.
//!
//! All network calls go through the [`PackageProvider`] trait so the rest of
//! the browser never sees a transport. Responses are applied back on the UI
//! loop as events; [`CategoryState`] guards against duplicate and stale
//! applications.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::Result;

/// A package record returned by the remote repository.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PackageRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: String,
}

/// Remote package repository capability.
#[async_trait]
pub trait PackageProvider: Send + Sync {
    /// Search packages matching `query`; at most `page_size` records
    /// starting at `offset`.
    async fn find(
        &self,
        query: &str,
        page_size: usize,
        offset: usize,
    ) -> Result<Vec<PackageRecord>>;

    /// List the relative file paths contained in a package.
    async fn manifest_files(&self, package_id: &str) -> Result<Vec<String>>;

    /// Resolve a package-relative path to a locally cached file, if present.
    /// Purely local, so no await point.
    fn resolve_local_path(&self, package_id: &str, relative: &str) -> Option<PathBuf>;
}

/// HTTP JSON implementation of [`PackageProvider`].
pub struct HttpPackageProvider {
    base_url: String,
    client: reqwest::Client,
    cache_dir: PathBuf,
}

impl HttpPackageProvider {
    pub fn new(base_url: impl Into<String>, cache_dir: PathBuf) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            cache_dir,
        }
    }
}

#[async_trait]
impl PackageProvider for HttpPackageProvider {
    async fn find(
        &self,
        query: &str,
        page_size: usize,
        offset: usize,
    ) -> Result<Vec<PackageRecord>> {
        let url = format!("{}/packages", self.base_url);
        let records = self
            .client
            .get(&url)
            .query(&[
                ("q", query.to_string()),
                ("limit", page_size.to_string()),
                ("offset", offset.to_string()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<PackageRecord>>()
            .await?;
        Ok(records)
    }

    async fn manifest_files(&self, package_id: &str) -> Result<Vec<String>> {
        let url = format!("{}/packages/{}/manifest", self.base_url, package_id);
        let files = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<String>>()
            .await?;
        Ok(files)
    }

    fn resolve_local_path(&self, package_id: &str, relative: &str) -> Option<PathBuf> {
        let candidate = self.cache_dir.join(package_id).join(relative);
        candidate.is_file().then_some(candidate)
    }
}

/// Manifest file lists cached per package id.
///
/// Populated by async fetches; read synchronously while building package
/// subtrees. A missing entry means "not fetched yet", not "empty".
#[derive(Debug, Default)]
pub struct ManifestCache {
    files: HashMap<String, Vec<String>>,
}

impl ManifestCache {
    pub fn get(&self, package_id: &str) -> Option<&[String]> {
        self.files.get(package_id).map(|f| f.as_slice())
    }

    pub fn contains(&self, package_id: &str) -> bool {
        self.files.contains_key(package_id)
    }

    pub fn insert(&mut self, package_id: impl Into<String>, files: Vec<String>) {
        self.files.insert(package_id.into(), files);
    }
}

/// Paged load state for one category.
///
/// `generation` increments on every reset so that responses from a
/// superseded query are recognized and dropped instead of being appended
/// into a tree that has since been rebuilt.
#[derive(Debug, Default)]
pub struct CategoryState {
    pub loaded: Vec<PackageRecord>,
    pub next_offset: usize,
    pub busy: bool,
    pub exhausted: bool,
    generation: u64,
}

impl CategoryState {
    /// Try to start a fetch. Returns the generation token to pass back with
    /// the response, or `None` while a fetch is already in flight or the
    /// category has no more pages.
    pub fn begin_fetch(&mut self) -> Option<u64> {
        if self.busy || self.exhausted {
            return None;
        }
        self.busy = true;
        Some(self.generation)
    }

    /// Append a fetched page. Returns `false` (and changes nothing) when the
    /// response is stale or no fetch was pending.
    pub fn apply_page(
        &mut self,
        generation: u64,
        page: Vec<PackageRecord>,
        page_size: usize,
    ) -> bool {
        if generation != self.generation || !self.busy {
            return false;
        }
        self.busy = false;
        self.exhausted = page.len() < page_size;
        self.next_offset += page.len();
        self.loaded.extend(page);
        true
    }

    /// Mark an in-flight fetch as failed. Previously loaded pages are kept.
    pub fn fail_fetch(&mut self, generation: u64) {
        if generation == self.generation {
            self.busy = false;
        }
    }

    /// Discard all pages and invalidate any in-flight response.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.loaded.clear();
        self.next_offset = 0;
        self.busy = false;
        self.exhausted = false;
    }
}

/// Per-panel map of category tag to page state.
pub type CategoryPages = HashMap<String, CategoryState>;
