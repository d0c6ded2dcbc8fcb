//! Offline pre-rendering of template trees.
//!
//! Walks the configured source directories, runs every UTF-8 text file
//! through the template engine, and writes the expanded copies into the
//! content root, preserving the directory layout. The content root is
//! recreated from scratch on each run and the dataset file is copied in so
//! the serving path and the rendered tree stay consistent.

use std::fs;
use std::io;
use std::path::Path;

use crate::config::{ContentConfig, PrerenderConfig};
use crate::template::TemplateEngine;

/// Error type for the prerender pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PrerenderError {
    /// Filesystem operation failed
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A configured source directory does not exist
    #[error("Source directory not found: {0}")]
    MissingSource(String),
}

/// Counters reported after a render run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RenderStats {
    /// Files expanded and written
    pub rendered: usize,
    /// Non-UTF-8 files left out of the output tree
    pub skipped: usize,
}

/// Render every configured source tree into the content root.
///
/// The content root is deleted and recreated, each source directory is
/// rendered under `{root}/{source}`, and the dataset file is copied
/// alongside when present. Missing source directories are skipped with a
/// warning rather than failing the whole run.
pub fn run(
    engine: &TemplateEngine,
    prerender: &PrerenderConfig,
    content: &ContentConfig,
) -> Result<RenderStats, PrerenderError> {
    let root = Path::new(&content.root);

    if root.exists() {
        fs::remove_dir_all(root)?;
    }
    fs::create_dir_all(root)?;

    let mut stats = RenderStats::default();
    for source in &prerender.sources {
        let src = Path::new(source);
        if !src.is_dir() {
            tracing::warn!(source = %source, "Source directory not found, skipping");
            continue;
        }
        let dst = root.join(src.file_name().unwrap_or(src.as_os_str()));
        render_tree(engine, src, &dst, &mut stats)?;
    }

    let dataset = Path::new(&content.dataset_file);
    if dataset.is_file() {
        fs::copy(dataset, root.join(&content.dataset_file))?;
    }

    tracing::info!(
        rendered = stats.rendered,
        skipped = stats.skipped,
        root = %root.display(),
        "Prerender complete"
    );
    Ok(stats)
}

/// Render one directory tree, expanding each UTF-8 file into `dst`.
///
/// Non-UTF-8 files are counted and skipped; the template DSL only applies
/// to text. Uses an explicit directory stack rather than recursion.
pub fn render_tree(
    engine: &TemplateEngine,
    src: &Path,
    dst: &Path,
    stats: &mut RenderStats,
) -> Result<(), PrerenderError> {
    if !src.is_dir() {
        return Err(PrerenderError::MissingSource(src.display().to_string()));
    }

    let mut pending = vec![(src.to_path_buf(), dst.to_path_buf())];

    while let Some((src_dir, dst_dir)) = pending.pop() {
        for entry in fs::read_dir(&src_dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_dir() {
                pending.push((path, dst_dir.join(entry.file_name())));
                continue;
            }

            match fs::read_to_string(&path) {
                Ok(text) => {
                    fs::create_dir_all(&dst_dir)?;
                    fs::write(dst_dir.join(entry.file_name()), engine.expand(&text))?;
                    stats.rendered += 1;
                }
                Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                    tracing::warn!(path = %path.display(), "Skipping non-UTF-8 file");
                    stats.skipped += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    Ok(())
}
