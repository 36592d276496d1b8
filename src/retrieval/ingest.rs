//! Corpus ingestion: find documents, extract text, split into word chunks.
//!
//! Blocking filesystem code; async callers run it on the blocking pool.

use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use quick_xml::events::Event;
use quick_xml::Reader;
use walkdir::WalkDir;

/// Snapshot of the corpus used to decide whether to re-ingest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusFingerprint(Vec<(String, u64, Option<SystemTime>)>);

impl CorpusFingerprint {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Lower-cased extension of `path` with its leading dot, e.g. `.docx`.
fn dotted_extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
}

/// Regular files directly inside `dir` whose extension is allowed, sorted by name.
pub fn list_corpus_files(dir: &Path, extensions: &[String]) -> anyhow::Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        anyhow::bail!("Corpus path is not a directory: {}", dir.display());
    }

    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            dotted_extension(path).map_or(false, |ext| extensions.iter().any(|e| *e == ext))
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Fingerprint of `files` from names, sizes and modification times.
pub fn fingerprint(files: &[PathBuf]) -> CorpusFingerprint {
    let entries = files
        .iter()
        .map(|path| {
            let meta = std::fs::metadata(path).ok();
            (
                path.to_string_lossy().to_string(),
                meta.as_ref().map_or(0, |m| m.len()),
                meta.and_then(|m| m.modified().ok()),
            )
        })
        .collect();
    CorpusFingerprint(entries)
}

/// Extract plain text from a corpus file.
///
/// `.doc` files are read the same way as `.docx` (Office Open XML); legacy
/// binary Word files fail to open and are reported as errors.
pub fn extract_text(path: &Path) -> anyhow::Result<String> {
    let bytes = std::fs::read(path)?;
    match dotted_extension(path).as_deref() {
        Some(".docx") | Some(".doc") => extract_docx_text(&bytes),
        _ => Ok(String::from_utf8_lossy(&bytes).into_owned()),
    }
}

fn extract_docx_text(bytes: &[u8]) -> anyhow::Result<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| anyhow::anyhow!("Not an Office Open XML document: {}", e))?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| anyhow::anyhow!("Missing word/document.xml: {}", e))?
        .read_to_string(&mut xml)?;

    document_xml_text(&xml)
}

/// Visible text of a WordprocessingML body: `w:t` runs, one line per paragraph.
fn document_xml_text(xml: &str) -> anyhow::Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut text = String::new();
    let mut in_run_text = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) if e.name().as_ref() == b"w:t" => in_run_text = true,
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_run_text = false,
                b"w:p" => text.push('\n'),
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"w:br" | b"w:cr" => text.push('\n'),
                b"w:tab" => text.push('\t'),
                _ => {}
            },
            Event::Text(t) if in_run_text => text.push_str(&t.unescape()?),
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(text)
}

/// Split `text` into chunks of at most `chunk_words` whitespace-separated words.
pub fn chunk_words(text: &str, chunk_words: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    words
        .chunks(chunk_words.max(1))
        .map(|chunk| chunk.join(" "))
        .filter(|chunk| !chunk.is_empty())
        .collect()
}

/// Extract and chunk every file; unreadable files are skipped with a warning.
pub fn collect_chunks(files: &[PathBuf], chunk_size: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    for path in files {
        match extract_text(path) {
            Ok(text) => chunks.extend(chunk_words(&text, chunk_size)),
            Err(e) => tracing::warn!("Skipping {}: {}", path.display(), e),
        }
    }
    chunks
}
