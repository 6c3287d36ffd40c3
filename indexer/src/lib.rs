use anyhow::{Context, Result};
use searchcore::persist::{save_index, IndexPaths, MetaFile};
use searchcore::{DocId, DocMeta, InvertedIndex};
use serde::Deserialize;
use walkdir::WalkDir;

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
pub struct InputDoc {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    /// Missing or blank body makes the document a stub.
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub links: Vec<String>,
}

pub fn build_index(input: &str, output: &str) -> Result<MetaFile> {
    let input_path = Path::new(input);
    let mut docs = Vec::new();
    for file in input_files(input_path) {
        if file.extension().and_then(|s| s.to_str()) == Some("jsonl") {
            read_jsonl(&file, &mut docs)?;
        } else {
            read_json(&file, &mut docs)?;
        }
    }
    tracing::info!(input, docs = docs.len(), "read input documents");

    let index = ingest(docs)?;
    let created_at = time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default();
    let meta = save_index(&IndexPaths::new(output), &index, &created_at)?;
    tracing::info!(
        output,
        num_docs = meta.num_docs,
        num_indexable = meta.num_indexable,
        terms = index.dictionary.len(),
        links = index.links.len(),
        "index build complete"
    );
    Ok(meta)
}

fn input_files(input_path: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = Vec::new();
    if input_path.is_dir() {
        for entry in WalkDir::new(input_path).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() {
                if let Some(ext) = p.extension().and_then(|s| s.to_str()) {
                    if matches!(ext, "json" | "jsonl") {
                        files.push(p.to_path_buf());
                    }
                }
            }
        }
    } else if input_path.is_file() {
        files.push(input_path.to_path_buf());
    }
    files
}

fn read_jsonl(file: &Path, docs: &mut Vec<InputDoc>) -> Result<()> {
    let reader = BufReader::new(File::open(file)?);
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        let doc: InputDoc = serde_json::from_str(&line).with_context(|| format!("{}:{}", file.display(), i + 1))?;
        docs.push(doc);
    }
    Ok(())
}

fn read_json(file: &Path, docs: &mut Vec<InputDoc>) -> Result<()> {
    let reader = BufReader::new(File::open(file)?);
    let json: serde_json::Value = serde_json::from_reader(reader)?;
    match json {
        serde_json::Value::Array(arr) => {
            for v in arr {
                docs.push(serde_json::from_value(v)?);
            }
        }
        serde_json::Value::Object(_) => docs.push(serde_json::from_value(json)?),
        _ => tracing::warn!(file = %file.display(), "skipping input that is neither an object nor an array"),
    }
    Ok(())
}

/// Documents get ids in input order. Link targets never seen as documents become stubs.
pub fn ingest(docs: Vec<InputDoc>) -> Result<InvertedIndex> {
    let mut index = InvertedIndex::new();
    let mut by_url: HashMap<String, DocId> = HashMap::new();
    let mut pending_links: Vec<(DocId, Vec<String>)> = Vec::new();

    for doc in docs {
        if by_url.contains_key(&doc.url) {
            tracing::warn!(url = %doc.url, "duplicate document url, keeping the first");
            continue;
        }
        let doc_id = match doc.body.as_deref().filter(|b| !b.trim().is_empty()) {
            Some(body) => index.index_document(&doc.url, doc.title.as_deref(), body)?,
            None => {
                let id = index.next_doc_id();
                index.add_document(id, DocMeta { title: doc.title, ..DocMeta::stub(doc.url.clone()) });
                id
            }
        };
        by_url.insert(doc.url, doc_id);
        pending_links.push((doc_id, doc.links));
    }

    for (from, targets) in pending_links {
        for target in targets {
            let to = match by_url.get(&target) {
                Some(&id) => id,
                None => {
                    let id = index.next_doc_id();
                    index.add_document(id, DocMeta::stub(target.clone()));
                    by_url.insert(target, id);
                    id
                }
            };
            index.add_link(from, to);
        }
    }
    Ok(index)
}
