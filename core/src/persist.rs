use crate::error::Result;
use crate::index::{IndexReader, InvertedIndex};
use crate::{DocId, DocMeta, Posting, TermId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs::{create_dir_all, File};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

pub const STORE_VERSION: u32 = 2;

#[derive(Debug, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u32,
    pub num_indexable: u32,
    pub created_at: String,
    pub version: u32,
}

#[derive(Debug, Clone)]
pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    fn dictionary(&self) -> PathBuf { self.root.join("dictionary.bin") }
    fn docs(&self) -> PathBuf { self.root.join("docs.bin") }
    fn links(&self) -> PathBuf { self.root.join("links.bin") }
    fn meta(&self) -> PathBuf { self.root.join("meta.json") }
    fn postings_dir(&self) -> PathBuf { self.root.join("postings") }
    fn postings_file(&self, term_id: TermId) -> PathBuf {
        self.postings_dir().join(format!("{term_id:08}.postings.bin"))
    }
}

fn write_bin<T: Serialize>(path: PathBuf, value: &T) -> Result<()> {
    let mut f = File::create(path)?;
    let bytes = bincode::serialize(value)?;
    f.write_all(&bytes)?;
    Ok(())
}

fn read_bin<T: for<'de> Deserialize<'de>>(path: PathBuf) -> Result<T> {
    let mut f = File::open(path)?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    Ok(bincode::deserialize(&buf)?)
}

pub fn save_dictionary(paths: &IndexPaths, dict: &(HashMap<String, TermId>, Vec<u32>)) -> Result<()> {
    create_dir_all(&paths.root)?;
    write_bin(paths.dictionary(), dict)
}

pub fn load_dictionary(paths: &IndexPaths) -> Result<(HashMap<String, TermId>, Vec<u32>)> {
    read_bin(paths.dictionary())
}

pub fn save_docs(paths: &IndexPaths, docs: &BTreeMap<DocId, DocMeta>) -> Result<()> {
    write_bin(paths.docs(), docs)
}

pub fn load_docs(paths: &IndexPaths) -> Result<BTreeMap<DocId, DocMeta>> {
    read_bin(paths.docs())
}

pub fn save_links(paths: &IndexPaths, links: &Vec<(DocId, DocId)>) -> Result<()> {
    write_bin(paths.links(), links)
}

pub fn load_links(paths: &IndexPaths) -> Result<Vec<(DocId, DocId)>> {
    read_bin(paths.links())
}

pub fn save_postings_for_term(paths: &IndexPaths, term_id: TermId, postings: &Vec<Posting>) -> Result<()> {
    create_dir_all(paths.postings_dir())?;
    write_bin(paths.postings_file(term_id), postings)
}

/// A term with no postings file has no postings.
pub fn load_postings_for_term(paths: &IndexPaths, term_id: TermId) -> Result<Vec<Posting>> {
    match read_bin(paths.postings_file(term_id)) {
        Err(crate::Error::Io(e)) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
        other => other,
    }
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.meta())?;
    let json = serde_json::to_string_pretty(meta)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    let mut f = File::open(paths.meta())?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let meta: MetaFile = serde_json::from_str(&buf)?;
    Ok(meta)
}

/// Write every part of an in-memory index into the store directory.
pub fn save_index(paths: &IndexPaths, index: &InvertedIndex, created_at: &str) -> Result<MetaFile> {
    create_dir_all(paths.root.join("texts"))?;
    save_dictionary(paths, &(index.dictionary.clone(), index.df.clone()))?;
    for (term_id, plist) in &index.postings {
        save_postings_for_term(paths, *term_id, plist)?;
    }
    save_docs(paths, &index.docs)?;
    save_links(paths, &index.links)?;
    for (doc_id, meta) in &index.docs {
        if let (Some(rel), Some(text)) = (&meta.text_path, index.texts.get(doc_id)) {
            std::fs::write(paths.root.join(rel), text)?;
        }
    }
    let meta = MetaFile {
        num_docs: index.docs.len() as u32,
        num_indexable: index.count_indexable_documents()? as u32,
        created_at: created_at.to_string(),
        version: STORE_VERSION,
    };
    save_meta(paths, &meta)?;
    Ok(meta)
}

/// Store-backed reader: the header (dictionary, docs, links) is loaded eagerly,
/// postings lists are read per term when asked for.
pub struct DiskIndex {
    paths: IndexPaths,
    header: InvertedIndex,
    pub meta: MetaFile,
}

impl DiskIndex {
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let paths = IndexPaths::new(root);
        let (dictionary, df) = load_dictionary(&paths)?;
        let header = InvertedIndex {
            dictionary,
            df,
            docs: load_docs(&paths)?,
            links: load_links(&paths)?,
            ..InvertedIndex::default()
        };
        let meta = load_meta(&paths)?;
        tracing::debug!(
            root = %paths.root.display(),
            num_docs = meta.num_docs,
            terms = header.dictionary.len(),
            "opened index store"
        );
        Ok(Self { paths, header, meta })
    }
}

impl IndexReader for DiskIndex {
    fn count_indexable_documents(&self) -> Result<usize> { self.header.count_indexable_documents() }
    fn lookup_term_id(&self, term: &str) -> Result<Option<TermId>> { self.header.lookup_term_id(term) }
    fn document_frequency(&self, term_id: TermId) -> Result<u32> { self.header.document_frequency(term_id) }
    fn postings_for_term(&self, term_id: TermId) -> Result<Vec<Posting>> { load_postings_for_term(&self.paths, term_id) }
    fn out_links_of(&self, doc_id: DocId) -> Result<Vec<DocId>> { self.header.out_links_of(doc_id) }
    fn all_indexable_documents(&self) -> Result<Vec<(DocId, String)>> { self.header.all_indexable_documents() }
    fn all_links(&self) -> Result<Vec<(DocId, DocId)>> { self.header.all_links() }
    fn url_of(&self, doc_id: DocId) -> Result<Option<String>> { self.header.url_of(doc_id) }
}
