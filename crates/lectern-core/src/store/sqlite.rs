//! SQLite persistence.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use rusqlite::{Connection, OpenFlags, Transaction, params};

use super::{Result, StoreError};
use crate::models::{
    DocumentInfo, Endnote, Footnote, Image, Metadata, MetadataSource, ParsedDocument, Quotation,
    Reference, SourceInfo, Table,
};

/// Document store over a single SQLite database file.
///
/// One connection behind a mutex: writes are short transactions, reads
/// are point lookups, and the callers are network-bound long before the
/// store becomes contended.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `path` and ensure the
    /// schema exists.
    pub fn open(path: &Path) -> Result<Self> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(path, flags)?;
        Self::initialize(conn)
    }

    /// In-memory store for tests.
    pub fn open_in_memory() -> Result<Self> {
        Self::initialize(Connection::open_in_memory()?)
    }

    fn initialize(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA busy_timeout = 5000;
             PRAGMA foreign_keys = ON;",
        )?;
        conn.execute_batch(SCHEMA)?;
        Ok(SqliteStore {
            conn: Mutex::new(conn),
        })
    }

    /// Upsert a document and all of its children in one transaction.
    /// Existing children of the id are replaced; any failure rolls the
    /// whole write back.
    pub fn store_document(
        &self,
        doc_id: &str,
        document: &ParsedDocument,
        source: &SourceInfo,
    ) -> Result<()> {
        let mut conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let tx = conn.transaction()?;
        insert_document(&tx, doc_id, document, source)?;
        tx.commit()?;
        Ok(())
    }

    pub fn exists(&self, doc_id: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let exists = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM documents WHERE id = ?1)",
            params![doc_id],
            |row| row.get::<_, bool>(0),
        )?;
        Ok(exists)
    }

    pub fn metadata(&self, doc_id: &str) -> Result<Metadata> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        metadata_locked(&conn, doc_id)
    }

    /// Page content by 1-based sequential index.
    pub fn page(&self, doc_id: &str, page_number: usize) -> Result<String> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let mut stmt = conn.prepare_cached(
            "SELECT content FROM pages WHERE document_id = ?1 AND page_number = ?2",
        )?;
        stmt.query_row(params![doc_id, page_number as i64], |row| row.get(0))
            .map_err(|e| not_found_or(e, format!("page {page_number} of {doc_id}")))
    }

    /// Page content by display label ("125", "iv").
    pub fn page_by_label(&self, doc_id: &str, label: &str) -> Result<String> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let mut stmt = conn.prepare_cached(
            "SELECT content FROM pages
             WHERE document_id = ?1 AND source_page_number = ?2
             ORDER BY page_number LIMIT 1",
        )?;
        stmt.query_row(params![doc_id, label], |row| row.get(0))
            .map_err(|e| not_found_or(e, format!("page '{label}' of {doc_id}")))
    }

    pub fn pages(&self, doc_id: &str) -> Result<Vec<String>> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        pages_locked(&conn, doc_id)
    }

    /// Display label -> sequential index (1-based), in page order.
    pub fn page_mapping(&self, doc_id: &str) -> Result<Vec<(String, usize)>> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        page_mapping_locked(&conn, doc_id)
    }

    pub fn references(&self, doc_id: &str) -> Result<Vec<Reference>> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        references_locked(&conn, doc_id)
    }

    pub fn reference(&self, doc_id: &str, index: usize) -> Result<Reference> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let mut stmt = conn.prepare_cached(
            "SELECT reference_text, doi FROM document_references
             WHERE document_id = ?1 AND ref_index = ?2",
        )?;
        stmt.query_row(params![doc_id, index as i64], |row| {
            Ok(Reference {
                reference_text: row.get(0)?,
                doi: row.get(1)?,
            })
        })
        .map_err(|e| not_found_or(e, format!("reference {index} of {doc_id}")))
    }

    pub fn images(&self, doc_id: &str) -> Result<Vec<Image>> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        images_locked(&conn, doc_id)
    }

    pub fn image(&self, doc_id: &str, index: usize) -> Result<Image> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let mut stmt = conn.prepare_cached(
            "SELECT image_url, image_description, caption FROM images
             WHERE document_id = ?1 AND image_index = ?2",
        )?;
        stmt.query_row(params![doc_id, index as i64], |row| {
            Ok(Image {
                image_url: row.get(0)?,
                image_description: row.get(1)?,
                caption: row.get(2)?,
            })
        })
        .map_err(|e| not_found_or(e, format!("image {index} of {doc_id}")))
    }

    pub fn tables(&self, doc_id: &str) -> Result<Vec<Table>> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        tables_locked(&conn, doc_id)
    }

    pub fn table(&self, doc_id: &str, index: usize) -> Result<Table> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let mut stmt = conn.prepare_cached(
            "SELECT table_id, table_title, table_data FROM document_tables
             WHERE document_id = ?1 AND table_index = ?2",
        )?;
        stmt.query_row(params![doc_id, index as i64], |row| {
            Ok(Table {
                table_id: row.get(0)?,
                table_title: row.get(1)?,
                table_data: row.get(2)?,
            })
        })
        .map_err(|e| not_found_or(e, format!("table {index} of {doc_id}")))
    }

    pub fn footnotes(&self, doc_id: &str) -> Result<Vec<Footnote>> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        footnotes_locked(&conn, doc_id)
    }

    pub fn footnote(&self, doc_id: &str, index: usize) -> Result<Footnote> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let mut stmt = conn.prepare_cached(
            "SELECT marker, text, page_number, in_text_page FROM footnotes
             WHERE document_id = ?1 AND footnote_index = ?2",
        )?;
        stmt.query_row(params![doc_id, index as i64], |row| {
            Ok(Footnote {
                marker: row.get(0)?,
                text: row.get(1)?,
                page_number: row.get(2)?,
                in_text_page: row.get(3)?,
            })
        })
        .map_err(|e| not_found_or(e, format!("footnote {index} of {doc_id}")))
    }

    pub fn endnotes(&self, doc_id: &str) -> Result<Vec<Endnote>> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        endnotes_locked(&conn, doc_id)
    }

    pub fn endnote(&self, doc_id: &str, index: usize) -> Result<Endnote> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let mut stmt = conn.prepare_cached(
            "SELECT marker, text, page_number FROM endnotes
             WHERE document_id = ?1 AND endnote_index = ?2",
        )?;
        stmt.query_row(params![doc_id, index as i64], |row| {
            Ok(Endnote {
                marker: row.get(0)?,
                text: row.get(1)?,
                page_number: row.get(2)?,
            })
        })
        .map_err(|e| not_found_or(e, format!("endnote {index} of {doc_id}")))
    }

    pub fn quotations(&self, doc_id: &str) -> Result<Vec<Quotation>> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        quotations_locked(&conn, doc_id)
    }

    pub fn quotation(&self, doc_id: &str, index: usize) -> Result<Quotation> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let mut stmt = conn.prepare_cached(
            "SELECT quotation_text, page_number, context, relevance FROM quotations
             WHERE document_id = ?1 AND quotation_index = ?2",
        )?;
        stmt.query_row(params![doc_id, index as i64], |row| {
            Ok(Quotation {
                quotation_text: row.get(0)?,
                page_number: row.get(1)?,
                context: row.get(2)?,
                relevance: row.get(3)?,
            })
        })
        .map_err(|e| not_found_or(e, format!("quotation {index} of {doc_id}")))
    }

    /// Reassemble the full document from the root and all child tables.
    pub fn document(&self, doc_id: &str) -> Result<ParsedDocument> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());

        let (metadata, summary) = {
            let metadata = metadata_locked(&conn, doc_id)?;
            let summary: String = conn.query_row(
                "SELECT summary FROM documents WHERE id = ?1",
                params![doc_id],
                |row| row.get(0),
            )?;
            (metadata, summary)
        };

        let pages = pages_locked(&conn, doc_id)?;
        let mapping = page_mapping_locked(&conn, doc_id)?;
        let mut page_numbers = vec![String::new(); pages.len()];
        for (label, seq) in mapping {
            if seq >= 1 && seq <= page_numbers.len() {
                page_numbers[seq - 1] = label;
            }
        }

        Ok(ParsedDocument {
            metadata,
            pages,
            page_numbers,
            references: references_locked(&conn, doc_id)?,
            images: images_locked(&conn, doc_id)?,
            tables: tables_locked(&conn, doc_id)?,
            footnotes: footnotes_locked(&conn, doc_id)?,
            endnotes: endnotes_locked(&conn, doc_id)?,
            quotations: quotations_locked(&conn, doc_id)?,
            summary,
        })
    }

    /// All stored documents, newest first.
    pub fn list(&self) -> Result<Vec<DocumentInfo>> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let mut stmt = conn.prepare_cached(
            "SELECT id, title, authors, doi, citekey, zotero_id, source_url
             FROM documents ORDER BY created_at DESC, rowid DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            let authors_json: String = row.get(2)?;
            Ok(DocumentInfo {
                document_id: row.get(0)?,
                title: row.get(1)?,
                authors: serde_json::from_str(&authors_json).unwrap_or_default(),
                doi: row.get(3)?,
                citekey: row.get(4)?,
                source_info: SourceInfo {
                    zotero_id: row.get(5)?,
                    url: row.get(6)?,
                },
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Delete a document and, via cascade, all of its children.
    pub fn delete(&self, doc_id: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let affected = conn.execute("DELETE FROM documents WHERE id = ?1", params![doc_id])?;
        if affected == 0 {
            return Err(StoreError::NotFound(format!("document {doc_id}")));
        }
        Ok(())
    }

    /// id -> citekey for every document that has one.
    pub fn citekey_map(&self) -> Result<HashMap<String, String>> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let mut stmt =
            conn.prepare_cached("SELECT id, citekey FROM documents WHERE citekey != ''")?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
        Ok(rows.collect::<rusqlite::Result<HashMap<_, _>>>()?)
    }
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS documents (
    id               TEXT PRIMARY KEY,
    title            TEXT NOT NULL DEFAULT '',
    authors          TEXT NOT NULL DEFAULT '[]',
    publication_date TEXT NOT NULL DEFAULT '',
    publication      TEXT NOT NULL DEFAULT '',
    doi              TEXT NOT NULL DEFAULT '',
    abstract         TEXT NOT NULL DEFAULT '',
    item_type        TEXT NOT NULL DEFAULT '',
    publisher        TEXT NOT NULL DEFAULT '',
    volume           TEXT NOT NULL DEFAULT '',
    issue            TEXT NOT NULL DEFAULT '',
    pages_range      TEXT NOT NULL DEFAULT '',
    issn             TEXT NOT NULL DEFAULT '',
    isbn             TEXT NOT NULL DEFAULT '',
    url              TEXT NOT NULL DEFAULT '',
    citekey          TEXT NOT NULL DEFAULT '',
    metadata_source  TEXT NOT NULL DEFAULT 'none',
    summary          TEXT NOT NULL DEFAULT '',
    zotero_id        TEXT NOT NULL DEFAULT '',
    source_url       TEXT NOT NULL DEFAULT '',
    created_at       DATETIME DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS pages (
    document_id        TEXT NOT NULL,
    page_number        INTEGER NOT NULL,
    source_page_number TEXT NOT NULL,
    content            TEXT NOT NULL DEFAULT '',
    PRIMARY KEY (document_id, page_number),
    FOREIGN KEY (document_id) REFERENCES documents(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_pages_source_number
    ON pages(document_id, source_page_number);

CREATE TABLE IF NOT EXISTS document_references (
    document_id    TEXT NOT NULL,
    ref_index      INTEGER NOT NULL,
    reference_text TEXT NOT NULL DEFAULT '',
    doi            TEXT NOT NULL DEFAULT '',
    PRIMARY KEY (document_id, ref_index),
    FOREIGN KEY (document_id) REFERENCES documents(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS images (
    document_id       TEXT NOT NULL,
    image_index       INTEGER NOT NULL,
    image_url         TEXT NOT NULL DEFAULT '',
    image_description TEXT NOT NULL DEFAULT '',
    caption           TEXT NOT NULL DEFAULT '',
    PRIMARY KEY (document_id, image_index),
    FOREIGN KEY (document_id) REFERENCES documents(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS document_tables (
    document_id TEXT NOT NULL,
    table_index INTEGER NOT NULL,
    table_id    TEXT NOT NULL DEFAULT '',
    table_title TEXT NOT NULL DEFAULT '',
    table_data  TEXT NOT NULL DEFAULT '',
    PRIMARY KEY (document_id, table_index),
    FOREIGN KEY (document_id) REFERENCES documents(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS footnotes (
    document_id    TEXT NOT NULL,
    footnote_index INTEGER NOT NULL,
    marker         TEXT NOT NULL DEFAULT '',
    text           TEXT NOT NULL DEFAULT '',
    page_number    TEXT NOT NULL DEFAULT '',
    in_text_page   TEXT NOT NULL DEFAULT '',
    PRIMARY KEY (document_id, footnote_index),
    FOREIGN KEY (document_id) REFERENCES documents(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS endnotes (
    document_id   TEXT NOT NULL,
    endnote_index INTEGER NOT NULL,
    marker        TEXT NOT NULL DEFAULT '',
    text          TEXT NOT NULL DEFAULT '',
    page_number   TEXT NOT NULL DEFAULT '',
    PRIMARY KEY (document_id, endnote_index),
    FOREIGN KEY (document_id) REFERENCES documents(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS quotations (
    document_id     TEXT NOT NULL,
    quotation_index INTEGER NOT NULL,
    quotation_text  TEXT NOT NULL DEFAULT '',
    page_number     TEXT NOT NULL DEFAULT '',
    context         TEXT NOT NULL DEFAULT '',
    relevance       TEXT NOT NULL DEFAULT '',
    PRIMARY KEY (document_id, quotation_index),
    FOREIGN KEY (document_id) REFERENCES documents(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_documents_doi ON documents(doi);
CREATE INDEX IF NOT EXISTS idx_documents_zotero_id ON documents(zotero_id);
";

fn insert_document(
    tx: &Transaction<'_>,
    doc_id: &str,
    document: &ParsedDocument,
    source: &SourceInfo,
) -> Result<()> {
    let meta = &document.metadata;
    let authors_json = serde_json::to_string(&meta.authors)
        .map_err(|e| StoreError::Encode(format!("authors: {e}")))?;

    // Preserve created_at across re-stores so listing order is stable.
    tx.execute(
        "INSERT INTO documents (
             id, title, authors, publication_date, publication, doi, abstract,
             item_type, publisher, volume, issue, pages_range, issn, isbn, url,
             citekey, metadata_source, summary, zotero_id, source_url
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
                   ?15, ?16, ?17, ?18, ?19, ?20)
         ON CONFLICT(id) DO UPDATE SET
             title = excluded.title,
             authors = excluded.authors,
             publication_date = excluded.publication_date,
             publication = excluded.publication,
             doi = excluded.doi,
             abstract = excluded.abstract,
             item_type = excluded.item_type,
             publisher = excluded.publisher,
             volume = excluded.volume,
             issue = excluded.issue,
             pages_range = excluded.pages_range,
             issn = excluded.issn,
             isbn = excluded.isbn,
             url = excluded.url,
             citekey = excluded.citekey,
             metadata_source = excluded.metadata_source,
             summary = excluded.summary,
             zotero_id = excluded.zotero_id,
             source_url = excluded.source_url",
        params![
            doc_id,
            meta.title,
            authors_json,
            meta.publication_date,
            meta.publication,
            meta.doi,
            meta.abstract_text,
            meta.item_type,
            meta.publisher,
            meta.volume,
            meta.issue,
            meta.pages,
            meta.issn,
            meta.isbn,
            meta.url,
            meta.citekey,
            meta.metadata_source.as_str(),
            document.summary,
            source.zotero_id,
            source.url,
        ],
    )?;

    // Replace children wholesale.
    for table in [
        "pages",
        "document_references",
        "images",
        "document_tables",
        "footnotes",
        "endnotes",
        "quotations",
    ] {
        tx.execute(
            &format!("DELETE FROM {table} WHERE document_id = ?1"),
            params![doc_id],
        )?;
    }

    for (i, content) in document.pages.iter().enumerate() {
        let label = document
            .page_numbers
            .get(i)
            .filter(|l| !l.is_empty())
            .cloned()
            .unwrap_or_else(|| (i + 1).to_string());
        tx.execute(
            "INSERT INTO pages (document_id, page_number, source_page_number, content)
             VALUES (?1, ?2, ?3, ?4)",
            params![doc_id, (i + 1) as i64, label, content],
        )?;
    }

    for (i, r) in document.references.iter().enumerate() {
        tx.execute(
            "INSERT INTO document_references (document_id, ref_index, reference_text, doi)
             VALUES (?1, ?2, ?3, ?4)",
            params![doc_id, i as i64, r.reference_text, r.doi],
        )?;
    }

    for (i, img) in document.images.iter().enumerate() {
        tx.execute(
            "INSERT INTO images (document_id, image_index, image_url, image_description, caption)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![doc_id, i as i64, img.image_url, img.image_description, img.caption],
        )?;
    }

    for (i, t) in document.tables.iter().enumerate() {
        tx.execute(
            "INSERT INTO document_tables (document_id, table_index, table_id, table_title, table_data)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![doc_id, i as i64, t.table_id, t.table_title, t.table_data],
        )?;
    }

    for (i, f) in document.footnotes.iter().enumerate() {
        tx.execute(
            "INSERT INTO footnotes (document_id, footnote_index, marker, text, page_number, in_text_page)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![doc_id, i as i64, f.marker, f.text, f.page_number, f.in_text_page],
        )?;
    }

    for (i, e) in document.endnotes.iter().enumerate() {
        tx.execute(
            "INSERT INTO endnotes (document_id, endnote_index, marker, text, page_number)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![doc_id, i as i64, e.marker, e.text, e.page_number],
        )?;
    }

    for (i, q) in document.quotations.iter().enumerate() {
        tx.execute(
            "INSERT INTO quotations (document_id, quotation_index, quotation_text, page_number, context, relevance)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![doc_id, i as i64, q.quotation_text, q.page_number, q.context, q.relevance],
        )?;
    }

    Ok(())
}

fn not_found_or(err: rusqlite::Error, what: String) -> StoreError {
    match err {
        rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound(what),
        other => StoreError::Sqlite(other),
    }
}

fn metadata_locked(conn: &Connection, doc_id: &str) -> Result<Metadata> {
    let mut stmt = conn.prepare_cached(
        "SELECT title, authors, publication_date, publication, doi, abstract,
                item_type, publisher, volume, issue, pages_range, issn, isbn,
                url, citekey, metadata_source
         FROM documents WHERE id = ?1",
    )?;
    stmt.query_row(params![doc_id], |row| {
        let authors_json: String = row.get(1)?;
        let source: String = row.get(15)?;
        Ok(Metadata {
            title: row.get(0)?,
            authors: serde_json::from_str(&authors_json).unwrap_or_default(),
            publication_date: row.get(2)?,
            publication: row.get(3)?,
            doi: row.get(4)?,
            abstract_text: row.get(5)?,
            item_type: row.get(6)?,
            publisher: row.get(7)?,
            volume: row.get(8)?,
            issue: row.get(9)?,
            pages: row.get(10)?,
            issn: row.get(11)?,
            isbn: row.get(12)?,
            url: row.get(13)?,
            citekey: row.get(14)?,
            metadata_source: MetadataSource::parse(&source),
        })
    })
    .map_err(|e| not_found_or(e, format!("document {doc_id}")))
}

fn pages_locked(conn: &Connection, doc_id: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare_cached(
        "SELECT content FROM pages WHERE document_id = ?1 ORDER BY page_number",
    )?;
    let rows = stmt.query_map(params![doc_id], |row| row.get(0))?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

fn page_mapping_locked(conn: &Connection, doc_id: &str) -> Result<Vec<(String, usize)>> {
    let mut stmt = conn.prepare_cached(
        "SELECT source_page_number, page_number FROM pages
         WHERE document_id = ?1 ORDER BY page_number",
    )?;
    let rows = stmt.query_map(params![doc_id], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as usize))
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

fn references_locked(conn: &Connection, doc_id: &str) -> Result<Vec<Reference>> {
    let mut stmt = conn.prepare_cached(
        "SELECT reference_text, doi FROM document_references
         WHERE document_id = ?1 ORDER BY ref_index",
    )?;
    let rows = stmt.query_map(params![doc_id], |row| {
        Ok(Reference {
            reference_text: row.get(0)?,
            doi: row.get(1)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

fn images_locked(conn: &Connection, doc_id: &str) -> Result<Vec<Image>> {
    let mut stmt = conn.prepare_cached(
        "SELECT image_url, image_description, caption FROM images
         WHERE document_id = ?1 ORDER BY image_index",
    )?;
    let rows = stmt.query_map(params![doc_id], |row| {
        Ok(Image {
            image_url: row.get(0)?,
            image_description: row.get(1)?,
            caption: row.get(2)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

fn tables_locked(conn: &Connection, doc_id: &str) -> Result<Vec<Table>> {
    let mut stmt = conn.prepare_cached(
        "SELECT table_id, table_title, table_data FROM document_tables
         WHERE document_id = ?1 ORDER BY table_index",
    )?;
    let rows = stmt.query_map(params![doc_id], |row| {
        Ok(Table {
            table_id: row.get(0)?,
            table_title: row.get(1)?,
            table_data: row.get(2)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

fn footnotes_locked(conn: &Connection, doc_id: &str) -> Result<Vec<Footnote>> {
    let mut stmt = conn.prepare_cached(
        "SELECT marker, text, page_number, in_text_page FROM footnotes
         WHERE document_id = ?1 ORDER BY footnote_index",
    )?;
    let rows = stmt.query_map(params![doc_id], |row| {
        Ok(Footnote {
            marker: row.get(0)?,
            text: row.get(1)?,
            page_number: row.get(2)?,
            in_text_page: row.get(3)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

fn endnotes_locked(conn: &Connection, doc_id: &str) -> Result<Vec<Endnote>> {
    let mut stmt = conn.prepare_cached(
        "SELECT marker, text, page_number FROM endnotes
         WHERE document_id = ?1 ORDER BY endnote_index",
    )?;
    let rows = stmt.query_map(params![doc_id], |row| {
        Ok(Endnote {
            marker: row.get(0)?,
            text: row.get(1)?,
            page_number: row.get(2)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

fn quotations_locked(conn: &Connection, doc_id: &str) -> Result<Vec<Quotation>> {
    let mut stmt = conn.prepare_cached(
        "SELECT quotation_text, page_number, context, relevance FROM quotations
         WHERE document_id = ?1 ORDER BY quotation_index",
    )?;
    let rows = stmt.query_map(params![doc_id], |row| {
        Ok(Quotation {
            quotation_text: row.get(0)?,
            page_number: row.get(1)?,
            context: row.get(2)?,
            relevance: row.get(3)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}
