//! PDF and EPUB documents, read one unit at a time.
//!
//! A PDF is read page by page.  An EPUB is read chapter by chapter in spine
//! order, and each chapter is spoken one paragraph at a time so playback
//! starts quickly.  Units are extracted lazily, right before they are spoken.
//!
//! `--pages` selects units with a 1-based list such as `1,3-5`.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::Reader;
use thiserror::Error;
use zip::ZipArchive;

use crate::pipeline::PipelineError;

// ---------------------------------------------------------------------------
// DocumentError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("--pages requires --file <PDF or EPUB>")]
    PagesWithoutFile,

    #[error("--pages can only be used with PDF or EPUB files")]
    PagesNeedDocument,

    #[error("Invalid page selection")]
    InvalidSelection,

    #[error("{unit} {number} is out of range (total: {total})")]
    OutOfRange {
        unit: Unit,
        number: usize,
        total: usize,
    },

    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read PDF: {0}")]
    Pdf(#[source] lopdf::Error),

    #[error("PDF has no pages")]
    NoPages,

    #[error("No extractable text found in PDF")]
    NoPdfText,

    #[error("Failed to open EPUB: {0}")]
    EpubOpen(#[source] zip::result::ZipError),

    #[error("Invalid EPUB: {0}")]
    InvalidEpub(String),

    #[error("No chapters found in EPUB")]
    NoChapters,

    #[error(transparent)]
    Speech(#[from] PipelineError),
}

// ---------------------------------------------------------------------------
// Kinds, units and progress
// ---------------------------------------------------------------------------

/// Document formats read unit by unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Epub,
}

impl DocumentKind {
    /// Detect by file extension, ignoring case.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(DocumentKind::Pdf),
            "epub" => Some(DocumentKind::Epub),
            _ => None,
        }
    }
}

/// What one selectable unit of a document is called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Page,
    Chapter,
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Unit::Page => "Page",
            Unit::Chapter => "Chapter",
        })
    }
}

/// Progress through a document, shown before each unit is spoken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    Page { number: usize, total: usize },
    Chapter { number: usize, total: usize },
    /// An empty chapter was replaced by the next chapter that has text.
    Skipped { number: usize, next: usize, total: usize },
    /// An empty chapter and nothing after it to read instead.
    NothingAfter { number: usize, total: usize },
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Progress::Page { number, total } => write!(f, "📄 Page {number}/{total}"),
            Progress::Chapter { number, total } => write!(f, "📖 Chapter {number}/{total}"),
            Progress::Skipped {
                number,
                next,
                total,
            } => write!(
                f,
                "⏭ Chapter {number}/{total} has no text, skipping to chapter {next}"
            ),
            Progress::NothingAfter { number, total } => write!(
                f,
                "⏭ Chapter {number}/{total} has no text (no subsequent chapter with text found)"
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// Parse a 1-based selection such as `1,3-5` into 0-based indices, in the
/// order given and without duplicates.
///
/// ```
/// use reed::text::document::{parse_range_selection, Unit};
///
/// assert_eq!(parse_range_selection("3-4,1,3", 5, Unit::Page).unwrap(), vec![2, 3, 0]);
/// assert!(parse_range_selection("6", 5, Unit::Page).is_err());
/// ```
pub fn parse_range_selection(
    selection: &str,
    total: usize,
    unit: Unit,
) -> Result<Vec<usize>, DocumentError> {
    let selection = selection.trim();
    if selection.is_empty() {
        return Err(DocumentError::InvalidSelection);
    }

    let mut selected = Vec::new();
    for part in selection.split(',') {
        let token = part.trim();
        let (start, end) = match token.split_once('-') {
            Some((start, end)) => (number(start)?, number(end)?),
            None => {
                let n = number(token)?;
                (n, n)
            }
        };
        if start < 1 || end < start {
            return Err(DocumentError::InvalidSelection);
        }

        for n in start..=end {
            if n > total {
                return Err(DocumentError::OutOfRange {
                    unit,
                    number: n,
                    total,
                });
            }
            if !selected.contains(&(n - 1)) {
                selected.push(n - 1);
            }
        }
    }
    Ok(selected)
}

fn number(token: &str) -> Result<usize, DocumentError> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DocumentError::InvalidSelection);
    }
    token.parse().map_err(|_| DocumentError::InvalidSelection)
}

// ---------------------------------------------------------------------------
// Document sources
// ---------------------------------------------------------------------------

/// A document whose units can be extracted one at a time.
pub trait Document {
    /// Number of units (pages or chapters).
    fn count(&self) -> usize;

    /// Plain text of the unit at 0-based `index`; empty when it has none.
    fn unit_text(&mut self, index: usize) -> String;
}

/// A PDF, with text extracted page by page.
pub struct PdfDocument {
    doc: lopdf::Document,
    page_numbers: Vec<u32>,
}

impl PdfDocument {
    pub fn open(path: &Path) -> Result<Self, DocumentError> {
        let doc = lopdf::Document::load(path).map_err(DocumentError::Pdf)?;
        let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
        if page_numbers.is_empty() {
            return Err(DocumentError::NoPages);
        }
        Ok(Self { doc, page_numbers })
    }
}

impl Document for PdfDocument {
    fn count(&self) -> usize {
        self.page_numbers.len()
    }

    fn unit_text(&mut self, index: usize) -> String {
        let Some(&page) = self.page_numbers.get(index) else {
            return String::new();
        };
        match self.doc.extract_text(&[page]) {
            Ok(text) => text.trim().to_owned(),
            Err(e) => {
                log::warn!("document: no text from page {page}: {e}");
                String::new()
            }
        }
    }
}

/// An EPUB, with chapters in spine order.  Only the package files are read
/// up front; each chapter is decompressed when it is asked for.
pub struct EpubBook {
    archive: ZipArchive<File>,
    chapters: Vec<String>,
}

impl EpubBook {
    pub fn open(path: &Path) -> Result<Self, DocumentError> {
        let file = File::open(path).map_err(|source| DocumentError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut archive = ZipArchive::new(file).map_err(DocumentError::EpubOpen)?;

        let container = read_entry(&mut archive, "META-INF/container.xml")
            .ok_or_else(|| invalid("missing META-INF/container.xml"))?;
        let opf_path = rootfile_path(&container)
            .map_err(|e| invalid(format!("bad container.xml: {e}")))?
            .ok_or_else(|| invalid("no rootfile in container.xml"))?;

        let opf = read_entry(&mut archive, &opf_path)
            .ok_or_else(|| invalid(format!("missing {opf_path}")))?;
        let opf_dir = match opf_path.rsplit_once('/') {
            Some((dir, _)) => format!("{dir}/"),
            None => String::new(),
        };
        let chapters =
            spine_chapters(&opf, &opf_dir).map_err(|e| invalid(format!("bad {opf_path}: {e}")))?;

        if chapters.is_empty() {
            return Err(DocumentError::NoChapters);
        }
        log::debug!("document: {} chapters in {}", chapters.len(), path.display());
        Ok(Self { archive, chapters })
    }
}

impl Document for EpubBook {
    fn count(&self) -> usize {
        self.chapters.len()
    }

    fn unit_text(&mut self, index: usize) -> String {
        let Some(href) = self.chapters.get(index) else {
            return String::new();
        };
        match read_entry(&mut self.archive, href) {
            Some(html) => strip_html(html.as_bytes()),
            None => {
                log::warn!("document: chapter {href} is missing from the archive");
                String::new()
            }
        }
    }
}

fn invalid(reason: impl Into<String>) -> DocumentError {
    DocumentError::InvalidEpub(reason.into())
}

fn read_entry(archive: &mut ZipArchive<File>, name: &str) -> Option<String> {
    let mut entry = archive.by_name(name).ok()?;
    let mut buf = Vec::new();
    entry.read_to_end(&mut buf).ok()?;
    Some(String::from_utf8_lossy(&buf).into_owned())
}

// ---------------------------------------------------------------------------
// EPUB package parsing
// ---------------------------------------------------------------------------

fn attribute(element: &BytesStart<'_>, name: &str) -> Option<String> {
    element
        .try_get_attribute(name)
        .ok()
        .flatten()?
        .unescape_value()
        .ok()
        .map(Cow::into_owned)
}

/// `full-path` of the first `<rootfile>` in `META-INF/container.xml`.
fn rootfile_path(container: &str) -> Result<Option<String>, quick_xml::Error> {
    let mut reader = Reader::from_str(container);
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"rootfile" => {
                return Ok(attribute(&e, "full-path"));
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}

/// Archive paths of the XHTML chapters listed in the spine, in reading
/// order.  Navigation documents are left out.
fn spine_chapters(opf: &str, opf_dir: &str) -> Result<Vec<String>, quick_xml::Error> {
    let mut manifest = HashMap::new();
    let mut spine = Vec::new();

    let mut reader = Reader::from_str(opf);
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                b"item" => {
                    let is_xhtml =
                        attribute(&e, "media-type").as_deref() == Some("application/xhtml+xml");
                    let is_nav = attribute(&e, "properties")
                        .is_some_and(|props| props.split_whitespace().any(|p| p == "nav"));
                    if let (true, false, Some(id), Some(href)) =
                        (is_xhtml, is_nav, attribute(&e, "id"), attribute(&e, "href"))
                    {
                        manifest.insert(id, format!("{opf_dir}{href}"));
                    }
                }
                b"itemref" => spine.extend(attribute(&e, "idref")),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(spine
        .into_iter()
        .filter_map(|id| manifest.get(&id).cloned())
        .collect())
}

// ---------------------------------------------------------------------------
// Chapter text
// ---------------------------------------------------------------------------

/// Elements that start a new line of text.
const BLOCK_TAGS: &[&[u8]] = &[
    b"p", b"div", b"br", b"h1", b"h2", b"h3", b"h4", b"h5", b"h6", b"li", b"tr", b"blockquote",
    b"section", b"article",
];

/// Elements whose content is never read aloud.
const SKIPPED_TAGS: &[&[u8]] = &[b"head", b"script", b"style"];

fn html_entity(name: &str) -> Option<&'static str> {
    Some(match name {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        "nbsp" => " ",
        "mdash" => "—",
        "ndash" => "–",
        "hellip" => "…",
        "lsquo" => "‘",
        "rsquo" => "’",
        "ldquo" => "“",
        "rdquo" => "”",
        "copy" => "©",
        _ => return None,
    })
}

/// Text node content; line breaks inside it are plain whitespace.
fn decode_text(text: &BytesText<'_>) -> String {
    let decoded = text
        .unescape_with(html_entity)
        .unwrap_or_else(|_| String::from_utf8_lossy(text));
    decoded.replace(['\n', '\r'], " ")
}

/// Plain text of an XHTML chapter: one line per block element, runs of
/// whitespace collapsed, surrounding blank space trimmed.
///
/// Malformed markup ends extraction at the error; the text read so far is
/// kept.
pub fn strip_html(html: &[u8]) -> String {
    let source = String::from_utf8_lossy(html);
    let mut reader = Reader::from_str(&source);
    reader.config_mut().check_end_names = false;

    let mut raw = String::new();
    let mut skipping = 0usize;
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.local_name().as_ref().to_ascii_lowercase();
                if SKIPPED_TAGS.contains(&name.as_slice()) {
                    skipping += 1;
                } else if BLOCK_TAGS.contains(&name.as_slice()) {
                    raw.push('\n');
                }
            }
            Ok(Event::Empty(e)) => {
                let name = e.local_name().as_ref().to_ascii_lowercase();
                if BLOCK_TAGS.contains(&name.as_slice()) {
                    raw.push('\n');
                }
            }
            Ok(Event::End(e)) => {
                let name = e.local_name().as_ref().to_ascii_lowercase();
                if SKIPPED_TAGS.contains(&name.as_slice()) {
                    skipping = skipping.saturating_sub(1);
                }
            }
            Ok(Event::Text(t)) if skipping == 0 => raw.push_str(&decode_text(&t)),
            Ok(Event::CData(c)) if skipping == 0 => raw.push_str(&String::from_utf8_lossy(&c)),
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                log::debug!("document: stopping at malformed markup: {e}");
                break;
            }
        }
    }

    raw.split('\n')
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_owned()
}

/// Each non-blank line, trimmed.
pub fn split_paragraphs(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// Something that speaks one piece of text and returns when it is done.
pub type Speak<'a> = dyn FnMut(&str) -> Result<(), PipelineError> + 'a;

fn selected(selection: Option<&str>, total: usize, unit: Unit) -> Result<Vec<usize>, DocumentError> {
    match selection {
        Some(selection) => parse_range_selection(selection, total, unit),
        None => Ok((0..total).collect()),
    }
}

/// Open the document at `path` and read the selected units aloud.
pub fn read_document(
    path: &Path,
    kind: DocumentKind,
    selection: Option<&str>,
    on_progress: &mut dyn FnMut(&Progress),
    speak: &mut Speak<'_>,
) -> Result<(), DocumentError> {
    match kind {
        DocumentKind::Pdf => read_pages(&mut PdfDocument::open(path)?, selection, on_progress, speak),
        DocumentKind::Epub => {
            read_chapters(&mut EpubBook::open(path)?, selection, on_progress, speak)
        }
    }
}

/// Speak each selected page that has text, whole.
///
/// # Errors
///
/// [`DocumentError::NoPdfText`] once every selected page turned out empty.
pub fn read_pages(
    doc: &mut dyn Document,
    selection: Option<&str>,
    on_progress: &mut dyn FnMut(&Progress),
    speak: &mut Speak<'_>,
) -> Result<(), DocumentError> {
    let total = doc.count();
    let mut found_any = false;

    for index in selected(selection, total, Unit::Page)? {
        let text = doc.unit_text(index);
        if text.is_empty() {
            log::debug!("document: page {} has no text", index + 1);
            continue;
        }
        found_any = true;
        on_progress(&Progress::Page {
            number: index + 1,
            total,
        });
        speak(&text)?;
    }

    if !found_any {
        return Err(DocumentError::NoPdfText);
    }
    Ok(())
}

/// Speak each selected chapter paragraph by paragraph.
///
/// An empty chapter is replaced by the next chapter after it that has text
/// and has not been read yet.  No chapter is read twice.
pub fn read_chapters(
    book: &mut dyn Document,
    selection: Option<&str>,
    on_progress: &mut dyn FnMut(&Progress),
    speak: &mut Speak<'_>,
) -> Result<(), DocumentError> {
    let total = book.count();
    let mut spoken = vec![false; total];

    for index in selected(selection, total, Unit::Chapter)? {
        if spoken[index] {
            continue;
        }

        let text = book.unit_text(index);
        if !text.is_empty() {
            spoken[index] = true;
            on_progress(&Progress::Chapter {
                number: index + 1,
                total,
            });
            speak_paragraphs(&text, speak)?;
            continue;
        }

        let replacement = (index + 1..total)
            .filter(|&next| !spoken[next])
            .find_map(|next| {
                let text = book.unit_text(next);
                (!text.is_empty()).then_some((next, text))
            });

        match replacement {
            Some((next, text)) => {
                spoken[next] = true;
                on_progress(&Progress::Skipped {
                    number: index + 1,
                    next: next + 1,
                    total,
                });
                on_progress(&Progress::Chapter {
                    number: next + 1,
                    total,
                });
                speak_paragraphs(&text, speak)?;
            }
            None => on_progress(&Progress::NothingAfter {
                number: index + 1,
                total,
            }),
        }
    }
    Ok(())
}

fn speak_paragraphs(text: &str, speak: &mut Speak<'_>) -> Result<(), DocumentError> {
    for paragraph in split_paragraphs(text) {
        speak(paragraph)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    /// In-memory chapters; records which ones were extracted.
    struct Chapters {
        texts: Vec<&'static str>,
        reads: Vec<usize>,
    }

    impl Chapters {
        fn new(texts: &[&'static str]) -> Self {
            Self {
                texts: texts.to_vec(),
                reads: Vec::new(),
            }
        }
    }

    impl Document for Chapters {
        fn count(&self) -> usize {
            self.texts.len()
        }

        fn unit_text(&mut self, index: usize) -> String {
            self.reads.push(index);
            self.texts[index].to_owned()
        }
    }

    /// Runs `read` and returns `(progress lines, spoken texts)`.
    fn record(
        read: impl FnOnce(&mut dyn FnMut(&Progress), &mut Speak<'_>) -> Result<(), DocumentError>,
    ) -> (Vec<String>, Vec<String>) {
        let mut progress = Vec::new();
        let mut spoken = Vec::new();
        read(
            &mut |p: &Progress| progress.push(p.to_string()),
            &mut |text: &str| -> Result<(), PipelineError> {
                spoken.push(text.to_owned());
                Ok(())
            },
        )
        .expect("read");
        (progress, spoken)
    }

    // ── selection ────────────────────────────────────────────────────────

    #[test]
    fn selection_keeps_order_and_drops_duplicates() {
        assert_eq!(parse_range_selection("1,3-5", 5, Unit::Page).unwrap(), vec![0, 2, 3, 4]);
        assert_eq!(parse_range_selection(" 2 , 1-2 ", 3, Unit::Page).unwrap(), vec![1, 0]);
    }

    #[test]
    fn malformed_selections_are_invalid() {
        for bad in ["", " ", "0", "1,", "a", "3-1", "1-", "-2", "1-2-3", "1 - 2", "+1"] {
            let err = parse_range_selection(bad, 10, Unit::Page).unwrap_err();
            assert_eq!(err.to_string(), "Invalid page selection", "input {bad:?}");
        }
    }

    #[test]
    fn out_of_range_names_the_unit() {
        let err = parse_range_selection("2-9", 4, Unit::Chapter).unwrap_err();
        assert_eq!(err.to_string(), "Chapter 5 is out of range (total: 4)");

        let err = parse_range_selection("7", 3, Unit::Page).unwrap_err();
        assert_eq!(err.to_string(), "Page 7 is out of range (total: 3)");
    }

    #[test]
    fn kind_from_extension() {
        assert_eq!(DocumentKind::from_path(Path::new("a/Book.EPUB")), Some(DocumentKind::Epub));
        assert_eq!(DocumentKind::from_path(Path::new("paper.pdf")), Some(DocumentKind::Pdf));
        assert_eq!(DocumentKind::from_path(Path::new("notes.txt")), None);
        assert_eq!(DocumentKind::from_path(Path::new("pdf")), None);
    }

    // ── pages ────────────────────────────────────────────────────────────

    #[test]
    fn pages_are_spoken_whole_in_selection_order() {
        let mut doc = Chapters::new(&["one\ntwo", "", "three"]);

        let (progress, spoken) = record(|p, s| read_pages(&mut doc, Some("3,1-2"), p, s));

        assert_eq!(progress, ["📄 Page 3/3", "📄 Page 1/3"]);
        assert_eq!(spoken, ["three", "one\ntwo"]);
    }

    #[test]
    fn pages_without_text_are_an_error() {
        let mut doc = Chapters::new(&["", ""]);
        let mut speak = |_: &str| -> Result<(), PipelineError> { Ok(()) };
        let err = read_pages(&mut doc, None, &mut |_: &Progress| {}, &mut speak).unwrap_err();
        assert!(matches!(err, DocumentError::NoPdfText));
    }

    // ── chapters ─────────────────────────────────────────────────────────

    #[test]
    fn chapters_are_spoken_paragraph_by_paragraph() {
        let mut book = Chapters::new(&["Title\n\n  First para. \nSecond para.", "Next"]);

        let (progress, spoken) = record(|p, s| read_chapters(&mut book, None, p, s));

        assert_eq!(progress, ["📖 Chapter 1/2", "📖 Chapter 2/2"]);
        assert_eq!(spoken, ["Title", "First para.", "Second para.", "Next"]);
    }

    #[test]
    fn empty_chapter_skips_ahead_once() {
        let mut book = Chapters::new(&["", "", "body", "end"]);

        let (progress, spoken) = record(|p, s| read_chapters(&mut book, None, p, s));

        assert_eq!(
            progress,
            [
                "⏭ Chapter 1/4 has no text, skipping to chapter 3",
                "📖 Chapter 3/4",
                "⏭ Chapter 2/4 has no text, skipping to chapter 4",
                "📖 Chapter 4/4",
            ]
        );
        assert_eq!(spoken, ["body", "end"]);
    }

    #[test]
    fn empty_last_chapter_reports_nothing_after() {
        let mut book = Chapters::new(&["text", ""]);

        let (progress, spoken) = record(|p, s| read_chapters(&mut book, Some("2"), p, s));

        assert_eq!(
            progress,
            ["⏭ Chapter 2/2 has no text (no subsequent chapter with text found)"]
        );
        assert!(spoken.is_empty());
        assert_eq!(book.reads, [1]);
    }

    #[test]
    fn speech_failure_stops_reading() {
        let mut book = Chapters::new(&["a\nb", "c"]);
        let mut spoken = Vec::new();

        let mut speak = |text: &str| -> Result<(), PipelineError> {
            spoken.push(text.to_owned());
            Err(PipelineError::Synthesis {
                exit: Some(1),
                stderr: String::new(),
            })
        };
        let err = read_chapters(&mut book, None, &mut |_: &Progress| {}, &mut speak).unwrap_err();

        assert!(matches!(err, DocumentError::Speech(_)));
        assert_eq!(spoken, ["a"]);
    }

    // ── EPUB files ───────────────────────────────────────────────────────

    const CONTAINER: &str = r#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#;

    const PACKAGE: &str = r#"<?xml version="1.0"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0">
  <manifest>
    <item id="nav" href="nav.xhtml" media-type="application/xhtml+xml" properties="nav"/>
    <item id="c2" href="two.xhtml" media-type="application/xhtml+xml"/>
    <item id="c1" href="one.xhtml" media-type="application/xhtml+xml"/>
    <item id="css" href="style.css" media-type="text/css"/>
  </manifest>
  <spine>
    <itemref idref="nav"/>
    <itemref idref="c1"/>
    <itemref idref="c2"/>
  </spine>
</package>"#;

    const CHAPTER_ONE: &str = r#"<html xmlns="http://www.w3.org/1999/xhtml">
<head><title>Not read</title><style>p { color: red }</style></head>
<body><h1>Chapter   One</h1><p>It was a
  dark&nbsp;night &amp; stormy.</p><p>Then<br/>morning.</p></body></html>"#;

    fn write_epub(path: &Path, entries: &[(&str, &str)]) {
        let mut writer = ZipWriter::new(File::create(path).unwrap());
        for (name, body) in entries {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(body.as_bytes()).unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn epub_chapters_follow_the_spine() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.epub");
        write_epub(
            &path,
            &[
                ("mimetype", "application/epub+zip"),
                ("META-INF/container.xml", CONTAINER),
                ("OEBPS/content.opf", PACKAGE),
                ("OEBPS/one.xhtml", CHAPTER_ONE),
                ("OEBPS/two.xhtml", "<html><body><p>The end.</p></body></html>"),
            ],
        );

        let (progress, spoken) = record(|p, s| {
            read_document(&path, DocumentKind::Epub, None, p, s)
        });

        assert_eq!(progress, ["📖 Chapter 1/2", "📖 Chapter 2/2"]);
        assert_eq!(
            spoken,
            [
                "Chapter One",
                "It was a dark night & stormy.",
                "Then",
                "morning.",
                "The end."
            ]
        );
    }

    #[test]
    fn epub_without_container_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.epub");
        write_epub(&path, &[("mimetype", "application/epub+zip")]);

        let err = EpubBook::open(&path).err().expect("should fail");
        assert_eq!(err.to_string(), "Invalid EPUB: missing META-INF/container.xml");
    }

    #[test]
    fn epub_with_empty_spine_has_no_chapters() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.epub");
        write_epub(
            &path,
            &[
                ("META-INF/container.xml", CONTAINER),
                ("OEBPS/content.opf", "<package><manifest/><spine/></package>"),
            ],
        );

        assert!(matches!(EpubBook::open(&path), Err(DocumentError::NoChapters)));
    }

    #[test]
    fn not_a_zip_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.epub");
        std::fs::write(&path, "just text").unwrap();

        let err = EpubBook::open(&path).err().expect("should fail");
        assert!(err.to_string().starts_with("Failed to open EPUB"));
    }

    #[test]
    fn unreadable_pdf_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.pdf");
        std::fs::write(&path, "not a pdf").unwrap();

        let err = PdfDocument::open(&path).err().expect("should fail");
        assert!(err.to_string().starts_with("Failed to read PDF"));
    }
}
