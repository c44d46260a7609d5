//! Docx template substitution.
//!
//! A `.docx` file is a zip archive; the visible body lives in
//! `word/document.xml` as paragraphs (`<w:p>`) of formatting runs (`<w:r>`)
//! holding text nodes (`<w:t>`). Word freely splits literal text across runs
//! (spell-check and revision bookkeeping do this even for untouched text), so
//! a `{{name}}` token may arrive as `{{na` + `me}` + `}`. Substitution
//! therefore works on the concatenated text of each paragraph and writes the
//! replacement back into the first affected node, keeping text outside the
//! match in its original run.
//!
//! The on-disk template is never mutated; filling writes a fresh archive.

use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};

use quick_xml::events::{BytesText, Event};
use quick_xml::{Reader, Writer};
use regex::Regex;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

use super::record::Record;
use super::RenderError;

const DOCUMENT_PART: &str = "word/document.xml";

/// A loaded template, held in memory and reused across all records of a run.
pub struct ReportTemplate {
    path: PathBuf,
    archive: Vec<u8>,
    document_xml: String,
    prefix: String,
    suffix: String,
}

impl ReportTemplate {
    pub fn open(path: &Path, prefix: &str, suffix: &str) -> Result<Self, RenderError> {
        let archive = fs::read(path).map_err(RenderError::TemplateIo)?;

        let mut zip = ZipArchive::new(Cursor::new(archive.as_slice()))?;
        let mut document_xml = String::new();
        zip.by_name(DOCUMENT_PART)?
            .read_to_string(&mut document_xml)
            .map_err(RenderError::TemplateIo)?;

        Ok(Self {
            path: path.to_path_buf(),
            archive,
            document_xml,
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Placeholder names present in the body, found across run boundaries.
    pub fn placeholders(&self) -> Result<BTreeSet<String>, RenderError> {
        let pattern = format!(
            "{}([A-Za-z0-9_]+){}",
            regex::escape(&self.prefix),
            regex::escape(&self.suffix)
        );
        let token = Regex::new(&pattern).expect("escaped placeholder pattern is valid");

        let mut names = BTreeSet::new();
        for group in parse_paragraph_texts(&self.document_xml)?.groups {
            let joined = group.concatenated();
            for capture in token.captures_iter(&joined) {
                names.insert(capture[1].to_string());
            }
        }
        Ok(names)
    }

    /// Replace every placeholder the record maps and write the filled document
    /// to `output`. Tokens without a record entry stay as literal text.
    pub fn fill(&self, record: &Record, output: &Path) -> Result<(), RenderError> {
        let filled = self.substitute(record)?;
        self.write_archive(&filled, output)
    }

    fn substitute(&self, record: &Record) -> Result<Vec<u8>, RenderError> {
        let mut parsed = parse_paragraph_texts(&self.document_xml)?;

        for group in &mut parsed.groups {
            for (key, value) in record.fields() {
                let token = format!("{}{}{}", self.prefix, key, self.suffix);
                replace_across_segments(&mut group.segments, &token, value);
            }
        }

        parsed.serialize()
    }

    fn write_archive(&self, document_xml: &[u8], output: &Path) -> Result<(), RenderError> {
        let file = File::create(output).map_err(RenderError::WriteFilled)?;
        let mut writer = ZipWriter::new(file);
        let mut archive = ZipArchive::new(Cursor::new(self.archive.as_slice()))?;
        let options = SimpleFileOptions::default();

        for index in 0..archive.len() {
            let mut entry = archive.by_index(index)?;
            let name = entry.name().to_string();
            if name == DOCUMENT_PART {
                continue;
            }
            if entry.is_dir() {
                writer.add_directory(name, options)?;
                continue;
            }
            writer.start_file(name, options)?;
            std::io::copy(&mut entry, &mut writer).map_err(RenderError::WriteFilled)?;
        }

        writer.start_file(DOCUMENT_PART, options)?;
        writer
            .write_all(document_xml)
            .map_err(RenderError::WriteFilled)?;
        writer.finish()?;
        Ok(())
    }
}

/// The visible text of a document, one string per paragraph. Exposed for
/// asserting on rendered output without a PDF engine.
pub fn document_text(docx: &Path) -> Result<Vec<String>, RenderError> {
    let bytes = fs::read(docx).map_err(RenderError::TemplateIo)?;
    let mut zip = ZipArchive::new(Cursor::new(bytes.as_slice()))?;
    let mut xml = String::new();
    zip.by_name(DOCUMENT_PART)?
        .read_to_string(&mut xml)
        .map_err(RenderError::TemplateIo)?;

    Ok(parse_paragraph_texts(&xml)?
        .groups
        .iter()
        .map(TextGroup::concatenated)
        .filter(|text| !text.is_empty())
        .collect())
}

/// One paragraph's worth of `<w:t>` contents, with the event index each
/// segment came from.
struct TextGroup {
    event_indices: Vec<usize>,
    segments: Vec<String>,
}

impl TextGroup {
    fn concatenated(&self) -> String {
        self.segments.concat()
    }
}

struct ParsedDocument {
    events: Vec<Event<'static>>,
    groups: Vec<TextGroup>,
}

impl ParsedDocument {
    fn serialize(self) -> Result<Vec<u8>, RenderError> {
        let mut replacements: Vec<Option<String>> = vec![None; self.events.len()];
        for group in &self.groups {
            for (slot, segment) in group.event_indices.iter().zip(&group.segments) {
                replacements[*slot] = Some(segment.clone());
            }
        }

        let mut writer = Writer::new(Cursor::new(Vec::new()));
        for (index, event) in self.events.into_iter().enumerate() {
            match replacements[index].take() {
                Some(text) => writer
                    .write_event(Event::Text(BytesText::new(&text)))
                    .map_err(|e| RenderError::DocumentXml(e.into()))?,
                None => writer
                    .write_event(event)
                    .map_err(|e| RenderError::DocumentXml(e.into()))?,
            }
        }
        Ok(writer.into_inner().into_inner())
    }
}

fn parse_paragraph_texts(xml: &str) -> Result<ParsedDocument, RenderError> {
    let mut reader = Reader::from_str(xml);
    let mut events: Vec<Event<'static>> = Vec::new();
    let mut groups: Vec<TextGroup> = Vec::new();
    let mut current = TextGroup {
        event_indices: Vec::new(),
        segments: Vec::new(),
    };
    let mut in_text = false;

    loop {
        let event = reader.read_event()?;
        match &event {
            Event::Eof => break,
            Event::Start(e) if e.name().as_ref() == b"w:t" => in_text = true,
            Event::End(e) if e.name().as_ref() == b"w:t" => in_text = false,
            Event::End(e) if e.name().as_ref() == b"w:p" => {
                if !current.event_indices.is_empty() {
                    groups.push(std::mem::replace(
                        &mut current,
                        TextGroup {
                            event_indices: Vec::new(),
                            segments: Vec::new(),
                        },
                    ));
                }
            }
            Event::Text(t) if in_text => {
                current.event_indices.push(events.len());
                current.segments.push(t.unescape()?.into_owned());
            }
            _ => {}
        }
        events.push(event.into_owned());
    }

    // Text nodes outside any closed paragraph still take part.
    if !current.event_indices.is_empty() {
        groups.push(current);
    }

    Ok(ParsedDocument { events, groups })
}

/// Replace every `token` occurrence in the concatenation of `segments`,
/// exactly once per occurrence. The replacement lands in the first segment
/// the occurrence touches; the remainder of the occurrence is cut from the
/// following segments, which otherwise keep their own text.
fn replace_across_segments(segments: &mut [String], token: &str, value: &str) {
    if token.is_empty() {
        return;
    }

    let mut search_from = 0usize;
    loop {
        let concatenated: String = segments.concat();
        let found = concatenated
            .get(search_from..)
            .and_then(|tail| tail.find(token));
        let Some(offset) = found else { break };

        let start = search_from + offset;
        let end = start + token.len();

        let mut position = 0usize;
        let mut first = true;
        for segment in segments.iter_mut() {
            let segment_start = position;
            let segment_end = position + segment.len();
            position = segment_end;

            if segment_end <= start || segment_start >= end {
                continue;
            }

            let local_start = start.max(segment_start) - segment_start;
            let local_end = end.min(segment_end) - segment_start;
            if first {
                segment.replace_range(local_start..local_end, value);
                first = false;
            } else {
                segment.replace_range(local_start..local_end, "");
            }
        }

        // Continue after the inserted value so replacements are never
        // re-scanned.
        search_from = start + value.len();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segs(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_replace_within_single_segment() {
        let mut segments = segs(&["{{name}} scored {{math}}"]);
        replace_across_segments(&mut segments, "{{name}}", "Asha");
        replace_across_segments(&mut segments, "{{math}}", "88");
        assert_eq!(segments.concat(), "Asha scored 88");
    }

    #[test]
    fn test_replace_across_split_runs() {
        let mut segments = segs(&["Dear {{na", "me}", "}, welcome"]);
        replace_across_segments(&mut segments, "{{name}}", "Asha");
        assert_eq!(segments, segs(&["Dear Asha", "", ", welcome"]));
    }

    #[test]
    fn test_text_outside_match_keeps_its_segment() {
        let mut segments = segs(&["bold {{k", "ey}} plain"]);
        replace_across_segments(&mut segments, "{{key}}", "V");
        assert_eq!(segments, segs(&["bold V", " plain"]));
    }

    #[test]
    fn test_replacement_value_is_not_rescanned() {
        let mut segments = segs(&["{{a}}{{a}}"]);
        replace_across_segments(&mut segments, "{{a}}", "{{a}}x");
        assert_eq!(segments.concat(), "{{a}}x{{a}}x");
    }

    #[test]
    fn test_unmatched_token_left_alone() {
        let mut segments = segs(&["{{unknown}} stays"]);
        replace_across_segments(&mut segments, "{{name}}", "Asha");
        assert_eq!(segments.concat(), "{{unknown}} stays");
    }
}
