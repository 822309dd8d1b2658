use crate::document::Document;
use crate::error::ParseError;
use crate::fence::{parse_fence_info, parse_opening};
use std::iter::FusedIterator;
use std::ops::Range;

/// A code block extracted from markdown with its metadata.
///
/// Code blocks are identified by fenced code syntax in markdown:
///
/// ````markdown
/// ```python
/// class Animal:
///     pass
/// ```
/// ````
///
/// Every field borrows from the owning [`Document`]; `code` is the exact
/// contiguous text between the two fence lines.
///
/// # Attributes
///
/// Code blocks can have comma- or space-separated attributes in the fence info
/// string:
///
/// - `ignore` - Skip checking for this block
/// - `propagate` - Make code available to subsequent blocks in the same file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock<'a> {
    /// Position of the block within its document, starting at 0
    pub index: usize,
    /// The language tag from the fence marker (may be empty)
    pub language: &'a str,
    /// Remaining tokens of the info string
    pub flags: Vec<&'a str>,
    /// The code between the fences, line terminators included
    pub code: &'a str,
    /// The opening fence line, with its terminator
    pub opening: &'a str,
    /// The closing fence line, with its terminator when the document has one
    pub closing: &'a str,
    /// 1-based line number of the opening fence
    pub line: usize,
    /// 1-based line number of the closing fence
    pub end_line: usize,
    /// Byte range of the whole fenced region in the document body
    pub span: Range<usize>,
}

impl CodeBlock<'_> {
    pub fn ignore(&self) -> bool {
        self.flags.contains(&"ignore")
    }

    pub fn propagate(&self) -> bool {
        self.flags.contains(&"propagate")
    }

    /// Rebuilds the fenced region exactly as it appears in the document.
    pub fn to_fenced(&self) -> String {
        let mut out = String::with_capacity(self.span.len());
        out.push_str(self.opening);
        out.push_str(self.code);
        out.push_str(self.closing);
        out
    }
}

/// Lazy iterator over the fenced code blocks of a document, in order.
///
/// Created by [`extract`]. The scan is a single pass over the body; once it
/// finishes or reports a malformed fence it yields nothing more. Run
/// [`extract`] again to start over.
pub struct CodeBlocks<'a> {
    document: &'a Document,
    pos: usize,
    line_no: usize,
    index: usize,
    done: bool,
}

/// Extracts the fenced code blocks of `document`.
///
/// # Example
///
/// ```
/// use doc_examples::{extract, Document};
///
/// let doc = Document::new("classes.md", "# Classes\n\n```python\nclass A: ...\n```\n");
/// let blocks: Vec<_> = extract(&doc).collect::<Result<_, _>>().unwrap();
/// assert_eq!(blocks.len(), 1);
/// assert_eq!(blocks[0].language, "python");
/// assert_eq!(blocks[0].code, "class A: ...\n");
/// ```
pub fn extract(document: &Document) -> CodeBlocks<'_> {
    CodeBlocks {
        document,
        pos: 0,
        line_no: 0,
        index: 0,
        done: false,
    }
}

/// Collects every block of `document`, failing on the first malformed fence.
pub fn extract_all(document: &Document) -> Result<Vec<CodeBlock<'_>>, ParseError> {
    extract(document).collect()
}

fn strip_terminator(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

impl<'a> CodeBlocks<'a> {
    /// Advances over one line, returning its start offset and text including
    /// the terminator.
    fn next_line(&mut self) -> Option<(usize, &'a str)> {
        let document: &'a Document = self.document;
        let body = document.body();
        if self.pos >= body.len() {
            return None;
        }

        let start = self.pos;
        let end = body[start..]
            .find('\n')
            .map(|i| start + i + 1)
            .unwrap_or(body.len());

        self.pos = end;
        self.line_no += 1;
        Some((start, &body[start..end]))
    }
}

impl<'a> Iterator for CodeBlocks<'a> {
    type Item = Result<CodeBlock<'a>, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let document: &'a Document = self.document;

        while let Some((open_start, opening)) = self.next_line() {
            let Some(fence) = parse_opening(strip_terminator(opening)) else {
                continue;
            };

            let line = self.line_no;
            let code_start = self.pos;

            loop {
                let Some((close_start, closing)) = self.next_line() else {
                    self.done = true;
                    return Some(Err(ParseError::MalformedFence {
                        path: document.path().to_path_buf(),
                        line,
                    }));
                };

                if !fence.is_closed_by(strip_terminator(closing)) {
                    continue;
                }

                let (language, flags) = parse_fence_info(fence.info);
                let block = CodeBlock {
                    index: self.index,
                    language,
                    flags,
                    code: &document.body()[code_start..close_start],
                    opening,
                    closing,
                    line,
                    end_line: self.line_no,
                    span: open_start..self.pos,
                };
                self.index += 1;
                return Some(Ok(block));
            }
        }

        self.done = true;
        None
    }
}

impl FusedIterator for CodeBlocks<'_> {}

/// Extracts code blocks with propagation support.
///
/// This function handles the `propagate` attribute, which allows code from earlier
/// blocks to be automatically included in later blocks within the same document.
/// Propagation never leaks between different documents.
///
/// # Propagation Behavior
///
/// - Blocks marked with `propagate` have their code accumulated
/// - Non-propagated blocks receive all accumulated code as a preamble
/// - Propagated blocks do NOT receive accumulated code (they only contribute)
/// - Blocks marked with `ignore` are skipped entirely
///
/// # Returns
///
/// A vector of tuples `(final_code, original_block)` where `final_code`
/// includes any propagated code prepended.
pub fn extract_with_propagation(
    document: &Document,
) -> Result<Vec<(String, CodeBlock<'_>)>, ParseError> {
    let mut result = Vec::new();
    let mut propagated_code = String::new();

    for block in extract(document) {
        let block = block?;
        if block.ignore() {
            continue;
        }

        let mut final_code = String::new();

        if !block.propagate() && !propagated_code.is_empty() {
            final_code.push_str(&propagated_code);
            final_code.push('\n');
        }

        final_code.push_str(block.code);

        if block.propagate() {
            propagated_code.push_str(block.code);
            propagated_code.push('\n');
        }

        result.push((final_code, block));
    }

    Ok(result)
}
