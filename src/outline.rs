use pulldown_cmark::{Event, Parser, Tag, TagEnd};

/// A heading of a document and the byte offset where it starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub title: String,
    pub offset: usize,
}

/// The headings of a document in order, used to tell which section a code
/// block belongs to.
#[derive(Debug, Clone, Default)]
pub struct Outline {
    sections: Vec<Section>,
}

impl Outline {
    /// Parses the headings of a Markdown document using pulldown-cmark.
    pub fn parse(content: &str) -> Self {
        let mut sections = Vec::new();
        let mut current: Option<Section> = None;

        for (event, range) in Parser::new(content).into_offset_iter() {
            match event {
                Event::Start(Tag::Heading { .. }) => {
                    current = Some(Section {
                        title: String::new(),
                        offset: range.start,
                    });
                }

                Event::End(TagEnd::Heading(_)) => {
                    if let Some(mut section) = current.take() {
                        section.title = section.title.trim().to_string();
                        sections.push(section);
                    }
                }

                Event::Text(text) | Event::Code(text) => {
                    if let Some(section) = current.as_mut() {
                        section.title.push_str(&text);
                    }
                }

                _ => {}
            }
        }

        Self { sections }
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Title of the last heading starting before `offset`.
    pub fn section_at(&self, offset: usize) -> Option<&str> {
        let idx = self.sections.partition_point(|s| s.offset <= offset);
        idx.checked_sub(1).map(|i| self.sections[i].title.as_str())
    }
}

/// Turns a heading title into a lowercase ASCII file name fragment.
///
/// Accented letters common in Portuguese are folded to their base letter,
/// other characters collapse into single underscores.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_sep = false;

    for ch in title.chars().flat_map(char::to_lowercase) {
        let ch = fold_accent(ch);
        if ch.is_ascii_alphanumeric() {
            if pending_sep && !slug.is_empty() {
                slug.push('_');
            }
            pending_sep = false;
            slug.push(ch);
        } else {
            pending_sep = true;
        }
    }

    slug
}

fn fold_accent(ch: char) -> char {
    match ch {
        'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "# Padrões Comportamentais\n\nIntro.\n\n## Chain of `Responsibility`\n\n```python\nclass Handler: ...\n```\n\nSetext\n------\n";

    #[test]
    fn test_parse_headings() {
        let outline = Outline::parse(DOC);
        let titles: Vec<_> = outline.sections().iter().map(|s| s.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["Padrões Comportamentais", "Chain of Responsibility", "Setext"]
        );
        assert_eq!(outline.sections()[0].offset, 0);
    }

    #[test]
    fn test_section_at() {
        let outline = Outline::parse(DOC);
        let code_offset = DOC.find("```python").unwrap();
        assert_eq!(outline.section_at(code_offset), Some("Chain of Responsibility"));
        assert_eq!(outline.section_at(0), Some("Padrões Comportamentais"));
    }

    #[test]
    fn test_section_at_before_first_heading() {
        let outline = Outline::parse("texto\n\n# Depois\n");
        assert_eq!(outline.section_at(0), None);
    }

    #[test]
    fn test_fenced_hash_is_not_a_heading() {
        let outline = Outline::parse("```python\n# comentário\n```\n");
        assert!(outline.sections().is_empty());
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Composição sobre Herança"), "composicao_sobre_heranca");
        assert_eq!(slugify("  Chain of Responsibility!  "), "chain_of_responsibility");
        assert_eq!(slugify("1. Introdução"), "1_introducao");
        assert_eq!(slugify("???"), "");
    }
}
