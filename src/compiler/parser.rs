/// Classification of a single filter-list line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedLine<'a> {
    Skip,
    AllowFilter(&'a str),
    BlockFilter(&'a str),
}

const ALLOW_PREFIX: &str = "@@";

/// Classifies one line. Never rejects; malformed bodies are left to the normalizer.
pub fn parse_line(line: &str) -> ParsedLine<'_> {
    let line = line.trim();
    // Skip empty lines, comments, metadata and section headers
    if line.is_empty() || line.starts_with('!') || line.starts_with('#') || line.starts_with('[')
    {
        return ParsedLine::Skip;
    }

    match line.strip_prefix(ALLOW_PREFIX) {
        Some(body) => ParsedLine::AllowFilter(body),
        None => ParsedLine::BlockFilter(line),
    }
}
