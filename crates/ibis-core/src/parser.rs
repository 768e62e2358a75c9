//! Parser front end for JavaScript/TypeScript source code.
//!
//! Wraps SWC to turn source text into an immutable AST. The semantic
//! analyses in this crate hold only non-owning references into the tree
//! owned by [`ParsedFile`].

use swc_common::sync::Lrc;
use swc_common::{FileName, SourceMap, Span, Spanned};
use swc_ecma_parser::{EsSyntax, StringInput, Syntax, TsSyntax, lexer::Lexer, parse_file_as_module};

use crate::config::ParserConfig;

pub use swc_ecma_ast::{EsVersion, Module};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    JavaScript,
    TypeScript,
    Jsx,
    Tsx,
}

pub fn detect_language(filename: &str) -> Language {
    let ext = filename.rsplit('.').next().unwrap_or("").to_lowercase();

    match ext.as_str() {
        "ts" | "mts" | "cts" => Language::TypeScript,
        "tsx" => Language::Tsx,
        "jsx" => Language::Jsx,
        _ => Language::JavaScript,
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("{message} at {line}:{column}")]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

#[derive(Debug)]
pub struct ParseResult {
    pub module: Option<Module>,
    pub errors: Vec<ParseError>,
}

impl ParseResult {
    pub fn is_ok(&self) -> bool {
        self.module.is_some()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    pub filename: String,
    pub language: Language,
    pub has_errors: bool,
}

/// A parsed source file: the source text, its AST and any recovered errors.
pub struct ParsedFile {
    source: String,
    metadata: FileMetadata,
    ast_module: Option<Module>,
    errors: Vec<ParseError>,
    // Byte offset of this file inside the source map it was parsed with.
    base_pos: u32,
}

impl std::fmt::Debug for ParsedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParsedFile")
            .field("metadata", &self.metadata)
            .field("has_module", &self.ast_module.is_some())
            .field("error_count", &self.errors.len())
            .finish()
    }
}

impl ParsedFile {
    pub fn from_source(filename: &str, source: &str) -> Self {
        let parser = Parser::for_file(filename);
        Self::parse_with(filename, source, &parser)
    }

    pub fn with_config(filename: &str, source: &str, config: &ParserConfig) -> Self {
        let parser = Parser::from_config(config);
        Self::parse_with(filename, source, &parser)
    }

    fn parse_with(filename: &str, source: &str, parser: &Parser) -> Self {
        let (result, base_pos) = parser.parse_module_recovering(source);

        let metadata = FileMetadata {
            filename: filename.to_string(),
            language: detect_language(filename),
            has_errors: result.has_errors(),
        };

        Self {
            source: source.to_string(),
            metadata,
            ast_module: result.module,
            errors: result.errors,
            base_pos,
        }
    }

    pub fn metadata(&self) -> &FileMetadata {
        &self.metadata
    }

    pub fn module(&self) -> Option<&Module> {
        self.ast_module.as_ref()
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Source text covered by `span`, if the span falls inside this file.
    pub fn span_text(&self, span: Span) -> Option<&str> {
        let lo = (span.lo.0 as usize).checked_sub(self.base_pos as usize)?;
        let hi = (span.hi.0 as usize).checked_sub(self.base_pos as usize)?;

        if lo <= hi && hi <= self.source.len() {
            Some(&self.source[lo..hi])
        } else {
            None
        }
    }

    /// 1-based line and column of the start of `span`.
    pub fn span_location(&self, span: Span) -> (usize, usize) {
        let lo = (span.lo.0 as usize).saturating_sub(self.base_pos as usize);
        let prefix = &self.source[..lo.min(self.source.len())];
        let line = prefix.matches('\n').count() + 1;
        let line_start = prefix.rfind('\n').map(|i| i + 1).unwrap_or(0);
        (line, lo - line_start + 1)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ParserBuilder {
    jsx: bool,
    typescript: bool,
    decorators: bool,
}

impl ParserBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn jsx(mut self, enabled: bool) -> Self {
        self.jsx = enabled;
        self
    }

    pub fn typescript(mut self, enabled: bool) -> Self {
        self.typescript = enabled;
        self
    }

    pub fn decorators(mut self, enabled: bool) -> Self {
        self.decorators = enabled;
        self
    }

    pub fn build(self) -> Parser {
        let syntax = if self.typescript {
            Syntax::Typescript(TsSyntax {
                tsx: self.jsx,
                decorators: self.decorators,
                ..Default::default()
            })
        } else {
            Syntax::Es(EsSyntax {
                jsx: self.jsx,
                decorators: self.decorators,
                ..Default::default()
            })
        };

        Parser { syntax }
    }
}

#[derive(Debug, Clone)]
pub struct Parser {
    syntax: Syntax,
}

impl Parser {
    pub fn new() -> Self {
        Self {
            syntax: Syntax::Es(Default::default()),
        }
    }

    pub fn builder() -> ParserBuilder {
        ParserBuilder::new()
    }

    pub fn for_file(filename: &str) -> Self {
        match detect_language(filename) {
            Language::JavaScript => Self::new(),
            Language::TypeScript => Self::builder().typescript(true).build(),
            Language::Jsx => Self::builder().jsx(true).build(),
            Language::Tsx => Self::builder().typescript(true).jsx(true).build(),
        }
    }

    pub fn from_config(config: &ParserConfig) -> Self {
        Self::builder()
            .typescript(config.typescript)
            .jsx(config.jsx)
            .decorators(config.decorators)
            .build()
    }

    pub fn parse_module(&self, code: &str) -> Result<Module, ParseError> {
        let source_map: Lrc<SourceMap> = Default::default();
        let fm = source_map
            .new_source_file(FileName::Custom("input.js".into()).into(), code.to_string());

        let lexer = Lexer::new(
            self.syntax,
            Default::default(),
            StringInput::from(&*fm),
            None,
        );

        let mut parser = swc_ecma_parser::Parser::new_from(lexer);

        parser.parse_module().map_err(|e| {
            let span = e.span();
            let loc = source_map.lookup_char_pos(span.lo);
            ParseError {
                line: loc.line,
                column: loc.col_display,
                message: e.kind().msg().to_string(),
            }
        })
    }

    /// Parse with error recovery, returning whatever AST could be built
    /// together with the recovered errors and the file's base byte offset.
    pub fn parse_module_recovering(&self, code: &str) -> (ParseResult, u32) {
        let source_map: Lrc<SourceMap> = Default::default();
        let fm = source_map
            .new_source_file(FileName::Custom("input.js".into()).into(), code.to_string());
        let base_pos = fm.start_pos.0;

        let mut recovered = Vec::new();
        let result = parse_file_as_module(&fm, self.syntax, EsVersion::latest(), None, &mut recovered);

        let to_parse_error = |e: &swc_ecma_parser::error::Error| {
            let span = e.span();
            let loc = source_map.lookup_char_pos(span.lo);
            ParseError {
                line: loc.line,
                column: loc.col_display,
                message: e.kind().msg().to_string(),
            }
        };

        let mut errors: Vec<ParseError> = recovered.iter().map(to_parse_error).collect();

        let module = match result {
            Ok(module) => Some(module),
            Err(e) => {
                errors.push(to_parse_error(&e));
                None
            }
        };

        (ParseResult { module, errors }, base_pos)
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_module() {
        let parser = Parser::new();

        let module = parser.parse_module("const x = 1;").unwrap();

        assert_eq!(module.body.len(), 1);
    }

    #[test]
    fn parse_invalid_syntax_returns_error() {
        let parser = Parser::new();

        let result = parser.parse_module("const = ;");

        assert!(result.is_err());
        let error = result.unwrap_err();
        assert_eq!(error.line, 1);
        assert!(!error.message.is_empty());
    }

    #[test]
    fn detect_language_from_extension() {
        assert_eq!(detect_language("file.js"), Language::JavaScript);
        assert_eq!(detect_language("file.mjs"), Language::JavaScript);
        assert_eq!(detect_language("file.jsx"), Language::Jsx);
        assert_eq!(detect_language("file.ts"), Language::TypeScript);
        assert_eq!(detect_language("file.mts"), Language::TypeScript);
        assert_eq!(detect_language("file.tsx"), Language::Tsx);
        assert_eq!(detect_language("unknown"), Language::JavaScript);
    }

    #[test]
    fn typescript_parser_accepts_annotations() {
        let parser = Parser::builder().typescript(true).build();

        assert!(parser.parse_module("const x: number = 1;").is_ok());
    }

    #[test]
    fn tsx_parser_accepts_jsx_elements() {
        let parser = Parser::builder().typescript(true).jsx(true).build();

        assert!(parser.parse_module("const App = () => <div />;").is_ok());
    }

    #[test]
    fn parsed_file_carries_metadata() {
        let parsed = ParsedFile::from_source("test.ts", "const x: number = 1;");

        assert_eq!(parsed.metadata().filename, "test.ts");
        assert_eq!(parsed.metadata().language, Language::TypeScript);
        assert!(!parsed.metadata().has_errors);
        assert!(parsed.module().is_some());
    }

    #[test]
    fn parsed_file_recovers_from_errors() {
        let parsed = ParsedFile::from_source("test.js", "const x =");

        assert!(parsed.metadata().has_errors);
        assert!(!parsed.errors().is_empty());
    }

    #[test]
    fn span_text_maps_back_to_source() {
        use swc_common::Spanned;

        let code = "foo();\nbar();";
        let parsed = ParsedFile::from_source("test.js", code);
        let module = parsed.module().unwrap();

        let first = module.body[0].as_stmt().unwrap();
        assert_eq!(parsed.span_text(first.span()), Some("foo();"));

        let second = module.body[1].as_stmt().unwrap();
        assert_eq!(parsed.span_text(second.span()), Some("bar();"));
        assert_eq!(parsed.span_location(second.span()), (2, 1));
    }

    #[test]
    fn parser_from_config_honours_syntax_options() {
        let config = ParserConfig {
            typescript: true,
            jsx: false,
            decorators: false,
        };
        let parser = Parser::from_config(&config);

        assert!(parser.parse_module("let a: string;").is_ok());
    }
}
