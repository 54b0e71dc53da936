use crate::ParseError;
use ariadne::{Config, Label, Report, ReportBuilder, ReportKind, Source};
use std::io;
use std::ops::Range;

const SOURCE_ID: &str = "input";

type Span = (&'static str, Range<usize>);

impl ParseError {
    fn report_builder(&self, input: &str) -> ReportBuilder<'static, Span> {
        match self {
            ParseError::UnexpectedToken { found, expected } => {
                Report::build(ReportKind::Error, (SOURCE_ID, found.span.to_range()))
                    .with_message(format!("Unexpected token: {}", found.kind))
                    .with_label(
                        Label::new((SOURCE_ID, found.span.to_range()))
                            .with_message(format!("Expected {expected}")),
                    )
            }
            ParseError::UnexpectedEof(expected) => {
                let end = input.len();
                let range = end.saturating_sub(1)..end;
                Report::build(ReportKind::Error, (SOURCE_ID, range.clone()))
                    .with_message("Unexpected end of input")
                    .with_label(
                        Label::new((SOURCE_ID, range)).with_message(format!("Expected {expected}")),
                    )
            }
            ParseError::LexerError(lex_err) => {
                Report::build(ReportKind::Error, (SOURCE_ID, lex_err.span.to_range()))
                    .with_message("Lexer Error")
                    .with_label(
                        Label::new((SOURCE_ID, lex_err.span.to_range()))
                            .with_message(lex_err.error.to_string()),
                    )
            }
            ParseError::InvalidDotSyntax(span) => {
                Report::build(ReportKind::Error, (SOURCE_ID, span.to_range()))
                    .with_message("Invalid Dot Syntax")
                    .with_label(
                        Label::new((SOURCE_ID, span.to_range()))
                            .with_message("Expected '.' between the two halves of a pair"),
                    )
            }
        }
    }

    /// Builds a report pointing into `input`, the text that failed to parse.
    pub fn report(&self, input: &str) -> Report<'static, Span> {
        self.report_builder(input).finish()
    }

    /// Writes the report without colour, e.g. into a log buffer.
    pub fn write_report<W: io::Write>(&self, input: &str, writer: W) -> io::Result<()> {
        self.report_builder(input)
            .with_config(Config::default().with_color(false))
            .finish()
            .write((SOURCE_ID, Source::from(input)), writer)
    }

    /// Prints the report to stderr.
    pub fn pretty_print(&self, input: &str) -> io::Result<()> {
        self.report(input)
            .eprint((SOURCE_ID, Source::from(input)))
    }
}
