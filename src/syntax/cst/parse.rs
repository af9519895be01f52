//! Tokens → green tree
//!
//! # Implementation rules
//!
//! - Parse functions look ahead with `peek_significant` and only then bump
//!   trivia, so leading trivia stays outside the node a decision creates.
//! - Layout: a construct remembers the column of its first token (`indent`).
//!   A later token at a column ≤ `indent` belongs to an enclosing construct.
//!   `let` declarations and `case` branches align on the column of the first
//!   declaration/branch.

use rowan::{GreenNode, GreenNodeBuilder};
use thiserror::Error;

use crate::syntax::{
    cst::{
        lex::{LexError, Token},
        SyntaxKind,
    },
    span::LineTable,
};

/// Parse / lexing error
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("expected {expected}, found `{found:?}` while parsing {ctx:?}")]
    UnexpectedToken {
        expected: String,
        found: Token,
        ctx: ErrorContext,
    },
    #[error("expected {expected}, found end of file")]
    UnexpectedEof { expected: String },
    #[error(transparent)]
    Lex(#[from] LexError),
}

impl ParseError {
    /// Returns a detailed error message quoting source text
    pub fn detailed_message(&self, src: &str) -> String {
        match self {
            ParseError::UnexpectedToken {
                expected,
                found,
                ctx,
            } => format!(
                "expected {expected}, found `{}` while parsing {ctx:?}",
                found.slice(src)
            ),
            ParseError::UnexpectedEof { expected } => {
                format!("expected {expected}, found end of file")
            }
            ParseError::Lex(err) => format!("{} at `{}`", err, err.span().slice(src)),
        }
    }
}

/// Surrounding context of a [`ParseError`], e.g., "while parsing an import"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorContext {
    ModuleDeclaration,
    ImportClause,
    ExposingList,
    Declaration,
    TypeDeclaration,
    TypeExpr,
    Expr,
    IfElse,
    LetIn,
    CaseOf,
    CaseBranch,
    Pattern,
    Record,
    ListExpr,
    ParenExpr,
}

/// Creates a CST
pub fn parse<'s, 't>(src: &'s str, tks: &'t [Token]) -> (GreenNode, Vec<ParseError>) {
    let pcx = ParseContext {
        src,
        tks,
        lines: LineTable::new(src),
    };
    let parser = ParseState::new();
    parser.run(&pcx)
}

/// Referred to as `pcx`
#[derive(Debug, Clone)]
struct ParseContext<'s, 't> {
    src: &'s str,
    tks: &'t [Token],
    lines: LineTable,
}

impl<'s, 't> ParseContext<'s, 't> {
    fn col(&self, tk: &Token) -> usize {
        self.lines.location(tk.span.lo).col
    }
}

/// Green tree builder driven over the token slice
#[derive(Debug)]
struct ParseState {
    pos: usize,
    builder: GreenNodeBuilder<'static>,
    errs: Vec<ParseError>,
}

fn starts_type_atom(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::UpperCaseIdentifier
            | SyntaxKind::LowerCaseIdentifier
            | SyntaxKind::LParen
            | SyntaxKind::LBrace
    )
}

fn starts_expr_atom(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::LowerCaseIdentifier
            | SyntaxKind::UpperCaseIdentifier
            | SyntaxKind::Number
            | SyntaxKind::StringLiteral
            | SyntaxKind::CharLiteral
            | SyntaxKind::LParen
            | SyntaxKind::LBracket
            | SyntaxKind::LBrace
    )
}

fn starts_operand(kind: SyntaxKind) -> bool {
    starts_expr_atom(kind)
        || matches!(
            kind,
            SyntaxKind::IfKw | SyntaxKind::LetKw | SyntaxKind::CaseKw | SyntaxKind::Backslash
        )
}

fn starts_pattern(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::LowerCaseIdentifier
            | SyntaxKind::UpperCaseIdentifier
            | SyntaxKind::Underscore
            | SyntaxKind::Number
            | SyntaxKind::StringLiteral
            | SyntaxKind::CharLiteral
            | SyntaxKind::LParen
            | SyntaxKind::LBrace
    )
}

impl ParseState {
    pub fn new() -> Self {
        Self {
            pos: 0,
            builder: GreenNodeBuilder::new(),
            errs: vec![],
        }
    }

    pub fn run(mut self, pcx: &ParseContext) -> (GreenNode, Vec<ParseError>) {
        self.builder.start_node(SyntaxKind::ROOT.into());

        while let Some(tk) = self.peek_significant(pcx).copied() {
            if !self.maybe_bump_declaration(pcx) {
                self.errs.push(ParseError::UnexpectedToken {
                    expected: "a declaration".to_string(),
                    found: tk,
                    ctx: ErrorContext::Declaration,
                });

                // discard the token so that we won't enter an infinite loop
                self.maybe_bump_trivia(pcx);
                self.bump(pcx);
            }
        }

        self.maybe_bump_trivia(pcx);
        self.builder.finish_node();

        (self.builder.finish(), self.errs)
    }
}

/// Helpers
impl ParseState {
    fn peek_raw_kind(&self, pcx: &ParseContext) -> Option<SyntaxKind> {
        pcx.tks.get(self.pos).map(|tk| tk.kind)
    }

    fn peek_raw_kind_n(&self, pcx: &ParseContext, n: usize) -> Option<SyntaxKind> {
        pcx.tks.get(self.pos + n).map(|tk| tk.kind)
    }

    fn peek_significant<'t>(&self, pcx: &ParseContext<'_, 't>) -> Option<&'t Token> {
        pcx.tks[self.pos..].iter().find(|tk| !tk.kind.is_trivia())
    }

    fn peek_significant_n<'t>(&self, pcx: &ParseContext<'_, 't>, n: usize) -> Option<&'t Token> {
        pcx.tks[self.pos..]
            .iter()
            .filter(|tk| !tk.kind.is_trivia())
            .nth(n)
    }

    fn peek_significant_kind(&self, pcx: &ParseContext) -> Option<SyntaxKind> {
        self.peek_significant(pcx).map(|tk| tk.kind)
    }

    fn peek_significant_kind_n(&self, pcx: &ParseContext, n: usize) -> Option<SyntaxKind> {
        self.peek_significant_n(pcx, n).map(|tk| tk.kind)
    }

    /// Column of the next significant token; the caller knows it exists
    fn peek_col(&self, pcx: &ParseContext) -> usize {
        let tk = self.peek_significant(pcx).unwrap_or_else(|| {
            unreachable!("peeked column at end of file")
        });
        pcx.col(tk)
    }

    /// Peeks the next significant token if it still belongs to a construct
    /// whose first token sits at column `indent` (the layout rule)
    fn peek_in<'t>(&self, pcx: &ParseContext<'_, 't>, indent: usize) -> Option<&'t Token> {
        let tk = self.peek_significant(pcx)?;
        if pcx.col(tk) > indent {
            Some(tk)
        } else {
            None
        }
    }

    fn peek_in_kind(&self, pcx: &ParseContext, indent: usize) -> Option<SyntaxKind> {
        self.peek_in(pcx, indent).map(|tk| tk.kind)
    }

    /// Consume the next raw token
    fn bump<'t>(&mut self, pcx: &ParseContext<'_, 't>) -> &'t Token {
        let tk = &pcx.tks[self.pos];
        self.builder.token(tk.kind.into(), tk.slice(pcx.src));
        self.pos += 1;
        tk
    }

    fn bump_kind<'t>(&mut self, pcx: &ParseContext<'_, 't>, kind: SyntaxKind) -> &'t Token {
        self.maybe_bump_trivia(pcx);
        let tk = self.bump(pcx);
        assert_eq!(tk.kind, kind);
        tk
    }

    fn maybe_bump_kind(&mut self, pcx: &ParseContext, kind: SyntaxKind) -> Option<()> {
        if self.peek_significant_kind(pcx) != Some(kind) {
            return None;
        }

        self.maybe_bump_trivia(pcx);
        self.bump(pcx);
        Some(())
    }

    fn maybe_bump_trivia(&mut self, pcx: &ParseContext) {
        while let Some(tk) = pcx.tks.get(self.pos) {
            if !tk.kind.is_trivia() {
                break;
            }
            self.bump(pcx);
        }
    }

    /// Bumps trivia into the current node and starts a child node
    fn start_node(&mut self, pcx: &ParseContext, kind: SyntaxKind) {
        self.maybe_bump_trivia(pcx);
        self.builder.start_node(kind.into());
    }

    fn checkpoint(&mut self, pcx: &ParseContext) -> rowan::Checkpoint {
        self.maybe_bump_trivia(pcx);
        self.builder.checkpoint()
    }

    fn wrap_at(&mut self, checkpoint: rowan::Checkpoint, kind: SyntaxKind) {
        self.builder.start_node_at(checkpoint, kind.into());
        self.builder.finish_node();
    }

    fn err_expected(&mut self, pcx: &ParseContext, expected: &str, ctx: ErrorContext) {
        let err = match self.peek_significant(pcx) {
            Some(tk) => ParseError::UnexpectedToken {
                expected: expected.to_string(),
                found: *tk,
                ctx,
            },
            None => ParseError::UnexpectedEof {
                expected: expected.to_string(),
            },
        };
        self.errs.push(err);
    }

    fn expect_kind(
        &mut self,
        pcx: &ParseContext,
        kind: SyntaxKind,
        expected: &str,
        ctx: ErrorContext,
    ) -> bool {
        if self.maybe_bump_kind(pcx, kind).is_some() {
            true
        } else {
            self.err_expected(pcx, expected, ctx);
            false
        }
    }
}

/// Declarations
impl ParseState {
    /// declaration → module | import | port … | type … | annotation | value
    fn maybe_bump_declaration(&mut self, pcx: &ParseContext) -> bool {
        let Some(kind) = self.peek_significant_kind(pcx) else {
            return false;
        };

        match kind {
            SyntaxKind::ModuleKw => self.bump_module_declaration(pcx),
            SyntaxKind::PortKw => {
                if self.peek_significant_kind_n(pcx, 1) == Some(SyntaxKind::ModuleKw) {
                    self.bump_module_declaration(pcx);
                } else {
                    self.bump_port_annotation(pcx);
                }
            }
            SyntaxKind::ImportKw => self.bump_import_clause(pcx),
            SyntaxKind::TypeKw => self.bump_type_declaration(pcx),
            SyntaxKind::LowerCaseIdentifier => {
                if self.peek_significant_kind_n(pcx, 1) == Some(SyntaxKind::Colon) {
                    self.bump_type_annotation(pcx);
                } else {
                    self.bump_value_declaration(pcx);
                }
            }
            _ => return false,
        }

        true
    }

    /// module-declaration → "port"? "module" UpperCaseQid "exposing" ExposingList
    fn bump_module_declaration(&mut self, pcx: &ParseContext) {
        self.start_node(pcx, SyntaxKind::ModuleDeclaration);

        self.maybe_bump_kind(pcx, SyntaxKind::PortKw);
        self.bump_kind(pcx, SyntaxKind::ModuleKw);

        if self.maybe_bump_upper_qid(pcx).is_none() {
            self.err_expected(pcx, "a module name", ErrorContext::ModuleDeclaration);
        }

        if self.expect_kind(
            pcx,
            SyntaxKind::ExposingKw,
            "`exposing`",
            ErrorContext::ModuleDeclaration,
        ) && self.maybe_bump_exposing_list(pcx).is_none()
        {
            self.err_expected(pcx, "an exposing list", ErrorContext::ModuleDeclaration);
        }

        self.builder.finish_node();
    }

    /// import-clause → "import" UpperCaseQid AsClause? ("exposing" ExposingList)?
    fn bump_import_clause(&mut self, pcx: &ParseContext) {
        self.start_node(pcx, SyntaxKind::ImportClause);

        self.bump_kind(pcx, SyntaxKind::ImportKw);

        if self.maybe_bump_upper_qid(pcx).is_none() {
            self.err_expected(pcx, "a module name", ErrorContext::ImportClause);
        }

        if self.peek_significant_kind(pcx) == Some(SyntaxKind::AsKw) {
            self.start_node(pcx, SyntaxKind::AsClause);
            self.bump_kind(pcx, SyntaxKind::AsKw);
            if self
                .maybe_bump_kind(pcx, SyntaxKind::UpperCaseIdentifier)
                .is_none()
            {
                self.err_expected(pcx, "an alias name", ErrorContext::ImportClause);
            }
            self.builder.finish_node();
        }

        if self.maybe_bump_kind(pcx, SyntaxKind::ExposingKw).is_some()
            && self.maybe_bump_exposing_list(pcx).is_none()
        {
            self.err_expected(pcx, "an exposing list", ErrorContext::ImportClause);
        }

        self.builder.finish_node();
    }

    /// exposing-list → "(" ".." ")" | "(" item ("," item)* ")"
    fn maybe_bump_exposing_list(&mut self, pcx: &ParseContext) -> Option<()> {
        if self.peek_significant_kind(pcx) != Some(SyntaxKind::LParen) {
            return None;
        }

        self.start_node(pcx, SyntaxKind::ExposingList);
        self.bump_kind(pcx, SyntaxKind::LParen);

        if self.maybe_bump_kind(pcx, SyntaxKind::DotDot).is_none() {
            loop {
                match self.peek_significant_kind(pcx) {
                    Some(SyntaxKind::LowerCaseIdentifier) => {
                        self.start_node(pcx, SyntaxKind::ExposedValue);
                        self.bump_kind(pcx, SyntaxKind::LowerCaseIdentifier);
                        self.builder.finish_node();
                    }
                    Some(SyntaxKind::UpperCaseIdentifier) => {
                        self.start_node(pcx, SyntaxKind::ExposedType);
                        self.bump_kind(pcx, SyntaxKind::UpperCaseIdentifier);

                        // optional `(..)`
                        if self.peek_significant_kind(pcx) == Some(SyntaxKind::LParen)
                            && self.peek_significant_kind_n(pcx, 1) == Some(SyntaxKind::DotDot)
                        {
                            self.start_node(pcx, SyntaxKind::ExposedUnionConstructors);
                            self.bump_kind(pcx, SyntaxKind::LParen);
                            self.bump_kind(pcx, SyntaxKind::DotDot);
                            self.expect_kind(
                                pcx,
                                SyntaxKind::RParen,
                                "`)`",
                                ErrorContext::ExposingList,
                            );
                            self.builder.finish_node();
                        }

                        self.builder.finish_node();
                    }
                    _ => break,
                }

                if self.maybe_bump_kind(pcx, SyntaxKind::Comma).is_none() {
                    break;
                }
            }
        }

        self.expect_kind(pcx, SyntaxKind::RParen, "`)`", ErrorContext::ExposingList);
        self.builder.finish_node();

        Some(())
    }

    /// type-annotation → LowerCaseIdentifier ":" type
    fn bump_type_annotation(&mut self, pcx: &ParseContext) {
        let indent = self.peek_col(pcx);

        self.start_node(pcx, SyntaxKind::TypeAnnotation);
        self.bump_kind(pcx, SyntaxKind::LowerCaseIdentifier);
        self.expect_kind(pcx, SyntaxKind::Colon, "`:`", ErrorContext::Declaration);

        if self.bump_type_expr(pcx, indent).is_none() {
            self.err_expected(pcx, "a type", ErrorContext::TypeExpr);
        }

        self.builder.finish_node();
    }

    /// port-annotation → "port" LowerCaseIdentifier ":" type
    fn bump_port_annotation(&mut self, pcx: &ParseContext) {
        let indent = self.peek_col(pcx);

        self.start_node(pcx, SyntaxKind::PortAnnotation);
        self.bump_kind(pcx, SyntaxKind::PortKw);

        if self
            .maybe_bump_kind(pcx, SyntaxKind::LowerCaseIdentifier)
            .is_none()
        {
            self.err_expected(pcx, "a port name", ErrorContext::Declaration);
        }
        self.expect_kind(pcx, SyntaxKind::Colon, "`:`", ErrorContext::Declaration);

        if self.bump_type_expr(pcx, indent).is_none() {
            self.err_expected(pcx, "a type", ErrorContext::TypeExpr);
        }

        self.builder.finish_node();
    }

    /// type-declaration → "type" "alias"? UpperCaseIdentifier LowerTypeName* "=" …
    fn bump_type_declaration(&mut self, pcx: &ParseContext) {
        let indent = self.peek_col(pcx);
        let checkpoint = self.checkpoint(pcx);

        self.bump_kind(pcx, SyntaxKind::TypeKw);
        let alias = self.maybe_bump_kind(pcx, SyntaxKind::AliasKw).is_some();

        let kind = if alias {
            SyntaxKind::TypeAliasDeclaration
        } else {
            SyntaxKind::TypeDeclaration
        };
        self.builder.start_node_at(checkpoint, kind.into());

        if self
            .maybe_bump_kind(pcx, SyntaxKind::UpperCaseIdentifier)
            .is_none()
        {
            self.err_expected(pcx, "a type name", ErrorContext::TypeDeclaration);
        }

        while self.peek_significant_kind(pcx) == Some(SyntaxKind::LowerCaseIdentifier) {
            self.start_node(pcx, SyntaxKind::LowerTypeName);
            self.bump_kind(pcx, SyntaxKind::LowerCaseIdentifier);
            self.builder.finish_node();
        }

        if self.expect_kind(pcx, SyntaxKind::Eq, "`=`", ErrorContext::TypeDeclaration) {
            if alias {
                if self.bump_type_expr(pcx, indent).is_none() {
                    self.err_expected(pcx, "a type", ErrorContext::TypeExpr);
                }
            } else {
                loop {
                    if self.maybe_bump_union_variant(pcx, indent).is_none() {
                        self.err_expected(pcx, "a constructor", ErrorContext::TypeDeclaration);
                        break;
                    }

                    if self.maybe_bump_kind(pcx, SyntaxKind::Pipe).is_none() {
                        break;
                    }
                }
            }
        }

        self.builder.finish_node();
    }

    /// union-variant → UpperCaseIdentifier type-atom*
    fn maybe_bump_union_variant(&mut self, pcx: &ParseContext, indent: usize) -> Option<()> {
        if self.peek_significant_kind(pcx) != Some(SyntaxKind::UpperCaseIdentifier) {
            return None;
        }

        self.start_node(pcx, SyntaxKind::UnionVariant);
        self.bump_kind(pcx, SyntaxKind::UpperCaseIdentifier);

        while let Some(kind) = self.peek_in_kind(pcx, indent) {
            if !self::starts_type_atom(kind) {
                break;
            }
            self.bump_type_atom(pcx, indent);
        }

        self.builder.finish_node();
        Some(())
    }

    /// value-declaration → FunctionDeclarationLeft "=" expression
    fn bump_value_declaration(&mut self, pcx: &ParseContext) {
        let indent = self.peek_col(pcx);

        self.start_node(pcx, SyntaxKind::ValueDeclaration);

        {
            self.start_node(pcx, SyntaxKind::FunctionDeclarationLeft);
            self.bump_kind(pcx, SyntaxKind::LowerCaseIdentifier);

            while let Some(kind) = self.peek_in_kind(pcx, indent) {
                if kind == SyntaxKind::Eq || self.maybe_bump_pattern_atom(pcx).is_none() {
                    break;
                }
            }

            self.builder.finish_node();
        }

        if self.expect_kind(pcx, SyntaxKind::Eq, "`=`", ErrorContext::Declaration)
            && self.bump_expression(pcx, indent).is_none()
        {
            self.err_expected(pcx, "an expression", ErrorContext::Expr);
        }

        self.builder.finish_node();
    }
}

/// Names
impl ParseState {
    /// upper-qid → UpperCaseIdentifier ("." UpperCaseIdentifier)*
    ///
    /// Segments must be adjacent in the token stream; `Foo . Bar` is two
    /// names and a dot, not a path.
    fn maybe_bump_upper_qid(&mut self, pcx: &ParseContext) -> Option<()> {
        if self.peek_significant_kind(pcx) != Some(SyntaxKind::UpperCaseIdentifier) {
            return None;
        }

        self.start_node(pcx, SyntaxKind::UpperCaseQid);
        self.bump_kind(pcx, SyntaxKind::UpperCaseIdentifier);

        while self.peek_raw_kind(pcx) == Some(SyntaxKind::Dot)
            && self.peek_raw_kind_n(pcx, 1) == Some(SyntaxKind::UpperCaseIdentifier)
        {
            self.bump(pcx);
            self.bump(pcx);
        }

        self.builder.finish_node();
        Some(())
    }

    /// value-qid → (UpperCaseIdentifier ".")* (LowerCaseIdentifier | UpperCaseIdentifier)
    fn maybe_bump_value_qid(&mut self, pcx: &ParseContext) -> Option<()> {
        let mut last = self.peek_significant_kind(pcx)?;
        if !matches!(
            last,
            SyntaxKind::LowerCaseIdentifier | SyntaxKind::UpperCaseIdentifier
        ) {
            return None;
        }

        self.start_node(pcx, SyntaxKind::ValueQid);
        self.maybe_bump_trivia(pcx);
        self.bump(pcx);

        while last == SyntaxKind::UpperCaseIdentifier
            && self.peek_raw_kind(pcx) == Some(SyntaxKind::Dot)
            && matches!(
                self.peek_raw_kind_n(pcx, 1),
                Some(SyntaxKind::LowerCaseIdentifier) | Some(SyntaxKind::UpperCaseIdentifier)
            )
        {
            self.bump(pcx);
            last = self.bump(pcx).kind;
        }

        self.builder.finish_node();
        Some(())
    }
}

/// Types
impl ParseState {
    /// type → type-segment ("->" type-segment)*
    fn bump_type_expr(&mut self, pcx: &ParseContext, indent: usize) -> Option<()> {
        let kind = self.peek_in_kind(pcx, indent)?;
        if !self::starts_type_atom(kind) {
            return None;
        }

        self.start_node(pcx, SyntaxKind::TypeRef);
        self.bump_type_segment(pcx, indent);

        while self.peek_in_kind(pcx, indent) == Some(SyntaxKind::Arrow) {
            self.maybe_bump_kind(pcx, SyntaxKind::Arrow);
            if self.bump_type_segment(pcx, indent).is_none() {
                self.err_expected(pcx, "a type", ErrorContext::TypeExpr);
                break;
            }
        }

        self.builder.finish_node();
        Some(())
    }

    /// type-segment → UpperCaseQid type-atom* | type-atom
    fn bump_type_segment(&mut self, pcx: &ParseContext, indent: usize) -> Option<()> {
        let kind = self.peek_in_kind(pcx, indent)?;

        if kind != SyntaxKind::UpperCaseIdentifier {
            return self.bump_type_atom(pcx, indent);
        }

        let checkpoint = self.checkpoint(pcx);
        self.maybe_bump_upper_qid(pcx);

        let applied = matches!(
            self.peek_in_kind(pcx, indent),
            Some(kind) if self::starts_type_atom(kind)
        );

        if applied {
            self.builder
                .start_node_at(checkpoint, SyntaxKind::ParametricTypeRef.into());
            while let Some(kind) = self.peek_in_kind(pcx, indent) {
                if !self::starts_type_atom(kind) {
                    break;
                }
                self.bump_type_atom(pcx, indent);
            }
            self.builder.finish_node();
        } else {
            self.wrap_at(checkpoint, SyntaxKind::UpperPathTypeRef);
        }

        Some(())
    }

    /// type-atom → bare qid | variable | record | tuple | unit | parens
    fn bump_type_atom(&mut self, pcx: &ParseContext, indent: usize) -> Option<()> {
        let kind = self.peek_in_kind(pcx, indent)?;

        match kind {
            SyntaxKind::UpperCaseIdentifier => {
                let checkpoint = self.checkpoint(pcx);
                self.maybe_bump_upper_qid(pcx);
                self.wrap_at(checkpoint, SyntaxKind::UpperPathTypeRef);
                Some(())
            }
            SyntaxKind::LowerCaseIdentifier => {
                self.start_node(pcx, SyntaxKind::TypeVariableRef);
                self.bump_kind(pcx, SyntaxKind::LowerCaseIdentifier);
                self.builder.finish_node();
                Some(())
            }
            SyntaxKind::LBrace => self.bump_record_type(pcx, indent),
            SyntaxKind::LParen => {
                let checkpoint = self.checkpoint(pcx);
                self.bump_kind(pcx, SyntaxKind::LParen);

                // `()`
                if self.maybe_bump_kind(pcx, SyntaxKind::RParen).is_some() {
                    self.wrap_at(checkpoint, SyntaxKind::Unit);
                    return Some(());
                }

                if self.bump_type_expr(pcx, indent).is_none() {
                    self.err_expected(pcx, "a type", ErrorContext::TypeExpr);
                }

                if self.peek_significant_kind(pcx) == Some(SyntaxKind::Comma) {
                    while self.maybe_bump_kind(pcx, SyntaxKind::Comma).is_some() {
                        if self.bump_type_expr(pcx, indent).is_none() {
                            self.err_expected(pcx, "a type", ErrorContext::TypeExpr);
                            break;
                        }
                    }
                    self.expect_kind(pcx, SyntaxKind::RParen, "`)`", ErrorContext::TypeExpr);
                    self.wrap_at(checkpoint, SyntaxKind::TupleType);
                } else {
                    // plain parentheses; the inner `TypeRef` is the segment
                    self.expect_kind(pcx, SyntaxKind::RParen, "`)`", ErrorContext::TypeExpr);
                }

                Some(())
            }
            _ => None,
        }
    }

    /// record-type → "{" (base "|")? FieldType ("," FieldType)* "}" | "{" "}"
    fn bump_record_type(&mut self, pcx: &ParseContext, indent: usize) -> Option<()> {
        if self.peek_significant_kind(pcx) != Some(SyntaxKind::LBrace) {
            return None;
        }

        self.start_node(pcx, SyntaxKind::RecordType);
        self.bump_kind(pcx, SyntaxKind::LBrace);

        if self.maybe_bump_kind(pcx, SyntaxKind::RBrace).is_some() {
            self.builder.finish_node();
            return Some(());
        }

        // base record variable, `{ r | … }`
        if self.peek_significant_kind(pcx) == Some(SyntaxKind::LowerCaseIdentifier)
            && self.peek_significant_kind_n(pcx, 1) == Some(SyntaxKind::Pipe)
        {
            self.maybe_bump_kind(pcx, SyntaxKind::LowerCaseIdentifier);
            self.maybe_bump_kind(pcx, SyntaxKind::Pipe);
        }

        loop {
            if self.maybe_bump_field_type(pcx, indent).is_none() {
                self.err_expected(pcx, "a record field", ErrorContext::Record);
                break;
            }

            if self.maybe_bump_kind(pcx, SyntaxKind::Comma).is_none() {
                break;
            }
        }

        self.expect_kind(pcx, SyntaxKind::RBrace, "`}`", ErrorContext::Record);
        self.builder.finish_node();

        Some(())
    }

    /// field-type → LowerCaseIdentifier ":" type
    fn maybe_bump_field_type(&mut self, pcx: &ParseContext, indent: usize) -> Option<()> {
        if self.peek_significant_kind(pcx) != Some(SyntaxKind::LowerCaseIdentifier) {
            return None;
        }

        self.start_node(pcx, SyntaxKind::FieldType);
        self.bump_kind(pcx, SyntaxKind::LowerCaseIdentifier);
        self.expect_kind(pcx, SyntaxKind::Colon, "`:`", ErrorContext::Record);

        if self.bump_type_expr(pcx, indent).is_none() {
            self.err_expected(pcx, "a type", ErrorContext::TypeExpr);
        }

        self.builder.finish_node();
        Some(())
    }
}

/// Expressions
impl ParseState {
    /// expression → operand (operator operand)*
    ///
    /// The chain stays flat: operator precedence is a semantic concern, not a
    /// tree-shape concern.
    fn bump_expression(&mut self, pcx: &ParseContext, indent: usize) -> Option<()> {
        let kind = self.peek_in_kind(pcx, indent)?;
        if !(self::starts_operand(kind) || kind == SyntaxKind::Operator) {
            return None;
        }

        self.start_node(pcx, SyntaxKind::Expression);

        loop {
            // prefix operators (negation) and operator-recovery runs
            let mut prefixed = false;
            while self.peek_in_kind(pcx, indent) == Some(SyntaxKind::Operator) {
                self.maybe_bump_kind(pcx, SyntaxKind::Operator);
                prefixed = true;
            }

            if self.bump_operand(pcx, indent).is_none() {
                if prefixed {
                    self.err_expected(pcx, "an operand", ErrorContext::Expr);
                }
                break;
            }

            if self.peek_in_kind(pcx, indent) != Some(SyntaxKind::Operator) {
                break;
            }
            self.maybe_bump_kind(pcx, SyntaxKind::Operator);

            if self.peek_in(pcx, indent).is_none() {
                self.err_expected(pcx, "an operand", ErrorContext::Expr);
                break;
            }
        }

        self.builder.finish_node();
        Some(())
    }

    /// operand → if | let | case | lambda | atom atom*
    fn bump_operand(&mut self, pcx: &ParseContext, indent: usize) -> Option<()> {
        let kind = self.peek_in_kind(pcx, indent)?;

        match kind {
            SyntaxKind::IfKw => {
                self.bump_if_else(pcx, indent);
                Some(())
            }
            SyntaxKind::LetKw => {
                self.bump_let_in(pcx, indent);
                Some(())
            }
            SyntaxKind::CaseKw => {
                self.bump_case_of(pcx, indent);
                Some(())
            }
            SyntaxKind::Backslash => {
                self.bump_lambda(pcx, indent);
                Some(())
            }
            kind if self::starts_expr_atom(kind) => {
                let checkpoint = self.checkpoint(pcx);
                self.bump_expr_atom(pcx, indent)?;

                let mut applied = false;
                while let Some(kind) = self.peek_in_kind(pcx, indent) {
                    if !self::starts_expr_atom(kind) {
                        break;
                    }
                    applied = true;
                    self.bump_expr_atom(pcx, indent);
                }

                if applied {
                    self.builder
                        .start_node_at(checkpoint, SyntaxKind::FunctionCall.into());
                    self.builder.finish_node();
                }

                Some(())
            }
            _ => None,
        }
    }

    /// atom → reference | literal | list | record | parens/tuple/unit
    fn bump_expr_atom(&mut self, pcx: &ParseContext, indent: usize) -> Option<()> {
        let kind = self.peek_in_kind(pcx, indent)?;

        match kind {
            SyntaxKind::LowerCaseIdentifier | SyntaxKind::UpperCaseIdentifier => {
                self.start_node(pcx, SyntaxKind::ValueExpr);
                self.maybe_bump_value_qid(pcx);
                self.builder.finish_node();
                Some(())
            }
            SyntaxKind::Number | SyntaxKind::StringLiteral | SyntaxKind::CharLiteral => {
                self.start_node(pcx, SyntaxKind::Literal);
                self.maybe_bump_trivia(pcx);
                self.bump(pcx);
                self.builder.finish_node();
                Some(())
            }
            SyntaxKind::LBracket => self.bump_list_expr(pcx, indent),
            SyntaxKind::LBrace => self.bump_record_expr(pcx, indent),
            SyntaxKind::LParen => self.bump_paren_expr(pcx, indent),
            _ => None,
        }
    }

    /// list → "[" expression ("," expression)* "]" | "[" "]"
    fn bump_list_expr(&mut self, pcx: &ParseContext, indent: usize) -> Option<()> {
        self.start_node(pcx, SyntaxKind::ListExpr);
        self.bump_kind(pcx, SyntaxKind::LBracket);

        if self.maybe_bump_kind(pcx, SyntaxKind::RBracket).is_some() {
            self.builder.finish_node();
            return Some(());
        }

        loop {
            if self.bump_expression(pcx, indent).is_none() {
                self.err_expected(pcx, "an expression", ErrorContext::ListExpr);
                break;
            }

            if self.maybe_bump_kind(pcx, SyntaxKind::Comma).is_none() {
                break;
            }
        }

        self.expect_kind(pcx, SyntaxKind::RBracket, "`]`", ErrorContext::ListExpr);
        self.builder.finish_node();

        Some(())
    }

    /// record → "{" (base "|")? Field ("," Field)* "}" | "{" "}"
    fn bump_record_expr(&mut self, pcx: &ParseContext, indent: usize) -> Option<()> {
        self.start_node(pcx, SyntaxKind::Record);
        self.bump_kind(pcx, SyntaxKind::LBrace);

        if self.maybe_bump_kind(pcx, SyntaxKind::RBrace).is_some() {
            self.builder.finish_node();
            return Some(());
        }

        // base record, `{ model | … }`
        if self.peek_significant_kind(pcx) == Some(SyntaxKind::LowerCaseIdentifier)
            && self.peek_significant_kind_n(pcx, 1) == Some(SyntaxKind::Pipe)
        {
            self.maybe_bump_kind(pcx, SyntaxKind::LowerCaseIdentifier);
            self.maybe_bump_kind(pcx, SyntaxKind::Pipe);
        }

        loop {
            if self.maybe_bump_field(pcx, indent).is_none() {
                self.err_expected(pcx, "a record field", ErrorContext::Record);
                break;
            }

            if self.maybe_bump_kind(pcx, SyntaxKind::Comma).is_none() {
                break;
            }
        }

        self.expect_kind(pcx, SyntaxKind::RBrace, "`}`", ErrorContext::Record);
        self.builder.finish_node();

        Some(())
    }

    /// field → LowerCaseIdentifier "=" expression
    fn maybe_bump_field(&mut self, pcx: &ParseContext, indent: usize) -> Option<()> {
        if self.peek_significant_kind(pcx) != Some(SyntaxKind::LowerCaseIdentifier) {
            return None;
        }

        self.start_node(pcx, SyntaxKind::Field);
        self.bump_kind(pcx, SyntaxKind::LowerCaseIdentifier);
        self.expect_kind(pcx, SyntaxKind::Eq, "`=`", ErrorContext::Record);

        if self.bump_expression(pcx, indent).is_none() {
            self.err_expected(pcx, "an expression", ErrorContext::Record);
        }

        self.builder.finish_node();
        Some(())
    }

    /// parens → "()" | "(" operator ")" | tuple | "(" expression ")"
    fn bump_paren_expr(&mut self, pcx: &ParseContext, indent: usize) -> Option<()> {
        let checkpoint = self.checkpoint(pcx);
        self.bump_kind(pcx, SyntaxKind::LParen);

        // `()`
        if self.maybe_bump_kind(pcx, SyntaxKind::RParen).is_some() {
            self.wrap_at(checkpoint, SyntaxKind::Unit);
            return Some(());
        }

        // `(+)`
        if self.peek_significant_kind(pcx) == Some(SyntaxKind::Operator)
            && self.peek_significant_kind_n(pcx, 1) == Some(SyntaxKind::RParen)
        {
            self.maybe_bump_kind(pcx, SyntaxKind::Operator);
            self.maybe_bump_kind(pcx, SyntaxKind::RParen);
            self.wrap_at(checkpoint, SyntaxKind::OperatorAsFunction);
            return Some(());
        }

        if self.bump_expression(pcx, indent).is_none() {
            self.err_expected(pcx, "an expression", ErrorContext::ParenExpr);
        }

        if self.peek_significant_kind(pcx) == Some(SyntaxKind::Comma) {
            while self.maybe_bump_kind(pcx, SyntaxKind::Comma).is_some() {
                if self.bump_expression(pcx, indent).is_none() {
                    self.err_expected(pcx, "an expression", ErrorContext::ParenExpr);
                    break;
                }
            }
            self.expect_kind(pcx, SyntaxKind::RParen, "`)`", ErrorContext::ParenExpr);
            self.wrap_at(checkpoint, SyntaxKind::Tuple);
        } else {
            self.expect_kind(pcx, SyntaxKind::RParen, "`)`", ErrorContext::ParenExpr);
            self.wrap_at(checkpoint, SyntaxKind::ParenthesizedExpression);
        }

        Some(())
    }

    /// if-else → "if" expression "then" expression "else" expression
    fn bump_if_else(&mut self, pcx: &ParseContext, indent: usize) {
        self.start_node(pcx, SyntaxKind::IfElse);
        self.bump_kind(pcx, SyntaxKind::IfKw);

        if self.bump_expression(pcx, indent).is_none() {
            self.err_expected(pcx, "a condition", ErrorContext::IfElse);
        }

        if self.expect_kind(pcx, SyntaxKind::ThenKw, "`then`", ErrorContext::IfElse)
            && self.bump_expression(pcx, indent).is_none()
        {
            self.err_expected(pcx, "an expression", ErrorContext::IfElse);
        }

        if self.expect_kind(pcx, SyntaxKind::ElseKw, "`else`", ErrorContext::IfElse)
            && self.bump_expression(pcx, indent).is_none()
        {
            self.err_expected(pcx, "an expression", ErrorContext::IfElse);
        }

        self.builder.finish_node();
    }

    /// lambda → "\" pattern-atom* "->" expression
    fn bump_lambda(&mut self, pcx: &ParseContext, indent: usize) {
        self.start_node(pcx, SyntaxKind::AnonymousFunction);
        self.bump_kind(pcx, SyntaxKind::Backslash);

        while let Some(kind) = self.peek_significant_kind(pcx) {
            if kind == SyntaxKind::Arrow || self.maybe_bump_pattern_atom(pcx).is_none() {
                break;
            }
        }

        if self.expect_kind(pcx, SyntaxKind::Arrow, "`->`", ErrorContext::Expr)
            && self.bump_expression(pcx, indent).is_none()
        {
            self.err_expected(pcx, "an expression", ErrorContext::Expr);
        }

        self.builder.finish_node();
    }

    /// let-in → "let" declaration+ "in" expression
    fn bump_let_in(&mut self, pcx: &ParseContext, indent: usize) {
        self.start_node(pcx, SyntaxKind::LetIn);
        self.bump_kind(pcx, SyntaxKind::LetKw);

        // inner declarations align on the column of the first one
        match self.peek_in(pcx, indent) {
            Some(tk) => {
                let decl_col = pcx.col(tk);

                loop {
                    match self.peek_significant(pcx) {
                        Some(tk)
                            if tk.kind == SyntaxKind::LowerCaseIdentifier
                                && pcx.col(tk) == decl_col =>
                        {
                            if self.peek_significant_kind_n(pcx, 1) == Some(SyntaxKind::Colon) {
                                self.bump_type_annotation(pcx);
                            } else {
                                self.bump_value_declaration(pcx);
                            }
                        }
                        _ => break,
                    }
                }
            }
            None => self.err_expected(pcx, "a declaration", ErrorContext::LetIn),
        }

        if self.expect_kind(pcx, SyntaxKind::InKw, "`in`", ErrorContext::LetIn)
            && self.bump_expression(pcx, indent).is_none()
        {
            self.err_expected(pcx, "an expression", ErrorContext::LetIn);
        }

        self.builder.finish_node();
    }

    /// case-of → "case" expression "of" branch+
    fn bump_case_of(&mut self, pcx: &ParseContext, indent: usize) {
        self.start_node(pcx, SyntaxKind::CaseOf);
        self.bump_kind(pcx, SyntaxKind::CaseKw);

        if self.bump_expression(pcx, indent).is_none() {
            self.err_expected(pcx, "an expression", ErrorContext::CaseOf);
        }

        if self.expect_kind(pcx, SyntaxKind::OfKw, "`of`", ErrorContext::CaseOf) {
            // branches align on the column of the first one
            match self.peek_in(pcx, indent) {
                Some(tk) => {
                    let branch_col = pcx.col(tk);

                    loop {
                        self.bump_case_branch(pcx, branch_col);

                        match self.peek_significant(pcx) {
                            Some(tk)
                                if pcx.col(tk) == branch_col
                                    && self::starts_pattern(tk.kind) => {}
                            _ => break,
                        }
                    }
                }
                None => self.err_expected(pcx, "a branch", ErrorContext::CaseOf),
            }
        }

        self.builder.finish_node();
    }

    /// branch → pattern "->" expression
    fn bump_case_branch(&mut self, pcx: &ParseContext, branch_col: usize) {
        self.start_node(pcx, SyntaxKind::CaseOfBranch);

        self.bump_pattern(pcx);

        if self.expect_kind(pcx, SyntaxKind::Arrow, "`->`", ErrorContext::CaseBranch)
            && self.bump_expression(pcx, branch_col).is_none()
        {
            self.err_expected(pcx, "an expression", ErrorContext::CaseBranch);
        }

        self.builder.finish_node();
    }
}

/// Patterns
impl ParseState {
    /// pattern → a whole case-branch pattern, wrapped in a `Pattern` node
    fn bump_pattern(&mut self, pcx: &ParseContext) {
        self.start_node(pcx, SyntaxKind::Pattern);

        if self.maybe_bump_pattern_term(pcx).is_none() {
            self.err_expected(pcx, "a pattern", ErrorContext::Pattern);
        }

        self.builder.finish_node();
    }

    /// pattern-term → UpperCaseQid pattern-atom* | pattern-atom
    fn maybe_bump_pattern_term(&mut self, pcx: &ParseContext) -> Option<()> {
        if self.peek_significant_kind(pcx) != Some(SyntaxKind::UpperCaseIdentifier) {
            return self.maybe_bump_pattern_atom(pcx);
        }

        let checkpoint = self.checkpoint(pcx);
        self.maybe_bump_upper_qid(pcx);

        while let Some(kind) = self.peek_significant_kind(pcx) {
            if kind == SyntaxKind::Arrow || self.maybe_bump_pattern_atom(pcx).is_none() {
                break;
            }
        }

        self.wrap_at(checkpoint, SyntaxKind::UnionPattern);
        Some(())
    }

    /// pattern-atom → variable | wildcard | literal | constructor | record |
    /// tuple | unit | parens (with optional `as`)
    fn maybe_bump_pattern_atom(&mut self, pcx: &ParseContext) -> Option<()> {
        let kind = self.peek_significant_kind(pcx)?;

        match kind {
            SyntaxKind::LowerCaseIdentifier => {
                self.start_node(pcx, SyntaxKind::LowerPattern);
                self.bump_kind(pcx, SyntaxKind::LowerCaseIdentifier);
                self.builder.finish_node();
                Some(())
            }
            SyntaxKind::Underscore => {
                self.start_node(pcx, SyntaxKind::AnythingPattern);
                self.bump_kind(pcx, SyntaxKind::Underscore);
                self.builder.finish_node();
                Some(())
            }
            SyntaxKind::Number | SyntaxKind::StringLiteral | SyntaxKind::CharLiteral => {
                self.start_node(pcx, SyntaxKind::Literal);
                self.maybe_bump_trivia(pcx);
                self.bump(pcx);
                self.builder.finish_node();
                Some(())
            }
            SyntaxKind::UpperCaseIdentifier => {
                // bare constructor; arguments need parentheses at atom level
                let checkpoint = self.checkpoint(pcx);
                self.maybe_bump_upper_qid(pcx);
                self.wrap_at(checkpoint, SyntaxKind::UnionPattern);
                Some(())
            }
            SyntaxKind::LBrace => {
                self.start_node(pcx, SyntaxKind::RecordPattern);
                self.bump_kind(pcx, SyntaxKind::LBrace);

                loop {
                    if self
                        .maybe_bump_kind(pcx, SyntaxKind::LowerCaseIdentifier)
                        .is_none()
                    {
                        break;
                    }
                    if self.maybe_bump_kind(pcx, SyntaxKind::Comma).is_none() {
                        break;
                    }
                }

                self.expect_kind(pcx, SyntaxKind::RBrace, "`}`", ErrorContext::Pattern);
                self.builder.finish_node();
                Some(())
            }
            SyntaxKind::LParen => {
                let checkpoint = self.checkpoint(pcx);
                self.bump_kind(pcx, SyntaxKind::LParen);

                // `()`
                if self.maybe_bump_kind(pcx, SyntaxKind::RParen).is_some() {
                    self.wrap_at(checkpoint, SyntaxKind::Unit);
                    return Some(());
                }

                let inner = self.checkpoint(pcx);
                if self.maybe_bump_pattern_term(pcx).is_none() {
                    self.err_expected(pcx, "a pattern", ErrorContext::Pattern);
                }

                // `(p as name)`
                if self.peek_significant_kind(pcx) == Some(SyntaxKind::AsKw) {
                    self.builder
                        .start_node_at(inner, SyntaxKind::PatternAs.into());
                    self.maybe_bump_kind(pcx, SyntaxKind::AsKw);
                    if self
                        .maybe_bump_kind(pcx, SyntaxKind::LowerCaseIdentifier)
                        .is_none()
                    {
                        self.err_expected(pcx, "a name", ErrorContext::Pattern);
                    }
                    self.builder.finish_node();
                }

                if self.peek_significant_kind(pcx) == Some(SyntaxKind::Comma) {
                    while self.maybe_bump_kind(pcx, SyntaxKind::Comma).is_some() {
                        if self.maybe_bump_pattern_term(pcx).is_none() {
                            self.err_expected(pcx, "a pattern", ErrorContext::Pattern);
                            break;
                        }
                    }
                    self.expect_kind(pcx, SyntaxKind::RParen, "`)`", ErrorContext::Pattern);
                    self.wrap_at(checkpoint, SyntaxKind::TuplePattern);
                } else {
                    self.expect_kind(pcx, SyntaxKind::RParen, "`)`", ErrorContext::Pattern);
                }

                Some(())
            }
            _ => None,
        }
    }
}
