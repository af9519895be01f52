//! Fragment factory: synthesizes typed nodes from text templates
//!
//! Tooling needs small syntax fragments on demand: a fresh identifier for a
//! rename, a qualified reference for an import fix. Rather than maintaining a
//! second node-construction API, the factory wraps the payload in a minimal
//! always-valid program skeleton, parses it with the real parser and extracts
//! the matching sub-tree. Whatever comes out is well-formed under the same
//! grammar as real files.
//!
//! Every call parses a fresh, disposable tree that is never linked anywhere;
//! there is no caching. This is an authoring-time path, not a hot path.

use thiserror::Error;

use crate::syntax::{
    ast::{self, AstNode, AstToken},
    cst::{self, SyntaxKind, SyntaxNode},
};

/// Failure to synthesize a fragment from the given payload
///
/// Recoverable and caller-facing: the payload usually cannot be embedded
/// safely (reserved word, unescaped syntax, wrong shape for the kind).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SynthesisError {
    #[error("no `{kind:?}` fragment can be synthesized from `{payload}`")]
    FragmentNotFound { kind: SyntaxKind, payload: String },
    #[error("synthesized a `{kind:?}` from `{payload}` but its text is `{found}`")]
    PayloadMismatch {
        kind: SyntaxKind,
        payload: String,
        found: String,
    },
    #[error("`{kind:?}` fragments cannot be synthesized from text")]
    UnsupportedKind { kind: SyntaxKind },
}

/// Synthesizes a node of the requested composite kind from literal text
///
/// The payload is substituted into a minimal wrapper program for the kind,
/// the wrapper is parsed, and the first matching descendant is wrapped and
/// returned.
pub fn synthesize_node(kind: SyntaxKind, payload: &str) -> Result<ast::AnyNode, SynthesisError> {
    log::trace!("synthesize {kind:?} from `{payload}`");

    let wrapped = match self::template(kind, payload) {
        Some(wrapped) => wrapped,
        None => return Err(SynthesisError::UnsupportedKind { kind }),
    };

    let tree = self::parse_fragment(&wrapped);
    tree.descendants()
        .find(|node| node.kind() == kind)
        .map(ast::wrap)
        .ok_or_else(|| SynthesisError::FragmentNotFound {
            kind,
            payload: payload.to_string(),
        })
}

/// Creates a lower-case identifier token, e.g. a fresh name for a rename
pub fn lower_case_identifier(text: &str) -> Result<ast::Ident, SynthesisError> {
    let tree = self::parse_fragment(&format!("{text} = 42"));

    let token = tree
        .descendants_with_tokens()
        .filter_map(|elem| elem.into_token())
        .find_map(ast::Ident::cast_tk)
        .ok_or_else(|| self::not_found(SyntaxKind::LowerCaseIdentifier, text))?;

    self::check_payload(SyntaxKind::LowerCaseIdentifier, text, token.text())?;
    Ok(token)
}

/// Creates an upper-case identifier token
pub fn upper_case_identifier(text: &str) -> Result<ast::UpperIdent, SynthesisError> {
    let file = ast::parse(&format!("type alias {text} = Int")).file;

    let token = file
        .type_alias_declarations()
        .next()
        .and_then(|decl| decl.name_token())
        .ok_or_else(|| self::not_found(SyntaxKind::UpperCaseIdentifier, text))?;

    self::check_payload(SyntaxKind::UpperCaseIdentifier, text, token.text())?;
    Ok(ast::UpperIdent::cast_tk(token)
        .unwrap_or_else(|| unreachable!("alias name is always an upper-case identifier")))
}

/// Creates a dotted module path, e.g. `Json.Decode`
pub fn upper_case_qid(text: &str) -> Result<ast::UpperCaseQid, SynthesisError> {
    let file = ast::parse(&format!("module {text} exposing (..)")).file;

    let qid = file
        .module_declaration()
        .and_then(|decl| decl.qid())
        .ok_or_else(|| self::not_found(SyntaxKind::UpperCaseQid, text))?;

    self::check_payload(SyntaxKind::UpperCaseQid, text, &qid.text())?;
    Ok(qid)
}

/// Creates a possibly-qualified value reference, e.g. `List.map`
pub fn value_qid(text: &str) -> Result<ast::ValueQid, SynthesisError> {
    let file = ast::parse(&format!("f = {text}")).file;

    let qid = file
        .value_declarations()
        .next()
        .and_then(|decl| decl.expression())
        .and_then(|expr| {
            expr.syntax()
                .descendants()
                .find_map(ast::ValueQid::cast_node)
        })
        .ok_or_else(|| self::not_found(SyntaxKind::ValueQid, text))?;

    self::check_payload(SyntaxKind::ValueQid, text, &qid.text())?;
    Ok(qid)
}

fn parse_fragment(src: &str) -> SyntaxNode {
    let (tree, errs) = cst::parse_str(src);
    if !errs.is_empty() {
        log::trace!("fragment `{src}` parsed with {} error(s)", errs.len());
    }
    tree
}

fn not_found(kind: SyntaxKind, payload: &str) -> SynthesisError {
    SynthesisError::FragmentNotFound {
        kind,
        payload: payload.to_string(),
    }
}

/// The extracted fragment must spell exactly the payload; a partially
/// consumed payload must never leak a truncated node.
fn check_payload(kind: SyntaxKind, payload: &str, found: &str) -> Result<(), SynthesisError> {
    if found == payload {
        Ok(())
    } else {
        Err(SynthesisError::PayloadMismatch {
            kind,
            payload: payload.to_string(),
            found: found.to_string(),
        })
    }
}

/// Minimal wrapper program for a composite kind, with the payload substituted
///
/// `None` for kinds that cannot be conjured from a payload (leaf kinds, the
/// file root).
fn template(kind: SyntaxKind, payload: &str) -> Option<String> {
    let wrapped = match kind {
        // the payload is the whole declaration
        SyntaxKind::ModuleDeclaration
        | SyntaxKind::ImportClause
        | SyntaxKind::ValueDeclaration
        | SyntaxKind::TypeAliasDeclaration
        | SyntaxKind::TypeDeclaration
        | SyntaxKind::TypeAnnotation
        | SyntaxKind::PortAnnotation => payload.to_string(),

        SyntaxKind::FunctionDeclarationLeft => format!("{payload} = 0"),

        // module header parts
        SyntaxKind::UpperCaseQid => format!("module {payload} exposing (..)"),
        SyntaxKind::AsClause => format!("import Foo {payload}"),
        SyntaxKind::ExposingList => format!("import Foo exposing {payload}"),
        SyntaxKind::ExposedValue | SyntaxKind::ExposedType => {
            format!("import Foo exposing ({payload})")
        }
        SyntaxKind::ExposedUnionConstructors => format!("import Foo exposing (T{payload})"),

        // type positions
        SyntaxKind::TypeRef
        | SyntaxKind::ParametricTypeRef
        | SyntaxKind::UpperPathTypeRef
        | SyntaxKind::TypeVariableRef
        | SyntaxKind::RecordType
        | SyntaxKind::TupleType => format!("f : {payload}"),
        SyntaxKind::FieldType => format!("f : {{ {payload} }}"),
        SyntaxKind::UnionVariant => format!("type T = {payload}"),
        SyntaxKind::LowerTypeName => format!("type T {payload} = T"),

        // expression positions
        SyntaxKind::Expression
        | SyntaxKind::FunctionCall
        | SyntaxKind::OperatorAsFunction
        | SyntaxKind::ValueExpr
        | SyntaxKind::ValueQid
        | SyntaxKind::Literal
        | SyntaxKind::AnonymousFunction
        | SyntaxKind::CaseOf
        | SyntaxKind::IfElse
        | SyntaxKind::LetIn
        | SyntaxKind::ListExpr
        | SyntaxKind::Unit
        | SyntaxKind::Tuple
        | SyntaxKind::Record
        | SyntaxKind::ParenthesizedExpression => format!("f = {payload}"),
        SyntaxKind::Field => format!("f = {{ {payload} }}"),
        SyntaxKind::CaseOfBranch => format!("f x = case x of {payload}"),

        // pattern positions
        SyntaxKind::Pattern
        | SyntaxKind::LowerPattern
        | SyntaxKind::AnythingPattern
        | SyntaxKind::UnionPattern
        | SyntaxKind::TuplePattern
        | SyntaxKind::RecordPattern => format!("f x = case x of {payload} -> 0"),
        SyntaxKind::PatternAs => format!("f x = case x of ({payload}) -> 0"),

        _ => return None,
    };

    Some(wrapped)
}
