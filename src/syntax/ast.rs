//! Abstract syntax tree, typed tree layered on top of CST
//!
//! All AST nodes have the same internal structure, i.e., CST. As a result,
//! AST nodes are just wrappers around CST nodes. Each component is lazily
//! retrieved via accessors traversing the internal CST.
//!
//! [`wrap`] is the single place where a CST kind is mapped to its typed
//! wrapper; it must cover every composite kind of the grammar, and the match
//! is written without a catch-all so the compiler enforces exactly that.

pub use crate::syntax::cst::ParseError;

use itertools::Itertools;

use crate::syntax::cst::{self, SyntaxKind, SyntaxNode, SyntaxToken};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseResult {
    pub file: SourceFile,
    pub errs: Vec<ParseError>,
}

impl ParseResult {
    pub fn into_tuple(self) -> (SourceFile, Vec<ParseError>) {
        (self.file, self.errs)
    }
}

pub fn parse(src: &str) -> ParseResult {
    let (cst, errs) = cst::parse_str(src);
    let file = SourceFile::from_root(cst).unwrap();
    ParseResult { file, errs }
}

/// Semantic node casted from syntax node
pub trait AstNode: Sized {
    /// Method for "syntax pointers"
    fn can_cast(kind: SyntaxKind) -> bool;
    fn cast_node(syn: SyntaxNode) -> Option<Self>;
    fn syntax(&self) -> &SyntaxNode;
}

/// Semantic token casted from syntax token
pub trait AstToken: Sized {
    /// Method for "syntax pointers"
    fn can_cast(kind: SyntaxKind) -> bool;
    fn cast_tk(syn: SyntaxToken) -> Option<Self>;
    fn syntax(&self) -> &SyntaxToken;
}

/// First child node castable to `N`
fn child_node<N: AstNode>(parent: &SyntaxNode) -> Option<N> {
    parent.children().find_map(N::cast_node)
}

/// All child nodes castable to `N`, in order
fn child_nodes<N: AstNode>(parent: &SyntaxNode) -> impl Iterator<Item = N> {
    parent.children().filter_map(N::cast_node)
}

/// First direct child token of the given kind
fn child_token(parent: &SyntaxNode, kind: SyntaxKind) -> Option<SyntaxToken> {
    parent
        .children_with_tokens()
        .filter_map(|elem| elem.into_token())
        .find(|tk| tk.kind() == kind)
}

/// A child the grammar guarantees by construction; its absence means the
/// parser and the wrappers disagree about the node's shape
fn required_node<N: AstNode>(parent: &SyntaxNode, what: &str) -> N {
    self::child_node(parent)
        .unwrap_or_else(|| unreachable!("{:?} without its {}", parent.kind(), what))
}

fn required_token(parent: &SyntaxNode, kind: SyntaxKind) -> SyntaxToken {
    self::child_token(parent, kind)
        .unwrap_or_else(|| unreachable!("{:?} without a {:?} token", parent.kind(), kind))
}

macro_rules! def_node {
    (
        $(
            $( #[$meta:meta] )*
                $ty:ident: $kind:path ;
        )*
    ) => {
        $(
            #[derive(Debug, Clone, PartialEq, Eq, Hash)]
            $( #[$meta] )*
            pub struct $ty {
                pub(crate) syn: SyntaxNode,
            }

            impl AstNode for $ty {
                fn can_cast(kind: SyntaxKind) -> bool {
                    matches!(kind, $kind)
                }

                fn cast_node(syn: SyntaxNode) -> Option<Self> {
                    if Self::can_cast(syn.kind()) {
                        Some(Self { syn })
                    } else {
                        None
                    }
                }

                fn syntax(&self) -> &SyntaxNode {
                    &self.syn
                }
            }
        )*
    };
}

macro_rules! def_tk {
    (
        $(
            $( #[$meta:meta] )*
            $ty:ident: $kind:path $(| $kind2:path)* ;
        )*
    ) => {
        $(
            #[derive(Debug, Clone, PartialEq, Eq, Hash)]
            $( #[$meta] )*
            pub struct $ty {
                pub(crate) syn: SyntaxToken,
            }

            impl AstToken for $ty {
                fn can_cast(kind: SyntaxKind) -> bool {
                    matches!(kind, $kind $(| $kind2)*)
                }

                fn cast_tk(syn: SyntaxToken) -> Option<Self> {
                    if matches!(syn.kind(), $kind $(| $kind2)*) {
                        Some(Self { syn })
                    } else {
                        None
                    }
                }

                fn syntax(&self) -> &SyntaxToken {
                    &self.syn
                }
            }

            impl $ty {
                pub fn text(&self) -> &str {
                    self.syn.text()
                }
            }
        )*
    };
}

// ----------------------------------------
// File
// ----------------------------------------

def_node!(
    /// AST of a file
    SourceFile: SyntaxKind::ROOT;
);

impl SourceFile {
    pub fn from_root(syn: SyntaxNode) -> Option<Self> {
        Self::cast_node(syn)
    }

    pub fn module_declaration(&self) -> Option<ModuleDeclaration> {
        self::child_node(&self.syn)
    }

    pub fn imports(&self) -> impl Iterator<Item = ImportClause> {
        self::child_nodes(&self.syn)
    }

    pub fn value_declarations(&self) -> impl Iterator<Item = ValueDeclaration> {
        self::child_nodes(&self.syn)
    }

    pub fn type_alias_declarations(&self) -> impl Iterator<Item = TypeAliasDeclaration> {
        self::child_nodes(&self.syn)
    }

    pub fn type_declarations(&self) -> impl Iterator<Item = TypeDeclaration> {
        self::child_nodes(&self.syn)
    }

    /// Every top-level node, wrapped
    pub fn declarations(&self) -> impl Iterator<Item = AnyNode> {
        self.syn.children().map(self::wrap)
    }
}

// ----------------------------------------
// Module header and imports
// ----------------------------------------

def_node!(
    /// `module Foo.Bar exposing (..)`
    ModuleDeclaration: SyntaxKind::ModuleDeclaration;

    /// `import Foo.Bar as FB exposing (baz)`
    ImportClause: SyntaxKind::ImportClause;

    /// `as FB`
    AsClause: SyntaxKind::AsClause;

    /// The parenthesized list after `exposing`
    ExposingList: SyntaxKind::ExposingList;

    ExposedValue: SyntaxKind::ExposedValue;

    ExposedType: SyntaxKind::ExposedType;

    /// `(..)` after an exposed type name
    ExposedUnionConstructors: SyntaxKind::ExposedUnionConstructors;
);

impl ModuleDeclaration {
    pub fn qid(&self) -> Option<UpperCaseQid> {
        self::child_node(&self.syn)
    }

    pub fn exposing_list(&self) -> Option<ExposingList> {
        self::child_node(&self.syn)
    }
}

impl ImportClause {
    pub fn module_qid(&self) -> Option<UpperCaseQid> {
        self::child_node(&self.syn)
    }

    /// `as` clause, absent on plain imports
    pub fn as_clause(&self) -> Option<AsClause> {
        self::child_node(&self.syn)
    }

    pub fn exposing_list(&self) -> Option<ExposingList> {
        self::child_node(&self.syn)
    }
}

impl AsClause {
    pub fn alias(&self) -> Option<SyntaxToken> {
        self::child_token(&self.syn, SyntaxKind::UpperCaseIdentifier)
    }
}

impl ExposingList {
    /// Does the list expose everything (`(..)`)?
    pub fn exposes_all(&self) -> bool {
        self::child_token(&self.syn, SyntaxKind::DotDot).is_some()
    }

    pub fn exposed_values(&self) -> impl Iterator<Item = ExposedValue> {
        self::child_nodes(&self.syn)
    }

    pub fn exposed_types(&self) -> impl Iterator<Item = ExposedType> {
        self::child_nodes(&self.syn)
    }
}

impl ExposedValue {
    pub fn name_token(&self) -> SyntaxToken {
        self::required_token(&self.syn, SyntaxKind::LowerCaseIdentifier)
    }
}

impl ExposedType {
    pub fn name_token(&self) -> SyntaxToken {
        self::required_token(&self.syn, SyntaxKind::UpperCaseIdentifier)
    }

    pub fn exposed_constructors(&self) -> Option<ExposedUnionConstructors> {
        self::child_node(&self.syn)
    }
}

// ----------------------------------------
// Names
// ----------------------------------------

def_node!(
    /// Dotted path of upper-case identifiers, e.g. `Json.Decode`
    UpperCaseQid: SyntaxKind::UpperCaseQid;

    /// Possibly-qualified value reference, e.g. `List.map` or `foo`
    ValueQid: SyntaxKind::ValueQid;
);

impl UpperCaseQid {
    pub fn segments(&self) -> impl Iterator<Item = SyntaxToken> {
        self.syn
            .children_with_tokens()
            .filter_map(|elem| elem.into_token())
            .filter(|tk| tk.kind() == SyntaxKind::UpperCaseIdentifier)
    }

    pub fn text(&self) -> String {
        self.segments().map(|tk| tk.text().to_string()).join(".")
    }
}

impl ValueQid {
    /// Qualifying module segments, empty for unqualified references
    pub fn qualifiers(&self) -> impl Iterator<Item = SyntaxToken> {
        let name = self.name_token();
        self.syn
            .children_with_tokens()
            .filter_map(|elem| elem.into_token())
            .filter(|tk| tk.kind() == SyntaxKind::UpperCaseIdentifier)
            .take_while(move |tk| *tk != name)
    }

    /// The referenced name, the last identifier of the path
    pub fn name_token(&self) -> SyntaxToken {
        self.syn
            .children_with_tokens()
            .filter_map(|elem| elem.into_token())
            .filter(|tk| {
                matches!(
                    tk.kind(),
                    SyntaxKind::LowerCaseIdentifier | SyntaxKind::UpperCaseIdentifier
                )
            })
            .last()
            .unwrap_or_else(|| unreachable!("value reference without an identifier"))
    }

    pub fn text(&self) -> String {
        self.syn
            .children_with_tokens()
            .filter_map(|elem| elem.into_token())
            .filter(|tk| !tk.kind().is_trivia())
            .map(|tk| tk.text().to_string())
            .join("")
    }
}

// ----------------------------------------
// Declarations
// ----------------------------------------

def_node!(
    /// `f x = expression`
    ValueDeclaration: SyntaxKind::ValueDeclaration;

    /// Name and parameter patterns on the left of `=`
    FunctionDeclarationLeft: SyntaxKind::FunctionDeclarationLeft;

    /// `f : Type`
    TypeAnnotation: SyntaxKind::TypeAnnotation;

    /// `port f : Type`
    PortAnnotation: SyntaxKind::PortAnnotation;

    /// `type alias Foo = Type`
    TypeAliasDeclaration: SyntaxKind::TypeAliasDeclaration;

    /// `type Foo = A | B`
    TypeDeclaration: SyntaxKind::TypeDeclaration;

    /// One constructor of a union type, with its parameter types
    UnionVariant: SyntaxKind::UnionVariant;

    /// Declared type parameter name
    LowerTypeName: SyntaxKind::LowerTypeName;
);

impl ValueDeclaration {
    pub fn function_decl_left(&self) -> FunctionDeclarationLeft {
        self::required_node(&self.syn, "declaration left-hand side")
    }

    /// The bound expression on the right of `=`
    pub fn expression(&self) -> Option<Expression> {
        self::child_node(&self.syn)
    }
}

impl FunctionDeclarationLeft {
    pub fn name_token(&self) -> SyntaxToken {
        self::required_token(&self.syn, SyntaxKind::LowerCaseIdentifier)
    }

    pub fn patterns(&self) -> impl Iterator<Item = AnyNode> {
        self.syn.children().map(self::wrap)
    }
}

impl TypeAnnotation {
    pub fn name_token(&self) -> SyntaxToken {
        self::required_token(&self.syn, SyntaxKind::LowerCaseIdentifier)
    }

    pub fn type_ref(&self) -> Option<TypeRef> {
        self::child_node(&self.syn)
    }
}

impl PortAnnotation {
    pub fn name_token(&self) -> Option<SyntaxToken> {
        self::child_token(&self.syn, SyntaxKind::LowerCaseIdentifier)
    }

    pub fn type_ref(&self) -> Option<TypeRef> {
        self::child_node(&self.syn)
    }
}

impl TypeAliasDeclaration {
    /// The declared alias name
    pub fn name_token(&self) -> Option<SyntaxToken> {
        self::child_token(&self.syn, SyntaxKind::UpperCaseIdentifier)
    }

    pub fn type_variables(&self) -> impl Iterator<Item = LowerTypeName> {
        self::child_nodes(&self.syn)
    }

    pub fn aliased_type(&self) -> Option<TypeRef> {
        self::child_node(&self.syn)
    }
}

impl TypeDeclaration {
    pub fn name_token(&self) -> Option<SyntaxToken> {
        self::child_token(&self.syn, SyntaxKind::UpperCaseIdentifier)
    }

    pub fn type_variables(&self) -> impl Iterator<Item = LowerTypeName> {
        self::child_nodes(&self.syn)
    }

    pub fn variants(&self) -> impl Iterator<Item = UnionVariant> {
        self::child_nodes(&self.syn)
    }
}

impl UnionVariant {
    pub fn name_token(&self) -> SyntaxToken {
        self::required_token(&self.syn, SyntaxKind::UpperCaseIdentifier)
    }

    pub fn parameter_types(&self) -> impl Iterator<Item = AnyNode> {
        self.syn.children().map(self::wrap)
    }
}

impl LowerTypeName {
    pub fn name_token(&self) -> SyntaxToken {
        self::required_token(&self.syn, SyntaxKind::LowerCaseIdentifier)
    }
}

// ----------------------------------------
// Types
// ----------------------------------------

def_node!(
    /// A type expression: one or more segments separated by `->`
    TypeRef: SyntaxKind::TypeRef;

    /// Applied type constructor, e.g. `Maybe a`
    ParametricTypeRef: SyntaxKind::ParametricTypeRef;

    /// Bare, possibly-qualified type constructor
    UpperPathTypeRef: SyntaxKind::UpperPathTypeRef;

    /// Type variable reference
    TypeVariableRef: SyntaxKind::TypeVariableRef;

    /// `{ x : Int }`, optionally extending a base record variable
    RecordType: SyntaxKind::RecordType;

    /// One `name : Type` field of a record type
    FieldType: SyntaxKind::FieldType;

    /// `( A, B )`
    TupleType: SyntaxKind::TupleType;
);

impl TypeRef {
    /// Arrow-separated segments; a single segment for non-function types
    pub fn segments(&self) -> impl Iterator<Item = AnyNode> {
        self.syn.children().map(self::wrap)
    }

    pub fn is_function(&self) -> bool {
        self::child_token(&self.syn, SyntaxKind::Arrow).is_some()
    }
}

impl ParametricTypeRef {
    pub fn qid(&self) -> UpperCaseQid {
        self::required_node(&self.syn, "type constructor name")
    }

    pub fn parameters(&self) -> impl Iterator<Item = AnyNode> {
        self.syn
            .children()
            .filter(|node| node.kind() != SyntaxKind::UpperCaseQid)
            .map(self::wrap)
    }
}

impl UpperPathTypeRef {
    pub fn qid(&self) -> UpperCaseQid {
        self::required_node(&self.syn, "type constructor name")
    }
}

impl TypeVariableRef {
    pub fn name_token(&self) -> SyntaxToken {
        self::required_token(&self.syn, SyntaxKind::LowerCaseIdentifier)
    }
}

impl RecordType {
    /// The base record variable of `{ r | … }`
    pub fn base_name(&self) -> Option<SyntaxToken> {
        self::child_token(&self.syn, SyntaxKind::LowerCaseIdentifier)
    }

    pub fn field_types(&self) -> impl Iterator<Item = FieldType> {
        self::child_nodes(&self.syn)
    }
}

impl FieldType {
    pub fn name_token(&self) -> SyntaxToken {
        self::required_token(&self.syn, SyntaxKind::LowerCaseIdentifier)
    }

    pub fn type_ref(&self) -> Option<TypeRef> {
        self::child_node(&self.syn)
    }
}

impl TupleType {
    pub fn member_types(&self) -> impl Iterator<Item = TypeRef> {
        self::child_nodes(&self.syn)
    }
}

// ----------------------------------------
// Expressions
// ----------------------------------------

def_node!(
    /// Operand/operator chain; flat, no precedence shaping
    Expression: SyntaxKind::Expression;

    /// Callee juxtaposed with arguments
    FunctionCall: SyntaxKind::FunctionCall;

    /// `(+)`
    OperatorAsFunction: SyntaxKind::OperatorAsFunction;

    /// Value reference expression
    ValueExpr: SyntaxKind::ValueExpr;

    /// `\x -> expression`
    AnonymousFunction: SyntaxKind::AnonymousFunction;

    /// `case expression of branches…`
    CaseOf: SyntaxKind::CaseOf;

    /// One `pattern -> expression` branch
    CaseOfBranch: SyntaxKind::CaseOfBranch;

    /// `if c then a else b`
    IfElse: SyntaxKind::IfElse;

    /// `let declarations in body`
    LetIn: SyntaxKind::LetIn;

    /// `[ a, b ]`
    ListExpr: SyntaxKind::ListExpr;

    /// `()` in expression, pattern or type position
    Unit: SyntaxKind::Unit;

    /// `( a, b )`
    Tuple: SyntaxKind::Tuple;

    /// `{ field = e }` or `{ base | field = e }`
    Record: SyntaxKind::Record;

    /// One `name = expression` field of a record
    Field: SyntaxKind::Field;

    /// `( expression )`
    ParenthesizedExpression: SyntaxKind::ParenthesizedExpression;
);

impl Expression {
    pub fn operands(&self) -> impl Iterator<Item = AnyNode> {
        self.syn.children().map(self::wrap)
    }

    pub fn operators(&self) -> impl Iterator<Item = SyntaxToken> {
        self.syn
            .children_with_tokens()
            .filter_map(|elem| elem.into_token())
            .filter(|tk| tk.kind() == SyntaxKind::Operator)
    }
}

impl FunctionCall {
    pub fn callee(&self) -> Option<AnyNode> {
        self.syn.children().next().map(self::wrap)
    }

    pub fn arguments(&self) -> impl Iterator<Item = AnyNode> {
        self.syn.children().skip(1).map(self::wrap)
    }
}

impl OperatorAsFunction {
    pub fn operator_token(&self) -> SyntaxToken {
        self::required_token(&self.syn, SyntaxKind::Operator)
    }
}

impl ValueExpr {
    pub fn qid(&self) -> ValueQid {
        self::required_node(&self.syn, "value reference")
    }
}

impl AnonymousFunction {
    pub fn patterns(&self) -> impl Iterator<Item = AnyNode> {
        self.syn
            .children()
            .filter(|node| node.kind() != SyntaxKind::Expression)
            .map(self::wrap)
    }

    pub fn body(&self) -> Option<Expression> {
        self::child_node(&self.syn)
    }
}

impl CaseOf {
    pub fn scrutinee(&self) -> Option<Expression> {
        self::child_node(&self.syn)
    }

    pub fn branches(&self) -> impl Iterator<Item = CaseOfBranch> {
        self::child_nodes(&self.syn)
    }
}

impl CaseOfBranch {
    pub fn pattern(&self) -> Pattern {
        self::required_node(&self.syn, "branch pattern")
    }

    pub fn expression(&self) -> Option<Expression> {
        self::child_node(&self.syn)
    }
}

impl IfElse {
    pub fn condition(&self) -> Option<Expression> {
        self::child_nodes(&self.syn).next()
    }

    pub fn then_branch(&self) -> Option<Expression> {
        self::child_nodes(&self.syn).nth(1)
    }

    /// Absent when error recovery dropped the `else` branch
    pub fn else_branch(&self) -> Option<Expression> {
        self::child_nodes(&self.syn).nth(2)
    }
}

impl LetIn {
    pub fn value_declarations(&self) -> impl Iterator<Item = ValueDeclaration> {
        self::child_nodes(&self.syn)
    }

    pub fn type_annotations(&self) -> impl Iterator<Item = TypeAnnotation> {
        self::child_nodes(&self.syn)
    }

    /// The expression after `in`; the only direct `Expression` child
    pub fn body(&self) -> Option<Expression> {
        self::child_node(&self.syn)
    }
}

impl ListExpr {
    pub fn items(&self) -> impl Iterator<Item = Expression> {
        self::child_nodes(&self.syn)
    }
}

impl Tuple {
    pub fn items(&self) -> impl Iterator<Item = Expression> {
        self::child_nodes(&self.syn)
    }
}

impl Record {
    /// The base record of an update expression, `{ model | … }`
    pub fn base_name(&self) -> Option<SyntaxToken> {
        self::child_token(&self.syn, SyntaxKind::LowerCaseIdentifier)
    }

    pub fn fields(&self) -> impl Iterator<Item = Field> {
        self::child_nodes(&self.syn)
    }
}

impl Field {
    pub fn name_token(&self) -> SyntaxToken {
        self::required_token(&self.syn, SyntaxKind::LowerCaseIdentifier)
    }

    pub fn expression(&self) -> Option<Expression> {
        self::child_node(&self.syn)
    }
}

impl ParenthesizedExpression {
    pub fn expression(&self) -> Option<Expression> {
        self::child_node(&self.syn)
    }
}

// ----------------------------------------
// Literals
// ----------------------------------------

def_node!(
    /// Literal node wrapping a single literal token
    Literal: SyntaxKind::Literal;
);

impl Literal {
    pub fn token(&self) -> SyntaxToken {
        self.syn
            .children_with_tokens()
            .filter_map(|elem| elem.into_token())
            .find(|tk| !tk.kind().is_trivia())
            .unwrap_or_else(|| unreachable!("literal without a token"))
    }

    pub fn kind(&self) -> LiteralKind {
        let token = self.token();
        None.or_else(|| Num::cast_tk(token.clone()).map(LiteralKind::Num))
            .or_else(|| Str::cast_tk(token.clone()).map(LiteralKind::Str))
            .or_else(|| Char::cast_tk(token.clone()).map(LiteralKind::Char))
            .unwrap_or_else(|| unreachable!("literal with a non-literal token: {:?}", token))
    }
}

/// View to the [`Literal`] node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiteralKind {
    Num(Num),
    Str(Str),
    Char(Char),
}

def_tk! {
    /// Untyped, not validated number token (integers and floats)
    Num: SyntaxKind::Number;

    /// String token, including the surroundings
    Str: SyntaxKind::StringLiteral;

    /// Character token, including the surroundings
    Char: SyntaxKind::CharLiteral;

    /// Lower-case identifier token
    Ident: SyntaxKind::LowerCaseIdentifier;

    /// Upper-case identifier token
    UpperIdent: SyntaxKind::UpperCaseIdentifier;
}

// ----------------------------------------
// Patterns
// ----------------------------------------

def_node!(
    /// A whole case-branch pattern
    Pattern: SyntaxKind::Pattern;

    /// Variable-binding pattern
    LowerPattern: SyntaxKind::LowerPattern;

    /// `_`
    AnythingPattern: SyntaxKind::AnythingPattern;

    /// Constructor pattern, possibly with argument patterns
    UnionPattern: SyntaxKind::UnionPattern;

    /// `( p, q )`
    TuplePattern: SyntaxKind::TuplePattern;

    /// `{ a, b }`
    RecordPattern: SyntaxKind::RecordPattern;

    /// `p as name`
    PatternAs: SyntaxKind::PatternAs;
);

impl Pattern {
    /// The concrete pattern below this node
    pub fn child(&self) -> AnyNode {
        self.syn
            .children()
            .next()
            .map(self::wrap)
            .unwrap_or_else(|| unreachable!("pattern without a child"))
    }
}

impl LowerPattern {
    pub fn name_token(&self) -> SyntaxToken {
        self::required_token(&self.syn, SyntaxKind::LowerCaseIdentifier)
    }
}

impl UnionPattern {
    pub fn qid(&self) -> UpperCaseQid {
        self::required_node(&self.syn, "constructor name")
    }

    pub fn arguments(&self) -> impl Iterator<Item = AnyNode> {
        self.syn
            .children()
            .filter(|node| node.kind() != SyntaxKind::UpperCaseQid)
            .map(self::wrap)
    }
}

impl TuplePattern {
    pub fn patterns(&self) -> impl Iterator<Item = AnyNode> {
        self.syn.children().map(self::wrap)
    }
}

impl RecordPattern {
    pub fn field_names(&self) -> impl Iterator<Item = SyntaxToken> {
        self.syn
            .children_with_tokens()
            .filter_map(|elem| elem.into_token())
            .filter(|tk| tk.kind() == SyntaxKind::LowerCaseIdentifier)
    }
}

impl PatternAs {
    pub fn pattern(&self) -> Option<AnyNode> {
        self.syn.children().next().map(self::wrap)
    }

    pub fn name_token(&self) -> Option<SyntaxToken> {
        self::child_token(&self.syn, SyntaxKind::LowerCaseIdentifier)
    }
}

// ----------------------------------------
// The constructor table
// ----------------------------------------

macro_rules! def_any_node {
    ( $( $ty:ident, )* ) => {
        /// Typed view over any composite node, one variant per construct
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum AnyNode {
            $( $ty($ty), )*
        }

        impl AstNode for AnyNode {
            fn can_cast(kind: SyntaxKind) -> bool {
                kind.is_composite()
            }

            fn cast_node(syn: SyntaxNode) -> Option<Self> {
                if syn.kind().is_composite() {
                    Some(self::wrap(syn))
                } else {
                    None
                }
            }

            fn syntax(&self) -> &SyntaxNode {
                match self {
                    $( AnyNode::$ty(node) => node.syntax(), )*
                }
            }
        }

        impl AnyNode {
            pub fn kind(&self) -> SyntaxKind {
                AstNode::syntax(self).kind()
            }
        }

        $(
            impl From<$ty> for AnyNode {
                fn from(node: $ty) -> Self {
                    Self::$ty(node)
                }
            }
        )*
    };
}

def_any_node!(
    SourceFile,
    ModuleDeclaration,
    ImportClause,
    AsClause,
    ExposingList,
    ExposedValue,
    ExposedType,
    ExposedUnionConstructors,
    UpperCaseQid,
    ValueQid,
    ValueDeclaration,
    FunctionDeclarationLeft,
    TypeAnnotation,
    PortAnnotation,
    TypeAliasDeclaration,
    TypeDeclaration,
    UnionVariant,
    LowerTypeName,
    TypeRef,
    ParametricTypeRef,
    UpperPathTypeRef,
    TypeVariableRef,
    RecordType,
    FieldType,
    TupleType,
    Expression,
    FunctionCall,
    OperatorAsFunction,
    ValueExpr,
    Literal,
    AnonymousFunction,
    CaseOf,
    CaseOfBranch,
    IfElse,
    LetIn,
    ListExpr,
    Unit,
    Tuple,
    Record,
    Field,
    ParenthesizedExpression,
    Pattern,
    LowerPattern,
    AnythingPattern,
    UnionPattern,
    TuplePattern,
    RecordPattern,
    PatternAs,
);

/// Maps a CST node to its typed wrapper
///
/// Must be kept in sync with the grammar: there is one arm per composite
/// kind and no catch-all, so adding a kind without a wrapper refuses to
/// compile. A node tagged with a leaf kind cannot come out of the parser;
/// meeting one means the tree and the wrappers have drifted apart, which is
/// not recoverable.
pub fn wrap(syn: SyntaxNode) -> AnyNode {
    match syn.kind() {
        SyntaxKind::ModuleDeclaration => AnyNode::ModuleDeclaration(ModuleDeclaration { syn }),
        SyntaxKind::ImportClause => AnyNode::ImportClause(ImportClause { syn }),
        SyntaxKind::AsClause => AnyNode::AsClause(AsClause { syn }),
        SyntaxKind::ExposingList => AnyNode::ExposingList(ExposingList { syn }),
        SyntaxKind::ExposedValue => AnyNode::ExposedValue(ExposedValue { syn }),
        SyntaxKind::ExposedType => AnyNode::ExposedType(ExposedType { syn }),
        SyntaxKind::ExposedUnionConstructors => {
            AnyNode::ExposedUnionConstructors(ExposedUnionConstructors { syn })
        }
        SyntaxKind::UpperCaseQid => AnyNode::UpperCaseQid(UpperCaseQid { syn }),
        SyntaxKind::ValueQid => AnyNode::ValueQid(ValueQid { syn }),
        SyntaxKind::ValueDeclaration => AnyNode::ValueDeclaration(ValueDeclaration { syn }),
        SyntaxKind::FunctionDeclarationLeft => {
            AnyNode::FunctionDeclarationLeft(FunctionDeclarationLeft { syn })
        }
        SyntaxKind::TypeAnnotation => AnyNode::TypeAnnotation(TypeAnnotation { syn }),
        SyntaxKind::PortAnnotation => AnyNode::PortAnnotation(PortAnnotation { syn }),
        SyntaxKind::TypeAliasDeclaration => {
            AnyNode::TypeAliasDeclaration(TypeAliasDeclaration { syn })
        }
        SyntaxKind::TypeDeclaration => AnyNode::TypeDeclaration(TypeDeclaration { syn }),
        SyntaxKind::UnionVariant => AnyNode::UnionVariant(UnionVariant { syn }),
        SyntaxKind::LowerTypeName => AnyNode::LowerTypeName(LowerTypeName { syn }),
        SyntaxKind::TypeRef => AnyNode::TypeRef(TypeRef { syn }),
        SyntaxKind::ParametricTypeRef => AnyNode::ParametricTypeRef(ParametricTypeRef { syn }),
        SyntaxKind::UpperPathTypeRef => AnyNode::UpperPathTypeRef(UpperPathTypeRef { syn }),
        SyntaxKind::TypeVariableRef => AnyNode::TypeVariableRef(TypeVariableRef { syn }),
        SyntaxKind::RecordType => AnyNode::RecordType(RecordType { syn }),
        SyntaxKind::FieldType => AnyNode::FieldType(FieldType { syn }),
        SyntaxKind::TupleType => AnyNode::TupleType(TupleType { syn }),
        SyntaxKind::Expression => AnyNode::Expression(Expression { syn }),
        SyntaxKind::FunctionCall => AnyNode::FunctionCall(FunctionCall { syn }),
        SyntaxKind::OperatorAsFunction => AnyNode::OperatorAsFunction(OperatorAsFunction { syn }),
        SyntaxKind::ValueExpr => AnyNode::ValueExpr(ValueExpr { syn }),
        SyntaxKind::Literal => AnyNode::Literal(Literal { syn }),
        SyntaxKind::AnonymousFunction => AnyNode::AnonymousFunction(AnonymousFunction { syn }),
        SyntaxKind::CaseOf => AnyNode::CaseOf(CaseOf { syn }),
        SyntaxKind::CaseOfBranch => AnyNode::CaseOfBranch(CaseOfBranch { syn }),
        SyntaxKind::IfElse => AnyNode::IfElse(IfElse { syn }),
        SyntaxKind::LetIn => AnyNode::LetIn(LetIn { syn }),
        SyntaxKind::ListExpr => AnyNode::ListExpr(ListExpr { syn }),
        SyntaxKind::Unit => AnyNode::Unit(Unit { syn }),
        SyntaxKind::Tuple => AnyNode::Tuple(Tuple { syn }),
        SyntaxKind::Record => AnyNode::Record(Record { syn }),
        SyntaxKind::Field => AnyNode::Field(Field { syn }),
        SyntaxKind::ParenthesizedExpression => {
            AnyNode::ParenthesizedExpression(ParenthesizedExpression { syn })
        }
        SyntaxKind::Pattern => AnyNode::Pattern(Pattern { syn }),
        SyntaxKind::LowerPattern => AnyNode::LowerPattern(LowerPattern { syn }),
        SyntaxKind::AnythingPattern => AnyNode::AnythingPattern(AnythingPattern { syn }),
        SyntaxKind::UnionPattern => AnyNode::UnionPattern(UnionPattern { syn }),
        SyntaxKind::TuplePattern => AnyNode::TuplePattern(TuplePattern { syn }),
        SyntaxKind::RecordPattern => AnyNode::RecordPattern(RecordPattern { syn }),
        SyntaxKind::PatternAs => AnyNode::PatternAs(PatternAs { syn }),
        SyntaxKind::ROOT => AnyNode::SourceFile(SourceFile { syn }),

        kind @ (SyntaxKind::Ws
        | SyntaxKind::Comment
        | SyntaxKind::LowerCaseIdentifier
        | SyntaxKind::UpperCaseIdentifier
        | SyntaxKind::Number
        | SyntaxKind::StringLiteral
        | SyntaxKind::CharLiteral
        | SyntaxKind::Operator
        | SyntaxKind::Eq
        | SyntaxKind::Arrow
        | SyntaxKind::Colon
        | SyntaxKind::Comma
        | SyntaxKind::Pipe
        | SyntaxKind::Dot
        | SyntaxKind::DotDot
        | SyntaxKind::Backslash
        | SyntaxKind::Underscore
        | SyntaxKind::LParen
        | SyntaxKind::RParen
        | SyntaxKind::LBrace
        | SyntaxKind::RBrace
        | SyntaxKind::LBracket
        | SyntaxKind::RBracket
        | SyntaxKind::ModuleKw
        | SyntaxKind::ImportKw
        | SyntaxKind::ExposingKw
        | SyntaxKind::AsKw
        | SyntaxKind::TypeKw
        | SyntaxKind::AliasKw
        | SyntaxKind::PortKw
        | SyntaxKind::IfKw
        | SyntaxKind::ThenKw
        | SyntaxKind::ElseKw
        | SyntaxKind::LetKw
        | SyntaxKind::InKw
        | SyntaxKind::CaseKw
        | SyntaxKind::OfKw
        | SyntaxKind::Error) => {
            panic!("CST node tagged with leaf kind {kind:?}: tree and wrappers out of sync")
        }
    }
}
