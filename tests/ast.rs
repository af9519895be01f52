/*!
Typed AST tests: wrapping totality, accessors, end-to-end reads
*/

use std::collections::HashSet;

use rowan::Language;

use elm_syntax::syntax::{
    ast::{self, AnyNode, AstNode},
    cst::{self, ElmLanguage, SyntaxKind},
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Sources that, together, exercise every composite kind of the grammar
const KIND_SOURCES: &[&str] = &[
    "module Main exposing (Msg(..), main)",
    "import Html.Attributes as Attr exposing (class)",
    "port send : String -> Cmd msg",
    "type alias Pair a = ( a, Maybe Int )",
    "type Msg = Inc | Set Int",
    "width : { base | w : Int } -> ()",
    "f x = if x > 0 then 1 else 0",
    "g ( a, b ) = ( a, b, () )",
    "h = [ (+), (neg 1) ]",
    "i = \\{ a } ( x as y ) -> a",
    "j v = case v of\n    Just n ->\n        n\n\n    _ ->\n        0",
    "k = let\n        z = 'c'\n    in\n    z",
    "m = { w | n = 1 }",
];

#[test]
fn wrap_covers_every_composite_kind() {
    init_logger();

    let mut seen = HashSet::new();

    for src in KIND_SOURCES {
        let (cst, _errs) = cst::parse_str(src);

        for node in cst.descendants() {
            let any = ast::wrap(node.clone());
            assert_eq!(any.kind(), node.kind());
            assert_eq!(AstNode::syntax(&any), &node);
            seen.insert(node.kind());
        }
    }

    // every composite kind must have come out of some source above; a hole
    // here means the grammar grew a construct the sources don't cover
    for raw in 0..=(SyntaxKind::ROOT as u16) {
        let kind = ElmLanguage::kind_from_raw(rowan::SyntaxKind(raw));
        if kind.is_composite() {
            assert!(seen.contains(&kind), "no source exercises {:?}", kind);
        }
    }
}

#[test]
fn wrap_is_deterministic() {
    init_logger();

    let (cst, errs) = cst::parse_str("f x = x + 1");
    assert!(errs.is_empty());

    for node in cst.descendants() {
        assert_eq!(ast::wrap(node.clone()), ast::wrap(node.clone()));
    }
}

#[test]
fn type_alias_end_to_end() {
    init_logger();

    let result = ast::parse("type alias Point = { x : Int, y : Int }");
    assert!(result.errs.is_empty(), "parse errors: {:?}", result.errs);

    let alias = result.file.type_alias_declarations().next().unwrap();
    assert_eq!(alias.name_token().unwrap().text(), "Point");

    let record = match alias.aliased_type().unwrap().segments().next().unwrap() {
        AnyNode::RecordType(record) => record,
        other => panic!("expected a record type, got {:?}", other.kind()),
    };

    let field_names: Vec<String> = record
        .field_types()
        .map(|field| field.name_token().text().to_string())
        .collect();
    assert_eq!(field_names, ["x", "y"]);
}

#[test]
fn module_declaration_reads() {
    init_logger();

    let result = ast::parse("module Foo.Bar exposing (..)");
    assert!(result.errs.is_empty());

    let module = result.file.module_declaration().unwrap();
    assert_eq!(module.qid().unwrap().text(), "Foo.Bar");
    assert!(module.exposing_list().unwrap().exposes_all());
}

#[test]
fn plain_import_has_no_optional_parts() {
    init_logger();

    let result = ast::parse("import String");
    assert!(result.errs.is_empty());

    let import = result.file.imports().next().unwrap();
    assert_eq!(import.module_qid().unwrap().text(), "String");
    assert!(import.as_clause().is_none());
    assert!(import.exposing_list().is_none());
}

#[test]
fn import_with_alias_and_exposing() {
    init_logger();

    let result = ast::parse("import Json.Decode as D exposing (Decoder, field)");
    assert!(result.errs.is_empty());

    let import = result.file.imports().next().unwrap();
    assert_eq!(import.module_qid().unwrap().text(), "Json.Decode");
    assert_eq!(import.as_clause().unwrap().alias().unwrap().text(), "D");

    let exposing = import.exposing_list().unwrap();
    assert!(!exposing.exposes_all());
    let types: Vec<String> = exposing
        .exposed_types()
        .map(|t| t.name_token().text().to_string())
        .collect();
    assert_eq!(types, ["Decoder"]);
    let values: Vec<String> = exposing
        .exposed_values()
        .map(|v| v.name_token().text().to_string())
        .collect();
    assert_eq!(values, ["field"]);
}

#[test]
fn missing_else_yields_empty_accessor() {
    init_logger();

    // error recovery keeps the partial tree; the accessor reports the
    // missing branch as absent instead of failing
    let result = ast::parse("f = if True then 1");
    assert!(!result.errs.is_empty());

    let decl = result.file.value_declarations().next().unwrap();
    let if_else = match decl.expression().unwrap().operands().next().unwrap() {
        AnyNode::IfElse(if_else) => if_else,
        other => panic!("expected an if-else, got {:?}", other.kind()),
    };

    assert!(if_else.condition().is_some());
    assert!(if_else.then_branch().is_some());
    assert!(if_else.else_branch().is_none());
}

#[test]
fn union_type_reads() {
    init_logger();

    let result = ast::parse("type Msg\n    = Increment\n    | Set Int");
    assert!(result.errs.is_empty(), "parse errors: {:?}", result.errs);

    let decl = result.file.type_declarations().next().unwrap();
    assert_eq!(decl.name_token().unwrap().text(), "Msg");
    assert_eq!(decl.type_variables().count(), 0);

    let variants: Vec<String> = decl
        .variants()
        .map(|v| v.name_token().text().to_string())
        .collect();
    assert_eq!(variants, ["Increment", "Set"]);

    let set = decl.variants().nth(1).unwrap();
    assert_eq!(set.parameter_types().count(), 1);
}

#[test]
fn case_of_reads() {
    init_logger();

    let src = "f v = case v of\n    Just n ->\n        n\n\n    _ ->\n        0";
    let result = ast::parse(src);
    assert!(result.errs.is_empty(), "parse errors: {:?}", result.errs);

    let decl = result.file.value_declarations().next().unwrap();
    let case_of = match decl.expression().unwrap().operands().next().unwrap() {
        AnyNode::CaseOf(case_of) => case_of,
        other => panic!("expected a case-of, got {:?}", other.kind()),
    };

    assert!(case_of.scrutinee().is_some());

    let branches: Vec<_> = case_of.branches().collect();
    assert_eq!(branches.len(), 2);

    match branches[0].pattern().child() {
        AnyNode::UnionPattern(union) => {
            assert_eq!(union.qid().text(), "Just");
            assert_eq!(union.arguments().count(), 1);
        }
        other => panic!("expected a constructor pattern, got {:?}", other.kind()),
    }

    match branches[1].pattern().child() {
        AnyNode::AnythingPattern(_) => {}
        other => panic!("expected a wildcard, got {:?}", other.kind()),
    }
}

#[test]
fn let_in_reads() {
    init_logger();

    let src = "f =\n    let\n        x = 1\n\n        y = 2\n    in\n    x";
    let result = ast::parse(src);
    assert!(result.errs.is_empty(), "parse errors: {:?}", result.errs);

    let decl = result.file.value_declarations().next().unwrap();
    let let_in = match decl.expression().unwrap().operands().next().unwrap() {
        AnyNode::LetIn(let_in) => let_in,
        other => panic!("expected a let-in, got {:?}", other.kind()),
    };

    let names: Vec<String> = let_in
        .value_declarations()
        .map(|d| d.function_decl_left().name_token().text().to_string())
        .collect();
    assert_eq!(names, ["x", "y"]);

    assert!(let_in.body().is_some());
}

#[test]
fn expression_chain_stays_flat() {
    init_logger();

    let result = ast::parse("f = 1 + 2 * 3");
    assert!(result.errs.is_empty());

    let expr = result
        .file
        .value_declarations()
        .next()
        .unwrap()
        .expression()
        .unwrap();

    assert_eq!(expr.operands().count(), 3);
    let ops: Vec<String> = expr.operators().map(|tk| tk.text().to_string()).collect();
    assert_eq!(ops, ["+", "*"]);
}
