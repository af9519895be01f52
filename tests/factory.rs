/*!
Fragment factory tests: round-trips and rejection of bad payloads
*/

use elm_syntax::syntax::{
    ast::{AnyNode, AstNode},
    cst::SyntaxKind,
    factory::{self, SynthesisError},
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn lower_case_identifier_round_trip() {
    init_logger();

    let ident = factory::lower_case_identifier("foo").unwrap();
    assert_eq!(ident.text(), "foo");
}

#[test]
fn upper_case_identifier_round_trip() {
    init_logger();

    let ident = factory::upper_case_identifier("Bar").unwrap();
    assert_eq!(ident.text(), "Bar");
}

#[test]
fn lower_case_identifier_rejects_garbage() {
    init_logger();

    let err = factory::lower_case_identifier("not a valid identifier!").unwrap_err();
    assert!(matches!(err, SynthesisError::PayloadMismatch { .. }), "{err:?}");
}

#[test]
fn upper_case_identifier_rejects_garbage() {
    init_logger();

    let err = factory::upper_case_identifier("not a valid identifier!").unwrap_err();
    assert!(matches!(err, SynthesisError::FragmentNotFound { .. }), "{err:?}");
}

#[test]
fn lower_case_identifier_rejects_keyword() {
    init_logger();

    // `in` lexes as a keyword, so no identifier token can come out of it
    assert!(factory::lower_case_identifier("in").is_err());
}

#[test]
fn upper_case_qid_round_trip() {
    init_logger();

    let qid = factory::upper_case_qid("Json.Decode.Value").unwrap();
    assert_eq!(qid.text(), "Json.Decode.Value");

    let segments: Vec<String> = qid.segments().map(|tk| tk.text().to_string()).collect();
    assert_eq!(segments, ["Json", "Decode", "Value"]);
}

#[test]
fn value_qid_round_trip() {
    init_logger();

    let qid = factory::value_qid("List.map").unwrap();
    assert_eq!(qid.text(), "List.map");
    assert_eq!(qid.name_token().text(), "map");

    let qualifiers: Vec<String> = qid.qualifiers().map(|tk| tk.text().to_string()).collect();
    assert_eq!(qualifiers, ["List"]);
}

#[test]
fn value_qid_unqualified() {
    init_logger();

    let qid = factory::value_qid("foo").unwrap();
    assert_eq!(qid.text(), "foo");
    assert_eq!(qid.qualifiers().count(), 0);
}

#[test]
fn synthesize_record_type() {
    init_logger();

    let node = factory::synthesize_node(SyntaxKind::RecordType, "{ x : Int }").unwrap();
    let record = match node {
        AnyNode::RecordType(record) => record,
        other => panic!("expected a record type, got {:?}", other.kind()),
    };

    let names: Vec<String> = record
        .field_types()
        .map(|f| f.name_token().text().to_string())
        .collect();
    assert_eq!(names, ["x"]);
}

#[test]
fn synthesize_case_of() {
    init_logger();

    let node = factory::synthesize_node(SyntaxKind::CaseOf, "case x of _ -> 1").unwrap();
    let case_of = match node {
        AnyNode::CaseOf(case_of) => case_of,
        other => panic!("expected a case-of, got {:?}", other.kind()),
    };

    assert_eq!(case_of.branches().count(), 1);
}

#[test]
fn synthesize_import() {
    init_logger();

    let node =
        factory::synthesize_node(SyntaxKind::ImportClause, "import Dict as D").unwrap();
    let import = match node {
        AnyNode::ImportClause(import) => import,
        other => panic!("expected an import, got {:?}", other.kind()),
    };

    assert_eq!(import.module_qid().unwrap().text(), "Dict");
    assert_eq!(import.as_clause().unwrap().alias().unwrap().text(), "D");
}

#[test]
fn synthesize_reports_missing_fragment() {
    init_logger();

    // a list can never come out of a record-shaped payload
    let err = factory::synthesize_node(SyntaxKind::Record, "[ 1 ]").unwrap_err();
    assert!(matches!(err, SynthesisError::FragmentNotFound { .. }), "{err:?}");
}

#[test]
fn synthesize_refuses_leaf_kinds() {
    init_logger();

    let err = factory::synthesize_node(SyntaxKind::LowerCaseIdentifier, "foo").unwrap_err();
    assert!(matches!(err, SynthesisError::UnsupportedKind { .. }), "{err:?}");
}

#[test]
fn synthesized_nodes_are_detached() {
    init_logger();

    // the fragment keeps its private tree alive; it is never linked into any
    // caller-visible file
    let node = factory::synthesize_node(SyntaxKind::Expression, "1 + 2").unwrap();
    let root = node.syntax().ancestors().last().unwrap();
    assert_eq!(root.kind(), SyntaxKind::ROOT);
    assert_eq!(root.parent(), None);
}
