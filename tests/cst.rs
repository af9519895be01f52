/*!
Run all test cases in `cst/cases.txt` (on `cargo test`)

Each case is a title comment and a code block, followed by the expected tree
rendering after a 40-hyphen delimiter line. The renderer prints nesting and
kinds with trivia filtered, so cases stay readable.
*/

use std::fmt::{self, Write};

use elm_syntax::syntax::cst::{self, SyntaxElement, SyntaxNode};

#[derive(Debug, Clone)]
struct Test {
    title: String,
    code: String,
    expected: String,
}

#[derive(Debug, Clone)]
struct TestError {
    test: Test,
    output: String,
}

impl fmt::Display for TestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}
--- code:
{}
--- output:
{}
--- expected:
{}",
            self.test.title, self.test.code, self.output, self.test.expected,
        )
    }
}

fn collect_tests(src: &str) -> Vec<Test> {
    let delim = "\n----------------------------------------\n";
    let mut chunks = src.split(delim);

    let mut tests = vec![];
    while let Some(header) = chunks.next() {
        let expected = match chunks.next() {
            Some(block) => block.trim_matches('\n'),
            None => break,
        };

        let header = header.trim_matches('\n');
        let mut lines = header.lines();

        let title = lines.next().unwrap_or_default();
        assert!(
            title.starts_with("//"),
            "case title must be a `//` comment: {title}"
        );
        let code = lines.collect::<Vec<&str>>().join("\n");

        tests.push(Test {
            title: title.trim_start_matches('/').trim().to_string(),
            code,
            expected: expected.to_string(),
        });
    }

    tests
}

fn cst_display(cst: &SyntaxNode) -> String {
    fn rec(node: &SyntaxNode, nest: usize, out: &mut String) {
        for elem in node.children_with_tokens() {
            match elem {
                SyntaxElement::Node(child) => {
                    writeln!(out, "{}{:?}", "    ".repeat(nest), child.kind()).unwrap();
                    rec(&child, nest + 1, out);
                }
                SyntaxElement::Token(tk) => {
                    if !tk.kind().is_trivia() {
                        writeln!(out, "{}{:?} `{}`", "    ".repeat(nest), tk.kind(), tk.text())
                            .unwrap();
                    }
                }
            }
        }
    }

    let mut out = String::new();
    rec(cst, 0, &mut out);
    out.trim_end().to_string()
}

fn run_test(test: Test) -> Result<(), TestError> {
    let (cst, errs) = cst::parse_str(&test.code);

    if !errs.is_empty() {
        let s = errs
            .iter()
            .map(|e| e.detailed_message(&test.code))
            .collect::<Vec<_>>()
            .join("\n");
        panic!("{}\nsource: {}", s, test.code);
    }

    // root
    assert_eq!(
        format!("{:?}", cst),
        format!("ROOT@0..{}", test.code.len())
    );

    let cst_string = self::cst_display(&cst);
    let expected = test.expected.trim_matches('\n');

    if cst_string == expected {
        Ok(())
    } else {
        Err(TestError {
            test,
            output: cst_string,
        })
    }
}

#[test]
fn cst() {
    let src = include_str!("cst/cases.txt");
    let tests = self::collect_tests(src);
    assert!(!tests.is_empty());

    let errs = tests
        .into_iter()
        .filter_map(|t| self::run_test(t).err())
        .collect::<Vec<_>>();

    if errs.is_empty() {
        return;
    }

    for e in &errs {
        eprintln!("{}", e);
        eprintln!();
    }

    panic!("{} CST case(s) failed", errs.len());
}
