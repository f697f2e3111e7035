use std::{
    fs, io,
    path::{Path, PathBuf},
};

use super::*;

macro_rules! testlist {
    ($($name:ident,)*) => {
    $(
        #[test]
        fn $name() {
            run_test(stringify!($name))
        }
    )*
    }
}

testlist! {
    deployment,
    duplicate_keys,
    invalid_token_name,
    mapping_keys,
    missing_placeholder,
    multi_doc_template,
    no_tokens,
    numeric_token,
    overlapping_tokens,
    quoted_literal,
    quoted_placeholder,
    simple_string,
    substring,
    tokens_not_mapping,
}

struct Golden {
    template: String,
    tokens: String,
    expected: String,
}

impl Golden {
    fn load(dir: &Path, name: &str) -> Golden {
        let read = |path: PathBuf| fs::read_to_string(path).unwrap();
        // A case without a tokens file renders with no tokens.
        let tokens = match fs::read_to_string(dir.join(format!("tests/{name}-tokens.txt"))) {
            Err(err) if err.kind() == io::ErrorKind::NotFound => String::new(),
            tokens => tokens.unwrap(),
        };

        Golden {
            template: read(dir.join(format!("tests/{name}.txt"))),
            tokens,
            expected: read(dir.join(format!("expected/{name}.txt"))),
        }
    }
}

fn run_test(name: &str) {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("src/process_template/tests/testdata");
    let golden = Golden::load(&dir, name);

    let actual = render_outcome(process_yaml_template(name, &golden.template, &golden.tokens));

    // Keep the last rendering around for diffing against `expected/`.
    let actual_dir = dir.join("actual");
    fs::create_dir_all(&actual_dir).unwrap();
    fs::write(actual_dir.join(format!("{name}.txt")), &actual).unwrap();

    let expected = match golden.expected.strip_prefix(SUCCESS_HEADER) {
        Some(yaml) => render_outcome(Ok(parse_yaml_str("expected", yaml).unwrap().remove(0))),
        None => golden.expected,
    };
    assert_eq!(expected, actual);
}

const SUCCESS_HEADER: &str = "ERROR: <None>\nOUTPUT:\n";

// Both sides go through the emitter, so hand-written expected yaml only has to match in content.
fn render_outcome(outcome: Result<Node, Error>) -> String {
    match outcome {
        Ok(doc) => format!("{SUCCESS_HEADER}{}", yaml_emit_to_string(&[doc]).unwrap()),
        Err(err) => format!("ERROR: {err:#}\n"),
    }
}

#[test]
fn quoted_placeholder_keeps_string_type() {
    let rendered = process_yaml_template_str(
        "chart.yaml",
        "version: '__VERSION__'\nenabled: \"__ENABLED__\"\n",
        "VERSION: '1.10'\nENABLED: 'yes'\n",
    )
    .unwrap();

    let doc = parse_yaml_str("rendered", &rendered).unwrap().remove(0);
    assert_eq!(doc.get("version"), Some(&Node::quoted("1.10")));
    assert_eq!(doc.get("enabled"), Some(&Node::quoted("yes")));
}

#[test]
fn parse_tokens_keeps_order() {
    let tokens = parse_tokens("tokens.yaml", "B: 2\nA: one\n").unwrap();
    assert_eq!(tokens, vec![FluxConfig::new("B", "2"), FluxConfig::new("A", "one")]);
}

#[test]
fn parse_tokens_empty() {
    assert!(parse_tokens("tokens.yaml", "").unwrap().is_empty());
    assert!(parse_tokens("tokens.yaml", "~\n").unwrap().is_empty());
}

#[test]
fn parse_tokens_rejects_nested_values() {
    let err = parse_tokens("tokens.yaml", "A:\n  b: c\n").unwrap_err();
    assert_eq!(err.to_string(), "token 'A' must be a scalar, found mapping");
}

#[test]
fn cross_output_isolation() {
    let template = "name: __SERVICE_NAME__\nimage: __SERVICE_NAME__:__TAG__\n";
    let a = process_yaml_template("svc.yaml", template, "SERVICE_NAME: service-A\nTAG: a1\n").unwrap();
    let b = process_yaml_template("svc.yaml", template, "SERVICE_NAME: service-B\nTAG: b1\n").unwrap();

    let a_text = yaml_emit_to_string(&[a]).unwrap();
    let b_text = yaml_emit_to_string(&[b]).unwrap();
    assert!(a_text.contains("service-A:a1") && !a_text.contains("service-B"));
    assert!(b_text.contains("service-B:b1") && !b_text.contains("service-A"));
}
