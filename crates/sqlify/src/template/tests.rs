use super::*;
use crate::value::{Args, Value};

fn names(t: &CompiledTemplate) -> Vec<&str> {
    t.params().iter().map(|p| p.name.as_str()).collect()
}

#[test]
fn plain_text_is_unchanged() {
    let sql = "SELECT * FROM users WHERE active";
    let t = CompiledTemplate::parse(sql).unwrap();
    assert_eq!(t.text(), sql);
    assert!(t.params().is_empty());
}

#[test]
fn typed_placeholder_becomes_first_marker() {
    let t = CompiledTemplate::parse("SELECT * FROM t WHERE id = $(id):integer").unwrap();
    assert_eq!(t.text(), "SELECT * FROM t WHERE id = $1");
    assert_eq!(t.param_count(), 1);
    assert_eq!(t.params()[0].name, "id");
    assert_eq!(t.params()[0].ty, ParamType::Integer);
    assert!(!t.params()[0].is_transformer());
}

#[test]
fn untyped_placeholder_defaults_to_string() {
    let t = CompiledTemplate::parse("SELECT * FROM t WHERE name = $(name)").unwrap();
    assert_eq!(t.text(), "SELECT * FROM t WHERE name = $1");
    assert_eq!(t.params()[0].ty, ParamType::String);
}

#[test]
fn markers_are_sequential_left_to_right() {
    let t = CompiledTemplate::parse(
        "UPDATE t SET a = $(a):float, b = $(b):boolean, c = $(c):json WHERE d = $(d):date",
    )
    .unwrap();
    assert_eq!(t.text(), "UPDATE t SET a = $1, b = $2, c = $3 WHERE d = $4");
    assert_eq!(names(&t), ["a", "b", "c", "d"]);
    let types: Vec<ParamType> = t.params().iter().map(|p| p.ty).collect();
    assert_eq!(
        types,
        [
            ParamType::Float,
            ParamType::Boolean,
            ParamType::Json,
            ParamType::Date
        ]
    );
}

#[test]
fn duplicate_names_are_not_merged() {
    let t = CompiledTemplate::parse("SELECT * FROM t WHERE a = $(id) OR b = $(id)").unwrap();
    assert_eq!(t.text(), "SELECT * FROM t WHERE a = $1 OR b = $2");
    assert_eq!(names(&t), ["id", "id"]);
}

#[test]
fn dotted_names_are_allowed() {
    let t = CompiledTemplate::parse("SELECT $(user.id):integer").unwrap();
    assert_eq!(t.text(), "SELECT $1");
    assert_eq!(t.params()[0].name, "user.id");
}

#[test]
fn postgres_cast_is_kept() {
    let t = CompiledTemplate::parse("SELECT $(ts)::timestamptz").unwrap();
    assert_eq!(t.text(), "SELECT $1::timestamptz");
    assert_eq!(t.params()[0].ty, ParamType::String);
}

#[test]
fn type_tags_are_case_insensitive() {
    let t = CompiledTemplate::parse("SELECT $(n):INTEGER").unwrap();
    assert_eq!(t.params()[0].ty, ParamType::Integer);
}

#[test]
fn unknown_type_tag_is_rejected() {
    let err = CompiledTemplate::parse("SELECT $(n):decimal").unwrap_err();
    assert!(matches!(err, crate::SqlifyError::Template(_)));
}

#[test]
fn raw_values_are_spliced_verbatim() {
    let t = Template::new("SELECT * FROM ")
        .raw("users")
        .text(" LIMIT ")
        .raw(10)
        .compile()
        .unwrap();
    assert_eq!(t.text(), "SELECT * FROM users LIMIT 10");
    assert!(t.params().is_empty());
}

#[test]
fn raw_values_can_introduce_placeholders() {
    // Raw interpolation is not escaped: placeholder syntax inside it is live.
    let t = Template::new("SELECT * FROM t WHERE ")
        .raw("id = $(id):integer")
        .compile()
        .unwrap();
    assert_eq!(t.text(), "SELECT * FROM t WHERE id = $1");
    assert_eq!(names(&t), ["id"]);
}

#[test]
fn transformer_gets_a_marker() {
    let t = Template::new("WHERE ")
        .transform(|_| "col")
        .text(" = $(v)")
        .compile()
        .unwrap();
    assert_eq!(t.text(), "WHERE $1 = $2");
    assert!(t.params()[0].is_transformer());
    assert_eq!(t.params()[0].ty, ParamType::String);
    assert_eq!(t.params()[1].name, "v");
}

#[test]
fn named_placeholder_before_transformer_keeps_text_order() {
    let t = Template::new("SELECT * FROM t WHERE a = $(a):integer AND b = ")
        .transform(|args: &Args| args.get("b").cloned().unwrap_or(Value::Null))
        .text(" AND c = $(c)")
        .compile()
        .unwrap();

    assert_eq!(t.text(), "SELECT * FROM t WHERE a = $1 AND b = $2 AND c = $3");
    assert_eq!(t.params()[0].name, "a");
    assert!(t.params()[1].is_transformer());
    assert_eq!(t.params()[2].name, "c");
}

#[test]
fn multiple_transformers_keep_their_own_slots() {
    let t = Template::new("VALUES (")
        .transform(|_| 1)
        .text(", $(x), ")
        .transform(|_| 2)
        .text(")")
        .compile()
        .unwrap();
    assert_eq!(t.text(), "VALUES ($1, $2, $3)");

    let args = Args::new();
    let ParamSource::Transformer(first) = &t.params()[0].source else {
        panic!("expected transformer");
    };
    let ParamSource::Transformer(second) = &t.params()[2].source else {
        panic!("expected transformer");
    };
    assert_eq!(first.call(&args), Value::Int(1));
    assert_eq!(second.call(&args), Value::Int(2));
}

#[test]
fn compile_checks_fragment_count() {
    let err = compile(&["a", "b"], Vec::new()).unwrap_err();
    assert!(matches!(err, crate::SqlifyError::Template(_)));

    let err = compile::<&str>(&[], Vec::new()).unwrap_err();
    assert!(matches!(err, crate::SqlifyError::Template(_)));
}

#[test]
fn compile_from_parts() {
    let t = compile(
        &["SELECT * FROM ", " WHERE id = $(id):integer"],
        vec![Embedded::raw("users")],
    )
    .unwrap();
    assert_eq!(t.text(), "SELECT * FROM users WHERE id = $1");
}

#[test]
fn compiled_template_is_reusable() {
    let template = Template::new("SELECT ").transform(|_| 1);
    let a = template.compile().unwrap();
    let b = template.compile().unwrap();
    assert_eq!(a.text(), b.text());
    assert_eq!(a.param_count(), b.param_count());
}

#[test]
fn named_params_skips_transformers() {
    let t = Template::new("SELECT $(a), ")
        .transform(|_| 1)
        .text(", $(b)")
        .compile()
        .unwrap();
    assert_eq!(t.named_params().collect::<Vec<_>>(), ["a", "b"]);
}

#[test]
fn literal_dollar_forms_are_left_alone() {
    let t = CompiledTemplate::parse("SELECT '$5', $1, $$body$$, $()").unwrap();
    assert_eq!(t.text(), "SELECT '$5', $1, $$body$$, $()");
    assert!(t.params().is_empty());
}
