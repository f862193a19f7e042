use super::*;

const USERS: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id SERIAL PRIMARY KEY,
    name VARCHAR(100) NOT NULL,
    email varchar(255) UNIQUE,
    score numeric(10, 2) DEFAULT 0,
    active BOOLEAN NOT NULL DEFAULT true,
    profile JSONB,
    created_at timestamp with time zone DEFAULT now(),
    CONSTRAINT users_email_check CHECK (email <> ''),
    UNIQUE (name, email)
);
"#;

#[test]
fn detects_schema_text() {
    assert!(is_schema(USERS));
    assert!(is_schema("create or replace view active_users as select 1"));
    assert!(is_schema("CREATE TEMP TABLE scratch (x int)"));
    assert!(!is_schema("SELECT * FROM users WHERE id = $(id):integer"));
    assert!(!is_schema("-- schema for users\nSELECT 1"));
}

#[test]
fn parses_table_columns_in_order() {
    let entity = parse_entity(USERS, "fallback").unwrap();
    assert_eq!(entity.name, "users");
    assert_eq!(entity.kind, EntityKind::Table);
    assert_eq!(
        entity.field_names().collect::<Vec<_>>(),
        vec!["id", "name", "email", "score", "active", "profile", "created_at"]
    );

    let ty = |n: &str| entity.field(n).map(|f| f.ty);
    assert_eq!(ty("id"), Some(FieldType::Integer));
    assert_eq!(ty("name"), Some(FieldType::Text));
    assert_eq!(ty("score"), Some(FieldType::Float));
    assert_eq!(ty("active"), Some(FieldType::Boolean));
    assert_eq!(ty("profile"), Some(FieldType::Json));
    assert_eq!(ty("created_at"), Some(FieldType::Date));

    assert_eq!(
        entity.field("created_at").map(|f| f.sql_type.as_str()),
        Some("timestamp with time zone")
    );
    assert_eq!(
        entity.field("score").map(|f| f.sql_type.as_str()),
        Some("numeric(10, 2)")
    );
}

#[test]
fn keeps_qualified_and_quoted_names() {
    let entity = parse_entity(
        r#"CREATE TABLE public.accounts ("Owner Id" int, balance real)"#,
        "accounts",
    )
    .unwrap();
    assert_eq!(entity.name, "public.accounts");
    assert!(entity.has_field("Owner Id"));
    assert!(entity.has_field("balance"));
}

#[test]
fn unknown_types_map_to_unknown() {
    let entity = parse_entity("CREATE TABLE t (token uuid, tags text[])", "t").unwrap();
    assert_eq!(entity.field("token").map(|f| f.ty), Some(FieldType::Unknown));
    assert_eq!(entity.field("tags").map(|f| f.ty), Some(FieldType::Unknown));
}

#[test]
fn parses_view_select_list() {
    let entity = parse_entity(
        r#"
        CREATE VIEW active_users AS
        SELECT u.id, u.name AS display_name, count(o.id) AS orders, now(), lower(u.email)
        FROM users u LEFT JOIN orders o ON o.user_id = u.id
        WHERE u.active
        GROUP BY u.id
        "#,
        "fallback",
    )
    .unwrap();
    assert_eq!(entity.name, "active_users");
    assert_eq!(entity.kind, EntityKind::View);
    assert_eq!(
        entity.field_names().collect::<Vec<_>>(),
        vec!["id", "display_name", "orders"]
    );
    assert!(entity.fields.iter().all(|f| f.ty == FieldType::Unknown));
}

#[test]
fn table_without_body_has_no_fields() {
    let entity = parse_entity("CREATE TABLE logs", "logs").unwrap();
    assert_eq!(entity.name, "logs");
    assert!(entity.fields.is_empty());
}

#[test]
fn non_schema_text_is_rejected() {
    let err = parse_entity("SELECT 1", "x").unwrap_err();
    assert!(matches!(err, SqlifyError::Validation(_)));
}

#[test]
fn entity_serializes_to_json() {
    let entity = parse_entity("CREATE TABLE t (id int)", "t").unwrap();
    let json = serde_json::to_value(&entity).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "name": "t",
            "kind": "table",
            "fields": [{ "name": "id", "sql_type": "int", "ty": "integer" }]
        })
    );
}
