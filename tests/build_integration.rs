//! Integration tests for building templates end to end

use pretty_assertions::assert_eq;
use sql_compositor::{
    build, build_with_config, sql, sql_if, BuildConfig, DatePart, ErrorKind, EvalError,
    FormatterConfig, OrderBy, Template, Value,
};

#[test]
fn test_select_by_id() {
    let compiled = build(&sql!(
        "SELECT * FROM {0:id} WHERE id = {1:value}",
        "Users",
        5
    ))
    .expect("Should build");

    assert_eq!(compiled.sql(), "SELECT * FROM [Users] WHERE id = @p0");
    assert_eq!(compiled.parameters().values(), &[Value::Int(5)]);
}

#[test]
fn test_injection_in_identifier() {
    let err = build(&sql!("{0:id}", "Users; DROP TABLE Users")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Injection);
    assert!(matches!(err.inner(), EvalError::Injection { .. }));
}

#[test]
fn test_identifier_brackets_are_validated_not_escaped() {
    // Brackets aren't identifier characters, so they never reach the quoting step
    assert!(build(&sql!("{0:id}", "a]b")).is_err());
    let compiled = build(&sql!("{0:id}.{1:id}", "dbo", "Users")).unwrap();
    assert_eq!(compiled.sql(), "[dbo].[Users]");
}

#[test]
fn test_nested_templates_share_parameters() {
    let name = "Smith";
    let by_name = sql!("AND LastName = {0:value}", name);
    let by_manager = sql!(
        "AND ManagerId IN (SELECT Id FROM {0:id} WHERE LastName = {1:value})",
        "Managers",
        name
    );
    let query = sql!(
        "SELECT * FROM {0:id} WHERE Active = {1:value} {2:inline} {3:inline}",
        "Employees",
        true,
        by_name,
        by_manager
    );

    let compiled = build(&query).unwrap();
    assert_eq!(
        compiled.sql(),
        "SELECT * FROM [Employees] WHERE Active = @p0 AND LastName = @p1 \
         AND ManagerId IN (SELECT Id FROM [Managers] WHERE LastName = @p1)"
    );
    assert_eq!(
        compiled.parameters().values(),
        &[Value::Bool(true), Value::from("Smith")]
    );
}

#[test]
fn test_optional_clauses() {
    fn query(take: Option<i64>, order: Option<OrderBy>) -> Template {
        let top = sql_if(take.is_some(), || sql!("TOP({0:int}) ", take));
        let order_by = sql_if(order.is_some(), || {
            sql!(" ORDER BY {0:id} {1:orderby}", "Created", order.unwrap_or_default())
        });
        sql!("SELECT {0:inline}* FROM {1:id}{2:inline}", top, "Orders", order_by)
    }

    assert_eq!(
        build(&query(None, None)).unwrap().sql(),
        "SELECT * FROM [Orders]"
    );
    assert_eq!(
        build(&query(Some(5), Some(OrderBy::Desc))).unwrap().sql(),
        "SELECT TOP(5) * FROM [Orders] ORDER BY [Created] DESC"
    );
}

#[test]
fn test_null_arguments() {
    let missing: Option<&str> = None;
    let compiled = build(&sql!(
        "SELECT {0:id}1 WHERE x = {1:value} {2:inline}",
        missing,
        missing,
        Value::Null
    ))
    .unwrap();
    // Trailing whitespace is trimmed by re-indentation
    assert_eq!(compiled.sql(), "SELECT 1 WHERE x = @p0");
    assert_eq!(compiled.parameters().values(), &[Value::Null]);
}

#[test]
fn test_date_functions() {
    let since = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let compiled = build(&sql!(
        "SELECT DATEPART({0:datepart}, {1:id}) FROM t WHERE {1:id} >= {2:value}",
        DatePart::Quarter,
        "Created",
        since
    ))
    .unwrap();
    assert_eq!(
        compiled.sql(),
        "SELECT DATEPART(QUARTER, [Created]) FROM t WHERE [Created] >= @p0"
    );
    assert_eq!(compiled.parameters().values(), &[Value::Date(since)]);
}

#[test]
fn test_error_categories() {
    let cases: Vec<(Template, ErrorKind)> = vec![
        (sql!("{0}", 1), ErrorKind::MalformedPlaceholder),
        (sql!("{0:bogus}", 1), ErrorKind::MalformedPlaceholder),
        (sql!("SELECT {", 1), ErrorKind::MalformedPlaceholder),
        (sql!("{1:value}", 1), ErrorKind::MalformedPlaceholder),
        (sql!("{0:jsonpath}", "$.a;"), ErrorKind::Injection),
        (sql!("{0:type}", "int;"), ErrorKind::Injection),
        (sql!("{0:int}", "x"), ErrorKind::TypeMismatch),
        (sql!("{0:datepart}", 3), ErrorKind::TypeMismatch),
        (sql!("{0:id}", sql!("x")), ErrorKind::NestedMisuse),
        (sql!("{0:inline}", "x"), ErrorKind::NestedMisuse),
    ];
    for (template, kind) in cases {
        let err = build(&template).unwrap_err();
        assert_eq!(err.kind(), kind, "{}", template.text());
    }
}

#[test]
fn test_deep_nesting_hits_limit() {
    let formatter = FormatterConfig::default().with_max_depth(8);
    let mut template = sql!("1");
    for _ in 0..9 {
        template = sql!("({0:inline})", template);
    }
    let err = build_with_config(&template, BuildConfig::new().with_formatter(formatter)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RecursionLimit);
}

#[test]
fn test_nested_error_message_shows_each_level() {
    let inner = sql!("WHERE {0:id} = 1", "bad;name");
    let middle = sql!("FROM t\n{0:inline}", inner);
    let outer = sql!("SELECT *\n{0:inline}", middle);

    let message = build(&outer).unwrap_err().to_string();
    let expected = [
        "failed to format",
        "    SELECT *",
        "    {0:inline}",
        "where {0:inline} =",
        "    FROM t",
        "    {0:inline}",
        "where {0:inline} =",
        "WHERE {0:id} = 1",
        "{0:id}: potential SQL injection detected (bad;name), malicious characters found",
    ]
    .join("\n");
    assert_eq!(message, expected);
}

#[test]
fn test_literal_braces() {
    let compiled = build(&sql!(
        "SELECT JSON_QUERY({0:id}, '$') + '{{}}' FROM t WHERE {1:id} = {2:value}",
        "Doc",
        "Id",
        1
    ))
    .unwrap();
    assert_eq!(
        compiled.sql(),
        "SELECT JSON_QUERY([Doc], '$') + '{}' FROM t WHERE [Id] = @p0"
    );
}

#[test]
fn test_build_macro_records_calling_module() {
    let compiled = build!(&sql!("SELECT {0:value}", 1)).unwrap();
    assert_eq!(compiled.tracking().origin.as_deref(), Some("build_integration"));
    assert!(compiled.tracking().file.ends_with("build_integration.rs"));

    let config = BuildConfig::new().with_initial(vec![Value::from("tenant")]);
    let compiled = build!(&sql!("SELECT {0:value}", 1), config).unwrap();
    assert_eq!(compiled.tracking().origin.as_deref(), Some("build_integration"));
    assert_eq!(compiled.parameters().len(), 2);

    let config = BuildConfig::new().with_origin("load_orders");
    let compiled = build!(&sql!("SELECT 1"), config).unwrap();
    assert_eq!(compiled.tracking().origin.as_deref(), Some("load_orders"));
}
