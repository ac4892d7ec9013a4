//! Snapshot tests for the sp_executesql diagnostic script

use chrono::NaiveDate;
use sql_compositor::{build, sql, Value};

#[test]
fn test_script_declares_every_parameter() {
    let joined = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    let compiled = build(&sql!(
        "SELECT * FROM {0:id} WHERE Name = {1:value} AND Age > {2:value} AND Joined < {3:value} AND Nick = {4:value}",
        "Users",
        "O'Hara",
        18,
        joined,
        Value::Null
    ))
    .unwrap();

    insta::assert_snapshot!(compiled.to_string(), @r"
    DECLARE @SQL NVARCHAR(MAX) = 'SELECT * FROM [Users] WHERE Name = @p0 AND Age > @p1 AND Joined < @p2 AND Nick = @p3'
    EXEC sp_executesql @SQL, N'@p0 NVARCHAR(6), @p1 INT, @p2 DATETIME2, @p3 BIT', @p0=N'O''Hara', @p1=18, @p2='2024-03-01', @p3=NULL
    ");
}

#[test]
fn test_script_without_parameters() {
    let compiled = build(&sql!("SELECT 'it''s' AS {0:id}", "Label")).unwrap();
    insta::assert_snapshot!(compiled.to_string(), @r"
    DECLARE @SQL NVARCHAR(MAX) = 'SELECT ''it''''s'' AS [Label]'
    EXEC sp_executesql @SQL, N''
    ");
}
