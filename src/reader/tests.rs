use super::*;
use crate::partition::FileConfig;
use pretty_assertions::assert_eq;
use serde_json::json;

fn file_config(input_path: Option<&str>, params: &[(&str, &str)]) -> FileConfig {
    FileConfig {
        input_path: input_path.map(str::to_string),
        params: params
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect(),
        ..FileConfig::default()
    }
}

async fn drain(reader: &mut dyn RecordReader) -> Vec<Record> {
    let mut records = Vec::new();
    while let Some(record) = reader.read().await.unwrap() {
        records.push(record);
    }
    records
}

// ============================================================================
// Delimited
// ============================================================================

#[tokio::test]
async fn test_delimited_reader_tokenizes_lines() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("accounts.csv");
    std::fs::write(&input, "12345,ACTIVE,100.50\n67890,CLOSED,0.00\n").unwrap();

    let config = file_config(
        input.to_str(),
        &[("columnNames", "ACCT_NUM,STATUS,BALANCE")],
    );
    let mut reader = DelimitedReader::new(&config).unwrap();
    reader.open(&ReadContext::default()).await.unwrap();

    let records = drain(&mut reader).await;
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["ACCT_NUM"], json!("12345"));
    assert_eq!(records[0]["BALANCE"], json!("100.50"));
    assert_eq!(records[1]["STATUS"], json!("CLOSED"));

    let mut ctx = ReadContext::default();
    reader.update(&mut ctx);
    assert_eq!(ctx.records_read, 2);
}

#[tokio::test]
async fn test_delimited_reader_quoted_fields_and_blank_lines() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.csv");
    std::fs::write(&input, "1|\"SMITH, JOHN\"\n\n2|\"O\"\"NEIL\"\n").unwrap();

    let config = file_config(
        input.to_str(),
        &[("columnNames", "ID,NAME"), ("delimiter", "|")],
    );
    let mut reader = DelimitedReader::new(&config).unwrap();
    reader.open(&ReadContext::default()).await.unwrap();

    let records = drain(&mut reader).await;
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["NAME"], json!("SMITH, JOHN"));
    assert_eq!(records[1]["NAME"], json!("O\"NEIL"));
}

#[tokio::test]
async fn test_delimited_reader_short_line_omits_trailing_fields() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.csv");
    std::fs::write(&input, "only-one\n").unwrap();

    let config = file_config(input.to_str(), &[("columnNames", "A,B,C")]);
    let mut reader = DelimitedReader::new(&config).unwrap();
    reader.open(&ReadContext::default()).await.unwrap();

    let records = drain(&mut reader).await;
    assert_eq!(records[0].len(), 1);
    assert_eq!(records[0]["A"], json!("only-one"));
}

#[tokio::test]
async fn test_delimited_reader_missing_input_fails_at_open() {
    let config = file_config(Some("/nonexistent/in.csv"), &[("columnNames", "A")]);
    let mut reader = DelimitedReader::new(&config).unwrap();
    let err = reader.open(&ReadContext::default()).await.unwrap_err();
    assert!(matches!(err, crate::error::Error::SourceOpen { .. }));
}

// ============================================================================
// Fixed-width
// ============================================================================

#[tokio::test]
async fn test_fixed_width_reader_slices_ranges() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.dat");
    std::fs::write(&input, "12345ACTIVE    000100\n67890CLOSED    000000\n").unwrap();

    let config = file_config(
        input.to_str(),
        &[
            ("columnNames", "ACCT_NUM,STATUS,AMT"),
            ("columnRanges", "1-5,6-15,16-21"),
        ],
    );
    let mut reader = FixedWidthReader::new(&config).unwrap();
    reader.open(&ReadContext::default()).await.unwrap();

    let records = drain(&mut reader).await;
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["ACCT_NUM"], json!("12345"));
    assert_eq!(records[0]["STATUS"], json!("ACTIVE"));
    assert_eq!(records[0]["AMT"], json!("000100"));
}

#[test]
fn test_fixed_width_reader_range_validation() {
    let bad_pair = file_config(
        Some("in.dat"),
        &[("columnNames", "A"), ("columnRanges", "5-2")],
    );
    assert!(FixedWidthReader::new(&bad_pair).is_err());

    let count_mismatch = file_config(
        Some("in.dat"),
        &[("columnNames", "A,B"), ("columnRanges", "1-5")],
    );
    assert!(FixedWidthReader::new(&count_mismatch).is_err());
}

// ============================================================================
// SQL
// ============================================================================

#[tokio::test]
async fn test_sql_reader_pages_through_table() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("source.db");
    {
        let conn = duckdb::Connection::open(&db_path).unwrap();
        conn.execute_batch(
            "CREATE TABLE ACCOUNTS (ACCT_NUM VARCHAR, BALANCE DOUBLE);
             INSERT INTO ACCOUNTS VALUES ('3', 30.0), ('1', 10.0), ('2', 20.0);",
        )
        .unwrap();
    }

    let config = FileConfig {
        target: Some("ACCOUNTS".to_string()),
        params: [
            ("connection", db_path.to_str().unwrap()),
            ("pageSize", "2"),
        ]
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect(),
        ..FileConfig::default()
    };
    let mut reader = SqlReader::new(&config).unwrap();
    reader.open(&ReadContext::default()).await.unwrap();

    let records = drain(&mut reader).await;
    // Ordered by the default sort key across page boundaries.
    let keys: Vec<String> = records
        .iter()
        .map(|r| r["ACCT_NUM"].as_str().unwrap_or_default().to_string())
        .collect();
    assert_eq!(keys, vec!["1", "2", "3"]);
    assert_eq!(records[0]["BALANCE"], json!(10.0));

    reader.close().await.unwrap();
}

#[tokio::test]
async fn test_sql_reader_custom_query() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("source.db");
    {
        let conn = duckdb::Connection::open(&db_path).unwrap();
        conn.execute_batch(
            "CREATE TABLE T (ID INTEGER, FLAG BOOLEAN);
             INSERT INTO T VALUES (1, true), (2, false);",
        )
        .unwrap();
    }

    let config = FileConfig {
        params: [
            ("connection", db_path.to_str().unwrap()),
            ("query", "SELECT ID, FLAG FROM T WHERE FLAG ORDER BY ID"),
        ]
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect(),
        ..FileConfig::default()
    };
    let mut reader = SqlReader::new(&config).unwrap();
    reader.open(&ReadContext::default()).await.unwrap();

    let records = drain(&mut reader).await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["ID"], json!(1));
    assert_eq!(records[0]["FLAG"], json!(true));
}

// ============================================================================
// REST
// ============================================================================

#[tokio::test]
async fn test_rest_reader_array_response() {
    let server = wiremock::MockServer::start().await;
    wiremock::Mock::given(wiremock::matchers::method("GET"))
        .and(wiremock::matchers::path("/accounts"))
        .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(json!([
            {"ACCT_NUM": "1", "STATUS": "A"},
            {"ACCT_NUM": "2", "STATUS": "B"}
        ])))
        .mount(&server)
        .await;

    let config = file_config(
        None,
        &[("baseUrl", server.uri().as_str()), ("endpoint", "/accounts")],
    );
    let mut reader = RestReader::new(&config).unwrap();
    reader.open(&ReadContext::default()).await.unwrap();

    let records = drain(&mut reader).await;
    assert_eq!(records.len(), 2);
    assert_eq!(records[1]["STATUS"], json!("B"));

    let mut ctx = ReadContext::default();
    reader.update(&mut ctx);
    assert_eq!(ctx.records_read, 2);
}

#[tokio::test]
async fn test_rest_reader_sends_bearer_auth() {
    let server = wiremock::MockServer::start().await;
    wiremock::Mock::given(wiremock::matchers::method("GET"))
        .and(wiremock::matchers::header("Authorization", "Bearer sekret"))
        .respond_with(
            wiremock::ResponseTemplate::new(200).set_body_json(json!({"ACCT_NUM": "1"})),
        )
        .mount(&server)
        .await;

    let config = file_config(
        None,
        &[
            ("baseUrl", server.uri().as_str()),
            ("endpoint", "/secure"),
            ("authToken", "sekret"),
        ],
    );
    let mut reader = RestReader::new(&config).unwrap();
    reader.open(&ReadContext::default()).await.unwrap();

    let records = drain(&mut reader).await;
    assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn test_rest_reader_error_status_fails_open() {
    let server = wiremock::MockServer::start().await;
    wiremock::Mock::given(wiremock::matchers::method("GET"))
        .respond_with(wiremock::ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let config = file_config(
        None,
        &[("baseUrl", server.uri().as_str()), ("endpoint", "/down")],
    );
    let mut reader = RestReader::new(&config).unwrap();
    let err = reader.open(&ReadContext::default()).await.unwrap_err();
    assert!(matches!(
        err,
        crate::error::Error::HttpStatus { status: 503, .. }
    ));
    assert!(err.is_transient());
}
