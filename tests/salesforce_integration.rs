//! Integration tests against a mock Salesforce server
//!
//! Exercises the real SOAP login and REST describe/query calls over HTTP.

use eyre::Result;
use salesforce_extract::client::{Authenticator, Connection, SalesforceLogin};
use salesforce_extract::config::{ConfigFile, Credentials};
use salesforce_extract::error::{ExtractError, FetchStage};
use salesforce_extract::extraction::{ExtractRequest, Extraction};
use serde_json::json;
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SESSION_ID: &str = "00Dxx0000001gPL!AQ4AQFakeSession";

fn login_response(server: &MockServer) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/" xmlns="urn:partner.soap.sforce.com">
  <soapenv:Body>
    <loginResponse>
      <result>
        <metadataServerUrl>{uri}/services/Soap/m/59.0/00Dxx0000001gPL</metadataServerUrl>
        <passwordExpired>false</passwordExpired>
        <sandbox>true</sandbox>
        <serverUrl>{uri}/services/Soap/u/59.0/00Dxx0000001gPL</serverUrl>
        <sessionId>{session}</sessionId>
        <userId>005xx000001Sv6eAAC</userId>
      </result>
    </loginResponse>
  </soapenv:Body>
</soapenv:Envelope>"#,
        uri = server.uri(),
        session = SESSION_ID,
    )
}

async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/services/Soap/u/59.0"))
        .and(header("SOAPAction", "login"))
        .and(body_string_contains("<n1:username>analyst@example.com</n1:username>"))
        .and(body_string_contains("<n1:password>secretTOKEN</n1:password>"))
        .respond_with(ResponseTemplate::new(200).set_body_string(login_response(server)))
        .expect(1)
        .mount(server)
        .await;
}

fn write_config(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("config.yml");
    std::fs::write(
        &path,
        "salesforce:\n  uname: analyst@example.com\n  pwd: secret\n  sftoken: TOKEN\n",
    )
    .unwrap();
    path
}

fn login_for(server: &MockServer) -> SalesforceLogin {
    SalesforceLogin::new().with_login_url(Url::parse(&server.uri()).unwrap())
}

#[tokio::test]
async fn test_login_and_describe() -> Result<()> {
    let server = MockServer::start().await;
    mount_login(&server).await;

    Mock::given(method("GET"))
        .and(path("/services/data/v59.0/sobjects/Account/describe/"))
        .and(header("Authorization", format!("Bearer {}", SESSION_ID).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "Account",
            "fields": [
                {"name": "Id", "type": "id"},
                {"name": "Name", "type": "string"},
                {"name": "AnnualRevenue", "type": "currency"}
            ]
        })))
        .mount(&server)
        .await;

    let creds = Credentials::new("analyst@example.com", "secret", "TOKEN");
    let client = login_for(&server).authenticate(&creds, "test").await?;

    assert_eq!(client.instance_url().as_str(), format!("{}/", server.uri()));
    assert_eq!(
        client.describe("Account").await?,
        ["Id", "Name", "AnnualRevenue"]
    );
    Ok(())
}

#[tokio::test]
async fn test_login_fault() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/services/Soap/u/59.0"))
        .respond_with(ResponseTemplate::new(500).set_body_string(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/" xmlns:sf="urn:fault.partner.soap.sforce.com">
  <soapenv:Body>
    <soapenv:Fault>
      <faultcode>sf:INVALID_LOGIN</faultcode>
      <faultstring>INVALID_LOGIN: Invalid username, password, security token; or user locked out.</faultstring>
    </soapenv:Fault>
  </soapenv:Body>
</soapenv:Envelope>"#,
        ))
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("out.csv");
    let extraction = Extraction::new(ConfigFile::new(write_config(&temp_dir)), login_for(&server));

    let err = extraction
        .run(&ExtractRequest::new("Account").output(&output))
        .await
        .unwrap_err();

    assert!(matches!(err, ExtractError::Auth(_)));
    assert!(err.to_string().contains("connecting to Salesforce"));
    assert!(err.to_string().contains("INVALID_LOGIN"));
    assert!(!output.exists());
}

#[tokio::test]
async fn test_extract_all_fields_to_csv() -> Result<()> {
    let server = MockServer::start().await;
    mount_login(&server).await;

    Mock::given(method("GET"))
        .and(path("/services/data/v59.0/sobjects/Contact/describe/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "fields": [{"name": "Id"}, {"name": "LastName"}, {"name": "Email"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/services/data/v59.0/query/"))
        .and(query_param("q", "SELECT Id, LastName, Email FROM Contact"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "totalSize": 2,
            "done": true,
            "records": [
                {
                    "attributes": {"type": "Contact", "url": "/services/data/v59.0/sobjects/Contact/003A"},
                    "Id": "003A",
                    "LastName": "Doe",
                    "Email": "jane@example.com"
                },
                {
                    "attributes": {"type": "Contact", "url": "/services/data/v59.0/sobjects/Contact/003B"},
                    "Id": "003B",
                    "LastName": "Roe",
                    "Email": null
                }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let temp_dir = TempDir::new()?;
    let output = temp_dir.path().join("contacts.csv");
    let extraction = Extraction::new(ConfigFile::new(write_config(&temp_dir)), login_for(&server));

    let summary = extraction
        .run(&ExtractRequest::new("Contact").output(&output))
        .await?;

    assert_eq!(summary.records, 2);
    assert_eq!(
        std::fs::read_to_string(&output)?,
        "Id,LastName,Email\n003A,Doe,jane@example.com\n003B,Roe,\n"
    );
    Ok(())
}

#[tokio::test]
async fn test_unknown_entity_surfaces_api_error() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    Mock::given(method("GET"))
        .and(path("/services/data/v59.0/sobjects/Widget__c/describe/"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!([{
            "errorCode": "NOT_FOUND",
            "message": "The requested resource does not exist"
        }])))
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let extraction = Extraction::new(ConfigFile::new(write_config(&temp_dir)), login_for(&server));

    let err = extraction
        .run(&ExtractRequest::new("Widget__c").output(temp_dir.path().join("w.csv")))
        .await
        .unwrap_err();

    match &err {
        ExtractError::Fetch(fetch) => assert_eq!(fetch.stage(), FetchStage::Describe),
        other => panic!("unexpected error: {other:?}"),
    }
    let message = err.to_string();
    assert!(message.starts_with("Error retrieving fields for Widget__c"));
    assert!(message.contains("NOT_FOUND: The requested resource does not exist"));
}

#[tokio::test]
async fn test_malformed_query_is_execute_error() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    Mock::given(method("GET"))
        .and(path("/services/data/v59.0/query/"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!([{
            "errorCode": "INVALID_FIELD",
            "message": "No such column 'Nope' on entity 'Account'."
        }])))
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("a.csv");
    let extraction = Extraction::new(ConfigFile::new(write_config(&temp_dir)), login_for(&server));

    let err = extraction
        .run(
            &ExtractRequest::new("Account")
                .fields(vec!["Nope".into()])
                .output(&output),
        )
        .await
        .unwrap_err();

    match &err {
        ExtractError::Fetch(fetch) => assert_eq!(fetch.stage(), FetchStage::Execute),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.to_string().starts_with("Error executing query:"));
    assert!(err.to_string().contains("INVALID_FIELD"));
    assert!(!output.exists());
}
