//! Salesforce authentication
//!
//! Exchanges a username, password, and security token for a session using the
//! SOAP partner `login` call. The returned session id is then used as a bearer
//! token against the REST API.

use super::{Connection, SalesforceClient};
use crate::config::Credentials;
use crate::error::AuthError;
use eyre::{Context, Result, eyre};
use regex::Regex;
use reqwest::Client;
use std::future::Future;
use url::Url;

/// Exchanges credentials for a live connection
pub trait Authenticator: Send + Sync {
    /// The connection handle produced by a successful login
    type Connection: Connection;

    /// Authenticate once against the given login domain
    ///
    /// # Errors
    /// Returns an [`AuthError`] carrying the service or network message
    fn authenticate(
        &self,
        credentials: &Credentials,
        domain: &str,
    ) -> impl Future<Output = Result<Self::Connection, AuthError>> + Send;
}

/// An authenticated Salesforce session
#[derive(Clone)]
pub struct Session {
    pub session_id: String,
    pub instance_url: Url,
    pub api_version: String,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("session_id", &"<redacted>")
            .field("instance_url", &self.instance_url.as_str())
            .field("api_version", &self.api_version)
            .finish()
    }
}

/// SOAP partner login
///
/// # Example
/// ```no_run
/// use salesforce_extract::client::{Authenticator, SalesforceLogin};
/// use salesforce_extract::config::Credentials;
///
/// # async fn example() -> eyre::Result<()> {
/// let creds = Credentials::new("user@example.com", "secret", "TOKEN");
/// let client = SalesforceLogin::new().authenticate(&creds, "login").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct SalesforceLogin {
    client: Client,
    login_url: Option<Url>,
}

impl SalesforceLogin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a fixed login host instead of `https://<domain>.salesforce.com`
    pub fn with_login_url(mut self, url: Url) -> Self {
        self.login_url = Some(url);
        self
    }

    /// The SOAP endpoint for a domain and API version
    pub fn endpoint(&self, domain: &str, api_version: &str) -> Result<Url> {
        let base = match &self.login_url {
            Some(url) => url.clone(),
            None => Url::parse(&format!("https://{}.salesforce.com", domain))
                .with_context(|| format!("Invalid Salesforce domain: {}", domain))?,
        };
        Ok(base.join(&format!("/services/Soap/u/{}", api_version))?)
    }

    /// Perform the login call and return the session
    pub async fn login(&self, credentials: &Credentials, domain: &str) -> Result<Session> {
        let api_version = credentials.api_version();
        let endpoint = self.endpoint(domain, api_version)?;
        log::debug!("Logging in to {} as {}", endpoint, credentials.username);

        let response = self
            .client
            .post(endpoint)
            .header(reqwest::header::CONTENT_TYPE, "text/xml; charset=UTF-8")
            .header("SOAPAction", "login")
            .body(login_envelope(credentials))
            .send()
            .await
            .map_err(|e| eyre!("Failed to send login request: {}", e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .with_context(|| "Failed to read login response")?;

        if !status.is_success() {
            let fault = element(&body, "faultstring").unwrap_or(body);
            eyre::bail!("{} ({})", fault, status);
        }

        let session_id =
            element(&body, "sessionId").ok_or_else(|| eyre!("Login response has no sessionId"))?;
        let server_url =
            element(&body, "serverUrl").ok_or_else(|| eyre!("Login response has no serverUrl"))?;
        let server_url = Url::parse(&server_url)
            .with_context(|| format!("Invalid serverUrl in login response: {}", server_url))?;
        let instance_url = server_url.join("/")?;

        log::info!("Authenticated against {}", instance_url);

        Ok(Session {
            session_id,
            instance_url,
            api_version: api_version.to_string(),
        })
    }
}

impl Authenticator for SalesforceLogin {
    type Connection = SalesforceClient;

    async fn authenticate(
        &self,
        credentials: &Credentials,
        domain: &str,
    ) -> Result<Self::Connection, AuthError> {
        let session = self
            .login(credentials, domain)
            .await
            .map_err(|e| AuthError::new(e.to_string()))?;
        SalesforceClient::try_new(session).map_err(|e| AuthError::new(e.to_string()))
    }
}

fn login_envelope(credentials: &Credentials) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8" ?>
<env:Envelope xmlns:xsd="http://www.w3.org/2001/XMLSchema" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xmlns:env="http://schemas.xmlsoap.org/soap/envelope/" xmlns:urn="urn:partner.soap.sforce.com">
  <env:Header>
    <urn:CallOptions>
      <urn:client>{client}</urn:client>
      <urn:defaultNamespace>sf</urn:defaultNamespace>
    </urn:CallOptions>
  </env:Header>
  <env:Body>
    <n1:login xmlns:n1="urn:partner.soap.sforce.com">
      <n1:username>{username}</n1:username>
      <n1:password>{password}{token}</n1:password>
    </n1:login>
  </env:Body>
</env:Envelope>"#,
        client = env!("CARGO_PKG_NAME"),
        username = escape_xml(&credentials.username),
        password = escape_xml(&credentials.password),
        token = escape_xml(&credentials.security_token),
    )
}

fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Text of the first element with the given local name, ignoring namespace prefixes
fn element(xml: &str, name: &str) -> Option<String> {
    let pattern = format!(r"<(?:\w+:)?{0}(?:\s[^>]*)?>([^<]*)</(?:\w+:)?{0}>", name);
    let re = Regex::new(&pattern).ok()?;
    re.captures(xml)
        .and_then(|c| c.get(1))
        .map(|m| unescape_xml(m.as_str()))
}

fn unescape_xml(value: &str) -> String {
    let Ok(entity) = Regex::new(r"&(?:#[xX]([0-9a-fA-F]+)|#([0-9]+)|(lt|gt|quot|apos|amp));") else {
        return value.to_string();
    };
    entity
        .replace_all(value, |c: &regex::Captures| {
            let code = match (c.get(1), c.get(2)) {
                (Some(hex), _) => u32::from_str_radix(hex.as_str(), 16).ok(),
                (_, Some(dec)) => dec.as_str().parse().ok(),
                _ => None,
            };
            if let Some(code) = code {
                return char::from_u32(code)
                    .map(String::from)
                    .unwrap_or_else(|| c[0].to_string());
            }
            match &c[3] {
                "lt" => "<",
                "gt" => ">",
                "quot" => "\"",
                "apos" => "'",
                _ => "&",
            }
            .to_string()
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOGIN_OK: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/" xmlns="urn:partner.soap.sforce.com">
<soapenv:Body><loginResponse><result>
<serverUrl>https://acme.my.salesforce.com/services/Soap/u/59.0/00D000000000001</serverUrl>
<sessionId>00D!AQ0AQ&amp;xyz</sessionId>
</result></loginResponse></soapenv:Body></soapenv:Envelope>"#;

    #[test]
    fn test_element_extraction() {
        assert_eq!(
            element(LOGIN_OK, "sessionId").as_deref(),
            Some("00D!AQ0AQ&xyz")
        );
        assert_eq!(
            element(LOGIN_OK, "serverUrl").as_deref(),
            Some("https://acme.my.salesforce.com/services/Soap/u/59.0/00D000000000001")
        );
        assert_eq!(element(LOGIN_OK, "missing"), None);
    }

    #[test]
    fn test_fault_extraction() {
        let fault = r#"<soapenv:Fault><faultcode>sf:INVALID_LOGIN</faultcode><faultstring>INVALID_LOGIN: Invalid username, password, security token; or user locked out.</faultstring></soapenv:Fault>"#;
        assert!(
            element(fault, "faultstring")
                .unwrap()
                .starts_with("INVALID_LOGIN")
        );
    }

    #[test]
    fn test_numeric_character_references() {
        let fault = "<faultstring>INVALID_LOGIN: can&#39;t log in as &#x27;jane&#X27; &amp;#39; &#1114112;</faultstring>";
        assert_eq!(
            element(fault, "faultstring").as_deref(),
            Some("INVALID_LOGIN: can't log in as 'jane' &#39; &#1114112;")
        );
    }

    #[test]
    fn test_envelope_escapes_credentials() {
        let creds = Credentials::new("a&b@example.com", "p<w>", "tok'");
        let envelope = login_envelope(&creds);
        assert!(envelope.contains("<n1:username>a&amp;b@example.com</n1:username>"));
        assert!(envelope.contains("<n1:password>p&lt;w&gt;tok&apos;</n1:password>"));
    }

    #[test]
    fn test_endpoint_from_domain() {
        let login = SalesforceLogin::new();
        assert_eq!(
            login.endpoint("test", "59.0").unwrap().as_str(),
            "https://test.salesforce.com/services/Soap/u/59.0"
        );
        assert_eq!(
            login.endpoint("acme.my", "58.0").unwrap().as_str(),
            "https://acme.my.salesforce.com/services/Soap/u/58.0"
        );
    }

    #[test]
    fn test_endpoint_override() {
        let login =
            SalesforceLogin::new().with_login_url(Url::parse("http://127.0.0.1:9000").unwrap());
        assert_eq!(
            login.endpoint("ignored", "59.0").unwrap().as_str(),
            "http://127.0.0.1:9000/services/Soap/u/59.0"
        );
    }
}
