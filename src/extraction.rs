//! Extraction runs
//!
//! An [`Extraction`] loads credentials, authenticates, fetches one entity's
//! records, and writes them to CSV. Each run moves through
//! `Idle → ConfigLoaded → Authenticated → Fetched → Written → Done`; the first
//! failing stage ends the run in `Failed` with its [`ExtractError`].

use crate::client::{Authenticator, SalesforceLogin};
use crate::config::{ConfigFile, CredentialsSource, DEFAULT_CONFIG_PATH};
use crate::error::{ExtractError, FetchError};
use crate::etl::Transformer;
use crate::sobjects::{QuerySpec, RecordsExtractor};
use crate::storage::CsvWriter;
use crate::transform::FieldDropper;

use std::path::{Path, PathBuf};

/// Progress of a single run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    ConfigLoaded,
    Authenticated,
    Fetched,
    Written,
    Done,
    Failed,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::ConfigLoaded => "config loaded",
            Self::Authenticated => "authenticated",
            Self::Fetched => "fetched",
            Self::Written => "written",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// One extraction request: entity, optional fields, optional output file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractRequest {
    entity: String,
    fields: Vec<String>,
    output: Option<PathBuf>,
}

impl ExtractRequest {
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            fields: Vec::new(),
            output: None,
        }
    }

    /// Restrict the query to these fields; empty selects every field
    pub fn fields(mut self, fields: Vec<String>) -> Self {
        self.fields = fields;
        self
    }

    pub fn output(mut self, path: impl AsRef<Path>) -> Self {
        self.output = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// The output file, defaulting to `<entity>.csv`
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("{}.csv", self.entity)))
    }
}

/// Outcome of a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractSummary {
    pub entity: String,
    pub path: PathBuf,
    pub records: usize,
}

impl std::fmt::Display for ExtractSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Data saved to {}", self.path.display())
    }
}

/// Runs extractions with one credentials source and authenticator
///
/// Holds no per-run state; every [`run`](Extraction::run) builds its own
/// connection and drops it when done.
///
/// # Example
/// ```no_run
/// use salesforce_extract::client::SalesforceLogin;
/// use salesforce_extract::config::ConfigFile;
/// use salesforce_extract::extraction::{ExtractRequest, Extraction};
///
/// # async fn example() -> Result<(), salesforce_extract::ExtractError> {
/// let extraction = Extraction::new(ConfigFile::new("config.yml"), SalesforceLogin::new());
/// let request = ExtractRequest::new("Account").fields(vec!["Id".into(), "Name".into()]);
/// let summary = extraction.run(&request).await?;
/// println!("{}", summary);
/// # Ok(())
/// # }
/// ```
pub struct Extraction<S, A> {
    source: S,
    authenticator: A,
    domain: Option<String>,
}

impl<S, A> Extraction<S, A>
where
    S: CredentialsSource,
    A: Authenticator,
{
    pub fn new(source: S, authenticator: A) -> Self {
        Self {
            source,
            authenticator,
            domain: None,
        }
    }

    /// Override the login domain from the credentials file
    pub fn with_domain(mut self, domain: Option<String>) -> Self {
        self.domain = domain;
        self
    }

    /// Load credentials and authenticate
    pub async fn connect(&self) -> Result<A::Connection, ExtractError> {
        let mut stage = Stage::Idle;
        self.connect_from(&mut stage).await
    }

    async fn connect_from(&self, stage: &mut Stage) -> Result<A::Connection, ExtractError> {
        let credentials = self.source.load()?;
        advance(stage, Stage::ConfigLoaded);

        let domain = credentials.domain_or(self.domain.as_deref());
        log::info!("Connecting to Salesforce ({}) as {}", domain, credentials.username);
        let connection = self
            .authenticator
            .authenticate(&credentials, domain)
            .await?;
        advance(stage, Stage::Authenticated);

        Ok(connection)
    }

    /// Run one extraction
    ///
    /// # Errors
    /// Fails with [`ExtractError::MissingEntity`] before touching the config
    /// when the entity name is blank; otherwise with the error of the first
    /// stage that fails. Nothing is written unless the fetch succeeds.
    pub async fn run(&self, request: &ExtractRequest) -> Result<ExtractSummary, ExtractError> {
        let mut stage = Stage::Idle;
        let result = self.run_from(request, &mut stage).await;
        if let Err(err) = &result {
            log::warn!("Extraction of {} failed after stage {}", request.entity, stage);
            log::debug!("{}", err);
            advance(&mut stage, Stage::Failed);
        }
        result
    }

    async fn run_from(
        &self,
        request: &ExtractRequest,
        stage: &mut Stage,
    ) -> Result<ExtractSummary, ExtractError> {
        let spec = QuerySpec::new(request.entity.clone(), request.fields.clone())?;
        let path = request.output_path();

        let connection = self.connect_from(stage).await?;

        let records = RecordsExtractor::new(&connection, spec).fetch().await?;
        let records = FieldDropper::salesforce_metadata()
            .transform_many(records)
            .map_err(|e| FetchError::Execute {
                reason: e.to_string(),
            })?;
        advance(stage, Stage::Fetched);

        let count = records.len();
        CsvWriter::new(&path).write(&records)?;
        advance(stage, Stage::Written);

        log::info!("Wrote {} record(s) to {}", count, path.display());
        advance(stage, Stage::Done);

        Ok(ExtractSummary {
            entity: request.entity.clone(),
            path,
            records: count,
        })
    }
}

fn advance(stage: &mut Stage, next: Stage) {
    log::debug!("Extraction stage: {} -> {}", stage, next);
    *stage = next;
}

/// Fetch an entity's records and save them to CSV using `config.yml`
///
/// `fields` of `None` or an empty list selects every field; `file_name` of
/// `None` writes `<entity_name>.csv`.
pub async fn fetch_and_save(
    entity_name: &str,
    fields: Option<Vec<String>>,
    file_name: Option<&str>,
) -> Result<ExtractSummary, ExtractError> {
    let mut request = ExtractRequest::new(entity_name).fields(fields.unwrap_or_default());
    if let Some(file_name) = file_name {
        request = request.output(file_name);
    }

    Extraction::new(ConfigFile::new(DEFAULT_CONFIG_PATH), SalesforceLogin::new())
        .run(&request)
        .await
}
