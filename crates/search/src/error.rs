/// Failures talking to the external search tool.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("search tool unavailable: {0}")]
    Unavailable(String),

    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with status {code:?}: {stderr}")]
    ExitStatus {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("unparseable search output: {0}")]
    Parse(String),

    #[error("search timed out after {0} ms")]
    Timeout(u64),
}

impl From<SearchError> for mk_domain::error::Error {
    fn from(e: SearchError) -> Self {
        match e {
            SearchError::Timeout(ms) => Self::Timeout(format!("search after {ms} ms")),
            other => Self::Search(other.to_string()),
        }
    }
}
