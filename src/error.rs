use std::process::ExitCode;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DashboardError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error(
        "unable to establish connection to Kubernetes cluster\n# Kubernetes Context: {context}\n# Kubernetes URL: {url}\n# {reason}\n# Please check your kubernetes configuration and permissions"
    )]
    Connectivity {
        context: String,
        url: String,
        reason: String,
    },

    #[error("no matching {entity} found for filter '{filter}'")]
    NoMatches { entity: &'static str, filter: String },
}

impl DashboardError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 1,
            Self::Connectivity { .. } => 2,
            Self::NoMatches { .. } => 3,
        }
    }
}

pub fn exit_code_for(error: &anyhow::Error) -> ExitCode {
    let code = error
        .chain()
        .find_map(|cause| cause.downcast_ref::<DashboardError>())
        .map(DashboardError::exit_code)
        .unwrap_or(1);
    ExitCode::from(code)
}
