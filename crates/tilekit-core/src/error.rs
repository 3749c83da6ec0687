use crate::WidgetId;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A position names a widget that is not resolvable when needed.
    #[error("widget {widget} has a bad layout reference to {reference}")]
    BadLayoutReference { widget: WidgetId, reference: String },

    #[error("dialog size {width}x{height} is outside (0.1, 1.0]")]
    InvalidDialogSize { width: f64, height: f64 },

    #[error("invalid dialog: {0}")]
    InvalidDialog(&'static str),

    /// Cloned subtrees may only contain relative references.
    #[error("cannot clone widget {widget}: layout refers to absolute widget {reference}")]
    InvalidClone { widget: WidgetId, reference: String },

    #[error("widget {0} not found")]
    WidgetNotFound(WidgetId),

    #[error("draw protocol could not measure label of widget {widget}: {label:?}")]
    DrawProtocolFailure { widget: WidgetId, label: String },

    #[error("invalid environment configuration: {0}")]
    InvalidConfig(String),

    #[error("environment configuration is not valid JSON")]
    Json(#[from] serde_json::Error),

    /// Error raised inside a screen, wrapped with the screen's name and a
    /// dump of its widget tree.
    #[error("{context}: '{name}', {source}\n{dump}")]
    Screen {
        context: &'static str,
        name: String,
        dump: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// The innermost error, skipping screen context wrappers.
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::Screen { source, .. } => source.root_cause(),
            other => other,
        }
    }

    pub fn is_wrapped(&self) -> bool {
        matches!(self, Error::Screen { .. })
    }
}
