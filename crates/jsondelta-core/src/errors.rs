use thiserror::Error;

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Every failure class the differ can surface
///
/// Each kind maps to a stable error code that callers (rule loaders,
/// viewers, test suites) can match on without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Input
    /// A document is not valid UTF-8 JSON, or a rule list is malformed
    InvalidInput,

    // Configuration
    /// A rule names an operator the registry does not know
    UnknownOperator,
    /// An operator name was registered twice
    DuplicateOperator,
    /// A path pattern does not compile as a regular expression
    InvalidPattern,
    /// An operator parameter is missing or has the wrong type
    InvalidRuleParameter,

    // Matching
    /// A score matrix is ragged or holds negative / non-finite weights
    InvalidMatrix,

    // Comparison
    /// An operator failed while evaluating a level
    OperatorFailed,
    /// Scoring a level failed; carries the innermost failing level's paths
    ComparisonFailed,
    /// `diff()` was called on an engine that already ran
    EngineReused,

    // Integration
    Serialization,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Stable `ERR_*` code; never changes across releases
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::UnknownOperator => "ERR_UNKNOWN_OPERATOR",
            ExErrorKind::DuplicateOperator => "ERR_DUPLICATE_OPERATOR",
            ExErrorKind::InvalidPattern => "ERR_INVALID_PATTERN",
            ExErrorKind::InvalidRuleParameter => "ERR_INVALID_RULE_PARAMETER",
            ExErrorKind::InvalidMatrix => "ERR_INVALID_MATRIX",
            ExErrorKind::OperatorFailed => "ERR_OPERATOR_FAILED",
            ExErrorKind::ComparisonFailed => "ERR_COMPARISON_FAILED",
            ExErrorKind::EngineReused => "ERR_ENGINE_REUSED",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }

    /// True for kinds raised while building a rule set, before any run
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            ExErrorKind::UnknownOperator
                | ExErrorKind::DuplicateOperator
                | ExErrorKind::InvalidPattern
                | ExErrorKind::InvalidRuleParameter
        )
    }
}

/// Error value returned by every fallible differ operation
///
/// Classification fields support programmatic handling; the level context
/// (`left_path`, `right_path`, `drill`) is set on `ComparisonFailed`.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    operator: Option<String>,
    left_path: Option<String>,
    right_path: Option<String>,
    drill: Option<bool>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Bare error of `kind`; attach context with the `with_*` builders
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            operator: None,
            left_path: None,
            right_path: None,
            drill: None,
            message: String::new(),
            source: None,
        }
    }

    /// Name the operation that failed
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add operator name context
    pub fn with_operator(mut self, name: impl Into<String>) -> Self {
        self.operator = Some(name.into());
        self
    }

    /// Add the rendered left/right paths of the failing level
    pub fn with_paths(mut self, left: impl Into<String>, right: impl Into<String>) -> Self {
        self.left_path = Some(left.into());
        self.right_path = Some(right.into());
        self
    }

    /// Add the drill flag the failing evaluation ran under
    pub fn with_drill(mut self, drill: bool) -> Self {
        self.drill = Some(drill);
        self
    }

    /// Attach a human-readable detail
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Chain the underlying error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Failure class
    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Code of this error's kind
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Operation named by `with_op`
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Operator that raised the fault
    pub fn operator(&self) -> Option<&str> {
        self.operator.as_deref()
    }

    /// Left path of the innermost failing level
    pub fn left_path(&self) -> Option<&str> {
        self.left_path.as_deref()
    }

    /// Right path of the innermost failing level
    pub fn right_path(&self) -> Option<&str> {
        self.right_path.as_deref()
    }

    /// Whether the failing evaluation was a probe
    pub fn drill(&self) -> Option<bool> {
        self.drill
    }

    /// Detail text, empty when none was attached
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Wrapped error one level down
    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(operator) = &self.operator {
            write!(f, " (operator: {})", operator)?;
        }
        if let (Some(left), Some(right)) = (&self.left_path, &self.right_path) {
            write!(f, " (left_path: '{}', right_path: '{}')", left, right)?;
        }
        if let Some(drill) = self.drill {
            write!(f, " (drill: {})", drill)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Faults raised inside operators while evaluating a level
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OperatorError {
    /// A side the operator needs as a number is something else
    #[error("operator {operator} expected a number on the {side} side, got {found}")]
    NonNumericValue {
        operator: String,
        side: &'static str,
        found: String,
    },

    /// A required construction parameter is absent
    #[error("operator {operator} requires parameter `{parameter}`")]
    MissingParameter { operator: String, parameter: String },

    /// A construction parameter has the wrong JSON type
    #[error("operator {operator} parameter `{parameter}` must be {expected}")]
    InvalidParameter {
        operator: String,
        parameter: String,
        expected: &'static str,
    },
}

impl From<OperatorError> for ExError {
    fn from(err: OperatorError) -> Self {
        let message = err.to_string();
        match err {
            OperatorError::NonNumericValue { operator, .. } => {
                ExError::new(ExErrorKind::OperatorFailed)
                    .with_operator(operator)
                    .with_message(message)
            }
            OperatorError::MissingParameter { operator, .. }
            | OperatorError::InvalidParameter { operator, .. } => {
                ExError::new(ExErrorKind::InvalidRuleParameter)
                    .with_operator(operator)
                    .with_message(message)
            }
        }
    }
}

/// Conversion from serde_json::Error to ExError
impl From<serde_json::Error> for ExError {
    fn from(err: serde_json::Error) -> Self {
        ExError::new(ExErrorKind::Serialization).with_message(err.to_string())
    }
}
