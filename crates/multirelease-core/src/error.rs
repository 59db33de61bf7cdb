use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown release type '{0}', expected one of: patch, minor, major")]
    ReleaseType(String),

    #[error("unknown release strategy '{0}', expected one of: patch, minor, major, inherit")]
    ReleaseStrategy(String),

    #[error("unknown bump strategy '{0}', expected one of: override, satisfy, inherit, ignore")]
    BumpStrategy(String),

    #[error("unknown scheduling strategy '{0}', expected one of: concurrent, batched")]
    Scheduling(String),
}
