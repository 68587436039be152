//! Error taxonomy for render attempts.

/// Errors surfaced by a render attempt.
///
/// The core performs no recovery or retry for any of these. Every failure
/// settles the attempt future consumers suspend on; a surrounding failure
/// boundary decides what to do with it. Variants carry rendered messages so
/// one terminal failure can be observed by both halves of a split payload
/// stream and by every clone of a shared attempt future.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    /// The request props could not be serialized into an identity.
    #[error("encoding failed: {0}")]
    Encoding(String),

    /// The network request failed or its body could not be read.
    #[error("transport failed: {0}")]
    Transport(String),

    /// The runtime adapter could not turn a payload into content.
    #[error("decoding failed: {0}")]
    Decoding(String),

    /// The context is not usable for a render attempt.
    #[error("configuration error: {0}")]
    Configuration(String),
}
