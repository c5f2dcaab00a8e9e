//! Error type shared by graph construction, configuration and colour parsing.

/// Result alias used throughout the engine.
pub type MindGraphResult<T> = Result<T, MindGraphError>;

/// Failures raised while building a scene.
///
/// Everything here is a construction-time failure; the frame loop itself never
/// returns errors.
#[derive(thiserror::Error, Debug)]
pub enum MindGraphError {
	/// A link names a node id that is not part of the payload.
	#[error("link {link} references unknown node '{id}'")]
	UnknownNode { link: usize, id: String },

	/// Two payload nodes share the same id.
	#[error("duplicate node id '{0}'")]
	DuplicateNode(String),

	/// A configuration value is outside its accepted range.
	#[error("invalid config: {0}")]
	InvalidConfig(String),

	/// An id cannot be encoded into a 24-bit colour key.
	#[error("colour key {0} is outside 1..=16777215")]
	ColorKeyOutOfRange(u32),

	/// A colour string could not be parsed.
	#[error("invalid colour '{0}'")]
	InvalidColor(String),

	/// Payload or config JSON failed to deserialize.
	#[error(transparent)]
	Json(#[from] serde_json::Error),
}

impl MindGraphError {
	pub(crate) fn invalid_config(msg: impl Into<String>) -> Self {
		Self::InvalidConfig(msg.into())
	}
}
