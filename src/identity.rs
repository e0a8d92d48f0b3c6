use std::fmt;

use crate::errors::PipelineError;

const MAX_USER_ID_LEN: usize = 128;

/// Characters an owner id may contain; the id is stored verbatim as the
/// first segment of every object key
fn is_user_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '@' | '+')
}

/// Authenticated caller, passed explicitly into every pipeline and store call
///
/// The only way to build one is through `Identity::new`, which rejects blank
/// ids and ids that cannot be used verbatim as a storage key segment, so
/// holding an `Identity` means the caller has a usable owner id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    user_id: String,
}

impl Identity {
    pub fn new(user_id: impl Into<String>) -> Result<Self, PipelineError> {
        let user_id = user_id.into().trim().to_string();
        if user_id.is_empty() {
            return Err(PipelineError::Unauthorized("missing caller identity".to_string()));
        }
        if user_id.len() > MAX_USER_ID_LEN || user_id.starts_with('.') || !user_id.chars().all(is_user_id_char) {
            return Err(PipelineError::Unauthorized(format!("malformed caller identity '{}'", user_id)));
        }
        Ok(Self { user_id })
    }

    /// Owner id used to scope records and stored objects
    pub fn user_id(&self) -> &str {
        &self.user_id
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.user_id)
    }
}
