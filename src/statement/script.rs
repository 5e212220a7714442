use super::{StatementConfig, StatementError, StatementKind};
use crate::apply::ApplyRequest;
use crate::artist_store::ArtistProfile;

pub const APPLY_PATH: &str = "/v1/artists/apply";

/// Heredoc delimiter. Compact JSON is a single line starting with `{`, so it
/// can never collide with it.
const HEREDOC_TAG: &str = "JSON";

/// Quote for POSIX sh: single quotes, with embedded quotes as `'\''`.
fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// A POSIX shell script that POSTs the profile to the apply endpoint.
pub fn render_apply_script(
    profile: &ArtistProfile,
    kind: StatementKind,
    config: &StatementConfig,
) -> Result<String, StatementError> {
    let (exists, matched_id, action) = match kind {
        StatementKind::Insert => (false, None, "insert new artist".to_string()),
        StatementKind::Update { id } => (true, Some(id), format!("update artist {}", id)),
    };
    let request = ApplyRequest {
        profile: profile.clone(),
        exists,
        matched_id,
    };
    let body = serde_json::to_string(&request)
        .map_err(|e| StatementError::Serialization(e.to_string()))?;

    let url = format!(
        "{}{}",
        config.api_base_url.trim_end_matches('/'),
        APPLY_PATH
    );

    Ok(format!(
        "#!/bin/sh\n\
         # {action}\n\
         set -eu\n\
         curl -sS --fail-with-body -X POST {url} \\\n  \
         -H 'Content-Type: application/json' \\\n  \
         --data-binary @- <<'{tag}'\n\
         {body}\n\
         {tag}\n",
        action = action,
        url = shell_quote(&url),
        tag = HEREDOC_TAG,
        body = body,
    ))
}
