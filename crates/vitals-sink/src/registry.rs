use crate::error::SinkError;
use crate::settings::RegistrySettings;
use serde::Deserialize;
use std::thread;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct RegisterResponse {
    id: u32,
}

/// Register `schema` under `subject` and return the registry's schema id.
/// Registering an identical schema again returns the existing id.
///
/// The request runs on its own thread: the blocking client owns a runtime
/// that must not be created or dropped inside an async context, and the
/// sink is built from within the simulator's runtime.
pub fn register_schema(
    settings: &RegistrySettings,
    subject: &str,
    schema: &str,
) -> Result<u32, SinkError> {
    thread::scope(|scope| {
        scope
            .spawn(|| post_schema(settings, subject, schema))
            .join()
            .unwrap_or_else(|_| Err(SinkError::Registry("registry client thread panicked".into())))
    })
}

fn post_schema(
    settings: &RegistrySettings,
    subject: &str,
    schema: &str,
) -> Result<u32, SinkError> {
    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .map_err(|e| SinkError::Registry(e.to_string()))?;

    let url = format!(
        "{}/subjects/{}/versions",
        settings.url.trim_end_matches('/'),
        subject
    );
    let mut request = client
        .post(&url)
        .header("Content-Type", "application/vnd.schemaregistry.v1+json")
        .body(serde_json::json!({ "schema": schema }).to_string());

    if let Some(user_info) = &settings.basic_auth_user_info {
        let (user, password) = user_info.split_once(':').unwrap_or((user_info, ""));
        request = request.basic_auth(user, Some(password));
    }
    if let Some(token) = &settings.bearer_auth_token {
        request = request.bearer_auth(token);
    }

    let response = request
        .send()
        .map_err(|e| SinkError::Registry(format!("POST {url}: {e}")))?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(SinkError::Registry(format!("POST {url}: {status}: {body}")));
    }
    let parsed: RegisterResponse = response
        .json()
        .map_err(|e| SinkError::Registry(e.to_string()))?;
    tracing::info!(subject, schema_id = parsed.id, "registered value schema");
    Ok(parsed.id)
}
