//! OSCAL System Security Plan helpers
//!
//! Root-key validation for incoming SSPs and construction of the SSP a new
//! tenant or procedure starts from.

use crate::error::{Error, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Map, Value};
use tracing::{debug, warn};
use uuid::Uuid;

/// Root key every SSP document must carry
pub const SSP_ROOT_KEY: &str = "system-security-plan";

/// OSCAL version stamped into generated SSPs
pub const OSCAL_VERSION: &str = "1.1.2";

/// Reject a document that lacks an object under [`SSP_ROOT_KEY`]
pub fn require_ssp_root(doc: &Value) -> Result<()> {
    match doc.get(SSP_ROOT_KEY) {
        Some(Value::Object(_)) => Ok(()),
        _ => Err(Error::ValidationFailed(format!(
            "missing '{SSP_ROOT_KEY}' root"
        ))),
    }
}

fn ropa_props() -> Value {
    json!([
        { "name": "ropa:purpose", "value": "<purpose(s)>" },
        { "name": "ropa:data-categories", "value": "<categories of personal data>" },
        { "name": "ropa:data-subjects", "value": "<data subject categories>" },
        { "name": "ropa:recipients", "value": "<recipients/categories>" },
        { "name": "ropa:third-country-transfers", "value": "<No/Yes – legal basis>" },
        { "name": "ropa:retention", "value": "<retention/erasure periods>" },
        { "name": "ropa:legal-basis", "value": "<Art. 6 GDPR / sector law>" }
    ])
}

fn system_characteristics() -> Value {
    json!({
        "system-ids": [{
            "identifier-type": "https://ietf.org/rfc/rfc4122",
            "id": format!("urn:uuid:{}", Uuid::new_v4())
        }],
        "system-name": "Processing activity – <Title>",
        "system-name-short": "PA-<Short>",
        "description": "Short description of the processing, purpose, legal basis, data subjects/data categories.",
        "status": { "state": "operational" },
        "security-sensitivity-level": "moderate",
        "system-information": {
            "information-types": [
                { "title": "Personal data (GDPR)", "description": "Typical RoPA categories." }
            ]
        },
        "props": ropa_props(),
        "authorization-boundary": { "description": "Scope and boundary of the processing environment." }
    })
}

fn set_default(map: &mut Map<String, Value>, key: &str, value: impl FnOnce() -> Value) {
    if map.get(key).is_none_or(Value::is_null) {
        map.insert(key.to_string(), value());
    }
}

/// Build a complete SSP from an optional template
///
/// Sections missing from the template are filled with placeholders;
/// `profile_href` becomes the `import-profile` unless the template already
/// names one. Without a usable template a minimal SSP is generated.
pub fn complete_ssp(template: Option<Value>, profile_href: Option<&str>, now: DateTime<Utc>) -> Value {
    let mut root = match template {
        Some(doc) if require_ssp_root(&doc).is_ok() => doc,
        _ => json!({
            SSP_ROOT_KEY: {
                "metadata": {
                    "title": "SSP (RoPA) – Template",
                    "version": "0.1.0"
                }
            }
        }),
    };

    if let Some(Value::Object(ssp)) = root.get_mut(SSP_ROOT_KEY) {
        set_default(ssp, "uuid", || json!(Uuid::new_v4().to_string()));

        if let Some(href) = profile_href {
            set_default(ssp, "import-profile", || json!({ "href": href }));
        }

        set_default(ssp, "metadata", || json!({}));
        if let Some(Value::Object(metadata)) = ssp.get_mut("metadata") {
            set_default(metadata, "oscal-version", || json!(OSCAL_VERSION));
            set_default(metadata, "last-modified", || {
                json!(now.to_rfc3339_opts(SecondsFormat::Millis, true))
            });
        }

        set_default(ssp, "system-characteristics", system_characteristics);
        set_default(ssp, "system-implementation", || {
            json!({ "users": [], "components": [] })
        });
        set_default(ssp, "control-implementation", || {
            json!({
                "description": "Implementation of controls per profile/catalog; reference components and evidence.",
                "implemented-requirements": []
            })
        });
        set_default(ssp, "back-matter", || json!({ "resources": [] }));
    }

    root
}

/// Fetch a JSON SSP template; failures fall back to `None`
pub async fn fetch_template(client: &reqwest::Client, href: &str) -> Option<Value> {
    debug!(href, "fetching SSP template");
    let resp = match client.get(href).send().await {
        Ok(resp) if resp.status().is_success() => resp,
        Ok(resp) => {
            warn!(href, status = %resp.status(), "SSP template unavailable");
            return None;
        }
        Err(e) => {
            warn!(href, error = %e, "SSP template unavailable");
            return None;
        }
    };

    match resp.json::<Value>().await {
        Ok(doc) if require_ssp_root(&doc).is_ok() => Some(doc),
        _ => {
            warn!(href, "SSP template has no '{SSP_ROOT_KEY}' root");
            None
        }
    }
}

/// Build the SSP template, starting from `template_href` when configured
pub async fn ssp_template(
    client: &reqwest::Client,
    template_href: Option<&str>,
    profile_href: Option<&str>,
    now: DateTime<Utc>,
) -> Value {
    let template = match template_href {
        Some(href) => fetch_template(client, href).await,
        None => None,
    };
    complete_ssp(template, profile_href, now)
}
