//! Wire payloads of the present-proof 2.0 protocol.
//!
//! Field names follow the DIDComm JSON conventions (`@type`, `@id`,
//! `~attach` suffixes, kebab-case `mime-type`). The `@type` of an outbound
//! payload is stamped by the executor right before it is sent, so callers
//! may leave it empty.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{
    ACK_MSG_TYPE, PRESENTATION_MIME_TYPE, PRESENTATION_MSG_TYPE, PROBLEM_REPORT_MSG_TYPE,
    PROPOSE_PRESENTATION_MSG_TYPE, REQUEST_PRESENTATION_MSG_TYPE,
};
use crate::credential::presentation::VerifiablePresentation;

/// Sent by the Verifier to ask for a presentation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestPresentation {
    #[serde(rename = "@type", default)]
    pub msg_type: String,

    #[serde(rename = "@id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub will_confirm: Option<bool>,

    #[serde(rename = "request_presentations~attach", default)]
    pub request_presentations_attach: Vec<Attachment>,
}

/// Sent by the Prover to counter-propose what it is willing to present.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProposePresentation {
    #[serde(rename = "@type", default)]
    pub msg_type: String,

    #[serde(rename = "@id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,

    #[serde(rename = "proposals~attach", default)]
    pub proposals_attach: Vec<Attachment>,
}

/// Sent by the Prover to fulfil a request.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Presentation {
    #[serde(rename = "@type", default)]
    pub msg_type: String,

    #[serde(rename = "@id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,

    #[serde(rename = "presentations~attach", default)]
    pub presentations_attach: Vec<Attachment>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(rename = "@id")]
    pub id: String,

    #[serde(rename = "mime-type", default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,

    pub data: AttachmentData,
}

/// Exactly one of the fields is expected to be set.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AttachmentData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base64: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json: Option<Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProblemReport {
    #[serde(rename = "@type")]
    pub msg_type: String,
    pub description: Code,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Code {
    pub code: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ack {
    #[serde(rename = "@type")]
    pub msg_type: String,
}

impl RequestPresentation {
    pub fn new(attachments: Vec<Attachment>) -> Self {
        Self {
            msg_type: REQUEST_PRESENTATION_MSG_TYPE.to_string(),
            request_presentations_attach: attachments,
            ..Default::default()
        }
    }
}

impl ProposePresentation {
    pub fn new(attachments: Vec<Attachment>) -> Self {
        Self {
            msg_type: PROPOSE_PRESENTATION_MSG_TYPE.to_string(),
            proposals_attach: attachments,
            ..Default::default()
        }
    }
}

impl Presentation {
    pub fn new(attachments: Vec<Attachment>) -> Self {
        Self {
            msg_type: PRESENTATION_MSG_TYPE.to_string(),
            presentations_attach: attachments,
            ..Default::default()
        }
    }
}

impl ProblemReport {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            msg_type: PROBLEM_REPORT_MSG_TYPE.to_string(),
            description: Code { code: code.into() },
        }
    }
}

impl Ack {
    pub fn new() -> Self {
        Self {
            msg_type: ACK_MSG_TYPE.to_string(),
        }
    }
}

impl Default for Ack {
    fn default() -> Self {
        Self::new()
    }
}

impl Attachment {
    /// Base64 attachment carrying a serialized presentation.
    pub fn from_presentation(vp: &VerifiablePresentation) -> Result<Self, serde_json::Error> {
        let raw = serde_json::to_vec(vp)?;
        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            mime_type: Some(PRESENTATION_MIME_TYPE.to_string()),
            data: AttachmentData {
                base64: Some(BASE64.encode(raw)),
                ..Default::default()
            },
        })
    }

    /// Attachment pointing at externally hosted data.
    pub fn from_links(links: Vec<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            mime_type: None,
            data: AttachmentData {
                links,
                ..Default::default()
            },
        }
    }

    /// Attachment carrying inline JSON, typically a presentation
    /// definition inside a request or proposal.
    pub fn from_json(value: Value) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            mime_type: Some("application/json".to_string()),
            data: AttachmentData {
                json: Some(value),
                ..Default::default()
            },
        }
    }
}
