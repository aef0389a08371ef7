//! NATS publisher for assessment results

use anyhow::Result;
use async_nats::{Client, Subject};
use serde::Serialize;
use tracing::debug;

/// Sends responses back to requesters
#[derive(Clone)]
pub struct ResultProducer {
    client: Client,
    /// Fallback subject for requests published without a reply inbox
    result_subject: String,
}

impl ResultProducer {
    pub fn new(client: Client, result_subject: &str) -> Self {
        Self {
            client,
            result_subject: result_subject.to_string(),
        }
    }

    /// Publish a response to the reply inbox if there is one, otherwise to
    /// the result subject.
    pub async fn respond<T: Serialize>(&self, reply: Option<Subject>, response: &T) -> Result<()> {
        let payload = serde_json::to_vec(response)?;
        let subject = reply.unwrap_or_else(|| Subject::from(self.result_subject.as_str()));

        debug!(subject = %subject, bytes = payload.len(), "Publishing response");
        self.client.publish(subject, payload.into()).await?;

        Ok(())
    }

    pub fn result_subject(&self) -> &str {
        &self.result_subject
    }
}
