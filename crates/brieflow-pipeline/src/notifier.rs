// SPDX-FileCopyrightText: 2026 Brieflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound notifications: the signed webhook callback and the completion email.
//!
//! Nothing here ever fails a job. Rejected callback URLs produce zero
//! network calls; transport errors and non-2xx answers are logged.

use std::sync::Arc;

use brieflow_core::{EmailNotifier, JobId, JobStatus, WebhookTransport};
use brieflow_security::{CallbackPolicy, SIGNATURE_HEADER, sign_body};
use secrecy::SecretString;
use serde::Serialize;
use tracing::{debug, info, warn};

#[derive(Debug, Serialize)]
struct CallbackBody<'a> {
    #[serde(rename = "jobId")]
    job_id: &'a str,
    status: &'a str,
}

pub struct Notifier {
    transport: Arc<dyn WebhookTransport>,
    policy: CallbackPolicy,
    secret: Option<SecretString>,
    email: Option<Arc<dyn EmailNotifier>>,
}

impl Notifier {
    pub fn new(
        transport: Arc<dyn WebhookTransport>,
        policy: CallbackPolicy,
        secret: Option<SecretString>,
        email: Option<Arc<dyn EmailNotifier>>,
    ) -> Self {
        Self {
            transport,
            policy,
            secret,
            email,
        }
    }

    /// POSTs `{"jobId", "status"}` to `url` when it passes the callback policy.
    ///
    /// Only terminal statuses are reported. The body is signed with
    /// HMAC-SHA256 over its exact bytes in the `X-Brieflow-Signature` header.
    pub async fn notify_callback(&self, url: &str, job_id: &JobId, status: JobStatus) {
        let Some(label) = status.webhook_label() else {
            debug!(job_id = %job_id, status = %status, "status is not reported by webhook");
            return;
        };
        let target = match self.policy.check(url) {
            Ok(target) => target,
            Err(rejection) => {
                warn!(job_id = %job_id, reason = %rejection, "callback URL rejected");
                return;
            }
        };
        let Some(secret) = &self.secret else {
            warn!(job_id = %job_id, "no webhook secret configured, callback skipped");
            return;
        };
        let body = match serde_json::to_vec(&CallbackBody {
            job_id: job_id.as_str(),
            status: label,
        }) {
            Ok(body) => body,
            Err(e) => {
                warn!(job_id = %job_id, error = %e, "failed to encode callback body");
                return;
            }
        };
        let signature = match sign_body(secret, &body) {
            Ok(signature) => signature,
            Err(e) => {
                warn!(job_id = %job_id, error = %e, "callback signing failed, callback skipped");
                return;
            }
        };
        let headers = vec![(SIGNATURE_HEADER.to_string(), signature)];
        match self.transport.post(target.as_str(), body, headers).await {
            Ok(code) if (200..300).contains(&code) => {
                info!(job_id = %job_id, status = label, "callback delivered");
            }
            Ok(code) => {
                warn!(
                    job_id = %job_id,
                    http_status = code,
                    "callback answered with non-success status"
                );
            }
            Err(e) => warn!(job_id = %job_id, error = %e, "callback delivery failed"),
        }
    }

    /// Sends the completion email when SMTP is configured.
    pub async fn send_completion_email(
        &self,
        job_id: &JobId,
        to: &str,
        project_name: &str,
        location: &str,
    ) {
        let Some(email) = &self.email else {
            debug!(job_id = %job_id, "email not configured, skipping completion email");
            return;
        };
        let subject = format!("Your Brieflow brief for {project_name} is ready");
        let body = format!(
            "The brief for {project_name} (job {job_id}) has finished.\n\nResult: {location}\n"
        );
        match email.send(to, &subject, &body).await {
            Ok(()) => info!(job_id = %job_id, "completion email sent"),
            Err(e) => warn!(job_id = %job_id, error = %e, "completion email failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use brieflow_test_utils::{MockEmail, RecordingWebhookTransport};
    use hmac::{Hmac, Mac};
    use sha2::Sha256;
    use tracing_test::traced_test;

    use super::*;

    const ROUTE: &str = "/api/webhooks/brieflow";

    fn notifier(
        transport: Arc<RecordingWebhookTransport>,
        hosts: &[String],
        secret: Option<&str>,
    ) -> Notifier {
        Notifier::new(
            transport,
            CallbackPolicy::new(ROUTE, hosts),
            secret.map(SecretString::from),
            None,
        )
    }

    #[tokio::test]
    async fn compliant_url_gets_exactly_one_signed_post() {
        let transport = Arc::new(RecordingWebhookTransport::new());
        let notifier = notifier(transport.clone(), &["hooks.example.com".into()], Some("s3cret"));
        notifier
            .notify_callback(
                "https://hooks.example.com/api/webhooks/brieflow",
                &JobId("abc".into()),
                JobStatus::Succeeded,
            )
            .await;

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        let call = &calls[0];
        assert_eq!(call.body, br#"{"jobId":"abc","status":"completed"}"#);

        let mut mac = Hmac::<Sha256>::new_from_slice(b"s3cret").unwrap();
        mac.update(&call.body);
        let expected = hex::encode(mac.finalize().into_bytes());
        assert_eq!(call.header(SIGNATURE_HEADER), Some(expected.as_str()));
        // The transport owns the content type; the notifier only adds the signature.
        assert_eq!(call.headers.len(), 1);
    }

    #[tokio::test]
    #[traced_test]
    async fn non_compliant_urls_make_zero_calls() {
        let transport = Arc::new(RecordingWebhookTransport::new());
        let notifier = notifier(transport.clone(), &["hooks.example.com".into()], Some("s"));
        let job = JobId("abc".into());
        for url in [
            "not a url",
            "http://hooks.example.com/api/webhooks/brieflow",
            "https://hooks.example.com/api/webhooks/other",
            "https://evil.example.com/api/webhooks/brieflow",
            "https://user:pw@hooks.example.com/api/webhooks/brieflow",
        ] {
            notifier.notify_callback(url, &job, JobStatus::Failed).await;
        }
        assert!(transport.calls().is_empty());
        assert!(logs_contain("callback URL rejected"));
    }

    #[tokio::test]
    async fn empty_allow_list_accepts_any_https_host() {
        let transport = Arc::new(RecordingWebhookTransport::new());
        let notifier = notifier(transport.clone(), &[], Some("s"));
        notifier
            .notify_callback(
                "https://anywhere.example.org/api/webhooks/brieflow",
                &JobId("abc".into()),
                JobStatus::Failed,
            )
            .await;
        assert_eq!(transport.calls().len(), 1);
        assert_eq!(transport.calls()[0].json()["status"], "failed");
    }

    #[tokio::test]
    async fn non_terminal_status_and_missing_secret_are_skipped() {
        let transport = Arc::new(RecordingWebhookTransport::new());
        let url = "https://hooks.example.com/api/webhooks/brieflow";
        let job = JobId("abc".into());

        notifier(transport.clone(), &[], Some("s"))
            .notify_callback(url, &job, JobStatus::Running)
            .await;
        notifier(transport.clone(), &[], None)
            .notify_callback(url, &job, JobStatus::Succeeded)
            .await;
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn error_statuses_are_not_raised() {
        let transport = Arc::new(RecordingWebhookTransport::with_status(500));
        notifier(transport.clone(), &[], Some("s"))
            .notify_callback(
                "https://hooks.example.com/api/webhooks/brieflow",
                &JobId("abc".into()),
                JobStatus::Succeeded,
            )
            .await;
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test]
    async fn completion_email_is_best_effort() {
        let email = Arc::new(MockEmail::new());
        let notifier = Notifier::new(
            Arc::new(RecordingWebhookTransport::new()),
            CallbackPolicy::new(ROUTE, &[]),
            None,
            Some(email.clone()),
        );
        let job = JobId("abc".into());
        notifier
            .send_completion_email(&job, "ops@example.com", "Widget", "abc/bundle.json")
            .await;
        let sent = email.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].1.contains("Widget"));
        assert!(sent[0].2.contains("abc/bundle.json"));

        email.set_failing(true);
        notifier
            .send_completion_email(&job, "ops@example.com", "Widget", "abc/bundle.json")
            .await;
        assert_eq!(email.sent().len(), 1);
    }
}
