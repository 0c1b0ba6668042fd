//! # Agents & Scenarios
//!
//! A Verifier and a Prover, each a [`Service`] with an inbox on the
//! loopback hub. Inbound messages are handled on their own tasks, so
//! conversations progress concurrently; the service serialises the steps
//! of any single conversation.
//!
//! What each agent contributes to a step is decided by a [`Responder`]:
//! the Verifier re-issues its request when it gets a counter-proposal, the
//! Prover answers according to the selected [`Scenario`].

use anyhow::{Context, Result};
use dashmap::DashSet;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use presentproof_protocol::config::{PROPOSE_PRESENTATION_MSG_TYPE, REQUEST_PRESENTATION_MSG_TYPE};
use presentproof_protocol::credential::VerifiablePresentation;
use presentproof_protocol::crypto::Keypair;
use presentproof_protocol::didcomm::DidCommMsg;
use presentproof_protocol::identity::{Did, DidDocument, InMemoryResolver, KeyResolver};
use presentproof_protocol::presentproof::{
    Attachment, Continuation, Presentation, ProposePresentation, ProtocolState,
    RequestPresentation, Service,
};

use crate::cli::Scenario;
use crate::loopback::{Envelope, LoopbackHub, LoopbackMessenger};

/// Decides what the local party adds to a conversation step.
pub trait Responder: Send + Sync {
    fn respond(&self, msg: &DidCommMsg) -> Continuation;
}

// ---------------------------------------------------------------------------
// Responders
// ---------------------------------------------------------------------------

/// Re-issues the request whenever the Prover counter-proposes.
pub struct VerifierResponder;

impl Responder for VerifierResponder {
    fn respond(&self, msg: &DidCommMsg) -> Continuation {
        match msg.msg_type() {
            Some(PROPOSE_PRESENTATION_MSG_TYPE) => Continuation::request(age_request()),
            _ => Continuation::default(),
        }
    }
}

pub struct ProverResponder {
    scenario: Scenario,
    presentation: Presentation,
    tampered: Presentation,
    /// Threads in which a proposal has already been made.
    proposed: DashSet<String>,
}

impl ProverResponder {
    pub fn new(scenario: Scenario, holder: &Did, keypair: &Keypair) -> Result<Self> {
        let vp = signed_presentation(holder, keypair)?;

        let mut altered = vp.clone();
        if let Some(subject) = altered
            .verifiable_credential
            .first_mut()
            .and_then(|vc| vc.get_mut("credentialSubject"))
        {
            subject["age"] = json!(17);
        }

        Ok(Self {
            scenario,
            presentation: Presentation::new(vec![
                Attachment::from_presentation(&vp).context("encoding presentation")?,
            ]),
            tampered: Presentation::new(vec![
                Attachment::from_presentation(&altered).context("encoding presentation")?,
            ]),
            proposed: DashSet::new(),
        })
    }
}

impl Responder for ProverResponder {
    fn respond(&self, msg: &DidCommMsg) -> Continuation {
        if msg.msg_type() != Some(REQUEST_PRESENTATION_MSG_TYPE) {
            return Continuation::default();
        }

        match self.scenario {
            Scenario::Accept => Continuation::present(self.presentation.clone()),
            Scenario::Tamper => Continuation::present(self.tampered.clone()),
            Scenario::Reject => Continuation::stop("holder declined the request"),
            Scenario::Propose => {
                let thread = msg.thread_id().unwrap_or_default();
                if self.proposed.insert(thread) {
                    Continuation::propose(ProposePresentation::new(vec![Attachment::from_json(
                        json!({"input_descriptors": [{"id": "age_over_18"}]}),
                    )]))
                } else {
                    Continuation::present(self.presentation.clone())
                }
            }
        }
    }
}

fn age_request() -> RequestPresentation {
    let mut request = RequestPresentation::new(vec![Attachment::from_json(json!({
        "input_descriptors": [{"id": "age", "purpose": "Prove your age"}]
    }))]);
    request.comment = Some("age check".to_string());
    request
}

fn signed_presentation(holder: &Did, keypair: &Keypair) -> Result<VerifiablePresentation> {
    let holder = holder.to_string();
    let mut vp = VerifiablePresentation::new(
        &holder,
        vec![json!({
            "@context": ["https://www.w3.org/2018/credentials/v1"],
            "type": ["VerifiableCredential", "AgeCredential"],
            "issuer": "did:example:registry",
            "issuanceDate": chrono::Utc::now().to_rfc3339(),
            "credentialSubject": {"id": holder, "age": 34}
        })],
    );
    vp.sign(keypair, &format!("{holder}#key-1"), None)
        .context("signing presentation")?;
    Ok(vp)
}

// ---------------------------------------------------------------------------
// Agents
// ---------------------------------------------------------------------------

/// One party: its DID, its service and the task draining its inbox.
pub struct Agent {
    pub did: String,
    pub service: Arc<Service>,
    inbox: JoinHandle<()>,
}

impl Agent {
    pub fn spawn(
        did: &Did,
        hub: &Arc<LoopbackHub>,
        resolver: Arc<dyn KeyResolver>,
        responder: Arc<dyn Responder>,
    ) -> Self {
        let did = did.to_string();
        let rx = hub.register(&did);
        let service = Arc::new(Service::new(
            Arc::new(LoopbackMessenger::new(Arc::clone(hub))),
            resolver,
        ));
        let inbox = tokio::spawn(drain_inbox(rx, Arc::clone(&service), responder));

        Self {
            did,
            service,
            inbox,
        }
    }

    /// Whether every listed conversation has reached `done`.
    pub async fn all_done(&self, thread_ids: &[String]) -> bool {
        for thread_id in thread_ids {
            match self.service.state(thread_id).await {
                Ok(ProtocolState::Done) => {}
                _ => return false,
            }
        }
        true
    }

    pub fn shutdown(self) {
        self.inbox.abort();
    }
}

async fn drain_inbox(
    mut rx: mpsc::UnboundedReceiver<Envelope>,
    service: Arc<Service>,
    responder: Arc<dyn Responder>,
) {
    while let Some(envelope) = rx.recv().await {
        let service = Arc::clone(&service);
        let continuation = responder.respond(&envelope.msg);
        tokio::spawn(async move {
            let msg_type = envelope.msg.msg_type().unwrap_or_default().to_string();
            match service
                .handle_inbound(envelope.msg, &envelope.to, &envelope.from, continuation)
                .await
            {
                Ok(state) => tracing::debug!(%msg_type, %state, "inbound handled"),
                Err(e) => tracing::warn!(%msg_type, error = %e, "inbound rejected"),
            }
        });
    }
}

// ---------------------------------------------------------------------------
// Scenario runner
// ---------------------------------------------------------------------------

/// Outcome of one batch run.
#[derive(Debug)]
pub struct Report {
    pub scenario: Scenario,
    pub conversations: usize,
    pub settled: bool,
    pub verifier_done: usize,
    pub prover_done: usize,
    pub acks: usize,
    pub problem_reports: usize,
    pub elapsed_ms: u128,
}

impl Report {
    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "scenario": format!("{:?}", self.scenario).to_lowercase(),
            "conversations": self.conversations,
            "settled": self.settled,
            "verifier_done": self.verifier_done,
            "prover_done": self.prover_done,
            "acks": self.acks,
            "problem_reports": self.problem_reports,
            "elapsed_ms": self.elapsed_ms,
        })
    }
}

/// Key material for both parties.
pub struct Parties {
    pub verifier: Keypair,
    pub prover: Keypair,
}

/// Run `conversations` exchanges under `scenario` and wait up to `timeout`
/// for all of them to settle.
pub async fn run_scenario(
    scenario: Scenario,
    conversations: usize,
    parties: Parties,
    timeout: Duration,
) -> Result<Report> {
    let started = std::time::Instant::now();

    let verifier_did = Did::new("key", &parties.verifier.public_key().to_multibase())?;
    let prover_did = Did::new("key", &parties.prover.public_key().to_multibase())?;

    let resolver = Arc::new(InMemoryResolver::new());
    resolver.register(DidDocument::for_key(&verifier_did, &parties.verifier.public_key()))?;
    resolver.register(DidDocument::for_key(&prover_did, &parties.prover.public_key()))?;

    let hub = LoopbackHub::new();
    let verifier = Agent::spawn(
        &verifier_did,
        &hub,
        resolver.clone(),
        Arc::new(VerifierResponder),
    );
    let prover = Agent::spawn(
        &prover_did,
        &hub,
        resolver,
        Arc::new(ProverResponder::new(scenario, &prover_did, &parties.prover)?),
    );

    tracing::info!(
        verifier = %verifier.did,
        prover = %prover.did,
        ?scenario,
        conversations,
        "starting conversations"
    );

    let starts = (0..conversations).map(|_| {
        let request = DidCommMsg::from_payload(&age_request());
        let verifier = &verifier;
        let prover_did = &prover.did;
        async move {
            let request = request.context("building request")?;
            verifier
                .service
                .handle_outbound(request, &verifier.did, prover_did)
                .await
                .context("starting conversation")
        }
    });
    let thread_ids = futures::future::join_all(starts)
        .await
        .into_iter()
        .collect::<Result<Vec<String>>>()?;

    let settled = tokio::time::timeout(timeout, async {
        loop {
            if verifier.all_done(&thread_ids).await && prover.all_done(&thread_ids).await {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .is_ok();

    if !settled {
        tracing::warn!(timeout_ms = timeout.as_millis() as u64, "conversations did not settle");
    }

    let mut verifier_done = 0;
    let mut prover_done = 0;
    for thread_id in &thread_ids {
        if matches!(verifier.service.state(thread_id).await, Ok(ProtocolState::Done)) {
            verifier_done += 1;
        }
        if matches!(prover.service.state(thread_id).await, Ok(ProtocolState::Done)) {
            prover_done += 1;
        }
    }

    let report = Report {
        scenario,
        conversations,
        settled,
        verifier_done,
        prover_done,
        acks: hub.delivered(presentproof_protocol::config::ACK_MSG_TYPE),
        problem_reports: hub.delivered(presentproof_protocol::config::PROBLEM_REPORT_MSG_TYPE),
        elapsed_ms: started.elapsed().as_millis(),
    };

    verifier.shutdown();
    prover.shutdown();
    Ok(report)
}
