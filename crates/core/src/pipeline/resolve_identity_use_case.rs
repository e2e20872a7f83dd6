use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use thiserror::Error;

use crate::alerting::domain::alert::Alert;
use crate::alerting::domain::alert_dispatcher::AlertDispatcher;
use crate::batch::batch_request::{BatchAck, ValidatedBatch};
use crate::consensus::domain::consensus_aggregator::{
    ConsensusAggregator, ConsensusDecision, ConsensusOutcome, ConsensusRule, IdentityScore,
};
use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::domain::face_embedder::FaceEmbedder;
use crate::grouping::domain::face_verifier::FaceVerifier;
use crate::grouping::domain::group_builder::GroupBuilder;
use crate::grouping::infrastructure::symmetric_verifier::SymmetricVerifier;
use crate::matching::domain::identity_matcher::IdentityMatcher;
use crate::matching::domain::reference_gallery::ReferenceGallery;
use crate::pipeline::batch_task::BatchTask;
use crate::pipeline::comparison_coordinator::ComparisonCoordinator;
use crate::pipeline::extraction_coordinator::ExtractionCoordinator;
use crate::pipeline::infrastructure::bounded_worker_pool::{BoundedWorkerPool, WorkerPoolError};
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::shared::engine_config::EngineConfig;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("parallel phase failed: {0}")]
    WorkerPool(#[from] WorkerPoolError),
}

/// What one batch produced, for callers and the task status.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub device_id: u64,
    pub decision: ConsensusDecision,
    pub frame_count: usize,
    pub face_count: usize,
    pub edge_count: usize,
    pub group_count: usize,
    pub candidate_count: usize,
    pub frames_without_faces: usize,
    pub detection_failures: usize,
    pub rejected_low_confidence: usize,
    pub embedding_failures: usize,
    pub incomparable_pairs: usize,
    pub verification_failures: usize,
    pub match_failures: usize,
    pub standings: Vec<IdentityScore>,
    /// `None` when no alert was warranted.
    pub alert_delivered: Option<bool>,
}

impl BatchReport {
    fn empty(batch: &ValidatedBatch) -> Self {
        Self {
            device_id: batch.device_id,
            decision: ConsensusDecision::NoMatch,
            frame_count: batch.frame_count(),
            face_count: 0,
            edge_count: 0,
            group_count: 0,
            candidate_count: 0,
            frames_without_faces: 0,
            detection_failures: 0,
            rejected_low_confidence: 0,
            embedding_failures: 0,
            incomparable_pairs: 0,
            verification_failures: 0,
            match_failures: 0,
            standings: Vec::new(),
            alert_delivered: None,
        }
    }
}

/// Resolves one batch of frames to a single identity decision.
///
/// extract → compare → group → match → aggregate → alert. The two
/// parallel phases each end in a full barrier; the rest runs on the
/// calling thread. Every collaborator failure is absorbed per item.
pub struct ResolveIdentityUseCase {
    detector: Arc<dyn FaceDetector>,
    embedder: Arc<dyn FaceEmbedder>,
    verifier: Arc<dyn FaceVerifier>,
    matcher: Arc<dyn IdentityMatcher>,
    dispatcher: Arc<dyn AlertDispatcher>,
    gallery: Arc<ReferenceGallery>,
    config: EngineConfig,
    logger: Box<dyn PipelineLogger>,
}

impl ResolveIdentityUseCase {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        detector: Arc<dyn FaceDetector>,
        embedder: Arc<dyn FaceEmbedder>,
        verifier: Arc<dyn FaceVerifier>,
        matcher: Arc<dyn IdentityMatcher>,
        dispatcher: Arc<dyn AlertDispatcher>,
        gallery: Arc<ReferenceGallery>,
        config: EngineConfig,
        logger: Box<dyn PipelineLogger>,
    ) -> Self {
        let verifier: Arc<dyn FaceVerifier> = if config.validate_symmetry {
            Arc::new(SymmetricVerifier::new(verifier))
        } else {
            verifier
        };
        Self {
            detector,
            embedder,
            verifier,
            matcher,
            dispatcher,
            gallery,
            config,
            logger,
        }
    }

    /// Acknowledges the batch and runs it on a background task.
    pub fn submit(mut self, task_id: u64, batch: ValidatedBatch) -> (BatchAck, BatchTask) {
        let ack = BatchAck::new(task_id, batch.frame_count());
        let task = BatchTask::spawn(task_id, move || {
            self.execute(&batch).map_err(|e| e.to_string())
        });
        (ack, task)
    }

    pub fn execute(&mut self, batch: &ValidatedBatch) -> Result<BatchReport, PipelineError> {
        let pool = BoundedWorkerPool::new(self.config.max_workers);
        let mut report = BatchReport::empty(batch);
        self.logger.info(&format!(
            "Resolving {} frame(s) from device {}",
            batch.frame_count(),
            batch.device_id
        ));

        let t = Instant::now();
        let extraction = ExtractionCoordinator::new(
            self.detector.as_ref(),
            self.embedder.as_ref(),
            self.config.min_face_confidence,
            &pool,
        )
        .extract(&batch.frames)?;
        self.logger.timing("extract", elapsed_ms(t));
        self.logger.metric("faces", extraction.faces.len() as f64);
        self.logger.metric(
            "rejected_low_confidence",
            extraction.rejected_low_confidence as f64,
        );
        report.face_count = extraction.faces.len();
        report.frames_without_faces = extraction.frames_without_faces;
        report.detection_failures = extraction.detection_failures;
        report.rejected_low_confidence = extraction.rejected_low_confidence;
        report.embedding_failures = extraction.embedding_failures;

        let faces = extraction.faces;
        if faces.is_empty() {
            self.logger.info("No faces extracted, nothing to match");
            self.logger.summary();
            return Ok(report);
        }

        let t = Instant::now();
        let comparison = ComparisonCoordinator::new(self.verifier.as_ref(), &pool).compare(&faces)?;
        self.logger.timing("compare", elapsed_ms(t));
        self.logger.metric("edges", comparison.edges.len() as f64);
        self.logger
            .metric("incomparable_pairs", comparison.incomparable_pairs as f64);
        report.edge_count = comparison.edges.len();
        report.incomparable_pairs = comparison.incomparable_pairs;
        report.verification_failures = comparison.verifier_failures;

        let t = Instant::now();
        let groups = GroupBuilder::build(faces.len(), &comparison.edges);
        self.logger.timing("group", elapsed_ms(t));
        self.logger.metric("groups", groups.len() as f64);
        report.group_count = groups.len();

        let t = Instant::now();
        let mut aggregator = ConsensusAggregator::new(ConsensusRule::new(
            self.config.min_evidence,
            self.config.trim_count,
        ));
        let mut queried = 0;
        for group in &groups {
            for &member in group.members() {
                queried += 1;
                self.logger.progress("match", queried, faces.len());
                match self.matcher.match_face(&faces[member]) {
                    Ok(candidates) => {
                        report.candidate_count += candidates.len();
                        aggregator.record(&candidates);
                    }
                    Err(e) if e.is_no_evidence() => {
                        log::debug!("Face {member}: {e}");
                    }
                    Err(e) => {
                        log::warn!("Face {member}: {e}");
                        report.match_failures += 1;
                    }
                }
            }
        }
        self.logger.timing("match", elapsed_ms(t));
        self.logger.metric("candidates", report.candidate_count as f64);

        let t = Instant::now();
        let outcome = aggregator.decide();
        self.logger.timing("aggregate", elapsed_ms(t));
        report.decision = outcome.decision;
        report.standings = outcome.standings.clone();

        if let ConsensusDecision::Match { identity_id, score } = outcome.decision {
            self.logger.info(&format!(
                "Identity {identity_id} matched with score {score:.4}"
            ));
            report.alert_delivered = Some(self.dispatch(batch, outcome));
        } else {
            self.logger.info("No identity passed the evidence gate");
        }

        self.logger.summary();
        Ok(report)
    }

    fn dispatch(&self, batch: &ValidatedBatch, outcome: ConsensusOutcome) -> bool {
        let ConsensusDecision::Match { identity_id, score } = outcome.decision else {
            return false;
        };
        let recipients = self.gallery.recipients_for(batch.device_id).to_vec();
        if recipients.is_empty() {
            log::warn!(
                "No recipients registered for device {}, alerting without addressees",
                batch.device_id
            );
        }
        let alert = Alert {
            identity_id,
            score,
            device_id: batch.device_id,
            channel: self.config.alert_channel,
            profile: self.gallery.profile(identity_id).cloned(),
            recipients,
            evidence_image: batch.evidence_image.clone(),
            evidence: outcome.scoreboard,
        };
        match self.dispatcher.notify(&alert) {
            Ok(()) => true,
            Err(e) => {
                log::error!("Alert for identity {identity_id} was not delivered: {e}");
                false
            }
        }
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}
