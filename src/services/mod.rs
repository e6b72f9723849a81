pub mod answer_assembler;
pub mod identity_reconciler;
pub mod region_segmenter;
pub mod review_writer;
pub mod scoring_engine;
pub mod similarity;
pub mod text_cleanup;

pub use answer_assembler::{AnswerAssembler, Assembly, AssemblyStatus};
pub use identity_reconciler::IdentityReconciler;
pub use region_segmenter::RegionSegmenter;
pub use review_writer::ReviewWriter;
pub use scoring_engine::{scale_score, ScoreOutcome, ScoreStatus, ScoringEngine};
