//! Curriculum graph client core.
//!
//! Fetches curriculum-standards data from a small REST API and turns it into
//! renderable graph and chart structures. The crate is organized into the
//! following modules:
//!
//! - `models`: Wire shapes and derived structures for graphs, dashboards,
//!   and question verification
//! - `fetch`: Memoized fetch layer with request coalescing over an
//!   injectable transport
//! - `api`: Typed client for the consumed endpoints
//! - `simulation`: Force-directed layout stepped from a frame callback
//! - `render`: Renderer capability trait plus the built-in SVG backend
//! - `pipeline`: Filtering, capping, and identity-preserving re-render
//! - `dashboard`: Bar-chart and summary aggregation
//! - `verification`: Best-effort answer-choice extraction from question text

pub mod api;
pub mod dashboard;
pub mod fetch;
pub mod models;
pub mod pipeline;
pub mod render;
pub mod simulation;
pub mod verification;

// ============================================================================
// Configuration
// ============================================================================

/// Default address of the curriculum API server.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5001";

// Re-export commonly used types
pub use models::{
    ChartBar, Choice, ChoiceExtraction, Confidence, CriterionResult, DashboardStats,
    ExtractionMethod, FilterOptions, GraphDataset, GraphFilter, GraphLink, GraphNode, GraphStats,
    Lesson, LessonRef, NodeData, Question, QuestionFilters, QuestionQuery, Standard,
    StructurePayload, VerificationResult,
};

pub use api::{ApiError, CurriculumApi};
pub use fetch::{FetchCache, FetchError, HttpTransport, RawResponse, Transport};
pub use pipeline::{DatasetError, GraphDataPipeline, MINI_NODE_CAP};
pub use render::{GraphRenderer, NullRenderer, SvgRenderer};
pub use simulation::{ForceSimulation, SimNode, SimulationParameters};
pub use verification::{display_metadata, extract_choices};

pub use dashboard::{lessons_per_grade, lessons_per_standard, summary_stats, MAX_CHART_BARS};
