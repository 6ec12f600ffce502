//! Data models for the curriculum graph client.
//!
//! This module contains the wire shapes returned by the curriculum API and the
//! derived structures used by the graph pipeline, dashboard aggregation, and
//! question verification features.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

// ============================================================================
// Graph Data Structures
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String, // "standard", "lesson", "question", or "article"
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub data: NodeData,
    // Layout fields, owned by the simulation while it runs. `fx`/`fy` pin a
    // node in place and are the only fields external code may set directly.
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fx: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fy: Option<f64>,
}

impl GraphNode {
    /// Label shown next to a node: standards show their code, lessons their
    /// title, everything else falls back to title, then type.
    pub fn display_label(&self) -> String {
        match self.node_type.as_str() {
            "standard" => self.data.code.clone().unwrap_or_else(|| self.id.clone()),
            "lesson" => self
                .data
                .title
                .clone()
                .unwrap_or_else(|| "Lesson".to_string()),
            _ => self
                .data
                .title
                .clone()
                .unwrap_or_else(|| self.node_type.clone()),
        }
    }
}

/// Per-node payload. The shape depends on the node type, so every field is
/// optional; unrecognized fields are preserved in `extra`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphLink {
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>, // rendered thickness weight
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub link_type: Option<String>,
}

/// Raw `/api/structure` payload. Both collections stay optional so the
/// pipeline, not the decoder, rejects malformed datasets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StructurePayload {
    #[serde(default)]
    pub nodes: Option<Vec<GraphNode>>,
    #[serde(default)]
    pub links: Option<Vec<GraphLink>>,
}

#[derive(Debug, Clone, Default)]
pub struct GraphDataset {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphLink>,
}

// ============================================================================
// Graph Filtering
// ============================================================================

/// Predicate narrowing the visible node subset. Filters compose with AND; the
/// standard-code rule matches both the standard node itself and the nodes
/// that belong to it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphFilter {
    pub standard_code: Option<String>,
    pub grade: Option<String>,
}

impl GraphFilter {
    pub fn is_empty(&self) -> bool {
        self.standard_code.is_none() && self.grade.is_none()
    }

    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(ref sc) = self.standard_code {
            parts.push(format!("standard={}", sc));
        }
        if let Some(ref g) = self.grade {
            parts.push(format!("grade={}", g));
        }
        if parts.is_empty() {
            "Full graph".to_string()
        } else {
            parts.join(", ")
        }
    }
}

/// Distinct values observed across a dataset, used to populate filter
/// controls. Recomputed every time a new dataset loads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterOptions {
    pub standards: Vec<String>,
    pub grades: Vec<String>,
}

impl FilterOptions {
    pub fn from_nodes(nodes: &[GraphNode]) -> Self {
        let mut standards = Vec::new();
        let mut grades = Vec::new();

        for node in nodes {
            if node.node_type == "standard" {
                if let Some(ref code) = node.data.code {
                    if !standards.contains(code) {
                        standards.push(code.clone());
                    }
                }
            }
            if let Some(ref grade) = node.data.grade {
                if !grades.contains(grade) {
                    grades.push(grade.clone());
                }
            }
        }

        standards.sort();
        grades.sort();
        Self { standards, grades }
    }
}

/// Counts describing the current render, surfaced in status displays.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphStats {
    pub total_nodes: usize,
    pub total_links: usize,
    pub rendered_nodes: usize,
    pub rendered_links: usize,
    pub capped_nodes: usize, // nodes dropped by the node ceiling
}

// ============================================================================
// Curriculum Data
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Standard {
    pub code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lesson {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sample_questions: Vec<String>,
}

// ============================================================================
// Dashboard Aggregation
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ChartBar {
    pub key: String,
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardStats {
    pub standard_count: usize,
    pub lesson_count: usize,
    pub question_count: usize,
    /// True when no lesson carried sample questions and the count is the
    /// 4-per-lesson estimate instead.
    pub questions_estimated: bool,
}

// ============================================================================
// Question Verification
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    #[serde(default, alias = "text")]
    pub question_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lesson_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Query parameters accepted by `/api/random-question`. Unset fields are
/// omitted from the request.
#[derive(Debug, Clone, Default)]
pub struct QuestionQuery {
    pub standard: Option<String>,
    pub lesson: Option<String>,
    pub difficulty: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonRef {
    pub id: String,
    pub title: String,
}

/// Filter values available for the verification view, keyed so the lesson
/// dropdown can repopulate when the standard selection changes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuestionFilters {
    #[serde(default)]
    pub standards: Vec<String>,
    #[serde(default)]
    pub lessons: HashMap<String, Vec<LessonRef>>,
    #[serde(default)]
    pub difficulties: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CriterionResult {
    pub pass: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerificationResult {
    #[serde(default)]
    pub overall_result: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default)]
    pub content: HashMap<String, CriterionResult>,
    #[serde(default)]
    pub format: HashMap<String, CriterionResult>,
    #[serde(default)]
    pub metadata: HashMap<String, CriterionResult>,
}

// ============================================================================
// Answer Choice Extraction
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Choice {
    pub label: String, // "A".."D", "TRUE"/"FALSE", or a bullet
    pub text: String,
    pub correct: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionMethod {
    LetterBullets,
    AnswerDesignation,
    Table,
    TrueFalse,
    Emphasis,
    NoChoices,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Confidence {
    Low,
    Medium,
    High,
}

/// Best-effort guess at the answer choices embedded in free-text question
/// bodies. This is an annotator, not a parser: the confidence tag is part of
/// the result and callers must treat low-confidence output as a hint.
#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceExtraction {
    pub choices: Vec<Choice>,
    pub method: ExtractionMethod,
    pub confidence: Confidence,
    pub correct_identified: bool,
}

impl ChoiceExtraction {
    pub fn none() -> Self {
        Self {
            choices: Vec::new(),
            method: ExtractionMethod::NoChoices,
            confidence: Confidence::Low,
            correct_identified: false,
        }
    }
}
