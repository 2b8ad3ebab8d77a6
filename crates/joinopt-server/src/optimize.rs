//! # Predicate Reordering Endpoint
//!
//! The request carries everything the optimizer needs for one query, so the service
//! needs no catalog of its own:
//!
//! - **Relations**: relation id plus `(low, high, rows, distinct)` per column.
//!   The position of a relation in the list is its binding.
//! - **Predicates**: the parsed FILTER / JOIN / SELFJOIN array, in parser order.
//!
//! The response carries the same predicates in execution order along with the cost
//! of the winning plan.
//!
//! ## Wire Protocol
//!
//! - Request: `POST /optimize/predicates` with JSON body (`OptimizeRequest`)
//! - Response: JSON body (`OptimizeResponse`)
//! - Validation failures (invalid statistics, unknown binding, column out of range,
//!   disconnected join graph, search limits) are answered with 400 and the error
//!   message.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use joinopt_core::catalog::InMemoryCatalog;
use joinopt_core::error::OptimizeError;
use joinopt_core::predicate::Predicate;
use joinopt_core::query::QueryInfo;
use joinopt_core::search::JoinEnumerator;
use joinopt_core::stats::ColumnStats;
use joinopt_core::RelationId;

use crate::state::AppState;

// ---------------------------------------------------------------------------
// JSON wire-protocol types
// ---------------------------------------------------------------------------

/// Request body for `POST /optimize/predicates`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizeRequest {
    /// Relations in binding order, with their baseline column statistics.
    pub relations: Vec<RelationInfo>,
    /// Predicates in parser order.
    #[serde(default)]
    pub predicates: Vec<Predicate>,
}

/// A relation of the query with its statistics.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationInfo {
    pub id: RelationId,
    /// One entry per column; column 0 is the probe column.
    pub columns: Vec<ColumnStats>,
}

/// Response body of `POST /optimize/predicates`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizeResponse {
    /// The request's predicates in execution order.
    pub predicates: Vec<Predicate>,
    /// Estimated cost of the chosen order.
    pub cost: f64,
    /// Connected relation subsets considered.
    pub subsets: usize,
    /// Candidate plans built.
    pub plans_built: usize,
}

// ---------------------------------------------------------------------------
// Handler
// ---------------------------------------------------------------------------

/// POST /optimize/predicates: reorder the predicates of one query.
pub async fn optimize_predicates(
    State(state): State<Arc<AppState>>,
    Json(req): Json<OptimizeRequest>,
) -> Result<Json<OptimizeResponse>, (StatusCode, String)> {
    let catalog = build_catalog(&req);
    let relations = req.relations.iter().map(|r| r.id).collect();
    let mut query = QueryInfo::new(relations, req.predicates);

    let report = JoinEnumerator::new(&catalog, state.config.search.clone())
        .optimize(&mut query)
        .map_err(reject)?;

    info!(
        "Optimized query: relations={}, predicates={}, cost={:.1}",
        query.relation_count(),
        query.predicate_count(),
        report.cost.total
    );

    Ok(Json(OptimizeResponse {
        predicates: query.predicates,
        cost: report.cost.total,
        subsets: report.subsets,
        plans_built: report.plans_built,
    }))
}

/// Build an InMemoryCatalog populated with the statistics carried by the request.
fn build_catalog(req: &OptimizeRequest) -> InMemoryCatalog {
    let mut catalog = InMemoryCatalog::new();
    for relation in &req.relations {
        catalog.add_relation(relation.id, relation.columns.clone());
    }
    catalog
}

fn reject(err: OptimizeError) -> (StatusCode, String) {
    warn!("Rejected optimization request: {}", err);
    (StatusCode::BAD_REQUEST, format!("Optimization failed: {}", err))
}
