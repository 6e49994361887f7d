// /////////////////////////////////////////////////////////////////////////////
// Strongbox
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Query Vocabulary
//!
//! The data types a query plan is made of. The fluent builder that produces
//! a [`QueryPlan`] and the executor that runs one against a
//! [`crate::adapter::StorageAdapter`] both live in the engine crate; this
//! module only fixes the shared vocabulary so the two halves agree on shape.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryOperator {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    Like,
    In,
    Between,
    IsNull,
    IsNotNull,
    Raw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicalOperator {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggregateKind {
    Count,
    Sum,
    Avg,
    Min,
    Max,
    GroupConcat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinType {
    Inner,
    Left,
}

/// A single filter condition. `field` may name a JSON path with the
/// `json:path.to.field` prefix convention, resolved by dotted navigation
/// into the stored value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryCondition {
    pub field: String,
    pub operator: QueryOperator,
    pub value: Value,
    pub logical_operator: LogicalOperator,
    pub negated: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinClause {
    pub collection: String,
    pub left_field: String,
    pub operator: QueryOperator,
    pub right_field: String,
    pub join_type: JoinType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderClause {
    pub field: String,
    pub direction: OrderDirection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateClause {
    pub kind: AggregateKind,
    pub field: String,
    pub alias: Option<String>,
}

/// The fully-built query plan a builder hands to an executor.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct QueryPlan {
    pub collection: String,
    pub conditions: Vec<QueryCondition>,
    pub joins: Vec<JoinClause>,
    pub order_by: Vec<OrderClause>,
    pub group_by: Vec<String>,
    pub having: Vec<QueryCondition>,
    pub select_fields: Vec<String>,
    pub aggregates: Vec<AggregateClause>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    pub use_cache: bool,
}

impl Default for QueryCondition {
    fn default() -> Self {
        Self {
            field: String::new(),
            operator: QueryOperator::Eq,
            value: Value::Null,
            logical_operator: LogicalOperator::And,
            negated: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResultMetadata {
    pub total: u64,
    pub from_cache: bool,
    pub execution_time_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    pub data: Vec<Value>,
    pub metadata: QueryResultMetadata,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryComplexity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryExplainReport {
    pub collection: String,
    pub conditions: usize,
    pub estimated_cost: u64,
    pub estimated_complexity: QueryComplexity,
    pub supports_indexes: bool,
    pub recommended_indexes: Vec<String>,
}

/// Scores plan complexity per the formula in the query builder's design
/// notes: `conditions + 3*joins + 2*aggregates + 2*group_by`, bucketed into
/// low (<=3) / medium (<=10) / high.
pub fn score_complexity(plan: &QueryPlan) -> (u64, QueryComplexity) {
    let score = plan.conditions.len() as u64
        + 3 * plan.joins.len() as u64
        + 2 * plan.aggregates.len() as u64
        + 2 * plan.group_by.len() as u64;
    let bucket = if score <= 3 {
        QueryComplexity::Low
    } else if score <= 10 {
        QueryComplexity::Medium
    } else {
        QueryComplexity::High
    };
    (score, bucket)
}
