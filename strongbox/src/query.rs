// /////////////////////////////////////////////////////////////////////////////
// Strongbox
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Fluent Query Builder
//!
//! Builds a [`QueryPlan`] and executes it against any [`StorageAdapter`] by
//! scanning the collection's key prefix, filtering/joining/grouping/sorting/
//! paginating in memory. There is no SQL pushdown: this keeps query semantics
//! identical across the memory and SQL adapters, at the cost of always
//! visiting every key under the collections involved.

use std::cmp::Ordering as CmpOrdering;
use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;

use strongbox_domain::adapter::StorageAdapter;
use strongbox_domain::error::StorageError;
use strongbox_domain::key::StorageKey;
use strongbox_domain::query::{
    score_complexity, AggregateClause, AggregateKind, JoinClause, JoinType, LogicalOperator, OrderClause,
    OrderDirection, QueryCondition, QueryExplainReport, QueryOperator, QueryPlan, QueryResult, QueryResultMetadata,
};

use crate::cache::Cache;

fn strip_json_prefix(field: &str) -> &str {
    field.strip_prefix("json:").unwrap_or(field)
}

fn resolve_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

fn compare_values(a: &Value, b: &Value) -> CmpOrdering {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => a
            .as_f64()
            .unwrap_or(0.0)
            .partial_cmp(&b.as_f64().unwrap_or(0.0))
            .unwrap_or(CmpOrdering::Equal),
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        _ => CmpOrdering::Equal,
    }
}

fn like_match(haystack: Option<&str>, pattern: &str) -> bool {
    let Some(haystack) = haystack else { return false };
    // SQL-style `%` wildcard only; `_` single-char wildcard is not supported.
    if let Some(needle) = pattern.strip_prefix('%').and_then(|p| p.strip_suffix('%')) {
        haystack.contains(needle)
    } else if let Some(needle) = pattern.strip_prefix('%') {
        haystack.ends_with(needle)
    } else if let Some(needle) = pattern.strip_suffix('%') {
        haystack.starts_with(needle)
    } else {
        haystack == pattern
    }
}

fn condition_matches(value: &Value, condition: &QueryCondition) -> bool {
    let field = resolve_path(value, strip_json_prefix(&condition.field));
    let result = match condition.operator {
        QueryOperator::Eq => field == Some(&condition.value),
        QueryOperator::Ne => field != Some(&condition.value),
        QueryOperator::Lt => field.is_some_and(|f| compare_values(f, &condition.value) == CmpOrdering::Less),
        QueryOperator::Lte => field.is_some_and(|f| compare_values(f, &condition.value) != CmpOrdering::Greater),
        QueryOperator::Gt => field.is_some_and(|f| compare_values(f, &condition.value) == CmpOrdering::Greater),
        QueryOperator::Gte => field.is_some_and(|f| compare_values(f, &condition.value) != CmpOrdering::Less),
        QueryOperator::Like => like_match(field.and_then(Value::as_str), condition.value.as_str().unwrap_or("")),
        QueryOperator::In => condition
            .value
            .as_array()
            .is_some_and(|arr| field.is_some_and(|f| arr.contains(f))),
        QueryOperator::Between => condition.value.as_array().is_some_and(|bounds| {
            bounds.len() == 2
                && field.is_some_and(|f| {
                    compare_values(f, &bounds[0]) != CmpOrdering::Less
                        && compare_values(f, &bounds[1]) != CmpOrdering::Greater
                })
        }),
        QueryOperator::IsNull => field.is_none_or(|f| f.is_null()),
        QueryOperator::IsNotNull => field.is_some_and(|f| !f.is_null()),
        QueryOperator::Raw => true,
    };
    if condition.negated {
        !result
    } else {
        result
    }
}

fn evaluate_conditions(value: &Value, conditions: &[QueryCondition]) -> bool {
    let mut acc: Option<bool> = None;
    for condition in conditions {
        let r = condition_matches(value, condition);
        acc = Some(match acc {
            None => r,
            Some(prev) => match condition.logical_operator {
                LogicalOperator::And => prev && r,
                LogicalOperator::Or => prev || r,
            },
        });
    }
    acc.unwrap_or(true)
}

fn apply_aggregates(rows: &[Value], aggregates: &[AggregateClause]) -> Value {
    let mut out = serde_json::Map::new();
    for agg in aggregates {
        let field_values: Vec<&Value> = rows.iter().filter_map(|r| resolve_path(r, &agg.field)).collect();
        let key = agg.alias.clone().unwrap_or_else(|| format!("{:?}_{}", agg.kind, agg.field));
        let value = match agg.kind {
            AggregateKind::Count => Value::from(rows.len() as u64),
            AggregateKind::Sum => Value::from(field_values.iter().filter_map(|v| v.as_f64()).sum::<f64>()),
            AggregateKind::Avg => {
                let nums: Vec<f64> = field_values.iter().filter_map(|v| v.as_f64()).collect();
                if nums.is_empty() {
                    Value::Null
                } else {
                    Value::from(nums.iter().sum::<f64>() / nums.len() as f64)
                }
            }
            AggregateKind::Min => field_values
                .iter()
                .filter_map(|v| v.as_f64())
                .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.min(v))))
                .map(Value::from)
                .unwrap_or(Value::Null),
            AggregateKind::Max => field_values
                .iter()
                .filter_map(|v| v.as_f64())
                .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))))
                .map(Value::from)
                .unwrap_or(Value::Null),
            AggregateKind::GroupConcat => {
                let joined = field_values
                    .iter()
                    .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
                    .collect::<Vec<_>>()
                    .join(",");
                Value::String(joined)
            }
        };
        out.insert(key, value);
    }
    Value::Object(out)
}

fn project(value: &Value, fields: &[String]) -> Value {
    if fields.is_empty() {
        return value.clone();
    }
    let mut out = serde_json::Map::new();
    for field in fields {
        if let Some(v) = resolve_path(value, field) {
            out.insert(field.clone(), v.clone());
        }
    }
    Value::Object(out)
}

/// Fluent builder over a [`QueryPlan`]; call [`QueryBuilder::execute`] to run
/// it or [`QueryBuilder::explain`] to see the plan's estimated cost without
/// running it.
#[derive(Clone)]
pub struct QueryBuilder {
    adapter: Arc<dyn StorageAdapter>,
    cache: Option<Arc<Cache>>,
    plan: QueryPlan,
    /// One-shot state consumed by the next `.condition()` call, set by
    /// `.or()`/`.not()`. Resets to `And`/`false` every time a condition is
    /// actually appended.
    next_logical_operator: LogicalOperator,
    next_negated: bool,
}

impl QueryBuilder {
    pub fn new(adapter: Arc<dyn StorageAdapter>, collection: impl Into<String>) -> Self {
        Self {
            adapter,
            cache: None,
            plan: QueryPlan {
                collection: collection.into(),
                ..QueryPlan::default()
            },
            next_logical_operator: LogicalOperator::And,
            next_negated: false,
        }
    }

    pub fn with_cache(mut self, cache: Arc<Cache>) -> Self {
        self.cache = Some(cache);
        self.plan.use_cache = true;
        self
    }

    pub fn filter(mut self, condition: QueryCondition) -> Self {
        self.plan.conditions.push(condition);
        self
    }

    /// Convenience over [`QueryBuilder::filter`]: builds the condition from
    /// its parts, applying whatever logical operator/negation `.and()`/
    /// `.or()`/`.not()` set for this one condition.
    pub fn condition(mut self, field: impl Into<String>, operator: QueryOperator, value: Value) -> Self {
        let condition = QueryCondition {
            field: field.into(),
            operator,
            value,
            logical_operator: self.next_logical_operator,
            negated: self.next_negated,
        };
        self.next_logical_operator = LogicalOperator::And;
        self.next_negated = false;
        self.plan.conditions.push(condition);
        self
    }

    /// Joins the next `.condition()` to the previous one with AND. This is
    /// the default, so `.and()` is only useful after a preceding `.or()`.
    pub fn and(mut self) -> Self {
        self.next_logical_operator = LogicalOperator::And;
        self
    }

    /// Joins the next `.condition()` to the previous one with OR.
    pub fn or(mut self) -> Self {
        self.next_logical_operator = LogicalOperator::Or;
        self
    }

    /// Negates the next `.condition()`.
    pub fn not(mut self) -> Self {
        self.next_negated = true;
        self
    }

    pub fn join(mut self, clause: JoinClause) -> Self {
        self.plan.joins.push(clause);
        self
    }

    pub fn group_by(mut self, field: impl Into<String>) -> Self {
        self.plan.group_by.push(field.into());
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: OrderDirection) -> Self {
        self.plan.order_by.push(OrderClause {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn select(mut self, fields: &[&str]) -> Self {
        self.plan.select_fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn aggregate(mut self, clause: AggregateClause) -> Self {
        self.plan.aggregates.push(clause);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.plan.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.plan.offset = Some(offset);
        self
    }

    /// Returns the built plan, consuming the builder without executing it.
    pub fn build(self) -> QueryPlan {
        self.plan
    }

    /// Clears every clause but keeps the collection, adapter, and cache
    /// wiring, so a builder can be reused for a fresh query.
    pub fn reset(mut self) -> Self {
        let use_cache = self.plan.use_cache;
        self.plan = QueryPlan {
            collection: self.plan.collection,
            use_cache,
            ..QueryPlan::default()
        };
        self.next_logical_operator = LogicalOperator::And;
        self.next_negated = false;
        self
    }

    fn cache_key(&self) -> Result<StorageKey, StorageError> {
        let plan_json = serde_json::to_string(&self.plan).unwrap_or_default();
        let digest = plan_json.len() as u64 ^ plan_json.bytes().fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
        StorageKey::new(format!("__query_cache__:{}:{digest:x}", self.plan.collection))
    }

    async fn fetch_collection(&self, collection: &str) -> Result<Vec<Value>, StorageError> {
        let prefix = format!("{collection}:");
        let keys = self.adapter.list(Some(&prefix)).await?;
        let mut rows = Vec::with_capacity(keys.len());
        for key in &keys {
            if let Some(value) = self.adapter.get(key).await? {
                rows.push(value);
            }
        }
        Ok(rows)
    }

    /// Merges each join's collection into `rows` by matching `left_field`
    /// against `right_field`: an `Inner` join drops rows with no match, a
    /// `Left` join keeps them with the joined collection set to `null`. On a
    /// match, the first matching row from the joined collection is nested
    /// under `row[join.collection]`.
    async fn apply_joins(&self, rows: Vec<Value>) -> Result<Vec<Value>, StorageError> {
        let mut rows = rows;
        for join in &self.plan.joins {
            let join_rows = self.fetch_collection(&join.collection).await?;

            let mut joined = Vec::with_capacity(rows.len());
            for row in rows {
                let left = resolve_path(&row, strip_json_prefix(&join.left_field));
                let matched = join_rows.iter().find(|candidate| {
                    let right = resolve_path(candidate, strip_json_prefix(&join.right_field));
                    match (left, right) {
                        (Some(l), Some(r)) => match join.operator {
                            QueryOperator::Ne => compare_values(l, r) != CmpOrdering::Equal,
                            _ => compare_values(l, r) == CmpOrdering::Equal,
                        },
                        _ => false,
                    }
                });

                match matched {
                    Some(found) => {
                        let mut merged = row;
                        if let Some(obj) = merged.as_object_mut() {
                            obj.insert(join.collection.clone(), found.clone());
                        }
                        joined.push(merged);
                    }
                    None if join.join_type == JoinType::Left => {
                        let mut merged = row;
                        if let Some(obj) = merged.as_object_mut() {
                            obj.insert(join.collection.clone(), Value::Null);
                        }
                        joined.push(merged);
                    }
                    None => {}
                }
            }
            rows = joined;
        }
        Ok(rows)
    }

    /// Buckets `rows` by the tuple of `group_by` field values. Each bucket
    /// collapses to one output row: the aggregates applied over the bucket
    /// if any were requested, otherwise the bucket's first row. The group-by
    /// field values are always merged back into the output row.
    fn apply_group_by(&self, rows: Vec<Value>) -> Vec<Value> {
        let mut buckets: Vec<(Vec<Value>, Vec<Value>)> = Vec::new();
        for row in rows {
            let group_key: Vec<Value> = self
                .plan
                .group_by
                .iter()
                .map(|field| resolve_path(&row, field).cloned().unwrap_or(Value::Null))
                .collect();
            match buckets.iter_mut().find(|(key, _)| key == &group_key) {
                Some((_, bucket)) => bucket.push(row),
                None => buckets.push((group_key, vec![row])),
            }
        }

        buckets
            .into_iter()
            .map(|(group_key, bucket_rows)| {
                let mut out = if self.plan.aggregates.is_empty() {
                    bucket_rows.first().cloned().unwrap_or(Value::Null)
                } else {
                    apply_aggregates(&bucket_rows, &self.plan.aggregates)
                };
                if let Some(obj) = out.as_object_mut() {
                    for (field, value) in self.plan.group_by.iter().zip(group_key) {
                        obj.insert(field.clone(), value);
                    }
                }
                out
            })
            .collect()
    }

    pub async fn execute(&self) -> Result<QueryResult, StorageError> {
        let start = Instant::now();

        if self.plan.use_cache {
            if let Some(cache) = &self.cache {
                let key = self.cache_key()?;
                if let Some(cached) = cache.get(&key) {
                    let mut result: QueryResult = serde_json::from_value(cached)?;
                    result.metadata.from_cache = true;
                    return Ok(result);
                }
            }
        }

        let mut rows = self
            .fetch_collection(&self.plan.collection)
            .await?
            .into_iter()
            .filter(|value| evaluate_conditions(value, &self.plan.conditions))
            .collect::<Vec<_>>();

        if !self.plan.joins.is_empty() {
            rows = self.apply_joins(rows).await?;
        }

        let mut rows = if self.plan.group_by.is_empty() {
            rows
        } else {
            self.apply_group_by(rows)
        };

        for order in self.plan.order_by.iter().rev() {
            rows.sort_by(|a, b| {
                let av = resolve_path(a, &order.field);
                let bv = resolve_path(b, &order.field);
                let ord = match (av, bv) {
                    (Some(a), Some(b)) => compare_values(a, b),
                    (Some(_), None) => CmpOrdering::Greater,
                    (None, Some(_)) => CmpOrdering::Less,
                    (None, None) => CmpOrdering::Equal,
                };
                match order.direction {
                    OrderDirection::Asc => ord,
                    OrderDirection::Desc => ord.reverse(),
                }
            });
        }

        let total = rows.len() as u64;

        let data = if !self.plan.aggregates.is_empty() && self.plan.group_by.is_empty() {
            vec![apply_aggregates(&rows, &self.plan.aggregates)]
        } else {
            let offset = self.plan.offset.unwrap_or(0);
            let paged: Vec<Value> = rows.into_iter().skip(offset).take(self.plan.limit.unwrap_or(usize::MAX)).collect();
            paged.iter().map(|v| project(v, &self.plan.select_fields)).collect()
        };

        let result = QueryResult {
            data,
            metadata: QueryResultMetadata {
                total,
                from_cache: false,
                execution_time_ms: start.elapsed().as_millis() as u64,
            },
        };

        if self.plan.use_cache {
            if let Some(cache) = &self.cache {
                let key = self.cache_key()?;
                cache.set(key, serde_json::to_value(&result)?);
            }
        }

        Ok(result)
    }

    /// Runs the query and reports only the row count, ignoring `limit`/
    /// `offset`/`select`/any aggregates already attached to the plan.
    pub async fn count(&self) -> Result<u64, StorageError> {
        let mut plan = self.plan.clone();
        plan.aggregates = vec![AggregateClause {
            kind: AggregateKind::Count,
            field: "*".to_string(),
            alias: Some("count".to_string()),
        }];
        plan.group_by.clear();
        plan.limit = None;
        plan.offset = None;
        plan.select_fields.clear();
        let builder = Self {
            adapter: self.adapter.clone(),
            cache: None,
            plan,
            next_logical_operator: LogicalOperator::And,
            next_negated: false,
        };
        let result = builder.execute().await?;
        Ok(result.data.first().and_then(|v| v["count"].as_u64()).unwrap_or(0))
    }

    /// Runs the query limited to one row and returns it, or `None` if
    /// nothing matched.
    pub async fn first(&self) -> Result<Option<Value>, StorageError> {
        let mut plan = self.plan.clone();
        plan.limit = Some(1);
        plan.offset = None;
        let builder = Self {
            adapter: self.adapter.clone(),
            cache: self.cache.clone(),
            plan,
            next_logical_operator: LogicalOperator::And,
            next_negated: false,
        };
        let result = builder.execute().await?;
        Ok(result.data.into_iter().next())
    }

    /// Whether any row matches, without fetching more than one.
    pub async fn exists(&self) -> Result<bool, StorageError> {
        Ok(self.first().await?.is_some())
    }

    /// Estimates cost and complexity without running the query. A naive
    /// collection scan costs roughly `1 + conditions` per row examined; this
    /// is surfaced as `estimated_cost` scaled by a constant since the actual
    /// row count is not known without running `count`.
    pub fn explain(&self) -> QueryExplainReport {
        let (score, complexity) = score_complexity(&self.plan);
        QueryExplainReport {
            collection: self.plan.collection.clone(),
            conditions: self.plan.conditions.len(),
            estimated_cost: score * 100,
            estimated_complexity: complexity,
            supports_indexes: false,
            recommended_indexes: self
                .plan
                .conditions
                .iter()
                .map(|c| format!("{}:{}", self.plan.collection, c.field))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{MemoryStorage, PipelineAdapter};
    use crate::compression::MultiAlgoCompression;
    use crate::encryption::MultiAlgoEncryption;
    use strongbox_domain::config::StorageConfig;
    use strongbox_domain::query::QueryCondition;

    async fn seeded_adapter() -> Arc<dyn StorageAdapter> {
        let adapter: Arc<dyn StorageAdapter> = Arc::new(
            PipelineAdapter::new(
                MemoryStorage::new(),
                StorageConfig::default(),
                Arc::new(MultiAlgoCompression::new()),
                Arc::new(MultiAlgoEncryption::new()),
                None,
            )
            .unwrap(),
        );
        for (id, age) in [(1, 30), (2, 45), (3, 22)] {
            let key = StorageKey::new(format!("people:{id}")).unwrap();
            adapter
                .set(&key, serde_json::json!({"id": id, "age": age}))
                .await
                .unwrap();
        }
        adapter
    }

    #[tokio::test]
    async fn filters_rows_by_condition() {
        let adapter = seeded_adapter().await;
        let result = QueryBuilder::new(adapter, "people")
            .filter(QueryCondition {
                field: "age".into(),
                operator: QueryOperator::Gte,
                value: serde_json::json!(30),
                logical_operator: LogicalOperator::And,
                negated: false,
            })
            .execute()
            .await
            .unwrap();
        assert_eq!(result.data.len(), 2);
    }

    #[tokio::test]
    async fn orders_and_paginates_results() {
        let adapter = seeded_adapter().await;
        let result = QueryBuilder::new(adapter, "people")
            .order_by("age", OrderDirection::Asc)
            .limit(1)
            .execute()
            .await
            .unwrap();
        assert_eq!(result.data.len(), 1);
        assert_eq!(result.data[0]["age"], serde_json::json!(22));
    }

    #[tokio::test]
    async fn counts_via_aggregate() {
        let adapter = seeded_adapter().await;
        let result = QueryBuilder::new(adapter, "people")
            .aggregate(AggregateClause {
                kind: AggregateKind::Count,
                field: "id".into(),
                alias: Some("total".into()),
            })
            .execute()
            .await
            .unwrap();
        assert_eq!(result.data[0]["total"], serde_json::json!(3));
    }

    #[tokio::test]
    async fn explain_reports_complexity() {
        let adapter = seeded_adapter().await;
        let report = QueryBuilder::new(adapter, "people")
            .filter(QueryCondition {
                field: "age".into(),
                operator: QueryOperator::Gte,
                value: serde_json::json!(30),
                logical_operator: LogicalOperator::And,
                negated: false,
            })
            .explain();
        assert_eq!(report.conditions, 1);
    }

    #[tokio::test]
    async fn condition_helper_chains_and_or_not() {
        let adapter = seeded_adapter().await;
        let result = QueryBuilder::new(adapter, "people")
            .condition("age", QueryOperator::Eq, serde_json::json!(30))
            .or()
            .condition("age", QueryOperator::Eq, serde_json::json!(22))
            .execute()
            .await
            .unwrap();
        assert_eq!(result.data.len(), 2);
    }

    #[tokio::test]
    async fn count_first_and_exists_are_cheap_shortcuts() {
        let adapter = seeded_adapter().await;
        let builder = QueryBuilder::new(adapter, "people").filter(QueryCondition {
            field: "age".into(),
            operator: QueryOperator::Gte,
            value: serde_json::json!(30),
            logical_operator: LogicalOperator::And,
            negated: false,
        });

        assert_eq!(builder.count().await.unwrap(), 2);
        assert!(builder.first().await.unwrap().is_some());
        assert!(builder.exists().await.unwrap());

        let empty = QueryBuilder::new(builder.adapter.clone(), "people").filter(QueryCondition {
            field: "age".into(),
            operator: QueryOperator::Gt,
            value: serde_json::json!(1000),
            logical_operator: LogicalOperator::And,
            negated: false,
        });
        assert!(!empty.exists().await.unwrap());
    }

    #[tokio::test]
    async fn group_by_buckets_rows_and_applies_aggregates() {
        let adapter: Arc<dyn StorageAdapter> = Arc::new(
            PipelineAdapter::new(
                MemoryStorage::new(),
                StorageConfig::default(),
                Arc::new(MultiAlgoCompression::new()),
                Arc::new(MultiAlgoEncryption::new()),
                None,
            )
            .unwrap(),
        );
        for (id, team, score) in [(1, "red", 10), (2, "red", 20), (3, "blue", 5)] {
            let key = StorageKey::new(format!("scores:{id}")).unwrap();
            adapter
                .set(&key, serde_json::json!({"id": id, "team": team, "score": score}))
                .await
                .unwrap();
        }

        let result = QueryBuilder::new(adapter, "scores")
            .group_by("team")
            .aggregate(AggregateClause {
                kind: AggregateKind::Sum,
                field: "score".into(),
                alias: Some("total".into()),
            })
            .execute()
            .await
            .unwrap();

        assert_eq!(result.data.len(), 2);
        let red = result.data.iter().find(|row| row["team"] == "red").unwrap();
        assert_eq!(red["total"], serde_json::json!(30.0));
        let blue = result.data.iter().find(|row| row["team"] == "blue").unwrap();
        assert_eq!(blue["total"], serde_json::json!(5.0));
    }

    #[tokio::test]
    async fn inner_join_merges_matching_rows_from_another_collection() {
        let adapter: Arc<dyn StorageAdapter> = Arc::new(
            PipelineAdapter::new(
                MemoryStorage::new(),
                StorageConfig::default(),
                Arc::new(MultiAlgoCompression::new()),
                Arc::new(MultiAlgoEncryption::new()),
                None,
            )
            .unwrap(),
        );
        adapter
            .set(
                &StorageKey::new("orders:1").unwrap(),
                serde_json::json!({"id": 1, "user_id": 7}),
            )
            .await
            .unwrap();
        adapter
            .set(
                &StorageKey::new("orders:2").unwrap(),
                serde_json::json!({"id": 2, "user_id": 99}),
            )
            .await
            .unwrap();
        adapter
            .set(
                &StorageKey::new("users:7").unwrap(),
                serde_json::json!({"id": 7, "name": "Alice"}),
            )
            .await
            .unwrap();

        let result = QueryBuilder::new(adapter, "orders")
            .join(JoinClause {
                collection: "users".to_string(),
                left_field: "user_id".to_string(),
                operator: QueryOperator::Eq,
                right_field: "id".to_string(),
                join_type: JoinType::Inner,
            })
            .execute()
            .await
            .unwrap();

        assert_eq!(result.data.len(), 1);
        assert_eq!(result.data[0]["users"]["name"], "Alice");
    }
}
