// /////////////////////////////////////////////////////////////////////////////
// Strongbox
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Fluent query builder: filter by an AND-conjunction of conditions, then
//! sort the remaining rows.

use serde_json::json;
use strongbox::{
    LogicalOperator, OrderDirection, QueryBuilder, QueryCondition, QueryOperator, StorageConfig, StorageManager,
};

async fn seeded_manager() -> StorageManager {
    let manager = StorageManager::new(StorageConfig::default());
    manager.initialize().await.unwrap();

    let users = manager.namespace("users");
    users
        .set("1", json!({"name": "Alice", "role": "admin", "active": true, "salary": 85000}))
        .await
        .unwrap();
    users
        .set("2", json!({"name": "Bob", "role": "admin", "active": false, "salary": 75000}))
        .await
        .unwrap();
    users
        .set("3", json!({"name": "Carol", "role": "member", "active": true, "salary": 70000}))
        .await
        .unwrap();
    users
        .set("4", json!({"name": "Dave", "role": "member", "active": true, "salary": 65000}))
        .await
        .unwrap();
    manager
}

#[tokio::test]
async fn filters_to_the_single_active_admin() {
    let manager = seeded_manager().await;
    let adapter = manager.adapter().unwrap();

    let result = QueryBuilder::new(adapter, "users")
        .filter(QueryCondition {
            field: "role".to_string(),
            operator: QueryOperator::Eq,
            value: json!("admin"),
            logical_operator: LogicalOperator::And,
            negated: false,
        })
        .filter(QueryCondition {
            field: "active".to_string(),
            operator: QueryOperator::Eq,
            value: json!(true),
            logical_operator: LogicalOperator::And,
            negated: false,
        })
        .execute()
        .await
        .unwrap();

    assert_eq!(result.data.len(), 1);
    assert_eq!(result.data[0]["name"], "Alice");
}

#[tokio::test]
async fn orders_by_salary_descending() {
    let manager = seeded_manager().await;
    let adapter = manager.adapter().unwrap();

    let result = QueryBuilder::new(adapter, "users")
        .order_by("salary", OrderDirection::Desc)
        .execute()
        .await
        .unwrap();

    let salaries: Vec<i64> = result.data.iter().map(|row| row["salary"].as_i64().unwrap()).collect();
    assert_eq!(salaries, vec![85000, 75000, 70000, 65000]);
}
