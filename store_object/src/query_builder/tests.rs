use crate::definition::ModelDefinition;
use crate::executor::{DatabaseExecutor, MockExecutor, Row};
use crate::hooks::{HookPhase, LifecycleEvent};
use crate::model_store::ModelStore;
use crate::query_builder::{GroupLimit, QueryFilter, SortOrder, SqlGenerator};
use crate::traits::{ColumnDefinition, Model, ModelState};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Article {
    id: Option<i64>,
    author_id: i64,
    title: String,
    #[serde(skip)]
    state: ModelState,
}

impl Article {
    fn new(author_id: i64, title: &str) -> Self {
        Self {
            id: None,
            author_id,
            title: title.to_string(),
            state: ModelState::default(),
        }
    }
}

impl Model for Article {
    fn model_name() -> &'static str {
        "Article"
    }

    fn table_name() -> &'static str {
        "articles"
    }

    fn columns() -> Vec<ColumnDefinition> {
        vec![
            ColumnDefinition::primary("id"),
            ColumnDefinition::new("author_id"),
            ColumnDefinition::new("title").with_column_name("headline"),
        ]
    }

    fn state(&self) -> &ModelState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ModelState {
        &mut self.state
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Marker(u8);

fn store() -> (ModelStore<Article>, Arc<MockExecutor>) {
    let executor = Arc::new(MockExecutor::new());
    let store = ModelStore::<Article>::boot(executor.clone()).unwrap();
    (store, executor)
}

fn row(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        _ => panic!("expected an object"),
    }
}

// ========================================
// SQL generation
// ========================================

#[test]
fn test_select_sql_with_filters_order_and_paging() {
    let (store, _) = store();
    let (sql, values) = store
        .query()
        .filter(QueryFilter::eq("articles.author_id", json!(7)))
        .filter(QueryFilter::or(vec![
            QueryFilter::like("articles.headline", "%rust%"),
            QueryFilter::is_null("articles.headline"),
        ]))
        .order_by("articles.id", SortOrder::Desc)
        .for_page(3, 10)
        .to_sql();

    assert_eq!(
        sql,
        "SELECT * FROM articles WHERE articles.author_id = $1 AND \
         (articles.headline LIKE $2 OR articles.headline IS NULL) \
         ORDER BY articles.id DESC LIMIT 10 OFFSET 20"
    );
    assert_eq!(values, vec![json!(7), json!("%rust%")]);
}

#[test]
fn test_null_comparisons_render_is_null() {
    let (store, _) = store();
    let (sql, values) = store
        .query()
        .filter(QueryFilter::eq("articles.headline", Value::Null))
        .filter(QueryFilter::ne("articles.author_id", Value::Null))
        .to_sql();

    assert_eq!(
        sql,
        "SELECT * FROM articles WHERE articles.headline IS NULL AND articles.author_id IS NOT NULL"
    );
    assert!(values.is_empty());
}

#[test]
fn test_empty_in_lists() {
    let (store, _) = store();
    let (sql, _) = store
        .query()
        .filter(QueryFilter::in_values("articles.id", vec![]))
        .filter(QueryFilter::not_in_values("articles.id", vec![]))
        .to_sql();

    assert_eq!(sql, "SELECT * FROM articles WHERE 1=0 AND 1=1");
}

#[test]
fn test_group_limit_sql_places_table_scope_inside_subquery() {
    let (store, _) = store();
    let mut query = store.query().group_limit(
        GroupLimit::new("articles.author_id", 2).order_by("articles.id", SortOrder::Asc),
    );
    query.table_scope().where_null("articles.headline");
    let query = query.filter(QueryFilter::gt("store_group_limit_query.id", json!(1)));

    let (sql, values) = query.to_sql();
    assert_eq!(
        sql,
        "SELECT * FROM (SELECT *, ROW_NUMBER() OVER (PARTITION BY articles.author_id ORDER BY articles.id ASC) \
         AS store_group_limit_counter FROM articles WHERE articles.headline IS NULL) \
         AS store_group_limit_query WHERE store_group_limit_counter <= 2 AND store_group_limit_query.id > $1"
    );
    assert_eq!(values, vec![json!(1)]);
    assert_eq!(query.conditions().len(), 1);
    assert_eq!(query.wrapper_conditions().len(), 1);
}

#[test]
fn test_count_sql() {
    let (store, _) = store();
    let query = store
        .query()
        .filter(QueryFilter::eq("articles.author_id", json!(1)))
        .order_by("articles.id", SortOrder::Asc)
        .limit(5);

    let (sql, _) = query.to_statement().to_count_sql();
    assert_eq!(
        sql,
        "SELECT COUNT(*) AS total FROM articles WHERE articles.author_id = $1"
    );

    let grouped = store
        .query()
        .group_limit(GroupLimit::new("articles.author_id", 1));
    let (sql, _) = grouped.to_statement().to_count_sql();
    assert!(sql.starts_with("SELECT COUNT(*) AS total FROM (SELECT * FROM (SELECT *, ROW_NUMBER()"));
    assert!(sql.ends_with("AS store_count_query"));
}

#[test]
fn test_insert_and_update_render_nulls_as_literals() {
    let insert = crate::executor::InsertStatement {
        table: "articles".to_string(),
        primary_key: "id".to_string(),
        values: row(json!({"id": null, "author_id": 1, "headline": null})),
    };
    let (sql, values) = SqlGenerator::insert(&insert);
    assert_eq!(sql, "INSERT INTO articles (author_id, headline) VALUES ($1, NULL)");
    assert_eq!(values, vec![json!(1)]);

    let update = crate::executor::UpdateStatement {
        table: "articles".to_string(),
        values: row(json!({"headline": null, "author_id": 2})),
        conditions: vec![QueryFilter::eq("id", json!(9))],
    };
    let (sql, values) = SqlGenerator::update(&update);
    assert_eq!(sql, "UPDATE articles SET author_id = $1, headline = NULL WHERE id = $2");
    assert_eq!(values, vec![json!(2), json!(9)]);

    let empty = crate::executor::InsertStatement {
        table: "articles".to_string(),
        primary_key: "id".to_string(),
        values: row(json!({"id": null})),
    };
    assert_eq!(
        SqlGenerator::insert(&empty).0,
        "INSERT INTO articles DEFAULT VALUES"
    );
}

// ========================================
// Extensions and companion queries
// ========================================

#[test]
fn test_extensions_are_per_query() {
    let (store, _) = store();
    let mut first = store.query();
    first.extensions_mut().insert(Marker(1));

    let copy = first.clone();
    assert_eq!(copy.extensions().get::<Marker>(), Some(&Marker(1)));
    assert!(store.query().extensions().is_empty());
}

#[test]
fn test_count_query_starts_with_fresh_extensions() {
    let (store, _) = store();
    let mut query = store
        .query()
        .filter(QueryFilter::eq("articles.author_id", json!(1)))
        .order_by("articles.id", SortOrder::Asc)
        .for_page(2, 5);
    query.extensions_mut().insert(Marker(3));

    let count = query.count_query();
    assert!(count.extensions().is_empty());
    assert_eq!(count.conditions(), query.conditions());
    assert_eq!(count.to_statement().limit, None);
    assert!(count.to_statement().order_by.is_empty());
}

// ========================================
// Hooks
// ========================================

fn definition_with_recorder(calls: Arc<Mutex<Vec<String>>>) -> ModelDefinition<Article> {
    let mut definition = ModelDefinition::<Article>::boot().unwrap();
    let hooks = definition.hooks_mut();

    let log = calls.clone();
    hooks.before_find(move |_| log.lock().unwrap().push("before_find".into()));
    let log = calls.clone();
    hooks.before_fetch(move |query| {
        log.lock().unwrap().push("before_fetch".into());
        query.add_filter(QueryFilter::gt("articles.id", json!(0)));
    });
    let log = calls.clone();
    hooks.before_paginate(move |count, main| {
        let marker = main.extensions().get::<Marker>().copied();
        log.lock()
            .unwrap()
            .push(format!("before_paginate:{:?}", marker));
        if let Some(marker) = marker {
            count.extensions_mut().insert(marker);
        }
    });
    let log = calls.clone();
    hooks.after_fetch(move |models| {
        log.lock()
            .unwrap()
            .push(format!("after_fetch:{}", models.len()))
    });
    let log = calls.clone();
    hooks.after_find(move |model| {
        log.lock()
            .unwrap()
            .push(format!("after_find:{}", model.title))
    });
    let log = calls;
    hooks.after_paginate(move |models| {
        log.lock()
            .unwrap()
            .push(format!("after_paginate:{}", models.len()))
    });

    definition
}

#[tokio::test]
async fn test_fetch_hooks_run_in_order_and_mutate_query() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let executor = Arc::new(MockExecutor::new());
    let store = ModelStore::new(
        Arc::new(definition_with_recorder(calls.clone())),
        executor.clone() as Arc<dyn DatabaseExecutor>,
    );

    let mut article = Article::new(1, "hooks");
    store.save(&mut article).await.unwrap();
    executor.drain_transaction_log();

    let all = store.all().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(
        *calls.lock().unwrap(),
        vec!["before_fetch".to_string(), "after_fetch:1".to_string()]
    );

    let log = executor.drain_transaction_log();
    assert_eq!(log[0].sql, "SELECT * FROM articles WHERE articles.id > $1");
    assert_eq!(store.definition().hooks().count(HookPhase::Before, LifecycleEvent::Fetch), 1);
}

#[tokio::test]
async fn test_first_runs_find_hooks() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let store = ModelStore::new(
        Arc::new(definition_with_recorder(calls.clone())),
        Arc::new(MockExecutor::new()) as Arc<dyn DatabaseExecutor>,
    );

    let mut article = Article::new(4, "found");
    store.save(&mut article).await.unwrap();

    let found = store.find(article.id.unwrap()).await.unwrap().unwrap();
    assert_eq!(found.title, "found");
    assert!(found.state().is_persisted());
    assert_eq!(
        *calls.lock().unwrap(),
        vec!["before_find".to_string(), "after_find:found".to_string()]
    );
}

#[tokio::test]
async fn test_paginate_passes_count_query_first() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let executor = Arc::new(MockExecutor::new());
    let store = ModelStore::new(
        Arc::new(definition_with_recorder(calls.clone())),
        executor.clone() as Arc<dyn DatabaseExecutor>,
    );

    for index in 0..5 {
        let mut article = Article::new(1, &format!("article {}", index));
        store.save(&mut article).await.unwrap();
    }
    executor.drain_transaction_log();

    let mut query = store.query().order_by("articles.id", SortOrder::Asc);
    query.extensions_mut().insert(Marker(9));
    let page = query.paginate(2, 2).await.unwrap();

    assert_eq!(page.total(), 5);
    assert_eq!(page.all().len(), 2);
    assert_eq!(page.all()[0].title, "article 2");
    assert_eq!(page.last_page(), 3);
    assert_eq!(
        *calls.lock().unwrap(),
        vec![
            "before_paginate:Some(Marker(9))".to_string(),
            "before_fetch".to_string(),
            "after_paginate:2".to_string(),
        ]
    );

    // fetch hooks only touch the main query
    let log = executor.drain_transaction_log();
    assert_eq!(log[0].sql, "SELECT COUNT(*) AS total FROM articles");
    assert!(log[1].sql.contains("WHERE articles.id > $1"));
}

#[tokio::test]
async fn test_count_runs_fetch_hooks() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let store = ModelStore::new(
        Arc::new(definition_with_recorder(calls.clone())),
        Arc::new(MockExecutor::new()) as Arc<dyn DatabaseExecutor>,
    );

    assert_eq!(store.query().count().await.unwrap(), 0);
    assert_eq!(*calls.lock().unwrap(), vec!["before_fetch".to_string()]);
}

// ========================================
// Bulk writes
// ========================================

#[tokio::test]
async fn test_bulk_update_and_delete_skip_hooks() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let executor = Arc::new(MockExecutor::new());
    let store = ModelStore::new(
        Arc::new(definition_with_recorder(calls.clone())),
        executor.clone() as Arc<dyn DatabaseExecutor>,
    );

    for title in ["a", "b", "c"] {
        let mut article = Article::new(2, title);
        store.save(&mut article).await.unwrap();
    }

    let updated = store
        .query()
        .filter(QueryFilter::in_values("articles.headline", vec![json!("a"), json!("b")]))
        .update(row(json!({"author_id": 3})))
        .await
        .unwrap();
    assert_eq!(updated, 2);

    let deleted = store
        .query()
        .filter(QueryFilter::eq("articles.author_id", json!(3)))
        .delete()
        .await
        .unwrap();
    assert_eq!(deleted, 2);
    assert_eq!(executor.rows("articles").len(), 1);
    assert!(calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_bulk_writes_reject_group_limit() {
    let (store, _) = store();
    let grouped = store
        .query()
        .group_limit(GroupLimit::new("articles.author_id", 1));

    let err = grouped
        .clone()
        .update(row(json!({"author_id": 1})))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("group-limited"));
    assert!(grouped.delete().await.is_err());

    let err = store.query().update(Row::new()).await.unwrap_err();
    assert!(err.to_string().contains("at least one column"));
}

#[tokio::test]
async fn test_joined_select_renders_model_columns_only() {
    let (store, executor) = store();
    let joined = store
        .query()
        .join("authors", "authors.id", "articles.author_id")
        .where_null("authors.deleted_at");

    assert_eq!(
        joined.to_sql().0,
        "SELECT articles.* FROM articles INNER JOIN authors ON authors.id = articles.author_id \
         WHERE authors.deleted_at IS NULL"
    );
    let (count_sql, _) = joined.count_query().to_statement().to_count_sql();
    assert_eq!(
        count_sql,
        "SELECT COUNT(*) AS total FROM articles INNER JOIN authors ON authors.id = articles.author_id \
         WHERE authors.deleted_at IS NULL"
    );

    let err = joined.delete().await.unwrap_err();
    assert!(err.to_string().contains("delete is not supported on a joined query"));
    assert!(executor.transaction_log().is_empty());
}

// ========================================
// Instance persistence
// ========================================

#[tokio::test]
async fn test_save_inserts_then_updates_through_column_names() {
    let (store, executor) = store();
    let mut article = Article::new(1, "draft");
    store.save(&mut article).await.unwrap();

    assert_eq!(article.id, Some(1));
    assert!(article.state().is_persisted());

    article.title = "published".to_string();
    store.save(&mut article).await.unwrap();

    let rows = executor.rows("articles");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["headline"], json!("published"));
    assert!(rows[0].get("title").is_none());
}

#[tokio::test]
async fn test_delete_removes_row_and_marks_instance() {
    let (store, executor) = store();
    let mut article = Article::new(1, "gone");

    let err = store.delete(&mut article).await.unwrap_err();
    assert!(err.to_string().contains("never saved"));

    store.save(&mut article).await.unwrap();
    store.delete(&mut article).await.unwrap();

    assert!(article.state().is_deleted());
    assert!(executor.rows("articles").is_empty());
    assert!(store.save(&mut article).await.is_err());
    assert!(store.delete(&mut article).await.is_err());
}

#[tokio::test]
async fn test_find_or_fail_and_truncate() {
    let (store, _) = store();
    for title in ["one", "two"] {
        let mut article = Article::new(1, title);
        store.save(&mut article).await.unwrap();
    }

    assert!(store.find_or_fail(2).await.is_ok());
    assert_eq!(store.truncate().await.unwrap(), 2);
    assert!(matches!(
        store.find_or_fail(2).await,
        Err(crate::errors::StoreError::NotFound(_))
    ));
}
