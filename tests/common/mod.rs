//! Models and setup shared by the integration tests

#![allow(dead_code)]

use softhaus::prelude::*;
use softhaus::store_object::MockExecutor;
use std::sync::Arc;

/// Soft-deletable model using the default `deleted_at` column
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Option<i64>,
    pub username: String,
    #[serde(flatten)]
    pub soft_delete: SoftDeleteFields,
    #[serde(skip)]
    pub state: ModelState,
}

impl User {
    pub fn new(username: &str) -> Self {
        Self {
            id: None,
            username: username.to_string(),
            soft_delete: SoftDeleteFields::default(),
            state: ModelState::default(),
        }
    }
}

impl Model for User {
    fn model_name() -> &'static str {
        "User"
    }

    fn table_name() -> &'static str {
        "users"
    }

    fn columns() -> Vec<ColumnDefinition> {
        vec![
            ColumnDefinition::primary("id"),
            ColumnDefinition::new("username"),
        ]
    }

    fn boot(definition: &mut ModelDefinition<Self>) {
        softhaus::soft_deletes::boot(definition);
    }

    fn state(&self) -> &ModelState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ModelState {
        &mut self.state
    }
}

impl SoftDeletes for User {
    fn soft_delete_fields(&self) -> &SoftDeleteFields {
        &self.soft_delete
    }

    fn soft_delete_fields_mut(&mut self) -> &mut SoftDeleteFields {
        &mut self.soft_delete
    }
}

/// Soft-deletable model storing the timestamp in `removed_at`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Option<i64>,
    pub user_id: i64,
    pub title: String,
    #[serde(flatten)]
    pub soft_delete: SoftDeleteFields,
    #[serde(skip)]
    pub state: ModelState,
}

impl Post {
    pub fn new(user_id: i64, title: &str) -> Self {
        Self {
            id: None,
            user_id,
            title: title.to_string(),
            soft_delete: SoftDeleteFields::default(),
            state: ModelState::default(),
        }
    }
}

impl Model for Post {
    fn model_name() -> &'static str {
        "Post"
    }

    fn table_name() -> &'static str {
        "posts"
    }

    fn columns() -> Vec<ColumnDefinition> {
        vec![
            ColumnDefinition::primary("id"),
            ColumnDefinition::new("user_id"),
            ColumnDefinition::new("title"),
            ColumnDefinition::new("deleted_at").with_column_name("removed_at"),
        ]
    }

    fn boot(definition: &mut ModelDefinition<Self>) {
        softhaus::soft_deletes::boot(definition);
    }

    fn state(&self) -> &ModelState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ModelState {
        &mut self.state
    }
}

impl SoftDeletes for Post {
    fn soft_delete_fields(&self) -> &SoftDeleteFields {
        &self.soft_delete
    }

    fn soft_delete_fields_mut(&mut self) -> &mut SoftDeleteFields {
        &mut self.soft_delete
    }
}

/// Soft-deletable model that shares `deleted_at` with `users` when joined
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Option<i64>,
    pub user_id: i64,
    pub body: String,
    #[serde(flatten)]
    pub soft_delete: SoftDeleteFields,
    #[serde(skip)]
    pub state: ModelState,
}

impl Comment {
    pub fn new(user_id: i64, body: &str) -> Self {
        Self {
            id: None,
            user_id,
            body: body.to_string(),
            soft_delete: SoftDeleteFields::default(),
            state: ModelState::default(),
        }
    }
}

impl Model for Comment {
    fn model_name() -> &'static str {
        "Comment"
    }

    fn table_name() -> &'static str {
        "comments"
    }

    fn columns() -> Vec<ColumnDefinition> {
        vec![
            ColumnDefinition::primary("id"),
            ColumnDefinition::new("user_id"),
            ColumnDefinition::new("body"),
        ]
    }

    fn boot(definition: &mut ModelDefinition<Self>) {
        softhaus::soft_deletes::boot(definition);
    }

    fn state(&self) -> &ModelState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ModelState {
        &mut self.state
    }
}

impl SoftDeletes for Comment {
    fn soft_delete_fields(&self) -> &SoftDeleteFields {
        &self.soft_delete
    }

    fn soft_delete_fields_mut(&mut self) -> &mut SoftDeleteFields {
        &mut self.soft_delete
    }
}

/// Plain model without soft deletes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    pub id: Option<i64>,
    pub name: String,
    #[serde(skip)]
    pub state: ModelState,
}

impl Company {
    pub fn new(name: &str) -> Self {
        Self {
            id: None,
            name: name.to_string(),
            state: ModelState::default(),
        }
    }
}

impl Model for Company {
    fn model_name() -> &'static str {
        "Company"
    }

    fn table_name() -> &'static str {
        "companies"
    }

    fn columns() -> Vec<ColumnDefinition> {
        vec![ColumnDefinition::primary("id"), ColumnDefinition::new("name")]
    }

    fn state(&self) -> &ModelState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ModelState {
        &mut self.state
    }
}

pub struct TestContext {
    pub softhaus: SoftHaus,
    pub executor: Arc<MockExecutor>,
    pub users: ModelStore<User>,
    pub posts: ModelStore<Post>,
    pub comments: ModelStore<Comment>,
    pub companies: ModelStore<Company>,
}

pub fn setup() -> TestContext {
    let executor = Arc::new(MockExecutor::new());
    let mut softhaus = SoftHaus::with_executor(executor.clone());

    let users = softhaus.register::<User>().unwrap();
    let posts = softhaus.register::<Post>().unwrap();
    let comments = softhaus.register::<Comment>().unwrap();
    let companies = softhaus.register::<Company>().unwrap();

    TestContext {
        softhaus,
        executor,
        users,
        posts,
        comments,
        companies,
    }
}

pub async fn create_user(store: &ModelStore<User>, username: &str) -> User {
    let mut user = User::new(username);
    store.save(&mut user).await.unwrap();
    user
}

pub async fn create_post(store: &ModelStore<Post>, user_id: i64, title: &str) -> Post {
    let mut post = Post::new(user_id, title);
    store.save(&mut post).await.unwrap();
    post
}

pub fn usernames(users: &[User]) -> Vec<String> {
    let mut names: Vec<String> = users.iter().map(|u| u.username.clone()).collect();
    names.sort();
    names
}
