//! In-memory stores for tests. They mirror the Postgres stores' contracts:
//! `NotFound` on missing ids, `Conflict` on duplicate unique fields.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    auth::{
        repo::UserStore,
        repo_types::{NewUser, User},
    },
    error::{AppError, AppResult},
    pagination::Page,
    resources::{
        model::{NewResource, Resource, ResourceKind},
        repo::ResourceStore,
    },
};

fn paginate<T>(items: Vec<T>, page: Page) -> (Vec<T>, i64) {
    let total = items.len() as i64;
    let rows = items
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.limit() as usize)
        .collect();
    (rows, total)
}

#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<Vec<User>>,
}

impl MemoryUserStore {
    pub fn contains(&self, id: Uuid) -> bool {
        self.users.lock().unwrap().iter().any(|u| u.id == id)
    }

    fn check_unique(users: &[User], id: Option<Uuid>, username: &str, email: &str) -> AppResult<()> {
        for u in users.iter().filter(|u| Some(u.id) != id) {
            if u.email == email {
                return Err(AppError::Conflict("email already registered".into()));
            }
            if u.username == username {
                return Err(AppError::Conflict("username already taken".into()));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn get_by_id(&self, id: Uuid) -> AppResult<User> {
        let users = self.users.lock().unwrap();
        users
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("user not found".into()))
    }

    async fn get_by_email(&self, email: &str) -> AppResult<User> {
        let users = self.users.lock().unwrap();
        users
            .iter()
            .find(|u| u.email == email)
            .cloned()
            .ok_or_else(|| AppError::NotFound("user not found".into()))
    }

    async fn list(&self, page: Page) -> AppResult<(Vec<User>, i64)> {
        let users = self.users.lock().unwrap().clone();
        Ok(paginate(users, page))
    }

    async fn create(&self, user: NewUser) -> AppResult<User> {
        let mut users = self.users.lock().unwrap();
        Self::check_unique(&users, None, &user.username, &user.email)?;
        let now = OffsetDateTime::now_utc();
        let created = User {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            created_at: now,
            updated_at: now,
        };
        users.push(created.clone());
        Ok(created)
    }

    async fn update(&self, user: &User) -> AppResult<User> {
        let mut users = self.users.lock().unwrap();
        Self::check_unique(&users, Some(user.id), &user.username, &user.email)?;
        let slot = users
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or_else(|| AppError::NotFound("user not found".into()))?;
        *slot = User {
            updated_at: OffsetDateTime::now_utc(),
            ..user.clone()
        };
        Ok(slot.clone())
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let mut users = self.users.lock().unwrap();
        let before = users.len();
        users.retain(|u| u.id != id);
        if users.len() == before {
            return Err(AppError::NotFound("user not found".into()));
        }
        Ok(())
    }
}

/// Counts every call so tests can assert the store was never reached. When
/// linked to a user store, inserts for a missing owner fail the way the
/// foreign key does in Postgres.
#[derive(Default)]
pub struct MemoryResourceStore {
    rows: Mutex<Vec<Resource>>,
    calls: AtomicUsize,
    users: Option<Arc<MemoryUserStore>>,
}

impl MemoryResourceStore {
    pub fn linked(users: Arc<MemoryUserStore>) -> Self {
        Self {
            users: Some(users),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn owned_by(&self, owner_id: Uuid) -> Vec<Resource> {
        let mut rows: Vec<Resource> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.owner_id == owner_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows
    }

    fn url_taken(rows: &[Resource], r_id: Option<Uuid>, owner_id: Uuid, kind: &ResourceKind) -> bool {
        let ResourceKind::Link { url, .. } = kind else {
            return false;
        };
        rows.iter().any(|r| {
            Some(r.id) != r_id
                && r.owner_id == owner_id
                && matches!(&r.kind, ResourceKind::Link { url: u, .. } if u == url)
        })
    }
}

fn matches_text(r: &Resource, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    let hit = |s: &str| s.to_lowercase().contains(&needle);
    let payload = match &r.kind {
        ResourceKind::Link { url, .. } => hit(url),
        ResourceKind::Code { code_content, .. } => hit(code_content),
    };
    hit(&r.title) || hit(&r.description) || payload
}

#[async_trait]
impl ResourceStore for MemoryResourceStore {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Resource> {
        self.touch();
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("resource not found".into()))
    }

    async fn get_by_owner(&self, owner_id: Uuid, page: Page) -> AppResult<(Vec<Resource>, i64)> {
        self.touch();
        Ok(paginate(self.owned_by(owner_id), page))
    }

    async fn create(&self, resource: NewResource) -> AppResult<Resource> {
        self.touch();
        if let Some(users) = &self.users {
            if !users.contains(resource.owner_id) {
                return Err(AppError::Unauthenticated("user not found".into()));
            }
        }
        let mut rows = self.rows.lock().unwrap();
        if Self::url_taken(&rows, None, resource.owner_id, &resource.kind) {
            return Err(AppError::Conflict("you already saved this url".into()));
        }
        let now = OffsetDateTime::now_utc();
        let created = Resource {
            id: Uuid::new_v4(),
            owner_id: resource.owner_id,
            title: resource.title,
            kind: resource.kind,
            description: resource.description,
            tags: resource.tags,
            created_at: now,
            updated_at: now,
        };
        rows.push(created.clone());
        Ok(created)
    }

    async fn update(&self, resource: &Resource) -> AppResult<Resource> {
        self.touch();
        let mut rows = self.rows.lock().unwrap();
        let owner_id = rows
            .iter()
            .find(|r| r.id == resource.id)
            .map(|r| r.owner_id)
            .ok_or_else(|| AppError::NotFound("resource not found".into()))?;
        if Self::url_taken(&rows, Some(resource.id), owner_id, &resource.kind) {
            return Err(AppError::Conflict("you already saved this url".into()));
        }
        let slot = rows
            .iter_mut()
            .find(|r| r.id == resource.id)
            .ok_or_else(|| AppError::NotFound("resource not found".into()))?;
        *slot = Resource {
            owner_id,
            created_at: slot.created_at,
            updated_at: OffsetDateTime::now_utc(),
            ..resource.clone()
        };
        Ok(slot.clone())
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.touch();
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|r| r.id != id);
        if rows.len() == before {
            return Err(AppError::NotFound("resource not found".into()));
        }
        Ok(())
    }

    async fn search(
        &self,
        text: &str,
        owner_id: Uuid,
        page: Page,
    ) -> AppResult<(Vec<Resource>, i64)> {
        self.touch();
        let hits = self
            .owned_by(owner_id)
            .into_iter()
            .filter(|r| matches_text(r, text))
            .collect();
        Ok(paginate(hits, page))
    }

    async fn get_by_tags(
        &self,
        tags: &[String],
        owner_id: Uuid,
        page: Page,
    ) -> AppResult<(Vec<Resource>, i64)> {
        self.touch();
        let hits = self
            .owned_by(owner_id)
            .into_iter()
            .filter(|r| tags.iter().all(|t| r.tags.contains(t)))
            .collect();
        Ok(paginate(hits, page))
    }
}
