//! In-memory repositories.
//!
//! [`InMemoryDatabase`] implements every repository trait over plain
//! collections behind one mutex, so the service and REST layers can be
//! tested without MySQL. It enforces the same unique keys as the schema.

use crate::traits::{
    AccessTokenRepository, DivisionRepository, PositionRepository, RoleRepository, UserRepository,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use orgdesk_core::{
    AccessToken, AccessTokenId, Division, DivisionId, DivisionSort, GroupCount, HealthCheck, HealthStatus,
    ListQuery, NewAccessToken, NewCatalogEntry, NewRole, NewUser, OrgdeskError, OrgdeskResult, Page,
    PageRequest, Position, PositionId, PositionSort, Role, RoleId, RoleSort, RoleSummary, SortDirection, User,
    UserId, UserSort,
};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Default)]
struct Tables {
    next_id: i64,
    users: BTreeMap<UserId, User>,
    roles: BTreeMap<RoleId, Role>,
    divisions: BTreeMap<DivisionId, Division>,
    positions: BTreeMap<PositionId, Position>,
    user_roles: Vec<(UserId, RoleId, Option<String>)>,
    tokens: BTreeMap<AccessTokenId, AccessToken>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn user_conflict(&self, employee_id: &str, email: &str, except: Option<UserId>) -> Option<OrgdeskError> {
        let others = || self.users.values().filter(|u| Some(u.id) != except);
        if others().any(|u| u.employee_id == employee_id) {
            return Some(OrgdeskError::field("u_employee_id", "The u employee id has already been taken."));
        }
        if others().any(|u| u.email.eq_ignore_ascii_case(email)) {
            return Some(OrgdeskError::field("u_email", "The u email has already been taken."));
        }
        None
    }

    fn link_roles(&mut self, user: UserId, roles: &[RoleId], created_by: Option<&str>) {
        for role in roles {
            if !self.user_roles.iter().any(|(u, r, _)| *u == user && r == role) {
                self.user_roles.push((user, *role, created_by.map(str::to_string)));
            }
        }
    }
}

/// All repositories over one set of in-memory tables.
pub struct InMemoryDatabase {
    tables: Mutex<Tables>,
    healthy: AtomicBool,
}

impl Default for InMemoryDatabase {
    fn default() -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            healthy: AtomicBool::new(true),
        }
    }
}

impl InMemoryDatabase {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the health check report the database as down.
    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, AtomicOrdering::SeqCst);
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for InMemoryDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryDatabase").finish_non_exhaustive()
    }
}

fn paginate<T>(items: Vec<T>, page: PageRequest) -> Page<T> {
    let total = items.len() as u64;
    let data = items
        .into_iter()
        .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
        .take(usize::try_from(page.limit()).unwrap_or(usize::MAX))
        .collect();
    Page::new(data, page, total)
}

fn directed(ordering: Ordering, direction: SortDirection) -> Ordering {
    match direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}

#[async_trait]
impl HealthCheck for InMemoryDatabase {
    fn name(&self) -> &str {
        "database"
    }

    async fn check(&self) -> HealthStatus {
        if self.healthy.load(AtomicOrdering::SeqCst) {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy("in-memory database marked down".to_string())
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryDatabase {
    async fn find_by_id(&self, id: UserId) -> OrgdeskResult<Option<User>> {
        Ok(self.lock().users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> OrgdeskResult<Option<User>> {
        Ok(self
            .lock()
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_by_ids(&self, ids: &[UserId]) -> OrgdeskResult<Vec<User>> {
        let tables = self.lock();
        Ok(ids.iter().filter_map(|id| tables.users.get(id).cloned()).collect())
    }

    async fn exists_by_email(&self, email: &str, except: Option<UserId>) -> OrgdeskResult<bool> {
        Ok(self
            .lock()
            .users
            .values()
            .any(|u| Some(u.id) != except && u.email.eq_ignore_ascii_case(email)))
    }

    async fn exists_by_employee_id(&self, employee_id: &str, except: Option<UserId>) -> OrgdeskResult<bool> {
        Ok(self
            .lock()
            .users
            .values()
            .any(|u| Some(u.id) != except && u.employee_id == employee_id))
    }

    async fn find_all(&self, query: &ListQuery<UserSort>) -> OrgdeskResult<Page<User>> {
        let term = query.search.as_deref().map(str::to_lowercase);
        let mut users: Vec<User> = self
            .lock()
            .users
            .values()
            .filter(|u| {
                term.as_deref().map_or(true, |t| {
                    u.name.to_lowercase().contains(t)
                        || u.email.to_lowercase().contains(t)
                        || u.employee_id.to_lowercase().contains(t)
                })
            })
            .cloned()
            .collect();

        users.sort_by(|a, b| {
            let ordering = match query.sort.column {
                UserSort::Id => a.id.cmp(&b.id),
                UserSort::EmployeeId => a.employee_id.cmp(&b.employee_id),
                UserSort::Name => a.name.cmp(&b.name),
                UserSort::Email => a.email.cmp(&b.email),
                UserSort::JoinDate => a.join_date.cmp(&b.join_date),
            };
            directed(ordering, query.sort.direction).then(a.id.cmp(&b.id))
        });
        Ok(paginate(users, query.page))
    }

    async fn find_by_division(&self, id: DivisionId) -> OrgdeskResult<Vec<User>> {
        Ok(self
            .lock()
            .users
            .values()
            .filter(|u| u.division_id == Some(id))
            .cloned()
            .collect())
    }

    async fn find_by_position(&self, id: PositionId) -> OrgdeskResult<Vec<User>> {
        Ok(self
            .lock()
            .users
            .values()
            .filter(|u| u.position_id == Some(id))
            .cloned()
            .collect())
    }

    async fn find_by_role(&self, id: RoleId) -> OrgdeskResult<Vec<User>> {
        let tables = self.lock();
        Ok(tables
            .users
            .values()
            .filter(|u| tables.user_roles.iter().any(|(user, role, _)| *user == u.id && *role == id))
            .cloned()
            .collect())
    }

    async fn find_recent(&self, limit: u32) -> OrgdeskResult<Vec<User>> {
        let mut users: Vec<User> = self.lock().users.values().cloned().collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        users.truncate(limit as usize);
        Ok(users)
    }

    async fn role_links(&self, users: &[UserId]) -> OrgdeskResult<Vec<(UserId, RoleId)>> {
        let mut links: Vec<(UserId, RoleId)> = self
            .lock()
            .user_roles
            .iter()
            .filter(|(user, _, _)| users.contains(user))
            .map(|(user, role, _)| (*user, *role))
            .collect();
        links.sort();
        Ok(links)
    }

    async fn insert(&self, user: &NewUser, roles: &[RoleId]) -> OrgdeskResult<User> {
        let mut tables = self.lock();
        if let Some(conflict) = tables.user_conflict(&user.employee_id, &user.email, None) {
            return Err(conflict);
        }

        let now = Utc::now();
        let id = UserId(tables.next_id());
        let created = User {
            id,
            employee_id: user.employee_id.clone(),
            name: user.name.clone(),
            email: user.email.to_lowercase(),
            password_hash: user.password_hash.clone(),
            phone: user.phone.clone(),
            address: user.address.clone(),
            birthdate: user.birthdate,
            join_date: user.join_date,
            profile_image: user.profile_image.clone(),
            division_id: user.division_id,
            position_id: user.position_id,
            is_manager: user.is_manager,
            manager_id: user.manager_id,
            is_active: user.is_active,
            created_by: Some(user.created_by.clone()),
            updated_by: Some(user.created_by.clone()),
            created_at: Some(now),
            updated_at: Some(now),
        };
        tables.users.insert(id, created.clone());
        tables.link_roles(id, roles, Some(&user.created_by));
        Ok(created)
    }

    async fn update(&self, user: &User, roles: Option<&[RoleId]>) -> OrgdeskResult<User> {
        let mut tables = self.lock();
        if !tables.users.contains_key(&user.id) {
            return Err(OrgdeskError::not_found("User"));
        }
        if let Some(conflict) = tables.user_conflict(&user.employee_id, &user.email, Some(user.id)) {
            return Err(conflict);
        }

        let mut updated = user.clone();
        updated.email = updated.email.to_lowercase();
        updated.updated_at = Some(Utc::now());
        tables.users.insert(user.id, updated.clone());

        if let Some(roles) = roles {
            tables
                .user_roles
                .retain(|(u, r, _)| *u != user.id || roles.contains(r));
            tables.link_roles(user.id, roles, user.updated_by.as_deref());
        }
        Ok(updated)
    }

    async fn delete(&self, id: UserId) -> OrgdeskResult<bool> {
        let mut tables = self.lock();
        tables.user_roles.retain(|(u, _, _)| *u != id);
        tables.tokens.retain(|_, t| t.user_id != id);
        Ok(tables.users.remove(&id).is_some())
    }

    async fn count(&self) -> OrgdeskResult<u64> {
        Ok(self.lock().users.len() as u64)
    }

    async fn count_active(&self) -> OrgdeskResult<u64> {
        Ok(self.lock().users.values().filter(|u| u.is_active).count() as u64)
    }

    async fn count_managers(&self) -> OrgdeskResult<u64> {
        Ok(self.lock().users.values().filter(|u| u.is_manager).count() as u64)
    }

    async fn count_subordinates(&self, id: UserId) -> OrgdeskResult<u64> {
        Ok(self
            .lock()
            .users
            .values()
            .filter(|u| u.id != id && u.manager_id == Some(id))
            .count() as u64)
    }
}

#[async_trait]
impl RoleRepository for InMemoryDatabase {
    async fn find_by_id(&self, id: RoleId) -> OrgdeskResult<Option<Role>> {
        Ok(self.lock().roles.get(&id).cloned())
    }

    async fn find_by_ids(&self, ids: &[RoleId]) -> OrgdeskResult<Vec<Role>> {
        let tables = self.lock();
        Ok(tables
            .roles
            .values()
            .filter(|r| ids.contains(&r.id))
            .cloned()
            .collect())
    }

    async fn exists_by_name(&self, name: &str, except: Option<RoleId>) -> OrgdeskResult<bool> {
        Ok(self
            .lock()
            .roles
            .values()
            .any(|r| Some(r.id) != except && r.name == name))
    }

    async fn find_all(&self, query: &ListQuery<RoleSort>) -> OrgdeskResult<Page<RoleSummary>> {
        let tables = self.lock();
        let mut roles: Vec<RoleSummary> = tables
            .roles
            .values()
            .map(|role| RoleSummary {
                role: role.clone(),
                users_count: tables.user_roles.iter().filter(|(_, r, _)| *r == role.id).count() as u64,
            })
            .collect();

        roles.sort_by(|a, b| {
            let ordering = match query.sort.column {
                RoleSort::Id => a.role.id.cmp(&b.role.id),
                RoleSort::Name => a.role.name.cmp(&b.role.name),
                RoleSort::Level => a.role.level.cmp(&b.role.level),
            };
            directed(ordering, query.sort.direction).then(a.role.id.cmp(&b.role.id))
        });
        Ok(paginate(roles, query.page))
    }

    async fn find_active(&self) -> OrgdeskResult<Vec<Role>> {
        Ok(self.lock().roles.values().filter(|r| r.is_active).cloned().collect())
    }

    async fn insert(&self, role: &NewRole) -> OrgdeskResult<Role> {
        let mut tables = self.lock();
        if tables.roles.values().any(|r| r.name == role.name) {
            return Err(OrgdeskError::field("role_name", "The role name has already been taken."));
        }

        let now = Utc::now();
        let id = RoleId(tables.next_id());
        let created = Role {
            id,
            name: role.name.clone(),
            level: role.level,
            is_active: role.is_active,
            created_by: Some(role.created_by.clone()),
            updated_by: Some(role.created_by.clone()),
            created_at: Some(now),
            updated_at: Some(now),
        };
        tables.roles.insert(id, created.clone());
        Ok(created)
    }

    async fn update(&self, role: &Role) -> OrgdeskResult<Role> {
        let mut tables = self.lock();
        if tables.roles.values().any(|r| r.id != role.id && r.name == role.name) {
            return Err(OrgdeskError::field("role_name", "The role name has already been taken."));
        }
        let mut updated = role.clone();
        updated.updated_at = Some(Utc::now());
        tables.roles.insert(role.id, updated.clone());
        Ok(updated)
    }

    async fn delete(&self, id: RoleId) -> OrgdeskResult<bool> {
        Ok(self.lock().roles.remove(&id).is_some())
    }

    async fn count(&self) -> OrgdeskResult<u64> {
        Ok(self.lock().roles.len() as u64)
    }

    async fn count_active(&self) -> OrgdeskResult<u64> {
        Ok(self.lock().roles.values().filter(|r| r.is_active).count() as u64)
    }

    async fn count_users(&self, id: RoleId) -> OrgdeskResult<u64> {
        Ok(self.lock().user_roles.iter().filter(|(_, r, _)| *r == id).count() as u64)
    }
}

macro_rules! catalog_repository {
    ($trait:ident, $entity:ident, $id:ident, $sort:ident, $table:ident, $fk:ident, $field:literal) => {
        #[async_trait]
        impl $trait for InMemoryDatabase {
            async fn find_by_id(&self, id: $id) -> OrgdeskResult<Option<$entity>> {
                Ok(self.lock().$table.get(&id).cloned())
            }

            async fn find_by_ids(&self, ids: &[$id]) -> OrgdeskResult<Vec<$entity>> {
                let tables = self.lock();
                Ok(ids.iter().filter_map(|id| tables.$table.get(id).cloned()).collect())
            }

            async fn exists_by_code(&self, code: &str, except: Option<$id>) -> OrgdeskResult<bool> {
                Ok(self
                    .lock()
                    .$table
                    .values()
                    .any(|e| Some(e.id) != except && e.code == code))
            }

            async fn find_all(&self, query: &ListQuery<$sort>) -> OrgdeskResult<Page<$entity>> {
                let mut entries: Vec<$entity> = self.lock().$table.values().cloned().collect();
                entries.sort_by(|a, b| {
                    let ordering = match query.sort.column {
                        $sort::Id => a.id.cmp(&b.id),
                        $sort::Code => a.code.cmp(&b.code),
                        $sort::Name => a.name.cmp(&b.name),
                    };
                    directed(ordering, query.sort.direction).then(a.id.cmp(&b.id))
                });
                Ok(paginate(entries, query.page))
            }

            async fn find_active(&self) -> OrgdeskResult<Vec<$entity>> {
                Ok(self.lock().$table.values().filter(|e| e.is_active).cloned().collect())
            }

            async fn insert(&self, entry: &NewCatalogEntry) -> OrgdeskResult<$entity> {
                let mut tables = self.lock();
                if tables.$table.values().any(|e| e.code == entry.code) {
                    return Err(OrgdeskError::field($field, taken($field)));
                }

                let now = Utc::now();
                let id = $id(tables.next_id());
                let created = $entity {
                    id,
                    code: entry.code.clone(),
                    name: entry.name.clone(),
                    is_active: entry.is_active,
                    created_by: Some(entry.created_by.clone()),
                    updated_by: Some(entry.created_by.clone()),
                    created_at: Some(now),
                    updated_at: Some(now),
                };
                tables.$table.insert(id, created.clone());
                Ok(created)
            }

            async fn update(&self, entry: &$entity) -> OrgdeskResult<$entity> {
                let mut tables = self.lock();
                if tables.$table.values().any(|e| e.id != entry.id && e.code == entry.code) {
                    return Err(OrgdeskError::field($field, taken($field)));
                }
                let mut updated = entry.clone();
                updated.updated_at = Some(Utc::now());
                tables.$table.insert(entry.id, updated.clone());
                Ok(updated)
            }

            async fn delete(&self, id: $id) -> OrgdeskResult<bool> {
                Ok(self.lock().$table.remove(&id).is_some())
            }

            async fn count(&self) -> OrgdeskResult<u64> {
                Ok(self.lock().$table.len() as u64)
            }

            async fn count_active(&self) -> OrgdeskResult<u64> {
                Ok(self.lock().$table.values().filter(|e| e.is_active).count() as u64)
            }

            async fn count_users(&self, id: $id) -> OrgdeskResult<u64> {
                Ok(self.lock().users.values().filter(|u| u.$fk == Some(id)).count() as u64)
            }

            async fn user_counts(&self) -> OrgdeskResult<Vec<GroupCount>> {
                let tables = self.lock();
                Ok(tables
                    .$table
                    .values()
                    .map(|e| GroupCount {
                        name: e.name.clone(),
                        count: tables.users.values().filter(|u| u.$fk == Some(e.id)).count() as u64,
                    })
                    .collect())
            }
        }
    };
}

fn taken(field: &str) -> String {
    format!("The {} has already been taken.", field.replace('_', " "))
}

catalog_repository!(DivisionRepository, Division, DivisionId, DivisionSort, divisions, division_id, "div_code");
catalog_repository!(PositionRepository, Position, PositionId, PositionSort, positions, position_id, "pos_code");

#[async_trait]
impl AccessTokenRepository for InMemoryDatabase {
    async fn insert(&self, token: &NewAccessToken) -> OrgdeskResult<AccessToken> {
        let mut tables = self.lock();
        let id = AccessTokenId(tables.next_id());
        let created = AccessToken {
            id,
            user_id: token.user_id,
            name: token.name.clone(),
            token_hash: token.token_hash.clone(),
            last_used_at: None,
            expires_at: token.expires_at,
            created_at: Some(Utc::now()),
        };
        tables.tokens.insert(id, created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: AccessTokenId) -> OrgdeskResult<Option<AccessToken>> {
        Ok(self.lock().tokens.get(&id).cloned())
    }

    async fn find_by_hash(&self, token_hash: &str) -> OrgdeskResult<Option<AccessToken>> {
        Ok(self
            .lock()
            .tokens
            .values()
            .find(|t| t.token_hash == token_hash)
            .cloned())
    }

    async fn touch(&self, id: AccessTokenId, at: DateTime<Utc>) -> OrgdeskResult<()> {
        if let Some(token) = self.lock().tokens.get_mut(&id) {
            token.last_used_at = Some(at);
        }
        Ok(())
    }

    async fn delete(&self, id: AccessTokenId) -> OrgdeskResult<bool> {
        Ok(self.lock().tokens.remove(&id).is_some())
    }

    async fn delete_for_user(&self, user_id: UserId) -> OrgdeskResult<u64> {
        let mut tables = self.lock();
        let before = tables.tokens.len();
        tables.tokens.retain(|_, t| t.user_id != user_id);
        Ok((before - tables.tokens.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use orgdesk_core::{ListParams, PagingPolicy};

    fn new_user(employee_id: &str, email: &str) -> NewUser {
        NewUser {
            employee_id: employee_id.to_string(),
            name: format!("User {employee_id}"),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            phone: None,
            address: None,
            birthdate: None,
            join_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            profile_image: None,
            division_id: None,
            position_id: None,
            is_manager: false,
            manager_id: None,
            is_active: true,
            created_by: "system".to_string(),
        }
    }

    #[tokio::test]
    async fn test_user_unique_keys() {
        let db = InMemoryDatabase::new();
        UserRepository::insert(&db, &new_user("E1", "a@x.com"), &[]).await.unwrap();
        let err = UserRepository::insert(&db, &new_user("E2", "A@X.com"), &[]).await.unwrap_err();
        assert!(err.field_errors().unwrap().contains_key("u_email"));
    }

    #[tokio::test]
    async fn test_user_role_sync() {
        let db = InMemoryDatabase::new();
        let user = UserRepository::insert(&db, &new_user("E1", "a@x.com"), &[RoleId(1), RoleId(2)])
            .await
            .unwrap();
        UserRepository::update(&db, &user, Some(&[RoleId(2), RoleId(3)])).await.unwrap();
        let links = db.role_links(&[user.id]).await.unwrap();
        assert_eq!(links, vec![(user.id, RoleId(2)), (user.id, RoleId(3))]);

        UserRepository::delete(&db, user.id).await.unwrap();
        assert!(db.role_links(&[user.id]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_user_search_and_sort() {
        let db = InMemoryDatabase::new();
        UserRepository::insert(&db, &new_user("E2", "zed@x.com"), &[]).await.unwrap();
        UserRepository::insert(&db, &new_user("E1", "amy@x.com"), &[]).await.unwrap();

        let params = ListParams {
            sort_by: Some("u_employee_id".to_string()),
            ..ListParams::default()
        };
        let page = UserRepository::find_all(&db, &ListQuery::from_params(&params, PagingPolicy::default()))
            .await
            .unwrap();
        assert_eq!(page.data[0].employee_id, "E1");

        let params = ListParams {
            search: Some("ZED".to_string()),
            ..ListParams::default()
        };
        let page = UserRepository::find_all(&db, &ListQuery::from_params(&params, PagingPolicy::default()))
            .await
            .unwrap();
        assert_eq!(page.total, 1);
    }
}
