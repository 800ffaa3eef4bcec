use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use westeros_auth::{NewUser, User};
use westeros_core::{CharacterId, HouseId, UserId};
use westeros_houses::{Character, CharacterData, House, HouseData};

use super::r#trait::{HouseStore, Page, StoreError, UserStore};

#[derive(Debug, Default)]
struct State {
    users: BTreeMap<UserId, User>,
    houses: BTreeMap<HouseId, House>,
    last_user_id: i64,
    last_house_id: i64,
    last_character_id: i64,
}

/// In-memory user and house store.
///
/// Intended for tests/dev. Ids start at 1 and are never reused, like a
/// database sequence.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>, StoreError> {
        self.state
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>, StoreError> {
        self.state
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }
}

fn paginate<T: Clone>(values: impl Iterator<Item = T>, page: Page) -> Vec<T> {
    values
        .skip(page.skip as usize)
        .take(page.limit as usize)
        .collect()
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let mut state = self.write()?;

        if state.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict(format!(
                "email '{}' already registered",
                user.email
            )));
        }

        state.last_user_id += 1;
        let created = User {
            id: UserId::new(state.last_user_id),
            email: user.email,
            hashed_password: user.hashed_password,
            is_active: user.is_active,
            scopes: user.scopes.to_string(),
        };
        state.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.read()?.users.get(&id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.read()?.users.values().find(|u| u.email == email).cloned())
    }

    async fn list(&self, page: Page) -> Result<Vec<User>, StoreError> {
        Ok(paginate(self.read()?.users.values().cloned(), page))
    }

    async fn delete(&self, id: UserId) -> Result<u64, StoreError> {
        Ok(self.write()?.users.remove(&id).map_or(0, |_| 1))
    }
}

#[async_trait]
impl HouseStore for InMemoryStore {
    async fn create(&self, house: HouseData) -> Result<House, StoreError> {
        let mut state = self.write()?;

        if state.houses.values().any(|h| h.name == house.name) {
            return Err(StoreError::Conflict(format!(
                "house '{}' already registered",
                house.name
            )));
        }

        state.last_house_id += 1;
        let created = House::from_data(HouseId::new(state.last_house_id), house);
        state.houses.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get(&self, id: HouseId) -> Result<Option<House>, StoreError> {
        Ok(self.read()?.houses.get(&id).cloned())
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<House>, StoreError> {
        Ok(self.read()?.houses.values().find(|h| h.name == name).cloned())
    }

    async fn list(&self, page: Page) -> Result<Vec<House>, StoreError> {
        Ok(paginate(self.read()?.houses.values().cloned(), page))
    }

    async fn update(&self, id: HouseId, house: HouseData) -> Result<Option<House>, StoreError> {
        let mut state = self.write()?;

        if state
            .houses
            .values()
            .any(|h| h.id != id && h.name == house.name)
        {
            return Err(StoreError::Conflict(format!(
                "house '{}' already registered",
                house.name
            )));
        }

        Ok(state.houses.get_mut(&id).map(|existing| {
            existing.apply(house);
            existing.clone()
        }))
    }

    async fn delete(&self, id: HouseId) -> Result<u64, StoreError> {
        Ok(self.write()?.houses.remove(&id).map_or(0, |_| 1))
    }

    async fn add_member(&self, house_id: HouseId, character: CharacterData) -> Result<Character, StoreError> {
        let mut state = self.write()?;

        if !state.houses.contains_key(&house_id) {
            return Err(StoreError::NotFound);
        }

        state.last_character_id += 1;
        let created = Character::from_data(CharacterId::new(state.last_character_id), house_id, character);
        if let Some(house) = state.houses.get_mut(&house_id) {
            house.members.push(created.clone());
        }
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use westeros_auth::{ScopeSet, SecretHash};

    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            hashed_password: SecretHash::new("hash"),
            is_active: true,
            scopes: ScopeSet::parse("houses:read users:read"),
        }
    }

    fn house(name: &str) -> HouseData {
        HouseData {
            name: name.to_string(),
            words: Some("Words".to_string()),
            description: Some("Description".to_string()),
        }
    }

    fn member(name: &str) -> CharacterData {
        CharacterData {
            name: name.to_string(),
            titles: None,
            description: None,
        }
    }

    #[tokio::test]
    async fn user_crud() {
        let store = InMemoryStore::new();

        let created = UserStore::create(&store, new_user("test@domain.com")).await.unwrap();
        assert_eq!(created.id, UserId::new(1));
        assert!(created.is_active);
        assert_eq!(created.scopes, "houses:read users:read");

        let by_id = UserStore::get(&store, created.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, "test@domain.com");
        let by_email = store.get_by_email("test@domain.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, created.id);

        assert_eq!(UserStore::list(&store, Page::default()).await.unwrap().len(), 1);
        assert_eq!(UserStore::delete(&store, created.id).await.unwrap(), 1);
        assert_eq!(UserStore::delete(&store, created.id).await.unwrap(), 0);
        assert!(store.get_by_email("test@domain.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let store = InMemoryStore::new();
        UserStore::create(&store, new_user("a@b.c")).await.unwrap();

        let err = UserStore::create(&store, new_user("a@b.c")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn ids_are_not_reused() {
        let store = InMemoryStore::new();
        let first = UserStore::create(&store, new_user("a@b.c")).await.unwrap();
        UserStore::delete(&store, first.id).await.unwrap();

        let second = UserStore::create(&store, new_user("a@b.c")).await.unwrap();
        assert_eq!(second.id, UserId::new(2));
    }

    #[tokio::test]
    async fn pagination_skips_and_limits() {
        let store = InMemoryStore::new();
        for name in ["Stark", "Lannister", "Targaryen", "Baratheon"] {
            HouseStore::create(&store, house(name)).await.unwrap();
        }

        let page = HouseStore::list(&store, Page { skip: 1, limit: 2 }).await.unwrap();
        let names: Vec<_> = page.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["Lannister", "Targaryen"]);
    }

    #[tokio::test]
    async fn house_lifecycle_with_members() {
        let store = InMemoryStore::new();

        let created = HouseStore::create(&store, house("Test House")).await.unwrap();
        assert!(created.members.is_empty());
        assert_eq!(created.words.as_deref(), Some("Words"));

        let character = store.add_member(created.id, member("Test Character")).await.unwrap();
        assert_eq!(character.house_id, created.id);

        let loaded = store.get_by_name("Test House").await.unwrap().unwrap();
        assert_eq!(loaded.members, vec![character]);

        let updated = store
            .update(created.id, house("New Name"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.name, "New Name");
        assert_eq!(updated.members.len(), 1);
        assert!(store.get_by_name("Test House").await.unwrap().is_none());

        assert_eq!(HouseStore::delete(&store, created.id).await.unwrap(), 1);
        assert!(HouseStore::get(&store, created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn add_member_to_missing_house_is_not_found() {
        let store = InMemoryStore::new();
        let err = store.add_member(HouseId::new(42), member("Ghost")).await.unwrap_err();
        assert_eq!(err, StoreError::NotFound);
    }

    #[tokio::test]
    async fn update_rejects_taking_another_houses_name() {
        let store = InMemoryStore::new();
        HouseStore::create(&store, house("Stark")).await.unwrap();
        let lannister = HouseStore::create(&store, house("Lannister")).await.unwrap();

        let err = store.update(lannister.id, house("Stark")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        // Renaming to its own name is fine.
        assert!(store.update(lannister.id, house("Lannister")).await.unwrap().is_some());
        assert!(store.update(HouseId::new(99), house("Tully")).await.unwrap().is_none());
    }
}
