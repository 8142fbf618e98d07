//! `CareClient`: the pre-configured handle every resource service goes through.

use crate::auth::AuthService;
use crate::backend::{Backend, MemoryBackend};
use crate::cache::QueryCache;
use crate::realtime::Realtime;
use crate::service::{
    ActivitiesService, AnnouncementsService, ChildrenService, ClassroomsService, DocumentsService,
    MealsService, MessagesService, NotificationsService, SettingsService, UsersService,
    WellbeingService,
};
use crate::storage::{MemoryStorage, Storage};
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct CareClient {
    backend: Arc<dyn Backend>,
    storage: Arc<dyn Storage>,
    cache: Arc<QueryCache>,
    realtime: Realtime,
    signed_url_ttl: Duration,
}

impl CareClient {
    pub fn new(backend: Arc<dyn Backend>, storage: Arc<dyn Storage>, realtime: Realtime) -> Self {
        CareClient {
            backend,
            storage,
            cache: Arc::new(QueryCache::default()),
            realtime,
            signed_url_ttl: Duration::from_secs(3600),
        }
    }

    /// Memory backend wired to its own realtime hub, plus memory storage.
    pub fn in_memory() -> Self {
        let realtime = Realtime::new();
        let backend = Arc::new(MemoryBackend::with_realtime(realtime.clone()));
        CareClient::new(backend, Arc::new(MemoryStorage::new()), realtime)
    }

    pub fn with_cache(mut self, cache: QueryCache) -> Self {
        self.cache = Arc::new(cache);
        self
    }

    pub fn with_signed_url_ttl(mut self, ttl: Duration) -> Self {
        self.signed_url_ttl = ttl;
        self
    }

    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    pub fn storage(&self) -> &dyn Storage {
        self.storage.as_ref()
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub(crate) fn cache_handle(&self) -> Arc<QueryCache> {
        self.cache.clone()
    }

    pub fn realtime(&self) -> &Realtime {
        &self.realtime
    }

    pub fn signed_url_ttl(&self) -> Duration {
        self.signed_url_ttl
    }

    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(self)
    }

    pub fn children(&self) -> ChildrenService<'_> {
        ChildrenService::new(self)
    }

    pub fn classrooms(&self) -> ClassroomsService<'_> {
        ClassroomsService::new(self)
    }

    pub fn meals(&self) -> MealsService<'_> {
        MealsService::new(self)
    }

    pub fn activities(&self) -> ActivitiesService<'_> {
        ActivitiesService::new(self)
    }

    pub fn messages(&self) -> MessagesService<'_> {
        MessagesService::new(self)
    }

    pub fn announcements(&self) -> AnnouncementsService<'_> {
        AnnouncementsService::new(self)
    }

    pub fn wellbeing(&self) -> WellbeingService<'_> {
        WellbeingService::new(self)
    }

    pub fn documents(&self) -> DocumentsService<'_> {
        DocumentsService::new(self)
    }

    pub fn notifications(&self) -> NotificationsService<'_> {
        NotificationsService::new(self)
    }

    pub fn users(&self) -> UsersService<'_> {
        UsersService::new(self)
    }

    pub fn settings(&self) -> SettingsService<'_> {
        SettingsService::new(self)
    }
}
