//! Typed wrappers over the club backend endpoints.

use chrono::NaiveDate;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

use super::filters::{EventFilters, FileFilters, NotificationFilters};
use super::types::{
  AccessCode, AccessCodeResult, Event, FacilitySchedule, Facility, FileEntry, LegalDocument,
  LegalDocumentKind, LoginRequest, LoginResponse, Member, Notification, Reservation,
  ReservationRequest, Statement, Survey, SurveyAnswer, UnreadCount,
};
use crate::api::{ApiError, ApiRequest, Gateway, Page};
use crate::cache::{FetchRequest, ListFilters};
use crate::store::{keys, KvStore};

/// Club API client.
#[derive(Clone)]
pub struct ClubClient {
  gateway: Gateway,
  store: Arc<dyn KvStore>,
}

impl ClubClient {
  pub fn new(gateway: Gateway, store: Arc<dyn KvStore>) -> Self {
    Self { gateway, store }
  }

  pub fn gateway(&self) -> &Gateway {
    &self.gateway
  }

  // ==========================================================================
  // Session
  // ==========================================================================

  /// Sign in and store the returned credentials.
  pub async fn login(&self, email: &str, password: &str) -> Result<Member, ApiError> {
    let req = ApiRequest::post("/auth/login")
      .json(&LoginRequest { email, password })?
      .public();
    let resp: LoginResponse = self.gateway.call(req).await?;

    self
      .gateway
      .session()
      .store_tokens(&resp.token, resp.refresh_token.as_deref())
      .map_err(|e| ApiError::Unexpected(format!("failed to store session: {}", e)))?;
    info!(member = %resp.user.member_number, "logged in");
    Ok(resp.user)
  }

  /// Sign out. Local credentials are cleared even if the server call fails.
  pub async fn logout(&self) -> Result<(), ApiError> {
    let server = self.gateway.call::<()>(ApiRequest::post("/auth/logout")).await;
    if let Err(e) = &server {
      warn!("logout request failed, clearing local session anyway: {}", e);
    }

    self
      .gateway
      .session()
      .clear()
      .map_err(|e| ApiError::Unexpected(format!("failed to clear session: {}", e)))?;
    if let Err(e) = self.store.remove(keys::CACHED_QR_DATA) {
      warn!("failed to drop cached access code: {}", e);
    }

    match server {
      Err(ApiError::Unauthorized) | Ok(()) => Ok(()),
      Err(e) => Err(e),
    }
  }

  pub async fn forgot_password(&self, email: &str) -> Result<Option<String>, ApiError> {
    let req = ApiRequest::post("/auth/forgot-password")
      .json(&json!({ "email": email }))?
      .public();
    Ok(self.gateway.send::<()>(req).await?.message)
  }

  pub async fn reset_password(
    &self,
    token: &str,
    new_password: &str,
  ) -> Result<Option<String>, ApiError> {
    let req = ApiRequest::post("/auth/reset-password")
      .json(&json!({ "token": token, "password": new_password }))?
      .public();
    Ok(self.gateway.send::<()>(req).await?.message)
  }

  pub async fn me(&self) -> Result<Member, ApiError> {
    self.gateway.call(ApiRequest::get("/members/me")).await
  }

  // ==========================================================================
  // Paginated lists
  // ==========================================================================

  pub async fn list_events(&self, req: FetchRequest<EventFilters>) -> Result<Page<Event>, ApiError> {
    self.list("/events", req).await
  }

  pub async fn list_notifications(
    &self,
    req: FetchRequest<NotificationFilters>,
  ) -> Result<Page<Notification>, ApiError> {
    self.list("/notifications", req).await
  }

  pub async fn list_files(&self, req: FetchRequest<FileFilters>) -> Result<Page<FileEntry>, ApiError> {
    self.list("/files", req).await
  }

  async fn list<F, T>(&self, path: &str, req: FetchRequest<F>) -> Result<Page<T>, ApiError>
  where
    F: ListFilters,
    T: serde::de::DeserializeOwned,
  {
    let request = ApiRequest::get(path)
      .query(req.filters.query_params())
      .query([
        ("page", req.page.to_string()),
        ("limit", req.limit.to_string()),
      ]);
    self.gateway.call(request).await
  }

  // ==========================================================================
  // Events
  // ==========================================================================

  pub async fn get_event(&self, id: &str) -> Result<Event, ApiError> {
    self.gateway.call(ApiRequest::get(format!("/events/{}", id))).await
  }

  pub async fn register_for_event(&self, id: &str) -> Result<Option<String>, ApiError> {
    let req = ApiRequest::post(format!("/events/{}/register", id));
    Ok(self.gateway.send::<serde_json::Value>(req).await?.message)
  }

  pub async fn cancel_event_registration(&self, id: &str) -> Result<Option<String>, ApiError> {
    let req = ApiRequest::delete(format!("/events/{}/register", id));
    Ok(self.gateway.send::<serde_json::Value>(req).await?.message)
  }

  // ==========================================================================
  // Notifications
  // ==========================================================================

  pub async fn mark_notification_read(&self, id: &str) -> Result<(), ApiError> {
    self
      .gateway
      .call(ApiRequest::put(format!("/notifications/{}/read", id)))
      .await
  }

  pub async fn mark_all_notifications_read(&self) -> Result<(), ApiError> {
    self
      .gateway
      .call(ApiRequest::put("/notifications/read-all"))
      .await
  }

  pub async fn unread_notifications(&self) -> Result<u64, ApiError> {
    let count: UnreadCount = self
      .gateway
      .call(ApiRequest::get("/notifications/unread-count"))
      .await?;
    Ok(count.unread)
  }

  // ==========================================================================
  // Statements and surveys
  // ==========================================================================

  pub async fn list_statements(&self, year: Option<i32>) -> Result<Vec<Statement>, ApiError> {
    let mut req = ApiRequest::get("/statements");
    if let Some(year) = year {
      req = req.query([("year", year.to_string())]);
    }
    self.gateway.call(req).await
  }

  pub async fn list_surveys(&self) -> Result<Vec<Survey>, ApiError> {
    self.gateway.call(ApiRequest::get("/surveys")).await
  }

  pub async fn submit_survey(
    &self,
    id: &str,
    answers: &[SurveyAnswer],
  ) -> Result<Option<String>, ApiError> {
    let req = ApiRequest::post(format!("/surveys/{}/responses", id))
      .json(&json!({ "answers": answers }))?;
    Ok(self.gateway.send::<serde_json::Value>(req).await?.message)
  }

  // ==========================================================================
  // QR access code
  // ==========================================================================

  /// Fetch the member's access code, falling back to the cached one when the
  /// server cannot be reached.
  pub async fn access_code(&self) -> Result<AccessCodeResult, ApiError> {
    match self
      .gateway
      .call::<AccessCode>(ApiRequest::get("/members/me/access-code"))
      .await
    {
      Ok(code) => {
        match serde_json::to_string(&code) {
          Ok(blob) => {
            if let Err(e) = self.store.set(keys::CACHED_QR_DATA, &blob) {
              warn!("failed to cache access code: {}", e);
            }
          }
          Err(e) => warn!("failed to serialize access code: {}", e),
        }
        Ok(AccessCodeResult {
          code,
          from_cache: false,
        })
      }
      Err(ApiError::Offline(reason)) => match self.cached_access_code() {
        Some(code) => {
          info!("serving cached access code while offline");
          Ok(AccessCodeResult {
            code,
            from_cache: true,
          })
        }
        None => Err(ApiError::Offline(reason)),
      },
      Err(e) => Err(e),
    }
  }

  fn cached_access_code(&self) -> Option<AccessCode> {
    let blob = self.store.get(keys::CACHED_QR_DATA).ok().flatten()?;
    serde_json::from_str(&blob).ok()
  }

  // ==========================================================================
  // Reservations
  // ==========================================================================

  pub async fn list_facilities(&self) -> Result<Vec<Facility>, ApiError> {
    self.gateway.call(ApiRequest::get("/facilities")).await
  }

  pub async fn facility_schedule(
    &self,
    facility_id: &str,
    date: NaiveDate,
  ) -> Result<FacilitySchedule, ApiError> {
    let req = ApiRequest::get(format!("/facilities/{}/schedule", facility_id))
      .query([("date", date.format("%Y-%m-%d").to_string())]);
    self.gateway.call(req).await
  }

  pub async fn my_reservations(&self) -> Result<Vec<Reservation>, ApiError> {
    self.gateway.call(ApiRequest::get("/reservations/me")).await
  }

  pub async fn create_reservation(
    &self,
    request: &ReservationRequest,
  ) -> Result<Reservation, ApiError> {
    let req = ApiRequest::post("/reservations").json(request)?;
    self.gateway.call(req).await
  }

  pub async fn cancel_reservation(&self, id: &str) -> Result<(), ApiError> {
    self
      .gateway
      .call(ApiRequest::delete(format!("/reservations/{}", id)))
      .await
  }

  // ==========================================================================
  // Public documents
  // ==========================================================================

  pub async fn legal_document(&self, kind: LegalDocumentKind) -> Result<LegalDocument, ApiError> {
    let req = ApiRequest::get(format!("/legal/{}", kind.slug())).public();
    self.gateway.call(req).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::testing::serve;
  use crate::cache::SnapshotStore;
  use crate::club::feeds::ClubFeeds;
  use crate::config::{ApiConfig, CacheConfig};
  use crate::store::{MemoryKvStore, Session};
  use tokio::net::TcpListener;

  const EMPTY_PAGE: &str =
    r#"{"success":true,"data":{"items":[],"pagination":{"page":1,"limit":20,"total":0,"totalPages":0}}}"#;

  fn client_for(base_url: &str, store: Arc<MemoryKvStore>) -> ClubClient {
    let config = ApiConfig {
      base_url: base_url.to_string(),
      timeout_secs: 5,
    };
    let gateway = Gateway::new(&config, Session::new(store.clone())).unwrap();
    ClubClient::new(gateway, store)
  }

  /// First line of a raw HTTP request, e.g. `GET /api/v1/events?page=1 HTTP/1.1`.
  fn request_line(raw: &str) -> &str {
    raw.lines().next().unwrap_or_default()
  }

  async fn offline_client(store: Arc<MemoryKvStore>) -> ClubClient {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = ApiConfig {
      base_url: format!("http://{}", addr),
      timeout_secs: 5,
    };
    let gateway = Gateway::new(&config, Session::new(store.clone())).unwrap();
    ClubClient::new(gateway, store)
  }

  #[tokio::test]
  async fn test_access_code_falls_back_to_cache_when_offline() {
    let store = Arc::new(MemoryKvStore::new());
    store
      .set(
        keys::CACHED_QR_DATA,
        r#"{"payload":"MEMBER-42-XYZ","expiresAt":null}"#,
      )
      .unwrap();
    let client = offline_client(store).await;

    let result = client.access_code().await.unwrap();
    assert!(result.from_cache);
    assert_eq!(result.code.payload, "MEMBER-42-XYZ");
  }

  #[tokio::test]
  async fn test_access_code_offline_without_cache() {
    let client = offline_client(Arc::new(MemoryKvStore::new())).await;
    assert!(client.access_code().await.unwrap_err().is_offline());
  }

  #[tokio::test]
  async fn test_logout_clears_session_when_offline() {
    let store = Arc::new(MemoryKvStore::new());
    store.set(keys::AUTH_TOKEN, "tok").unwrap();
    store.set(keys::CACHED_QR_DATA, "{}").unwrap();
    let client = offline_client(store.clone()).await;

    assert!(client.logout().await.unwrap_err().is_offline());
    assert_eq!(store.get(keys::AUTH_TOKEN).unwrap(), None);
    assert_eq!(store.get(keys::CACHED_QR_DATA).unwrap(), None);
  }

  #[tokio::test]
  async fn test_login_stores_token_and_refresh_token() {
    let (url, server) = serve(vec![(
      200,
      r#"{"success":true,"data":{"token":"tok-1","refreshToken":"ref-1","user":{"id":"u1","memberNumber":"A-100","firstName":"Ana","lastName":"Paz","email":"ana@club.example"}}}"#,
    )])
    .await;
    let store = Arc::new(MemoryKvStore::new());
    store.set(keys::AUTH_TOKEN, "old-token").unwrap();
    let client = client_for(&url, store.clone());

    let member = client.login("ana@club.example", "secret").await.unwrap();
    assert_eq!(member.full_name(), "Ana Paz");
    assert_eq!(store.get(keys::AUTH_TOKEN).unwrap().as_deref(), Some("tok-1"));
    assert_eq!(store.get(keys::REFRESH_TOKEN).unwrap().as_deref(), Some("ref-1"));

    let requests = server.await.unwrap();
    assert_eq!(request_line(&requests[0]), "POST /api/v1/auth/login HTTP/1.1");
    // Login is public, the stale token must not be sent.
    assert!(!requests[0].to_lowercase().contains("authorization:"));
  }

  #[tokio::test]
  async fn test_list_events_query_string() {
    let (url, server) = serve(vec![(200, EMPTY_PAGE), (200, EMPTY_PAGE)]).await;
    let client = client_for(&url, Arc::new(MemoryKvStore::new()));

    let mut filters = EventFilters::default();
    filters.set("search", "yoga").unwrap();
    client
      .list_events(FetchRequest {
        filters,
        page: 2,
        limit: 10,
      })
      .await
      .unwrap();

    let mut filters = EventFilters::default();
    filters.set("category", "SPORT").unwrap();
    filters.set("dateFrom", "2024-06-01").unwrap();
    client
      .list_events(FetchRequest {
        filters,
        page: 1,
        limit: 20,
      })
      .await
      .unwrap();

    let requests = server.await.unwrap();
    // Default "Todos" category is not sent.
    assert_eq!(
      request_line(&requests[0]),
      "GET /api/v1/events?search=yoga&page=2&limit=10 HTTP/1.1"
    );
    assert_eq!(
      request_line(&requests[1]),
      "GET /api/v1/events?category=SPORT&dateFrom=2024-06-01&page=1&limit=20 HTTP/1.1"
    );
  }

  #[tokio::test]
  async fn test_list_files_query_string() {
    let (url, server) = serve(vec![(200, EMPTY_PAGE)]).await;
    let client = client_for(&url, Arc::new(MemoryKvStore::new()));

    let mut filters = FileFilters::default();
    filters.set("search", "acta").unwrap();
    filters.set("folder", "Actas").unwrap();
    filters.set("sort", "name").unwrap();
    let page = client
      .list_files(FetchRequest {
        filters,
        page: 3,
        limit: 5,
      })
      .await
      .unwrap();
    assert!(page.items.is_empty());

    let requests = server.await.unwrap();
    assert_eq!(
      request_line(&requests[0]),
      "GET /api/v1/files?search=acta&folder=Actas&sort=name&page=3&limit=5 HTTP/1.1"
    );
  }

  #[tokio::test]
  async fn test_logout_forgets_previous_members_lists() {
    let (url, server) = serve(vec![
      (
        200,
        r#"{"success":true,"data":{"items":[{"id":"n1","title":"Cuota","body":"Member A owes 500","read":false,"createdAt":"2024-05-01T10:00:00Z"}],"pagination":{"page":1,"limit":20,"total":1,"totalPages":1}}}"#,
      ),
      (200, r#"{"success":true,"message":"bye"}"#),
    ])
    .await;
    let store = Arc::new(MemoryKvStore::new());
    store.set(keys::AUTH_TOKEN, "member-a").unwrap();
    let client = client_for(&url, store.clone());
    let config = CacheConfig::default();

    let feeds = ClubFeeds::new(&config, Some(SnapshotStore::new(store.clone())));
    feeds.load_notifications(&client, false).await;

    let warm = ClubFeeds::new(&config, Some(SnapshotStore::new(store.clone())));
    warm.restore_snapshots();
    assert_eq!(warm.notifications.items().len(), 1);

    client.logout().await.unwrap();
    server.await.unwrap();

    let next = ClubFeeds::new(&config, Some(SnapshotStore::new(store.clone())));
    next.restore_snapshots();
    assert!(next.notifications.items().is_empty());
    assert!(next.events.items().is_empty());
  }
}
