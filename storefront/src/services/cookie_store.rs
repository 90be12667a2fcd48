// storefront/src/services/cookie_store.rs

//! The visitor's cookie jar as a `LocalStore`. Values are read from the
//! request; writes are buffered and turned into `Set-Cookie` headers on the
//! response.

use actix_web::cookie::{time::Duration, Cookie, SameSite};
use actix_web::http::header::{HeaderValue, SET_COOKIE};
use actix_web::{HttpRequest, HttpResponse};
use karat::{KaratResult, LocalStore};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use tracing::warn;

const COOKIE_PREFIX: &str = "karat_";
const COOKIE_MAX_AGE_DAYS: i64 = 365;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Pending {
  Set(String),
  Remove,
}

#[derive(Debug, Default)]
pub struct VisitorCookies {
  current: Mutex<BTreeMap<String, String>>,
  pending: Mutex<BTreeMap<String, Pending>>,
}

impl VisitorCookies {
  pub fn from_request(req: &HttpRequest) -> Self {
    let current = match req.cookies() {
      Ok(cookies) => cookies
        .iter()
        .filter_map(|c| {
          c.name()
            .strip_prefix(COOKIE_PREFIX)
            .map(|key| (key.to_string(), c.value().to_string()))
        })
        .collect(),
      Err(e) => {
        warn!(error = %e, "Unreadable cookie header; treating visitor as new.");
        BTreeMap::new()
      }
    };
    Self {
      current: Mutex::new(current),
      pending: Mutex::new(BTreeMap::new()),
    }
  }

  /// Attaches every buffered write to `response`.
  pub fn apply(&self, response: &mut HttpResponse) {
    for (key, change) in self.pending.lock().iter() {
      let name = format!("{}{}", COOKIE_PREFIX, key);
      let cookie = match change {
        Pending::Set(value) => Cookie::build(name, value.clone())
          .path("/")
          .http_only(true)
          .same_site(SameSite::Lax)
          .max_age(Duration::days(COOKIE_MAX_AGE_DAYS))
          .finish(),
        Pending::Remove => {
          let mut c = Cookie::build(name, "").path("/").finish();
          c.make_removal();
          c
        }
      };
      // Profile values are JSON; percent-encode so they survive the header.
      match HeaderValue::from_str(&cookie.encoded().to_string()) {
        Ok(value) => {
          response.headers_mut().append(SET_COOKIE, value);
        }
        Err(e) => warn!(error = %e, cookie = key.as_str(), "Failed to attach cookie."),
      }
    }
  }
}

impl LocalStore for VisitorCookies {
  fn get(&self, key: &str) -> KaratResult<Option<String>> {
    Ok(self.current.lock().get(key).cloned())
  }

  fn set(&self, key: &str, value: &str) -> KaratResult<()> {
    self.current.lock().insert(key.to_string(), value.to_string());
    self.pending.lock().insert(key.to_string(), Pending::Set(value.to_string()));
    Ok(())
  }

  fn remove(&self, key: &str) -> KaratResult<()> {
    self.current.lock().remove(key);
    self.pending.lock().insert(key.to_string(), Pending::Remove);
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use actix_web::test::TestRequest;

  #[test]
  fn reads_prefixed_cookies_and_emits_writes() {
    let req = TestRequest::default()
      .cookie(Cookie::new("karat_form_submitted", "true"))
      .cookie(Cookie::new("other", "x"))
      .to_http_request();
    let jar = VisitorCookies::from_request(&req);
    assert_eq!(jar.get("form_submitted").unwrap().as_deref(), Some("true"));
    assert_eq!(jar.get("other").unwrap(), None);

    let profile = r#"{"name":"Asha Rao","phone":"98765 43210"}"#;
    jar.set("user_profile", profile).unwrap();
    let mut resp = HttpResponse::Ok().finish();
    jar.apply(&mut resp);
    let set: Vec<_> = resp.cookies().collect();
    assert_eq!(set.len(), 1);
    assert_eq!(set[0].name(), "karat_user_profile");
    assert!(set[0].value().contains("Asha"));
    assert_eq!(jar.get("user_profile").unwrap().as_deref(), Some(profile));
  }
}
