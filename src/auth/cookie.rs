//! Defines functions for carrying the session ID in a private cookie.

use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, SameSite},
};
use time::{Duration, OffsetDateTime};

use crate::auth::SessionId;

pub(crate) const COOKIE_SESSION: &str = "sid";

/// Add the session cookie to the cookie jar, expiring at `expiry`.
///
/// The identity provider integration calls this after [crate::create_session]
/// so browsers are authenticated without a bearer header.
///
/// Returns the cookie jar with the cookie added.
pub fn set_session_cookie(
    jar: PrivateCookieJar,
    session_id: &SessionId,
    expiry: OffsetDateTime,
) -> PrivateCookieJar {
    jar.add(
        Cookie::build((COOKIE_SESSION, session_id.as_str().to_owned()))
            .path("/")
            .expires(expiry)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    )
}

/// Set the session cookie to an invalid value and set its max age to zero, which should delete
/// the cookie on the client side.
pub(crate) fn invalidate_session_cookie(jar: PrivateCookieJar) -> PrivateCookieJar {
    jar.add(
        Cookie::build((COOKIE_SESSION, "deleted"))
            .path("/")
            .expires(OffsetDateTime::UNIX_EPOCH)
            .max_age(Duration::ZERO)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    )
}

/// The session ID in the session cookie, if there is one.
pub(crate) fn get_session_id_from_cookie(jar: &PrivateCookieJar) -> Option<SessionId> {
    jar.get(COOKIE_SESSION)
        .map(|cookie| SessionId::new(cookie.value_trimmed()))
}

#[cfg(test)]
mod cookie_tests {
    use axum_extra::extract::{PrivateCookieJar, cookie::SameSite};
    use time::{Duration, OffsetDateTime};

    use crate::{app_state::create_cookie_key, auth::SessionId};

    use super::{
        COOKIE_SESSION, get_session_id_from_cookie, invalidate_session_cookie, set_session_cookie,
    };

    fn get_jar() -> PrivateCookieJar {
        PrivateCookieJar::new(create_cookie_key("42"))
    }

    #[test]
    fn set_session_cookie_round_trips_id() {
        let expiry = OffsetDateTime::now_utc() + Duration::hours(1);
        let session_id = SessionId::new("abc123");

        let jar = set_session_cookie(get_jar(), &session_id, expiry);

        assert_eq!(get_session_id_from_cookie(&jar), Some(session_id));
        let cookie = jar.get(COOKIE_SESSION).unwrap();
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
    }

    #[test]
    fn invalidate_session_cookie_expires_cookie() {
        let jar = set_session_cookie(
            get_jar(),
            &SessionId::new("abc123"),
            OffsetDateTime::now_utc() + Duration::hours(1),
        );

        let jar = invalidate_session_cookie(jar);

        let cookie = jar.get(COOKIE_SESSION).unwrap();
        assert_eq!(cookie.value(), "deleted");
        assert_eq!(cookie.max_age(), Some(Duration::ZERO));
        assert_eq!(
            cookie.expires_datetime(),
            Some(OffsetDateTime::UNIX_EPOCH)
        );
    }

    #[test]
    fn missing_cookie_has_no_session() {
        assert_eq!(get_session_id_from_cookie(&get_jar()), None);
    }
}
