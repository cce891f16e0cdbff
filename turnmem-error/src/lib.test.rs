use super::*;

#[test]
fn status_codes_match_spec_envelope() {
    assert_eq!(Kind::Validation.http_status(), 400);
    assert_eq!(Kind::Auth.http_status(), 401);
    assert_eq!(Kind::Forbidden.http_status(), 403);
    assert_eq!(Kind::NotFound.http_status(), 404);
    assert_eq!(Kind::TooLarge.http_status(), 413);
    assert_eq!(Kind::UnsupportedMediaType.http_status(), 415);
    assert_eq!(Kind::RateLimited.http_status(), 429);
    assert_eq!(Kind::Internal.http_status(), 500);
}
