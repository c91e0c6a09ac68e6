use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::AuthError;
use crate::config::JwtConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    fn other(self) -> Self {
        match self {
            TokenKind::Access => TokenKind::Refresh,
            TokenKind::Refresh => TokenKind::Access,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub iat: i64,
    pub exp: i64,
    pub kind: TokenKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
}

#[derive(Clone)]
struct KindKeys {
    enc: EncodingKey,
    dec: DecodingKey,
    ttl: Duration,
}

impl KindKeys {
    fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            enc: EncodingKey::from_secret(secret),
            dec: DecodingKey::from_secret(secret),
            ttl,
        }
    }
}

/// Mints and checks signed access/refresh tokens. Each kind has its own
/// secret and lifetime; both share one HMAC algorithm.
#[derive(Clone)]
pub struct TokenIssuer {
    algorithm: Algorithm,
    access: KindKeys,
    refresh: KindKeys,
}

impl TokenIssuer {
    pub fn new(
        access_secret: &[u8],
        refresh_secret: &[u8],
        algorithm: Algorithm,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Self {
        Self {
            algorithm,
            access: KindKeys::new(access_secret, access_ttl),
            refresh: KindKeys::new(refresh_secret, refresh_ttl),
        }
    }

    /// Lifetimes too large for `Duration` saturate; issuing with them then
    /// fails instead of panicking.
    pub fn from_config(cfg: &JwtConfig) -> Self {
        Self::new(
            cfg.secret_token.as_bytes(),
            cfg.refresh_secret_token.as_bytes(),
            cfg.signing_algorithm,
            Duration::try_minutes(cfg.access_token_expire_minutes).unwrap_or(Duration::MAX),
            Duration::try_days(cfg.refresh_token_expire_days).unwrap_or(Duration::MAX),
        )
    }

    fn keys(&self, kind: TokenKind) -> &KindKeys {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    pub fn ttl(&self, kind: TokenKind) -> Duration {
        self.keys(kind).ttl
    }

    pub fn issue(&self, user_id: Uuid, kind: TokenKind) -> Result<String, AuthError> {
        self.issue_at(user_id, kind, Utc::now())
    }

    pub fn issue_at(
        &self,
        user_id: Uuid,
        kind: TokenKind,
        now: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let keys = self.keys(kind);
        let exp = now
            .checked_add_signed(keys.ttl)
            .ok_or_else(|| AuthError::Internal(format!("{kind:?} token expiry out of range")))?;
        let claims = Claims {
            sub: user_id,
            iat: now.timestamp(),
            exp: exp.timestamp(),
            kind,
        };
        encode(&Header::new(self.algorithm), &claims, &keys.enc)
            .map_err(|err| AuthError::Internal(format!("token encoding failed: {err}")))
    }

    pub fn issue_pair(&self, user_id: Uuid) -> Result<TokenPair, AuthError> {
        let now = Utc::now();
        Ok(TokenPair {
            access_token: self.issue_at(user_id, TokenKind::Access, now)?,
            refresh_token: self.issue_at(user_id, TokenKind::Refresh, now)?,
            token_type: "Bearer".to_string(),
            expires_in: self.access.ttl.num_seconds(),
        })
    }

    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<Uuid, AuthError> {
        self.verify_at(token, expected, Utc::now())
    }

    /// Signature first, then kind, then expiry. A token is still valid at
    /// the exact second of `exp`.
    pub fn verify_at(
        &self,
        token: &str,
        expected: TokenKind,
        now: DateTime<Utc>,
    ) -> Result<Uuid, AuthError> {
        let claims = match self.decode_with(token, expected) {
            Some(claims) => claims,
            None if self.decode_with(token, expected.other()).is_some() => {
                return Err(AuthError::WrongKind);
            }
            None => return Err(AuthError::InvalidToken),
        };

        if claims.kind != expected {
            return Err(AuthError::WrongKind);
        }
        if now.timestamp() > claims.exp {
            return Err(AuthError::ExpiredToken);
        }
        Ok(claims.sub)
    }

    fn decode_with(&self, token: &str, kind: TokenKind) -> Option<Claims> {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = false;
        decode::<Claims>(token, &self.keys(kind).dec, &validation)
            .map(|data| data.claims)
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
    use uuid::Uuid;

    use super::{Claims, TokenIssuer, TokenKind};
    use crate::auth::AuthError;
    use crate::config::JwtConfig;

    const ACCESS_SECRET: &[u8] = b"access-secret-for-tests";
    const REFRESH_SECRET: &[u8] = b"refresh-secret-for-tests";

    fn issuer(algorithm: Algorithm) -> TokenIssuer {
        TokenIssuer::new(
            ACCESS_SECRET,
            REFRESH_SECRET,
            algorithm,
            Duration::minutes(30),
            Duration::days(7),
        )
    }

    fn t0() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0)
            .single()
            .expect("timestamp should be valid")
    }

    #[test]
    fn oversized_ttl_fails_to_issue_instead_of_panicking() {
        let cfg = JwtConfig {
            refresh_token_expire_days: 100_000_000,
            ..JwtConfig::default()
        };
        let tokens = TokenIssuer::from_config(&cfg);

        let err = tokens
            .issue_pair(Uuid::new_v4())
            .expect_err("expiry should overflow");
        assert!(matches!(err, AuthError::Internal(_)));
        assert!(tokens.issue(Uuid::new_v4(), TokenKind::Access).is_ok());
    }

    #[test]
    fn access_token_round_trips_within_ttl() {
        let tokens = issuer(Algorithm::HS256);
        let user = Uuid::new_v4();
        let token = tokens
            .issue_at(user, TokenKind::Access, t0())
            .expect("issue");

        let subject = tokens
            .verify_at(&token, TokenKind::Access, t0() + Duration::minutes(29))
            .expect("token should still be valid");
        assert_eq!(subject, user);
    }

    #[test]
    fn access_token_expires_after_ttl() {
        let tokens = issuer(Algorithm::HS256);
        let token = tokens
            .issue_at(Uuid::new_v4(), TokenKind::Access, t0())
            .expect("issue");

        let err = tokens
            .verify_at(&token, TokenKind::Access, t0() + Duration::minutes(31))
            .expect_err("token should be expired");
        assert_eq!(err, AuthError::ExpiredToken);
    }

    #[test]
    fn token_is_valid_at_exact_expiry() {
        let tokens = issuer(Algorithm::HS256);
        let token = tokens
            .issue_at(Uuid::new_v4(), TokenKind::Access, t0())
            .expect("issue");

        assert!(
            tokens
                .verify_at(&token, TokenKind::Access, t0() + Duration::minutes(30))
                .is_ok()
        );
        assert_eq!(
            tokens.verify_at(
                &token,
                TokenKind::Access,
                t0() + Duration::minutes(30) + Duration::seconds(1)
            ),
            Err(AuthError::ExpiredToken)
        );
    }

    #[test]
    fn refresh_token_lives_for_days() {
        let tokens = issuer(Algorithm::HS256);
        let user = Uuid::new_v4();
        let token = tokens
            .issue_at(user, TokenKind::Refresh, t0())
            .expect("issue");

        assert_eq!(
            tokens.verify_at(&token, TokenKind::Refresh, t0() + Duration::days(6)),
            Ok(user)
        );
        assert_eq!(
            tokens.verify_at(&token, TokenKind::Refresh, t0() + Duration::days(8)),
            Err(AuthError::ExpiredToken)
        );
    }

    #[test]
    fn kinds_are_not_interchangeable() {
        let tokens = issuer(Algorithm::HS256);
        let user = Uuid::new_v4();
        let access = tokens.issue_at(user, TokenKind::Access, t0()).expect("issue");
        let refresh = tokens.issue_at(user, TokenKind::Refresh, t0()).expect("issue");

        assert_eq!(
            tokens.verify_at(&refresh, TokenKind::Access, t0()),
            Err(AuthError::WrongKind)
        );
        assert_eq!(
            tokens.verify_at(&access, TokenKind::Refresh, t0()),
            Err(AuthError::WrongKind)
        );
    }

    #[test]
    fn kind_claim_is_checked_even_under_the_right_secret() {
        let tokens = issuer(Algorithm::HS256);
        let claims = Claims {
            sub: Uuid::new_v4(),
            iat: t0().timestamp(),
            exp: (t0() + Duration::minutes(30)).timestamp(),
            kind: TokenKind::Refresh,
        };
        let forged = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(ACCESS_SECRET),
        )
        .expect("encode");

        assert_eq!(
            tokens.verify_at(&forged, TokenKind::Access, t0()),
            Err(AuthError::WrongKind)
        );
    }

    #[test]
    fn wrong_kind_wins_over_expiry() {
        let tokens = issuer(Algorithm::HS256);
        let refresh = tokens
            .issue_at(Uuid::new_v4(), TokenKind::Refresh, t0())
            .expect("issue");

        assert_eq!(
            tokens.verify_at(&refresh, TokenKind::Access, t0() + Duration::days(30)),
            Err(AuthError::WrongKind)
        );
    }

    #[test]
    fn tampered_or_foreign_tokens_are_invalid() {
        let tokens = issuer(Algorithm::HS256);
        let token = tokens
            .issue_at(Uuid::new_v4(), TokenKind::Access, t0())
            .expect("issue");

        let mut tampered = token.clone();
        let last = tampered.pop().expect("token is not empty");
        tampered.push(if last == 'A' { 'B' } else { 'A' });
        assert_eq!(
            tokens.verify_at(&tampered, TokenKind::Access, t0()),
            Err(AuthError::InvalidToken)
        );

        let stranger = TokenIssuer::new(
            b"someone-else",
            b"someone-else-refresh",
            Algorithm::HS256,
            Duration::minutes(30),
            Duration::days(7),
        );
        let foreign = stranger
            .issue_at(Uuid::new_v4(), TokenKind::Access, t0())
            .expect("issue");
        assert_eq!(
            tokens.verify_at(&foreign, TokenKind::Access, t0()),
            Err(AuthError::InvalidToken)
        );

        assert_eq!(
            tokens.verify_at("not.a.jwt", TokenKind::Access, t0()),
            Err(AuthError::InvalidToken)
        );
    }

    #[test]
    fn algorithm_is_enforced() {
        let hs512 = issuer(Algorithm::HS512);
        let user = Uuid::new_v4();
        let token = hs512.issue_at(user, TokenKind::Access, t0()).expect("issue");
        assert_eq!(hs512.verify_at(&token, TokenKind::Access, t0()), Ok(user));

        let hs256 = issuer(Algorithm::HS256);
        assert_eq!(
            hs256.verify_at(&token, TokenKind::Access, t0()),
            Err(AuthError::InvalidToken)
        );
    }

    #[test]
    fn pair_reports_access_ttl() {
        let tokens = issuer(Algorithm::HS256);
        let user = Uuid::new_v4();
        let pair = tokens.issue_pair(user).expect("pair");

        assert_eq!(pair.token_type, "Bearer");
        assert_eq!(pair.expires_in, 30 * 60);
        assert_eq!(tokens.verify(&pair.access_token, TokenKind::Access), Ok(user));
        assert_eq!(tokens.verify(&pair.refresh_token, TokenKind::Refresh), Ok(user));
    }
}
