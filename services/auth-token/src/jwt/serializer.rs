use crate::error::TokenError;
use crate::jwt::claims::AccessClaims;
use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

/// Compact JWS encoding of access tokens, HS512 only.
pub struct JwtSerializer {
    algorithm: Algorithm,
}

impl Default for JwtSerializer {
    fn default() -> Self {
        JwtSerializer {
            algorithm: Algorithm::HS512,
        }
    }
}

impl JwtSerializer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serialize(&self, claims: &AccessClaims, key: &EncodingKey) -> Result<String, TokenError> {
        let header = Header::new(self.algorithm);
        encode(&header, claims, key).map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify the signature and decode the typed claims.
    ///
    /// Fails with `ExpiredSignature` once `exp` has passed and with
    /// `ImmatureSignature` if `iat` lies in the future. No leeway either way.
    pub fn deserialize(
        &self,
        token: &str,
        key: &DecodingKey,
    ) -> Result<AccessClaims, jsonwebtoken::errors::Error> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp"]);

        let claims = decode::<AccessClaims>(token, key, &validation)?.claims;
        if claims.iat > Utc::now().timestamp() {
            return Err(ErrorKind::ImmatureSignature.into());
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};

    fn keys(secret: &[u8]) -> (EncodingKey, DecodingKey) {
        (
            EncodingKey::from_secret(secret),
            DecodingKey::from_secret(secret),
        )
    }

    fn claims() -> AccessClaims {
        AccessClaims::new("user-123".to_string(), "10.0.0.1".to_string(), "9".to_string(), 3600)
    }

    #[test]
    fn test_round_trip_hs512() {
        let serializer = JwtSerializer::new();
        let (encoding_key, decoding_key) = keys(b"test-secret-key-for-testing-only");

        let token = serializer.serialize(&claims(), &encoding_key).unwrap();
        let decoded = serializer.deserialize(&token, &decoding_key).unwrap();

        assert_eq!(decoded.sub, "user-123");
        assert_eq!(decoded.rid, "9");
    }

    #[test]
    fn test_header_declares_hs512() {
        let (encoding_key, _) = keys(b"k");
        let token = JwtSerializer::new().serialize(&claims(), &encoding_key).unwrap();

        let header = jsonwebtoken::decode_header(&token).unwrap();
        assert_eq!(header.alg, Algorithm::HS512);
    }

    #[test]
    fn test_wrong_key_rejected() {
        let serializer = JwtSerializer::new();
        let (encoding_key, _) = keys(b"signing-key");
        let (_, other_decoding_key) = keys(b"other-key");

        let token = serializer.serialize(&claims(), &encoding_key).unwrap();
        assert!(serializer.deserialize(&token, &other_decoding_key).is_err());
    }

    #[test]
    fn test_other_algorithm_rejected() {
        let (encoding_key, decoding_key) = keys(b"shared-secret");
        let token = encode(&Header::new(Algorithm::HS256), &claims(), &encoding_key).unwrap();

        assert!(JwtSerializer::new().deserialize(&token, &decoding_key).is_err());
    }

    #[test]
    fn test_expired_access_token_rejected() {
        let serializer = JwtSerializer::new();
        let (encoding_key, decoding_key) = keys(b"k");
        let mut expired = claims();
        expired.iat -= 7200;
        expired.exp -= 7200;

        let token = serializer.serialize(&expired, &encoding_key).unwrap();
        let err = serializer.deserialize(&token, &decoding_key).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::ExpiredSignature));
    }

    #[test]
    fn test_future_iat_rejected() {
        let serializer = JwtSerializer::new();
        let (encoding_key, decoding_key) = keys(b"k");
        let mut early = claims();
        early.iat += 600;
        early.exp += 600;

        let token = serializer.serialize(&early, &encoding_key).unwrap();
        let err = serializer.deserialize(&token, &decoding_key).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::ImmatureSignature));
    }

    #[test]
    fn test_payload_missing_rid_rejected() {
        let (encoding_key, decoding_key) = keys(b"k");
        let payload = serde_json::json!({"sub": "u", "iat": 1, "exp": 2, "ip": "10.0.0.1"});
        let token = encode(&Header::new(Algorithm::HS512), &payload, &encoding_key).unwrap();

        assert!(JwtSerializer::new().deserialize(&token, &decoding_key).is_err());
    }

    #[test]
    fn test_malformed_token_rejected() {
        let (_, decoding_key) = keys(b"k");
        let garbage = format!("{}.{}", URL_SAFE_NO_PAD.encode("{}"), URL_SAFE_NO_PAD.encode("{}"));

        assert!(JwtSerializer::new().deserialize(&garbage, &decoding_key).is_err());
        assert!(JwtSerializer::new().deserialize("", &decoding_key).is_err());
    }
}
