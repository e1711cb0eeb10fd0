//! OAuth1 plaintext-signature request signing (spec §6).
//!
//! The fleet controller's documented wire contract uses the PLAINTEXT
//! signature method, whose "signature" is simply the percent-encoded
//! consumer and token secrets joined by `&` — no HMAC, no request-string
//! canonicalization. A hand-rolled header builder is all that's needed, so
//! no OAuth1 crate is pulled in.

use rand::Rng;

#[derive(Debug, Clone)]
pub struct OAuth1Credentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub token: String,
    pub token_secret: String,
}

impl OAuth1Credentials {
    /// Build the `Authorization` header value for one request.
    #[must_use]
    pub fn authorization_header(&self) -> String {
        let nonce = generate_nonce();
        let timestamp = chrono::Utc::now().timestamp();
        let signature = format!(
            "{}&{}",
            urlencoding::encode(&self.consumer_secret),
            urlencoding::encode(&self.token_secret)
        );

        format!(
            "OAuth oauth_consumer_key=\"{}\", oauth_token=\"{}\", oauth_signature_method=\"PLAINTEXT\", \
             oauth_timestamp=\"{}\", oauth_nonce=\"{}\", oauth_version=\"1.0\", oauth_signature=\"{}\"",
            urlencoding::encode(&self.consumer_key),
            urlencoding::encode(&self.token),
            timestamp,
            nonce,
            signature,
        )
    }
}

fn generate_nonce() -> String {
    let mut rng = rand::thread_rng();
    (0..32).map(|_| rng.sample(rand::distributions::Alphanumeric) as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_contains_plaintext_signature() {
        let creds = OAuth1Credentials {
            consumer_key: "ck".into(),
            consumer_secret: "cs".into(),
            token: "tok".into(),
            token_secret: "ts".into(),
        };
        let header = creds.authorization_header();
        assert!(header.contains("oauth_signature_method=\"PLAINTEXT\""));
        assert!(header.contains("oauth_signature=\"cs&ts\""));
        assert!(header.starts_with("OAuth "));
    }
}
