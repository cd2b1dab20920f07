use hmac::Hmac;
use pbkdf2::pbkdf2;
use sha2::Sha256;
use rand::Rng;
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};

type HmacSha256 = Hmac<Sha256>;

const ITERATIONS: u32 = 260000;
const KEY_LENGTH: usize = 32;

/// Hash un mot de passe au format Werkzeug (compatible avec l'ancien backend Python)
/// PBKDF2-HMAC-SHA256, 260000 itérations, salt aléatoire de 16 bytes
pub fn hash_password(password: &str) -> Result<String, String> {
    let mut salt = [0u8; 16];
    rand::thread_rng().fill(&mut salt);

    let mut key = [0u8; KEY_LENGTH];
    pbkdf2::<HmacSha256>(password.as_bytes(), &salt, ITERATIONS, &mut key)
        .map_err(|e| format!("PBKDF2 failed: {}", e))?;

    let salt_b64 = URL_SAFE_NO_PAD.encode(salt);
    let hash_b64 = URL_SAFE_NO_PAD.encode(key);

    // Format: pbkdf2:sha256:iterations$salt$hash
    Ok(format!("pbkdf2:sha256:{}${}${}", ITERATIONS, salt_b64, hash_b64))
}

/// Vérifie un mot de passe contre un hash stocké
/// Supporte le salt/hash en base64 url-safe (nouveau) et en hex (hashs Python historiques)
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, String> {
    let parts: Vec<&str> = stored_hash.split('$').collect();
    if parts.len() != 3 {
        return Err("Invalid hash format".to_string());
    }

    // parts[0] = "pbkdf2:sha256:iterations"
    let header_parts: Vec<&str> = parts[0].split(':').collect();
    if header_parts.len() != 3 || header_parts[0] != "pbkdf2" {
        return Err("Invalid hash header".to_string());
    }

    let iterations = header_parts[2]
        .parse::<u32>()
        .map_err(|_| "Invalid iterations".to_string())?;

    let salt = decode_salt_or_hash(parts[1])?;
    let expected = decode_salt_or_hash(parts[2])?;

    let mut computed = vec![0u8; expected.len()];
    pbkdf2::<HmacSha256>(password.as_bytes(), &salt, iterations, &mut computed)
        .map_err(|e| format!("PBKDF2 failed: {}", e))?;

    Ok(computed == expected)
}

/// Décode base64 url-safe sans padding, ou hexadécimal pour les anciens hashs
fn decode_salt_or_hash(input: &str) -> Result<Vec<u8>, String> {
    if let Ok(decoded) = URL_SAFE_NO_PAD.decode(input) {
        return Ok(decoded);
    }
    hex::decode(input).map_err(|_| "Failed to decode salt/hash".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("pw123").unwrap();
        assert!(hash.starts_with("pbkdf2:sha256:260000$"));
        assert!(!hash.contains("pw123"));
        assert!(verify_password("pw123", &hash).unwrap());
    }

    #[test]
    fn test_wrong_password_rejected() {
        let hash = hash_password("pw123").unwrap();
        assert!(!verify_password("pw124", &hash).unwrap());
        assert!(!verify_password("", &hash).unwrap());
    }

    #[test]
    fn test_two_hashes_differ() {
        // Salt aléatoire: deux hashs du même mot de passe ne sont jamais égaux
        let h1 = hash_password("secret").unwrap();
        let h2 = hash_password("secret").unwrap();
        assert_ne!(h1, h2);
    }

    #[test]
    fn test_invalid_format() {
        assert!(verify_password("pw", "not-a-hash").is_err());
        assert!(verify_password("pw", "scrypt:1:2$a$b").is_err());
    }
}
