//! Parsing of the `$`-separated field lines tshark prints for AS-REQ packets.

/// Separator passed to tshark with `-E separator=$`.
pub const FIELD_SEPARATOR: char = '$';

/// Fields of one pre-authentication request, as decoded by tshark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureRecord {
    principal_name: String,
    realm: String,
    cipher_hex: String,
}

impl CaptureRecord {
    pub fn principal_name(&self) -> &str {
        &self.principal_name
    }

    pub fn realm(&self) -> &str {
        &self.realm
    }

    pub fn cipher_hex(&self) -> &str {
        &self.cipher_hex
    }

    /// `principal@realm`, used in console reports.
    pub fn identity(&self) -> String {
        format!("{}@{}", self.principal_name, self.realm)
    }
}

/// Splits a field line into client name, realm and cipher.
///
/// The line is trimmed as a whole, never per field. Anything that does not
/// yield exactly three non-empty fields is rejected. The cipher is not
/// checked for hex well-formedness.
pub fn parse_asreq_line(line: &str) -> Option<CaptureRecord> {
    let parts: Vec<&str> = line.trim().split(FIELD_SEPARATOR).collect();
    if parts.len() != 3 {
        return None;
    }

    let (principal_name, realm, cipher_hex) = (parts[0], parts[1], parts[2]);
    if principal_name.is_empty() || realm.is_empty() || cipher_hex.is_empty() {
        return None;
    }

    Some(CaptureRecord {
        principal_name: principal_name.to_string(),
        realm: realm.to_string(),
        cipher_hex: cipher_hex.to_string(),
    })
}
