//! Crack strings for captured AS-REQ pre-authentication timestamps

use super::record::CaptureRecord;
use clap::ValueEnum;
use std::fmt;

/// Prefix shared by both crackers: pre-auth hash, etype 18 (aes256-cts-hmac-sha1-96).
const KRB5PA_PREFIX: &str = "$krb5pa$18$";

#[derive(Debug, PartialEq, Eq, Clone, Copy, ValueEnum)]
pub enum HashMode {
    Hashcat,
    John,
}

impl HashMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            HashMode::Hashcat => "hashcat",
            HashMode::John => "john",
        }
    }
}

impl fmt::Display for HashMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedHash(String);

impl FormattedHash {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FormattedHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Builds the crack string for `record`.
///
/// John expects an empty salt field before the cipher, hence the doubled `$`.
/// Fields are concatenated as they are; a `$` inside a field is not escaped.
pub fn format_hash(record: &CaptureRecord, mode: HashMode) -> FormattedHash {
    let separator = match mode {
        HashMode::Hashcat => "$",
        HashMode::John => "$$",
    };

    FormattedHash(format!(
        "{}{}${}{}{}",
        KRB5PA_PREFIX,
        record.principal_name(),
        record.realm(),
        separator,
        record.cipher_hex()
    ))
}
