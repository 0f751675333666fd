use alloy_primitives::Address;

/// Where uploaded files are served from: `https://<identifier>.<domain>/...`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Gateway {
    /// Subdomain naming the storage contract.
    pub identifier: String,
    pub domain: String,
}

impl Gateway {
    pub fn new(identifier: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            domain: domain.into(),
        }
    }

    /// Content address of `name` (the on-chain file name, directory
    /// included) uploaded by `account`.
    pub fn content_address(&self, account: &Address, name: &str) -> String {
        format!(
            "https://{}.{}/{}/{}",
            self.identifier,
            self.domain,
            account.to_checksum(None),
            name
        )
    }
}

/// The on-chain name of a file: its directory path followed by its file name.
///
/// The directory is normalized rather than concatenated as given: leading
/// slashes are dropped and a non-empty directory gets exactly one trailing
/// `/`. For a directory already written as `dir/` the result is the plain
/// `dir_path + file_name`; `dir`, `/dir` and `dir//` name the same file.
pub fn storage_name(dir_path: &str, file_name: &str) -> String {
    let dir = dir_path.trim_start_matches('/').trim_end_matches('/');
    if dir.is_empty() {
        file_name.to_owned()
    } else {
        format!("{dir}/{file_name}")
    }
}
