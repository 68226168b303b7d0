use async_trait::async_trait;

/// Seam for re-homing ephemeral platform-hosted media onto permanent storage
/// before a record is rendered. The blob-storage implementation lives outside
/// this repository; the pipeline only depends on this contract.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Returns the URL the rendered markdown should reference.
    async fn upload(&self, source_url: &str, filename: &str) -> String;
}

/// Default store: leaves URLs untouched.
#[derive(Default)]
pub struct PassthroughMediaStore;

#[async_trait]
impl MediaStore for PassthroughMediaStore {
    async fn upload(&self, source_url: &str, _filename: &str) -> String {
        source_url.to_owned()
    }
}
