//! [`ConfigDatabase`] for a live [`Session`].

use async_trait::async_trait;
use tracing::{debug, trace};

use super::reply::NetconfReply;
use super::rpc;
use crate::connection::Session;
use crate::transaction::{Candidate, CommitMode, ConfigDatabase, DatabaseResult, LoadMode};

impl Session {
    /// Send an RPC and parse the reply, failing on error-severity entries.
    async fn call(&mut self, request: &str, ignore_warnings: bool) -> DatabaseResult<NetconfReply> {
        trace!(request = %request, "junos rpc");
        let document = self.rpc(request).await?;
        NetconfReply::parse(&document)?.check(ignore_warnings)
    }
}

#[async_trait]
impl ConfigDatabase for Session {
    async fn open_database(&mut self, mode: CommitMode) -> DatabaseResult<()> {
        let Some(request) = rpc::open_configuration(mode) else {
            return Ok(());
        };
        self.call(request, true).await?;
        debug!(mode = %mode, "configuration database opened");
        Ok(())
    }

    async fn lock(&mut self) -> DatabaseResult<()> {
        self.call(rpc::lock(), true).await.map(drop)
    }

    async fn load(
        &mut self,
        candidate: &Candidate,
        mode: LoadMode,
        ignore_warnings: bool,
    ) -> DatabaseResult<Vec<String>> {
        let request = rpc::load_configuration(candidate, mode)?;
        debug!(
            origin = %candidate.origin.display(),
            format = %candidate.format,
            mode = %mode,
            bytes = candidate.text.len(),
            "loading candidate"
        );
        let reply = self.call(&request, ignore_warnings).await?;
        Ok(reply.warnings())
    }

    async fn diff(&mut self) -> DatabaseResult<Option<String>> {
        let reply = self.call(rpc::get_diff(), true).await?;
        Ok(reply
            .text_of("configuration-output")
            .filter(|diff| !diff.is_empty()))
    }

    async fn commit(&mut self, comment: Option<&str>) -> DatabaseResult<()> {
        self.call(&rpc::commit(comment), true).await.map(drop)
    }

    async fn unlock(&mut self) -> DatabaseResult<()> {
        self.call(rpc::unlock(), true).await.map(drop)
    }

    async fn close_database(&mut self) -> DatabaseResult<()> {
        self.call(rpc::close_configuration(), true).await.map(drop)
    }
}
