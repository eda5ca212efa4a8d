//! The RFC 3659 Machine List Single (`MLST`) command
//
// The one-path variant of MLSD. It travels on the control channel inside a
// 250 envelope, the fact line indented by a single space, the name given as
// the fully qualified virtual path.

use super::{fs_fail, vfs_or_login};
use crate::server::controlchan::error::ControlChanError;
use crate::server::controlchan::handler::{CommandContext, CommandHandler};
use crate::server::controlchan::{Reply, ReplyCode};

use async_trait::async_trait;

#[derive(Debug)]
pub struct Mlst {
    path: Option<String>,
}

impl Mlst {
    pub fn new(path: Option<String>) -> Self {
        Mlst { path }
    }
}

#[async_trait]
impl CommandHandler for Mlst {
    #[tracing_attributes::instrument]
    async fn handle(&self, args: CommandContext) -> Result<Reply, ControlChanError> {
        let session = args.session.lock().await;
        let vfs = match vfs_or_login(&session) {
            Ok(vfs) => vfs,
            Err(reply) => return Ok(reply),
        };
        let arg = self.path.as_deref().unwrap_or("");
        let host = vfs.ftp2fs(arg);
        let virtual_path = vfs.ftpnorm(arg);
        let fact_line = match vfs.mlst_line(&host, &virtual_path).await {
            Ok(line) => line,
            Err(err) => return Ok(fs_fail(&err)),
        };
        Ok(Reply::new_multiline(
            ReplyCode::FileActionOkay,
            vec!["Begin MLST.".to_string(), format!(" {}", fact_line), "End MLST.".to_string()],
        ))
    }
}
