//! The RFC 959 Help (`HELP`) command
//
// With an argument, echo the help line of that command; without one,
// tabulate all recognized commands eight per row.

use crate::server::controlchan::command::{lookup, COMMAND_TABLE};
use crate::server::controlchan::error::ControlChanError;
use crate::server::controlchan::handler::{CommandContext, CommandHandler};
use crate::server::controlchan::{Reply, ReplyCode};

use async_trait::async_trait;

const COMMANDS_PER_ROW: usize = 8;

#[derive(Debug)]
pub struct Help {
    topic: Option<String>,
}

impl Help {
    pub fn new(topic: Option<String>) -> Self {
        Help { topic }
    }
}

#[async_trait]
impl CommandHandler for Help {
    #[tracing_attributes::instrument]
    async fn handle(&self, _args: CommandContext) -> Result<Reply, ControlChanError> {
        match &self.topic {
            Some(topic) => match lookup(&topic.to_uppercase()) {
                Some(spec) => Ok(Reply::new(ReplyCode::HelpMessage, spec.help)),
                None => Ok(Reply::new(ReplyCode::ParameterSyntaxError, "Unrecognized command.")),
            },
            None => {
                let mut lines = vec!["The following commands are recognized:".to_string()];
                for row in COMMAND_TABLE.chunks(COMMANDS_PER_ROW) {
                    let row: Vec<String> = row.iter().map(|spec| format!("{:<5}", spec.name)).collect();
                    lines.push(row.concat().trim_end().to_string());
                }
                lines.push("Help command successful.".to_string());
                Ok(Reply::new_multiline(ReplyCode::HelpMessage, lines))
            }
        }
    }
}
