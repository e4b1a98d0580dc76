use anyhow::{Result, anyhow};
use async_trait::async_trait;

use super::{Command, ShellState};
use crate::namespace::ClusterPath;

pub struct CdCommand;

#[async_trait]
impl Command for CdCommand {
    fn name(&self) -> &str {
        "cd"
    }

    fn usage(&self) -> &str {
        "cd [PATH] - Change current directory"
    }

    async fn execute(&self, state: &mut ShellState, args: &[String]) -> Result<()> {
        let Some(path_str) = args.first() else {
            // cd with no args goes to root
            state.set_cwd(ClusterPath::root());
            return Ok(());
        };

        let target = ClusterPath::resolve(state.cwd(), path_str);
        if target.is_root() {
            state.set_cwd(target);
            return Ok(());
        }

        let status = state.client().get_status(&target.to_string()).await?;
        if !status.folder {
            return Err(anyhow!("Not a directory: {}", path_str));
        }

        state.set_cwd(target);
        Ok(())
    }
}
