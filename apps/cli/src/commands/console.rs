use crate::core::error::CliError;
use crate::ui::Theme;
use clap::Args;
use shipyard::application::console::ServerConsole;
use shipyard::infrastructure::DockerCli;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// Sends console commands to a running game server.
#[derive(Args, Debug)]
pub struct ConsoleCommand {
    /// Service name, as shown in the build summary
    pub service: String,

    /// Command to run; opens an interactive prompt when omitted
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

impl ConsoleCommand {
    pub async fn execute(self) -> Result<(), CliError> {
        let console = ServerConsole::new(DockerCli::new(super::runner()));
        let container = console
            .container_for(&self.service)
            .await
            .map_err(CliError::Console)?;

        if !self.command.is_empty() {
            let output = console
                .send(&container, &self.command.join(" "))
                .await
                .map_err(CliError::Console)?;
            if !output.is_empty() {
                println!("{}", output);
            }
            return Ok(());
        }

        println!(
            "{} {} {}",
            Theme::primary("Connected to"),
            Theme::bold(&self.service),
            Theme::muted("(type `exit` to leave)")
        );

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdout = tokio::io::stdout();
        loop {
            stdout.write_all(b"> ").await?;
            stdout.flush().await?;

            let Some(line) = lines.next_line().await? else {
                break;
            };
            let line = line.trim();
            if is_exit(line) {
                break;
            }
            if line.is_empty() {
                continue;
            }

            match console.send(&container, line).await {
                Ok(output) if output.is_empty() => {}
                Ok(output) => println!("{}", output),
                Err(e) => eprintln!("{} {:#}", Theme::error("error:"), e),
            }
        }
        Ok(())
    }
}

fn is_exit(line: &str) -> bool {
    line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit")
}
