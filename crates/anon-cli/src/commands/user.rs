use rand::Rng;
use rand::distr::Alphanumeric;

use crate::cli::UserCommand;
use crate::context::AnonContext;
use crate::terminal::Terminal;

const TOKEN_LENGTH: usize = 64;

/// Random alphanumeric token.
pub fn generate_token() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

pub fn run(
    command: UserCommand,
    context: &mut AnonContext,
    terminal: &mut Terminal<'_>,
) -> anyhow::Result<()> {
    match command {
        UserCommand::Info => {
            let settings = &context.settings.settings;
            terminal.say(format!(
                "username is {}\nAPI token: {}",
                settings.user_name, settings.user_token
            ))?;
        }
        UserCommand::SetUsername { user_name } => {
            context.settings.settings.user_name = user_name.clone();
            context.settings.save()?;
            terminal.say(format!("username is now '{user_name}'"))?;
        }
        UserCommand::GetToken => {
            context.settings.settings.user_token = generate_token();
            context.settings.save()?;
            terminal.say(format!(
                "Got and saved api token for username {}",
                context.settings.settings.user_name
            ))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_token() {
        let token = generate_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(token, generate_token());
    }
}
