use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::{connect, output_empty_collection, output_success};
use crate::cli::OutputFormat;
use crate::database::{PgUserRepository, UserRepository};
use crate::models::{Role, User};

#[derive(Subcommand)]
pub enum UserCommands {
    #[command(about = "Add a user")]
    Add {
        #[arg(long, help = "Display name")]
        name: String,
        #[arg(long, help = "Email address (unique)")]
        email: String,
        #[arg(long, help = "Grant the admin role")]
        admin: bool,
    },

    #[command(about = "List all users")]
    List,
}

pub async fn handle(cmd: UserCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let users = PgUserRepository::new(connect().await?);

    match cmd {
        UserCommands::Add { name, email, admin } => {
            let role = if admin { Role::Admin } else { Role::User };
            let user = users.create(User::new(name, email, role)).await?;

            output_success(
                &output_format,
                &format!("User '{}' added with id {}", user.user_name, user.id),
                Some(serde_json::to_value(&user)?),
            )
        }
        UserCommands::List => {
            let all = users.list_all().await?;
            if all.is_empty() {
                return output_empty_collection(&output_format, "users", "No users");
            }

            match output_format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&json!({ "users": all }))?);
                }
                OutputFormat::Text => {
                    println!("{:<38} {:<6} {:<20} {}", "ID", "ROLE", "NAME", "EMAIL");
                    println!("{}", "-".repeat(90));
                    for user in &all {
                        println!("{:<38} {:<6} {:<20} {}", user.id, user.role.as_str(), user.user_name, user.email);
                    }
                }
            }
            Ok(())
        }
    }
}
