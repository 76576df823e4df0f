use clap::Args;
use serde_json::json;
use uuid::Uuid;

use crate::auth::{generate_jwt, Claims};
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::models::Role;

#[derive(Args)]
pub struct TokenArgs {
    #[arg(long, help = "User id the token is issued for")]
    pub user: Uuid,

    #[arg(long, help = "Issue the token with the admin role")]
    pub admin: bool,
}

/// Mint a token signed with JWT_SECRET. No database lookup happens here, so
/// the id should name a user that exists in the target store.
pub async fn handle(args: TokenArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let role = if args.admin { Role::Admin } else { Role::User };
    let claims = Claims::new(args.user, role);
    let token = generate_jwt(&claims)?;

    match output_format {
        OutputFormat::Json => output_success(
            &output_format,
            "Token issued",
            Some(json!({
                "token": token,
                "user": args.user,
                "role": role,
                "expires_at": claims.exp,
            })),
        ),
        OutputFormat::Text => {
            println!("{}", token);
            Ok(())
        }
    }
}
