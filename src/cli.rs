use clap::{Parser, Subcommand};

/// Approval Flow — request lifecycle service with audit trail
#[derive(Parser)]
#[command(name = "approvald", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to bind
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },

    /// Manage user accounts
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// Create a user account
    Create {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        /// Account role: requester or approver
        #[arg(long, default_value = "requester")]
        role: String,
    },
    /// List approver accounts
    Approvers,
}
