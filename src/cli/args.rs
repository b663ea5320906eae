// ABOUTME: Command line argument definitions and parsing using Clap
// ABOUTME: Defines the main CLI structure and subcommands for emailtemplates

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "emailtemplates")]
#[command(about = "Manage, preview and send email templates")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(short, long, global = true, help = "Path to configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Disable colored output")]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List registered email templates
    List,

    /// Show usage and context help for a registered template
    Describe {
        #[arg(help = "Registered template path")]
        path: String,
    },

    /// Create or update the database override of a template
    Save {
        #[arg(help = "Registered template path")]
        title: String,

        #[arg(short, long, help = "Template language (defaults to the configured language)")]
        language: Option<String>,

        #[arg(short, long, help = "Subject template")]
        subject: Option<String>,

        #[arg(long, help = "File with the template body")]
        content_file: Option<PathBuf>,
    },

    /// Render a stored template with its example context
    Preview {
        #[arg(help = "Stored template id")]
        id: u64,
    },

    /// Send an email rendered from a template
    Send {
        #[arg(help = "Registered template path")]
        name: String,

        #[arg(long, required = true, help = "Recipient address")]
        to: Vec<String>,

        #[arg(short, long, help = "Template language")]
        language: Option<String>,

        #[arg(short, long, help = "Subject used when the stored template has none")]
        subject: Option<String>,

        #[arg(
            short = 'V',
            long = "var",
            help = "Template context variables (key=value)"
        )]
        vars: Vec<String>,

        #[arg(long = "attach", help = "File to attach")]
        attachments: Vec<PathBuf>,

        #[arg(long, help = "Fail when the message cannot be delivered")]
        no_fail_silently: bool,
    },

    /// Manage mass email messages
    Mass {
        #[command(subcommand)]
        command: MassCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum MassCommands {
    /// Create a mass email message
    Create {
        #[arg(short, long, help = "Message subject")]
        subject: String,

        #[arg(long, help = "File with the message body")]
        content_file: PathBuf,
    },

    /// Send a mass email message to all recipients
    Send {
        #[arg(help = "Mass email message id")]
        id: u64,

        #[arg(long, help = "Send again even if the message was already sent")]
        force: bool,

        #[arg(long, help = "Recipient addresses instead of the configured recipients")]
        to: Vec<String>,
    },
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Parse variables from key=value format
    pub fn parse_variables(
        vars: &[String],
    ) -> anyhow::Result<std::collections::HashMap<String, String>> {
        let mut variables = std::collections::HashMap::new();

        for var in vars {
            if let Some((key, value)) = var.split_once('=') {
                variables.insert(key.to_string(), value.to_string());
            } else {
                return Err(anyhow::anyhow!(
                    "Invalid variable format '{}'. Expected 'key=value'",
                    var
                ));
            }
        }

        Ok(variables)
    }
}
