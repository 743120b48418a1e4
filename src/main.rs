//! Command-line client for the service desk.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use servicedesk_sdk::data::FileUri;
use servicedesk_sdk::sync::CommentTarget;
use servicedesk_sdk::upload::UploadFileHooks;
use servicedesk_sdk::{ConfigError, Response, SdkConfig, ServiceDesk, SharedHooks, TicketDescription, TicketId};

mod cli {
    use std::path::PathBuf;

    use clap::{Parser, Subcommand};

    #[derive(Parser, Debug)]
    #[command(name = "servicedesk", version, about = "Service desk command-line client")]
    pub struct Args {
        /// Application id (overrides SERVICEDESK_APP_ID)
        #[arg(long)]
        pub app_id: Option<String>,

        /// API base URL (overrides SERVICEDESK_API_URL)
        #[arg(long)]
        pub api_url: Option<String>,

        /// Author name for tickets and comments (overrides SERVICEDESK_USER_NAME)
        #[arg(long)]
        pub user_name: Option<String>,

        /// Directory for local state (overrides SERVICEDESK_DATA_DIR)
        #[arg(long)]
        pub data_dir: Option<PathBuf>,

        #[command(subcommand)]
        pub command: Command,
    }

    #[derive(Subcommand, Debug)]
    pub enum Command {
        /// List tickets
        Tickets,
        /// Show one ticket with its comments
        Ticket { id: i64 },
        /// Show the feed
        Feed,
        /// Comment on a ticket
        Comment {
            ticket_id: i64,
            text: String,
            #[arg(long = "file")]
            files: Vec<PathBuf>,
        },
        /// Post to the feed
        FeedComment {
            text: String,
            #[arg(long = "file")]
            files: Vec<PathBuf>,
        },
        /// Create a ticket
        Create {
            subject: String,
            description: String,
            #[arg(long = "file")]
            files: Vec<PathBuf>,
        },
        /// Register a push token
        PushToken { token: String },
        /// Show or save the draft of a ticket (or of the feed when no id is given)
        Draft {
            #[arg(long)]
            ticket_id: Option<i64>,
            text: Option<String>,
        },
    }
}

use cli::{Args, Command};

type CliResult = Result<(), Box<dyn std::error::Error>>;

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    env_logger::init();

    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn config(args: &Args) -> Result<SdkConfig, ConfigError> {
    let mut config = match (SdkConfig::from_env(), &args.app_id) {
        (Ok(config), _) => config,
        (Err(ConfigError::MissingAppId), Some(app_id)) => SdkConfig::new(app_id.clone())?,
        (Err(e), _) => return Err(e),
    };
    if let Some(app_id) = &args.app_id {
        config.app_id = app_id.clone();
    }
    if let Some(url) = &args.api_url {
        config.base_url = url.clone();
    }
    if let Some(name) = &args.user_name {
        config.user_name = name.clone();
    }
    if let Some(dir) = &args.data_dir {
        config.data_dir = dir.clone();
    }
    config.validate()?;
    Ok(config)
}

async fn run(args: Args) -> CliResult {
    let config = config(&args)?;
    let sdk = ServiceDesk::init(&config)?;
    log::info!("Using user id {}", sdk.identity().user_id);

    match args.command {
        Command::Tickets => {
            for ticket in sdk.get_tickets().await? {
                let marker = if ticket.is_read { ' ' } else { '*' };
                println!("{}{:>8}  {}", marker, ticket.id.0, ticket.subject);
            }
        }
        Command::Ticket { id } => {
            let ticket = sdk.get_ticket(TicketId(id)).await?;
            println!("#{} {}", id, ticket.subject);
            print_comments(&ticket.comments);
        }
        Command::Feed => print_comments(&sdk.get_feed().await?),
        Command::Comment {
            ticket_id,
            text,
            files,
        } => {
            let comment = sdk
                .local_data()
                .create_local_comment_with_files(text, &uris(&files))
                .await;
            let hooks = progress_hooks(comment.has_attachments());
            report(sdk.add_comment(TicketId(ticket_id), comment, hooks).await)?;
        }
        Command::FeedComment { text, files } => {
            let comment = sdk
                .local_data()
                .create_local_comment_with_files(text, &uris(&files))
                .await;
            let hooks = progress_hooks(comment.has_attachments());
            report(sdk.add_feed_comment(comment, hooks).await)?;
        }
        Command::Create {
            subject,
            description,
            files,
        } => {
            let mut ticket = TicketDescription::new(subject, description);
            ticket.attachments = sdk
                .local_data()
                .create_local_comment_with_files(String::new(), &uris(&files))
                .await
                .attachments;
            let hooks = progress_hooks(ticket.has_attachments());
            let id = sdk.create_ticket(ticket, hooks).await?;
            println!("Created ticket {}", id);
        }
        Command::PushToken { token } => {
            sdk.set_push_token(&token).await?;
            println!("Push token registered");
        }
        Command::Draft { ticket_id, text } => {
            let target = match ticket_id {
                Some(id) => CommentTarget::Ticket(TicketId(id)),
                None => CommentTarget::Feed,
            };
            match text {
                Some(text) => sdk.drafts().save_draft(target, &text)?,
                None => println!("{}", sdk.drafts().draft(target)),
            }
        }
    }
    Ok(())
}

fn uris(files: &[PathBuf]) -> Vec<FileUri> {
    files.iter().map(|p| FileUri::from_path(p)).collect()
}

/// Hooks that log upload progress, when there is anything to upload.
fn progress_hooks(has_files: bool) -> Option<SharedHooks> {
    if !has_files {
        return None;
    }
    let hooks = UploadFileHooks::shared();
    let mut progress = hooks.subscribe();
    tokio::spawn(async move {
        while progress.changed().await.is_ok() {
            let fraction = *progress.borrow();
            log::info!("Upload progress: {:.0}%", fraction * 100.0);
        }
    });
    let shared: SharedHooks = hooks;
    Some(shared)
}

fn report(result: Response<i64>) -> CliResult {
    let id = result?;
    println!("Comment {} added", id);
    Ok(())
}

fn print_comments(comments: &[servicedesk_sdk::Comment]) {
    for comment in comments {
        let who = if comment.is_inbound {
            comment.author.name.as_str()
        } else {
            "Support"
        };
        let pending = if comment.is_local() { " (not sent)" } else { "" };
        println!(
            "[{}] {}{}: {}",
            comment.creation_date.format("%Y-%m-%d %H:%M"),
            who,
            pending,
            comment.body
        );
        for attachment in comment.attachments.iter().flatten() {
            println!("    attachment: {} ({} bytes)", attachment.name, attachment.bytes_size);
        }
    }
}
